//! 원시 breadth 레코드 검증 게이트.
//!
//! 필드 범위 규칙은 [`RawBreadthRecord`]의 `validator` 속성에 선언되어 있고,
//! 게이트는 기준일이 필요한 미래 날짜 상한과 보조/레거시 값의 범위를 더합니다.
//! 위반된 모든 필드를 한 번에 보고하며, 통과한 레코드는 정제된
//! [`BreadthRecord`]로 변환됩니다.

use crate::resolver::BreadthField;
use breadth_core::{parse_record_date, BreadthRecord, FieldError, RawBreadthRecord, ValidationError};
use chrono::{Months, NaiveDate, Utc};
use serde::Serialize;
use validator::Validate;

/// 검증 결과.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationReport {
    pub is_valid: bool,
    pub errors: Vec<FieldError>,
}

/// 검증 게이트.
#[derive(Debug, Clone, Default)]
pub struct ValidationGate {
    today: Option<NaiveDate>,
}

impl ValidationGate {
    /// 현재 날짜(UTC)를 기준으로 하는 게이트.
    pub fn new() -> Self {
        Self::default()
    }

    /// 기준 날짜를 고정한 게이트.
    pub fn with_today(today: NaiveDate) -> Self {
        Self { today: Some(today) }
    }

    fn latest_date(&self) -> NaiveDate {
        let today = self.today.unwrap_or_else(|| Utc::now().date_naive());
        today.checked_add_months(Months::new(12)).unwrap_or(today)
    }

    /// 레코드를 검증하고 결과 보고서를 반환합니다.
    pub fn check(&self, raw: &RawBreadthRecord) -> ValidationReport {
        match self.sanitize(raw) {
            Ok(_) => ValidationReport {
                is_valid: true,
                errors: Vec::new(),
            },
            Err(e) => ValidationReport {
                is_valid: false,
                errors: e.fields,
            },
        }
    }

    /// 레코드를 검증하고 정제된 레코드를 반환합니다.
    pub fn sanitize(&self, raw: &RawBreadthRecord) -> Result<BreadthRecord, ValidationError> {
        let mut errors = match raw.validate() {
            Ok(()) => Vec::new(),
            Err(e) => ValidationError::from(e).fields,
        };

        let date = raw.date.as_deref().and_then(parse_record_date);
        if let Some(d) = date {
            if d > self.latest_date() && !errors.iter().any(|e| e.field == "date") {
                errors.push(FieldError::new(
                    "date",
                    "must not be more than one year in the future",
                ));
            }
        }
        errors.extend(auxiliary_errors(raw));

        let date = match date {
            Some(date) if errors.is_empty() => date,
            _ => {
                errors.sort_by(|a, b| a.field.cmp(&b.field));
                errors.dedup_by(|a, b| a.field == b.field);
                return Err(ValidationError::new(errors));
            }
        };

        let count = |v: Option<f64>| v.map(|v| v.round() as u32);
        Ok(BreadthRecord {
            date,
            timestamp: raw.timestamp,
            advancing_issues: count(raw.advancing_issues),
            declining_issues: count(raw.declining_issues),
            new_highs: count(raw.new_highs),
            new_lows: count(raw.new_lows),
            up_volume: raw.up_volume,
            down_volume: raw.down_volume,
            stocks_up_4pct: count(raw.stocks_up_4pct),
            stocks_down_4pct: count(raw.stocks_down_4pct),
            stocks_up_13pct_34days: count(raw.stocks_up_13pct_34days),
            stocks_down_13pct_34days: count(raw.stocks_down_13pct_34days),
            stocks_up_25pct_quarter: count(raw.stocks_up_25pct_quarter),
            stocks_down_25pct_quarter: count(raw.stocks_down_25pct_quarter),
            stocks_up_25pct_month: count(raw.stocks_up_25pct_month),
            stocks_down_25pct_month: count(raw.stocks_down_25pct_month),
            stocks_up_50pct_month: count(raw.stocks_up_50pct_month),
            stocks_down_50pct_month: count(raw.stocks_down_50pct_month),
            ratio_5day: raw.ratio_5day,
            ratio_10day: raw.ratio_10day,
            t2108: raw.t2108,
            vix: raw.vix,
            index_level: raw.index_level,
            worden_universe: count(raw.worden_universe),
            sectors: raw.sectors.clone(),
            data_quality: raw.data_quality,
            annotations: raw.annotations.clone(),
            legacy: raw.legacy.clone(),
        })
    }
}

/// 보조/레거시 값 중 알려진 필드에 대응하는 값을 정식 컬럼과 같은 규칙으로 검증합니다.
///
/// 값을 빈 레코드의 정식 컬럼에 넣고 같은 `validator` 규칙을 돌려
/// 해당 컬럼의 위반만 `annotations.키` / `legacy.키` 이름으로 옮깁니다.
fn auxiliary_errors(raw: &RawBreadthRecord) -> Vec<FieldError> {
    let mut errors = Vec::new();
    for (prefix, map) in [("annotations", &raw.annotations), ("legacy", &raw.legacy)] {
        for (key, value) in map {
            let Some(field) = BreadthField::from_key(key) else {
                continue;
            };
            let mut single = RawBreadthRecord::default();
            field.assign(&mut single, *value);
            let Err(e) = single.validate() else {
                continue;
            };
            let violations = ValidationError::from(e);
            if let Some(v) = violations.fields.iter().find(|f| f.field == field.name()) {
                errors.push(FieldError::new(
                    format!("{}.{}", prefix, key),
                    v.message.clone(),
                ));
            }
        }
    }
    errors
}
