//! 레코드 집합의 데이터 품질 보고서.
//!
//! 날짜 범위와 누락/중복 날짜, 필드별 완전성(전체와 연도별),
//! 핵심 지표의 극값, 검증 게이트를 통과하지 못한 레코드 수를 모읍니다.

use crate::resolver::BreadthField;
use crate::validation::ValidationGate;
use breadth_core::{parse_record_date, HolidayCalendar, RawBreadthRecord};
use chrono::{Datelike, Duration, NaiveDate};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// 비율 계산 (%).
fn percent(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        (part as f64 / whole as f64) * 100.0
    }
}

/// 연도별 핵심 필드 완전성 (%).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct YearlyCompleteness {
    pub records: usize,
    pub stocks_up_4pct: f64,
    pub t2108: f64,
    pub index_level: f64,
}

#[derive(Default)]
struct YearTally {
    records: usize,
    stocks_up_4pct: usize,
    t2108: usize,
    index_level: usize,
}

/// 데이터 품질 보고서.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DataQualityReport {
    /// 전체 레코드 수
    pub total_records: usize,
    /// 날짜가 없거나 해석할 수 없는 레코드 수
    pub undated_records: usize,
    /// 검증 게이트를 통과하지 못한 레코드 수
    pub invalid_records: usize,
    /// 두 번 이상 나타난 날짜
    pub duplicate_dates: Vec<NaiveDate>,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
    pub years_covered: usize,
    /// 첫 날짜와 마지막 날짜 사이에서 레코드가 없는 거래일 수
    pub missing_trading_days: usize,
    /// 필드별 정식 컬럼 완전성 (%, 날짜가 있는 레코드 기준)
    pub field_completeness: BTreeMap<BreadthField, f64>,
    pub yearly: BTreeMap<i32, YearlyCompleteness>,
    pub max_stocks_up_4pct: Option<f64>,
    pub max_stocks_down_4pct: Option<f64>,
    pub t2108_min: Option<f64>,
    pub t2108_max: Option<f64>,
}

fn fold_max(current: Option<f64>, value: Option<f64>) -> Option<f64> {
    match value.filter(|v| v.is_finite()) {
        Some(v) => Some(current.map_or(v, |c| c.max(v))),
        None => current,
    }
}

fn fold_min(current: Option<f64>, value: Option<f64>) -> Option<f64> {
    match value.filter(|v| v.is_finite()) {
        Some(v) => Some(current.map_or(v, |c| c.min(v))),
        None => current,
    }
}

impl DataQualityReport {
    /// 레코드 집합에서 보고서를 만듭니다.
    ///
    /// 누락 거래일은 캘린더가 다루는 연도 안에서만 셉니다.
    pub fn build(
        records: &[RawBreadthRecord],
        gate: &ValidationGate,
        calendar: &HolidayCalendar,
    ) -> Self {
        let mut report = Self {
            total_records: records.len(),
            ..Default::default()
        };

        let mut seen = BTreeSet::new();
        let mut duplicates = BTreeSet::new();
        let mut present: BTreeMap<BreadthField, usize> = BTreeMap::new();
        let mut years: BTreeMap<i32, YearTally> = BTreeMap::new();

        for raw in records {
            if !gate.check(raw).is_valid {
                report.invalid_records += 1;
            }

            let Some(date) = raw.date.as_deref().and_then(parse_record_date) else {
                report.undated_records += 1;
                continue;
            };
            if !seen.insert(date) {
                duplicates.insert(date);
            }

            for field in BreadthField::ALL {
                if field.raw_value(raw).is_some() {
                    *present.entry(field).or_default() += 1;
                }
            }
            let tally = years.entry(date.year()).or_default();
            tally.records += 1;
            tally.stocks_up_4pct += usize::from(raw.stocks_up_4pct.is_some());
            tally.t2108 += usize::from(raw.t2108.is_some());
            tally.index_level += usize::from(raw.index_level.is_some());

            report.max_stocks_up_4pct = fold_max(report.max_stocks_up_4pct, raw.stocks_up_4pct);
            report.max_stocks_down_4pct =
                fold_max(report.max_stocks_down_4pct, raw.stocks_down_4pct);
            report.t2108_min = fold_min(report.t2108_min, raw.t2108);
            report.t2108_max = fold_max(report.t2108_max, raw.t2108);
        }

        let dated = records.len() - report.undated_records;
        report.field_completeness = BreadthField::ALL
            .into_iter()
            .map(|f| (f, percent(present.get(&f).copied().unwrap_or(0), dated)))
            .collect();
        report.yearly = years
            .into_iter()
            .map(|(year, t)| {
                let row = YearlyCompleteness {
                    records: t.records,
                    stocks_up_4pct: percent(t.stocks_up_4pct, t.records),
                    t2108: percent(t.t2108, t.records),
                    index_level: percent(t.index_level, t.records),
                };
                (year, row)
            })
            .collect();
        report.years_covered = report.yearly.len();
        report.first_date = seen.first().copied();
        report.last_date = seen.last().copied();
        report.duplicate_dates = duplicates.into_iter().collect();

        if let (Some(first), Some(last)) = (report.first_date, report.last_date) {
            let mut day = first;
            while day <= last {
                if calendar.covers(day) && calendar.is_trading_day(day) && !seen.contains(&day) {
                    report.missing_trading_days += 1;
                }
                day += Duration::days(1);
            }
        }

        report
    }

    /// 전체 레코드 중 검증을 통과한 비율 (%).
    pub fn valid_rate(&self) -> f64 {
        percent(
            self.total_records.saturating_sub(self.invalid_records),
            self.total_records,
        )
    }

    /// 필드 완전성.
    pub fn completeness(&self, field: BreadthField) -> f64 {
        self.field_completeness.get(&field).copied().unwrap_or(0.0)
    }

    /// 보고서 요약 로그 출력
    pub fn log_summary(&self) {
        tracing::info!(
            total = self.total_records,
            undated = self.undated_records,
            invalid = self.invalid_records,
            duplicates = self.duplicate_dates.len(),
            missing_trading_days = self.missing_trading_days,
            first = ?self.first_date,
            last = ?self.last_date,
            years = self.years_covered,
            valid_rate = format!("{:.1}%", self.valid_rate()),
            "Data quality report"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use breadth_core::Holiday;

    fn gate() -> ValidationGate {
        ValidationGate::with_today(NaiveDate::from_ymd_opt(2025, 6, 1).unwrap())
    }

    fn day(d: &str, up4: f64, t2108: f64) -> RawBreadthRecord {
        RawBreadthRecord {
            stocks_up_4pct: Some(up4),
            t2108: Some(t2108),
            ..RawBreadthRecord::for_date(d)
        }
    }

    #[test]
    fn test_empty_input() {
        let calendar = HolidayCalendar::us_equities(2025, 2025);
        let report = DataQualityReport::build(&[], &gate(), &calendar);
        assert_eq!(report.total_records, 0);
        assert_eq!(report.first_date, None);
        assert_eq!(report.completeness(BreadthField::T2108), 0.0);
        assert_eq!(report.valid_rate(), 0.0);
    }

    #[test]
    fn test_report_over_a_short_week() {
        // 2025-03-10(월) 휴장, 3/11 레코드 누락, 3/12 중복
        let calendar = HolidayCalendar::new(
            2025,
            2025,
            vec![Holiday::closed(
                NaiveDate::from_ymd_opt(2025, 3, 10).unwrap(),
                "Closed",
            )],
        );
        let mut records = vec![
            day("2025-03-07", 420.0, 55.0),
            day("2025-03-12", 900.0, 12.0),
            day("2025-03-12", 880.0, 13.0),
            RawBreadthRecord {
                stocks_down_4pct: Some(610.0),
                ..RawBreadthRecord::for_date("2025-03-13")
            },
            day("2025-03-14", 300.0, 140.0),
            RawBreadthRecord::default(),
        ];
        records[1].index_level = Some(5600.0);

        let report = DataQualityReport::build(&records, &gate(), &calendar);

        assert_eq!(report.total_records, 6);
        assert_eq!(report.undated_records, 1);
        // 날짜 없는 레코드와 T2108 140 레코드
        assert_eq!(report.invalid_records, 2);
        assert_eq!(
            report.duplicate_dates,
            vec![NaiveDate::from_ymd_opt(2025, 3, 12).unwrap()]
        );
        assert_eq!(report.first_date, NaiveDate::from_ymd_opt(2025, 3, 7));
        assert_eq!(report.last_date, NaiveDate::from_ymd_opt(2025, 3, 14));
        assert_eq!(report.years_covered, 1);
        assert_eq!(report.missing_trading_days, 1);

        assert_eq!(report.completeness(BreadthField::StocksUp4Pct), 80.0);
        assert_eq!(report.completeness(BreadthField::IndexLevel), 20.0);
        assert_eq!(report.completeness(BreadthField::Vix), 0.0);
        assert_eq!(report.max_stocks_up_4pct, Some(900.0));
        assert_eq!(report.max_stocks_down_4pct, Some(610.0));
        assert_eq!(report.t2108_min, Some(12.0));
        assert_eq!(report.t2108_max, Some(140.0));

        let year = &report.yearly[&2025];
        assert_eq!(year.records, 5);
        assert_eq!(year.t2108, 80.0);
        assert_eq!(year.index_level, 20.0);
    }

    #[test]
    fn test_report_serializes_field_keys_by_name() {
        let records = vec![day("2025-03-07", 420.0, 55.0)];
        let report =
            DataQualityReport::build(&records, &gate(), &HolidayCalendar::us_equities(2025, 2025));
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["field_completeness"]["stocks_up_4pct"], 100.0);
        assert_eq!(json["yearly"]["2025"]["records"], 1);
    }
}
