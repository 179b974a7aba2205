//! 거래소 휴장일 참조 데이터.
//!
//! 연도별 정적 휴장일 목록과, 미국 주식시장(NYSE/NASDAQ) 규칙에 따라
//! 휴장일/조기폐장일을 생성하는 캘린더를 제공합니다.

use chrono::{Datelike, Days, NaiveDate, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 휴장일 유형.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HolidayType {
    /// 종일 휴장
    MarketClosed,
    /// 조기 폐장 (거래일로 계산)
    EarlyClose,
}

/// 휴장일 항목.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Holiday {
    pub date: NaiveDate,
    pub holiday_type: HolidayType,
    /// 조기 폐장 시각 (현지 시간)
    pub early_close_time: Option<NaiveTime>,
    pub name: String,
}

impl Holiday {
    /// 종일 휴장일 생성.
    pub fn closed(date: NaiveDate, name: impl Into<String>) -> Self {
        Self {
            date,
            holiday_type: HolidayType::MarketClosed,
            early_close_time: None,
            name: name.into(),
        }
    }

    /// 조기 폐장일 생성.
    pub fn early_close(date: NaiveDate, close: NaiveTime, name: impl Into<String>) -> Self {
        Self {
            date,
            holiday_type: HolidayType::EarlyClose,
            early_close_time: Some(close),
            name: name.into(),
        }
    }

    /// 종일 휴장 여부.
    pub fn is_market_closed(&self) -> bool {
        self.holiday_type == HolidayType::MarketClosed
    }
}

/// 휴장일 캘린더.
///
/// 포함 연도 범위(`first_year..=last_year`) 밖의 날짜에 대해서는 판단하지 않습니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HolidayCalendar {
    holidays: BTreeMap<NaiveDate, Holiday>,
    first_year: i32,
    last_year: i32,
}

impl HolidayCalendar {
    /// 명시적 휴장일 목록으로 캘린더 생성.
    ///
    /// 같은 날짜가 중복되면 종일 휴장이 조기 폐장보다 우선합니다.
    pub fn new(first_year: i32, last_year: i32, holidays: impl IntoIterator<Item = Holiday>) -> Self {
        let mut map: BTreeMap<NaiveDate, Holiday> = BTreeMap::new();
        for holiday in holidays {
            match map.get(&holiday.date) {
                Some(existing) if existing.is_market_closed() => {}
                _ => {
                    map.insert(holiday.date, holiday);
                }
            }
        }
        Self {
            holidays: map,
            first_year: first_year.min(last_year),
            last_year: first_year.max(last_year),
        }
    }

    /// 미국 주식시장 규칙으로 연도 범위의 캘린더 생성.
    pub fn us_equities(first_year: i32, last_year: i32) -> Self {
        let (lo, hi) = (first_year.min(last_year), first_year.max(last_year));
        let holidays = (lo..=hi).flat_map(us_equity_holidays);
        Self::new(lo, hi, holidays)
    }

    /// 포함 연도 범위.
    pub fn coverage(&self) -> (i32, i32) {
        (self.first_year, self.last_year)
    }

    /// 날짜가 포함 연도 범위 안에 있는지.
    pub fn covers(&self, date: NaiveDate) -> bool {
        (self.first_year..=self.last_year).contains(&date.year())
    }

    /// 날짜의 휴장일 항목.
    pub fn get(&self, date: NaiveDate) -> Option<&Holiday> {
        self.holidays.get(&date)
    }

    /// 주말 여부.
    pub fn is_weekend(date: NaiveDate) -> bool {
        matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
    }

    /// 주말이거나 종일 휴장일이면 `true`.
    pub fn is_market_closed(&self, date: NaiveDate) -> bool {
        Self::is_weekend(date) || self.get(date).is_some_and(Holiday::is_market_closed)
    }

    /// 거래일 여부 (조기 폐장일도 거래일).
    pub fn is_trading_day(&self, date: NaiveDate) -> bool {
        !self.is_market_closed(date)
    }

    /// `from` 다음의 첫 거래일.
    ///
    /// 포함 범위를 벗어나면 `None`을 반환합니다.
    pub fn next_trading_day(&self, from: NaiveDate) -> Option<NaiveDate> {
        let mut date = from.checked_add_days(Days::new(1))?;
        while self.covers(date) {
            if self.is_trading_day(date) {
                return Some(date);
            }
            date = date.checked_add_days(Days::new(1))?;
        }
        None
    }

    /// 특정 연도의 휴장일 목록 (날짜 오름차순).
    pub fn holidays_in_year(&self, year: i32) -> impl Iterator<Item = &Holiday> {
        self.holidays.values().filter(move |h| h.date.year() == year)
    }

    /// 등록된 휴장일 수.
    pub fn len(&self) -> usize {
        self.holidays.len()
    }

    /// 등록된 휴장일이 없는지.
    pub fn is_empty(&self) -> bool {
        self.holidays.is_empty()
    }
}

/// 주말 휴일 대체 규칙: 토요일 → 금요일, 일요일 → 월요일.
fn observed(date: NaiveDate) -> Option<NaiveDate> {
    match date.weekday() {
        Weekday::Sat => date.checked_sub_days(Days::new(1)),
        Weekday::Sun => date.checked_add_days(Days::new(1)),
        _ => Some(date),
    }
}

fn last_weekday_of_month(year: i32, month: u32, weekday: Weekday) -> Option<NaiveDate> {
    (1..=5u8)
        .rev()
        .find_map(|n| NaiveDate::from_weekday_of_month_opt(year, month, weekday, n))
}

/// 부활절 일요일 (Anonymous Gregorian 알고리즘).
fn easter_sunday(year: i32) -> Option<NaiveDate> {
    let a = year % 19;
    let b = year / 100;
    let c = year % 100;
    let d = b / 4;
    let e = b % 4;
    let f = (b + 8) / 25;
    let g = (b - f + 1) / 3;
    let h = (19 * a + b - d - g + 15) % 30;
    let i = c / 4;
    let k = c % 4;
    let l = (32 + 2 * e + 2 * i - h - k) % 7;
    let m = (a + 11 * h + 22 * l) / 451;
    let month = (h + l - 7 * m + 114) / 31;
    let day = (h + l - 7 * m + 114) % 31 + 1;
    NaiveDate::from_ymd_opt(year, month as u32, day as u32)
}

/// 미국 주식시장 연간 휴장일/조기폐장일.
fn us_equity_holidays(year: i32) -> Vec<Holiday> {
    let ymd = |m: u32, d: u32| NaiveDate::from_ymd_opt(year, m, d);
    let nth = |m: u32, wd: Weekday, n: u8| NaiveDate::from_weekday_of_month_opt(year, m, wd, n);

    // 1월 1일이 토요일이면 전년도 12월 31일로 대체하지 않음
    let new_year = ymd(1, 1).and_then(|d| match d.weekday() {
        Weekday::Sat => None,
        _ => observed(d),
    });

    let mut closed: Vec<(Option<NaiveDate>, &str)> = vec![
        (new_year, "New Year's Day"),
        (nth(1, Weekday::Mon, 3), "Martin Luther King Jr. Day"),
        (nth(2, Weekday::Mon, 3), "Washington's Birthday"),
        (
            easter_sunday(year).and_then(|d| d.checked_sub_days(Days::new(2))),
            "Good Friday",
        ),
        (last_weekday_of_month(year, 5, Weekday::Mon), "Memorial Day"),
        (ymd(7, 4).and_then(observed), "Independence Day"),
        (nth(9, Weekday::Mon, 1), "Labor Day"),
        (nth(11, Weekday::Thu, 4), "Thanksgiving Day"),
        (ymd(12, 25).and_then(observed), "Christmas Day"),
    ];
    if year >= 2022 {
        closed.push((ymd(6, 19).and_then(observed), "Juneteenth"));
    }

    let mut holidays: Vec<Holiday> = closed
        .into_iter()
        .filter_map(|(date, name)| date.map(|d| Holiday::closed(d, name)))
        .collect();

    let Some(one_pm) = NaiveTime::from_hms_opt(13, 0, 0) else {
        return holidays;
    };
    let early: [(Option<NaiveDate>, &str); 3] = [
        (ymd(7, 3), "Independence Day Eve"),
        (
            nth(11, Weekday::Thu, 4).and_then(|d| d.checked_add_days(Days::new(1))),
            "Day after Thanksgiving",
        ),
        (ymd(12, 24), "Christmas Eve"),
    ];
    for (date, name) in early {
        let Some(date) = date else { continue };
        let already_closed = holidays.iter().any(|h| h.date == date);
        if !HolidayCalendar::is_weekend(date) && !already_closed {
            holidays.push(Holiday::early_close(date, one_pm, name));
        }
    }

    holidays.sort_by_key(|h| h.date);
    holidays
}
