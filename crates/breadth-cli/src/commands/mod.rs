//! CLI 명령어 구현 모듈.

pub mod exit_plan;
pub mod score;
pub mod size;
pub mod tiers;

use anyhow::{anyhow, Context, Result};
use chrono::NaiveDate;
use serde::Serialize;

/// 값을 보기 좋은 JSON으로 stdout에 출력합니다.
pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value).context("failed to serialize output")?;
    println!("{}", text);
    Ok(())
}

/// YYYY-MM-DD 날짜 파싱.
pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|e| anyhow!("Invalid date '{}': {} (expected YYYY-MM-DD)", s, e))
}
