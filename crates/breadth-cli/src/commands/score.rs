//! 점수 계산/검증/트레이드 계획 명령어.
//!
//! 입력은 원시 breadth 레코드의 JSON 배열(또는 단일 객체) 파일입니다.
//!
//! ```bash
//! # 가장 최근 레코드 점수
//! breadth score -i data/breadth.json
//!
//! # 기간 점수 (정규화 알고리즘)
//! breadth score -i data/breadth.json -a normalized -f 2025-01-01 -t 2025-03-31
//!
//! # 레코드 검증
//! breadth validate -i data/breadth.json
//!
//! # 데이터 품질 보고서
//! breadth quality -i data/breadth.json
//! ```

use super::print_json;
use anyhow::{Context, Result};
use breadth_core::{AlgorithmType, RawBreadthRecord};
use breadth_engine::{AppConfig, BreadthEngine, InMemoryBreadthStore, ValidationReport};
use breadth_risk::PortfolioParams;
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// 점수 명령 인자.
#[derive(Debug, Clone)]
pub struct ScoreArgs {
    pub input: PathBuf,
    pub algorithm: Option<AlgorithmType>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

/// 트레이드 계획 명령 인자.
#[derive(Debug, Clone)]
pub struct PlanArgs {
    pub input: PathBuf,
    pub vix: f64,
    pub portfolio: Decimal,
    pub base_pct: Option<Decimal>,
    pub entry_date: NaiveDate,
    pub entry_price: Decimal,
    pub true_range: Option<Decimal>,
}

#[derive(Serialize)]
struct RecordReport<'a> {
    date: Option<&'a str>,
    #[serde(flatten)]
    report: ValidationReport,
}

/// JSON 파일에서 레코드를 읽습니다 (배열 또는 단일 객체).
pub fn load_records(path: &Path) -> Result<Vec<RawBreadthRecord>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    parse_records(&text).with_context(|| format!("failed to parse {}", path.display()))
}

fn parse_records(text: &str) -> Result<Vec<RawBreadthRecord>> {
    let value: serde_json::Value = serde_json::from_str(text)?;
    let records = if value.is_array() {
        serde_json::from_value(value)?
    } else {
        vec![serde_json::from_value(value)?]
    };
    Ok(records)
}

fn engine_for(
    config: &AppConfig,
    records: Vec<RawBreadthRecord>,
) -> Result<BreadthEngine<InMemoryBreadthStore>> {
    let store = Arc::new(InMemoryBreadthStore::with_records(records));
    Ok(BreadthEngine::new(store, config)?)
}

/// 점수 계산을 실행합니다.
pub async fn run_score(config: &AppConfig, args: ScoreArgs) -> Result<()> {
    let records = load_records(&args.input)?;
    info!(count = records.len(), input = %args.input.display(), "Records loaded");
    let engine = engine_for(config, records)?;

    if args.from.is_none() && args.to.is_none() {
        let result = engine.calculate_real_time(args.algorithm).await?;
        return print_json(&result);
    }

    let start = match args.from {
        Some(d) => d,
        None => super::parse_date("2007-01-01")?,
    };
    let end = args.to.unwrap_or_else(|| Utc::now().date_naive());

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received; stopping after the current day");
            on_signal.cancel();
        }
    });

    let run = engine
        .calculate_historical_with_cancel(start, end, args.algorithm, &cancel)
        .await?;
    print_json(&run)
}

/// 레코드별 검증 결과를 출력합니다.
pub fn run_validate(config: &AppConfig, input: &Path) -> Result<()> {
    let records = load_records(input)?;
    let engine = engine_for(config, Vec::new())?;

    let reports: Vec<RecordReport<'_>> = records
        .iter()
        .map(|raw| RecordReport {
            date: raw.date.as_deref(),
            report: engine.validate_data(raw),
        })
        .collect();
    let invalid = reports.iter().filter(|r| !r.report.is_valid).count();
    info!(total = reports.len(), invalid, "Validation finished");
    print_json(&reports)
}

/// 가장 최근 레코드로 사이징과 청산 계획을 함께 계산합니다.
pub async fn run_plan(config: &AppConfig, args: PlanArgs) -> Result<()> {
    let records = load_records(&args.input)?;
    let engine = engine_for(config, records)?;

    let latest = engine
        .store()
        .latest_record()
        .await
        .context("no dated breadth record in input")?;
    let inputs = engine.breadth_inputs(&latest)?;

    let mut params = PortfolioParams::new(args.portfolio);
    if let Some(pct) = args.base_pct {
        params = params.with_base_size_percentage(pct);
    }
    let plan = engine.plan_trade(
        inputs,
        args.vix,
        params,
        args.entry_date,
        args.entry_price,
        args.true_range,
    )?;
    print_json(&plan)
}

/// 레코드 파일의 데이터 품질 보고서를 출력합니다.
pub fn run_quality(config: &AppConfig, input: &Path) -> Result<()> {
    let records = load_records(input)?;
    let engine = engine_for(config, Vec::new())?;
    let report = engine.data_quality_report(&records);
    report.log_summary();
    print_json(&report)
}
