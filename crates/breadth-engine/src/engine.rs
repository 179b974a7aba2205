//! breadth 점수 엔진 파사드.
//!
//! 계산 흐름:
//! ValidationGate → FieldResolver → AlgorithmRegistry → ScoreCompositor
//! → MarketConditionClassifier → BreadthResult
//!
//! 알고리즘 선택은 엔진 내부 상태가 아니라 호출자가 소유하는
//! [`AlgorithmSelection`] 값으로 전달됩니다.

use crate::algorithms::AlgorithmRegistry;
use crate::classifier::classify;
use crate::compositor::ScoreCompositor;
use crate::config_store::{select_default, ConfigDraft};
use crate::quality::DataQualityReport;
use crate::resolver::{BreadthField, FieldResolver};
use crate::settings::AppConfig;
use crate::store::{latest, record_date, BreadthStore};
use crate::validation::{ValidationGate, ValidationReport};
use breadth_core::{
    AlgorithmType, BreadthCalculationConfig, BreadthError, BreadthResult, ConfigVersion,
    CoreResult, FieldError, HolidayCalendar, PersistenceError, RawBreadthRecord, ResultMetadata,
    ValidationError,
};
use breadth_risk::{
    BreadthInputs, ExitAdjustments, ExitPlan, ExitScheduler, PortfolioParams,
    PositionRiskCalculator, PositionSizingDecision,
};
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

/// 알고리즘과 그 설정.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlgorithmSelection {
    pub algorithm: AlgorithmType,
    pub config: BreadthCalculationConfig,
}

impl AlgorithmSelection {
    /// 내장 설정을 사용하는 선택.
    pub fn builtin(algorithm: AlgorithmType) -> Self {
        Self {
            algorithm,
            config: BreadthCalculationConfig::builtin(algorithm),
        }
    }
}

/// 단일 계산 결과와 저장 ID.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Calculation {
    pub result: BreadthResult,
    /// 저장을 요청한 경우에만 존재
    pub id: Option<Uuid>,
}

/// 검증에 실패해 건너뛴 날짜.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedDay {
    pub date: Option<String>,
    pub errors: Vec<FieldError>,
}

/// 기간 계산 결과.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct HistoricalRun {
    /// 날짜 오름차순
    pub results: Vec<BreadthResult>,
    pub skipped: Vec<SkippedDay>,
    /// 취소로 중단되었는지
    pub cancelled: bool,
}

/// 사이징과 청산 계획.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TradePlan {
    pub sizing: PositionSizingDecision,
    pub exit: ExitPlan,
}

/// breadth 점수 엔진.
pub struct BreadthEngine<S: BreadthStore> {
    store: Arc<S>,
    gate: ValidationGate,
    resolver: FieldResolver,
    compositor: ScoreCompositor,
    default_algorithm: AlgorithmType,
    sizing: PositionRiskCalculator,
    exits: ExitScheduler,
}

impl<S: BreadthStore> BreadthEngine<S> {
    /// 설정을 검증하고 엔진을 생성합니다.
    pub fn new(store: Arc<S>, config: &AppConfig) -> CoreResult<Self> {
        config.validate()?;
        Ok(Self {
            store,
            gate: ValidationGate::new(),
            resolver: FieldResolver::default(),
            compositor: ScoreCompositor::new(
                config.engine.min_confidence,
                config.engine.sparse_warning_threshold,
            ),
            default_algorithm: config.engine.default_algorithm,
            sizing: PositionRiskCalculator::new(config.bidback.clone()),
            exits: ExitScheduler::us_equities(config.calendar.first_year, config.calendar.last_year),
        })
    }

    /// 기본 설정으로 엔진을 생성합니다.
    pub fn with_defaults(store: Arc<S>) -> CoreResult<Self> {
        Self::new(store, &AppConfig::default())
    }

    /// 검증 게이트를 교체합니다.
    pub fn with_gate(mut self, gate: ValidationGate) -> Self {
        self.gate = gate;
        self
    }

    /// 휴장일 캘린더를 교체합니다.
    pub fn with_calendar(mut self, calendar: HolidayCalendar) -> Self {
        self.exits = ExitScheduler::new(calendar);
        self
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// 원시 레코드를 검증합니다.
    pub fn validate_data(&self, raw: &RawBreadthRecord) -> ValidationReport {
        self.gate.check(raw)
    }

    /// 레코드 집합의 데이터 품질 보고서 (I/O 없음).
    pub fn data_quality_report(&self, records: &[RawBreadthRecord]) -> DataQualityReport {
        DataQualityReport::build(records, &self.gate, self.exits.calendar())
    }

    /// 저장소의 기간 레코드로 데이터 품질 보고서를 만듭니다.
    ///
    /// 기간을 주지 않으면 날짜가 없는 레코드까지 포함한 전체를 봅니다.
    pub async fn stored_data_quality(
        &self,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> CoreResult<DataQualityReport> {
        let records = self.store.get_breadth_data(start, end).await?;
        let report = self.data_quality_report(&records);
        report.log_summary();
        Ok(report)
    }

    /// 선택된 알고리즘으로 레코드 하나의 점수를 계산합니다 (I/O 없음).
    pub fn score(
        &self,
        raw: &RawBreadthRecord,
        selection: &AlgorithmSelection,
    ) -> CoreResult<BreadthResult> {
        let config = &selection.config;
        if config.algorithm != selection.algorithm {
            return Err(BreadthError::config(format!(
                "config {} belongs to {}, not {}",
                config.version, config.algorithm, selection.algorithm
            )));
        }
        config.validate()?;

        let record = self.gate.sanitize(raw)?;
        let _span =
            breadth_core::breadth_span!("breadth_score", record.date, selection.algorithm)
                .entered();
        let inputs = self.resolver.resolve_all(&record);
        let entry = AlgorithmRegistry::get(selection.algorithm);
        let output = (entry.compute)(&inputs, config);

        let data_quality = record.data_quality_or_full();
        let composite = self.compositor.compose(
            &output.components,
            config,
            inputs.completeness(),
            data_quality,
        );
        let market_condition = classify(
            composite.normalized_score,
            &output.components,
            &config.scaling,
        );

        let mut warnings = composite.warnings;
        for field in inputs.estimated_fields() {
            warnings.push(format!(
                "{} estimated from advancing/declining issues",
                field
            ));
        }
        for component in &output.fallbacks {
            warnings.push(format!(
                "{} component has no inputs; neutral 0.5 used",
                component
            ));
        }

        debug!(
            date = %record.date,
            algorithm = %selection.algorithm,
            normalized = composite.normalized_score,
            confidence = composite.confidence,
            "Breadth score computed"
        );

        Ok(BreadthResult {
            date: record.date,
            raw_score: composite.raw_score,
            normalized_score: composite.normalized_score,
            confidence: composite.confidence,
            components: output.components,
            market_condition,
            metadata: ResultMetadata {
                algorithm_used: selection.algorithm,
                config_version: config.version,
                calculation_time: Utc::now(),
                data_quality,
                warnings,
            },
        })
    }

    /// 알고리즘의 현재 기본 설정으로 선택을 만듭니다.
    ///
    /// 알고리즘을 지정하지 않으면 엔진 기본 알고리즘을 사용합니다.
    pub async fn resolve_selection(
        &self,
        algorithm: Option<AlgorithmType>,
    ) -> CoreResult<AlgorithmSelection> {
        let algorithm = algorithm.unwrap_or(self.default_algorithm);
        let configs = self.store.load_configs().await?;
        Ok(AlgorithmSelection {
            algorithm,
            config: select_default(&configs, algorithm),
        })
    }

    /// 선택을 다른 알고리즘으로 바꿉니다. 실제로 바뀌었으면 `true`.
    pub async fn switch_algorithm(
        &self,
        selection: &mut AlgorithmSelection,
        algorithm: AlgorithmType,
    ) -> CoreResult<bool> {
        if selection.algorithm == algorithm {
            return Ok(false);
        }
        *selection = self.resolve_selection(Some(algorithm)).await?;
        info!(algorithm = %algorithm, version = %selection.config.version, "Algorithm switched");
        Ok(true)
    }

    /// 레코드 하나를 계산하고 선택적으로 저장합니다.
    #[instrument(skip(self, raw), fields(date = ?raw.date))]
    pub async fn calculate_single(
        &self,
        raw: &RawBreadthRecord,
        algorithm: Option<AlgorithmType>,
        persist: bool,
    ) -> CoreResult<Calculation> {
        let selection = self.resolve_selection(algorithm).await?;
        let result = self.score(raw, &selection)?;
        let id = if persist {
            Some(self.store.save_breadth_result(&result).await?)
        } else {
            None
        };
        Ok(Calculation { result, id })
    }

    /// 기간의 모든 날짜를 계산합니다 (날짜 오름차순, 검증 실패일은 건너뜀).
    pub async fn calculate_historical(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        algorithm: Option<AlgorithmType>,
    ) -> CoreResult<Vec<BreadthResult>> {
        let run = self
            .calculate_historical_with_cancel(start, end, algorithm, &CancellationToken::new())
            .await?;
        Ok(run.results)
    }

    /// 취소 가능한 기간 계산.
    ///
    /// 취소는 날짜 경계에서만 확인하며, 이미 계산된 날짜의 결과는 그대로 반환됩니다.
    #[instrument(skip(self, cancel), level = "info")]
    pub async fn calculate_historical_with_cancel(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        algorithm: Option<AlgorithmType>,
        cancel: &CancellationToken,
    ) -> CoreResult<HistoricalRun> {
        if start > end {
            return Err(ValidationError::single(
                "date_range",
                format!("start {} is after end {}", start, end),
            )
            .into());
        }

        let selection = self.resolve_selection(algorithm).await?;
        let mut records = self.store.get_breadth_data(Some(start), Some(end)).await?;
        records.sort_by_key(record_date);

        let mut run = HistoricalRun::default();
        for raw in &records {
            if cancel.is_cancelled() {
                run.cancelled = true;
                info!(completed = run.results.len(), "Historical calculation cancelled");
                break;
            }
            match self.score(raw, &selection) {
                Ok(result) => run.results.push(result),
                Err(BreadthError::Validation(e)) => {
                    warn!(date = ?raw.date, error = %e, "Skipping invalid breadth record");
                    run.skipped.push(SkippedDay {
                        date: raw.date.clone(),
                        errors: e.fields,
                    });
                }
                Err(e) => return Err(e),
            }
            debug!(done = run.results.len(), total = records.len(), "Historical progress");
        }

        info!(
            results = run.results.len(),
            skipped = run.skipped.len(),
            algorithm = %selection.algorithm,
            "Historical calculation finished"
        );
        Ok(run)
    }

    /// 가장 최근 레코드의 점수를 계산합니다.
    #[instrument(skip(self))]
    pub async fn calculate_real_time(
        &self,
        algorithm: Option<AlgorithmType>,
    ) -> CoreResult<BreadthResult> {
        let selection = self.resolve_selection(algorithm).await?;
        let records = self.store.get_breadth_data(None, None).await?;
        let record = latest(&records)
            .ok_or_else(|| PersistenceError::NotFound("no breadth data available".into()))?;
        self.score(record, &selection)
    }

    /// 새 설정 버전을 만듭니다.
    #[instrument(skip(self, draft))]
    pub async fn create_config(
        &self,
        algorithm: AlgorithmType,
        name: &str,
        draft: &ConfigDraft,
    ) -> CoreResult<ConfigVersion> {
        draft.validate()?;
        let version = self.store.create_config(algorithm, name, draft).await?;
        info!(%version, %algorithm, "Config created");
        Ok(version)
    }

    /// 기본 설정을 지정합니다.
    #[instrument(skip(self))]
    pub async fn set_default_config(&self, version: ConfigVersion) -> CoreResult<()> {
        self.store.set_default_config(version).await?;
        info!(%version, "Default config updated");
        Ok(())
    }

    /// 전체 설정을 불러옵니다.
    pub async fn load_configs(&self) -> CoreResult<Vec<BreadthCalculationConfig>> {
        self.store.load_configs().await
    }

    /// 저장된 결과를 삭제합니다.
    pub async fn delete_result(&self, id: Uuid) -> CoreResult<()> {
        self.store.delete_breadth_result(id).await
    }

    /// 원시 레코드에서 사이징 입력을 추출합니다.
    pub fn breadth_inputs(&self, raw: &RawBreadthRecord) -> CoreResult<BreadthInputs> {
        let record = self.gate.sanitize(raw)?;
        let inputs = self.resolver.resolve_all(&record);

        let up4 = inputs.get(BreadthField::StocksUp4Pct);
        let t2108 = inputs.get(BreadthField::T2108);
        let mut missing = Vec::new();
        if up4.is_none() {
            missing.push(FieldError::new("stocks_up_4pct", "is required for sizing"));
        }
        if t2108.is_none() {
            missing.push(FieldError::new("t2108", "is required for sizing"));
        }
        match (up4, t2108) {
            (Some(up4), Some(t2108)) => Ok(BreadthInputs::new(
                up4.round() as u32,
                inputs
                    .get(BreadthField::StocksDown4Pct)
                    .map_or(0, |d| d.round() as u32),
                t2108,
            )),
            _ => Err(ValidationError::new(missing).into()),
        }
    }

    /// BIDBACK 포지션 사이징.
    pub fn compute_position_sizing(
        &self,
        inputs: BreadthInputs,
        vix: f64,
        params: PortfolioParams,
    ) -> CoreResult<PositionSizingDecision> {
        self.sizing.compute(inputs, vix, params)
    }

    /// 청산 계획.
    pub fn compute_exit_plan(
        &self,
        entry_date: NaiveDate,
        entry_price: Decimal,
        vix: f64,
    ) -> CoreResult<ExitPlan> {
        self.exits.compute_exit_plan(entry_date, entry_price, vix)
    }

    /// true range / T2108 보정을 적용한 청산 계획.
    pub fn compute_exit_plan_with(
        &self,
        entry_date: NaiveDate,
        entry_price: Decimal,
        vix: f64,
        adjustments: ExitAdjustments,
    ) -> CoreResult<ExitPlan> {
        self.exits
            .compute_exit_plan_with(entry_date, entry_price, vix, adjustments)
    }

    /// 사이징과 청산 계획을 같은 VIX 값으로 함께 계산합니다.
    ///
    /// 손절 breadth 보정에는 사이징 입력의 T2108을 그대로 씁니다.
    pub fn plan_trade(
        &self,
        inputs: BreadthInputs,
        vix: f64,
        params: PortfolioParams,
        entry_date: NaiveDate,
        entry_price: Decimal,
        true_range: Option<Decimal>,
    ) -> CoreResult<TradePlan> {
        let sizing = self.compute_position_sizing(inputs, vix, params)?;
        let adjustments = ExitAdjustments {
            true_range,
            t2108: Some(inputs.t2108),
        };
        let exit = self.compute_exit_plan_with(entry_date, entry_price, vix, adjustments)?;
        Ok(TradePlan { sizing, exit })
    }
}
