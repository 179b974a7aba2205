//! 점수 엔진 통합 테스트.

use breadth_core::{
    AlgorithmParameters, AlgorithmType, BreadthCalculationConfig, BreadthError, ComponentWeights,
    ConfigVersion, MarketPhase, NormalizationMode, PersistenceError, RawBreadthRecord,
    ScalingPolicy, Sector,
};
use breadth_engine::{
    AlgorithmRegistry, AlgorithmSelection, BreadthEngine, ConfigDraft, InMemoryBreadthStore,
};
use breadth_risk::{BreadthTier, PortfolioParams, VixRegime};
use chrono::NaiveDate;
use proptest::prelude::*;
use rust_decimal_macros::dec;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn full_record(day: &str, up4: f64, down4: f64, t2108: f64) -> RawBreadthRecord {
    let mut raw = RawBreadthRecord::for_date(day);
    raw.advancing_issues = Some(2400.0);
    raw.declining_issues = Some(1100.0);
    raw.new_highs = Some(120.0);
    raw.new_lows = Some(30.0);
    raw.up_volume = Some(2.1e9);
    raw.down_volume = Some(1.3e9);
    raw.stocks_up_4pct = Some(up4);
    raw.stocks_down_4pct = Some(down4);
    raw.stocks_up_13pct_34days = Some(1500.0);
    raw.stocks_down_13pct_34days = Some(700.0);
    raw.stocks_up_25pct_quarter = Some(900.0);
    raw.stocks_down_25pct_quarter = Some(400.0);
    raw.stocks_up_25pct_month = Some(300.0);
    raw.stocks_down_25pct_month = Some(150.0);
    raw.stocks_up_50pct_month = Some(60.0);
    raw.stocks_down_50pct_month = Some(40.0);
    raw.ratio_5day = Some(1.8);
    raw.ratio_10day = Some(1.4);
    raw.t2108 = Some(t2108);
    raw.vix = Some(16.5);
    raw.index_level = Some(5600.0);
    raw.worden_universe = Some(6000.0);
    for sector in Sector::ALL {
        raw.sectors.insert(sector, 62.0);
    }
    raw
}

fn engine_with(records: Vec<RawBreadthRecord>) -> BreadthEngine<InMemoryBreadthStore> {
    BreadthEngine::with_defaults(Arc::new(InMemoryBreadthStore::with_records(records))).unwrap()
}

#[tokio::test]
async fn test_single_calculation_is_persisted() {
    let engine = engine_with(vec![]);
    let raw = full_record("2025-03-04", 600.0, 150.0, 68.0);

    let calc = engine.calculate_single(&raw, None, true).await.unwrap();
    let id = calc.id.expect("persisted result id");

    assert_eq!(calc.result.date, date(2025, 3, 4));
    assert_eq!(calc.result.metadata.algorithm_used, AlgorithmType::SixFactor);
    assert!(calc.result.metadata.config_version.is_builtin());
    assert_eq!(calc.result.confidence, 1.0);
    assert_eq!(calc.result.market_condition.phase, MarketPhase::Bull);
    assert_eq!(engine.store().get_result(id).await, Some(calc.result));

    engine.delete_result(id).await.unwrap();
    assert_eq!(engine.store().result_count().await, 0);
}

#[tokio::test]
async fn test_single_calculation_without_persist() {
    let engine = engine_with(vec![]);
    let raw = full_record("2025-03-04", 300.0, 300.0, 50.0);

    let calc = engine
        .calculate_single(&raw, Some(AlgorithmType::Normalized), false)
        .await
        .unwrap();
    assert!(calc.id.is_none());
    assert_eq!(calc.result.metadata.algorithm_used, AlgorithmType::Normalized);
    assert_eq!(engine.store().result_count().await, 0);
}

#[tokio::test]
async fn test_invalid_record_reports_every_field() {
    let engine = engine_with(vec![]);
    let mut raw = full_record("2025-03-04", 300.0, 300.0, 50.0);
    raw.t2108 = Some(140.0);
    raw.stocks_down_4pct = Some(-1.0);

    let report = engine.validate_data(&raw);
    assert!(!report.is_valid);
    assert_eq!(report.errors.len(), 2);

    let err = engine.calculate_single(&raw, None, true).await.unwrap_err();
    assert!(err.is_recoverable());
    assert_eq!(err.field_errors().len(), 2);
    assert_eq!(engine.store().result_count().await, 0);
}

#[tokio::test]
async fn test_estimated_fields_are_flagged() {
    let engine = engine_with(vec![]);
    let mut raw = RawBreadthRecord::for_date("2025-03-04");
    raw.advancing_issues = Some(2000.0);
    raw.declining_issues = Some(1000.0);
    raw.t2108 = Some(55.0);

    let result = engine.calculate_single(&raw, None, false).await.unwrap().result;
    assert!(result
        .metadata
        .warnings
        .iter()
        .any(|w| w.contains("estimated")));
    // 2000 × 0.12 / (240 + 120)
    assert!((result.components.primary_score - 240.0 / 360.0).abs() < 1e-12);
}

#[tokio::test]
async fn test_historical_sorted_and_skips_invalid_days() {
    let mut bad = full_record("2025-03-03", 300.0, 300.0, 50.0);
    bad.t2108 = Some(150.0);
    let engine = engine_with(vec![
        full_record("2025-03-05", 500.0, 100.0, 60.0),
        bad,
        full_record("2025-03-04", 200.0, 400.0, 30.0),
        full_record("2025-03-06", 200.0, 400.0, 30.0),
    ]);

    let run = engine
        .calculate_historical_with_cancel(
            date(2025, 3, 3),
            date(2025, 3, 5),
            None,
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    let dates: Vec<NaiveDate> = run.results.iter().map(|r| r.date).collect();
    assert_eq!(dates, vec![date(2025, 3, 4), date(2025, 3, 5)]);
    assert_eq!(run.skipped.len(), 1);
    assert_eq!(run.skipped[0].date.as_deref(), Some("2025-03-03"));
    assert_eq!(run.skipped[0].errors[0].field, "t2108");
    assert!(!run.cancelled);

    let plain = engine
        .calculate_historical(date(2025, 3, 1), date(2025, 3, 31), None)
        .await
        .unwrap();
    assert_eq!(plain.len(), 3);
}

#[tokio::test]
async fn test_historical_cancelled_before_start() {
    let engine = engine_with(vec![
        full_record("2025-03-04", 200.0, 400.0, 30.0),
        full_record("2025-03-05", 500.0, 100.0, 60.0),
    ]);
    let token = CancellationToken::new();
    token.cancel();

    let run = engine
        .calculate_historical_with_cancel(date(2025, 3, 1), date(2025, 3, 31), None, &token)
        .await
        .unwrap();
    assert!(run.cancelled);
    assert!(run.results.is_empty());
}

#[tokio::test]
async fn test_historical_rejects_inverted_range() {
    let engine = engine_with(vec![]);
    let err = engine
        .calculate_historical(date(2025, 3, 5), date(2025, 3, 1), None)
        .await
        .unwrap_err();
    match err {
        BreadthError::Validation(v) => assert!(v.has_field("date_range")),
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_real_time_uses_latest_record() {
    let engine = engine_with(vec![]);
    let err = engine.calculate_real_time(None).await.unwrap_err();
    assert!(matches!(
        err,
        BreadthError::Persistence(PersistenceError::NotFound(_))
    ));

    engine
        .store()
        .insert_record(full_record("2025-03-04", 200.0, 400.0, 30.0))
        .await;
    engine
        .store()
        .insert_record(full_record("2025-03-07", 500.0, 100.0, 60.0))
        .await;
    engine
        .store()
        .insert_record(full_record("2025-03-05", 300.0, 300.0, 50.0))
        .await;

    let result = engine.calculate_real_time(None).await.unwrap();
    assert_eq!(result.date, date(2025, 3, 7));
}

#[tokio::test]
async fn test_config_versions_and_single_default() {
    let engine = engine_with(vec![]);
    let draft = ConfigDraft::new(
        ComponentWeights::new(0.5, 0.2, 0.2, 0.1),
        ScalingPolicy::default(),
    );

    let v1 = engine
        .create_config(AlgorithmType::SixFactor, "tuned", &draft)
        .await
        .unwrap();
    let v2 = engine
        .create_config(AlgorithmType::SixFactor, "tuned-2", &draft)
        .await
        .unwrap();
    assert_eq!(v1, ConfigVersion(1));
    assert_eq!(v2, ConfigVersion(2));

    let stored = engine.load_configs().await.unwrap();
    let first = stored.iter().find(|c| c.version == v1).unwrap();
    assert_eq!(first.weights, draft.weights);
    assert_eq!(first.scaling, draft.scaling);
    assert_eq!(first.name, "tuned");

    // 기본 설정이 없으면 내장 설정
    let selection = engine.resolve_selection(None).await.unwrap();
    assert!(selection.config.version.is_builtin());

    engine.set_default_config(v1).await.unwrap();
    engine.set_default_config(v2).await.unwrap();

    let defaults: Vec<ConfigVersion> = engine
        .load_configs()
        .await
        .unwrap()
        .into_iter()
        .filter(|c| c.algorithm == AlgorithmType::SixFactor && c.is_default)
        .map(|c| c.version)
        .collect();
    assert_eq!(defaults, vec![v2]);

    let raw = full_record("2025-03-04", 600.0, 150.0, 68.0);
    let calc = engine.calculate_single(&raw, None, false).await.unwrap();
    assert_eq!(calc.result.metadata.config_version, v2);
}

#[tokio::test]
async fn test_default_config_parameters_reach_the_algorithm() {
    let engine = engine_with(vec![]);
    let raw = full_record("2025-03-04", 600.0, 150.0, 68.0);
    let builtin = engine
        .calculate_single(&raw, Some(AlgorithmType::Normalized), false)
        .await
        .unwrap();

    let builtin_config = BreadthCalculationConfig::builtin(AlgorithmType::Normalized);
    let draft = ConfigDraft::from(&builtin_config).with_parameters(AlgorithmParameters {
        net_advance_gain: 1.0,
        ..Default::default()
    });
    let version = engine
        .create_config(AlgorithmType::Normalized, "gentle", &draft)
        .await
        .unwrap();
    engine.set_default_config(version).await.unwrap();

    let tuned = engine
        .calculate_single(&raw, Some(AlgorithmType::Normalized), false)
        .await
        .unwrap();
    assert_eq!(tuned.result.metadata.config_version, version);
    // 완만한 기울기는 같은 순상승 폭을 중립 쪽으로 당김
    assert!(tuned.result.components.primary_score < builtin.result.components.primary_score);
    assert!(tuned.result.components.primary_score > 0.5);
    assert_eq!(
        tuned.result.components.secondary_score,
        builtin.result.components.secondary_score
    );

    let bad = draft.with_parameters(AlgorithmParameters {
        net_advance_gain: f64::NAN,
        ..Default::default()
    });
    assert!(engine
        .create_config(AlgorithmType::Normalized, "nan", &bad)
        .await
        .unwrap_err()
        .is_fatal());
}

#[tokio::test]
async fn test_invalid_config_draft_is_fatal() {
    let engine = engine_with(vec![]);
    let draft = ConfigDraft::new(
        ComponentWeights::new(0.0, 0.0, 0.0, 0.0),
        ScalingPolicy::default(),
    );
    let err = engine
        .create_config(AlgorithmType::Custom, "zero", &draft)
        .await
        .unwrap_err();
    assert!(err.is_fatal());
    assert!(engine.load_configs().await.unwrap().is_empty());

    assert!(engine.set_default_config(ConfigVersion(7)).await.is_err());
}

#[tokio::test]
async fn test_switch_algorithm() {
    let engine = engine_with(vec![]);
    let mut selection = AlgorithmSelection::builtin(AlgorithmType::SixFactor);

    assert!(!engine
        .switch_algorithm(&mut selection, AlgorithmType::SixFactor)
        .await
        .unwrap());
    assert!(engine
        .switch_algorithm(&mut selection, AlgorithmType::SectorWeighted)
        .await
        .unwrap());
    assert_eq!(selection.algorithm, AlgorithmType::SectorWeighted);
    assert_eq!(selection.config.algorithm, AlgorithmType::SectorWeighted);

    let raw = full_record("2025-03-04", 600.0, 150.0, 68.0);
    let result = engine.score(&raw, &selection).unwrap();
    assert_eq!(result.metadata.algorithm_used, AlgorithmType::SectorWeighted);
}

#[test]
fn test_unknown_algorithm_name_is_fatal() {
    assert!(AlgorithmRegistry::find("momentum").unwrap_err().is_fatal());
    assert_eq!(
        AlgorithmRegistry::find("6factor").unwrap().algorithm,
        AlgorithmType::SixFactor
    );
}

#[test]
fn test_trade_plan_from_record() {
    let engine = engine_with(vec![]);
    let raw = full_record("2025-03-04", 1200.0, 200.0, 15.0);

    let inputs = engine.breadth_inputs(&raw).unwrap();
    assert_eq!(inputs.up4, 1200);
    assert_eq!(inputs.down4, 200);

    let plan = engine
        .plan_trade(
            inputs,
            12.0,
            PortfolioParams::new(dec!(100000)),
            date(2025, 3, 6),
            dec!(100),
            None,
        )
        .unwrap();
    assert_eq!(plan.sizing.breadth_tier, BreadthTier::BigOpportunity);
    assert_eq!(plan.sizing.vix_regime, VixRegime::UltraLow);
    assert_eq!(plan.exit.regime, VixRegime::UltraLow);
    assert!(plan.exit.exit_date > date(2025, 3, 6));
    // T2108 15 → ultra_low -4% 손절을 ×0.8
    assert_eq!(plan.exit.stop_loss, dec!(96.8));
}

proptest! {
    #[test]
    fn prop_score_within_range_and_confidence_bounded(
        up4 in 0u32..3000,
        down4 in 0u32..3000,
        t2108 in 0.0f64..=100.0,
        sector in 0.0f64..=100.0,
        alg in 0usize..4,
    ) {
        let engine = engine_with(vec![]);
        let mut raw = full_record("2025-03-04", f64::from(up4), f64::from(down4), t2108);
        raw.sectors.insert(Sector::Energy, sector);
        let selection = AlgorithmSelection::builtin(AlgorithmType::ALL[alg]);

        let result = engine.score(&raw, &selection).unwrap();
        prop_assert!((0.0..=100.0).contains(&result.normalized_score));
        prop_assert!(result.confidence > 0.0 && result.confidence <= 1.0);
        prop_assert!((0.0..=1.0).contains(&result.raw_score));
    }

    #[test]
    fn prop_config_round_trip_keeps_weights_and_scaling(
        weights in (0.0f64..1.0, 0.0f64..1.0, 0.0f64..1.0, 0.01f64..1.0),
        sigmoid in any::<bool>(),
        alg in 0usize..4,
    ) {
        let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
        let engine = engine_with(vec![]);
        let mut scaling = ScalingPolicy::default();
        if sigmoid {
            scaling.normalization = NormalizationMode::Sigmoid;
        }
        let draft = ConfigDraft::new(
            ComponentWeights::new(weights.0, weights.1, weights.2, weights.3),
            scaling,
        );
        let algorithm = AlgorithmType::ALL[alg];

        let stored = runtime.block_on(async {
            let version = engine.create_config(algorithm, "prop", &draft).await.unwrap();
            engine.set_default_config(version).await.unwrap();
            engine.resolve_selection(Some(algorithm)).await.unwrap()
        });
        prop_assert_eq!(stored.config.weights, draft.weights);
        prop_assert_eq!(stored.config.scaling, draft.scaling);
        prop_assert!(stored.config.is_default);
    }
}
