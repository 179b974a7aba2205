//! # Breadth Engine
//!
//! 일별 market breadth 레코드를 점수화하는 엔진입니다.
//!
//! 포함 모듈:
//! - `validation`: 원시 레코드 검증 게이트
//! - `resolver`: 필드 이름/출처 해석
//! - `algorithms`: 알고리즘 레지스트리와 네 가지 내장 알고리즘
//! - `compositor`: 가중 합성, 스케일링, 신뢰도
//! - `classifier`: 시장 국면/강도/방향 분류
//! - `config_store`: 버전 관리되는 계산 설정
//! - `store`: 저장소 협력자 포트와 메모리 구현
//! - `quality`: 레코드 집합의 데이터 품질 보고서
//! - `engine`: 위 단계를 묶는 파사드
//! - `settings`: 애플리케이션 설정 로드

pub mod algorithms;
pub mod classifier;
pub mod compositor;
pub mod config_store;
pub mod engine;
pub mod quality;
pub mod resolver;
pub mod settings;
pub mod store;
pub mod validation;

pub use algorithms::{AlgorithmEntry, AlgorithmOutput, AlgorithmRegistry};
pub use classifier::classify;
pub use compositor::{Composite, ScoreCompositor};
pub use config_store::{select_default, ConfigDraft, ConfigSet};
pub use engine::{
    AlgorithmSelection, BreadthEngine, Calculation, HistoricalRun, SkippedDay, TradePlan,
};
pub use quality::{DataQualityReport, YearlyCompleteness};
pub use resolver::{BreadthField, FieldResolver, ResolutionSource, Resolved, ResolvedInputs};
pub use settings::{AppConfig, CalendarConfig, EngineConfig};
pub use store::{BreadthStore, InMemoryBreadthStore};
pub use validation::{ValidationGate, ValidationReport};
