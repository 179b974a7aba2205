//! 설정 관리.
//!
//! TOML 파일과 `BREADTH__*` 환경 변수에서 애플리케이션 설정을 로드합니다.

use breadth_core::{AlgorithmType, BreadthError, CoreResult, LogConfig};
use breadth_risk::BidbackConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// 애플리케이션 설정.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    /// 로깅 설정
    #[serde(default)]
    pub logging: LogConfig,
    /// 점수 엔진 설정
    #[serde(default)]
    pub engine: EngineConfig,
    /// BIDBACK 사이징 설정
    #[serde(default)]
    pub bidback: BidbackConfig,
    /// 휴장일 캘린더 설정
    #[serde(default)]
    pub calendar: CalendarConfig,
}

/// 점수 엔진 설정.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct EngineConfig {
    /// 알고리즘을 지정하지 않은 호출에 쓰이는 알고리즘
    #[serde(default = "default_algorithm")]
    pub default_algorithm: AlgorithmType,
    /// 신뢰도 하한 (0 < x ≤ 1)
    #[serde(default = "default_min_confidence")]
    pub min_confidence: f64,
    /// 선택 필드 완전도가 이 값보다 낮으면 경고
    #[serde(default = "default_sparse_warning_threshold")]
    pub sparse_warning_threshold: f64,
}

fn default_algorithm() -> AlgorithmType {
    AlgorithmType::SixFactor
}

fn default_min_confidence() -> f64 {
    0.1
}

fn default_sparse_warning_threshold() -> f64 {
    0.5
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_algorithm: default_algorithm(),
            min_confidence: default_min_confidence(),
            sparse_warning_threshold: default_sparse_warning_threshold(),
        }
    }
}

/// 휴장일 캘린더 설정.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct CalendarConfig {
    /// 생성할 첫 연도
    #[serde(default = "default_first_year")]
    pub first_year: i32,
    /// 생성할 마지막 연도
    #[serde(default = "default_last_year")]
    pub last_year: i32,
}

fn default_first_year() -> i32 {
    2007
}

fn default_last_year() -> i32 {
    2035
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self {
            first_year: default_first_year(),
            last_year: default_last_year(),
        }
    }
}

impl AppConfig {
    /// 파일과 환경 변수에서 설정을 로드합니다.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, config::ConfigError> {
        let builder = config::Config::builder()
            // 파일에서 로드
            .add_source(config::File::from(path.as_ref()))
            // 환경 변수로 오버라이드
            .add_source(
                config::Environment::with_prefix("BREADTH")
                    .separator("__")
                    .try_parsing(true),
            );

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// 기본 경로에서 설정을 로드합니다.
    pub fn load_default() -> Result<Self, config::ConfigError> {
        Self::load("config/default.toml")
    }

    /// TOML 문자열에서 설정을 파싱합니다.
    pub fn from_toml_str(s: &str) -> CoreResult<Self> {
        toml::from_str(s).map_err(|e| BreadthError::config(e.to_string()))
    }

    /// 설정 값을 검증합니다.
    pub fn validate(&self) -> CoreResult<()> {
        let engine = &self.engine;
        if !(engine.min_confidence > 0.0 && engine.min_confidence <= 1.0) {
            return Err(BreadthError::config(format!(
                "engine.min_confidence must be in (0, 1], got {}",
                engine.min_confidence
            )));
        }
        if !(0.0..=1.0).contains(&engine.sparse_warning_threshold) {
            return Err(BreadthError::config(
                "engine.sparse_warning_threshold must be in [0, 1]",
            ));
        }
        if self.calendar.first_year > self.calendar.last_year {
            return Err(BreadthError::config(
                "calendar.first_year must not be after calendar.last_year",
            ));
        }
        self.bidback
            .validate()
            .map_err(|e| BreadthError::config(format!("bidback: {}", e)))
    }
}
