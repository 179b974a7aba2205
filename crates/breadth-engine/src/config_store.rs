//! 버전 관리되는 계산 설정 집합체.
//!
//! 설정 버전 목록(추가 전용)과 알고리즘별 기본 포인터 하나를 함께 관리합니다.
//! "알고리즘당 기본 설정은 정확히 하나" 불변식은 이 타입 안에서만 유지됩니다.

use breadth_core::{
    AlgorithmParameters, AlgorithmType, BreadthCalculationConfig, BreadthError, ComponentWeights,
    ConfigVersion, CoreResult, ScalingPolicy,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 새 설정 버전의 내용.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigDraft {
    pub weights: ComponentWeights,
    #[serde(default)]
    pub scaling: ScalingPolicy,
    #[serde(default)]
    pub parameters: AlgorithmParameters,
}

impl ConfigDraft {
    pub fn new(weights: ComponentWeights, scaling: ScalingPolicy) -> Self {
        Self {
            weights,
            scaling,
            parameters: AlgorithmParameters::default(),
        }
    }

    /// 알고리즘 파라미터를 지정합니다.
    pub fn with_parameters(mut self, parameters: AlgorithmParameters) -> Self {
        self.parameters = parameters;
        self
    }

    /// 가중치, 스케일링, 파라미터 검증.
    pub fn validate(&self) -> CoreResult<()> {
        self.weights.validate()?;
        self.scaling.validate()?;
        self.parameters.validate()
    }
}

impl From<&BreadthCalculationConfig> for ConfigDraft {
    fn from(config: &BreadthCalculationConfig) -> Self {
        Self {
            weights: config.weights,
            scaling: config.scaling,
            parameters: config.parameters,
        }
    }
}

/// 설정 집합체.
#[derive(Debug, Clone, Default)]
pub struct ConfigSet {
    versions: Vec<BreadthCalculationConfig>,
    defaults: BTreeMap<AlgorithmType, ConfigVersion>,
}

impl ConfigSet {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_version(&self) -> ConfigVersion {
        let last = self.versions.last().map_or(0, |c| c.version.0);
        ConfigVersion(last + 1)
    }

    fn position(&self, version: ConfigVersion) -> Option<usize> {
        self.versions.iter().position(|c| c.version == version)
    }

    /// 새 설정 버전을 추가합니다 (1부터 단조 증가).
    pub fn append(
        &mut self,
        algorithm: AlgorithmType,
        name: &str,
        draft: &ConfigDraft,
        created_at: DateTime<Utc>,
    ) -> CoreResult<ConfigVersion> {
        let name = name.trim();
        if name.is_empty() {
            return Err(BreadthError::config("config name must not be empty"));
        }

        let config = BreadthCalculationConfig {
            version: self.next_version(),
            name: name.to_string(),
            algorithm,
            weights: draft.weights,
            scaling: draft.scaling,
            parameters: draft.parameters,
            is_active: true,
            is_default: false,
            created_at,
        };
        config.validate()?;

        let version = config.version;
        self.versions.push(config);
        Ok(version)
    }

    /// 기본 설정을 지정합니다.
    ///
    /// 같은 알고리즘의 이전 기본 설정은 같은 호출 안에서 해제됩니다.
    pub fn set_default(&mut self, version: ConfigVersion) -> CoreResult<AlgorithmType> {
        let index = self
            .position(version)
            .ok_or_else(|| BreadthError::config(format!("Unknown config version: {}", version)))?;
        let config = &self.versions[index];
        if !config.is_active {
            return Err(BreadthError::config(format!(
                "config {} is inactive and cannot become the default",
                version
            )));
        }
        let algorithm = config.algorithm;
        self.defaults.insert(algorithm, version);
        Ok(algorithm)
    }

    /// 설정을 비활성화합니다. 기본 설정은 비활성화할 수 없습니다.
    pub fn deactivate(&mut self, version: ConfigVersion) -> CoreResult<()> {
        let index = self
            .position(version)
            .ok_or_else(|| BreadthError::config(format!("Unknown config version: {}", version)))?;
        let algorithm = self.versions[index].algorithm;
        if self.defaults.get(&algorithm) == Some(&version) {
            return Err(BreadthError::config(format!(
                "config {} is the default for {}; choose another default first",
                version, algorithm
            )));
        }
        self.versions[index].is_active = false;
        Ok(())
    }

    fn project(&self, config: &BreadthCalculationConfig) -> BreadthCalculationConfig {
        let mut projected = config.clone();
        projected.is_default = self.defaults.get(&config.algorithm) == Some(&config.version);
        projected
    }

    /// 버전으로 조회 (`is_default` 투영 포함).
    pub fn get(&self, version: ConfigVersion) -> Option<BreadthCalculationConfig> {
        self.position(version).map(|i| self.project(&self.versions[i]))
    }

    /// 전체 설정 (버전 오름차순, `is_default` 투영 포함).
    pub fn configs(&self) -> Vec<BreadthCalculationConfig> {
        self.versions.iter().map(|c| self.project(c)).collect()
    }

    /// 알고리즘의 기본 설정.
    pub fn default_for(&self, algorithm: AlgorithmType) -> Option<BreadthCalculationConfig> {
        self.defaults.get(&algorithm).and_then(|v| self.get(*v))
    }

    /// 기본 설정이 있으면 그것을, 없으면 내장 설정을 반환합니다.
    pub fn resolve(&self, algorithm: AlgorithmType) -> BreadthCalculationConfig {
        self.default_for(algorithm)
            .unwrap_or_else(|| BreadthCalculationConfig::builtin(algorithm))
    }

    pub fn len(&self) -> usize {
        self.versions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }
}

/// 설정 목록에서 알고리즘의 기본 설정을 고릅니다 (없으면 내장 설정).
pub fn select_default(
    configs: &[BreadthCalculationConfig],
    algorithm: AlgorithmType,
) -> BreadthCalculationConfig {
    configs
        .iter()
        .find(|c| c.algorithm == algorithm && c.is_default && c.is_active)
        .cloned()
        .unwrap_or_else(|| BreadthCalculationConfig::builtin(algorithm))
}
