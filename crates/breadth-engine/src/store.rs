//! 저장소 협력자 포트.
//!
//! 엔진은 스토리지/네트워크 로직을 갖지 않습니다. 원시 레코드 조회,
//! 결과 저장, 설정 관리는 모두 [`BreadthStore`] 구현체에 위임하며,
//! 구현체가 반환한 [`PersistenceError`]는 가공 없이 전파됩니다.

use crate::config_store::{ConfigDraft, ConfigSet};
use async_trait::async_trait;
use breadth_core::{
    AlgorithmType, BreadthCalculationConfig, BreadthResult, ConfigVersion, CoreResult,
    PersistenceError, RawBreadthRecord,
};
use chrono::{NaiveDate, Utc};
use std::collections::HashMap;
use tokio::sync::{Mutex, RwLock};
use tracing::debug;
use uuid::Uuid;

/// breadth 데이터/결과/설정 저장소.
#[async_trait]
pub trait BreadthStore: Send + Sync {
    /// 날짜 범위의 원시 레코드 (날짜 오름차순).
    async fn get_breadth_data(
        &self,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> CoreResult<Vec<RawBreadthRecord>>;

    /// 계산 결과 저장.
    async fn save_breadth_result(&self, result: &BreadthResult) -> CoreResult<Uuid>;

    /// 계산 결과 삭제.
    async fn delete_breadth_result(&self, id: Uuid) -> CoreResult<()>;

    /// 전체 설정 (`is_default` 투영 포함).
    async fn load_configs(&self) -> CoreResult<Vec<BreadthCalculationConfig>>;

    /// 새 설정 버전 생성.
    async fn create_config(
        &self,
        algorithm: AlgorithmType,
        name: &str,
        draft: &ConfigDraft,
    ) -> CoreResult<ConfigVersion>;

    /// 기본 설정 지정 (이전 기본값 해제와 함께 원자적으로).
    async fn set_default_config(&self, version: ConfigVersion) -> CoreResult<()>;
}

/// 메모리 저장소.
///
/// 설정 쓰기는 [`ConfigSet`]을 감싼 하나의 `Mutex`로 직렬화됩니다.
#[derive(Debug, Default)]
pub struct InMemoryBreadthStore {
    records: RwLock<Vec<RawBreadthRecord>>,
    results: RwLock<HashMap<Uuid, BreadthResult>>,
    configs: Mutex<ConfigSet>,
}

pub(crate) fn record_date(record: &RawBreadthRecord) -> Option<NaiveDate> {
    record
        .date
        .as_deref()
        .and_then(|d| NaiveDate::parse_from_str(d.trim(), "%Y-%m-%d").ok())
}

/// 날짜를 해석할 수 있는 레코드 중 가장 늦은 것.
pub(crate) fn latest(records: &[RawBreadthRecord]) -> Option<&RawBreadthRecord> {
    records
        .iter()
        .filter_map(|r| record_date(r).map(|d| (d, r)))
        .max_by_key(|(d, _)| *d)
        .map(|(_, r)| r)
}

impl InMemoryBreadthStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 초기 레코드로 생성.
    pub fn with_records(records: Vec<RawBreadthRecord>) -> Self {
        Self {
            records: RwLock::new(records),
            ..Default::default()
        }
    }

    /// 레코드 추가.
    pub async fn insert_record(&self, record: RawBreadthRecord) {
        self.records.write().await.push(record);
    }

    /// 날짜가 가장 늦은 레코드.
    pub async fn latest_record(&self) -> Option<RawBreadthRecord> {
        latest(&self.records.read().await).cloned()
    }

    /// 저장된 결과 조회.
    pub async fn get_result(&self, id: Uuid) -> Option<BreadthResult> {
        self.results.read().await.get(&id).cloned()
    }

    /// 저장된 결과 수.
    pub async fn result_count(&self) -> usize {
        self.results.read().await.len()
    }

    /// 설정 비활성화.
    pub async fn deactivate_config(&self, version: ConfigVersion) -> CoreResult<()> {
        self.configs.lock().await.deactivate(version)
    }
}

#[async_trait]
impl BreadthStore for InMemoryBreadthStore {
    async fn get_breadth_data(
        &self,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> CoreResult<Vec<RawBreadthRecord>> {
        let records = self.records.read().await;
        let bounded = start.is_some() || end.is_some();

        // 날짜를 해석할 수 없는 레코드는 범위 조회에서 제외하고,
        // 전체 조회에서는 검증 게이트가 보고하도록 맨 앞에 둡니다.
        let mut selected: Vec<(Option<NaiveDate>, RawBreadthRecord)> = records
            .iter()
            .filter_map(|r| {
                let date = record_date(r);
                let keep = match date {
                    Some(d) => start.map_or(true, |s| d >= s) && end.map_or(true, |e| d <= e),
                    None => !bounded,
                };
                keep.then(|| (date, r.clone()))
            })
            .collect();
        selected.sort_by_key(|(date, _)| *date);

        debug!(count = selected.len(), ?start, ?end, "Breadth data loaded");
        Ok(selected.into_iter().map(|(_, r)| r).collect())
    }

    async fn save_breadth_result(&self, result: &BreadthResult) -> CoreResult<Uuid> {
        let id = Uuid::new_v4();
        self.results.write().await.insert(id, result.clone());
        Ok(id)
    }

    async fn delete_breadth_result(&self, id: Uuid) -> CoreResult<()> {
        match self.results.write().await.remove(&id) {
            Some(_) => Ok(()),
            None => Err(PersistenceError::NotFound(format!("breadth result {}", id)).into()),
        }
    }

    async fn load_configs(&self) -> CoreResult<Vec<BreadthCalculationConfig>> {
        Ok(self.configs.lock().await.configs())
    }

    async fn create_config(
        &self,
        algorithm: AlgorithmType,
        name: &str,
        draft: &ConfigDraft,
    ) -> CoreResult<ConfigVersion> {
        self.configs
            .lock()
            .await
            .append(algorithm, name, draft, Utc::now())
    }

    async fn set_default_config(&self, version: ConfigVersion) -> CoreResult<()> {
        self.configs.lock().await.set_default(version).map(|_| ())
    }
}
