//! Breadth 계산 코어의 에러 타입.
//!
//! 에러는 세 가지로만 분류됩니다:
//! - **Validation**: 입력 범위 위반 또는 필수 필드 누락 (복구 가능, 전체 필드 목록 포함)
//! - **Configuration**: 알 수 없는 알고리즘, 잘못된 가중치/스케일링, 기본 설정 충돌
//! - **Persistence**: 저장소 협력자의 I/O 실패 (그대로 전파, 재시도 없음)

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// 검증에 실패한 단일 필드.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    /// 필드 이름 (예: "t2108", "sectors.technology")
    pub field: String,
    /// 사람이 읽을 수 있는 메시지
    pub message: String,
}

impl FieldError {
    /// 새 필드 에러 생성.
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// 검증 에러.
///
/// 첫 번째 에러에서 멈추지 않고 위반된 모든 필드를 담습니다.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{} field(s) failed validation: {}", .fields.len(), field_names(.fields))]
pub struct ValidationError {
    /// 위반된 필드 목록
    pub fields: Vec<FieldError>,
}

fn field_names(fields: &[FieldError]) -> String {
    fields
        .iter()
        .map(|f| f.field.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

impl ValidationError {
    /// 필드 에러 목록으로 생성.
    pub fn new(fields: Vec<FieldError>) -> Self {
        Self { fields }
    }

    /// 단일 필드 에러로 생성.
    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            fields: vec![FieldError::new(field, message)],
        }
    }

    /// 특정 필드가 포함되어 있는지 확인.
    pub fn has_field(&self, field: &str) -> bool {
        self.fields.iter().any(|f| f.field == field)
    }
}

/// `validator` 결과를 필드 에러 목록으로 변환합니다.
///
/// 맵 필드 검증기는 위반 키를 `keys` 파라미터로 넘기며, 이 경우
/// 키마다 `필드.키` 이름의 에러로 펼칩니다. 결과는 필드 이름 순이며
/// 필드당 첫 번째 메시지만 남깁니다.
impl From<validator::ValidationErrors> for ValidationError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields = Vec::new();
        for (field, errs) in errors.field_errors() {
            for e in errs.iter() {
                let message = e
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("invalid value ({})", e.code));
                match e.params.get("keys").and_then(|v| v.as_array()) {
                    Some(keys) => {
                        for key in keys.iter().filter_map(|k| k.as_str()) {
                            fields.push(FieldError::new(
                                format!("{}.{}", field, key),
                                message.clone(),
                            ));
                        }
                    }
                    None => fields.push(FieldError::new(field.to_string(), message)),
                }
            }
        }
        fields.sort_by(|a, b| a.field.cmp(&b.field));
        fields.dedup_by(|a, b| a.field == b.field);
        Self { fields }
    }
}

/// 저장소 협력자 에러.
///
/// 코어는 네트워크/스토리지 로직을 갖지 않으며 이 에러를 가공 없이 전파합니다.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PersistenceError {
    /// 레코드를 찾을 수 없음
    #[error("Record not found: {0}")]
    NotFound(String),

    /// 충돌 (중복 버전 등)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// 기타 I/O 실패
    #[error("I/O failure: {0}")]
    Io(String),
}

/// Breadth 코어 에러.
#[derive(Debug, Error)]
pub enum BreadthError {
    /// 검증 에러
    #[error("검증 에러: {0}")]
    Validation(#[from] ValidationError),

    /// 설정 에러
    #[error("설정 에러: {0}")]
    Configuration(String),

    /// 저장소 에러
    #[error("저장소 에러: {0}")]
    Persistence(#[from] PersistenceError),
}

impl From<validator::ValidationErrors> for BreadthError {
    fn from(errors: validator::ValidationErrors) -> Self {
        BreadthError::Validation(errors.into())
    }
}

/// 코어 작업을 위한 Result 타입.
pub type CoreResult<T> = Result<T, BreadthError>;

impl BreadthError {
    /// 설정 에러 생성 헬퍼.
    pub fn config(msg: impl Into<String>) -> Self {
        BreadthError::Configuration(msg.into())
    }

    /// 호출자가 입력을 고쳐 다시 시도할 수 있는 에러인지 확인합니다.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, BreadthError::Validation(_))
    }

    /// 요청된 작업에 치명적인 에러인지 확인합니다.
    pub fn is_fatal(&self) -> bool {
        matches!(self, BreadthError::Configuration(_))
    }

    /// 검증 에러의 필드 목록 (검증 에러가 아니면 빈 슬라이스).
    pub fn field_errors(&self) -> &[FieldError] {
        match self {
            BreadthError::Validation(v) => &v.fields,
            _ => &[],
        }
    }
}
