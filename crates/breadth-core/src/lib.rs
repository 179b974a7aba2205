//! # Breadth Core
//!
//! 시장 폭(Market Breadth) 점수 계산과 BIDBACK 포지션 사이징의 핵심 도메인 모델을 제공합니다.
//!
//! 이 크레이트는 시스템 전반에서 사용되는 기본 타입을 제공합니다:
//! - 일별 원시 breadth 레코드와 검증된 레코드
//! - 점수 계산 결과 및 시장 상태
//! - 버전 관리되는 계산 설정
//! - 거래소 휴장일 캘린더
//! - 에러 타입
//! - 로깅 인프라

pub mod domain;
pub mod error;
pub mod logging;

pub use domain::*;
pub use error::*;
pub use logging::*;
