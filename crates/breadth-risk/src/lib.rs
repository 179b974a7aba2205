//! BIDBACK 리스크 규칙.
//!
//! 이 crate는 다음 기능을 제공합니다:
//! - breadth 구간/VIX 구간 규칙 테이블
//! - 포지션 사이징 (Big Opportunity, Avoid Entry, 포트폴리오 상한)
//! - 휴장일을 고려한 청산일 및 손절/익절 가격 계산
//! - true range / T2108 손절 보정과 분할 청산 단계
//!
//! # 예제
//!
//! ```rust,ignore
//! use breadth_risk::{BidbackConfig, BreadthInputs, PortfolioParams, PositionRiskCalculator};
//!
//! let calculator = PositionRiskCalculator::new(BidbackConfig::default());
//! let decision = calculator.compute(
//!     BreadthInputs::new(500, 200, 50.0),
//!     20.0,
//!     PortfolioParams::new(dec!(100000)),
//! )?;
//! assert_eq!(decision.final_amount, dec!(15000));
//! ```

pub mod config;
pub mod exit_plan;
pub mod position_sizing;
pub mod tiers;

// 주요 타입 재내보내기
pub use config::{BidbackConfig, ConfigValidationError};
pub use exit_plan::{
    ExitAdjustments, ExitPlan, ExitScheduler, ExitTrigger, ScaleOutStep, StopBasis, MAX_PRICE,
};
pub use position_sizing::{
    BreadthInputs, PortfolioParams, PositionRiskCalculator, PositionSizingDecision,
    MAX_PORTFOLIO_SIZE,
};
pub use tiers::{
    breadth_rule, vix_tier, BreadthRule, BreadthTier, VixExitTier, VixRegime, BREADTH_RULES,
    VIX_EXIT_TIERS,
};
