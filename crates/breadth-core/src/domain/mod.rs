//! 도메인 모델.

mod calculation_config;
mod holiday;
mod record;
mod result;

pub use calculation_config::*;
pub use holiday::*;
pub use record::*;
pub use result::*;
