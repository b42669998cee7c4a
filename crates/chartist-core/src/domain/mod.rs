//! 분석 대상 도메인 모델.

mod bar;
mod series;

pub use bar::*;
pub use series::*;
