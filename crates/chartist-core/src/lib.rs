//! # Chartist Core
//!
//! 차트 분석의 핵심 데이터 모델과 공통 인프라를 제공합니다:
//! - OHLCV 바 및 검증된 불변 바 시리즈
//! - 바 간격(Interval) 정의
//! - 치명적 에러 분류 (`InvalidSeries`)
//! - Decimal 유틸리티
//! - 로깅 인프라

pub mod domain;
pub mod error;
pub mod logging;
pub mod types;

pub use domain::*;
pub use error::*;
pub use logging::*;
pub use types::*;
