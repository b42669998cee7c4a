//! 기술적 분석 엔진.
//!
//! 이 크레이트는 다음을 제공합니다:
//! - 기술적 지표 (추세, 모멘텀, 변동성, 거래량, 피벗 포인트)
//! - 가격 레벨 (지지/저항, 피보나치)
//! - 캔들스틱 패턴 인식과 정적 신뢰도 카탈로그
//! - 시장 요약 (추세 강도, 신호 분포, 심리, 가격 목표)
//! - 분석 파사드 [`analyze`]
//!
//! # 사용 예시
//!
//! ```ignore
//! use chartist_analytics::{analyze, AnalysisConfig};
//! use chartist_core::BarSeries;
//!
//! let series = BarSeries::new(bars)?;
//! let result = analyze(&series, &AnalysisConfig::default());
//! println!("{}", result.to_json_pretty()?);
//! ```

pub mod analysis;
pub mod config;
pub mod indicators;
pub mod levels;
pub mod patterns;
pub mod summary;

pub use analysis::{analyze, analyze_bars, AnalysisError, AnalysisReport, AnalysisResult};
pub use config::AnalysisConfig;

// Indicators 모듈 re-exports
pub use indicators::{
    IndicatorBatch, IndicatorEngine, IndicatorError, IndicatorKind, IndicatorRequest,
    IndicatorResult, IndicatorSeries, IndicatorValue, SkippedComputation,
};

// Levels 모듈 re-exports
pub use levels::{FibonacciLevels, LevelsSnapshot, PriceLevel, SupportResistance};

// Patterns 모듈 re-exports
pub use patterns::{
    CandlePatternType, PatternDirection, PatternOccurrence, PatternParams, PatternRecognizer,
    PatternStatistics, Reliability,
};

// Summary 모듈 re-exports
pub use summary::{MarketSummary, Sentiment};
