//! 분석 파사드 (Analysis Facade).
//!
//! 한 번의 [`analyze`] 호출은 하나의 바 시리즈를 끝까지 처리합니다:
//! 지표 엔진 → 가격 레벨 → 패턴 인식(ATR 정규화) → 시장 요약.
//! 공유 가변 상태가 없어 서로 다른 시리즈에 대해 병렬로 호출해도 안전합니다.

use std::collections::BTreeMap;

use chartist_core::{analysis_span, Bar, BarSeries, CoreError, Interval};
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::config::AnalysisConfig;
use crate::indicators::{
    IndicatorEngine, IndicatorRequest, IndicatorSeries, IndicatorValue, SkippedComputation,
};
use crate::levels::{fibonacci, support_resistance, LevelsSnapshot};
use crate::patterns::{PatternOccurrence, PatternRecognizer, PatternStatistics};
use crate::summary::{summarize, LatestReadings, MarketSummary};

/// 분석 에러.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// 바 시리즈 불변식 위반 (계산 시작 전)
    #[error(transparent)]
    InvalidSeries(#[from] CoreError),

    /// 설정 에러
    #[error("설정 에러: {0}")]
    Config(String),
}

impl AnalysisError {
    /// 분류 코드.
    pub fn code(&self) -> &'static str {
        match self {
            AnalysisError::InvalidSeries(e) => e.code(),
            AnalysisError::Config(_) => "Config",
        }
    }
}

/// 한 바 시리즈의 분석 결과.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisResult {
    pub symbol: Option<String>,
    pub interval: Option<Interval>,
    /// 바별 시각 (지표 값과 같은 인덱스)
    pub timestamps: Vec<DateTime<Utc>>,
    /// 계산된 지표 시리즈 (요청 순서)
    pub indicators: Vec<IndicatorSeries>,
    pub levels: LevelsSnapshot,
    /// 인식된 패턴 (완성 바 순서)
    pub patterns: Vec<PatternOccurrence>,
    pub pattern_stats: PatternStatistics,
    pub summary: Option<MarketSummary>,
    /// 건너뛴 지표/레벨/패턴 계열
    pub skipped: Vec<SkippedComputation>,
}

/// 리포트/UI 협력자에게 넘기는 중첩 매핑.
#[derive(Debug, Serialize)]
pub struct AnalysisReport<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symbol: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interval: Option<Interval>,
    pub bars: usize,
    /// 지표 이름 → {시각 → 값}
    pub indicators: BTreeMap<&'a str, BTreeMap<DateTime<Utc>, IndicatorValue>>,
    pub patterns: &'a [PatternOccurrence],
    pub pattern_statistics: &'a PatternStatistics,
    pub levels: &'a LevelsSnapshot,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<&'a MarketSummary>,
    pub skipped: &'a [SkippedComputation],
}

impl AnalysisResult {
    /// 이름으로 지표 시리즈를 찾습니다.
    pub fn indicator(&self, name: &str) -> Option<&IndicatorSeries> {
        self.indicators.iter().find(|s| s.name == name)
    }

    /// 중첩 매핑 리포트. 워밍업 구간(값 없음)은 생략됩니다.
    pub fn to_report(&self) -> AnalysisReport<'_> {
        let indicators = self
            .indicators
            .iter()
            .map(|series| {
                let values = self
                    .timestamps
                    .iter()
                    .zip(&series.values)
                    .filter_map(|(ts, v)| v.map(|v| (*ts, v)))
                    .collect();
                (series.name.as_str(), values)
            })
            .collect();

        AnalysisReport {
            symbol: self.symbol.as_deref(),
            interval: self.interval,
            bars: self.timestamps.len(),
            indicators,
            patterns: &self.patterns,
            pattern_statistics: &self.pattern_stats,
            levels: &self.levels,
            summary: self.summary.as_ref(),
            skipped: &self.skipped,
        }
    }

    pub fn to_json(&self) -> Result<String, CoreError> {
        Ok(serde_json::to_string(&self.to_report())?)
    }

    pub fn to_json_pretty(&self) -> Result<String, CoreError> {
        Ok(serde_json::to_string_pretty(&self.to_report())?)
    }
}

/// 검증된 바 시리즈를 분석합니다.
///
/// 데이터가 부족한 지표나 패턴 계열은 실패시키지 않고 `skipped`에 기록합니다.
pub fn analyze(series: &BarSeries, config: &AnalysisConfig) -> AnalysisResult {
    let span = match series.symbol() {
        Some(symbol) => analysis_span!("analyze", series.len(), symbol),
        None => analysis_span!("analyze", series.len()),
    };
    let _guard = span.enter();

    let engine = IndicatorEngine::new();
    let bars = series.bars();

    let batch = engine.compute_batch(series, &config.requests());
    let mut skipped = batch.skipped.clone();

    let levels = compute_levels(&engine, bars, config, &mut skipped);

    let (patterns, pattern_stats) = if config.pattern_detection.enabled {
        let atr = normalization_atr(&engine, series, &batch.series, config);
        let recognizer = PatternRecognizer::new(config.pattern_params());
        let patterns = recognizer.scan(bars, atr.as_deref());
        for family in recognizer.unavailable_families(bars.len()) {
            warn!(skipped = %family, "패턴 계열 건너뜀");
            skipped.push(family);
        }
        let stats = PatternStatistics::from_occurrences(&patterns);
        (patterns, stats)
    } else {
        (Vec::new(), PatternStatistics::default())
    };

    let summary = summarize(bars, &LatestReadings::from_batch(&batch), &levels);

    info!(
        indicators = batch.series.len(),
        patterns = patterns.len(),
        skipped = skipped.len(),
        "분석 완료"
    );

    AnalysisResult {
        symbol: series.symbol().map(str::to_string),
        interval: series.interval(),
        timestamps: series.timestamps(),
        indicators: batch.series,
        levels,
        patterns,
        pattern_stats,
        summary,
        skipped,
    }
}

/// 원시 바를 검증한 뒤 분석합니다. 불변식 위반은 계산 전에 실패합니다.
pub fn analyze_bars(bars: Vec<Bar>, config: &AnalysisConfig) -> Result<AnalysisResult, AnalysisError> {
    let series = BarSeries::new(bars)?;
    Ok(analyze(&series, config))
}

fn compute_levels(
    engine: &IndicatorEngine,
    bars: &[Bar],
    config: &AnalysisConfig,
    skipped: &mut Vec<SkippedComputation>,
) -> LevelsSnapshot {
    let mut record = |name: &str, reason| {
        let entry = SkippedComputation {
            name: name.to_string(),
            reason,
        };
        warn!(skipped = %entry, "레벨 계산 건너뜀");
        skipped.push(entry);
    };

    let mut levels = LevelsSnapshot::default();

    let sr = &config.levels.support_resistance;
    if sr.enabled {
        match support_resistance(bars, sr.params()) {
            Ok(found) => levels.support_resistance = Some(found),
            Err(e) => record("support_resistance", e),
        }
    }

    let fib = &config.levels.fibonacci;
    if fib.enabled {
        match fibonacci(bars, fib.lookback) {
            Ok(found) => levels.fibonacci = Some(found),
            Err(e) => record("fibonacci", e),
        }
    }

    let pivots = &config.indicators.pivot_points;
    if pivots.enabled {
        match engine.pivots().next(bars, pivots.method) {
            Ok(next) => levels.next_pivots = Some(next),
            Err(e) => record("next_pivot_points", e),
        }
    }

    levels
}

/// 패턴 정규화용 ATR. 지표 목록에 없으면 설정된 기간으로 따로 계산하며,
/// 계산할 수 없으면 `None`(바 범위로 정규화)입니다.
fn normalization_atr(
    engine: &IndicatorEngine,
    series: &BarSeries,
    computed: &[IndicatorSeries],
    config: &AnalysisConfig,
) -> Option<Vec<Option<rust_decimal::Decimal>>> {
    if let Some(atr) = computed.iter().find(|s| s.name == "atr") {
        return Some(atr.values.iter().map(|v| v.and_then(|v| v.as_single())).collect());
    }

    let request = IndicatorRequest::Atr(config.indicators.atr_params());
    engine
        .compute(series, &request)
        .ok()
        .map(|atr| atr.values.iter().map(|v| v.and_then(|v| v.as_single())).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{IndicatorError, IndicatorKind};
    use chrono::{Duration, TimeZone};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn wave(n: usize) -> Vec<Bar> {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        (0..n)
            .map(|i| {
                let swing = Decimal::from((i % 7) as i64) - dec!(3);
                let close = dec!(100) + Decimal::from(i as i64) * dec!(0.5) + swing;
                let open = close - dec!(0.8);
                Bar::new(
                    start + Duration::days(i as i64),
                    open,
                    close + dec!(1.2),
                    open - dec!(1.1),
                    close,
                    dec!(1000) + Decimal::from((i * 37 % 11) as i64) * dec!(50),
                )
            })
            .collect()
    }

    #[test]
    fn test_analyze_full_series() {
        let series = BarSeries::new(wave(260)).unwrap().with_meta("TEST", Interval::D1);
        let result = analyze(&series, &AnalysisConfig::default());

        assert_eq!(result.symbol.as_deref(), Some("TEST"));
        assert!(result.skipped.is_empty(), "{:?}", result.skipped);
        assert_eq!(result.indicators.len(), AnalysisConfig::default().requests().len());
        for series in &result.indicators {
            assert_eq!(series.len(), 260, "{}", series.name);
        }
        assert!(result.indicator("ema_200").is_some());
        assert!(result.levels.fibonacci.is_some());
        assert!(result.levels.next_pivots.is_some());
        assert!(result.summary.is_some());
        assert_eq!(result.pattern_stats.total, result.patterns.len());
    }

    #[test]
    fn test_short_series_partial_results() {
        let series = BarSeries::new(wave(10)).unwrap();
        let result = analyze(&series, &AnalysisConfig::default());

        let rsi = result.skipped.iter().find(|s| s.name == "rsi").unwrap();
        assert_eq!(
            rsi.reason,
            IndicatorError::InsufficientData {
                required: 15,
                provided: 10
            }
        );
        assert!(result.skipped.iter().any(|s| s.name == "ema_200"));
        assert!(result.indicator("ema_9").is_some());
        assert!(result.indicator("obv").is_some());
        assert!(result.summary.is_some());
    }

    #[test]
    fn test_analyze_bars_rejects_invalid_series() {
        let mut bars = wave(5);
        bars.swap(1, 2);
        let err = analyze_bars(bars, &AnalysisConfig::default()).unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidSeries(_)));
        assert_eq!(err.code(), "InvalidSeries");
    }

    #[test]
    fn test_disabled_patterns() {
        let mut config = AnalysisConfig::default();
        config.pattern_detection.enabled = false;
        let series = BarSeries::new(wave(30)).unwrap();
        let result = analyze(&series, &config);
        assert!(result.patterns.is_empty());
        assert!(!result.skipped.iter().any(|s| s.name.starts_with("pattern:")));
    }

    #[test]
    fn test_report_mapping() {
        let series = BarSeries::new(wave(40)).unwrap();
        let result = analyze(&series, &AnalysisConfig::default());
        let report = result.to_report();

        let sma_like = report.indicators.get("ema_9").unwrap();
        // EMA 9는 인덱스 8부터 값이 있음
        assert_eq!(sma_like.len(), 40 - 8);
        assert_eq!(sma_like.keys().next(), Some(&result.timestamps[8]));

        let json: serde_json::Value = serde_json::from_str(&result.to_json().unwrap()).unwrap();
        assert_eq!(json["bars"], 40);
        assert!(json["indicators"]["rsi"].is_object());
        assert!(json["skipped"].is_array());
        let pretty = result.to_json_pretty().unwrap();
        assert!(pretty.contains('\n'));

        let kinds: Vec<IndicatorKind> = result.indicators.iter().map(|s| s.kind).collect();
        assert!(kinds.contains(&IndicatorKind::PivotPoints));
    }
}
