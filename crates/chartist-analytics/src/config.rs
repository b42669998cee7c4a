//! 분석 설정.
//!
//! TOML 파일과 `CHARTIST__` 접두사 환경 변수에서 로드합니다. 모든 섹션은
//! 생략 가능하며 알 수 없는 키는 무시됩니다.
//!
//! ```toml
//! [indicators.ema]
//! periods = [9, 21, 50, 200]
//!
//! [indicators.rsi]
//! period = 14
//!
//! [pattern_detection]
//! min_reliability_filter = "medium"
//! ```
//!
//! 환경 변수 예: `CHARTIST__INDICATORS__RSI__PERIOD=21`

use std::path::Path;

use chartist_core::logging::{LogConfig, LogFormat};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::analysis::AnalysisError;
use crate::indicators::{
    AdxParams, AtrParams, BollingerBandsParams, CciParams, CmfParams, EmaParams, IndicatorRequest,
    MacdParams, MfiParams, PivotMethod, RocParams, RsiParams, SmaParams, StochasticParams,
    VwapAnchor, VwapParams, WilliamsRParams,
};
use crate::levels::SupportResistanceParams;
use crate::patterns::{PatternParams, Reliability};

/// 환경 변수 접두사.
pub const ENV_PREFIX: &str = "CHARTIST";

/// 전체 분석 설정.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub indicators: IndicatorsConfig,
    pub levels: LevelsConfig,
    pub pattern_detection: PatternDetectionConfig,
    pub logging: LoggingConfig,
}

impl AnalysisConfig {
    /// TOML 파일을 읽고 환경 변수로 덮어씁니다.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, AnalysisError> {
        let builder = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            );

        builder
            .build()
            .and_then(|c| c.try_deserialize())
            .map_err(|e| AnalysisError::Config(e.to_string()))
    }

    /// 환경 변수만으로 설정을 만듭니다 (파일 없음).
    pub fn from_env() -> Result<Self, AnalysisError> {
        config::Config::builder()
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .and_then(|c| c.try_deserialize())
            .map_err(|e| AnalysisError::Config(e.to_string()))
    }

    /// TOML 문자열에서 설정을 파싱합니다.
    pub fn from_toml_str(s: &str) -> Result<Self, AnalysisError> {
        toml::from_str(s).map_err(|e| AnalysisError::Config(e.to_string()))
    }

    /// 활성화된 지표 요청 목록.
    pub fn requests(&self) -> Vec<IndicatorRequest> {
        self.indicators.requests()
    }

    /// 패턴 인식 파라미터.
    pub fn pattern_params(&self) -> PatternParams {
        self.pattern_detection.params()
    }
}

/// 활성화 여부와 기간 하나를 가지는 지표 섹션.
///
/// 기간을 생략하면 지표별 기본값을 사용합니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PeriodSection {
    pub enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub period: Option<usize>,
}

impl Default for PeriodSection {
    fn default() -> Self {
        Self {
            enabled: true,
            period: None,
        }
    }
}

impl PeriodSection {
    fn period_or(&self, default: usize) -> usize {
        self.period.unwrap_or(default)
    }
}

/// 여러 기간을 받는 이동평균 섹션.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MovingAverageSection {
    pub enabled: bool,
    pub periods: Vec<usize>,
}

impl MovingAverageSection {
    /// 중복을 제거한 기간 목록 (처음 나온 순서 유지).
    pub fn unique_periods(&self) -> Vec<usize> {
        let mut periods = Vec::with_capacity(self.periods.len());
        for &period in &self.periods {
            if !periods.contains(&period) {
                periods.push(period);
            }
        }
        periods
    }
}

impl Default for MovingAverageSection {
    fn default() -> Self {
        Self {
            enabled: true,
            periods: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MacdSection {
    pub enabled: bool,
    pub fast: usize,
    pub slow: usize,
    pub signal: usize,
}

impl Default for MacdSection {
    fn default() -> Self {
        let p = MacdParams::default();
        Self {
            enabled: true,
            fast: p.fast_period,
            slow: p.slow_period,
            signal: p.signal_period,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BollingerSection {
    pub enabled: bool,
    pub period: usize,
    pub std_dev: Decimal,
}

impl Default for BollingerSection {
    fn default() -> Self {
        let p = BollingerBandsParams::default();
        Self {
            enabled: true,
            period: p.period,
            std_dev: p.std_dev_multiplier,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StochasticSection {
    pub enabled: bool,
    pub k_period: usize,
    pub d_period: usize,
}

impl Default for StochasticSection {
    fn default() -> Self {
        let p = StochasticParams::default();
        Self {
            enabled: true,
            k_period: p.k_period,
            d_period: p.d_period,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToggleSection {
    pub enabled: bool,
}

impl Default for ToggleSection {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// VWAP은 기본으로 꺼져 있습니다.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VwapSection {
    pub enabled: bool,
    pub anchor: VwapAnchor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PivotSection {
    pub enabled: bool,
    pub method: PivotMethod,
}

impl Default for PivotSection {
    fn default() -> Self {
        Self {
            enabled: true,
            method: PivotMethod::Classic,
        }
    }
}

/// 지표 설정.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicatorsConfig {
    pub sma: MovingAverageSection,
    pub ema: MovingAverageSection,
    pub rsi: PeriodSection,
    pub macd: MacdSection,
    pub bollinger: BollingerSection,
    pub stochastic: StochasticSection,
    pub atr: PeriodSection,
    pub adx: PeriodSection,
    pub cci: PeriodSection,
    pub williams_r: PeriodSection,
    pub mfi: PeriodSection,
    pub roc: PeriodSection,
    pub obv: ToggleSection,
    pub cmf: PeriodSection,
    pub vwap: VwapSection,
    pub pivot_points: PivotSection,
}

impl Default for IndicatorsConfig {
    fn default() -> Self {
        Self {
            sma: MovingAverageSection::default(),
            ema: MovingAverageSection {
                enabled: true,
                periods: vec![9, 21, 50, 200],
            },
            rsi: PeriodSection::default(),
            macd: MacdSection::default(),
            bollinger: BollingerSection::default(),
            stochastic: StochasticSection::default(),
            atr: PeriodSection::default(),
            adx: PeriodSection::default(),
            cci: PeriodSection::default(),
            williams_r: PeriodSection::default(),
            mfi: PeriodSection::default(),
            roc: PeriodSection::default(),
            obv: ToggleSection::default(),
            cmf: PeriodSection::default(),
            vwap: VwapSection::default(),
            pivot_points: PivotSection::default(),
        }
    }
}

impl IndicatorsConfig {
    /// 활성화된 지표를 계산 요청으로 변환합니다.
    pub fn requests(&self) -> Vec<IndicatorRequest> {
        let mut requests = Vec::new();

        if self.sma.enabled {
            requests.extend(self.sma.unique_periods().into_iter().map(|period| IndicatorRequest::Sma(SmaParams { period })));
        }
        if self.ema.enabled {
            requests.extend(self.ema.unique_periods().into_iter().map(|period| IndicatorRequest::Ema(EmaParams { period })));
        }
        if self.rsi.enabled {
            requests.push(IndicatorRequest::Rsi(RsiParams {
                period: self.rsi.period_or(RsiParams::default().period),
            }));
        }
        if self.macd.enabled {
            requests.push(IndicatorRequest::Macd(MacdParams {
                fast_period: self.macd.fast,
                slow_period: self.macd.slow,
                signal_period: self.macd.signal,
            }));
        }
        if self.bollinger.enabled {
            requests.push(IndicatorRequest::BollingerBands(BollingerBandsParams {
                period: self.bollinger.period,
                std_dev_multiplier: self.bollinger.std_dev,
            }));
        }
        if self.stochastic.enabled {
            requests.push(IndicatorRequest::Stochastic(StochasticParams {
                k_period: self.stochastic.k_period,
                d_period: self.stochastic.d_period,
            }));
        }
        if self.atr.enabled {
            requests.push(IndicatorRequest::Atr(self.atr_params()));
        }
        if self.adx.enabled {
            requests.push(IndicatorRequest::Adx(AdxParams {
                period: self.adx.period_or(AdxParams::default().period),
            }));
        }
        if self.cci.enabled {
            requests.push(IndicatorRequest::Cci(CciParams {
                period: self.cci.period_or(CciParams::default().period),
            }));
        }
        if self.williams_r.enabled {
            requests.push(IndicatorRequest::WilliamsR(WilliamsRParams {
                period: self.williams_r.period_or(WilliamsRParams::default().period),
            }));
        }
        if self.mfi.enabled {
            requests.push(IndicatorRequest::Mfi(MfiParams {
                period: self.mfi.period_or(MfiParams::default().period),
            }));
        }
        if self.roc.enabled {
            requests.push(IndicatorRequest::Roc(RocParams {
                period: self.roc.period_or(RocParams::default().period),
            }));
        }
        if self.obv.enabled {
            requests.push(IndicatorRequest::Obv);
        }
        if self.cmf.enabled {
            requests.push(IndicatorRequest::Cmf(CmfParams {
                period: self.cmf.period_or(CmfParams::default().period),
            }));
        }
        if self.vwap.enabled {
            requests.push(IndicatorRequest::Vwap(VwapParams {
                anchor: self.vwap.anchor,
            }));
        }
        if self.pivot_points.enabled {
            requests.push(IndicatorRequest::PivotPoints(self.pivot_points.method));
        }

        requests
    }

    /// 설정된 ATR 파라미터 (패턴 정규화에도 사용).
    pub fn atr_params(&self) -> AtrParams {
        AtrParams {
            period: self.atr.period_or(AtrParams::default().period),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SupportResistanceSection {
    pub enabled: bool,
    pub window: usize,
    pub tolerance_pct: Decimal,
    pub max_levels: usize,
}

impl Default for SupportResistanceSection {
    fn default() -> Self {
        let p = SupportResistanceParams::default();
        Self {
            enabled: true,
            window: p.window,
            tolerance_pct: p.tolerance_pct,
            max_levels: p.max_levels,
        }
    }
}

impl SupportResistanceSection {
    pub fn params(&self) -> SupportResistanceParams {
        SupportResistanceParams {
            window: self.window,
            tolerance_pct: self.tolerance_pct,
            max_levels: self.max_levels,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FibonacciSection {
    pub enabled: bool,
    /// 스윙 탐색 구간 (생략 시 전체 시리즈)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lookback: Option<usize>,
}

impl Default for FibonacciSection {
    fn default() -> Self {
        Self {
            enabled: true,
            lookback: None,
        }
    }
}

/// 가격 레벨 설정.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelsConfig {
    pub support_resistance: SupportResistanceSection,
    pub fibonacci: FibonacciSection,
}

/// 패턴 인식 설정.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatternDetectionConfig {
    pub enabled: bool,
    pub min_reliability_filter: Reliability,
    pub trend_lookback: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body_ratio_threshold: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shadow_ratio_threshold: Option<Decimal>,
}

impl Default for PatternDetectionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            min_reliability_filter: Reliability::Low,
            trend_lookback: PatternParams::default().trend_lookback,
            body_ratio_threshold: None,
            shadow_ratio_threshold: None,
        }
    }
}

impl PatternDetectionConfig {
    pub fn params(&self) -> PatternParams {
        let defaults = PatternParams::default();
        PatternParams {
            body_ratio_threshold: self.body_ratio_threshold.unwrap_or(defaults.body_ratio_threshold),
            shadow_ratio_threshold: self
                .shadow_ratio_threshold
                .unwrap_or(defaults.shadow_ratio_threshold),
            trend_lookback: self.trend_lookback,
            min_reliability: self.min_reliability_filter,
        }
    }
}

/// 로깅 설정. 형식은 "pretty", "json", "compact".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl LoggingConfig {
    /// 로깅 초기화용 설정. 알 수 없는 형식은 기본값(pretty)을 사용합니다.
    pub fn log_config(&self) -> LogConfig {
        let format = self.format.parse::<LogFormat>().unwrap_or_default();
        LogConfig::new(self.level.clone()).with_format(format)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_default_requests() {
        let requests = AnalysisConfig::default().requests();
        let names: Vec<String> = requests.iter().map(|r| r.name()).collect();

        assert!(names.contains(&"ema_9".to_string()));
        assert!(names.contains(&"ema_200".to_string()));
        assert!(names.contains(&"rsi".to_string()));
        assert!(names.contains(&"pivot_points".to_string()));
        assert!(!names.iter().any(|n| n.starts_with("sma_")));
        assert!(!names.contains(&"vwap".to_string()));
        // EMA 4개 + 나머지 13개 (VWAP 제외)
        assert_eq!(requests.len(), 4 + 13);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let cfg = AnalysisConfig::from_toml_str(
            r#"
            [indicators.rsi]
            period = 21

            [indicators.cci]
            enabled = false

            [indicators.sma]
            periods = [20, 50]

            [indicators.vwap]
            enabled = true
            anchor = "session"

            [pattern_detection]
            min_reliability_filter = "high"

            [ui]
            theme = "dark"
            "#,
        )
        .unwrap();

        assert_eq!(cfg.indicators.rsi.period, Some(21));
        assert_eq!(cfg.indicators.macd, MacdSection::default());
        assert_eq!(cfg.pattern_detection.min_reliability_filter, Reliability::High);
        assert_eq!(cfg.pattern_detection.trend_lookback, 5);

        let requests = cfg.requests();
        assert!(requests.contains(&IndicatorRequest::Rsi(RsiParams { period: 21 })));
        assert!(requests.contains(&IndicatorRequest::Sma(SmaParams { period: 20 })));
        assert!(requests.contains(&IndicatorRequest::Vwap(VwapParams {
            anchor: VwapAnchor::Session
        })));
        assert!(!requests.iter().any(|r| r.name() == "cci"));
    }

    #[test]
    fn test_duplicate_periods_requested_once() {
        let cfg = AnalysisConfig::from_toml_str(
            "[indicators.sma]\nperiods = [20, 20, 5]\n[indicators.ema]\nperiods = [9, 9]\n",
        )
        .unwrap();
        let names: Vec<String> = cfg.requests().iter().map(|r| r.name()).collect();

        assert_eq!(names.iter().filter(|n| *n == "sma_20").count(), 1);
        assert_eq!(names.iter().filter(|n| *n == "ema_9").count(), 1);
        let sma: Vec<&String> = names.iter().filter(|n| n.starts_with("sma_")).collect();
        assert_eq!(sma, ["sma_20", "sma_5"]);
    }

    #[test]
    fn test_section_defaults_follow_indicator_defaults() {
        let cfg = AnalysisConfig::from_toml_str("[indicators.cci]\nenabled = true\n").unwrap();
        assert!(cfg
            .requests()
            .contains(&IndicatorRequest::Cci(CciParams { period: 20 })));
        assert_eq!(cfg.indicators.bollinger.std_dev, dec!(2));
        assert_eq!(cfg.levels.support_resistance.params(), SupportResistanceParams::default());
    }

    #[test]
    fn test_pattern_params() {
        let cfg = AnalysisConfig::from_toml_str(
            "[pattern_detection]\ntrend_lookback = 8\nmin_reliability_filter = \"very_high\"\n",
        )
        .unwrap();
        let params = cfg.pattern_params();
        assert_eq!(params.trend_lookback, 8);
        assert_eq!(params.min_reliability, Reliability::VeryHigh);
        assert_eq!(params.body_ratio_threshold, dec!(0.1));
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let err = AnalysisConfig::from_toml_str("[indicators.rsi]\nperiod = \"abc\"\n").unwrap_err();
        assert!(matches!(err, AnalysisError::Config(_)));
    }

    #[test]
    fn test_logging_config() {
        let logging = LoggingConfig {
            level: "debug".to_string(),
            format: "json".to_string(),
        };
        let log = logging.log_config();
        assert_eq!(log.level, "debug");
        assert_eq!(log.format, LogFormat::Json);

        let unknown = LoggingConfig {
            level: "info".to_string(),
            format: "xml".to_string(),
        };
        assert_eq!(unknown.log_config().format, LogFormat::Pretty);
    }
}
