//! 기술적 지표 모듈.
//!
//! 바 시리즈로부터 롤링/윈도우 기반 기술적 지표 시리즈를 계산합니다.
//! 모든 지표는 닫힌 열거형 [`IndicatorKind`]의 한 변형이며, 계산 요청은
//! [`IndicatorRequest`]로 표현되어 [`IndicatorEngine::compute`]가 변형별 계산 함수로 분기합니다.
//!
//! # 지원 지표
//!
//! ## 추세 지표 (Trend Indicators)
//! - **SMA / EMA**: 단순/지수 이동평균
//! - **MACD**: 이동평균 수렴/확산 (히스토그램 포함)
//! - **ADX**: 평균 방향성 지수 (+DI/-DI 포함, Wilder 평활)
//!
//! ## 모멘텀 지표 (Momentum Indicators)
//! - **RSI** (Wilder 평활), **Stochastic**, **Williams %R**, **CCI**, **ROC**
//!
//! ## 변동성 지표 (Volatility Indicators)
//! - **Bollinger Bands** (%B, 밴드폭 포함), **ATR** (Wilder 평활)
//!
//! ## 거래량 지표 (Volume Indicators)
//! - **OBV**, **CMF**, **MFI**, **VWAP** (전체/세션 누적)
//!
//! ## 가격 레벨
//! - **Pivot Points**: Classic / Fibonacci / Camarilla
//!
//! # 사용 예시
//!
//! ```ignore
//! use chartist_analytics::indicators::{IndicatorEngine, IndicatorRequest, RsiParams};
//!
//! let engine = IndicatorEngine::new();
//! let rsi = engine.compute(&series, &IndicatorRequest::Rsi(RsiParams { period: 14 }))?;
//! ```

pub mod momentum;
pub mod pivots;
pub mod trend;
pub mod volatility;
pub mod volume;

use chartist_core::BarSeries;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

pub use momentum::{
    CciParams, MomentumCalculator, RocParams, RsiParams, StochasticParams, StochasticValue,
    WilliamsRParams,
};
pub use pivots::{PivotCalculator, PivotLevels, PivotMethod};
pub use trend::{AdxParams, AdxValue, EmaParams, MacdParams, MacdValue, SmaParams, TrendIndicators};
pub use volatility::{AtrParams, BollingerBands, BollingerBandsParams, VolatilityIndicators};
pub use volume::{CmfParams, MfiParams, VolumeIndicators, VwapAnchor, VwapParams};

/// 지표 계산 오류.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IndicatorError {
    /// 데이터 부족 오류
    #[error("데이터가 부족합니다: 필요 {required}개, 제공 {provided}개")]
    InsufficientData { required: usize, provided: usize },

    /// 잘못된 파라미터
    #[error("잘못된 파라미터: {0}")]
    InvalidParameter(String),

    /// 계산 오류
    #[error("계산 오류: {0}")]
    CalculationError(String),
}

impl IndicatorError {
    /// UI/리포트 협력자가 사용하는 분류 코드.
    pub fn code(&self) -> &'static str {
        match self {
            IndicatorError::InsufficientData { .. } => "InsufficientData",
            IndicatorError::InvalidParameter(_) => "InvalidParameter",
            IndicatorError::CalculationError(_) => "CalculationError",
        }
    }
}

/// 지표 계산 결과 타입.
pub type IndicatorResult<T> = Result<T, IndicatorError>;

/// 기간 파라미터가 0이 아닌지 확인합니다.
pub(crate) fn check_period(name: &str, period: usize) -> IndicatorResult<()> {
    if period == 0 {
        return Err(IndicatorError::InvalidParameter(format!(
            "{} 기간은 0보다 커야 합니다",
            name
        )));
    }
    Ok(())
}

/// 최소 데이터 길이를 확인합니다.
pub(crate) fn check_len(required: usize, provided: usize) -> IndicatorResult<()> {
    if provided < required {
        return Err(IndicatorError::InsufficientData { required, provided });
    }
    Ok(())
}

/// 지표 종류.
///
/// 지표마다 하나의 변형이 있으며 [`IndicatorKind::ALL`]이 전체 목록입니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndicatorKind {
    Sma,
    Ema,
    Rsi,
    Macd,
    BollingerBands,
    Stochastic,
    Atr,
    Adx,
    Cci,
    WilliamsR,
    Mfi,
    Roc,
    Obv,
    Cmf,
    Vwap,
    PivotPoints,
}

impl IndicatorKind {
    /// 모든 지표 종류.
    pub const ALL: [IndicatorKind; 16] = [
        IndicatorKind::Sma,
        IndicatorKind::Ema,
        IndicatorKind::Rsi,
        IndicatorKind::Macd,
        IndicatorKind::BollingerBands,
        IndicatorKind::Stochastic,
        IndicatorKind::Atr,
        IndicatorKind::Adx,
        IndicatorKind::Cci,
        IndicatorKind::WilliamsR,
        IndicatorKind::Mfi,
        IndicatorKind::Roc,
        IndicatorKind::Obv,
        IndicatorKind::Cmf,
        IndicatorKind::Vwap,
        IndicatorKind::PivotPoints,
    ];

    /// 직렬화 이름.
    pub fn as_str(&self) -> &'static str {
        match self {
            IndicatorKind::Sma => "sma",
            IndicatorKind::Ema => "ema",
            IndicatorKind::Rsi => "rsi",
            IndicatorKind::Macd => "macd",
            IndicatorKind::BollingerBands => "bollinger",
            IndicatorKind::Stochastic => "stochastic",
            IndicatorKind::Atr => "atr",
            IndicatorKind::Adx => "adx",
            IndicatorKind::Cci => "cci",
            IndicatorKind::WilliamsR => "williams_r",
            IndicatorKind::Mfi => "mfi",
            IndicatorKind::Roc => "roc",
            IndicatorKind::Obv => "obv",
            IndicatorKind::Cmf => "cmf",
            IndicatorKind::Vwap => "vwap",
            IndicatorKind::PivotPoints => "pivot_points",
        }
    }
}

/// 지표 계산 요청.
///
/// 각 변형은 해당 지표의 파라미터를 가집니다.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum IndicatorRequest {
    Sma(SmaParams),
    Ema(EmaParams),
    Rsi(RsiParams),
    Macd(MacdParams),
    BollingerBands(BollingerBandsParams),
    Stochastic(StochasticParams),
    Atr(AtrParams),
    Adx(AdxParams),
    Cci(CciParams),
    WilliamsR(WilliamsRParams),
    Mfi(MfiParams),
    Roc(RocParams),
    Obv,
    Cmf(CmfParams),
    Vwap(VwapParams),
    PivotPoints(PivotMethod),
}

impl IndicatorRequest {
    /// 지표 종류.
    pub fn kind(&self) -> IndicatorKind {
        match self {
            IndicatorRequest::Sma(_) => IndicatorKind::Sma,
            IndicatorRequest::Ema(_) => IndicatorKind::Ema,
            IndicatorRequest::Rsi(_) => IndicatorKind::Rsi,
            IndicatorRequest::Macd(_) => IndicatorKind::Macd,
            IndicatorRequest::BollingerBands(_) => IndicatorKind::BollingerBands,
            IndicatorRequest::Stochastic(_) => IndicatorKind::Stochastic,
            IndicatorRequest::Atr(_) => IndicatorKind::Atr,
            IndicatorRequest::Adx(_) => IndicatorKind::Adx,
            IndicatorRequest::Cci(_) => IndicatorKind::Cci,
            IndicatorRequest::WilliamsR(_) => IndicatorKind::WilliamsR,
            IndicatorRequest::Mfi(_) => IndicatorKind::Mfi,
            IndicatorRequest::Roc(_) => IndicatorKind::Roc,
            IndicatorRequest::Obv => IndicatorKind::Obv,
            IndicatorRequest::Cmf(_) => IndicatorKind::Cmf,
            IndicatorRequest::Vwap(_) => IndicatorKind::Vwap,
            IndicatorRequest::PivotPoints(_) => IndicatorKind::PivotPoints,
        }
    }

    /// 결과 시리즈 이름.
    ///
    /// 이동평균은 기간별로 여러 개가 요청될 수 있어 기간을 붙입니다 (`sma_20`, `ema_9`).
    pub fn name(&self) -> String {
        match self {
            IndicatorRequest::Sma(p) => format!("sma_{}", p.period),
            IndicatorRequest::Ema(p) => format!("ema_{}", p.period),
            other => other.kind().as_str().to_string(),
        }
    }

    /// 첫 값을 만들기 위한 최소 바 개수.
    pub fn required_bars(&self) -> usize {
        match self {
            IndicatorRequest::Sma(p) => p.period,
            IndicatorRequest::Ema(p) => p.period,
            IndicatorRequest::Rsi(p) => p.period + 1,
            IndicatorRequest::Macd(p) => p.slow_period,
            IndicatorRequest::BollingerBands(p) => p.period,
            IndicatorRequest::Stochastic(p) => p.k_period,
            IndicatorRequest::Atr(p) => p.period,
            IndicatorRequest::Adx(p) => p.period * 2,
            IndicatorRequest::Cci(p) => p.period,
            IndicatorRequest::WilliamsR(p) => p.period,
            IndicatorRequest::Mfi(p) => p.period + 1,
            IndicatorRequest::Roc(p) => p.period + 1,
            IndicatorRequest::Obv => 1,
            IndicatorRequest::Cmf(p) => p.period,
            IndicatorRequest::Vwap(_) => 1,
            IndicatorRequest::PivotPoints(_) => 2,
        }
    }
}

/// 한 시점의 지표 값.
///
/// 단일 값 또는 작은 고정 튜플(밴드, MACD 등)입니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IndicatorValue {
    Single(Decimal),
    Macd(MacdValue),
    Bands(BollingerBands),
    Stochastic(StochasticValue),
    Adx(AdxValue),
    Pivots(PivotLevels),
}

impl IndicatorValue {
    /// 단일 값이면 반환합니다.
    pub fn as_single(&self) -> Option<Decimal> {
        match self {
            IndicatorValue::Single(v) => Some(*v),
            _ => None,
        }
    }
}

/// 바 시리즈에 정렬된 지표 시리즈.
///
/// `values[i]`는 `i`번째 바의 값이며, 워밍업 구간은 `None`입니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndicatorSeries {
    /// 시리즈 이름 (예: `rsi`, `sma_20`)
    pub name: String,
    /// 지표 종류
    pub kind: IndicatorKind,
    /// 바별 값
    pub values: Vec<Option<IndicatorValue>>,
}

impl IndicatorSeries {
    /// 새 시리즈를 생성합니다.
    pub fn new(
        name: impl Into<String>,
        kind: IndicatorKind,
        values: Vec<Option<IndicatorValue>>,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            values,
        }
    }

    /// 단일 값 벡터로부터 생성합니다.
    pub fn from_singles(
        name: impl Into<String>,
        kind: IndicatorKind,
        values: Vec<Option<Decimal>>,
    ) -> Self {
        Self::new(
            name,
            kind,
            values.into_iter().map(|v| v.map(IndicatorValue::Single)).collect(),
        )
    }

    /// 인덱스의 값.
    pub fn get(&self, index: usize) -> Option<&IndicatorValue> {
        self.values.get(index).and_then(|v| v.as_ref())
    }

    /// 마지막 바의 값.
    pub fn latest(&self) -> Option<&IndicatorValue> {
        self.values.last().and_then(|v| v.as_ref())
    }

    /// 인덱스의 단일 값.
    pub fn single_at(&self, index: usize) -> Option<Decimal> {
        self.get(index).and_then(IndicatorValue::as_single)
    }

    /// 값이 정의된 첫 인덱스 (워밍업 길이).
    pub fn first_defined(&self) -> Option<usize> {
        self.values.iter().position(Option::is_some)
    }

    /// 시리즈 길이.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// 비어 있는지 확인합니다.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// 건너뛴 계산과 그 사유.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(into = "SkippedRecord")]
pub struct SkippedComputation {
    /// 지표 또는 패턴 계열 이름
    pub name: String,
    /// 사유
    pub reason: IndicatorError,
}

impl std::fmt::Display for SkippedComputation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.name, self.reason)
    }
}

/// 직렬화용 평탄화된 건너뜀 기록.
#[derive(Debug, Serialize)]
struct SkippedRecord {
    name: String,
    code: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    required: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    provided: Option<usize>,
}

impl From<SkippedComputation> for SkippedRecord {
    fn from(skipped: SkippedComputation) -> Self {
        let (required, provided) = match skipped.reason {
            IndicatorError::InsufficientData { required, provided } => {
                (Some(required), Some(provided))
            }
            _ => (None, None),
        };
        Self {
            code: skipped.reason.code(),
            message: skipped.reason.to_string(),
            name: skipped.name,
            required,
            provided,
        }
    }
}

/// 일괄 계산 결과.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndicatorBatch {
    /// 계산된 시리즈 (요청 순서)
    pub series: Vec<IndicatorSeries>,
    /// 건너뛴 계산
    pub skipped: Vec<SkippedComputation>,
}

impl IndicatorBatch {
    /// 이름으로 시리즈를 찾습니다.
    pub fn find(&self, name: &str) -> Option<&IndicatorSeries> {
        self.series.iter().find(|s| s.name == name)
    }
}

/// 통합 지표 엔진.
///
/// 상태를 가지지 않으므로 여러 스레드에서 동시에 사용할 수 있습니다.
#[derive(Debug, Default, Clone, Copy)]
pub struct IndicatorEngine {
    trend: TrendIndicators,
    momentum: MomentumCalculator,
    volatility: VolatilityIndicators,
    volume: VolumeIndicators,
    pivots: PivotCalculator,
}

impl IndicatorEngine {
    /// 새로운 지표 엔진 생성.
    pub fn new() -> Self {
        Self::default()
    }

    /// 단일 지표를 계산합니다.
    ///
    /// 요청된 기간보다 시리즈가 짧으면 `InsufficientData`를 반환합니다.
    pub fn compute(
        &self,
        series: &BarSeries,
        request: &IndicatorRequest,
    ) -> IndicatorResult<IndicatorSeries> {
        let name = request.name();
        let kind = request.kind();

        let values: Vec<Option<IndicatorValue>> = match *request {
            IndicatorRequest::Sma(p) => singles(self.trend.sma(&series.closes(), p)?),
            IndicatorRequest::Ema(p) => singles(self.trend.ema(&series.closes(), p)?),
            IndicatorRequest::Rsi(p) => singles(self.momentum.rsi(&series.closes(), p)?),
            IndicatorRequest::Macd(p) => {
                wrap(self.trend.macd(&series.closes(), p)?, IndicatorValue::Macd)
            }
            IndicatorRequest::BollingerBands(p) => wrap(
                self.volatility.bollinger_bands(&series.closes(), p)?,
                IndicatorValue::Bands,
            ),
            IndicatorRequest::Stochastic(p) => wrap(
                self.momentum
                    .stochastic(&series.highs(), &series.lows(), &series.closes(), p)?,
                IndicatorValue::Stochastic,
            ),
            IndicatorRequest::Atr(p) => singles(self.volatility.atr(
                &series.highs(),
                &series.lows(),
                &series.closes(),
                p,
            )?),
            IndicatorRequest::Adx(p) => wrap(
                self.trend
                    .adx(&series.highs(), &series.lows(), &series.closes(), p)?,
                IndicatorValue::Adx,
            ),
            IndicatorRequest::Cci(p) => singles(self.momentum.cci(
                &series.highs(),
                &series.lows(),
                &series.closes(),
                p,
            )?),
            IndicatorRequest::WilliamsR(p) => singles(self.momentum.williams_r(
                &series.highs(),
                &series.lows(),
                &series.closes(),
                p,
            )?),
            IndicatorRequest::Mfi(p) => singles(self.volume.mfi(series.bars(), p)?),
            IndicatorRequest::Roc(p) => singles(self.momentum.roc(&series.closes(), p)?),
            IndicatorRequest::Obv => singles(self.volume.obv(series.bars())?),
            IndicatorRequest::Cmf(p) => singles(self.volume.cmf(series.bars(), p)?),
            IndicatorRequest::Vwap(p) => singles(self.volume.vwap(series.bars(), p)?),
            IndicatorRequest::PivotPoints(method) => wrap(
                self.pivots.series(series.bars(), method)?,
                IndicatorValue::Pivots,
            ),
        };

        Ok(IndicatorSeries::new(name, kind, values))
    }

    /// 여러 지표를 계산합니다.
    ///
    /// 실패한 지표는 사유와 함께 `skipped`에 기록되고 나머지 지표는 계속 계산됩니다.
    pub fn compute_batch(&self, series: &BarSeries, requests: &[IndicatorRequest]) -> IndicatorBatch {
        let mut batch = IndicatorBatch::default();

        for request in requests {
            match self.compute(series, request) {
                Ok(result) => {
                    debug!(
                        indicator = %result.name,
                        warmup = result.first_defined().unwrap_or(result.len()),
                        "지표 계산 완료"
                    );
                    batch.series.push(result);
                }
                Err(reason) => {
                    let skipped = SkippedComputation {
                        name: request.name(),
                        reason,
                    };
                    warn!(%skipped, "지표 계산 건너뜀");
                    batch.skipped.push(skipped);
                }
            }
        }

        batch
    }

    /// 추세 지표 계산기.
    pub fn trend(&self) -> &TrendIndicators {
        &self.trend
    }

    /// 모멘텀 지표 계산기.
    pub fn momentum(&self) -> &MomentumCalculator {
        &self.momentum
    }

    /// 변동성 지표 계산기.
    pub fn volatility(&self) -> &VolatilityIndicators {
        &self.volatility
    }

    /// 거래량 지표 계산기.
    pub fn volume(&self) -> &VolumeIndicators {
        &self.volume
    }

    /// 피벗 포인트 계산기.
    pub fn pivots(&self) -> &PivotCalculator {
        &self.pivots
    }
}

fn singles(values: Vec<Option<Decimal>>) -> Vec<Option<IndicatorValue>> {
    values.into_iter().map(|v| v.map(IndicatorValue::Single)).collect()
}

fn wrap<T>(values: Vec<Option<T>>, f: fn(T) -> IndicatorValue) -> Vec<Option<IndicatorValue>> {
    values.into_iter().map(|v| v.map(f)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chartist_core::Bar;
    use chrono::{Duration, TimeZone, Utc};
    use rust_decimal_macros::dec;

    fn sample_series(n: usize) -> BarSeries {
        let start = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        let bars = (0..n)
            .map(|i| {
                let wave = Decimal::from((i % 5) as i64) - dec!(2);
                let close = dec!(100) + Decimal::from(i as i64) / dec!(2) + wave;
                Bar::new(
                    start + Duration::days(i as i64),
                    close - dec!(0.5),
                    close + dec!(1.5),
                    close - dec!(1.5),
                    close,
                    dec!(1000) + Decimal::from((i * 10) as i64),
                )
            })
            .collect();
        BarSeries::new(bars).unwrap()
    }

    #[test]
    fn test_request_names() {
        assert_eq!(IndicatorRequest::Sma(SmaParams { period: 20 }).name(), "sma_20");
        assert_eq!(IndicatorRequest::Ema(EmaParams { period: 9 }).name(), "ema_9");
        assert_eq!(IndicatorRequest::Rsi(RsiParams::default()).name(), "rsi");
        assert_eq!(
            IndicatorRequest::PivotPoints(PivotMethod::Classic).name(),
            "pivot_points"
        );
    }

    #[test]
    fn test_kind_table_is_complete() {
        let mut names: Vec<&str> = IndicatorKind::ALL.iter().map(|k| k.as_str()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), IndicatorKind::ALL.len());
    }

    #[test]
    fn test_compute_aligns_with_bars() {
        let engine = IndicatorEngine::new();
        let series = sample_series(40);

        for request in [
            IndicatorRequest::Sma(SmaParams { period: 5 }),
            IndicatorRequest::Macd(MacdParams::default()),
            IndicatorRequest::Adx(AdxParams::default()),
            IndicatorRequest::Vwap(VwapParams::default()),
            IndicatorRequest::PivotPoints(PivotMethod::Camarilla),
        ] {
            let result = engine.compute(&series, &request).unwrap();
            assert_eq!(result.len(), series.len(), "{}", result.name);
            assert_eq!(result.kind, request.kind());
        }
    }

    #[test]
    fn test_batch_partial_failure() {
        let engine = IndicatorEngine::new();
        let series = sample_series(10);

        let batch = engine.compute_batch(
            &series,
            &[
                IndicatorRequest::Rsi(RsiParams { period: 14 }),
                IndicatorRequest::Sma(SmaParams { period: 5 }),
            ],
        );

        assert_eq!(batch.series.len(), 1);
        assert!(batch.find("sma_5").is_some());
        assert_eq!(batch.skipped.len(), 1);
        assert_eq!(batch.skipped[0].name, "rsi");
        assert_eq!(
            batch.skipped[0].reason,
            IndicatorError::InsufficientData {
                required: 15,
                provided: 10
            }
        );
    }

    #[test]
    fn test_skipped_serialization() {
        let skipped = SkippedComputation {
            name: "rsi".to_string(),
            reason: IndicatorError::InsufficientData {
                required: 15,
                provided: 10,
            },
        };
        let json = serde_json::to_value(&skipped).unwrap();
        assert_eq!(json["name"], "rsi");
        assert_eq!(json["code"], "InsufficientData");
        assert_eq!(json["required"], 15);
    }

    #[test]
    fn test_request_required_bars_matches_error() {
        let engine = IndicatorEngine::new();
        let series = sample_series(12);

        let request = IndicatorRequest::Adx(AdxParams { period: 7 });
        match engine.compute(&series, &request) {
            Err(IndicatorError::InsufficientData { required, .. }) => {
                assert_eq!(required, request.required_bars())
            }
            other => panic!("unexpected: {:?}", other),
        }
    }
}
