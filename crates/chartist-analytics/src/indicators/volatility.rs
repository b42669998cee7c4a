//! 변동성 지표 (Volatility Indicators).
//!
//! 가격 변동성을 측정하는 지표들을 제공합니다.
//! - Bollinger Bands (%B, 밴드폭 포함)
//! - ATR (Average True Range, Wilder 평활)

use chartist_core::DecimalExt;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::{check_len, check_period, IndicatorError, IndicatorResult};

/// 볼린저 밴드 파라미터.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BollingerBandsParams {
    /// 이동평균 기간 (기본: 20).
    pub period: usize,
    /// 표준편차 배수 (기본: 2.0).
    pub std_dev_multiplier: Decimal,
}

impl Default for BollingerBandsParams {
    fn default() -> Self {
        Self {
            period: 20,
            std_dev_multiplier: dec!(2),
        }
    }
}

/// 한 시점의 볼린저 밴드.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BollingerBands {
    /// 상단 밴드 (중간 + k × σ).
    pub upper: Decimal,
    /// 중간 밴드 (SMA).
    pub middle: Decimal,
    /// 하단 밴드 (중간 - k × σ).
    pub lower: Decimal,
    /// %B = (종가 - 하단) / (상단 - 하단). 밴드폭이 0이면 0.5.
    pub percent_b: Decimal,
    /// 밴드폭 = (상단 - 하단) / 중간 × 100.
    pub bandwidth: Decimal,
}

/// ATR 파라미터.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AtrParams {
    /// ATR 기간 (기본: 14).
    pub period: usize,
}

impl Default for AtrParams {
    fn default() -> Self {
        Self { period: 14 }
    }
}

/// 변동성 지표 계산기.
#[derive(Debug, Default, Clone, Copy)]
pub struct VolatilityIndicators;

impl VolatilityIndicators {
    /// 새로운 변동성 지표 계산기 생성.
    pub fn new() -> Self {
        Self
    }

    /// 볼린저 밴드 계산.
    ///
    /// 중간 밴드 = SMA(period), σ = 모집단 표준편차.
    pub fn bollinger_bands(
        &self,
        prices: &[Decimal],
        params: BollingerBandsParams,
    ) -> IndicatorResult<Vec<Option<BollingerBands>>> {
        let period = params.period;
        check_period("Bollinger", period)?;
        if params.std_dev_multiplier < Decimal::ZERO {
            return Err(IndicatorError::InvalidParameter(
                "표준편차 배수는 음수일 수 없습니다".to_string(),
            ));
        }
        check_len(period, prices.len())?;

        let n = Decimal::from(period);
        let mut result = vec![None; period - 1];

        for (offset, window) in prices.windows(period).enumerate() {
            let close = prices[offset + period - 1];
            let middle = window.iter().sum::<Decimal>() / n;
            let variance = window
                .iter()
                .map(|p| {
                    let diff = *p - middle;
                    diff * diff
                })
                .sum::<Decimal>()
                / n;
            let band = variance.sqrt_newton() * params.std_dev_multiplier;

            let upper = middle + band;
            let lower = middle - band;
            let width = upper - lower;

            let percent_b = if width.is_zero() {
                dec!(0.5)
            } else {
                (close - lower) / width
            };
            let bandwidth = if middle.is_zero() {
                Decimal::ZERO
            } else {
                width / middle * dec!(100)
            };

            result.push(Some(BollingerBands {
                upper,
                middle,
                lower,
                percent_b,
                bandwidth,
            }));
        }

        Ok(result)
    }

    /// ATR (Average True Range) 계산.
    ///
    /// TR = max(고가 - 저가, |고가 - 전일 종가|, |저가 - 전일 종가|), 첫 바는 고가 - 저가.
    /// 첫 ATR은 `period-1` 시점의 TR 단순 평균, 이후 Wilder 평활:
    /// ATR[i] = (ATR[i-1] × (n-1) + TR[i]) / n
    pub fn atr(
        &self,
        high: &[Decimal],
        low: &[Decimal],
        close: &[Decimal],
        params: AtrParams,
    ) -> IndicatorResult<Vec<Option<Decimal>>> {
        let period = params.period;
        check_period("ATR", period)?;
        let len = high.len().min(low.len()).min(close.len());
        check_len(period, len)?;

        let tr = true_ranges(high, low, close);
        let n = Decimal::from(period);

        let mut result = vec![None; period - 1];
        let mut atr = tr[..period].iter().sum::<Decimal>() / n;
        result.push(Some(atr));

        for value in &tr[period..] {
            atr = (atr * (n - Decimal::ONE) + *value) / n;
            result.push(Some(atr));
        }

        Ok(result)
    }
}

/// 바별 True Range.
pub(crate) fn true_ranges(high: &[Decimal], low: &[Decimal], close: &[Decimal]) -> Vec<Decimal> {
    let len = high.len().min(low.len()).min(close.len());
    (0..len)
        .map(|i| {
            let hl = high[i] - low[i];
            if i == 0 {
                hl
            } else {
                let hc = (high[i] - close[i - 1]).abs();
                let lc = (low[i] - close[i - 1]).abs();
                hl.max(hc).max(lc)
            }
        })
        .collect()
}
