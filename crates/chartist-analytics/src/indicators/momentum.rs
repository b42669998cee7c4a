//! 모멘텀 지표 (Momentum Indicators).
//!
//! 가격 모멘텀과 과매수/과매도 상태를 측정하는 지표들을 제공합니다.
//! - RSI (Relative Strength Index, Wilder 평활)
//! - Stochastic Oscillator
//! - Williams %R
//! - CCI (Commodity Channel Index)
//! - ROC (Rate of Change)
//!
//! 0으로 나누는 경우는 에러가 아니라 각 지표의 정의된 값으로 처리합니다.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::{check_len, check_period, IndicatorResult};

/// RSI 파라미터.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RsiParams {
    /// RSI 기간 (기본: 14).
    pub period: usize,
}

impl Default for RsiParams {
    fn default() -> Self {
        Self { period: 14 }
    }
}

/// 스토캐스틱 파라미터.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StochasticParams {
    /// %K 기간 (기본: 14).
    pub k_period: usize,
    /// %D 기간 (smoothing, 기본: 3).
    pub d_period: usize,
}

impl Default for StochasticParams {
    fn default() -> Self {
        Self {
            k_period: 14,
            d_period: 3,
        }
    }
}

/// 한 시점의 스토캐스틱 값.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StochasticValue {
    /// %K (Fast Stochastic).
    pub k: Decimal,
    /// %D (%K의 이동평균). %K가 `d_period`개 쌓이기 전에는 None.
    pub d: Option<Decimal>,
}

/// Williams %R 파라미터.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WilliamsRParams {
    /// 기간 (기본: 14).
    pub period: usize,
}

impl Default for WilliamsRParams {
    fn default() -> Self {
        Self { period: 14 }
    }
}

/// CCI 파라미터.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CciParams {
    /// 기간 (기본: 20).
    pub period: usize,
}

impl Default for CciParams {
    fn default() -> Self {
        Self { period: 20 }
    }
}

/// ROC 파라미터.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RocParams {
    /// 비교 기간 (기본: 12).
    pub period: usize,
}

impl Default for RocParams {
    fn default() -> Self {
        Self { period: 12 }
    }
}

/// CCI 상수 (Lambert).
const CCI_CONSTANT: Decimal = dec!(0.015);

/// 모멘텀 지표 계산기.
#[derive(Debug, Default, Clone, Copy)]
pub struct MomentumCalculator;

impl MomentumCalculator {
    /// 새로운 모멘텀 계산기 생성.
    pub fn new() -> Self {
        Self
    }

    /// RSI (Relative Strength Index) 계산.
    ///
    /// RSI = 100 - (100 / (1 + RS)), RS = 평균 상승폭 / 평균 하락폭.
    ///
    /// 평균은 Wilder 방식입니다. 첫 평균은 처음 `period`개 변화량의 단순 평균이며
    /// `period` 인덱스에서 첫 RSI가 나옵니다. 이후:
    /// avg[i] = (avg[i-1] × (n-1) + x[i]) / n
    ///
    /// 평균 하락폭이 0이면 100, 상승/하락이 모두 없으면 50입니다.
    pub fn rsi(&self, prices: &[Decimal], params: RsiParams) -> IndicatorResult<Vec<Option<Decimal>>> {
        let period = params.period;
        check_period("RSI", period)?;
        check_len(period + 1, prices.len())?;

        let (gains, losses): (Vec<Decimal>, Vec<Decimal>) = prices
            .windows(2)
            .map(|w| {
                let delta = w[1] - w[0];
                (delta.max(Decimal::ZERO), (-delta).max(Decimal::ZERO))
            })
            .unzip();

        let n = Decimal::from(period);
        let mut avg_gain = gains[..period].iter().sum::<Decimal>() / n;
        let mut avg_loss = losses[..period].iter().sum::<Decimal>() / n;

        let mut result = vec![None; period];
        result.push(Some(rsi_value(avg_gain, avg_loss)));

        for (gain, loss) in gains[period..].iter().zip(&losses[period..]) {
            avg_gain = (avg_gain * (n - Decimal::ONE) + *gain) / n;
            avg_loss = (avg_loss * (n - Decimal::ONE) + *loss) / n;
            result.push(Some(rsi_value(avg_gain, avg_loss)));
        }

        Ok(result)
    }

    /// 스토캐스틱 오실레이터 계산.
    ///
    /// %K = (현재가 - 최저가) / (최고가 - 최저가) × 100
    /// %D = %K의 `d_period` 이동평균
    ///
    /// 범위가 0이면 %K는 50입니다.
    pub fn stochastic(
        &self,
        high: &[Decimal],
        low: &[Decimal],
        close: &[Decimal],
        params: StochasticParams,
    ) -> IndicatorResult<Vec<Option<StochasticValue>>> {
        check_period("Stochastic %K", params.k_period)?;
        check_period("Stochastic %D", params.d_period)?;
        let len = high.len().min(low.len()).min(close.len());
        check_len(params.k_period, len)?;

        let k_values: Vec<Option<Decimal>> = (0..len)
            .map(|i| {
                window_extremes(high, low, i, params.k_period).map(|(highest, lowest)| {
                    let range = highest - lowest;
                    if range.is_zero() {
                        dec!(50)
                    } else {
                        (close[i] - lowest) / range * dec!(100)
                    }
                })
            })
            .collect();

        let d_len = Decimal::from(params.d_period);
        let result = (0..len)
            .map(|i| {
                k_values[i].map(|k| {
                    let d = if i + 1 >= params.k_period + params.d_period - 1 {
                        let window = &k_values[i + 1 - params.d_period..=i];
                        Some(window.iter().flatten().sum::<Decimal>() / d_len)
                    } else {
                        None
                    };
                    StochasticValue { k, d }
                })
            })
            .collect();

        Ok(result)
    }

    /// Williams %R 계산.
    ///
    /// %R = (최고가 - 종가) / (최고가 - 최저가) × -100, 범위 [-100, 0].
    /// 범위가 0이면 -50입니다.
    pub fn williams_r(
        &self,
        high: &[Decimal],
        low: &[Decimal],
        close: &[Decimal],
        params: WilliamsRParams,
    ) -> IndicatorResult<Vec<Option<Decimal>>> {
        check_period("Williams %R", params.period)?;
        let len = high.len().min(low.len()).min(close.len());
        check_len(params.period, len)?;

        Ok((0..len)
            .map(|i| {
                window_extremes(high, low, i, params.period).map(|(highest, lowest)| {
                    let range = highest - lowest;
                    if range.is_zero() {
                        dec!(-50)
                    } else {
                        (highest - close[i]) / range * dec!(-100)
                    }
                })
            })
            .collect())
    }

    /// CCI (Commodity Channel Index) 계산.
    ///
    /// CCI = (TP - SMA(TP)) / (0.015 × 평균편차), TP = (고가 + 저가 + 종가) / 3.
    /// 평균편차가 0이면 0입니다.
    pub fn cci(
        &self,
        high: &[Decimal],
        low: &[Decimal],
        close: &[Decimal],
        params: CciParams,
    ) -> IndicatorResult<Vec<Option<Decimal>>> {
        let period = params.period;
        check_period("CCI", period)?;
        let len = high.len().min(low.len()).min(close.len());
        check_len(period, len)?;

        let typical: Vec<Decimal> = (0..len)
            .map(|i| (high[i] + low[i] + close[i]) / dec!(3))
            .collect();
        let n = Decimal::from(period);

        let mut result = vec![None; period - 1];
        for window in typical.windows(period) {
            let mean = window.iter().sum::<Decimal>() / n;
            let mean_dev = window.iter().map(|tp| (*tp - mean).abs()).sum::<Decimal>() / n;
            let current = window[period - 1];

            let cci = if mean_dev.is_zero() {
                Decimal::ZERO
            } else {
                (current - mean) / (CCI_CONSTANT * mean_dev)
            };
            result.push(Some(cci));
        }

        Ok(result)
    }

    /// ROC (Rate of Change) 계산.
    ///
    /// ROC = (C - C[n]) / C[n] × 100. 기준가가 0이면 0입니다.
    pub fn roc(&self, prices: &[Decimal], params: RocParams) -> IndicatorResult<Vec<Option<Decimal>>> {
        let period = params.period;
        check_period("ROC", period)?;
        check_len(period + 1, prices.len())?;

        let mut result = vec![None; period];
        result.extend(prices.windows(period + 1).map(|w| {
            let base = w[0];
            let current = w[period];
            Some(if base.is_zero() {
                Decimal::ZERO
            } else {
                (current - base) / base * dec!(100)
            })
        }));

        Ok(result)
    }
}

fn rsi_value(avg_gain: Decimal, avg_loss: Decimal) -> Decimal {
    if avg_loss.is_zero() {
        if avg_gain.is_zero() {
            dec!(50)
        } else {
            dec!(100)
        }
    } else {
        let rs = avg_gain / avg_loss;
        dec!(100) - dec!(100) / (Decimal::ONE + rs)
    }
}

/// `i`에서 끝나는 `period` 윈도우의 (최고가, 최저가). 윈도우가 모자라면 None.
fn window_extremes(
    high: &[Decimal],
    low: &[Decimal],
    i: usize,
    period: usize,
) -> Option<(Decimal, Decimal)> {
    if i + 1 < period {
        return None;
    }
    let start = i + 1 - period;
    let highest = high[start..=i].iter().max().copied()?;
    let lowest = low[start..=i].iter().min().copied()?;
    Some((highest, lowest))
}
