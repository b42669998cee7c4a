//! 추세 지표 (Trend Indicators).
//!
//! 이동평균 기반의 추세 지표와 추세 강도 지표를 제공합니다.
//! - SMA (Simple Moving Average)
//! - EMA (Exponential Moving Average)
//! - MACD (Moving Average Convergence Divergence)
//! - ADX (Average Directional Index, Wilder 평활)

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::volatility::true_ranges;
use super::{check_len, check_period, IndicatorError, IndicatorResult};

/// SMA 파라미터.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmaParams {
    /// 이동평균 기간.
    pub period: usize,
}

impl Default for SmaParams {
    fn default() -> Self {
        Self { period: 20 }
    }
}

/// EMA 파라미터.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmaParams {
    /// 이동평균 기간.
    pub period: usize,
}

impl Default for EmaParams {
    fn default() -> Self {
        Self { period: 21 }
    }
}

/// MACD 파라미터.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MacdParams {
    /// 단기 EMA 기간 (기본: 12).
    pub fast_period: usize,
    /// 장기 EMA 기간 (기본: 26).
    pub slow_period: usize,
    /// 시그널 라인 기간 (기본: 9).
    pub signal_period: usize,
}

impl Default for MacdParams {
    fn default() -> Self {
        Self {
            fast_period: 12,
            slow_period: 26,
            signal_period: 9,
        }
    }
}

/// 한 시점의 MACD 값.
///
/// 시그널 라인은 MACD 라인이 `signal_period`개 쌓인 뒤부터 정의됩니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MacdValue {
    /// MACD 라인 (단기 EMA - 장기 EMA).
    pub macd: Decimal,
    /// 시그널 라인 (MACD의 EMA).
    pub signal: Option<Decimal>,
    /// 히스토그램 (MACD - 시그널).
    pub histogram: Option<Decimal>,
}

/// ADX 파라미터.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdxParams {
    /// 평활 기간 (기본: 14).
    pub period: usize,
}

impl Default for AdxParams {
    fn default() -> Self {
        Self { period: 14 }
    }
}

/// 한 시점의 ADX 값.
///
/// ±DI는 `period`번째 바부터, ADX는 `2 × period - 1`번째 바부터 정의됩니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdxValue {
    /// 평균 방향성 지수 (0-100).
    pub adx: Option<Decimal>,
    /// +DI (0-100).
    pub plus_di: Decimal,
    /// -DI (0-100).
    pub minus_di: Decimal,
}

/// 추세 지표 계산기.
#[derive(Debug, Default, Clone, Copy)]
pub struct TrendIndicators;

impl TrendIndicators {
    /// 새로운 추세 지표 계산기 생성.
    pub fn new() -> Self {
        Self
    }

    /// 단순 이동평균 (SMA) 계산.
    ///
    /// SMA = (P1 + P2 + ... + Pn) / n
    ///
    /// # 반환
    /// 각 시점의 SMA 값 (처음 period-1개는 None)
    pub fn sma(
        &self,
        prices: &[Decimal],
        params: SmaParams,
    ) -> IndicatorResult<Vec<Option<Decimal>>> {
        let period = params.period;
        check_period("SMA", period)?;
        check_len(period, prices.len())?;

        let period_decimal = Decimal::from(period);
        let mut result = vec![None; period - 1];
        result.extend(
            prices
                .windows(period)
                .map(|w| Some(w.iter().sum::<Decimal>() / period_decimal)),
        );

        Ok(result)
    }

    /// 지수 이동평균 (EMA) 계산.
    ///
    /// EMA = (현재가 × k) + (이전 EMA × (1 - k)), k = 2 / (period + 1).
    /// 첫 값은 처음 `period`개 가격의 단순 평균입니다.
    pub fn ema(
        &self,
        prices: &[Decimal],
        params: EmaParams,
    ) -> IndicatorResult<Vec<Option<Decimal>>> {
        let period = params.period;
        check_period("EMA", period)?;
        check_len(period, prices.len())?;

        let multiplier = dec!(2) / Decimal::from(period + 1);
        let mut result = Vec::with_capacity(prices.len());
        result.resize(period - 1, None);

        let initial_sma = prices[..period].iter().sum::<Decimal>() / Decimal::from(period);
        result.push(Some(initial_sma));

        let mut prev_ema = initial_sma;
        for price in &prices[period..] {
            let ema = (*price * multiplier) + (prev_ema * (Decimal::ONE - multiplier));
            result.push(Some(ema));
            prev_ema = ema;
        }

        Ok(result)
    }

    /// MACD 계산.
    ///
    /// MACD 라인 = 단기 EMA - 장기 EMA
    /// 시그널 라인 = MACD 라인의 EMA
    /// 히스토그램 = MACD 라인 - 시그널 라인
    pub fn macd(&self, prices: &[Decimal], params: MacdParams) -> IndicatorResult<Vec<Option<MacdValue>>> {
        check_period("MACD signal", params.signal_period)?;
        if params.fast_period >= params.slow_period {
            return Err(IndicatorError::InvalidParameter(format!(
                "MACD 단기 기간({})은 장기 기간({})보다 짧아야 합니다",
                params.fast_period, params.slow_period
            )));
        }
        check_len(params.slow_period, prices.len())?;

        let fast_ema = self.ema(prices, EmaParams { period: params.fast_period })?;
        let slow_ema = self.ema(prices, EmaParams { period: params.slow_period })?;

        let macd_line: Vec<Option<Decimal>> = fast_ema
            .iter()
            .zip(&slow_ema)
            .map(|(fast, slow)| match (fast, slow) {
                (Some(f), Some(s)) => Some(f - s),
                _ => None,
            })
            .collect();

        // 시그널 라인 (정의된 MACD 값들의 EMA)
        let macd_values: Vec<Decimal> = macd_line.iter().flatten().copied().collect();
        let signal_line = if macd_values.len() >= params.signal_period {
            self.ema(&macd_values, EmaParams { period: params.signal_period })?
        } else {
            vec![None; macd_values.len()]
        };

        let mut signals = signal_line.into_iter();
        let result = macd_line
            .into_iter()
            .map(|macd| {
                macd.map(|m| {
                    let signal = signals.next().flatten();
                    MacdValue {
                        macd: m,
                        signal,
                        histogram: signal.map(|s| m - s),
                    }
                })
            })
            .collect();

        Ok(result)
    }

    /// ADX (Average Directional Index) 계산.
    ///
    /// - +DM = 고가 상승폭 (하락폭보다 크고 양수일 때), -DM = 저가 하락폭 (반대 조건)
    /// - TR, ±DM을 Wilder 방식으로 평활: S[i] = S[i-1] - S[i-1]/n + X[i]
    /// - ±DI = 100 × 평활 ±DM / 평활 TR
    /// - DX = 100 × |+DI - -DI| / (+DI + -DI)
    /// - ADX = DX의 Wilder 평균 (첫 값은 DX `period`개의 단순 평균)
    ///
    /// TR이 0이면 DI는 0, DI 합이 0이면 DX는 0으로 처리합니다.
    pub fn adx(
        &self,
        high: &[Decimal],
        low: &[Decimal],
        close: &[Decimal],
        params: AdxParams,
    ) -> IndicatorResult<Vec<Option<AdxValue>>> {
        let period = params.period;
        check_period("ADX", period)?;
        let len = high.len().min(low.len()).min(close.len());
        check_len(period * 2, len)?;

        let tr = true_ranges(high, low, close);
        let mut plus_dm = vec![Decimal::ZERO; len];
        let mut minus_dm = vec![Decimal::ZERO; len];
        for i in 1..len {
            let up = high[i] - high[i - 1];
            let down = low[i - 1] - low[i];
            if up > down && up > Decimal::ZERO {
                plus_dm[i] = up;
            }
            if down > up && down > Decimal::ZERO {
                minus_dm[i] = down;
            }
        }

        let n = Decimal::from(period);
        let hundred = dec!(100);

        let mut tr_s: Decimal = tr[1..=period].iter().sum();
        let mut plus_s: Decimal = plus_dm[1..=period].iter().sum();
        let mut minus_s: Decimal = minus_dm[1..=period].iter().sum();

        let mut result: Vec<Option<AdxValue>> = vec![None; len];
        let mut dx_values: Vec<Decimal> = Vec::with_capacity(len - period);
        let mut adx: Option<Decimal> = None;

        for i in period..len {
            if i > period {
                tr_s = tr_s - tr_s / n + tr[i];
                plus_s = plus_s - plus_s / n + plus_dm[i];
                minus_s = minus_s - minus_s / n + minus_dm[i];
            }

            let (plus_di, minus_di) = if tr_s.is_zero() {
                (Decimal::ZERO, Decimal::ZERO)
            } else {
                (hundred * plus_s / tr_s, hundred * minus_s / tr_s)
            };

            let di_sum = plus_di + minus_di;
            let dx = if di_sum.is_zero() {
                Decimal::ZERO
            } else {
                hundred * (plus_di - minus_di).abs() / di_sum
            };
            dx_values.push(dx);

            if i == 2 * period - 1 {
                adx = Some(dx_values.iter().sum::<Decimal>() / n);
            } else if let Some(prev) = adx {
                adx = Some((prev * (n - Decimal::ONE) + dx) / n);
            }

            result[i] = Some(AdxValue {
                adx,
                plus_di,
                minus_di,
            });
        }

        Ok(result)
    }
}
