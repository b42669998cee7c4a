//! 거래량 기반 지표 (Volume-Based Indicators).
//!
//! ## OBV (On-Balance Volume)
//! - 종가 상승: OBV += 거래량
//! - 종가 하락: OBV -= 거래량
//! - 종가 동일: 변화 없음
//!
//! ## CMF (Chaikin Money Flow)
//! - MFM = ((종가 - 저가) - (고가 - 종가)) / (고가 - 저가)
//! - CMF = Σ(MFM × 거래량) / Σ거래량, 범위 [-1, 1]
//!
//! ## MFI (Money Flow Index)
//! - 거래량 가중 RSI. 대표가가 오른 바의 자금 흐름을 양, 내린 바를 음으로 집계
//!
//! ## VWAP (Volume Weighted Average Price)
//! - Typical Price (TP) = (High + Low + Close) / 3
//! - VWAP = Σ(TP × Volume) / Σ(Volume)
//! - 전체 시리즈 누적 또는 세션(UTC 날짜)별 누적

use chartist_core::Bar;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::{check_len, check_period, IndicatorResult};

/// CMF 파라미터.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CmfParams {
    /// 기간 (기본: 20).
    pub period: usize,
}

impl Default for CmfParams {
    fn default() -> Self {
        Self { period: 20 }
    }
}

/// MFI 파라미터.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MfiParams {
    /// 기간 (기본: 14).
    pub period: usize,
}

impl Default for MfiParams {
    fn default() -> Self {
        Self { period: 14 }
    }
}

/// VWAP 누적 기준.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VwapAnchor {
    /// 시리즈 전체 누적
    #[default]
    Series,
    /// UTC 날짜가 바뀔 때마다 초기화
    Session,
}

/// VWAP 파라미터.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct VwapParams {
    /// 누적 기준.
    pub anchor: VwapAnchor,
}

/// 거래량 지표 계산기.
#[derive(Debug, Default, Clone, Copy)]
pub struct VolumeIndicators;

impl VolumeIndicators {
    /// 새로운 거래량 지표 계산기 생성.
    pub fn new() -> Self {
        Self
    }

    /// OBV 계산. 첫 바의 OBV는 0입니다.
    pub fn obv(&self, bars: &[Bar]) -> IndicatorResult<Vec<Option<Decimal>>> {
        check_len(1, bars.len())?;

        let mut obv = Decimal::ZERO;
        let mut result = Vec::with_capacity(bars.len());
        result.push(Some(obv));

        for w in bars.windows(2) {
            let (prev, curr) = (&w[0], &w[1]);
            if curr.close > prev.close {
                obv += curr.volume;
            } else if curr.close < prev.close {
                obv -= curr.volume;
            }
            result.push(Some(obv));
        }

        Ok(result)
    }

    /// CMF 계산.
    ///
    /// 범위가 0인 바의 MFM은 0, 윈도우 거래량 합이 0이면 CMF는 0입니다.
    pub fn cmf(&self, bars: &[Bar], params: CmfParams) -> IndicatorResult<Vec<Option<Decimal>>> {
        let period = params.period;
        check_period("CMF", period)?;
        check_len(period, bars.len())?;

        let flow_volume: Vec<Decimal> = bars
            .iter()
            .map(|b| {
                let range = b.range();
                if range.is_zero() {
                    Decimal::ZERO
                } else {
                    ((b.close - b.low) - (b.high - b.close)) / range * b.volume
                }
            })
            .collect();

        let mut result = vec![None; period - 1];
        for (offset, window) in flow_volume.windows(period).enumerate() {
            let volume: Decimal = bars[offset..offset + period].iter().map(|b| b.volume).sum();
            let cmf = if volume.is_zero() {
                Decimal::ZERO
            } else {
                (window.iter().sum::<Decimal>() / volume).clamp(Decimal::NEGATIVE_ONE, Decimal::ONE)
            };
            result.push(Some(cmf));
        }

        Ok(result)
    }

    /// MFI 계산.
    ///
    /// MFI = 100 - 100 / (1 + 양의 흐름 / 음의 흐름).
    /// 음의 흐름이 없으면 100, 흐름이 전혀 없으면 50입니다.
    pub fn mfi(&self, bars: &[Bar], params: MfiParams) -> IndicatorResult<Vec<Option<Decimal>>> {
        let period = params.period;
        check_period("MFI", period)?;
        check_len(period + 1, bars.len())?;

        // flows[i-1]: i번째 바의 (양, 음) 자금 흐름
        let flows: Vec<(Decimal, Decimal)> = bars
            .windows(2)
            .map(|w| {
                let prev_tp = w[0].typical_price();
                let tp = w[1].typical_price();
                let raw = tp * w[1].volume;
                if tp > prev_tp {
                    (raw, Decimal::ZERO)
                } else if tp < prev_tp {
                    (Decimal::ZERO, raw)
                } else {
                    (Decimal::ZERO, Decimal::ZERO)
                }
            })
            .collect();

        let mut result = vec![None; period];
        for window in flows.windows(period) {
            let positive: Decimal = window.iter().map(|(p, _)| *p).sum();
            let negative: Decimal = window.iter().map(|(_, n)| *n).sum();

            let mfi = if negative.is_zero() {
                if positive.is_zero() {
                    dec!(50)
                } else {
                    dec!(100)
                }
            } else {
                dec!(100) - dec!(100) / (Decimal::ONE + positive / negative)
            };
            result.push(Some(mfi));
        }

        Ok(result)
    }

    /// VWAP 계산.
    ///
    /// 누적 거래량이 0이면 해당 바의 대표가를 사용합니다.
    pub fn vwap(&self, bars: &[Bar], params: VwapParams) -> IndicatorResult<Vec<Option<Decimal>>> {
        check_len(1, bars.len())?;

        let mut cum_pv = Decimal::ZERO;
        let mut cum_volume = Decimal::ZERO;
        let mut session = None;
        let mut result = Vec::with_capacity(bars.len());

        for bar in bars {
            if params.anchor == VwapAnchor::Session {
                let day = bar.timestamp.date_naive();
                if session != Some(day) {
                    session = Some(day);
                    cum_pv = Decimal::ZERO;
                    cum_volume = Decimal::ZERO;
                }
            }

            let tp = bar.typical_price();
            cum_pv += tp * bar.volume;
            cum_volume += bar.volume;

            result.push(Some(if cum_volume.is_zero() {
                tp
            } else {
                cum_pv / cum_volume
            }));
        }

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn bar(ts: DateTime<Utc>, high: Decimal, low: Decimal, close: Decimal, volume: Decimal) -> Bar {
        Bar::new(ts, close, high, low, close, volume)
    }

    fn day(i: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap() + Duration::days(i)
    }

    #[test]
    fn test_obv() {
        let indicators = VolumeIndicators::new();
        let bars = vec![
            bar(day(0), dec!(11), dec!(9), dec!(10), dec!(100)),
            bar(day(1), dec!(12), dec!(10), dec!(11), dec!(200)),
            bar(day(2), dec!(11), dec!(9), dec!(10), dec!(150)),
            bar(day(3), dec!(11), dec!(9), dec!(10), dec!(999)),
        ];

        let obv = indicators.obv(&bars).unwrap();
        assert_eq!(
            obv,
            vec![Some(dec!(0)), Some(dec!(200)), Some(dec!(50)), Some(dec!(50))]
        );
    }

    #[test]
    fn test_cmf_close_at_high() {
        let indicators = VolumeIndicators::new();
        let bars: Vec<Bar> = (0..3)
            .map(|i| bar(day(i), dec!(12), dec!(10), dec!(12), dec!(100)))
            .collect();

        let cmf = indicators.cmf(&bars, CmfParams { period: 3 }).unwrap();
        assert_eq!(cmf[2], Some(dec!(1)));
    }

    #[test]
    fn test_cmf_zero_volume() {
        let indicators = VolumeIndicators::new();
        let bars: Vec<Bar> = (0..3)
            .map(|i| bar(day(i), dec!(12), dec!(10), dec!(11), Decimal::ZERO))
            .collect();

        let cmf = indicators.cmf(&bars, CmfParams { period: 2 }).unwrap();
        assert_eq!(cmf[2], Some(Decimal::ZERO));
    }

    #[test]
    fn test_mfi_saturates() {
        let indicators = VolumeIndicators::new();
        let rising: Vec<Bar> = (0..5)
            .map(|i| {
                let c = Decimal::from(10 + i);
                bar(day(i), c + dec!(1), c - dec!(1), c, dec!(100))
            })
            .collect();

        let mfi = indicators.mfi(&rising, MfiParams { period: 3 }).unwrap();
        assert!(mfi[2].is_none());
        assert_eq!(mfi[3], Some(dec!(100)));

        let flat: Vec<Bar> = (0..5)
            .map(|i| bar(day(i), dec!(11), dec!(9), dec!(10), dec!(100)))
            .collect();
        let mfi = indicators.mfi(&flat, MfiParams { period: 3 }).unwrap();
        assert_eq!(mfi[4], Some(dec!(50)));
    }

    #[test]
    fn test_vwap_series_and_session() {
        let indicators = VolumeIndicators::new();
        let start = Utc.with_ymd_and_hms(2024, 5, 1, 22, 0, 0).unwrap();
        let bars = vec![
            bar(start, dec!(10), dec!(10), dec!(10), dec!(100)),
            bar(start + Duration::hours(1), dec!(20), dec!(20), dec!(20), dec!(100)),
            // 다음 UTC 날짜
            bar(start + Duration::hours(2), dec!(30), dec!(30), dec!(30), dec!(100)),
        ];

        let series = indicators.vwap(&bars, VwapParams::default()).unwrap();
        assert_eq!(series[1], Some(dec!(15)));
        assert_eq!(series[2], Some(dec!(20)));

        let session = indicators
            .vwap(
                &bars,
                VwapParams {
                    anchor: VwapAnchor::Session,
                },
            )
            .unwrap();
        assert_eq!(session[1], Some(dec!(15)));
        assert_eq!(session[2], Some(dec!(30)));
    }

    #[test]
    fn test_vwap_zero_volume_uses_typical_price() {
        let indicators = VolumeIndicators::new();
        let bars = vec![bar(day(0), dec!(12), dec!(9), dec!(10.5), Decimal::ZERO)];
        let vwap = indicators.vwap(&bars, VwapParams::default()).unwrap();
        assert_eq!(vwap[0], Some(dec!(10.5)));
    }
}
