//! 패턴 인식 문맥: 직전 추세와 정규화 기준.

use chartist_core::Bar;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// 추세 판정 임계값 (±2%).
const TREND_THRESHOLD: Decimal = dec!(0.02);

/// 추세 판정에 쓰는 짧은 이동평균 길이.
const TREND_SMA_LEN: usize = 3;

/// 직전 구간의 국지 추세.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocalTrend {
    Up,
    Down,
    Sideways,
    /// 직전 구간이 부족해 판단할 수 없음
    Unknown,
}

/// 한 번의 스캔 동안 공유되는 읽기 전용 문맥.
#[derive(Debug, Clone, Copy)]
pub struct ScanContext<'a> {
    pub bars: &'a [Bar],
    atr: Option<&'a [Option<Decimal>]>,
    trend_lookback: usize,
}

impl<'a> ScanContext<'a> {
    pub fn new(bars: &'a [Bar], atr: Option<&'a [Option<Decimal>]>, trend_lookback: usize) -> Self {
        Self {
            bars,
            atr,
            trend_lookback,
        }
    }

    /// `i`번째 바 직전 `trend_lookback`개 종가의 추세.
    ///
    /// 구간 시작과 끝에서 짧은 SMA를 구해 상대 변화가 +2%를 넘으면 상승,
    /// -2% 미만이면 하락, 그 외는 횡보입니다. SMA 길이는 구간보다 1 짧게 제한되어
    /// 시작과 끝 평균이 항상 다른 바를 포함하며, `trend_lookback`이 1이면
    /// `i-2`와 `i-1` 종가를 비교합니다.
    pub fn trend(&self, i: usize) -> LocalTrend {
        let span = match self.trend_lookback {
            0 => return LocalTrend::Unknown,
            1 => 2,
            n => n,
        };
        if i < span || i > self.bars.len() {
            return LocalTrend::Unknown;
        }

        let window = &self.bars[i - span..i];
        let m = TREND_SMA_LEN.min(span - 1);
        let mean = |bars: &[Bar]| {
            bars.iter().map(|b| b.close).sum::<Decimal>() / Decimal::from(bars.len())
        };

        let start = mean(&window[..m]);
        let end = mean(&window[span - m..]);
        if start.is_zero() {
            return LocalTrend::Unknown;
        }

        let change = (end - start) / start;
        if change > TREND_THRESHOLD {
            LocalTrend::Up
        } else if change < -TREND_THRESHOLD {
            LocalTrend::Down
        } else {
            LocalTrend::Sideways
        }
    }

    /// 몸통 크기 정규화 기준. ATR이 있으면 ATR, 없으면 바의 범위.
    pub fn scale(&self, i: usize) -> Decimal {
        self.atr
            .and_then(|atr| atr.get(i).copied().flatten())
            .filter(|a| *a > Decimal::ZERO)
            .unwrap_or_else(|| self.bars[i].range())
    }

    /// 몸통이 정규화 기준의 절반 이상인 "긴" 바인지 확인합니다.
    pub fn is_long_body(&self, i: usize) -> bool {
        let scale = self.scale(i);
        scale > Decimal::ZERO && self.bars[i].body() >= scale * dec!(0.5)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn bars(closes: &[i64]) -> Vec<Bar> {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        closes
            .iter()
            .enumerate()
            .map(|(i, c)| {
                let c = Decimal::from(*c);
                Bar::new(start + Duration::days(i as i64), c, c + dec!(1), c - dec!(1), c, dec!(1))
            })
            .collect()
    }

    #[test]
    fn test_trend_classification() {
        let up = bars(&[100, 102, 104, 106, 108, 110]);
        let ctx = ScanContext::new(&up, None, 5);
        assert_eq!(ctx.trend(5), LocalTrend::Up);
        assert_eq!(ctx.trend(4), LocalTrend::Unknown);

        let down = bars(&[110, 108, 106, 104, 102, 100]);
        assert_eq!(ScanContext::new(&down, None, 5).trend(5), LocalTrend::Down);

        let flat = bars(&[100, 101, 100, 101, 100, 100]);
        assert_eq!(ScanContext::new(&flat, None, 5).trend(5), LocalTrend::Sideways);
    }

    #[test]
    fn test_short_lookback_uses_shorter_average() {
        let rising = bars(&[100, 110, 120, 130]);
        let falling = bars(&[130, 120, 110, 100]);

        // 윈도우 [110, 120, 130], m = 2 → 115 → 125
        assert_eq!(ScanContext::new(&rising, None, 3).trend(4), LocalTrend::Up);
        assert_eq!(ScanContext::new(&falling, None, 3).trend(4), LocalTrend::Down);

        // 윈도우 [120, 130], m = 1
        assert_eq!(ScanContext::new(&rising, None, 2).trend(4), LocalTrend::Up);
        assert_eq!(ScanContext::new(&falling, None, 2).trend(4), LocalTrend::Down);
        assert_eq!(ScanContext::new(&rising, None, 2).trend(1), LocalTrend::Unknown);

        // lookback 1: i-2와 i-1 종가 비교
        assert_eq!(ScanContext::new(&rising, None, 1).trend(2), LocalTrend::Up);
        assert_eq!(ScanContext::new(&falling, None, 1).trend(3), LocalTrend::Down);
        assert_eq!(ScanContext::new(&rising, None, 1).trend(1), LocalTrend::Unknown);

        let flat = bars(&[100, 100, 101]);
        assert_eq!(ScanContext::new(&flat, None, 2).trend(3), LocalTrend::Sideways);
        assert_eq!(ScanContext::new(&flat, None, 0).trend(3), LocalTrend::Unknown);
    }

    #[test]
    fn test_scale_prefers_atr() {
        let data = bars(&[100, 101]);
        let atr = vec![None, Some(dec!(4))];
        let ctx = ScanContext::new(&data, Some(&atr), 5);
        assert_eq!(ctx.scale(0), dec!(2));
        assert_eq!(ctx.scale(1), dec!(4));
    }
}
