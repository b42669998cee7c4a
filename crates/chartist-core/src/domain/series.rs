//! 검증된 OHLCV 바 시리즈.
//!
//! 한 번 생성되면 변경할 수 없으며, 지표 엔진과 패턴 인식기는 읽기 전용으로만 사용합니다.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::bar::Bar;
use crate::error::{CoreError, CoreResult};
use crate::types::Interval;

/// 시간순으로 정렬된 불변 바 시리즈.
///
/// 생성 시 다음 불변식을 검증합니다:
/// - 타임스탬프가 엄격하게 증가 (중복 없음)
/// - 각 바의 OHLC 관계와 양수 가격, 음수가 아닌 거래량
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawSeries")]
pub struct BarSeries {
    bars: Vec<Bar>,
    #[serde(skip_serializing_if = "Option::is_none")]
    symbol: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    interval: Option<Interval>,
}

/// 역직렬화용 검증 전 시리즈.
#[derive(Deserialize)]
struct RawSeries {
    bars: Vec<Bar>,
    #[serde(default)]
    symbol: Option<String>,
    #[serde(default)]
    interval: Option<Interval>,
}

impl TryFrom<RawSeries> for BarSeries {
    type Error = CoreError;

    fn try_from(raw: RawSeries) -> Result<Self, Self::Error> {
        let series = BarSeries::new(raw.bars)?;
        Ok(Self {
            symbol: raw.symbol,
            interval: raw.interval,
            ..series
        })
    }
}

impl BarSeries {
    /// 바 목록을 검증하여 시리즈를 생성합니다.
    ///
    /// # 에러
    /// 불변식을 위반하면 `CoreError::InvalidSeries`를 반환합니다.
    pub fn new(bars: Vec<Bar>) -> CoreResult<Self> {
        for (i, bar) in bars.iter().enumerate() {
            bar.validate().map_err(|e| match e {
                CoreError::InvalidSeries(detail) => {
                    CoreError::InvalidSeries(format!("bar[{}]: {}", i, detail))
                }
                other => other,
            })?;
        }

        if let Some(i) = bars
            .windows(2)
            .position(|w| w[1].timestamp <= w[0].timestamp)
        {
            return Err(CoreError::InvalidSeries(format!(
                "타임스탬프가 증가하지 않습니다: bar[{}]={} → bar[{}]={}",
                i,
                bars[i].timestamp,
                i + 1,
                bars[i + 1].timestamp
            )));
        }

        Ok(Self {
            bars,
            symbol: None,
            interval: None,
        })
    }

    /// 심볼과 간격 정보를 붙입니다.
    pub fn with_meta(mut self, symbol: impl Into<String>, interval: Interval) -> Self {
        self.symbol = Some(symbol.into());
        self.interval = Some(interval);
        self
    }

    /// 바 슬라이스.
    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    /// 바 개수.
    pub fn len(&self) -> usize {
        self.bars.len()
    }

    /// 비어 있는지 확인합니다.
    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// 인덱스의 바.
    pub fn get(&self, index: usize) -> Option<&Bar> {
        self.bars.get(index)
    }

    /// 마지막 바.
    pub fn last(&self) -> Option<&Bar> {
        self.bars.last()
    }

    /// 심볼.
    pub fn symbol(&self) -> Option<&str> {
        self.symbol.as_deref()
    }

    /// 간격.
    pub fn interval(&self) -> Option<Interval> {
        self.interval
    }

    /// 타임스탬프 목록.
    pub fn timestamps(&self) -> Vec<DateTime<Utc>> {
        self.bars.iter().map(|b| b.timestamp).collect()
    }

    /// 시가 목록.
    pub fn opens(&self) -> Vec<Decimal> {
        self.bars.iter().map(|b| b.open).collect()
    }

    /// 고가 목록.
    pub fn highs(&self) -> Vec<Decimal> {
        self.bars.iter().map(|b| b.high).collect()
    }

    /// 저가 목록.
    pub fn lows(&self) -> Vec<Decimal> {
        self.bars.iter().map(|b| b.low).collect()
    }

    /// 종가 목록.
    pub fn closes(&self) -> Vec<Decimal> {
        self.bars.iter().map(|b| b.close).collect()
    }

    /// 거래량 목록.
    pub fn volumes(&self) -> Vec<Decimal> {
        self.bars.iter().map(|b| b.volume).collect()
    }

    /// 대표가 목록.
    pub fn typical_prices(&self) -> Vec<Decimal> {
        self.bars.iter().map(Bar::typical_price).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use rust_decimal_macros::dec;

    fn bars(n: usize) -> Vec<Bar> {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        (0..n)
            .map(|i| {
                let base = Decimal::from(100 + i as i64);
                Bar::new(
                    start + Duration::days(i as i64),
                    base,
                    base + dec!(2),
                    base - dec!(1),
                    base + dec!(1),
                    dec!(1000),
                )
            })
            .collect()
    }

    #[test]
    fn test_valid_series() {
        let series = BarSeries::new(bars(5)).unwrap();
        assert_eq!(series.len(), 5);
        assert_eq!(series.closes()[0], dec!(101));
        assert_eq!(series.last().map(|b| b.close), Some(dec!(105)));
    }

    #[test]
    fn test_empty_series_is_valid() {
        let series = BarSeries::new(Vec::new()).unwrap();
        assert!(series.is_empty());
    }

    #[test]
    fn test_duplicate_timestamp_rejected() {
        let mut data = bars(3);
        data[2].timestamp = data[1].timestamp;

        let err = BarSeries::new(data).unwrap_err();
        assert!(matches!(err, CoreError::InvalidSeries(_)));
    }

    #[test]
    fn test_decreasing_timestamp_rejected() {
        let mut data = bars(3);
        data.swap(0, 2);
        assert!(BarSeries::new(data).is_err());
    }

    #[test]
    fn test_invalid_bar_rejected() {
        let mut data = bars(3);
        data[1].high = data[1].low - dec!(1);

        let err = BarSeries::new(data).unwrap_err();
        let message = err.to_string();
        assert!(message.starts_with("잘못된 바 시리즈: bar[1]: "), "{}", message);
        assert_eq!(message.matches("잘못된 바 시리즈").count(), 1);
    }

    #[test]
    fn test_deserialize_validates() {
        let good = serde_json::json!({
            "bars": [
                {"timestamp": "2024-01-01T00:00:00Z", "open": "10", "high": "11", "low": "9", "close": "10.5", "volume": "100"},
                {"timestamp": "2024-01-02T00:00:00Z", "open": "10.5", "high": "12", "low": "10", "close": "11", "volume": "120"}
            ],
            "symbol": "^GSPC",
            "interval": "1d"
        });
        let series: BarSeries = serde_json::from_value(good).unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series.interval(), Some(Interval::D1));
        assert_eq!(series.symbol(), Some("^GSPC"));

        let bad = serde_json::json!({
            "bars": [
                {"timestamp": "2024-01-02T00:00:00Z", "open": "10", "high": "11", "low": "9", "close": "10.5", "volume": "100"},
                {"timestamp": "2024-01-01T00:00:00Z", "open": "10.5", "high": "12", "low": "10", "close": "11", "volume": "120"}
            ]
        });
        assert!(serde_json::from_value::<BarSeries>(bad).is_err());
    }
}
