//! OHLCV 바.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::types::{Price, Volume};

/// 한 구간의 시가/고가/저가/종가와 거래량.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bar {
    /// 구간 시작 시각
    pub timestamp: DateTime<Utc>,
    /// 시가
    pub open: Price,
    /// 고가
    pub high: Price,
    /// 저가
    pub low: Price,
    /// 종가
    pub close: Price,
    /// 거래량
    pub volume: Volume,
}

impl Bar {
    /// 새 바를 생성합니다. 검증은 [`Bar::validate`] 또는 시리즈 생성 시 수행됩니다.
    pub fn new(
        timestamp: DateTime<Utc>,
        open: Price,
        high: Price,
        low: Price,
        close: Price,
        volume: Volume,
    ) -> Self {
        Self {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// 바 단위 불변식을 검증합니다.
    ///
    /// - 모든 가격은 양수
    /// - low ≤ min(open, close) ≤ max(open, close) ≤ high
    /// - 거래량은 음수가 아님
    pub fn validate(&self) -> CoreResult<()> {
        let prices = [self.open, self.high, self.low, self.close];
        if prices.iter().any(|p| *p <= Decimal::ZERO) {
            return Err(CoreError::InvalidSeries(format!(
                "가격은 양수여야 합니다 ({})",
                self.timestamp
            )));
        }

        if self.low > self.body_bottom() || self.body_top() > self.high {
            return Err(CoreError::InvalidSeries(format!(
                "OHLC 순서 위반: low={} open={} close={} high={} ({})",
                self.low, self.open, self.close, self.high, self.timestamp
            )));
        }

        if self.volume < Decimal::ZERO {
            return Err(CoreError::InvalidSeries(format!(
                "거래량은 음수일 수 없습니다 ({})",
                self.timestamp
            )));
        }

        Ok(())
    }

    /// 몸통 크기 |close - open|.
    pub fn body(&self) -> Decimal {
        (self.close - self.open).abs()
    }

    /// 전체 범위 (고가 - 저가).
    pub fn range(&self) -> Decimal {
        self.high - self.low
    }

    /// 몸통 상단 max(open, close).
    pub fn body_top(&self) -> Price {
        self.open.max(self.close)
    }

    /// 몸통 하단 min(open, close).
    pub fn body_bottom(&self) -> Price {
        self.open.min(self.close)
    }

    /// 몸통 중간값.
    pub fn body_midpoint(&self) -> Price {
        (self.open + self.close) / Decimal::TWO
    }

    /// 윗꼬리 길이.
    pub fn upper_shadow(&self) -> Decimal {
        self.high - self.body_top()
    }

    /// 아랫꼬리 길이.
    pub fn lower_shadow(&self) -> Decimal {
        self.body_bottom() - self.low
    }

    /// 양봉(종가 > 시가)인지 확인합니다.
    pub fn is_bullish(&self) -> bool {
        self.close > self.open
    }

    /// 음봉(종가 < 시가)인지 확인합니다.
    pub fn is_bearish(&self) -> bool {
        self.close < self.open
    }

    /// 대표가 (고가 + 저가 + 종가) / 3.
    pub fn typical_price(&self) -> Price {
        (self.high + self.low + self.close) / Decimal::from(3)
    }
}
