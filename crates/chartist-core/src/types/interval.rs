//! 바 시리즈의 시간 간격 정의.
//!
//! 시장 데이터 제공자가 사용하는 간격 표기(1m, 1h, 1d, 1wk, 1mo 등)를 그대로 따릅니다.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// 바 간격.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Interval {
    /// 1분봉
    #[serde(rename = "1m")]
    M1,
    /// 5분봉
    #[serde(rename = "5m")]
    M5,
    /// 15분봉
    #[serde(rename = "15m")]
    M15,
    /// 30분봉
    #[serde(rename = "30m")]
    M30,
    /// 1시간봉
    #[serde(rename = "1h")]
    H1,
    /// 일봉
    #[serde(rename = "1d")]
    D1,
    /// 주봉
    #[serde(rename = "1wk")]
    W1,
    /// 월봉
    #[serde(rename = "1mo")]
    MN1,
}

impl Interval {
    /// 지원하는 모든 간격.
    pub const ALL: [Interval; 8] = [
        Interval::M1,
        Interval::M5,
        Interval::M15,
        Interval::M30,
        Interval::H1,
        Interval::D1,
        Interval::W1,
        Interval::MN1,
    ];

    /// 이 간격의 기간을 반환합니다.
    pub fn duration(&self) -> Duration {
        match self {
            Interval::M1 => Duration::from_secs(60),
            Interval::M5 => Duration::from_secs(5 * 60),
            Interval::M15 => Duration::from_secs(15 * 60),
            Interval::M30 => Duration::from_secs(30 * 60),
            Interval::H1 => Duration::from_secs(60 * 60),
            Interval::D1 => Duration::from_secs(24 * 60 * 60),
            Interval::W1 => Duration::from_secs(7 * 24 * 60 * 60),
            Interval::MN1 => Duration::from_secs(30 * 24 * 60 * 60), // 근사값
        }
    }

    /// 하루보다 짧은 간격(장중 데이터)인지 확인합니다.
    ///
    /// 장중 데이터에서만 세션 단위 VWAP 리셋이 의미가 있습니다.
    pub fn is_intraday(&self) -> bool {
        self.duration() < Interval::D1.duration()
    }

    /// 간격 문자열을 반환합니다.
    pub fn as_str(&self) -> &'static str {
        match self {
            Interval::M1 => "1m",
            Interval::M5 => "5m",
            Interval::M15 => "15m",
            Interval::M30 => "30m",
            Interval::H1 => "1h",
            Interval::D1 => "1d",
            Interval::W1 => "1wk",
            Interval::MN1 => "1mo",
        }
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Interval {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Interval::ALL
            .iter()
            .copied()
            .find(|interval| interval.as_str() == s)
            .ok_or_else(|| format!("Invalid interval: {}", s))
    }
}
