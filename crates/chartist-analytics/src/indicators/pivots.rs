//! 피벗 포인트 (Pivot Points).
//!
//! 직전 구간의 고가/저가/종가로부터 지지/저항 레벨을 계산합니다.
//!
//! | 방식 | 공식 |
//! |------|------|
//! | Classic | P = (H+L+C)/3, R1 = 2P-L, S1 = 2P-H, R2 = P+(H-L), S2 = P-(H-L), R3 = H+2(P-L), S3 = L-2(H-P) |
//! | Fibonacci | P ± 0.382R, P ± 0.618R, P ± 1.000R (R = H-L) |
//! | Camarilla | C ± R×1.1/12, /6, /4, /2 (R4/S4 포함) |

use chartist_core::Bar;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::{check_len, IndicatorResult};

/// 피벗 계산 방식.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PivotMethod {
    #[default]
    Classic,
    Fibonacci,
    Camarilla,
}

/// 한 구간의 피벗 레벨.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PivotLevels {
    pub pivot: Decimal,
    pub r1: Decimal,
    pub r2: Decimal,
    pub r3: Decimal,
    pub s1: Decimal,
    pub s2: Decimal,
    pub s3: Decimal,
    /// Camarilla 전용
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub r4: Option<Decimal>,
    /// Camarilla 전용
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub s4: Option<Decimal>,
}

impl PivotLevels {
    /// 저항 레벨 목록 (R1부터).
    pub fn resistances(&self) -> Vec<(&'static str, Decimal)> {
        let mut levels = vec![("R1", self.r1), ("R2", self.r2), ("R3", self.r3)];
        if let Some(r4) = self.r4 {
            levels.push(("R4", r4));
        }
        levels
    }

    /// 지지 레벨 목록 (S1부터).
    pub fn supports(&self) -> Vec<(&'static str, Decimal)> {
        let mut levels = vec![("S1", self.s1), ("S2", self.s2), ("S3", self.s3)];
        if let Some(s4) = self.s4 {
            levels.push(("S4", s4));
        }
        levels
    }
}

/// 피벗 포인트 계산기.
#[derive(Debug, Default, Clone, Copy)]
pub struct PivotCalculator;

impl PivotCalculator {
    /// 새로운 피벗 계산기 생성.
    pub fn new() -> Self {
        Self
    }

    /// 한 바(직전 구간)로부터 피벗 레벨을 계산합니다.
    pub fn levels(&self, prior: &Bar, method: PivotMethod) -> PivotLevels {
        let (h, l, c) = (prior.high, prior.low, prior.close);
        let range = h - l;
        let pivot = (h + l + c) / dec!(3);

        match method {
            PivotMethod::Classic => PivotLevels {
                pivot,
                r1: dec!(2) * pivot - l,
                r2: pivot + range,
                r3: h + dec!(2) * (pivot - l),
                s1: dec!(2) * pivot - h,
                s2: pivot - range,
                s3: l - dec!(2) * (h - pivot),
                r4: None,
                s4: None,
            },
            PivotMethod::Fibonacci => PivotLevels {
                pivot,
                r1: pivot + range * dec!(0.382),
                r2: pivot + range * dec!(0.618),
                r3: pivot + range,
                s1: pivot - range * dec!(0.382),
                s2: pivot - range * dec!(0.618),
                s3: pivot - range,
                r4: None,
                s4: None,
            },
            PivotMethod::Camarilla => {
                let k = range * dec!(1.1);
                PivotLevels {
                    pivot,
                    r1: c + k / dec!(12),
                    r2: c + k / dec!(6),
                    r3: c + k / dec!(4),
                    s1: c - k / dec!(12),
                    s2: c - k / dec!(6),
                    s3: c - k / dec!(4),
                    r4: Some(c + k / dec!(2)),
                    s4: Some(c - k / dec!(2)),
                }
            }
        }
    }

    /// 바별 피벗 시리즈. `i`번째 값은 `i-1`번째 바로부터 계산됩니다.
    pub fn series(&self, bars: &[Bar], method: PivotMethod) -> IndicatorResult<Vec<Option<PivotLevels>>> {
        check_len(2, bars.len())?;

        let mut result = Vec::with_capacity(bars.len());
        result.push(None);
        result.extend(bars.windows(2).map(|w| Some(self.levels(&w[0], method))));
        Ok(result)
    }

    /// 마지막 바로부터 다음 구간의 피벗 레벨을 계산합니다.
    pub fn next(&self, bars: &[Bar], method: PivotMethod) -> IndicatorResult<PivotLevels> {
        check_len(1, bars.len())?;
        let last = &bars[bars.len() - 1];
        Ok(self.levels(last, method))
    }
}
