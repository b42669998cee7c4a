//! 가격 레벨 (Price Levels).
//!
//! 시리즈 전체에서 한 번 계산되는 정적 레벨들을 제공합니다.
//! - **지지/저항**: 대칭 윈도우 안에서 엄격한 극값인 바를 찾아 근접도로 묶음
//! - **피보나치**: 최근 스윙 고점/저점으로부터 되돌림·확장 레벨
//! - **다음 피벗**: 마지막 바로부터 계산한 다음 구간 피벗 ([`crate::indicators::PivotCalculator::next`])

use chartist_core::Bar;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::indicators::{check_len, IndicatorError, IndicatorResult, PivotLevels};

/// 피보나치 되돌림 비율.
pub const RETRACEMENT_RATIOS: [Decimal; 7] = [
    dec!(0),
    dec!(0.236),
    dec!(0.382),
    dec!(0.5),
    dec!(0.618),
    dec!(0.786),
    dec!(1),
];

/// 피보나치 확장 비율.
pub const EXTENSION_RATIOS: [Decimal; 3] = [dec!(1.272), dec!(1.618), dec!(2.618)];

/// 지지/저항 탐지 파라미터.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupportResistanceParams {
    /// 극값 판정 윈도우 (양쪽 각각의 바 개수, 기본: 10).
    pub window: usize,
    /// 같은 레벨로 묶는 허용 오차 (%, 기본: 0.5).
    pub tolerance_pct: Decimal,
    /// 방향별 최대 레벨 수 (기본: 5).
    pub max_levels: usize,
}

impl Default for SupportResistanceParams {
    fn default() -> Self {
        Self {
            window: 10,
            tolerance_pct: dec!(0.5),
            max_levels: 5,
        }
    }
}

/// 묶인 가격 레벨.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceLevel {
    /// 묶인 극값들의 평균 가격
    pub price: Decimal,
    /// 묶인 극값 개수
    pub touches: usize,
}

/// 지지/저항 레벨.
///
/// 지지는 마지막 종가 아래, 저항은 위에 있으며 둘 다 현재가에 가까운 순서입니다.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupportResistance {
    pub support: Vec<PriceLevel>,
    pub resistance: Vec<PriceLevel>,
}

/// 스윙 방향.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwingDirection {
    /// 저점 이후 고점 (상승 스윙)
    Up,
    /// 고점 이후 저점 (하락 스윙)
    Down,
}

/// 피보나치 비율과 가격.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FibonacciLevel {
    pub ratio: Decimal,
    pub price: Decimal,
}

/// 피보나치 되돌림/확장 레벨.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FibonacciLevels {
    pub swing_high: Decimal,
    pub swing_low: Decimal,
    pub direction: SwingDirection,
    pub retracements: Vec<FibonacciLevel>,
    pub extensions: Vec<FibonacciLevel>,
}

/// 분석 결과에 포함되는 레벨 스냅샷.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelsSnapshot {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub support_resistance: Option<SupportResistance>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fibonacci: Option<FibonacciLevels>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_pivots: Option<PivotLevels>,
}

/// 지지/저항 레벨을 찾습니다.
///
/// 윈도우를 양쪽으로 채울 수 없는 가장자리 바는 후보에서 제외되므로,
/// 시리즈가 `2 × window + 1`보다 짧으면 빈 결과를 반환합니다.
pub fn support_resistance(
    bars: &[Bar],
    params: SupportResistanceParams,
) -> IndicatorResult<SupportResistance> {
    if params.window == 0 {
        return Err(IndicatorError::InvalidParameter(
            "지지/저항 윈도우는 0보다 커야 합니다".to_string(),
        ));
    }
    if params.tolerance_pct < Decimal::ZERO {
        return Err(IndicatorError::InvalidParameter(
            "허용 오차는 음수일 수 없습니다".to_string(),
        ));
    }

    let Some(last) = bars.last() else {
        return Ok(SupportResistance::default());
    };
    let current = last.close;

    let mut lows = Vec::new();
    let mut highs = Vec::new();
    let w = params.window;

    for i in w..bars.len().saturating_sub(w) {
        let neighbours = (i - w..=i + w).filter(|j| *j != i);
        if neighbours.clone().all(|j| bars[i].low < bars[j].low) {
            lows.push(bars[i].low);
        }
        if neighbours.into_iter().all(|j| bars[i].high > bars[j].high) {
            highs.push(bars[i].high);
        }
    }

    let mut support: Vec<PriceLevel> = cluster(lows, params.tolerance_pct)
        .into_iter()
        .filter(|l| l.price < current)
        .collect();
    support.sort_by(|a, b| b.price.cmp(&a.price));
    support.truncate(params.max_levels);

    let mut resistance: Vec<PriceLevel> = cluster(highs, params.tolerance_pct)
        .into_iter()
        .filter(|l| l.price > current)
        .collect();
    resistance.sort_by(|a, b| a.price.cmp(&b.price));
    resistance.truncate(params.max_levels);

    Ok(SupportResistance {
        support,
        resistance,
    })
}

/// 정렬된 가격을 허용 오차 안에서 묶습니다.
fn cluster(mut prices: Vec<Decimal>, tolerance_pct: Decimal) -> Vec<PriceLevel> {
    prices.sort();

    let mut levels = Vec::new();
    let mut group: Vec<Decimal> = Vec::new();

    for price in prices {
        if let Some(anchor) = group.first() {
            let within = (price - *anchor) / *anchor * dec!(100) <= tolerance_pct;
            if !within {
                levels.push(close_group(&group));
                group.clear();
            }
        }
        group.push(price);
    }
    if !group.is_empty() {
        levels.push(close_group(&group));
    }

    levels
}

fn close_group(group: &[Decimal]) -> PriceLevel {
    PriceLevel {
        price: group.iter().sum::<Decimal>() / Decimal::from(group.len()),
        touches: group.len(),
    }
}

/// 피보나치 레벨을 계산합니다.
///
/// 마지막 `lookback`개 바(없으면 전체)의 최고가/최저가를 스윙으로 사용합니다.
/// 상승 스윙은 고점에서 아래로 되돌림을, 하락 스윙은 저점에서 위로 되돌림을 계산합니다.
pub fn fibonacci(bars: &[Bar], lookback: Option<usize>) -> IndicatorResult<FibonacciLevels> {
    check_len(1, bars.len())?;
    if lookback == Some(0) {
        return Err(IndicatorError::InvalidParameter(
            "피보나치 lookback은 0보다 커야 합니다".to_string(),
        ));
    }

    let start = lookback.map_or(0, |n| bars.len().saturating_sub(n));
    let window = &bars[start..];

    // 동률이면 가장 최근 극값을 사용
    let (high_idx, swing_high) = window
        .iter()
        .enumerate()
        .fold((0, window[0].high), |acc, (i, b)| {
            if b.high >= acc.1 {
                (i, b.high)
            } else {
                acc
            }
        });
    let (low_idx, swing_low) = window
        .iter()
        .enumerate()
        .fold((0, window[0].low), |acc, (i, b)| {
            if b.low <= acc.1 {
                (i, b.low)
            } else {
                acc
            }
        });

    let direction = if high_idx >= low_idx {
        SwingDirection::Up
    } else {
        SwingDirection::Down
    };
    let diff = swing_high - swing_low;

    let retracements = RETRACEMENT_RATIOS
        .iter()
        .map(|ratio| FibonacciLevel {
            ratio: *ratio,
            price: match direction {
                SwingDirection::Up => swing_high - diff * *ratio,
                SwingDirection::Down => swing_low + diff * *ratio,
            },
        })
        .collect();

    let extensions = EXTENSION_RATIOS
        .iter()
        .map(|ratio| FibonacciLevel {
            ratio: *ratio,
            price: match direction {
                SwingDirection::Up => swing_high + diff * (*ratio - Decimal::ONE),
                SwingDirection::Down => swing_low - diff * (*ratio - Decimal::ONE),
            },
        })
        .collect();

    Ok(FibonacciLevels {
        swing_high,
        swing_low,
        direction,
        retracements,
        extensions,
    })
}
