//! 시장 요약 계산기.
//!
//! 계산된 지표의 마지막 값과 가격 레벨로부터 추세 강도, 신호 분포,
//! 시장 심리, 가격 목표를 산출합니다. 결과는 코드와 숫자이며 문장은 만들지 않습니다.
//!
//! # 추세 강도 구성 (점수 / 가중치)
//!
//! 1. **RSI**: >70 +2/2, >50 +1/1, <30 -2/2, 그 외 -1/1
//! 2. **MACD 히스토그램**: 양수 +1.5, 그 외 -1.5 (가중치 1.5)
//! 3. **ADX**: ADX > 25일 때 +DI > -DI이면 +2, 아니면 -2 (가중치 2)
//! 4. **EMA 9/21/50/200**: 종가가 위면 +1, 아래면 -1 (각 가중치 1)
//! 5. **Bollinger %B**: >0.8 -0.5, <0.2 +0.5 (가중치 0.5, 항상 반영)
//! 6. **OBV**: 최근 5개 구간 첫 값 대비 +2% 초과 +1, -2% 미만 -1 (가중치 1)
//!
//! 최종 점수 = (점수 / 가중치) × 50, [-100, 100]으로 제한.

use chartist_core::{Bar, DecimalExt};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::indicators::{AdxValue, IndicatorBatch, IndicatorSeries, IndicatorValue};
use crate::levels::LevelsSnapshot;

/// 추세 강도에 사용하는 EMA 기간.
pub const TREND_EMA_PERIODS: [usize; 4] = [9, 21, 50, 200];

/// 방향별 최대 가격 목표 수.
const MAX_TARGETS: usize = 5;

/// OBV 단기 비교 구간.
const OBV_SHORT_WINDOW: usize = 5;

/// OBV 평균 비교 구간.
const OBV_MEAN_WINDOW: usize = 20;

/// 추세 강도에 기여한 사유 코드.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "code", rename_all = "snake_case")]
pub enum TrendReason {
    RsiOverbought,
    RsiBullish,
    RsiOversold,
    RsiBearish,
    MacdPositive,
    MacdNegative,
    AdxBullish,
    AdxBearish,
    /// ADX ≤ 25, 점수에 반영하지 않음
    AdxWeak,
    EmaPosition { above: usize, below: usize },
    BollingerUpper,
    BollingerLower,
    ObvRising,
    ObvFalling,
}

/// 추세 강도 (-100 ~ 100).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrendStrength {
    pub score: Decimal,
    pub reasons: Vec<TrendReason>,
}

/// 신호 분포.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalDistribution {
    pub bullish: usize,
    pub bearish: usize,
    pub neutral: usize,
    pub total: usize,
    /// 확률 (%, 합계 100)
    pub bullish_pct: Decimal,
    pub bearish_pct: Decimal,
    pub neutral_pct: Decimal,
}

/// 시장 심리.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sentiment {
    VeryBullish,
    Bullish,
    Neutral,
    Bearish,
    VeryBearish,
}

/// 가격 목표 출처.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum TargetSource {
    FibRetracement { ratio: Decimal },
    FibExtension { ratio: Decimal },
    Pivot { level: &'static str },
    Resistance,
    Support,
}

/// 가격 목표.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PriceTarget {
    #[serde(flatten)]
    pub source: TargetSource,
    pub price: Decimal,
    /// 마지막 종가 대비 거리 (%)
    pub distance_pct: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PriceTargets {
    pub bullish: Vec<PriceTarget>,
    pub bearish: Vec<PriceTarget>,
}

/// 시장 요약.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MarketSummary {
    pub last_close: Decimal,
    pub trend_strength: TrendStrength,
    pub signals: SignalDistribution,
    pub sentiment: Sentiment,
    /// 신호 편향을 반영한 심리 점수
    pub sentiment_score: Decimal,
    pub targets: PriceTargets,
}

/// 요약 계산에 쓰는 지표의 마지막 값.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LatestReadings {
    pub rsi: Option<Decimal>,
    pub macd_histogram: Option<Decimal>,
    pub adx: Option<AdxValue>,
    pub stochastic_k: Option<Decimal>,
    pub percent_b: Option<Decimal>,
    pub mfi: Option<Decimal>,
    /// (기간, 값)
    pub emas: Vec<(usize, Decimal)>,
    /// OBV 시리즈 중 정의된 값 (오래된 순)
    pub obv: Vec<Decimal>,
}

impl LatestReadings {
    /// 지표 일괄 계산 결과에서 마지막 바의 값을 꺼냅니다.
    pub fn from_batch(batch: &IndicatorBatch) -> Self {
        let latest = |name: &str| batch.find(name).and_then(IndicatorSeries::latest);
        let single = |name: &str| latest(name).and_then(IndicatorValue::as_single);

        Self {
            rsi: single("rsi"),
            macd_histogram: match latest("macd") {
                Some(IndicatorValue::Macd(m)) => m.histogram,
                _ => None,
            },
            adx: match latest("adx") {
                Some(IndicatorValue::Adx(a)) => Some(*a),
                _ => None,
            },
            stochastic_k: match latest("stochastic") {
                Some(IndicatorValue::Stochastic(s)) => Some(s.k),
                _ => None,
            },
            percent_b: match latest("bollinger") {
                Some(IndicatorValue::Bands(b)) => Some(b.percent_b),
                _ => None,
            },
            mfi: single("mfi"),
            emas: TREND_EMA_PERIODS
                .iter()
                .filter_map(|p| single(&format!("ema_{}", p)).map(|v| (*p, v)))
                .collect(),
            obv: batch
                .find("obv")
                .map(|s| s.values.iter().flatten().filter_map(IndicatorValue::as_single).collect())
                .unwrap_or_default(),
        }
    }
}

/// 시장 요약을 계산합니다. 바가 없으면 `None`.
pub fn summarize(bars: &[Bar], readings: &LatestReadings, levels: &LevelsSnapshot) -> Option<MarketSummary> {
    let last_close = bars.last()?.close;

    let trend_strength = trend_strength(last_close, readings);
    let signals = signal_distribution(last_close, readings);
    let (sentiment, sentiment_score) = sentiment(&trend_strength, &signals);
    let targets = price_targets(last_close, levels);

    Some(MarketSummary {
        last_close,
        trend_strength,
        signals,
        sentiment,
        sentiment_score,
        targets,
    })
}

/// 추세 강도 계산.
pub fn trend_strength(last_close: Decimal, r: &LatestReadings) -> TrendStrength {
    let mut score = Decimal::ZERO;
    let mut weight = Decimal::ZERO;
    let mut reasons = Vec::new();

    let mut add = |s: Decimal, w: Decimal, reason: Option<TrendReason>| {
        score += s;
        weight += w;
        if let Some(reason) = reason {
            reasons.push(reason);
        }
    };

    if let Some(rsi) = r.rsi {
        if rsi > dec!(70) {
            add(dec!(2), dec!(2), Some(TrendReason::RsiOverbought));
        } else if rsi > dec!(50) {
            add(dec!(1), dec!(1), Some(TrendReason::RsiBullish));
        } else if rsi < dec!(30) {
            add(dec!(-2), dec!(2), Some(TrendReason::RsiOversold));
        } else {
            add(dec!(-1), dec!(1), Some(TrendReason::RsiBearish));
        }
    }

    if let Some(hist) = r.macd_histogram {
        if hist > Decimal::ZERO {
            add(dec!(1.5), dec!(1.5), Some(TrendReason::MacdPositive));
        } else {
            add(dec!(-1.5), dec!(1.5), Some(TrendReason::MacdNegative));
        }
    }

    if let Some(AdxValue { adx: Some(adx), plus_di, minus_di }) = r.adx {
        if adx > dec!(25) {
            if plus_di > minus_di {
                add(dec!(2), dec!(2), Some(TrendReason::AdxBullish));
            } else {
                add(dec!(-2), dec!(2), Some(TrendReason::AdxBearish));
            }
        } else {
            add(Decimal::ZERO, Decimal::ZERO, Some(TrendReason::AdxWeak));
        }
    }

    if !r.emas.is_empty() {
        let above = r.emas.iter().filter(|(_, ema)| last_close > *ema).count();
        let below = r.emas.len() - above;
        add(
            Decimal::from(above) - Decimal::from(below),
            Decimal::from(r.emas.len()),
            Some(TrendReason::EmaPosition { above, below }),
        );
    }

    if let Some(pb) = r.percent_b {
        if pb > dec!(0.8) {
            add(dec!(-0.5), dec!(0.5), Some(TrendReason::BollingerUpper));
        } else if pb < dec!(0.2) {
            add(dec!(0.5), dec!(0.5), Some(TrendReason::BollingerLower));
        } else {
            add(Decimal::ZERO, dec!(0.5), None);
        }
    }

    if let Some(&current) = r.obv.last() {
        let prev = if r.obv.len() > OBV_SHORT_WINDOW {
            r.obv[r.obv.len() - OBV_SHORT_WINDOW]
        } else {
            current
        };
        if current > prev * dec!(1.02) {
            add(dec!(1), dec!(1), Some(TrendReason::ObvRising));
        } else if current < prev * dec!(0.98) {
            add(dec!(-1), dec!(1), Some(TrendReason::ObvFalling));
        } else {
            add(Decimal::ZERO, dec!(1), None);
        }
    }

    let score = if weight.is_zero() {
        Decimal::ZERO
    } else {
        (score / weight * dec!(50)).clamp(dec!(-100), dec!(100))
    };

    TrendStrength { score, reasons }
}

#[derive(Default)]
struct Tally {
    bullish: usize,
    bearish: usize,
    neutral: usize,
}

impl Tally {
    fn classify(&mut self, value: Decimal, bull_above: Decimal, bear_below: Decimal) {
        if value > bull_above {
            self.bullish += 1;
        } else if value < bear_below {
            self.bearish += 1;
        } else {
            self.neutral += 1;
        }
    }
}

/// 신호 분포 계산.
pub fn signal_distribution(last_close: Decimal, r: &LatestReadings) -> SignalDistribution {
    let mut t = Tally::default();

    if let Some(rsi) = r.rsi {
        t.classify(rsi, dec!(60), dec!(40));
    }
    if let Some(hist) = r.macd_histogram {
        if hist.abs() < dec!(0.001) {
            t.neutral += 1;
        } else {
            t.classify(hist, Decimal::ZERO, Decimal::ZERO);
        }
    }
    if let Some(k) = r.stochastic_k {
        t.classify(k, dec!(70), dec!(30));
    }
    if let Some(pb) = r.percent_b {
        t.classify(pb, dec!(0.8), dec!(0.2));
    }
    if let Some(mfi) = r.mfi {
        t.classify(mfi, dec!(60), dec!(40));
    }
    for (period, ema) in &r.emas {
        if (*period == 50 || *period == 200) && !ema.is_zero() {
            let diff_pct = (last_close - ema) / ema * dec!(100);
            t.classify(diff_pct, dec!(1), dec!(-1));
        }
    }
    if let Some(&current) = r.obv.last() {
        let recent = &r.obv[r.obv.len().saturating_sub(OBV_MEAN_WINDOW)..];
        let mean = recent.iter().sum::<Decimal>() / Decimal::from(recent.len());
        let diff_pct = if mean.is_zero() {
            Decimal::ZERO
        } else {
            (current - mean) / mean * dec!(100)
        };
        t.classify(diff_pct, dec!(5), dec!(-5));
    }
    // 추세가 약하면 중립 신호 두 개
    if let Some(AdxValue { adx: Some(adx), .. }) = r.adx {
        if adx < dec!(20) {
            t.neutral += 2;
        }
    }

    let total = t.bullish + t.bearish + t.neutral;
    let (bullish_pct, bearish_pct, neutral_pct) = if total == 0 {
        (dec!(33.33), dec!(33.33), dec!(33.34))
    } else {
        let pct = |n: usize| round2(Decimal::from(n) * dec!(100) / Decimal::from(total));
        let bull = pct(t.bullish);
        let bear = pct(t.bearish);
        (bull, bear, dec!(100) - bull - bear)
    };

    SignalDistribution {
        bullish: t.bullish,
        bearish: t.bearish,
        neutral: t.neutral,
        total,
        bullish_pct,
        bearish_pct,
        neutral_pct,
    }
}

/// 시장 심리와 심리 점수.
///
/// 신호 편향 (강세 - 약세) / 전체 × 20을 추세 강도에 더합니다.
pub fn sentiment(strength: &TrendStrength, signals: &SignalDistribution) -> (Sentiment, Decimal) {
    let mut score = strength.score;
    if signals.total > 0 {
        let bias = (Decimal::from(signals.bullish) - Decimal::from(signals.bearish))
            / Decimal::from(signals.total)
            * dec!(20);
        score += bias;
    }

    let mostly_neutral =
        Decimal::from(signals.neutral) > Decimal::from(signals.total) * dec!(0.6) && score.abs() < dec!(15);

    let sentiment = if mostly_neutral {
        Sentiment::Neutral
    } else if score >= dec!(25) {
        Sentiment::VeryBullish
    } else if score >= dec!(10) {
        Sentiment::Bullish
    } else if score >= dec!(-10) {
        Sentiment::Neutral
    } else if score >= dec!(-25) {
        Sentiment::Bearish
    } else {
        Sentiment::VeryBearish
    };

    (sentiment, score)
}

/// 가격 목표.
///
/// 강세 목표는 현재가 위의 피보나치 되돌림/확장, 피벗 저항, 저항 클러스터이고
/// 약세 목표는 현재가 아래의 피보나치 되돌림, 피벗 지지, 지지 클러스터입니다.
pub fn price_targets(last_close: Decimal, levels: &LevelsSnapshot) -> PriceTargets {
    let mut bullish = Vec::new();
    let mut bearish = Vec::new();

    let target = |source: TargetSource, price: Decimal| PriceTarget {
        source,
        price,
        distance_pct: price
            .pct_change_from(last_close)
            .map(round2)
            .unwrap_or(Decimal::ZERO),
    };

    if let Some(fib) = &levels.fibonacci {
        for level in &fib.retracements {
            let source = TargetSource::FibRetracement { ratio: level.ratio };
            if level.price > last_close {
                bullish.push(target(source, level.price));
            } else if level.price < last_close {
                bearish.push(target(source, level.price));
            }
        }
        for level in &fib.extensions {
            if level.price > last_close {
                bullish.push(target(TargetSource::FibExtension { ratio: level.ratio }, level.price));
            }
        }
    }

    if let Some(pivots) = &levels.next_pivots {
        for (name, price) in pivots.resistances() {
            if price > last_close {
                bullish.push(target(TargetSource::Pivot { level: name }, price));
            }
        }
        for (name, price) in pivots.supports() {
            if price < last_close {
                bearish.push(target(TargetSource::Pivot { level: name }, price));
            }
        }
    }

    if let Some(sr) = &levels.support_resistance {
        for level in sr.resistance.iter().filter(|l| l.price > last_close) {
            bullish.push(target(TargetSource::Resistance, level.price));
        }
        for level in sr.support.iter().filter(|l| l.price < last_close) {
            bearish.push(target(TargetSource::Support, level.price));
        }
    }

    for targets in [&mut bullish, &mut bearish] {
        targets.retain(|t| t.price > Decimal::ZERO);
        targets.sort_by_key(|t| t.distance_pct.abs());
        targets.truncate(MAX_TARGETS);
    }

    PriceTargets { bullish, bearish }
}

fn round2(value: Decimal) -> Decimal {
    value.round_half_up(2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::PivotLevels;
    use crate::levels::{FibonacciLevel, FibonacciLevels, PriceLevel, SupportResistance, SwingDirection};

    fn bullish_readings() -> LatestReadings {
        LatestReadings {
            rsi: Some(dec!(65)),
            macd_histogram: Some(dec!(0.5)),
            adx: Some(AdxValue {
                adx: Some(dec!(30)),
                plus_di: dec!(28),
                minus_di: dec!(12),
            }),
            stochastic_k: Some(dec!(80)),
            percent_b: Some(dec!(0.6)),
            mfi: Some(dec!(65)),
            emas: vec![(9, dec!(99)), (21, dec!(98)), (50, dec!(95)), (200, dec!(90))],
            obv: vec![dec!(100), dec!(110), dec!(120), dec!(130), dec!(140), dec!(150)],
        }
    }

    #[test]
    fn test_trend_strength_bullish() {
        let strength = trend_strength(dec!(100), &bullish_readings());
        // 점수 1 + 1.5 + 2 + 4 + 0 + 1 = 9.5, 가중치 1 + 1.5 + 2 + 4 + 0.5 + 1 = 10
        assert_eq!(strength.score, dec!(47.5));
        assert!(strength.reasons.contains(&TrendReason::AdxBullish));
        assert!(strength.reasons.contains(&TrendReason::EmaPosition { above: 4, below: 0 }));
        assert!(strength.reasons.contains(&TrendReason::ObvRising));
    }

    #[test]
    fn test_trend_strength_empty() {
        let strength = trend_strength(dec!(100), &LatestReadings::default());
        assert_eq!(strength.score, Decimal::ZERO);
        assert!(strength.reasons.is_empty());
    }

    #[test]
    fn test_weak_adx_only_adds_reason() {
        let readings = LatestReadings {
            rsi: Some(dec!(75)),
            adx: Some(AdxValue {
                adx: Some(dec!(15)),
                plus_di: dec!(10),
                minus_di: dec!(20),
            }),
            ..LatestReadings::default()
        };
        let strength = trend_strength(dec!(100), &readings);
        assert_eq!(strength.score, dec!(50));
        assert!(strength.reasons.contains(&TrendReason::AdxWeak));
    }

    #[test]
    fn test_signal_distribution() {
        let signals = signal_distribution(dec!(100), &bullish_readings());
        // RSI, MACD, Stochastic, MFI, EMA50, EMA200, OBV 강세 / %B 중립
        assert_eq!(signals.bullish, 7);
        assert_eq!(signals.neutral, 1);
        assert_eq!(signals.bearish, 0);
        assert_eq!(signals.total, 8);
        assert_eq!(signals.bullish_pct + signals.bearish_pct + signals.neutral_pct, dec!(100));
        assert_eq!(signals.bullish_pct, dec!(87.50));
    }

    #[test]
    fn test_signal_distribution_without_signals() {
        let signals = signal_distribution(dec!(100), &LatestReadings::default());
        assert_eq!(signals.total, 0);
        assert_eq!(signals.bullish_pct, dec!(33.33));
        assert_eq!(signals.neutral_pct, dec!(33.34));
    }

    #[test]
    fn test_sentiment_thresholds() {
        let signals = signal_distribution(dec!(100), &bullish_readings());
        let strength = trend_strength(dec!(100), &bullish_readings());
        let (s, score) = sentiment(&strength, &signals);
        // 47.5 + 7/8 × 20
        assert_eq!(score, dec!(65));
        assert_eq!(s, Sentiment::VeryBullish);

        let neutral_signals = SignalDistribution {
            bullish: 1,
            bearish: 0,
            neutral: 9,
            total: 10,
            bullish_pct: dec!(10),
            bearish_pct: dec!(0),
            neutral_pct: dec!(90),
        };
        let weak = TrendStrength {
            score: dec!(12),
            reasons: vec![],
        };
        // 12 + 2 = 14 < 15, 중립 비율 90%
        assert_eq!(sentiment(&weak, &neutral_signals).0, Sentiment::Neutral);

        let bearish = TrendStrength {
            score: dec!(-20),
            reasons: vec![],
        };
        let none = signal_distribution(dec!(100), &LatestReadings::default());
        assert_eq!(sentiment(&bearish, &none).0, Sentiment::Bearish);
    }

    #[test]
    fn test_price_targets() {
        let levels = LevelsSnapshot {
            support_resistance: Some(SupportResistance {
                support: vec![PriceLevel {
                    price: dec!(95),
                    touches: 2,
                }],
                resistance: vec![PriceLevel {
                    price: dec!(110),
                    touches: 3,
                }],
            }),
            fibonacci: Some(FibonacciLevels {
                swing_high: dec!(120),
                swing_low: dec!(80),
                direction: SwingDirection::Up,
                retracements: vec![
                    FibonacciLevel {
                        ratio: dec!(0.236),
                        price: dec!(110.56),
                    },
                    FibonacciLevel {
                        ratio: dec!(0.5),
                        price: dec!(100),
                    },
                    FibonacciLevel {
                        ratio: dec!(0.618),
                        price: dec!(95.28),
                    },
                ],
                extensions: vec![FibonacciLevel {
                    ratio: dec!(1.272),
                    price: dec!(130.88),
                }],
            }),
            next_pivots: Some(PivotLevels {
                pivot: dec!(101),
                r1: dec!(104),
                r2: dec!(108),
                r3: dec!(112),
                s1: dec!(98),
                s2: dec!(94),
                s3: dec!(90),
                r4: None,
                s4: None,
            }),
        };

        let targets = price_targets(dec!(101), &levels);
        assert_eq!(targets.bullish.len(), 5);
        assert_eq!(targets.bullish[0].price, dec!(104));
        assert_eq!(targets.bullish[0].distance_pct, dec!(2.97));
        assert!(targets.bullish.windows(2).all(|w| w[0].distance_pct <= w[1].distance_pct));
        assert!(targets.bullish.iter().all(|t| t.price > dec!(101)));

        // 100(되돌림 0.5), 98(S1), 95.28, 95(지지), 94(S2)
        assert_eq!(targets.bearish.len(), 5);
        assert_eq!(targets.bearish[0].price, dec!(100));
        assert_eq!(targets.bearish[0].source, TargetSource::FibRetracement { ratio: dec!(0.5) });
        assert!(targets.bearish.iter().all(|t| t.price < dec!(101)));
    }

    #[test]
    fn test_target_serialization() {
        let t = PriceTarget {
            source: TargetSource::Pivot { level: "R1" },
            price: dec!(104),
            distance_pct: dec!(2.97),
        };
        let json = serde_json::to_value(t).unwrap();
        assert_eq!(json["source"], "pivot");
        assert_eq!(json["level"], "R1");
    }
}
