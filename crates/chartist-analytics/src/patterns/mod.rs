//! 캔들스틱 패턴 인식 (Pattern Recognizer).
//!
//! 1~5개 연속 바의 윈도우에 대한 술어로 패턴을 정의하고, 모든 유효한 위치에서
//! 모든 패턴 계열을 평가합니다. 한 바가 여러 패턴에 동시에 참여할 수 있습니다.
//!
//! ## 패턴 계열
//! - **단일 바**: Doji(Long-Legged/Dragonfly/Gravestone), Hammer/Hanging Man,
//!   Inverted Hammer/Shooting Star, Marubozu, Spinning Top
//! - **두 바**: Engulfing, Harami, Piercing Line/Dark Cloud Cover, Tweezer
//! - **세 바 이상**: Morning/Evening Star, Three White Soldiers/Black Crows,
//!   Three Inside/Outside, Rising/Falling Three Methods
//!
//! 신뢰도는 [`catalog::CATALOG`]의 정적 값이며, 발생 위치(`index`)는 패턴을
//! 완성하는 마지막 바의 인덱스입니다.

mod catalog;
mod context;
mod double;
mod single;
mod triple;

pub use catalog::{PatternSpec, Reliability, CATALOG};
pub use context::{LocalTrend, ScanContext};

use std::collections::BTreeMap;

use chartist_core::Bar;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::indicators::{IndicatorError, SkippedComputation};

/// 패턴 인식에 필요한 최소 바 개수.
pub const MIN_SCAN_BARS: usize = 3;

/// 통계에 포함할 최근 패턴 개수.
const RECENT_PATTERNS: usize = 5;

/// 캔들 패턴 유형.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandlePatternType {
    /// 도지
    Doji,
    /// 긴 다리 도지
    LongLeggedDoji,
    /// 잠자리형 도지
    DragonflyDoji,
    /// 비석형 도지
    GravestoneDoji,
    /// 망치형
    Hammer,
    /// 교수형
    HangingMan,
    /// 역망치형
    InvertedHammer,
    /// 유성형
    ShootingStar,
    BullishMarubozu,
    BearishMarubozu,
    /// 팽이형
    SpinningTop,
    /// 상승 장악형
    BullishEngulfing,
    /// 하락 장악형
    BearishEngulfing,
    /// 상승 잉태형
    BullishHarami,
    /// 하락 잉태형
    BearishHarami,
    /// 관통형
    PiercingLine,
    /// 먹구름형
    DarkCloudCover,
    TweezerTop,
    TweezerBottom,
    /// 샛별형
    MorningStar,
    /// 석별형
    EveningStar,
    /// 적삼병
    ThreeWhiteSoldiers,
    /// 흑삼병
    ThreeBlackCrows,
    ThreeInsideUp,
    ThreeInsideDown,
    ThreeOutsideUp,
    ThreeOutsideDown,
    RisingThreeMethods,
    FallingThreeMethods,
}

impl CandlePatternType {
    pub const COUNT: usize = 29;

    /// 모든 패턴 (카탈로그 순서).
    pub const ALL: [CandlePatternType; Self::COUNT] = [
        Self::Doji,
        Self::LongLeggedDoji,
        Self::DragonflyDoji,
        Self::GravestoneDoji,
        Self::Hammer,
        Self::HangingMan,
        Self::InvertedHammer,
        Self::ShootingStar,
        Self::BullishMarubozu,
        Self::BearishMarubozu,
        Self::SpinningTop,
        Self::BullishEngulfing,
        Self::BearishEngulfing,
        Self::BullishHarami,
        Self::BearishHarami,
        Self::PiercingLine,
        Self::DarkCloudCover,
        Self::TweezerTop,
        Self::TweezerBottom,
        Self::MorningStar,
        Self::EveningStar,
        Self::ThreeWhiteSoldiers,
        Self::ThreeBlackCrows,
        Self::ThreeInsideUp,
        Self::ThreeInsideDown,
        Self::ThreeOutsideUp,
        Self::ThreeOutsideDown,
        Self::RisingThreeMethods,
        Self::FallingThreeMethods,
    ];
}

/// 패턴 방향.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternDirection {
    Bullish,
    Bearish,
    Neutral,
}

/// 인식된 패턴 한 건.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternOccurrence {
    pub pattern: CandlePatternType,
    /// 패턴을 완성하는 바의 인덱스
    pub index: usize,
    /// 완성 바의 시각
    pub timestamp: DateTime<Utc>,
    pub direction: PatternDirection,
    pub reliability: Reliability,
    /// 인식에 사용한 바 개수
    pub span: usize,
}

/// 패턴 인식 파라미터.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatternParams {
    /// 도지 판단용 몸통/범위 비율 (기본: 0.1)
    pub body_ratio_threshold: Decimal,
    /// 망치형 판단용 꼬리/몸통 비율 (기본: 2.0)
    pub shadow_ratio_threshold: Decimal,
    /// 추세 확인 기간 (기본: 5)
    pub trend_lookback: usize,
    /// 이 신뢰도 이상만 보고 (기본: low)
    pub min_reliability: Reliability,
}

impl Default for PatternParams {
    fn default() -> Self {
        Self {
            body_ratio_threshold: dec!(0.1),
            shadow_ratio_threshold: dec!(2.0),
            trend_lookback: 5,
            min_reliability: Reliability::Low,
        }
    }
}

/// 계열 감지기가 돌려주는 한 건의 일치.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Match {
    pub pattern: CandlePatternType,
    pub direction: PatternDirection,
    pub span: usize,
}

impl Match {
    /// 카탈로그의 기본 방향과 바 개수를 사용합니다.
    pub(crate) fn of(pattern: CandlePatternType) -> Self {
        let spec = pattern.spec();
        Self {
            pattern,
            direction: spec.direction,
            span: spec.span,
        }
    }

    pub(crate) fn with_direction(mut self, direction: PatternDirection) -> Self {
        self.direction = direction;
        self
    }

    pub(crate) fn with_span(mut self, span: usize) -> Self {
        self.span = span;
        self
    }
}

type Detector = fn(&ScanContext<'_>, usize, &PatternParams) -> Option<Match>;

/// 패턴 계열 테이블: (계열 이름, 최소 윈도우, 감지기).
static FAMILIES: [(&str, usize, Detector); 14] = [
    ("doji", 1, single::doji),
    ("hammer", 1, single::hammer),
    ("inverted_hammer", 1, single::inverted_hammer),
    ("marubozu", 1, single::marubozu),
    ("spinning_top", 1, single::spinning_top),
    ("engulfing", 2, double::engulfing),
    ("harami", 2, double::harami),
    ("piercing", 2, double::piercing),
    ("tweezer", 2, double::tweezer),
    ("star", 3, triple::star),
    ("three_soldiers", 3, triple::three_soldiers),
    ("three_inside", 3, triple::three_inside),
    ("three_outside", 3, triple::three_outside),
    ("three_methods", 4, triple::three_methods),
];

/// 캔들 패턴 인식기.
#[derive(Debug, Default, Clone, Copy)]
pub struct PatternRecognizer {
    params: PatternParams,
}

impl PatternRecognizer {
    pub fn new(params: PatternParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &PatternParams {
        &self.params
    }

    /// 바 목록 전체를 스캔합니다.
    ///
    /// `atr`이 주어지면 몸통 크기 정규화에 사용합니다 (바 인덱스와 정렬된 시리즈).
    /// 바가 3개 미만이면 빈 목록을 반환합니다. 결과는 완성 바 인덱스 순이며,
    /// 같은 바에서는 계열 테이블 순서를 따릅니다.
    pub fn scan(&self, bars: &[Bar], atr: Option<&[Option<Decimal>]>) -> Vec<PatternOccurrence> {
        if bars.len() < MIN_SCAN_BARS {
            return Vec::new();
        }

        let ctx = ScanContext::new(bars, atr, self.params.trend_lookback);
        let mut found = Vec::new();

        for i in 0..bars.len() {
            for (_, window, detect) in FAMILIES.iter() {
                if i + 1 < *window {
                    continue;
                }
                let Some(m) = detect(&ctx, i, &self.params) else {
                    continue;
                };

                let reliability = m.pattern.reliability();
                if reliability < self.params.min_reliability {
                    continue;
                }

                found.push(PatternOccurrence {
                    pattern: m.pattern,
                    index: i,
                    timestamp: bars[i].timestamp,
                    direction: m.direction,
                    reliability,
                    span: m.span,
                });
            }
        }

        debug!(bars = bars.len(), patterns = found.len(), "패턴 스캔 완료");
        found
    }

    /// 윈도우가 바 개수보다 커서 평가하지 못한 패턴 계열.
    pub fn unavailable_families(&self, len: usize) -> Vec<SkippedComputation> {
        let required = |window: usize| window.max(MIN_SCAN_BARS);
        FAMILIES
            .iter()
            .filter(|(_, window, _)| required(*window) > len)
            .map(|(name, window, _)| SkippedComputation {
                name: format!("pattern:{}", name),
                reason: IndicatorError::InsufficientData {
                    required: required(*window),
                    provided: len,
                },
            })
            .collect()
    }
}

/// 패턴 발생 통계.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternStatistics {
    pub total: usize,
    pub bullish: usize,
    pub bearish: usize,
    pub neutral: usize,
    /// high 이상 신뢰도 패턴 수
    pub high_reliability: usize,
    pub by_pattern: BTreeMap<CandlePatternType, usize>,
    /// 가장 최근 패턴 (최대 5개, 오래된 순)
    pub recent: Vec<PatternOccurrence>,
}

impl PatternStatistics {
    pub fn from_occurrences(occurrences: &[PatternOccurrence]) -> Self {
        let mut stats = Self {
            total: occurrences.len(),
            ..Self::default()
        };

        for occ in occurrences {
            match occ.direction {
                PatternDirection::Bullish => stats.bullish += 1,
                PatternDirection::Bearish => stats.bearish += 1,
                PatternDirection::Neutral => stats.neutral += 1,
            }
            if occ.reliability >= Reliability::High {
                stats.high_reliability += 1;
            }
            *stats.by_pattern.entry(occ.pattern).or_insert(0) += 1;
        }

        let skip = occurrences.len().saturating_sub(RECENT_PATTERNS);
        stats.recent = occurrences[skip..].to_vec();
        stats
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use chrono::{Duration, TimeZone};

    /// (시가, 고가, 저가, 종가) 목록으로 일봉을 만듭니다.
    pub fn ohlc(rows: &[(i64, i64, i64, i64)]) -> Vec<Bar> {
        let start = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        rows.iter()
            .enumerate()
            .map(|(i, (o, h, l, c))| {
                Bar::new(
                    start + Duration::days(i as i64),
                    Decimal::from(*o),
                    Decimal::from(*h),
                    Decimal::from(*l),
                    Decimal::from(*c),
                    dec!(1000),
                )
            })
            .collect()
    }

    /// 기본 파라미터로 `i`번째 바에서 감지기를 실행합니다.
    pub fn run(bars: &[Bar], i: usize, detect: Detector) -> Option<Match> {
        let ctx = ScanContext::new(bars, None, 5);
        detect(&ctx, i, &PatternParams::default())
    }
}
