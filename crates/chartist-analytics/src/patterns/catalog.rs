//! 캔들 패턴 카탈로그.
//!
//! 패턴별 신뢰도, 바 개수, 기본 방향은 패턴 자체의 속성이며 시장 상황에 따라 다시 계산되지 않습니다.
//! [`CATALOG`]는 [`CandlePatternType`] 선언 순서와 같은 순서로 정렬된 불변 테이블입니다.

use serde::{Deserialize, Serialize};

use super::{CandlePatternType, PatternDirection};

/// 패턴 신뢰도. 선언 순서가 곧 대소 관계입니다 (low < medium < high < very_high).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reliability {
    #[default]
    Low,
    Medium,
    High,
    VeryHigh,
}

impl Reliability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Reliability::Low => "low",
            Reliability::Medium => "medium",
            Reliability::High => "high",
            Reliability::VeryHigh => "very_high",
        }
    }
}

impl std::str::FromStr for Reliability {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace(['-', ' '], "_").as_str() {
            "low" => Ok(Reliability::Low),
            "medium" => Ok(Reliability::Medium),
            "high" => Ok(Reliability::High),
            "very_high" => Ok(Reliability::VeryHigh),
            _ => Err(format!("알 수 없는 신뢰도: {}", s)),
        }
    }
}

/// 패턴 카탈로그 항목.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatternSpec {
    pub pattern: CandlePatternType,
    /// 표시 이름
    pub name: &'static str,
    pub reliability: Reliability,
    /// 인식에 사용하는 바 개수 (Three Methods는 최대값)
    pub span: usize,
    /// 기본 방향
    pub direction: PatternDirection,
    /// 직전 추세에 따라 인식 여부나 방향이 달라지는지
    pub uses_trend: bool,
    pub description: &'static str,
}

const fn spec(
    pattern: CandlePatternType,
    name: &'static str,
    reliability: Reliability,
    span: usize,
    direction: PatternDirection,
    uses_trend: bool,
    description: &'static str,
) -> PatternSpec {
    PatternSpec {
        pattern,
        name,
        reliability,
        span,
        direction,
        uses_trend,
        description,
    }
}

use CandlePatternType as P;
use PatternDirection::{Bearish, Bullish, Neutral};
use Reliability::{High, Low, Medium, VeryHigh};

/// 전체 패턴 카탈로그.
pub static CATALOG: [PatternSpec; CandlePatternType::COUNT] = [
    spec(P::Doji, "Doji", Low, 1, Neutral, false, "시장 우유부단, 추세 전환 가능성"),
    spec(P::LongLeggedDoji, "Long-Legged Doji", Medium, 1, Neutral, false, "극단적 우유부단, 중요한 전환점 가능성"),
    spec(P::DragonflyDoji, "Dragonfly Doji", Medium, 1, Bullish, false, "저점에서 지지 확인"),
    spec(P::GravestoneDoji, "Gravestone Doji", Medium, 1, Bearish, false, "고점에서 저항 확인"),
    spec(P::Hammer, "Hammer", High, 1, Bullish, true, "하락 추세 후 강세 반전"),
    spec(P::HangingMan, "Hanging Man", Medium, 1, Bearish, true, "상승 추세 후 약세 반전 가능성"),
    spec(P::InvertedHammer, "Inverted Hammer", Medium, 1, Bullish, true, "하락 추세 후 강세 반전 가능성"),
    spec(P::ShootingStar, "Shooting Star", High, 1, Bearish, true, "상승 추세 후 약세 반전"),
    spec(P::BullishMarubozu, "Bullish Marubozu", High, 1, Bullish, false, "매수세가 구간 전체를 지배"),
    spec(P::BearishMarubozu, "Bearish Marubozu", High, 1, Bearish, false, "매도세가 구간 전체를 지배"),
    spec(P::SpinningTop, "Spinning Top", Low, 1, Neutral, false, "우유부단, 횡보 가능성"),
    spec(P::BullishEngulfing, "Bullish Engulfing", High, 2, Bullish, false, "양봉이 직전 음봉 몸통을 감싸는 강세 반전"),
    spec(P::BearishEngulfing, "Bearish Engulfing", High, 2, Bearish, false, "음봉이 직전 양봉 몸통을 감싸는 약세 반전"),
    spec(P::BullishHarami, "Bullish Harami", Medium, 2, Bullish, false, "큰 음봉 몸통 안의 작은 몸통, 강세 반전 가능성"),
    spec(P::BearishHarami, "Bearish Harami", Medium, 2, Bearish, false, "큰 양봉 몸통 안의 작은 몸통, 약세 반전 가능성"),
    spec(P::PiercingLine, "Piercing Line", High, 2, Bullish, false, "음봉 종가 아래 시가, 몸통 중간 위 종가"),
    spec(P::DarkCloudCover, "Dark Cloud Cover", High, 2, Bearish, false, "양봉 종가 위 시가, 몸통 중간 아래 종가"),
    spec(P::TweezerTop, "Tweezer Top", Medium, 2, Bearish, true, "같은 고가에서 두 번 저항"),
    spec(P::TweezerBottom, "Tweezer Bottom", Medium, 2, Bullish, true, "같은 저가에서 두 번 지지"),
    spec(P::MorningStar, "Morning Star", VeryHigh, 3, Bullish, false, "큰 음봉, 작은 별, 확인 양봉의 강세 반전"),
    spec(P::EveningStar, "Evening Star", VeryHigh, 3, Bearish, false, "큰 양봉, 작은 별, 확인 음봉의 약세 반전"),
    spec(P::ThreeWhiteSoldiers, "Three White Soldiers", High, 3, Bullish, false, "연속 세 양봉의 강한 상승"),
    spec(P::ThreeBlackCrows, "Three Black Crows", High, 3, Bearish, false, "연속 세 음봉의 강한 하락"),
    spec(P::ThreeInsideUp, "Three Inside Up", High, 3, Bullish, false, "확인된 상승 잉태형"),
    spec(P::ThreeInsideDown, "Three Inside Down", High, 3, Bearish, false, "확인된 하락 잉태형"),
    spec(P::ThreeOutsideUp, "Three Outside Up", High, 3, Bullish, false, "확인된 상승 장악형"),
    spec(P::ThreeOutsideDown, "Three Outside Down", High, 3, Bearish, false, "확인된 하락 장악형"),
    spec(P::RisingThreeMethods, "Rising Three Methods", High, 5, Bullish, false, "상승 추세 지속 (횡보 후 재상승)"),
    spec(P::FallingThreeMethods, "Falling Three Methods", High, 5, Bearish, false, "하락 추세 지속 (횡보 후 재하락)"),
];

impl CandlePatternType {
    /// 카탈로그 항목.
    pub fn spec(self) -> &'static PatternSpec {
        &CATALOG[self as usize]
    }

    /// 표시 이름.
    pub fn name(self) -> &'static str {
        self.spec().name
    }

    /// 신뢰도.
    pub fn reliability(self) -> Reliability {
        self.spec().reliability
    }
}
