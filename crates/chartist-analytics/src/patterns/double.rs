//! 두 바 패턴.

use rust_decimal_macros::dec;

use super::context::{LocalTrend, ScanContext};
use super::{CandlePatternType as P, Match, PatternParams};

/// Tweezer 고가/저가 일치 허용 오차 (0.1%).
const TWEEZER_TOLERANCE: rust_decimal::Decimal = dec!(0.001);

/// Engulfing: 방향이 반대인 두 바에서 현재 몸통이 직전 몸통을 포함 (경계 포함).
pub(crate) fn engulfing(ctx: &ScanContext<'_>, i: usize, _params: &PatternParams) -> Option<Match> {
    let (prev, curr) = (&ctx.bars[i - 1], &ctx.bars[i]);
    let contains = curr.body_bottom() <= prev.body_bottom() && curr.body_top() >= prev.body_top();
    if !contains {
        return None;
    }

    if prev.is_bearish() && curr.is_bullish() {
        Some(Match::of(P::BullishEngulfing))
    } else if prev.is_bullish() && curr.is_bearish() {
        Some(Match::of(P::BearishEngulfing))
    } else {
        None
    }
}

/// Harami: 현재 몸통이 직전 몸통 안에 있고 더 작음. 방향은 직전 바의 반대.
pub(crate) fn harami(ctx: &ScanContext<'_>, i: usize, _params: &PatternParams) -> Option<Match> {
    let (prev, curr) = (&ctx.bars[i - 1], &ctx.bars[i]);
    let inside = curr.body_bottom() >= prev.body_bottom() && curr.body_top() <= prev.body_top();
    if !inside || curr.body() >= prev.body() {
        return None;
    }

    if prev.is_bearish() {
        Some(Match::of(P::BullishHarami))
    } else if prev.is_bullish() {
        Some(Match::of(P::BearishHarami))
    } else {
        None
    }
}

/// Piercing Line / Dark Cloud Cover.
///
/// 직전 종가 너머에서 시작해 직전 몸통 중간을 넘어서되 직전 시가는 넘지 않고 마감.
pub(crate) fn piercing(ctx: &ScanContext<'_>, i: usize, _params: &PatternParams) -> Option<Match> {
    let (prev, curr) = (&ctx.bars[i - 1], &ctx.bars[i]);
    let mid = prev.body_midpoint();

    if prev.is_bearish()
        && curr.is_bullish()
        && curr.open < prev.close
        && curr.close > mid
        && curr.close < prev.open
    {
        return Some(Match::of(P::PiercingLine));
    }

    if prev.is_bullish()
        && curr.is_bearish()
        && curr.open > prev.close
        && curr.close < mid
        && curr.close > prev.open
    {
        return Some(Match::of(P::DarkCloudCover));
    }

    None
}

/// Tweezer Top / Bottom. 상승 추세 뒤 같은 고가, 하락 추세 뒤 같은 저가.
pub(crate) fn tweezer(ctx: &ScanContext<'_>, i: usize, _params: &PatternParams) -> Option<Match> {
    let (prev, curr) = (&ctx.bars[i - 1], &ctx.bars[i]);
    match ctx.trend(i - 1) {
        LocalTrend::Up if (curr.high - prev.high).abs() <= curr.high * TWEEZER_TOLERANCE => {
            Some(Match::of(P::TweezerTop))
        }
        LocalTrend::Down if (curr.low - prev.low).abs() <= curr.low * TWEEZER_TOLERANCE => {
            Some(Match::of(P::TweezerBottom))
        }
        _ => None,
    }
}
