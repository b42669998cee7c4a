//! 세 바 이상 패턴.

use chartist_core::Bar;
use rust_decimal_macros::dec;

use super::context::ScanContext;
use super::{CandlePatternType as P, Match, PatternParams};

/// Morning Star / Evening Star.
///
/// 긴 첫 바, 몸통이 첫 바의 30% 미만이고 몸통끼리 겹치지 않는 별,
/// 첫 바 몸통 중간을 넘어 마감하는 반대 방향 확인 바.
pub(crate) fn star(ctx: &ScanContext<'_>, i: usize, _params: &PatternParams) -> Option<Match> {
    let (b1, b2, b3) = (&ctx.bars[i - 2], &ctx.bars[i - 1], &ctx.bars[i]);
    if !ctx.is_long_body(i - 2) || b2.body() >= b1.body() * dec!(0.3) {
        return None;
    }
    let mid = b1.body_midpoint();

    if b1.is_bearish() && b2.body_top() <= b1.body_bottom() && b3.is_bullish() && b3.close > mid {
        return Some(Match::of(P::MorningStar));
    }
    if b1.is_bullish() && b2.body_bottom() >= b1.body_top() && b3.is_bearish() && b3.close < mid {
        return Some(Match::of(P::EveningStar));
    }
    None
}

/// Three White Soldiers / Three Black Crows.
pub(crate) fn three_soldiers(ctx: &ScanContext<'_>, i: usize, _params: &PatternParams) -> Option<Match> {
    let bars = &ctx.bars[i - 2..=i];
    let advancing = bars.windows(2).all(|w| w[1].close > w[0].close && w[1].open > w[0].open);
    let declining = bars.windows(2).all(|w| w[1].close < w[0].close && w[1].open < w[0].open);

    let soldiers = advancing
        && bars
            .iter()
            .all(|b| b.is_bullish() && b.upper_shadow() <= b.body() * dec!(0.3));
    if soldiers {
        return Some(Match::of(P::ThreeWhiteSoldiers));
    }

    let crows = declining
        && bars
            .iter()
            .all(|b| b.is_bearish() && b.lower_shadow() <= b.body() * dec!(0.3));
    crows.then(|| Match::of(P::ThreeBlackCrows))
}

/// Three Inside Up / Down: 잉태형 뒤 확인 바.
pub(crate) fn three_inside(ctx: &ScanContext<'_>, i: usize, _params: &PatternParams) -> Option<Match> {
    let (b1, b2, b3) = (&ctx.bars[i - 2], &ctx.bars[i - 1], &ctx.bars[i]);

    if b1.is_bearish()
        && b2.is_bullish()
        && b2.close < b1.open
        && b2.open > b1.close
        && b3.is_bullish()
        && b3.close > b2.close
    {
        return Some(Match::of(P::ThreeInsideUp));
    }
    if b1.is_bullish()
        && b2.is_bearish()
        && b2.close > b1.open
        && b2.open < b1.close
        && b3.is_bearish()
        && b3.close < b2.close
    {
        return Some(Match::of(P::ThreeInsideDown));
    }
    None
}

/// Three Outside Up / Down: 장악형 뒤 확인 바.
pub(crate) fn three_outside(ctx: &ScanContext<'_>, i: usize, _params: &PatternParams) -> Option<Match> {
    let (b1, b2, b3) = (&ctx.bars[i - 2], &ctx.bars[i - 1], &ctx.bars[i]);

    if b1.is_bearish()
        && b2.is_bullish()
        && b2.open < b1.close
        && b2.close > b1.open
        && b3.is_bullish()
        && b3.close > b2.close
    {
        return Some(Match::of(P::ThreeOutsideUp));
    }
    if b1.is_bullish()
        && b2.is_bearish()
        && b2.open > b1.close
        && b2.close < b1.open
        && b3.is_bearish()
        && b3.close < b2.close
    {
        return Some(Match::of(P::ThreeOutsideDown));
    }
    None
}

/// 첫 바의 범위 안에서 작은 몸통으로 쉬어가는 바들인지.
fn consolidates_within(first: &Bar, inner: &[Bar]) -> bool {
    inner
        .iter()
        .all(|b| b.body() < first.body() && b.close > first.low && b.close < first.high)
}

/// Rising / Falling Three Methods. 안쪽 바 3개(5봉)를 먼저, 다음으로 2개(4봉)를 봅니다.
pub(crate) fn three_methods(ctx: &ScanContext<'_>, i: usize, _params: &PatternParams) -> Option<Match> {
    let last = &ctx.bars[i];

    for inner_len in [3usize, 2] {
        if i < inner_len + 1 {
            continue;
        }
        let start = i - inner_len - 1;
        let first = &ctx.bars[start];
        if !ctx.is_long_body(start) || !consolidates_within(first, &ctx.bars[start + 1..i]) {
            continue;
        }

        let span = inner_len + 2;
        if first.is_bullish() && last.is_bullish() && last.close > first.close {
            return Some(Match::of(P::RisingThreeMethods).with_span(span));
        }
        if first.is_bearish() && last.is_bearish() && last.close < first.close {
            return Some(Match::of(P::FallingThreeMethods).with_span(span));
        }
    }
    None
}
