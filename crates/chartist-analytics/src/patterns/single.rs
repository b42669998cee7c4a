//! 단일 바 패턴.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::context::{LocalTrend, ScanContext};
use super::{CandlePatternType as P, Match, PatternDirection, PatternParams};

/// 몸통/범위 비율. 범위가 0이면 `None`.
fn body_ratio(ctx: &ScanContext<'_>, i: usize) -> Option<Decimal> {
    let bar = &ctx.bars[i];
    let range = bar.range();
    (range > Decimal::ZERO).then(|| bar.body() / range)
}

/// Doji 계열. 가장 구체적인 변형 하나만 보고합니다.
pub(crate) fn doji(ctx: &ScanContext<'_>, i: usize, params: &PatternParams) -> Option<Match> {
    let ratio = body_ratio(ctx, i)?;
    if ratio >= params.body_ratio_threshold {
        return None;
    }

    let bar = &ctx.bars[i];
    let (range, body) = (bar.range(), bar.body());
    let (upper, lower) = (bar.upper_shadow(), bar.lower_shadow());

    let pattern = if ratio < dec!(0.05) && lower > range * dec!(0.7) && upper < range * dec!(0.1) {
        P::DragonflyDoji
    } else if ratio < dec!(0.05) && upper > range * dec!(0.7) && lower < range * dec!(0.1) {
        P::GravestoneDoji
    } else if ratio < dec!(0.05) && upper > body * dec!(5) && lower > body * dec!(5) {
        P::LongLeggedDoji
    } else {
        P::Doji
    };
    Some(Match::of(pattern))
}

/// 긴 아랫꼬리, 짧은 윗꼬리.
fn is_hammer_shape(ctx: &ScanContext<'_>, i: usize, params: &PatternParams) -> bool {
    let bar = &ctx.bars[i];
    let body = bar.body();
    bar.lower_shadow() > body * params.shadow_ratio_threshold && bar.upper_shadow() < body * dec!(0.3)
}

/// 긴 윗꼬리, 짧은 아랫꼬리.
fn is_inverted_shape(ctx: &ScanContext<'_>, i: usize, params: &PatternParams) -> bool {
    let bar = &ctx.bars[i];
    let body = bar.body();
    bar.upper_shadow() > body * params.shadow_ratio_threshold && bar.lower_shadow() < body * dec!(0.3)
}

/// 추세에 따라 이름과 방향이 갈리는 단일 바 패턴.
///
/// 하락 추세 → `after_down`, 상승 추세 → `after_up`, 횡보 → 보고하지 않음,
/// 추세를 알 수 없으면 `after_down` 이름에 중립 방향.
fn by_trend(ctx: &ScanContext<'_>, i: usize, after_down: P, after_up: P) -> Option<Match> {
    match ctx.trend(i) {
        LocalTrend::Down => Some(Match::of(after_down)),
        LocalTrend::Up => Some(Match::of(after_up)),
        LocalTrend::Sideways => None,
        LocalTrend::Unknown => Some(Match::of(after_down).with_direction(PatternDirection::Neutral)),
    }
}

/// Hammer / Hanging Man.
pub(crate) fn hammer(ctx: &ScanContext<'_>, i: usize, params: &PatternParams) -> Option<Match> {
    if !is_hammer_shape(ctx, i, params) {
        return None;
    }
    by_trend(ctx, i, P::Hammer, P::HangingMan)
}

/// Inverted Hammer / Shooting Star.
pub(crate) fn inverted_hammer(ctx: &ScanContext<'_>, i: usize, params: &PatternParams) -> Option<Match> {
    if !is_inverted_shape(ctx, i, params) {
        return None;
    }
    by_trend(ctx, i, P::InvertedHammer, P::ShootingStar)
}

pub(crate) fn marubozu(ctx: &ScanContext<'_>, i: usize, _params: &PatternParams) -> Option<Match> {
    let ratio = body_ratio(ctx, i)?;
    if ratio <= dec!(0.95) {
        return None;
    }
    let bar = &ctx.bars[i];
    if bar.is_bullish() {
        Some(Match::of(P::BullishMarubozu))
    } else if bar.is_bearish() {
        Some(Match::of(P::BearishMarubozu))
    } else {
        None
    }
}

/// Spinning Top. Doji로 분류되는 바는 제외합니다.
pub(crate) fn spinning_top(ctx: &ScanContext<'_>, i: usize, params: &PatternParams) -> Option<Match> {
    let ratio = body_ratio(ctx, i)?;
    if ratio < params.body_ratio_threshold || ratio >= dec!(0.3) {
        return None;
    }
    let bar = &ctx.bars[i];
    let body = bar.body();
    (bar.upper_shadow() > body && bar.lower_shadow() > body).then(|| Match::of(P::SpinningTop))
}
