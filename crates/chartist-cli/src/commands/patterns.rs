//! 패턴 카탈로그 조회.

use std::fmt::Write as _;

use chartist_analytics::{PatternDirection, Reliability};
use chartist_analytics::patterns::CATALOG;

fn direction_label(direction: PatternDirection) -> &'static str {
    match direction {
        PatternDirection::Bullish => "강세",
        PatternDirection::Bearish => "약세",
        PatternDirection::Neutral => "중립",
    }
}

/// `min` 이상 신뢰도의 카탈로그 항목을 표로 출력합니다.
pub fn render_catalog(min: Reliability) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<24} {:<10} {:>4} {:<4} {}",
        "패턴", "신뢰도", "바", "방향", "설명"
    );

    for spec in CATALOG.iter().filter(|s| s.reliability >= min) {
        let trend = if spec.uses_trend { " (추세 의존)" } else { "" };
        let _ = writeln!(
            out,
            "{:<24} {:<10} {:>4} {:<4} {}{}",
            spec.name,
            spec.reliability.as_str(),
            spec.span,
            direction_label(spec.direction),
            spec.description,
            trend
        );
    }

    out
}
