//! 분석 실행 명령.

use std::fmt::Write as _;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chartist_analytics::{analyze, AnalysisConfig, AnalysisResult, Sentiment};
use chartist_core::{BarSeries, Interval};
use tracing::info;

use super::loader::load_bars;

/// 출력 형식.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// 한 줄 JSON
    Json,
    /// 들여쓰기된 JSON
    #[default]
    Pretty,
    /// 사람이 읽는 요약
    Summary,
}

/// 분석 명령 설정.
#[derive(Debug, Clone)]
pub struct AnalyzeCliConfig {
    /// 입력 파일 (CSV 또는 JSON)
    pub input: PathBuf,
    /// 심볼
    pub symbol: Option<String>,
    /// 바 간격
    pub interval: Option<Interval>,
    /// 출력 형식
    pub format: OutputFormat,
    /// 결과 저장 경로 (없으면 stdout)
    pub output: Option<PathBuf>,
}

/// 분석 설정을 읽습니다. 파일이 없으면 환경 변수와 기본값만 사용합니다.
pub fn load_config(path: Option<&PathBuf>) -> Result<AnalysisConfig> {
    match path {
        Some(path) => AnalysisConfig::load(path)
            .with_context(|| format!("Failed to load config: {}", path.display())),
        None => AnalysisConfig::from_env().context("Failed to read config from environment"),
    }
}

/// 파일을 읽어 분석하고 결과를 출력합니다.
pub fn run_analyze(cli: &AnalyzeCliConfig, config: &AnalysisConfig) -> Result<AnalysisResult> {
    let bars = load_bars(&cli.input)?;
    let mut series = BarSeries::new(bars)
        .with_context(|| format!("Invalid bar series in {}", cli.input.display()))?;

    if let Some(symbol) = &cli.symbol {
        series = series.with_meta(symbol.clone(), cli.interval.unwrap_or(Interval::D1));
    }

    let result = analyze(&series, config);

    let rendered = match cli.format {
        OutputFormat::Json => result.to_json()?,
        OutputFormat::Pretty => result.to_json_pretty()?,
        OutputFormat::Summary => render_summary(&result),
    };

    match &cli.output {
        Some(path) => {
            std::fs::write(path, rendered)
                .with_context(|| format!("Failed to write output: {}", path.display()))?;
            info!(path = %path.display(), "분석 결과 저장");
        }
        None => println!("{}", rendered),
    }

    Ok(result)
}

fn sentiment_label(sentiment: Sentiment) -> &'static str {
    match sentiment {
        Sentiment::VeryBullish => "매우 강세",
        Sentiment::Bullish => "강세",
        Sentiment::Neutral => "중립",
        Sentiment::Bearish => "약세",
        Sentiment::VeryBearish => "매우 약세",
    }
}

/// 사람이 읽는 요약 텍스트.
pub fn render_summary(result: &AnalysisResult) -> String {
    let mut out = String::new();

    let title = match (&result.symbol, result.interval) {
        (Some(symbol), Some(interval)) => format!("{} ({})", symbol, interval),
        (Some(symbol), None) => symbol.clone(),
        _ => "분석 결과".to_string(),
    };
    let _ = writeln!(out, "📊 {}", title);
    let _ = writeln!(out, "바 개수: {}", result.timestamps.len());

    match &result.summary {
        Some(summary) => {
            let _ = writeln!(out, "종가: {}", summary.last_close);
            let _ = writeln!(
                out,
                "시장 심리: {} (점수 {})",
                sentiment_label(summary.sentiment),
                summary.sentiment_score
            );
            let _ = writeln!(out, "추세 강도: {}", summary.trend_strength.score);
            let signals = &summary.signals;
            let _ = writeln!(
                out,
                "신호 분포: 강세 {}% / 약세 {}% / 중립 {}%",
                signals.bullish_pct, signals.bearish_pct, signals.neutral_pct
            );
            for target in summary.targets.bullish.iter().take(3) {
                let _ = writeln!(out, "  ▲ {} ({}%)", target.price.round_dp(2), target.distance_pct);
            }
            for target in summary.targets.bearish.iter().take(3) {
                let _ = writeln!(out, "  ▼ {} ({}%)", target.price.round_dp(2), target.distance_pct);
            }
        }
        None => {
            let _ = writeln!(out, "요약 없음");
        }
    }

    let stats = &result.pattern_stats;
    let _ = writeln!(
        out,
        "패턴: {}개 (강세 {}, 약세 {}, 중립 {})",
        stats.total, stats.bullish, stats.bearish, stats.neutral
    );
    for occ in &stats.recent {
        let _ = writeln!(
            out,
            "  {} {} [{}]",
            occ.timestamp.format("%Y-%m-%d %H:%M"),
            occ.pattern.name(),
            occ.reliability.as_str()
        );
    }

    if !result.skipped.is_empty() {
        let _ = writeln!(out, "건너뜀: {}개", result.skipped.len());
        for skipped in &result.skipped {
            let _ = writeln!(out, "  - {}", skipped);
        }
    }

    out
}
