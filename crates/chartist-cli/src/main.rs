//! 차트 분석 CLI.
//!
//! # 사용 예시
//!
//! ```bash
//! # 일봉 CSV 분석 (JSON 출력)
//! chartist analyze -i data/kr/005930_daily.csv -s 005930
//!
//! # 설정 파일과 요약 출력
//! chartist analyze -i data/us/spy.csv -c config/analysis.toml --format summary
//!
//! # 신뢰도 high 이상 패턴 카탈로그
//! chartist patterns --min-reliability high
//! ```

use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use chartist_analytics::Reliability;
use chartist_core::{init_logging, Interval, LogConfig, LogFormat};
use clap::{Parser, Subcommand};
use tracing::{error, info};

use chartist_cli::commands::analyze::{load_config, run_analyze, AnalyzeCliConfig, OutputFormat};
use chartist_cli::commands::patterns::render_catalog;

#[derive(Parser)]
#[command(name = "chartist")]
#[command(about = "Chart analysis CLI - 기술적 지표, 캔들 패턴, 시장 요약", long_about = None)]
#[command(version)]
struct Cli {
    /// 로그 레벨 (설정 파일의 logging.level보다 우선)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// 로그 형식 (pretty, json, compact)
    #[arg(long, global = true)]
    log_format: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// OHLCV 파일 분석
    Analyze {
        /// 입력 파일 (date,open,high,low,close,volume CSV 또는 JSON)
        #[arg(short, long)]
        input: PathBuf,

        /// 분석 설정 파일 (TOML, CHARTIST__* 환경 변수로 덮어쓰기 가능)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// 종목 코드/심볼 (예: 005930, SPY)
        #[arg(short, long)]
        symbol: Option<String>,

        /// 바 간격 (1m, 5m, 15m, 30m, 1h, 1d, 1wk, 1mo)
        #[arg(long)]
        interval: Option<String>,

        /// 출력 형식
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Pretty)]
        format: OutputFormat,

        /// 결과 저장 경로 (지정하지 않으면 stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// 캔들 패턴 카탈로그 보기
    Patterns {
        /// 최소 신뢰도 (low, medium, high, very_high)
        #[arg(long, default_value = "low")]
        min_reliability: String,
    },
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze {
            input,
            config,
            symbol,
            interval,
            format,
            output,
        } => {
            let analysis_config = load_config(config.as_ref())?;
            setup_logging(
                analysis_config.logging.log_config(),
                cli.log_level,
                cli.log_format.as_deref(),
            )?;

            let interval = interval
                .map(|s| s.parse::<Interval>().map_err(|e| anyhow!(e)))
                .transpose()?;

            let cli_config = AnalyzeCliConfig {
                input,
                symbol,
                interval,
                format,
                output,
            };

            match run_analyze(&cli_config, &analysis_config) {
                Ok(result) => {
                    info!(
                        bars = result.timestamps.len(),
                        patterns = result.patterns.len(),
                        skipped = result.skipped.len(),
                        "✅ 분석 완료"
                    );
                }
                Err(e) => {
                    error!("Analysis failed: {:#}", e);
                    return Err(e);
                }
            }
        }

        Commands::Patterns { min_reliability } => {
            setup_logging(LogConfig::from_env(), cli.log_level, cli.log_format.as_deref())?;

            let min = min_reliability.parse::<Reliability>().map_err(|e| anyhow!(e))?;
            print!("{}", render_catalog(min));
        }
    }

    Ok(())
}

/// 기본 로그 설정에 CLI 플래그를 덮어써서 로깅을 초기화합니다.
fn setup_logging(base: LogConfig, level: Option<String>, format: Option<&str>) -> Result<()> {
    let mut config = base;
    if let Some(level) = level {
        config.level = level;
    }
    if let Some(format) = format {
        config.format = format.parse::<LogFormat>().map_err(|e| anyhow!(e))?;
    }

    init_logging(config).context("Failed to initialize logging")
}
