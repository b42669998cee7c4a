//! 바 파일 로딩.
//!
//! CSV 헤더는 `date,open,high,low,close,volume` 형식이며, `.json` 파일은
//! 바 배열 또는 직렬화된 바 시리즈로 읽습니다.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use std::str::FromStr;

use anyhow::{bail, Context, Result};
use chartist_core::{Bar, BarSeries};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{debug, info};

/// CSV 원본 행. 숫자는 정밀도 손실 없이 문자열로 받아 Decimal로 파싱합니다.
#[derive(Debug, Deserialize)]
struct CsvRow {
    #[serde(alias = "timestamp", alias = "datetime", alias = "Date")]
    date: String,
    #[serde(alias = "Open")]
    open: String,
    #[serde(alias = "High")]
    high: String,
    #[serde(alias = "Low")]
    low: String,
    #[serde(alias = "Close")]
    close: String,
    #[serde(alias = "Volume")]
    volume: String,
}

/// JSON 입력 형태.
#[derive(Deserialize)]
#[serde(untagged)]
enum JsonInput {
    Series(BarSeries),
    Bars(Vec<Bar>),
}

/// 파일 확장자에 따라 바 목록을 읽습니다.
pub fn load_bars(path: &Path) -> Result<Vec<Bar>> {
    let file =
        File::open(path).with_context(|| format!("Failed to open input file: {}", path.display()))?;
    let reader = BufReader::new(file);

    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    let bars = if is_json {
        match serde_json::from_reader(reader)
            .with_context(|| format!("Failed to parse JSON bars: {}", path.display()))?
        {
            JsonInput::Series(series) => series.bars().to_vec(),
            JsonInput::Bars(bars) => bars,
        }
    } else {
        parse_csv(reader).with_context(|| format!("Failed to parse CSV bars: {}", path.display()))?
    };

    info!(path = %path.display(), bars = bars.len(), "바 파일 로드 완료");
    Ok(bars)
}

/// CSV 스트림에서 바를 읽습니다. 시리즈 불변식 검증은 호출자가 수행합니다.
pub fn parse_csv<R: Read>(reader: R) -> Result<Vec<Bar>> {
    let mut csv_reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);

    let mut bars = Vec::new();
    for (line, record) in csv_reader.deserialize::<CsvRow>().enumerate() {
        // 헤더가 1행이므로 데이터는 2행부터
        let row_no = line + 2;
        let row = record.with_context(|| format!("row {}", row_no))?;
        bars.push(row_to_bar(&row).with_context(|| format!("row {}", row_no))?);
    }

    debug!(rows = bars.len(), "CSV 파싱 완료");
    Ok(bars)
}

fn row_to_bar(row: &CsvRow) -> Result<Bar> {
    Ok(Bar::new(
        parse_timestamp(&row.date)?,
        parse_decimal("open", &row.open)?,
        parse_decimal("high", &row.high)?,
        parse_decimal("low", &row.low)?,
        parse_decimal("close", &row.close)?,
        parse_decimal("volume", &row.volume)?,
    ))
}

fn parse_decimal(field: &str, value: &str) -> Result<Decimal> {
    Decimal::from_str(value)
        .or_else(|_| Decimal::from_scientific(value))
        .with_context(|| format!("Invalid {}: {}", field, value))
}

/// 타임스탬프 파싱.
///
/// RFC 3339, `YYYY-MM-DD HH:MM:SS`, `YYYY-MM-DD`(UTC 자정), 유닉스 초를 받습니다.
pub fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
        return Ok(ts.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Ok(naive.and_utc());
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        if let Some(naive) = date.and_hms_opt(0, 0, 0) {
            return Ok(naive.and_utc());
        }
    }
    if let Ok(secs) = s.parse::<i64>() {
        if let Some(ts) = DateTime::from_timestamp(secs, 0) {
            return Ok(ts);
        }
    }
    bail!("Invalid timestamp: {}. Expected RFC 3339, YYYY-MM-DD[ HH:MM:SS] or unix seconds", s)
}
