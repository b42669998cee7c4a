//! 바 시리즈 통합 테스트
//!
//! JSON 왕복 시 검증이 다시 수행되는지와 불변식 위반 분류를 확인합니다.

use chartist_core::{Bar, BarSeries, CoreError, Interval};
use chrono::{Duration, TimeZone, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn hourly(closes: &[Decimal]) -> Vec<Bar> {
    let start = Utc.with_ymd_and_hms(2024, 2, 5, 9, 0, 0).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, c)| {
            Bar::new(
                start + Duration::hours(i as i64),
                *c,
                *c + dec!(1),
                *c - dec!(1),
                *c,
                dec!(250),
            )
        })
        .collect()
}

#[test]
fn deserialized_series_keeps_metadata() {
    let series = BarSeries::new(hourly(&[dec!(10), dec!(11), dec!(12)]))
        .unwrap()
        .with_meta("BTC/USDT", Interval::H1);

    let json = serde_json::to_string(&series).unwrap();
    let restored: BarSeries = serde_json::from_str(&json).unwrap();

    assert_eq!(restored, series);
    assert_eq!(restored.symbol(), Some("BTC/USDT"));
    assert_eq!(restored.interval(), Some(Interval::H1));
}

#[test]
fn deserialization_validates_bars() {
    let json = r#"{
        "bars": [
            {"timestamp": "2024-02-05T09:00:00Z", "open": "10", "high": "9", "low": "8", "close": "9.5", "volume": "1"}
        ]
    }"#;

    assert!(serde_json::from_str::<BarSeries>(json).is_err());
}

#[test]
fn duplicate_timestamp_is_fatal() {
    let mut bars = hourly(&[dec!(10), dec!(11)]);
    bars[1].timestamp = bars[0].timestamp;

    let err = BarSeries::new(bars).unwrap_err();
    assert!(matches!(err, CoreError::InvalidSeries(_)));
    assert!(err.is_fatal());
    assert_eq!(err.code(), "InvalidSeries");
}

#[test]
fn interval_round_trips_through_str() {
    for interval in [Interval::M1, Interval::M15, Interval::H1, Interval::D1, Interval::W1, Interval::MN1] {
        let parsed: Interval = interval.as_str().parse().unwrap();
        assert_eq!(parsed, interval);
    }
    assert!("7d".parse::<Interval>().is_err());
}

proptest! {
    #[test]
    fn valid_bars_always_build_a_series(cents in prop::collection::vec(200i64..1_000_000, 0..50)) {
        let closes: Vec<Decimal> = cents.iter().map(|c| Decimal::new(*c, 2)).collect();
        let series = BarSeries::new(hourly(&closes)).unwrap();

        prop_assert_eq!(series.len(), closes.len());
        prop_assert_eq!(series.closes(), closes);
    }
}
