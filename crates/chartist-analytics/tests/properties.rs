//! 지표와 패턴 인식의 속성 테스트.

use chartist_analytics::indicators::{
    CciParams, CmfParams, IndicatorEngine, MfiParams, RsiParams, SmaParams, StochasticParams,
    WilliamsRParams,
};
use chartist_analytics::{analyze, AnalysisConfig, CandlePatternType, PatternOccurrence, PatternRecognizer};
use chartist_core::{Bar, BarSeries};
use chrono::{Duration, TimeZone, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// (시가, 종가, 윗꼬리, 아랫꼬리, 거래량) 센트 단위 행을 유효한 바로 변환합니다.
fn to_bars(rows: &[(i64, i64, i64, i64, i64)]) -> Vec<Bar> {
    let start = Utc.with_ymd_and_hms(2023, 1, 2, 0, 0, 0).unwrap();
    rows.iter()
        .enumerate()
        .map(|(i, (o, c, up, down, v))| {
            let open = Decimal::new(*o, 2);
            let close = Decimal::new(*c, 2);
            Bar::new(
                start + Duration::days(i as i64),
                open,
                open.max(close) + Decimal::new(*up, 2),
                open.min(close) - Decimal::new(*down, 2),
                close,
                Decimal::from(*v),
            )
        })
        .collect()
}

fn bar_rows(len: std::ops::Range<usize>) -> impl Strategy<Value = Vec<(i64, i64, i64, i64, i64)>> {
    prop::collection::vec(
        (1_000i64..100_000, 1_000i64..100_000, 0i64..500, 0i64..500, 0i64..10_000),
        len,
    )
}

/// 4개 값 (시가, 고가, 저가, 종가)로 바를 만들고 시각을 순서대로 붙입니다.
fn ohlc_bars(rows: &[(i64, i64, i64, i64)]) -> Vec<Bar> {
    let start = Utc.with_ymd_and_hms(2023, 1, 2, 0, 0, 0).unwrap();
    rows.iter()
        .enumerate()
        .map(|(i, (o, h, l, c))| {
            Bar::new(
                start + Duration::days(i as i64),
                Decimal::from(*o),
                Decimal::from(*h),
                Decimal::from(*l),
                Decimal::from(*c),
                dec!(100),
            )
        })
        .collect()
}

fn window_rows() -> impl Strategy<Value = Vec<(i64, i64, i64, i64)>> {
    prop::collection::vec((100i64..200, 100i64..200, 0i64..20, 0i64..20), 3).prop_map(|rows| {
        rows.into_iter()
            .map(|(o, c, up, down)| (o, o.max(c) + up, o.min(c) - down, c))
            .collect()
    })
}

/// 윈도우 `[start, start + 3)` 안에 완전히 들어가는, 추세와 무관한 패턴의 (패턴, 상대 인덱스).
fn window_patterns(found: &[PatternOccurrence], start: usize) -> Vec<(CandlePatternType, usize)> {
    let mut out: Vec<_> = found
        .iter()
        .filter(|o| !o.pattern.spec().uses_trend)
        .filter(|o| o.index + 1 >= o.span && o.index + 1 - o.span >= start && o.index < start + 3)
        .map(|o| (o.pattern, o.index - start))
        .collect();
    out.sort();
    out
}

proptest! {
    #[test]
    fn sma_equals_window_mean(
        cents in prop::collection::vec(1i64..1_000_000, 1..60),
        period_seed in 0usize..60,
    ) {
        let closes: Vec<Decimal> = cents.iter().map(|c| Decimal::new(*c, 2)).collect();
        let period = period_seed % closes.len() + 1;

        let sma = IndicatorEngine::new()
            .trend()
            .sma(&closes, SmaParams { period })
            .unwrap();

        prop_assert_eq!(sma.len(), closes.len());
        for i in 0..closes.len() {
            if i + 1 < period {
                prop_assert!(sma[i].is_none());
                continue;
            }
            let window = &closes[i + 1 - period..=i];
            let mean = window.iter().sum::<Decimal>() / Decimal::from(period);
            let value = sma[i].unwrap();
            prop_assert!((value - mean).abs() <= dec!(0.000000001), "i={} {} vs {}", i, value, mean);
        }
    }

    #[test]
    fn oscillators_stay_in_bounds(rows in bar_rows(20..60)) {
        let bars = to_bars(&rows);
        let series = BarSeries::new(bars).unwrap();
        let engine = IndicatorEngine::new();
        let (highs, lows, closes) = (series.highs(), series.lows(), series.closes());

        let rsi = engine.momentum().rsi(&closes, RsiParams::default()).unwrap();
        for v in rsi.iter().flatten() {
            prop_assert!(*v >= Decimal::ZERO && *v <= dec!(100), "rsi {}", v);
        }

        let stoch = engine
            .momentum()
            .stochastic(&highs, &lows, &closes, StochasticParams::default())
            .unwrap();
        for s in stoch.iter().flatten() {
            prop_assert!(s.k >= Decimal::ZERO && s.k <= dec!(100), "k {}", s.k);
        }

        let wr = engine
            .momentum()
            .williams_r(&highs, &lows, &closes, WilliamsRParams::default())
            .unwrap();
        for v in wr.iter().flatten() {
            prop_assert!(*v >= dec!(-100) && *v <= Decimal::ZERO, "williams {}", v);
        }

        // |TP - SMA| <= period/2 * 평균 편차
        let cci_params = CciParams::default();
        let cci_bound = Decimal::from(cci_params.period) / (dec!(2) * dec!(0.015)) + dec!(0.000001);
        let cci = engine.momentum().cci(&highs, &lows, &closes, cci_params).unwrap();
        for v in cci.iter().flatten() {
            prop_assert!(v.abs() <= cci_bound, "cci {}", v);
        }

        let mfi = engine.volume().mfi(series.bars(), MfiParams::default()).unwrap();
        for v in mfi.iter().flatten() {
            prop_assert!(*v >= Decimal::ZERO && *v <= dec!(100), "mfi {}", v);
        }

        let cmf = engine.volume().cmf(series.bars(), CmfParams::default()).unwrap();
        for v in cmf.iter().flatten() {
            prop_assert!(*v >= dec!(-1) && *v <= dec!(1), "cmf {}", v);
        }
    }

    #[test]
    fn rsi_is_100_when_every_change_is_a_gain(
        start in 1_000i64..10_000,
        steps in prop::collection::vec(1i64..500, 15..50),
    ) {
        let mut price = start;
        let mut closes = vec![Decimal::new(price, 2)];
        for step in steps {
            price += step;
            closes.push(Decimal::new(price, 2));
        }

        let rsi = IndicatorEngine::new()
            .momentum()
            .rsi(&closes, RsiParams::default())
            .unwrap();
        for v in rsi.iter().flatten() {
            prop_assert_eq!(*v, dec!(100));
        }
        prop_assert!(rsi[14].is_some());
    }

    #[test]
    fn engulfing_iff_opposite_and_containing(
        o1 in 100i64..200, c1 in 100i64..200,
        o2 in 100i64..200, c2 in 100i64..200,
    ) {
        let bar = |o: i64, c: i64| (o, o.max(c) + 1, o.min(c) - 1, c);
        let bars = ohlc_bars(&[(150, 151, 149, 150), bar(o1, c1), bar(o2, c2)]);

        let opposite = (c1 < o1 && c2 > o2) || (c1 > o1 && c2 < o2);
        let contains = o2.min(c2) <= o1.min(c1) && o2.max(c2) >= o1.max(c1);
        let expected = if opposite && contains {
            Some(if c2 > o2 { CandlePatternType::BullishEngulfing } else { CandlePatternType::BearishEngulfing })
        } else {
            None
        };

        let found: Vec<CandlePatternType> = PatternRecognizer::default()
            .scan(&bars, None)
            .into_iter()
            .filter(|o| o.index == 2)
            .map(|o| o.pattern)
            .filter(|p| matches!(p, CandlePatternType::BullishEngulfing | CandlePatternType::BearishEngulfing))
            .collect();

        prop_assert_eq!(found, expected.into_iter().collect::<Vec<_>>());
    }

    #[test]
    fn disjoint_windows_are_order_independent(a in window_rows(), b in window_rows()) {
        let recognizer = PatternRecognizer::default();

        let ab: Vec<_> = a.iter().chain(b.iter()).copied().collect();
        let ba: Vec<_> = b.iter().chain(a.iter()).copied().collect();
        let found_ab = recognizer.scan(&ohlc_bars(&ab), None);
        let found_ba = recognizer.scan(&ohlc_bars(&ba), None);

        prop_assert_eq!(window_patterns(&found_ab, 0), window_patterns(&found_ba, 3));
        prop_assert_eq!(window_patterns(&found_ab, 3), window_patterns(&found_ba, 0));
    }

    #[test]
    fn analyze_is_idempotent(rows in bar_rows(30..80)) {
        let series = BarSeries::new(to_bars(&rows)).unwrap();
        let config = AnalysisConfig::default();

        let first = analyze(&series, &config);
        let second = analyze(&series, &config);

        prop_assert_eq!(&first, &second);
        prop_assert_eq!(first.to_json().unwrap(), second.to_json().unwrap());
    }
}
