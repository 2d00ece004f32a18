#[cfg(test)]
mod tests {
    use super::super::bos::*;
    use super::super::config::StructureConfig;
    use super::super::structure::*;
    use super::super::swings::*;
    use super::super::test_support::*;
    use analysis_core::{Candle, Direction};
    use approx::assert_relative_eq;

    const EURUSD: f64 = 10_000.0;

    fn pipeline(candles: &[Candle]) -> (Vec<SwingPoint>, Vec<BosEvent>) {
        let config = StructureConfig::default();
        let swings = labeled_swings(candles, 3, PIP);
        let bos = detect_bos(candles, &swings, EURUSD, &config);
        (swings, reclassify_bos(&bos, candles))
    }

    #[test]
    fn test_clean_uptrend_is_bullish() {
        let candles = clean_uptrend();
        assert_eq!(candles.len(), 30);
        let (swings, bos) = pipeline(&candles);

        let labels: Vec<SwingLabel> = swings.iter().filter_map(|s| s.label).collect();
        assert_eq!(&labels[labels.len() - 4..], &[SwingLabel::HH, SwingLabel::HL, SwingLabel::HH, SwingLabel::HL]);
        assert!(bos.iter().all(|e| e.direction == Direction::Bullish));
        assert!(!bos.is_empty());

        let cs = current_structure(&swings, &bos, 8);
        assert_eq!(cs.direction, Direction::Bullish);
        let last = cs.last_bos.expect("active bullish break");
        assert_eq!(last.index, 26);
        assert_relative_eq!(last.level, 1.1155, epsilon = 1e-9);
    }

    #[test]
    fn test_clean_downtrend_is_bearish() {
        let candles = clean_downtrend();
        let (swings, bos) = pipeline(&candles);
        assert!(bos.iter().all(|e| e.direction == Direction::Bearish));
        assert_eq!(derive_structure(&candles, &swings, &bos, 8).direction, Direction::Bearish);
    }

    #[test]
    fn test_break_invariants() {
        for candles in [clean_uptrend(), clean_downtrend()] {
            let (_, bos) = pipeline(&candles);
            for e in &bos {
                assert!(e.magnitude_pips >= 0.0);
                match e.direction {
                    Direction::Bullish => assert!(e.close > e.level),
                    Direction::Bearish => assert!(e.close < e.level),
                    Direction::Ranging => unreachable!(),
                }
                assert!(e.timestamp > e.swing_timestamp);
            }
        }
    }

    #[test]
    fn test_one_event_per_swing_earliest_close_wins() {
        let (swings, bos) = pipeline(&clean_uptrend());
        for swing in &swings {
            let hits: Vec<&BosEvent> = bos.iter().filter(|e| e.swing_timestamp == swing.timestamp && e.level == swing.price).collect();
            assert!(hits.len() <= 1);
        }
        // swing high at index 3 (1.1065) is first closed above at index 8 (1.1070)
        let first = bos.iter().find(|e| e.swing_timestamp == 3 * HOUR_MS).unwrap();
        assert_eq!(first.index, 8);
        assert_relative_eq!(first.magnitude_pips, 5.0, epsilon = 1e-6);
    }

    fn swing(index: usize, price: f64, kind: SwingKind, label: SwingLabel) -> SwingPoint {
        SwingPoint {
            timestamp: index as i64 * HOUR_MS,
            price,
            kind,
            label: Some(label),
            index,
            lookback: 1,
            true_range: 0.0,
        }
    }

    #[test]
    fn test_bearish_break_magnitude_uses_pip_multiplier() {
        let candles = vec![
            ohlc(0, 150.20, 150.40, 150.00, 150.30),
            ohlc(1, 150.30, 150.50, 149.50, 150.10),
            ohlc(2, 150.10, 150.60, 149.90, 150.40),
            ohlc(3, 150.40, 150.45, 149.70, 149.80),
            ohlc(4, 149.80, 149.85, 149.20, 149.25),
        ];
        let swings = vec![swing(1, 149.50, SwingKind::Low, SwingLabel::HL)];
        let bos = detect_bos(&candles, &swings, 100.0, &StructureConfig::default());
        assert_eq!(bos.len(), 1);
        assert_eq!(bos[0].direction, Direction::Bearish);
        assert_eq!(bos[0].index, 4);
        assert_relative_eq!(bos[0].magnitude_pips, 25.0, epsilon = 1e-6);
        assert_eq!(bos[0].status, BosStatus::Active);
    }

    #[test]
    fn test_reclaim_is_rederived_from_later_closes() {
        let mut candles = vec![
            ohlc(0, 1.1000, 1.1010, 1.0990, 1.1005),
            ohlc(1, 1.1005, 1.1030, 1.1000, 1.1020),
            ohlc(2, 1.1020, 1.1025, 1.1000, 1.1010),
            ohlc(3, 1.1010, 1.1045, 1.1005, 1.1040),
        ];
        let swings = vec![swing(1, 1.1030, SwingKind::High, SwingLabel::HH)];
        let bos = detect_bos(&candles, &swings, EURUSD, &StructureConfig::default());
        assert_eq!(bos.len(), 1);
        assert!(!is_reclaimed(&bos[0], &candles));
        assert_eq!(active_bos(&bos, &candles).len(), 1);

        candles.push(ohlc(4, 1.1040, 1.1042, 1.1015, 1.1020));
        assert!(is_reclaimed(&bos[0], &candles));
        let rederived = reclassify_bos(&bos, &candles);
        assert_eq!(rederived[0].status, BosStatus::Reclaimed);
        assert!(active_bos(&bos, &candles).is_empty());

        // with the break reclaimed the verdict falls back to the labels
        let cs = derive_structure(&candles, &swings, &bos, 8);
        assert!(cs.last_bos.is_none());
        assert_eq!(cs.direction, Direction::Ranging);
    }

    #[test]
    fn test_counter_trend_against_prior_labels() {
        let candles = vec![
            ohlc(0, 1.20, 1.21, 1.19, 1.20),
            ohlc(1, 1.20, 1.20, 1.15, 1.16),
            ohlc(2, 1.16, 1.18, 1.14, 1.17),
            ohlc(3, 1.17, 1.17, 1.12, 1.13),
            ohlc(4, 1.13, 1.16, 1.125, 1.15),
            ohlc(5, 1.15, 1.20, 1.145, 1.19),
        ];
        let swings = vec![
            swing(0, 1.21, SwingKind::High, SwingLabel::LH),
            swing(1, 1.15, SwingKind::Low, SwingLabel::LL),
            swing(2, 1.18, SwingKind::High, SwingLabel::LH),
            swing(3, 1.12, SwingKind::Low, SwingLabel::LL),
        ];
        let bos = detect_bos(&candles, &swings, EURUSD, &StructureConfig::default());
        let up = bos.iter().find(|e| e.swing_timestamp == 2 * HOUR_MS).unwrap();
        assert_eq!(up.direction, Direction::Bullish);
        assert_eq!(up.index, 5);
        assert!(up.is_counter_trend);

        let down = bos.iter().find(|e| e.swing_timestamp == HOUR_MS).unwrap();
        assert_eq!(down.direction, Direction::Bearish);
        assert!(!down.is_counter_trend);
    }

    #[test]
    fn test_displacement_is_relative_to_recent_ranges() {
        let mut candles: Vec<Candle> = (0..20)
            .map(|i| ohlc(i, 1.1000, 1.1005, 1.0995, 1.1001))
            .collect();
        candles.push(ohlc(20, 1.1001, 1.1040, 1.1000, 1.1038));
        let swings = vec![swing(10, 1.1005, SwingKind::High, SwingLabel::HH)];
        let bos = detect_bos(&candles, &swings, EURUSD, &StructureConfig::default());
        assert_eq!(bos.len(), 1);
        assert!(bos[0].is_displacement);

        let mut quiet = candles.clone();
        quiet[20] = ohlc(20, 1.1001, 1.1008, 1.1000, 1.1006);
        let bos = detect_bos(&quiet, &swings, EURUSD, &StructureConfig::default());
        assert!(!bos[0].is_displacement);
    }

    #[test]
    fn test_non_finite_closes_never_confirm() {
        let candles = vec![
            ohlc(0, 1.1000, 1.1010, 1.0990, 1.1005),
            ohlc(1, 1.1005, 1.1030, 1.1000, 1.1020),
            ohlc(2, 1.1020, f64::NAN, 1.1000, 1.1050),
            ohlc(3, 1.1010, 1.1045, 1.1005, 1.1040),
        ];
        let swings = vec![swing(1, 1.1030, SwingKind::High, SwingLabel::HH)];
        let bos = detect_bos(&candles, &swings, EURUSD, &StructureConfig::default());
        assert_eq!(bos[0].index, 3);
    }

    #[test]
    fn test_detection_is_deterministic() {
        let candles = clean_uptrend();
        let a = serde_json::to_string(&pipeline(&candles).1).unwrap();
        let b = serde_json::to_string(&pipeline(&candles).1).unwrap();
        assert_eq!(a, b);
    }
}
