use analysis_core::Candle;

pub const PIP: f64 = 0.0001;
pub const HOUR_MS: i64 = 3_600_000;

/// Candle centred on `mid`, ten pips tall, with a two-pip body in the direction of travel.
pub fn candle_at(i: usize, mid: f64, rising: bool) -> Candle {
    let open = if rising { mid - 2.0 * PIP } else { mid + 2.0 * PIP };
    Candle::new(i as i64 * HOUR_MS, open, mid + 5.0 * PIP, mid - 5.0 * PIP, mid)
}

/// Series from per-candle moves in whole pips, starting at 1.1000.
pub fn series_from_moves(moves: &[i64]) -> Vec<Candle> {
    let mut pips = 0i64;
    let mut candles = vec![candle_at(0, 1.1, true)];
    for (i, step) in moves.iter().enumerate() {
        pips += step;
        candles.push(candle_at(i + 1, 1.1 + pips as f64 * PIP, *step >= 0));
    }
    candles
}

/// 30 candles climbing three candles by 20 pips then easing three by 10:
/// swing highs at 3, 9, 15, 21 and swing lows at 6, 12, 18, 24 with an H1 lookback of 3.
pub fn clean_uptrend() -> Vec<Candle> {
    let pattern = [20, 20, 20, -10, -10, -10];
    let moves: Vec<i64> = (0..29).map(|i| pattern[i % 6]).collect();
    series_from_moves(&moves)
}

/// Mirror image of [`clean_uptrend`].
pub fn clean_downtrend() -> Vec<Candle> {
    let pattern = [-20, -20, -20, 10, 10, 10];
    let moves: Vec<i64> = (0..29).map(|i| pattern[i % 6]).collect();
    series_from_moves(&moves)
}

/// Plain OHLC candle on an hourly grid.
pub fn ohlc(i: usize, open: f64, high: f64, low: f64, close: f64) -> Candle {
    Candle::new(i as i64 * HOUR_MS, open, high, low, close)
}
