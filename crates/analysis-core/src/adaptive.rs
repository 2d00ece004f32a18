/// Relative measures used by the structure scanners.
///
/// Thresholds such as "large body" or "high volume" are judged against the
/// series' own recent distribution rather than absolute price units, so the
/// same calibration works for EURUSD, gold and equity indices alike.
use crate::Candle;

/// Mean of a slice, 0.0 when empty.
pub fn mean(data: &[f64]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    data.iter().sum::<f64>() / data.len() as f64
}

/// Percentile rank of `value` within `data` (0.0 to 1.0), ties counted as half.
/// An empty distribution ranks everything at the median.
pub fn percentile_rank(value: f64, data: &[f64]) -> f64 {
    if data.is_empty() {
        return 0.5;
    }
    let below = data.iter().filter(|&&x| x < value).count();
    let equal = data.iter().filter(|&&x| x == value).count();
    (below as f64 + 0.5 * equal as f64) / data.len() as f64
}

/// True range of `candle` given the previous close (if any).
pub fn true_range(candle: &Candle, prev_close: Option<f64>) -> f64 {
    let hl = candle.high - candle.low;
    match prev_close.filter(|p| p.is_finite()) {
        Some(pc) => hl.max((candle.high - pc).abs()).max((candle.low - pc).abs()),
        None => hl,
    }
}

/// Simple-average ATR over the last `period` finite candles of `candles`.
///
/// Returns `None` when fewer than two finite candles are available.
pub fn average_true_range(candles: &[Candle], period: usize) -> Option<f64> {
    if period == 0 {
        return None;
    }
    let finite: Vec<&Candle> = candles.iter().filter(|c| c.is_finite()).collect();
    if finite.len() < 2 {
        return None;
    }
    let start = finite.len().saturating_sub(period);
    let ranges: Vec<f64> = (start..finite.len())
        .map(|i| {
            let prev = if i > 0 { Some(finite[i - 1].close) } else { None };
            true_range(finite[i], prev)
        })
        .collect();
    Some(mean(&ranges))
}

/// Whether `body` is an outlier against the ATR of the preceding candles.
///
/// `history` is the candles *before* the one being tested.
pub fn is_displacement(body: f64, history: &[Candle], atr_period: usize, multiple: f64) -> bool {
    match average_true_range(history, atr_period) {
        Some(atr) if atr > 0.0 => body >= atr * multiple,
        _ => false,
    }
}
