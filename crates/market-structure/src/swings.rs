use analysis_core::adaptive::true_range;
use analysis_core::Candle;
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SwingKind {
    High,
    Low,
}

/// Structural label of a pivot relative to the previous pivot of the same kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SwingLabel {
    HH,
    HL,
    LH,
    LL,
    EQH,
    EQL,
}

impl SwingLabel {
    pub fn is_bullish(&self) -> bool {
        matches!(self, SwingLabel::HH | SwingLabel::HL)
    }

    pub fn is_bearish(&self) -> bool {
        matches!(self, SwingLabel::LH | SwingLabel::LL)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwingPoint {
    pub timestamp: i64,
    pub price: f64,
    pub kind: SwingKind,
    pub label: Option<SwingLabel>,
    /// Index of the pivot candle in the source series
    pub index: usize,
    pub lookback: usize,
    pub true_range: f64,
}

/// Find pivot highs and lows with a symmetric window of `lookback` candles.
///
/// A pivot high must be strictly above every high within the window on both
/// sides (pivot lows strictly below). The first and last `lookback` candles
/// never qualify. Malformed candles cannot be pivots and are ignored as
/// neighbours. Returns an empty list when the series is shorter than
/// `2 * lookback + 1`.
pub fn detect_swings(candles: &[Candle], lookback: usize) -> Vec<SwingPoint> {
    let n = lookback.max(1);
    if candles.len() < n.saturating_mul(2).saturating_add(1) {
        debug!(len = candles.len(), lookback = n, "series too short for swing detection");
        return Vec::new();
    }

    let mut swings = Vec::new();
    for i in n..candles.len() - n {
        let pivot = &candles[i];
        if !pivot.is_finite() {
            continue;
        }
        let prev_close = (0..i).rev().map(|j| candles[j].close).find(|p| p.is_finite());
        let tr = true_range(pivot, prev_close);

        if neighbours(candles, i, n).all(|c| pivot.high > c.high) {
            swings.push(SwingPoint {
                timestamp: pivot.timestamp,
                price: pivot.high,
                kind: SwingKind::High,
                label: None,
                index: i,
                lookback: n,
                true_range: tr,
            });
        }
        if neighbours(candles, i, n).all(|c| pivot.low < c.low) {
            swings.push(SwingPoint {
                timestamp: pivot.timestamp,
                price: pivot.low,
                kind: SwingKind::Low,
                label: None,
                index: i,
                lookback: n,
                true_range: tr,
            });
        }
    }

    debug!(count = swings.len(), lookback = n, "detected swings");
    swings
}

/// Finite candles within `n` of `i`, excluding `i` itself.
fn neighbours(candles: &[Candle], i: usize, n: usize) -> impl Iterator<Item = &Candle> {
    candles[i - n..=i + n]
        .iter()
        .enumerate()
        .filter(move |(j, c)| *j != n && c.is_finite())
        .map(|(_, c)| c)
}

/// Label pivots HH/LH/EQH and HL/LL/EQL against the previous pivot of the same kind.
///
/// `tolerance` is an absolute price delta (for example one pip). The comparison
/// baseline always moves to the newest pivot, whatever its label.
pub fn label_swings(swings: Vec<SwingPoint>, tolerance: f64) -> Vec<SwingPoint> {
    let tolerance = tolerance.abs();
    let mut last_high: Option<f64> = None;
    let mut last_low: Option<f64> = None;

    swings
        .into_iter()
        .map(|mut swing| {
            let (prior, up, down, equal) = match swing.kind {
                SwingKind::High => (&mut last_high, SwingLabel::HH, SwingLabel::LH, SwingLabel::EQH),
                SwingKind::Low => (&mut last_low, SwingLabel::HL, SwingLabel::LL, SwingLabel::EQL),
            };
            let label = match *prior {
                None => up,
                Some(p) if swing.price > p + tolerance => up,
                Some(p) if swing.price < p - tolerance => down,
                Some(_) => equal,
            };
            *prior = Some(swing.price);
            swing.label = Some(label);
            swing
        })
        .collect()
}

/// Detect and label in one pass.
pub fn labeled_swings(candles: &[Candle], lookback: usize, tolerance: f64) -> Vec<SwingPoint> {
    label_swings(detect_swings(candles, lookback), tolerance)
}
