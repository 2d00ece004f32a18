use analysis_core::{Candle, Direction};
use serde::{Deserialize, Serialize};

use crate::bos::{reclassify_bos, BosEvent};
use crate::swings::{SwingLabel, SwingPoint};

/// Swings inspected by the label fingerprint when no active break exists.
const FINGERPRINT_SWINGS: usize = 4;
/// Matching labels among those swings needed to call a trend.
const FINGERPRINT_QUORUM: usize = 3;

/// Trend verdict for one timeframe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentStructure {
    pub direction: Direction,
    pub last_bos: Option<BosEvent>,
    /// Most recent labels, oldest first
    pub recent_labels: Vec<SwingLabel>,
}

impl CurrentStructure {
    pub fn ranging() -> Self {
        Self {
            direction: Direction::Ranging,
            last_bos: None,
            recent_labels: Vec::new(),
        }
    }
}

/// Trend read from the last four labels alone: three or more bullish
/// (HH/HL) or bearish (LH/LL) labels decide, otherwise ranging.
pub fn direction_from_labels(labels: &[SwingLabel]) -> Direction {
    let tail = &labels[labels.len().saturating_sub(FINGERPRINT_SWINGS)..];
    let bullish = tail.iter().filter(|l| l.is_bullish()).count();
    let bearish = tail.iter().filter(|l| l.is_bearish()).count();

    if bullish >= FINGERPRINT_QUORUM {
        Direction::Bullish
    } else if bearish >= FINGERPRINT_QUORUM {
        Direction::Bearish
    } else {
        Direction::Ranging
    }
}

/// Derive the current structure from labeled swings and break events.
///
/// The most recent active break decides the direction; without one, the
/// label fingerprint does. `bos` statuses are taken as given, so pass events
/// already run through [`reclassify_bos`] (or use [`derive_structure`]).
pub fn current_structure(swings: &[SwingPoint], bos: &[BosEvent], recent_labels: usize) -> CurrentStructure {
    let labels: Vec<SwingLabel> = swings.iter().filter_map(|s| s.label).collect();
    let last_bos = bos
        .iter()
        .filter(|e| e.is_active())
        .max_by_key(|e| (e.timestamp, e.swing_timestamp))
        .cloned();

    let direction = match &last_bos {
        Some(event) => event.direction,
        None => direction_from_labels(&labels),
    };

    CurrentStructure {
        direction,
        last_bos,
        recent_labels: labels[labels.len().saturating_sub(recent_labels)..].to_vec(),
    }
}

/// [`current_structure`] after re-deriving break statuses from `candles`.
pub fn derive_structure(
    candles: &[Candle],
    swings: &[SwingPoint],
    bos: &[BosEvent],
    recent_labels: usize,
) -> CurrentStructure {
    current_structure(swings, &reclassify_bos(bos, candles), recent_labels)
}
