use analysis_core::adaptive::is_displacement;
use analysis_core::{Candle, Direction, NewsProximity, TradingSession};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::StructureConfig;
use crate::key_levels::KeyLevel;
use crate::structure::direction_from_labels;
use crate::swings::{SwingKind, SwingPoint};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BosStatus {
    Active,
    Reclaimed,
}

/// Context attached to a break by the enrichment pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BosEnrichment {
    /// 0 to 100
    pub significance: f64,
    pub is_high_conviction: bool,
    pub key_levels_broken: Vec<KeyLevel>,
    pub cot_direction: Option<Direction>,
    pub cot_aligned: Option<bool>,
    pub mtf_aligned: bool,
    pub session: TradingSession,
    pub news_proximity: Option<NewsProximity>,
}

/// A confirmed close beyond a prior swing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BosEvent {
    /// Timestamp of the confirming close
    pub timestamp: i64,
    pub direction: Direction,
    pub status: BosStatus,
    /// The broken swing's price
    pub level: f64,
    pub swing_timestamp: i64,
    pub close: f64,
    pub magnitude_pips: f64,
    pub is_displacement: bool,
    pub is_counter_trend: bool,
    /// Index of the confirming candle in the source series
    pub index: usize,
    /// Filled in by the enrichment pass; never part of the event's identity
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enrichment: Option<BosEnrichment>,
}

impl BosEvent {
    pub fn is_active(&self) -> bool {
        self.status == BosStatus::Active
    }
}

/// Emit one break per swing: the first later close strictly beyond its price.
///
/// Swing highs break bullish (close above), swing lows bearish (close below).
/// Every event is emitted `Active`; run [`reclassify_bos`] against the full
/// series to observe reclaims. Events are ordered by confirming timestamp,
/// then by broken swing timestamp.
pub fn detect_bos(
    candles: &[Candle],
    swings: &[SwingPoint],
    pip_multiplier: f64,
    config: &StructureConfig,
) -> Vec<BosEvent> {
    let mut events: Vec<BosEvent> = swings
        .iter()
        .filter_map(|swing| break_of(swing, candles, swings, pip_multiplier, config))
        .collect();

    events.sort_by_key(|e| (e.timestamp, e.swing_timestamp));
    debug!(count = events.len(), "detected breaks of structure");
    events
}

fn break_of(
    swing: &SwingPoint,
    candles: &[Candle],
    swings: &[SwingPoint],
    pip_multiplier: f64,
    config: &StructureConfig,
) -> Option<BosEvent> {
    let direction = match swing.kind {
        SwingKind::High => Direction::Bullish,
        SwingKind::Low => Direction::Bearish,
    };
    let level = swing.price;

    let (index, candle) = candles
        .iter()
        .enumerate()
        .skip(swing.index + 1)
        .filter(|(_, c)| c.is_finite())
        .find(|(_, c)| closes_beyond(c.close, level, direction))?;

    let prior_labels: Vec<_> = swings
        .iter()
        .filter(|s| s.timestamp < candle.timestamp)
        .filter_map(|s| s.label)
        .collect();
    let prevailing = direction_from_labels(&prior_labels);
    let is_counter_trend = prevailing == direction.opposite();

    Some(BosEvent {
        timestamp: candle.timestamp,
        direction,
        status: BosStatus::Active,
        level,
        swing_timestamp: swing.timestamp,
        close: candle.close,
        magnitude_pips: (candle.close - level).abs() * pip_multiplier,
        is_displacement: is_displacement(
            candle.body(),
            &candles[..index],
            config.displacement_atr_period,
            config.displacement_atr_multiple,
        ),
        is_counter_trend,
        index,
        enrichment: None,
    })
}

fn closes_beyond(close: f64, level: f64, direction: Direction) -> bool {
    match direction {
        Direction::Bullish => close > level,
        Direction::Bearish => close < level,
        Direction::Ranging => false,
    }
}

/// Whether price later closed back through the event's level.
pub fn is_reclaimed(event: &BosEvent, candles: &[Candle]) -> bool {
    candles
        .iter()
        .filter(|c| c.timestamp > event.timestamp && c.is_finite())
        .any(|c| closes_beyond(c.close, event.level, event.direction.opposite()))
}

/// Re-derive every event's status from the full candle series.
pub fn reclassify_bos(events: &[BosEvent], candles: &[Candle]) -> Vec<BosEvent> {
    events
        .iter()
        .map(|e| {
            let mut e = e.clone();
            e.status = if is_reclaimed(&e, candles) {
                BosStatus::Reclaimed
            } else {
                BosStatus::Active
            };
            e
        })
        .collect()
}

/// Events that are still active after re-deriving status against `candles`.
pub fn active_bos(events: &[BosEvent], candles: &[Candle]) -> Vec<BosEvent> {
    reclassify_bos(events, candles)
        .into_iter()
        .filter(BosEvent::is_active)
        .collect()
}
