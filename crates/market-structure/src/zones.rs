use analysis_core::Candle;
use serde::{Deserialize, Serialize};

use crate::config::StructureConfig;
use crate::swings::{SwingKind, SwingPoint};

/// Dealing-range horizon a zone is measured over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ZoneTier {
    /// The requested timeframe's own swing range
    Primary,
    Daily,
    Weekly,
    Yearly,
    Macro,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Zone {
    Premium,
    Discount,
    Equilibrium,
}

/// Price range `[low, high]` a tier is measured over.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DealingRange {
    pub low: f64,
    pub high: f64,
}

impl DealingRange {
    /// A range needs finite bounds with `high > low`.
    pub fn new(low: f64, high: f64) -> Option<Self> {
        (low.is_finite() && high.is_finite() && high > low).then_some(Self { low, high })
    }

    /// Range spanned by the most recent swing high and most recent swing low.
    ///
    /// In a strong leg the latest low can sit above the latest high, so the
    /// bounds are ordered by price rather than by pivot kind.
    pub fn from_swings(swings: &[SwingPoint]) -> Option<Self> {
        let high = swings.iter().rev().find(|s| s.kind == SwingKind::High)?.price;
        let low = swings.iter().rev().find(|s| s.kind == SwingKind::Low)?.price;
        Self::new(low.min(high), low.max(high))
    }

    /// Extremes of the last `window` finite candles.
    pub fn from_candles(candles: &[Candle], window: usize) -> Option<Self> {
        let recent = &candles[candles.len().saturating_sub(window)..];
        let finite = recent.iter().filter(|c| c.is_finite());
        let high = finite.clone().map(|c| c.high).fold(f64::NEG_INFINITY, f64::max);
        let low = finite.map(|c| c.low).fold(f64::INFINITY, f64::min);
        Self::new(low, high)
    }

    pub fn equilibrium(&self) -> f64 {
        (self.high + self.low) / 2.0
    }

    /// Position of `price` within the range, 0 at the low and 100 at the high.
    pub fn depth_percent(&self, price: f64) -> f64 {
        ((price - self.low) / (self.high - self.low) * 100.0).clamp(0.0, 100.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierZone {
    pub tier: ZoneTier,
    pub zone: Zone,
    pub equilibrium: f64,
    pub range: DealingRange,
    pub depth_percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PremiumDiscountZones {
    pub current_price: f64,
    /// Tiers that had a usable range, in tier order
    pub tiers: Vec<TierZone>,
    /// Tiers sharing the primary (or first available) tier's zone
    pub alignment_count: usize,
    pub is_deep_premium: bool,
    pub is_deep_discount: bool,
}

impl PremiumDiscountZones {
    pub fn tier(&self, tier: ZoneTier) -> Option<&TierZone> {
        self.tiers.iter().find(|t| t.tier == tier)
    }
}

/// Classify a depth: within `band` points of 50 is equilibrium.
pub fn classify_depth(depth: f64, band: f64) -> Zone {
    if (depth - 50.0).abs() <= band {
        Zone::Equilibrium
    } else if depth > 50.0 {
        Zone::Premium
    } else {
        Zone::Discount
    }
}

/// Measure `price` against each tier's range. Tiers without a range are omitted.
pub fn premium_discount(
    price: f64,
    ranges: &[(ZoneTier, Option<DealingRange>)],
    config: &StructureConfig,
) -> PremiumDiscountZones {
    let mut tiers: Vec<TierZone> = ranges
        .iter()
        .filter_map(|(tier, range)| range.map(|r| (*tier, r)))
        .filter(|_| price.is_finite())
        .map(|(tier, range)| {
            let depth = range.depth_percent(price);
            TierZone {
                tier,
                zone: classify_depth(depth, config.equilibrium_band),
                equilibrium: range.equilibrium(),
                range,
                depth_percent: depth,
            }
        })
        .collect();
    tiers.sort_by_key(|t| t.tier);

    let anchor = tiers
        .iter()
        .find(|t| t.tier == ZoneTier::Primary)
        .or_else(|| tiers.first());
    let alignment_count = anchor.map_or(0, |a| tiers.iter().filter(|t| t.zone == a.zone).count());
    let primary_depth = tiers
        .iter()
        .find(|t| t.tier == ZoneTier::Primary)
        .map(|t| t.depth_percent);

    PremiumDiscountZones {
        current_price: price,
        alignment_count,
        is_deep_premium: primary_depth.is_some_and(|d| d >= config.deep_premium_depth),
        is_deep_discount: primary_depth.is_some_and(|d| d <= config.deep_discount_depth),
        tiers,
    }
}
