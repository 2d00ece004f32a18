use analysis_core::Timeframe;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Lookback used for any timeframe missing from the table.
pub const FALLBACK_LOOKBACK: usize = 3;

/// Calibration table for the structure scanners.
///
/// Every threshold the scanners use lives here so it can be pinned in tests
/// and overridden from a JSON file without touching code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StructureConfig {
    /// Candles required on each side of a pivot, per timeframe
    pub swing_lookback: BTreeMap<Timeframe, usize>,

    /// Two pivots within this many pips are treated as equal (EQH/EQL)
    pub equal_tolerance_pips: f64,

    /// ATR period used for the displacement test
    pub displacement_atr_period: usize,

    /// Body must be at least this multiple of ATR to count as displacement
    pub displacement_atr_multiple: f64,

    /// Number of prior candles whose volumes rank an FVG's displacement candle
    pub fvg_volume_window: usize,

    /// Percentile rank at or above which an FVG is tier 1
    pub fvg_tier1_rank: f64,

    /// Percentile rank at or above which an FVG is tier 2 (below is tier 3)
    pub fvg_tier2_rank: f64,

    /// Gaps smaller than this (in pips) are ignored
    pub min_fvg_pips: f64,

    /// Half-width of the equilibrium band around 50% depth, in percentage points
    pub equilibrium_band: f64,

    /// Depth at or above which the primary tier is deep premium
    pub deep_premium_depth: f64,

    /// Depth at or below which the primary tier is deep discount
    pub deep_discount_depth: f64,

    /// How many recent labels the current structure reports
    pub recent_labels: usize,

    /// Monthly candles spanning the yearly tier
    pub yearly_window: usize,

    /// Monthly candles spanning the macro tier
    pub macro_window: usize,
}

impl Default for StructureConfig {
    fn default() -> Self {
        let swing_lookback = BTreeMap::from([
            (Timeframe::M5, 2),
            (Timeframe::M15, 2),
            (Timeframe::M30, 2),
            (Timeframe::H1, 3),
            (Timeframe::H4, 4),
            (Timeframe::D1, 5),
            (Timeframe::W1, 3),
            (Timeframe::MN1, 2),
        ]);

        Self {
            swing_lookback,
            equal_tolerance_pips: 1.0,
            displacement_atr_period: 14,
            displacement_atr_multiple: 1.5,
            fvg_volume_window: 20,
            fvg_tier1_rank: 2.0 / 3.0,
            fvg_tier2_rank: 1.0 / 3.0,
            min_fvg_pips: 0.0,
            equilibrium_band: 2.0,
            deep_premium_depth: 80.0,
            deep_discount_depth: 20.0,
            recent_labels: 8,
            yearly_window: 12,
            macro_window: 60,
        }
    }
}

impl StructureConfig {
    pub fn lookback(&self, timeframe: Timeframe) -> usize {
        self.swing_lookback
            .get(&timeframe)
            .copied()
            .unwrap_or(FALLBACK_LOOKBACK)
            .max(1)
    }

    /// Load a config from JSON; missing fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_daily_lookback_exceeds_hourly() {
        let config = StructureConfig::default();
        assert!(config.lookback(Timeframe::D1) > config.lookback(Timeframe::H1));
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = StructureConfig::from_json(r#"{"equal_tolerance_pips": 2.5, "swing_lookback": {"H1": 4}}"#)
            .unwrap();
        assert_eq!(config.equal_tolerance_pips, 2.5);
        assert_eq!(config.lookback(Timeframe::H1), 4);
        assert_eq!(config.lookback(Timeframe::D1), FALLBACK_LOOKBACK);
        assert_eq!(config.recent_labels, 8);
    }
}
