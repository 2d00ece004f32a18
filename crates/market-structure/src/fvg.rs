use analysis_core::adaptive::{is_displacement, percentile_rank};
use analysis_core::{Candle, Direction};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::StructureConfig;

/// Lifecycle of a fair value gap, in increasing precedence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FvgStatus {
    Fresh,
    Partial,
    Filled,
    Reclaimed,
    Inverted,
}

/// Three-candle imbalance and its state against every later candle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FvgEvent {
    pub direction: Direction,
    pub status: FvgStatus,
    /// 1 = highest relative volume
    pub tier: u8,
    pub top: f64,
    pub bottom: f64,
    pub midline: f64,
    pub gap_pips: f64,
    /// 0 to 100, never decreases
    pub fill_percent: f64,
    pub is_displacement: bool,
    /// Timestamp of the displacement (middle) candle
    pub timestamp: i64,
    pub index: usize,
    pub retest_count: u32,
    pub midline_respected: bool,
}

impl FvgEvent {
    /// The edge price must cross to fill the gap.
    pub fn far_edge(&self) -> f64 {
        match self.direction {
            Direction::Bearish => self.top,
            _ => self.bottom,
        }
    }

    /// The edge price returns to first.
    pub fn near_edge(&self) -> f64 {
        match self.direction {
            Direction::Bearish => self.bottom,
            _ => self.top,
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self.status, FvgStatus::Fresh | FvgStatus::Partial)
    }
}

/// Find gaps over every consecutive triple and track each one to the end of the series.
///
/// Bullish when candle `i-1`'s high is strictly below candle `i+1`'s low
/// (gap spans `[high(i-1), low(i+1)]`); bearish with highs and lows swapped.
/// Triples containing a malformed candle are skipped.
pub fn detect_fvgs(candles: &[Candle], pip_multiplier: f64, config: &StructureConfig) -> Vec<FvgEvent> {
    if candles.len() < 3 {
        return Vec::new();
    }

    let mut gaps = Vec::new();
    for i in 1..candles.len() - 1 {
        let (before, mid, after) = (&candles[i - 1], &candles[i], &candles[i + 1]);
        if !(before.is_finite() && mid.is_finite() && after.is_finite()) {
            continue;
        }

        let (direction, bottom, top) = if before.high < after.low {
            (Direction::Bullish, before.high, after.low)
        } else if before.low > after.high {
            (Direction::Bearish, after.high, before.low)
        } else {
            continue;
        };

        let gap_pips = (top - bottom) * pip_multiplier;
        if gap_pips < config.min_fvg_pips {
            continue;
        }

        let fresh = FvgEvent {
            direction,
            status: FvgStatus::Fresh,
            tier: volume_tier(candles, i, config),
            top,
            bottom,
            midline: (top + bottom) / 2.0,
            gap_pips,
            fill_percent: 0.0,
            is_displacement: is_displacement(
                mid.body(),
                &candles[..i],
                config.displacement_atr_period,
                config.displacement_atr_multiple,
            ),
            timestamp: mid.timestamp,
            index: i,
            retest_count: 0,
            midline_respected: false,
        };
        gaps.push(track_fvg(fresh, &candles[i + 2..]));
    }

    debug!(count = gaps.len(), "detected fair value gaps");
    gaps
}

/// Rank the displacement candle against the preceding window.
///
/// Volume is used when both the candle and its window carry it; otherwise
/// candle range stands in as the activity measure.
fn volume_tier(candles: &[Candle], i: usize, config: &StructureConfig) -> u8 {
    let window = &candles[i.saturating_sub(config.fvg_volume_window)..i];
    let volumes: Vec<f64> = window.iter().filter_map(|c| c.volume).map(|v| v as f64).collect();

    let rank = match candles[i].volume {
        Some(v) if !volumes.is_empty() => percentile_rank(v as f64, &volumes),
        _ => {
            let ranges: Vec<f64> = window.iter().filter(|c| c.is_finite()).map(Candle::range).collect();
            percentile_rank(candles[i].range(), &ranges)
        }
    };

    if rank >= config.fvg_tier1_rank {
        1
    } else if rank >= config.fvg_tier2_rank {
        2
    } else {
        3
    }
}

/// Replay `later` candles over a fresh gap and return its resulting state.
///
/// Fill is the deepest penetration so far as a share of the gap. A close
/// beyond the far edge reclaims the gap; after a reclaim, a candle that
/// trades back into the gap and closes on the reclaimed side again inverts it.
pub fn track_fvg(mut gap: FvgEvent, later: &[Candle]) -> FvgEvent {
    let span = gap.top - gap.bottom;
    if span <= 0.0 {
        return gap;
    }
    let bullish = gap.direction != Direction::Bearish;
    let mut inside = false;
    let mut reached_midline = false;
    let mut midline_broken = false;

    for c in later.iter().filter(|c| c.is_finite()) {
        let overlaps = c.low <= gap.top && c.high >= gap.bottom;
        if overlaps && !inside {
            gap.retest_count += 1;
        }
        inside = overlaps;

        let penetration = if bullish { gap.top - c.low } else { c.high - gap.bottom };
        let fill = (penetration / span * 100.0).clamp(0.0, 100.0);
        gap.fill_percent = gap.fill_percent.max(fill);

        let touches_mid = if bullish { c.low <= gap.midline } else { c.high >= gap.midline };
        let closes_past_mid = if bullish { c.close < gap.midline } else { c.close > gap.midline };
        reached_midline |= touches_mid;
        midline_broken |= closes_past_mid;

        let closes_beyond_far = if bullish { c.close < gap.bottom } else { c.close > gap.top };
        gap.status = match gap.status {
            FvgStatus::Inverted => FvgStatus::Inverted,
            FvgStatus::Reclaimed => {
                let retested = if bullish { c.high >= gap.bottom } else { c.low <= gap.top };
                if retested && closes_beyond_far {
                    FvgStatus::Inverted
                } else {
                    FvgStatus::Reclaimed
                }
            }
            _ if closes_beyond_far => FvgStatus::Reclaimed,
            _ if gap.fill_percent >= 100.0 => FvgStatus::Filled,
            _ if gap.fill_percent > 0.0 => FvgStatus::Partial,
            status => status,
        };
    }

    gap.midline_respected = reached_midline && !midline_broken;
    gap
}
