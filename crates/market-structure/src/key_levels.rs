use analysis_core::{Candle, Direction};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyLevelKind {
    PreviousDayHigh,
    PreviousDayLow,
    PreviousWeekHigh,
    PreviousWeekLow,
    PreviousMonthHigh,
    PreviousMonthLow,
    YearlyHigh,
    YearlyLow,
    /// Supplied by the caller
    External,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyLevel {
    pub kind: KeyLevelKind,
    pub price: f64,
    /// Timestamp of the candle the level came from (0 for external levels)
    pub source_timestamp: i64,
}

impl KeyLevel {
    pub fn external(price: f64) -> Self {
        Self {
            kind: KeyLevelKind::External,
            price,
            source_timestamp: 0,
        }
    }
}

/// Prior day/week/month extremes plus the yearly range.
///
/// "Prior" means the last completed candle, i.e. the second to last of each
/// series; the last one is assumed to still be forming. The yearly range spans
/// the last `yearly_window` monthly candles.
pub fn derive_key_levels(
    daily: &[Candle],
    weekly: &[Candle],
    monthly: &[Candle],
    yearly_window: usize,
) -> Vec<KeyLevel> {
    let mut levels = Vec::new();

    let prior = [
        (daily, KeyLevelKind::PreviousDayHigh, KeyLevelKind::PreviousDayLow),
        (weekly, KeyLevelKind::PreviousWeekHigh, KeyLevelKind::PreviousWeekLow),
        (monthly, KeyLevelKind::PreviousMonthHigh, KeyLevelKind::PreviousMonthLow),
    ];
    for (series, high_kind, low_kind) in prior {
        if let Some(c) = series.iter().rev().skip(1).find(|c| c.is_finite()) {
            levels.push(KeyLevel {
                kind: high_kind,
                price: c.high,
                source_timestamp: c.timestamp,
            });
            levels.push(KeyLevel {
                kind: low_kind,
                price: c.low,
                source_timestamp: c.timestamp,
            });
        }
    }

    let recent = &monthly[monthly.len().saturating_sub(yearly_window)..];
    let finite = move || recent.iter().filter(|c| c.is_finite());
    let high = finite().max_by(|a, b| a.high.total_cmp(&b.high));
    let low = finite().min_by(|a, b| a.low.total_cmp(&b.low));
    if let (Some(h), Some(l)) = (high, low) {
        levels.push(KeyLevel {
            kind: KeyLevelKind::YearlyHigh,
            price: h.high,
            source_timestamp: h.timestamp,
        });
        levels.push(KeyLevel {
            kind: KeyLevelKind::YearlyLow,
            price: l.low,
            source_timestamp: l.timestamp,
        });
    }

    levels
}

/// Levels a break travelled through: for a bullish break, those in
/// `[min(open, level), close)`; mirrored for bearish.
pub fn levels_crossed<'a>(
    levels: &'a [KeyLevel],
    direction: Direction,
    open: f64,
    level: f64,
    close: f64,
) -> Vec<&'a KeyLevel> {
    levels
        .iter()
        .filter(|k| match direction {
            Direction::Bullish => k.price >= open.min(level) && k.price < close,
            Direction::Bearish => k.price <= open.max(level) && k.price > close,
            Direction::Ranging => false,
        })
        .collect()
}
