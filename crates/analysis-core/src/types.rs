use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::StructureError;

/// OHLCV candle. Timestamps are Unix milliseconds, strictly increasing within a series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub timestamp: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    #[serde(default)]
    pub volume: Option<u64>,
}

impl Candle {
    pub fn new(timestamp: i64, open: f64, high: f64, low: f64, close: f64) -> Self {
        Self {
            timestamp,
            open,
            high,
            low,
            close,
            volume: None,
        }
    }

    pub fn with_volume(mut self, volume: u64) -> Self {
        self.volume = Some(volume);
        self
    }

    /// All four prices are finite numbers.
    pub fn is_finite(&self) -> bool {
        self.open.is_finite() && self.high.is_finite() && self.low.is_finite() && self.close.is_finite()
    }

    pub fn body(&self) -> f64 {
        (self.close - self.open).abs()
    }

    pub fn range(&self) -> f64 {
        self.high - self.low
    }

}

/// Check a series for non-finite prices and out-of-order timestamps.
///
/// Scanners tolerate both (malformed candles are skipped), so this is only for
/// callers that prefer to reject bad input upstream.
pub fn validate_series(candles: &[Candle]) -> Result<(), StructureError> {
    let mut prev_ts: Option<i64> = None;
    for (index, c) in candles.iter().enumerate() {
        let out_of_order = prev_ts.is_some_and(|p| c.timestamp <= p);
        if !c.is_finite() || out_of_order {
            return Err(StructureError::MalformedCandle {
                index,
                timestamp: c.timestamp,
            });
        }
        prev_ts = Some(c.timestamp);
    }
    Ok(())
}

/// Last finite close of a series.
pub fn last_close(candles: &[Candle]) -> Option<f64> {
    candles.iter().rev().map(|c| c.close).find(|p| p.is_finite())
}

/// Trend or break direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Bullish,
    Bearish,
    Ranging,
}

impl Direction {
    /// +1 bullish, -1 bearish, 0 ranging
    pub fn sign(&self) -> f64 {
        match self {
            Direction::Bullish => 1.0,
            Direction::Bearish => -1.0,
            Direction::Ranging => 0.0,
        }
    }

    pub fn opposite(&self) -> Direction {
        match self {
            Direction::Bullish => Direction::Bearish,
            Direction::Bearish => Direction::Bullish,
            Direction::Ranging => Direction::Ranging,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Direction::Bullish => "bullish",
            Direction::Bearish => "bearish",
            Direction::Ranging => "ranging",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Chart timeframe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Timeframe {
    M5,
    M15,
    M30,
    H1,
    H4,
    D1,
    W1,
    MN1,
}

impl Timeframe {
    pub fn code(&self) -> &'static str {
        match self {
            Timeframe::M5 => "M5",
            Timeframe::M15 => "M15",
            Timeframe::M30 => "M30",
            Timeframe::H1 => "H1",
            Timeframe::H4 => "H4",
            Timeframe::D1 => "D1",
            Timeframe::W1 => "W1",
            Timeframe::MN1 => "MN1",
        }
    }

    pub fn all() -> [Timeframe; 8] {
        [
            Timeframe::M5,
            Timeframe::M15,
            Timeframe::M30,
            Timeframe::H1,
            Timeframe::H4,
            Timeframe::D1,
            Timeframe::W1,
            Timeframe::MN1,
        ]
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Timeframe {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "M5" | "5M" => Ok(Timeframe::M5),
            "M15" | "15M" => Ok(Timeframe::M15),
            "M30" | "30M" => Ok(Timeframe::M30),
            "H1" | "1H" => Ok(Timeframe::H1),
            "H4" | "4H" => Ok(Timeframe::H4),
            "D1" | "D" | "1D" | "DAILY" => Ok(Timeframe::D1),
            "W1" | "W" | "1W" | "WEEKLY" => Ok(Timeframe::W1),
            "MN1" | "MN" | "1M" | "MONTHLY" => Ok(Timeframe::MN1),
            other => Err(format!("unknown timeframe: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_series_flags_nan_and_order() {
        let good = vec![
            Candle::new(1, 1.0, 2.0, 0.5, 1.5),
            Candle::new(2, 1.5, 2.5, 1.0, 2.0),
        ];
        assert!(validate_series(&good).is_ok());

        let mut nan = good.clone();
        nan[1].high = f64::NAN;
        assert_eq!(
            validate_series(&nan),
            Err(StructureError::MalformedCandle { index: 1, timestamp: 2 })
        );

        let unordered = vec![good[1], good[0]];
        assert!(validate_series(&unordered).is_err());
    }

    #[test]
    fn test_last_close_skips_non_finite() {
        let mut candles = vec![
            Candle::new(1, 1.0, 2.0, 0.5, 1.5),
            Candle::new(2, 1.5, 2.5, 1.0, 2.0),
        ];
        candles[1].close = f64::NAN;
        assert_eq!(last_close(&candles), Some(1.5));
        assert_eq!(last_close(&[]), None);
    }

    #[test]
    fn test_timeframe_parse_and_order() {
        assert_eq!("h4".parse::<Timeframe>(), Ok(Timeframe::H4));
        assert_eq!("Daily".parse::<Timeframe>(), Ok(Timeframe::D1));
        assert!("X9".parse::<Timeframe>().is_err());
        assert!(Timeframe::MN1 > Timeframe::W1);
    }

    #[test]
    fn test_direction_serializes_lowercase() {
        let json = serde_json::to_string(&Direction::Bearish).unwrap();
        assert_eq!(json, "\"bearish\"");
        assert_eq!(Direction::Bullish.sign(), 1.0);
        assert_eq!(Direction::Ranging.opposite(), Direction::Ranging);
    }
}
