use thiserror::Error;

/// Recoverable conditions raised by the structure engine.
///
/// None of these abort a scan: short series produce empty results, malformed
/// candles are skipped. They surface as `Err` only from lookups and explicit
/// validation helpers so callers can reject data upstream.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StructureError {
    #[error("Insufficient data: need {required} candles, got {actual}")]
    InsufficientData { required: usize, actual: usize },

    #[error("Invalid instrument: no pip multiplier for {0}")]
    InvalidInstrument(String),

    #[error("Malformed candle at index {index} (timestamp {timestamp})")]
    MalformedCandle { index: usize, timestamp: i64 },
}
