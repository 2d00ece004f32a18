use crate::StructureError;

/// Source of pip multipliers per instrument symbol.
///
/// Supplied by the caller; `PipTable` covers the usual forex, metals and index symbols.
pub trait PipSource: Send + Sync {
    fn pip_multiplier(&self, symbol: &str) -> Result<f64, StructureError>;
}
