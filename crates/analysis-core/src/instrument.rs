use tracing::warn;

use crate::{PipSource, StructureError};

/// Multiplier applied when the symbol is unknown and the caller opts into a fallback.
pub const DEFAULT_PIP_MULTIPLIER: f64 = 10_000.0;

const EQUITY_INDICES: &[&str] = &[
    "US30", "NAS100", "SPX500", "US500", "US100", "GER40", "DE40", "UK100", "JPN225", "FRA40",
    "AUS200", "HK50",
];

const CURRENCIES: &[&str] = &[
    "USD", "EUR", "GBP", "JPY", "CHF", "CAD", "AUD", "NZD", "SEK", "NOK", "DKK", "SGD", "HKD",
    "MXN", "ZAR", "TRY", "PLN", "CNH",
];

/// Built-in pip table for forex majors/crosses, metals and the common index CFDs.
#[derive(Debug, Clone, Copy, Default)]
pub struct PipTable;

impl PipTable {
    pub fn new() -> Self {
        Self
    }
}

impl PipSource for PipTable {
    fn pip_multiplier(&self, symbol: &str) -> Result<f64, StructureError> {
        let s = normalize_symbol(symbol);
        if EQUITY_INDICES.contains(&s.as_str()) {
            return Ok(1.0);
        }
        if s.starts_with("XAU") || s == "GOLD" {
            return Ok(10.0);
        }
        if s.starts_with("XAG") || s == "SILVER" {
            return Ok(100.0);
        }
        if s.len() == 6 && s.chars().all(|c| c.is_ascii_alphabetic()) {
            let (base, quote) = s.split_at(3);
            if CURRENCIES.contains(&base) && CURRENCIES.contains(&quote) {
                return Ok(if quote == "JPY" { 100.0 } else { 10_000.0 });
            }
        }
        Err(StructureError::InvalidInstrument(symbol.to_string()))
    }
}

/// Look up a multiplier, falling back to [`DEFAULT_PIP_MULTIPLIER`] for unknown symbols.
pub fn pip_multiplier_or_default(source: &dyn PipSource, symbol: &str) -> f64 {
    match source.pip_multiplier(symbol) {
        Ok(m) => m,
        Err(e) => {
            warn!(symbol, error = %e, "unknown instrument, using default pip multiplier");
            DEFAULT_PIP_MULTIPLIER
        }
    }
}

/// Currency codes making up a six-letter pair symbol (`EURUSD` -> `["EUR", "USD"]`).
pub fn pair_currencies(symbol: &str) -> Vec<String> {
    let s = normalize_symbol(symbol);
    if s.len() == 6 && s.is_ascii() {
        vec![s[..3].to_string(), s[3..].to_string()]
    } else if EQUITY_INDICES.contains(&s.as_str()) {
        Vec::new()
    } else {
        vec![s]
    }
}

fn normalize_symbol(symbol: &str) -> String {
    symbol
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_ascii_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pip_table() {
        let table = PipTable::new();
        assert_eq!(table.pip_multiplier("EURUSD"), Ok(10_000.0));
        assert_eq!(table.pip_multiplier("usd/jpy"), Ok(100.0));
        assert_eq!(table.pip_multiplier("XAUUSD"), Ok(10.0));
        assert_eq!(table.pip_multiplier("XAGUSD"), Ok(100.0));
        assert_eq!(table.pip_multiplier("NAS100"), Ok(1.0));
        assert_eq!(
            table.pip_multiplier("BTCUSD"),
            Err(StructureError::InvalidInstrument("BTCUSD".to_string()))
        );
    }

    #[test]
    fn test_fallback_multiplier() {
        assert_eq!(pip_multiplier_or_default(&PipTable, "DOGE"), DEFAULT_PIP_MULTIPLIER);
        assert_eq!(pip_multiplier_or_default(&PipTable, "GBPJPY"), 100.0);
    }

    #[test]
    fn test_pair_currencies() {
        assert_eq!(pair_currencies("EUR_USD"), vec!["EUR", "USD"]);
        assert!(pair_currencies("US30").is_empty());
    }
}
