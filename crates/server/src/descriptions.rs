//! Curated short tool descriptions keyed by `operationId`.
//!
//! The ThetaData spec carries long, reference-style descriptions. Shorter ones keep `tools/list`
//! small. A YAML or JSON file (`operationId: text`) can override or extend the built-in table.

use crate::error::{Result, ServerError};
use std::collections::HashMap;
use std::path::Path;

const BUILTIN: &[(&str, &str)] = &[
    ("stock_list_symbols", "List all stock symbols."),
    ("stock_list_dates", "List dates with available data for a stock symbol."),
    ("stock_snapshot_ohlc", "Current-day OHLC snapshot for stocks."),
    ("stock_snapshot_trade", "Last trade snapshot for stocks."),
    ("stock_snapshot_quote", "Last NBBO quote snapshot for stocks."),
    ("stock_history_eod", "End-of-day stock reports over a date range."),
    ("stock_history_ohlc", "Intraday OHLC bars for a stock over a date range."),
    ("stock_history_trade", "Every trade for a stock over a date range."),
    ("stock_history_quote", "NBBO quotes for a stock over a date range."),
    ("option_list_symbols", "List all option root symbols."),
    ("option_list_expirations", "List expirations for an option root."),
    ("option_list_strikes", "List strikes for an option root and expiration."),
    ("option_list_contracts", "List option contracts traded or quoted on a date."),
    ("option_snapshot_ohlc", "Current-day OHLC snapshot for option contracts."),
    ("option_snapshot_quote", "Last NBBO quote snapshot for option contracts."),
    ("option_snapshot_greeks_all", "Current greeks snapshot for option contracts."),
    ("option_history_eod", "End-of-day option reports over a date range."),
    ("option_history_ohlc", "Intraday OHLC bars for an option contract."),
    ("option_history_trade", "Every trade for an option contract over a date range."),
    ("option_history_quote", "NBBO quotes for an option contract over a date range."),
    ("option_history_greeks_eod", "End-of-day greeks for option contracts."),
    ("option_history_open_interest", "Open interest for an option contract over a date range."),
    ("index_list_symbols", "List all index symbols."),
    ("index_list_dates", "List dates with available data for an index."),
    ("index_snapshot_price", "Current price snapshot for indices."),
    ("index_history_eod", "End-of-day index reports over a date range."),
    ("index_history_price", "Intraday index prices over a date range."),
    ("calendar_today", "Market calendar for today."),
    ("calendar_on_date", "Market calendar for a given date."),
    ("calendar_year_holidays", "Market holidays for a year."),
];

#[derive(Debug, Clone, Default)]
pub struct Descriptions {
    entries: HashMap<String, String>,
}

impl Descriptions {
    /// The built-in ThetaData table.
    #[must_use]
    pub fn builtin() -> Self {
        Self {
            entries: BUILTIN
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect(),
        }
    }

    #[must_use]
    pub fn get(&self, operation_id: &str) -> Option<&str> {
        self.entries.get(operation_id).map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Merge entries from a YAML/JSON mapping file on top of `self`. Blank texts are ignored.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be read or is not a string-to-string mapping.
    pub fn merge_file(&mut self, path: &Path) -> Result<usize> {
        let text = std::fs::read_to_string(path).map_err(|source| ServerError::DescriptionsRead {
            path: path.to_path_buf(),
            source,
        })?;
        let overrides: HashMap<String, String> =
            serde_yaml::from_str(&text).map_err(|source| ServerError::DescriptionsParse {
                path: path.to_path_buf(),
                source,
            })?;

        let mut merged = 0;
        for (id, desc) in overrides {
            let desc = desc.trim();
            if desc.is_empty() {
                continue;
            }
            self.entries.insert(id, desc.to_string());
            merged += 1;
        }
        tracing::info!(
            "Loaded {} curated descriptions from {}",
            merged,
            path.display()
        );
        Ok(merged)
    }
}
