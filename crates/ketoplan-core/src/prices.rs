//! Supermarket price hints loaded from a CSV file.
//!
//! The file needs a header row naming `name`, `pack_size` and `price_gbp`
//! (any order, any case). Extra columns are ignored. Fields may be wrapped in
//! double quotes to carry commas; `""` inside a quoted field is a literal
//! quote.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use thiserror::Error;

/// One row of the price list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceEntry {
    pub name: String,
    pub pack_size: String,
    pub price_gbp: f64,
}

/// Price entries keyed by product name. A later row with the same name
/// replaces an earlier one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceTable {
    entries: BTreeMap<String, PriceEntry>,
}

impl PriceTable {
    pub fn insert(&mut self, entry: PriceEntry) {
        self.entries.insert(entry.name.clone(), entry);
    }

    pub fn get(&self, name: &str) -> Option<&PriceEntry> {
        self.entries.get(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in name order.
    pub fn entries(&self) -> impl Iterator<Item = &PriceEntry> {
        self.entries.values()
    }
}

impl FromIterator<PriceEntry> for PriceTable {
    fn from_iter<I: IntoIterator<Item = PriceEntry>>(iter: I) -> Self {
        let mut table = Self::default();
        for entry in iter {
            table.insert(entry);
        }
        table
    }
}

/// Errors from parsing a price CSV.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PriceCsvError {
    #[error("price list is empty (expected a header row)")]
    Empty,

    #[error("header is missing required column {0:?}")]
    MissingColumn(&'static str),

    #[error("line {line}: expected at least {expected} fields, found {found}")]
    TooFewFields {
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("line {line}: unterminated quoted field")]
    UnterminatedQuote { line: usize },

    #[error("line {line}: product name is empty")]
    EmptyName { line: usize },

    #[error("line {line}: price {value:?} is not a positive number")]
    InvalidPrice { line: usize, value: String },
}

/// Parse price hints from CSV text.
pub fn parse_price_csv(content: &str) -> Result<PriceTable, PriceCsvError> {
    let mut lines = content
        .lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line.trim_end_matches('\r')))
        .filter(|(_, line)| !line.trim().is_empty());

    let (header_line, header) = lines.next().ok_or(PriceCsvError::Empty)?;
    let header = split_fields(header, header_line)?;
    let column = |wanted: &'static str| {
        header
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(wanted))
            .ok_or(PriceCsvError::MissingColumn(wanted))
    };
    let name_idx = column("name")?;
    let pack_idx = column("pack_size")?;
    let price_idx = column("price_gbp")?;
    let needed = name_idx.max(pack_idx).max(price_idx) + 1;

    let mut table = PriceTable::default();
    for (line_no, line) in lines {
        let fields = split_fields(line, line_no)?;
        if fields.len() < needed {
            return Err(PriceCsvError::TooFewFields {
                line: line_no,
                expected: needed,
                found: fields.len(),
            });
        }

        let name = fields[name_idx].trim();
        if name.is_empty() {
            return Err(PriceCsvError::EmptyName { line: line_no });
        }

        let raw_price = fields[price_idx].trim();
        let price_gbp = raw_price
            .trim_start_matches('£')
            .parse::<f64>()
            .ok()
            .filter(|p| p.is_finite() && *p > 0.0)
            .ok_or_else(|| PriceCsvError::InvalidPrice {
                line: line_no,
                value: raw_price.to_string(),
            })?;

        table.insert(PriceEntry {
            name: name.to_string(),
            pack_size: fields[pack_idx].trim().to_string(),
            price_gbp,
        });
    }

    tracing::debug!(entries = table.len(), "parsed price list");
    Ok(table)
}

/// Read and parse a price CSV file.
pub fn load_price_csv(path: &Path) -> Result<PriceTable> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read price list at {}", path.display()))?;
    parse_price_csv(&content)
        .with_context(|| format!("invalid price list at {}", path.display()))
}

/// Split one CSV line into fields, honouring double quotes.
fn split_fields(line: &str, line_no: usize) -> Result<Vec<String>, PriceCsvError> {
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                field.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => fields.push(std::mem::take(&mut field)),
            other => field.push(other),
        }
    }

    if in_quotes {
        return Err(PriceCsvError::UnterminatedQuote { line: line_no });
    }
    fields.push(field);
    Ok(fields)
}
