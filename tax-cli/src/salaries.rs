//! CSV loader for salary lists.
//!
//! ## CSV Format
//!
//! | Column     | Required | Type    | Notes                                 |
//! |------------|----------|---------|---------------------------------------|
//! | `amount`   | yes      | decimal | Gross salary, e.g. `5000.00`          |
//! | `currency` | yes      | string  | ISO 4217 code, any case, e.g. `usd`   |
//!
//! Headers are matched by name, so column order does not matter. Rows are
//! returned in file order, which is the order a progressive policy taxes them.
//!
//! ```csv
//! amount,currency
//! 5000,PLN
//! 310.25,USD
//! ```

use std::path::{Path, PathBuf};

use rust_decimal::Decimal;
use serde::Deserialize;
use tax_core::{CurrencyCode, SalaryEntry};

#[derive(Debug, Deserialize)]
struct CsvRow {
    amount: Decimal,
    currency: String,
}

/// Errors that can occur while loading a salary file.
#[derive(Debug, thiserror::Error)]
pub enum SalaryFileError {
    /// The file could not be read.
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The CSV is structurally invalid or a cell has the wrong type.
    #[error("CSV parse error: {0}")]
    Parse(#[from] csv::Error),

    /// A `currency` cell is not a three-letter code. `row` is 1-based, not
    /// counting the header.
    #[error("invalid currency code '{code}' on row {row}")]
    InvalidCurrency { code: String, row: usize },
}

fn convert_row(
    row: CsvRow,
    row_number: usize,
) -> Result<SalaryEntry, SalaryFileError> {
    let currency =
        CurrencyCode::parse(&row.currency).map_err(|_| SalaryFileError::InvalidCurrency {
            code: row.currency,
            row: row_number,
        })?;
    Ok(SalaryEntry::new(row.amount, currency))
}

/// Parses salary CSV text.
///
/// Negative amounts are accepted here; calculators reject them.
pub fn load_from_str(input: &str) -> Result<Vec<SalaryEntry>, SalaryFileError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .flexible(false)
        .from_reader(input.as_bytes());

    reader
        .deserialize::<CsvRow>()
        .enumerate()
        .map(|(idx, result)| convert_row(result?, idx + 1))
        .collect()
}

/// Reads a file from disk and delegates to [`load_from_str`].
pub fn load_from_file(path: &Path) -> Result<Vec<SalaryEntry>, SalaryFileError> {
    let contents = std::fs::read_to_string(path).map_err(|source| SalaryFileError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    load_from_str(&contents)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
