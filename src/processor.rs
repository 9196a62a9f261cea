use crate::error::MatcherError;
use crate::models::{ReversalFlag, Transaction};
use rand::Rng;
use rust_decimal::Decimal;
use std::path::Path;
use tracing::{debug, info, warn};

/// Header token that marks the first line as column names
const HEADER_TOKEN: &str = "cd_produto";

/// Fields required per row: product, company, reversal flag, origin document
const REQUIRED_FIELDS: usize = 4;

/// Bounds of the placeholder amount given to rows without one
const PLACEHOLDER_MIN: i64 = 10;
const PLACEHOLDER_MAX: i64 = 110;

/// Policy that supplies an amount for rows whose CSV line carries none
pub trait ValueGenerator: Send + Sync {
    fn next_value(&self) -> Decimal;
}

/// Uniform random whole amounts in `[10, 110)`. Meant for demos only.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomValueGenerator;

impl ValueGenerator for RandomValueGenerator {
    fn next_value(&self) -> Decimal {
        Decimal::from(rand::thread_rng().gen_range(PLACEHOLDER_MIN..PLACEHOLDER_MAX))
    }
}

/// Always returns the same amount
#[derive(Debug, Clone, Copy)]
pub struct FixedValueGenerator(pub Decimal);

impl ValueGenerator for FixedValueGenerator {
    fn next_value(&self) -> Decimal {
        self.0
    }
}

/// Parse CSV text into transactions, skipping (and logging) rows that fail validation
pub fn parse_csv(content: &str, values: &dyn ValueGenerator) -> Vec<Transaction> {
    let lines: Vec<&str> = content.trim().lines().collect();

    let start_index = match lines.first() {
        Some(first) if first.to_lowercase().contains(HEADER_TOKEN) => 1,
        _ => 0,
    };

    let mut transactions = Vec::with_capacity(lines.len().saturating_sub(start_index));
    let mut skipped = 0;

    for (index, raw) in lines.iter().enumerate().skip(start_index) {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }

        match parse_transaction(index + 1, line, values) {
            Ok(transaction) => transactions.push(transaction),
            Err(e) => {
                skipped += 1;
                warn!("Skipping CSV row: {} ({})", e, line);
            }
        }
    }

    debug!("Parsed {} transactions, skipped {} rows", transactions.len(), skipped);

    transactions
}

/// Read a CSV file and parse it. Any read failure is wrapped with the path.
pub async fn load_from_file(path: &Path, values: &dyn ValueGenerator) -> Result<Vec<Transaction>, MatcherError> {
    info!("Loading transactions from: {:?}", path);

    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| MatcherError::FileReadError {
            path: path.to_path_buf(),
            source,
        })?;

    Ok(parse_csv(&content, values))
}

/// Parse a single CSV line into a Transaction
fn parse_transaction(line_number: usize, line: &str, values: &dyn ValueGenerator) -> Result<Transaction, MatcherError> {
    let invalid = |reason: String| MatcherError::RowParseError {
        line: line_number,
        reason,
    };

    let parts: Vec<&str> = line.split(',').map(|s| s.trim()).collect();

    if parts.len() < REQUIRED_FIELDS {
        return Err(invalid(format!(
            "expected at least {} fields, found {}",
            REQUIRED_FIELDS,
            parts.len()
        )));
    }

    let product_code: i64 = parts[0]
        .parse()
        .map_err(|_| invalid(format!("invalid product code '{}'", parts[0])))?;
    let company_code: i64 = parts[1]
        .parse()
        .map_err(|_| invalid(format!("invalid company code '{}'", parts[1])))?;
    let flag = ReversalFlag::from_flag(parts[2])
        .ok_or_else(|| invalid(format!("unrecognized reversal flag '{}'", parts[2])))?;
    let origin_document = parts[3];

    // Optional amount column; anything unusable falls back to the value policy
    let amount = match parts.get(REQUIRED_FIELDS) {
        Some(raw) if !raw.is_empty() => raw.parse::<Decimal>().unwrap_or_else(|_| {
            debug!("Ignoring unparseable amount '{}' on line {}", raw, line_number);
            values.next_value()
        }),
        _ => values.next_value(),
    };

    Ok(Transaction::new(product_code, company_code, flag, origin_document, amount))
}
