use crate::engine::MatchingEngine;
use crate::error::MatcherError;
use crate::processor::{self, ValueGenerator};
use crate::store::TransactionStore;
use csv::Writer;
use rust_decimal::Decimal;
use serde::Serialize;
use std::io::Write;
use std::path::Path;
use std::time::Instant;
use tracing::info;

/// One CSV output row per matched pair
#[derive(Debug, Serialize)]
struct PairRow<'a> {
    invoice: &'a str,
    product: i64,
    company: i64,
    sale_value: Decimal,
    refund_value: Decimal,
}

/// Load a CSV file, match it and write the pairs as CSV to stdout
pub async fn report_file(path: &Path, values: &dyn ValueGenerator) -> Result<(), MatcherError> {
    let start_time = Instant::now();

    let mut store = TransactionStore::new();
    store.extend(processor::load_from_file(path, values).await?);

    info!("Reporting on {} transactions from {:?}", store.size(), path);

    write_report(&store, std::io::stdout())?;
    info!("Report completed in {:.2?}", start_time.elapsed());

    Ok(())
}

/// Write a summary comment followed by the matched pairs
pub fn write_report<W: Write>(store: &TransactionStore, mut out: W) -> Result<(), MatcherError> {
    let result = MatchingEngine::new(store).reconcile();

    writeln!(
        out,
        "# {} transactions, {} matched pairs, {} unmatched",
        store.size(),
        result.pairs.len(),
        result.unmatched.len()
    )?;

    let mut writer = Writer::from_writer(out);
    for pair in &result.pairs {
        writer.serialize(PairRow {
            invoice: &pair.invoice,
            product: pair.sale.product_code(),
            company: pair.sale.company_code(),
            sale_value: pair.sale.amount().round_dp(2),
            refund_value: pair.refund.amount().round_dp(2),
        })?;
    }

    writer.flush()?;

    Ok(())
}
