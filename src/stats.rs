use crate::engine::MatchingEngine;
use crate::store::TransactionStore;
use rust_decimal::Decimal;
use serde::Serialize;

/// Summary counts over the current store snapshot
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct Stats {
    pub total_transactions: usize,
    pub total_sales: usize,
    pub total_refunds: usize,
    pub matched_pairs: usize,
    pub unmatched_transactions: usize,
    /// Matched pairs as a percentage of sales
    #[serde(with = "rust_decimal::serde::float")]
    pub match_rate: Decimal,
    /// Refunds as a percentage of sales
    #[serde(with = "rust_decimal::serde::float")]
    pub refund_rate: Decimal,
    /// Sales as a percentage of all transactions
    #[serde(with = "rust_decimal::serde::float")]
    pub sales_share: Decimal,
}

pub fn compute_stats(store: &TransactionStore) -> Stats {
    let result = MatchingEngine::new(store).reconcile();

    let total_transactions = store.size();
    let total_sales = store.entries().filter(|(_, tx)| tx.is_sale()).count();
    let total_refunds = store.entries().filter(|(_, tx)| tx.is_refund()).count();
    let matched_pairs = result.pairs.len();

    Stats {
        total_transactions,
        total_sales,
        total_refunds,
        matched_pairs,
        unmatched_transactions: result.unmatched.len(),
        match_rate: percentage(matched_pairs, total_sales),
        refund_rate: percentage(total_refunds, total_sales),
        sales_share: percentage(total_sales, total_transactions),
    }
}

/// `part / whole * 100` to one decimal place; zero when `whole` is zero
fn percentage(part: usize, whole: usize) -> Decimal {
    if whole == 0 {
        return Decimal::ZERO;
    }

    (Decimal::from(part) * Decimal::ONE_HUNDRED / Decimal::from(whole)).round_dp(1)
}
