use crate::engine::MatchingEngine;
use crate::error::MatcherError;
use crate::models::{MatchedPair, ReversalFlag, Transaction, TransactionHandle};
use crate::processor::{self, RandomValueGenerator, ValueGenerator};
use crate::stats::{compute_stats, Stats};
use crate::store::TransactionStore;
use rust_decimal_macros::dec;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{error, info};

/// Outcome of a successful CSV reload
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct LoadSummary {
    pub count: usize,
    pub message: String,
}

/// Owns the transaction store and serves matching queries over it
pub struct SalesRefundApp {
    store: RwLock<TransactionStore>,
    values: Arc<dyn ValueGenerator>,
    started_at: Instant,
}

impl SalesRefundApp {
    pub fn new(values: Arc<dyn ValueGenerator>) -> Self {
        Self {
            store: RwLock::new(TransactionStore::new()),
            values,
            started_at: Instant::now(),
        }
    }

    /// App seeded with the demo transactions, random placeholder amounts for CSV rows
    pub fn with_sample_data() -> Self {
        let mut store = TransactionStore::new();
        store.extend(sample_transactions());
        info!("Store initialized with {} sample transactions", store.size());

        Self {
            store: RwLock::new(store),
            values: Arc::new(RandomValueGenerator),
            started_at: Instant::now(),
        }
    }

    /// Replace the store's contents with the transactions in `path`.
    ///
    /// The file is parsed before the store is touched, so a failed load keeps
    /// the previous transactions.
    pub async fn load_from_csv_file(&self, path: &Path) -> Result<LoadSummary, MatcherError> {
        let transactions = match processor::load_from_file(path, self.values.as_ref()).await {
            Ok(transactions) => transactions,
            Err(e) => {
                error!("CSV reload failed, keeping current transactions: {}", e);
                return Err(e);
            }
        };

        let count = self.store.write().await.replace(transactions);

        info!("Loaded {} transactions from CSV: {:?}", count, path);
        Ok(LoadSummary {
            count,
            message: format!("{} transactions loaded successfully", count),
        })
    }

    pub async fn append(&self, transaction: Transaction) -> TransactionHandle {
        self.store.write().await.append(transaction)
    }

    pub async fn matched_pairs(&self) -> Vec<MatchedPair> {
        let store = self.store.read().await;
        MatchingEngine::new(&store).find_matched_pairs()
    }

    pub async fn unmatched(&self) -> Vec<Transaction> {
        let store = self.store.read().await;
        MatchingEngine::new(&store)
            .find_unmatched()
            .into_iter()
            .cloned()
            .collect()
    }

    pub async fn stats(&self) -> Stats {
        let store = self.store.read().await;
        compute_stats(&store)
    }

    pub async fn size(&self) -> usize {
        self.store.read().await.size()
    }

    pub fn uptime(&self) -> Duration {
        self.started_at.elapsed()
    }
}

fn sample_transactions() -> Vec<Transaction> {
    vec![
        Transaction::new(200, 3, ReversalFlag::Sale, "33333", dec!(40)),
        Transaction::new(200, 3, ReversalFlag::Refund, "33333", dec!(40)),
        Transaction::new(300, 2, ReversalFlag::Sale, "44444", dec!(20)),
        Transaction::new(300, 2, ReversalFlag::Refund, "44444", dec!(20)),
    ]
}
