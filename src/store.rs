use crate::models::{Transaction, TransactionHandle};
use std::collections::BTreeMap;

/// In-memory store for all loaded transactions
#[derive(Debug, Default)]
pub struct TransactionStore {
    transactions: BTreeMap<TransactionHandle, Transaction>,
    counter: TransactionHandle,
}

impl TransactionStore {
    pub fn new() -> Self {
        Self {
            transactions: BTreeMap::new(),
            counter: 0,
        }
    }

    /// Store a transaction under the next handle. Duplicates are accepted.
    pub fn append(&mut self, tx: Transaction) -> TransactionHandle {
        self.counter += 1;
        self.transactions.insert(self.counter, tx);
        self.counter
    }

    /// Append every transaction in order, returning how many were stored
    pub fn extend<I>(&mut self, transactions: I) -> usize
    where
        I: IntoIterator<Item = Transaction>,
    {
        transactions.into_iter().map(|tx| self.append(tx)).count()
    }

    /// Drop all transactions and reset the handle counter
    pub fn clear(&mut self) {
        self.transactions.clear();
        self.counter = 0;
    }

    /// Clear the store and bulk-insert a fresh set of transactions
    pub fn replace(&mut self, transactions: Vec<Transaction>) -> usize {
        self.clear();
        self.extend(transactions)
    }

    pub fn all(&self) -> Vec<&Transaction> {
        self.transactions.values().collect()
    }

    /// Every stored transaction with its handle, in insertion order
    pub fn entries(&self) -> impl Iterator<Item = (TransactionHandle, &Transaction)> {
        self.transactions.iter().map(|(handle, tx)| (*handle, tx))
    }

    pub fn get(&self, handle: TransactionHandle) -> Option<&Transaction> {
        self.transactions.get(&handle)
    }

    pub fn size(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }
}
