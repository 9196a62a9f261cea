use crate::models::{MatchKey, MatchedPair, Transaction, TransactionHandle};
use crate::store::TransactionStore;
use std::collections::{HashMap, HashSet};
use tracing::debug;

type Entry<'a> = (TransactionHandle, &'a Transaction);

/// Transactions sharing a match key, keyed in order of first appearance
#[derive(Default)]
struct KeyGroups<'a> {
    order: Vec<MatchKey>,
    groups: HashMap<MatchKey, Vec<Entry<'a>>>,
}

impl<'a> KeyGroups<'a> {
    fn push(&mut self, entry: Entry<'a>) {
        let key = entry.1.match_key();
        match self.groups.get_mut(&key) {
            Some(group) => group.push(entry),
            None => {
                self.order.push(key.clone());
                self.groups.insert(key, vec![entry]);
            }
        }
    }

    fn get(&self, key: &MatchKey) -> &[Entry<'a>] {
        self.groups.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    fn iter(&self) -> impl Iterator<Item = (&MatchKey, &[Entry<'a>])> {
        self.order.iter().map(move |key| (key, self.get(key)))
    }
}

/// Matched pairs and the leftover transactions from a single pass
#[derive(Debug, Clone, PartialEq)]
pub struct Reconciliation<'a> {
    pub pairs: Vec<MatchedPair>,
    pub unmatched: Vec<&'a Transaction>,
}

/// Read-only matcher over a store snapshot
pub struct MatchingEngine<'a> {
    store: &'a TransactionStore,
}

impl<'a> MatchingEngine<'a> {
    pub fn new(store: &'a TransactionStore) -> Self {
        Self { store }
    }

    /// Pair every sale with a refund of the same key, positionally by insertion order
    pub fn find_matched_pairs(&self) -> Vec<MatchedPair> {
        let (sales, refunds) = self.partition();

        let mut pairs = Vec::new();
        for (key, sale_group) in sales.iter() {
            let refund_group = refunds.get(key);

            // i-th sale with i-th refund; the longer side's surplus stays unpaired
            let paired = sale_group.len().min(refund_group.len());
            for i in 0..paired {
                let (sale_handle, sale) = sale_group[i];
                let (refund_handle, refund) = refund_group[i];

                pairs.push(MatchedPair {
                    invoice: sale.origin_document().to_string(),
                    sale_handle,
                    sale: sale.clone(),
                    refund_handle,
                    refund: refund.clone(),
                });
            }
        }

        debug!(
            "Matched {} pairs across {} sale keys",
            pairs.len(),
            sales.order.len()
        );

        pairs
    }

    /// Every stored transaction that is not part of a matched pair
    pub fn find_unmatched(&self) -> Vec<&'a Transaction> {
        let pairs = self.find_matched_pairs();
        self.unmatched_given(&pairs)
    }

    /// Pairs and unmatched transactions computed from one matching pass
    pub fn reconcile(&self) -> Reconciliation<'a> {
        let pairs = self.find_matched_pairs();
        let unmatched = self.unmatched_given(&pairs);
        Reconciliation { pairs, unmatched }
    }

    fn unmatched_given(&self, pairs: &[MatchedPair]) -> Vec<&'a Transaction> {
        let matched: HashSet<TransactionHandle> = pairs
            .iter()
            .flat_map(|pair| [pair.sale_handle, pair.refund_handle])
            .collect();

        self.store
            .entries()
            .filter(|(handle, _)| !matched.contains(handle))
            .map(|(_, tx)| tx)
            .collect()
    }

    /// Split the store into sale and refund groups keyed by match key
    fn partition(&self) -> (KeyGroups<'a>, KeyGroups<'a>) {
        let mut sales = KeyGroups::default();
        let mut refunds = KeyGroups::default();

        for entry in self.store.entries() {
            if entry.1.is_sale() {
                sales.push(entry);
            } else {
                refunds.push(entry);
            }
        }

        (sales, refunds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ReversalFlag;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    // Helper function to create a sale transaction
    fn create_sale(product: i64, company: i64, document: &str, amount: Decimal) -> Transaction {
        Transaction::new(product, company, ReversalFlag::Sale, document, amount)
    }

    // Helper function to create a refund transaction
    fn create_refund(product: i64, company: i64, document: &str, amount: Decimal) -> Transaction {
        Transaction::new(product, company, ReversalFlag::Refund, document, amount)
    }

    fn store_with(transactions: Vec<Transaction>) -> TransactionStore {
        let mut store = TransactionStore::new();
        store.extend(transactions);
        store
    }

    #[test]
    fn test_empty_store() {
        let store = TransactionStore::new();
        let engine = MatchingEngine::new(&store);

        assert!(engine.find_matched_pairs().is_empty());
        assert!(engine.find_unmatched().is_empty());
    }

    #[test]
    fn test_single_pair() {
        let store = store_with(vec![
            create_sale(200, 3, "33333", dec!(40)),
            create_refund(200, 3, "33333", dec!(40)),
        ]);
        let engine = MatchingEngine::new(&store);

        let pairs = engine.find_matched_pairs();
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].invoice, "33333");
        assert_eq!(pairs[0].sale.product_code(), 200);
        assert_eq!(pairs[0].sale.company_code(), 3);
        assert!(pairs[0].sale.is_sale());
        assert!(pairs[0].refund.is_refund());
        assert_eq!(pairs[0].sale_handle, 1);
        assert_eq!(pairs[0].refund_handle, 2);

        assert!(engine.find_unmatched().is_empty());
    }

    #[test]
    fn test_surplus_sale_is_unmatched() {
        let store = store_with(vec![
            create_sale(200, 3, "A", dec!(10)),
            create_sale(200, 3, "A", dec!(20)),
            create_refund(200, 3, "A", dec!(30)),
        ]);
        let engine = MatchingEngine::new(&store);

        let pairs = engine.find_matched_pairs();
        assert_eq!(pairs.len(), 1);
        // First sale by insertion order takes the refund
        assert_eq!(pairs[0].sale.amount(), dec!(10));

        let unmatched = engine.find_unmatched();
        assert_eq!(unmatched.len(), 1);
        assert!(unmatched[0].is_sale());
        assert_eq!(unmatched[0].amount(), dec!(20));
    }

    #[test]
    fn test_surplus_refunds_are_unmatched() {
        let store = store_with(vec![
            create_refund(300, 2, "B", dec!(1)),
            create_sale(300, 2, "B", dec!(2)),
            create_refund(300, 2, "B", dec!(3)),
            create_refund(300, 2, "B", dec!(4)),
        ]);
        let engine = MatchingEngine::new(&store);

        let pairs = engine.find_matched_pairs();
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].refund.amount(), dec!(1));

        let unmatched: Vec<Decimal> = engine.find_unmatched().iter().map(|tx| tx.amount()).collect();
        assert_eq!(unmatched, vec![dec!(3), dec!(4)]);
    }

    #[test]
    fn test_positional_pairing_bound() {
        for (m, n) in [(0, 3), (3, 0), (2, 5), (5, 2), (4, 4)] {
            let mut transactions = Vec::new();
            for i in 0..m {
                transactions.push(create_sale(1, 1, "K", Decimal::from(i)));
            }
            for i in 0..n {
                transactions.push(create_refund(1, 1, "K", Decimal::from(i)));
            }
            let store = store_with(transactions);
            let engine = MatchingEngine::new(&store);

            assert_eq!(engine.find_matched_pairs().len(), m.min(n));
            assert_eq!(engine.find_unmatched().len(), m.abs_diff(n));
        }
    }

    #[test]
    fn test_key_components_must_all_match() {
        let store = store_with(vec![
            create_sale(200, 3, "X", dec!(10)),
            create_refund(201, 3, "X", dec!(10)),
            create_refund(200, 4, "X", dec!(10)),
            create_refund(200, 3, "Y", dec!(10)),
        ]);
        let engine = MatchingEngine::new(&store);

        assert!(engine.find_matched_pairs().is_empty());
        assert_eq!(engine.find_unmatched().len(), 4);
    }

    #[test]
    fn test_multiple_keys() {
        let store = store_with(vec![
            create_sale(200, 3, "33333", dec!(40)),
            create_sale(300, 2, "44444", dec!(20)),
            create_refund(300, 2, "44444", dec!(20)),
            create_refund(200, 3, "33333", dec!(40)),
            create_sale(500, 1, "55555", dec!(70)),
        ]);
        let engine = MatchingEngine::new(&store);

        let pairs = engine.find_matched_pairs();
        let invoices: Vec<&str> = pairs.iter().map(|pair| pair.invoice.as_str()).collect();
        // Keys are visited in order of the first sale seen
        assert_eq!(invoices, vec!["33333", "44444"]);

        let unmatched = engine.find_unmatched();
        assert_eq!(unmatched.len(), 1);
        assert_eq!(unmatched[0].origin_document(), "55555");
    }

    #[test]
    fn test_matching_is_deterministic() {
        let store = store_with(vec![
            create_sale(1, 1, "A", dec!(1)),
            create_refund(1, 1, "A", dec!(2)),
            create_sale(2, 1, "B", dec!(3)),
            create_sale(2, 1, "B", dec!(4)),
            create_refund(2, 1, "B", dec!(5)),
            create_refund(3, 1, "C", dec!(6)),
        ]);
        let engine = MatchingEngine::new(&store);

        assert_eq!(engine.find_matched_pairs(), engine.find_matched_pairs());
        assert_eq!(engine.find_unmatched(), engine.find_unmatched());
    }

    #[test]
    fn test_every_transaction_in_exactly_one_partition() {
        let store = store_with(vec![
            create_sale(1, 1, "A", dec!(1)),
            create_sale(1, 1, "A", dec!(1)),
            create_refund(1, 1, "A", dec!(1)),
            create_refund(2, 2, "B", dec!(1)),
            create_refund(2, 2, "B", dec!(1)),
            create_sale(2, 2, "B", dec!(1)),
            create_sale(3, 3, "C", dec!(1)),
        ]);
        let engine = MatchingEngine::new(&store);

        let result = engine.reconcile();
        let mut seen: Vec<TransactionHandle> = result
            .pairs
            .iter()
            .flat_map(|pair| [pair.sale_handle, pair.refund_handle])
            .collect();
        let matched_count = seen.len();
        seen.sort_unstable();
        seen.dedup();
        assert_eq!(seen.len(), matched_count, "a transaction was paired twice");

        assert_eq!(matched_count + result.unmatched.len(), store.size());
        assert_eq!(result.pairs, engine.find_matched_pairs());
        assert_eq!(result.unmatched, engine.find_unmatched());
    }
}
