use rust_decimal::Decimal;
use serde::Serialize;

/// Handle assigned by the store to every appended transaction
pub type TransactionHandle = u64;

/// Sale/refund classification derived from the source reversal flag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReversalFlag {
    Sale,
    Refund,
}

impl ReversalFlag {
    /// Map the source flag character: `F` is a sale, `T` is a refund.
    pub fn from_flag(flag: &str) -> Option<Self> {
        match flag {
            "F" => Some(ReversalFlag::Sale),
            "T" => Some(ReversalFlag::Refund),
            _ => None,
        }
    }

    pub fn as_flag(&self) -> &'static str {
        match self {
            ReversalFlag::Sale => "F",
            ReversalFlag::Refund => "T",
        }
    }
}

/// Composite key that ties a refund back to the sale it reverses
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MatchKey {
    pub product_code: i64,
    pub company_code: i64,
    pub origin_document: String,
}

/// A sale or refund line. Immutable once constructed.
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    product_code: i64,
    company_code: i64,
    flag: ReversalFlag,
    origin_document: String,
    amount: Decimal,
}

impl Transaction {
    pub fn new(
        product_code: i64,
        company_code: i64,
        flag: ReversalFlag,
        origin_document: impl Into<String>,
        amount: Decimal,
    ) -> Self {
        Self {
            product_code,
            company_code,
            flag,
            origin_document: origin_document.into(),
            amount,
        }
    }

    pub fn product_code(&self) -> i64 {
        self.product_code
    }

    pub fn company_code(&self) -> i64 {
        self.company_code
    }

    pub fn flag(&self) -> ReversalFlag {
        self.flag
    }

    pub fn origin_document(&self) -> &str {
        &self.origin_document
    }

    pub fn amount(&self) -> Decimal {
        self.amount
    }

    pub fn is_sale(&self) -> bool {
        self.flag == ReversalFlag::Sale
    }

    pub fn is_refund(&self) -> bool {
        self.flag == ReversalFlag::Refund
    }

    pub fn match_key(&self) -> MatchKey {
        MatchKey {
            product_code: self.product_code,
            company_code: self.company_code,
            origin_document: self.origin_document.clone(),
        }
    }
}

/// One sale and one refund sharing a match key. Derived per query, never stored.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchedPair {
    pub invoice: String,
    pub sale_handle: TransactionHandle,
    pub sale: Transaction,
    pub refund_handle: TransactionHandle,
    pub refund: Transaction,
}

/// JSON shape of a transaction at the HTTP boundary
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TransactionView {
    pub product: i64,
    pub company: i64,
    pub is_reversal: bool,
    #[serde(with = "rust_decimal::serde::float")]
    pub value: Decimal,
}

impl From<&Transaction> for TransactionView {
    fn from(tx: &Transaction) -> Self {
        Self {
            product: tx.product_code(),
            company: tx.company_code(),
            is_reversal: tx.is_refund(),
            value: tx.amount(),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PairTransactionsView {
    pub sale: TransactionView,
    pub refund: TransactionView,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MatchedPairView {
    pub invoice: String,
    pub transaction: PairTransactionsView,
}

impl From<&MatchedPair> for MatchedPairView {
    fn from(pair: &MatchedPair) -> Self {
        Self {
            invoice: pair.invoice.clone(),
            transaction: PairTransactionsView {
                sale: TransactionView::from(&pair.sale),
                refund: TransactionView::from(&pair.refund),
            },
        }
    }
}
