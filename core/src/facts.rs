//! Read-only fact rows loaded from the transaction store.
//!
//! Numeric NULLs are coerced to 0 at load time; a NULL
//! amount_before_discount coerces to the net amount (no discount).
//! The engine treats facts as an immutable snapshot for the whole run.

use crate::types::{CustomerId, ProductId};
use chrono::NaiveDateTime;
use std::collections::BTreeMap;

/// One receipt header, with line quantities pre-summed.
#[derive(Debug, Clone)]
pub struct TransactionFact {
    pub id: String,
    pub customer_id: Option<CustomerId>,
    pub date: NaiveDateTime,
    pub amount: f64,
    pub amount_before_discount: f64,
    pub items_count: f64,
}

impl TransactionFact {
    /// Discount share of the pre-discount amount, in percent.
    pub fn discount_pct(&self) -> f64 {
        if self.amount_before_discount > 0.0 {
            100.0 * (self.amount_before_discount - self.amount) / self.amount_before_discount
        } else {
            0.0
        }
    }

    pub fn is_discounted(&self) -> bool {
        self.amount < self.amount_before_discount
    }
}

/// One receipt line, joined to its product and header.
#[derive(Debug, Clone)]
pub struct TransactionLineFact {
    pub transaction_id: String,
    pub customer_id: Option<CustomerId>,
    pub date: NaiveDateTime,
    pub product_id: ProductId,
    pub product_name: String,
    pub category: Option<String>,
    pub quantity: f64,
    pub price: f64,
    pub price_before_discount: f64,
    pub discount_id: Option<String>,
}

impl TransactionLineFact {
    pub fn revenue(&self) -> f64 {
        self.quantity * self.price
    }

    pub fn revenue_before_discount(&self) -> f64 {
        self.quantity * self.price_before_discount
    }

    /// Category label with the NULL bucket folded in.
    pub fn category_label(&self) -> &str {
        self.category.as_deref().unwrap_or(UNCATEGORIZED)
    }
}

/// Bucket label for lines whose product has no classified category.
pub const UNCATEGORIZED: &str = "Uncategorized";

/// Group transactions by identified customer, ordered by customer id.
/// Guest checkouts (no customer id) are excluded. Within a customer,
/// transactions are ordered by date, then id for a stable total order.
pub fn group_by_customer(
    facts: &[TransactionFact],
) -> BTreeMap<CustomerId, Vec<&TransactionFact>> {
    let mut grouped: BTreeMap<CustomerId, Vec<&TransactionFact>> = BTreeMap::new();
    for fact in facts {
        if let Some(customer_id) = &fact.customer_id {
            grouped.entry(customer_id.clone()).or_default().push(fact);
        }
    }
    for transactions in grouped.values_mut() {
        transactions.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.id.cmp(&b.id)));
    }
    grouped
}
