//! Tenant-wide discount analytics.
//!
//! Header-level recipes work on receipt amounts before/after discount;
//! line-level recipes compare unit prices against their pre-discount
//! counterparts. All recipes are pure functions over the fact snapshot.

use crate::{
    calendar::{month_floor, month_floor_date, shift_months},
    config::EngineConfig,
    facts::{TransactionFact, TransactionLineFact},
    stats,
    types::CustomerId,
};
use chrono::NaiveDateTime;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

const PRODUCT_DISCOUNT_LIMIT: usize = 50;
const DISCOUNT_TREND_MONTHS: i32 = 12;

// ── Overall stats ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct OverallDiscountStats {
    pub total_transactions: i64,
    pub discounted_transactions: i64,
    pub discount_rate: f64,
    pub total_revenue: f64,
    pub total_revenue_before_discount: f64,
    pub total_discount_amount: f64,
    pub avg_discount_pct: f64,
    pub max_discount_pct: f64,
    pub discount_to_revenue_ratio: f64,
}

pub fn overall_stats(transactions: &[TransactionFact]) -> OverallDiscountStats {
    let total = transactions.len() as i64;
    let discounted = transactions.iter().filter(|t| t.is_discounted()).count() as i64;
    let revenue: f64 = transactions.iter().map(|t| t.amount).sum();
    let revenue_before: f64 = transactions.iter().map(|t| t.amount_before_discount).sum();
    let discount_amount = revenue_before - revenue;
    let pcts: Vec<f64> = transactions.iter().map(|t| t.discount_pct()).collect();

    OverallDiscountStats {
        total_transactions: total,
        discounted_transactions: discounted,
        discount_rate: stats::round2(100.0 * discounted as f64 / total.max(1) as f64),
        total_revenue: revenue,
        total_revenue_before_discount: revenue_before,
        total_discount_amount: discount_amount,
        avg_discount_pct: stats::round2(stats::mean(&pcts)),
        max_discount_pct: stats::round2(pcts.iter().cloned().fold(0.0, f64::max)),
        discount_to_revenue_ratio: stats::round2(
            100.0 * discount_amount / if revenue > 0.0 { revenue } else { 1.0 },
        ),
    }
}

// ── By category ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct CategoryDiscount {
    pub category: String,
    pub total_items: i64,
    pub discounted_items: i64,
    pub discount_item_rate: f64,
    pub revenue: f64,
    pub discount_amount: f64,
    pub avg_discount_pct: f64,
}

pub fn by_category(lines: &[TransactionLineFact]) -> Vec<CategoryDiscount> {
    struct Acc {
        total_items: i64,
        discounted_items: i64,
        revenue: f64,
        revenue_before: f64,
    }

    let mut by_category: BTreeMap<&str, Acc> = BTreeMap::new();
    for line in lines {
        let acc = by_category.entry(line.category_label()).or_insert(Acc {
            total_items: 0,
            discounted_items: 0,
            revenue: 0.0,
            revenue_before: 0.0,
        });
        acc.total_items += 1;
        if line.price < line.price_before_discount {
            acc.discounted_items += 1;
        }
        acc.revenue += line.revenue();
        acc.revenue_before += line.revenue_before_discount();
    }

    let mut rows: Vec<CategoryDiscount> = by_category
        .into_iter()
        .map(|(category, acc)| {
            let discount_amount = acc.revenue_before - acc.revenue;
            CategoryDiscount {
                category: category.to_string(),
                total_items: acc.total_items,
                discounted_items: acc.discounted_items,
                discount_item_rate: stats::round2(
                    100.0 * acc.discounted_items as f64 / acc.total_items.max(1) as f64,
                ),
                revenue: acc.revenue,
                discount_amount,
                avg_discount_pct: if acc.revenue_before > 0.0 {
                    stats::round2(100.0 * discount_amount / acc.revenue_before)
                } else {
                    0.0
                },
            }
        })
        .collect();

    rows.sort_by(|a, b| {
        b.discount_amount
            .partial_cmp(&a.discount_amount)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.category.cmp(&b.category))
    });
    rows
}

// ── By customer segment ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct SegmentDiscount {
    pub segment: String,
    pub customers: i64,
    pub transactions: i64,
    pub discounted_transactions: i64,
    pub discount_rate: f64,
    pub revenue: f64,
    pub discount_amount: f64,
    pub avg_check: f64,
    pub avg_discount_pct: f64,
}

/// Discount uptake per RFM segment. Customers without a stored segment
/// fall into "Undetermined"; guest checkouts are excluded.
pub fn by_customer_segment(
    transactions: &[TransactionFact],
    segments: &BTreeMap<CustomerId, String>,
) -> Vec<SegmentDiscount> {
    struct Acc {
        customers: BTreeSet<String>,
        transactions: i64,
        discounted: i64,
        revenue: f64,
        discount_amount: f64,
    }

    let mut by_segment: BTreeMap<String, Acc> = BTreeMap::new();
    for txn in transactions {
        let Some(customer_id) = &txn.customer_id else { continue };
        let segment = segments
            .get(customer_id)
            .cloned()
            .unwrap_or_else(|| "Undetermined".to_string());
        let acc = by_segment.entry(segment).or_insert_with(|| Acc {
            customers: BTreeSet::new(),
            transactions: 0,
            discounted: 0,
            revenue: 0.0,
            discount_amount: 0.0,
        });
        acc.customers.insert(customer_id.clone());
        acc.transactions += 1;
        if txn.is_discounted() {
            acc.discounted += 1;
        }
        acc.revenue += txn.amount;
        acc.discount_amount += txn.amount_before_discount - txn.amount;
    }

    by_segment
        .into_iter()
        .map(|(segment, acc)| {
            let gross = acc.revenue + acc.discount_amount;
            SegmentDiscount {
                segment,
                customers: acc.customers.len() as i64,
                transactions: acc.transactions,
                discounted_transactions: acc.discounted,
                discount_rate: stats::round2(
                    100.0 * acc.discounted as f64 / acc.transactions.max(1) as f64,
                ),
                revenue: acc.revenue,
                discount_amount: acc.discount_amount,
                avg_check: stats::round2(acc.revenue / acc.transactions.max(1) as f64),
                avg_discount_pct: if gross > 0.0 {
                    stats::round2(100.0 * acc.discount_amount / gross)
                } else {
                    0.0
                },
            }
        })
        .collect()
}

// ── Discount depth brackets ──────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct DiscountBracket {
    pub bracket: String,
    pub transactions: i64,
    pub revenue: f64,
    pub discount_amount: f64,
    pub avg_check: f64,
    pub avg_discount_pct: f64,
}

const BRACKETS: [(&str, f64); 8] = [
    ("0% (no discount)", 0.0),
    ("1-5%", 5.0),
    ("6-10%", 10.0),
    ("11-15%", 15.0),
    ("16-20%", 20.0),
    ("21-30%", 30.0),
    ("31-50%", 50.0),
    ("50%+", f64::INFINITY),
];

fn bracket_index(discount_pct: f64) -> usize {
    if discount_pct == 0.0 {
        return 0;
    }
    BRACKETS
        .iter()
        .position(|(_, upper)| discount_pct <= *upper)
        .unwrap_or(BRACKETS.len() - 1)
        .max(1)
}

pub fn discount_brackets(transactions: &[TransactionFact]) -> Vec<DiscountBracket> {
    let mut txn_counts = [0i64; BRACKETS.len()];
    let mut revenues = [0.0f64; BRACKETS.len()];
    let mut discounts = [0.0f64; BRACKETS.len()];
    let mut pct_sums = [0.0f64; BRACKETS.len()];

    for txn in transactions {
        let pct = txn.discount_pct();
        let idx = bracket_index(pct);
        txn_counts[idx] += 1;
        revenues[idx] += txn.amount;
        discounts[idx] += txn.amount_before_discount - txn.amount;
        pct_sums[idx] += pct;
    }

    BRACKETS
        .iter()
        .enumerate()
        .filter(|(idx, _)| txn_counts[*idx] > 0)
        .map(|(idx, (label, _))| DiscountBracket {
            bracket: label.to_string(),
            transactions: txn_counts[idx],
            revenue: revenues[idx],
            discount_amount: discounts[idx],
            avg_check: stats::round2(revenues[idx] / txn_counts[idx] as f64),
            avg_discount_pct: stats::round2(pct_sums[idx] / txn_counts[idx] as f64),
        })
        .collect()
}

// ── Monthly trends ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct DiscountTrend {
    pub month: String,
    pub transactions: i64,
    pub discounted_transactions: i64,
    pub discount_rate: f64,
    pub revenue: f64,
    pub discount_amount: f64,
    pub avg_discount_pct: f64,
}

pub fn discount_trends(
    transactions: &[TransactionFact],
    config: &EngineConfig,
) -> Vec<DiscountTrend> {
    let cutoff = shift_months(month_floor_date(config.today), -DISCOUNT_TREND_MONTHS);

    struct Acc {
        transactions: i64,
        discounted: i64,
        revenue: f64,
        revenue_before: f64,
    }

    let mut by_month: BTreeMap<String, Acc> = BTreeMap::new();
    for txn in transactions {
        let month = month_floor(txn.date);
        if month < cutoff {
            continue;
        }
        let acc = by_month.entry(month.format("%Y-%m").to_string()).or_insert(Acc {
            transactions: 0,
            discounted: 0,
            revenue: 0.0,
            revenue_before: 0.0,
        });
        acc.transactions += 1;
        if txn.is_discounted() {
            acc.discounted += 1;
        }
        acc.revenue += txn.amount;
        acc.revenue_before += txn.amount_before_discount;
    }

    by_month
        .into_iter()
        .map(|(month, acc)| {
            let discount_amount = acc.revenue_before - acc.revenue;
            DiscountTrend {
                month,
                transactions: acc.transactions,
                discounted_transactions: acc.discounted,
                discount_rate: stats::round2(
                    100.0 * acc.discounted as f64 / acc.transactions.max(1) as f64,
                ),
                revenue: acc.revenue,
                discount_amount,
                avg_discount_pct: if acc.revenue_before > 0.0 {
                    stats::round2(100.0 * discount_amount / acc.revenue_before)
                } else {
                    0.0
                },
            }
        })
        .collect()
}

// ── Effectiveness: discounted vs full price ──────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct PriceGroupStats {
    pub transactions: i64,
    pub customers: i64,
    pub avg_check: f64,
    pub avg_items: f64,
    pub total_revenue: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct DiscountEffectiveness {
    pub discounted: PriceGroupStats,
    pub full_price: PriceGroupStats,
    pub check_lift_pct: f64,
    pub items_lift_pct: f64,
}

fn group_stats<'a>(txns: impl Iterator<Item = &'a TransactionFact>) -> PriceGroupStats {
    let mut customers = BTreeSet::new();
    let mut count = 0i64;
    let mut revenue = 0.0;
    let mut items = 0.0;
    for txn in txns {
        count += 1;
        revenue += txn.amount;
        items += txn.items_count;
        if let Some(customer) = &txn.customer_id {
            customers.insert(customer.clone());
        }
    }
    PriceGroupStats {
        transactions: count,
        customers: customers.len() as i64,
        avg_check: if count > 0 { stats::round2(revenue / count as f64) } else { 0.0 },
        avg_items: if count > 0 { stats::round2(items / count as f64) } else { 0.0 },
        total_revenue: revenue,
    }
}

/// Compare the discounted basket against the full-price basket. Lifts
/// are 0 when the full-price side is empty.
pub fn discount_effectiveness(transactions: &[TransactionFact]) -> DiscountEffectiveness {
    let discounted = group_stats(transactions.iter().filter(|t| t.is_discounted()));
    let full_price = group_stats(transactions.iter().filter(|t| !t.is_discounted()));

    let check_lift_pct = if full_price.avg_check > 0.0 {
        stats::round2(100.0 * (discounted.avg_check - full_price.avg_check) / full_price.avg_check)
    } else {
        0.0
    };
    let items_lift_pct = if full_price.avg_items > 0.0 {
        stats::round2(100.0 * (discounted.avg_items - full_price.avg_items) / full_price.avg_items)
    } else {
        0.0
    };

    DiscountEffectiveness { discounted, full_price, check_lift_pct, items_lift_pct }
}

// ── Customer discount behavior ───────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct DiscountBehaviorBucket {
    pub behavior: String,
    pub customers: i64,
    pub avg_transactions: f64,
    pub total_revenue: f64,
    pub total_discount_amount: f64,
}

const BEHAVIOR_BUCKETS: [&str; 5] = [
    "Never uses discounts",
    "Rare (< 25%)",
    "Sometimes (25-50%)",
    "Often (50-75%)",
    "Always (75%+)",
];

fn behavior_bucket(discount_share: f64) -> usize {
    if discount_share == 0.0 {
        0
    } else if discount_share < 0.25 {
        1
    } else if discount_share < 0.50 {
        2
    } else if discount_share < 0.75 {
        3
    } else {
        4
    }
}

/// Bucket identified customers by the share of their orders that
/// carried any discount.
pub fn customer_discount_behavior(
    transactions: &[TransactionFact],
) -> Vec<DiscountBehaviorBucket> {
    struct Customer {
        orders: i64,
        discounted: i64,
        revenue: f64,
        discount_amount: f64,
    }

    let mut by_customer: BTreeMap<&str, Customer> = BTreeMap::new();
    for txn in transactions {
        let Some(customer_id) = txn.customer_id.as_deref() else { continue };
        let acc = by_customer.entry(customer_id).or_insert(Customer {
            orders: 0,
            discounted: 0,
            revenue: 0.0,
            discount_amount: 0.0,
        });
        acc.orders += 1;
        if txn.is_discounted() {
            acc.discounted += 1;
        }
        acc.revenue += txn.amount;
        acc.discount_amount += txn.amount_before_discount - txn.amount;
    }

    let mut customer_counts = [0i64; BEHAVIOR_BUCKETS.len()];
    let mut order_totals = [0i64; BEHAVIOR_BUCKETS.len()];
    let mut revenues = [0.0f64; BEHAVIOR_BUCKETS.len()];
    let mut discounts = [0.0f64; BEHAVIOR_BUCKETS.len()];

    for customer in by_customer.values() {
        let share = customer.discounted as f64 / customer.orders.max(1) as f64;
        let idx = behavior_bucket(share);
        customer_counts[idx] += 1;
        order_totals[idx] += customer.orders;
        revenues[idx] += customer.revenue;
        discounts[idx] += customer.discount_amount;
    }

    BEHAVIOR_BUCKETS
        .iter()
        .enumerate()
        .filter(|(idx, _)| customer_counts[*idx] > 0)
        .map(|(idx, label)| DiscountBehaviorBucket {
            behavior: label.to_string(),
            customers: customer_counts[idx],
            avg_transactions: stats::round1(
                order_totals[idx] as f64 / customer_counts[idx] as f64,
            ),
            total_revenue: revenues[idx],
            total_discount_amount: discounts[idx],
        })
        .collect()
}

// ── Product discount analysis ────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct ProductDiscount {
    pub product_id: String,
    pub name: String,
    pub category: Option<String>,
    pub total_qty: f64,
    pub revenue: f64,
    pub discount_amount: f64,
    pub avg_discount_pct: f64,
}

/// Products ranked by total discount given away; only discounted
/// products are listed.
pub fn product_discount_analysis(lines: &[TransactionLineFact]) -> Vec<ProductDiscount> {
    struct Acc<'a> {
        name: &'a str,
        category: Option<&'a str>,
        qty: f64,
        revenue: f64,
        revenue_before: f64,
    }

    let mut by_product: BTreeMap<&str, Acc> = BTreeMap::new();
    for line in lines {
        let acc = by_product.entry(line.product_id.as_str()).or_insert_with(|| Acc {
            name: &line.product_name,
            category: line.category.as_deref(),
            qty: 0.0,
            revenue: 0.0,
            revenue_before: 0.0,
        });
        acc.qty += line.quantity;
        acc.revenue += line.revenue();
        acc.revenue_before += line.revenue_before_discount();
    }

    let mut rows: Vec<ProductDiscount> = by_product
        .into_iter()
        .filter(|(_, acc)| acc.revenue_before - acc.revenue > 0.0)
        .map(|(product_id, acc)| {
            let discount_amount = acc.revenue_before - acc.revenue;
            ProductDiscount {
                product_id: product_id.to_string(),
                name: acc.name.to_string(),
                category: acc.category.map(String::from),
                total_qty: acc.qty,
                revenue: acc.revenue,
                discount_amount,
                avg_discount_pct: if acc.revenue_before > 0.0 {
                    stats::round2(100.0 * discount_amount / acc.revenue_before)
                } else {
                    0.0
                },
            }
        })
        .collect();

    rows.sort_by(|a, b| {
        b.discount_amount
            .partial_cmp(&a.discount_amount)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.product_id.cmp(&b.product_id))
    });
    rows.truncate(PRODUCT_DISCOUNT_LIMIT);
    rows
}

// ── Margin impact ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct MarginImpact {
    pub assumed_margin_pct: f64,
    pub revenue: f64,
    pub revenue_before_discount: f64,
    pub total_discount_amount: f64,
    pub estimated_margin_before: f64,
    pub estimated_margin_after: f64,
    pub margin_erosion: f64,
    pub margin_erosion_pct: f64,
    pub effective_margin_pct: f64,
}

/// Discount erosion against an assumed flat gross margin. Discounts
/// come straight out of margin, so erosion equals the discount amount.
pub fn margin_impact(transactions: &[TransactionFact], config: &EngineConfig) -> MarginImpact {
    let revenue: f64 = transactions.iter().map(|t| t.amount).sum();
    let revenue_before: f64 = transactions.iter().map(|t| t.amount_before_discount).sum();
    let discount_amount = revenue_before - revenue;
    let pct = config.assumed_margin_pct;

    let margin_before = revenue_before * pct / 100.0;
    let margin_after = revenue * pct / 100.0 - discount_amount;
    let erosion = margin_before - margin_after;

    MarginImpact {
        assumed_margin_pct: pct,
        revenue,
        revenue_before_discount: revenue_before,
        total_discount_amount: discount_amount,
        estimated_margin_before: margin_before,
        estimated_margin_after: margin_after,
        margin_erosion: erosion,
        margin_erosion_pct: if margin_before > 0.0 {
            stats::round2(100.0 * erosion / margin_before)
        } else {
            0.0
        },
        effective_margin_pct: if revenue > 0.0 {
            stats::round2(100.0 * margin_after / revenue)
        } else {
            0.0
        },
    }
}

// ── Cannibalization ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Cannibalization {
    InsufficientData { status: String },
    Measured(CannibalizationStats),
}

#[derive(Debug, Clone, Serialize)]
pub struct CannibalizationStats {
    pub customers_analyzed: i64,
    pub avg_check_before: f64,
    pub avg_check_after: f64,
    pub avg_check_change_pct: f64,
    pub avg_orders_before: f64,
    pub avg_orders_after: f64,
    pub avg_orders_change_pct: f64,
}

/// Compare each customer's behavior before and after their first
/// discounted order. Customers with no full-price history before that
/// point are skipped; with no eligible customers the blob carries an
/// insufficient-data marker instead of zeros.
pub fn cannibalization(transactions: &[TransactionFact]) -> Cannibalization {
    let mut first_discount: BTreeMap<&str, NaiveDateTime> = BTreeMap::new();
    for txn in transactions {
        if !txn.is_discounted() {
            continue;
        }
        let Some(customer_id) = txn.customer_id.as_deref() else { continue };
        first_discount
            .entry(customer_id)
            .and_modify(|d| *d = (*d).min(txn.date))
            .or_insert(txn.date);
    }

    let mut check_before = Vec::new();
    let mut check_after = Vec::new();
    let mut orders_before = Vec::new();
    let mut orders_after = Vec::new();

    for (customer_id, pivot) in &first_discount {
        let mut before_amounts = Vec::new();
        let mut after_amounts = Vec::new();
        for txn in transactions {
            if txn.customer_id.as_deref() != Some(customer_id) {
                continue;
            }
            if txn.date < *pivot {
                before_amounts.push(txn.amount);
            } else {
                after_amounts.push(txn.amount);
            }
        }
        if before_amounts.is_empty() {
            continue;
        }
        check_before.push(stats::mean(&before_amounts));
        check_after.push(stats::mean(&after_amounts));
        orders_before.push(before_amounts.len() as f64);
        orders_after.push(after_amounts.len() as f64);
    }

    if check_before.is_empty() {
        return Cannibalization::InsufficientData { status: "insufficient_data".to_string() };
    }

    let avg_check_before = stats::mean(&check_before);
    let avg_check_after = stats::mean(&check_after);
    let avg_orders_before = stats::mean(&orders_before);
    let avg_orders_after = stats::mean(&orders_after);

    Cannibalization::Measured(CannibalizationStats {
        customers_analyzed: check_before.len() as i64,
        avg_check_before: stats::round2(avg_check_before),
        avg_check_after: stats::round2(avg_check_after),
        avg_check_change_pct: if avg_check_before > 0.0 {
            stats::round2(100.0 * (avg_check_after - avg_check_before) / avg_check_before)
        } else {
            0.0
        },
        avg_orders_before: stats::round2(avg_orders_before),
        avg_orders_after: stats::round2(avg_orders_after),
        avg_orders_change_pct: if avg_orders_before > 0.0 {
            stats::round2(100.0 * (avg_orders_after - avg_orders_before) / avg_orders_before)
        } else {
            0.0
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn txn(id: &str, customer: Option<&str>, day: u32, amount: f64, before: f64) -> TransactionFact {
        TransactionFact {
            id: id.into(),
            customer_id: customer.map(String::from),
            date: NaiveDate::from_ymd_opt(2024, 3, day)
                .unwrap()
                .and_hms_opt(10, 0, 0)
                .unwrap(),
            amount,
            amount_before_discount: before,
            items_count: 2.0,
        }
    }

    #[test]
    fn bracket_boundaries_follow_upper_inclusive_rule() {
        assert_eq!(bracket_index(0.0), 0);
        assert_eq!(bracket_index(5.0), 1);
        assert_eq!(bracket_index(5.1), 2);
        assert_eq!(bracket_index(10.0), 2);
        assert_eq!(bracket_index(60.0), 7);
    }

    #[test]
    fn overall_stats_counts_discounted_transactions() {
        let txns = vec![
            txn("t1", Some("c1"), 1, 90.0, 100.0),
            txn("t2", Some("c1"), 2, 100.0, 100.0),
        ];
        let stats = overall_stats(&txns);
        assert_eq!(stats.total_transactions, 2);
        assert_eq!(stats.discounted_transactions, 1);
        assert!((stats.discount_rate - 50.0).abs() < 1e-9);
        assert!((stats.total_discount_amount - 10.0).abs() < 1e-9);
    }

    #[test]
    fn cannibalization_needs_pre_discount_history() {
        // First order already discounted: no before-window, so skipped.
        let txns = vec![txn("t1", Some("c1"), 1, 90.0, 100.0)];
        assert!(matches!(cannibalization(&txns), Cannibalization::InsufficientData { .. }));

        let txns = vec![
            txn("t1", Some("c1"), 1, 200.0, 200.0),
            txn("t2", Some("c1"), 5, 90.0, 100.0),
            txn("t3", Some("c1"), 9, 110.0, 110.0),
        ];
        match cannibalization(&txns) {
            Cannibalization::Measured(m) => {
                assert_eq!(m.customers_analyzed, 1);
                assert!((m.avg_check_before - 200.0).abs() < 1e-9);
                assert!((m.avg_check_after - 100.0).abs() < 1e-9);
                assert!((m.avg_check_change_pct + 50.0).abs() < 1e-9);
            }
            _ => panic!("expected measured cannibalization"),
        }
    }
}
