//! Tenant-wide product and category analytics.
//!
//! Pure aggregations over the line-fact snapshot; each recipe is
//! independent and produces one named JSON blob.

use crate::{
    calendar::{month_floor, month_floor_date, shift_months},
    config::EngineConfig,
    facts::{TransactionFact, TransactionLineFact},
    stats,
};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

const TOP_PRODUCTS_LIMIT: usize = 100;
const CROSS_SELL_LIMIT: usize = 50;
const ABC_PRODUCTS_CAP: usize = 500;
const CATEGORY_TREND_MONTHS: i32 = 6;

// ── Category stats ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct CategoryStats {
    pub category: String,
    pub transactions: i64,
    pub customers: i64,
    pub total_qty: f64,
    pub revenue: f64,
    pub revenue_before_discount: f64,
    pub products_count: i64,
    pub avg_price: f64,
    pub min_price: f64,
    pub max_price: f64,
    pub revenue_share: f64,
    pub avg_check: f64,
    pub avg_items_per_transaction: f64,
    pub avg_discount_pct: f64,
}

pub fn category_stats(lines: &[TransactionLineFact]) -> Vec<CategoryStats> {
    struct Acc {
        transactions: BTreeSet<String>,
        customers: BTreeSet<String>,
        products: BTreeSet<String>,
        qty: f64,
        revenue: f64,
        revenue_before: f64,
        prices: Vec<f64>,
    }

    let mut by_category: BTreeMap<&str, Acc> = BTreeMap::new();
    for line in lines {
        let acc = by_category.entry(line.category_label()).or_insert_with(|| Acc {
            transactions: BTreeSet::new(),
            customers: BTreeSet::new(),
            products: BTreeSet::new(),
            qty: 0.0,
            revenue: 0.0,
            revenue_before: 0.0,
            prices: Vec::new(),
        });
        acc.transactions.insert(line.transaction_id.clone());
        if let Some(customer) = &line.customer_id {
            acc.customers.insert(customer.clone());
        }
        acc.products.insert(line.product_id.clone());
        acc.qty += line.quantity;
        acc.revenue += line.revenue();
        acc.revenue_before += line.revenue_before_discount();
        acc.prices.push(line.price);
    }

    let total_revenue: f64 = by_category.values().map(|a| a.revenue).sum();

    let mut rows: Vec<CategoryStats> = by_category
        .into_iter()
        .map(|(category, acc)| {
            let transactions = acc.transactions.len() as i64;
            CategoryStats {
                category: category.to_string(),
                transactions,
                customers: acc.customers.len() as i64,
                total_qty: acc.qty,
                revenue: acc.revenue,
                revenue_before_discount: acc.revenue_before,
                products_count: acc.products.len() as i64,
                avg_price: stats::mean(&acc.prices),
                min_price: acc.prices.iter().cloned().fold(f64::MAX, f64::min),
                max_price: acc.prices.iter().cloned().fold(f64::MIN, f64::max),
                revenue_share: if total_revenue > 0.0 {
                    stats::round2(100.0 * acc.revenue / total_revenue)
                } else {
                    0.0
                },
                avg_check: if transactions > 0 {
                    stats::round2(acc.revenue / transactions as f64)
                } else {
                    0.0
                },
                avg_items_per_transaction: if transactions > 0 {
                    stats::round2(acc.qty / transactions as f64)
                } else {
                    0.0
                },
                avg_discount_pct: if acc.revenue_before > 0.0 {
                    stats::round2(100.0 * (acc.revenue_before - acc.revenue) / acc.revenue_before)
                } else {
                    0.0
                },
            }
        })
        .collect();

    rows.sort_by(|a, b| {
        b.revenue
            .partial_cmp(&a.revenue)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.category.cmp(&b.category))
    });
    rows
}

// ── Top products ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct ProductStats {
    pub product_id: String,
    pub name: String,
    pub category: Option<String>,
    pub transactions: i64,
    pub customers: i64,
    pub total_qty: f64,
    pub revenue: f64,
    pub avg_price: f64,
    pub first_sale: String,
    pub last_sale: String,
    pub days_active: i64,
}

pub fn top_products(lines: &[TransactionLineFact]) -> Vec<ProductStats> {
    struct Acc<'a> {
        name: &'a str,
        category: Option<&'a str>,
        transactions: BTreeSet<&'a str>,
        customers: BTreeSet<&'a str>,
        qty: f64,
        revenue: f64,
        prices: Vec<f64>,
        first_sale: chrono::NaiveDateTime,
        last_sale: chrono::NaiveDateTime,
    }

    let mut by_product: BTreeMap<&str, Acc> = BTreeMap::new();
    for line in lines {
        let acc = by_product.entry(line.product_id.as_str()).or_insert_with(|| Acc {
            name: &line.product_name,
            category: line.category.as_deref(),
            transactions: BTreeSet::new(),
            customers: BTreeSet::new(),
            qty: 0.0,
            revenue: 0.0,
            prices: Vec::new(),
            first_sale: line.date,
            last_sale: line.date,
        });
        acc.transactions.insert(&line.transaction_id);
        if let Some(customer) = &line.customer_id {
            acc.customers.insert(customer);
        }
        acc.qty += line.quantity;
        acc.revenue += line.revenue();
        acc.prices.push(line.price);
        acc.first_sale = acc.first_sale.min(line.date);
        acc.last_sale = acc.last_sale.max(line.date);
    }

    let mut rows: Vec<ProductStats> = by_product
        .into_iter()
        .map(|(product_id, acc)| ProductStats {
            product_id: product_id.to_string(),
            name: acc.name.to_string(),
            category: acc.category.map(String::from),
            transactions: acc.transactions.len() as i64,
            customers: acc.customers.len() as i64,
            total_qty: acc.qty,
            revenue: acc.revenue,
            avg_price: stats::mean(&acc.prices),
            first_sale: acc.first_sale.format("%Y-%m-%d %H:%M:%S").to_string(),
            last_sale: acc.last_sale.format("%Y-%m-%d %H:%M:%S").to_string(),
            days_active: (acc.last_sale - acc.first_sale).num_days(),
        })
        .collect();

    rows.sort_by(|a, b| {
        b.revenue
            .partial_cmp(&a.revenue)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.product_id.cmp(&b.product_id))
    });
    rows.truncate(TOP_PRODUCTS_LIMIT);
    rows
}

// ── Category trends ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct CategoryTrend {
    pub category: String,
    pub month: String,
    pub transactions: i64,
    pub customers: i64,
    pub total_qty: f64,
    pub revenue: f64,
}

pub fn category_trends(lines: &[TransactionLineFact], config: &EngineConfig) -> Vec<CategoryTrend> {
    let cutoff = shift_months(month_floor_date(config.today), -CATEGORY_TREND_MONTHS);

    struct Acc {
        transactions: BTreeSet<String>,
        customers: BTreeSet<String>,
        qty: f64,
        revenue: f64,
    }

    let mut by_key: BTreeMap<(String, String), Acc> = BTreeMap::new();
    for line in lines {
        let month = month_floor(line.date);
        if month < cutoff {
            continue;
        }
        let key = (line.category_label().to_string(), month.format("%Y-%m").to_string());
        let acc = by_key.entry(key).or_insert_with(|| Acc {
            transactions: BTreeSet::new(),
            customers: BTreeSet::new(),
            qty: 0.0,
            revenue: 0.0,
        });
        acc.transactions.insert(line.transaction_id.clone());
        if let Some(customer) = &line.customer_id {
            acc.customers.insert(customer.clone());
        }
        acc.qty += line.quantity;
        acc.revenue += line.revenue();
    }

    by_key
        .into_iter()
        .map(|((category, month), acc)| CategoryTrend {
            category,
            month,
            transactions: acc.transactions.len() as i64,
            customers: acc.customers.len() as i64,
            total_qty: acc.qty,
            revenue: acc.revenue,
        })
        .collect()
}

// ── Basket analysis ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct BasketBucket {
    pub basket_size: String,
    pub transactions: i64,
    pub revenue: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct BasketAnalysis {
    pub avg_items_per_basket: f64,
    pub avg_categories_per_basket: f64,
    pub avg_basket_value: f64,
    pub median_items_per_basket: f64,
    pub median_basket_value: f64,
    pub distribution: Vec<BasketBucket>,
}

const BASKET_BUCKETS: [&str; 5] =
    ["1 item", "2-3 items", "4-5 items", "6-10 items", "10+ items"];

fn basket_bucket(item_count: f64) -> usize {
    if item_count == 1.0 {
        0
    } else if (2.0..=3.0).contains(&item_count) {
        1
    } else if (4.0..=5.0).contains(&item_count) {
        2
    } else if (6.0..=10.0).contains(&item_count) {
        3
    } else {
        4
    }
}

pub fn basket_analysis(lines: &[TransactionLineFact]) -> BasketAnalysis {
    struct Basket {
        items: f64,
        categories: BTreeSet<String>,
        value: f64,
    }

    let mut baskets: BTreeMap<&str, Basket> = BTreeMap::new();
    for line in lines {
        let basket = baskets.entry(line.transaction_id.as_str()).or_insert_with(|| Basket {
            items: 0.0,
            categories: BTreeSet::new(),
            value: 0.0,
        });
        basket.items += line.quantity;
        if let Some(category) = &line.category {
            basket.categories.insert(category.clone());
        }
        basket.value += line.revenue();
    }

    let items: Vec<f64> = baskets.values().map(|b| b.items).collect();
    let categories: Vec<f64> = baskets.values().map(|b| b.categories.len() as f64).collect();
    let values: Vec<f64> = baskets.values().map(|b| b.value).collect();

    let mut bucket_txns = [0i64; 5];
    let mut bucket_revenue = [0.0f64; 5];
    for basket in baskets.values() {
        let idx = basket_bucket(basket.items);
        bucket_txns[idx] += 1;
        bucket_revenue[idx] += basket.value;
    }

    let distribution = BASKET_BUCKETS
        .iter()
        .enumerate()
        .filter(|(idx, _)| bucket_txns[*idx] > 0)
        .map(|(idx, label)| BasketBucket {
            basket_size: label.to_string(),
            transactions: bucket_txns[idx],
            revenue: bucket_revenue[idx],
        })
        .collect();

    BasketAnalysis {
        avg_items_per_basket: stats::mean(&items),
        avg_categories_per_basket: stats::mean(&categories),
        avg_basket_value: stats::mean(&values),
        median_items_per_basket: stats::median(&items),
        median_basket_value: stats::median(&values),
        distribution,
    }
}

// ── ABC classification ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct AbcProduct {
    pub product_id: String,
    pub name: String,
    pub category: Option<String>,
    pub revenue: f64,
    pub cumulative_pct: f64,
    pub abc_class: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AbcClassSummary {
    pub count: i64,
    pub revenue: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProductAbc {
    pub products: Vec<AbcProduct>,
    pub summary: BTreeMap<String, AbcClassSummary>,
}

/// ABC by cumulative revenue share over products sorted revenue-desc:
/// cumulative ≤ 80% → A, ≤ 95% → B, else C. Every product lands in
/// exactly one class.
pub fn product_abc(lines: &[TransactionLineFact]) -> ProductAbc {
    let mut revenue_by_product: BTreeMap<&str, (&str, Option<&str>, f64)> = BTreeMap::new();
    for line in lines {
        let entry = revenue_by_product
            .entry(line.product_id.as_str())
            .or_insert((line.product_name.as_str(), line.category.as_deref(), 0.0));
        entry.2 += line.revenue();
    }

    let mut ranked: Vec<(&str, &str, Option<&str>, f64)> = revenue_by_product
        .into_iter()
        .map(|(id, (name, category, revenue))| (id, name, category, revenue))
        .collect();
    ranked.sort_by(|a, b| {
        b.3.partial_cmp(&a.3)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.0.cmp(b.0))
    });

    let total_revenue: f64 = ranked.iter().map(|(_, _, _, r)| r).sum();

    let mut products = Vec::with_capacity(ranked.len());
    let mut summary: BTreeMap<String, AbcClassSummary> = ["A", "B", "C"]
        .into_iter()
        .map(|c| (c.to_string(), AbcClassSummary { count: 0, revenue: 0.0 }))
        .collect();

    let mut cumulative = 0.0;
    for (product_id, name, category, revenue) in ranked {
        cumulative += revenue;
        let abc_class = if total_revenue <= 0.0 || cumulative <= total_revenue * 0.80 {
            "A"
        } else if cumulative <= total_revenue * 0.95 {
            "B"
        } else {
            "C"
        };

        let entry = summary.get_mut(abc_class).expect("classes pre-seeded");
        entry.count += 1;
        entry.revenue += revenue;

        products.push(AbcProduct {
            product_id: product_id.to_string(),
            name: name.to_string(),
            category: category.map(String::from),
            revenue,
            cumulative_pct: if total_revenue > 0.0 {
                stats::round2(100.0 * cumulative / total_revenue)
            } else {
                0.0
            },
            abc_class: abc_class.to_string(),
        });
    }

    products.truncate(ABC_PRODUCTS_CAP);
    ProductAbc { products, summary }
}

// ── Cross-sell matrix ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct CrossSellPair {
    pub category1: String,
    pub category2: String,
    pub co_occurrences: i64,
    pub cat1_total: i64,
    pub cat2_total: i64,
    pub lift_from_cat1: f64,
    pub lift_from_cat2: f64,
}

/// Category pairs bought together in one receipt, filtered by minimum
/// support, with lift relative to each side's basket count.
pub fn cross_sell_matrix(
    lines: &[TransactionLineFact],
    min_support: i64,
) -> Vec<CrossSellPair> {
    let mut basket_categories: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
    for line in lines {
        basket_categories
            .entry(line.transaction_id.as_str())
            .or_default()
            .insert(line.category_label());
    }

    let mut category_totals: BTreeMap<&str, i64> = BTreeMap::new();
    let mut pair_counts: BTreeMap<(&str, &str), i64> = BTreeMap::new();
    for categories in basket_categories.values() {
        let ordered: Vec<&str> = categories.iter().copied().collect();
        for &category in &ordered {
            *category_totals.entry(category).or_insert(0) += 1;
        }
        for (i, &a) in ordered.iter().enumerate() {
            for &b in &ordered[i + 1..] {
                *pair_counts.entry((a, b)).or_insert(0) += 1;
            }
        }
    }

    let mut pairs: Vec<CrossSellPair> = pair_counts
        .into_iter()
        .filter(|(_, count)| *count >= min_support)
        .map(|((a, b), co_occurrences)| {
            let cat1_total = category_totals[a];
            let cat2_total = category_totals[b];
            CrossSellPair {
                category1: a.to_string(),
                category2: b.to_string(),
                co_occurrences,
                cat1_total,
                cat2_total,
                lift_from_cat1: stats::round2(100.0 * co_occurrences as f64 / cat1_total as f64),
                lift_from_cat2: stats::round2(100.0 * co_occurrences as f64 / cat2_total as f64),
            }
        })
        .collect();

    pairs.sort_by(|a, b| {
        b.co_occurrences
            .cmp(&a.co_occurrences)
            .then_with(|| a.category1.cmp(&b.category1))
            .then_with(|| a.category2.cmp(&b.category2))
    });
    pairs.truncate(CROSS_SELL_LIMIT);
    pairs
}

// ── Category penetration ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct CategoryPenetration {
    pub category: String,
    pub customers: i64,
    pub total_customers: i64,
    pub penetration_pct: f64,
}

/// Share of identified customers who bought each category at least once.
pub fn category_penetration(
    transactions: &[TransactionFact],
    lines: &[TransactionLineFact],
) -> Vec<CategoryPenetration> {
    let total_customers = transactions
        .iter()
        .filter_map(|t| t.customer_id.as_deref())
        .collect::<BTreeSet<_>>()
        .len() as i64;

    let mut by_category: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
    for line in lines {
        if let Some(customer) = line.customer_id.as_deref() {
            by_category.entry(line.category_label()).or_default().insert(customer);
        }
    }

    let mut rows: Vec<CategoryPenetration> = by_category
        .into_iter()
        .map(|(category, customers)| CategoryPenetration {
            category: category.to_string(),
            customers: customers.len() as i64,
            total_customers,
            penetration_pct: if total_customers > 0 {
                stats::round2(100.0 * customers.len() as f64 / total_customers as f64)
            } else {
                0.0
            },
        })
        .collect();

    rows.sort_by(|a, b| b.customers.cmp(&a.customers).then_with(|| a.category.cmp(&b.category)));
    rows
}
