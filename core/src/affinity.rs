//! Product-affinity metrics: favorite SKU/category, assortment
//! diversity, and a saturating cross-sell score.

use crate::{facts::TransactionLineFact, record::AffinityMetrics};
use std::collections::BTreeMap;

/// Categories beyond this many no longer raise the cross-sell score.
const CROSS_SELL_SATURATION: f64 = 5.0;

/// Compute affinity metrics from one customer's receipt lines. An
/// empty slice yields the all-empty record (and no error): receipts
/// without line detail are a normal condition.
pub fn compute_affinity(lines: &[&TransactionLineFact]) -> AffinityMetrics {
    if lines.is_empty() {
        return AffinityMetrics {
            favorite_category: None,
            favorite_sku: None,
            category_diversity: 0,
            sku_diversity: 0,
            cross_sell_potential: 0.0,
        };
    }

    // Cumulative quantity per product and per classified category.
    // BTreeMap keeps ties deterministic (quantity desc, name asc).
    let mut product_quantities: BTreeMap<&str, f64> = BTreeMap::new();
    let mut category_quantities: BTreeMap<&str, f64> = BTreeMap::new();
    for line in lines {
        *product_quantities.entry(line.product_name.as_str()).or_insert(0.0) += line.quantity;
        if let Some(category) = line.category.as_deref() {
            *category_quantities.entry(category).or_insert(0.0) += line.quantity;
        }
    }

    let favorite_sku = top_by_quantity(&product_quantities);
    let favorite_category = top_by_quantity(&category_quantities);

    let sku_diversity = product_quantities.len() as i64;
    let category_diversity = category_quantities.len() as i64;

    AffinityMetrics {
        favorite_category,
        favorite_sku,
        category_diversity,
        sku_diversity,
        cross_sell_potential: (category_diversity as f64 / CROSS_SELL_SATURATION).min(1.0),
    }
}

fn top_by_quantity(quantities: &BTreeMap<&str, f64>) -> Option<String> {
    quantities
        .iter()
        .max_by(|(name_a, qty_a), (name_b, qty_b)| {
            qty_a
                .partial_cmp(qty_b)
                .unwrap_or(std::cmp::Ordering::Equal)
                // On equal quantity prefer the lexically smaller name;
                // max_by keeps the later of equal elements.
                .then_with(|| name_b.cmp(name_a))
        })
        .map(|(name, _)| name.to_string())
}
