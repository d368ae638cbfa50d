//! Seeded synthetic tenant generator for demo runs.
//!
//! Everything flows from one PCG stream, so the same seed always
//! produces the same tenant (ids included — UUIDs are drawn from the
//! stream, not from the OS).

use anyhow::Result;
use chrono::{Duration, NaiveDate};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64Mcg;
use retail_metrics_core::store::MetricsStore;
use uuid::Uuid;

pub struct GenParams {
    pub seed: u64,
    pub customers: usize,
    pub days: i64,
    pub today: NaiveDate,
}

const CATALOG: [(&str, f64, Option<&str>); 12] = [
    ("Espresso beans 1kg", 950.0, Some("Coffee")),
    ("Filter blend 500g", 520.0, Some("Coffee")),
    ("Cold brew bottle", 240.0, Some("Coffee")),
    ("Ceramic mug", 450.0, Some("Accessories")),
    ("Travel tumbler", 890.0, Some("Accessories")),
    ("Paper filters x100", 180.0, Some("Accessories")),
    ("Almond croissant", 160.0, Some("Bakery")),
    ("Sourdough loaf", 320.0, Some("Bakery")),
    ("Granola bar", 95.0, Some("Snacks")),
    ("Dark chocolate 85%", 210.0, Some("Snacks")),
    ("Gift card 1000", 1000.0, None),
    ("Seasonal sampler", 1450.0, None),
];

pub fn generate(store: &MetricsStore, tenant_id: &str, params: &GenParams) -> Result<()> {
    let mut rng = Pcg64Mcg::seed_from_u64(params.seed);

    let product_ids: Vec<String> = CATALOG
        .iter()
        .enumerate()
        .map(|(idx, _)| format!("p{:03}", idx + 1))
        .collect();
    for (idx, (name, _, category)) in CATALOG.iter().enumerate() {
        store.insert_product(tenant_id, &product_ids[idx], name, *category)?;
    }

    let start = params.today - Duration::days(params.days);
    let mut transactions = 0u64;

    for _ in 0..params.customers {
        let customer_id = Uuid::from_u128(rng.gen()).to_string();
        // Long-tail order counts: most customers order a handful of times.
        let orders = 1 + (rng.gen_range(0.0f64..1.0).powi(2) * 19.0) as usize;

        for _ in 0..orders {
            insert_receipt(
                store,
                tenant_id,
                Some(&customer_id),
                &product_ids,
                start,
                params.days,
                &mut rng,
            )?;
            transactions += 1;
        }
    }

    // A slice of guest checkouts with no customer id.
    let guest_receipts = params.customers / 5;
    for _ in 0..guest_receipts {
        insert_receipt(store, tenant_id, None, &product_ids, start, params.days, &mut rng)?;
        transactions += 1;
    }

    log::info!(
        "generated tenant {tenant_id}: {} customers, {transactions} transactions",
        params.customers
    );
    Ok(())
}

fn insert_receipt(
    store: &MetricsStore,
    tenant_id: &str,
    customer_id: Option<&str>,
    product_ids: &[String],
    start: NaiveDate,
    days: i64,
    rng: &mut Pcg64Mcg,
) -> Result<()> {
    let transaction_id = Uuid::from_u128(rng.gen()).to_string();
    let date = (start + Duration::days(rng.gen_range(0..days)))
        .and_hms_opt(rng.gen_range(8..22), rng.gen_range(0..60), 0)
        .expect("generated time is valid");

    let line_count = rng.gen_range(1..=5usize);
    let mut amount = 0.0;
    let mut amount_before = 0.0;
    let mut lines = Vec::with_capacity(line_count);
    for _ in 0..line_count {
        let product_idx = rng.gen_range(0..CATALOG.len());
        let base_price = CATALOG[product_idx].1;
        let quantity = rng.gen_range(1..=3) as f64;
        // Roughly a quarter of lines carry a 5–30% discount.
        let price = if rng.gen_bool(0.25) {
            base_price * (1.0 - rng.gen_range(0.05..0.30))
        } else {
            base_price
        };
        amount += quantity * price;
        amount_before += quantity * base_price;
        lines.push((product_idx, quantity, price, base_price));
    }

    store.insert_transaction(
        tenant_id,
        &transaction_id,
        customer_id,
        date,
        amount,
        Some(amount_before),
    )?;
    for (product_idx, quantity, price, base_price) in lines {
        let discount_id = if price < base_price { Some("promo") } else { None };
        store.insert_transaction_item(
            tenant_id,
            &transaction_id,
            &product_ids[product_idx],
            quantity,
            price,
            base_price,
            discount_id,
        )?;
    }
    Ok(())
}
