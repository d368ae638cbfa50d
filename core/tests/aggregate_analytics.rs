use chrono::{NaiveDate, NaiveDateTime};
use retail_metrics_core::config::EngineConfig;
use retail_metrics_core::discount_analytics;
use retail_metrics_core::facts::{TransactionFact, TransactionLineFact, UNCATEGORIZED};
use retail_metrics_core::product_analytics;
use retail_metrics_core::time_analytics;

// ── Helpers ──────────────────────────────────────────────────────────────────

fn at(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(h, 0, 0).unwrap()
}

fn txn(id: &str, customer: Option<&str>, date: NaiveDateTime, amount: f64, before: f64) -> TransactionFact {
    TransactionFact {
        id: id.into(),
        customer_id: customer.map(String::from),
        date,
        amount,
        amount_before_discount: before,
        items_count: 1.0,
    }
}

#[allow(clippy::too_many_arguments)]
fn line(
    txn_id: &str,
    customer: Option<&str>,
    date: NaiveDateTime,
    product: &str,
    category: Option<&str>,
    qty: f64,
    price: f64,
    before: f64,
) -> TransactionLineFact {
    TransactionLineFact {
        transaction_id: txn_id.into(),
        customer_id: customer.map(String::from),
        date,
        product_id: product.into(),
        product_name: product.into(),
        category: category.map(String::from),
        quantity: qty,
        price,
        price_before_discount: before,
        discount_id: if price < before { Some("promo".into()) } else { None },
    }
}

// ── Product analytics ────────────────────────────────────────────────────────

/// Revenue shares across categories sum to 100, NULL categories fold
/// into the Uncategorized bucket, and rows come out revenue-descending.
#[test]
fn category_stats_share_and_null_bucket() {
    let d = at(2024, 5, 1, 12);
    let lines = vec![
        line("t1", Some("c1"), d, "beans", Some("Coffee"), 2.0, 300.0, 300.0),
        line("t2", Some("c2"), d, "mug", Some("Accessories"), 1.0, 200.0, 200.0),
        line("t3", Some("c1"), d, "gift", None, 1.0, 200.0, 200.0),
    ];

    let rows = product_analytics::category_stats(&lines);
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0].category, "Coffee", "highest revenue first");
    assert!(rows.iter().any(|r| r.category == UNCATEGORIZED));

    let share_sum: f64 = rows.iter().map(|r| r.revenue_share).sum();
    assert!((share_sum - 100.0).abs() < 0.05, "shares sum to ~100, got {share_sum}");
}

/// ABC is a partition: every product in exactly one class, class counts
/// sum to the product count, and the top product is always A.
#[test]
fn product_abc_is_a_partition() {
    let d = at(2024, 5, 1, 12);
    let lines: Vec<TransactionLineFact> = (0..10)
        .map(|i| {
            line(
                &format!("t{i}"),
                Some("c1"),
                d,
                &format!("sku{i}"),
                Some("Coffee"),
                1.0,
                1000.0 / (i + 1) as f64,
                1000.0 / (i + 1) as f64,
            )
        })
        .collect();

    let abc = product_analytics::product_abc(&lines);
    assert_eq!(abc.products.len(), 10);
    assert_eq!(abc.products[0].abc_class, "A");

    let class_total: i64 = abc.summary.values().map(|s| s.count).sum();
    assert_eq!(class_total, 10, "every product lands in exactly one class");

    let revenue_total: f64 = abc.summary.values().map(|s| s.revenue).sum();
    let line_total: f64 = lines.iter().map(|l| l.revenue()).sum();
    assert!((revenue_total - line_total).abs() < 1e-6);

    // Cumulative share never decreases.
    let mut prev = 0.0;
    for product in &abc.products {
        assert!(product.cumulative_pct >= prev);
        prev = product.cumulative_pct;
    }
}

/// Basket distribution buckets split on summed quantity per receipt.
#[test]
fn basket_buckets_split_on_item_count() {
    let d = at(2024, 5, 1, 12);
    let lines = vec![
        line("t1", Some("c1"), d, "a", Some("X"), 1.0, 100.0, 100.0),
        line("t2", Some("c1"), d, "a", Some("X"), 2.0, 100.0, 100.0),
        line("t2", Some("c1"), d, "b", Some("Y"), 1.0, 50.0, 50.0),
        line("t3", Some("c1"), d, "a", Some("X"), 12.0, 100.0, 100.0),
    ];

    let analysis = product_analytics::basket_analysis(&lines);
    let buckets: Vec<&str> =
        analysis.distribution.iter().map(|b| b.basket_size.as_str()).collect();
    assert_eq!(buckets, vec!["1 item", "2-3 items", "10+ items"]);
    assert!((analysis.avg_categories_per_basket - 4.0 / 3.0).abs() < 1e-9);
}

/// Pairs below the minimum support are dropped; lifts are relative to
/// each category's own basket count.
#[test]
fn cross_sell_respects_min_support() {
    let d = at(2024, 5, 1, 12);
    let mut lines = Vec::new();
    for i in 0..3 {
        lines.push(line(&format!("t{i}"), Some("c1"), d, "a", Some("Coffee"), 1.0, 100.0, 100.0));
        lines.push(line(&format!("t{i}"), Some("c1"), d, "b", Some("Bakery"), 1.0, 50.0, 50.0));
    }
    // One basket pairing Coffee with Snacks.
    lines.push(line("t9", Some("c1"), d, "a", Some("Coffee"), 1.0, 100.0, 100.0));
    lines.push(line("t9", Some("c1"), d, "c", Some("Snacks"), 1.0, 30.0, 30.0));

    let pairs = product_analytics::cross_sell_matrix(&lines, 2);
    assert_eq!(pairs.len(), 1, "only the Bakery/Coffee pair clears support 2");
    assert_eq!(pairs[0].co_occurrences, 3);
    // Bakery sorts first in the pair; all 3 Bakery baskets contain Coffee.
    assert_eq!(pairs[0].category1, "Bakery");
    assert!((pairs[0].lift_from_cat1 - 100.0).abs() < 1e-9);
    // Coffee appears in 4 baskets, 3 of which contain Bakery.
    assert!((pairs[0].lift_from_cat2 - 75.0).abs() < 1e-9);
}

// ── Discount analytics ───────────────────────────────────────────────────────

/// A 10% receipt discount lands in the "6-10%" bracket; the boundary is
/// inclusive on the upper edge.
#[test]
fn ten_percent_discount_lands_in_six_to_ten_bracket() {
    let txns = vec![
        txn("t1", Some("c1"), at(2024, 5, 1, 10), 90.0, 100.0),
        txn("t2", Some("c1"), at(2024, 5, 2, 10), 100.0, 100.0),
    ];
    let brackets = discount_analytics::discount_brackets(&txns);
    let labels: Vec<&str> = brackets.iter().map(|b| b.bracket.as_str()).collect();
    assert_eq!(labels, vec!["0% (no discount)", "6-10%"]);
}

/// Effectiveness lifts are zero when every receipt is discounted
/// (no full-price side to compare against).
#[test]
fn effectiveness_without_full_price_side_reports_zero_lift() {
    let txns = vec![txn("t1", Some("c1"), at(2024, 5, 1, 10), 90.0, 100.0)];
    let eff = discount_analytics::discount_effectiveness(&txns);
    assert_eq!(eff.full_price.transactions, 0);
    assert_eq!(eff.check_lift_pct, 0.0);
    assert_eq!(eff.items_lift_pct, 0.0);
}

/// Behavior buckets partition customers by their discounted-order
/// share; a customer with no discounts lands in the never bucket.
#[test]
fn discount_behavior_buckets_partition_customers() {
    let txns = vec![
        // c1: 0 of 2 discounted.
        txn("t1", Some("c1"), at(2024, 5, 1, 10), 100.0, 100.0),
        txn("t2", Some("c1"), at(2024, 5, 2, 10), 100.0, 100.0),
        // c2: 2 of 2 discounted.
        txn("t3", Some("c2"), at(2024, 5, 1, 10), 80.0, 100.0),
        txn("t4", Some("c2"), at(2024, 5, 2, 10), 80.0, 100.0),
        // c3: 1 of 3 discounted → "Sometimes".
        txn("t5", Some("c3"), at(2024, 5, 1, 10), 90.0, 100.0),
        txn("t6", Some("c3"), at(2024, 5, 2, 10), 100.0, 100.0),
        txn("t7", Some("c3"), at(2024, 5, 3, 10), 100.0, 100.0),
    ];
    let buckets = discount_analytics::customer_discount_behavior(&txns);
    let total_customers: i64 = buckets.iter().map(|b| b.customers).sum();
    assert_eq!(total_customers, 3);

    let never = buckets.iter().find(|b| b.behavior == "Never uses discounts").unwrap();
    assert_eq!(never.customers, 1);
    let always = buckets.iter().find(|b| b.behavior == "Always (75%+)").unwrap();
    assert_eq!(always.customers, 1);
    let sometimes = buckets.iter().find(|b| b.behavior == "Sometimes (25-50%)").unwrap();
    assert_eq!(sometimes.customers, 1);
}

/// Margin erosion equals the discount amount under a flat assumed
/// margin, since discounts come straight out of margin.
#[test]
fn margin_erosion_equals_discount_amount() {
    let config = EngineConfig::with_today(NaiveDate::from_ymd_opt(2024, 6, 1).unwrap());
    let txns = vec![
        txn("t1", Some("c1"), at(2024, 5, 1, 10), 900.0, 1000.0),
        txn("t2", Some("c1"), at(2024, 5, 2, 10), 500.0, 500.0),
    ];
    let impact = discount_analytics::margin_impact(&txns, &config);

    assert!((impact.total_discount_amount - 100.0).abs() < 1e-9);
    // before: 1500 × 30% = 450; after: 1400 × 30% − 100 = 320.
    assert!((impact.estimated_margin_before - 450.0).abs() < 1e-9);
    assert!((impact.estimated_margin_after - 320.0).abs() < 1e-9);
    assert!((impact.margin_erosion - 130.0).abs() < 1e-9);
}

// ── Time analytics ───────────────────────────────────────────────────────────

/// Seasonality indexes against an even twelfth of annual revenue:
/// double-weight months index near 200, and the variation reflects the
/// max-to-min spread.
#[test]
fn seasonality_indexes_against_even_twelfth() {
    let mut txns = Vec::new();
    for month in 1..=12u32 {
        let weight = if month == 12 { 2 } else { 1 };
        for i in 0..weight {
            txns.push(txn(
                &format!("t{month}-{i}"),
                Some("c1"),
                at(2023, month, 5, 12),
                120.0,
                120.0,
            ));
        }
    }
    let season = time_analytics::seasonality(&txns);
    assert_eq!(season.months.len(), 12);

    let december = season.months.iter().find(|m| m.month_number == 12).unwrap();
    let march = season.months.iter().find(|m| m.month_number == 3).unwrap();
    assert!(december.seasonality_index > march.seasonality_index);
    assert_eq!(season.peak_months[0], 12);
    assert!((season.seasonal_variation_pct - 50.0).abs() < 0.1);
}

/// Year rows carry growth against the previous year; the first year
/// has nothing to compare against.
#[test]
fn yoy_growth_compares_adjacent_years() {
    let txns = vec![
        txn("t1", Some("c1"), at(2022, 3, 1, 10), 1000.0, 1000.0),
        txn("t2", Some("c1"), at(2023, 3, 1, 10), 1500.0, 1500.0),
        txn("t3", Some("c2"), at(2023, 6, 1, 10), 500.0, 500.0),
    ];
    let years = time_analytics::yoy_comparison(&txns);
    assert_eq!(years.len(), 2);
    assert!(years[0].revenue_growth_pct.is_none());
    assert!((years[1].revenue_growth_pct.unwrap() - 100.0).abs() < 1e-9);
    assert!((years[1].transactions_growth_pct.unwrap() - 100.0).abs() < 1e-9);
}

/// Peak days only consider the trailing year; peak hours rank the
/// whole history.
#[test]
fn peak_periods_window_and_ranking() {
    let config = EngineConfig::with_today(NaiveDate::from_ymd_opt(2024, 6, 1).unwrap());
    let txns = vec![
        // Outside the 365-day window.
        txn("t1", Some("c1"), at(2022, 1, 1, 9), 9999.0, 9999.0),
        txn("t2", Some("c1"), at(2024, 5, 1, 9), 500.0, 500.0),
        txn("t3", Some("c2"), at(2024, 5, 20, 18), 800.0, 800.0),
    ];
    let peaks = time_analytics::peak_periods(&txns, &config);

    assert_eq!(peaks.top_days.len(), 2, "the 2022 spike is outside the window");
    assert_eq!(peaks.top_days[0].date, "2024-05-20");
    assert_eq!(peaks.top_days[0].day_name, "Monday");

    // Hours rank over everything, so 09:00 (9999 + 500) beats 18:00.
    assert_eq!(peaks.top_hours[0].hour, "09:00");
}
