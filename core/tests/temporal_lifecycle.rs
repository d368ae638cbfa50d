use chrono::NaiveDate;
use retail_metrics_core::config::EngineConfig;
use retail_metrics_core::facts::TransactionFact;
use retail_metrics_core::lifecycle::{self, compute_lifecycle};
use retail_metrics_core::rfm::{compute_basic, compute_rfm};
use retail_metrics_core::temporal::compute_temporal;

// ── Helpers ──────────────────────────────────────────────────────────────────

fn txn(id: &str, date: NaiveDate, amount: f64) -> TransactionFact {
    TransactionFact {
        id: id.into(),
        customer_id: Some("c1".into()),
        date: date.and_hms_opt(0, 0, 0).unwrap(),
        amount,
        amount_before_discount: amount,
        items_count: 1.0,
    }
}

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

// ── Tests ────────────────────────────────────────────────────────────────────

/// A single order 40 days ago: no gaps exist, so the customer's age
/// stands in for the average and median with zero spread, and the
/// expected next order lands 40 days after the only order.
#[test]
fn single_order_history_uses_age_as_gap() {
    let config = EngineConfig::with_today(day(2024, 6, 30));
    let txns = vec![txn("t1", day(2024, 5, 21), 500.0)];
    let refs: Vec<&TransactionFact> = txns.iter().collect();

    let temporal = compute_temporal(&refs, &config);

    assert_eq!(temporal.customer_age_days, 40);
    assert!((temporal.avg_days_between - 40.0).abs() < 1e-9);
    assert!((temporal.median_days_between - 40.0).abs() < 1e-9);
    assert_eq!(temporal.std_days_between, 0.0);
    assert_eq!(temporal.expected_next_order, day(2024, 6, 30));
    assert_eq!(temporal.days_overdue, 0);
    assert_eq!(temporal.active_months, 1);
}

/// Gaps are whole days between consecutive orders; a perfectly even
/// cadence scores regularity 1.0.
#[test]
fn even_cadence_is_perfectly_regular() {
    let config = EngineConfig::with_today(day(2024, 6, 30));
    let txns = vec![
        txn("t1", day(2024, 3, 1), 100.0),
        txn("t2", day(2024, 3, 31), 100.0),
        txn("t3", day(2024, 4, 30), 100.0),
        txn("t4", day(2024, 5, 30), 100.0),
    ];
    let refs: Vec<&TransactionFact> = txns.iter().collect();

    let temporal = compute_temporal(&refs, &config);

    assert!((temporal.avg_days_between - 30.0).abs() < 1e-9);
    assert_eq!(temporal.std_days_between, 0.0);
    assert!(
        (temporal.purchase_regularity - 1.0).abs() < 1e-9,
        "zero spread means regularity 1.0, got {}",
        temporal.purchase_regularity
    );
    // Expected next 30 days after 2024-05-30 → overdue by one day.
    assert_eq!(temporal.expected_next_order, day(2024, 6, 29));
    assert_eq!(temporal.days_overdue, 1);
}

/// Active months counts distinct calendar months, and the activity rate
/// is measured against the customer's age in 30-day months.
#[test]
fn activity_rate_counts_distinct_months() {
    let config = EngineConfig::with_today(day(2024, 6, 30));
    let txns = vec![
        txn("t1", day(2024, 1, 5), 100.0),
        txn("t2", day(2024, 1, 20), 100.0),
        txn("t3", day(2024, 3, 10), 100.0),
        txn("t4", day(2024, 6, 1), 100.0),
    ];
    let refs: Vec<&TransactionFact> = txns.iter().collect();

    let temporal = compute_temporal(&refs, &config);
    assert_eq!(temporal.active_months, 3, "Jan, Mar, Jun");
    // Age 177 days → 5 months.
    assert_eq!(temporal.customer_age_months, 5);
    assert!((temporal.activity_rate - 3.0 / 5.0).abs() < 1e-9);
}

fn stage_for(dates: &[NaiveDate], today: NaiveDate) -> (String, bool, bool, bool, bool) {
    let config = EngineConfig::with_today(today);
    let txns: Vec<TransactionFact> = dates
        .iter()
        .enumerate()
        .map(|(i, d)| txn(&format!("t{i}"), *d, 100.0))
        .collect();
    let refs: Vec<&TransactionFact> = txns.iter().collect();
    let basic = compute_basic(&refs, &config);
    let rfm = compute_rfm(&refs, &basic, &config);
    let temporal = compute_temporal(&refs, &config);
    let l = compute_lifecycle(&basic, &rfm, &temporal, &config);
    (l.lifecycle_stage, l.is_new, l.is_active, l.is_sleeping, l.is_churned)
}

/// A customer whose first order is within the new-customer window is
/// New regardless of cadence.
#[test]
fn recent_first_order_is_new() {
    let (stage, is_new, _, _, _) =
        stage_for(&[day(2024, 6, 15), day(2024, 6, 25)], day(2024, 6, 30));
    assert_eq!(stage, lifecycle::STAGE_NEW);
    assert!(is_new);
}

/// Sleep factor is recency over average gap: ordering every 10 days and
/// then going quiet for 35 crosses the churned threshold (3.0).
#[test]
fn long_silence_relative_to_cadence_is_churned() {
    let (stage, _, _, is_sleeping, is_churned) = stage_for(
        &[day(2024, 4, 1), day(2024, 4, 11), day(2024, 4, 21), day(2024, 5, 1)],
        day(2024, 6, 5),
    );
    assert_eq!(stage, lifecycle::STAGE_CHURNED);
    assert!(is_churned);
    assert!(!is_sleeping, "churned wins over sleeping");
}

/// Between 1.5 and 3 missed cycles the customer is Sleeping.
#[test]
fn moderate_silence_is_sleeping() {
    let (stage, _, _, is_sleeping, is_churned) = stage_for(
        &[day(2024, 3, 1), day(2024, 3, 31), day(2024, 4, 30)],
        day(2024, 6, 29),
    );
    // recency 60, avg gap 30 → sleep factor 2.0.
    assert_eq!(stage, lifecycle::STAGE_SLEEPING);
    assert!(is_sleeping);
    assert!(!is_churned);
}

/// Sleeping and churned never hold together, and a customer with
/// neither flag (and past the new window) is Active.
#[test]
fn flags_partition_sleeping_and_churned() {
    let histories: [(&[NaiveDate], NaiveDate); 4] = [
        (&[day(2024, 6, 15)], day(2024, 6, 30)),
        (&[day(2024, 3, 1), day(2024, 3, 31), day(2024, 4, 30)], day(2024, 6, 29)),
        (&[day(2024, 4, 1), day(2024, 4, 11), day(2024, 5, 1)], day(2024, 6, 25)),
        (&[day(2024, 1, 1), day(2024, 2, 1), day(2024, 6, 20)], day(2024, 6, 30)),
    ];
    for (dates, today) in histories {
        let (stage, is_new, is_active, is_sleeping, is_churned) = stage_for(dates, today);
        assert!(
            !(is_sleeping && is_churned),
            "sleeping and churned both set for stage {stage}"
        );
        if !is_new && !is_sleeping && !is_churned {
            assert!(is_active, "no flag set but not active for stage {stage}");
        }
    }
}

/// Cohort is the first order's calendar month.
#[test]
fn cohort_is_first_order_month() {
    let config = EngineConfig::with_today(day(2024, 6, 30));
    let txns = vec![txn("t1", day(2023, 11, 28), 100.0), txn("t2", day(2024, 2, 2), 100.0)];
    let refs: Vec<&TransactionFact> = txns.iter().collect();
    let basic = compute_basic(&refs, &config);
    let rfm = compute_rfm(&refs, &basic, &config);
    let temporal = compute_temporal(&refs, &config);
    let l = compute_lifecycle(&basic, &rfm, &temporal, &config);
    assert_eq!(l.cohort, "2023-11");
}
