//! Tenant-wide temporal analytics: intra-week/intra-day patterns,
//! monthly and weekly trends, seasonality, cohorts and year-over-year
//! comparisons.

use crate::{
    calendar::{month_floor, month_floor_date, months_between, shift_months, week_floor},
    config::EngineConfig,
    facts::TransactionFact,
    stats,
};
use chrono::{Datelike, NaiveDate, Timelike};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

const MONTHLY_TREND_MONTHS: i32 = 24;
const WEEKLY_TREND_WEEKS: i64 = 52;
const COHORT_MONTHS: i32 = 12;
const PEAK_DAYS_LIMIT: usize = 20;
const PEAK_HOURS_LIMIT: usize = 5;
const PEAK_WINDOW_DAYS: i64 = 365;

const DAY_NAMES: [&str; 7] =
    ["Sunday", "Monday", "Tuesday", "Wednesday", "Thursday", "Friday", "Saturday"];

// ── Day of week / hour of day ────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct DayOfWeekStats {
    pub day_number: u32,
    pub day_name: String,
    pub transactions: i64,
    pub customers: i64,
    pub revenue: f64,
    pub avg_check: f64,
}

pub fn day_of_week(transactions: &[TransactionFact]) -> Vec<DayOfWeekStats> {
    let mut txn_counts = [0i64; 7];
    let mut revenues = [0.0f64; 7];
    let mut customers: [BTreeSet<&str>; 7] = Default::default();

    for txn in transactions {
        let idx = txn.date.weekday().num_days_from_sunday() as usize;
        txn_counts[idx] += 1;
        revenues[idx] += txn.amount;
        if let Some(customer) = txn.customer_id.as_deref() {
            customers[idx].insert(customer);
        }
    }

    (0..7)
        .filter(|&idx| txn_counts[idx] > 0)
        .map(|idx| DayOfWeekStats {
            day_number: idx as u32,
            day_name: DAY_NAMES[idx].to_string(),
            transactions: txn_counts[idx],
            customers: customers[idx].len() as i64,
            revenue: revenues[idx],
            avg_check: stats::round2(revenues[idx] / txn_counts[idx] as f64),
        })
        .collect()
}

#[derive(Debug, Clone, Serialize)]
pub struct HourOfDayStats {
    pub hour: String,
    pub transactions: i64,
    pub customers: i64,
    pub revenue: f64,
    pub avg_check: f64,
}

pub fn hour_of_day(transactions: &[TransactionFact]) -> Vec<HourOfDayStats> {
    let mut txn_counts = [0i64; 24];
    let mut revenues = [0.0f64; 24];
    let mut customers: [BTreeSet<&str>; 24] = Default::default();

    for txn in transactions {
        let idx = txn.date.hour() as usize;
        txn_counts[idx] += 1;
        revenues[idx] += txn.amount;
        if let Some(customer) = txn.customer_id.as_deref() {
            customers[idx].insert(customer);
        }
    }

    (0..24)
        .filter(|&idx| txn_counts[idx] > 0)
        .map(|idx| HourOfDayStats {
            hour: format!("{idx:02}:00"),
            transactions: txn_counts[idx],
            customers: customers[idx].len() as i64,
            revenue: revenues[idx],
            avg_check: stats::round2(revenues[idx] / txn_counts[idx] as f64),
        })
        .collect()
}

// ── Monthly / weekly trends ──────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct MonthlyTrend {
    pub month: String,
    pub transactions: i64,
    pub customers: i64,
    pub new_customers: i64,
    pub revenue: f64,
    pub discount_amount: f64,
    pub avg_check: f64,
    pub mom_growth_pct: Option<f64>,
}

/// Monthly totals over the trailing window. A customer counts as new in
/// the month of their first transaction ever, not first in the window.
pub fn monthly_trends(transactions: &[TransactionFact], config: &EngineConfig) -> Vec<MonthlyTrend> {
    let cutoff = shift_months(month_floor_date(config.today), -MONTHLY_TREND_MONTHS);

    let mut first_month: BTreeMap<&str, NaiveDate> = BTreeMap::new();
    for txn in transactions {
        if let Some(customer) = txn.customer_id.as_deref() {
            let month = month_floor(txn.date);
            first_month
                .entry(customer)
                .and_modify(|m| *m = (*m).min(month))
                .or_insert(month);
        }
    }

    struct Acc<'a> {
        transactions: i64,
        customers: BTreeSet<&'a str>,
        new_customers: i64,
        revenue: f64,
        discount_amount: f64,
    }

    let mut by_month: BTreeMap<NaiveDate, Acc> = BTreeMap::new();
    for txn in transactions {
        let month = month_floor(txn.date);
        if month < cutoff {
            continue;
        }
        let acc = by_month.entry(month).or_insert_with(|| Acc {
            transactions: 0,
            customers: BTreeSet::new(),
            new_customers: 0,
            revenue: 0.0,
            discount_amount: 0.0,
        });
        acc.transactions += 1;
        acc.revenue += txn.amount;
        acc.discount_amount += txn.amount_before_discount - txn.amount;
        if let Some(customer) = txn.customer_id.as_deref() {
            if acc.customers.insert(customer) && first_month[customer] == month {
                acc.new_customers += 1;
            }
        }
    }

    let mut rows = Vec::with_capacity(by_month.len());
    let mut prev_revenue: Option<f64> = None;
    for (month, acc) in by_month {
        let mom_growth_pct = match prev_revenue {
            Some(prev) if prev > 0.0 => {
                Some(stats::round2(100.0 * (acc.revenue - prev) / prev))
            }
            _ => None,
        };
        prev_revenue = Some(acc.revenue);
        rows.push(MonthlyTrend {
            month: month.format("%Y-%m").to_string(),
            transactions: acc.transactions,
            customers: acc.customers.len() as i64,
            new_customers: acc.new_customers,
            revenue: acc.revenue,
            discount_amount: acc.discount_amount,
            avg_check: stats::round2(acc.revenue / acc.transactions.max(1) as f64),
            mom_growth_pct,
        });
    }
    rows
}

#[derive(Debug, Clone, Serialize)]
pub struct WeeklyTrend {
    pub week: String,
    pub transactions: i64,
    pub customers: i64,
    pub revenue: f64,
    pub wow_growth_pct: Option<f64>,
}

pub fn weekly_trends(transactions: &[TransactionFact], config: &EngineConfig) -> Vec<WeeklyTrend> {
    let cutoff = config.today - chrono::Duration::weeks(WEEKLY_TREND_WEEKS);

    struct Acc<'a> {
        transactions: i64,
        customers: BTreeSet<&'a str>,
        revenue: f64,
    }

    let mut by_week: BTreeMap<NaiveDate, Acc> = BTreeMap::new();
    for txn in transactions {
        let week = week_floor(txn.date);
        if week < cutoff {
            continue;
        }
        let acc = by_week.entry(week).or_insert_with(|| Acc {
            transactions: 0,
            customers: BTreeSet::new(),
            revenue: 0.0,
        });
        acc.transactions += 1;
        acc.revenue += txn.amount;
        if let Some(customer) = txn.customer_id.as_deref() {
            acc.customers.insert(customer);
        }
    }

    let mut rows = Vec::with_capacity(by_week.len());
    let mut prev_revenue: Option<f64> = None;
    for (week, acc) in by_week {
        let wow_growth_pct = match prev_revenue {
            Some(prev) if prev > 0.0 => {
                Some(stats::round2(100.0 * (acc.revenue - prev) / prev))
            }
            _ => None,
        };
        prev_revenue = Some(acc.revenue);
        rows.push(WeeklyTrend {
            week: week.format("%Y-W%W").to_string(),
            transactions: acc.transactions,
            customers: acc.customers.len() as i64,
            revenue: acc.revenue,
            wow_growth_pct,
        });
    }
    rows
}

// ── Seasonality ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct MonthSeasonality {
    pub month_number: u32,
    pub transactions: i64,
    pub revenue: f64,
    pub seasonality_index: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Seasonality {
    pub months: Vec<MonthSeasonality>,
    pub peak_months: Vec<u32>,
    pub low_months: Vec<u32>,
    pub seasonal_variation_pct: f64,
}

/// Calendar-month seasonality index: 100 means an even twelfth of
/// annual revenue.
pub fn seasonality(transactions: &[TransactionFact]) -> Seasonality {
    let mut txn_counts = [0i64; 12];
    let mut revenues = [0.0f64; 12];
    for txn in transactions {
        let idx = txn.date.month0() as usize;
        txn_counts[idx] += 1;
        revenues[idx] += txn.amount;
    }

    let total: f64 = revenues.iter().sum();
    let baseline = total / 12.0;

    let months: Vec<MonthSeasonality> = (0..12)
        .filter(|&idx| txn_counts[idx] > 0)
        .map(|idx| MonthSeasonality {
            month_number: idx as u32 + 1,
            transactions: txn_counts[idx],
            revenue: revenues[idx],
            seasonality_index: if baseline > 0.0 {
                stats::round1(100.0 * revenues[idx] / baseline)
            } else {
                100.0
            },
        })
        .collect();

    let mut ranked: Vec<&MonthSeasonality> = months.iter().collect();
    ranked.sort_by(|a, b| {
        b.revenue
            .partial_cmp(&a.revenue)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.month_number.cmp(&b.month_number))
    });
    let peak_months: Vec<u32> = ranked.iter().take(3).map(|m| m.month_number).collect();
    let low_months: Vec<u32> =
        ranked.iter().rev().take(3).map(|m| m.month_number).collect();

    let max_revenue = revenues.iter().cloned().fold(0.0, f64::max);
    let active_min = (0..12)
        .filter(|&idx| txn_counts[idx] > 0)
        .map(|idx| revenues[idx])
        .fold(f64::MAX, f64::min);
    let seasonal_variation_pct = if max_revenue > 0.0 && active_min < f64::MAX {
        stats::round1(100.0 * (max_revenue - active_min) / max_revenue)
    } else {
        0.0
    };

    Seasonality { months, peak_months, low_months, seasonal_variation_pct }
}

// ── Cohorts ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct RetentionCohort {
    pub cohort: String,
    pub cohort_size: i64,
    pub retention: BTreeMap<String, f64>,
}

fn cohort_assignments(transactions: &[TransactionFact]) -> BTreeMap<&str, NaiveDate> {
    let mut cohorts: BTreeMap<&str, NaiveDate> = BTreeMap::new();
    for txn in transactions {
        if let Some(customer) = txn.customer_id.as_deref() {
            let month = month_floor(txn.date);
            cohorts
                .entry(customer)
                .and_modify(|m| *m = (*m).min(month))
                .or_insert(month);
        }
    }
    cohorts
}

/// Monthly acquisition cohorts with retention by months-since-first-
/// purchase. Only months where the cohort actually came back appear in
/// the retention map.
pub fn cohort_retention(
    transactions: &[TransactionFact],
    config: &EngineConfig,
) -> Vec<RetentionCohort> {
    let window_start = shift_months(month_floor_date(config.today), -COHORT_MONTHS);
    let cohorts = cohort_assignments(transactions);

    let mut cohort_sizes: BTreeMap<NaiveDate, BTreeSet<&str>> = BTreeMap::new();
    for (customer, cohort) in &cohorts {
        if *cohort >= window_start {
            cohort_sizes.entry(*cohort).or_default().insert(customer);
        }
    }

    // (cohort, month offset) → customers seen in that month
    let mut activity: BTreeMap<(NaiveDate, i32), BTreeSet<&str>> = BTreeMap::new();
    for txn in transactions {
        let Some(customer) = txn.customer_id.as_deref() else { continue };
        let cohort = cohorts[customer];
        if cohort < window_start {
            continue;
        }
        let offset = months_between(cohort, month_floor(txn.date));
        if (0..=COHORT_MONTHS).contains(&offset) {
            activity.entry((cohort, offset)).or_default().insert(customer);
        }
    }

    cohort_sizes
        .into_iter()
        .map(|(cohort, members)| {
            let size = members.len() as i64;
            let mut retention = BTreeMap::new();
            for offset in 0..=COHORT_MONTHS {
                if let Some(active) = activity.get(&(cohort, offset)) {
                    retention.insert(
                        format!("month_{offset}"),
                        stats::round1(100.0 * active.len() as f64 / size.max(1) as f64),
                    );
                }
            }
            RetentionCohort {
                cohort: cohort.format("%Y-%m").to_string(),
                cohort_size: size,
                retention,
            }
        })
        .collect()
}

#[derive(Debug, Clone, Serialize)]
pub struct RevenueCohort {
    pub cohort: String,
    pub cohort_size: i64,
    pub transactions: i64,
    pub revenue: f64,
    pub avg_check: f64,
    pub revenue_per_customer: f64,
    pub orders_per_customer: f64,
}

pub fn cohort_revenue(
    transactions: &[TransactionFact],
    config: &EngineConfig,
) -> Vec<RevenueCohort> {
    let window_start = shift_months(month_floor_date(config.today), -COHORT_MONTHS);
    let cohorts = cohort_assignments(transactions);

    struct Acc<'a> {
        members: BTreeSet<&'a str>,
        transactions: i64,
        revenue: f64,
    }

    let mut by_cohort: BTreeMap<NaiveDate, Acc> = BTreeMap::new();
    for txn in transactions {
        let Some(customer) = txn.customer_id.as_deref() else { continue };
        let cohort = cohorts[customer];
        if cohort < window_start {
            continue;
        }
        let acc = by_cohort.entry(cohort).or_insert_with(|| Acc {
            members: BTreeSet::new(),
            transactions: 0,
            revenue: 0.0,
        });
        acc.members.insert(customer);
        acc.transactions += 1;
        acc.revenue += txn.amount;
    }

    by_cohort
        .into_iter()
        .map(|(cohort, acc)| {
            let size = acc.members.len() as i64;
            RevenueCohort {
                cohort: cohort.format("%Y-%m").to_string(),
                cohort_size: size,
                transactions: acc.transactions,
                revenue: acc.revenue,
                avg_check: stats::round2(acc.revenue / acc.transactions.max(1) as f64),
                revenue_per_customer: stats::round2(acc.revenue / size.max(1) as f64),
                orders_per_customer: stats::round2(acc.transactions as f64 / size.max(1) as f64),
            }
        })
        .collect()
}

// ── Year over year ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct YearStats {
    pub year: i32,
    pub transactions: i64,
    pub customers: i64,
    pub revenue: f64,
    pub avg_check: f64,
    pub revenue_growth_pct: Option<f64>,
    pub transactions_growth_pct: Option<f64>,
}

pub fn yoy_comparison(transactions: &[TransactionFact]) -> Vec<YearStats> {
    struct Acc<'a> {
        transactions: i64,
        customers: BTreeSet<&'a str>,
        revenue: f64,
    }

    let mut by_year: BTreeMap<i32, Acc> = BTreeMap::new();
    for txn in transactions {
        let acc = by_year.entry(txn.date.year()).or_insert_with(|| Acc {
            transactions: 0,
            customers: BTreeSet::new(),
            revenue: 0.0,
        });
        acc.transactions += 1;
        acc.revenue += txn.amount;
        if let Some(customer) = txn.customer_id.as_deref() {
            acc.customers.insert(customer);
        }
    }

    let mut rows = Vec::with_capacity(by_year.len());
    let mut prev: Option<(f64, i64)> = None;
    for (year, acc) in by_year {
        let revenue_growth_pct = match prev {
            Some((prev_revenue, _)) if prev_revenue > 0.0 => {
                Some(stats::round2(100.0 * (acc.revenue - prev_revenue) / prev_revenue))
            }
            _ => None,
        };
        let transactions_growth_pct = match prev {
            Some((_, prev_txns)) if prev_txns > 0 => Some(stats::round2(
                100.0 * (acc.transactions - prev_txns) as f64 / prev_txns as f64,
            )),
            _ => None,
        };
        prev = Some((acc.revenue, acc.transactions));
        rows.push(YearStats {
            year,
            transactions: acc.transactions,
            customers: acc.customers.len() as i64,
            revenue: acc.revenue,
            avg_check: stats::round2(acc.revenue / acc.transactions.max(1) as f64),
            revenue_growth_pct,
            transactions_growth_pct,
        });
    }
    rows
}

// ── Peak periods ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct PeakDay {
    pub date: String,
    pub day_name: String,
    pub transactions: i64,
    pub revenue: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PeakHour {
    pub hour: String,
    pub transactions: i64,
    pub revenue: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PeakPeriods {
    pub top_days: Vec<PeakDay>,
    pub top_hours: Vec<PeakHour>,
}

/// Best revenue days within the trailing year and the strongest hours
/// over the whole history.
pub fn peak_periods(transactions: &[TransactionFact], config: &EngineConfig) -> PeakPeriods {
    let cutoff = config.today - chrono::Duration::days(PEAK_WINDOW_DAYS);

    let mut by_day: BTreeMap<NaiveDate, (i64, f64)> = BTreeMap::new();
    for txn in transactions {
        let day = txn.date.date();
        if day < cutoff {
            continue;
        }
        let entry = by_day.entry(day).or_insert((0, 0.0));
        entry.0 += 1;
        entry.1 += txn.amount;
    }

    let mut top_days: Vec<PeakDay> = by_day
        .into_iter()
        .map(|(day, (transactions, revenue))| PeakDay {
            date: day.format("%Y-%m-%d").to_string(),
            day_name: day.format("%A").to_string(),
            transactions,
            revenue,
        })
        .collect();
    top_days.sort_by(|a, b| {
        b.revenue
            .partial_cmp(&a.revenue)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.date.cmp(&b.date))
    });
    top_days.truncate(PEAK_DAYS_LIMIT);

    let mut top_hours = hour_of_day(transactions)
        .into_iter()
        .map(|h| PeakHour { hour: h.hour, transactions: h.transactions, revenue: h.revenue })
        .collect::<Vec<_>>();
    top_hours.sort_by(|a, b| {
        b.revenue
            .partial_cmp(&a.revenue)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.hour.cmp(&b.hour))
    });
    top_hours.truncate(PEAK_HOURS_LIMIT);

    PeakPeriods { top_days, top_hours }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn txn(id: &str, customer: &str, ymd: (i32, u32, u32), hour: u32, amount: f64) -> TransactionFact {
        TransactionFact {
            id: id.into(),
            customer_id: Some(customer.into()),
            date: NaiveDate::from_ymd_opt(ymd.0, ymd.1, ymd.2)
                .unwrap()
                .and_hms_opt(hour, 0, 0)
                .unwrap(),
            amount,
            amount_before_discount: amount,
            items_count: 1.0,
        }
    }

    #[test]
    fn day_of_week_starts_at_sunday() {
        // 2024-03-03 is a Sunday, 2024-03-04 a Monday.
        let txns = vec![
            txn("t1", "c1", (2024, 3, 3), 12, 100.0),
            txn("t2", "c2", (2024, 3, 4), 12, 50.0),
        ];
        let rows = day_of_week(&txns);
        assert_eq!(rows[0].day_number, 0);
        assert_eq!(rows[0].day_name, "Sunday");
        assert_eq!(rows[1].day_name, "Monday");
    }

    #[test]
    fn monthly_trends_flag_new_customers_by_first_ever_month() {
        let config = EngineConfig::with_today(NaiveDate::from_ymd_opt(2024, 6, 15).unwrap());
        let txns = vec![
            txn("t1", "c1", (2024, 2, 1), 10, 100.0),
            txn("t2", "c1", (2024, 3, 1), 10, 100.0),
            txn("t3", "c2", (2024, 3, 5), 10, 200.0),
        ];
        let rows = monthly_trends(&txns, &config);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].month, "2024-02");
        assert_eq!(rows[0].new_customers, 1);
        // c1 returns in March but is only new in February.
        assert_eq!(rows[1].new_customers, 1);
        assert_eq!(rows[1].customers, 2);
        assert!((rows[1].mom_growth_pct.unwrap() - 200.0).abs() < 1e-9);
    }

    #[test]
    fn cohort_retention_tracks_return_months() {
        let config = EngineConfig::with_today(NaiveDate::from_ymd_opt(2024, 6, 15).unwrap());
        let txns = vec![
            txn("t1", "c1", (2024, 1, 10), 10, 100.0),
            txn("t2", "c1", (2024, 3, 10), 10, 100.0),
            txn("t3", "c2", (2024, 1, 20), 10, 100.0),
        ];
        let cohorts = cohort_retention(&txns, &config);
        assert_eq!(cohorts.len(), 1);
        assert_eq!(cohorts[0].cohort, "2024-01");
        assert_eq!(cohorts[0].cohort_size, 2);
        assert!((cohorts[0].retention["month_0"] - 100.0).abs() < 1e-9);
        assert!((cohorts[0].retention["month_2"] - 50.0).abs() < 1e-9);
        assert!(!cohorts[0].retention.contains_key("month_1"));
    }
}
