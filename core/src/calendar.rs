//! Calendar arithmetic shared by the trend and cohort recipes.

use chrono::{Datelike, NaiveDate, NaiveDateTime};

/// First day of the timestamp's calendar month.
pub fn month_floor(ts: NaiveDateTime) -> NaiveDate {
    NaiveDate::from_ymd_opt(ts.year(), ts.month(), 1).expect("first of month is valid")
}

/// First day of the date's calendar month.
pub fn month_floor_date(date: NaiveDate) -> NaiveDate {
    NaiveDate::from_ymd_opt(date.year(), date.month(), 1).expect("first of month is valid")
}

/// Shift a first-of-month date by a signed number of months.
pub fn shift_months(month_start: NaiveDate, months: i32) -> NaiveDate {
    let absolute = month_start.year() * 12 + month_start.month0() as i32 + months;
    let year = absolute.div_euclid(12);
    let month0 = absolute.rem_euclid(12) as u32;
    NaiveDate::from_ymd_opt(year, month0 + 1, 1).expect("first of month is valid")
}

/// Whole months between two first-of-month dates (b − a).
pub fn months_between(a: NaiveDate, b: NaiveDate) -> i32 {
    (b.year() - a.year()) * 12 + b.month() as i32 - a.month() as i32
}

/// Monday on or before the timestamp's date.
pub fn week_floor(ts: NaiveDateTime) -> NaiveDate {
    let date = ts.date();
    date - chrono::Duration::days(date.weekday().num_days_from_monday() as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shift_months_crosses_year_boundaries() {
        let jan = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        assert_eq!(shift_months(jan, -1), NaiveDate::from_ymd_opt(2023, 12, 1).unwrap());
        assert_eq!(shift_months(jan, 13), NaiveDate::from_ymd_opt(2025, 2, 1).unwrap());
    }

    #[test]
    fn week_floor_lands_on_monday() {
        // 2024-03-01 is a Friday.
        let friday = NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(15, 30, 0)
            .unwrap();
        assert_eq!(week_floor(friday), NaiveDate::from_ymd_opt(2024, 2, 26).unwrap());
    }
}
