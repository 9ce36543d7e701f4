//! Fixed calendar windows with left-join semantics: every bucket is emitted,
//! in chronological order, whether or not any event falls into it.

use chrono::{Datelike, Days, Months, NaiveDate, NaiveDateTime};

use super::labels::{month_label, weekday_label};
use super::views::{DailyBucket, MonthlyRateBucket};
use crate::clinic::domain::{Appointment, Visit};

pub const DAILY_WINDOW: u64 = 7;
pub const MONTHLY_WINDOW: u32 = 6;

/// Anything that happened on a calendar day.
pub trait Dated {
    fn date(&self) -> NaiveDate;
}

impl Dated for NaiveDate {
    fn date(&self) -> NaiveDate {
        *self
    }
}

impl Dated for NaiveDateTime {
    fn date(&self) -> NaiveDate {
        NaiveDateTime::date(self)
    }
}

impl Dated for Appointment {
    fn date(&self) -> NaiveDate {
        self.scheduled_at.date()
    }
}

impl Dated for Visit {
    fn date(&self) -> NaiveDate {
        self.performed_at.date()
    }
}

/// The seven days ending on `today`, oldest first.
pub fn daily_window(today: NaiveDate) -> Vec<NaiveDate> {
    (0..DAILY_WINDOW)
        .rev()
        .filter_map(|offset| today.checked_sub_days(Days::new(offset)))
        .collect()
}

/// First day of each of the six months ending with `today`'s month, oldest first.
pub fn monthly_window(today: NaiveDate) -> Vec<NaiveDate> {
    let current_month = today - Days::new(u64::from(today.day0()));
    (0..MONTHLY_WINDOW)
        .rev()
        .filter_map(|offset| current_month.checked_sub_months(Months::new(offset)))
        .collect()
}

fn same_month(left: NaiveDate, right: NaiveDate) -> bool {
    left.year() == right.year() && left.month() == right.month()
}

/// Count events per day over the last seven days.
pub fn build_daily_buckets<E: Dated>(today: NaiveDate, events: &[E]) -> Vec<DailyBucket> {
    daily_window(today)
        .into_iter()
        .map(|day| DailyBucket {
            date: day,
            label: weekday_label(day),
            count: events.iter().filter(|event| event.date() == day).count() as u64,
        })
        .collect()
}

/// Percentage of `denominator` events that also satisfy `numerator`, per month.
///
/// Months without denominator events report a rate of zero.
pub fn build_monthly_rate_buckets<E, N, D>(
    today: NaiveDate,
    numerator: N,
    denominator: D,
    events: &[E],
) -> Vec<MonthlyRateBucket>
where
    E: Dated,
    N: Fn(&E) -> bool,
    D: Fn(&E) -> bool,
{
    monthly_window(today)
        .into_iter()
        .map(|month| {
            let (matched, total) = events
                .iter()
                .filter(|event| same_month(event.date(), month) && denominator(*event))
                .fold((0u64, 0u64), |(matched, total), event| {
                    (matched + u64::from(numerator(event)), total + 1)
                });

            let raw_rate = if total == 0 {
                0.0
            } else {
                matched as f64 * 100.0 / total as f64
            };

            MonthlyRateBucket {
                month,
                label: month_label(month),
                rate: round_one_decimal(raw_rate),
                raw_rate,
            }
        })
        .collect()
}

pub fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
