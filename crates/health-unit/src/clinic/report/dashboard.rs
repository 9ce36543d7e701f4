use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveDateTime};

use super::buckets::{build_daily_buckets, build_monthly_rate_buckets, round_one_decimal};
use super::views::{MonthlyRateBucket, NamedCount, WeeklyActivityEntry};
use crate::clinic::domain::{Appointment, AppointmentStatus, Visit};

/// Share of settled past appointments that were attended.
///
/// Only appointments before `today` marked completed or no-show count.
pub fn attendance_rate(today: NaiveDate, appointments: &[Appointment]) -> f64 {
    let (attended, settled) = appointments
        .iter()
        .filter(|appointment| appointment.scheduled_at.date() < today)
        .fold((0u64, 0u64), |(attended, settled), appointment| {
            match appointment.status {
                AppointmentStatus::Completed => (attended + 1, settled + 1),
                AppointmentStatus::NoShow => (attended, settled + 1),
                _ => (attended, settled),
            }
        });

    if settled == 0 {
        0.0
    } else {
        round_one_decimal(attended as f64 * 100.0 / settled as f64)
    }
}

/// Confirmed appointments at or after `now`, soonest first.
pub fn upcoming_confirmed(
    now: NaiveDateTime,
    appointments: &[Appointment],
    limit: usize,
) -> Vec<Appointment> {
    let mut upcoming: Vec<Appointment> = appointments
        .iter()
        .filter(|appointment| {
            appointment.status == AppointmentStatus::Confirmed && appointment.scheduled_at >= now
        })
        .cloned()
        .collect();
    upcoming.sort_by_key(|appointment| (appointment.scheduled_at, appointment.id));
    upcoming.truncate(limit);
    upcoming
}

/// Scheduled (not cancelled) appointments against performed visits over the last week.
pub fn weekly_activity(
    today: NaiveDate,
    appointments: &[Appointment],
    visits: &[Visit],
) -> Vec<WeeklyActivityEntry> {
    let scheduled: Vec<NaiveDate> = appointments
        .iter()
        .filter(|appointment| appointment.status != AppointmentStatus::Cancelled)
        .map(|appointment| appointment.scheduled_at.date())
        .collect();

    build_daily_buckets(today, &scheduled)
        .into_iter()
        .zip(build_daily_buckets(today, visits))
        .map(|(scheduled, performed)| WeeklyActivityEntry {
            label: scheduled.label,
            scheduled: scheduled.count,
            performed: performed.count,
        })
        .collect()
}

/// Monthly no-show percentage over appointments that were not cancelled.
pub fn no_show_trend(today: NaiveDate, appointments: &[Appointment]) -> Vec<MonthlyRateBucket> {
    build_monthly_rate_buckets(
        today,
        |appointment: &Appointment| appointment.status == AppointmentStatus::NoShow,
        |appointment: &Appointment| appointment.status != AppointmentStatus::Cancelled,
        appointments,
    )
}

/// Count occurrences per name, largest first, ties broken alphabetically.
pub fn ranked_counts<I>(names: I) -> Vec<NamedCount>
where
    I: IntoIterator<Item = String>,
{
    let mut counts: BTreeMap<String, u64> = BTreeMap::new();
    for name in names {
        *counts.entry(name).or_default() += 1;
    }

    let mut ranked: Vec<NamedCount> = counts
        .into_iter()
        .map(|(name, value)| NamedCount { name, value })
        .collect();
    ranked.sort_by(|left, right| {
        right
            .value
            .cmp(&left.value)
            .then_with(|| left.name.cmp(&right.name))
    });
    ranked
}

/// "N min atrás" under an hour, "N h atrás" under a day, `dd/mm HH:MM` beyond.
pub fn relative_time_label(created_at: NaiveDateTime, now: NaiveDateTime) -> String {
    let minutes = (now - created_at).num_minutes().max(0);
    if minutes < 60 {
        format!("{minutes} min atrás")
    } else if minutes < 24 * 60 {
        format!("{} h atrás", minutes / 60)
    } else {
        created_at.format("%d/%m %H:%M").to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn at(day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, day)
            .and_then(|date| date.and_hms_opt(hour, 0, 0))
            .expect("valid timestamp")
    }

    fn appointment(id: u64, scheduled_at: NaiveDateTime, status: AppointmentStatus) -> Appointment {
        Appointment {
            id,
            patient_id: 1,
            professional_id: 1,
            scheduled_at,
            status,
        }
    }

    #[test]
    fn attendance_counts_only_settled_past_appointments() {
        let today = NaiveDate::from_ymd_opt(2024, 1, 10).expect("valid date");
        let appointments = vec![
            appointment(1, at(2, 9), AppointmentStatus::Completed),
            appointment(2, at(3, 9), AppointmentStatus::Completed),
            appointment(3, at(4, 9), AppointmentStatus::NoShow),
            appointment(4, at(5, 9), AppointmentStatus::Cancelled),
            appointment(5, at(10, 9), AppointmentStatus::NoShow),
        ];

        assert_eq!(attendance_rate(today, &appointments), 66.7);
        assert_eq!(attendance_rate(today, &[]), 0.0);
    }

    #[test]
    fn upcoming_keeps_confirmed_future_in_order() {
        let now = at(10, 8);
        let appointments = vec![
            appointment(1, at(12, 9), AppointmentStatus::Confirmed),
            appointment(2, at(11, 9), AppointmentStatus::Confirmed),
            appointment(3, at(11, 10), AppointmentStatus::Pending),
            appointment(4, at(9, 9), AppointmentStatus::Confirmed),
        ];

        let ids: Vec<u64> = upcoming_confirmed(now, &appointments, 5)
            .iter()
            .map(|appointment| appointment.id)
            .collect();
        assert_eq!(ids, vec![2, 1]);
        assert_eq!(upcoming_confirmed(now, &appointments, 1).len(), 1);
    }

    #[test]
    fn weekly_activity_skips_cancelled_schedule() {
        let today = NaiveDate::from_ymd_opt(2024, 1, 7).expect("valid date");
        let appointments = vec![
            appointment(1, at(7, 9), AppointmentStatus::Confirmed),
            appointment(2, at(7, 10), AppointmentStatus::Cancelled),
        ];
        let visits = vec![Visit {
            id: 1,
            patient_id: 1,
            professional_id: 1,
            visit_type: "Consulta".to_string(),
            performed_at: at(6, 11),
            status: None,
            notes: None,
        }];

        let activity = weekly_activity(today, &appointments, &visits);
        assert_eq!(activity.len(), 7);
        assert_eq!(
            activity[6],
            WeeklyActivityEntry {
                label: "Dom",
                scheduled: 1,
                performed: 0
            }
        );
        assert_eq!(activity[5].performed, 1);
    }

    #[test]
    fn ranked_counts_break_ties_by_name() {
        let names = ["Retorno", "Consulta", "Exame", "Consulta", "Exame"]
            .into_iter()
            .map(str::to_string);
        let ranked = ranked_counts(names);
        let order: Vec<(&str, u64)> = ranked
            .iter()
            .map(|entry| (entry.name.as_str(), entry.value))
            .collect();
        assert_eq!(order, vec![("Consulta", 2), ("Exame", 2), ("Retorno", 1)]);
    }

    #[test]
    fn relative_labels_scale_with_age() {
        let now = at(10, 12);
        assert_eq!(relative_time_label(now - Duration::minutes(5), now), "5 min atrás");
        assert_eq!(relative_time_label(now - Duration::hours(3), now), "3 h atrás");
        assert_eq!(relative_time_label(at(8, 9), now), "08/01 09:00");
        assert_eq!(relative_time_label(now + Duration::minutes(2), now), "0 min atrás");
    }
}
