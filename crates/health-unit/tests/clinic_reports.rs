use chrono::{Duration, NaiveDate, NaiveDateTime};
use health_unit::clinic::domain::{Appointment, AppointmentStatus, Visit};
use health_unit::clinic::report::{
    build_daily_buckets, build_monthly_rate_buckets, no_show_trend, weekly_activity,
};
use health_unit::clinic::{is_valid_tax_id, rank_queue, QueueEntry, QueuePriority, QueueStatus};

fn day(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

fn moment(date: NaiveDate, hour: u32) -> NaiveDateTime {
    date.and_hms_opt(hour, 0, 0).expect("valid time")
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

fn visit(id: u64, performed_at: NaiveDateTime) -> Visit {
    Visit {
        id,
        patient_id: 1,
        professional_id: 1,
        visit_type: "Consulta".to_string(),
        performed_at,
        status: None,
        notes: None,
    }
}

/// Deterministic pseudo-random sequence for generated fixtures.
struct Lcg(u64);

impl Lcg {
    fn next(&mut self) -> u64 {
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        self.0 >> 33
    }

    fn below(&mut self, bound: u64) -> u64 {
        self.next() % bound
    }
}

fn tier(priority: QueuePriority) -> u8 {
    match priority {
        QueuePriority::Urgent => 0,
        QueuePriority::Normal => 1,
    }
}

fn generated_queue(rng: &mut Lcg, len: u64) -> Vec<QueueEntry> {
    let opening = moment(day(2024, 1, 10), 7);
    (1..=len)
        .map(|id| QueueEntry {
            id,
            patient_id: id,
            professional_id: 1 + rng.below(3),
            priority: if rng.below(3) == 0 {
                QueuePriority::Urgent
            } else {
                QueuePriority::Normal
            },
            notification_channel: None,
            status: if rng.below(2) == 0 {
                QueueStatus::Waiting
            } else {
                QueueStatus::Notified
            },
            // Few distinct minutes so equal keys are common.
            entered_at: opening + Duration::minutes(rng.below(6) as i64),
        })
        .collect()
}

#[test]
fn tax_id_validation_matches_check_digits() {
    assert!(is_valid_tax_id("529.982.247-25"));
    assert!(is_valid_tax_id("52998224725"));
    assert!(!is_valid_tax_id("529.982.247-24"));
    assert!(!is_valid_tax_id("000.000.000-00"));
    assert!(!is_valid_tax_id("5299822472"));
    assert!(!is_valid_tax_id(""));
}

#[test]
fn queue_ranking_is_stable_within_a_tier() {
    let entered = moment(day(2024, 1, 10), 8);
    let entry = |id, priority| QueueEntry {
        id,
        patient_id: id,
        professional_id: 1,
        priority,
        notification_channel: None,
        status: QueueStatus::Waiting,
        entered_at: entered,
    };
    let entries = vec![
        entry(1, QueuePriority::Normal),
        entry(2, QueuePriority::Urgent),
        entry(3, QueuePriority::Normal),
        entry(4, QueuePriority::Urgent),
    ];

    let order: Vec<u64> = rank_queue(&entries).iter().map(|entry| entry.id).collect();
    assert_eq!(order, vec![2, 4, 1, 3]);
}

#[test]
fn sunday_week_ends_on_dom() {
    let today = day(2024, 1, 7);
    let visits = vec![
        visit(1, moment(day(2024, 1, 1), 9)),
        visit(2, moment(day(2024, 1, 7), 9)),
        visit(3, moment(day(2024, 1, 7), 14)),
        visit(4, moment(day(2023, 12, 31), 9)),
    ];

    let buckets = build_daily_buckets(today, &visits);
    let labels: Vec<&str> = buckets.iter().map(|bucket| bucket.label).collect();
    assert_eq!(labels, vec!["Seg", "Ter", "Qua", "Qui", "Sex", "Sáb", "Dom"]);
    let counts: Vec<u64> = buckets.iter().map(|bucket| bucket.count).collect();
    assert_eq!(counts, vec![1, 0, 0, 0, 0, 0, 2]);
}

#[test]
fn no_show_rate_covers_six_months_with_zero_fill() {
    let today = day(2024, 3, 15);
    let mut appointments: Vec<Appointment> = (1..=10)
        .map(|id| {
            let status = if id <= 2 {
                AppointmentStatus::NoShow
            } else {
                AppointmentStatus::Completed
            };
            appointment(id, moment(day(2024, 3, 1), 8 + id as u32), status)
        })
        .collect();
    appointments.push(appointment(
        11,
        moment(day(2024, 3, 2), 9),
        AppointmentStatus::Cancelled,
    ));
    appointments.push(appointment(
        12,
        moment(day(2024, 1, 20), 9),
        AppointmentStatus::NoShow,
    ));
    appointments.push(appointment(
        13,
        moment(day(2024, 1, 21), 9),
        AppointmentStatus::Completed,
    ));
    appointments.push(appointment(
        14,
        moment(day(2024, 1, 22), 9),
        AppointmentStatus::Completed,
    ));

    let trend = no_show_trend(today, &appointments);
    let labels: Vec<&str> = trend.iter().map(|bucket| bucket.label).collect();
    assert_eq!(labels, vec!["Out", "Nov", "Dez", "Jan", "Fev", "Mar"]);
    let rates: Vec<f64> = trend.iter().map(|bucket| bucket.rate).collect();
    assert_eq!(rates, vec![0.0, 0.0, 0.0, 33.3, 0.0, 20.0]);
}

#[test]
fn weekly_activity_pairs_scheduled_and_performed() {
    let today = day(2024, 1, 7);
    let appointments = vec![
        appointment(1, moment(today, 9), AppointmentStatus::Confirmed),
        appointment(2, moment(today, 10), AppointmentStatus::Cancelled),
        appointment(3, moment(day(2024, 1, 5), 10), AppointmentStatus::Completed),
    ];
    let visits = vec![visit(1, moment(today, 9))];

    let activity = weekly_activity(today, &appointments, &visits);
    assert_eq!(activity.len(), 7);
    let sunday = &activity[6];
    assert_eq!(sunday.label, "Dom");
    assert_eq!((sunday.scheduled, sunday.performed), (1, 1));
    assert_eq!(activity[4].label, "Sex");
    assert_eq!(activity[4].scheduled, 1);
}

#[test]
fn ranking_generated_queues_is_an_ordered_permutation() {
    let mut rng = Lcg(0x5eed);
    for round in 0..200 {
        let entries = generated_queue(&mut rng, round % 17);
        let ranked = rank_queue(&entries);

        let mut ids: Vec<u64> = ranked.iter().map(|entry| entry.id).collect();
        ids.sort_unstable();
        let expected: Vec<u64> = entries.iter().map(|entry| entry.id).collect();
        assert_eq!(ids, expected, "round {round} lost or duplicated entries");

        // Ids were assigned in input order, so they double as arrival positions.
        for pair in ranked.windows(2) {
            let (left, right) = (&pair[0], &pair[1]);
            let left_key = (tier(left.priority), left.entered_at);
            let right_key = (tier(right.priority), right.entered_at);
            assert!(left_key <= right_key, "round {round}: {left:?} before {right:?}");
            if left_key == right_key {
                assert!(left.id < right.id, "round {round}: tie reordered");
            }
        }

        assert_eq!(rank_queue(&ranked), ranked, "round {round} not idempotent");
    }
}

#[test]
fn daily_buckets_count_each_event_on_its_weekday() {
    let events = [day(2024, 1, 5), day(2024, 1, 5), day(2024, 1, 7)];

    let buckets = build_daily_buckets(day(2024, 1, 7), &events);
    let pairs: Vec<(&str, u64)> = buckets
        .iter()
        .map(|bucket| (bucket.label, bucket.count))
        .collect();
    assert_eq!(
        pairs,
        vec![
            ("Seg", 0),
            ("Ter", 0),
            ("Qua", 0),
            ("Qui", 0),
            ("Sex", 2),
            ("Sáb", 0),
            ("Dom", 1),
        ]
    );
}

#[test]
fn no_show_rates_stay_within_percent_bounds() {
    let statuses = [
        AppointmentStatus::Pending,
        AppointmentStatus::Confirmed,
        AppointmentStatus::Completed,
        AppointmentStatus::NoShow,
        AppointmentStatus::Cancelled,
    ];
    let today = day(2024, 3, 15);
    let mut rng = Lcg(42);
    for round in 0..100 {
        let appointments: Vec<Appointment> = (1..=rng.below(40))
            .map(|id| {
                let date = today - Duration::days(rng.below(220) as i64);
                let status = statuses[rng.below(statuses.len() as u64) as usize];
                appointment(id, moment(date, 9), status)
            })
            .collect();

        let trend = no_show_trend(today, &appointments);
        assert_eq!(trend.len(), 6);
        for bucket in &trend {
            assert!(
                (0.0..=100.0).contains(&bucket.rate),
                "round {round}: {} rate {}",
                bucket.label,
                bucket.rate
            );
        }
    }
}

#[test]
fn monthly_rate_is_full_when_every_event_matches() {
    let today = day(2024, 3, 15);
    let events = [day(2024, 3, 1), day(2024, 3, 9), day(2023, 11, 30)];

    let buckets = build_monthly_rate_buckets(today, |_: &NaiveDate| true, |_| true, &events);
    let rates: Vec<f64> = buckets.iter().map(|bucket| bucket.rate).collect();
    assert_eq!(rates, vec![0.0, 100.0, 0.0, 0.0, 0.0, 100.0]);
}
