use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

use crate::clinic::domain::RecordId;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyBucket {
    #[serde(skip)]
    pub date: NaiveDate,
    pub label: &'static str,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyRateBucket {
    #[serde(skip)]
    pub month: NaiveDate,
    pub label: &'static str,
    /// Percentage rounded to one decimal.
    pub rate: f64,
    #[serde(skip)]
    pub raw_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WeeklyActivityEntry {
    pub label: &'static str,
    pub scheduled: u64,
    pub performed: u64,
}

/// Generic `{name, value}` pair consumed by the report charts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NamedCount {
    pub name: String,
    pub value: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpcomingAppointment {
    pub id: RecordId,
    pub scheduled_at: NaiveDateTime,
    pub patient_name: String,
    pub professional_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardStats {
    pub active_patients: u64,
    pub appointments_today: u64,
    pub visits_today: u64,
    pub attendance_rate: f64,
    pub upcoming: Vec<UpcomingAppointment>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotificationView {
    pub id: RecordId,
    pub kind: String,
    pub message: String,
    pub elapsed: String,
}
