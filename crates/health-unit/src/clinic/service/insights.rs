use tracing::debug;

use super::{newest_first, ClinicError, ClinicService};
use crate::clinic::domain::RecordStatus;
use crate::clinic::report::{
    attendance_rate, build_daily_buckets, no_show_trend, ranked_counts, relative_time_label,
    upcoming_confirmed, weekly_activity, DailyBucket, DashboardStats, MonthlyRateBucket,
    NamedCount, NotificationView, UpcomingAppointment, WeeklyActivityEntry,
};

const UPCOMING_LIMIT: usize = 5;
const NOTIFICATION_LIMIT: usize = 5;

impl ClinicService {
    pub fn dashboard_stats(&self) -> Result<DashboardStats, ClinicError> {
        let now = self.clock.now();
        let today = now.date();
        let appointments = self.store.appointments.list()?;
        let directory = self.directory()?;

        let active_patients = directory
            .patients
            .values()
            .filter(|patient| patient.status == RecordStatus::Active)
            .count() as u64;
        let appointments_today = appointments
            .iter()
            .filter(|appointment| appointment.scheduled_at.date() == today)
            .count() as u64;
        let visits_today = self
            .store
            .visits
            .list()?
            .iter()
            .filter(|visit| visit.performed_at.date() == today)
            .count() as u64;

        let upcoming = upcoming_confirmed(now, &appointments, UPCOMING_LIMIT)
            .into_iter()
            .map(|appointment| UpcomingAppointment {
                id: appointment.id,
                scheduled_at: appointment.scheduled_at,
                patient_name: directory
                    .patient_name(appointment.patient_id)
                    .unwrap_or_default(),
                professional_name: directory
                    .professional_name(appointment.professional_id)
                    .unwrap_or_default(),
            })
            .collect();

        Ok(DashboardStats {
            active_patients,
            appointments_today,
            visits_today,
            attendance_rate: attendance_rate(today, &appointments),
            upcoming,
        })
    }

    /// Visits per day over the last seven days.
    pub fn weekly_visits(&self) -> Result<Vec<DailyBucket>, ClinicError> {
        let visits = self.store.visits.list()?;
        Ok(build_daily_buckets(self.clock.today(), &visits))
    }

    /// Monthly no-show percentage; feeds both the dashboard and the reports page.
    pub fn no_show_rates(&self) -> Result<Vec<MonthlyRateBucket>, ClinicError> {
        let appointments = self.store.appointments.list()?;
        Ok(no_show_trend(self.clock.today(), &appointments))
    }

    pub fn recent_notifications(&self) -> Result<Vec<NotificationView>, ClinicError> {
        let now = self.clock.now();
        let mut notifications = self.store.notifications.list()?;
        newest_first(&mut notifications, |notification| {
            (notification.created_at, notification.id)
        });
        notifications.truncate(NOTIFICATION_LIMIT);

        Ok(notifications
            .into_iter()
            .map(|notification| NotificationView {
                id: notification.id,
                elapsed: relative_time_label(notification.created_at, now),
                kind: notification.kind,
                message: notification.message,
            })
            .collect())
    }

    /// Visits per professional; visits whose professional no longer exists are skipped.
    pub fn visits_by_professional(&self) -> Result<Vec<NamedCount>, ClinicError> {
        let directory = self.directory()?;
        let visits = self.store.visits.list()?;
        Ok(ranked_counts(visits.iter().filter_map(|visit| {
            directory.professional_name(visit.professional_id)
        })))
    }

    pub fn visit_types(&self) -> Result<Vec<NamedCount>, ClinicError> {
        let visits = self.store.visits.list()?;
        let ranked = ranked_counts(visits.into_iter().map(|visit| visit.visit_type));
        debug!(types = ranked.len(), "visit type distribution");
        Ok(ranked)
    }

    pub fn weekly_activity(&self) -> Result<Vec<WeeklyActivityEntry>, ClinicError> {
        let appointments = self.store.appointments.list()?;
        let visits = self.store.visits.list()?;
        Ok(weekly_activity(self.clock.today(), &appointments, &visits))
    }
}
