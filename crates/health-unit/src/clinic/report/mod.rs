//! Dashboard and report series built from appointments and visits.

pub mod buckets;
pub mod dashboard;
pub mod labels;
pub mod views;

pub use buckets::{
    build_daily_buckets, build_monthly_rate_buckets, daily_window, monthly_window, Dated,
};
pub use dashboard::{
    attendance_rate, no_show_trend, ranked_counts, relative_time_label, upcoming_confirmed,
    weekly_activity,
};
pub use labels::{month_label, weekday_label};
pub use views::{
    DailyBucket, DashboardStats, MonthlyRateBucket, NamedCount, NotificationView,
    UpcomingAppointment, WeeklyActivityEntry,
};
