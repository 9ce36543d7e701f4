use axum::extract::State;

use super::{data, Handled, SharedService};

pub(crate) async fn dashboard_stats(State(service): State<SharedService>) -> Handled {
    Ok(data(service.dashboard_stats()?))
}

pub(crate) async fn weekly_visits(State(service): State<SharedService>) -> Handled {
    Ok(data(service.weekly_visits()?))
}

/// Shared by the dashboard card and the reports page.
pub(crate) async fn no_show(State(service): State<SharedService>) -> Handled {
    Ok(data(service.no_show_rates()?))
}

pub(crate) async fn notifications(State(service): State<SharedService>) -> Handled {
    Ok(data(service.recent_notifications()?))
}

pub(crate) async fn visits_by_professional(State(service): State<SharedService>) -> Handled {
    Ok(data(service.visits_by_professional()?))
}

pub(crate) async fn visit_types(State(service): State<SharedService>) -> Handled {
    Ok(data(service.visit_types()?))
}

pub(crate) async fn weekly_activity(State(service): State<SharedService>) -> Handled {
    Ok(data(service.weekly_activity()?))
}
