//! HTTP surface of the clinic service.
//!
//! Every route except `/api/login` sits behind the bearer-token layer, which
//! places the caller's [`Session`](crate::clinic::auth::Session) in the
//! request extensions. Handlers check the role before calling the service.

mod auth;
mod network;
mod queue;
mod records;
mod reports;

use std::sync::Arc;

use axum::{
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::Serialize;
use tracing::error;

use super::auth::Role;
use super::domain::RecordId;
use super::service::{ClinicError, ClinicService};
use super::store::RepositoryError;

pub use auth::require_session;

pub(crate) type SharedService = Arc<ClinicService>;
pub(crate) type Handled = Result<Response, ClinicError>;

pub(crate) const ADMIN: &[Role] = &[Role::Administrator];
pub(crate) const FRONT_DESK: &[Role] = &[Role::Administrator, Role::Receptionist];
pub(crate) const CLINICAL: &[Role] = &[Role::Administrator, Role::Professional];
pub(crate) const STAFF: &[Role] = &[Role::Administrator, Role::Receptionist, Role::Professional];

/// Router builder exposing every clinic endpoint.
pub fn clinic_router(service: Arc<ClinicService>) -> Router {
    let protected = Router::new()
        .route(
            "/api/patients",
            post(records::create_patient).get(records::list_patients),
        )
        .route(
            "/api/patients/:id",
            put(records::update_patient).delete(records::delete_patient),
        )
        .route("/api/patients/:id/chart", get(records::patient_chart))
        .route(
            "/api/professionals",
            post(records::create_professional).get(records::list_professionals),
        )
        .route(
            "/api/professionals/:id",
            put(records::update_professional).delete(records::delete_professional),
        )
        .route(
            "/api/users",
            post(records::create_user).get(records::list_users),
        )
        .route(
            "/api/users/:id",
            put(records::update_user).delete(records::delete_user),
        )
        .route(
            "/api/appointments",
            post(records::create_appointment).get(records::list_appointments),
        )
        .route(
            "/api/appointments/:id",
            put(records::update_appointment).delete(records::delete_appointment),
        )
        .route(
            "/api/visits",
            post(records::create_visit).get(records::list_visits),
        )
        .route(
            "/api/visits/:id",
            put(records::update_visit).delete(records::delete_visit),
        )
        .route(
            "/api/clinical-notes",
            post(records::create_clinical_note).get(records::list_clinical_notes),
        )
        .route(
            "/api/clinical-notes/:id",
            put(records::update_clinical_note).delete(records::delete_clinical_note),
        )
        .route("/api/certificates", post(records::issue_certificate))
        .route("/api/certificates/:id", get(records::certificate))
        .route(
            "/api/instructions",
            post(records::create_instruction).get(records::list_instructions),
        )
        .route("/api/instructions/:id", delete(records::delete_instruction))
        .route(
            "/api/schedule-preferences",
            post(records::create_schedule_preference).get(records::list_schedule_preferences),
        )
        .route(
            "/api/schedule-preferences/:id",
            put(records::update_schedule_preference).delete(records::delete_schedule_preference),
        )
        .route(
            "/api/waiting-queue",
            post(queue::enqueue).get(queue::ranked_queue),
        )
        .route(
            "/api/waiting-queue/:id",
            put(queue::update_status).delete(queue::complete),
        )
        .route(
            "/api/health-units",
            get(network::list_health_units).post(network::create_health_unit),
        )
        .route(
            "/api/health-units/:id",
            put(network::update_health_unit).delete(network::delete_health_unit),
        )
        .route(
            "/api/training-materials",
            get(network::list_training_materials).post(network::create_training_material),
        )
        .route(
            "/api/training-materials/access",
            post(network::record_material_access),
        )
        .route(
            "/api/training-materials/:id",
            delete(network::delete_training_material),
        )
        .route("/api/logs", get(network::access_logs))
        .route(
            "/api/inter-unit-access",
            get(network::list_inter_unit_access).post(network::record_inter_unit_access),
        )
        .route("/api/dashboard/stats", get(reports::dashboard_stats))
        .route("/api/dashboard/weekly-visits", get(reports::weekly_visits))
        .route("/api/dashboard/no-show", get(reports::no_show))
        .route("/api/dashboard/notifications", get(reports::notifications))
        .route(
            "/api/reports/visits-by-professional",
            get(reports::visits_by_professional),
        )
        .route("/api/reports/visit-types", get(reports::visit_types))
        .route("/api/reports/weekly-activity", get(reports::weekly_activity))
        .route("/api/reports/no-show", get(reports::no_show))
        .route_layer(middleware::from_fn_with_state(
            service.tokens(),
            require_session,
        ));

    Router::new()
        .route("/api/login", post(auth::login))
        .merge(protected)
        .with_state(service)
}

#[derive(Serialize)]
struct DataEnvelope<T> {
    success: bool,
    data: T,
}

#[derive(Serialize)]
struct CreatedEnvelope {
    success: bool,
    id: RecordId,
}

#[derive(Serialize)]
struct MessageEnvelope {
    success: bool,
    message: &'static str,
}

#[derive(Serialize)]
struct ErrorEnvelope {
    success: bool,
    error: String,
}

pub(crate) fn data<T: Serialize>(data: T) -> Response {
    Json(DataEnvelope {
        success: true,
        data,
    })
    .into_response()
}

pub(crate) fn created(id: RecordId) -> Response {
    (
        StatusCode::CREATED,
        Json(CreatedEnvelope { success: true, id }),
    )
        .into_response()
}

pub(crate) fn message(message: &'static str) -> Response {
    Json(MessageEnvelope {
        success: true,
        message,
    })
    .into_response()
}

impl ClinicError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ClinicError::Validation(_) | ClinicError::InvalidReference(_) => {
                StatusCode::BAD_REQUEST
            }
            ClinicError::NotFound(_) | ClinicError::Repository(RepositoryError::NotFound(_)) => {
                StatusCode::NOT_FOUND
            }
            ClinicError::Conflict(_)
            | ClinicError::Transition(_)
            | ClinicError::Repository(RepositoryError::Conflict(_)) => StatusCode::CONFLICT,
            ClinicError::Unauthorized | ClinicError::Credentials(_) => StatusCode::UNAUTHORIZED,
            ClinicError::InvalidToken | ClinicError::Forbidden => StatusCode::FORBIDDEN,
            ClinicError::Repository(RepositoryError::Unavailable(_)) | ClinicError::Auth(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ClinicError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(error = %self, "clinic request failed");
        }

        let body = Json(ErrorEnvelope {
            success: false,
            error: self.to_string(),
        });
        (status, body).into_response()
    }
}
