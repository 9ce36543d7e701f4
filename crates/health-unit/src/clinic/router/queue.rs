use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde::Deserialize;

use super::{created, data, message, Handled, SharedService, FRONT_DESK};
use crate::clinic::auth::Session;
use crate::clinic::domain::{QueueInput, RecordId};
use crate::clinic::queue::QueueStatus;

#[derive(Debug, Deserialize)]
pub(crate) struct StatusUpdate {
    status: QueueStatus,
}

pub(crate) async fn enqueue(
    State(service): State<SharedService>,
    Extension(session): Extension<Session>,
    Json(input): Json<QueueInput>,
) -> Handled {
    session.require(FRONT_DESK)?;
    Ok(created(service.enqueue(input)?.id))
}

pub(crate) async fn ranked_queue(State(service): State<SharedService>) -> Handled {
    Ok(data(service.waiting_queue()?))
}

pub(crate) async fn update_status(
    State(service): State<SharedService>,
    Extension(session): Extension<Session>,
    Path(id): Path<RecordId>,
    Json(update): Json<StatusUpdate>,
) -> Handled {
    session.require(FRONT_DESK)?;
    service.update_queue_status(id, update.status)?;
    Ok(message("Status da fila atualizado"))
}

pub(crate) async fn complete(
    State(service): State<SharedService>,
    Extension(session): Extension<Session>,
    Path(id): Path<RecordId>,
) -> Handled {
    session.require(FRONT_DESK)?;
    service.complete_queue_entry(id)?;
    Ok(message("Paciente atendido e removido da fila"))
}
