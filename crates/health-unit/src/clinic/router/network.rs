use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde::Deserialize;

use super::{created, data, message, Handled, SharedService, ADMIN};
use crate::clinic::auth::Session;
use crate::clinic::domain::{
    HealthUnitInput, InterUnitAccessInput, RecordId, TrainingMaterialInput,
};

#[derive(Debug, Deserialize)]
pub(crate) struct MaterialAccessRequest {
    material_id: RecordId,
}

pub(crate) async fn list_health_units(
    State(service): State<SharedService>,
    Extension(session): Extension<Session>,
) -> Handled {
    session.require(ADMIN)?;
    Ok(data(service.list_health_units()?))
}

pub(crate) async fn create_health_unit(
    State(service): State<SharedService>,
    Extension(session): Extension<Session>,
    Json(input): Json<HealthUnitInput>,
) -> Handled {
    session.require(ADMIN)?;
    Ok(created(service.create_health_unit(input)?.id))
}

pub(crate) async fn update_health_unit(
    State(service): State<SharedService>,
    Extension(session): Extension<Session>,
    Path(id): Path<RecordId>,
    Json(input): Json<HealthUnitInput>,
) -> Handled {
    session.require(ADMIN)?;
    service.update_health_unit(id, input)?;
    Ok(message("Unidade e vínculos atualizados com sucesso"))
}

pub(crate) async fn delete_health_unit(
    State(service): State<SharedService>,
    Extension(session): Extension<Session>,
    Path(id): Path<RecordId>,
) -> Handled {
    session.require(ADMIN)?;
    service.delete_health_unit(id)?;
    Ok(message("Unidade excluída"))
}

pub(crate) async fn list_training_materials(State(service): State<SharedService>) -> Handled {
    Ok(data(service.list_training_materials()?))
}

pub(crate) async fn create_training_material(
    State(service): State<SharedService>,
    Extension(session): Extension<Session>,
    Json(input): Json<TrainingMaterialInput>,
) -> Handled {
    session.require(ADMIN)?;
    Ok(created(service.create_training_material(input)?.id))
}

pub(crate) async fn delete_training_material(
    State(service): State<SharedService>,
    Extension(session): Extension<Session>,
    Path(id): Path<RecordId>,
) -> Handled {
    session.require(ADMIN)?;
    service.delete_training_material(id)?;
    Ok(message("Material excluído"))
}

/// Any signed-in user; the access is attributed to the caller.
pub(crate) async fn record_material_access(
    State(service): State<SharedService>,
    Extension(session): Extension<Session>,
    Json(request): Json<MaterialAccessRequest>,
) -> Handled {
    let access = service.record_material_access(request.material_id, session.user_id)?;
    Ok(created(access.id))
}

pub(crate) async fn access_logs(
    State(service): State<SharedService>,
    Extension(session): Extension<Session>,
) -> Handled {
    session.require(ADMIN)?;
    Ok(data(service.recent_access_logs()?))
}

pub(crate) async fn list_inter_unit_access(
    State(service): State<SharedService>,
    Extension(session): Extension<Session>,
) -> Handled {
    session.require(ADMIN)?;
    Ok(data(service.recent_inter_unit_accesses()?))
}

pub(crate) async fn record_inter_unit_access(
    State(service): State<SharedService>,
    Extension(session): Extension<Session>,
    Json(input): Json<InterUnitAccessInput>,
) -> Handled {
    session.require(ADMIN)?;
    Ok(created(service.record_inter_unit_access(input)?.id))
}
