use axum::{
    extract::{Path, State},
    Extension, Json,
};

use super::{created, data, message, Handled, SharedService, ADMIN, CLINICAL, FRONT_DESK, STAFF};
use crate::clinic::auth::Session;
use crate::clinic::domain::{
    AppointmentInput, CertificateInput, ClinicalNoteInput, InstructionInput, PatientInput,
    ProfessionalInput, RecordId, SchedulePreferenceInput, UserInput, VisitInput,
};

pub(crate) async fn create_patient(
    State(service): State<SharedService>,
    Extension(session): Extension<Session>,
    Json(input): Json<PatientInput>,
) -> Handled {
    session.require(FRONT_DESK)?;
    Ok(created(service.create_patient(input)?.id))
}

pub(crate) async fn list_patients(State(service): State<SharedService>) -> Handled {
    Ok(data(service.list_patients()?))
}

pub(crate) async fn update_patient(
    State(service): State<SharedService>,
    Extension(session): Extension<Session>,
    Path(id): Path<RecordId>,
    Json(input): Json<PatientInput>,
) -> Handled {
    session.require(STAFF)?;
    service.update_patient(id, input)?;
    Ok(message("Paciente atualizado"))
}

pub(crate) async fn delete_patient(
    State(service): State<SharedService>,
    Extension(session): Extension<Session>,
    Path(id): Path<RecordId>,
) -> Handled {
    session.require(ADMIN)?;
    service.delete_patient(id)?;
    Ok(message("Paciente excluído"))
}

pub(crate) async fn patient_chart(
    State(service): State<SharedService>,
    Path(id): Path<RecordId>,
) -> Handled {
    Ok(data(service.patient_chart(id)?))
}

pub(crate) async fn create_professional(
    State(service): State<SharedService>,
    Extension(session): Extension<Session>,
    Json(input): Json<ProfessionalInput>,
) -> Handled {
    session.require(ADMIN)?;
    Ok(created(service.create_professional(input)?.id))
}

pub(crate) async fn list_professionals(State(service): State<SharedService>) -> Handled {
    Ok(data(service.list_professionals()?))
}

pub(crate) async fn update_professional(
    State(service): State<SharedService>,
    Extension(session): Extension<Session>,
    Path(id): Path<RecordId>,
    Json(input): Json<ProfessionalInput>,
) -> Handled {
    session.require(ADMIN)?;
    service.update_professional(id, input)?;
    Ok(message("Profissional atualizado"))
}

pub(crate) async fn delete_professional(
    State(service): State<SharedService>,
    Extension(session): Extension<Session>,
    Path(id): Path<RecordId>,
) -> Handled {
    session.require(ADMIN)?;
    service.delete_professional(id)?;
    Ok(message("Profissional excluído"))
}

pub(crate) async fn create_user(
    State(service): State<SharedService>,
    Extension(session): Extension<Session>,
    Json(input): Json<UserInput>,
) -> Handled {
    session.require(ADMIN)?;
    Ok(created(service.create_user(input)?.id))
}

pub(crate) async fn list_users(
    State(service): State<SharedService>,
    Extension(session): Extension<Session>,
) -> Handled {
    session.require(ADMIN)?;
    Ok(data(service.list_users()?))
}

pub(crate) async fn update_user(
    State(service): State<SharedService>,
    Extension(session): Extension<Session>,
    Path(id): Path<RecordId>,
    Json(input): Json<UserInput>,
) -> Handled {
    session.require(ADMIN)?;
    service.update_user(id, input)?;
    Ok(message("Usuário atualizado"))
}

pub(crate) async fn delete_user(
    State(service): State<SharedService>,
    Extension(session): Extension<Session>,
    Path(id): Path<RecordId>,
) -> Handled {
    session.require(ADMIN)?;
    service.delete_user(id)?;
    Ok(message("Usuário excluído"))
}

pub(crate) async fn create_appointment(
    State(service): State<SharedService>,
    Extension(session): Extension<Session>,
    Json(input): Json<AppointmentInput>,
) -> Handled {
    session.require(FRONT_DESK)?;
    Ok(created(service.create_appointment(input)?.id))
}

pub(crate) async fn list_appointments(State(service): State<SharedService>) -> Handled {
    Ok(data(service.list_appointments()?))
}

pub(crate) async fn update_appointment(
    State(service): State<SharedService>,
    Extension(session): Extension<Session>,
    Path(id): Path<RecordId>,
    Json(input): Json<AppointmentInput>,
) -> Handled {
    session.require(FRONT_DESK)?;
    service.update_appointment(id, input)?;
    Ok(message("Agendamento atualizado"))
}

pub(crate) async fn delete_appointment(
    State(service): State<SharedService>,
    Extension(session): Extension<Session>,
    Path(id): Path<RecordId>,
) -> Handled {
    session.require(ADMIN)?;
    service.delete_appointment(id)?;
    Ok(message("Agendamento excluído"))
}

pub(crate) async fn create_visit(
    State(service): State<SharedService>,
    Extension(session): Extension<Session>,
    Json(input): Json<VisitInput>,
) -> Handled {
    session.require(CLINICAL)?;
    Ok(created(service.create_visit(input)?.id))
}

pub(crate) async fn list_visits(State(service): State<SharedService>) -> Handled {
    Ok(data(service.list_visits()?))
}

pub(crate) async fn update_visit(
    State(service): State<SharedService>,
    Extension(session): Extension<Session>,
    Path(id): Path<RecordId>,
    Json(input): Json<VisitInput>,
) -> Handled {
    session.require(CLINICAL)?;
    service.update_visit(id, input)?;
    Ok(message("Atendimento atualizado"))
}

pub(crate) async fn delete_visit(
    State(service): State<SharedService>,
    Extension(session): Extension<Session>,
    Path(id): Path<RecordId>,
) -> Handled {
    session.require(ADMIN)?;
    service.delete_visit(id)?;
    Ok(message("Atendimento excluído"))
}

pub(crate) async fn create_clinical_note(
    State(service): State<SharedService>,
    Extension(session): Extension<Session>,
    Json(input): Json<ClinicalNoteInput>,
) -> Handled {
    session.require(CLINICAL)?;
    Ok(created(service.create_clinical_note(input)?.id))
}

pub(crate) async fn list_clinical_notes(State(service): State<SharedService>) -> Handled {
    Ok(data(service.list_clinical_notes()?))
}

pub(crate) async fn update_clinical_note(
    State(service): State<SharedService>,
    Extension(session): Extension<Session>,
    Path(id): Path<RecordId>,
    Json(input): Json<ClinicalNoteInput>,
) -> Handled {
    session.require(CLINICAL)?;
    service.update_clinical_note(id, input)?;
    Ok(message("Evolução atualizada"))
}

pub(crate) async fn delete_clinical_note(
    State(service): State<SharedService>,
    Extension(session): Extension<Session>,
    Path(id): Path<RecordId>,
) -> Handled {
    session.require(ADMIN)?;
    service.delete_clinical_note(id)?;
    Ok(message("Evolução excluída"))
}

pub(crate) async fn issue_certificate(
    State(service): State<SharedService>,
    Extension(session): Extension<Session>,
    Json(input): Json<CertificateInput>,
) -> Handled {
    session.require(CLINICAL)?;
    Ok(created(service.issue_certificate(input)?.id))
}

pub(crate) async fn certificate(
    State(service): State<SharedService>,
    Path(id): Path<RecordId>,
) -> Handled {
    Ok(data(service.certificate(id)?))
}

pub(crate) async fn create_instruction(
    State(service): State<SharedService>,
    Extension(session): Extension<Session>,
    Json(input): Json<InstructionInput>,
) -> Handled {
    session.require(CLINICAL)?;
    Ok(created(service.create_instruction(input)?.id))
}

pub(crate) async fn list_instructions(State(service): State<SharedService>) -> Handled {
    Ok(data(service.list_instructions()?))
}

pub(crate) async fn delete_instruction(
    State(service): State<SharedService>,
    Extension(session): Extension<Session>,
    Path(id): Path<RecordId>,
) -> Handled {
    session.require(ADMIN)?;
    service.delete_instruction(id)?;
    Ok(message("Instrução excluída"))
}

pub(crate) async fn create_schedule_preference(
    State(service): State<SharedService>,
    Extension(session): Extension<Session>,
    Json(input): Json<SchedulePreferenceInput>,
) -> Handled {
    session.require(FRONT_DESK)?;
    Ok(created(service.create_schedule_preference(input)?.id))
}

pub(crate) async fn list_schedule_preferences(State(service): State<SharedService>) -> Handled {
    Ok(data(service.list_schedule_preferences()?))
}

pub(crate) async fn update_schedule_preference(
    State(service): State<SharedService>,
    Extension(session): Extension<Session>,
    Path(id): Path<RecordId>,
    Json(input): Json<SchedulePreferenceInput>,
) -> Handled {
    session.require(FRONT_DESK)?;
    service.update_schedule_preference(id, input)?;
    Ok(message("Preferência atualizada"))
}

pub(crate) async fn delete_schedule_preference(
    State(service): State<SharedService>,
    Extension(session): Extension<Session>,
    Path(id): Path<RecordId>,
) -> Handled {
    session.require(FRONT_DESK)?;
    service.delete_schedule_preference(id)?;
    Ok(message("Preferência excluída"))
}
