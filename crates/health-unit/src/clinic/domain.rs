use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::auth::Role;
use super::queue::QueuePriority;

/// Identifier assigned by the record store on insert.
pub type RecordId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordStatus {
    #[default]
    Active,
    Inactive,
}

impl RecordStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Active => "Ativo",
            Self::Inactive => "Inativo",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    #[default]
    Pending,
    Confirmed,
    Completed,
    NoShow,
    Cancelled,
}

impl AppointmentStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "Pendente",
            Self::Confirmed => "Confirmado",
            Self::Completed => "Realizado",
            Self::NoShow => "Não Compareceu",
            Self::Cancelled => "Cancelado",
        }
    }

    /// Accepts either the serialized form or the Portuguese label used by exports.
    pub fn parse(raw: &str) -> Option<Self> {
        let normalized = raw.trim().to_lowercase();
        [
            Self::Pending,
            Self::Confirmed,
            Self::Completed,
            Self::NoShow,
            Self::Cancelled,
        ]
        .into_iter()
        .find(|status| {
            status.label().to_lowercase() == normalized || status.key() == normalized
        })
    }

    const fn key(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Completed => "completed",
            Self::NoShow => "no_show",
            Self::Cancelled => "cancelled",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Patient {
    pub id: RecordId,
    pub full_name: String,
    pub cpf: String,
    pub birth_date: Option<NaiveDate>,
    pub sex: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub insurance: Option<String>,
    pub status: RecordStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Professional {
    pub id: RecordId,
    pub full_name: String,
    pub cpf: String,
    pub specialty: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub status: RecordStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: RecordId,
    pub username: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub role: Role,
    pub professional_id: Option<RecordId>,
    pub last_access: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: RecordId,
    pub patient_id: RecordId,
    pub professional_id: RecordId,
    pub scheduled_at: NaiveDateTime,
    pub status: AppointmentStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Visit {
    pub id: RecordId,
    pub patient_id: RecordId,
    pub professional_id: RecordId,
    pub visit_type: String,
    pub performed_at: NaiveDateTime,
    pub status: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClinicalNote {
    pub id: RecordId,
    pub patient_id: RecordId,
    pub professional_id: RecordId,
    pub visit_id: Option<RecordId>,
    pub notes: String,
    pub recorded_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MedicalCertificate {
    pub id: RecordId,
    pub patient_id: RecordId,
    pub professional_id: RecordId,
    pub visit_id: Option<RecordId>,
    pub leave_days: u32,
    pub icd_code: Option<String>,
    pub text: String,
    pub issued_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostVisitInstruction {
    pub id: RecordId,
    pub patient_id: RecordId,
    pub professional_id: RecordId,
    pub visit_id: Option<RecordId>,
    pub text: String,
    pub channel: Option<String>,
    pub sent_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchedulePreference {
    pub id: RecordId,
    pub patient_id: RecordId,
    pub preferred_at: NaiveDateTime,
}

/// A health unit and the professionals linked to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthUnit {
    pub id: RecordId,
    pub name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub professional_ids: Vec<RecordId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingMaterial {
    pub id: RecordId,
    pub title: String,
    pub category: Option<String>,
    pub file_url: String,
    pub uploaded_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialAccess {
    pub id: RecordId,
    pub material_id: RecordId,
    pub user_id: RecordId,
    pub accessed_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessLog {
    pub id: RecordId,
    pub user_id: Option<RecordId>,
    pub action: String,
    pub origin_ip: Option<String>,
    pub occurred_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterUnitAccess {
    pub id: RecordId,
    pub patient_id: RecordId,
    pub professional_id: RecordId,
    pub origin_unit_id: RecordId,
    pub destination_unit_id: RecordId,
    pub accessed_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: RecordId,
    pub kind: String,
    pub message: String,
    pub created_at: NaiveDateTime,
}

// Write payloads accepted by the service and the HTTP routes.

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PatientInput {
    pub full_name: String,
    #[serde(default)]
    pub cpf: Option<String>,
    #[serde(default)]
    pub birth_date: Option<NaiveDate>,
    #[serde(default)]
    pub sex: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub insurance: Option<String>,
    #[serde(default)]
    pub status: Option<RecordStatus>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfessionalInput {
    pub full_name: String,
    #[serde(default)]
    pub cpf: Option<String>,
    pub specialty: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub status: Option<RecordStatus>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserInput {
    pub username: String,
    #[serde(default)]
    pub password: Option<String>,
    pub role: Role,
    #[serde(default)]
    pub professional_id: Option<RecordId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppointmentInput {
    pub patient_id: RecordId,
    pub professional_id: RecordId,
    pub scheduled_at: NaiveDateTime,
    #[serde(default)]
    pub status: Option<AppointmentStatus>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisitInput {
    pub patient_id: RecordId,
    pub professional_id: RecordId,
    pub visit_type: String,
    pub performed_at: NaiveDateTime,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClinicalNoteInput {
    pub patient_id: RecordId,
    pub professional_id: RecordId,
    #[serde(default)]
    pub visit_id: Option<RecordId>,
    pub notes: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CertificateInput {
    pub patient_id: RecordId,
    pub professional_id: RecordId,
    #[serde(default)]
    pub visit_id: Option<RecordId>,
    pub leave_days: u32,
    #[serde(default)]
    pub icd_code: Option<String>,
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstructionInput {
    pub patient_id: RecordId,
    pub professional_id: RecordId,
    #[serde(default)]
    pub visit_id: Option<RecordId>,
    pub text: String,
    #[serde(default)]
    pub channel: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulePreferenceInput {
    pub patient_id: RecordId,
    pub preferred_at: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueInput {
    pub patient_id: RecordId,
    pub professional_id: RecordId,
    #[serde(default = "default_priority")]
    pub priority: QueuePriority,
    #[serde(default)]
    pub notification_channel: Option<String>,
}

fn default_priority() -> QueuePriority {
    QueuePriority::Normal
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HealthUnitInput {
    pub name: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub professional_ids: Vec<RecordId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingMaterialInput {
    pub title: String,
    #[serde(default)]
    pub category: Option<String>,
    pub file_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterUnitAccessInput {
    pub patient_id: RecordId,
    pub professional_id: RecordId,
    pub origin_unit_id: RecordId,
    pub destination_unit_id: RecordId,
}
