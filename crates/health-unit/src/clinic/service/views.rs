use serde::Serialize;

use crate::clinic::domain::{
    AccessLog, ClinicalNote, InterUnitAccess, MedicalCertificate, Patient, RecordId,
    TrainingMaterial, Visit,
};

/// A record joined with the names of the people it refers to.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PartyView<T> {
    #[serde(flatten)]
    pub record: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patient_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patient_cpf: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub professional_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub professional_specialty: Option<String>,
}

pub type CertificateDetail = PartyView<MedicalCertificate>;

/// Everything printed on a patient's chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatientChart {
    pub patient: Patient,
    pub visits: Vec<PartyView<Visit>>,
    pub clinical_notes: Vec<PartyView<ClinicalNote>>,
    pub certificates: Vec<PartyView<MedicalCertificate>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinkedProfessional {
    pub id: RecordId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthUnitView {
    pub id: RecordId,
    pub name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub professionals: Vec<LinkedProfessional>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MaterialView {
    #[serde(flatten)]
    pub material: TrainingMaterial,
    pub accesses: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccessLogView {
    #[serde(flatten)]
    pub log: AccessLog,
    pub username: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InterUnitAccessView {
    #[serde(flatten)]
    pub access: InterUnitAccess,
    pub patient_name: Option<String>,
    pub professional_name: Option<String>,
    pub origin_unit_name: Option<String>,
    pub destination_unit_name: Option<String>,
}
