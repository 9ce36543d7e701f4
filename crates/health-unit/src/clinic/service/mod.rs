//! Clinic operations behind the HTTP routes: validation, reference checks,
//! persistence through [`ClinicStore`] and read-side joins.

mod insights;
mod network;
mod queue;
mod records;
mod views;

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::auth::{hash_password, verify_password, AuthError, Role, TokenIssuer};
use super::clock::Clock;
use super::domain::{AccessLog, Patient, Professional, RecordId, User};
use super::queue::QueueTransitionError;
use super::store::{ClinicStore, Record, Repository, RepositoryError};
use crate::config::BootstrapAdmin;

pub use views::{
    AccessLogView, CertificateDetail, HealthUnitView, InterUnitAccessView, LinkedProfessional,
    MaterialView, PartyView, PatientChart,
};

pub(crate) const LOGIN_SUCCEEDED: &str = "Login com Sucesso";
pub(crate) const LOGIN_FAILED: &str = "Tentativa de Login Falhou";

/// Service composing the record store, the token issuer and the clock.
pub struct ClinicService {
    store: ClinicStore,
    tokens: Arc<TokenIssuer>,
    clock: Arc<dyn Clock>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginOutcome {
    pub token: String,
    pub user: User,
}

impl ClinicService {
    pub fn new(store: ClinicStore, tokens: Arc<TokenIssuer>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            tokens,
            clock,
        }
    }

    pub fn tokens(&self) -> Arc<TokenIssuer> {
        Arc::clone(&self.tokens)
    }

    pub fn store(&self) -> &ClinicStore {
        &self.store
    }

    /// Check credentials, audit the attempt and issue a bearer token.
    pub fn login(
        &self,
        request: &LoginRequest,
        origin_ip: Option<String>,
    ) -> Result<LoginOutcome, ClinicError> {
        let username = request.username.trim();
        if username.is_empty() || request.password.is_empty() {
            return Err(ClinicError::Validation(
                "Nome de usuário e senha são obrigatórios".to_string(),
            ));
        }

        let Some(mut user) = self.find_user(username)? else {
            warn!(%username, "login for unknown user");
            return Err(ClinicError::Credentials("Usuário não encontrado"));
        };

        if !verify_password(&request.password, &user.password_hash) {
            warn!(user_id = user.id, "login rejected");
            self.record_access(Some(user.id), LOGIN_FAILED, origin_ip)?;
            return Err(ClinicError::Credentials("Senha incorreta"));
        }

        // Audit failures must not block a valid login.
        if let Err(err) = self.record_access(Some(user.id), LOGIN_SUCCEEDED, origin_ip) {
            warn!(error = %err, user_id = user.id, "failed to record login");
        }
        user.last_access = Some(self.clock.now());
        if let Err(err) = self.store.users.update(user.clone()) {
            warn!(error = %err, user_id = user.id, "failed to stamp last access");
        }

        let token = self.tokens.issue(&user, Utc::now())?;
        info!(user_id = user.id, role = user.role.label(), "login succeeded");
        Ok(LoginOutcome { token, user })
    }

    /// Create the configured administrator, or reset its password when it already exists.
    pub fn bootstrap_admin(&self, admin: &BootstrapAdmin) -> Result<User, ClinicError> {
        let password_hash = hash_password(&admin.password)?;

        if let Some(mut existing) = self.find_user(&admin.username)? {
            existing.password_hash = password_hash;
            existing.role = Role::Administrator;
            self.store.users.update(existing.clone())?;
            info!(user_id = existing.id, "administrator credentials reset");
            return Ok(existing);
        }

        let user = self.store.users.insert(User {
            id: 0,
            username: admin.username.trim().to_string(),
            password_hash,
            role: Role::Administrator,
            professional_id: None,
            last_access: None,
        })?;
        info!(user_id = user.id, "administrator account created");
        Ok(user)
    }

    pub(crate) fn record_access(
        &self,
        user_id: Option<RecordId>,
        action: &str,
        origin_ip: Option<String>,
    ) -> Result<AccessLog, ClinicError> {
        let entry = self.store.access_logs.insert(AccessLog {
            id: 0,
            user_id,
            action: action.to_string(),
            origin_ip,
            occurred_at: self.clock.now(),
        })?;
        Ok(entry)
    }

    fn find_user(&self, username: &str) -> Result<Option<User>, ClinicError> {
        let needle = username.trim().to_lowercase();
        Ok(self
            .store
            .users
            .list()?
            .into_iter()
            .find(|user| user.username.to_lowercase() == needle))
    }

    fn patient(&self, id: RecordId) -> Result<Patient, ClinicError> {
        self.store
            .patients
            .fetch(id)?
            .ok_or_else(|| ClinicError::NotFound("Paciente não encontrado".to_string()))
    }

    fn ensure_patient(&self, id: RecordId) -> Result<Patient, ClinicError> {
        self.store
            .patients
            .fetch(id)?
            .ok_or_else(|| ClinicError::InvalidReference(format!("Paciente {id} não encontrado")))
    }

    fn ensure_professional(&self, id: RecordId) -> Result<Professional, ClinicError> {
        self.store.professionals.fetch(id)?.ok_or_else(|| {
            ClinicError::InvalidReference(format!("Profissional {id} não encontrado"))
        })
    }

    fn ensure_parties(
        &self,
        patient_id: RecordId,
        professional_id: RecordId,
    ) -> Result<(), ClinicError> {
        self.ensure_patient(patient_id)?;
        self.ensure_professional(professional_id)?;
        Ok(())
    }

    fn ensure_visit(&self, visit_id: Option<RecordId>) -> Result<(), ClinicError> {
        match visit_id {
            Some(id) if self.store.visits.fetch(id)?.is_none() => Err(
                ClinicError::InvalidReference(format!("Atendimento {id} não encontrado")),
            ),
            _ => Ok(()),
        }
    }

    fn directory(&self) -> Result<Directory, ClinicError> {
        Directory::load(&self.store)
    }
}

/// Delete a record or report it missing.
fn remove_or_missing<T: Record>(
    repository: &dyn Repository<T>,
    id: RecordId,
    missing: &str,
) -> Result<(), ClinicError> {
    if repository.remove(id)? {
        Ok(())
    } else {
        Err(ClinicError::NotFound(missing.to_string()))
    }
}

fn required_text(value: &str, message: &str) -> Result<String, ClinicError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(ClinicError::Validation(message.to_string()))
    } else {
        Ok(trimmed.to_string())
    }
}

/// Blank optional strings are stored as absent.
fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|raw| raw.trim().to_string())
        .filter(|trimmed| !trimmed.is_empty())
}

fn conflict_as(message: &'static str) -> impl FnOnce(RepositoryError) -> ClinicError {
    move |err| match err {
        RepositoryError::Conflict(_) => ClinicError::Conflict(message.to_string()),
        other => ClinicError::Repository(other),
    }
}

/// Newest first, ties by descending id.
fn newest_first<T, K: Ord>(records: &mut [T], key: impl Fn(&T) -> (K, RecordId)) {
    records.sort_by(|left, right| key(right).cmp(&key(left)));
}

/// Patients and professionals indexed by id for read-side joins.
struct Directory {
    patients: BTreeMap<RecordId, Patient>,
    professionals: BTreeMap<RecordId, Professional>,
}

impl Directory {
    fn load(store: &ClinicStore) -> Result<Self, ClinicError> {
        Ok(Self {
            patients: store
                .patients
                .list()?
                .into_iter()
                .map(|patient| (patient.id, patient))
                .collect(),
            professionals: store
                .professionals
                .list()?
                .into_iter()
                .map(|professional| (professional.id, professional))
                .collect(),
        })
    }

    fn patient_name(&self, id: RecordId) -> Option<String> {
        self.patients.get(&id).map(|patient| patient.full_name.clone())
    }

    fn professional_name(&self, id: RecordId) -> Option<String> {
        self.professionals
            .get(&id)
            .map(|professional| professional.full_name.clone())
    }

    fn view<T>(
        &self,
        record: T,
        patient_id: Option<RecordId>,
        professional_id: Option<RecordId>,
    ) -> PartyView<T> {
        let patient = patient_id.and_then(|id| self.patients.get(&id));
        let professional = professional_id.and_then(|id| self.professionals.get(&id));
        PartyView {
            record,
            patient_name: patient.map(|patient| patient.full_name.clone()),
            patient_cpf: patient.map(|patient| patient.cpf.clone()),
            professional_name: professional.map(|professional| professional.full_name.clone()),
            professional_specialty: professional
                .map(|professional| professional.specialty.clone()),
        }
    }
}

/// Error raised by the clinic service.
#[derive(Debug, thiserror::Error)]
pub enum ClinicError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    InvalidReference(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("Token de acesso ausente")]
    Unauthorized,
    #[error("Token inválido")]
    InvalidToken,
    #[error("Acesso não autorizado para este papel")]
    Forbidden,
    #[error("{0}")]
    Credentials(&'static str),
    #[error(transparent)]
    Transition(#[from] QueueTransitionError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Auth(#[from] AuthError),
}
