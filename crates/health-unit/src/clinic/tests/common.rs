use std::marker::PhantomData;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Barrier, Mutex};

use axum::body::Body;
use axum::http::{header, Method, Request};
use axum::response::Response;
use chrono::{Duration, NaiveDate, NaiveDateTime, Utc};
use serde_json::Value;

use crate::clinic::auth::{Role, TokenIssuer};
use crate::clinic::clock::Clock;
use crate::clinic::domain::{
    Patient, PatientInput, Professional, ProfessionalInput, RecordId, User,
};
use crate::clinic::service::ClinicService;
use crate::clinic::store::{ClinicStore, InMemoryRepository, Record, Repository, RepositoryError};

pub(super) const TEST_SECRET: &str = "clinic-test-secret";

/// 2024-01-10 (a Wednesday), 10:00.
pub(super) fn base_time() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 10)
        .and_then(|date| date.and_hms_opt(10, 0, 0))
        .expect("valid timestamp")
}

pub(super) fn at(day: u32, hour: u32, minute: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, day)
        .and_then(|date| date.and_hms_opt(hour, minute, 0))
        .expect("valid timestamp")
}

/// Clock the tests can move forward between operations.
pub(super) struct SteppingClock {
    now: Mutex<NaiveDateTime>,
}

impl SteppingClock {
    pub(super) fn starting_at(now: NaiveDateTime) -> Arc<Self> {
        Arc::new(Self {
            now: Mutex::new(now),
        })
    }

    pub(super) fn advance(&self, minutes: i64) {
        let mut now = self.now.lock().expect("clock mutex poisoned");
        *now += Duration::minutes(minutes);
    }
}

impl Clock for SteppingClock {
    fn now(&self) -> NaiveDateTime {
        *self.now.lock().expect("clock mutex poisoned")
    }
}

pub(super) fn build_service_with_clock(
    store: ClinicStore,
    clock: Arc<dyn Clock>,
) -> ClinicService {
    ClinicService::new(store, Arc::new(TokenIssuer::new(TEST_SECRET, 8)), clock)
}

pub(super) fn build_service() -> (Arc<ClinicService>, Arc<SteppingClock>) {
    let clock = SteppingClock::starting_at(base_time());
    let service = build_service_with_clock(ClinicStore::in_memory(), clock.clone());
    (Arc::new(service), clock)
}

pub(super) fn patient_input(name: &str, cpf: &str) -> PatientInput {
    PatientInput {
        full_name: name.to_string(),
        cpf: Some(cpf.to_string()),
        email: Some("paciente@example.com".to_string()),
        ..PatientInput::default()
    }
}

pub(super) fn professional_input(name: &str, cpf: &str) -> ProfessionalInput {
    ProfessionalInput {
        full_name: name.to_string(),
        cpf: Some(cpf.to_string()),
        specialty: "Clínica Geral".to_string(),
        ..ProfessionalInput::default()
    }
}

pub(super) fn seed_patient(service: &ClinicService, name: &str, cpf: &str) -> Patient {
    service
        .create_patient(patient_input(name, cpf))
        .expect("patient created")
}

pub(super) fn seed_professional(service: &ClinicService, name: &str, cpf: &str) -> Professional {
    service
        .create_professional(professional_input(name, cpf))
        .expect("professional created")
}

/// Insert a user directly and sign a token for it, skipping password hashing.
pub(super) fn token_for(service: &ClinicService, username: &str, role: Role) -> String {
    let user = service
        .store()
        .users
        .insert(User {
            id: 0,
            username: username.to_string(),
            password_hash: String::new(),
            role,
            professional_id: None,
            last_access: None,
        })
        .expect("user inserted");
    service
        .tokens()
        .issue(&user, Utc::now())
        .expect("token issued")
}

/// Repository whose backend is always down.
pub(super) struct OfflineRepository<T>(PhantomData<fn() -> T>);

impl<T> Default for OfflineRepository<T> {
    fn default() -> Self {
        Self(PhantomData)
    }
}

impl<T: Record> Repository<T> for OfflineRepository<T> {
    fn insert(&self, _record: T) -> Result<T, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn update(&self, _record: T) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch(&self, _id: RecordId) -> Result<Option<T>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn list(&self) -> Result<Vec<T>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn remove(&self, _id: RecordId) -> Result<bool, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

/// In-memory collection whose next `fetch`, once armed, parks until the test
/// lets it go.
pub(super) struct PausingRepository<T> {
    inner: InMemoryRepository<T>,
    armed: AtomicBool,
    parked: Barrier,
    resume: Barrier,
}

impl<T> Default for PausingRepository<T> {
    fn default() -> Self {
        Self {
            inner: InMemoryRepository::default(),
            armed: AtomicBool::new(false),
            parked: Barrier::new(2),
            resume: Barrier::new(2),
        }
    }
}

impl<T> PausingRepository<T> {
    pub(super) fn arm(&self) {
        self.armed.store(true, Ordering::SeqCst);
    }

    /// Blocks until the armed `fetch` has been reached.
    pub(super) fn wait_until_parked(&self) {
        self.parked.wait();
    }

    pub(super) fn release(&self) {
        self.resume.wait();
    }
}

impl<T: Record> Repository<T> for PausingRepository<T> {
    fn insert(&self, record: T) -> Result<T, RepositoryError> {
        self.inner.insert(record)
    }

    fn update(&self, record: T) -> Result<(), RepositoryError> {
        self.inner.update(record)
    }

    fn fetch(&self, id: RecordId) -> Result<Option<T>, RepositoryError> {
        if self.armed.swap(false, Ordering::SeqCst) {
            self.parked.wait();
            self.resume.wait();
        }
        self.inner.fetch(id)
    }

    fn list(&self) -> Result<Vec<T>, RepositoryError> {
        self.inner.list()
    }

    fn remove(&self, id: RecordId) -> Result<bool, RepositoryError> {
        self.inner.remove(id)
    }
}

pub(super) fn request(
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let body = match body {
        Some(value) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(serde_json::to_vec(&value).expect("serialize body"))
        }
        None => Body::empty(),
    };
    builder.body(body).expect("request builds")
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
