mod memory;

use std::sync::{Arc, Mutex, MutexGuard};

use super::domain::{
    AccessLog, Appointment, ClinicalNote, HealthUnit, InterUnitAccess, MaterialAccess,
    MedicalCertificate, Notification, Patient, PostVisitInstruction, Professional, RecordId,
    SchedulePreference, TrainingMaterial, User, Visit,
};
use super::queue::QueueEntry;
use super::validation::normalize_tax_id;

pub use memory::InMemoryRepository;

/// A row the record store can persist.
pub trait Record: Clone + Send + Sync + 'static {
    /// Human readable collection name used in errors and logs.
    const KIND: &'static str;

    fn id(&self) -> RecordId;
    fn assign_id(&mut self, id: RecordId);

    /// Key that must be unique across the collection, if any.
    fn unique_key(&self) -> Option<String> {
        None
    }
}

macro_rules! impl_record {
    ($ty:ty, $kind:literal) => {
        impl Record for $ty {
            const KIND: &'static str = $kind;

            fn id(&self) -> RecordId {
                self.id
            }

            fn assign_id(&mut self, id: RecordId) {
                self.id = id;
            }
        }
    };
    ($ty:ty, $kind:literal, |$record:ident| $key:expr) => {
        impl Record for $ty {
            const KIND: &'static str = $kind;

            fn id(&self) -> RecordId {
                self.id
            }

            fn assign_id(&mut self, id: RecordId) {
                self.id = id;
            }

            fn unique_key(&self) -> Option<String> {
                let $record = self;
                Some($key)
            }
        }
    };
}

impl_record!(Patient, "patient", |patient| normalize_tax_id(&patient.cpf));
impl_record!(Professional, "professional", |professional| {
    normalize_tax_id(&professional.cpf)
});
impl_record!(User, "user", |user| user.username.to_lowercase());
impl_record!(Appointment, "appointment");
impl_record!(Visit, "visit");
impl_record!(ClinicalNote, "clinical note");
impl_record!(MedicalCertificate, "certificate");
impl_record!(PostVisitInstruction, "instruction");
impl_record!(SchedulePreference, "schedule preference");
impl_record!(QueueEntry, "queue entry");
impl_record!(HealthUnit, "health unit");
impl_record!(TrainingMaterial, "training material");
impl_record!(MaterialAccess, "material access");
impl_record!(AccessLog, "access log");
impl_record!(InterUnitAccess, "inter-unit access");
impl_record!(Notification, "notification");

/// Storage abstraction so the service can be exercised without a database.
pub trait Repository<T: Record>: Send + Sync {
    /// Persist a new record, assigning its id.
    fn insert(&self, record: T) -> Result<T, RepositoryError>;
    fn update(&self, record: T) -> Result<(), RepositoryError>;
    fn fetch(&self, id: RecordId) -> Result<Option<T>, RepositoryError>;
    fn list(&self) -> Result<Vec<T>, RepositoryError>;
    /// Returns whether a record was removed.
    fn remove(&self, id: RecordId) -> Result<bool, RepositoryError>;
}

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("{0} already exists")]
    Conflict(&'static str),
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// One repository per collection.
#[derive(Clone)]
pub struct ClinicStore {
    pub patients: Arc<dyn Repository<Patient>>,
    pub professionals: Arc<dyn Repository<Professional>>,
    pub users: Arc<dyn Repository<User>>,
    pub appointments: Arc<dyn Repository<Appointment>>,
    pub visits: Arc<dyn Repository<Visit>>,
    pub clinical_notes: Arc<dyn Repository<ClinicalNote>>,
    pub certificates: Arc<dyn Repository<MedicalCertificate>>,
    pub instructions: Arc<dyn Repository<PostVisitInstruction>>,
    pub schedule_preferences: Arc<dyn Repository<SchedulePreference>>,
    pub queue: Arc<dyn Repository<QueueEntry>>,
    pub health_units: Arc<dyn Repository<HealthUnit>>,
    pub training_materials: Arc<dyn Repository<TrainingMaterial>>,
    pub material_accesses: Arc<dyn Repository<MaterialAccess>>,
    pub access_logs: Arc<dyn Repository<AccessLog>>,
    pub inter_unit_accesses: Arc<dyn Repository<InterUnitAccess>>,
    pub notifications: Arc<dyn Repository<Notification>>,
    /// Held by every write that checks or creates a cross-collection reference.
    pub(crate) links: Arc<Mutex<()>>,
}

impl ClinicStore {
    pub fn in_memory() -> Self {
        Self {
            patients: Arc::new(InMemoryRepository::default()),
            professionals: Arc::new(InMemoryRepository::default()),
            users: Arc::new(InMemoryRepository::default()),
            appointments: Arc::new(InMemoryRepository::default()),
            visits: Arc::new(InMemoryRepository::default()),
            clinical_notes: Arc::new(InMemoryRepository::default()),
            certificates: Arc::new(InMemoryRepository::default()),
            instructions: Arc::new(InMemoryRepository::default()),
            schedule_preferences: Arc::new(InMemoryRepository::default()),
            queue: Arc::new(InMemoryRepository::default()),
            health_units: Arc::new(InMemoryRepository::default()),
            training_materials: Arc::new(InMemoryRepository::default()),
            material_accesses: Arc::new(InMemoryRepository::default()),
            access_logs: Arc::new(InMemoryRepository::default()),
            inter_unit_accesses: Arc::new(InMemoryRepository::default()),
            notifications: Arc::new(InMemoryRepository::default()),
            links: Arc::new(Mutex::new(())),
        }
    }

    /// Reference checks and the write they guard run under this lock, so a
    /// delete cannot slip between a link being validated and stored.
    pub fn link_guard(&self) -> Result<MutexGuard<'_, ()>, RepositoryError> {
        self.links
            .lock()
            .map_err(|_| RepositoryError::Unavailable("link lock poisoned".to_string()))
    }
}
