//! Health-unit records, waiting queue, access control and reporting.

pub mod auth;
pub mod clock;
pub mod domain;
pub mod import;
pub mod queue;
pub mod report;
pub mod router;
pub mod service;
pub mod store;
pub mod validation;

#[cfg(test)]
mod tests;

pub use auth::{Role, Session, TokenIssuer};
pub use clock::{Clock, FixedClock, SystemClock};
pub use import::{ClinicCsvImporter, ImportError};
pub use queue::{rank_queue, QueueEntry, QueuePriority, QueueStatus};
pub use router::clinic_router;
pub use service::{ClinicError, ClinicService};
pub use store::{ClinicStore, InMemoryRepository, Repository, RepositoryError};
pub use validation::is_valid_tax_id;
