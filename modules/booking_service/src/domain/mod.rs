//! Domain layer - business logic and services

pub mod availability;
pub mod backend;
pub mod form;
pub mod lookup;
pub mod orchestrator;
pub mod payload;
pub mod service;
pub mod validation;

pub use availability::AvailabilityChecker;
pub use backend::{BackendError, Filter, Query, RecordStore};
pub use orchestrator::Orchestrator;
pub use service::Service;
pub use validation::ValidationRules;
