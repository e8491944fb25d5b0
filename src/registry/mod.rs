//! Registry domain subsystem.
//!
//! The service layer is the only consumer of the store besides the
//! bootstrap reset; HTTP handlers and the seed importer both go through it.

pub mod model;
pub mod service;

pub use model::{ServerPage, ServerRecord};
pub use service::{RegistryService, ServiceError};
