//! Pure domain logic for the contact import workflow.
//!
//! Everything here is free of I/O: wire types for the import service,
//! the upload session model, the target-field catalog, and the field
//! mapping editor that the session manager in `contacthub-importer`
//! hands back to the service on confirmation.

pub mod error;
pub mod fields;
pub mod import;
pub mod mapping;
pub mod session;
pub mod types;
