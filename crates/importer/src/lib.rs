//! Client side of the contact import workflow.
//!
//! Provides the HTTP client for the import service, the
//! [`ImportService`](service::ImportService) seam it implements,
//! environment configuration, and the [`ImportSession`](session::ImportSession)
//! manager that drives one upload -> mapping -> confirmation attempt.

pub mod api;
pub mod config;
pub mod error;
pub mod service;
pub mod session;
