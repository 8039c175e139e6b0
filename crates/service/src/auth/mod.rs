//! Auth module: three-layer architecture (domain, repository, service).
//!
//! Registration, login and the stateless token gate live here; the HTTP
//! layer only extracts the token and maps errors.

pub mod domain;
pub mod errors;
pub mod repository;
pub mod service;
pub mod repo;

pub use domain::Principal;
pub use service::{AuthConfig, AuthService};
