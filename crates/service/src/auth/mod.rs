//! Auth module: session lifecycle split into domain, repository and service.
//!
//! `SessionManager` is the only writer of the session; everything else reads
//! the bearer token through it.

pub mod domain;
pub mod errors;
pub mod repository;
pub mod repo;
pub mod service;
pub mod token;

pub use domain::{Session, SessionState, SessionStatus, TeardownReason};
pub use service::SessionManager;
