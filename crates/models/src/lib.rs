//! Wire and domain types shared by the admin console crates.
//!
//! Row entities mirror the remote API's JSON with permissive defaults: the
//! console displays them but never derives business rules from them.

pub mod errors;
pub mod identity;
pub mod query;
pub mod reference;
pub mod user;
pub mod ride;
pub mod payment;
pub mod audit_log;
pub mod dashboard;
pub mod settings;
pub mod live_map;

pub use identity::{AuthTokens, Credentials, Identity, LoginResponse};
pub use query::{CollectionPage, CollectionQuery, PaginationMeta};
pub use reference::Ref;
