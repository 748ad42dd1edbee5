//! Client core of the iMove admin console.
//! - `auth`: session lifecycle (restore / login / logout / teardown) over a persisted store.
//! - `transport` + `client`: the shared request layer that carries the bearer token.
//! - `collection`: paged, filtered remote views with stale-response suppression.
//! - `admin`: typed operations on the admin API.
//! - `live_map`: interval polling of rider positions.

pub mod errors;
pub mod auth;
pub mod storage;
pub mod transport;
pub mod client;
pub mod collection;
pub mod admin;
pub mod live_map;
pub mod observability;

pub use errors::AdminError;
pub use admin::AdminService;
pub use auth::SessionManager;
pub use client::ApiClient;
pub use collection::{CollectionView, Resource};
pub use live_map::{LiveMapMonitor, PollHandle};
