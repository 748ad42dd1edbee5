//! Shared runtime helpers for the admin console crates.

pub mod utils;
pub mod env;
