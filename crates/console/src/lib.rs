//! Command-line front end of the admin console.

pub mod cli;
pub mod commands;
pub mod render;
pub mod startup;

pub use cli::Cli;
pub use startup::run;
