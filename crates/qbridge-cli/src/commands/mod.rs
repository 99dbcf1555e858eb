//! CLI command implementations.

pub mod auth;
pub mod backends;
pub mod common;
pub mod compile;
pub mod run;
pub mod version;
