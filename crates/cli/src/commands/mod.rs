//! CLI command implementations.

pub mod build;
pub mod cache;
pub mod check;
pub mod new;
pub mod roles;
pub mod watch;
