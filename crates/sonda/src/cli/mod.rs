//! CLI command implementations.
//!
//! Each `run` returns `Ok(false)` when the request completed but found
//! nothing, so `main` can exit with a distinct status.

mod display;

pub mod env;
pub mod routine;
pub mod table;
