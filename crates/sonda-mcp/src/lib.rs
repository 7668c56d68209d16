//! MCP server for sonda.
//!
//! This crate provides an MCP (Model Context Protocol) server that exposes
//! sonda's routine and table lookups over Protheus source trees to AI
//! assistants.
//!
//! # Architecture
//!
//! The server uses the `rmcp` crate for MCP protocol handling and wraps one
//! [`sonda::Sonda`] instance. Lookups walk the filesystem synchronously, so
//! every tool call runs on tokio's blocking pool. All calls share the same
//! classifier, and with it the classification cache and discovered prefixes.
//!
//! # Tools
//!
//! - `find_routine` - Locate a routine and describe it (locate, structure, report, source, git_status)
//! - `search_table` - List routines that use a table, grouped by usage category
//! - `environments` - Show configured environment roots and classifier state

pub mod error;
pub mod models;
pub mod server;
pub mod tools;

pub use error::{Error, Result};
pub use server::SondaMcpServer;
