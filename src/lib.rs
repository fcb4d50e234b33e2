//! Minimal CNI plugin for Kubernetes
//!
//! This crate implements the host side of a CNI invocation:
//! - Reads CNI_* environment variables and piped stdin once at startup
//! - Negotiates the protocol version
//! - Dispatches ADD, DEL and VERSION
//! - Emits exactly one CNI result or error document on stdout

pub mod adapter;
pub mod commands;
pub mod config;
pub mod error;
pub mod input;
pub mod plugin;
pub mod types;

// Re-export commonly used items
pub use adapter::{render_error, Adapter, PluginParameters};
pub use commands::{dispatch, Command, Plugin};
pub use config::NetConf;
pub use error::{CniError, Result};
pub use input::InvocationInput;
pub use plugin::SubnetPlugin;
