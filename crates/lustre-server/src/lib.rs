//! Runtime pieces of the `lustre` binary: layered configuration, the
//! chat-completions narrative client, and daily sales import.

pub mod config;
pub mod import;
pub mod narrative;

pub use config::{ServerConfig, expand_tilde};
pub use narrative::{ChatClient, NarrativeConfig, Narrator};
