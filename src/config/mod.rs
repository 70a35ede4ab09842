//! Configuration management for transcribe.
//!
//! This module handles loading and saving application configuration from TOML files,
//! and reading credentials (login table and API token) from a separate secrets file.

pub mod file;
pub mod secrets;

pub use file::{get_config_dir, get_config_path, AppConfig, ReplicateConfig, ServerConfig, TranscriberConfig};
pub use secrets::Secrets;
