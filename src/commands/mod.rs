//! Application command handlers for transcribe.
//!
//! # Commands
//! - `serve`: Run the browser UI (default)
//! - `file`: Transcribe a local audio file and print the text
//! - `languages`: List the supported origin language codes
//! - `config`: Open the configuration file in the user's preferred editor
//! - `logs`: Display recent log entries

pub mod config;
pub mod file;
pub mod languages;
pub mod logs;
pub mod serve;

pub use config::handle_config;
pub use file::handle_file;
pub use languages::handle_languages;
pub use logs::handle_logs;
pub use serve::handle_serve;
