//! Browser form for audio transcription backed by a hosted Whisper model.

pub mod app;
pub mod auth;
pub mod commands;
pub mod config;
pub mod languages;
pub mod logging;
pub mod session;
pub mod setup;
pub mod transcription;
pub mod web;
