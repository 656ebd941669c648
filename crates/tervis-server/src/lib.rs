//! Tervis Server - HTTP API and command-line interface.
//!
//! This crate wires the core services to PostgreSQL and Gemini and exposes
//! them through an axum router (`tervis serve`) or one-shot subcommands.

pub mod api;
pub mod config;
pub mod dto;
pub mod error;

pub use api::{router, AppState};
pub use config::{Command, Config};
pub use error::ApiError;
