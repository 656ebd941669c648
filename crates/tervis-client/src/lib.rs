//! Tervis Client - HTTP clients for external APIs
//!
//! This crate provides HTTP clients for interacting with:
//!
//! - [`gemini`] - Google Gemini generateContent API (answer narratives)
//! - [`news`] - Health news source and its translation endpoint
//!
//! # Overview
//!
//! The clients handle request building, response parsing, and mapping
//! upstream failures onto [`tervis_core::AppError`].

pub mod gemini;
pub mod news;

// Re-export main client types
pub use gemini::GeminiClient;
pub use news::HealthNewsClient;
