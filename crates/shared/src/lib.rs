//! Shared types, errors, and configuration for Codedrop.
//!
//! This crate provides common types used across all other crates:
//! - Share codes, the five-character keys handed to uploaders
//! - Application-wide error types
//! - Configuration management

pub mod config;
pub mod error;
pub mod types;

pub use config::AppConfig;
pub use error::{AppError, AppResult};
pub use types::{CodeError, ShareCode};
