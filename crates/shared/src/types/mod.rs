//! Common types used across the application.

pub mod code;

pub use code::{CODE_ALPHABET, CODE_LENGTH, CodeError, ShareCode};
