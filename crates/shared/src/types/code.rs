//! Share codes: the short identifiers handed out for every upload.
//!
//! A code is exactly five characters drawn from `[A-Z0-9]`, which gives
//! 36^5 (about 60 million) distinct values. Codes are typed by hand, so the
//! alphabet is kept upper-case only and parsing does not fold case.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

/// Number of characters in a share code.
pub const CODE_LENGTH: usize = 5;

/// Symbols a share code may contain.
pub const CODE_ALPHABET: &[u8; 36] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Reasons a string is not a valid share code.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodeError {
    /// Wrong number of characters.
    #[error("share code must be {CODE_LENGTH} characters, got {0}")]
    InvalidLength(usize),

    /// A character outside `[A-Z0-9]`.
    #[error("share code contains invalid character {0:?}")]
    InvalidCharacter(char),
}

/// A validated five-character share code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ShareCode(String);

impl ShareCode {
    /// Parses and validates a share code.
    pub fn parse(raw: &str) -> Result<Self, CodeError> {
        let len = raw.chars().count();
        if len != CODE_LENGTH {
            return Err(CodeError::InvalidLength(len));
        }

        if let Some(bad) = raw.chars().find(|c| !is_code_char(*c)) {
            return Err(CodeError::InvalidCharacter(bad));
        }

        Ok(Self(raw.to_string()))
    }

    /// Builds a code from alphabet indices.
    ///
    /// Each index is reduced modulo the alphabet size, so any input yields a
    /// valid code. Used by code generators.
    #[must_use]
    pub fn from_indices(indices: [usize; CODE_LENGTH]) -> Self {
        let code = indices
            .iter()
            .map(|&i| char::from(CODE_ALPHABET[i % CODE_ALPHABET.len()]))
            .collect();
        Self(code)
    }

    /// Returns the code as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the code, returning the inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

/// True if `c` belongs to the share-code alphabet.
#[must_use]
pub fn is_code_char(c: char) -> bool {
    c.is_ascii_uppercase() || c.is_ascii_digit()
}

impl fmt::Display for ShareCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ShareCode {
    type Err = CodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for ShareCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl<'de> Deserialize<'de> for ShareCode {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}
