//! Share code generation.

use codedrop_shared::types::{CODE_ALPHABET, CODE_LENGTH, ShareCode};
use rand::Rng;

/// Produces candidate share codes.
///
/// Generators do not guarantee uniqueness; the blob store retries on
/// collision.
pub trait CodeGenerator: Send + Sync {
    /// Returns a fresh candidate code.
    fn generate(&self) -> ShareCode;
}

/// Draws each character uniformly from `[A-Z0-9]` using the thread-local
/// CSPRNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomCodeGenerator;

impl CodeGenerator for RandomCodeGenerator {
    fn generate(&self) -> ShareCode {
        let mut rng = rand::rng();
        let indices: [usize; CODE_LENGTH] =
            std::array::from_fn(|_| rng.random_range(0..CODE_ALPHABET.len()));
        ShareCode::from_indices(indices)
    }
}
