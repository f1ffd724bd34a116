//! Generators produce the opaque values of authorization codes, access and refresh tokens.
//!
//! The values carry no information about the grant. The grant is recovered from the repository
//! where it was stored under the generated value, so the only requirement on a generator is that
//! its output can not be guessed.
use std::sync::Arc;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::{rngs::OsRng, RngCore};

use super::PrimitiveError;

/// Generic token generator.
///
/// ## Requirements on implementations
///
/// The output MUST be indistinguishable from a random function and MUST be usable unescaped in
/// the query or fragment of a url.
pub trait TagGrant: Send + Sync {
    /// Generate a fresh value.
    fn tag(&self) -> Result<String, PrimitiveError>;
}

/// Generates tokens from random bytes.
///
/// Each byte is chosen from the operating system random source and the result is encoded as
/// base64url without padding.
pub struct RandomGenerator {
    random: OsRng,
    len: usize,
}

impl RandomGenerator {
    /// Generates tokens with a specific byte length.
    pub fn new(length: usize) -> RandomGenerator {
        RandomGenerator {
            random: OsRng,
            len: length,
        }
    }

    fn generate(&self) -> Result<String, PrimitiveError> {
        let mut result = vec![0; self.len];
        let mut random = self.random;
        random
            .try_fill_bytes(result.as_mut_slice())
            .map_err(|_| PrimitiveError::Generation)?;
        Ok(URL_SAFE_NO_PAD.encode(result))
    }
}

impl TagGrant for RandomGenerator {
    fn tag(&self) -> Result<String, PrimitiveError> {
        self.generate()
    }
}

impl<T: TagGrant + ?Sized> TagGrant for Box<T> {
    fn tag(&self) -> Result<String, PrimitiveError> {
        (**self).tag()
    }
}

impl<T: TagGrant + ?Sized> TagGrant for Arc<T> {
    fn tag(&self) -> Result<String, PrimitiveError> {
        (**self).tag()
    }
}

impl<'a, T: TagGrant + ?Sized + 'a> TagGrant for &'a T {
    fn tag(&self) -> Result<String, PrimitiveError> {
        (**self).tag()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_tokens_are_distinct() {
        let generator = RandomGenerator::new(32);
        let first = generator.tag().unwrap();
        let second = generator.tag().unwrap();
        assert_ne!(first, second);
        // 32 bytes are 43 base64url characters without padding.
        assert_eq!(first.len(), 43);
        assert!(first
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || ch == '-' || ch == '_'));
    }

    #[test]
    fn through_pointers() {
        let generator: Arc<dyn TagGrant> = Arc::new(RandomGenerator::new(8));
        assert_eq!(generator.tag().unwrap().len(), 11);
        let boxed: Box<dyn TagGrant> = Box::new(RandomGenerator::new(8));
        assert_eq!((&boxed).tag().unwrap().len(), 11);
    }
}
