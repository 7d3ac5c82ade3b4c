//! Generation of short random paste ids.

use crate::constants::{PASTE_ID_ALPHABET, PASTE_ID_LENGTH, PASTE_ID_MAX_ATTEMPTS};
use crate::error::StoreError;
use rand::Rng;

/// Shape of generated ids and the collision retry bound.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdPolicy {
    alphabet: &'static [u8],
    length: usize,
    max_attempts: u32,
}

impl Default for IdPolicy {
    fn default() -> Self {
        Self {
            alphabet: PASTE_ID_ALPHABET,
            length: PASTE_ID_LENGTH,
            max_attempts: PASTE_ID_MAX_ATTEMPTS,
        }
    }
}

impl IdPolicy {
    /// Build a custom policy.
    ///
    /// # Errors
    /// Returns [`StoreError::InvalidArgument`] when the alphabet is empty or not
    /// ASCII, or when `length` or `max_attempts` is zero.
    pub fn new(alphabet: &'static [u8], length: usize, max_attempts: u32) -> Result<Self, StoreError> {
        if alphabet.is_empty() || !alphabet.is_ascii() {
            return Err(StoreError::InvalidArgument(
                "id alphabet must be non-empty ASCII".to_string(),
            ));
        }
        if length == 0 {
            return Err(StoreError::InvalidArgument(
                "id length must be positive".to_string(),
            ));
        }
        if max_attempts == 0 {
            return Err(StoreError::InvalidArgument(
                "id attempts must be positive".to_string(),
            ));
        }
        Ok(Self {
            alphabet,
            length,
            max_attempts,
        })
    }

    /// How many candidates one insert may try.
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Draw one candidate id.
    pub fn generate<R: Rng + ?Sized>(&self, rng: &mut R) -> String {
        (0..self.length)
            .map(|_| self.alphabet[rng.gen_range(0..self.alphabet.len())] as char)
            .collect()
    }

    /// Whether `id` has the shape this policy produces.
    ///
    /// Callers can reject malformed ids from URLs before touching storage.
    pub fn accepts(&self, id: &str) -> bool {
        id.len() == self.length && id.bytes().all(|b| self.alphabet.contains(&b))
    }
}
