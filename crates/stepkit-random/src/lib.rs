//! Random token generation utilities for stepkit.
//!
//! Provides the alphanumeric tokens that `[random]` placeholders resolve to,
//! and the process-scoped history that `[random:N]` placeholders read back.

use rand::Rng;
use rand::rng;

const ALPHANUMERIC: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// Generate a random alphanumeric token of the given length.
pub fn random_token(length: usize) -> String {
    (0..length)
        .map(|_| ALPHANUMERIC[rng().random_range(0..ALPHANUMERIC.len())] as char)
        .collect()
}

/// Append-only record of generated tokens.
///
/// Lifetime is the whole process, not a single scenario: scenario resets
/// clear the variable table but leave this intact, so later scenarios can
/// still refer to tokens typed into forms earlier in the run. Single-threaded
/// by contract; a parallel runner would need to wrap it.
#[derive(Debug, Clone, Default)]
pub struct TokenHistory {
    entries: Vec<String>,
}

impl TokenHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a freshly generated token.
    pub fn push(&mut self, token: impl Into<String>) {
        self.entries.push(token.into());
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The most recently recorded token, if any.
    pub fn latest(&self) -> Option<&str> {
        self.entries.last().map(|s| s.as_str())
    }

    /// The n-th most recent token, counting from 1 (`recent(1)` is the
    /// latest entry). Returns `None` for 0 or anything past the start of
    /// the history.
    pub fn recent(&self, n: usize) -> Option<&str> {
        if n == 0 || n > self.entries.len() {
            return None;
        }
        self.entries.get(self.entries.len() - n).map(|s| s.as_str())
    }
}
