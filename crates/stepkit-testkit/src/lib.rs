//! Scripted collaborators for stepkit tests.
//!
//! Keeping these in a microcrate avoids copy-paste across resolver and
//! integration tests. Everything here is synchronous and single-threaded,
//! matching the runner contract, so interior mutability is plain `Cell` and
//! `RefCell`.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::collections::VecDeque;

use stepkit_ports::{CredentialSource, SessionInfo, TokenGenerator};

/// A session pinned to one address (or to none at all).
#[derive(Debug, Clone, Default)]
pub struct FixedSession {
    address: Option<String>,
}

impl FixedSession {
    /// A session currently showing the given address.
    pub fn at(address: impl Into<String>) -> Self {
        Self { address: Some(address.into()) }
    }

    /// A session with no page loaded yet.
    pub fn absent() -> Self {
        Self { address: None }
    }
}

impl SessionInfo for FixedSession {
    fn current_address(&self) -> Option<String> {
        self.address.clone()
    }
}

/// In-memory credential store that counts lookups.
///
/// The counter is what lets tests assert that `[mail:new]` really forces a
/// fresh lookup instead of serving the cached account.
#[derive(Debug, Default)]
pub struct StaticCredentials {
    records: HashMap<(String, String), String>,
    lookups: Cell<usize>,
}

impl StaticCredentials {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Add a record under a category/role pair.
    pub fn with(mut self, category: &str, role: &str, record: &str) -> Self {
        self.records
            .insert((category.to_string(), role.to_string()), record.to_string());
        self
    }

    /// How many lookups have been served (hits and misses both count).
    pub fn lookups(&self) -> usize {
        self.lookups.get()
    }
}

impl CredentialSource for StaticCredentials {
    fn credentials(&self, category: &str, role: &str) -> Option<String> {
        self.lookups.set(self.lookups.get() + 1);
        self.records
            .get(&(category.to_string(), role.to_string()))
            .cloned()
    }
}

/// Deterministic token stream.
///
/// Serves the scripted tokens in order; once exhausted it falls back to
/// `Z` repeated to the requested length so a test that under-scripts fails
/// loudly on content rather than panicking.
#[derive(Debug, Default)]
pub struct SequenceTokens {
    queue: RefCell<VecDeque<String>>,
}

impl SequenceTokens {
    pub fn of<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            queue: RefCell::new(tokens.into_iter().map(Into::into).collect()),
        }
    }
}

impl TokenGenerator for SequenceTokens {
    fn token(&self, length: usize) -> String {
        self.queue
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| "Z".repeat(length))
    }
}
