//! Port traits for stepkit's external collaborators.
//!
//! The resolver never talks to a browser, a credential store, or an RNG
//! directly. Adapters for the real things live with the host harness;
//! scripted stand-ins live in `stepkit-testkit`.

/// Read access to the active browser session.
///
/// This is intentionally a port so the resolver can derive `host` without
/// knowing which automation layer is driving the browser.
pub trait SessionInfo {
    /// The address of the page currently loaded, if there is one.
    fn current_address(&self) -> Option<String>;
}

/// Role-keyed credential lookup.
///
/// Records are the raw slash-delimited `user/pass[/host[/imap-host]]` form
/// the harness configuration stores them in; parsing lives in
/// `stepkit-creds`. `None` means no record is configured for that role.
pub trait CredentialSource {
    fn credentials(&self, category: &str, role: &str) -> Option<String>;
}

/// Random token generation.
///
/// A port rather than a direct `rand` call so tests can substitute a
/// deterministic sequence.
pub trait TokenGenerator {
    fn token(&self, length: usize) -> String;
}

/// Default generator backed by `stepkit-random`.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomTokens;

impl TokenGenerator for RandomTokens {
    fn token(&self, length: usize) -> String {
        stepkit_random::random_token(length)
    }
}
