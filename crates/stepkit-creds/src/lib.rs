//! Credential record parsing and mail-account derivation for stepkit.
//!
//! Harness configuration stores test-account credentials as slash-delimited
//! strings: `user/pass`, optionally followed by a mail host and an IMAP
//! host. This crate turns those records into a [`MailAccount`] and derives
//! the addresses placeholders resolve to.

use stepkit_error::{Result, parse_error};

const DEFAULT_MAIL_HOST: &str = "gmail.com";
const DEFAULT_IMAP_HOST: &str = "imap.gmail.com:993";

/// A parsed mail-capable test account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailAccount {
    pub user: String,
    pub pass: String,
    /// Mail domain the account receives at.
    pub host: String,
    /// IMAP endpoint (`host:port`) for inbox polling adapters.
    pub imap: String,
}

impl MailAccount {
    /// The plain address, `user@host`.
    pub fn address(&self) -> String {
        format!("{}@{}", self.user, self.host)
    }

    /// A plus-tagged disposable address, `user+tag@host`.
    ///
    /// Mail providers that support plus addressing deliver these to the
    /// same inbox, which lets every run register with a unique address.
    pub fn unique_address(&self, tag: &str) -> String {
        format!("{}+{}@{}", self.user, tag, self.host)
    }
}

/// Parse a slash-delimited `user/pass[/host[/imap-host]]` record.
///
/// Missing host fields fall back to the gmail defaults the harness has
/// always assumed. Fewer than two fields is a malformed record.
pub fn parse_credentials(record: &str) -> Result<MailAccount> {
    let mut fields = record.split('/');
    let user = fields.next().unwrap_or_default();
    let pass = fields.next().unwrap_or_default();
    if user.is_empty() || pass.is_empty() {
        return Err(parse_error("credential record expects user/password")
            .with_context("record", record));
    }

    let host = fields.next().filter(|s| !s.is_empty());
    let imap = fields.next().filter(|s| !s.is_empty());
    Ok(MailAccount {
        user: user.to_string(),
        pass: pass.to_string(),
        host: host.unwrap_or(DEFAULT_MAIL_HOST).to_string(),
        imap: imap.unwrap_or(DEFAULT_IMAP_HOST).to_string(),
    })
}

/// Strip the domain suffix from a mail address.
///
/// `alice@example.com` becomes `alice`; an address with no `@` is returned
/// whole.
pub fn local_part(address: &str) -> &str {
    address.split('@').next().unwrap_or(address)
}
