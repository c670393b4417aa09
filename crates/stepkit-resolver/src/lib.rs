//! Bracket-placeholder resolution for BDD step arguments.
//!
//! Step text captured by the host runner arrives here before the bound
//! action executes. The resolver scans it left to right for `[name]`
//! placeholders and substitutes from three sources: the per-scenario
//! variable table, the process-scoped token history, and lazily derived
//! well-known entries (`host` from the session, `mail`/`username` from the
//! credential store).
//!
//! Unresolved placeholders are a silent no-op and stay in the output
//! verbatim. Scenario authors rely on that: `[something]` in a literal
//! assertion must not blow up the run. The only error out of `resolve` is
//! a missing mail credential during derivation, which callers must be able
//! to tell apart from "not yet resolved".

use serde::{Deserialize, Serialize};

use stepkit_creds::{MailAccount, local_part, parse_credentials};
use stepkit_error::{Result, credential_missing};
use stepkit_ports::{CredentialSource, SessionInfo, TokenGenerator};
use stepkit_random::TokenHistory;
use stepkit_url::host_of;
use stepkit_vars::VarTable;

/// Resolver configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Length of generated `[random]` tokens.
    #[serde(default = "default_token_length")]
    pub token_length: usize,

    /// Credential category the mail record lives under.
    #[serde(default = "default_credential_category")]
    pub credential_category: String,

    /// Role name of the mail credential record.
    #[serde(default = "default_mail_role")]
    pub mail_role: String,

    /// Derive plus-tagged (`user+tag@host`) addresses so every run
    /// registers with a unique inbox alias.
    #[serde(default)]
    pub unique_mail: bool,
}

fn default_token_length() -> usize {
    8
}

fn default_credential_category() -> String {
    "site".to_string()
}

fn default_mail_role() -> String {
    "mail".to_string()
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            token_length: default_token_length(),
            credential_category: default_credential_category(),
            mail_role: default_mail_role(),
            unique_mail: false,
        }
    }
}

/// Step-argument resolver.
///
/// Holds the per-scenario variable table and the process-scoped token
/// history. One resolver lives for the whole run; [`Resolver::reset_scenario`]
/// clears the scenario-lifetime state and deliberately leaves the history
/// alone, so `[random:N]` can reach tokens generated in earlier scenarios.
pub struct Resolver<'a> {
    session: &'a dyn SessionInfo,
    credentials: &'a dyn CredentialSource,
    tokens: &'a dyn TokenGenerator,
    config: ResolverConfig,
    vars: VarTable,
    history: TokenHistory,
    account: Option<MailAccount>,
}

impl std::fmt::Debug for Resolver<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resolver")
            .field("config", &self.config)
            .field("vars", &self.vars)
            .field("history", &self.history)
            .finish_non_exhaustive()
    }
}

impl<'a> Resolver<'a> {
    pub fn new(
        session: &'a dyn SessionInfo,
        credentials: &'a dyn CredentialSource,
        tokens: &'a dyn TokenGenerator,
    ) -> Self {
        Self::with_config(session, credentials, tokens, ResolverConfig::default())
    }

    pub fn with_config(
        session: &'a dyn SessionInfo,
        credentials: &'a dyn CredentialSource,
        tokens: &'a dyn TokenGenerator,
        config: ResolverConfig,
    ) -> Self {
        Self {
            session,
            credentials,
            tokens,
            config,
            vars: VarTable::new(),
            history: TokenHistory::new(),
            account: None,
        }
    }

    /// Resolve every resolvable placeholder in a raw step argument.
    ///
    /// Escaped double quotes (`\"`) are normalized first. Substituted text
    /// is never rescanned, so a value containing `[` cannot trigger another
    /// round of expansion. A `[` with no closing `]` ends the scan with the
    /// remainder untouched.
    pub fn resolve(&mut self, raw: &str) -> Result<String> {
        let mut arg = raw.replace("\\\"", "\"");
        let mut start = 0;
        let mut ensured = false;

        while let Some(open) = arg[start..].find('[').map(|i| start + i) {
            let Some(close) = arg[open..].find(']').map(|i| open + i) else {
                break;
            };
            if !ensured {
                self.ensure_well_known()?;
                ensured = true;
            }

            let name = arg[open + 1..close].to_string();
            if name == "random" {
                let token = self.tokens.token(self.config.token_length);
                self.history.push(token.clone());
                self.vars.set("random", token);
            } else if name == "mail:new" {
                // Invalidate only. The next access to `mail` or `username`
                // re-derives from a fresh credential lookup; the token
                // itself leaves no text behind.
                self.vars.remove("mail");
                self.vars.remove("username");
                self.account = None;
                ensured = false;
                arg.replace_range(open..=close, "");
                start = open;
                continue;
            } else if let Some(num) = name.strip_prefix("random:") {
                if let Ok(n) = num.parse::<usize>() {
                    if let Some(token) = self.history.recent(n) {
                        let token = token.to_string();
                        self.vars.set(name.clone(), token);
                    }
                }
            }

            if let Some(value) = self.vars.get(&name) {
                let value = value.to_string();
                arg.replace_range(open..=close, &value);
                start = open + value.len();
            } else {
                start = close + 1;
            }
        }

        Ok(arg)
    }

    /// Record a captured value (say, the text of a link an assertion just
    /// located) so later placeholders can refer to it by name.
    pub fn record(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.vars.set(name, value);
    }

    /// Start a new scenario: drop the variable table and the cached mail
    /// account. The token history survives on purpose.
    pub fn reset_scenario(&mut self) {
        self.vars.clear();
        self.account = None;
    }

    pub fn vars(&self) -> &VarTable {
        &self.vars
    }

    pub fn history(&self) -> &TokenHistory {
        &self.history
    }

    /// Populate the well-known entries if they are missing.
    ///
    /// `host` comes from the current session address and stays unset when
    /// there is no page or the address has no host; its placeholder then
    /// passes through verbatim like any unknown name. `mail`/`username`
    /// come from the credential store, and absence there is a hard error.
    fn ensure_well_known(&mut self) -> Result<()> {
        if !self.vars.contains("host") {
            if let Some(host) = self.session.current_address().and_then(|a| host_of(&a)) {
                self.vars.set("host", host);
            }
        }

        if !self.vars.contains("mail") {
            let account = self.mail_account()?;
            let address = if self.config.unique_mail {
                let tag = self.tokens.token(self.config.token_length);
                account.unique_address(&tag)
            } else {
                account.address()
            };
            self.vars.set("username", local_part(&address).to_string());
            self.vars.set("mail", address);
        }

        Ok(())
    }

    fn mail_account(&mut self) -> Result<MailAccount> {
        if let Some(account) = &self.account {
            return Ok(account.clone());
        }
        let record = self
            .credentials
            .credentials(&self.config.credential_category, &self.config.mail_role)
            .ok_or_else(|| {
                credential_missing(&self.config.mail_role)
                    .with_context("category", &self.config.credential_category)
            })?;
        let account = parse_credentials(&record)?;
        self.account = Some(account.clone());
        Ok(account)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stepkit_testkit::{FixedSession, SequenceTokens, StaticCredentials};

    fn session() -> FixedSession {
        FixedSession::at("https://www.example.com/user/login")
    }

    fn creds() -> StaticCredentials {
        StaticCredentials::empty().with("site", "mail", "alice/secret")
    }

    #[test]
    fn plain_strings_come_back_unchanged() {
        let session = session();
        let creds = creds();
        let tokens = SequenceTokens::default();
        let mut resolver = Resolver::new(&session, &creds, &tokens);

        assert_eq!(resolver.resolve("no placeholders here").unwrap(), "no placeholders here");
        // No bracket, no collaborator traffic.
        assert_eq!(creds.lookups(), 0);
    }

    #[test]
    fn escaped_quotes_are_normalized() {
        let session = session();
        let creds = creds();
        let tokens = SequenceTokens::default();
        let mut resolver = Resolver::new(&session, &creds, &tokens);

        assert_eq!(resolver.resolve(r#"say \"hello\""#).unwrap(), r#"say "hello""#);
    }

    #[test]
    fn host_mail_and_username_are_derived() {
        let session = session();
        let creds = creds();
        let tokens = SequenceTokens::default();
        let mut resolver = Resolver::new(&session, &creds, &tokens);

        let out = resolver.resolve("[username] on [host] gets [mail]").unwrap();
        insta::assert_snapshot!(out, @"alice on www.example.com gets alice@gmail.com");
    }

    #[test]
    fn random_generates_and_records_history() {
        let session = session();
        let creds = creds();
        let tokens = SequenceTokens::of(["AbCd1234"]);
        let mut resolver = Resolver::new(&session, &creds, &tokens);

        assert_eq!(resolver.resolve("user-[random]").unwrap(), "user-AbCd1234");
        assert_eq!(resolver.history().len(), 1);
        assert_eq!(resolver.vars().get("random"), Some("AbCd1234"));
    }

    #[test]
    fn random_n_reads_history_back() {
        let session = session();
        let creds = creds();
        let tokens = SequenceTokens::of(["first111", "second22"]);
        let mut resolver = Resolver::new(&session, &creds, &tokens);

        resolver.resolve("[random]").unwrap();
        assert_eq!(resolver.resolve("[random:1]").unwrap(), "first111");

        resolver.resolve("[random]").unwrap();
        assert_eq!(resolver.resolve("[random:1]").unwrap(), "second22");
        assert_eq!(resolver.resolve("[random:2]").unwrap(), "first111");
    }

    #[test]
    fn random_n_before_any_random_stays_literal() {
        let session = session();
        let creds = creds();
        let tokens = SequenceTokens::default();
        let mut resolver = Resolver::new(&session, &creds, &tokens);

        assert_eq!(resolver.resolve("[random:2]").unwrap(), "[random:2]");
    }

    #[test]
    fn random_n_rejects_zero_and_garbage() {
        let session = session();
        let creds = creds();
        let tokens = SequenceTokens::of(["tok11111"]);
        let mut resolver = Resolver::new(&session, &creds, &tokens);

        resolver.resolve("[random]").unwrap();
        assert_eq!(resolver.resolve("[random:0]").unwrap(), "[random:0]");
        assert_eq!(resolver.resolve("[random:x]").unwrap(), "[random:x]");
        assert_eq!(resolver.resolve("[random:-1]").unwrap(), "[random:-1]");
    }

    #[test]
    fn mail_new_forces_a_fresh_lookup_on_next_access() {
        let session = session();
        let creds = creds();
        let tokens = SequenceTokens::default();
        let mut resolver = Resolver::new(&session, &creds, &tokens);

        resolver.resolve("[mail]").unwrap();
        let before = creds.lookups();

        assert_eq!(resolver.resolve("[mail:new]").unwrap(), "");
        let out = resolver.resolve("[mail]").unwrap();
        assert_eq!(out, "alice@gmail.com");
        assert!(creds.lookups() > before);
    }

    #[test]
    fn mail_new_rederives_within_the_same_argument() {
        let session = session();
        let creds = creds();
        let tokens = SequenceTokens::default();
        let mut resolver = Resolver::new(&session, &creds, &tokens);

        resolver.resolve("[mail]").unwrap();
        let before = creds.lookups();

        let out = resolver.resolve("[mail:new][mail]").unwrap();
        assert_eq!(out, "alice@gmail.com");
        assert!(creds.lookups() > before);
    }

    #[test]
    fn unknown_placeholders_stay_verbatim() {
        let session = session();
        let creds = creds();
        let tokens = SequenceTokens::default();
        let mut resolver = Resolver::new(&session, &creds, &tokens);

        assert_eq!(
            resolver.resolve("see [unknown] and [host]").unwrap(),
            "see [unknown] and www.example.com"
        );
    }

    #[test]
    fn unmatched_bracket_stops_the_scan() {
        let session = session();
        let creds = creds();
        let tokens = SequenceTokens::default();
        let mut resolver = Resolver::new(&session, &creds, &tokens);

        assert_eq!(resolver.resolve("broken [host").unwrap(), "broken [host");
        // Never reached the ensure step.
        assert_eq!(creds.lookups(), 0);
    }

    #[test]
    fn substituted_text_is_not_rescanned() {
        let session = session();
        let creds = creds();
        let tokens = SequenceTokens::default();
        let mut resolver = Resolver::new(&session, &creds, &tokens);

        resolver.record("outer", "[host]");
        assert_eq!(resolver.resolve("[outer]").unwrap(), "[host]");
    }

    #[test]
    fn missing_credential_is_a_credential_error() {
        let session = session();
        let creds = StaticCredentials::empty();
        let tokens = SequenceTokens::default();
        let mut resolver = Resolver::new(&session, &creds, &tokens);

        let err = resolver.resolve("[mail]").unwrap_err();
        assert!(err.is_credential_error());
    }

    #[test]
    fn sessionless_host_stays_verbatim() {
        let session = FixedSession::absent();
        let creds = creds();
        let tokens = SequenceTokens::default();
        let mut resolver = Resolver::new(&session, &creds, &tokens);

        assert_eq!(resolver.resolve("[host]").unwrap(), "[host]");
    }

    #[test]
    fn reset_scenario_clears_vars_but_keeps_history() {
        let session = session();
        let creds = creds();
        let tokens = SequenceTokens::of(["AbCd1234"]);
        let mut resolver = Resolver::new(&session, &creds, &tokens);

        resolver.resolve("[random]").unwrap();
        resolver.reset_scenario();

        assert!(resolver.vars().is_empty());
        assert_eq!(resolver.resolve("[random:1]").unwrap(), "AbCd1234");
    }

    #[test]
    fn recorded_captures_substitute_by_name() {
        let session = session();
        let creds = creds();
        let tokens = SequenceTokens::default();
        let mut resolver = Resolver::new(&session, &creds, &tokens);

        resolver.record("link-text", "My Account");
        assert_eq!(resolver.resolve("click [link-text]").unwrap(), "click My Account");
    }

    #[test]
    fn unique_mail_plus_tags_the_address() {
        let session = session();
        let creds = creds();
        let tokens = SequenceTokens::of(["Tag12345"]);
        let config = ResolverConfig { unique_mail: true, ..ResolverConfig::default() };
        let mut resolver = Resolver::with_config(&session, &creds, &tokens, config);

        assert_eq!(resolver.resolve("[mail]").unwrap(), "alice+Tag12345@gmail.com");
        assert_eq!(resolver.resolve("[username]").unwrap(), "alice+Tag12345");
    }

    #[test]
    fn config_defaults_deserialize_from_empty_json() {
        let config: ResolverConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.token_length, 8);
        assert_eq!(config.credential_category, "site");
        assert_eq!(config.mail_role, "mail");
        assert!(!config.unique_mail);
    }

    #[test]
    fn config_overrides_deserialize() {
        let config: ResolverConfig =
            serde_json::from_str(r#"{"token_length": 12, "mail_role": "inbox", "unique_mail": true}"#)
                .unwrap();
        assert_eq!(config.token_length, 12);
        assert_eq!(config.mail_role, "inbox");
        assert!(config.unique_mail);
    }
}
