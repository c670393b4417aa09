//! URL helpers for stepkit.
//!
//! Thin wrappers over the `url` crate for the pieces of address handling
//! step resolution needs: the host component behind `[host]`, decoded query
//! parameters, and raw destinations behind click-tracking redirects.

use std::collections::HashMap;
use url::Url;

/// Host component of an address, if it parses as a URL with a host.
pub fn host_of(address: &str) -> Option<String> {
    Url::parse(address)
        .ok()
        .and_then(|url| url.host_str().map(|h| h.to_string()))
}

/// Decoded query parameters of a URL, keyed by name.
///
/// Later duplicates win, which is all the harness configuration ever needs.
pub fn query_map(url: &Url) -> HashMap<String, String> {
    url.query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}

/// Unwrap a click-tracking redirect to the raw destination.
///
/// Transactional mail providers rewrite links through their own host with
/// the real target in a `url` query parameter (mandrillapp.com does this).
/// Tests want the destination, not the tracker; anything that is not a
/// recognizable wrapper passes through unchanged.
pub fn raw_click_url(address: &str) -> String {
    let Ok(url) = Url::parse(address) else {
        return address.to_string();
    };
    if url.host_str() == Some("mandrillapp.com") {
        let params = query_map(&url);
        if let Some(target) = params.get("url").filter(|t| !t.is_empty()) {
            return target.clone();
        }
    }
    address.to_string()
}
