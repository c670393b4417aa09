//! Mail-body handling for stepkit.
//!
//! "Click the link in the mail" steps need to find a URL by the link's
//! visible text inside a message an inbox adapter already fetched. HTML
//! bodies arrive quoted-printable encoded with soft line breaks; plain-text
//! bodies carry footnote-style links (`label* [2]` in the flow, `[2] url`
//! at the bottom). Fetching the message is the harness's job, not ours.

use regex::Regex;
use stepkit_error::{Result, mail_error};

/// A message an inbox adapter handed over.
#[derive(Debug, Clone, Default)]
pub struct MailMessage {
    pub subject: String,
    pub to: String,
    pub text_body: Option<String>,
    pub html_body: Option<String>,
}

impl MailMessage {
    /// Find the URL behind the link with the given visible text, checking
    /// the HTML body first and falling back to the plain-text body.
    ///
    /// `Ok(None)` means the message has no such link; a present-but-empty
    /// `href` is a malformed message and errors.
    pub fn link_url(&self, text: &str) -> Result<Option<String>> {
        if let Some(html) = &self.html_body {
            let decoded = decode_quoted_printable(html);
            if let Some(url) = html_link_url(&decoded, text)? {
                return Ok(Some(url));
            }
        }
        if let Some(body) = &self.text_body {
            return Ok(text_link_url(body, text));
        }
        Ok(None)
    }
}

/// Decode a quoted-printable body: join soft line breaks (`=` at end of
/// line) and decode `=XX` hex escapes.
pub fn decode_quoted_printable(raw: &str) -> String {
    let mut out = Vec::with_capacity(raw.len());
    let bytes = raw.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'=' {
            // Soft line break: "=\r\n" or "=\n" disappears.
            if bytes.get(i + 1) == Some(&b'\r') && bytes.get(i + 2) == Some(&b'\n') {
                i += 3;
                continue;
            }
            if bytes.get(i + 1) == Some(&b'\n') {
                i += 2;
                continue;
            }
            if let (Some(&hi), Some(&lo)) = (bytes.get(i + 1), bytes.get(i + 2)) {
                if let Some(byte) = hex_byte(hi, lo) {
                    out.push(byte);
                    i += 3;
                    continue;
                }
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn hex_byte(hi: u8, lo: u8) -> Option<u8> {
    let hi = (hi as char).to_digit(16)?;
    let lo = (lo as char).to_digit(16)?;
    Some((hi * 16 + lo) as u8)
}

/// Find the `href` of the anchor whose visible text matches `text`.
pub fn html_link_url(html: &str, text: &str) -> Result<Option<String>> {
    // Anchors only; regex is enough for the notification mail we ever see.
    let anchor = Regex::new(r"(?is)<a\s[^>]*>.*?</a>").map_err(|e| mail_error(e.to_string()))?;
    let tag = Regex::new(r"(?s)<[^>]*>").map_err(|e| mail_error(e.to_string()))?;
    let href = Regex::new(r#"href="([^"]*)""#).map_err(|e| mail_error(e.to_string()))?;

    for m in anchor.find_iter(html) {
        let visible = tag.replace_all(m.as_str(), "");
        if visible.trim() != text {
            continue;
        }
        let Some(cap) = href.captures(m.as_str()) else {
            return Err(mail_error("anchor has no href").with_context("link", text));
        };
        let url = cap[1].to_string();
        if url.is_empty() {
            return Err(mail_error("anchor has an empty href").with_context("link", text));
        }
        return Ok(Some(url));
    }
    Ok(None)
}

/// Resolve a footnote-style link in a plain-text body.
///
/// The flow text marks links as `label* [N]`; a list at the bottom maps
/// `[N]` back to the URL. Returns `None` when either half is missing.
pub fn text_link_url(body: &str, label: &str) -> Option<String> {
    let marker = Regex::new(&format!(r"{}\*?\s*\[(\d+)\]", regex::escape(label))).ok()?;
    let number = marker.captures(body)?.get(1)?.as_str();

    let footnote = Regex::new(&format!(r"(?m)^\s*\[{number}\]\s+(\S+)")).ok()?;
    footnote
        .captures(body)
        .and_then(|cap| cap.get(1))
        .map(|m| m.as_str().to_string())
}
