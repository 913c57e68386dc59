//! Strips the handful of active-content vectors rendered templates may
//! carry before they are placed into a sandboxed frame.
//!
//! Covers exactly four things: `<script>` elements, `<meta http-equiv>`
//! tags, inline `on*` event handler attributes and `javascript:` URLs.
//! Anything else passes through untouched; this is not a general HTML
//! sanitizer.

use regex::{Captures, Regex};
use std::sync::OnceLock;

/// Replacement for a neutralized `javascript:` scheme
pub const BLOCKED_SCHEME: &str = "blocked:";

fn script_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?is)<script\b[^>]*>.*?</script\s*>|<script\b[^>]*/?>")
            .expect("Invalid script regex")
    })
}

fn meta_refresh_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)<meta\b[^>]*\bhttp-equiv\b[^>]*>").expect("Invalid meta regex")
    })
}

/// A start tag, stepping over quoted attribute values so a `>` inside
/// quotes does not end the tag. A stray quote counts as a plain character.
fn tag_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"<[A-Za-z](?:[^>"']|"[^"]*"|'[^']*'|["'])*>"#).expect("Invalid tag regex")
    })
}

/// Inside a tag: a quoted value (kept as is) or an `on*` attribute
/// preceded by whitespace or `/` (removed).
fn attribute_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?i)"[^"]*"|'[^']*'|[\s/]+on[a-z]+\s*=\s*(?:"[^"]*"|'[^']*'|[^\s>]+)"#)
            .expect("Invalid event handler regex")
    })
}

fn javascript_scheme_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)javascript\s*:").expect("Invalid scheme regex"))
}

pub fn sanitize_html(html: &str) -> String {
    let html = script_regex().replace_all(html, "");
    let html = meta_refresh_regex().replace_all(&html, "");

    tag_regex()
        .replace_all(&html, |caps: &Captures| {
            let tag = strip_event_handlers(&caps[0]);
            javascript_scheme_regex()
                .replace_all(&tag, BLOCKED_SCHEME)
                .into_owned()
        })
        .into_owned()
}

fn strip_event_handlers(tag: &str) -> String {
    attribute_regex()
        .replace_all(tag, |caps: &Captures| {
            let matched = &caps[0];
            if matched.starts_with('"') || matched.starts_with('\'') {
                matched.to_string()
            } else {
                String::new()
            }
        })
        .into_owned()
}
