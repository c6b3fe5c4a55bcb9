//! Input checks the caller runs before submitting.
//!
//! The API client itself does not re-validate URLs; these helpers exist for
//! the host, which rejects bad input before any request is built.

use chrono::{NaiveDate, Utc};

use crate::types::{parse_timestamp, LinkEntry};

const MAX_URL_LEN: usize = 2048;

/// Accept absolute http(s) URLs with a non-empty host.
pub fn is_valid_url(s: &str) -> bool {
    let rest = match s.strip_prefix("https://").or_else(|| s.strip_prefix("http://")) {
        Some(rest) => rest,
        None => return false,
    };
    if s.len() > MAX_URL_LEN || s.chars().any(char::is_whitespace) {
        return false;
    }
    let authority = rest.split(['/', '?', '#']).next().unwrap_or("");
    let host = authority.rsplit('@').next().unwrap_or("");
    let host = host.split(':').next().unwrap_or("");
    !host.is_empty()
}

/// An expiration is acceptable when it parses and its date is not before
/// `today`.
pub fn is_valid_expiration(s: &str, today: NaiveDate) -> bool {
    parse_timestamp(s).is_some_and(|ts| ts.date_naive() >= today)
}

/// Drop entries whose URL is blank, the way the bulk form discards empty rows.
pub fn discard_blank(entries: Vec<LinkEntry>) -> Vec<LinkEntry> {
    entries
        .into_iter()
        .filter(|e| !e.original_url.trim().is_empty())
        .collect()
}

/// First entry whose URL or expiration would be rejected, with the reason.
pub fn first_invalid(entries: &[LinkEntry]) -> Option<(&LinkEntry, &'static str)> {
    let today = Utc::now().date_naive();
    entries.iter().find_map(|e| {
        if !is_valid_url(&e.original_url) {
            Some((e, "Invalid URL"))
        } else if e.expires_at.as_deref().is_some_and(|x| !is_valid_expiration(x, today)) {
            Some((e, "Invalid expiration date"))
        } else {
            None
        }
    })
}
