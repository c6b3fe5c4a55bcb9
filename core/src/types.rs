//! Transfer objects exchanged with the short-link backend.
//!
//! # Design
//! These types mirror the backend's JSON records (camelCase on the wire) but
//! are defined independently of the mock-server crate; integration tests
//! catch schema drift between the two. The client never owns these records:
//! it receives, displays, and deletes them. The only local mutation is the
//! `is_expired` overlay computed from `expires_at`.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

/// A shortened link as returned by the backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ShortLink {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub original_url: String,
    pub short_code: String,
    pub short_url: String,
    #[serde(default)]
    pub clicks: u64,
    pub created_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Locally computed; see [`ShortLink::mark_expired`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_expired: Option<bool>,
}

impl ShortLink {
    /// True when an expiration is set and lies strictly before `now`.
    /// Unparseable expirations are treated as "never expires".
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at
            .as_deref()
            .and_then(parse_timestamp)
            .is_some_and(|expires| expires < now)
    }

    /// Overlay the `is_expired` flag as of `now`.
    pub fn mark_expired(&mut self, now: DateTime<Utc>) {
        self.is_expired = Some(self.is_expired_at(now));
    }

    pub fn expired(&self) -> bool {
        self.is_expired.unwrap_or(false)
    }
}

/// A single recorded visit of a short link. Produced only by the backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ClickEvent {
    pub timestamp: String,
    pub ip_address: String,
}

/// Click statistics for one short link.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsSummary {
    pub original_url: String,
    pub short_code: String,
    pub short_url: String,
    pub total_clicks: u64,
    pub created_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<String>,
    #[serde(default)]
    pub recent_clicks: Vec<ClickEvent>,
}

/// One link to shorten: the payload of single and bulk submissions, and the
/// record produced by delimited-text import.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LinkEntry {
    pub original_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl LinkEntry {
    pub fn new(original_url: impl Into<String>) -> Self {
        Self {
            original_url: original_url.into(),
            expires_at: None,
            category: None,
        }
    }
}

/// An entry of a bulk submission that the backend rejected.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BulkFailure {
    pub original_url: String,
    pub error: String,
}

/// Partition of a bulk submission into created links and rejected entries.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct BulkOutcome {
    #[serde(default)]
    pub successful: Vec<ShortLink>,
    #[serde(default)]
    pub failed: Vec<BulkFailure>,
}

/// QR code for a short link. `qr_code` is an inline base64 data URL.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct QrCode {
    pub qr_code: String,
    pub short_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HealthStatus {
    pub status: String,
    pub timestamp: String,
}

/// Outcome of an operation that reports failures as values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiResponse<T> {
    Success(T),
    Failure(String),
}

impl<T> ApiResponse<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, ApiResponse::Success(_))
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            ApiResponse::Success(data) => Some(data),
            ApiResponse::Failure(_) => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            ApiResponse::Success(_) => None,
            ApiResponse::Failure(msg) => Some(msg),
        }
    }

    pub fn into_result(self) -> Result<T, String> {
        match self {
            ApiResponse::Success(data) => Ok(data),
            ApiResponse::Failure(msg) => Err(msg),
        }
    }
}

/// Parse a backend or user supplied timestamp. Accepts RFC 3339 and bare
/// `YYYY-MM-DD` dates, the latter meaning midnight UTC.
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .map(|date| date.and_time(NaiveTime::MIN).and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn link(expires_at: Option<&str>) -> ShortLink {
        ShortLink {
            id: None,
            original_url: "https://example.com".to_string(),
            short_code: "abc1234".to_string(),
            short_url: "http://sho.rt/abc1234".to_string(),
            clicks: 0,
            created_at: "2024-01-01T00:00:00Z".to_string(),
            expires_at: expires_at.map(str::to_string),
            category: None,
            is_expired: None,
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn short_link_deserializes_wire_shape() {
        let json = r#"{"_id":"66a1","originalUrl":"https://a.com","shortCode":"xYz","shortUrl":"http://s/xYz","clicks":3,"createdAt":"2024-01-01T00:00:00Z","category":"mktg"}"#;
        let parsed: ShortLink = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.id.as_deref(), Some("66a1"));
        assert_eq!(parsed.clicks, 3);
        assert_eq!(parsed.category.as_deref(), Some("mktg"));
        assert!(parsed.expires_at.is_none());
        assert!(parsed.is_expired.is_none());
    }

    #[test]
    fn link_entry_omits_absent_optionals() {
        let json = serde_json::to_value(LinkEntry::new("https://a.com")).unwrap();
        assert_eq!(json, serde_json::json!({"originalUrl": "https://a.com"}));
    }

    #[test]
    fn no_expiration_never_expires() {
        assert!(!link(None).is_expired_at(now()));
    }

    #[test]
    fn past_expiration_is_expired() {
        assert!(link(Some("2024-05-31T23:59:59Z")).is_expired_at(now()));
        assert!(link(Some("2024-05-01")).is_expired_at(now()));
    }

    #[test]
    fn future_expiration_is_active() {
        assert!(!link(Some("2024-06-01T12:00:01Z")).is_expired_at(now()));
        assert!(!link(Some("2024-06-02")).is_expired_at(now()));
    }

    #[test]
    fn garbage_expiration_is_active() {
        assert!(!link(Some("someday")).is_expired_at(now()));
    }

    #[test]
    fn mark_expired_only_touches_flag() {
        let mut l = link(Some("2020-01-01"));
        let before = l.clone();
        l.mark_expired(now());
        assert_eq!(l.is_expired, Some(true));
        l.is_expired = None;
        assert_eq!(l, before);
    }

    #[test]
    fn api_response_accessors() {
        let ok: ApiResponse<u32> = ApiResponse::Success(1);
        assert!(ok.is_success());
        assert_eq!(ok.data(), Some(&1));
        let err: ApiResponse<u32> = ApiResponse::Failure("nope".to_string());
        assert_eq!(err.error(), Some("nope"));
        assert_eq!(err.into_result(), Err("nope".to_string()));
    }
}
