//! Failure-normalizing operations over a [`Transport`].
//!
//! `ApiService` is what a view layer talks to. Each operation performs one
//! round-trip and never returns `Err`: failures are logged and converted to
//! the operation's failure value (a message, an empty list, `None` or
//! `false`). `try_list_urls` is the exception, for hosts that cache the
//! list. No retries; the caller decides whether to try again.

use chrono::{SecondsFormat, Utc};
use tracing::{debug, warn};

use crate::client::ShortLinkClient;
use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse, Transport};
use crate::types::{
    AnalyticsSummary, ApiResponse, BulkOutcome, HealthStatus, LinkEntry, QrCode, ShortLink,
};

pub struct ApiService<T> {
    client: ShortLinkClient,
    transport: T,
}

impl<T: Transport> ApiService<T> {
    pub fn new(base_url: &str, transport: T) -> Self {
        Self {
            client: ShortLinkClient::new(base_url),
            transport,
        }
    }

    pub fn client(&self) -> &ShortLinkClient {
        &self.client
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    fn round_trip<R>(
        &self,
        operation: &'static str,
        request: Result<HttpRequest, ApiError>,
        parse: impl FnOnce(&ShortLinkClient, HttpResponse) -> Result<R, ApiError>,
    ) -> Result<R, ApiError> {
        let request = request?;
        debug!(operation, method = request.method.as_str(), path = %request.path, "sending request");
        let response = self.transport.execute(request)?;
        debug!(operation, status = response.status, "received response");
        parse(&self.client, response).inspect_err(|error| {
            warn!(operation, %error, "API error");
        })
    }

    /// Create a short link. The URL is expected to be validated by the caller.
    pub fn submit_url(
        &self,
        original_url: &str,
        expires_at: Option<&str>,
        category: Option<&str>,
    ) -> ApiResponse<ShortLink> {
        let entry = LinkEntry {
            original_url: original_url.to_string(),
            expires_at: expires_at.map(str::to_string),
            category: category.map(str::to_string),
        };
        let result = self.round_trip("submit_url", self.client.build_shorten(&entry), |c, r| {
            c.parse_shorten(r)
        });
        to_response("submit_url", result)
    }

    /// All links in backend order, or an empty list on failure.
    pub fn list_urls(&self) -> Vec<ShortLink> {
        or_log("list_urls", self.try_list_urls()).unwrap_or_default()
    }

    /// Like [`ApiService::list_urls`], but keeps the failure so a host can
    /// tell an empty list from a failed fetch.
    pub fn try_list_urls(&self) -> Result<Vec<ShortLink>, ApiError> {
        self.round_trip("list_urls", Ok(self.client.build_list_urls()), |c, r| {
            c.parse_list_urls(r)
        })
    }

    pub fn list_by_category(&self, category: &str) -> Vec<ShortLink> {
        let request = Ok(self.client.build_list_by_category(category));
        let result = self.round_trip("list_by_category", request, |c, r| c.parse_list_urls(r));
        or_log("list_by_category", result).unwrap_or_default()
    }

    pub fn list_categories(&self) -> Vec<String> {
        let request = Ok(self.client.build_list_categories());
        let result = self.round_trip("list_categories", request, |c, r| {
            c.parse_list_categories(r)
        });
        or_log("list_categories", result).unwrap_or_default()
    }

    pub fn fetch_analytics(&self, short_code: &str) -> Option<AnalyticsSummary> {
        let request = Ok(self.client.build_analytics(short_code));
        let result = self.round_trip("fetch_analytics", request, |c, r| c.parse_analytics(r));
        or_log("fetch_analytics", result)
    }

    /// `false` on any failure, including an unknown short code.
    pub fn delete_url(&self, short_code: &str) -> bool {
        let request = Ok(self.client.build_delete(short_code));
        let result = self.round_trip("delete_url", request, |c, r| c.parse_delete(r));
        or_log("delete_url", result).is_some()
    }

    /// Submit several links at once. Partial failures are reported inside a
    /// successful [`BulkOutcome`].
    pub fn submit_bulk(&self, entries: &[LinkEntry]) -> ApiResponse<BulkOutcome> {
        if entries.is_empty() {
            return ApiResponse::Failure("Please enter at least one URL".to_string());
        }
        let result = self.round_trip("submit_bulk", self.client.build_bulk_shorten(entries), |c, r| {
            c.parse_bulk_shorten(r)
        });
        to_response("submit_bulk", result)
    }

    pub fn fetch_qr_code(&self, short_code: &str) -> ApiResponse<QrCode> {
        let request = Ok(self.client.build_qr_code(short_code));
        let result = self.round_trip("fetch_qr_code", request, |c, r| c.parse_qr_code(r));
        to_response("fetch_qr_code", result)
    }

    /// Set or, with `None`, clear the expiration of a link.
    pub fn update_expiration(&self, short_code: &str, expires_at: Option<&str>) -> ApiResponse<()> {
        let request = self.client.build_update_expiration(short_code, expires_at);
        let result = self.round_trip("update_expiration", request, |c, r| {
            c.parse_update_expiration(r)
        });
        to_response("update_expiration", result)
    }

    /// Backend health; reports `ERROR` stamped with the local time when the
    /// backend cannot be reached.
    pub fn check_health(&self) -> HealthStatus {
        let request = Ok(self.client.build_health());
        let result = self.round_trip("check_health", request, |c, r| c.parse_health(r));
        or_log("check_health", result).unwrap_or_else(|| HealthStatus {
            status: "ERROR".to_string(),
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        })
    }
}

fn to_response<R>(operation: &'static str, result: Result<R, ApiError>) -> ApiResponse<R> {
    match or_log_err(operation, result) {
        Ok(data) => ApiResponse::Success(data),
        Err(error) => ApiResponse::Failure(error.user_message()),
    }
}

fn or_log<R>(operation: &'static str, result: Result<R, ApiError>) -> Option<R> {
    or_log_err(operation, result).ok()
}

// Parse failures are already logged in `round_trip`; this catches the
// request-building and transport failures that never reach the parser.
fn or_log_err<R>(operation: &'static str, result: Result<R, ApiError>) -> Result<R, ApiError> {
    if let Err(error) = &result {
        if matches!(error, ApiError::Transport(_) | ApiError::Serialization(_)) {
            warn!(operation, %error, "request failed");
        }
    }
    result
}
