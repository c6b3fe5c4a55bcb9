//! Stateless HTTP request builder and response parser for the short-link API.
//!
//! # Design
//! `ShortLinkClient` holds only a `base_url` and carries no mutable state
//! between calls. Each operation is split into a `build_*` method that
//! produces an `HttpRequest` and a `parse_*` method that consumes an
//! `HttpResponse`. The caller executes the actual HTTP round-trip.
//!
//! Every backend reply is an envelope `{success, data?, error?}`. Parsing
//! reads the body even on error statuses, because that is where the server
//! puts its message.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::types::{
    AnalyticsSummary, BulkOutcome, HealthStatus, LinkEntry, QrCode, ShortLink,
};

/// Synchronous, stateless client for the short-link API.
#[derive(Debug, Clone)]
pub struct ShortLinkClient {
    base_url: String,
}

#[derive(Serialize)]
struct BulkRequest<'a> {
    urls: &'a [LinkEntry],
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ExpirationRequest<'a> {
    expires_at: Option<&'a str>,
}

#[derive(Deserialize)]
struct Envelope {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    data: Option<serde_json::Value>,
    #[serde(default)]
    error: Option<String>,
}

impl ShortLinkClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: HttpMethod, path: String, body: Option<String>) -> HttpRequest {
        HttpRequest {
            method,
            path: format!("{}{path}", self.base_url),
            headers: vec![("content-type".to_string(), "application/json".to_string())],
            body,
        }
    }

    fn json_request<B: Serialize>(
        &self,
        method: HttpMethod,
        path: String,
        body: &B,
    ) -> Result<HttpRequest, ApiError> {
        let body = serde_json::to_string(body).map_err(|e| ApiError::Serialization(e.to_string()))?;
        Ok(self.request(method, path, Some(body)))
    }

    pub fn build_shorten(&self, entry: &LinkEntry) -> Result<HttpRequest, ApiError> {
        self.json_request(HttpMethod::Post, "/api/shorten".to_string(), entry)
    }

    pub fn build_list_urls(&self) -> HttpRequest {
        self.request(HttpMethod::Get, "/api/urls".to_string(), None)
    }

    pub fn build_list_by_category(&self, category: &str) -> HttpRequest {
        let path = format!("/api/urls/category/{}", urlencoding::encode(category));
        self.request(HttpMethod::Get, path, None)
    }

    pub fn build_list_categories(&self) -> HttpRequest {
        self.request(HttpMethod::Get, "/api/categories".to_string(), None)
    }

    pub fn build_analytics(&self, short_code: &str) -> HttpRequest {
        let path = format!("/api/analytics/{}", urlencoding::encode(short_code));
        self.request(HttpMethod::Get, path, None)
    }

    pub fn build_delete(&self, short_code: &str) -> HttpRequest {
        let path = format!("/api/urls/{}", urlencoding::encode(short_code));
        self.request(HttpMethod::Delete, path, None)
    }

    pub fn build_bulk_shorten(&self, entries: &[LinkEntry]) -> Result<HttpRequest, ApiError> {
        self.json_request(
            HttpMethod::Post,
            "/api/bulk-shorten".to_string(),
            &BulkRequest { urls: entries },
        )
    }

    pub fn build_qr_code(&self, short_code: &str) -> HttpRequest {
        let path = format!("/api/qrcode/{}", urlencoding::encode(short_code));
        self.request(HttpMethod::Get, path, None)
    }

    /// `None` clears the expiration; it is sent as an explicit JSON `null`.
    pub fn build_update_expiration(
        &self,
        short_code: &str,
        expires_at: Option<&str>,
    ) -> Result<HttpRequest, ApiError> {
        let path = format!("/api/urls/{}/expiration", urlencoding::encode(short_code));
        self.json_request(HttpMethod::Patch, path, &ExpirationRequest { expires_at })
    }

    pub fn build_health(&self) -> HttpRequest {
        self.request(HttpMethod::Get, "/health".to_string(), None)
    }

    pub fn parse_shorten(&self, response: HttpResponse) -> Result<ShortLink, ApiError> {
        parse_data(&response)
    }

    pub fn parse_list_urls(&self, response: HttpResponse) -> Result<Vec<ShortLink>, ApiError> {
        parse_data(&response)
    }

    pub fn parse_list_categories(&self, response: HttpResponse) -> Result<Vec<String>, ApiError> {
        parse_data(&response)
    }

    pub fn parse_analytics(&self, response: HttpResponse) -> Result<AnalyticsSummary, ApiError> {
        parse_data(&response)
    }

    pub fn parse_delete(&self, response: HttpResponse) -> Result<(), ApiError> {
        parse_envelope(&response).map(|_| ())
    }

    pub fn parse_bulk_shorten(&self, response: HttpResponse) -> Result<BulkOutcome, ApiError> {
        parse_data(&response)
    }

    pub fn parse_qr_code(&self, response: HttpResponse) -> Result<QrCode, ApiError> {
        parse_data(&response)
    }

    pub fn parse_update_expiration(&self, response: HttpResponse) -> Result<(), ApiError> {
        parse_envelope(&response).map(|_| ())
    }

    /// The health endpoint is not wrapped in an envelope.
    pub fn parse_health(&self, response: HttpResponse) -> Result<HealthStatus, ApiError> {
        if !response.is_success() {
            return Err(status_error(&response, None));
        }
        serde_json::from_str(&response.body).map_err(|e| ApiError::Malformed(e.to_string()))
    }
}

fn status_error(response: &HttpResponse, message: Option<String>) -> ApiError {
    ApiError::Server {
        status: response.status,
        message: message.unwrap_or_else(|| format!("HTTP error! status: {}", response.status)),
    }
}

/// Decode the envelope and map error statuses and `success:false` to
/// `ApiError::Server`.
fn parse_envelope(response: &HttpResponse) -> Result<Envelope, ApiError> {
    let envelope = serde_json::from_str::<Envelope>(&response.body);
    if !response.is_success() {
        let message = envelope.ok().and_then(|e| e.error);
        return Err(status_error(response, message));
    }
    let envelope = envelope.map_err(|e| ApiError::Malformed(e.to_string()))?;
    if !envelope.success {
        return Err(status_error(response, envelope.error));
    }
    Ok(envelope)
}

fn parse_data<T: DeserializeOwned>(response: &HttpResponse) -> Result<T, ApiError> {
    let data = parse_envelope(response)?
        .data
        .ok_or_else(|| ApiError::Malformed("missing data field".to_string()))?;
    serde_json::from_value(data).map_err(|e| ApiError::Malformed(e.to_string()))
}
