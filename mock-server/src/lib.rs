//! In-memory example backend for the short-link API.
//!
//! Every reply under `/api` is an envelope: `{success:true, data?}` on
//! success, `{success:false, error}` with a 4xx status otherwise.

pub mod store;

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Redirect as HttpRedirect, Response},
    routing::{delete, get, patch, post},
    Json, Router,
};
use base64::Engine;
use qrcode::render::svg;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};

pub use store::{Analytics, Click, Link, NewLink, Redirect, Store};

pub type Db = Arc<RwLock<Store>>;

/// Error reply: status plus the message placed in the envelope.
#[derive(Debug)]
pub struct ApiFailure(StatusCode, String);

impl ApiFailure {
    fn bad_request(message: impl Into<String>) -> Self {
        Self(StatusCode::BAD_REQUEST, message.into())
    }

    fn not_found() -> Self {
        Self(StatusCode::NOT_FOUND, store::NOT_FOUND.to_string())
    }
}

impl IntoResponse for ApiFailure {
    fn into_response(self) -> Response {
        (self.0, Json(json!({"success": false, "error": self.1}))).into_response()
    }
}

impl From<JsonRejection> for ApiFailure {
    fn from(rejection: JsonRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

type ApiResult = Result<(StatusCode, Json<Value>), ApiFailure>;

fn ok(data: impl serde::Serialize) -> ApiResult {
    Ok((StatusCode::OK, Json(json!({"success": true, "data": data}))))
}

pub fn app(public_base_url: &str) -> Router {
    let db: Db = Arc::new(RwLock::new(Store::new(public_base_url)));
    Router::new()
        .route("/health", get(health))
        .route("/api/shorten", post(shorten))
        .route("/api/bulk-shorten", post(bulk_shorten))
        .route("/api/urls", get(list_urls))
        .route("/api/urls/category/{category}", get(list_by_category))
        .route("/api/urls/{short_code}", delete(delete_url))
        .route("/api/urls/{short_code}/expiration", patch(update_expiration))
        .route("/api/categories", get(list_categories))
        .route("/api/analytics/{short_code}", get(analytics))
        .route("/api/qrcode/{short_code}", get(qr_code))
        .route("/{short_code}", get(visit))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(db)
}

pub async fn run(listener: TcpListener, public_base_url: &str) -> Result<(), std::io::Error> {
    axum::serve(listener, app(public_base_url)).await
}

async fn health() -> Json<Value> {
    Json(json!({"status": "OK", "timestamp": store::now_rfc3339()}))
}

async fn shorten(State(db): State<Db>, input: Result<Json<NewLink>, JsonRejection>) -> ApiResult {
    let Json(input) = input?;
    let link = db.write().await.create(input).map_err(ApiFailure::bad_request)?;
    info!(short_code = %link.short_code, "created short link");
    Ok((
        StatusCode::CREATED,
        Json(json!({"success": true, "data": link})),
    ))
}

#[derive(Deserialize)]
struct BulkInput {
    urls: Vec<NewLink>,
}

async fn bulk_shorten(
    State(db): State<Db>,
    input: Result<Json<BulkInput>, JsonRejection>,
) -> ApiResult {
    let Json(input) = input?;
    if input.urls.is_empty() {
        return Err(ApiFailure::bad_request("Please provide an array of URLs"));
    }
    let mut store = db.write().await;
    let mut successful = Vec::new();
    let mut failed = Vec::new();
    for entry in input.urls {
        let original_url = entry.original_url.clone();
        match store.create(entry) {
            Ok(link) => successful.push(link),
            Err(error) => failed.push(json!({"originalUrl": original_url, "error": error})),
        }
    }
    info!(
        successful = successful.len(),
        failed = failed.len(),
        "bulk shorten"
    );
    ok(json!({"successful": successful, "failed": failed}))
}

async fn list_urls(State(db): State<Db>) -> ApiResult {
    ok(db.read().await.list())
}

async fn list_by_category(State(db): State<Db>, Path(category): Path<String>) -> ApiResult {
    ok(db.read().await.list_by_category(&category))
}

async fn list_categories(State(db): State<Db>) -> ApiResult {
    ok(db.read().await.categories())
}

async fn delete_url(State(db): State<Db>, Path(short_code): Path<String>) -> ApiResult {
    if !db.write().await.delete(&short_code) {
        return Err(ApiFailure::not_found());
    }
    info!(%short_code, "deleted short link");
    Ok((
        StatusCode::OK,
        Json(json!({"success": true, "message": "URL deleted successfully"})),
    ))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExpirationInput {
    expires_at: Option<String>,
}

async fn update_expiration(
    State(db): State<Db>,
    Path(short_code): Path<String>,
    input: Result<Json<ExpirationInput>, JsonRejection>,
) -> ApiResult {
    let Json(input) = input?;
    db.write()
        .await
        .set_expiration(&short_code, input.expires_at)
        .map_err(|error| match error {
            store::NOT_FOUND => ApiFailure::not_found(),
            other => ApiFailure::bad_request(other),
        })?;
    Ok((
        StatusCode::OK,
        Json(json!({"success": true, "message": "Expiration updated"})),
    ))
}

async fn analytics(State(db): State<Db>, Path(short_code): Path<String>) -> ApiResult {
    let summary = db.read().await.analytics(&short_code).ok_or_else(ApiFailure::not_found)?;
    ok(summary)
}

fn render_qr_data_url(text: &str) -> Option<String> {
    let code = qrcode::QrCode::new(text.as_bytes()).ok()?;
    let svg_string = code
        .render()
        .min_dimensions(200, 200)
        .dark_color(svg::Color("#000000"))
        .light_color(svg::Color("#ffffff"))
        .build();
    let encoded = base64::engine::general_purpose::STANDARD.encode(svg_string);
    Some(format!("data:image/svg+xml;base64,{encoded}"))
}

async fn qr_code(State(db): State<Db>, Path(short_code): Path<String>) -> ApiResult {
    let short_url = db
        .read()
        .await
        .get(&short_code)
        .map(|l| l.short_url.clone())
        .ok_or_else(ApiFailure::not_found)?;
    let qr_code = render_qr_data_url(&short_url).ok_or_else(|| {
        warn!(%short_code, "qr generation failed");
        ApiFailure(StatusCode::INTERNAL_SERVER_ERROR, "Failed to generate QR code".to_string())
    })?;
    ok(json!({"qrCode": qr_code, "shortUrl": short_url}))
}

fn client_address(headers: &HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| "unknown".to_string())
}

async fn visit(
    State(db): State<Db>,
    Path(short_code): Path<String>,
    headers: HeaderMap,
) -> Response {
    let outcome = db.write().await.visit(&short_code, &client_address(&headers));
    match outcome {
        Redirect::To(url) => HttpRedirect::to(&url).into_response(),
        Redirect::Expired => ApiFailure(StatusCode::GONE, "This link has expired".to_string())
            .into_response(),
        Redirect::Missing => ApiFailure::not_found().into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn qr_data_url_is_base64_svg() {
        let url = render_qr_data_url("http://localhost:5000/abc1234").unwrap();
        let payload = url.strip_prefix("data:image/svg+xml;base64,").unwrap();
        let svg = base64::engine::general_purpose::STANDARD.decode(payload).unwrap();
        assert!(String::from_utf8(svg).unwrap().contains("<svg"));
    }

    #[test]
    fn client_address_prefers_forwarded_for() {
        let mut headers = HeaderMap::new();
        assert_eq!(client_address(&headers), "unknown");
        headers.insert("x-forwarded-for", "203.0.113.7, 10.0.0.1".parse().unwrap());
        assert_eq!(client_address(&headers), "203.0.113.7");
    }

    #[test]
    fn new_link_optionals_default_to_none() {
        let input: NewLink = serde_json::from_str(r#"{"originalUrl":"https://a.com"}"#).unwrap();
        assert!(input.expires_at.is_none());
        assert!(input.category.is_none());
    }

    #[test]
    fn new_link_rejects_missing_url() {
        let result: Result<NewLink, _> = serde_json::from_str(r#"{"category":"x"}"#);
        assert!(result.is_err());
    }
}
