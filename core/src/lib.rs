//! Synchronous API client core for the short-link service.
//!
//! # Overview
//! Builds `HttpRequest` values and parses `HttpResponse` values without
//! touching the network (host-does-IO pattern). The host supplies a
//! [`Transport`]; [`ApiService`] runs one round-trip per operation and turns
//! every failure into a value instead of an error.
//!
//! # Design
//! - `ShortLinkClient` is stateless and holds only `base_url`, which is
//!   passed in explicitly rather than read from the environment.
//! - Each operation is split into `build_*` (produces request) and
//!   `parse_*` (consumes response), so the I/O boundary is explicit.
//! - DTOs are defined independently from the mock-server crate; integration
//!   tests catch schema drift.
//! - Delimited-text export/import and the advisory list cache are pure
//!   helpers with no network access.

pub mod cache;
pub mod client;
pub mod delimited;
pub mod error;
pub mod http;
pub mod service;
pub mod types;
pub mod validate;

pub use cache::{distinct_categories, CacheError, LinkCache, LinkFilter, StatusFilter};
pub use client::ShortLinkClient;
pub use delimited::{
    bulk_results_file_name, export_file_name, export_to_delimited_text, parse_delimited_import,
    IMPORT_TEMPLATE, IMPORT_TEMPLATE_FILE_NAME,
};
pub use error::ApiError;
pub use http::{HttpMethod, HttpRequest, HttpResponse, Transport};
pub use service::ApiService;
pub use types::{
    AnalyticsSummary, ApiResponse, BulkFailure, BulkOutcome, ClickEvent, HealthStatus, LinkEntry,
    QrCode, ShortLink,
};
