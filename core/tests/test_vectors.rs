//! Verify operations against JSON test vectors stored in `test-vectors/`.
//!
//! Each vector file describes inputs, expected requests, simulated responses,
//! and expected results. A canned transport captures the request the service
//! built and replays the simulated response. Comparing parsed JSON (not raw
//! strings) avoids false negatives from field-ordering differences.

use std::cell::RefCell;

use serde_json::Value;
use shortlink_core::{
    parse_delimited_import, ApiError, ApiResponse, ApiService, HttpMethod, HttpRequest,
    HttpResponse, LinkEntry, ShortLink, Transport,
};

const BASE_URL: &str = "http://localhost:5000";

/// Replays one simulated response and keeps the request it received.
struct Canned {
    response: HttpResponse,
    seen: RefCell<Option<HttpRequest>>,
}

impl Canned {
    fn from_case(case: &Value) -> Self {
        let sim = &case["simulated_response"];
        Self {
            response: HttpResponse {
                status: sim["status"].as_u64().unwrap() as u16,
                headers: Vec::new(),
                body: sim["body"].as_str().unwrap().to_string(),
            },
            seen: RefCell::new(None),
        }
    }

    fn request(&self) -> HttpRequest {
        self.seen.borrow().clone().expect("no request was sent")
    }
}

impl Transport for Canned {
    fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        *self.seen.borrow_mut() = Some(request);
        Ok(self.response.clone())
    }
}

/// Parse the method string from test vectors into `HttpMethod`.
fn parse_method(s: &str) -> HttpMethod {
    match s {
        "GET" => HttpMethod::Get,
        "POST" => HttpMethod::Post,
        "PATCH" => HttpMethod::Patch,
        "DELETE" => HttpMethod::Delete,
        other => panic!("unknown method: {other}"),
    }
}

fn load(raw: &str) -> Vec<Value> {
    let vectors: Value = serde_json::from_str(raw).unwrap();
    vectors["cases"].as_array().unwrap().clone()
}

fn check_request(name: &str, req: &HttpRequest, expected: &Value) {
    assert_eq!(req.method, parse_method(expected["method"].as_str().unwrap()), "{name}: method");
    assert_eq!(req.path, format!("{BASE_URL}{}", expected["path"].as_str().unwrap()), "{name}: path");

    if let Some(headers) = expected.get("headers") {
        let expected_headers: Vec<(String, String)> = headers
            .as_array()
            .unwrap()
            .iter()
            .map(|h| {
                let arr = h.as_array().unwrap();
                (arr[0].as_str().unwrap().to_string(), arr[1].as_str().unwrap().to_string())
            })
            .collect();
        assert_eq!(req.headers, expected_headers, "{name}: headers");
    }

    match expected.get("body") {
        Some(body) => {
            let req_body: Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
            assert_eq!(&req_body, body, "{name}: body");
        }
        None => assert!(req.body.is_none(), "{name}: body should be None"),
    }
}

/// Render an `ApiResponse` in the wire envelope shape used by the vectors.
fn envelope<T: serde::Serialize>(resp: ApiResponse<T>) -> Value {
    match resp {
        ApiResponse::Success(data) => serde_json::json!({"success": true, "data": data}),
        ApiResponse::Failure(error) => serde_json::json!({"success": false, "error": error}),
    }
}

// ---------------------------------------------------------------------------
// Shorten
// ---------------------------------------------------------------------------

#[test]
fn shorten_test_vectors() {
    for case in load(include_str!("../../test-vectors/shorten.json")) {
        let name = case["name"].as_str().unwrap();
        let input: LinkEntry = serde_json::from_value(case["input"].clone()).unwrap();
        let api = ApiService::new(BASE_URL, Canned::from_case(&case));

        let resp = api.submit_url(
            &input.original_url,
            input.expires_at.as_deref(),
            input.category.as_deref(),
        );

        check_request(name, &api.transport().request(), &case["expected_request"]);
        assert_eq!(envelope(resp), case["expected_result"], "{name}: result");
    }
}

// ---------------------------------------------------------------------------
// List
// ---------------------------------------------------------------------------

#[test]
fn list_test_vectors() {
    for case in load(include_str!("../../test-vectors/list.json")) {
        let name = case["name"].as_str().unwrap();
        let api = ApiService::new(BASE_URL, Canned::from_case(&case));

        let links = api.list_urls();

        check_request(name, &api.transport().request(), &case["expected_request"]);
        let expected: Vec<ShortLink> = serde_json::from_value(case["expected_result"].clone()).unwrap();
        assert_eq!(links, expected, "{name}: parsed result");
    }
}

// ---------------------------------------------------------------------------
// Delete
// ---------------------------------------------------------------------------

#[test]
fn delete_test_vectors() {
    for case in load(include_str!("../../test-vectors/delete.json")) {
        let name = case["name"].as_str().unwrap();
        let api = ApiService::new(BASE_URL, Canned::from_case(&case));

        let deleted = api.delete_url(case["input_code"].as_str().unwrap());

        check_request(name, &api.transport().request(), &case["expected_request"]);
        assert_eq!(deleted, case["expected_result"].as_bool().unwrap(), "{name}: result");
    }
}

// ---------------------------------------------------------------------------
// Bulk
// ---------------------------------------------------------------------------

#[test]
fn bulk_test_vectors() {
    for case in load(include_str!("../../test-vectors/bulk.json")) {
        let name = case["name"].as_str().unwrap();
        let input: Vec<LinkEntry> = serde_json::from_value(case["input"].clone()).unwrap();
        let api = ApiService::new(BASE_URL, Canned::from_case(&case));

        let resp = api.submit_bulk(&input);

        check_request(name, &api.transport().request(), &case["expected_request"]);
        assert_eq!(envelope(resp), case["expected_result"], "{name}: result");
    }
}

// ---------------------------------------------------------------------------
// Import
// ---------------------------------------------------------------------------

#[test]
fn import_test_vectors() {
    for case in load(include_str!("../../test-vectors/import.json")) {
        let name = case["name"].as_str().unwrap();
        let entries = parse_delimited_import(case["text"].as_str().unwrap());
        let expected: Vec<LinkEntry> = serde_json::from_value(case["expected_result"].clone()).unwrap();
        assert_eq!(entries, expected, "{name}: entries");
    }
}
