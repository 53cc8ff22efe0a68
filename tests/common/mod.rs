//! Shared helpers for integration tests.

#![allow(dead_code)]

use http::{HeaderValue, StatusCode};
use std::sync::{Arc, Mutex};
use stubnet::{BoxError, RawResponse, RequestAccumulator, Transport};

/// Records every request and answers with a fixed response.
#[derive(Clone)]
pub struct MockTransport {
    requests: Arc<Mutex<Vec<RequestAccumulator>>>,
    response: Arc<Mutex<RawResponse>>,
}

impl MockTransport {
    pub fn new(response: RawResponse) -> Self {
        Self {
            requests: Arc::new(Mutex::new(Vec::new())),
            response: Arc::new(Mutex::new(response)),
        }
    }

    pub fn ok(body: &'static str) -> Self {
        Self::new(RawResponse::new(StatusCode::OK).with_body(body))
    }

    pub fn json(body: &'static str) -> Self {
        Self::new(
            RawResponse::new(StatusCode::OK)
                .with_header(
                    http::header::CONTENT_TYPE,
                    HeaderValue::from_static("application/json"),
                )
                .with_body(body),
        )
    }

    pub fn respond_with(&self, response: RawResponse) {
        *self.response.lock().unwrap() = response;
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// URL of the n-th recorded request.
    pub fn url(&self, n: usize) -> String {
        self.requests.lock().unwrap()[n]
            .url()
            .map(|u| u.to_string())
            .unwrap_or_default()
    }

    /// All values of `name` on the n-th recorded request.
    pub fn header_values(&self, n: usize, name: &str) -> Vec<String> {
        self.requests.lock().unwrap()[n]
            .headers()
            .get_all(name)
            .map(|v| v.to_str().unwrap().to_string())
            .collect()
    }

    pub fn body_bytes(&self, n: usize) -> Option<Vec<u8>> {
        self.requests.lock().unwrap()[n]
            .body()
            .as_bytes()
            .map(|b| b.to_vec())
    }
}

impl Transport for MockTransport {
    fn execute(&self, request: RequestAccumulator) -> Result<RawResponse, BoxError> {
        self.requests.lock().unwrap().push(request);
        Ok(self.response.lock().unwrap().clone())
    }
}

/// A transport that always fails.
pub struct DownTransport;

impl Transport for DownTransport {
    fn execute(&self, _request: RequestAccumulator) -> Result<RawResponse, BoxError> {
        Err("connection refused".into())
    }
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
