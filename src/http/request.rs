//! The wire request under construction.

use crate::base::callerror::BuildFailure;
use crate::http::orderedheaders::OrderedHeaderMap;
use crate::http::requestbody::RequestBody;
use http::Method;
use url::Url;

/// Mutable request state threaded through the request stages and finally
/// handed to the transport.
#[derive(Debug)]
pub struct RequestAccumulator {
    method: Method,
    url: Option<Url>,
    headers: OrderedHeaderMap,
    body: RequestBody,
}

impl RequestAccumulator {
    /// Empty request; the URL is set by the URI stage.
    pub fn new(method: Method) -> Self {
        Self {
            method,
            url: None,
            headers: OrderedHeaderMap::new(),
            body: RequestBody::Empty,
        }
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn url(&self) -> Option<&Url> {
        self.url.as_ref()
    }

    pub fn url_mut(&mut self) -> Result<&mut Url, BuildFailure> {
        self.url.as_mut().ok_or(BuildFailure::UriNotComposed)
    }

    pub fn set_url(&mut self, url: Url) {
        self.url = Some(url);
    }

    pub fn headers(&self) -> &OrderedHeaderMap {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut OrderedHeaderMap {
        &mut self.headers
    }

    /// Add a header value without touching existing values of that name.
    pub fn append_header(&mut self, name: &str, value: &str) -> Result<(), BuildFailure> {
        self.headers.append(name, value)
    }

    pub fn body(&self) -> &RequestBody {
        &self.body
    }

    pub fn set_body(&mut self, body: impl Into<RequestBody>) {
        self.body = body.into();
    }

    /// Move the body out, leaving it empty.
    pub fn take_body(&mut self) -> RequestBody {
        std::mem::take(&mut self.body)
    }

    /// Convert into an `http::Request` for transports built on the `http` types.
    pub fn into_http_request(self) -> Result<http::Request<RequestBody>, BuildFailure> {
        let url = self.url.ok_or(BuildFailure::UriNotComposed)?;
        let mut request = http::Request::builder()
            .method(self.method)
            .uri(url.as_str())
            .body(self.body)?;
        *request.headers_mut() = self.headers.to_header_map();
        Ok(request)
    }
}
