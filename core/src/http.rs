//! HTTP transport types for the host-does-IO pattern.
//!
//! # Design
//! These types describe the one request the service accepts and the reply it
//! sends back as plain data. `PsgClient` builds `HttpRequest` values and
//! parses `HttpResponse` values without touching the network; a `Transport`
//! executes the round-trip in between. Keeping the two apart lets the reply
//! classifier and status handling be tested without a server.

/// HTTP method for a request. The service only takes form POSTs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Post,
}

/// A form-encoded HTTP request described as plain data.
///
/// Fields are kept in the order they are sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub form: Vec<(String, String)>,
}

impl HttpRequest {
    /// Look up a form field by name.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.form
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

/// An HTTP response described as plain data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}
