//! Executing an `HttpRequest` against the network.
//!
//! # Design
//! `Transport` is the seam between the pure build/parse half and real I/O.
//! `UreqTransport` is the blocking implementation: one form POST per call,
//! bounded by a global timeout, no retries. Non-2xx statuses come back as
//! data so `PsgClient` alone decides what counts as success.

use std::time::Duration;

use crate::error::TransportError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};

/// Spectra with many points exceed ureq's default body limit.
const MAX_REPLY_BYTES: u64 = 256 * 1024 * 1024;

/// Executes one request and returns the response as data.
pub trait Transport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        (**self).execute(request)
    }
}

/// Blocking transport backed by a `ureq` agent.
#[derive(Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    pub fn new(timeout: Duration) -> Self {
        let agent = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .http_status_as_error(false)
            .build()
            .new_agent();
        Self { agent }
    }
}

impl Transport for UreqTransport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        let fields = request
            .form
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()));
        let mut response = match request.method {
            HttpMethod::Post => self.agent.post(&request.url).send_form(fields),
        }
        .map_err(map_error)?;

        let status = response.status().as_u16();
        let latin1 = response
            .headers()
            .get("content-type")
            .and_then(|value| value.to_str().ok())
            .is_some_and(declares_latin1);
        let bytes = response
            .body_mut()
            .with_config()
            .limit(MAX_REPLY_BYTES)
            .read_to_vec()
            .map_err(map_error)?;

        Ok(HttpResponse {
            status,
            body: decode_body(bytes, latin1),
        })
    }
}

/// `charset=iso-8859-1` (or an alias) in a Content-Type value.
fn declares_latin1(content_type: &str) -> bool {
    content_type
        .split(';')
        .filter_map(|param| param.trim().split_once('='))
        .any(|(name, value)| {
            name.trim().eq_ignore_ascii_case("charset")
                && matches!(
                    value.trim().trim_matches('"').to_ascii_lowercase().as_str(),
                    "iso-8859-1" | "latin1" | "latin-1" | "l1"
                )
        })
}

/// Bodies are text whatever their encoding; undecodable UTF-8 bytes become
/// U+FFFD rather than failing the request.
fn decode_body(bytes: Vec<u8>, latin1: bool) -> String {
    if latin1 {
        return bytes.iter().map(|&b| char::from(b)).collect();
    }
    match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(err) => String::from_utf8_lossy(err.as_bytes()).into_owned(),
    }
}

fn map_error(err: ureq::Error) -> TransportError {
    match err {
        ureq::Error::Timeout(_) => TransportError::Timeout(err.to_string()),
        other => TransportError::Network(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latin1_charset_is_recognised() {
        assert!(declares_latin1("text/plain; charset=ISO-8859-1"));
        assert!(declares_latin1("text/plain;charset=\"latin1\""));
        assert!(!declares_latin1("text/plain; charset=utf-8"));
        assert!(!declares_latin1("text/plain"));
    }

    #[test]
    fn latin1_body_maps_bytes_to_code_points() {
        assert_eq!(decode_body(b"# Wave [\xb5m]".to_vec(), true), "# Wave [\u{b5}m]");
    }

    #[test]
    fn invalid_utf8_is_replaced_not_rejected() {
        assert_eq!(decode_body(b"1 2 \xff".to_vec(), false), "1 2 \u{fffd}");
        assert_eq!(decode_body("µm".as_bytes().to_vec(), false), "µm");
    }
}
