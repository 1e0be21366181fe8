//! Stateless HTTP request builder and response parser for the PSG API.
//!
//! # Design
//! `PsgClient` holds only the endpoint URL and an optional API key and
//! carries no mutable state between calls. A run is split into a `build_*`
//! method that produces an `HttpRequest` and a `parse_*` method that
//! consumes an `HttpResponse`. The caller executes the actual HTTP
//! round-trip (see `Transport`), keeping this half deterministic and free of
//! I/O.

use std::time::Duration;

use crate::error::{PsgError, TransportError};
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::reply::{self, Reply};
use crate::request::{OutputType, RunOptions, RunRequest};

/// Synchronous, stateless client for the PSG form endpoint.
#[derive(Debug, Clone)]
pub struct PsgClient {
    server_url: String,
    api_key: Option<String>,
}

impl PsgClient {
    pub fn new(server_url: &str, api_key: Option<&str>) -> Self {
        Self {
            server_url: server_url.to_string(),
            api_key: api_key.map(str::to_string),
        }
    }

    pub fn server_url(&self) -> &str {
        &self.server_url
    }

    /// Build the POST for literal configuration text.
    ///
    /// Fields go out as `file`, then `key`, `watm` and `type` when set.
    pub fn build_submit(&self, config_text: &str, options: &RunOptions) -> HttpRequest {
        let mut form = vec![("file".to_string(), config_text.to_string())];
        if let Some(key) = &self.api_key {
            form.push(("key".to_string(), key.clone()));
        }
        if let Some(watm) = &options.watm {
            form.push(("watm".to_string(), watm.clone()));
        }
        if let Some(output) = options.output {
            form.push(("type".to_string(), output.as_str().to_string()));
        }
        HttpRequest {
            method: HttpMethod::Post,
            url: self.server_url.clone(),
            form,
        }
    }

    /// Build the POST for a run, encoding the mapping if no text was given.
    pub fn build_run(&self, request: &RunRequest) -> Result<HttpRequest, PsgError> {
        let text = request.resolve_text()?;
        Ok(self.build_submit(&text, &request.options))
    }

    /// Accept only a 200 reply and hand back its body.
    pub fn parse_submit(&self, response: HttpResponse) -> Result<String, PsgError> {
        check_status(&response)?;
        Ok(response.body)
    }

    /// Check the status, then classify the body.
    pub fn parse_run(
        &self,
        response: HttpResponse,
        output: Option<OutputType>,
        duration: Duration,
    ) -> Result<Reply, PsgError> {
        let body = self.parse_submit(response)?;
        Ok(reply::classify(&body, output, duration))
    }
}

fn check_status(response: &HttpResponse) -> Result<(), TransportError> {
    if response.status == 200 {
        return Ok(());
    }
    Err(TransportError::Status {
        status: response.status,
        body: response.body.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, ConfigValue};
    use crate::error::ConfigurationError;

    fn client() -> PsgClient {
        PsgClient::new("http://localhost:3000/api.php", None)
    }

    fn ok(body: &str) -> HttpResponse {
        HttpResponse {
            status: 200,
            body: body.to_string(),
        }
    }

    #[test]
    fn build_submit_sends_only_file_by_default() {
        let req = client().build_submit("<OBJECT>Planet", &RunOptions::default());
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.url, "http://localhost:3000/api.php");
        assert_eq!(
            req.form,
            vec![("file".to_string(), "<OBJECT>Planet".to_string())]
        );
    }

    #[test]
    fn build_submit_appends_optional_fields_in_order() {
        let client = PsgClient::new("http://localhost:3000/api.php", Some("secret"));
        let options = RunOptions::default().output(OutputType::Cfg).watm("y");
        let req = client.build_submit("<a>1", &options);
        let names: Vec<&str> = req.form.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(names, ["file", "key", "watm", "type"]);
        assert_eq!(req.field("key"), Some("secret"));
        assert_eq!(req.field("watm"), Some("y"));
        assert_eq!(req.field("type"), Some("cfg"));
    }

    #[test]
    fn build_run_encodes_mapping() {
        let mut config = Config::new();
        config.insert("OBJECT-NAME".to_string(), ConfigValue::from("Mars"));
        config.insert("GENERATOR-RANGE1".to_string(), ConfigValue::from(2.0));
        let req = client().build_run(&RunRequest::new().config(config)).unwrap();
        assert_eq!(req.field("file"), Some("<OBJECT-NAME>Mars\n<GENERATOR-RANGE1>2.0"));
        assert_eq!(req.field("type"), None);
    }

    #[test]
    fn build_run_without_config_is_a_configuration_error() {
        let err = client().build_run(&RunRequest::new()).unwrap_err();
        assert!(matches!(
            err,
            PsgError::Configuration(ConfigurationError::MissingConfig)
        ));
    }

    #[test]
    fn parse_run_spectrum() {
        let reply = client()
            .parse_run(ok("# test\n1.0 2.0\n3.0 4.0"), None, Duration::from_secs(1))
            .unwrap();
        assert_eq!(reply.header(), Some("# test"));
        assert_eq!(reply.spectrum().unwrap().rows(), 2);
    }

    #[test]
    fn parse_run_rejects_non_ok_status() {
        let response = HttpResponse {
            status: 500,
            body: "internal error".to_string(),
        };
        let err = client()
            .parse_run(response, Some(OutputType::Cfg), Duration::ZERO)
            .unwrap_err();
        assert!(matches!(
            err,
            PsgError::Transport(TransportError::Status { status: 500, .. })
        ));
    }

    #[test]
    fn parse_submit_treats_other_2xx_as_failure() {
        let response = HttpResponse {
            status: 204,
            body: String::new(),
        };
        assert_eq!(client().parse_submit(response).unwrap_err().status(), Some(204));
    }

    #[test]
    fn parse_submit_returns_body() {
        assert_eq!(client().parse_submit(ok("hello")).unwrap(), "hello");
    }
}
