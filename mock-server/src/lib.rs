//! A stand-in for the PSG form endpoint.
//!
//! # Design
//! Answers `POST /api.php` the way the real service shapes its replies, so
//! the client can be exercised end-to-end without network access: a `#`
//! header plus numeric rows by default, a configuration echo for
//! `type=cfg`, a `<br/>`-separated multi-section document for `type=ret`,
//! and free text for `type=str`. `/status/{code}` answers with any status
//! for error-path tests.
//!
//! The tag parser here is deliberately independent of the client crate's
//! codec; integration tests catch any drift between the two.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{any, post},
    Form, Router,
};
use serde::Deserialize;
use tokio::net::TcpListener;
use tracing::debug;

const MAX_POINTS: usize = 10_000;

/// The form fields the endpoint understands.
#[derive(Debug, Default, Deserialize)]
pub struct ApiForm {
    pub file: Option<String>,
    pub key: Option<String>,
    pub watm: Option<String>,
    #[serde(rename = "type")]
    pub output: Option<String>,
}

/// Server-side options.
#[derive(Debug, Clone, Default)]
pub struct MockOptions {
    /// When set, requests must carry this `key`.
    pub api_key: Option<String>,
}

type Shared = Arc<MockOptions>;

pub fn app() -> Router {
    app_with(MockOptions::default())
}

pub fn app_with(options: MockOptions) -> Router {
    Router::new()
        .route("/api.php", post(api))
        .route("/status/{code}", any(status))
        .with_state(Arc::new(options))
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    run_with(listener, MockOptions::default()).await
}

pub async fn run_with(listener: TcpListener, options: MockOptions) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with(options)).await
}

async fn api(State(options): State<Shared>, Form(form): Form<ApiForm>) -> (StatusCode, String) {
    debug!(output = ?form.output, watm = ?form.watm, "api request");
    if let Some(expected) = &options.api_key {
        if form.key.as_deref() != Some(expected.as_str()) {
            return (StatusCode::UNAUTHORIZED, "Invalid API key".to_string());
        }
    }
    let Some(file) = form.file else {
        return (StatusCode::BAD_REQUEST, "Missing 'file' field".to_string());
    };

    let tags = parse_tags(&file);
    let body = match form.output.as_deref() {
        Some("cfg") => render_config(&tags),
        Some("ret") => render_retrieval(&tags),
        Some("str") => render_summary(&tags),
        _ => render_spectrum(&tags, form.watm.as_deref()),
    };
    (StatusCode::OK, body)
}

async fn status(Path(code): Path<u16>) -> (StatusCode, String) {
    let status = StatusCode::from_u16(code).unwrap_or(StatusCode::BAD_REQUEST);
    (status, format!("status {}", status.as_u16()))
}

/// `<TAG>value` pairs in order; lines that do not start with a tag are skipped.
pub fn parse_tags(text: &str) -> Vec<(String, String)> {
    text.lines()
        .filter_map(|line| {
            let rest = line.trim_start().strip_prefix('<')?;
            let (tag, value) = rest.split_once('>')?;
            Some((tag.to_string(), value.to_string()))
        })
        .collect()
}

fn lookup<'a>(tags: &'a [(String, String)], name: &str) -> Option<&'a str> {
    tags.iter()
        .rev()
        .find(|(tag, _)| tag == name)
        .map(|(_, value)| value.as_str())
}

fn lookup_f64(tags: &[(String, String)], name: &str, default: f64) -> f64 {
    lookup(tags, name)
        .and_then(|value| value.trim().parse().ok())
        .unwrap_or(default)
}

/// Wavelength grid from the generator range and resolution.
fn wavelengths(tags: &[(String, String)]) -> Option<Vec<f64>> {
    let start = lookup_f64(tags, "GENERATOR-RANGE1", 1.0);
    let stop = lookup_f64(tags, "GENERATOR-RANGE2", 2.0);
    let step = lookup_f64(tags, "GENERATOR-RESOLUTION", 0.25);
    if step <= 0.0 || stop < start {
        return None;
    }
    let points = ((stop - start) / step).round() as usize + 1;
    if points > MAX_POINTS {
        return None;
    }
    Some((0..points).map(|i| start + step * i as f64).collect())
}

fn render_spectrum(tags: &[(String, String)], watm: Option<&str>) -> String {
    let Some(grid) = wavelengths(tags) else {
        return "ERROR: invalid spectral range".to_string();
    };
    let object = lookup(tags, "OBJECT-NAME").unwrap_or("unknown");
    let unit = lookup(tags, "GENERATOR-RANGEUNIT").unwrap_or("um");

    let mut lines = vec![
        "# Planetary Spectrum Generator (mock)".to_string(),
        format!("# Object: {object}"),
    ];
    if let Some(watm) = watm {
        lines.push(format!("# watm: {watm}"));
    }
    lines.push(format!("# Wave/freq [{unit}] Total Noise"));
    for (i, wave) in grid.iter().enumerate() {
        let total = 1.0e-3 * (1.0 + 0.1 * i as f64);
        lines.push(format!("{wave:.6} {total:.6e} {:.6e}", total * 0.01));
    }
    lines.join("\n")
}

fn render_config(tags: &[(String, String)]) -> String {
    tags.iter()
        .map(|(tag, value)| format!("<{tag}>{value}"))
        .chain(std::iter::once("<GENERATOR-VERSION>mock".to_string()))
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_retrieval(tags: &[(String, String)]) -> String {
    let object = lookup(tags, "OBJECT-NAME").unwrap_or("unknown");
    let rows: Vec<String> = wavelengths(tags)
        .unwrap_or_default()
        .iter()
        .map(|wave| format!("{wave:.6} {:.6e}", 1.0e-3))
        .collect();
    [
        "results_dat.txt".to_string(),
        "# Retrieved spectrum".to_string(),
        rows.join("<br/>"),
        "results_log.txt".to_string(),
        format!("Retrieval of {object}"),
        "&nbsp;&nbsp;iterations: 3".to_string(),
        "results_fit.txt".to_string(),
        "chi2: 1.02".to_string(),
    ]
    .join("<br/>")
}

fn render_summary(tags: &[(String, String)]) -> String {
    let object = lookup(tags, "OBJECT-NAME").unwrap_or("unknown");
    format!("Summary for {object}: {} parameters received", tags.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(text: &str) -> Vec<(String, String)> {
        parse_tags(text)
    }

    #[test]
    fn parse_tags_keeps_order_and_skips_noise() {
        let parsed = tags("<A>1\nnoise\n <B>x y\n<C>");
        assert_eq!(
            parsed,
            vec![
                ("A".to_string(), "1".to_string()),
                ("B".to_string(), "x y".to_string()),
                ("C".to_string(), String::new()),
            ]
        );
    }

    #[test]
    fn wavelength_grid_follows_range() {
        let grid = wavelengths(&tags(
            "<GENERATOR-RANGE1>2.0\n<GENERATOR-RANGE2>2.1\n<GENERATOR-RESOLUTION>0.025",
        ))
        .unwrap();
        assert_eq!(grid.len(), 5);
        assert!((grid[4] - 2.1).abs() < 1e-9);
    }

    #[test]
    fn invalid_range_is_reported_as_text() {
        let body = render_spectrum(&tags("<GENERATOR-RESOLUTION>0"), None);
        assert!(body.starts_with("ERROR"));
    }

    #[test]
    fn spectrum_has_header_and_three_columns() {
        let body = render_spectrum(&tags("<OBJECT-NAME>Mars"), Some("y"));
        let header: Vec<&str> = body.lines().filter(|l| l.starts_with('#')).collect();
        assert!(header.contains(&"# Object: Mars"));
        assert!(header.contains(&"# watm: y"));
        for line in body.lines().filter(|l| !l.starts_with('#')) {
            assert_eq!(line.split_whitespace().count(), 3);
        }
    }

    #[test]
    fn config_echo_appends_version() {
        let body = render_config(&tags("<OBJECT>Planet"));
        assert_eq!(body, "<OBJECT>Planet\n<GENERATOR-VERSION>mock");
    }

    #[test]
    fn later_tag_wins_on_lookup() {
        let parsed = tags("<OBJECT-NAME>Mars\n<OBJECT-NAME>Venus");
        assert_eq!(lookup(&parsed, "OBJECT-NAME"), Some("Venus"));
    }

    #[test]
    fn retrieval_has_three_sections() {
        let body = render_retrieval(&tags("<OBJECT-NAME>Titan"));
        assert_eq!(body.matches("results_").count(), 3);
        assert!(!body.contains('\n'));
    }
}
