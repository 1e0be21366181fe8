//! Synchronous client for the Planetary Spectrum Generator (PSG) API.
//!
//! # Overview
//! PSG takes a configuration in a tagged text format (`<TAG>value` per
//! line) posted as a form, and answers with plain text whose shape depends
//! on the request: a numeric spectrum, an echo of the configuration, or a
//! multi-section results document. This crate covers both directions:
//! encoding/decoding configurations and turning replies into typed values.
//!
//! # Design
//! - `config` is the text codec; values are inferred as int, float or string.
//! - `PsgClient` is stateless: `build_*` produces an `HttpRequest`, `parse_*`
//!   consumes an `HttpResponse`, so the I/O boundary is explicit.
//! - `Transport` executes requests; `UreqTransport` does it over blocking
//!   HTTP with a timeout and no retries.
//! - `Psg` ties them together and checks connectivity when it is created.
//!
//! ```no_run
//! use psg_core::{OutputType, Psg, RunRequest, Settings};
//!
//! let psg = Psg::connect(Settings::default())?;
//! let mut config = psg.default_config().clone();
//! config.insert("OBJECT-NAME".to_string(), "Venus".into());
//! let reply = psg.run(&RunRequest::new().config(config).output(OutputType::Rad))?;
//! if let Some(table) = reply.spectrum() {
//!     println!("{} points", table.rows());
//! }
//! # Ok::<(), psg_core::PsgError>(())
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod reply;
pub mod request;
pub mod session;
pub mod transport;

pub use client::PsgClient;
pub use config::{decode, encode, Config, ConfigValue, DEFAULT_CONFIG};
pub use error::{ConfigurationError, PsgError, TransportError};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use reply::{Reply, Table};
pub use request::{OutputType, RunOptions, RunRequest};
pub use session::{DefaultConfig, Psg, RawReply, Settings};
pub use transport::{Transport, UreqTransport};
