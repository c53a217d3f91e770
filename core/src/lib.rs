//! Synchronous HTTP client over a pluggable transport.
//!
//! # Overview
//! A `Client` is bound to one URL and owns one transport handle. Verb methods
//! (`get`, `post`, `put`, `patch`, `delete`, `json`, `binary`, `request`)
//! compose headers, body and method into transport options, invoke the
//! transport once, and return an immutable `ResponseSnapshot` with the body,
//! status, transport metadata, error state and elapsed time.
//!
//! # Design
//! - The transport sits behind `Transport` / `TransportHandle`, so the core
//!   never touches sockets. `UreqTransport` does real I/O;
//!   `RecordingTransport` records options for tests.
//! - Configuration errors are returned as `RequestError`. Network errors are
//!   reported in-band on the snapshot.
//! - Bearer tokens and request bodies are redacted in `Debug` output.
//!
//! ```no_run
//! use curlish_core::Client;
//!
//! let mut client = Client::open("http://example.com/api").unwrap();
//! client.set_timeout(2).unwrap();
//! let resp = client.get(&[]).unwrap();
//! println!("{} in {}s", resp.status(), resp.response_time());
//! ```

pub mod client;
pub mod clock;
pub mod config;
pub mod error;
pub mod http;
pub mod option;
pub mod response;
pub mod transport;

pub use client::Client;
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{ClientConfig, ClientConfigBuilder, DEFAULT_TIMEOUT_SECS, DEFAULT_USER_AGENT};
pub use error::{OptionError, RequestError, Result, TransportError};
pub use http::{merge_headers, Body, FileRef, FormPart, Header, Method};
pub use option::{OptionKey, OptionValue, TransportOption};
pub use response::{RawResponse, ResponseSnapshot, TransportInfo};
pub use transport::{RecordingTransport, Transport, TransportHandle, UreqTransport};

pub use secrecy::SecretString;
