//! The transport seam.
//!
//! # Design
//! The client never touches sockets. A `Transport` hands out one handle per
//! client; the handle accumulates options and performs a blocking exchange
//! on `invoke`. This mirrors the acquire / configure / invoke / release
//! lifecycle of easy-handle HTTP libraries, so any of them (or a test double)
//! can sit behind it.
//!
//! Handles keep their configuration between invocations: an option set for
//! one call stays installed until overwritten.

pub mod agent;
pub mod recording;

use url::Url;

use crate::error::{OptionError, TransportError};
use crate::option::TransportOption;
use crate::response::RawResponse;

pub use self::agent::{UreqHandle, UreqTransport};
pub use self::recording::{Recorder, RecordingHandle, RecordingTransport};

/// Code a handle reports for an option it does not support.
pub const UNKNOWN_OPTION_CODE: i32 = 48;

/// Factory for transport handles.
pub trait Transport {
    type Handle: TransportHandle;

    /// Acquire a handle bound to `url`.
    fn acquire(&self, url: &Url) -> Result<Self::Handle, TransportError>;
}

/// One live connection context, owned by exactly one client.
pub trait TransportHandle {
    /// Install an option. A rejected option must leave earlier ones intact.
    fn configure(&mut self, option: &TransportOption) -> Result<(), OptionError>;

    /// Perform the exchange with the current configuration. Network failures
    /// are reported in the returned value, never by panicking.
    fn invoke(&mut self) -> RawResponse;

    /// Free resources. Must tolerate being called more than once.
    fn release(&mut self);
}
