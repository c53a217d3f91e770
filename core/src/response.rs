//! Response capture.
//!
//! # Design
//! A `ResponseSnapshot` is produced by invoking a handle exactly once while
//! reading the clock on either side. After that it is a read-only view: it
//! keeps no reference to the handle and never closes it. Transport failures
//! arrive in-band as `error_code`/`error_message`, so capturing never fails.

use std::collections::BTreeMap;
use std::time::Duration;

use bytes::Bytes;
use tracing::debug;

use crate::clock::Clock;
use crate::transport::TransportHandle;

/// Transport metadata, passed through untouched (effective URL, content type, ...).
pub type TransportInfo = BTreeMap<String, serde_json::Value>;

/// Raw outcome of one transport invocation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawResponse {
    /// `None` when body capture was off or nothing was received.
    pub body: Option<Bytes>,
    /// `0` when no response arrived.
    pub status: u16,
    pub info: TransportInfo,
    /// `0` on success.
    pub error_code: u32,
    pub error_message: String,
}

impl RawResponse {
    /// A completed exchange with the given status and body.
    pub fn completed(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            body: Some(body.into()),
            status,
            ..Self::default()
        }
    }

    /// An exchange that never produced a response.
    pub fn failed(error_code: u32, error_message: impl Into<String>) -> Self {
        Self {
            error_code,
            error_message: error_message.into(),
            ..Self::default()
        }
    }
}

/// Immutable result of one request.
#[derive(Debug, Clone)]
pub struct ResponseSnapshot {
    body: Option<Bytes>,
    status: u16,
    info: TransportInfo,
    error_code: u32,
    error_message: String,
    start: Duration,
    stop: Duration,
}

impl ResponseSnapshot {
    /// Invoke `handle` once, timing the call with `clock`.
    pub fn capture<H, C>(handle: &mut H, clock: &C) -> Self
    where
        H: TransportHandle + ?Sized,
        C: Clock + ?Sized,
    {
        let start = clock.now();
        let raw = handle.invoke();
        let stop = clock.now();

        let snapshot = Self::from_raw(raw, start, stop);
        debug!(
            status = snapshot.status,
            error_code = snapshot.error_code,
            elapsed = snapshot.response_time(),
            "response captured"
        );
        snapshot
    }

    pub(crate) fn from_raw(raw: RawResponse, start: Duration, stop: Duration) -> Self {
        Self {
            body: raw.body,
            status: raw.status,
            info: raw.info,
            error_code: raw.error_code,
            error_message: raw.error_message,
            start,
            stop,
        }
    }

    /// Protocol status code; `0` if the request never completed.
    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn body(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }

    /// Body decoded as UTF-8, lossily. Empty when absent.
    pub fn text(&self) -> String {
        self.body
            .as_ref()
            .map(|b| String::from_utf8_lossy(b).into_owned())
            .unwrap_or_default()
    }

    pub fn info(&self) -> &TransportInfo {
        &self.info
    }

    pub fn error_code(&self) -> u32 {
        self.error_code
    }

    pub fn error_message(&self) -> &str {
        &self.error_message
    }

    /// Seconds spent in the transport call, rounded to milliseconds.
    pub fn response_time(&self) -> f64 {
        let elapsed = self.stop.saturating_sub(self.start).as_secs_f64();
        (elapsed * 1000.0).round() / 1000.0
    }

    /// The server answered, whatever the status.
    pub fn is_completed(&self) -> bool {
        self.status != 0
    }

    pub fn is_success(&self) -> bool {
        self.error_code == 0 && (200..300).contains(&self.status)
    }
}
