//! In-memory transport that records what the client installs.
//!
//! Used by this crate's tests and exported so callers can test their own
//! request composition without a network. Every accepted option is stored by
//! key (last write wins) and appended to a history; `invoke` replays a
//! scripted `RawResponse`.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::Mutex;
use url::Url;

use super::{Transport, TransportHandle, UNKNOWN_OPTION_CODE};
use crate::error::{OptionError, TransportError};
use crate::http::{Body, Header, Method};
use crate::option::{OptionKey, TransportOption};
use crate::response::RawResponse;

#[derive(Debug, Default)]
struct State {
    options: BTreeMap<OptionKey, TransportOption>,
    history: Vec<TransportOption>,
    invocations: usize,
    acquired: usize,
    released: usize,
}

/// Shared view of everything a recording handle has seen.
#[derive(Debug, Clone, Default)]
pub struct Recorder {
    state: Arc<Mutex<State>>,
}

impl Recorder {
    /// Latest value installed for `key`.
    pub fn option(&self, key: OptionKey) -> Option<TransportOption> {
        self.state.lock().options.get(&key).cloned()
    }

    /// Every accepted option, in order.
    pub fn history(&self) -> Vec<TransportOption> {
        self.state.lock().history.clone()
    }

    pub fn headers(&self) -> Option<Vec<Header>> {
        match self.option(OptionKey::HttpHeader)? {
            TransportOption::HttpHeader(headers) => Some(headers),
            _ => None,
        }
    }

    /// Header lines as plain strings, values included.
    pub fn header_lines(&self) -> Vec<String> {
        self.headers()
            .unwrap_or_default()
            .iter()
            .map(|h| h.as_str().to_string())
            .collect()
    }

    pub fn body(&self) -> Option<Body> {
        match self.option(OptionKey::PostFields)? {
            TransportOption::PostFields(body) => Some(body),
            _ => None,
        }
    }

    pub fn custom_method(&self) -> Option<Method> {
        match self.option(OptionKey::CustomRequest)? {
            TransportOption::CustomRequest(method) => Some(method),
            _ => None,
        }
    }

    pub fn flag(&self, key: OptionKey) -> Option<bool> {
        match self.option(key)? {
            TransportOption::ReturnTransfer(v)
            | TransportOption::Post(v)
            | TransportOption::HttpGet(v) => Some(v),
            _ => None,
        }
    }

    pub fn timeout(&self) -> Option<u64> {
        match self.option(OptionKey::Timeout)? {
            TransportOption::Timeout(secs) => Some(secs),
            _ => None,
        }
    }

    pub fn invocations(&self) -> usize {
        self.state.lock().invocations
    }

    pub fn acquired(&self) -> usize {
        self.state.lock().acquired
    }

    pub fn released(&self) -> usize {
        self.state.lock().released
    }
}

/// Transport double with scripted behavior.
#[derive(Debug, Clone)]
pub struct RecordingTransport {
    recorder: Recorder,
    response: RawResponse,
    reject: Option<OptionKey>,
    refuse_acquire: bool,
}

impl RecordingTransport {
    /// Answers every request with `200 OK-BODY`.
    pub fn new() -> Self {
        Self {
            recorder: Recorder::default(),
            response: RawResponse::completed(200, "OK-BODY"),
            reject: None,
            refuse_acquire: false,
        }
    }

    pub fn respond_with(mut self, response: RawResponse) -> Self {
        self.response = response;
        self
    }

    /// Refuse every option with this key.
    pub fn rejecting(mut self, key: OptionKey) -> Self {
        self.reject = Some(key);
        self
    }

    /// Fail every `acquire`.
    pub fn refusing_handles(mut self) -> Self {
        self.refuse_acquire = true;
        self
    }

    pub fn recorder(&self) -> Recorder {
        self.recorder.clone()
    }
}

impl Default for RecordingTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for RecordingTransport {
    type Handle = RecordingHandle;

    fn acquire(&self, url: &Url) -> Result<Self::Handle, TransportError> {
        if self.refuse_acquire {
            return Err(TransportError::Exhausted("recording transport refuses handles".into()));
        }
        self.recorder.state.lock().acquired += 1;

        let mut response = self.response.clone();
        response
            .info
            .entry("url".to_string())
            .or_insert_with(|| url.as_str().into());
        Ok(RecordingHandle {
            recorder: self.recorder.clone(),
            response,
            reject: self.reject,
            live: true,
        })
    }
}

#[derive(Debug)]
pub struct RecordingHandle {
    recorder: Recorder,
    response: RawResponse,
    reject: Option<OptionKey>,
    live: bool,
}

impl TransportHandle for RecordingHandle {
    fn configure(&mut self, option: &TransportOption) -> Result<(), OptionError> {
        let key = option.key();
        if self.reject == Some(key) {
            return Err(OptionError::new(UNKNOWN_OPTION_CODE, format!("option {key} not supported")));
        }
        let mut state = self.recorder.state.lock();
        state.options.insert(key, option.clone());
        state.history.push(option.clone());
        Ok(())
    }

    fn invoke(&mut self) -> RawResponse {
        self.recorder.state.lock().invocations += 1;
        let capture = matches!(
            self.recorder.option(OptionKey::ReturnTransfer),
            Some(TransportOption::ReturnTransfer(true))
        );
        let mut response = self.response.clone();
        if !capture {
            response.body = None;
        }
        response
    }

    fn release(&mut self) {
        if self.live {
            self.live = false;
            self.recorder.state.lock().released += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url() -> Url {
        Url::parse("http://unit.test").unwrap()
    }

    #[test]
    fn records_last_value_per_key() {
        let transport = RecordingTransport::new();
        let mut handle = transport.acquire(&url()).unwrap();
        handle.configure(&TransportOption::Timeout(5)).unwrap();
        handle.configure(&TransportOption::Timeout(30)).unwrap();

        let rec = transport.recorder();
        assert_eq!(rec.timeout(), Some(30));
        assert_eq!(rec.history().len(), 2);
    }

    #[test]
    fn rejected_option_is_not_recorded() {
        let transport = RecordingTransport::new().rejecting(OptionKey::Raw(999_999));
        let mut handle = transport.acquire(&url()).unwrap();
        let err = handle
            .configure(&TransportOption::Raw { id: 999_999, value: 99_999i64.into() })
            .unwrap_err();
        assert_eq!(err.code, UNKNOWN_OPTION_CODE);
        assert!(transport.recorder().history().is_empty());
    }

    #[test]
    fn body_is_dropped_without_return_transfer() {
        let transport = RecordingTransport::new();
        let mut handle = transport.acquire(&url()).unwrap();
        assert!(handle.invoke().body.is_none());

        handle.configure(&TransportOption::ReturnTransfer(true)).unwrap();
        let raw = handle.invoke();
        assert_eq!(raw.body.as_deref(), Some(&b"OK-BODY"[..]));
        assert_eq!(raw.info["url"], "http://unit.test/");
    }

    #[test]
    fn release_counts_once() {
        let transport = RecordingTransport::new();
        let mut handle = transport.acquire(&url()).unwrap();
        handle.release();
        handle.release();
        assert_eq!(transport.recorder().released(), 1);
    }
}
