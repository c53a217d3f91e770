//! The request-building client.
//!
//! # Design
//! `Client` owns one transport handle for its whole life and composes every
//! verb call into a sequence of `TransportOption`s followed by exactly one
//! invocation. POST-family verbs share `prepare_post`, which merges the
//! caller's headers with the client's defaults and installs the body. PUT,
//! PATCH and DELETE install a method override first and then run the POST
//! path, so the override rides on top of the prepared body.
//!
//! Configuration failures return `Err`. Network failures do not: they come
//! back inside the `ResponseSnapshot`.
//!
//! The handle keeps whatever was installed by earlier calls. `request()`
//! relies on that to send a previously configured body.

use std::fmt;

use bytes::Bytes;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use tracing::{debug, trace, warn};
use url::Url;

use crate::clock::{Clock, SystemClock};
use crate::config::ClientConfig;
use crate::error::{RequestError, Result, TransportError};
use crate::http::{merge_headers, Body, FileRef, FormPart, Header, Method};
use crate::option::TransportOption;
use crate::response::ResponseSnapshot;
use crate::transport::{Transport, TransportHandle, UreqHandle, UreqTransport};

/// Synchronous HTTP client bound to a single URL.
pub struct Client<H: TransportHandle> {
    target: Url,
    timeout_secs: u64,
    default_headers: Vec<Header>,
    handle: Option<H>,
    clock: Box<dyn Clock + Send + Sync>,
}

impl Client<UreqHandle> {
    /// Open a client for `url` over the ureq transport.
    pub fn open(url: &str) -> Result<Self> {
        Self::with_transport(&UreqTransport::new(), url)
    }
}

impl<H: TransportHandle> Client<H> {
    pub fn with_transport<T>(transport: &T, url: &str) -> Result<Self>
    where
        T: Transport<Handle = H>,
    {
        Self::with_config(transport, url, &ClientConfig::default())
    }

    /// Acquire a handle for `url` and apply `config` to it.
    ///
    /// If applying the configuration fails, the handle is released before
    /// the error is returned.
    pub fn with_config<T>(transport: &T, url: &str, config: &ClientConfig) -> Result<Self>
    where
        T: Transport<Handle = H>,
    {
        let target = Url::parse(url).map_err(|e| TransportError::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        let handle = transport.acquire(&target)?;
        debug!(url = %target, "transport handle acquired");

        let mut client = Self {
            target,
            timeout_secs: config.timeout_secs,
            default_headers: config.default_headers.clone(),
            handle: Some(handle),
            clock: Box::new(SystemClock::new()),
        };
        client.set_timeout(config.timeout_secs)?;
        if let Some(agent) = &config.user_agent {
            client.configure(TransportOption::UserAgent(agent.clone()))?;
        }
        Ok(client)
    }

    /// Replace the clock used to time requests.
    pub fn with_clock(mut self, clock: impl Clock + Send + Sync + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn target(&self) -> &Url {
        &self.target
    }

    pub fn timeout_secs(&self) -> u64 {
        self.timeout_secs
    }

    pub fn default_headers(&self) -> &[Header] {
        &self.default_headers
    }

    pub fn is_open(&self) -> bool {
        self.handle.is_some()
    }

    /// Overwrite the transport timeout.
    pub fn set_timeout(&mut self, secs: u64) -> Result<&mut Self> {
        self.configure(TransportOption::Timeout(secs))?;
        self.timeout_secs = secs;
        Ok(self)
    }

    /// Forward any option to the transport.
    pub fn set_option(&mut self, option: TransportOption) -> Result<&mut Self> {
        self.configure(option)?;
        Ok(self)
    }

    /// URL-encode `params` and install them as the POST body.
    ///
    /// Neither the method nor the headers change.
    pub fn set_parameters<T: Serialize + ?Sized>(&mut self, params: &T) -> Result<&mut Self> {
        let encoded = serde_urlencoded::to_string(params)?;
        self.configure(TransportOption::PostFields(Body::Encoded(encoded)))?;
        Ok(self)
    }

    /// Replace the default headers with a single bearer `Authorization` header.
    pub fn set_bearer_auth(&mut self, token: SecretString) -> &mut Self {
        let value = format!("Bearer {}", token.expose_secret());
        self.default_headers = vec![Header::sensitive("Authorization", &value)];
        self
    }

    /// GET with exactly `headers`; the defaults are not merged in.
    pub fn get(&mut self, headers: &[Header]) -> Result<ResponseSnapshot> {
        self.configure(TransportOption::HttpGet(true))?;
        self.configure(TransportOption::ReturnTransfer(true))?;
        self.configure(TransportOption::HttpHeader(headers.to_vec()))?;
        self.dispatch(Some(Method::Get), headers.len(), &Body::Empty)
    }

    /// POST `fields`, or a multipart form when `attachments` contains files.
    ///
    /// Files are keyed `files[0]`, `files[1]`, ... in the order they appear
    /// among the attachments. Text attachments are ignored.
    pub fn post(
        &mut self,
        fields: &[(&str, &str)],
        attachments: &[FormPart],
        headers: &[Header],
    ) -> Result<ResponseSnapshot> {
        let body = form_body(fields, attachments)?;
        let merged = self.prepare_post(body.clone(), headers)?;
        self.dispatch(None, merged, &body)
    }

    pub fn put(
        &mut self,
        fields: &[(&str, &str)],
        attachments: &[FormPart],
        headers: &[Header],
    ) -> Result<ResponseSnapshot> {
        self.configure(TransportOption::CustomRequest(Method::Put))?;
        self.post(fields, attachments, headers)
    }

    pub fn patch(
        &mut self,
        fields: &[(&str, &str)],
        attachments: &[FormPart],
        headers: &[Header],
    ) -> Result<ResponseSnapshot> {
        self.configure(TransportOption::CustomRequest(Method::Patch))?;
        self.post(fields, attachments, headers)
    }

    pub fn delete(
        &mut self,
        fields: &[(&str, &str)],
        attachments: &[FormPart],
        headers: &[Header],
    ) -> Result<ResponseSnapshot> {
        self.configure(TransportOption::CustomRequest(Method::Delete))?;
        self.post(fields, attachments, headers)
    }

    /// Send `data` serialized as JSON.
    ///
    /// Only POST, PUT and PATCH are honored; any other method is sent as
    /// POST.
    pub fn json<T: Serialize + ?Sized>(
        &mut self,
        data: &T,
        method: Method,
    ) -> Result<ResponseSnapshot> {
        let payload = serde_json::to_vec(data)?;
        self.send_json(payload, method)
    }

    /// Like `json`, for a document that is already serialized.
    pub fn json_str(&mut self, data: &SecretString, method: Method) -> Result<ResponseSnapshot> {
        let text = data.expose_secret();
        serde_json::from_str::<serde::de::IgnoredAny>(text)?;
        self.send_json(text.as_bytes().to_vec(), method)
    }

    /// POST `data` as `application/octet-stream`.
    pub fn binary(&mut self, data: impl Into<Bytes>, headers: &[Header]) -> Result<ResponseSnapshot> {
        let data: Bytes = data.into();
        let mut all = headers.to_vec();
        all.push(Header::new("Content-Type", "application/octet-stream"));
        all.push(Header::new("Content-Length", &data.len().to_string()));

        let body = Body::Raw(data);
        let merged = self.prepare_post(body.clone(), &all)?;
        self.dispatch(None, merged, &body)
    }

    /// Invoke with the configuration already installed.
    pub fn request(&mut self) -> Result<ResponseSnapshot> {
        self.dispatch(None, 0, &Body::Empty)
    }

    /// Release the transport handle. Later calls are no-ops.
    pub fn close(&mut self) {
        if let Some(mut handle) = self.handle.take() {
            handle.release();
            trace!(url = %self.target, "transport handle released");
        }
    }

    fn send_json(&mut self, payload: Vec<u8>, method: Method) -> Result<ResponseSnapshot> {
        let method = json_method(method);
        let headers = [
            Header::new("Content-Type", "application/json"),
            Header::new("Accept", "application/json"),
        ];
        let body = Body::Raw(payload.into());
        let merged = self.prepare_post(body.clone(), &headers)?;
        self.configure(TransportOption::CustomRequest(method))?;
        self.dispatch(Some(method), merged, &body)
    }

    /// Shared preparation for every request that carries a body.
    ///
    /// Returns the number of headers installed.
    fn prepare_post(&mut self, body: Body, headers: &[Header]) -> Result<usize> {
        let merged = merge_headers(headers, &self.default_headers);
        let count = merged.len();
        self.configure(TransportOption::ReturnTransfer(true))?;
        self.configure(TransportOption::Post(true))?;
        self.configure(TransportOption::HttpHeader(merged))?;
        self.configure(TransportOption::PostFields(body))?;
        Ok(count)
    }

    fn configure(&mut self, option: TransportOption) -> Result<()> {
        let key = option.key();
        let handle = self.handle.as_mut().ok_or(RequestError::NotInitialized)?;
        handle.configure(&option).map_err(|e| {
            warn!(option = %key, code = e.code, "transport rejected option");
            RequestError::OptionRejected {
                option: key,
                code: e.code,
                message: e.message,
            }
        })
    }

    fn dispatch(&mut self, method: Option<Method>, headers: usize, body: &Body) -> Result<ResponseSnapshot> {
        let handle = self.handle.as_mut().ok_or(RequestError::NotInitialized)?;
        debug!(
            method = method.map_or("configured", |m| m.as_str()),
            url = %self.target,
            headers,
            body = body.kind(),
            "dispatching request"
        );
        Ok(ResponseSnapshot::capture(handle, self.clock.as_ref()))
    }
}

impl<H: TransportHandle> Drop for Client<H> {
    fn drop(&mut self) {
        self.close();
    }
}

impl<H: TransportHandle> fmt::Debug for Client<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("target", &self.target.as_str())
            .field("timeout_secs", &self.timeout_secs)
            .field("default_headers", &self.default_headers)
            .field("open", &self.is_open())
            .finish()
    }
}

/// Method actually used by `json()`.
fn json_method(requested: Method) -> Method {
    if requested.carries_json() {
        requested
    } else {
        warn!(requested = %requested, "json() sends only POST, PUT or PATCH; using POST");
        Method::Post
    }
}

fn form_body(fields: &[(&str, &str)], attachments: &[FormPart]) -> Result<Body> {
    let files: Vec<&FileRef> = attachments.iter().filter_map(FormPart::as_file).collect();
    if files.is_empty() {
        return Ok(Body::Encoded(serde_urlencoded::to_string(fields)?));
    }

    let mut parts: Vec<(String, FormPart)> = fields
        .iter()
        .map(|(k, v)| (k.to_string(), FormPart::Text(v.to_string())))
        .collect();
    parts.extend(
        files
            .into_iter()
            .enumerate()
            .map(|(i, file)| (format!("files[{i}]"), FormPart::File(file.clone()))),
    );
    Ok(Body::Multipart(parts))
}
