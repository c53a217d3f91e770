//! Blocking transport backed by a `ureq` agent.
//!
//! # Design
//! The handle stores options as plain fields and builds a fresh agent on each
//! `invoke`, so a new timeout takes effect on the next call. Installing a
//! body switches the handle to POST, and `HttpGet` switches it back, which is
//! how easy-handle libraries behave.
//!
//! Failures are folded into the `RawResponse` with numeric codes borrowed
//! from libcurl so they read familiarly in logs.

use std::fs;
use std::io;
use std::time::{Duration, Instant};

use ::ureq::http::{HeaderName, HeaderValue, Request};
use ::ureq::Agent;
use tracing::warn;
use url::Url;

use super::{Transport, TransportHandle, UNKNOWN_OPTION_CODE};
use crate::error::{OptionError, TransportError};
use crate::http::{Body, FormPart, Header, Method};
use crate::option::TransportOption;
use crate::response::{RawResponse, TransportInfo};

/// Unclassified failure.
pub const GENERIC_ERROR: u32 = 1;
pub const URL_MALFORMAT: u32 = 3;
pub const COULDNT_RESOLVE_HOST: u32 = 6;
pub const COULDNT_CONNECT: u32 = 7;
/// A file attachment could not be read.
pub const READ_ERROR: u32 = 26;
pub const OPERATION_TIMEDOUT: u32 = 28;
/// A header line that cannot go on the wire.
pub const BAD_FUNCTION_ARGUMENT: u32 = 43;
pub const RECV_ERROR: u32 = 56;
pub const FILESIZE_EXCEEDED: u32 = 63;

/// Hands out `UreqHandle`s for `http` and `https` URLs.
#[derive(Debug, Clone, Default)]
pub struct UreqTransport;

impl UreqTransport {
    pub fn new() -> Self {
        Self
    }
}

impl Transport for UreqTransport {
    type Handle = UreqHandle;

    fn acquire(&self, url: &Url) -> Result<Self::Handle, TransportError> {
        match url.scheme() {
            "http" | "https" => Ok(UreqHandle::new(url.clone())),
            other => Err(TransportError::UnsupportedScheme(other.to_string())),
        }
    }
}

#[derive(Debug)]
pub struct UreqHandle {
    url: Url,
    timeout: Option<Duration>,
    return_transfer: bool,
    post: bool,
    custom_method: Option<Method>,
    headers: Vec<Header>,
    body: Body,
    user_agent: Option<String>,
    live: bool,
}

impl UreqHandle {
    fn new(url: Url) -> Self {
        Self {
            url,
            timeout: None,
            return_transfer: false,
            post: false,
            custom_method: None,
            headers: Vec::new(),
            body: Body::Empty,
            user_agent: None,
            live: true,
        }
    }

    fn method(&self) -> Method {
        match self.custom_method {
            Some(method) => method,
            None if self.post => Method::Post,
            None => Method::Get,
        }
    }

    fn has_header(&self, name: &str) -> bool {
        self.headers.iter().any(|h| h.name().eq_ignore_ascii_case(name))
    }

    fn perform(&self) -> RawResponse {
        let method = self.method();
        let (content_type, payload) = match encode_body(&self.body) {
            Ok(encoded) => encoded,
            Err(e) => return RawResponse::failed(READ_ERROR, e.to_string()),
        };

        let mut builder = Request::builder().method(method.as_str()).uri(self.url.as_str());
        for header in &self.headers {
            if !header.as_str().contains(':') {
                warn!(%header, "header line without a colon skipped");
                continue;
            }
            // ureq frames the body itself and derives Content-Length from it.
            if header.name().eq_ignore_ascii_case("content-length") {
                continue;
            }
            if let Err(reason) = check_header(header) {
                warn!(%header, %reason, "invalid header");
                return RawResponse::failed(BAD_FUNCTION_ARGUMENT, format!("invalid header {header}: {reason}"));
            }
            builder = builder.header(header.name(), header.value());
        }
        if let Some(content_type) = content_type {
            if !self.has_header("content-type") {
                builder = builder.header("Content-Type", content_type);
            }
        }
        if let Some(agent) = &self.user_agent {
            if !self.has_header("user-agent") {
                builder = builder.header("User-Agent", agent.as_str());
            }
        }

        let agent: Agent = Agent::config_builder()
            .timeout_global(self.timeout)
            .http_status_as_error(false)
            .build()
            .new_agent();

        let started = Instant::now();
        let sends_body = method != Method::Get && !self.body.is_empty();
        let result = if sends_body {
            builder.body(payload.as_slice()).map(|req| agent.run(req))
        } else {
            builder.body(()).map(|req| agent.run(req))
        };

        let mut response = match result {
            Err(e) => return RawResponse::failed(URL_MALFORMAT, e.to_string()),
            Ok(Err(e)) => return RawResponse::failed(error_code(&e), e.to_string()),
            Ok(Ok(response)) => response,
        };

        let status = response.status().as_u16();
        let mut info = TransportInfo::new();
        info.insert("url".into(), self.url.as_str().into());
        info.insert("method".into(), method.as_str().into());
        info.insert("http_code".into(), status.into());
        if let Some(ct) = response.headers().get("content-type").and_then(|v| v.to_str().ok()) {
            info.insert("content_type".into(), ct.into());
        }

        let mut raw = RawResponse {
            status,
            ..RawResponse::default()
        };
        match response.body_mut().with_config().limit(u64::MAX).read_to_vec() {
            Ok(bytes) => {
                info.insert("size_download".into(), bytes.len().into());
                if self.return_transfer {
                    raw.body = Some(bytes.into());
                }
            }
            Err(e) => {
                raw.error_code = error_code(&e);
                raw.error_message = e.to_string();
            }
        }
        info.insert("total_time".into(), started.elapsed().as_secs_f64().into());
        raw.info = info;
        raw
    }
}

impl TransportHandle for UreqHandle {
    fn configure(&mut self, option: &TransportOption) -> Result<(), OptionError> {
        match option {
            TransportOption::Timeout(0) => self.timeout = None,
            TransportOption::Timeout(secs) => self.timeout = Some(Duration::from_secs(*secs)),
            TransportOption::ReturnTransfer(on) => self.return_transfer = *on,
            TransportOption::Post(on) => self.post = *on,
            TransportOption::HttpGet(on) => {
                if *on {
                    self.post = false;
                    self.custom_method = None;
                }
            }
            TransportOption::PostFields(body) => {
                self.body = body.clone();
                self.post = true;
            }
            TransportOption::HttpHeader(headers) => self.headers = headers.clone(),
            TransportOption::CustomRequest(method) => self.custom_method = Some(*method),
            TransportOption::UserAgent(agent) => self.user_agent = Some(agent.clone()),
            TransportOption::Raw { id, .. } => {
                return Err(OptionError::new(UNKNOWN_OPTION_CODE, format!("unknown option #{id}")));
            }
        }
        Ok(())
    }

    fn invoke(&mut self) -> RawResponse {
        if !self.live {
            return RawResponse::failed(GENERIC_ERROR, "handle released");
        }
        self.perform()
    }

    fn release(&mut self) {
        if self.live {
            self.live = false;
            self.headers.clear();
            self.body = Body::Empty;
        }
    }
}

/// Serialize a body to wire bytes, with the content type it implies.
fn encode_body(body: &Body) -> io::Result<(Option<String>, Vec<u8>)> {
    match body {
        Body::Empty => Ok((None, Vec::new())),
        Body::Encoded(s) => Ok((
            Some("application/x-www-form-urlencoded".to_string()),
            s.as_bytes().to_vec(),
        )),
        Body::Raw(bytes) => Ok((None, bytes.to_vec())),
        Body::Multipart(parts) => {
            let boundary = format!("------------------------{:016x}", rand::random::<u64>());
            let payload = encode_multipart(parts, &boundary)?;
            Ok((Some(format!("multipart/form-data; boundary={boundary}")), payload))
        }
    }
}

/// Escape `"`, CR and LF in a `Content-Disposition` parameter the way HTML
/// form submission does.
fn disposition_param(value: &str) -> String {
    value.replace('"', "%22").replace('\r', "%0D").replace('\n', "%0A")
}

fn check_header(header: &Header) -> Result<(), String> {
    HeaderName::from_bytes(header.name().as_bytes()).map_err(|e| e.to_string())?;
    HeaderValue::from_str(header.value()).map_err(|e| e.to_string())?;
    Ok(())
}

fn encode_multipart(parts: &[(String, FormPart)], boundary: &str) -> io::Result<Vec<u8>> {
    let mut out = Vec::new();
    for (name, part) in parts {
        let name = disposition_param(name);
        out.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
        match part {
            FormPart::Text(text) => {
                out.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
                );
                out.extend_from_slice(text.as_bytes());
            }
            FormPart::File(file) => {
                let contents = fs::read(file.path())?;
                let mime = file.mime_type().unwrap_or("application/octet-stream");
                out.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{name}\"; filename=\"{}\"\r\nContent-Type: {mime}\r\n\r\n",
                        disposition_param(&file.upload_name())
                    )
                    .as_bytes(),
                );
                out.extend_from_slice(&contents);
            }
        }
        out.extend_from_slice(b"\r\n");
    }
    out.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());
    Ok(out)
}

fn error_code(err: &::ureq::Error) -> u32 {
    use ::ureq::Error;

    match err {
        Error::BadUri(_) | Error::Http(_) => URL_MALFORMAT,
        Error::HostNotFound => COULDNT_RESOLVE_HOST,
        Error::ConnectionFailed => COULDNT_CONNECT,
        Error::Timeout(_) => OPERATION_TIMEDOUT,
        Error::BodyExceedsLimit(_) => FILESIZE_EXCEEDED,
        Error::Io(e) => match e.kind() {
            io::ErrorKind::ConnectionRefused => COULDNT_CONNECT,
            io::ErrorKind::TimedOut => OPERATION_TIMEDOUT,
            _ => RECV_ERROR,
        },
        _ => GENERIC_ERROR,
    }
}
