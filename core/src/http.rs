//! HTTP request vocabulary shared by the client and its transports.
//!
//! # Design
//! These types describe a request as plain data: the method, header lines in
//! `"Name: value"` wire form, and the body payload. The client composes them
//! into `TransportOption`s; transports read them back when they invoke.
//!
//! Header lines compare by exact string equality. Duplicate detection in
//! `merge_headers` relies on that, so `Header` never normalizes case or
//! whitespace. Sensitive headers (bearer tokens) and raw bodies redact
//! themselves in `Debug` output.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use bytes::Bytes;

use crate::error::RequestError;

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        }
    }

    /// Whether `json()` may send with this method.
    pub fn carries_json(&self) -> bool {
        matches!(self, Method::Post | Method::Put | Method::Patch)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = RequestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "GET" => Ok(Method::Get),
            "POST" => Ok(Method::Post),
            "PUT" => Ok(Method::Put),
            "PATCH" => Ok(Method::Patch),
            "DELETE" => Ok(Method::Delete),
            other => Err(RequestError::UnknownMethod(other.to_string())),
        }
    }
}

/// A single header line in `"Name: value"` form.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Header {
    line: String,
    sensitive: bool,
}

impl Header {
    pub fn new(name: &str, value: &str) -> Self {
        Self {
            line: format!("{name}: {value}"),
            sensitive: false,
        }
    }

    /// A header whose value must never appear in logs or debug output.
    pub fn sensitive(name: &str, value: &str) -> Self {
        Self {
            line: format!("{name}: {value}"),
            sensitive: true,
        }
    }

    /// The full wire line, value included.
    pub fn as_str(&self) -> &str {
        &self.line
    }

    /// The part before the first `:`, or the whole line if there is none.
    pub fn name(&self) -> &str {
        self.line.split_once(':').map_or(self.line.as_str(), |(name, _)| name.trim())
    }

    /// The part after the first `:`, trimmed.
    pub fn value(&self) -> &str {
        self.line.split_once(':').map_or("", |(_, value)| value.trim())
    }

    pub fn is_sensitive(&self) -> bool {
        self.sensitive
    }
}

impl From<&str> for Header {
    fn from(line: &str) -> Self {
        Self {
            line: line.to_string(),
            sensitive: false,
        }
    }
}

impl From<String> for Header {
    fn from(line: String) -> Self {
        Self { line, sensitive: false }
    }
}

impl fmt::Debug for Header {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.sensitive {
            write!(f, "Header(\"{}: [REDACTED]\")", self.name())
        } else {
            write!(f, "Header({:?})", self.line)
        }
    }
}

impl fmt::Display for Header {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.sensitive {
            write!(f, "{}: [REDACTED]", self.name())
        } else {
            f.write_str(&self.line)
        }
    }
}

/// Set union of `primary` and `secondary`, first occurrence wins.
///
/// Two headers are duplicates only when their lines are byte-for-byte equal,
/// so `"Accept: a"` and `"accept: a"` both survive.
pub fn merge_headers(primary: &[Header], secondary: &[Header]) -> Vec<Header> {
    let mut merged: Vec<Header> = Vec::with_capacity(primary.len() + secondary.len());
    for header in primary.iter().chain(secondary) {
        match merged.iter_mut().find(|h| h.line == header.line) {
            // Keep redaction if either copy was marked sensitive.
            Some(existing) => existing.sensitive |= header.sensitive,
            None => merged.push(header.clone()),
        }
    }
    merged
}

/// A file to upload, the equivalent of a form `<input type="file">`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRef {
    path: PathBuf,
    mime_type: Option<String>,
    upload_name: Option<String>,
}

impl FileRef {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            mime_type: None,
            upload_name: None,
        }
    }

    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }

    pub fn with_upload_name(mut self, name: impl Into<String>) -> Self {
        self.upload_name = Some(name.into());
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn mime_type(&self) -> Option<&str> {
        self.mime_type.as_deref()
    }

    /// Name sent in the `filename` parameter, defaulting to the path's file name.
    pub fn upload_name(&self) -> String {
        match &self.upload_name {
            Some(name) => name.clone(),
            None => self
                .path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
        }
    }
}

/// One entry of a multipart form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormPart {
    Text(String),
    File(FileRef),
}

impl FormPart {
    pub fn as_file(&self) -> Option<&FileRef> {
        match self {
            FormPart::File(file) => Some(file),
            FormPart::Text(_) => None,
        }
    }
}

impl From<FileRef> for FormPart {
    fn from(file: FileRef) -> Self {
        FormPart::File(file)
    }
}

/// Request body as installed on the transport.
#[derive(Clone, PartialEq, Eq, Default)]
pub enum Body {
    #[default]
    Empty,
    /// `application/x-www-form-urlencoded` string.
    Encoded(String),
    /// Opaque bytes, sent as-is.
    Raw(Bytes),
    /// Ordered multipart field map.
    Multipart(Vec<(String, FormPart)>),
}

impl Body {
    pub fn is_empty(&self) -> bool {
        match self {
            Body::Empty => true,
            Body::Encoded(s) => s.is_empty(),
            Body::Raw(b) => b.is_empty(),
            Body::Multipart(parts) => parts.is_empty(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Body::Empty => "empty",
            Body::Encoded(_) => "urlencoded",
            Body::Raw(_) => "raw",
            Body::Multipart(_) => "multipart",
        }
    }

    /// Look up a multipart field by key.
    pub fn part(&self, key: &str) -> Option<&FormPart> {
        match self {
            Body::Multipart(parts) => parts.iter().find(|(k, _)| k == key).map(|(_, p)| p),
            _ => None,
        }
    }
}

impl fmt::Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Body::Empty => f.write_str("Empty"),
            Body::Encoded(s) => write!(f, "Encoded({} bytes)", s.len()),
            Body::Raw(b) => write!(f, "Raw({} bytes)", b.len()),
            Body::Multipart(parts) => {
                let keys: Vec<&str> = parts.iter().map(|(k, _)| k.as_str()).collect();
                f.debug_tuple("Multipart").field(&keys).finish()
            }
        }
    }
}
