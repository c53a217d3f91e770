//! Transport configuration options.
//!
//! Every setting the client applies to a handle goes through one of these,
//! including the ones installed implicitly by verb methods. `Raw` forwards a
//! transport-specific option id untouched; the transport decides whether it
//! understands it.

use std::fmt;

use crate::http::{Body, Header, Method};

/// A named configuration setting with its value.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportOption {
    /// Ceiling on the whole blocking call, in seconds.
    Timeout(u64),
    /// Capture the response body into the snapshot.
    ReturnTransfer(bool),
    /// Send a POST carrying the installed body.
    Post(bool),
    /// Reset to a plain GET, clearing POST mode.
    HttpGet(bool),
    /// Body payload.
    PostFields(Body),
    /// Complete header list, replacing any previous one.
    HttpHeader(Vec<Header>),
    /// Method override applied on top of POST preparation.
    CustomRequest(Method),
    UserAgent(String),
    Raw { id: u32, value: OptionValue },
}

impl TransportOption {
    pub fn key(&self) -> OptionKey {
        match self {
            TransportOption::Timeout(_) => OptionKey::Timeout,
            TransportOption::ReturnTransfer(_) => OptionKey::ReturnTransfer,
            TransportOption::Post(_) => OptionKey::Post,
            TransportOption::HttpGet(_) => OptionKey::HttpGet,
            TransportOption::PostFields(_) => OptionKey::PostFields,
            TransportOption::HttpHeader(_) => OptionKey::HttpHeader,
            TransportOption::CustomRequest(_) => OptionKey::CustomRequest,
            TransportOption::UserAgent(_) => OptionKey::UserAgent,
            TransportOption::Raw { id, .. } => OptionKey::Raw(*id),
        }
    }
}

/// Identifier of a `TransportOption`, used in diagnostics and by recorders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OptionKey {
    Timeout,
    ReturnTransfer,
    Post,
    HttpGet,
    PostFields,
    HttpHeader,
    CustomRequest,
    UserAgent,
    Raw(u32),
}

impl fmt::Display for OptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionKey::Timeout => f.write_str("TIMEOUT"),
            OptionKey::ReturnTransfer => f.write_str("RETURNTRANSFER"),
            OptionKey::Post => f.write_str("POST"),
            OptionKey::HttpGet => f.write_str("HTTPGET"),
            OptionKey::PostFields => f.write_str("POSTFIELDS"),
            OptionKey::HttpHeader => f.write_str("HTTPHEADER"),
            OptionKey::CustomRequest => f.write_str("CUSTOMREQUEST"),
            OptionKey::UserAgent => f.write_str("USERAGENT"),
            OptionKey::Raw(id) => write!(f, "#{id}"),
        }
    }
}

/// Untyped value for `TransportOption::Raw`.
#[derive(Debug, Clone, PartialEq)]
pub enum OptionValue {
    Bool(bool),
    Int(i64),
    Text(String),
}

impl From<bool> for OptionValue {
    fn from(v: bool) -> Self {
        OptionValue::Bool(v)
    }
}

impl From<i64> for OptionValue {
    fn from(v: i64) -> Self {
        OptionValue::Int(v)
    }
}

impl From<&str> for OptionValue {
    fn from(v: &str) -> Self {
        OptionValue::Text(v.to_string())
    }
}

impl From<String> for OptionValue {
    fn from(v: String) -> Self {
        OptionValue::Text(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_matches_variant() {
        assert_eq!(TransportOption::Timeout(5).key(), OptionKey::Timeout);
        assert_eq!(
            TransportOption::Raw { id: 7, value: 1i64.into() }.key(),
            OptionKey::Raw(7)
        );
    }

    #[test]
    fn raw_key_displays_its_id() {
        assert_eq!(OptionKey::Raw(999_999).to_string(), "#999999");
        assert_eq!(OptionKey::CustomRequest.to_string(), "CUSTOMREQUEST");
    }
}
