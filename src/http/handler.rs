use std::collections::HashMap;

use serde_json::Value;

/// Parsed request headers, keyed by lower-cased header name.
pub type Headers = HashMap<String, String>;

/// Request body as seen by a handler: raw text, or the decoded form map when
/// the content is shaped like `key=value&key=value`.
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    Empty,
    Text(String),
    Form(HashMap<String, String>),
}

impl Body {
    pub fn as_text(&self) -> &str {
        match self {
            Body::Text(s) => s,
            _ => "",
        }
    }

    pub fn form(&self) -> Option<&HashMap<String, String>> {
        match self {
            Body::Form(map) => Some(map),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Body::Empty)
    }
}

/// What a handler may hand back to the response builder. One tag per return
/// convention; the builder switches on the tag instead of inspecting the
/// value at runtime.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// Plain text, serialized as-is.
    Text(String),
    /// A structure to be JSON-encoded.
    Json(Value),
    /// An explicit (content-type, body) pair.
    Typed {
        content_type: String,
        body: Vec<u8>,
    },
    /// A fully pre-built HTTP response, written to the socket unmodified.
    /// Escape hatch for handlers that need full control over the wire bytes.
    Raw(Vec<u8>),
}

/// Application handler: invoked with the request's headers and body, possibly
/// from several worker threads at once. Any mutable state a handler touches
/// must carry its own locking.
pub type HandlerFunc = Box<dyn Fn(&Headers, &Body) -> anyhow::Result<Payload> + Send + Sync>;
