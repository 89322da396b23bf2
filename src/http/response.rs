use std::collections::HashMap;
use std::time::SystemTime;

use bytes::BytesMut;

use crate::http::handler::Payload;
use crate::http::request::Request;
use crate::http::status::Status;

const UNAUTHORIZED_PAGE: &str = "<!DOCTYPE html>\n<html>\n<head><title>401 Unauthorized</title></head>\n<body>\n<h1>401 Unauthorized</h1>\n<p>Invalid username or password.</p>\n</body>\n</html>\n";

/// One outgoing response. Mutable until serialized by [`Response::to_bytes`];
/// once written to the socket it is never touched again.
pub struct Response {
    pub status: Status,
    /// Response-specific headers (mostly `Content-Type`). Merged over the
    /// fixed engine header set at serialization time.
    pub headers: HashMap<String, String>,
    pub content: Vec<u8>,
    /// When set, the serialized response carries `Set-Cookie: auth=true`.
    pub set_auth_cookie: bool,
}

impl Response {
    pub fn new(status: Status) -> Response {
        Response {
            status,
            headers: HashMap::new(),
            content: Vec::new(),
            set_auth_cookie: false,
        }
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Response {
        self.headers.insert(name.to_string(), value.to_string());
        self
    }

    pub fn with_content(mut self, content: Vec<u8>) -> Response {
        self.content = content;
        self
    }

    /// Serializes status line, engine headers and content into wire bytes.
    ///
    /// The engine header set is fixed behavior, not per-route configuration:
    /// CORS allow-all, no-cache directives, an RFC-1123 `Date`, and echoes of
    /// the request's own `Accept`/`Authorization`/`User-Agent` headers (with
    /// placeholders when the request did not carry them).
    pub fn to_bytes(&self, request: &Request) -> Vec<u8> {
        let date = httpdate::fmt_http_date(SystemTime::now());

        let mut headers: Vec<(&str, String)> = vec![
            (
                "Accept",
                request.header("accept").unwrap_or("application/json").to_string(),
            ),
            (
                "Accept-Language",
                request
                    .header("accept-language")
                    .unwrap_or("en-US,en;q=0.9")
                    .to_string(),
            ),
            (
                "Authorization",
                request
                    .header("authorization")
                    .unwrap_or("Basic <credentials>")
                    .to_string(),
            ),
            ("Access-Control-Allow-Origin", "*".to_string()),
            ("Access-Control-Allow-Methods", "GET, POST, OPTIONS".to_string()),
            ("Access-Control-Allow-Headers", "Content-Type".to_string()),
            ("Cache-Control", "no-cache".to_string()),
            ("Content-Type", "application/json".to_string()),
            // Byte length, never character length: must stay correct for
            // multi-byte UTF-8 content.
            ("Content-Length", self.content.len().to_string()),
            ("Date", date),
            ("Pragma", "no-cache".to_string()),
            (
                "User-Agent",
                request
                    .header("user-agent")
                    .unwrap_or("Chrome/123.0.0.0")
                    .to_string(),
            ),
        ];

        // Response-specific headers replace their engine counterpart in
        // place (names matched case-insensitively); new names append.
        for (name, value) in &self.headers {
            match headers.iter_mut().find(|(n, _)| n.eq_ignore_ascii_case(name)) {
                Some(slot) => slot.1 = value.clone(),
                None => headers.push((name.as_str(), value.clone())),
            }
        }

        if self.set_auth_cookie {
            headers.push(("Set-Cookie", "auth=true; Path=/; HttpOnly".to_string()));
        }

        let mut out = BytesMut::with_capacity(self.content.len() + headers.len() * 48);
        out.extend_from_slice(
            format!("HTTP/1.1 {} {}\r\n", self.status.code_num, self.status.message).as_bytes(),
        );
        for (name, value) in &headers {
            out.extend_from_slice(format!("{}: {}\r\n", name, value).as_bytes());
        }
        out.extend_from_slice(b"\r\n");
        out.extend_from_slice(&self.content);
        out.to_vec()
    }
}

/// Turns a handler's return value into wire bytes. Switches on the payload
/// tag; `Raw` is the pre-built escape hatch and goes out unmodified.
pub fn build_dynamic(request: &Request, payload: Payload) -> Vec<u8> {
    match payload {
        Payload::Raw(bytes) => bytes,
        Payload::Text(text) => Response::new(Status::OK)
            .with_content(text.into_bytes())
            .to_bytes(request),
        Payload::Json(value) => Response::new(Status::OK)
            .with_header("Content-Type", "application/json")
            .with_content(value.to_string().into_bytes())
            .to_bytes(request),
        Payload::Typed { content_type, body } => Response::new(Status::OK)
            .with_header("Content-Type", &content_type)
            .with_content(body)
            .to_bytes(request),
    }
}

/// 500 with a JSON body carrying the handler's error message.
pub fn build_error(request: &Request, message: &str) -> Vec<u8> {
    let body = serde_json::json!({ "status": "error", "message": message });
    Response::new(Status::INTERNAL_SERVER_ERROR)
        .with_header("Content-Type", "application/json")
        .with_content(body.to_string().into_bytes())
        .to_bytes(request)
}

fn status_line(status: Status) -> String {
    format!("HTTP/1.1 {} {}\r\n", status.code_num, status.message)
}

/// Fixed 400 template for requests whose first line cannot be parsed.
pub fn bad_request() -> Vec<u8> {
    format!(
        "{}\
         Content-Type: text/html\r\n\
         Content-Length: 15\r\n\
         \r\n\
         400 Bad Request",
        status_line(Status::BAD_REQUEST)
    )
    .into_bytes()
}

/// Fixed 404 template, byte-exact: `Content-Length: 13`, body `404 Not Found`.
pub fn not_found() -> Vec<u8> {
    format!(
        "{}\
         Accept-Ranges: bytes\r\n\
         Content-Type: text/html\r\n\
         Content-Length: 13\r\n\
         Cache-Control: max-age=86000\r\n\
         Connection: close\r\n\
         \r\n\
         404 Not Found",
        status_line(Status::NOT_FOUND)
    )
    .into_bytes()
}

/// Fixed 401 page returned when posted credentials do not match.
pub fn unauthorized() -> Vec<u8> {
    format!(
        "{}\
         Content-Type: text/html; charset=utf-8\r\n\
         Content-Length: {}\r\n\
         Connection: close\r\n\
         \r\n\
         {}",
        status_line(Status::UNAUTHORIZED),
        UNAUTHORIZED_PAGE.len(),
        UNAUTHORIZED_PAGE
    )
    .into_bytes()
}

/// Fixed CORS preflight answer: 204, allow-all, no body. Sent for `OPTIONS`
/// before any routing happens.
pub fn preflight() -> Vec<u8> {
    format!(
        "{}\
         Access-Control-Allow-Origin: *\r\n\
         Access-Control-Allow-Methods: GET, POST, PUT, DELETE, OPTIONS\r\n\
         Access-Control-Allow-Headers: Content-Type, Authorization\r\n\
         Access-Control-Max-Age: 86400\r\n\
         Connection: close\r\n\
         \r\n",
        status_line(Status::NO_CONTENT)
    )
    .into_bytes()
}
