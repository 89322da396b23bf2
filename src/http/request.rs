use std::borrow::Cow;
use std::collections::HashMap;
use std::str::FromStr;

use thiserror::Error;

use crate::http::handler::{Body, HandlerFunc, Headers};
use crate::http::method::Method;
use crate::http::router::Router;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("empty request")]
    EmptyRequest,
    #[error("malformed request line: {0:?}")]
    InvalidRequestLine(String),
    #[error("unknown HTTP method: {0}")]
    UnknownMethod(String),
}

/// One parsed request. Constructed fresh per connection and discarded after
/// the response is written; never reused.
///
/// The route lookup happens during parsing: `hook` carries the resolved
/// handler, or `None` when no route matches — a miss is not an error, the
/// connection handler falls back to static resolution.
pub struct Request<'r> {
    pub method: Method,
    pub path: String,
    pub version: String,
    /// Header map keyed by lower-cased name; the last occurrence of a
    /// repeated header wins.
    pub headers: Headers,
    /// Cookies from the `Cookie` header. Segments without `=` are skipped.
    pub cookies: HashMap<String, String>,
    /// Decoded query-string parameters (the `?...` suffix stripped from the
    /// path before route lookup).
    pub query: HashMap<String, String>,
    pub body: Body,
    pub hook: Option<&'r HandlerFunc>,
}

impl<'r> Request<'r> {
    /// Parses raw request text and resolves its route against `routes`.
    ///
    /// Only a mangled request line fails the parse (the caller turns that
    /// into a 400); header and cookie oddities are skipped, never fatal.
    pub fn parse(raw: &str, routes: &'r Router) -> Result<Request<'r>, ParseError> {
        if raw.trim().is_empty() {
            return Err(ParseError::EmptyRequest);
        }

        let head = raw.split("\r\n\r\n").next().unwrap_or(raw);
        let mut lines = head.split("\r\n");

        let request_line = lines.next().unwrap_or_default();
        let (method, target, version) = Self::split_request_line(request_line)?;

        let (path, query) = match target.split_once('?') {
            Some((p, q)) => (p.to_string(), decode_form(q)),
            None => (target.to_string(), HashMap::new()),
        };

        let mut headers: Headers = HashMap::new();
        for line in lines {
            if line.trim().is_empty() {
                break;
            }
            if let Some((k, v)) = line.split_once(':') {
                headers.insert(k.trim().to_lowercase(), v.trim().to_string());
            }
        }

        let cookies = headers
            .get("cookie")
            .map(|v| parse_cookies(v))
            .unwrap_or_default();

        let body = Self::extract_body(raw);
        let hook = routes.lookup(method, &path);

        Ok(Request {
            method,
            path,
            version,
            headers,
            cookies,
            query,
            body,
            hook,
        })
    }

    fn split_request_line(line: &str) -> Result<(Method, &str, String), ParseError> {
        let parts: Vec<&str> = line.split_whitespace().collect();
        let [method_raw, target, version] = parts[..] else {
            return Err(ParseError::InvalidRequestLine(line.to_string()));
        };

        let method = Method::from_str(method_raw)
            .map_err(|_| ParseError::UnknownMethod(method_raw.to_string()))?;

        Ok((method, target, version.to_string()))
    }

    /// Body is everything after the first `\r\n\r\n`. Form-shaped content
    /// decodes into a map; anything else stays raw text.
    fn extract_body(raw: &str) -> Body {
        let Some((_, body)) = raw.split_once("\r\n\r\n") else {
            return Body::Empty;
        };
        if body.is_empty() {
            return Body::Empty;
        }
        if looks_like_form(body) {
            Body::Form(decode_form(body))
        } else {
            Body::Text(body.to_string())
        }
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_lowercase()).map(|v| v.as_str())
    }

    /// The form-parameter view handlers and the auth gate consume.
    ///
    /// For POST this is the decoded body form; for GET the query string
    /// fills the same slot — the original server conflated the two, and
    /// existing handlers rely on it, so the conflation is preserved here at
    /// the interface boundary (internally `query` and `body` stay separate).
    pub fn form_params(&self) -> Option<&HashMap<String, String>> {
        match &self.body {
            Body::Form(map) => Some(map),
            _ if self.method == Method::GET && !self.query.is_empty() => Some(&self.query),
            _ => None,
        }
    }

    /// The body a dynamic handler is invoked with. A GET without a body gets
    /// its query map in the body slot, so query-driven handlers read it the
    /// same way form handlers do; everything else passes through unchanged.
    pub fn handler_body(&self) -> Cow<'_, Body> {
        if self.method == Method::GET && self.body.is_empty() && !self.query.is_empty() {
            Cow::Owned(Body::Form(self.query.clone()))
        } else {
            Cow::Borrowed(&self.body)
        }
    }
}

/// True when the content is `key=value&key=value` shaped.
fn looks_like_form(body: &str) -> bool {
    if body.starts_with('{') || body.starts_with('[') {
        return false;
    }
    body.split('&').all(|seg| seg.contains('='))
}

/// Decodes `key=value&key=value` into a map, percent/`+`-decoding both
/// sides. Duplicate keys: last wins. Segments without `=` are dropped.
pub fn decode_form(encoded: &str) -> HashMap<String, String> {
    let mut params = HashMap::new();
    for pair in encoded.split('&') {
        if let Some((k, v)) = pair.split_once('=') {
            params.insert(url_decode(k), url_decode(v));
        }
    }
    params
}

fn parse_cookies(header: &str) -> HashMap<String, String> {
    let mut cookies = HashMap::new();
    for part in header.split(';') {
        if let Some((name, value)) = part.trim().split_once('=') {
            cookies.insert(name.to_string(), value.to_string());
        }
    }
    cookies
}

/// Percent-decoding plus `+` as space. Stray or truncated `%` sequences are
/// kept literally rather than failing the whole parse.
fn url_decode(s: &str) -> String {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'+' => {
                out.push(b' ');
                i += 1;
            }
            b'%' => {
                match s.get(i + 1..i + 3).and_then(|h| u8::from_str_radix(h, 16).ok()) {
                    Some(b) => {
                        out.push(b);
                        i += 3;
                    }
                    None => {
                        out.push(b'%');
                        i += 1;
                    }
                }
            }
            b => {
                out.push(b);
                i += 1;
            }
        }
    }
    String::from_utf8_lossy(&out).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::handler::Payload;

    fn empty_router() -> Router {
        Router::new()
    }

    #[test]
    fn recovers_method_path_and_body_exactly() {
        let routes = empty_router();
        let raw = "POST /submit-info HTTP/1.1\r\nHost: localhost\r\n\r\n{\"peer\":\"p1\"}";
        let req = Request::parse(raw, &routes).unwrap();

        assert_eq!(req.method, Method::POST);
        assert_eq!(req.path, "/submit-info");
        assert_eq!(req.version, "HTTP/1.1");
        assert_eq!(req.body, Body::Text("{\"peer\":\"p1\"}".to_string()));
    }

    #[test]
    fn strips_query_before_route_lookup() {
        let mut routes = Router::new();
        routes.register(
            Method::GET,
            "/get-list",
            Box::new(|_: &Headers, _: &Body| Ok(Payload::Text("ok".into()))),
        );

        let raw = "GET /get-list?channel=general HTTP/1.1\r\n\r\n";
        let req = Request::parse(raw, &routes).unwrap();

        assert_eq!(req.path, "/get-list");
        assert!(req.hook.is_some());
        assert_eq!(req.query.get("channel").map(String::as_str), Some("general"));
    }

    #[test]
    fn unmatched_route_yields_no_hook_not_an_error() {
        let routes = empty_router();
        let req = Request::parse("GET /missing HTTP/1.1\r\n\r\n", &routes).unwrap();
        assert!(req.hook.is_none());
    }

    #[test]
    fn header_keys_are_case_insensitive_last_wins() {
        let routes = empty_router();
        let raw = "GET / HTTP/1.1\r\nX-Tag: one\r\nx-tag: two\r\nUser-Agent: curl/8.0\r\n\r\n";
        let req = Request::parse(raw, &routes).unwrap();

        assert_eq!(req.header("X-TAG"), Some("two"));
        assert_eq!(req.header("user-agent"), Some("curl/8.0"));
    }

    #[test]
    fn cookie_parsing_skips_malformed_segments() {
        let routes = empty_router();
        let raw = "GET / HTTP/1.1\r\nCookie: auth=true; garbage; theme=dark; theme=light\r\n\r\n";
        let req = Request::parse(raw, &routes).unwrap();

        assert_eq!(req.cookies.get("auth").map(String::as_str), Some("true"));
        assert_eq!(req.cookies.get("theme").map(String::as_str), Some("light"));
        assert!(!req.cookies.contains_key("garbage"));
    }

    #[test]
    fn form_body_is_decoded() {
        let routes = empty_router();
        let raw = "POST /login HTTP/1.1\r\n\r\nusername=admin&password=pass%20word";
        let req = Request::parse(raw, &routes).unwrap();

        let form = req.body.form().unwrap();
        assert_eq!(form.get("username").map(String::as_str), Some("admin"));
        assert_eq!(form.get("password").map(String::as_str), Some("pass word"));
    }

    #[test]
    fn json_body_stays_raw_text() {
        let routes = empty_router();
        let raw = "POST /login_app HTTP/1.1\r\n\r\n{\"username\":\"admin\"}";
        let req = Request::parse(raw, &routes).unwrap();
        assert!(req.body.form().is_none());
        assert_eq!(req.body.as_text(), "{\"username\":\"admin\"}");
    }

    #[test]
    fn get_query_doubles_as_form_params() {
        let routes = empty_router();
        let raw = "GET /get-list?channel=general&limit=10 HTTP/1.1\r\n\r\n";
        let req = Request::parse(raw, &routes).unwrap();

        let params = req.form_params().unwrap();
        assert_eq!(params.get("channel").map(String::as_str), Some("general"));
        assert_eq!(params.get("limit").map(String::as_str), Some("10"));
    }

    #[test]
    fn get_query_fills_the_handler_body_slot() {
        let routes = empty_router();
        let raw = "GET /connect?target=alice HTTP/1.1\r\n\r\n";
        let req = Request::parse(raw, &routes).unwrap();

        assert!(req.body.is_empty());
        let body = req.handler_body();
        let form = body.form().unwrap();
        assert_eq!(form.get("target").map(String::as_str), Some("alice"));
    }

    #[test]
    fn post_body_is_never_replaced_by_the_query() {
        let routes = empty_router();
        let raw = "POST /submit-info?ignored=1 HTTP/1.1\r\n\r\nname=p1";
        let req = Request::parse(raw, &routes).unwrap();

        let body = req.handler_body();
        let form = body.form().unwrap();
        assert_eq!(form.get("name").map(String::as_str), Some("p1"));
        assert!(!form.contains_key("ignored"));
    }

    #[test]
    fn empty_input_is_rejected() {
        let routes = empty_router();
        assert!(matches!(
            Request::parse("   \r\n", &routes),
            Err(ParseError::EmptyRequest)
        ));
    }

    #[test]
    fn mangled_request_line_is_rejected() {
        let routes = empty_router();
        assert!(matches!(
            Request::parse("GET\r\n\r\n", &routes),
            Err(ParseError::InvalidRequestLine(_))
        ));
        assert!(matches!(
            Request::parse("BREW /pot HTTP/1.1\r\n\r\n", &routes),
            Err(ParseError::UnknownMethod(_))
        ));
    }

    #[test]
    fn url_decode_handles_percent_and_plus() {
        assert_eq!(url_decode("a+b%21c"), "a b!c");
        assert_eq!(url_decode("broken%2"), "broken%2");
        assert_eq!(url_decode("broken%zz"), "broken%zz");
    }
}
