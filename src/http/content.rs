use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use log::{debug, warn};
use once_cell::sync::Lazy;

use crate::http::method::Method;
use crate::http::request::Request;
use crate::http::response::{self, Response};
use crate::http::status::Status;

/// Where the engine serves files from, and the credential pair gating the
/// login documents.
#[derive(Debug, Clone)]
pub struct SiteConfig {
    /// Directory containing the `www/`, `static/` and `apps/` trees.
    pub root: PathBuf,
    pub username: String,
    pub password: String,
    /// Bare-path rewrites applied before MIME inference, e.g. `/chat` ->
    /// `/chat.html`. Exact keys only, not pattern routing.
    pub rewrites: HashMap<String, String>,
}

impl SiteConfig {
    pub fn new(root: PathBuf, username: &str, password: &str) -> SiteConfig {
        SiteConfig {
            root,
            username: username.to_string(),
            password: password.to_string(),
            rewrites: HashMap::from([("/chat".to_string(), "/chat.html".to_string())]),
        }
    }
}

static EXT_TO_MIME: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("html", "text/html"),
        ("htm", "text/html"),
        ("css", "text/css"),
        ("csv", "text/csv"),
        ("txt", "text/plain"),
        ("xml", "text/xml"),
        ("js", "application/javascript"),
        ("json", "application/json"),
        ("zip", "application/zip"),
        ("pdf", "application/pdf"),
        ("png", "image/png"),
        ("jpg", "image/jpeg"),
        ("jpeg", "image/jpeg"),
        ("gif", "image/gif"),
        ("svg", "image/svg+xml"),
        ("ico", "image/x-icon"),
        ("mp4", "video/mp4"),
        ("webm", "video/webm"),
        ("mp3", "audio/mpeg"),
        ("wav", "audio/wav"),
        ("ogg", "audio/ogg"),
    ])
});

/// MIME type inferred from the path's extension; anything unknown falls back
/// to `application/octet-stream`.
pub fn mime_type(path: &str) -> &'static str {
    path.rsplit_once('.')
        .and_then(|(_, ext)| EXT_TO_MIME.get(ext.to_lowercase().as_str()).copied())
        .unwrap_or("application/octet-stream")
}

/// Maps a MIME type to the directory it is served from, relative to the site
/// root. `None` means the type is unsupported and resolves to a 404.
pub fn base_dir(mime: &str) -> Option<&'static str> {
    let (main, sub) = mime.split_once('/')?;
    match main {
        "text" => match sub {
            "html" => Some("www"),
            "plain" | "css" | "csv" | "xml" => Some("static"),
            _ => None,
        },
        "image" => Some("static"),
        "application" => match sub {
            "json" | "xml" | "zip" | "pdf" => Some("apps"),
            _ => Some("static/apps"),
        },
        "video" => Some("static/videos"),
        "audio" => Some("static/audio"),
        _ => None,
    }
}

enum Gate {
    Cookie,
    FreshCredentials,
    BadCredentials,
    Anonymous,
}

/// The one authentication gate: the `auth=true` cookie bypasses the check,
/// otherwise POSTed form credentials are compared against the configured
/// pair. There is no server-side session store — the cookie is the whole
/// session state, spoofable by design in this minimal engine.
fn authenticate(cfg: &SiteConfig, request: &Request) -> Gate {
    if request.cookies.get("auth").map(String::as_str) == Some("true") {
        debug!("authenticated from cookie");
        return Gate::Cookie;
    }

    if request.method == Method::POST {
        if let Some(form) = request.body.form() {
            let username = form.get("username").map(String::as_str).unwrap_or("");
            let password = form.get("password").map(String::as_str).unwrap_or("");
            return if username == cfg.username && password == cfg.password {
                debug!("authenticated from credentials");
                Gate::FreshCredentials
            } else {
                Gate::BadCredentials
            };
        }
    }

    Gate::Anonymous
}

/// Serves a file for a request no dynamic route claimed.
///
/// `/` and `/login` pass through the auth gate first and land on the
/// authenticated or anonymous landing document; every other path goes
/// through the rewrite table, MIME inference and the directory mapping.
/// Missing files and unsupported types terminate in the fixed 404.
pub fn resolve(cfg: &SiteConfig, request: &Request) -> Vec<u8> {
    let mut path = request.path.clone();
    let mut set_auth_cookie = false;

    if path == "/" || path == "/login" {
        match authenticate(cfg, request) {
            Gate::Cookie => path = "/index.html".to_string(),
            Gate::FreshCredentials => {
                set_auth_cookie = true;
                path = "/index.html".to_string();
            }
            Gate::BadCredentials => return response::unauthorized(),
            Gate::Anonymous => path = "/login.html".to_string(),
        }
    } else if let Some(target) = cfg.rewrites.get(&path) {
        path = target.clone();
    }

    // "../" segments would escape the site root after the join below.
    if path.split('/').any(|seg| seg == "..") {
        warn!("rejecting traversal in {}", request.path);
        return response::not_found();
    }

    let mime = mime_type(&path);
    let Some(dir) = base_dir(mime) else {
        warn!("unsupported MIME type {} for {}", mime, request.path);
        return response::not_found();
    };

    let file_path = cfg.root.join(dir).join(path.trim_start_matches('/'));
    debug!("serving object at {}", file_path.display());

    match fs::read(&file_path) {
        Ok(content) => {
            let mut resp = Response::new(Status::OK)
                .with_header("Content-Type", mime)
                .with_content(content);
            resp.set_auth_cookie = set_auth_cookie;
            resp.to_bytes(request)
        }
        Err(err) => {
            warn!("cannot read {}: {}", file_path.display(), err);
            response::not_found()
        }
    }
}
