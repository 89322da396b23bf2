use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use anyhow::anyhow;
use clap::Parser;
use log::info;
use serde::Serialize;
use serde_json::json;

use weblet::config::Config;
use weblet::http::content::SiteConfig;
use weblet::http::handler::{Body, Headers, Payload};
use weblet::http::method::Method;
use weblet::http::{Router, Server};

/// A registered peer, as reported over /submit-info.
#[derive(Debug, Clone, Serialize)]
struct PeerInfo {
    ip: String,
    port: u16,
    username: String,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let config = Config::parse();

    // Shared tracker state. Handlers run concurrently from pool workers, so
    // every touch goes through the mutex — that locking is the handlers'
    // obligation, not the engine's.
    let peers: Arc<Mutex<HashMap<String, PeerInfo>>> = Arc::new(Mutex::new(HashMap::new()));

    let mut router = Router::new();

    // JSON credential check, the API twin of the cookie gate on /login.
    let (user, pass) = (config.username.clone(), config.password.clone());
    router.register(
        Method::POST,
        "/login_app",
        Box::new(move |_headers: &Headers, body: &Body| {
            let data: serde_json::Value =
                serde_json::from_str(body.as_text()).unwrap_or_default();
            let username = data["username"].as_str().unwrap_or("");
            let password = data["password"].as_str().unwrap_or("");
            let reply = if username == user && password == pass {
                json!({ "status": "success", "message": "Login successful", "username": username })
            } else {
                json!({ "status": "error", "message": "Invalid username or password" })
            };
            Ok(Payload::Json(reply))
        }),
    );

    // Peer registration: form-encoded name/ip/port into the shared table.
    let table = Arc::clone(&peers);
    router.register(
        Method::POST,
        "/submit-info",
        Box::new(move |_headers: &Headers, body: &Body| {
            let form = body
                .form()
                .ok_or_else(|| anyhow!("expected form-encoded peer info"))?;
            let name = form
                .get("name")
                .cloned()
                .ok_or_else(|| anyhow!("missing peer name"))?;
            let info = PeerInfo {
                ip: form.get("ip").cloned().unwrap_or_else(|| "127.0.0.1".to_string()),
                port: form.get("port").and_then(|p| p.parse().ok()).unwrap_or(0),
                username: name.clone(),
            };
            let mut table = table.lock().map_err(|_| anyhow!("peer table poisoned"))?;
            table.insert(name.clone(), info);
            Ok(Payload::Json(
                json!({ "status": "success", "peer": name, "count": table.len() }),
            ))
        }),
    );

    // Peer listing, also reachable as /get-list?channel=... from the web UI.
    let table = Arc::clone(&peers);
    router.register(
        Method::GET,
        "/get-list",
        Box::new(move |_headers: &Headers, _body: &Body| {
            let table = table.lock().map_err(|_| anyhow!("peer table poisoned"))?;
            Ok(Payload::Json(json!({ "status": "success", "peers": &*table })))
        }),
    );

    // Liveness probe; plain text rather than the default JSON content type.
    router.register(
        Method::GET,
        "/health",
        Box::new(|_headers: &Headers, _body: &Body| {
            Ok(Payload::Typed {
                content_type: "text/plain".to_string(),
                body: b"ok".to_vec(),
            })
        }),
    );

    let site = SiteConfig::new(config.web_root.clone(), &config.username, &config.password);
    let server = Server::bind(&config.addr(), router, site, config.workers)?;
    info!("tracker demo ready on http://{}", server.local_addr()?);
    server.run()
}
