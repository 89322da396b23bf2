use std::path::PathBuf;

use clap::Parser;

/// CLI configuration for the demo tracker binary.
///
/// The binding address and port are the only values the engine itself needs
/// from the outside; everything else parameterizes the demo site. All flags
/// can also come from the environment.
#[derive(Debug, Clone, Parser)]
#[command(name = "weblet")]
#[command(about = "Minimal HTTP/1.1 server engine with a tracker/chat demo")]
#[command(version)]
pub struct Config {
    /// Host/IP to listen on
    #[arg(long, default_value = "127.0.0.1", env = "WEBLET_HOST")]
    pub host: String,

    /// Port to listen on
    #[arg(short, long, default_value = "8000", env = "WEBLET_PORT")]
    pub port: u16,

    /// Directory containing the www/, static/ and apps/ trees
    #[arg(long = "web-root", default_value = ".", env = "WEBLET_WEB_ROOT")]
    pub web_root: PathBuf,

    /// Number of connection worker threads
    #[arg(long, default_value = "10", env = "WEBLET_WORKERS")]
    pub workers: usize,

    /// Username accepted by the login gate
    #[arg(long, default_value = "admin", env = "WEBLET_USERNAME")]
    pub username: String,

    /// Password accepted by the login gate
    #[arg(long, default_value = "password", env = "WEBLET_PASSWORD")]
    pub password: String,
}

impl Config {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
