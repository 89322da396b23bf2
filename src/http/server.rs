use std::io::{Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use log::{debug, error, info, warn};

use crate::concurrency::ThreadPool;
use crate::http::BUFFER_SIZE;
use crate::http::content::{self, SiteConfig};
use crate::http::method::Method;
use crate::http::request::Request;
use crate::http::response;
use crate::http::router::Router;

const IO_TIMEOUT: Duration = Duration::from_secs(5);

/// Accept loop plus per-connection lifecycle. The router and site config are
/// frozen at bind time; workers only ever read them.
pub struct Server {
    listener: TcpListener,
    router: Router,
    site: SiteConfig,
    pool: ThreadPool,
}

impl Server {
    pub fn bind(
        addr: &str,
        router: Router,
        site: SiteConfig,
        workers: usize,
    ) -> anyhow::Result<Server> {
        let listener =
            TcpListener::bind(addr).with_context(|| format!("can't bind address {addr}"))?;
        Ok(Server {
            listener,
            router,
            site,
            pool: ThreadPool::new(workers),
        })
    }

    pub fn local_addr(&self) -> anyhow::Result<SocketAddr> {
        self.listener.local_addr().context("no local address")
    }

    /// Runs the accept loop forever, handing each accepted connection to a
    /// pool worker. A failure on one connection never reaches another or the
    /// loop itself.
    pub fn run(self) -> anyhow::Result<()> {
        info!(
            "listening on {}",
            self.listener.local_addr().context("no local address")?
        );

        let server = Arc::new(self);
        for stream in server.listener.incoming() {
            match stream {
                Ok(stream) => {
                    let worker_server = Arc::clone(&server);
                    server
                        .pool
                        .execute(move || worker_server.handle_connection(stream));
                }
                Err(err) => warn!("accept failed: {err}"),
            }
        }
        Ok(())
    }

    fn handle_connection(&self, mut stream: TcpStream) {
        let peer = stream
            .peer_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| String::from("<unknown>"));
        debug!("accepted connection from {peer}");

        if let Err(err) = self.serve_one(&mut stream) {
            warn!("[{peer}] {err:#}");
        }
        // Dropping the stream here closes the connection on every path.
    }

    /// Read, parse, route, respond. Exactly one request per connection;
    /// `Connection: close` is always implied.
    fn serve_one(&self, stream: &mut TcpStream) -> anyhow::Result<()> {
        stream
            .set_read_timeout(Some(IO_TIMEOUT))
            .context("failed to set read timeout")?;
        stream
            .set_write_timeout(Some(IO_TIMEOUT))
            .context("failed to set write timeout")?;

        // One read into a fixed buffer; a request larger than BUFFER_SIZE is
        // truncated. Capacity limit kept from the original daemon.
        let mut buf = [0u8; BUFFER_SIZE];
        let n = stream.read(&mut buf).context("failed to receive request")?;
        let raw = String::from_utf8_lossy(&buf[..n]);

        if raw.trim().is_empty() {
            debug!("empty request, closing without a response");
            return Ok(());
        }

        let request = match Request::parse(&raw, &self.router) {
            Ok(request) => request,
            Err(err) => {
                warn!("invalid request: {err}");
                stream
                    .write_all(&response::bad_request())
                    .context("failed to send 400")?;
                return Ok(());
            }
        };

        info!("{} {}", request.method, request.path);

        // CORS preflight is answered before any routing.
        if request.method == Method::OPTIONS {
            stream
                .write_all(&response::preflight())
                .context("failed to send preflight")?;
            return Ok(());
        }

        let bytes = match request.hook {
            Some(hook) => match hook(&request.headers, request.handler_body().as_ref()) {
                Ok(payload) => response::build_dynamic(&request, payload),
                Err(err) => {
                    error!(
                        "handler for {} {} failed: {err:#}",
                        request.method, request.path
                    );
                    response::build_error(&request, &err.to_string())
                }
            },
            None => content::resolve(&self.site, &request),
        };

        stream
            .write_all(&bytes)
            .context("failed to send response")?;
        Ok(())
    }
}
