//! HTTP API for minehost.
//!
//! Routes lifecycle actions (`POST /containers`), status queries
//! (`GET /containers`), server registration and listing (`/servers`), and the
//! audit log (`GET /logs`) to a [`Manager`]. Every response carries
//! `Access-Control-Allow-Origin: *`. Each request is handled on its own thread.
//!
//! The [`TestServer`] helper starts a server on a random port for integration testing.

pub mod routes;

pub use routes::{route, Incoming, Reply, DEFAULT_OWNER, LOG_LIMIT};

use minehost_core::{CoreError, HostConfig, Manager};
use std::sync::Arc;
use std::thread;
use tiny_http::{Header, Request, Response, Server, StatusCode};
use tracing::{debug, info, warn};

/// Shared request-handling state. Without a manager (no data directory
/// configured) the store-backed routes answer 500.
pub struct App {
    manager: Option<Manager>,
}

impl App {
    pub fn new(manager: Option<Manager>) -> Self {
        Self { manager }
    }

    pub fn from_config(config: &HostConfig) -> Result<Self, CoreError> {
        Ok(Self::new(Manager::from_config(config)?))
    }

    pub fn manager(&self) -> Option<&Manager> {
        self.manager.as_ref()
    }
}

fn header(name: &str, value: &str) -> Header {
    Header::from_bytes(name, value).expect("valid header")
}

fn header_value(req: &Request, name: &'static str) -> Option<String> {
    req.headers()
        .iter()
        .find(|h| h.field.equiv(name))
        .map(|h| h.value.as_str().to_owned())
}

fn respond(req: Request, reply: &Reply) {
    let data = reply
        .body
        .as_ref()
        .map(|body| serde_json::to_vec(body).unwrap_or_default())
        .unwrap_or_default();

    let mut response = Response::from_data(data)
        .with_status_code(StatusCode(reply.code))
        .with_header(header("Access-Control-Allow-Origin", "*"));
    if reply.body.is_some() {
        response.add_header(header("Content-Type", "application/json"));
    }
    for (name, value) in reply.extra_headers {
        response.add_header(header(name, value));
    }

    if let Err(e) = req.respond(response) {
        debug!("client went away before the response was sent: {e}");
    }
}

/// Handle a single HTTP request, dispatching to the appropriate route handler.
pub fn handle_request(app: &App, mut req: Request) {
    let method = req.method().clone();
    let url = req.url().to_owned();
    let user = header_value(&req, "X-User-Id");
    debug!("{method} {url}");

    let mut body = Vec::new();
    if let Err(e) = req.as_reader().read_to_end(&mut body) {
        warn!("{method} {url}: failed to read body: {e}");
        respond(
            req,
            &Reply {
                code: 400,
                body: Some(serde_json::json!({ "error": "Unreadable request body" })),
                extra_headers: &[],
            },
        );
        return;
    }

    let reply = route(
        app,
        &Incoming {
            method: &method,
            url: &url,
            user: user.as_deref(),
            body: &body,
        },
    );
    debug!("{method} {url} -> {}", reply.code);
    respond(req, &reply);
}

/// Serve until `server` is unblocked, one thread per request.
pub fn serve(app: &Arc<App>, server: &Server) {
    for request in server.incoming_requests() {
        let app = Arc::clone(app);
        thread::spawn(move || handle_request(&app, request));
    }
    info!("request loop stopped");
}

/// A test helper that serves an [`App`] on a random port in a background thread.
///
/// The server listens on `127.0.0.1:{port}`. Dropping the `TestServer` stops
/// the loop (via `Server::unblock`) and joins it.
pub struct TestServer {
    pub url: String,
    pub port: u16,
    server: Arc<Server>,
    handle: Option<thread::JoinHandle<()>>,
}

impl TestServer {
    pub fn start(app: App) -> Self {
        let server =
            Arc::new(Server::http("127.0.0.1:0").expect("failed to bind test HTTP server"));
        let port = server.server_addr().to_ip().expect("not an IP addr").port();
        let url = format!("http://127.0.0.1:{port}");

        let app = Arc::new(app);
        let srv = Arc::clone(&server);
        let handle = thread::spawn(move || serve(&app, &srv));

        Self {
            url,
            port,
            server,
            handle: Some(handle),
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.server.unblock();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}
