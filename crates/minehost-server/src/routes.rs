use crate::App;
use minehost_core::{Action, CoreError, CreateOutcome, LifecycleState, Manager, Outcome};
use minehost_store::{Edition, LogEntry, NewServer, ServerId, ServerRecord};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tiny_http::Method;
use tracing::error;

/// Tenant assumed when a request carries no `X-User-Id` header.
pub const DEFAULT_OWNER: &str = "demo-user";
/// Maximum number of log entries returned by `GET /logs`.
pub const LOG_LIMIT: usize = 100;
const DEFAULT_VERSION: &str = "1.20.1";
const DEFAULT_MAX_PLAYERS: u32 = 20;

const PREFLIGHT_HEADERS: &[(&str, &str)] = &[
    ("Access-Control-Allow-Methods", "GET, POST, OPTIONS"),
    ("Access-Control-Allow-Headers", "Content-Type, X-User-Id"),
    ("Access-Control-Max-Age", "86400"),
];

/// A routed response before it is written to the socket.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub code: u16,
    /// `None` sends an empty body.
    pub body: Option<Value>,
    pub extra_headers: &'static [(&'static str, &'static str)],
}

impl Reply {
    fn json(code: u16, body: Value) -> Self {
        Self {
            code,
            body: Some(body),
            extra_headers: &[],
        }
    }

    fn ok(body: Value) -> Self {
        Self::json(200, body)
    }

    fn error(code: u16, msg: impl Into<String>) -> Self {
        Self::json(code, json!({ "error": msg.into() }))
    }

    fn preflight() -> Self {
        Self {
            code: 200,
            body: None,
            extra_headers: PREFLIGHT_HEADERS,
        }
    }

    fn method_not_allowed() -> Self {
        Self::error(405, "Method not allowed")
    }
}

/// The parts of an HTTP request the routes look at.
pub struct Incoming<'a> {
    pub method: &'a Method,
    pub url: &'a str,
    pub user: Option<&'a str>,
    pub body: &'a [u8],
}

/// Dispatch one request.
pub fn route(app: &App, req: &Incoming<'_>) -> Reply {
    let (path, query) = req.url.split_once('?').unwrap_or((req.url, ""));

    if *req.method == Method::Options {
        return Reply::preflight();
    }
    if path == "/health" {
        return match req.method {
            Method::Get => Reply::ok(json!({ "status": "ok" })),
            _ => Reply::method_not_allowed(),
        };
    }

    let allowed = match path {
        "/containers" | "/servers" => matches!(req.method, Method::Get | Method::Post),
        "/logs" => *req.method == Method::Get,
        _ => return Reply::error(404, "Not found"),
    };
    if !allowed {
        return Reply::method_not_allowed();
    }

    let Some(manager) = app.manager() else {
        return Reply::error(500, "Database not configured");
    };

    match (path, req.method) {
        ("/containers", Method::Post) => container_action(manager, req.body),
        ("/containers", _) => container_status(manager, query),
        ("/servers", Method::Post) => register_server(manager, req.user, req.body),
        ("/servers", _) => list_servers(manager, req.user),
        _ => server_logs(manager, query),
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ActionRequest {
    #[serde(default)]
    server_id: Value,
    #[serde(default)]
    action: Option<String>,
}

fn container_action(manager: &Manager, body: &[u8]) -> Reply {
    let request: ActionRequest = match parse_body(body) {
        Ok(r) => r,
        Err(reply) => return reply,
    };
    let action = request.action.filter(|a| !a.is_empty());
    let (false, Some(action)) = (request.server_id.is_null(), action) else {
        return Reply::error(400, "serverId and action required");
    };

    let id = match server_id_from_json(&request.server_id) {
        Ok(id) => id,
        Err(reply) => return reply,
    };
    let action: Action = match action.parse() {
        Ok(a) => a,
        Err(e) => return core_error(e),
    };

    let outcome = match manager.apply(&id, action) {
        Ok(o) => o,
        Err(e) => return core_error(e),
    };
    let message = outcome.message();

    match outcome {
        Outcome::Created(CreateOutcome::Provisioned { container_id, port }) => Reply::ok(json!({
            "status": "success",
            "containerId": container_id.short(),
            "message": message,
            "port": port,
        })),
        Outcome::Created(CreateOutcome::Degraded { error }) => Reply::json(
            500,
            json!({
                "error": error,
                "message": message,
                "simulation": true,
            }),
        ),
        Outcome::Applied(applied) => {
            let mut body = json!({
                "status": applied.status.as_str(),
                "message": message,
            });
            if applied.simulated {
                body["simulation"] = Value::Bool(true);
            }
            Reply::ok(body)
        }
    }
}

fn container_status(manager: &Manager, query: &str) -> Reply {
    let Some(raw) = query_param(query, "serverId") else {
        return Reply::error(400, "serverId required");
    };
    let id = match ServerId::parse(&raw) {
        Ok(id) => id,
        Err(e) => return core_error(e.into()),
    };

    match manager.status(&id) {
        Ok(observed) if observed.simulated => Reply::ok(json!({
            "status": observed.status.as_str(),
            "simulation": true,
        })),
        Ok(observed) => Reply::ok(json!({
            "status": observed.status.as_str(),
            "containerId": observed.container_id,
            "uptime": observed.runtime_status,
        })),
        Err(e) => core_error(e),
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RegisterRequest {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    ip: Option<String>,
    #[serde(default)]
    edition: Option<String>,
    #[serde(default)]
    version: Option<String>,
    #[serde(default)]
    max_players: Value,
}

fn register_server(manager: &Manager, user: Option<&str>, body: &[u8]) -> Reply {
    let request: RegisterRequest = match parse_body(body) {
        Ok(r) => r,
        Err(reply) => return reply,
    };
    let name = request.name.unwrap_or_default();
    let ip = request.ip.unwrap_or_default();
    if name.trim().is_empty() || ip.trim().is_empty() {
        return Reply::error(400, "Name and IP are required");
    }

    let edition = match request.edition.as_deref().map(str::parse::<Edition>) {
        None => Edition::Java,
        Some(Ok(edition)) => edition,
        Some(Err(e)) => return core_error(e.into()),
    };
    let max_players = match &request.max_players {
        Value::Null => DEFAULT_MAX_PLAYERS,
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()).unwrap_or(0),
        Value::String(s) => s.trim().parse().unwrap_or(0),
        _ => 0,
    };
    if max_players == 0 {
        return Reply::error(400, "maxPlayers must be a positive integer");
    }

    let new = NewServer {
        owner: user.unwrap_or(DEFAULT_OWNER).to_owned(),
        name,
        ip,
        edition,
        version: request
            .version
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_VERSION.to_owned()),
        max_players,
    };

    match manager.register(&new) {
        Ok(record) => Reply::json(201, json!({ "server": server_json(&record) })),
        Err(e) => core_error(e),
    }
}

fn list_servers(manager: &Manager, user: Option<&str>) -> Reply {
    match manager.list(user.unwrap_or(DEFAULT_OWNER)) {
        Ok(records) => {
            let servers: Vec<Value> = records.iter().map(server_json).collect();
            Reply::ok(json!({ "servers": servers }))
        }
        Err(e) => core_error(e),
    }
}

fn server_logs(manager: &Manager, query: &str) -> Reply {
    let Some(raw) = query_param(query, "serverId") else {
        return Reply::error(400, "Server ID is required");
    };
    let id = match ServerId::parse(&raw) {
        Ok(id) => id,
        Err(e) => return core_error(e.into()),
    };

    match manager.logs(&id, LOG_LIMIT) {
        Ok(entries) => {
            let logs: Vec<Value> = entries.iter().map(log_json).collect();
            Reply::ok(json!({ "logs": logs }))
        }
        Err(e) => core_error(e),
    }
}

fn server_json(record: &ServerRecord) -> Value {
    json!({
        "id": record.id.as_str(),
        "name": record.name,
        "ip": record.ip,
        "edition": record.edition,
        "version": record.version,
        "status": LifecycleState::from(record.status).as_str(),
        "players": { "current": 0, "max": record.max_players },
        "port": record.port,
    })
}

fn log_json(entry: &LogEntry) -> Value {
    json!({
        "type": entry.kind,
        "message": entry.message,
        "timestamp": entry.created_at,
    })
}

fn core_error(e: CoreError) -> Reply {
    match e {
        CoreError::Validation(msg) => Reply::error(400, msg),
        CoreError::NotFound(_) => Reply::error(404, "Server not found"),
        CoreError::Store(e) => {
            error!("store failure: {e}");
            Reply::error(500, e.to_string())
        }
        CoreError::Config(msg) => {
            error!("configuration error: {msg}");
            Reply::error(500, msg)
        }
    }
}

/// An empty body reads as `{}`.
fn parse_body<T: DeserializeOwned>(body: &[u8]) -> Result<T, Reply> {
    let body = if body.iter().all(u8::is_ascii_whitespace) {
        b"{}".as_slice()
    } else {
        body
    };
    serde_json::from_slice(body).map_err(|_| Reply::error(400, "Invalid JSON body"))
}

/// `serverId` may arrive as a JSON string or an integer.
fn server_id_from_json(value: &Value) -> Result<ServerId, Reply> {
    let raw = match value {
        Value::String(s) => s.clone(),
        Value::Number(n) if n.is_i64() || n.is_u64() => n.to_string(),
        _ => return Err(Reply::error(400, "serverId must be a string or an integer")),
    };
    ServerId::parse(&raw).map_err(|e| core_error(e.into()))
}

fn query_param(query: &str, key: &str) -> Option<String> {
    query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(k, _)| *k == key)
        .map(|(_, v)| percent_decode(v))
        .filter(|v| !v.is_empty())
}

/// Decode `%XX` escapes and `+` in a query value. Malformed escapes are kept
/// as written.
fn percent_decode(raw: &str) -> String {
    let bytes = raw.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'%' if i + 2 < bytes.len() => {
                match std::str::from_utf8(&bytes[i + 1..i + 3])
                    .ok()
                    .filter(|hex| hex.bytes().all(|c| c.is_ascii_hexdigit()))
                    .and_then(|hex| u8::from_str_radix(hex, 16).ok())
                {
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
            b'+' => {
                out.push(b' ');
                i += 1;
            }
            b => {
                out.push(b);
                i += 1;
            }
        }
    }
    String::from_utf8_lossy(&out).into_owned()
}
