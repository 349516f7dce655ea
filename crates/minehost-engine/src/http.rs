use crate::config::{EngineConfig, EngineTimeouts};
use crate::spec::{ContainerName, ContainerSpec};
use crate::{ContainerEngine, ContainerId, ContainerState, EngineError, LifecycleOp};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

/// HTTP client for the container engine's control API.
///
/// Endpoints used:
/// - `POST /containers/create?name=<name>` with a JSON spec body, returns `{"Id": ...}`
/// - `POST /containers/<id>/start`
/// - `POST /containers/<name>/{start|stop|restart}`
/// - `GET  /containers/<name>/json` returns `{"Id", "State": {"Running", "Status"}}`
///
/// Non-2xx answers become [`EngineError::Status`] with the raw body kept.
pub struct HttpEngine {
    base_url: String,
    timeouts: EngineTimeouts,
    agent: ureq::Agent,
}

#[derive(Deserialize)]
struct CreateResponse {
    #[serde(rename = "Id", default)]
    id: String,
}

#[derive(Deserialize)]
struct InspectResponse {
    #[serde(rename = "Id", default)]
    id: String,
    #[serde(rename = "State", default)]
    state: InspectState,
}

#[derive(Deserialize)]
struct InspectState {
    #[serde(rename = "Running", default)]
    running: bool,
    #[serde(rename = "Status", default = "unknown_status")]
    status: String,
}

impl Default for InspectState {
    fn default() -> Self {
        Self {
            running: false,
            status: unknown_status(),
        }
    }
}

fn unknown_status() -> String {
    "unknown".to_owned()
}

impl HttpEngine {
    pub fn new(config: &EngineConfig) -> Self {
        let agent_config = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .build();
        Self {
            base_url: config.base_url().to_owned(),
            timeouts: config.timeouts,
            agent: ureq::Agent::new_with_config(agent_config),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn do_post(
        &self,
        url: &str,
        body: Option<&[u8]>,
        timeout: Duration,
    ) -> Result<String, EngineError> {
        debug!("POST {url}");
        let req = self
            .agent
            .post(url)
            .config()
            .timeout_global(Some(timeout))
            .build();
        let result = match body {
            Some(data) => req.header("Content-Type", "application/json").send(data),
            None => req.send_empty(),
        };
        Self::read_response(result, timeout)
    }

    fn do_get(&self, url: &str, timeout: Duration) -> Result<String, EngineError> {
        debug!("GET {url}");
        let result = self
            .agent
            .get(url)
            .config()
            .timeout_global(Some(timeout))
            .build()
            .call();
        Self::read_response(result, timeout)
    }

    fn read_response(
        result: Result<ureq::http::Response<ureq::Body>, ureq::Error>,
        timeout: Duration,
    ) -> Result<String, EngineError> {
        let resp = match result {
            Ok(r) => r,
            Err(ureq::Error::Timeout(_)) => return Err(EngineError::Timeout(timeout)),
            Err(e) => return Err(EngineError::Transport(e.to_string())),
        };

        let code = resp.status().as_u16();
        let body = resp
            .into_body()
            .read_to_string()
            .map_err(|e| match e {
                ureq::Error::Timeout(_) => EngineError::Timeout(timeout),
                other => EngineError::Transport(other.to_string()),
            })?;

        if (200..300).contains(&code) {
            Ok(body)
        } else {
            Err(EngineError::Status { code, body })
        }
    }
}

impl ContainerEngine for HttpEngine {
    fn create(
        &self,
        name: &ContainerName,
        spec: &ContainerSpec,
    ) -> Result<ContainerId, EngineError> {
        let url = self.url(&format!("/containers/create?name={name}"));
        let payload =
            serde_json::to_vec(spec).map_err(|e| EngineError::InvalidResponse(e.to_string()))?;
        let body = self.do_post(&url, Some(&payload), self.timeouts.create())?;

        let parsed: CreateResponse = serde_json::from_str(&body)
            .map_err(|e| EngineError::InvalidResponse(format!("create: {e}")))?;
        if parsed.id.is_empty() {
            return Err(EngineError::InvalidResponse(
                "create: response carried no container id".to_owned(),
            ));
        }
        Ok(ContainerId::new(parsed.id))
    }

    fn start(&self, id: &ContainerId) -> Result<(), EngineError> {
        let url = self.url(&format!("/containers/{id}/start"));
        self.do_post(&url, None, self.timeouts.start())?;
        Ok(())
    }

    fn lifecycle(&self, name: &ContainerName, op: LifecycleOp) -> Result<(), EngineError> {
        let url = self.url(&format!("/containers/{name}/{op}"));
        self.do_post(&url, None, self.timeouts.lifecycle())?;
        Ok(())
    }

    fn inspect(&self, name: &ContainerName) -> Result<ContainerState, EngineError> {
        let url = self.url(&format!("/containers/{name}/json"));
        let body = self.do_get(&url, self.timeouts.inspect())?;

        let parsed: InspectResponse = serde_json::from_str(&body)
            .map_err(|e| EngineError::InvalidResponse(format!("inspect: {e}")))?;
        Ok(ContainerState {
            id: ContainerId::new(parsed.id),
            running: parsed.state.running,
            runtime_status: parsed.state.status,
        })
    }
}
