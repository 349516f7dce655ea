//! Container identity and runtime spec derived from a server record.
//!
//! Both functions here are pure: the same record always yields the same name
//! and the same spec, and nothing is read from or written to the engine.

use minehost_store::{Edition, ServerId, ServerRecord};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

pub const JAVA_IMAGE: &str = "itzg/minecraft-server";
pub const BEDROCK_IMAGE: &str = "itzg/minecraft-bedrock-server";
pub const JAVA_GAME_PORT: &str = "25565/tcp";
pub const BEDROCK_GAME_PORT: &str = "19132/udp";
pub const SERVER_MEMORY: &str = "2G";
pub const RESTART_POLICY: &str = "unless-stopped";

const NAME_PREFIX: &str = "minecraft-";

/// Engine-side container name of a server. Never stored; always recomputed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContainerName(String);

impl ContainerName {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContainerName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub fn container_name(id: &ServerId) -> ContainerName {
    ContainerName(format!("{NAME_PREFIX}{id}"))
}

/// Body of the engine's create call.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct ContainerSpec {
    pub image: String,
    pub env: Vec<String>,
    pub exposed_ports: BTreeMap<String, ExposedPort>,
    pub host_config: HostConfig,
}

/// Serializes as `{}`, which is what the engine expects per exposed port.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExposedPort {}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct HostConfig {
    pub port_bindings: BTreeMap<String, Vec<PortBinding>>,
    pub restart_policy: RestartPolicy,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct PortBinding {
    pub host_port: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct RestartPolicy {
    pub name: String,
}

impl ContainerSpec {
    /// Value of an environment variable, if set.
    pub fn env_var(&self, key: &str) -> Option<&str> {
        self.env.iter().find_map(|kv| {
            kv.split_once('=')
                .filter(|(k, _)| *k == key)
                .map(|(_, v)| v)
        })
    }
}

pub fn build_spec(record: &ServerRecord) -> ContainerSpec {
    let (image, game_port) = match record.edition {
        Edition::Java => (JAVA_IMAGE, JAVA_GAME_PORT),
        Edition::Bedrock => (BEDROCK_IMAGE, BEDROCK_GAME_PORT),
    };

    let env = vec![
        "EULA=TRUE".to_owned(),
        format!("VERSION={}", record.version),
        format!("MEMORY={SERVER_MEMORY}"),
        format!("MAX_PLAYERS={}", record.max_players),
        format!("MOTD=Welcome to {}", record.name),
        "ONLINE_MODE=FALSE".to_owned(),
    ];

    let mut exposed_ports = BTreeMap::new();
    exposed_ports.insert(game_port.to_owned(), ExposedPort::default());

    let mut port_bindings = BTreeMap::new();
    port_bindings.insert(
        game_port.to_owned(),
        vec![PortBinding {
            host_port: record.port.to_string(),
        }],
    );

    ContainerSpec {
        image: image.to_owned(),
        env,
        exposed_ports,
        host_config: HostConfig {
            port_bindings,
            restart_policy: RestartPolicy {
                name: RESTART_POLICY.to_owned(),
            },
        },
    }
}
