use crate::StoreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// First game port handed out to a new server.
pub const PORT_RANGE_START: u16 = 25565;
/// Last game port handed out to a new server.
pub const PORT_RANGE_END: u16 = 35565;
/// The rcon port of a server sits this far above its game port.
pub const RCON_PORT_OFFSET: u16 = 10000;

const MAX_ID_LEN: usize = 64;

/// Opaque server identifier.
///
/// Restricted to `[A-Za-z0-9_-]{1,64}` because it is embedded in file names
/// and container names.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ServerId(String);

impl ServerId {
    pub fn parse(raw: &str) -> Result<Self, StoreError> {
        if raw.is_empty() || raw.len() > MAX_ID_LEN {
            return Err(StoreError::InvalidId(format!(
                "server id must be 1-{MAX_ID_LEN} characters"
            )));
        }
        if !raw
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
        {
            return Err(StoreError::InvalidId(format!(
                "server id '{raw}' must match [a-zA-Z0-9_-]"
            )));
        }
        Ok(Self(raw.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ServerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ServerId {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ServerId {
    type Error = StoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ServerId> for String {
    fn from(id: ServerId) -> Self {
        id.0
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Edition {
    Java,
    Bedrock,
}

impl fmt::Display for Edition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Edition::Java => write!(f, "java"),
            Edition::Bedrock => write!(f, "bedrock"),
        }
    }
}

impl FromStr for Edition {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "java" => Ok(Edition::Java),
            "bedrock" => Ok(Edition::Bedrock),
            other => Err(StoreError::InvalidRecord(format!(
                "unknown edition '{other}' (expected java or bedrock)"
            ))),
        }
    }
}

/// Persisted server status. A record with no status has never been acted on.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ServerStatus {
    Creating,
    Starting,
    Online,
    Offline,
}

impl ServerStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ServerStatus::Creating => "creating",
            ServerStatus::Starting => "starting",
            ServerStatus::Online => "online",
            ServerStatus::Offline => "offline",
        }
    }
}

impl fmt::Display for ServerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServerRecord {
    pub id: ServerId,
    pub owner: String,
    pub name: String,
    pub ip: String,
    pub edition: Edition,
    pub version: String,
    pub port: u16,
    pub rcon_port: u16,
    pub max_players: u32,
    #[serde(default)]
    pub status: Option<ServerStatus>,
    pub created_at: String,
    pub updated_at: String,
    /// blake3 checksum over the record with this field cleared.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checksum: Option<String>,
}

impl ServerRecord {
    pub(crate) fn compute_checksum(&self) -> Result<String, StoreError> {
        let mut copy = self.clone();
        copy.checksum = None;
        let json = serde_json::to_string_pretty(&copy)?;
        Ok(blake3::hash(json.as_bytes()).to_hex().to_string())
    }

    pub(crate) fn with_checksum(&self) -> Result<Self, StoreError> {
        let mut sealed = self.clone();
        sealed.checksum = Some(self.compute_checksum()?);
        Ok(sealed)
    }

    /// Fails with [`StoreError::IntegrityFailure`] when a stored checksum no
    /// longer matches the content. Records without a checksum pass.
    pub(crate) fn verify(&self) -> Result<(), StoreError> {
        if let Some(ref expected) = self.checksum {
            let actual = self.compute_checksum()?;
            if actual != *expected {
                return Err(StoreError::IntegrityFailure {
                    id: self.id.to_string(),
                    expected: expected.clone(),
                    actual,
                });
            }
        }
        Ok(())
    }
}

/// Fields supplied by a tenant when registering a server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewServer {
    pub owner: String,
    pub name: String,
    pub ip: String,
    pub edition: Edition,
    pub version: String,
    pub max_players: u32,
}

impl NewServer {
    pub fn validate(&self) -> Result<(), StoreError> {
        if self.name.trim().is_empty() || self.ip.trim().is_empty() {
            return Err(StoreError::InvalidRecord(
                "name and ip are required".to_owned(),
            ));
        }
        if self.owner.trim().is_empty() {
            return Err(StoreError::InvalidRecord("owner is required".to_owned()));
        }
        if self.max_players == 0 {
            return Err(StoreError::InvalidRecord(
                "max players must be at least 1".to_owned(),
            ));
        }
        Ok(())
    }

    pub(crate) fn into_record(self, id: ServerId, port: u16, now: &str) -> ServerRecord {
        ServerRecord {
            id,
            owner: self.owner,
            name: self.name,
            ip: self.ip,
            edition: self.edition,
            version: self.version,
            port,
            rcon_port: port + RCON_PORT_OFFSET,
            max_players: self.max_players,
            status: None,
            created_at: now.to_owned(),
            updated_at: now.to_owned(),
            checksum: None,
        }
    }
}

/// Lowest game port in the allocation range not already in `used`.
pub fn allocate_port(used: &[u16]) -> Result<u16, StoreError> {
    (PORT_RANGE_START..=PORT_RANGE_END)
        .find(|p| !used.contains(p))
        .ok_or(StoreError::PortsExhausted {
            start: PORT_RANGE_START,
            end: PORT_RANGE_END,
        })
}

/// Next sequential id: one past the largest numeric id in use.
pub(crate) fn next_id<'a>(existing: impl Iterator<Item = &'a ServerId>) -> ServerId {
    let next = existing
        .filter_map(|id| id.as_str().parse::<u64>().ok())
        .max()
        .map_or(1, |max| max + 1);
    ServerId(next.to_string())
}

/// Newest first; ties broken by id so listings are stable.
pub(crate) fn sort_newest_first(records: &mut [ServerRecord]) {
    records.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| b.id.cmp(&a.id))
    });
}
