//! TOML configuration for the operator directory daemon.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use opdir_remote::DEFAULT_CACHE_FOR;
use opdir_store::DatastoreConfig;
use serde::Deserialize;

/// Top-level configuration, parsed from TOML.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Listener settings for `serve`.
    pub node: NodeSection,
    /// Record datastore backend for a local directory.
    pub storage: DatastoreConfig,
    /// Whether queries go to a local log or a remote authority.
    pub directory: DirectorySection,
    /// Trust anchors for signer certificates.
    pub trust: TrustSection,
    /// Identity used by `submit-records` and `sign`.
    pub signing: SigningSection,
    /// Logging configuration.
    pub log: LogSection,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            node: NodeSection::default(),
            storage: DatastoreConfig::File {
                path: default_data_dir().join("records.log"),
            },
            directory: DirectorySection::default(),
            trust: TrustSection::default(),
            signing: SigningSection::default(),
            log: LogSection::default(),
        }
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|d| d.join("opdir"))
        .unwrap_or_else(|| PathBuf::from(".opdir"))
}

/// `[node]` section.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct NodeSection {
    /// Address the JSON-RPC server binds to.
    pub listen_addr: String,
    /// Seconds between re-reads of the datastore while serving. Picks up
    /// records written by other processes sharing the same store.
    pub update_interval: u64,
}

impl Default for NodeSection {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:4830".to_string(),
            update_interval: 10,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DirectoryMode {
    /// Open the configured datastore and act as the authority.
    #[default]
    Local,
    /// Follow a remote authority over JSON-RPC.
    Remote,
}

/// `[directory]` section.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DirectorySection {
    pub mode: DirectoryMode,
    /// JSON-RPC endpoint of the authority, e.g. `http://host:4830/jsonrpc`.
    pub endpoint: String,
    /// Freshness window of the follower cache, in seconds.
    pub cache_entries_for: u64,
}

impl Default for DirectorySection {
    fn default() -> Self {
        Self {
            mode: DirectoryMode::Local,
            endpoint: String::new(),
            cache_entries_for: DEFAULT_CACHE_FOR.as_secs(),
        }
    }
}

impl DirectorySection {
    pub fn cache_for(&self) -> Duration {
        Duration::from_secs(self.cache_entries_for)
    }
}

/// `[trust]` section. Each path holds one certificate as JSON.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct TrustSection {
    pub roots: Vec<PathBuf>,
    pub intermediates: Vec<PathBuf>,
}

/// `[signing]` section.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SigningSection {
    /// Identity file written by `opdird keygen`.
    pub identity: Option<PathBuf>,
}

/// `[log]` section.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LogSection {
    /// Log level filter (e.g. `"info"`, `"debug"`, `"warn"`).
    pub level: String,
}

impl Default for LogSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl CliConfig {
    /// Load config from a TOML file, or use defaults if no path given.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            Some(p) => {
                let content = std::fs::read_to_string(p)
                    .with_context(|| format!("failed to read {}", p.display()))?;
                Ok(toml::from_str(&content)?)
            }
            None => Ok(Self::default()),
        }
    }

    #[cfg(test)]
    pub fn from_toml(s: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(s)?)
    }
}
