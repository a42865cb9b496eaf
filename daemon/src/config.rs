use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};

use networks::NetworkParams;
use thiserror::Error;

/// File name of the daemon configuration inside the data directory.
pub const DAEMON_CONFIG_FILE: &str = "bitcoin.conf";

/// A single value from the daemon configuration file.
///
/// Numeric-looking values are parsed as integers so that ports and
/// flags can be consumed without re-parsing at every call site;
/// everything else stays text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigValue {
    Int(i64),
    Text(String),
}

impl ConfigValue {
    pub fn as_int(&self) -> Option<i64> {
        match self {
            ConfigValue::Int(n) => Some(*n),
            ConfigValue::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            ConfigValue::Int(_) => None,
            ConfigValue::Text(s) => Some(s),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read daemon config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Parses the daemon configuration file under `data_dir`.
///
/// Lines are `key=value` pairs; blank lines and `#` comments are
/// skipped. When a key appears more than once the later occurrence
/// wins. A missing file is an error: a node pointed at a data
/// directory without its daemon config is misconfigured, and silently
/// running on defaults would hide that.
pub fn load_daemon_config(data_dir: &Path) -> Result<BTreeMap<String, ConfigValue>, ConfigError> {
    let path = data_dir.join(DAEMON_CONFIG_FILE);
    let raw = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
        path: path.clone(),
        source,
    })?;

    let mut values = BTreeMap::new();
    for line in raw.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let key = key.trim().to_string();
        let value = value.trim();
        let value = match value.parse::<i64>() {
            Ok(n) => ConfigValue::Int(n),
            Err(_) => ConfigValue::Text(value.to_string()),
        };
        values.insert(key, value);
    }
    Ok(values)
}

/// Normalized daemon settings after merging every source.
///
/// Precedence is explicit overrides, then the daemon config file, then
/// the network defaults.
#[derive(Debug, Clone)]
pub struct NodeConfig {
    pub network: String,
    pub data_dir: PathBuf,
    pub port: u16,
    pub rpc_port: u16,
    pub rpc_user: Option<String>,
    pub rpc_password: Option<String>,
    pub extra: BTreeMap<String, ConfigValue>,
}

impl NodeConfig {
    /// Merges explicit overrides, file values and network defaults.
    pub fn build(
        params: &NetworkParams,
        data_dir: PathBuf,
        file: BTreeMap<String, ConfigValue>,
        overrides: BTreeMap<String, ConfigValue>,
    ) -> Self {
        let mut merged = file;
        for (key, value) in overrides {
            merged.insert(key, value);
        }

        let port = take_port(&mut merged, "port").unwrap_or(params.default_port);
        let rpc_port = take_port(&mut merged, "rpcport").unwrap_or(params.rpc_port);
        let rpc_user = take_text(&mut merged, "rpcuser");
        let rpc_password = take_text(&mut merged, "rpcpassword");

        Self {
            network: params.name.clone(),
            data_dir,
            port,
            rpc_port,
            rpc_user,
            rpc_password,
            extra: merged,
        }
    }

    pub fn get(&self, key: &str) -> Option<&ConfigValue> {
        self.extra.get(key)
    }
}

fn take_port(values: &mut BTreeMap<String, ConfigValue>, key: &str) -> Option<u16> {
    let port = values.get(key)?.as_int()?;
    values.remove(key);
    u16::try_from(port).ok()
}

fn take_text(values: &mut BTreeMap<String, ConfigValue>, key: &str) -> Option<String> {
    match values.remove(key)? {
        ConfigValue::Text(s) => Some(s),
        ConfigValue::Int(n) => Some(n.to_string()),
    }
}
