use std::fs;
use std::path::PathBuf;

use alloy::primitives::Address;
use serde::Deserialize;
use tracing::warn;

use crate::core::{ConnectSettings, DEFAULT_REGISTRY_ADDRESS};
use crate::domain::audit::AUDIT_MANAGER_NAME;
use crate::infrastructure::ethereum::ProviderConfig;
use crate::infrastructure::wallet::WalletEndpoint;

#[derive(Debug, Clone, Deserialize)]
pub struct EndpointConfig {
    pub name: Option<String>,
    pub rpc: Option<String>,
    pub ipc: Option<String>,
    /// Endpoint is a MetaMask bridge
    #[serde(default)]
    pub metamask: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub endpoints: Vec<EndpointConfig>,

    #[serde(default = "default_registry_address")]
    pub registry_address: Address,

    #[serde(default = "default_manager_name")]
    pub manager_name: String,

    #[serde(default)]
    pub require_metamask: bool,

    #[serde(default)]
    pub abi_paths: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoints: Vec::new(),
            registry_address: default_registry_address(),
            manager_name: default_manager_name(),
            require_metamask: false,
            abi_paths: Vec::new(),
        }
    }
}

fn default_registry_address() -> Address {
    DEFAULT_REGISTRY_ADDRESS
}

fn default_manager_name() -> String {
    AUDIT_MANAGER_NAME.to_string()
}

impl EndpointConfig {
    /// IPC wins over RPC when both are set
    pub fn wallet_endpoint(&self) -> Option<WalletEndpoint> {
        let ipc = self.ipc.as_deref().map(str::trim).filter(|p| !p.is_empty());
        let rpc = self.rpc.as_deref().map(str::trim).filter(|u| !u.is_empty());
        let config = match (ipc, rpc) {
            #[cfg(unix)]
            (Some(ipc), _) => ProviderConfig::Ipc(expand_home(ipc)),
            (_, Some(rpc)) => ProviderConfig::from_url(rpc),
            _ => return None,
        };
        Some(WalletEndpoint {
            config,
            name: self.name.clone().filter(|name| !name.trim().is_empty()),
            metamask: self.metamask,
        })
    }
}

impl Config {
    /// First usable endpoint
    pub fn wallet_endpoint(&self) -> Option<WalletEndpoint> {
        self.endpoints.iter().find_map(EndpointConfig::wallet_endpoint)
    }

    pub fn connect_settings(&self) -> ConnectSettings {
        ConnectSettings {
            registry_address: self.registry_address,
            manager_name: self.manager_name.clone(),
            require_metamask: self.require_metamask,
        }
    }

    pub fn abi_roots(&self) -> Vec<PathBuf> {
        self.abi_paths
            .iter()
            .map(|path| expand_home(path))
            .collect()
    }
}

pub fn load() -> Config {
    let Some(path) = config_path() else {
        return Config::default();
    };
    let content = match fs::read_to_string(&path) {
        Ok(content) => content,
        Err(_) => return Config::default(),
    };
    parse(&content).unwrap_or_else(|err| {
        warn!(path = %path.display(), "ignoring invalid config: {err}");
        Config::default()
    })
}

pub fn parse(content: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(content)
}

pub fn config_path() -> Option<PathBuf> {
    if let Some(path) = std::env::var_os("AUDITDESK_CONFIG").map(PathBuf::from) {
        return Some(path);
    }
    if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME").map(PathBuf::from) {
        return Some(xdg.join("auditdesk").join("config.toml"));
    }
    if let Some(home) = std::env::var_os("HOME").map(PathBuf::from) {
        return Some(home.join(".config").join("auditdesk").join("config.toml"));
    }

    directories::ProjectDirs::from("io", "auditdesk", "auditdesk")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}

pub fn data_dir() -> Option<PathBuf> {
    if let Some(xdg) = std::env::var_os("XDG_DATA_HOME").map(PathBuf::from) {
        return Some(xdg.join("auditdesk"));
    }
    if let Some(home) = std::env::var_os("HOME").map(PathBuf::from) {
        return Some(home.join(".local").join("share").join("auditdesk"));
    }
    directories::ProjectDirs::from("io", "auditdesk", "auditdesk")
        .map(|dirs| dirs.data_dir().to_path_buf())
}

pub fn log_path() -> Option<PathBuf> {
    data_dir().map(|dir| dir.join("auditdesk.log"))
}

fn expand_home(path: &str) -> PathBuf {
    match (path.strip_prefix("~/"), std::env::var_os("HOME")) {
        (Some(rest), Some(home)) => PathBuf::from(home).join(rest),
        _ => PathBuf::from(path),
    }
}
