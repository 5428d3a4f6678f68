//! Network configuration
//!
//! Contract addresses, default placeholder values and the access node URL
//! for each network. Overrides are applied once, when the configuration is
//! built, and never re-read per call.

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use melos_cadence::tokens;
use melos_primitives::{Address, ComputeLimit};
use serde::{Deserialize, Serialize};

use crate::SdkError;

/// Override key for the access node URL
pub const ENV_ACCESS_NODE: &str = "MELOS_ACCESS_NODE";
/// Override key for the default compute limit
pub const ENV_LIMIT: &str = "MELOS_LIMIT";
/// Override key prefix for contract addresses
pub const ENV_CONTRACT_PREFIX: &str = "MELOS_CONTRACT_";
/// Override key prefix for placeholder values
pub const ENV_PLACEHOLDER_PREFIX: &str = "MELOS_PLACEHOLDER_";
/// Selects the network for [`NetworkConfig::from_env`]
pub const ENV_NETWORK: &str = "MELOS_NETWORK";

/// Chain network
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    /// Local emulator
    #[default]
    Emulator,
    /// Public testnet
    Testnet,
    /// Mainnet
    Mainnet,
}

impl Network {
    /// Lowercase network name
    pub fn as_str(&self) -> &'static str {
        match self {
            Network::Emulator => "emulator",
            Network::Testnet => "testnet",
            Network::Mainnet => "mainnet",
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Network {
    type Err = SdkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "emulator" | "local" => Ok(Network::Emulator),
            "testnet" => Ok(Network::Testnet),
            "mainnet" => Ok(Network::Mainnet),
            other => Err(SdkError::Config(format!("unknown network '{}'", other))),
        }
    }
}

/// SDK configuration for one network
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Network these settings belong to
    #[serde(default)]
    pub network: Network,
    /// Access node REST endpoint
    #[serde(default = "default_access_node")]
    pub access_node: String,
    /// Compute limit used when an interaction sets none
    #[serde(default = "default_limit")]
    pub default_limit: ComputeLimit,
    /// Delay between transaction status polls
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Contract name to address, used for import rewriting
    #[serde(default)]
    pub contracts: BTreeMap<String, String>,
    /// Placeholder token to replacement text
    #[serde(default)]
    pub placeholders: BTreeMap<String, String>,
}

fn default_access_node() -> String {
    "http://127.0.0.1:8888".to_string()
}

/// Environment entries that are valid UTF-8; others cannot name an override
fn utf8_vars(
    vars: impl IntoIterator<Item = (OsString, OsString)>,
) -> impl Iterator<Item = (String, String)> {
    vars.into_iter()
        .filter_map(|(key, value)| Some((key.into_string().ok()?, value.into_string().ok()?)))
}

fn default_limit() -> ComputeLimit {
    999
}

fn default_poll_interval_ms() -> u64 {
    1000
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self::for_network(Network::Emulator)
    }
}

struct NetworkTable {
    access_node: &'static str,
    contracts: &'static [(&'static str, &'static str)],
}

const EMULATOR: NetworkTable = NetworkTable {
    access_node: "http://127.0.0.1:8888",
    contracts: &[
        ("FungibleToken", "0xee82856bf20e2aa6"),
        ("FlowToken", "0x0ae53cb6e3f42a79"),
        ("NonFungibleToken", "0xf8d6e0586b0a20c7"),
        ("MetadataViews", "0xf8d6e0586b0a20c7"),
        ("MelosNFT", "0xf8d6e0586b0a20c7"),
        ("MelosMarketplace", "0xf8d6e0586b0a20c7"),
    ],
};

const TESTNET: NetworkTable = NetworkTable {
    access_node: "https://rest-testnet.onflow.org",
    contracts: &[
        ("FungibleToken", "0x9a0766d93b6608b7"),
        ("FlowToken", "0x7e60df042a9c0868"),
        ("NonFungibleToken", "0x631e88ae7f1d7c20"),
        ("MetadataViews", "0x631e88ae7f1d7c20"),
    ],
};

const MAINNET: NetworkTable = NetworkTable {
    access_node: "https://rest-mainnet.onflow.org",
    contracts: &[
        ("FungibleToken", "0xf233dcee88fe0abe"),
        ("FlowToken", "0x1654653399040a61"),
        ("NonFungibleToken", "0x1d7e57aa55817448"),
        ("MetadataViews", "0x1d7e57aa55817448"),
    ],
};

const PLACEHOLDERS: &[(&str, &str)] = &[
    (tokens::FT_NAME, "FlowToken"),
    (tokens::FT_RECEIVER, "/public/flowTokenReceiver"),
    (tokens::FT_STORAGE_PATH, "/storage/flowTokenVault"),
    (tokens::NFT_NAME, "MelosNFT"),
    (tokens::NFT_PUBLIC_PATH, "/public/MelosNFTCollection"),
    (tokens::NFT_STORAGE_PATH, "/storage/MelosNFTCollection"),
    (tokens::NFT_PROVIDER_PRIVATE_PATH, "/private/MelosNFTCollectionProvider"),
];

impl NetworkConfig {
    /// Built-in settings for `network`
    pub fn for_network(network: Network) -> Self {
        let table = match network {
            Network::Emulator => &EMULATOR,
            Network::Testnet => &TESTNET,
            Network::Mainnet => &MAINNET,
        };

        let contracts: BTreeMap<String, String> = table
            .contracts
            .iter()
            .map(|(name, addr)| (name.to_string(), addr.to_string()))
            .collect();

        let mut placeholders: BTreeMap<String, String> = PLACEHOLDERS
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        if let Some(addr) = contracts.get("FlowToken") {
            placeholders.insert(tokens::FT_ADDRESS.to_string(), addr.clone());
        }
        if let Some(addr) = contracts.get("MelosNFT") {
            placeholders.insert(tokens::NFT_ADDRESS.to_string(), addr.clone());
        }

        Self {
            network,
            access_node: table.access_node.to_string(),
            default_limit: default_limit(),
            poll_interval_ms: default_poll_interval_ms(),
            contracts,
            placeholders,
        }
    }

    /// Apply per-key overrides from an environment-style lookup.
    ///
    /// Recognized keys are the access node, the default limit, and
    /// `MELOS_CONTRACT_<NAME>` / `MELOS_PLACEHOLDER_<TOKEN>` entries.
    /// Contract overrides must be valid addresses.
    pub fn with_overrides<I, K, V>(mut self, vars: I) -> Result<Self, SdkError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        for (key, value) in vars {
            let key = key.as_ref();
            let value: String = value.into();

            if key == ENV_ACCESS_NODE {
                self.access_node = value;
            } else if key == ENV_LIMIT {
                self.default_limit = value.trim().parse().map_err(|_| {
                    SdkError::Config(format!("{} must be an integer, got '{}'", ENV_LIMIT, value))
                })?;
            } else if let Some(name) = key.strip_prefix(ENV_CONTRACT_PREFIX) {
                let address = Address::from_hex(&value)
                    .map_err(|e| SdkError::Config(format!("{}: {}", key, e)))?;
                self.contracts.insert(name.to_string(), address.to_hex());
            } else if let Some(token) = key.strip_prefix(ENV_PLACEHOLDER_PREFIX) {
                self.placeholders.insert(token.to_string(), value);
            }
        }
        Ok(self)
    }

    /// Built-in settings for the network named by `MELOS_NETWORK`
    /// (emulator when unset), with process environment overrides applied
    pub fn from_env() -> Result<Self, SdkError> {
        let network = match std::env::var(ENV_NETWORK) {
            Ok(name) => name.parse()?,
            Err(_) => Network::default(),
        };
        let config = Self::for_network(network).with_overrides(utf8_vars(std::env::vars_os()))?;
        tracing::debug!(network = %config.network, access_node = %config.access_node, "configuration loaded");
        Ok(config)
    }

    /// Get the config directory path
    pub fn config_dir() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".melos"))
    }

    /// Get the config file path
    pub fn config_path() -> Option<PathBuf> {
        Self::config_dir().map(|d| d.join("config.toml"))
    }

    /// Parse TOML text
    pub fn from_toml(content: &str) -> Result<Self, SdkError> {
        toml::from_str(content).map_err(|e| SdkError::Config(e.to_string()))
    }

    /// Load from `path`
    pub fn load_from(path: &Path) -> Result<Self, SdkError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| SdkError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_toml(&content)
    }

    /// Load the default config file, or the emulator defaults if there is none
    pub fn load() -> Self {
        Self::config_path()
            .filter(|path| path.exists())
            .and_then(|path| Self::load_from(&path).ok())
            .unwrap_or_default()
    }

    /// Save to `path`, creating parent directories
    pub fn save_to(&self, path: &Path) -> Result<(), SdkError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| SdkError::Config(e.to_string()))?;
        }
        let content = toml::to_string_pretty(self).map_err(|e| SdkError::Config(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| SdkError::Config(e.to_string()))
    }

    /// Save to the default config file
    pub fn save(&self) -> Result<(), SdkError> {
        let path = Self::config_path()
            .ok_or_else(|| SdkError::Config("cannot determine config path".to_string()))?;
        self.save_to(&path)
    }
}
