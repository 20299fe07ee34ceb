//! Endpoint configuration for the chains an order can originate from.
//!
//! A [`NetworkTable`] is an explicit value handed to the caller: either the
//! built-in testnet table or one loaded from a `.json` / `.toml` file.

use alloy_primitives::{address, Address};
use eyre::{bail, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::OrderError;

/// Wormhole chain ID for Arbitrum Sepolia
pub const ARBITRUM_SEPOLIA: u16 = 10003;
/// Wormhole chain ID for Optimism Sepolia
pub const OPTIMISM_SEPOLIA: u16 = 10005;

/// Explorer used for the human-facing link printed after a successful order
pub const EXPLORER_TX_URL: &str = "https://wormholescan.io/#/tx/";

/// A single origin chain: where to send RPC calls and which contracts to talk to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointConfig {
    /// Human-readable network name (e.g., "arbitrum-sepolia")
    pub network: String,
    /// Wormhole chain ID, used as the static lookup key
    pub wormhole_chain: u16,
    /// EVM chain ID
    pub chain_id: u64,
    pub rpc_url: String,
    pub token_router: Address,
    /// USDC token the router burns
    pub usdc: Address,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkTable {
    pub networks: Vec<EndpointConfig>,
}

impl Default for NetworkTable {
    fn default() -> Self {
        Self::builtin()
    }
}

impl NetworkTable {
    /// Testnet routers from the fast transfer deployment
    pub fn builtin() -> Self {
        Self {
            networks: vec![
                EndpointConfig {
                    network: "arbitrum-sepolia".to_string(),
                    wormhole_chain: ARBITRUM_SEPOLIA,
                    chain_id: 421614,
                    rpc_url: "https://sepolia-rollup.arbitrum.io/rpc".to_string(),
                    token_router: address!("0xe0418C44F06B0b0D7D1706E01706316DBB0B210E"),
                    usdc: address!("0x75faf114eafb1BDbe2F0316DF893fd58CE46AA4d"),
                },
                EndpointConfig {
                    network: "optimism-sepolia".to_string(),
                    wormhole_chain: OPTIMISM_SEPOLIA,
                    chain_id: 11155420,
                    rpc_url: "https://sepolia.optimism.io".to_string(),
                    token_router: address!("0x6BAa7397c18abe6221b4f6C3Ac91C88a9faE00D8"),
                    usdc: address!("0x5fd84259d66Cd46123540766Be93DFE6D43130D7"),
                },
            ],
        }
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)?;

        // Determine file type based on extension
        let table = match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => serde_json::from_str(&contents)?,
            Some("toml") => toml::from_str(&contents)?,
            Some(ext) => bail!("Unsupported file extension: {}. Use .json or .toml", ext),
            None => bail!("No file extension found. Use .json or .toml"),
        };

        Ok(table)
    }

    pub fn get(&self, wormhole_chain: u16) -> Option<&EndpointConfig> {
        self.networks
            .iter()
            .find(|endpoint| endpoint.wormhole_chain == wormhole_chain)
    }

    pub fn get_by_name(&self, network: &str) -> Option<&EndpointConfig> {
        self.networks
            .iter()
            .find(|endpoint| endpoint.network == network)
    }

    /// Look up an endpoint by wormhole chain ID or by name
    pub fn resolve(&self, network: &str) -> Result<&EndpointConfig> {
        let found = match network.parse::<u16>() {
            Ok(id) => self.get(id),
            Err(_) => self.get_by_name(network),
        };

        found.ok_or_else(|| OrderError::UnknownNetwork(network.to_string()).into())
    }
}

/// Explorer link for a transaction hash
pub fn explorer_url(tx_hash: impl std::fmt::Display) -> String {
    format!("{EXPLORER_TX_URL}{tx_hash}")
}
