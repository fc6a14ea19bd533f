//! Keeper configuration file.
//!
//! A JSON document with the RPC endpoints, fee and pacing overrides, and the
//! wallets the keeper may sign for:
//!
//! ```json
//! {
//!   "rpc": { "endpoints": ["https://api.mainnet-beta.solana.com"] },
//!   "wallets": { "1": { "private_key": "...", "address": "..." } }
//! }
//! ```

use anyhow::{Context, Result};
use clmm_keeper_execution::fees::FeeSchedule;
use clmm_keeper_execution::pacing::PacingPolicy;
use clmm_keeper_execution::strategy::AutoCheckConfig;
use clmm_keeper_execution::wallet::{Wallet, WalletRegistry};
use clmm_keeper_protocols::orca::ConfirmationMode;
use clmm_keeper_protocols::rpc::PoolConfig;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

/// Default config file name.
pub const DEFAULT_CONFIG_PATH: &str = "keeper.json";

#[derive(Debug, Clone, Deserialize)]
pub struct KeeperConfig {
    pub rpc: RpcSection,
    #[serde(default)]
    pub fees: FeeSchedule,
    #[serde(default)]
    pub pacing: PacingSection,
    #[serde(default)]
    pub auto_check: AutoCheckSection,
    #[serde(default)]
    pub liquidation: LiquidationSection,
    pub wallets: BTreeMap<u32, WalletEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RpcSection {
    pub endpoints: Vec<String>,
    /// `ip:port:user:pass` tuples.
    #[serde(default)]
    pub proxies: Vec<String>,
    #[serde(default = "default_pool_size")]
    pub pool_size: usize,
    #[serde(default = "default_true")]
    pub use_multi_endpoint: bool,
    #[serde(default)]
    pub use_multi_proxy: bool,
    #[serde(default = "default_confirm_timeout_secs")]
    pub confirm_timeout_secs: u64,
}

impl RpcSection {
    #[must_use]
    pub fn pool_config(&self) -> PoolConfig {
        PoolConfig {
            pool_size: self.pool_size,
            use_multi_endpoint: self.use_multi_endpoint,
            use_multi_proxy: self.use_multi_proxy,
            confirm_timeout: Duration::from_secs(self.confirm_timeout_secs),
            ..PoolConfig::default()
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PacingSection {
    pub jitter_max_ms: u64,
    pub inter_tx_delay_ms: u64,
    pub max_in_flight: usize,
}

impl Default for PacingSection {
    fn default() -> Self {
        Self {
            jitter_max_ms: 2000,
            inter_tx_delay_ms: 2000,
            max_in_flight: 8,
        }
    }
}

impl PacingSection {
    #[must_use]
    pub fn policy(&self) -> PacingPolicy {
        PacingPolicy {
            jitter_max: Duration::from_millis(self.jitter_max_ms),
            inter_tx_delay: Duration::from_millis(self.inter_tx_delay_ms),
            max_in_flight: self.max_in_flight,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AutoCheckSection {
    pub interval_secs: u64,
    pub max_in_flight: usize,
    /// Wait for position transactions to confirm.
    pub confirm: bool,
}

impl Default for AutoCheckSection {
    fn default() -> Self {
        Self {
            interval_secs: 60,
            max_in_flight: 8,
            confirm: true,
        }
    }
}

impl AutoCheckSection {
    #[must_use]
    pub fn config(&self, max_ticks: Option<u64>) -> AutoCheckConfig {
        AutoCheckConfig {
            interval: Duration::from_secs(self.interval_secs),
            max_ticks,
            max_in_flight: self.max_in_flight,
        }
    }

    #[must_use]
    pub fn confirmation(&self) -> ConfirmationMode {
        if self.confirm {
            ConfirmationMode::Confirm
        } else {
            ConfirmationMode::Fire
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LiquidationSection {
    pub slippage_bps: u16,
}

impl Default for LiquidationSection {
    fn default() -> Self {
        Self { slippage_bps: 500 }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct WalletEntry {
    /// Base58-encoded 64-byte secret key.
    pub private_key: String,
    pub address: String,
}

fn default_pool_size() -> usize {
    5
}

fn default_true() -> bool {
    true
}

fn default_confirm_timeout_secs() -> u64 {
    120
}

impl KeeperConfig {
    /// Reads and parses the config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::parse(&raw).with_context(|| format!("Invalid config file {}", path.display()))
    }

    pub fn parse(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Decodes every wallet key and checks it against its configured address.
    pub fn wallet_registry(&self) -> Result<WalletRegistry> {
        let mut registry = WalletRegistry::new();
        for (id, entry) in &self.wallets {
            let wallet = Wallet::from_base58_checked(*id, &entry.private_key, &entry.address)?;
            registry.insert(wallet)?;
        }
        Ok(registry)
    }
}
