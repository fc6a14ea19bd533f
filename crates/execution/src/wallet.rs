//! Wallet management for transaction signing.
//!
//! Wallets are loaded once from configuration and shared as `Arc<Wallet>`.
//! Nothing mutates a wallet after it is loaded.

use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Keypair;
use solana_sdk::signer::Signer;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use zeroize::Zeroize;

/// Id of the main wallet: consolidation target and distribution source.
pub const MAIN_WALLET_ID: u32 = 1;

/// Wallet loading and selection errors.
#[derive(Debug, Error)]
pub enum WalletError {
    /// The secret key is not valid base58 or not a valid keypair.
    #[error("wallet {id}: invalid private key: {reason}")]
    InvalidKey {
        /// Wallet id.
        id: u32,
        /// What went wrong.
        reason: String,
    },
    /// The configured address does not belong to the key.
    #[error("wallet {id}: address {configured} does not match key {derived}")]
    AddressMismatch {
        /// Wallet id.
        id: u32,
        /// Address from configuration.
        configured: String,
        /// Address derived from the key.
        derived: String,
    },
    /// No wallet with this id.
    #[error("unknown wallet id {0}")]
    Unknown(u32),
    /// Two wallets share an id.
    #[error("duplicate wallet id {0}")]
    Duplicate(u32),
}

/// Shortened address used in logs: first four characters and `..`.
#[must_use]
pub fn short_address(address: &str) -> String {
    let prefix: String = address.chars().take(4).collect();
    format!("{prefix}..")
}

/// A signing wallet.
pub struct Wallet {
    id: u32,
    keypair: Keypair,
    address: Pubkey,
}

impl Wallet {
    /// Wraps an existing keypair.
    #[must_use]
    pub fn from_keypair(id: u32, keypair: Keypair) -> Self {
        let address = keypair.pubkey();
        Self {
            id,
            keypair,
            address,
        }
    }

    /// Decodes a base58 secret key. The decoded bytes are wiped afterwards.
    ///
    /// # Errors
    /// Returns [`WalletError::InvalidKey`] if the key cannot be decoded.
    pub fn from_base58(id: u32, secret: &str) -> Result<Self, WalletError> {
        let mut bytes = bs58::decode(secret.trim())
            .into_vec()
            .map_err(|e| WalletError::InvalidKey {
                id,
                reason: e.to_string(),
            })?;
        let keypair = Keypair::try_from(&bytes[..]);
        bytes.zeroize();

        let keypair = keypair.map_err(|e| WalletError::InvalidKey {
            id,
            reason: e.to_string(),
        })?;
        Ok(Self::from_keypair(id, keypair))
    }

    /// Like [`from_base58`](Self::from_base58), also checking the expected address.
    pub fn from_base58_checked(id: u32, secret: &str, address: &str) -> Result<Self, WalletError> {
        let wallet = Self::from_base58(id, secret)?;
        if wallet.address.to_string() != address.trim() {
            return Err(WalletError::AddressMismatch {
                id,
                configured: address.to_string(),
                derived: wallet.address.to_string(),
            });
        }
        Ok(wallet)
    }

    #[must_use]
    pub fn id(&self) -> u32 {
        self.id
    }

    #[must_use]
    pub fn address(&self) -> Pubkey {
        self.address
    }

    #[must_use]
    pub fn keypair(&self) -> &Keypair {
        &self.keypair
    }

    /// Address as logged: `4oQx..`.
    #[must_use]
    pub fn short(&self) -> String {
        short_address(&self.address.to_string())
    }
}

impl fmt::Debug for Wallet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Wallet")
            .field("id", &self.id)
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

/// Wallets keyed by id.
#[derive(Debug, Default, Clone)]
pub struct WalletRegistry {
    wallets: BTreeMap<u32, Arc<Wallet>>,
}

impl WalletRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a wallet. Ids must be unique.
    pub fn insert(&mut self, wallet: Wallet) -> Result<(), WalletError> {
        let id = wallet.id();
        if self.wallets.contains_key(&id) {
            return Err(WalletError::Duplicate(id));
        }
        self.wallets.insert(id, Arc::new(wallet));
        Ok(())
    }

    pub fn get(&self, id: u32) -> Result<Arc<Wallet>, WalletError> {
        self.wallets.get(&id).cloned().ok_or(WalletError::Unknown(id))
    }

    /// The main wallet (id 1).
    pub fn main(&self) -> Result<Arc<Wallet>, WalletError> {
        self.get(MAIN_WALLET_ID)
    }

    /// Wallets with the given ids, in the order given.
    pub fn select(&self, ids: &[u32]) -> Result<Vec<Arc<Wallet>>, WalletError> {
        ids.iter().map(|id| self.get(*id)).collect()
    }

    /// Every wallet, ordered by id.
    #[must_use]
    pub fn all(&self) -> Vec<Arc<Wallet>> {
        self.wallets.values().cloned().collect()
    }

    /// Every wallet except the main one.
    #[must_use]
    pub fn all_except_main(&self) -> Vec<Arc<Wallet>> {
        self.wallets
            .iter()
            .filter(|(id, _)| **id != MAIN_WALLET_ID)
            .map(|(_, w)| w.clone())
            .collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.wallets.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.wallets.is_empty()
    }
}
