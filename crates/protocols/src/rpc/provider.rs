//! Chain calls used by the keeper, behind a trait so pool slots can be
//! swapped for test doubles.

use super::ChainError;
use async_trait::async_trait;
use clmm_keeper_domain::entities::TokenBalance;
use serde_json::Value;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_client::rpc_request::TokenAccountsFilter;
use solana_client::rpc_response::RpcKeyedAccount;
use solana_sdk::hash::Hash;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use solana_sdk::transaction::{Transaction, VersionedTransaction};
use tracing::debug;

/// Whether an account exists on chain.
///
/// Kept distinct from a failed lookup: a transport error is an `Err`, never `Absent`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountPresence {
    /// The account exists.
    Present,
    /// The node reported no such account.
    Absent,
}

/// Remote calls made through a pool slot.
#[async_trait]
pub trait RpcProvider: Send + Sync {
    /// Endpoint URL this handle talks to.
    fn endpoint(&self) -> String;

    /// Fetches a fresh blockhash for a new transaction.
    async fn get_latest_blockhash(&self) -> Result<Hash, ChainError>;

    /// Native balance in lamports.
    async fn get_balance(&self, address: &Pubkey) -> Result<u64, ChainError>;

    /// Raw account data, `None` if the account does not exist.
    async fn get_account_data(&self, address: &Pubkey) -> Result<Option<Vec<u8>>, ChainError>;

    /// Checks whether an account exists.
    async fn probe_account(&self, address: &Pubkey) -> Result<AccountPresence, ChainError> {
        Ok(match self.get_account_data(address).await? {
            Some(_) => AccountPresence::Present,
            None => AccountPresence::Absent,
        })
    }

    /// All token accounts of `owner` under `token_program`.
    async fn get_token_balances(
        &self,
        owner: &Pubkey,
        token_program: &Pubkey,
    ) -> Result<Vec<TokenBalance>, ChainError>;

    /// Broadcasts a signed legacy transaction.
    async fn send_transaction(&self, transaction: &Transaction) -> Result<Signature, ChainError>;

    /// Broadcasts a signed versioned transaction.
    async fn send_versioned_transaction(
        &self,
        transaction: &VersionedTransaction,
    ) -> Result<Signature, ChainError>;

    /// Waits until the signature reaches the client's commitment.
    async fn confirm_signature(&self, signature: &Signature) -> Result<(), ChainError>;
}

#[async_trait]
impl RpcProvider for RpcClient {
    fn endpoint(&self) -> String {
        self.url()
    }

    async fn get_latest_blockhash(&self) -> Result<Hash, ChainError> {
        Ok(RpcClient::get_latest_blockhash(self).await?)
    }

    async fn get_balance(&self, address: &Pubkey) -> Result<u64, ChainError> {
        Ok(RpcClient::get_balance(self, address).await?)
    }

    async fn get_account_data(&self, address: &Pubkey) -> Result<Option<Vec<u8>>, ChainError> {
        let response = self
            .get_account_with_commitment(address, self.commitment())
            .await?;
        Ok(response.value.map(|account| account.data))
    }

    async fn get_token_balances(
        &self,
        owner: &Pubkey,
        token_program: &Pubkey,
    ) -> Result<Vec<TokenBalance>, ChainError> {
        let accounts = self
            .get_token_accounts_by_owner(owner, TokenAccountsFilter::ProgramId(*token_program))
            .await?;
        debug!(owner = %owner, count = accounts.len(), "Fetched token accounts");
        accounts.iter().map(parse_keyed_token_account).collect()
    }

    async fn send_transaction(&self, transaction: &Transaction) -> Result<Signature, ChainError> {
        Ok(RpcClient::send_transaction(self, transaction).await?)
    }

    async fn send_versioned_transaction(
        &self,
        transaction: &VersionedTransaction,
    ) -> Result<Signature, ChainError> {
        Ok(RpcClient::send_transaction(self, transaction).await?)
    }

    async fn confirm_signature(&self, signature: &Signature) -> Result<(), ChainError> {
        Ok(self
            .poll_for_signature_with_commitment(signature, self.commitment())
            .await?)
    }
}

fn parse_keyed_token_account(keyed: &RpcKeyedAccount) -> Result<TokenBalance, ChainError> {
    let data = serde_json::to_value(&keyed.account.data)
        .map_err(|e| ChainError::Decode(e.to_string()))?;
    parse_token_account(&keyed.pubkey, &data)
}

/// Reads a `jsonParsed` SPL token account payload.
pub fn parse_token_account(account: &str, data: &Value) -> Result<TokenBalance, ChainError> {
    let info = &data["parsed"]["info"];
    let mint = info["mint"]
        .as_str()
        .ok_or_else(|| ChainError::Decode(format!("{account}: missing mint")))?;
    let token_amount = &info["tokenAmount"];
    let amount = token_amount["amount"]
        .as_str()
        .and_then(|s| s.parse::<u64>().ok())
        .ok_or_else(|| ChainError::Decode(format!("{account}: missing token amount")))?;
    let decimals = token_amount["decimals"]
        .as_u64()
        .and_then(|d| u8::try_from(d).ok())
        .ok_or_else(|| ChainError::Decode(format!("{account}: missing decimals")))?;

    Ok(TokenBalance {
        account: account.to_string(),
        mint: mint.to_string(),
        amount,
        decimals,
    })
}
