//! Commonly used items.

pub use crate::compute_budget::{FeePatch, set_or_replace_priority_fee};
pub use crate::instructions::{
    TOKEN_PROGRAM_ID, WRAPPED_SOL_MINT, associated_token_address,
    create_associated_token_account, system_transfer, token_transfer,
};
pub use crate::orca::{ConfirmationMode, WhirlpoolExecutor};
pub use crate::rpc::{
    AccountPresence, ChainError, ConnectionPool, PoolConfig, PoolError, RpcProvider,
};
pub use crate::transaction::PendingTransaction;
