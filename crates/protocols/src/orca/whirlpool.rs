//! Orca Whirlpool account layouts.
//!
//! Only the leading fields the keeper reads are declared. Borsh reads them as
//! a prefix and ignores the trailing reward data.

use borsh::BorshDeserialize;
use solana_sdk::pubkey::Pubkey;
use thiserror::Error;

/// Orca Whirlpool program id (mainnet).
pub const WHIRLPOOL_PROGRAM_ID: Pubkey =
    Pubkey::from_str_const("whirLbMiicVdio4qvUfM5KAg6Ct8VwpYzGff3uctyCc");

/// Ticks covered by one tick array.
pub const TICK_ARRAY_SIZE: i32 = 88;

const WHIRLPOOL_DISCRIMINATOR: [u8; 8] = [0x3f, 0x95, 0xd1, 0x0c, 0xe1, 0x80, 0x63, 0x09];
const POSITION_DISCRIMINATOR: [u8; 8] = [0xaa, 0xbc, 0x8f, 0xe4, 0x7a, 0x40, 0xf7, 0xd0];

/// Error decoding a Whirlpool account.
#[derive(Debug, Error)]
pub enum LayoutError {
    /// Data ended before the declared fields.
    #[error("account data too short: {0}")]
    Truncated(String),
    /// The account is of another type.
    #[error("unexpected {kind} discriminator")]
    Discriminator {
        /// Expected account type.
        kind: &'static str,
    },
}

/// Whirlpool pool account.
#[derive(BorshDeserialize, Debug, Clone)]
pub struct Whirlpool {
    pub discriminator: [u8; 8],
    pub whirlpools_config: [u8; 32],
    pub whirlpool_bump: [u8; 1],
    pub tick_spacing: u16,
    pub fee_tier_index_seed: [u8; 2],
    pub fee_rate: u16,
    pub protocol_fee_rate: u16,
    pub liquidity: u128,
    pub sqrt_price: u128,
    pub tick_current_index: i32,
    pub protocol_fee_owed_a: u64,
    pub protocol_fee_owed_b: u64,
    pub token_mint_a: [u8; 32],
    pub token_vault_a: [u8; 32],
    pub fee_growth_global_a: u128,
    pub token_mint_b: [u8; 32],
    pub token_vault_b: [u8; 32],
    pub fee_growth_global_b: u128,
    pub reward_last_updated_timestamp: u64,
}

impl Whirlpool {
    /// Decodes a pool account.
    pub fn parse(data: &[u8]) -> Result<Self, LayoutError> {
        let pool = Self::deserialize(&mut &data[..])
            .map_err(|e| LayoutError::Truncated(e.to_string()))?;
        if pool.discriminator != WHIRLPOOL_DISCRIMINATOR {
            return Err(LayoutError::Discriminator { kind: "Whirlpool" });
        }
        Ok(pool)
    }

    pub fn mint_a(&self) -> Pubkey {
        Pubkey::new_from_array(self.token_mint_a)
    }

    pub fn mint_b(&self) -> Pubkey {
        Pubkey::new_from_array(self.token_mint_b)
    }

    pub fn vault_a(&self) -> Pubkey {
        Pubkey::new_from_array(self.token_vault_a)
    }

    pub fn vault_b(&self) -> Pubkey {
        Pubkey::new_from_array(self.token_vault_b)
    }
}

/// Whirlpool position account.
#[derive(BorshDeserialize, Debug, Clone)]
pub struct Position {
    pub discriminator: [u8; 8],
    pub whirlpool: [u8; 32],
    pub position_mint: [u8; 32],
    pub liquidity: u128,
    pub tick_lower_index: i32,
    pub tick_upper_index: i32,
    pub fee_growth_checkpoint_a: u128,
    pub fee_owed_a: u64,
    pub fee_growth_checkpoint_b: u128,
    pub fee_owed_b: u64,
}

impl Position {
    /// Decodes a position account.
    pub fn parse(data: &[u8]) -> Result<Self, LayoutError> {
        let position = Self::deserialize(&mut &data[..])
            .map_err(|e| LayoutError::Truncated(e.to_string()))?;
        if position.discriminator != POSITION_DISCRIMINATOR {
            return Err(LayoutError::Discriminator { kind: "Position" });
        }
        Ok(position)
    }

    pub fn whirlpool(&self) -> Pubkey {
        Pubkey::new_from_array(self.whirlpool)
    }

    pub fn mint(&self) -> Pubkey {
        Pubkey::new_from_array(self.position_mint)
    }
}

/// Position PDA for a position NFT mint.
#[must_use]
pub fn position_address(position_mint: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[b"position", position_mint.as_ref()], &WHIRLPOOL_PROGRAM_ID)
}

/// First tick of the array containing `tick`.
#[must_use]
pub fn tick_array_start(tick: i32, tick_spacing: u16) -> i32 {
    let span = i32::from(tick_spacing) * TICK_ARRAY_SIZE;
    tick.div_euclid(span) * span
}

/// Tick array PDA containing `tick`.
#[must_use]
pub fn tick_array_address(whirlpool: &Pubkey, tick: i32, tick_spacing: u16) -> Pubkey {
    let start = tick_array_start(tick, tick_spacing).to_string();
    let (address, _bump) = Pubkey::find_program_address(
        &[b"tick_array", whirlpool.as_ref(), start.as_bytes()],
        &WHIRLPOOL_PROGRAM_ID,
    );
    address
}

#[cfg(any(test, feature = "test-fixtures"))]
pub mod fixtures {
    //! Hand-built account images for tests.

    use super::*;

    pub fn whirlpool_bytes(tick_current: i32, tick_spacing: u16, mint_a: &Pubkey, mint_b: &Pubkey) -> Vec<u8> {
        let mut data = Vec::new();
        data.extend_from_slice(&WHIRLPOOL_DISCRIMINATOR);
        data.extend_from_slice(&[7u8; 32]);
        data.push(255);
        data.extend_from_slice(&tick_spacing.to_le_bytes());
        data.extend_from_slice(&tick_spacing.to_le_bytes());
        data.extend_from_slice(&400u16.to_le_bytes());
        data.extend_from_slice(&300u16.to_le_bytes());
        data.extend_from_slice(&1_000_000u128.to_le_bytes());
        data.extend_from_slice(&(1u128 << 64).to_le_bytes());
        data.extend_from_slice(&tick_current.to_le_bytes());
        data.extend_from_slice(&0u64.to_le_bytes());
        data.extend_from_slice(&0u64.to_le_bytes());
        data.extend_from_slice(mint_a.as_ref());
        data.extend_from_slice(&[1u8; 32]);
        data.extend_from_slice(&0u128.to_le_bytes());
        data.extend_from_slice(mint_b.as_ref());
        data.extend_from_slice(&[2u8; 32]);
        data.extend_from_slice(&0u128.to_le_bytes());
        data.extend_from_slice(&0u64.to_le_bytes());
        // reward infos
        data.extend_from_slice(&[0u8; 384]);
        data
    }

    pub fn position_bytes(whirlpool: &Pubkey, mint: &Pubkey, liquidity: u128, lower: i32, upper: i32) -> Vec<u8> {
        let mut data = Vec::new();
        data.extend_from_slice(&POSITION_DISCRIMINATOR);
        data.extend_from_slice(whirlpool.as_ref());
        data.extend_from_slice(mint.as_ref());
        data.extend_from_slice(&liquidity.to_le_bytes());
        data.extend_from_slice(&lower.to_le_bytes());
        data.extend_from_slice(&upper.to_le_bytes());
        data.extend_from_slice(&[0u8; 48]);
        data.extend_from_slice(&[0u8; 216]);
        data
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn test_parse_whirlpool_prefix() {
        let mint_a = Pubkey::new_unique();
        let mint_b = Pubkey::new_unique();
        let data = whirlpool_bytes(-1234, 64, &mint_a, &mint_b);
        let pool = Whirlpool::parse(&data).unwrap();

        assert_eq!(pool.tick_current_index, -1234);
        assert_eq!(pool.tick_spacing, 64);
        assert_eq!(pool.mint_a(), mint_a);
        assert_eq!(pool.mint_b(), mint_b);
        assert_eq!(pool.vault_a(), Pubkey::new_from_array([1u8; 32]));
    }

    #[test]
    fn test_parse_position() {
        let pool = Pubkey::new_unique();
        let mint = Pubkey::new_unique();
        let data = position_bytes(&pool, &mint, 99, -128, 128);
        let position = Position::parse(&data).unwrap();

        assert_eq!(position.whirlpool(), pool);
        assert_eq!(position.mint(), mint);
        assert_eq!(position.liquidity, 99);
        assert_eq!((position.tick_lower_index, position.tick_upper_index), (-128, 128));
    }

    #[test]
    fn test_rejects_wrong_account_type() {
        let data = position_bytes(&Pubkey::new_unique(), &Pubkey::new_unique(), 1, 0, 64);
        assert!(matches!(
            Whirlpool::parse(&data),
            Err(LayoutError::Discriminator { kind: "Whirlpool" })
        ));
        assert!(matches!(Position::parse(&data[..40]), Err(LayoutError::Truncated(_))));
    }

    #[test]
    fn test_tick_array_start() {
        assert_eq!(tick_array_start(0, 64), 0);
        assert_eq!(tick_array_start(5631, 64), 0);
        assert_eq!(tick_array_start(5632, 64), 5632);
        assert_eq!(tick_array_start(-1, 64), -5632);
    }
}
