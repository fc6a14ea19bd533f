use crate::enums::LiquidityShape;
use crate::value_objects::TickRange;
use serde::{Deserialize, Serialize};

/// Snapshot of one wallet's position in one pool, read fresh on every poll.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionState {
    /// Owner wallet address.
    pub wallet: String,
    /// Pool address.
    pub pool: String,
    /// Position account address.
    pub position: String,
    /// Pool's current tick.
    pub current_tick: i32,
    /// Configured range of the position.
    pub range: TickRange,
    /// Tick spacing of the pool.
    pub tick_spacing: u16,
    /// Liquidity held by the position.
    pub liquidity: u128,
    /// Shape used when the position was opened. `None` when read from
    /// chain, which does not record it.
    pub shape: Option<LiquidityShape>,
}

impl PositionState {
    #[must_use]
    pub fn in_range(&self) -> bool {
        self.range.contains(self.current_tick)
    }

    /// Range a reopen would target: same width, centred on the current tick.
    #[must_use]
    pub fn reopen_range(&self) -> TickRange {
        self.range.recentred(self.current_tick, self.tick_spacing)
    }
}
