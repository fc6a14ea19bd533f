pub mod position;
pub mod token;

pub use position::PositionState;
pub use token::{TokenBalance, TokenInfo};
