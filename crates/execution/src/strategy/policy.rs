use clmm_keeper_domain::entities::PositionState;
use clmm_keeper_domain::enums::{AutoCheckAction, Decision};

/// Decides what to do with a position.
pub trait ExitPolicy: Send + Sync {
    fn decide(&self, state: &PositionState) -> Decision;
}

/// Holds while the current tick is inside the range, otherwise applies the
/// configured action.
#[derive(Debug, Clone, Copy)]
pub struct RangeExitPolicy {
    pub action: AutoCheckAction,
}

impl RangeExitPolicy {
    #[must_use]
    pub fn new(action: AutoCheckAction) -> Self {
        Self { action }
    }
}

impl ExitPolicy for RangeExitPolicy {
    fn decide(&self, state: &PositionState) -> Decision {
        if state.in_range() {
            return Decision::Hold;
        }
        match self.action {
            AutoCheckAction::Close => Decision::Close,
            AutoCheckAction::Reopen => Decision::Reopen,
        }
    }
}
