//! Priority fee injection for the Compute Budget program.

use solana_compute_budget_interface::ComputeBudgetInstruction;
use solana_sdk::instruction::Instruction;
use solana_sdk::pubkey::Pubkey;

/// Compute Budget program id.
pub const COMPUTE_BUDGET_PROGRAM_ID: Pubkey = solana_compute_budget_interface::ID;

/// What [`set_or_replace_priority_fee`] did to the instruction list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeePatch {
    /// An existing compute-unit-price instruction was rewritten in place.
    ModifiedExisting,
    /// A new compute-unit-price instruction was inserted at index 0.
    InsertedNew,
}

fn decode(ix: &Instruction) -> Option<ComputeBudgetInstruction> {
    if ix.program_id != COMPUTE_BUDGET_PROGRAM_ID {
        return None;
    }
    borsh::from_slice(&ix.data).ok()
}

fn is_unit_price(ix: &Instruction) -> bool {
    matches!(decode(ix), Some(ComputeBudgetInstruction::SetComputeUnitPrice(_)))
}

/// Sets the priority fee of an unsigned instruction list.
///
/// Rewrites the first compute-unit-price instruction if there is one,
/// otherwise prepends a new one. Any other compute budget instruction is left
/// untouched.
pub fn set_or_replace_priority_fee(
    instructions: &mut Vec<Instruction>,
    micro_lamports_per_cu: u64,
) -> FeePatch {
    let price = ComputeBudgetInstruction::set_compute_unit_price(micro_lamports_per_cu);

    match instructions.iter_mut().find(|ix| is_unit_price(ix)) {
        Some(ix) => {
            *ix = price;
            FeePatch::ModifiedExisting
        }
        None => {
            instructions.insert(0, price);
            FeePatch::InsertedNew
        }
    }
}

/// Reads the priority fee carried by an instruction list, if any.
#[must_use]
pub fn priority_fee_of(instructions: &[Instruction]) -> Option<u64> {
    instructions.iter().find_map(|ix| match decode(ix) {
        Some(ComputeBudgetInstruction::SetComputeUnitPrice(price)) => Some(price),
        _ => None,
    })
}
