//! Events emitted for indexers.

use anchor_lang::prelude::*;

/// Emitted when collateral is locked into a new position.
#[event]
pub struct Staked {
    pub position: Pubkey,
    pub owner: Pubkey,
    pub level_id: u8,
    pub amount: u64,
}

/// Emitted when a position's stake is assigned to a validator.
#[event]
pub struct Delegated {
    pub delegation_id: u64,
    pub position: Pubkey,
    pub validator: Pubkey,
    pub effective_stake: u64,
    pub start_period: u32,
    pub active: bool,
}

/// Emitted when a delegator asks to leave a validator.
#[event]
pub struct DelegationExitRequested {
    pub delegation_id: u64,
    pub validator: Pubkey,
    pub exit_period: u32,
    pub validator_effective_stake: u64,
}

/// Emitted when collateral is handed back to the owner.
#[event]
pub struct Unstaked {
    pub position: Pubkey,
    pub owner: Pubkey,
    pub amount: u64,
    pub forced: bool,
}

/// Emitted for every successful claim.
#[event]
pub struct RewardsClaimed {
    pub delegation_id: u64,
    pub first_period: u32,
    pub last_period: u32,
    pub amount: u64,
}

/// Emitted when the oracle authority reports validator progress.
#[event]
pub struct ValidatorReported {
    pub validator: Pubkey,
    pub completed_periods: u32,
    pub status: u8,
}

/// Emitted when a finished delegation record is closed.
#[event]
pub struct DelegationClosed {
    pub delegation_id: u64,
    pub position: Pubkey,
}

/// Emitted when reward tokens are deposited into the treasury.
#[event]
pub struct TreasuryFunded {
    pub funder: Pubkey,
    pub amount: u64,
    pub treasury_balance: u64,
}
