use anchor_lang::prelude::*;

use crate::constants::MAX_CLAIMABLE_PERIODS_LIMIT;
use crate::error::StakingError;

#[account]
#[derive(Default, Debug)]
pub struct StakePool {
    pub authority: Pubkey,
    pub oracle_authority: Pubkey,
    pub collateral_mint: Pubkey,
    pub reward_mint: Pubkey,
    pub staking_vault: Pubkey,
    pub treasury_vault: Pubkey,

    /// Reward split among a validator's delegators for every completed period.
    pub emission_per_period: u64,
    pub max_claimable_periods: u32,

    pub total_staked: u64,
    pub total_distributed: u64,
    pub next_position_id: u64,
    pub next_delegation_id: u64,

    pub paused: bool,

    pub last_updated: i64,
    pub created_at: i64,

    pub vault_bump: u8,
    pub treasury_bump: u8,
    pub bump: u8,
}

impl StakePool {
    pub const LEN: usize = 8
        + (32 * 6)
        + 8 + 4
        + (8 * 4)
        + 1
        + (8 * 2)
        + 3;

    pub fn validate_claim_batch(max_claimable_periods: u32) -> Result<()> {
        require!(
            max_claimable_periods > 0 && max_claimable_periods <= MAX_CLAIMABLE_PERIODS_LIMIT,
            StakingError::InvalidClaimBatch
        );
        Ok(())
    }

    /// Hand out the next position id (ids start at 1).
    pub fn allocate_position_id(&mut self) -> Result<u64> {
        let id = self.next_position_id;
        self.next_position_id = id.checked_add(1).ok_or(StakingError::MathOverflow)?;
        Ok(id)
    }

    /// Hand out the next delegation id (ids start at 1, 0 means "never delegated").
    pub fn allocate_delegation_id(&mut self) -> Result<u64> {
        let id = self.next_delegation_id;
        self.next_delegation_id = id.checked_add(1).ok_or(StakingError::MathOverflow)?;
        Ok(id)
    }
}
