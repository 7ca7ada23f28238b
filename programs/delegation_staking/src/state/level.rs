use anchor_lang::prelude::*;

use crate::constants::MAX_REWARD_FACTOR;
use crate::error::StakingError;

#[account]
#[derive(Default, Debug)]
pub struct Level {
    pub stake_pool: Pubkey,
    pub level_id: u8,
    pub required_stake: u64,
    pub scaled_reward_factor: u16,
    pub bump: u8,
}

impl Level {
    pub const LEN: usize = 8 + 32 + 1 + 8 + 2 + 1;

    pub fn validate(required_stake: u64, scaled_reward_factor: u16) -> Result<()> {
        require!(required_stake > 0, StakingError::ZeroAmount);
        require!(
            scaled_reward_factor > 0 && scaled_reward_factor <= MAX_REWARD_FACTOR,
            StakingError::InvalidRewardFactor
        );
        Ok(())
    }
}
