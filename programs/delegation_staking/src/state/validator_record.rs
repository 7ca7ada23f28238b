use anchor_lang::prelude::*;
use anchor_lang::prelude::borsh;

use crate::error::StakingError;

/// Validator lifecycle as reported by the staking oracle.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ValidatorStatus {
    #[default]
    Unknown,
    Queued,
    Active,
    Exited,
}

impl ValidatorStatus {
    /// Whether new delegations may target a validator in this status.
    pub fn accepts_delegations(self) -> bool {
        matches!(self, ValidatorStatus::Queued | ValidatorStatus::Active)
    }

    /// Unknown and exited validators no longer make delegators wait for their exit period.
    pub fn allows_forced_exit(self) -> bool {
        matches!(self, ValidatorStatus::Unknown | ValidatorStatus::Exited)
    }
}

/// Oracle feed for one validator, written only by the pool's oracle authority.
#[account]
#[derive(Default, Debug)]
pub struct ValidatorRecord {
    pub stake_pool: Pubkey,
    pub validator: Pubkey,

    pub completed_periods: u32,
    pub status: ValidatorStatus,

    pub last_reported_at: i64,
    pub bump: u8,
}

impl ValidatorRecord {
    pub const LEN: usize = 8 + 32 + 32 + 4 + 1 + 8 + 1;

    /// Apply an oracle report; completed periods never move backwards.
    pub fn apply_report(
        &mut self,
        completed_periods: u32,
        status: ValidatorStatus,
        now: i64,
    ) -> Result<()> {
        require!(
            completed_periods >= self.completed_periods,
            StakingError::PeriodRegression
        );

        self.completed_periods = completed_periods;
        self.status = status;
        self.last_reported_at = now;
        Ok(())
    }
}
