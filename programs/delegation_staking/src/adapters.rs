//! Read/write seams to the collaborators the accounting engine does not own.
//!
//! The engine only ever sees a validator through [`PeriodOracle`] and a
//! position through [`PositionLedger`]. On chain these are backed by the
//! `ValidatorRecord` oracle feed and the `Position` account; tests plug in
//! their own implementations.

use anchor_lang::prelude::*;

use crate::constants::REWARD_FACTOR_DENOMINATOR;
use crate::error::StakingError;
use crate::state::{Position, ValidatorRecord, ValidatorStatus};

/// Validator progress as seen by the external staking system.
pub trait PeriodOracle {
    /// Number of periods the validator has fully completed.
    fn completed_periods(&self) -> u32;

    /// Current lifecycle status of the validator.
    fn validator_status(&self) -> ValidatorStatus;
}

impl PeriodOracle for ValidatorRecord {
    fn completed_periods(&self) -> u32 {
        self.completed_periods
    }

    fn validator_status(&self) -> ValidatorStatus {
        self.status
    }
}

/// Stake attributes of a position held by the registry.
pub trait PositionLedger {
    /// Collateral locked by the position.
    fn stake_of(&self) -> u64;

    /// Level the position was minted at.
    fn level_of(&self) -> u8;

    /// Collateral weighted by the level reward factor.
    fn effective_stake_of(&self) -> Result<u64>;

    /// Whether the collateral was already handed back.
    fn is_released(&self) -> bool;

    /// Mark the collateral as handed back and return the amount to transfer.
    fn release_collateral(&mut self) -> Result<u64>;
}

impl PositionLedger for Position {
    fn stake_of(&self) -> u64 {
        self.amount
    }

    fn level_of(&self) -> u8 {
        self.level_id
    }

    fn effective_stake_of(&self) -> Result<u64> {
        let weighted = (self.amount as u128)
            .checked_mul(self.reward_factor as u128)
            .ok_or(StakingError::MathOverflow)?
            / REWARD_FACTOR_DENOMINATOR as u128;

        u64::try_from(weighted).map_err(|_| error!(StakingError::MathOverflow))
    }

    fn is_released(&self) -> bool {
        self.released
    }

    fn release_collateral(&mut self) -> Result<u64> {
        require!(!self.released, StakingError::PositionReleased);

        self.released = true;
        Ok(self.amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn position(amount: u64, reward_factor: u16) -> Position {
        Position {
            amount,
            reward_factor,
            level_id: 2,
            ..Position::default()
        }
    }

    #[test]
    fn effective_stake_is_weighted_by_level_factor() {
        assert_eq!(position(1_000, 100).effective_stake_of().unwrap(), 1_000);
        assert_eq!(position(1_000, 150).effective_stake_of().unwrap(), 1_500);
        assert_eq!(position(3, 150).effective_stake_of().unwrap(), 4);
        assert!(position(u64::MAX, 1_000).effective_stake_of().is_err());
        assert_eq!(position(7, 100).level_of(), 2);
    }

    #[test]
    fn collateral_is_released_once() {
        let mut p = position(500, 100);
        assert_eq!(p.stake_of(), 500);
        assert_eq!(p.release_collateral().unwrap(), 500);
        assert!(p.is_released());
        assert!(p.release_collateral().is_err());
    }
}
