use anchor_lang::prelude::*;

use crate::adapters::PeriodOracle;
use crate::error::StakingError;
use crate::state::{Delegation, DelegationStatus, ValidatorAggregate};

/// Collateral locked by one `stake` call.
#[account]
#[derive(Default, Debug)]
pub struct Position {
    pub position_id: u64,
    pub owner: Pubkey,
    pub stake_pool: Pubkey,

    pub level_id: u8,
    pub amount: u64,
    /// Level reward factor at mint time; later level edits do not reweight live stake.
    pub reward_factor: u16,
    pub minted_at: i64,

    /// Current delegation, zero until the position is first delegated.
    pub delegation_id: u64,
    pub released: bool,
    pub bump: u8,
}

impl Position {
    pub const LEN: usize = 8 + 8 + 32 + 32 + 1 + 8 + 2 + 8 + 8 + 1 + 1;

    pub fn is_delegated(&self) -> bool {
        self.delegation_id != 0
    }

    /// Clear the way for a new delegation of this position.
    ///
    /// A position that delegated before must hand in its current delegation,
    /// and that delegation must be effectively exited. It is finalized here;
    /// its stake already left the old validator on exit, so the aggregate is
    /// only needed when the validator disappeared under a live delegation.
    pub fn prepare_delegation<O: PeriodOracle>(
        &self,
        current: Option<(&mut Delegation, &O, Option<&mut ValidatorAggregate>)>,
    ) -> Result<()> {
        require!(!self.released, StakingError::InvalidState);
        if !self.is_delegated() {
            return Ok(());
        }

        let Some((delegation, oracle, aggregate)) = current else {
            return err!(StakingError::InvalidState);
        };
        require!(
            delegation.delegation_id == self.delegation_id,
            StakingError::PositionMismatch
        );
        require!(
            delegation.is_effectively_exited(oracle),
            StakingError::InvalidState
        );

        if delegation.status != DelegationStatus::Exited {
            delegation.finalize_exit(oracle, aggregate)?;
        }
        Ok(())
    }

    /// Effective stake the position currently backs its validator with.
    ///
    /// Zero for a position that never delegated, was released, or whose
    /// delegation has stopped earning.
    pub fn current_effective_stake<O: PeriodOracle>(
        &self,
        current: Option<(&Delegation, &O)>,
    ) -> Result<u64> {
        if self.released || !self.is_delegated() {
            return Ok(0);
        }

        let Some((delegation, oracle)) = current else {
            return err!(StakingError::PositionMismatch);
        };
        require!(
            delegation.delegation_id == self.delegation_id,
            StakingError::PositionMismatch
        );
        Ok(delegation.live_effective_stake(oracle.completed_periods()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::ValidatorStatus;

    struct Oracle {
        completed: u32,
        status: ValidatorStatus,
    }

    impl PeriodOracle for Oracle {
        fn completed_periods(&self) -> u32 {
            self.completed
        }

        fn validator_status(&self) -> ValidatorStatus {
            self.status
        }
    }

    fn delegated(aggregate: &mut ValidatorAggregate) -> (Position, Delegation) {
        let mut delegation = Delegation::default();
        delegation
            .open(
                7,
                Pubkey::new_unique(),
                Pubkey::new_unique(),
                10,
                &Oracle { completed: 0, status: ValidatorStatus::Active },
                aggregate,
            )
            .unwrap();
        let position = Position {
            amount: 10,
            reward_factor: 100,
            delegation_id: 7,
            ..Position::default()
        };
        (position, delegation)
    }

    #[test]
    fn fresh_position_delegates_without_a_current_record() {
        let position = Position::default();
        assert!(position.prepare_delegation::<Oracle>(None).is_ok());

        let released = Position {
            released: true,
            ..Position::default()
        };
        assert!(released.prepare_delegation::<Oracle>(None).is_err());
    }

    #[test]
    fn live_delegation_blocks_the_next_one() {
        let mut aggregate = ValidatorAggregate::default();
        let (position, mut delegation) = delegated(&mut aggregate);
        let live = Oracle { completed: 2, status: ValidatorStatus::Active };

        assert!(position.prepare_delegation::<Oracle>(None).is_err());
        assert!(position
            .prepare_delegation(Some((&mut delegation, &live, None)))
            .is_err());

        delegation.request_exit(&live, &mut aggregate).unwrap();
        assert!(position
            .prepare_delegation(Some((&mut delegation, &live, None)))
            .is_err());
        assert_eq!(delegation.status, DelegationStatus::Exiting);

        let reached = Oracle { completed: 3, status: ValidatorStatus::Active };
        position
            .prepare_delegation(Some((&mut delegation, &reached, None)))
            .unwrap();
        assert_eq!(delegation.status, DelegationStatus::Exited);
    }

    #[test]
    fn vanished_validator_releases_a_live_delegation_once() {
        let mut aggregate = ValidatorAggregate::default();
        let (position, mut delegation) = delegated(&mut aggregate);
        let gone = Oracle { completed: 4, status: ValidatorStatus::Unknown };

        position
            .prepare_delegation(Some((&mut delegation, &gone, Some(&mut aggregate))))
            .unwrap();
        assert_eq!(delegation.status, DelegationStatus::Exited);
        assert_eq!(delegation.exit_period, Some(5));
        assert_eq!(aggregate.effective_stake, 0);
        assert_eq!(aggregate.delegator_count, 0);
    }

    #[test]
    fn foreign_delegation_is_rejected() {
        let mut aggregate = ValidatorAggregate::default();
        let (mut position, mut delegation) = delegated(&mut aggregate);
        position.delegation_id = 8;
        let gone = Oracle { completed: 4, status: ValidatorStatus::Exited };

        assert_eq!(
            position
                .prepare_delegation(Some((&mut delegation, &gone, Some(&mut aggregate))))
                .unwrap_err(),
            anchor_lang::error::Error::from(StakingError::PositionMismatch)
        );
        assert_eq!(
            position
                .current_effective_stake(Some((&delegation, &gone)))
                .unwrap_err(),
            anchor_lang::error::Error::from(StakingError::PositionMismatch)
        );
    }

    #[test]
    fn current_effective_stake_tracks_the_delegation() {
        let mut aggregate = ValidatorAggregate::default();
        let (mut position, mut delegation) = delegated(&mut aggregate);
        let live = Oracle { completed: 2, status: ValidatorStatus::Active };

        assert_eq!(Position::default().current_effective_stake::<Oracle>(None).unwrap(), 0);
        assert_eq!(position.current_effective_stake(Some((&delegation, &live))).unwrap(), 10);

        delegation.request_exit(&live, &mut aggregate).unwrap();
        assert_eq!(position.current_effective_stake(Some((&delegation, &live))).unwrap(), 10);
        let after = Oracle { completed: 3, status: ValidatorStatus::Active };
        assert_eq!(position.current_effective_stake(Some((&delegation, &after))).unwrap(), 0);

        position.released = true;
        assert_eq!(position.current_effective_stake::<Oracle>(None).unwrap(), 0);
    }
}
