use anchor_lang::prelude::*;
use anchor_lang::prelude::borsh;

use crate::accounting::{claimable_window, settle_window, ClaimWindow};
use crate::adapters::{PeriodOracle, PositionLedger};
use crate::error::StakingError;
use crate::state::{StakePool, ValidatorAggregate, ValidatorStatus};

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DelegationStatus {
    #[default]
    Pending,
    Active,
    Exiting,
    Exited,
}

/// Assignment of one position's stake to a validator.
///
/// `stake_applied` records whether the stake is currently counted in the
/// validator aggregate's live total. It is set once on activation and cleared
/// once on exit; every aggregate mutation goes through that flag.
#[account]
#[derive(Default, Debug)]
pub struct Delegation {
    pub delegation_id: u64,
    pub position: Pubkey,
    pub validator: Pubkey,

    pub effective_stake: u64,
    pub start_period: u32,
    /// First period the delegator is no longer entitled to. Set at most once.
    pub exit_period: Option<u32>,
    pub last_claimed_period: Option<u32>,

    pub status: DelegationStatus,
    pub stake_applied: bool,

    pub total_rewards_claimed: u64,
    pub bump: u8,
}

impl Delegation {
    pub const LEN: usize = 8 + 8 + 32 + 32 + 8 + 4 + (1 + 4) + (1 + 4) + 1 + 1 + 8 + 1;

    /// Open a delegation against a validator and register its stake.
    ///
    /// Delegations to a queued validator start with the validator's own
    /// activation period and stay pending until it is reached. A record that
    /// was already opened cannot be reopened. Nothing is written unless every
    /// check and checked sum succeeds.
    pub fn open<O: PeriodOracle>(
        &mut self,
        delegation_id: u64,
        position: Pubkey,
        validator: Pubkey,
        effective_stake: u64,
        oracle: &O,
        aggregate: &mut ValidatorAggregate,
    ) -> Result<()> {
        require!(self.delegation_id == 0, StakingError::InvalidState);

        let status = oracle.validator_status();
        require!(status.accepts_delegations(), StakingError::ValidatorUnavailable);
        require!(effective_stake > 0, StakingError::ZeroAmount);
        aggregate.ensure_capacity()?;

        let completed = oracle.completed_periods();
        let start_period = match status {
            ValidatorStatus::Queued => completed
                .checked_add(1)
                .ok_or(StakingError::MathOverflow)?,
            _ => completed,
        };
        let checkpoint = aggregate.staged_checkpoint(start_period, effective_stake, 0)?;

        let mut opened = Delegation {
            delegation_id,
            position,
            validator,
            effective_stake,
            start_period,
            bump: self.bump,
            ..Delegation::default()
        };
        opened.sync_activation(completed, aggregate)?;

        aggregate.store_checkpoint(checkpoint);
        aggregate.move_claim_cursor(None, opened.unsettled_from());
        *self = opened;
        Ok(())
    }

    /// Promote a pending delegation once the validator reaches its start period.
    pub fn sync_activation(
        &mut self,
        completed_periods: u32,
        aggregate: &mut ValidatorAggregate,
    ) -> Result<()> {
        if self.status == DelegationStatus::Pending && self.start_period <= completed_periods {
            aggregate.apply_activation(self)?;
            self.status = DelegationStatus::Active;
        }
        Ok(())
    }

    /// Stop the delegation at the end of the validator's current period.
    ///
    /// A pending delegation whose start was reached leaves without ever
    /// entering the live total; its interval still covers the periods it earned.
    pub fn request_exit<O: PeriodOracle>(
        &mut self,
        oracle: &O,
        aggregate: &mut ValidatorAggregate,
    ) -> Result<u32> {
        match self.status {
            DelegationStatus::Pending | DelegationStatus::Active => {}
            DelegationStatus::Exiting => return err!(StakingError::AlreadyExiting),
            DelegationStatus::Exited => return err!(StakingError::InvalidState),
        }

        self.begin_exit(oracle.completed_periods(), aggregate)
    }

    /// Finish the delegation so its collateral can be released.
    ///
    /// Exiting delegations wait for their exit period unless the validator is
    /// unknown or exited, and never touch the aggregate again. A delegation
    /// that never requested exit may only leave through that forced path,
    /// which needs the aggregate to withdraw its stake. Returns whether the
    /// exit was forced.
    pub fn finalize_exit<O: PeriodOracle>(
        &mut self,
        oracle: &O,
        aggregate: Option<&mut ValidatorAggregate>,
    ) -> Result<bool> {
        let completed = oracle.completed_periods();
        let forced = oracle.validator_status().allows_forced_exit();

        match self.status {
            DelegationStatus::Exiting => {
                let exit_period = self.exit_period.ok_or(StakingError::InvalidState)?;
                require!(
                    forced || completed >= exit_period,
                    StakingError::NotYetExitable
                );
            }
            DelegationStatus::Pending | DelegationStatus::Active => {
                require!(forced, StakingError::NotYetExitable);
                let aggregate = aggregate.ok_or(StakingError::MissingValidatorAggregate)?;
                self.begin_exit(completed, aggregate)?;
            }
            DelegationStatus::Exited => return err!(StakingError::InvalidState),
        }

        self.status = DelegationStatus::Exited;
        Ok(forced)
    }

    /// Whether the delegation has let go of its position, or may do so now.
    pub fn is_effectively_exited<O: PeriodOracle>(&self, oracle: &O) -> bool {
        let forced = oracle.validator_status().allows_forced_exit();
        match self.status {
            DelegationStatus::Exited => true,
            DelegationStatus::Exiting => {
                forced
                    || self
                        .exit_period
                        .map_or(false, |exit| oracle.completed_periods() >= exit)
            }
            DelegationStatus::Pending | DelegationStatus::Active => forced,
        }
    }

    /// Finalize the delegation and hand back its position's collateral.
    ///
    /// Returns the released amount and whether the exit was forced.
    pub fn settle_unstake<P: PositionLedger, O: PeriodOracle>(
        &mut self,
        position: &mut P,
        oracle: &O,
        aggregate: Option<&mut ValidatorAggregate>,
    ) -> Result<(u64, bool)> {
        require!(!position.is_released(), StakingError::PositionReleased);

        let forced = self.finalize_exit(oracle, aggregate)?;
        let amount = position.release_collateral()?;
        Ok((amount, forced))
    }

    /// Settle the next claim window against the validator's stake history.
    ///
    /// An empty window, a reward the treasury cannot cover and any overflow
    /// are all rejected before the delegation, the aggregate or the pool
    /// is written. Returns the settled window and the amount owed.
    pub fn settle_claim(
        &mut self,
        aggregate: &mut ValidatorAggregate,
        completed_periods: u32,
        stake_pool: &mut StakePool,
        treasury_balance: u64,
    ) -> Result<(ClaimWindow, u64)> {
        let window = self.claim_window(completed_periods, stake_pool.max_claimable_periods);
        require!(!window.is_empty(), StakingError::NothingToClaim);

        let amount = settle_window(self, aggregate, window, stake_pool.emission_per_period)?;
        require!(
            treasury_balance >= amount,
            StakingError::InsufficientTreasuryFunds
        );

        let total_distributed = stake_pool
            .total_distributed
            .checked_add(amount)
            .ok_or(StakingError::MathOverflow)?;
        let total_claimed = self
            .total_rewards_claimed
            .checked_add(amount)
            .ok_or(StakingError::MathOverflow)?;
        let cursor = self.unsettled_from();

        self.sync_activation(completed_periods, aggregate)?;

        self.last_claimed_period = Some(window.last_claimable);
        self.total_rewards_claimed = total_claimed;
        stake_pool.total_distributed = total_distributed;
        aggregate.move_claim_cursor(cursor, self.unsettled_from());
        aggregate.compact(completed_periods);

        Ok((window, amount))
    }

    fn begin_exit(&mut self, completed_periods: u32, aggregate: &mut ValidatorAggregate) -> Result<u32> {
        require!(self.exit_period.is_none(), StakingError::AlreadyExiting);

        let exit_period = completed_periods
            .checked_add(1)
            .ok_or(StakingError::MathOverflow)?;
        // A pending delegation exits before it ever started: empty interval.
        let checkpoint = aggregate.staged_checkpoint(
            exit_period.max(self.start_period),
            0,
            self.effective_stake,
        )?;
        let cursor = self.unsettled_from();

        aggregate.apply_removal(self)?;

        aggregate.store_checkpoint(checkpoint);
        self.exit_period = Some(exit_period);
        self.status = DelegationStatus::Exiting;
        aggregate.move_claim_cursor(cursor, self.unsettled_from());
        aggregate.compact(completed_periods);
        Ok(exit_period)
    }

    pub fn first_claimable_period(&self) -> Option<u32> {
        match self.last_claimed_period {
            Some(period) => period.checked_add(1),
            None => Some(self.start_period),
        }
    }

    /// Oldest period this delegation still has to claim, if any is left.
    pub fn unsettled_from(&self) -> Option<u32> {
        let first = self.first_claimable_period()?;
        match self.exit_period {
            Some(exit) if first >= exit => None,
            _ => Some(first),
        }
    }

    pub fn claim_window(&self, completed_periods: u32, max_claimable_periods: u32) -> ClaimWindow {
        match self.first_claimable_period() {
            Some(first) => {
                claimable_window(first, completed_periods, self.exit_period, max_claimable_periods)
            }
            None => ClaimWindow::EMPTY,
        }
    }

    /// Whether this delegation's stake earned rewards during `period`.
    pub fn covers(&self, period: u32) -> bool {
        period >= self.start_period && self.exit_period.map_or(true, |exit| period < exit)
    }

    /// Stake this delegation puts behind the validator's period in progress.
    pub fn live_effective_stake(&self, completed_periods: u32) -> u64 {
        if self.status == DelegationStatus::Exited || !self.covers(completed_periods) {
            return 0;
        }
        self.effective_stake
    }

    /// Exited and every entitled period already claimed.
    pub fn is_closable(&self) -> bool {
        self.status == DelegationStatus::Exited && self.unsettled_from().is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::Position;

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

    fn oracle(completed: u32, status: ValidatorStatus) -> Oracle {
        Oracle { completed, status }
    }

    fn open(oracle: &Oracle, aggregate: &mut ValidatorAggregate, stake: u64) -> Delegation {
        let mut delegation = Delegation::default();
        delegation
            .open(1, Pubkey::new_unique(), Pubkey::new_unique(), stake, oracle, aggregate)
            .unwrap();
        delegation
    }

    fn pool() -> StakePool {
        StakePool {
            emission_per_period: 100,
            max_claimable_periods: 100,
            ..StakePool::default()
        }
    }

    #[test]
    fn delegating_to_active_validator_applies_stake_immediately() {
        let mut aggregate = ValidatorAggregate::default();
        let d = open(&oracle(3, ValidatorStatus::Active), &mut aggregate, 10);

        assert_eq!(d.status, DelegationStatus::Active);
        assert_eq!(d.start_period, 3);
        assert!(d.stake_applied);
        assert_eq!(aggregate.effective_stake, 10);
        assert_eq!(aggregate.effective_stake_at(3).unwrap(), 10);
        assert_eq!(aggregate.effective_stake_at(2).unwrap(), 0);
        assert_eq!(aggregate.open_delegations, 1);
    }

    #[test]
    fn delegating_to_queued_validator_stays_pending() {
        let mut aggregate = ValidatorAggregate::default();
        let mut d = open(&oracle(3, ValidatorStatus::Queued), &mut aggregate, 10);

        assert_eq!(d.status, DelegationStatus::Pending);
        assert_eq!(d.start_period, 4);
        assert!(!d.stake_applied);
        assert_eq!(aggregate.effective_stake, 0);

        d.sync_activation(4, &mut aggregate).unwrap();
        assert_eq!(d.status, DelegationStatus::Active);
        assert_eq!(aggregate.effective_stake, 10);
    }

    #[test]
    fn unavailable_validator_rejects_delegation_without_side_effects() {
        for status in [ValidatorStatus::Unknown, ValidatorStatus::Exited] {
            let mut aggregate = ValidatorAggregate::default();
            let mut d = Delegation::default();
            let result = d.open(
                1,
                Pubkey::new_unique(),
                Pubkey::new_unique(),
                10,
                &oracle(2, status),
                &mut aggregate,
            );
            assert!(result.is_err());
            assert!(aggregate.checkpoints.is_empty());
            assert_eq!(d.delegation_id, 0);
        }
    }

    #[test]
    fn opened_record_cannot_be_reopened() {
        let mut aggregate = ValidatorAggregate::default();
        let mut d = open(&oracle(0, ValidatorStatus::Active), &mut aggregate, 10);
        let result = d.open(
            2,
            Pubkey::new_unique(),
            Pubkey::new_unique(),
            10,
            &oracle(0, ValidatorStatus::Active),
            &mut aggregate,
        );

        assert_eq!(
            result.unwrap_err(),
            anchor_lang::error::Error::from(StakingError::InvalidState)
        );
        assert_eq!(d.delegation_id, 1);
        assert_eq!(aggregate.effective_stake, 10);
    }

    #[test]
    fn failed_open_leaves_aggregate_untouched() {
        let mut aggregate = ValidatorAggregate {
            effective_stake: u64::MAX - 5,
            ..ValidatorAggregate::default()
        };
        let mut d = Delegation::default();

        let result = d.open(
            1,
            Pubkey::new_unique(),
            Pubkey::new_unique(),
            10,
            &oracle(2, ValidatorStatus::Active),
            &mut aggregate,
        );

        assert_eq!(
            result.unwrap_err(),
            anchor_lang::error::Error::from(StakingError::MathOverflow)
        );
        assert!(aggregate.checkpoints.is_empty());
        assert!(aggregate.claim_cursors.is_empty());
        assert_eq!(aggregate.open_delegations, 0);
        assert_eq!(aggregate.effective_stake, u64::MAX - 5);
        assert_eq!(d.delegation_id, 0);
    }

    #[test]
    fn failed_exit_leaves_aggregate_untouched() {
        let mut aggregate = ValidatorAggregate::default();
        let mut d = open(&oracle(0, ValidatorStatus::Active), &mut aggregate, 10);
        // Live total out of step with the delegation: removal would underflow.
        aggregate.effective_stake = 4;
        let checkpoints = aggregate.checkpoints.clone();
        let cursors = aggregate.claim_cursors.clone();

        let result = d.request_exit(&oracle(3, ValidatorStatus::Active), &mut aggregate);

        assert_eq!(
            result.unwrap_err(),
            anchor_lang::error::Error::from(StakingError::ArithmeticUnderflow)
        );
        assert_eq!(aggregate.checkpoints, checkpoints);
        assert_eq!(aggregate.claim_cursors, cursors);
        assert_eq!(aggregate.effective_stake, 4);
        assert_eq!(d.exit_period, None);
        assert_eq!(d.status, DelegationStatus::Active);
        assert!(d.stake_applied);
    }

    #[test]
    fn exit_request_removes_stake_once() {
        let mut aggregate = ValidatorAggregate::default();
        let mut d = open(&oracle(0, ValidatorStatus::Active), &mut aggregate, 10);

        let exit = d.request_exit(&oracle(5, ValidatorStatus::Active), &mut aggregate).unwrap();
        assert_eq!(exit, 6);
        assert_eq!(d.status, DelegationStatus::Exiting);
        assert!(!d.stake_applied);
        assert_eq!(aggregate.effective_stake, 0);

        let again = d.request_exit(&oracle(7, ValidatorStatus::Active), &mut aggregate);
        assert!(again.is_err());
        assert_eq!(d.exit_period, Some(6));
        assert_eq!(aggregate.effective_stake, 0);
        assert_eq!(aggregate.effective_stake_at(5).unwrap(), 10);
        assert_eq!(aggregate.effective_stake_at(6).unwrap(), 0);
    }

    #[test]
    fn pending_exit_never_touches_live_total() {
        let mut aggregate = ValidatorAggregate::default();
        let mut d = open(&oracle(3, ValidatorStatus::Queued), &mut aggregate, 10);

        d.request_exit(&oracle(3, ValidatorStatus::Queued), &mut aggregate).unwrap();
        assert!(!d.stake_applied);
        assert_eq!(d.exit_period, Some(4));
        assert_eq!(aggregate.effective_stake, 0);
        for period in aggregate.history_start..10 {
            assert_eq!(aggregate.effective_stake_at(period).unwrap(), 0);
        }
        assert!(d.claim_window(50, 100).is_empty());
        assert_eq!(aggregate.open_delegations, 0);
    }

    #[test]
    fn finalize_waits_for_exit_period() {
        let mut aggregate = ValidatorAggregate::default();
        let mut d = open(&oracle(0, ValidatorStatus::Active), &mut aggregate, 10);
        d.request_exit(&oracle(2, ValidatorStatus::Active), &mut aggregate).unwrap();

        assert!(d.finalize_exit(&oracle(2, ValidatorStatus::Active), None).is_err());
        assert_eq!(d.status, DelegationStatus::Exiting);

        let forced = d.finalize_exit(&oracle(3, ValidatorStatus::Active), None).unwrap();
        assert!(!forced);
        assert_eq!(d.status, DelegationStatus::Exited);
        assert!(d.finalize_exit(&oracle(4, ValidatorStatus::Active), None).is_err());
    }

    #[test]
    fn finalize_after_exit_request_does_not_touch_aggregate() {
        for status in [
            ValidatorStatus::Exited,
            ValidatorStatus::Unknown,
            ValidatorStatus::Queued,
            ValidatorStatus::Active,
        ] {
            let mut aggregate = ValidatorAggregate::default();
            let mut d = open(&oracle(0, ValidatorStatus::Active), &mut aggregate, 10);
            d.request_exit(&oracle(2, ValidatorStatus::Active), &mut aggregate).unwrap();
            let snapshot = (aggregate.effective_stake, aggregate.checkpoints.clone());

            d.finalize_exit(&oracle(3, status), Some(&mut aggregate)).unwrap();
            assert_eq!(d.status, DelegationStatus::Exited);
            assert_eq!((aggregate.effective_stake, aggregate.checkpoints.clone()), snapshot);
        }
    }

    #[test]
    fn forced_exit_without_request_removes_stake_once() {
        let mut aggregate = ValidatorAggregate::default();
        let mut d = open(&oracle(0, ValidatorStatus::Active), &mut aggregate, 10);

        assert!(d
            .finalize_exit(&oracle(4, ValidatorStatus::Active), Some(&mut aggregate))
            .is_err());
        assert!(d.stake_applied);

        assert_eq!(
            d.finalize_exit(&oracle(4, ValidatorStatus::Unknown), None)
                .unwrap_err(),
            anchor_lang::error::Error::from(StakingError::MissingValidatorAggregate)
        );
        assert_eq!(d.status, DelegationStatus::Active);

        let forced = d
            .finalize_exit(&oracle(4, ValidatorStatus::Unknown), Some(&mut aggregate))
            .unwrap();
        assert!(forced);
        assert_eq!(d.exit_period, Some(5));
        assert_eq!(d.status, DelegationStatus::Exited);
        assert_eq!(aggregate.effective_stake, 0);
        assert_eq!(aggregate.effective_stake_at(4).unwrap(), 10);
    }

    #[test]
    fn unstake_checks_collateral_before_finalizing() {
        let mut aggregate = ValidatorAggregate::default();
        let mut d = open(&oracle(0, ValidatorStatus::Active), &mut aggregate, 10);
        d.request_exit(&oracle(2, ValidatorStatus::Active), &mut aggregate).unwrap();
        let mut position = Position {
            amount: 10,
            released: true,
            ..Position::default()
        };

        let result = d.settle_unstake(&mut position, &oracle(3, ValidatorStatus::Active), None);
        assert_eq!(
            result.unwrap_err(),
            anchor_lang::error::Error::from(StakingError::PositionReleased)
        );
        assert_eq!(d.status, DelegationStatus::Exiting);

        position.released = false;
        let (amount, forced) = d
            .settle_unstake(&mut position, &oracle(3, ValidatorStatus::Active), None)
            .unwrap();
        assert_eq!((amount, forced), (10, false));
        assert!(position.released);
        assert_eq!(d.status, DelegationStatus::Exited);
    }

    #[test]
    fn effective_exit_follows_exit_period_or_validator_status() {
        let mut aggregate = ValidatorAggregate::default();
        let mut d = open(&oracle(0, ValidatorStatus::Active), &mut aggregate, 10);
        assert!(!d.is_effectively_exited(&oracle(9, ValidatorStatus::Active)));
        assert!(d.is_effectively_exited(&oracle(9, ValidatorStatus::Exited)));

        d.request_exit(&oracle(2, ValidatorStatus::Active), &mut aggregate).unwrap();
        assert!(!d.is_effectively_exited(&oracle(2, ValidatorStatus::Active)));
        assert!(d.is_effectively_exited(&oracle(3, ValidatorStatus::Active)));
        assert!(d.is_effectively_exited(&oracle(2, ValidatorStatus::Unknown)));
    }

    #[test]
    fn live_stake_ends_with_the_exit() {
        let mut aggregate = ValidatorAggregate::default();
        let mut d = open(&oracle(1, ValidatorStatus::Queued), &mut aggregate, 10);
        assert_eq!(d.live_effective_stake(1), 0);
        assert_eq!(d.live_effective_stake(2), 10);

        d.request_exit(&oracle(4, ValidatorStatus::Active), &mut aggregate).unwrap();
        assert_eq!(d.live_effective_stake(4), 10);
        assert_eq!(d.live_effective_stake(5), 0);

        d.finalize_exit(&oracle(4, ValidatorStatus::Exited), None).unwrap();
        assert_eq!(d.live_effective_stake(4), 0);
    }

    #[test]
    fn claim_cursor_only_moves_forward() {
        let mut aggregate = ValidatorAggregate::default();
        let mut d = open(&oracle(2, ValidatorStatus::Active), &mut aggregate, 10);
        let mut stake_pool = pool();

        let (window, amount) = d
            .settle_claim(&mut aggregate, 6, &mut stake_pool, u64::MAX)
            .unwrap();
        assert_eq!(window, ClaimWindow { first_claimable: 2, last_claimable: 5 });
        assert_eq!(amount, 400);
        assert_eq!(d.last_claimed_period, Some(5));
        assert_eq!(d.total_rewards_claimed, 400);
        assert_eq!(stake_pool.total_distributed, 400);
        assert_eq!(aggregate.claim_cursors[0].period, 6);
        assert_eq!(aggregate.history_start, 6);

        assert!(d.claim_window(6, 100).is_empty());
        assert_eq!(
            d.settle_claim(&mut aggregate, 6, &mut stake_pool, u64::MAX)
                .unwrap_err(),
            anchor_lang::error::Error::from(StakingError::NothingToClaim)
        );
        assert_eq!(d.total_rewards_claimed, 400);
    }

    #[test]
    fn uncovered_claim_writes_nothing() {
        let mut aggregate = ValidatorAggregate::default();
        let mut d = open(&oracle(0, ValidatorStatus::Active), &mut aggregate, 10);
        let mut stake_pool = pool();

        let result = d.settle_claim(&mut aggregate, 3, &mut stake_pool, 299);
        assert_eq!(
            result.unwrap_err(),
            anchor_lang::error::Error::from(StakingError::InsufficientTreasuryFunds)
        );
        assert_eq!(d.last_claimed_period, None);
        assert_eq!(d.total_rewards_claimed, 0);
        assert_eq!(stake_pool.total_distributed, 0);
        assert_eq!(aggregate.claim_cursors[0].period, 0);

        let (_, amount) = d.settle_claim(&mut aggregate, 3, &mut stake_pool, 300).unwrap();
        assert_eq!(amount, 300);
    }

    #[test]
    fn closable_once_exited_and_fully_claimed() {
        let mut d = Delegation {
            start_period: 0,
            exit_period: Some(6),
            status: DelegationStatus::Exited,
            ..Delegation::default()
        };
        assert!(!d.is_closable());
        d.last_claimed_period = Some(4);
        assert!(!d.is_closable());
        d.last_claimed_period = Some(5);
        assert!(d.is_closable());

        let never_started = Delegation {
            start_period: 4,
            exit_period: Some(4),
            status: DelegationStatus::Exited,
            ..Delegation::default()
        };
        assert!(never_started.is_closable());

        d.status = DelegationStatus::Exiting;
        assert!(!d.is_closable());
    }
}
