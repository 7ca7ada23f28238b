use anchor_lang::prelude::*;

use crate::accounting::ClaimWindow;
use crate::error::StakingError;
use crate::state::{Delegation, ValidatorAggregate};

/// Share of one period's emission owed to a delegator.
///
/// rewards = emission_per_period * delegator_stake / delegators_stake, floored per period.
pub fn period_reward(
    emission_per_period: u64,
    delegator_stake: u64,
    delegators_stake: u64,
) -> Result<u64> {
    if delegator_stake == 0 || delegators_stake == 0 {
        return Ok(0);
    }
    require!(
        delegator_stake <= delegators_stake,
        StakingError::ArithmeticUnderflow
    );

    let reward = (emission_per_period as u128)
        .checked_mul(delegator_stake as u128)
        .ok_or(StakingError::MathOverflow)?
        / delegators_stake as u128;

    u64::try_from(reward).map_err(|_| error!(StakingError::MathOverflow))
}

/// Total reward for `window`, priced against the validator's stake history.
///
/// The denominator of each period is the stake of every delegation whose
/// own interval covered that period, so exits recorded later do not shift
/// shares of periods that already completed.
pub fn settle_window(
    delegation: &Delegation,
    aggregate: &ValidatorAggregate,
    window: ClaimWindow,
    emission_per_period: u64,
) -> Result<u64> {
    if window.is_empty() {
        return Ok(0);
    }

    let schedule = aggregate.stake_schedule(window.first_claimable, window.last_claimable)?;

    let mut total: u64 = 0;
    for (period, delegators_stake) in (window.first_claimable..=window.last_claimable).zip(schedule) {
        if !delegation.covers(period) {
            continue;
        }
        let reward = period_reward(emission_per_period, delegation.effective_stake, delegators_stake)?;
        total = total.checked_add(reward).ok_or(StakingError::MathOverflow)?;
    }
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::DelegationStatus;

    fn delegation(effective_stake: u64, start_period: u32, exit_period: Option<u32>) -> Delegation {
        Delegation {
            effective_stake,
            start_period,
            exit_period,
            status: DelegationStatus::Active,
            stake_applied: exit_period.is_none(),
            ..Delegation::default()
        }
    }

    #[test]
    fn period_reward_is_pro_rata() {
        assert_eq!(period_reward(1_000, 1, 2).unwrap(), 500);
        assert_eq!(period_reward(1_000, 150, 250).unwrap(), 600);
        assert_eq!(period_reward(1_000, 1, 3).unwrap(), 333);
        assert_eq!(period_reward(1_000, 0, 3).unwrap(), 0);
        assert_eq!(period_reward(1_000, 5, 0).unwrap(), 0);
        assert!(period_reward(1_000, 4, 3).is_err());
    }

    #[test]
    fn period_reward_handles_large_emission() {
        let reward = period_reward(u64::MAX, 1, 1).unwrap();
        assert_eq!(reward, u64::MAX);
    }

    #[test]
    fn sole_delegator_earns_full_emission() {
        let mut aggregate = ValidatorAggregate::default();
        aggregate.open_interval(0, 10).unwrap();
        let d = delegation(10, 0, None);

        let window = ClaimWindow { first_claimable: 0, last_claimable: 4 };
        assert_eq!(settle_window(&d, &aggregate, window, 100).unwrap(), 500);
    }

    #[test]
    fn later_exit_does_not_dilute_completed_periods() {
        let mut aggregate = ValidatorAggregate::default();
        aggregate.open_interval(0, 1).unwrap();
        aggregate.open_interval(0, 1).unwrap();
        let stayer = delegation(1, 0, None);
        let window = ClaimWindow { first_claimable: 0, last_claimable: 4 };

        let before = settle_window(&stayer, &aggregate, window, 100).unwrap();
        // The other delegator leaves at the end of period 5.
        aggregate.close_interval(6, 1).unwrap();
        let after = settle_window(&stayer, &aggregate, window, 100).unwrap();

        assert_eq!(before, 250);
        assert_eq!(after, before);

        let tail = ClaimWindow { first_claimable: 5, last_claimable: 7 };
        assert_eq!(settle_window(&stayer, &aggregate, tail, 100).unwrap(), 50 + 100 + 100);
    }

    #[test]
    fn periods_outside_own_interval_pay_nothing() {
        let mut aggregate = ValidatorAggregate::default();
        aggregate.open_interval(0, 10).unwrap();
        aggregate.open_interval(3, 10).unwrap();
        aggregate.close_interval(5, 10).unwrap();
        let late = delegation(10, 3, Some(5));

        let window = ClaimWindow { first_claimable: 0, last_claimable: 9 };
        assert_eq!(settle_window(&late, &aggregate, window, 100).unwrap(), 100);
    }

    #[test]
    fn level_weighting_shifts_shares() {
        let mut aggregate = ValidatorAggregate::default();
        // 1.5x and 1.0x positions of equal collateral.
        aggregate.open_interval(0, 150).unwrap();
        aggregate.open_interval(0, 100).unwrap();
        let strong = delegation(150, 0, None);
        let base = delegation(100, 0, None);
        let window = ClaimWindow { first_claimable: 0, last_claimable: 0 };

        assert_eq!(settle_window(&strong, &aggregate, window, 1_000).unwrap(), 600);
        assert_eq!(settle_window(&base, &aggregate, window, 1_000).unwrap(), 400);
    }

    #[test]
    fn empty_window_settles_to_zero() {
        let aggregate = ValidatorAggregate::default();
        let d = delegation(10, 0, None);
        assert_eq!(settle_window(&d, &aggregate, ClaimWindow::EMPTY, 100).unwrap(), 0);
    }
}
