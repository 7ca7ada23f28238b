use anchor_lang::prelude::*;

use crate::constants::{MAX_OPEN_DELEGATIONS, MAX_STAKE_CHECKPOINTS};
use crate::error::StakingError;
use crate::state::Delegation;

/// Stake entering and leaving a validator's delegator set at one period.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StakeCheckpoint {
    pub period: u32,
    pub added: u64,
    pub removed: u64,
}

impl StakeCheckpoint {
    pub const LEN: usize = 4 + 8 + 8;
}

/// Number of delegations whose oldest unsettled period is `period`.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ClaimCursor {
    pub period: u32,
    pub delegations: u32,
}

impl ClaimCursor {
    pub const LEN: usize = 4 + 4;
}

/// Per-validator stake totals.
///
/// `effective_stake` is the live total of delegations whose `stake_applied`
/// flag is set and only moves through [`ValidatorAggregate::apply_activation`]
/// and [`ValidatorAggregate::apply_removal`].
///
/// `checkpoints` holds every delegation's `[start_period, exit_period)`
/// interval as period deltas, sorted by period. It is the reward denominator:
/// writes only land on periods the validator has not completed yet, so the
/// stake of a completed period never changes after the fact.
///
/// The history is bounded. `claim_cursors` tracks the oldest period each
/// unsettled delegation still has to claim, and everything before the oldest
/// cursor is folded into a single checkpoint at `history_start`.
#[account]
#[derive(Default, Debug)]
pub struct ValidatorAggregate {
    pub stake_pool: Pubkey,
    pub validator: Pubkey,

    pub effective_stake: u64,
    pub delegator_count: u32,

    /// Delegations with periods still to settle.
    pub open_delegations: u32,
    /// First period whose stake can still be read back.
    pub history_start: u32,

    pub checkpoints: Vec<StakeCheckpoint>,
    pub claim_cursors: Vec<ClaimCursor>,
    pub bump: u8,
}

impl ValidatorAggregate {
    /// Allocated once at registration for the full capacity.
    pub const LEN: usize = 8
        + 32 + 32
        + 8 + 4
        + 4 + 4
        + (4 + MAX_STAKE_CHECKPOINTS * StakeCheckpoint::LEN)
        + (4 + MAX_OPEN_DELEGATIONS as usize * ClaimCursor::LEN)
        + 1;

    /// Room for one more delegation: its start, its own exit and the exit of
    /// every delegation already open.
    pub fn ensure_capacity(&self) -> Result<()> {
        let reserved = self
            .checkpoints
            .len()
            .saturating_add(2)
            .saturating_add(self.open_delegations as usize);
        require!(
            self.open_delegations < MAX_OPEN_DELEGATIONS && reserved <= MAX_STAKE_CHECKPOINTS,
            StakingError::ValidatorAtCapacity
        );
        Ok(())
    }

    /// Count a delegation's stake towards the live total, at most once.
    pub fn apply_activation(&mut self, delegation: &mut Delegation) -> Result<()> {
        if delegation.stake_applied {
            return Ok(());
        }

        let effective_stake = self
            .effective_stake
            .checked_add(delegation.effective_stake)
            .ok_or(StakingError::MathOverflow)?;
        let delegator_count = self
            .delegator_count
            .checked_add(1)
            .ok_or(StakingError::MathOverflow)?;

        self.effective_stake = effective_stake;
        self.delegator_count = delegator_count;
        delegation.stake_applied = true;
        Ok(())
    }

    /// Withdraw a delegation's stake from the live total, at most once.
    pub fn apply_removal(&mut self, delegation: &mut Delegation) -> Result<()> {
        if !delegation.stake_applied {
            return Ok(());
        }

        let effective_stake = self
            .effective_stake
            .checked_sub(delegation.effective_stake)
            .ok_or(StakingError::ArithmeticUnderflow)?;
        let delegator_count = self
            .delegator_count
            .checked_sub(1)
            .ok_or(StakingError::ArithmeticUnderflow)?;

        self.effective_stake = effective_stake;
        self.delegator_count = delegator_count;
        delegation.stake_applied = false;
        Ok(())
    }

    /// The checkpoint at `period` with the given deltas added, without storing it.
    pub fn staged_checkpoint(&self, period: u32, added: u64, removed: u64) -> Result<StakeCheckpoint> {
        let current = match self.checkpoint_index(period) {
            Ok(index) => self.checkpoints[index],
            Err(_) => StakeCheckpoint {
                period,
                ..StakeCheckpoint::default()
            },
        };

        Ok(StakeCheckpoint {
            period,
            added: current
                .added
                .checked_add(added)
                .ok_or(StakingError::MathOverflow)?,
            removed: current
                .removed
                .checked_add(removed)
                .ok_or(StakingError::MathOverflow)?,
        })
    }

    /// Write a checkpoint produced by [`ValidatorAggregate::staged_checkpoint`].
    pub fn store_checkpoint(&mut self, checkpoint: StakeCheckpoint) {
        match self.checkpoint_index(checkpoint.period) {
            Ok(index) => self.checkpoints[index] = checkpoint,
            Err(index) => self.checkpoints.insert(index, checkpoint),
        }
    }

    /// Record stake entitled to rewards from `period` onwards.
    pub fn open_interval(&mut self, period: u32, amount: u64) -> Result<()> {
        let checkpoint = self.staged_checkpoint(period, amount, 0)?;
        self.store_checkpoint(checkpoint);
        Ok(())
    }

    /// Record stake no longer entitled to rewards from `period` onwards.
    pub fn close_interval(&mut self, period: u32, amount: u64) -> Result<()> {
        let checkpoint = self.staged_checkpoint(period, 0, amount)?;
        self.store_checkpoint(checkpoint);
        Ok(())
    }

    /// Total delegated stake entitled to rewards during `period`.
    pub fn effective_stake_at(&self, period: u32) -> Result<u64> {
        require!(period >= self.history_start, StakingError::HistoryCompacted);

        let mut stake: u64 = 0;
        for checkpoint in self.checkpoints.iter().take_while(|c| c.period <= period) {
            stake = apply_checkpoint(stake, checkpoint)?;
        }
        Ok(stake)
    }

    /// Delegated stake for every period in `first..=last`, in one pass over the history.
    pub fn stake_schedule(&self, first: u32, last: u32) -> Result<Vec<u64>> {
        if first > last {
            return Ok(Vec::new());
        }
        require!(first >= self.history_start, StakingError::HistoryCompacted);

        let mut schedule = Vec::with_capacity((last - first) as usize + 1);
        let mut checkpoints = self.checkpoints.iter().peekable();
        let mut stake: u64 = 0;

        for period in first..=last {
            while let Some(checkpoint) = checkpoints.next_if(|c| c.period <= period) {
                stake = apply_checkpoint(stake, checkpoint)?;
            }
            schedule.push(stake);
        }
        Ok(schedule)
    }

    /// Move one delegation's oldest unsettled period from `from` to `to`.
    ///
    /// `None` on either side means the delegation is not tracked there: not
    /// yet opened, or fully settled.
    pub fn move_claim_cursor(&mut self, from: Option<u32>, to: Option<u32>) {
        if from == to {
            return;
        }

        if let Some(period) = from {
            if let Ok(index) = self.cursor_index(period) {
                let cursor = &mut self.claim_cursors[index];
                cursor.delegations = cursor.delegations.saturating_sub(1);
                if cursor.delegations == 0 {
                    self.claim_cursors.remove(index);
                }
                self.open_delegations = self.open_delegations.saturating_sub(1);
            }
        }

        if let Some(period) = to {
            match self.cursor_index(period) {
                Ok(index) => {
                    let cursor = &mut self.claim_cursors[index];
                    cursor.delegations = cursor.delegations.saturating_add(1);
                }
                Err(index) => self.claim_cursors.insert(
                    index,
                    ClaimCursor {
                        period,
                        delegations: 1,
                    },
                ),
            }
            self.open_delegations = self.open_delegations.saturating_add(1);
        }
    }

    /// Fold every checkpoint no open delegation can still ask about.
    ///
    /// The horizon is the oldest claim cursor, capped at the validator's
    /// completed periods since new delegations start there. Stake at and
    /// after the horizon reads back unchanged.
    pub fn compact(&mut self, completed_periods: u32) {
        let horizon = self
            .claim_cursors
            .first()
            .map_or(completed_periods, |cursor| cursor.period.min(completed_periods));
        if horizon <= self.history_start {
            return;
        }

        let Ok(base) = self.effective_stake_at(horizon) else {
            return;
        };
        let folded = self.checkpoints.partition_point(|c| c.period <= horizon);

        self.checkpoints.drain(..folded);
        if base > 0 {
            self.checkpoints.insert(
                0,
                StakeCheckpoint {
                    period: horizon,
                    added: base,
                    removed: 0,
                },
            );
        }
        self.history_start = horizon;
    }

    fn checkpoint_index(&self, period: u32) -> std::result::Result<usize, usize> {
        self.checkpoints.binary_search_by_key(&period, |c| c.period)
    }

    fn cursor_index(&self, period: u32) -> std::result::Result<usize, usize> {
        self.claim_cursors.binary_search_by_key(&period, |c| c.period)
    }
}

fn apply_checkpoint(stake: u64, checkpoint: &StakeCheckpoint) -> Result<u64> {
    stake
        .checked_add(checkpoint.added)
        .ok_or(StakingError::MathOverflow)?
        .checked_sub(checkpoint.removed)
        .ok_or_else(|| error!(StakingError::ArithmeticUnderflow))
}
