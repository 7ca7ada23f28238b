//! Read-only instructions answering through return data.
//!
//! None of these take a signer or mutate state.

use anchor_lang::prelude::*;

use crate::accounting::{settle_window, ClaimWindow};
use crate::adapters::PeriodOracle;
use crate::constants::*;
use crate::error::StakingError;
use crate::state::{Delegation, Position, StakePool, ValidatorAggregate, ValidatorRecord};

/// Accounts for queries about one delegation.
#[derive(Accounts)]
pub struct DelegationView<'info> {
    #[account(
        seeds = [STAKE_POOL_SEED, stake_pool.collateral_mint.as_ref()],
        bump = stake_pool.bump
    )]
    pub stake_pool: Account<'info, StakePool>,

    #[account(
        seeds = [POSITION_SEED, stake_pool.key().as_ref(), &position.position_id.to_le_bytes()],
        bump = position.bump,
        constraint = position.stake_pool == stake_pool.key() @ StakingError::PoolMismatch
    )]
    pub position: Account<'info, Position>,

    #[account(
        seeds = [DELEGATION_SEED, stake_pool.key().as_ref(), &delegation.delegation_id.to_le_bytes()],
        bump = delegation.bump,
        constraint = delegation.position == position.key() @ StakingError::PositionMismatch,
        constraint = delegation.validator == validator_record.validator @ StakingError::ValidatorMismatch
    )]
    pub delegation: Account<'info, Delegation>,

    #[account(
        seeds = [VALIDATOR_SEED, stake_pool.key().as_ref(), validator_record.validator.as_ref()],
        bump = validator_record.bump
    )]
    pub validator_record: Account<'info, ValidatorRecord>,

    #[account(
        seeds = [AGGREGATE_SEED, stake_pool.key().as_ref(), validator_record.validator.as_ref()],
        bump = validator_aggregate.bump
    )]
    pub validator_aggregate: Account<'info, ValidatorAggregate>,
}

/// Accounts for queries about one position.
#[derive(Accounts)]
pub struct PositionView<'info> {
    #[account(
        seeds = [STAKE_POOL_SEED, stake_pool.collateral_mint.as_ref()],
        bump = stake_pool.bump
    )]
    pub stake_pool: Account<'info, StakePool>,

    #[account(
        seeds = [POSITION_SEED, stake_pool.key().as_ref(), &position.position_id.to_le_bytes()],
        bump = position.bump,
        constraint = position.stake_pool == stake_pool.key() @ StakingError::PoolMismatch
    )]
    pub position: Account<'info, Position>,

    /// The position's current delegation; omitted if it never delegated.
    #[account(
        seeds = [DELEGATION_SEED, stake_pool.key().as_ref(), &position.delegation_id.to_le_bytes()],
        bump = delegation.bump
    )]
    pub delegation: Option<Account<'info, Delegation>>,

    #[account(
        seeds = [VALIDATOR_SEED, stake_pool.key().as_ref(), validator_record.validator.as_ref()],
        bump = validator_record.bump
    )]
    pub validator_record: Option<Account<'info, ValidatorRecord>>,
}

/// Accounts for queries about one validator.
#[derive(Accounts)]
pub struct ValidatorView<'info> {
    #[account(
        seeds = [STAKE_POOL_SEED, stake_pool.collateral_mint.as_ref()],
        bump = stake_pool.bump
    )]
    pub stake_pool: Account<'info, StakePool>,

    #[account(
        seeds = [AGGREGATE_SEED, stake_pool.key().as_ref(), validator_aggregate.validator.as_ref()],
        bump = validator_aggregate.bump
    )]
    pub validator_aggregate: Account<'info, ValidatorAggregate>,
}

/// Periods the next claim would settle.
pub fn claimable_delegation_periods_handler(ctx: Context<DelegationView>) -> Result<ClaimWindow> {
    let completed = ctx.accounts.validator_record.completed_periods();
    Ok(ctx
        .accounts
        .delegation
        .claim_window(completed, ctx.accounts.stake_pool.max_claimable_periods))
}

/// Amount the next claim would pay.
pub fn claimable_rewards_handler(ctx: Context<DelegationView>) -> Result<u64> {
    let completed = ctx.accounts.validator_record.completed_periods();
    let stake_pool = &ctx.accounts.stake_pool;
    let delegation = &ctx.accounts.delegation;

    let window = delegation.claim_window(completed, stake_pool.max_claimable_periods);
    let amount = settle_window(
        delegation,
        &ctx.accounts.validator_aggregate,
        window,
        stake_pool.emission_per_period,
    )?;

    msg!(
        "Claimable: {} for periods {}..={}",
        amount,
        window.first_claimable,
        window.last_claimable
    );
    Ok(amount)
}

/// Effective stake a position backs its validator with in the current period.
pub fn get_effective_stake_handler(ctx: Context<PositionView>) -> Result<u64> {
    let current = match (
        ctx.accounts.delegation.as_deref(),
        ctx.accounts.validator_record.as_deref(),
    ) {
        (Some(delegation), Some(record)) => {
            require_keys_eq!(
                delegation.validator,
                record.validator,
                StakingError::ValidatorMismatch
            );
            Some((delegation, record))
        }
        _ => None,
    };

    ctx.accounts.position.current_effective_stake(current)
}

/// Effective stake of the delegators entitled to rewards during `period`.
///
/// Periods older than every unsettled claim are folded away and rejected.
pub fn get_delegators_effective_stake_handler(
    ctx: Context<ValidatorView>,
    period: u32,
) -> Result<u64> {
    ctx.accounts.validator_aggregate.effective_stake_at(period)
}
