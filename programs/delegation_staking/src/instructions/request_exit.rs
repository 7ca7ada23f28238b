//! Request delegation exit instruction handler.
//!
//! Ends a delegation at the close of the validator's current period.

use anchor_lang::prelude::*;

use crate::constants::*;
use crate::error::StakingError;
use crate::events::DelegationExitRequested;
use crate::state::{Delegation, Position, StakePool, ValidatorAggregate, ValidatorRecord};

/// Accounts required for requesting a delegation exit.
#[derive(Accounts)]
pub struct RequestDelegationExit<'info> {
    pub owner: Signer<'info>,

    #[account(
        seeds = [STAKE_POOL_SEED, stake_pool.collateral_mint.as_ref()],
        bump = stake_pool.bump
    )]
    pub stake_pool: Account<'info, StakePool>,

    #[account(
        seeds = [POSITION_SEED, stake_pool.key().as_ref(), &position.position_id.to_le_bytes()],
        bump = position.bump,
        has_one = owner @ StakingError::Unauthorized
    )]
    pub position: Account<'info, Position>,

    #[account(
        mut,
        seeds = [DELEGATION_SEED, stake_pool.key().as_ref(), &delegation.delegation_id.to_le_bytes()],
        bump = delegation.bump,
        constraint = delegation.position == position.key() @ StakingError::PositionMismatch,
        constraint = delegation.delegation_id == position.delegation_id @ StakingError::PositionMismatch,
        constraint = delegation.validator == validator_record.validator @ StakingError::ValidatorMismatch
    )]
    pub delegation: Account<'info, Delegation>,

    #[account(
        seeds = [VALIDATOR_SEED, stake_pool.key().as_ref(), validator_record.validator.as_ref()],
        bump = validator_record.bump
    )]
    pub validator_record: Account<'info, ValidatorRecord>,

    #[account(
        mut,
        seeds = [AGGREGATE_SEED, stake_pool.key().as_ref(), validator_record.validator.as_ref()],
        bump = validator_aggregate.bump
    )]
    pub validator_aggregate: Account<'info, ValidatorAggregate>,
}

/// Request the exit of a delegation.
///
/// Returns the exit period: the first period the delegation no longer earns.
pub fn handler(ctx: Context<RequestDelegationExit>) -> Result<u32> {
    let delegation = &mut ctx.accounts.delegation;
    let exit_period = delegation.request_exit(
        &*ctx.accounts.validator_record,
        &mut ctx.accounts.validator_aggregate,
    )?;

    let validator_effective_stake = ctx.accounts.validator_aggregate.effective_stake;

    msg!(
        "Delegation {} exiting at period {}",
        delegation.delegation_id,
        exit_period
    );
    msg!("Validator effective stake: {}", validator_effective_stake);

    emit!(DelegationExitRequested {
        delegation_id: delegation.delegation_id,
        validator: delegation.validator,
        exit_period,
        validator_effective_stake,
    });

    Ok(exit_period)
}
