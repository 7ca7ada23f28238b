//! Oracle feed instruction handlers.
//!
//! The pool's oracle authority mirrors each validator's completed periods and
//! lifecycle status from the external staking system.

use anchor_lang::prelude::*;

use crate::constants::*;
use crate::error::StakingError;
use crate::events::ValidatorReported;
use crate::state::{StakePool, ValidatorAggregate, ValidatorRecord, ValidatorStatus};

/// Accounts required for registering a validator.
#[derive(Accounts)]
#[instruction(validator: Pubkey)]
pub struct RegisterValidator<'info> {
    /// SECURITY: Must be signer AND match pool.oracle_authority.
    #[account(mut)]
    pub oracle_authority: Signer<'info>,

    #[account(
        seeds = [STAKE_POOL_SEED, stake_pool.collateral_mint.as_ref()],
        bump = stake_pool.bump,
        has_one = oracle_authority @ StakingError::UnauthorizedOracle
    )]
    pub stake_pool: Account<'info, StakePool>,

    #[account(
        init,
        payer = oracle_authority,
        space = ValidatorRecord::LEN,
        seeds = [VALIDATOR_SEED, stake_pool.key().as_ref(), validator.as_ref()],
        bump
    )]
    pub validator_record: Account<'info, ValidatorRecord>,

    #[account(
        init,
        payer = oracle_authority,
        space = ValidatorAggregate::LEN,
        seeds = [AGGREGATE_SEED, stake_pool.key().as_ref(), validator.as_ref()],
        bump
    )]
    pub validator_aggregate: Account<'info, ValidatorAggregate>,

    pub system_program: Program<'info, System>,
}

/// Accounts required for reporting validator progress.
#[derive(Accounts)]
pub struct ReportValidator<'info> {
    pub oracle_authority: Signer<'info>,

    #[account(
        seeds = [STAKE_POOL_SEED, stake_pool.collateral_mint.as_ref()],
        bump = stake_pool.bump,
        has_one = oracle_authority @ StakingError::UnauthorizedOracle
    )]
    pub stake_pool: Account<'info, StakePool>,

    #[account(
        mut,
        seeds = [VALIDATOR_SEED, stake_pool.key().as_ref(), validator_record.validator.as_ref()],
        bump = validator_record.bump
    )]
    pub validator_record: Account<'info, ValidatorRecord>,
}

/// Register a validator as queued with no completed periods.
pub fn register_validator_handler(ctx: Context<RegisterValidator>, validator: Pubkey) -> Result<()> {
    let clock = Clock::get()?;
    let stake_pool_key = ctx.accounts.stake_pool.key();

    let record = &mut ctx.accounts.validator_record;
    record.stake_pool = stake_pool_key;
    record.validator = validator;
    record.completed_periods = 0;
    record.status = ValidatorStatus::Queued;
    record.last_reported_at = clock.unix_timestamp;
    record.bump = ctx.bumps.validator_record;

    let aggregate = &mut ctx.accounts.validator_aggregate;
    aggregate.stake_pool = stake_pool_key;
    aggregate.validator = validator;
    aggregate.effective_stake = 0;
    aggregate.delegator_count = 0;
    aggregate.open_delegations = 0;
    aggregate.history_start = 0;
    aggregate.checkpoints = Vec::new();
    aggregate.claim_cursors = Vec::new();
    aggregate.bump = ctx.bumps.validator_aggregate;

    msg!("Validator {} registered", validator);

    Ok(())
}

/// Record a validator's completed periods and status.
///
/// A status change never touches delegations or the aggregate; delegators
/// observe it on their next operation.
pub fn report_validator_handler(
    ctx: Context<ReportValidator>,
    completed_periods: u32,
    status: ValidatorStatus,
) -> Result<()> {
    let clock = Clock::get()?;
    let record = &mut ctx.accounts.validator_record;
    let previous = record.completed_periods;

    record.apply_report(completed_periods, status, clock.unix_timestamp)?;

    msg!(
        "Validator {} reported: completed periods {} -> {}, status {:?}",
        record.validator,
        previous,
        completed_periods,
        status
    );

    emit!(ValidatorReported {
        validator: record.validator,
        completed_periods,
        status: status as u8,
    });

    Ok(())
}
