//! Delegate instruction handler.
//!
//! Assigns a position's effective stake to a validator.

use anchor_lang::prelude::*;

use crate::adapters::PositionLedger;
use crate::constants::*;
use crate::error::StakingError;
use crate::events::Delegated;
use crate::state::{Delegation, DelegationStatus, Position, StakePool, ValidatorAggregate, ValidatorRecord};

/// Accounts required for delegating a position.
#[derive(Accounts)]
pub struct Delegate<'info> {
    /// The position owner.
    #[account(mut)]
    pub owner: Signer<'info>,

    #[account(
        mut,
        seeds = [STAKE_POOL_SEED, stake_pool.collateral_mint.as_ref()],
        bump = stake_pool.bump
    )]
    pub stake_pool: Account<'info, StakePool>,

    #[account(
        mut,
        seeds = [POSITION_SEED, stake_pool.key().as_ref(), &position.position_id.to_le_bytes()],
        bump = position.bump,
        has_one = owner @ StakingError::Unauthorized,
        constraint = position.stake_pool == stake_pool.key() @ StakingError::PoolMismatch
    )]
    pub position: Account<'info, Position>,

    /// Fresh record keyed by the delegation id this call allocates.
    #[account(
        init,
        payer = owner,
        space = Delegation::LEN,
        seeds = [DELEGATION_SEED, stake_pool.key().as_ref(), &stake_pool.next_delegation_id.to_le_bytes()],
        bump
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

    /// The position's current delegation, required once the position has
    /// delegated before. It stays open for claims after being finalized.
    #[account(
        mut,
        seeds = [DELEGATION_SEED, stake_pool.key().as_ref(), &current_delegation.delegation_id.to_le_bytes()],
        bump = current_delegation.bump,
        constraint = current_delegation.position == position.key() @ StakingError::PositionMismatch
    )]
    pub current_delegation: Option<Account<'info, Delegation>>,

    #[account(
        seeds = [VALIDATOR_SEED, stake_pool.key().as_ref(), current_validator_record.validator.as_ref()],
        bump = current_validator_record.bump
    )]
    pub current_validator_record: Option<Account<'info, ValidatorRecord>>,

    /// Only read when the current delegation never requested exit and its
    /// validator is gone.
    #[account(
        mut,
        seeds = [AGGREGATE_SEED, stake_pool.key().as_ref(), current_validator_aggregate.validator.as_ref()],
        bump = current_validator_aggregate.bump,
        constraint = current_validator_aggregate.key() != validator_aggregate.key() @ StakingError::ValidatorMismatch
    )]
    pub current_validator_aggregate: Option<Account<'info, ValidatorAggregate>>,

    pub system_program: Program<'info, System>,
}

/// Delegate a position to a validator.
///
/// A previously delegated position moves on once its current delegation is
/// effectively exited; that delegation is finalized in the same call.
pub fn handler(ctx: Context<Delegate>) -> Result<()> {
    require!(!ctx.accounts.stake_pool.paused, StakingError::StakingPaused);

    let current = match ctx.accounts.current_delegation.as_deref_mut() {
        Some(delegation) => {
            let record = ctx
                .accounts
                .current_validator_record
                .as_deref()
                .ok_or(StakingError::ValidatorMismatch)?;
            require_keys_eq!(
                delegation.validator,
                record.validator,
                StakingError::ValidatorMismatch
            );
            let aggregate = ctx.accounts.current_validator_aggregate.as_deref_mut();
            if let Some(aggregate) = &aggregate {
                require_keys_eq!(
                    aggregate.validator,
                    delegation.validator,
                    StakingError::ValidatorMismatch
                );
            }
            Some((delegation, record, aggregate))
        }
        None => None,
    };
    ctx.accounts.position.prepare_delegation(current)?;

    let position = &ctx.accounts.position;
    let effective_stake = position.effective_stake_of()?;
    let position_key = position.key();
    let validator = ctx.accounts.validator_record.validator;

    let delegation_id = ctx.accounts.stake_pool.allocate_delegation_id()?;

    let delegation = &mut ctx.accounts.delegation;
    delegation.open(
        delegation_id,
        position_key,
        validator,
        effective_stake,
        &*ctx.accounts.validator_record,
        &mut ctx.accounts.validator_aggregate,
    )?;
    delegation.bump = ctx.bumps.delegation;

    ctx.accounts.position.delegation_id = delegation_id;
    ctx.accounts.stake_pool.last_updated = Clock::get()?.unix_timestamp;

    let active = delegation.status == DelegationStatus::Active;
    msg!(
        "Delegation {} opened: position {} -> validator {}",
        delegation_id,
        position_key,
        validator
    );
    msg!(
        "Effective stake {}, start period {}, {}",
        effective_stake,
        delegation.start_period,
        if active { "active" } else { "pending" }
    );
    msg!(
        "Validator effective stake: {}",
        ctx.accounts.validator_aggregate.effective_stake
    );

    emit!(Delegated {
        delegation_id,
        position: position_key,
        validator,
        effective_stake,
        start_period: delegation.start_period,
        active,
    });

    Ok(())
}
