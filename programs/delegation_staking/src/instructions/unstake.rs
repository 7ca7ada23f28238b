//! Unstake instruction handlers.
//!
//! Finalizes a delegation and hands the position's collateral back to its owner.

use anchor_lang::prelude::*;
use anchor_spl::token::{self, Mint, Token, TokenAccount, Transfer};

use crate::adapters::PositionLedger;
use crate::constants::*;
use crate::error::StakingError;
use crate::events::Unstaked;
use crate::state::{Delegation, Position, StakePool, ValidatorAggregate, ValidatorRecord};

/// Accounts required for unstaking a delegated position.
#[derive(Accounts)]
pub struct Unstake<'info> {
    pub owner: Signer<'info>,

    #[account(
        mut,
        seeds = [STAKE_POOL_SEED, stake_pool.collateral_mint.as_ref()],
        bump = stake_pool.bump,
        has_one = staking_vault @ StakingError::PoolMismatch,
        has_one = collateral_mint @ StakingError::MintMismatch
    )]
    pub stake_pool: Account<'info, StakePool>,

    #[account(
        mut,
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

    /// Only needed for a forced exit of a delegation that never requested
    /// one; an exiting delegation leaves without touching the aggregate.
    #[account(
        mut,
        seeds = [AGGREGATE_SEED, stake_pool.key().as_ref(), validator_record.validator.as_ref()],
        bump = validator_aggregate.bump
    )]
    pub validator_aggregate: Option<Account<'info, ValidatorAggregate>>,

    pub collateral_mint: Account<'info, Mint>,

    /// Owner's token account receiving the collateral.
    #[account(
        mut,
        constraint = owner_token_account.mint == collateral_mint.key() @ StakingError::MintMismatch,
        constraint = owner_token_account.owner == owner.key() @ StakingError::Unauthorized
    )]
    pub owner_token_account: Account<'info, TokenAccount>,

    #[account(
        mut,
        seeds = [POOL_VAULT_SEED, stake_pool.key().as_ref()],
        bump = stake_pool.vault_bump
    )]
    pub staking_vault: Account<'info, TokenAccount>,

    pub token_program: Program<'info, Token>,
}

/// Accounts required for withdrawing a position that was never delegated.
#[derive(Accounts)]
pub struct WithdrawUndelegated<'info> {
    #[account(mut)]
    pub owner: Signer<'info>,

    #[account(
        mut,
        seeds = [STAKE_POOL_SEED, stake_pool.collateral_mint.as_ref()],
        bump = stake_pool.bump,
        has_one = staking_vault @ StakingError::PoolMismatch,
        has_one = collateral_mint @ StakingError::MintMismatch
    )]
    pub stake_pool: Account<'info, StakePool>,

    #[account(
        mut,
        seeds = [POSITION_SEED, stake_pool.key().as_ref(), &position.position_id.to_le_bytes()],
        bump = position.bump,
        has_one = owner @ StakingError::Unauthorized
    )]
    pub position: Account<'info, Position>,

    pub collateral_mint: Account<'info, Mint>,

    #[account(
        mut,
        constraint = owner_token_account.mint == collateral_mint.key() @ StakingError::MintMismatch,
        constraint = owner_token_account.owner == owner.key() @ StakingError::Unauthorized
    )]
    pub owner_token_account: Account<'info, TokenAccount>,

    #[account(
        mut,
        seeds = [POOL_VAULT_SEED, stake_pool.key().as_ref()],
        bump = stake_pool.vault_bump
    )]
    pub staking_vault: Account<'info, TokenAccount>,

    pub token_program: Program<'info, Token>,
}

/// Unstake a delegated position.
///
/// Succeeds once the exit period is reached, or at any time when the
/// validator is unknown or exited. The aggregate removal happened at exit
/// request time; it is only applied here for a forced exit that skipped it.
pub fn handler(ctx: Context<Unstake>) -> Result<()> {
    let (amount, forced) = ctx.accounts.delegation.settle_unstake(
        &mut *ctx.accounts.position,
        &*ctx.accounts.validator_record,
        ctx.accounts.validator_aggregate.as_deref_mut(),
    )?;

    transfer_from_vault(
        &ctx.accounts.stake_pool,
        &ctx.accounts.staking_vault,
        &ctx.accounts.owner_token_account,
        &ctx.accounts.token_program,
        amount,
    )?;

    let stake_pool = &mut ctx.accounts.stake_pool;
    stake_pool.total_staked = stake_pool
        .total_staked
        .checked_sub(amount)
        .ok_or(StakingError::ArithmeticUnderflow)?;
    stake_pool.last_updated = Clock::get()?.unix_timestamp;

    let delegation = &ctx.accounts.delegation;
    msg!(
        "Delegation {} exited{}, unstaked {} tokens",
        delegation.delegation_id,
        if forced { " (forced)" } else { "" },
        amount
    );
    if let Some(aggregate) = &ctx.accounts.validator_aggregate {
        msg!("Validator effective stake: {}", aggregate.effective_stake);
    }
    msg!("Total staked in pool: {}", stake_pool.total_staked);

    emit!(Unstaked {
        position: ctx.accounts.position.key(),
        owner: ctx.accounts.owner.key(),
        amount,
        forced,
    });

    Ok(())
}

/// Return the collateral of a position that never delegated.
pub fn withdraw_undelegated_handler(ctx: Context<WithdrawUndelegated>) -> Result<()> {
    require!(
        !ctx.accounts.position.is_delegated(),
        StakingError::InvalidState
    );
    require!(!ctx.accounts.position.released, StakingError::InvalidState);

    let amount = ctx.accounts.position.release_collateral()?;

    transfer_from_vault(
        &ctx.accounts.stake_pool,
        &ctx.accounts.staking_vault,
        &ctx.accounts.owner_token_account,
        &ctx.accounts.token_program,
        amount,
    )?;

    let stake_pool = &mut ctx.accounts.stake_pool;
    stake_pool.total_staked = stake_pool
        .total_staked
        .checked_sub(amount)
        .ok_or(StakingError::ArithmeticUnderflow)?;
    stake_pool.last_updated = Clock::get()?.unix_timestamp;

    msg!(
        "Position {} withdrawn, {} tokens returned",
        ctx.accounts.position.position_id,
        amount
    );

    emit!(Unstaked {
        position: ctx.accounts.position.key(),
        owner: ctx.accounts.owner.key(),
        amount,
        forced: false,
    });

    Ok(())
}

fn transfer_from_vault<'info>(
    stake_pool: &Account<'info, StakePool>,
    staking_vault: &Account<'info, TokenAccount>,
    destination: &Account<'info, TokenAccount>,
    token_program: &Program<'info, Token>,
    amount: u64,
) -> Result<()> {
    let collateral_mint_key = stake_pool.collateral_mint;
    let seeds = &[
        STAKE_POOL_SEED,
        collateral_mint_key.as_ref(),
        &[stake_pool.bump],
    ];
    let signer_seeds = &[&seeds[..]];

    let cpi_accounts = Transfer {
        from: staking_vault.to_account_info(),
        to: destination.to_account_info(),
        authority: stake_pool.to_account_info(),
    };
    let cpi_program = token_program.to_account_info();
    let cpi_ctx = CpiContext::new_with_signer(cpi_program, cpi_accounts, signer_seeds);
    token::transfer(cpi_ctx, amount)
}
