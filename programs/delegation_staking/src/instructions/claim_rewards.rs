//! Claim rewards instruction handler.
//!
//! Settles the next batch of completed periods of a delegation and pays the
//! reward from the treasury.

use anchor_lang::prelude::*;
use anchor_spl::token::{self, Mint, Token, TokenAccount, Transfer};

use crate::adapters::PeriodOracle;
use crate::constants::*;
use crate::error::StakingError;
use crate::events::RewardsClaimed;
use crate::state::{Delegation, Position, StakePool, ValidatorAggregate, ValidatorRecord};

/// Accounts required for claiming rewards.
#[derive(Accounts)]
pub struct ClaimRewards<'info> {
    /// The position owner claiming rewards.
    #[account(mut)]
    pub owner: Signer<'info>,

    #[account(
        mut,
        seeds = [STAKE_POOL_SEED, stake_pool.collateral_mint.as_ref()],
        bump = stake_pool.bump,
        has_one = treasury_vault @ StakingError::PoolMismatch,
        has_one = reward_mint @ StakingError::MintMismatch
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
        constraint = delegation.validator == validator_record.validator @ StakingError::ValidatorMismatch
    )]
    pub delegation: Account<'info, Delegation>,

    #[account(
        seeds = [VALIDATOR_SEED, stake_pool.key().as_ref(), validator_record.validator.as_ref()],
        bump = validator_record.bump
    )]
    pub validator_record: Account<'info, ValidatorRecord>,

    /// Writable for lazy activation and claim cursor bookkeeping.
    #[account(
        mut,
        seeds = [AGGREGATE_SEED, stake_pool.key().as_ref(), validator_record.validator.as_ref()],
        bump = validator_aggregate.bump
    )]
    pub validator_aggregate: Account<'info, ValidatorAggregate>,

    pub reward_mint: Account<'info, Mint>,

    /// Owner's token account receiving rewards.
    #[account(
        mut,
        constraint = owner_token_account.mint == reward_mint.key() @ StakingError::MintMismatch,
        constraint = owner_token_account.owner == owner.key() @ StakingError::Unauthorized
    )]
    pub owner_token_account: Account<'info, TokenAccount>,

    /// Pool's treasury vault holding rewards.
    #[account(
        mut,
        seeds = [TREASURY_VAULT_SEED, stake_pool.key().as_ref()],
        bump = stake_pool.treasury_bump
    )]
    pub treasury_vault: Account<'info, TokenAccount>,

    pub token_program: Program<'info, Token>,
}

/// Claim rewards for the next window of completed periods.
///
/// Any delegation the position ever held can be claimed. Returns the amount
/// paid; a window whose periods pay nothing still advances the claim cursor.
pub fn handler(ctx: Context<ClaimRewards>) -> Result<u64> {
    let completed = ctx.accounts.validator_record.completed_periods();
    let treasury_balance = ctx.accounts.treasury_vault.amount;

    let (window, amount) = ctx.accounts.delegation.settle_claim(
        &mut ctx.accounts.validator_aggregate,
        completed,
        &mut ctx.accounts.stake_pool,
        treasury_balance,
    )?;

    if amount > 0 {
        let collateral_mint_key = ctx.accounts.stake_pool.collateral_mint;
        let seeds = &[
            STAKE_POOL_SEED,
            collateral_mint_key.as_ref(),
            &[ctx.accounts.stake_pool.bump],
        ];
        let signer_seeds = &[&seeds[..]];

        let cpi_accounts = Transfer {
            from: ctx.accounts.treasury_vault.to_account_info(),
            to: ctx.accounts.owner_token_account.to_account_info(),
            authority: ctx.accounts.stake_pool.to_account_info(),
        };
        let cpi_program = ctx.accounts.token_program.to_account_info();
        let cpi_ctx = CpiContext::new_with_signer(cpi_program, cpi_accounts, signer_seeds);
        token::transfer(cpi_ctx, amount)?;
    }

    let stake_pool = &mut ctx.accounts.stake_pool;
    stake_pool.last_updated = Clock::get()?.unix_timestamp;

    let delegation = &ctx.accounts.delegation;
    msg!(
        "Delegation {} claimed {} reward tokens for {} periods ({}..={})",
        delegation.delegation_id,
        amount,
        window.period_count(),
        window.first_claimable,
        window.last_claimable
    );
    msg!("Total rewards claimed by delegation: {}", delegation.total_rewards_claimed);
    msg!("Total distributed from pool: {}", stake_pool.total_distributed);

    emit!(RewardsClaimed {
        delegation_id: delegation.delegation_id,
        first_period: window.first_claimable,
        last_period: window.last_claimable,
        amount,
    });

    Ok(amount)
}
