//! Stake instruction handler.
//!
//! Locks a level's required collateral into the pool and mints a position.

use anchor_lang::prelude::*;
use anchor_spl::token::{self, Mint, Token, TokenAccount, Transfer};

use crate::adapters::PositionLedger;
use crate::constants::*;
use crate::error::StakingError;
use crate::events::Staked;
use crate::state::{Level, Position, StakePool};

/// Accounts required for staking.
#[derive(Accounts)]
pub struct Stake<'info> {
    /// The owner of the new position.
    #[account(mut)]
    pub owner: Signer<'info>,

    /// The stake pool.
    #[account(
        mut,
        seeds = [STAKE_POOL_SEED, stake_pool.collateral_mint.as_ref()],
        bump = stake_pool.bump,
        has_one = staking_vault @ StakingError::PoolMismatch,
        has_one = collateral_mint @ StakingError::MintMismatch
    )]
    pub stake_pool: Account<'info, StakePool>,

    /// Level the position is minted at.
    #[account(
        seeds = [LEVEL_SEED, stake_pool.key().as_ref(), &[level.level_id]],
        bump = level.bump,
        constraint = level.stake_pool == stake_pool.key() @ StakingError::InvalidLevel
    )]
    pub level: Account<'info, Level>,

    /// The new position, addressed by the pool's next position id.
    #[account(
        init,
        payer = owner,
        space = Position::LEN,
        seeds = [
            POSITION_SEED,
            stake_pool.key().as_ref(),
            &stake_pool.next_position_id.to_le_bytes()
        ],
        bump
    )]
    pub position: Account<'info, Position>,

    /// The collateral token mint.
    pub collateral_mint: Account<'info, Mint>,

    /// Owner's collateral token account.
    #[account(
        mut,
        constraint = owner_token_account.mint == collateral_mint.key() @ StakingError::MintMismatch,
        constraint = owner_token_account.owner == owner.key() @ StakingError::Unauthorized
    )]
    pub owner_token_account: Account<'info, TokenAccount>,

    /// Pool's collateral vault.
    #[account(
        mut,
        seeds = [POOL_VAULT_SEED, stake_pool.key().as_ref()],
        bump = stake_pool.vault_bump
    )]
    pub staking_vault: Account<'info, TokenAccount>,

    pub system_program: Program<'info, System>,
    pub token_program: Program<'info, Token>,
    pub rent: Sysvar<'info, Rent>,
}

/// Stake the level's required collateral and mint a position.
///
/// The level's reward factor is snapshotted on the position.
pub fn handler(ctx: Context<Stake>) -> Result<()> {
    let stake_pool = &ctx.accounts.stake_pool;
    let level = &ctx.accounts.level;

    require!(!stake_pool.paused, StakingError::StakingPaused);
    Level::validate(level.required_stake, level.scaled_reward_factor)
        .map_err(|_| error!(StakingError::InvalidLevel))?;

    let amount = level.required_stake;
    let level_id = level.level_id;
    let reward_factor = level.scaled_reward_factor;

    let cpi_accounts = Transfer {
        from: ctx.accounts.owner_token_account.to_account_info(),
        to: ctx.accounts.staking_vault.to_account_info(),
        authority: ctx.accounts.owner.to_account_info(),
    };
    let cpi_program = ctx.accounts.token_program.to_account_info();
    let cpi_ctx = CpiContext::new(cpi_program, cpi_accounts);
    token::transfer(cpi_ctx, amount)?;

    let clock = Clock::get()?;
    let stake_pool = &mut ctx.accounts.stake_pool;
    let position = &mut ctx.accounts.position;

    position.position_id = stake_pool.allocate_position_id()?;
    position.owner = ctx.accounts.owner.key();
    position.stake_pool = stake_pool.key();
    position.level_id = level_id;
    position.amount = amount;
    position.reward_factor = reward_factor;
    position.minted_at = clock.unix_timestamp;
    position.delegation_id = 0;
    position.released = false;
    position.bump = ctx.bumps.position;

    stake_pool.total_staked = stake_pool
        .total_staked
        .checked_add(amount)
        .ok_or(StakingError::MathOverflow)?;
    stake_pool.last_updated = clock.unix_timestamp;

    msg!(
        "Position {} staked {} tokens at level {}",
        position.position_id,
        amount,
        level_id
    );
    msg!("Effective stake: {}", position.effective_stake_of()?);
    msg!("Total staked in pool: {}", stake_pool.total_staked);

    emit!(Staked {
        position: position.key(),
        owner: position.owner,
        level_id,
        amount,
    });

    Ok(())
}
