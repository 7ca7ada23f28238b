//! Admin instruction handlers.
//!
//! Handles admin-only configuration of the staking pool.
//!
//! ## Security Guarantees
//! - All admin functions require signer == pool.authority
//! - PDA validation ensures correct pool
//! - Parameter bounds checking

use anchor_lang::prelude::*;

use crate::constants::*;
use crate::error::StakingError;
use crate::state::{Level, StakePool};

/// Accounts required for admin operations.
#[derive(Accounts)]
pub struct AdminControl<'info> {
    /// The admin authority.
    /// SECURITY: Must be signer AND match pool.authority.
    #[account(mut)]
    pub authority: Signer<'info>,

    /// The stake pool to modify.
    #[account(
        mut,
        seeds = [STAKE_POOL_SEED, stake_pool.collateral_mint.as_ref()],
        bump = stake_pool.bump,
        has_one = authority @ StakingError::Unauthorized
    )]
    pub stake_pool: Account<'info, StakePool>,
}

/// Accounts required to create or update a level.
#[derive(Accounts)]
#[instruction(level_id: u8)]
pub struct SetLevel<'info> {
    #[account(mut)]
    pub authority: Signer<'info>,

    #[account(
        seeds = [STAKE_POOL_SEED, stake_pool.collateral_mint.as_ref()],
        bump = stake_pool.bump,
        has_one = authority @ StakingError::Unauthorized
    )]
    pub stake_pool: Account<'info, StakePool>,

    #[account(
        init_if_needed,
        payer = authority,
        space = Level::LEN,
        seeds = [LEVEL_SEED, stake_pool.key().as_ref(), &[level_id]],
        bump
    )]
    pub level: Account<'info, Level>,

    pub system_program: Program<'info, System>,
}

/// Set the paused state of the staking pool.
///
/// When paused, new stakes and delegations are blocked. Exits, unstaking and
/// claiming remain available.
pub fn set_paused_handler(ctx: Context<AdminControl>, paused: bool) -> Result<()> {
    let stake_pool = &mut ctx.accounts.stake_pool;
    let clock = Clock::get()?;

    let previous_state = stake_pool.paused;
    stake_pool.paused = paused;
    stake_pool.last_updated = clock.unix_timestamp;

    msg!(
        "Staking {} (was {})",
        if paused { "PAUSED" } else { "RESUMED" },
        if previous_state { "paused" } else { "active" }
    );
    msg!("Admin: {}", ctx.accounts.authority.key());

    Ok(())
}

/// Adjust the per-period emission and the claim batch size.
///
/// The emission applies to every period settled after the change, including
/// completed periods not yet claimed.
pub fn update_reward_schedule_handler(
    ctx: Context<AdminControl>,
    emission_per_period: u64,
    max_claimable_periods: u32,
) -> Result<()> {
    StakePool::validate_claim_batch(max_claimable_periods)?;

    let stake_pool = &mut ctx.accounts.stake_pool;
    let clock = Clock::get()?;

    msg!(
        "Reward schedule - Old: emission={}, batch={}",
        stake_pool.emission_per_period,
        stake_pool.max_claimable_periods
    );

    stake_pool.emission_per_period = emission_per_period;
    stake_pool.max_claimable_periods = max_claimable_periods;
    stake_pool.last_updated = clock.unix_timestamp;

    msg!(
        "Reward schedule - New: emission={}, batch={}",
        emission_per_period,
        max_claimable_periods
    );
    msg!("Admin: {}", ctx.accounts.authority.key());

    Ok(())
}

/// Create or update a staking level.
///
/// Existing positions keep the reward factor they were minted with.
pub fn set_level_handler(
    ctx: Context<SetLevel>,
    level_id: u8,
    required_stake: u64,
    scaled_reward_factor: u16,
) -> Result<()> {
    Level::validate(required_stake, scaled_reward_factor)?;

    let level = &mut ctx.accounts.level;
    level.stake_pool = ctx.accounts.stake_pool.key();
    level.level_id = level_id;
    level.required_stake = required_stake;
    level.scaled_reward_factor = scaled_reward_factor;
    level.bump = ctx.bumps.level;

    msg!(
        "Level {} set: required stake {}, reward factor {}",
        level_id,
        required_stake,
        scaled_reward_factor
    );

    Ok(())
}

/// Replace the signer allowed to report validator progress.
pub fn set_oracle_authority_handler(
    ctx: Context<AdminControl>,
    new_oracle_authority: Pubkey,
) -> Result<()> {
    require!(
        new_oracle_authority != Pubkey::default(),
        StakingError::UnauthorizedOracle
    );

    let stake_pool = &mut ctx.accounts.stake_pool;
    let clock = Clock::get()?;

    let old_oracle = stake_pool.oracle_authority;
    stake_pool.oracle_authority = new_oracle_authority;
    stake_pool.last_updated = clock.unix_timestamp;

    msg!("Oracle authority changed: {} -> {}", old_oracle, new_oracle_authority);

    Ok(())
}

/// Transfer admin authority to a new address.
pub fn transfer_authority_handler(
    ctx: Context<AdminControl>,
    new_authority: Pubkey,
) -> Result<()> {
    let stake_pool = &mut ctx.accounts.stake_pool;
    let clock = Clock::get()?;

    require!(
        new_authority != Pubkey::default(),
        StakingError::Unauthorized
    );

    let old_authority = stake_pool.authority;
    stake_pool.authority = new_authority;
    stake_pool.last_updated = clock.unix_timestamp;

    msg!("Authority transferred: {} -> {}", old_authority, new_authority);

    Ok(())
}
