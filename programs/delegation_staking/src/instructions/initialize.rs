//! Initialize instruction handler.
//!
//! Creates and configures a new delegation staking pool.
//!
//! ## Security Guarantees
//! - Collateral vault and reward treasury are PDAs owned by the stake pool
//! - Collateral and reward mints are locked to pool state permanently
//! - Reward schedule validated before storage

use anchor_lang::prelude::*;
use anchor_spl::token::{Mint, Token, TokenAccount};

use crate::constants::*;
use crate::error::StakingError;
use crate::state::StakePool;

/// Accounts required for pool initialization.
///
/// ## Security Notes
/// - `staking_vault` and `treasury_vault` are PDAs with `stake_pool` as authority
/// - Seeds ensure these accounts cannot be swapped or replaced
#[derive(Accounts)]
pub struct Initialize<'info> {
    /// The admin authority that will control the pool.
    #[account(mut)]
    pub authority: Signer<'info>,

    /// The stake pool account to be created.
    /// SECURITY: PDA derived from STAKE_POOL_SEED + collateral mint ensures uniqueness.
    #[account(
        init,
        payer = authority,
        space = StakePool::LEN,
        seeds = [STAKE_POOL_SEED, collateral_mint.key().as_ref()],
        bump
    )]
    pub stake_pool: Account<'info, StakePool>,

    /// Mint of the collateral locked by positions.
    pub collateral_mint: Account<'info, Mint>,

    /// Mint of the token paid out as delegation rewards.
    pub reward_mint: Account<'info, Mint>,

    /// The vault that will hold position collateral.
    #[account(
        init,
        payer = authority,
        seeds = [POOL_VAULT_SEED, stake_pool.key().as_ref()],
        bump,
        token::mint = collateral_mint,
        token::authority = stake_pool
    )]
    pub staking_vault: Account<'info, TokenAccount>,

    /// The treasury vault that will hold reward tokens.
    #[account(
        init,
        payer = authority,
        seeds = [TREASURY_VAULT_SEED, stake_pool.key().as_ref()],
        bump,
        token::mint = reward_mint,
        token::authority = stake_pool
    )]
    pub treasury_vault: Account<'info, TokenAccount>,

    pub system_program: Program<'info, System>,
    pub token_program: Program<'info, Token>,
    pub rent: Sysvar<'info, Rent>,
}

/// Initialize a new delegation staking pool.
///
/// # Arguments
/// * `ctx` - Initialize accounts context
/// * `oracle_authority` - Signer allowed to report validator progress
/// * `emission_per_period` - Reward split among a validator's delegators per period
/// * `max_claimable_periods` - Periods settled by a single claim, defaults to
///   `DEFAULT_MAX_CLAIMABLE_PERIODS`
pub fn handler(
    ctx: Context<Initialize>,
    oracle_authority: Pubkey,
    emission_per_period: u64,
    max_claimable_periods: Option<u32>,
) -> Result<()> {
    let max_claimable_periods = max_claimable_periods.unwrap_or(DEFAULT_MAX_CLAIMABLE_PERIODS);
    StakePool::validate_claim_batch(max_claimable_periods)?;
    require!(
        oracle_authority != Pubkey::default(),
        StakingError::UnauthorizedOracle
    );

    let stake_pool = &mut ctx.accounts.stake_pool;
    let clock = Clock::get()?;

    stake_pool.authority = ctx.accounts.authority.key();
    stake_pool.oracle_authority = oracle_authority;
    stake_pool.collateral_mint = ctx.accounts.collateral_mint.key();
    stake_pool.reward_mint = ctx.accounts.reward_mint.key();
    stake_pool.staking_vault = ctx.accounts.staking_vault.key();
    stake_pool.treasury_vault = ctx.accounts.treasury_vault.key();
    stake_pool.emission_per_period = emission_per_period;
    stake_pool.max_claimable_periods = max_claimable_periods;
    stake_pool.total_staked = 0;
    stake_pool.total_distributed = 0;
    stake_pool.next_position_id = 1;
    stake_pool.next_delegation_id = 1;
    stake_pool.paused = false;
    stake_pool.created_at = clock.unix_timestamp;
    stake_pool.last_updated = clock.unix_timestamp;

    stake_pool.bump = ctx.bumps.stake_pool;
    stake_pool.vault_bump = ctx.bumps.staking_vault;
    stake_pool.treasury_bump = ctx.bumps.treasury_vault;

    msg!("Delegation staking pool initialized");
    msg!("Admin: {}", ctx.accounts.authority.key());
    msg!("Oracle: {}", oracle_authority);
    msg!("Collateral mint: {}", ctx.accounts.collateral_mint.key());
    msg!("Reward mint: {}", ctx.accounts.reward_mint.key());
    msg!(
        "Emission per period: {}, max claimable periods: {}",
        emission_per_period,
        max_claimable_periods
    );

    Ok(())
}
