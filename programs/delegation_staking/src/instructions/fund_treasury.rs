//! Fund treasury instruction handler.
//!
//! Anyone may top up the reward treasury; only claims draw from it.

use anchor_lang::prelude::*;
use anchor_spl::token::{self, Mint, Token, TokenAccount, Transfer};

use crate::constants::*;
use crate::error::StakingError;
use crate::events::TreasuryFunded;
use crate::state::StakePool;

#[derive(Accounts)]
pub struct FundTreasury<'info> {
    pub funder: Signer<'info>,

    #[account(
        mut,
        seeds = [STAKE_POOL_SEED, stake_pool.collateral_mint.as_ref()],
        bump = stake_pool.bump,
        has_one = treasury_vault @ StakingError::PoolMismatch,
        has_one = reward_mint @ StakingError::MintMismatch
    )]
    pub stake_pool: Account<'info, StakePool>,

    pub reward_mint: Account<'info, Mint>,

    /// Source of the deposit, owned by the funder.
    #[account(
        mut,
        constraint = funder_token_account.mint == reward_mint.key() @ StakingError::MintMismatch,
        constraint = funder_token_account.owner == funder.key() @ StakingError::Unauthorized
    )]
    pub funder_token_account: Account<'info, TokenAccount>,

    #[account(
        mut,
        seeds = [TREASURY_VAULT_SEED, stake_pool.key().as_ref()],
        bump = stake_pool.treasury_bump
    )]
    pub treasury_vault: Account<'info, TokenAccount>,

    pub token_program: Program<'info, Token>,
}

/// Deposit reward tokens that later claims are paid from.
pub fn handler(ctx: Context<FundTreasury>, amount: u64) -> Result<()> {
    require!(amount > 0, StakingError::ZeroAmount);

    let treasury_balance = ctx
        .accounts
        .treasury_vault
        .amount
        .checked_add(amount)
        .ok_or(StakingError::MathOverflow)?;

    token::transfer(
        CpiContext::new(
            ctx.accounts.token_program.to_account_info(),
            Transfer {
                from: ctx.accounts.funder_token_account.to_account_info(),
                to: ctx.accounts.treasury_vault.to_account_info(),
                authority: ctx.accounts.funder.to_account_info(),
            },
        ),
        amount,
    )?;

    ctx.accounts.stake_pool.last_updated = Clock::get()?.unix_timestamp;

    msg!(
        "Treasury funded with {} reward tokens, balance {}",
        amount,
        treasury_balance
    );

    emit!(TreasuryFunded {
        funder: ctx.accounts.funder.key(),
        amount,
        treasury_balance,
    });

    Ok(())
}
