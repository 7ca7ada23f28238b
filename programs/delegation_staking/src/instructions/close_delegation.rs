//! Close delegation instruction handler.

use anchor_lang::prelude::*;

use crate::constants::*;
use crate::error::StakingError;
use crate::events::DelegationClosed;
use crate::state::{Delegation, Position, StakePool};

/// Accounts required for closing a finished delegation.
#[derive(Accounts)]
pub struct CloseDelegation<'info> {
    /// Receives the delegation account's rent.
    #[account(mut)]
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
        close = owner,
        seeds = [DELEGATION_SEED, stake_pool.key().as_ref(), &delegation.delegation_id.to_le_bytes()],
        bump = delegation.bump,
        constraint = delegation.position == position.key() @ StakingError::PositionMismatch
    )]
    pub delegation: Account<'info, Delegation>,
}

/// Close an exited delegation once every entitled period has been claimed.
///
/// Delegation ids are never handed out twice, so the PDA cannot be reopened.
pub fn handler(ctx: Context<CloseDelegation>) -> Result<()> {
    let delegation = &ctx.accounts.delegation;
    require!(delegation.is_closable(), StakingError::InvalidState);

    msg!(
        "Delegation {} closed, {} reward tokens claimed over its lifetime",
        delegation.delegation_id,
        delegation.total_rewards_claimed
    );

    emit!(DelegationClosed {
        delegation_id: delegation.delegation_id,
        position: ctx.accounts.position.key(),
    });

    Ok(())
}
