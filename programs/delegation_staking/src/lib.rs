//! # Delegation Staking Program
//!
//! Delegated proof-of-stake positions with period-indexed reward accounting.
//!
//! A user locks a level's collateral into a position, delegates the
//! position's effective stake (collateral weighted by the level reward
//! factor) to a validator, and earns a pro-rata share of a fixed per-period
//! emission for every period the validator completes while the delegation is
//! live.
//!
//! ## Features
//! - Pending/active/exiting/exited delegation lifecycle
//! - Per-validator stake aggregate, updated exactly once on activation and exit
//! - Bounded per-period stake history so later exits never dilute settled periods
//! - Re-delegation of exited positions, with old delegations still claimable
//! - Batched claiming bounded by validator progress and the exit boundary
//! - Forced exit when a validator becomes unknown or exits
//! - Oracle-fed validator progress, admin-controlled levels and rewards
//! - Safe math with overflow protection

use anchor_lang::prelude::*;

declare_id!("Fg6PaFpoGXkYsidMpWTK6W2BeZ7FEfcYkg476zPFsLnS");

pub mod accounting;
pub mod adapters;
pub mod constants;
pub mod error;
pub mod events;
pub mod instructions;
pub mod state;

use accounting::ClaimWindow;
use instructions::*;
use state::ValidatorStatus;

#[program]
pub mod delegation_staking {
    use super::*;

    /// Initializes the staking pool with the given parameters.
    ///
    /// # Arguments
    /// * `ctx` - The context containing all accounts needed for initialization
    /// * `oracle_authority` - Signer allowed to report validator progress
    /// * `emission_per_period` - Reward split among a validator's delegators per period
    /// * `max_claimable_periods` - Periods settled by a single claim (default 100)
    ///
    /// # Errors
    /// Returns an error if the claim batch is out of range or the oracle is unset.
    pub fn initialize(
        ctx: Context<Initialize>,
        oracle_authority: Pubkey,
        emission_per_period: u64,
        max_claimable_periods: Option<u32>,
    ) -> Result<()> {
        instructions::initialize::handler(ctx, oracle_authority, emission_per_period, max_claimable_periods)
    }

    /// Admin function to create or update a staking level.
    ///
    /// # Errors
    /// Returns an error if the required stake is zero or the reward factor is
    /// out of range.
    pub fn set_level(
        ctx: Context<SetLevel>,
        level_id: u8,
        required_stake: u64,
        scaled_reward_factor: u16,
    ) -> Result<()> {
        instructions::admin::set_level_handler(ctx, level_id, required_stake, scaled_reward_factor)
    }

    /// Admin function to pause or unpause staking and delegating.
    pub fn set_paused(ctx: Context<AdminControl>, paused: bool) -> Result<()> {
        instructions::admin::set_paused_handler(ctx, paused)
    }

    /// Admin function to change the per-period emission and claim batch size.
    pub fn update_reward_schedule(
        ctx: Context<AdminControl>,
        emission_per_period: u64,
        max_claimable_periods: u32,
    ) -> Result<()> {
        instructions::admin::update_reward_schedule_handler(ctx, emission_per_period, max_claimable_periods)
    }

    /// Admin function to replace the oracle authority.
    pub fn set_oracle_authority(
        ctx: Context<AdminControl>,
        new_oracle_authority: Pubkey,
    ) -> Result<()> {
        instructions::admin::set_oracle_authority_handler(ctx, new_oracle_authority)
    }

    /// Admin function to transfer authority to a new address.
    ///
    /// # Errors
    /// Returns an error if:
    /// - Caller is not the current admin
    /// - New authority is zero address
    pub fn transfer_authority(ctx: Context<AdminControl>, new_authority: Pubkey) -> Result<()> {
        instructions::admin::transfer_authority_handler(ctx, new_authority)
    }

    /// Funds the reward treasury.
    pub fn fund_treasury(ctx: Context<FundTreasury>, amount: u64) -> Result<()> {
        instructions::fund_treasury::handler(ctx, amount)
    }

    /// Oracle function to start tracking a validator.
    pub fn register_validator(ctx: Context<RegisterValidator>, validator: Pubkey) -> Result<()> {
        instructions::oracle::register_validator_handler(ctx, validator)
    }

    /// Oracle function to report a validator's completed periods and status.
    ///
    /// # Errors
    /// Returns an error if completed periods decrease.
    pub fn report_validator(
        ctx: Context<ReportValidator>,
        completed_periods: u32,
        status: ValidatorStatus,
    ) -> Result<()> {
        instructions::oracle::report_validator_handler(ctx, completed_periods, status)
    }

    /// Locks the level's required collateral into a new position.
    ///
    /// # Errors
    /// Returns an error if staking is paused or the level is misconfigured.
    pub fn stake(ctx: Context<Stake>) -> Result<()> {
        instructions::stake::handler(ctx)
    }

    /// Delegates a position to a validator.
    ///
    /// # Errors
    /// Returns an error if:
    /// - The position is released, or its current delegation is not yet exited
    /// - The validator is unknown or exited
    /// - The validator's stake history has no room left
    pub fn delegate(ctx: Context<Delegate>) -> Result<()> {
        instructions::delegate::handler(ctx)
    }

    /// Stops a delegation at the end of the validator's current period.
    ///
    /// Returns the exit period.
    pub fn request_delegation_exit(ctx: Context<RequestDelegationExit>) -> Result<u32> {
        instructions::request_exit::handler(ctx)
    }

    /// Finalizes an exited delegation and returns the collateral.
    ///
    /// # Errors
    /// Returns an error if the exit period has not been reached and the
    /// validator is still queued or active.
    pub fn unstake(ctx: Context<Unstake>) -> Result<()> {
        instructions::unstake::handler(ctx)
    }

    /// Returns the collateral of a position that was never delegated.
    pub fn withdraw_undelegated(ctx: Context<WithdrawUndelegated>) -> Result<()> {
        instructions::unstake::withdraw_undelegated_handler(ctx)
    }

    /// Claims rewards for the next batch of completed periods.
    ///
    /// # Errors
    /// Returns an error if:
    /// - No period is claimable
    /// - Treasury has insufficient funds
    pub fn claim_rewards(ctx: Context<ClaimRewards>) -> Result<u64> {
        instructions::claim_rewards::handler(ctx)
    }

    /// Closes an exited, fully claimed delegation.
    pub fn close_delegation(ctx: Context<CloseDelegation>) -> Result<()> {
        instructions::close_delegation::handler(ctx)
    }

    /// Periods the next claim would settle.
    pub fn claimable_delegation_periods(ctx: Context<DelegationView>) -> Result<ClaimWindow> {
        instructions::views::claimable_delegation_periods_handler(ctx)
    }

    /// Amount the next claim would pay.
    pub fn claimable_rewards(ctx: Context<DelegationView>) -> Result<u64> {
        instructions::views::claimable_rewards_handler(ctx)
    }

    /// Effective stake a position currently backs its validator with.
    ///
    /// Zero once the position's delegation has exited or was never opened.
    pub fn get_effective_stake(ctx: Context<PositionView>) -> Result<u64> {
        instructions::views::get_effective_stake_handler(ctx)
    }

    /// Effective stake of a validator's delegators during `period`.
    pub fn get_delegators_effective_stake(ctx: Context<ValidatorView>, period: u32) -> Result<u64> {
        instructions::views::get_delegators_effective_stake_handler(ctx, period)
    }
}
