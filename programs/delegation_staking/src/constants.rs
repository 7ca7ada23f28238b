//! Program constants for the Delegation Staking program.
//!
//! This module defines the PDA seeds, reward weighting precision and the
//! default/limit values used by the admin configuration instructions.

/// Seed for deriving the stake pool PDA
pub const STAKE_POOL_SEED: &[u8] = b"stake_pool";

/// Seed for deriving the collateral vault PDA
pub const POOL_VAULT_SEED: &[u8] = b"pool_vault";

/// Seed for deriving the reward treasury vault PDA
pub const TREASURY_VAULT_SEED: &[u8] = b"treasury_vault";

/// Seed for deriving level configuration PDAs
pub const LEVEL_SEED: &[u8] = b"level";

/// Seed for deriving position PDAs
pub const POSITION_SEED: &[u8] = b"position";

/// Seed for deriving delegation PDAs (one per delegation id)
pub const DELEGATION_SEED: &[u8] = b"delegation";

/// Seed for deriving validator oracle record PDAs
pub const VALIDATOR_SEED: &[u8] = b"validator";

/// Seed for deriving validator aggregate PDAs
pub const AGGREGATE_SEED: &[u8] = b"aggregate";

/// Reward factor that weights a position 1:1 (150 = 1.5x)
pub const REWARD_FACTOR_DENOMINATOR: u64 = 100;

/// Maximum level reward factor (10x)
pub const MAX_REWARD_FACTOR: u16 = 1_000;

/// Default number of periods settled by a single claim
pub const DEFAULT_MAX_CLAIMABLE_PERIODS: u32 = 100;

/// Upper bound on the claim batch size, keeps settlement within compute budget
pub const MAX_CLAIMABLE_PERIODS_LIMIT: u32 = 832;

/// Delegations per validator that may still have periods to settle
pub const MAX_OPEN_DELEGATIONS: u32 = 64;

/// Stake history entries a validator aggregate can hold
pub const MAX_STAKE_CHECKPOINTS: usize = 160;
