//! Error types for the Delegation Staking program.
//!
//! This module defines all custom error codes that can be returned by the program.
//! Each error has a unique code and descriptive message.
//!
//! ## Error Code Ranges
//! - 6000-6004: Input validation errors
//! - 6005-6012: Delegation lifecycle errors
//! - 6013-6014: Period/oracle errors
//! - 6015-6016: Math/overflow errors
//! - 6017-6018: Authorization errors
//! - 6019-6023: Account validation errors

use anchor_lang::prelude::*;

/// Custom error codes for the Delegation Staking program.
///
/// Error codes start at 6000 (Anchor's custom error offset).
#[error_code]
pub enum StakingError {
    // ========== Input Validation Errors (6000-6004) ==========

    /// [6000] Staking operations are currently paused by admin.
    #[msg("Staking is currently paused")]
    StakingPaused,

    /// [6001] The level does not exist or is misconfigured.
    #[msg("Invalid staking level")]
    InvalidLevel,

    /// [6002] Amounts must be non-zero.
    #[msg("Amount must be greater than zero")]
    ZeroAmount,

    /// [6003] Reward factor is zero or above MAX_REWARD_FACTOR.
    #[msg("Reward factor must be between 1 and 1000")]
    InvalidRewardFactor,

    /// [6004] Claim batch size is zero or above MAX_CLAIMABLE_PERIODS_LIMIT.
    #[msg("Max claimable periods must be between 1 and 832")]
    InvalidClaimBatch,

    // ========== Delegation Lifecycle Errors (6005-6012) ==========

    /// [6005] Operation attempted from a state that forbids it.
    #[msg("Operation not allowed in the current delegation state")]
    InvalidState,

    /// [6006] Exit was already requested for this delegation.
    #[msg("Delegation exit already requested")]
    AlreadyExiting,

    /// [6007] Validator does not accept new delegations.
    #[msg("Validator is not accepting delegations")]
    ValidatorUnavailable,

    /// [6008] Exit period not reached and the validator has not exited.
    #[msg("Delegation is not yet exitable")]
    NotYetExitable,

    /// [6009] The claim window is empty.
    #[msg("No periods available to claim")]
    NothingToClaim,

    /// [6010] The treasury does not have enough funds for the reward payout.
    #[msg("Insufficient treasury funds for reward payout")]
    InsufficientTreasuryFunds,

    /// [6011] Collateral of this position has already been released.
    #[msg("Position collateral already released")]
    PositionReleased,

    /// [6012] The validator's stake history has no room for another delegation.
    #[msg("Validator cannot take more delegations until older ones settle")]
    ValidatorAtCapacity,

    // ========== Period/Oracle Errors (6013-6014) ==========

    /// [6013] Oracle attempted to move completed periods backwards.
    #[msg("Completed periods cannot decrease")]
    PeriodRegression,

    /// [6014] The requested period predates the retained stake history.
    #[msg("Stake history for this period has been compacted")]
    HistoryCompacted,

    // ========== Math/Overflow Errors (6015-6016) ==========

    /// [6015] Arithmetic overflow occurred during calculation.
    #[msg("Arithmetic overflow occurred during calculation")]
    MathOverflow,

    /// [6016] Arithmetic underflow occurred during calculation.
    #[msg("Arithmetic underflow occurred during calculation")]
    ArithmeticUnderflow,

    // ========== Authorization Errors (6017-6018) ==========

    /// [6017] Unauthorized - caller is not the admin.
    #[msg("Unauthorized: caller is not the pool admin")]
    Unauthorized,

    /// [6018] Unauthorized - signer is not the configured oracle authority.
    #[msg("Unauthorized: signer is not the oracle authority")]
    UnauthorizedOracle,

    // ========== Account Validation Errors (6019-6023) ==========

    /// [6019] The provided mint does not match the pool's configured mint.
    #[msg("Token mint mismatch - wrong token for this pool")]
    MintMismatch,

    /// [6020] Account does not belong to this pool.
    #[msg("Account does not belong to this pool")]
    PoolMismatch,

    /// [6021] The provided delegation does not belong to this position.
    #[msg("Delegation does not belong to this position")]
    PositionMismatch,

    /// [6022] Delegation belongs to a different validator than the accounts supplied.
    #[msg("Validator mismatch for this delegation")]
    ValidatorMismatch,

    /// [6023] A forced exit needs the validator aggregate and none was supplied.
    #[msg("Validator aggregate account required for this exit")]
    MissingValidatorAggregate,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_follow_the_documented_ranges() {
        assert_eq!(u32::from(StakingError::ValidatorAtCapacity), 6012);
        assert_eq!(u32::from(StakingError::PeriodRegression), 6013);
        assert_eq!(u32::from(StakingError::HistoryCompacted), 6014);
        assert_eq!(u32::from(StakingError::MathOverflow), 6015);
        assert_eq!(u32::from(StakingError::UnauthorizedOracle), 6018);
        assert_eq!(u32::from(StakingError::MintMismatch), 6019);
        assert_eq!(u32::from(StakingError::ValidatorMismatch), 6022);
        assert_eq!(u32::from(StakingError::MissingValidatorAggregate), 6023);
    }
}
