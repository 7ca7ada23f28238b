//! State structures for the Delegation Staking program.
//!
//! This module defines all account structures used to store program state.

pub mod delegation;
pub mod level;
pub mod position;
pub mod stake_pool;
pub mod validator_aggregate;
pub mod validator_record;

pub use delegation::*;
pub use level::*;
pub use position::*;
pub use stake_pool::*;
pub use validator_aggregate::*;
pub use validator_record::*;
