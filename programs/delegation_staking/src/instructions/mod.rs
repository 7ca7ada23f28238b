//! Instruction handlers for the Delegation Staking program.
//!
//! This module contains all instruction implementations.

pub mod admin;
pub mod claim_rewards;
pub mod close_delegation;
pub mod delegate;
pub mod fund_treasury;
pub mod initialize;
pub mod oracle;
pub mod request_exit;
pub mod stake;
pub mod unstake;
pub mod views;

pub use admin::*;
pub use claim_rewards::*;
pub use close_delegation::*;
pub use delegate::*;
pub use fund_treasury::*;
pub use initialize::*;
pub use oracle::*;
pub use request_exit::*;
pub use stake::*;
pub use unstake::*;
pub use views::*;
