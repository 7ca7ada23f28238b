//! Pure period accounting: which periods a delegation may claim and what they pay.

pub mod claim_window;
pub mod settlement;

pub use claim_window::*;
pub use settlement::*;
