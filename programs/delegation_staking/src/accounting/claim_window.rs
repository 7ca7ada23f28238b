use anchor_lang::prelude::*;

/// Inclusive range of periods settled by one claim.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClaimWindow {
    pub first_claimable: u32,
    pub last_claimable: u32,
}

impl ClaimWindow {
    pub const EMPTY: ClaimWindow = ClaimWindow {
        first_claimable: 1,
        last_claimable: 0,
    };

    pub fn is_empty(&self) -> bool {
        self.first_claimable > self.last_claimable
    }

    pub fn period_count(&self) -> u32 {
        if self.is_empty() {
            0
        } else {
            self.last_claimable - self.first_claimable + 1
        }
    }
}

/// Periods a delegator may claim right now.
///
/// The upper bound is the smallest of the last completed period, the period
/// before the delegation's exit and the end of the claim batch. The exit
/// bound holds forever once set, however far the validator advances later.
pub fn claimable_window(
    first_claimable: u32,
    completed_periods: u32,
    exit_period: Option<u32>,
    max_claimable_periods: u32,
) -> ClaimWindow {
    let Some(upper_by_validator) = completed_periods.checked_sub(1) else {
        return ClaimWindow::EMPTY;
    };
    let upper_by_exit = match exit_period {
        Some(exit_period) => match exit_period.checked_sub(1) {
            Some(period) => period,
            None => return ClaimWindow::EMPTY,
        },
        None => u32::MAX,
    };
    let Some(batch) = max_claimable_periods.checked_sub(1) else {
        return ClaimWindow::EMPTY;
    };
    let upper_by_batch = first_claimable.saturating_add(batch);

    let window = ClaimWindow {
        first_claimable,
        last_claimable: upper_by_validator.min(upper_by_exit).min(upper_by_batch),
    };
    if window.is_empty() {
        ClaimWindow::EMPTY
    } else {
        window
    }
}
