//! Decimal money arithmetic for account balances.
//!
//! All amounts are `rust_decimal::Decimal`. Interest is kept as the exact
//! product of principal, days and daily rate; nothing here rounds.

use rust_decimal::{Decimal, dec};

/// Monthly late-payment rate of 0.033%, accrued linearly per day.
pub const MONTHLY_INTEREST_RATE: Decimal = dec!(0.00033);

/// Days in the month the monthly rate is spread over.
pub const DAYS_PER_MONTH: Decimal = dec!(30);

/// `MONTHLY_INTEREST_RATE / DAYS_PER_MONTH`, i.e. 0.0011% per day.
pub fn daily_interest_rate() -> Decimal {
    MONTHLY_INTEREST_RATE / DAYS_PER_MONTH
}

/// What the account is worth before any settlement.
pub fn total_due(
    amount: Decimal,
    interest: Decimal,
    penalty: Decimal,
    discount: Decimal,
) -> Decimal {
    amount + interest + penalty - discount
}

/// Interest accrued on `principal` over `days_overdue` days, never compounding.
pub fn simple_interest(principal: Decimal, days_overdue: i64) -> Decimal {
    if days_overdue <= 0 {
        return Decimal::ZERO;
    }
    principal * Decimal::from(days_overdue) * daily_interest_rate()
}
