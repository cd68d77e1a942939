//! Overdue detection and interest accrual.

use jiff::{Timestamp, civil::Date};
use payloads::AccountStatus;
use rust_decimal::Decimal;

use super::{Account, Direction, money};

impl<D: Direction> Account<D> {
    /// Interest owed as of `today`: zero unless the account is overdue,
    /// otherwise linear daily interest on the original amount.
    ///
    /// A pure function of `today` and the account's amount and due date, so
    /// recomputing never stacks on previously accrued interest.
    pub fn calculate_interest(&self, today: Date) -> Decimal {
        if !self.is_overdue(today) {
            return Decimal::ZERO;
        }
        self.accrued_interest(today)
    }

    fn accrued_interest(&self, today: Date) -> Decimal {
        let days_overdue = (today - self.due_date).get_days();
        money::simple_interest(self.amount, i64::from(days_overdue))
    }

    /// Recompute the cached status (and interest) as of `today`.
    ///
    /// Terminal accounts are left alone. Returns whether anything changed;
    /// `updated_at` is only bumped when it did, so refreshing twice in a row
    /// yields the same account.
    pub fn refresh_status(&mut self, today: Date, now: Timestamp) -> bool {
        if self.status.is_terminal() {
            return false;
        }
        let (status, interest) = if today > self.due_date {
            (AccountStatus::Overdue, self.accrued_interest(today))
        } else if self.settled_amount > Decimal::ZERO {
            (AccountStatus::PartiallySettled, self.interest)
        } else {
            (AccountStatus::Pending, self.interest)
        };

        if status == self.status && interest == self.interest {
            return false;
        }
        self.status = status;
        self.interest = interest;
        self.updated_at = now;
        true
    }
}
