use serde::{Deserialize, Serialize};

use super::{Amount, FIXED_FEE, PersonId, amount_due_for};

pub type PaymentRecordId = i64;

/// Paid and outstanding totals for one person.
///
/// A balance is always built from a paid total, so the due side follows
/// `max(FIXED_FEE - amount_paid, 0)` no matter how it was reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Balance {
    pub amount_paid: Amount,
    pub amount_due: Amount,
}

impl Balance {
    /// Balance of someone who has not paid anything yet.
    pub fn unpaid() -> Self {
        Self::from_paid(0)
    }

    pub fn from_paid(amount_paid: Amount) -> Self {
        Self {
            amount_paid,
            amount_due: amount_due_for(amount_paid),
        }
    }

    /// Apply a payment on top of this balance.
    pub fn credit(self, amount: Amount) -> Self {
        Self::from_paid(self.amount_paid.saturating_add(amount))
    }

    pub fn is_settled(&self) -> bool {
        self.amount_due == 0
    }
}

impl Default for Balance {
    fn default() -> Self {
        Self::unpaid()
    }
}

/// Running payment state of a single person. There is at most one per person.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub id: PaymentRecordId,
    pub person_id: PersonId,
    pub amount_paid: Amount,
    pub amount_due: Amount,
}

impl PaymentRecord {
    pub fn balance(&self) -> Balance {
        Balance {
            amount_paid: self.amount_paid,
            amount_due: self.amount_due,
        }
    }

    /// True when the stored due amount agrees with the paid total.
    pub fn is_consistent(&self) -> bool {
        self.amount_due == amount_due_for(self.amount_paid)
    }
}

/// One row of the ledger view: a person joined with their payment state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub name: String,
    pub phone: String,
    pub amount_paid: Amount,
    pub amount_due: Amount,
}

impl LedgerEntry {
    pub fn is_pending(&self) -> bool {
        self.amount_due > 0
    }

    pub fn is_settled(&self) -> bool {
        !self.is_pending()
    }

    /// Share of the fixed fee already paid, capped at 100.
    pub fn percent_paid(&self) -> u8 {
        let paid = self.amount_paid.clamp(0, FIXED_FEE);
        (paid * 100 / FIXED_FEE) as u8
    }
}
