use serde::Serialize;

use crate::domain::{Amount, FIXED_FEE, LedgerEntry};
use crate::storage::IntegrityStats;

/// Totals across the whole ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LedgerSummary {
    pub fixed_fee: Amount,
    pub people: usize,
    pub settled: usize,
    pub pending: usize,
    pub total_paid: Amount,
    pub total_due: Amount,
}

impl LedgerSummary {
    pub fn from_entries(entries: &[LedgerEntry]) -> Self {
        let pending = entries.iter().filter(|e| e.is_pending()).count();
        Self {
            fixed_fee: FIXED_FEE,
            people: entries.len(),
            settled: entries.len() - pending,
            pending,
            total_paid: entries
                .iter()
                .map(|e| e.amount_paid)
                .fold(0, Amount::saturating_add),
            total_due: entries
                .iter()
                .map(|e| e.amount_due)
                .fold(0, Amount::saturating_add),
        }
    }

    /// What the ledger would hold if everybody paid exactly the fee.
    pub fn expected_total(&self) -> Amount {
        let people = Amount::try_from(self.people).unwrap_or(Amount::MAX);
        FIXED_FEE.saturating_mul(people)
    }
}

/// Result of verifying the stored ledger.
#[derive(Debug, Clone)]
pub struct IntegrityReport {
    pub person_count: i64,
    pub record_count: i64,
    pub issues: Vec<String>,
    /// Observations that do not break any invariant.
    pub notes: Vec<String>,
}

impl IntegrityReport {
    pub fn is_healthy(&self) -> bool {
        self.issues.is_empty()
    }
}

pub fn build_integrity_report(stats: &IntegrityStats) -> IntegrityReport {
    let mut issues = Vec::new();

    if stats.record_count > stats.person_count {
        issues.push(format!(
            "{} payment records for only {} people",
            stats.record_count, stats.person_count
        ));
    }
    if stats.orphan_records > 0 {
        issues.push(format!(
            "{} payment records reference a missing person",
            stats.orphan_records
        ));
    }
    if stats.inconsistent_due > 0 {
        issues.push(format!(
            "{} payment records have an amount due that does not match the amount paid",
            stats.inconsistent_due
        ));
    }

    let mut notes = Vec::new();
    if stats.negative_paid > 0 {
        notes.push(format!(
            "{} payment records have a negative amount paid",
            stats.negative_paid
        ));
    }

    IntegrityReport {
        person_count: stats.person_count,
        record_count: stats.record_count,
        issues,
        notes,
    }
}
