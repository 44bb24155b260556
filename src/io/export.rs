use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::Write;

use crate::application::PaymentService;
use crate::domain::{Amount, FIXED_FEE, LedgerEntry, PaymentRecord, Person};

/// Which rows of the ledger to export.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerView {
    All,
    Pending,
}

/// Database snapshot for full export
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSnapshot {
    pub version: String,
    pub exported_at: DateTime<Utc>,
    pub fixed_fee: Amount,
    pub people: Vec<Person>,
    pub payments: Vec<PaymentRecord>,
}

/// Exporter for converting ledger data to various formats
pub struct Exporter<'a> {
    service: &'a PaymentService,
}

impl<'a> Exporter<'a> {
    pub fn new(service: &'a PaymentService) -> Self {
        Self { service }
    }

    async fn entries(&self, view: LedgerView) -> Result<Vec<LedgerEntry>> {
        let entries = match view {
            LedgerView::All => self.service.ledger().await?,
            LedgerView::Pending => self.service.pending().await?,
        };
        Ok(entries)
    }

    /// Export ledger rows to CSV format
    pub async fn export_ledger_csv<W: Write>(&self, writer: W, view: LedgerView) -> Result<usize> {
        let entries = self.entries(view).await?;
        let mut csv_writer = csv::Writer::from_writer(writer);

        csv_writer.write_record(["name", "phone", "amount_paid", "amount_due"])?;

        for entry in &entries {
            csv_writer.write_record([
                entry.name.clone(),
                entry.phone.clone(),
                entry.amount_paid.to_string(),
                entry.amount_due.to_string(),
            ])?;
        }

        csv_writer.flush()?;
        Ok(entries.len())
    }

    /// Export ledger rows as a JSON array
    pub async fn export_ledger_json<W: Write>(&self, mut writer: W, view: LedgerView) -> Result<usize> {
        let entries = self.entries(view).await?;

        serde_json::to_writer_pretty(&mut writer, &entries)?;
        writeln!(writer)?;
        writer.flush()?;

        Ok(entries.len())
    }

    /// Export full database as JSON snapshot
    pub async fn export_full_json<W: Write>(&self, mut writer: W) -> Result<DatabaseSnapshot> {
        let people = self.service.list_people().await?;
        let payments = self.service.list_payment_records().await?;

        let snapshot = DatabaseSnapshot {
            version: env!("CARGO_PKG_VERSION").to_string(),
            exported_at: Utc::now(),
            fixed_fee: FIXED_FEE,
            people,
            payments,
        };

        let json = serde_json::to_string_pretty(&snapshot)?;
        writer.write_all(json.as_bytes())?;
        writer.flush()?;

        Ok(snapshot)
    }
}
