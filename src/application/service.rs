use std::path::Path;
use tracing::{debug, info, warn};

use crate::domain::{Amount, Balance, LedgerEntry, PaymentRecord, Person};
use crate::storage::Repository;

use super::{AppError, IntegrityReport, LedgerSummary, build_integrity_report};

/// Application service providing the fee-tracking operations.
/// This is the primary interface for any client (CLI, export, tests).
pub struct PaymentService {
    repo: Repository,
}

/// A person together with their current balance.
pub struct PersonInfo {
    pub person: Person,
    pub record: Option<PaymentRecord>,
}

impl PersonInfo {
    pub fn balance(&self) -> Balance {
        self.record
            .as_ref()
            .map(PaymentRecord::balance)
            .unwrap_or_default()
    }
}

impl PaymentService {
    /// Create a new payment service with the given repository.
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    /// Initialize a database at the given path, creating it if needed.
    pub async fn init(database_path: &str) -> Result<Self, AppError> {
        let db_url = format!("sqlite:{}?mode=rwc", database_path);
        let repo = Repository::init(&db_url).await?;
        debug!(database = database_path, "schema ready");
        Ok(Self::new(repo))
    }

    /// Connect to an existing database.
    pub async fn connect(database_path: &str) -> Result<Self, AppError> {
        if !Path::new(database_path).exists() {
            return Err(AppError::DatabaseNotInitialized(database_path.to_string()));
        }
        let db_url = format!("sqlite:{}", database_path);
        let repo = Repository::connect(&db_url).await?;
        Ok(Self::new(repo))
    }

    pub fn repository(&self) -> &Repository {
        &self.repo
    }

    // ========================
    // People
    // ========================

    /// Add a new person. Fails if the name or the phone is already taken.
    pub async fn add_person(&self, name: &str, phone: &str) -> Result<Person, AppError> {
        match self.repo.create_person(name, phone).await {
            Ok(person) => {
                info!(id = person.id, name = %person.name, "person added");
                Ok(person)
            }
            Err(err) => {
                let err = AppError::from_store(err, name, phone);
                if err.is_rejection() {
                    warn!(name, phone, "duplicate person rejected");
                }
                Err(err)
            }
        }
    }

    /// Get a person by name.
    pub async fn get_person(&self, name: &str) -> Result<Person, AppError> {
        self.repo
            .find_person_by_name(name)
            .await?
            .ok_or_else(|| AppError::PersonNotFound(name.to_string()))
    }

    /// Get a person along with their payment record.
    pub async fn get_person_info(&self, name: &str) -> Result<PersonInfo, AppError> {
        let person = self.get_person(name).await?;
        let record = self.repo.get_payment_record(person.id).await?;
        Ok(PersonInfo { person, record })
    }

    /// List everyone, in the order they were added.
    pub async fn list_people(&self) -> Result<Vec<Person>, AppError> {
        Ok(self.repo.list_people().await?)
    }

    // ========================
    // Payments
    // ========================

    /// Record a payment toward the fixed fee.
    ///
    /// The amount is applied as given: bounds on hand-entered input are the
    /// caller's business. The first payment creates the person's record,
    /// later ones add to it. The amount due is floored at zero either way.
    pub async fn record_payment(&self, name: &str, amount: Amount) -> Result<PaymentRecord, AppError> {
        let person = match self.repo.find_person_by_name(name).await? {
            Some(person) => person,
            None => {
                warn!(name, amount, "payment for unknown person rejected");
                return Err(AppError::PersonNotFound(name.to_string()));
            }
        };

        let existing = self.repo.get_payment_record(person.id).await?;
        let balance = existing
            .as_ref()
            .map(PaymentRecord::balance)
            .unwrap_or_else(Balance::unpaid)
            .credit(amount);

        let record = self
            .repo
            .upsert_payment_record(person.id, balance.amount_paid, balance.amount_due)
            .await?;

        info!(
            name = %person.name,
            amount,
            amount_paid = record.amount_paid,
            amount_due = record.amount_due,
            first_payment = existing.is_none(),
            "payment recorded"
        );
        Ok(record)
    }

    /// Get the payment record of a person, if they have paid anything yet.
    pub async fn get_payment_record(&self, name: &str) -> Result<Option<PaymentRecord>, AppError> {
        let person = self.get_person(name).await?;
        Ok(self.repo.get_payment_record(person.id).await?)
    }

    pub async fn list_payment_records(&self) -> Result<Vec<PaymentRecord>, AppError> {
        Ok(self.repo.list_payment_records().await?)
    }

    // ========================
    // Ledger views
    // ========================

    /// Every person with their paid and due totals.
    pub async fn ledger(&self) -> Result<Vec<LedgerEntry>, AppError> {
        let entries = self.repo.list_all_persons_with_payments().await?;
        debug!(rows = entries.len(), "ledger loaded");
        Ok(entries)
    }

    /// Only the people who still owe something.
    pub async fn pending(&self) -> Result<Vec<LedgerEntry>, AppError> {
        let mut entries = self.ledger().await?;
        entries.retain(LedgerEntry::is_pending);
        Ok(entries)
    }

    pub async fn summary(&self) -> Result<LedgerSummary, AppError> {
        let entries = self.ledger().await?;
        Ok(LedgerSummary::from_entries(&entries))
    }

    /// Verify that the stored records obey the ledger invariants.
    pub async fn check_integrity(&self) -> Result<IntegrityReport, AppError> {
        let stats = self.repo.integrity_stats().await?;
        let report = build_integrity_report(&stats);
        if !report.is_healthy() {
            warn!(issues = report.issues.len(), "integrity check found problems");
        }
        Ok(report)
    }
}
