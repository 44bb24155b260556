use anyhow::{Context, Result};
use sqlx::sqlite::{SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool};
use thiserror::Error;

use crate::domain::{Amount, FIXED_FEE, LedgerEntry, PaymentRecord, Person, PersonId};

use super::MIGRATION_001_INITIAL;

/// Failure of a write that can collide with a uniqueness constraint.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Duplicate value violates {constraint}")]
    Duplicate { constraint: String },

    #[error(transparent)]
    Database(#[from] anyhow::Error),
}

impl StoreError {
    pub fn is_duplicate(&self) -> bool {
        matches!(self, StoreError::Duplicate { .. })
    }
}

/// Statistics for ledger integrity verification.
#[derive(Debug, Clone, Default)]
pub struct IntegrityStats {
    pub person_count: i64,
    pub record_count: i64,
    pub orphan_records: i64,
    pub inconsistent_due: i64,
    /// Records whose paid total went below zero. Allowed, but worth a look.
    pub negative_paid: i64,
}

/// Repository for persisting and querying people and their payment records.
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    /// Create a new repository with the given SQLite connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect to a SQLite database at the given URL.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = SqlitePool::connect(database_url)
            .await
            .context("Failed to connect to database")?;
        Ok(Self::new(pool))
    }

    /// Open a private in-memory database with the schema in place.
    ///
    /// The pool is pinned to one connection that never expires: every SQLite
    /// `:memory:` connection is its own database.
    pub async fn in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await
            .context("Failed to open in-memory database")?;
        let repo = Self::new(pool);
        repo.initialize_schema().await?;
        Ok(repo)
    }

    /// Create the tables if they do not exist yet. Safe to call repeatedly.
    pub async fn initialize_schema(&self) -> Result<()> {
        sqlx::query(MIGRATION_001_INITIAL)
            .execute(&self.pool)
            .await
            .context("Failed to run migration 001")?;
        Ok(())
    }

    /// Initialize a database (connect + create schema).
    pub async fn init(database_url: &str) -> Result<Self> {
        let repo = Self::connect(database_url).await?;
        repo.initialize_schema().await?;
        Ok(repo)
    }

    // ========================
    // Person operations
    // ========================

    /// Insert a new person. Name and phone must both be unused.
    pub async fn create_person(&self, name: &str, phone: &str) -> Result<Person, StoreError> {
        let result = sqlx::query("INSERT INTO people (name, phone) VALUES (?, ?)")
            .bind(name)
            .bind(phone)
            .execute(&self.pool)
            .await
            .map_err(|err| match err {
                sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                    StoreError::Duplicate {
                        constraint: db_err.message().to_string(),
                    }
                }
                other => StoreError::Database(
                    anyhow::Error::new(other).context("Failed to save person"),
                ),
            })?;

        Ok(Person {
            id: result.last_insert_rowid(),
            name: name.to_string(),
            phone: phone.to_string(),
        })
    }

    /// Get a person by exact name.
    pub async fn find_person_by_name(&self, name: &str) -> Result<Option<Person>> {
        let row = sqlx::query("SELECT id, name, phone FROM people WHERE name = ?")
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch person by name")?;

        Ok(row.as_ref().map(Self::row_to_person))
    }

    /// List all people in the order they were added.
    pub async fn list_people(&self) -> Result<Vec<Person>> {
        let rows = sqlx::query("SELECT id, name, phone FROM people ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .context("Failed to list people")?;

        Ok(rows.iter().map(Self::row_to_person).collect())
    }

    fn row_to_person(row: &SqliteRow) -> Person {
        Person {
            id: row.get("id"),
            name: row.get("name"),
            phone: row.get("phone"),
        }
    }

    // ========================
    // Payment record operations
    // ========================

    /// Get the payment record of a person, if they have paid anything yet.
    pub async fn get_payment_record(&self, person_id: PersonId) -> Result<Option<PaymentRecord>> {
        let row = sqlx::query(
            r#"
            SELECT id, person_id, amount_paid, amount_due
            FROM payment_records
            WHERE person_id = ?
            "#,
        )
        .bind(person_id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch payment record")?;

        Ok(row.as_ref().map(Self::row_to_payment_record))
    }

    /// List every payment record, ordered by person.
    pub async fn list_payment_records(&self) -> Result<Vec<PaymentRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT id, person_id, amount_paid, amount_due
            FROM payment_records
            ORDER BY person_id
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to list payment records")?;

        Ok(rows.iter().map(Self::row_to_payment_record).collect())
    }

    /// Insert the record for a person, or overwrite both totals if it exists.
    pub async fn upsert_payment_record(
        &self,
        person_id: PersonId,
        amount_paid: Amount,
        amount_due: Amount,
    ) -> Result<PaymentRecord> {
        let row = sqlx::query(
            r#"
            INSERT INTO payment_records (person_id, amount_paid, amount_due)
            VALUES (?, ?, ?)
            ON CONFLICT(person_id) DO UPDATE SET
                amount_paid = excluded.amount_paid,
                amount_due = excluded.amount_due
            RETURNING id, person_id, amount_paid, amount_due
            "#,
        )
        .bind(person_id)
        .bind(amount_paid)
        .bind(amount_due)
        .fetch_one(&self.pool)
        .await
        .context("Failed to save payment record")?;

        Ok(Self::row_to_payment_record(&row))
    }

    fn row_to_payment_record(row: &SqliteRow) -> PaymentRecord {
        PaymentRecord {
            id: row.get("id"),
            person_id: row.get("person_id"),
            amount_paid: row.get("amount_paid"),
            amount_due: row.get("amount_due"),
        }
    }

    // ========================
    // Ledger queries
    // ========================

    /// One row per person. People without a record owe the full fee.
    pub async fn list_all_persons_with_payments(&self) -> Result<Vec<LedgerEntry>> {
        let rows = sqlx::query(
            r#"
            SELECT
                p.name,
                p.phone,
                COALESCE(r.amount_paid, 0) as amount_paid,
                COALESCE(r.amount_due, ?) as amount_due
            FROM people p
            LEFT JOIN payment_records r ON r.person_id = p.id
            ORDER BY p.id
            "#,
        )
        .bind(FIXED_FEE)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list ledger")?;

        Ok(rows
            .iter()
            .map(|row| LedgerEntry {
                name: row.get("name"),
                phone: row.get("phone"),
                amount_paid: row.get("amount_paid"),
                amount_due: row.get("amount_due"),
            })
            .collect())
    }

    /// Get statistics for integrity checking.
    pub async fn integrity_stats(&self) -> Result<IntegrityStats> {
        let person_count: i64 = sqlx::query("SELECT COUNT(*) as count FROM people")
            .fetch_one(&self.pool)
            .await?
            .get("count");

        let record_count: i64 = sqlx::query("SELECT COUNT(*) as count FROM payment_records")
            .fetch_one(&self.pool)
            .await?
            .get("count");

        // Records pointing at a person that does not exist
        let orphan_records: i64 = sqlx::query(
            r#"
            SELECT COUNT(*) as count
            FROM payment_records r
            WHERE NOT EXISTS (SELECT 1 FROM people p WHERE p.id = r.person_id)
            "#,
        )
        .fetch_one(&self.pool)
        .await?
        .get("count");

        // Judged with the same rule the service writes with
        let records = self.list_payment_records().await?;
        let inconsistent_due = records.iter().filter(|r| !r.is_consistent()).count() as i64;
        let negative_paid = records.iter().filter(|r| r.amount_paid < 0).count() as i64;

        Ok(IntegrityStats {
            person_count,
            record_count,
            orphan_records,
            inconsistent_due,
            negative_paid,
        })
    }

    /// Raw access for maintenance and tests.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::amount_due_for;

    #[tokio::test]
    async fn test_schema_initialization_is_idempotent() -> Result<()> {
        let repo = Repository::in_memory().await?;
        repo.create_person("Alice", "555-0100").await?;

        repo.initialize_schema().await?;
        repo.initialize_schema().await?;

        assert_eq!(repo.list_people().await?.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_create_and_find_person() -> Result<()> {
        let repo = Repository::in_memory().await?;
        let created = repo.create_person("Alice", "555-0100").await?;

        let found = repo.find_person_by_name("Alice").await?.unwrap();
        assert_eq!(found, created);
        assert!(repo.find_person_by_name("alice").await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_duplicate_name_and_phone_are_rejected() -> Result<()> {
        let repo = Repository::in_memory().await?;
        repo.create_person("Alice", "555-0100").await?;

        let same_name = repo.create_person("Alice", "555-0199").await.unwrap_err();
        assert!(same_name.is_duplicate());

        let same_phone = repo.create_person("Bob", "555-0100").await.unwrap_err();
        assert!(same_phone.is_duplicate());

        assert_eq!(repo.list_people().await?.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_upsert_inserts_then_overwrites() -> Result<()> {
        let repo = Repository::in_memory().await?;
        let person = repo.create_person("Alice", "555-0100").await?;
        assert!(repo.get_payment_record(person.id).await?.is_none());

        let inserted = repo.upsert_payment_record(person.id, 300, 400).await?;
        assert_eq!(inserted.amount_paid, 300);

        let updated = repo.upsert_payment_record(person.id, 800, 0).await?;
        assert_eq!(updated.id, inserted.id);
        assert_eq!(updated.amount_paid, 800);
        assert_eq!(updated.amount_due, 0);

        // Same inputs again leave the row unchanged
        let again = repo.upsert_payment_record(person.id, 800, 0).await?;
        assert_eq!(again, updated);
        assert_eq!(repo.list_payment_records().await?.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_ledger_reports_full_fee_without_record() -> Result<()> {
        let repo = Repository::in_memory().await?;
        let alice = repo.create_person("Alice", "555-0100").await?;
        repo.create_person("Bob", "555-0101").await?;
        repo.upsert_payment_record(alice.id, 200, 500).await?;

        let rows = repo.list_all_persons_with_payments().await?;
        assert_eq!(rows.len(), 2);
        assert_eq!((rows[0].amount_paid, rows[0].amount_due), (200, 500));
        assert_eq!(rows[1].name, "Bob");
        assert_eq!((rows[1].amount_paid, rows[1].amount_due), (0, FIXED_FEE));
        Ok(())
    }

    #[tokio::test]
    async fn test_integrity_stats_flag_inconsistent_due() -> Result<()> {
        let repo = Repository::in_memory().await?;
        let alice = repo.create_person("Alice", "555-0100").await?;
        let bob = repo.create_person("Bob", "555-0101").await?;
        repo.upsert_payment_record(alice.id, 300, 400).await?;
        repo.upsert_payment_record(bob.id, 300, 100).await?;

        let stats = repo.integrity_stats().await?;
        assert_eq!(stats.person_count, 2);
        assert_eq!(stats.record_count, 2);
        assert_eq!(stats.orphan_records, 0);
        assert_eq!(stats.inconsistent_due, 1);
        assert_eq!(stats.negative_paid, 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_integrity_stats_use_saturating_due_rule() -> Result<()> {
        let repo = Repository::in_memory().await?;
        let alice = repo.create_person("Alice", "555-0100").await?;
        let bob = repo.create_person("Bob", "555-0101").await?;
        repo.upsert_payment_record(alice.id, Amount::MIN, amount_due_for(Amount::MIN))
            .await?;
        repo.upsert_payment_record(bob.id, -100, 800).await?;

        let stats = repo.integrity_stats().await?;
        assert_eq!(stats.inconsistent_due, 0);
        assert_eq!(stats.negative_paid, 2);
        Ok(())
    }
}
