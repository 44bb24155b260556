// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use anyhow::Result;
use duesbook::application::PaymentService;
use tempfile::TempDir;

/// Helper to create a test service with a temporary database
pub async fn test_service() -> Result<(PaymentService, TempDir)> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("test.db");
    let service = PaymentService::init(db_path.to_str().unwrap()).await?;
    Ok((service, temp_dir))
}

/// Test fixture: a small group of people
pub struct StandardPeople;

impl StandardPeople {
    /// Add Alice, Bob and Carol with distinct phone numbers
    pub async fn create_basic(service: &PaymentService) -> Result<()> {
        service.add_person("Alice", "555-0100").await?;
        service.add_person("Bob", "555-0101").await?;
        service.add_person("Carol", "555-0102").await?;
        Ok(())
    }
}
