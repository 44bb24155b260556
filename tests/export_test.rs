mod common;

use anyhow::Result;
use common::{StandardPeople, test_service};
use duesbook::domain::LedgerEntry;
use duesbook::io::{DatabaseSnapshot, Exporter, LedgerView};

#[tokio::test]
async fn test_export_ledger_csv() -> Result<()> {
    let (service, _temp) = test_service().await?;
    StandardPeople::create_basic(&service).await?;
    service.record_payment("Alice", 300).await?;
    service.record_payment("Bob", 700).await?;

    let mut output = Vec::new();
    let count = Exporter::new(&service)
        .export_ledger_csv(&mut output, LedgerView::All)
        .await?;
    assert_eq!(count, 3);

    let csv = String::from_utf8(output)?;
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines[0], "name,phone,amount_paid,amount_due");
    assert_eq!(lines[1], "Alice,555-0100,300,400");
    assert_eq!(lines[2], "Bob,555-0101,700,0");
    assert_eq!(lines[3], "Carol,555-0102,0,700");

    Ok(())
}

#[tokio::test]
async fn test_export_pending_csv_skips_settled() -> Result<()> {
    let (service, _temp) = test_service().await?;
    StandardPeople::create_basic(&service).await?;
    service.record_payment("Bob", 700).await?;

    let mut output = Vec::new();
    let count = Exporter::new(&service)
        .export_ledger_csv(&mut output, LedgerView::Pending)
        .await?;
    assert_eq!(count, 2);

    let csv = String::from_utf8(output)?;
    assert!(!csv.contains("Bob"));

    Ok(())
}

#[tokio::test]
async fn test_export_ledger_json() -> Result<()> {
    let (service, _temp) = test_service().await?;
    StandardPeople::create_basic(&service).await?;
    service.record_payment("Carol", 500).await?;

    let mut output = Vec::new();
    Exporter::new(&service)
        .export_ledger_json(&mut output, LedgerView::All)
        .await?;

    let entries: Vec<LedgerEntry> = serde_json::from_slice(&output)?;
    assert_eq!(entries, service.ledger().await?);
    assert_eq!(entries[2].amount_due, 200);

    Ok(())
}

#[tokio::test]
async fn test_export_full_snapshot() -> Result<()> {
    let (service, _temp) = test_service().await?;
    StandardPeople::create_basic(&service).await?;
    service.record_payment("Alice", 300).await?;

    let mut output = Vec::new();
    let snapshot = Exporter::new(&service).export_full_json(&mut output).await?;
    assert_eq!(snapshot.people.len(), 3);
    assert_eq!(snapshot.payments.len(), 1);

    let parsed: DatabaseSnapshot = serde_json::from_slice(&output)?;
    assert_eq!(parsed.fixed_fee, 700);
    assert_eq!(parsed.people, snapshot.people);
    assert_eq!(parsed.payments[0].person_id, parsed.people[0].id);
    assert_eq!(parsed.payments[0].amount_due, 400);

    Ok(())
}
