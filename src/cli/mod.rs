use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::fs::File;
use std::io::{self, BufWriter};

use crate::application::PaymentService;
use crate::domain::{FIXED_FEE, LedgerEntry, parse_amount, validate_payment_input};
use crate::io::{Exporter, LedgerView};

/// Duesbook - Fixed Fee Payment Tracker
#[derive(Parser)]
#[command(name = "duesbook")]
#[command(about = "Track who has paid their share of a fixed fee, and who still owes")]
#[command(version)]
pub struct Cli {
    /// Database file path
    #[arg(short, long, global = true, default_value = "duesbook.db")]
    pub database: String,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new database
    Init,

    /// Person management commands
    #[command(subcommand)]
    Person(PersonCommands),

    /// Record a payment toward the fixed fee
    Pay {
        /// Name of the person paying
        name: String,

        /// Amount paid (0 to the fixed fee, in steps of 100)
        amount: String,
    },

    /// Show everyone with their paid and due totals
    Ledger {
        /// Only show people who still owe something
        #[arg(long)]
        pending: bool,

        /// Output format: table, json, csv
        #[arg(long, default_value = "table")]
        format: String,
    },

    /// Show collection totals
    Summary {
        /// Output format: table, json
        #[arg(long, default_value = "table")]
        format: String,
    },

    /// Verify ledger integrity
    Check,

    /// Export the full database as a JSON snapshot
    Export {
        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum PersonCommands {
    /// Add a new person
    Add {
        /// Person name (must be unique)
        name: String,

        /// Phone number (must be unique)
        phone: String,
    },

    /// List everyone
    List,

    /// Show one person and their balance
    Show {
        /// Person name
        name: String,
    },
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        match self.command {
            Commands::Init => {
                PaymentService::init(&self.database).await?;
                println!("Database initialized: {}", self.database);
            }

            Commands::Person(person_cmd) => {
                let service = PaymentService::connect(&self.database).await?;
                run_person_command(&service, person_cmd).await?;
            }

            Commands::Pay { name, amount } => {
                let service = PaymentService::connect(&self.database).await?;
                let amount = parse_amount(&amount)
                    .and_then(validate_payment_input)
                    .with_context(|| format!("Invalid amount '{}'", amount))?;

                let record = service.record_payment(&name, amount).await?;
                println!(
                    "Recorded payment: {} from {} (paid {}, due {})",
                    amount, name, record.amount_paid, record.amount_due
                );
            }

            Commands::Ledger { pending, format } => {
                let service = PaymentService::connect(&self.database).await?;
                let view = if pending {
                    LedgerView::Pending
                } else {
                    LedgerView::All
                };
                run_ledger_command(&service, view, &format).await?;
            }

            Commands::Summary { format } => {
                let service = PaymentService::connect(&self.database).await?;
                run_summary_command(&service, &format).await?;
            }

            Commands::Check => {
                let service = PaymentService::connect(&self.database).await?;
                run_check_command(&service).await?;
            }

            Commands::Export { output } => {
                let service = PaymentService::connect(&self.database).await?;
                run_export_command(&service, output.as_deref()).await?;
            }
        }

        Ok(())
    }
}

async fn run_person_command(service: &PaymentService, cmd: PersonCommands) -> Result<()> {
    match cmd {
        PersonCommands::Add { name, phone } => {
            let person = service.add_person(&name, &phone).await?;
            println!("Added person: {} ({})", person.name, person.phone);
        }

        PersonCommands::List => {
            let people = service.list_people().await?;
            if people.is_empty() {
                println!("No people found.");
            } else {
                println!("{:<6} {:<24} {:<16}", "ID", "NAME", "PHONE");
                println!("{}", "-".repeat(48));
                for person in people {
                    println!(
                        "{:<6} {:<24} {:<16}",
                        person.id,
                        truncate(&person.name, 24),
                        person.phone
                    );
                }
            }
        }

        PersonCommands::Show { name } => {
            let info = service.get_person_info(&name).await?;
            let balance = info.balance();

            println!("Person: {}", info.person.name);
            println!("  ID:          {}", info.person.id);
            println!("  Phone:       {}", info.person.phone);
            println!();
            println!("  Paid:        {}", balance.amount_paid);
            println!("  Due:         {}", balance.amount_due);
            println!(
                "  Status:      {}",
                if balance.is_settled() {
                    "settled"
                } else if info.record.is_none() {
                    "no payments yet"
                } else {
                    "pending"
                }
            );
        }
    }

    Ok(())
}

async fn run_ledger_command(service: &PaymentService, view: LedgerView, format: &str) -> Result<()> {
    match format {
        "json" => {
            Exporter::new(service)
                .export_ledger_json(io::stdout().lock(), view)
                .await?;
        }
        "csv" => {
            Exporter::new(service)
                .export_ledger_csv(io::stdout().lock(), view)
                .await?;
        }
        "table" => {
            let entries = match view {
                LedgerView::All => service.ledger().await?,
                LedgerView::Pending => service.pending().await?,
            };
            print_ledger_table(&entries, view);
        }
        other => anyhow::bail!("Unknown format '{}'. Valid formats: table, json, csv", other),
    }

    Ok(())
}

fn print_ledger_table(entries: &[LedgerEntry], view: LedgerView) {
    if entries.is_empty() {
        match view {
            LedgerView::All => println!("No people found."),
            LedgerView::Pending => println!("No pending payments."),
        }
        return;
    }

    println!(
        "{:<24} {:<16} {:>8} {:>8} {:>6}",
        "NAME", "PHONE", "PAID", "DUE", "%"
    );
    println!("{}", "-".repeat(66));
    for entry in entries {
        println!(
            "{:<24} {:<16} {:>8} {:>8} {:>5}%",
            truncate(&entry.name, 24),
            entry.phone,
            entry.amount_paid,
            entry.amount_due,
            entry.percent_paid()
        );
    }
}

async fn run_summary_command(service: &PaymentService, format: &str) -> Result<()> {
    let summary = service.summary().await?;

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&summary)?);
            return Ok(());
        }
        "table" => {}
        other => anyhow::bail!("Unknown format '{}'. Valid formats: table, json", other),
    }

    println!("Fixed fee:   {:>10}", summary.fixed_fee);
    println!("People:      {:>10}", summary.people);
    println!("  Settled:   {:>10}", summary.settled);
    println!("  Pending:   {:>10}", summary.pending);
    println!("{}", "-".repeat(23));
    println!("Collected:   {:>10}", summary.total_paid);
    println!("Outstanding: {:>10}", summary.total_due);
    println!("Expected:    {:>10}", summary.expected_total());

    Ok(())
}

async fn run_check_command(service: &PaymentService) -> Result<()> {
    println!("Checking ledger integrity...\n");

    let report = service.check_integrity().await?;

    println!("People:          {}", report.person_count);
    println!("Payment records: {}", report.record_count);
    println!("Fixed fee:       {}", FIXED_FEE);
    println!();

    if !report.notes.is_empty() {
        println!("Notes:");
        for note in &report.notes {
            println!("  - {}", note);
        }
        println!();
    }

    if report.is_healthy() {
        println!("Ledger is consistent.");
    } else {
        println!("Issues found:");
        for issue in &report.issues {
            println!("  - {}", issue);
        }
        anyhow::bail!("Ledger integrity check failed");
    }

    Ok(())
}

async fn run_export_command(service: &PaymentService, output: Option<&str>) -> Result<()> {
    let exporter = Exporter::new(service);

    let snapshot = match output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create output file '{}'", path))?;
            exporter.export_full_json(BufWriter::new(file)).await?
        }
        None => exporter.export_full_json(io::stdout().lock()).await?,
    };

    eprintln!(
        "Exported {} people and {} payment records",
        snapshot.people.len(),
        snapshot.payments.len()
    );

    Ok(())
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len - 3).collect();
        format!("{}...", kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("Alice", 24), "Alice");
        assert_eq!(truncate("Bartholomew Montgomery", 10), "Barthol...");
    }

    #[test]
    fn test_parse_pay_command() {
        let cli = Cli::try_parse_from(["duesbook", "-d", "test.db", "pay", "Alice", "300"]).unwrap();
        assert_eq!(cli.database, "test.db");
        match cli.command {
            Commands::Pay { name, amount } => {
                assert_eq!(name, "Alice");
                assert_eq!(amount, "300");
            }
            _ => panic!("expected pay command"),
        }
    }

    #[test]
    fn test_parse_ledger_pending() {
        let cli = Cli::try_parse_from(["duesbook", "ledger", "--pending", "--format", "csv"]).unwrap();
        assert_eq!(cli.database, "duesbook.db");
        assert!(matches!(
            cli.command,
            Commands::Ledger { pending: true, ref format } if format == "csv"
        ));
    }

    #[test]
    fn test_parse_summary_json() {
        let cli = Cli::try_parse_from(["duesbook", "summary", "--format", "json"]).unwrap();
        assert!(matches!(cli.command, Commands::Summary { ref format } if format == "json"));
    }
}
