//! # Seed Data Generator
//!
//! Populates a database with a realistic document population for trying
//! renumbering jobs locally.
//!
//! ## Usage
//! ```bash
//! # 200 invoices + 200 receipts (default)
//! cargo run -p folio-db --bin seed
//!
//! # Custom amount and path
//! cargo run -p folio-db --bin seed -- --count 1000 --db ./data/folio.db
//! ```
//!
//! ## Generated Documents
//! Series `F001` (invoices) and `B001` (receipts), each with a mix of:
//! - accepted documents (most of them)
//! - accepted duplicates (`2033` / "ya existe")
//! - real rejections
//! - outage rejections (`0109`, ETIMEDOUT)
//! - documents still `pending` or `sending`

use chrono::{Duration, Utc};
use std::env;
use uuid::Uuid;

use folio_core::{
    format_document_number, Document, DocumentType, SeriesCounter, SubmissionStatus, DEFAULT_TENANT_ID,
};
use folio_db::{Database, DbConfig};

/// Response profiles cycled through the population: (status, code, description).
const PROFILES: &[(SubmissionStatus, Option<&str>, Option<&str>)] = &[
    (SubmissionStatus::Accepted, Some("0"), Some("La Factura ha sido aceptada")),
    (SubmissionStatus::Accepted, Some("0"), Some("La Factura ha sido aceptada")),
    (SubmissionStatus::Accepted, Some("0"), Some("La Factura ha sido aceptada")),
    (SubmissionStatus::Accepted, Some("2033"), Some("El comprobante ya existe")),
    (SubmissionStatus::Accepted, Some("0100"), Some("El comprobante fue registrado anteriormente")),
    (SubmissionStatus::Rejected, Some("2017"), Some("El RUC del receptor no existe")),
    (SubmissionStatus::Rejected, Some("0109"), Some("El servicio no está disponible")),
    (SubmissionStatus::Rejected, None, Some("connect ETIMEDOUT 190.223.40.1:443")),
    (SubmissionStatus::Pending, None, None),
    (SubmissionStatus::Sending, None, None),
];

const SERIES: &[(DocumentType, &str)] = &[(DocumentType::Invoice, "F001"), (DocumentType::Receipt, "B001")];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut count: i64 = 200;
    let mut db_path = String::from("./folio_dev.db");
    let mut tenant_id = String::from(DEFAULT_TENANT_ID);

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--count" | "-c" => {
                if i + 1 < args.len() {
                    count = args[i + 1].parse().unwrap_or(200);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--tenant" | "-t" => {
                if i + 1 < args.len() {
                    tenant_id = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Folio Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --count <N>     Documents per series (default: 200)");
                println!("  -d, --db <PATH>     Database file path (default: ./folio_dev.db)");
                println!("  -t, --tenant <ID>   Tenant id (default: built-in tenant)");
                println!("  -h, --help          Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("Folio Seed Data Generator");
    println!("=========================");
    println!("Database: {}", db_path);
    println!("Per series: {}", count);
    println!();

    let db = Database::new(DbConfig::new(&db_path).tenant_id(&tenant_id)).await?;
    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.documents().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} documents", existing);
        println!("  Skipping seed to avoid duplicates.");
        return Ok(());
    }

    let start = Utc::now() - Duration::days(30);
    let mut generated = 0;

    for (document_type, series) in SERIES {
        for n in 1..=count {
            let (status, code, description) = PROFILES[(n as usize) % PROFILES.len()];
            let created_at = start + Duration::minutes(n * 7);

            let doc = Document {
                id: Uuid::new_v4().to_string(),
                tenant_id: tenant_id.clone(),
                document_type: *document_type,
                series: series.to_string(),
                correlative_number: n,
                number: format_document_number(series, n),
                submission_status: status,
                response_code: code.map(String::from),
                response_description: description.map(String::from),
                signature_hash: Some(format!("{:x}", n * 7919)),
                receipt_hash: (status == SubmissionStatus::Accepted).then(|| format!("{:x}", n * 104729)),
                created_at,
                updated_at: created_at,
                renumber_audit: None,
            };

            if let Err(e) = db.documents().insert(&doc).await {
                eprintln!("Failed to insert {}: {}", doc.number, e);
                continue;
            }
            generated += 1;
        }

        db.counters()
            .set(&SeriesCounter {
                document_type: *document_type,
                series: series.to_string(),
                last_number: count,
            })
            .await?;
    }

    println!("✓ Generated {} documents", generated);
    println!();
    println!("Try: folio-runner job.toml");

    db.close().await;
    Ok(())
}
