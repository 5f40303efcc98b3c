//! # Folio Runner
//!
//! Runs a renumbering job against the local document store.
//!
//! ## Usage
//! ```bash
//! # Run the job described in job.toml
//! folio-runner job.toml
//!
//! # Same, job path from the environment
//! FOLIO_JOB=job.toml folio-runner
//!
//! # Put outage rejections and stale `sending` documents back to `pending`
//! folio-runner --reset-stuck
//! ```
//!
//! ## Job Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  search ──► select ──► preview (logged) ──► commit? ──► resubmit?      │
//! │                                                                         │
//! │  Ctrl-C / SIGTERM cancels the running phase. Documents already         │
//! │  renumbered or resubmitted stay as they are.                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Engine settings come from `folio.toml` (path in `FOLIO_CONFIG`, else the
//! platform config dir) and `FOLIO_*` environment variables.

mod job;

use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use folio_core::OutcomeClass;
use folio_db::{Database, DbConfig};
use folio_engine::{
    reset_stuck, CancelToken, EngineConfig, EngineError, HttpAuthority, Phase, RenumberWorkflow,
    TracingEmitter,
};

use crate::job::{JobSpec, Selection};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let arg = std::env::args().nth(1);
    let command = match arg.as_deref() {
        Some("--help") | Some("-h") => {
            print_usage();
            return Ok(());
        }
        Some("--reset-stuck") => Command::ResetStuck,
        Some(path) => Command::Job(PathBuf::from(path)),
        None => match std::env::var("FOLIO_JOB") {
            Ok(path) => Command::Job(PathBuf::from(path)),
            Err(_) => {
                print_usage();
                return Err("no job file given".into());
            }
        },
    };

    let config = EngineConfig::load(std::env::var("FOLIO_CONFIG").ok().map(PathBuf::from))?;
    info!(
        db = %config.database.path.display(),
        tenant = %config.database.tenant_id,
        counter_policy = ?config.numbering.counter_policy,
        "Configuration loaded"
    );

    let db = Database::new(DbConfig::new(&config.database.path).tenant_id(&config.database.tenant_id)).await?;

    let result = match command {
        Command::ResetStuck => run_reset_stuck(&db, &config).await,
        Command::Job(path) => run_job(&db, &config, &path).await,
    };

    db.close().await;
    result
}

enum Command {
    Job(PathBuf),
    ResetStuck,
}

fn print_usage() {
    println!("Folio Runner");
    println!();
    println!("Usage: folio-runner [JOB_FILE | --reset-stuck]");
    println!();
    println!("  JOB_FILE        TOML job description (default: $FOLIO_JOB)");
    println!("  --reset-stuck   Reset outage rejections and stale sends to pending");
    println!("  -h, --help      Show this help message");
}

/// Initializes the tracing subscriber for structured logging.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=folio_engine=trace` - Show trace for the engine only
/// - Default: INFO, DEBUG for folio crates
fn init_tracing() {
    tracing_subscriber::fmt().with_env_filter(log_filter()).init();
}

const DEFAULT_LOG_FILTER: &str = "info,folio=debug,sqlx=warn";

fn log_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
}

async fn run_job(
    db: &Database,
    config: &EngineConfig,
    path: &std::path::Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let job = JobSpec::load(path)?;
    info!(job = %path.display(), target_series = %job.renumber.target_series, "Running job");

    let mut workflow =
        RenumberWorkflow::new(Arc::new(db.clone()), config).with_emitter(Arc::new(TracingEmitter));
    if job.renumber.resubmit {
        let authority = HttpAuthority::from_config(config).map_err(|e| phase_failed(Phase::Resubmit, e))?;
        workflow = workflow.with_authority(Arc::new(authority));
    }

    let cancel = workflow.cancel_token();
    tokio::spawn(cancel_on_signal(cancel.clone()));

    let found = workflow
        .search(job.criteria()?)
        .await
        .map_err(|e| phase_failed(Phase::Search, e))?;
    info!(found, "Candidates loaded");

    let selected = match &job.renumber.select {
        Selection::All => workflow.select_all(),
        Selection::Ids(ids) => workflow.select(ids.clone()),
    };
    selected.map_err(|e| phase_failed(Phase::Search, e))?;

    let preview = workflow
        .preview(&job.renumber.target_series)
        .await
        .map_err(|e| phase_failed(Phase::Preview, e))?;
    info!(
        target_series = %preview.target_series,
        base = preview.base,
        documents = preview.len(),
        "Preview"
    );
    for entry in &preview.entries {
        info!(from = %entry.old_number, to = %entry.new_number, document_id = %entry.document_id, "Preview entry");
    }

    if !job.renumber.commit {
        info!("commit = false, stopping after preview");
        return Ok(());
    }

    let outcome = workflow.commit().await.map_err(|e| phase_failed(Phase::Commit, e))?;
    if outcome.class() == OutcomeClass::FullFailure && outcome.attempted() > 0 {
        return Err("no document could be renumbered".into());
    }

    if job.renumber.resubmit {
        if outcome.cancelled || cancel.is_cancelled() {
            warn!("Cancelled, skipping resubmission");
        } else if outcome.committed_count() > 0 {
            workflow.resubmit().await.map_err(|e| phase_failed(Phase::Resubmit, e))?;
        }
    }

    Ok(())
}

/// Logs a phase failure by category before it ends the job.
fn phase_failed(phase: Phase, err: EngineError) -> EngineError {
    if err.is_validation() {
        warn!(%phase, error = %err, "Job input rejected");
    } else if err.is_config_error() {
        error!(%phase, error = %err, "Configuration problem");
    } else {
        error!(%phase, error = %err, "Phase failed");
    }
    err
}

async fn run_reset_stuck(db: &Database, config: &EngineConfig) -> Result<(), Box<dyn std::error::Error>> {
    let outcome = reset_stuck(
        db,
        &config.classifier.transient_classifier(),
        config.classifier.sending_grace()?,
        Utc::now(),
        config.store_timeout(),
        &TracingEmitter,
    )
    .await?;

    info!(reset = outcome.reset.len(), errors = outcome.errors.len(), "Stuck documents reset");
    for error in &outcome.errors {
        warn!(document = %error.old_number, error = %error.error, "Not reset");
    }
    Ok(())
}

/// Cancels `token` on Ctrl+C or SIGTERM.
async fn cancel_on_signal(token: CancelToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    warn!("Shutdown signal received, cancelling after the current document...");
    token.cancel();
}
