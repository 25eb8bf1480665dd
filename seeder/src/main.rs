//! `seed` - upload case study records to Firestore
//!
//! Reads `case_studies.json` (or the configured input), then creates one
//! Firestore document per record. Any error ends the run with a single error
//! line and a non-zero exit status.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{error, info};

use case_study_seeder::{
    BatchUploader, Config, DocumentStore, FailurePolicy, FirestoreStore, InMemoryStore,
    RecordCollection, UploadReport,
};

/// Command-line interface for the seeder
#[derive(Parser)]
#[command(
    name = "seed",
    version,
    about = "Upload portfolio case studies from a JSON file into Firestore"
)]
struct Cli {
    /// TOML configuration file (environment variables are used otherwise)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Input JSON file
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Top-level key holding the records
    #[arg(long)]
    key: Option<String>,

    /// Target collection
    #[arg(long)]
    collection: Option<String>,

    /// Keep going after a failed record and report failures at the end
    #[arg(long)]
    continue_on_error: bool,

    /// Reject the whole batch if any record does not match the case study schema
    #[arg(long)]
    validate: bool,

    /// Upload into an in-process store instead of Firestore
    #[arg(long)]
    dry_run: bool,

    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn apply(&self, config: &mut Config) {
        if let Some(input) = &self.input {
            config.input.path = input.clone();
        }
        if let Some(key) = &self.key {
            config.input.top_level_key = key.clone();
        }
        if let Some(collection) = &self.collection {
            config.upload.collection = collection.clone();
        }
        if self.continue_on_error {
            config.upload.failure_policy = FailurePolicy::ContinueOnError;
        }
        if self.validate {
            config.upload.validate_schema = true;
        }
    }
}

#[tokio::main]
async fn main() {
    // Load environment variables
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    if let Err(e) = shared::observability::init_cli_logging("seed", cli.verbose) {
        eprintln!("Failed to initialize logging: {}", e);
    }

    if let Err(e) = run(cli).await {
        report_failure(&e);
        std::process::exit(1);
    }
}

/// The single error line a failed run produces
fn report_failure(error: &anyhow::Error) {
    error!("Error uploading data: {:#}", error);
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::from_env()?,
    };
    cli.apply(&mut config);
    config.validate()?;

    info!("Reading {} file...", config.input.path.display());
    let records = RecordCollection::load(&config.input.path, &config.input.top_level_key)?;

    if cli.dry_run {
        let store = InMemoryStore::new();
        let report = upload(&store, &records, &config).await?;
        info!(
            "Dry run complete: {} documents would be created in '{}'",
            report.succeeded.len(),
            config.upload.collection
        );
        return Ok(());
    }

    let timeout = Duration::from_secs(config.upload.request_timeout_seconds);
    let store = FirestoreStore::new(&config.firebase, timeout)
        .context("Failed to initialize Firestore client")?;
    info!("Connected to Firestore project {}", config.firebase.project_id);

    upload(&store, &records, &config).await?;
    Ok(())
}

async fn upload(
    store: &dyn DocumentStore,
    records: &RecordCollection,
    config: &Config,
) -> Result<UploadReport> {
    let report = BatchUploader::new(store, &config.upload.collection)?
        .with_policy(config.upload.failure_policy)
        .with_schema_validation(config.upload.validate_schema)
        .run(records)
        .await?;

    if !report.is_clean() {
        anyhow::bail!(
            "{} of {} records failed to upload",
            report.failed.len(),
            report.attempted()
        );
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::{Arc, Mutex};
    use tracing_subscriber::fmt::MakeWriter;

    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl CapturedLogs {
        fn lines_with(&self, needle: &str) -> Vec<String> {
            let buffer = self.0.lock().unwrap();
            String::from_utf8_lossy(&buffer)
                .lines()
                .filter(|line| line.contains(needle))
                .map(str::to_string)
                .collect()
        }
    }

    impl Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for CapturedLogs {
        type Writer = CapturedLogs;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    #[test]
    fn test_cli_overrides_config() {
        let cli = Cli::parse_from([
            "seed",
            "--input",
            "data/projects.json",
            "--collection",
            "archive",
            "--continue-on-error",
            "--validate",
        ]);
        let mut config = Config::default();
        cli.apply(&mut config);

        assert_eq!(config.input.path, PathBuf::from("data/projects.json"));
        assert_eq!(config.input.top_level_key, "case_studies");
        assert_eq!(config.upload.collection, "archive");
        assert_eq!(config.upload.failure_policy, FailurePolicy::ContinueOnError);
        assert!(config.upload.validate_schema);
    }

    #[tokio::test]
    async fn test_upload_fails_on_partial_report() {
        let store = InMemoryStore::new();
        let records = RecordCollection::from_json_str(
            r#"{"case_studies": {"ok": {"name": "Ok"}, "broken": "not an object"}}"#,
            "case_studies",
        )
        .unwrap();
        let mut config = Config::default();
        config.upload.failure_policy = FailurePolicy::ContinueOnError;

        let result = upload(&store, &records, &config).await;

        assert!(result.is_err());
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_fail_fast_run_reports_one_error() {
        let logs = CapturedLogs::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(logs.clone())
            .with_ansi(false)
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let store = InMemoryStore::new();
        let records = RecordCollection::from_json_str(
            r#"{"case_studies": {
                "first": {"name": "First"},
                "broken": "not an object",
                "third": {"name": "Third"}
            }}"#,
            "case_studies",
        )
        .unwrap();
        let config = Config::default();
        assert_eq!(config.upload.failure_policy, FailurePolicy::FailFast);

        let err = upload(&store, &records, &config).await.unwrap_err();
        report_failure(&err);

        // Only the record before the failure was written
        assert_eq!(store.len(), 1);
        assert_eq!(store.documents()[0].body["name"], "First");

        let errors = logs.lines_with("ERROR");
        assert_eq!(errors.len(), 1, "{:?}", errors);
        assert!(errors[0].contains("Error uploading data: upload aborted at record 'broken'"));
    }
}
