//! CLI binary for extractflow.
//!
//! A thin shim over the library crate that maps CLI flags to `FlowConfig`,
//! drives the flow end to end, and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use extractflow::{
    ExtractPhase, ExtractProgressCallback, FlowConfig, FlowController, FlowError, UploadedFile,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: renders the four-phase extraction contract
/// as a single percentage bar with the current status line.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Self {
        let bar = ProgressBar::new(100);
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  [{bar:42.green/238}] {pos:>3}%  {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ");
        bar.set_style(style);
        bar.set_prefix("Extracting");
        bar.enable_steady_tick(Duration::from_millis(80));
        Self { bar }
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl ExtractProgressCallback for CliProgressCallback {
    fn on_phase(&self, phase: ExtractPhase) {
        self.bar.set_position(phase.percent() as u64);
        self.bar.set_message(phase.status().to_string());
    }

    fn on_failed(&self, error: &str) {
        self.bar.set_message(format!("failed: {error}"));
    }
}

// ── CLI definition ───────────────────────────────────────────────────────────

/// Upload text files, run a remote extraction job, and review the results.
#[derive(Parser, Debug)]
#[command(name = "extractflow", version, about)]
struct Cli {
    /// Text files to upload as one batch.
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Root URL of the remote processing service.
    #[arg(long, env = "EXTRACTFLOW_BASE_URL")]
    base_url: Option<String>,

    /// Per-call timeout in seconds.
    #[arg(long, default_value_t = 60)]
    timeout_secs: u64,

    /// Write the extracted records to this CSV file.
    #[arg(long, short)]
    output: Option<PathBuf>,

    /// Leave the created remote objects on the service instead of deleting
    /// them at the end.
    #[arg(long)]
    keep_objects: bool,

    /// Print the full audit log as JSON after the run.
    #[arg(long)]
    show_audit: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut builder = FlowConfig::builder().api_timeout_secs(cli.timeout_secs);
    if let Some(url) = &cli.base_url {
        builder = builder.base_url(url);
    }
    let config = builder.build().context("invalid configuration")?;

    let mut files = Vec::with_capacity(cli.files.len());
    for path in &cli.files {
        files.push(
            UploadedFile::from_path(path)
                .await
                .with_context(|| format!("reading {}", path.display()))?,
        );
    }

    let mut flow = FlowController::new(config);

    eprintln!("{} Uploading {} file(s)…", bold("◆"), files.len());
    let ticket = flow.submit_files(files).await.context("upload failed")?;

    // Ctrl-C cancels the in-flight job cooperatively: the settled remote
    // result is discarded, not the HTTP exchange itself.
    let cancel_ticket = ticket.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            cancel_ticket.cancel();
        }
    });

    let progress = CliProgressCallback::new();
    let result = flow.run_extraction(&progress).await;
    progress.finish();

    match result {
        Ok(()) => {}
        Err(FlowError::Cancelled) => {
            eprintln!("{} Extraction cancelled", red("✘"));
            print_audit_if_requested(&flow, cli.show_audit)?;
            std::process::exit(130);
        }
        Err(e) => {
            print_audit_if_requested(&flow, cli.show_audit)?;
            return Err(e).context("extraction failed");
        }
    }

    print_records(&flow);

    if let Some(output) = &cli.output {
        flow.export_csv(output)
            .await
            .with_context(|| format!("exporting to {}", output.display()))?;
        eprintln!("{} Wrote {}", green("✔"), output.display());
    }

    print_audit_if_requested(&flow, cli.show_audit)?;

    if cli.keep_objects {
        eprintln!(
            "{} Keeping {} remote object(s)",
            dim("·"),
            flow.tracked_objects().len()
        );
        let _ = flow.reset_flow();
    } else {
        let failures = flow
            .delete_remote_objects()
            .await
            .context("cleanup failed")?;
        if failures.is_empty() {
            eprintln!("{} Remote objects deleted", green("✔"));
        } else {
            for failure in &failures {
                eprintln!("{} {}", red("✗"), failure);
            }
        }
    }

    Ok(())
}

/// Render the result table with aligned columns.
fn print_records(flow: &FlowController) {
    let records = flow.records();
    let field_width = records
        .iter()
        .map(|r| r.field.len())
        .chain(std::iter::once("Field".len()))
        .max()
        .unwrap_or(5);
    let value_width = records
        .iter()
        .map(|r| r.value.len())
        .chain(std::iter::once("Value".len()))
        .max()
        .unwrap_or(5);

    println!(
        "{}",
        bold(&format!(
            "{:>3}  {:<field_width$}  {:<value_width$}  Type",
            "Id", "Field", "Value"
        ))
    );
    for r in records {
        println!(
            "{:>3}  {:<field_width$}  {:<value_width$}  {}",
            r.id,
            r.field,
            r.value,
            dim(&r.kind)
        );
    }
    println!("{}", dim(&format!("{} extracted record(s)", records.len())));
}

fn print_audit_if_requested(flow: &FlowController, show: bool) -> Result<()> {
    if show {
        let entries = flow.audit().snapshot();
        println!(
            "{}",
            serde_json::to_string_pretty(&entries).context("serializing audit log")?
        );
    }
    Ok(())
}
