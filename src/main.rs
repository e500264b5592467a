// src/main.rs

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use equipment_intake::{
    client::{report, ApiClient, DatasetSummary},
    intake::{IntakeSession, IntakeState},
    validate, AppConfig, ParsedPreview, RawFile, ValidationOutcome,
};
use serde_json::json;
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

/// Validate equipment CSVs locally and talk to the analytics API.
#[derive(Debug, Parser)]
#[command(name = "equipment-intake", version)]
struct Cli {
    /// YAML config file (intake limits, API url).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// API token sent as `Authorization: Token <token>`.
    #[arg(long, global = true, env = "API_TOKEN", hide_env_values = true)]
    token: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Check a CSV and print its preview. Nothing is sent.
    Validate(ValidateArgs),
    /// Check a CSV and, if accepted, upload it.
    Upload(ValidateArgs),
    /// Obtain an API token.
    Login {
        #[arg(long)]
        username: String,
        #[arg(long, env = "API_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// List recent uploads.
    History,
    /// Show chart data for one dataset.
    Visualize { id: i64 },
    /// Compare the averages of two datasets.
    Compare { first: i64, second: i64 },
    /// Download the PDF report of a dataset.
    Report {
        id: i64,
        /// Destination file or directory.
        #[arg(long, default_value = ".")]
        out: PathBuf,
    },
}

#[derive(Debug, Args)]
struct ValidateArgs {
    file: PathBuf,
    /// Print JSON instead of a table.
    #[arg(long)]
    json: bool,
    /// Also check every row of the numeric columns.
    #[arg(long)]
    check_numeric: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_writer(std::io::stderr)
        .init();

    // ─── 2) config ───────────────────────────────────────────────────
    let cli = Cli::parse();
    let mut cfg = AppConfig::load(cli.config.as_deref())?;

    let api_cfg = cfg.api.clone();
    let token = cli.token.clone();
    let client = || -> Result<ApiClient> {
        let client = ApiClient::new(&api_cfg).context("building API client")?;
        Ok(match &token {
            Some(t) => client.with_token(t.clone()),
            None => client,
        })
    };

    // ─── 3) dispatch ─────────────────────────────────────────────────
    match &cli.command {
        Command::Validate(args) => {
            cfg.intake.check_numeric |= args.check_numeric;
            let file = RawFile::load(&args.file).await?;
            let outcome = validate(&file, &cfg.intake);
            print_outcome(&file, &outcome, args.json)?;
            if !outcome.is_accepted() {
                std::process::exit(1);
            }
        }
        Command::Upload(args) => {
            cfg.intake.check_numeric |= args.check_numeric;
            let client = client()?;
            let session = IntakeSession::new(cfg.intake.clone());
            let file = RawFile::load(&args.file).await?;
            session.validate_in_background(file.clone()).await?;

            match session.state() {
                IntakeState::Accepted { .. } => {}
                IntakeState::Rejected { error, .. } => {
                    print_outcome(&file, &ValidationOutcome::Rejected(error), args.json)?;
                    std::process::exit(1);
                }
                other => bail!("unexpected intake state {}", other.as_str()),
            }

            match session.submit(&client).await {
                Ok(summary) => print_summary(&summary, args.json)?,
                Err(e) => {
                    error!("upload failed: {}", e);
                    bail!("Upload failed: {}", e);
                }
            }
        }
        Command::Login { username, password } => {
            let (_, resp) = client()?.login(username, password).await?;
            println!("{}", resp.token);
        }
        Command::History => {
            let history = client()?.history().await?;
            if history.is_empty() {
                println!("no uploads yet");
            }
            for ds in &history {
                let when = ds
                    .uploaded_at
                    .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                    .unwrap_or_else(|| "-".to_string());
                println!(
                    "{:>5}  {:<16}  {:>6} rows  {}",
                    ds.id, when, ds.total_count, ds.filename
                );
            }
        }
        Command::Visualize { id } => {
            let viz = client()?.visualization(*id).await?;
            println!("Type distribution");
            for (label, value) in viz.type_distribution.pairs() {
                println!("  {:<24} {}", label, value);
            }
            println!("Averages");
            for (label, value) in viz.averages.pairs() {
                println!("  {:<24} {:.2}", label, value);
            }
        }
        Command::Compare { first, second } => {
            let cmp = client()?.compare(*first, *second).await?;
            println!("A: {} ({})", cmp.dataset1.filename, cmp.dataset1.id);
            println!("B: {} ({})", cmp.dataset2.filename, cmp.dataset2.id);
            println!("  flowrate     {:+.2}", cmp.comparison.flowrate_diff);
            println!("  pressure     {:+.2}", cmp.comparison.pressure_diff);
            println!("  temperature  {:+.2}", cmp.comparison.temperature_diff);
        }
        Command::Report { id, out } => {
            let saved = report::download_report(&client()?, *id, out).await?;
            info!(path = %saved.display(), "report downloaded");
            println!("{}", saved.display());
        }
    }

    Ok(())
}

fn print_outcome(file: &RawFile, outcome: &ValidationOutcome, as_json: bool) -> Result<()> {
    if as_json {
        let value = match outcome {
            ValidationOutcome::Accepted(preview) => json!({
                "file": file.name(),
                "status": "accepted",
                "preview": preview,
            }),
            ValidationOutcome::Rejected(err) => json!({
                "file": file.name(),
                "status": "rejected",
                "kind": err.kind(),
                "reason": err.to_string(),
            }),
        };
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    match outcome {
        ValidationOutcome::Accepted(preview) => {
            println!("{}: accepted", file.name());
            print_preview(preview);
        }
        ValidationOutcome::Rejected(err) => {
            println!("{}: rejected: {}", file.name(), err);
        }
    }
    Ok(())
}

fn print_preview(preview: &ParsedPreview) {
    let widths: Vec<usize> = preview
        .columns
        .iter()
        .map(|c| {
            preview
                .rows
                .iter()
                .filter_map(|r| r.get(c))
                .map(|v| v.chars().count())
                .chain(std::iter::once(c.chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let line = |cells: Vec<&str>| {
        cells
            .iter()
            .zip(&widths)
            .map(|(cell, w)| format!("{:<w$}", cell, w = *w))
            .collect::<Vec<_>>()
            .join(" | ")
    };

    println!("{}", line(preview.columns.iter().map(String::as_str).collect()));
    println!(
        "{}",
        widths
            .iter()
            .map(|w| "-".repeat(*w))
            .collect::<Vec<_>>()
            .join("-+-")
    );
    for row in &preview.rows {
        println!("{}", line(preview.ordered_values(row).collect()));
    }
}

fn print_summary(summary: &DatasetSummary, as_json: bool) -> Result<()> {
    if as_json {
        println!("{}", serde_json::to_string_pretty(summary)?);
        return Ok(());
    }
    println!("Analysis complete (dataset {})", summary.id);
    println!("  Total Records    {}", summary.total_count);
    println!("  Avg Flowrate     {:.2}", summary.avg_flowrate);
    println!("  Avg Pressure     {:.2}", summary.avg_pressure);
    println!("  Avg Temperature  {:.2}", summary.avg_temperature);
    for (kind, count) in &summary.type_distribution {
        println!("    {:<20} {}", kind, count);
    }
    Ok(())
}
