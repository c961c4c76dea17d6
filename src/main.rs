use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use senate_reimbursements::{
    config::{DEFAULT_DATASET, FIRST_YEAR},
    DatasetConfig, DatasetPipeline, PipelineReport, YearRange,
};
use std::{path::PathBuf, time::Duration};
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Fetch, translate and clean Federal Senate reimbursement data"
)]
struct Cli {
    /// Directory holding raw, translated and cleaned files
    #[arg(long, env = "SENATE_DATA_DIR", default_value = "data", global = true)]
    dir: PathBuf,

    /// First year to process
    #[arg(long, env = "SENATE_FROM_YEAR", global = true)]
    from_year: Option<i32>,

    /// Year to stop before (defaults to next year)
    #[arg(long, env = "SENATE_TO_YEAR", global = true)]
    to_year: Option<i32>,

    /// Remote prefix the yearly CSVs live under
    #[arg(long, env = "SENATE_BASE_URL", global = true)]
    base_url: Option<String>,

    #[arg(long, env = "SENATE_DATASET", default_value = DEFAULT_DATASET, global = true)]
    dataset: String,

    /// Per-request HTTP timeout in seconds
    #[arg(long, env = "SENATE_TIMEOUT_SECS", global = true)]
    timeout_secs: Option<u64>,

    /// Print reports as JSON on stdout
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone, Copy)]
enum Command {
    /// Download yearly CSVs
    Fetch,
    /// Convert downloaded CSVs to the normalized compressed format
    Translate,
    /// Combine translated files into one reimbursements file
    Clean,
    /// fetch, translate, then clean
    All,
}

impl Cli {
    fn dataset_config(&self) -> Result<DatasetConfig> {
        let defaults = YearRange::default();
        let years = YearRange::new(
            self.from_year.unwrap_or(FIRST_YEAR),
            self.to_year.unwrap_or(defaults.to()),
        )?;
        let mut config = DatasetConfig::new(&self.dir)
            .with_years(years)
            .with_dataset(&self.dataset)
            .with_timeout(self.timeout_secs.map(Duration::from_secs));
        if let Some(url) = &self.base_url {
            config = config.with_base_url(url)?;
        }
        Ok(config)
    }
}

fn log_report(step: &str, report: &PipelineReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
    }
    for reason in report.not_found() {
        warn!(step, "{}", reason);
    }
    info!(
        step,
        found = report.found().len(),
        missing = report.not_found().len(),
        "done"
    );
    Ok(())
}

fn main() -> Result<()> {
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_span_events(fmt::format::FmtSpan::CLOSE)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = cli.dataset_config().context("invalid configuration")?;
    info!(
        dir = %config.dir().display(),
        from = config.years().from(),
        to = config.years().to(),
        "startup"
    );
    let pipeline = DatasetPipeline::with_http(config)?;

    if matches!(cli.command, Command::Fetch | Command::All) {
        let fetched = pipeline.fetch().context("fetch failed")?;
        log_report("fetch", &fetched, cli.json)?;
    }
    if matches!(cli.command, Command::Translate | Command::All) {
        let translated = pipeline.translate().context("translate failed")?;
        log_report("translate", &translated, cli.json)?;
    }
    if matches!(cli.command, Command::Clean | Command::All) {
        let cleaned = pipeline.clean().context("clean failed")?;
        if cli.json {
            println!("{}", serde_json::json!({ "cleaned": cleaned }));
        }
        info!(path = %cleaned.display(), "cleaned");
    }

    Ok(())
}
