//! acdumo CLI — signal report, notification check, and scheduled watch.
//!
//! Commands:
//! - `signals`: compute signals and the strategy for one date and print the report
//! - `check`: run one notification check cycle from a config file
//! - `watch`: run check cycles on the configured schedule
//! - `init-config`: write a default config file

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand, ValueEnum};

use acdumo_core::data::PriceProvider;
use acdumo_core::{compute_signals, SamplingFrequency, SignalRequest, StrategyReport};
use acdumo_runner::{
    run_scheduled, run_signal_check, AppConfig, CheckContext, CheckHistory, FileSubscriberDirectory,
    HistoryEntry, Notifier, ProviderConfig, ProviderKind, SystemClock,
};

#[derive(Parser)]
#[command(name = "acdumo", about = "acdumo — accelerated dual momentum signals and notifications")]
struct Cli {
    /// Log at debug level (overridden by RUST_LOG).
    #[arg(short, long, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum ProviderArg {
    Yahoo,
    Csv,
    Synthetic,
}

impl From<ProviderArg> for ProviderKind {
    fn from(arg: ProviderArg) -> Self {
        match arg {
            ProviderArg::Yahoo => ProviderKind::Yahoo,
            ProviderArg::Csv => ProviderKind::Csv,
            ProviderArg::Synthetic => ProviderKind::Synthetic,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Compute momentum signals and the strategy decision for one date.
    Signals {
        /// Query date (YYYY-MM-DD). Defaults to today.
        #[arg(long)]
        date: Option<String>,

        /// Instruments to evaluate, safe haven included.
        #[arg(long, num_args = 1.., default_values_t = ["SPY", "TLT", "VSS", "SCZ"].map(String::from))]
        tickers: Vec<String>,

        /// Fallback instrument when no risk asset has positive momentum.
        #[arg(long, default_value = "TLT")]
        safe_haven: String,

        /// Sampling frequency: monthly or weekly.
        #[arg(long, default_value = "monthly")]
        frequency: SamplingFrequency,

        #[arg(long, value_enum, default_value = "yahoo")]
        provider: ProviderArg,

        /// Directory of <TICKER>.csv files (csv provider).
        #[arg(long, default_value = "data")]
        csv_dir: PathBuf,

        /// Seed of the synthetic provider.
        #[arg(long, default_value_t = 42)]
        seed: u64,

        /// Print the report as JSON instead of markdown.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Run one notification check cycle.
    Check {
        /// Path to a TOML config file.
        #[arg(long)]
        config: PathBuf,

        /// Check date (YYYY-MM-DD). Defaults to today.
        #[arg(long)]
        date: Option<String>,
    },
    /// Run notification checks on the configured schedule.
    Watch {
        /// Path to a TOML config file.
        #[arg(long)]
        config: PathBuf,

        /// Stop after this many scheduled fire times.
        #[arg(long)]
        max_cycles: Option<usize>,
    },
    /// Write a config file with every default filled in.
    InitConfig {
        path: PathBuf,

        /// Overwrite an existing file.
        #[arg(long, default_value_t = false)]
        force: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Signals {
            date,
            tickers,
            safe_haven,
            frequency,
            provider,
            csv_dir,
            seed,
            json,
        } => {
            let provider = ProviderConfig {
                kind: provider.into(),
                csv_dir,
                seed,
                ..ProviderConfig::default()
            };
            run_signals(date.as_deref(), tickers, safe_haven, frequency, &provider, json)
        }
        Commands::Check { config, date } => run_check(&config, date.as_deref()),
        Commands::Watch { config, max_cycles } => run_watch(&config, max_cycles),
        Commands::InitConfig { path, force } => run_init_config(&path, force),
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn parse_date(date: Option<&str>) -> Result<NaiveDate> {
    match date {
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d").with_context(|| format!("invalid date '{s}'")),
        None => Ok(Local::now().date_naive()),
    }
}

fn run_signals(
    date: Option<&str>,
    tickers: Vec<String>,
    safe_haven: String,
    frequency: SamplingFrequency,
    provider: &ProviderConfig,
    json: bool,
) -> Result<()> {
    let today = Local::now().date_naive();
    let as_of = parse_date(date)?;
    let provider = provider.build()?;

    let request = SignalRequest::new(as_of, tickers, safe_haven.clone(), frequency);
    let outcome = compute_signals(provider.as_ref(), &request, today)?;
    let decision = outcome.decide(&safe_haven);
    let report = StrategyReport::assemble(&outcome, &safe_haven, decision);

    if json {
        println!("{}", report.to_json()?);
    } else {
        print!("{}", report.render_markdown());
    }
    Ok(())
}

fn run_check(config_path: &Path, date: Option<&str>) -> Result<()> {
    let config = AppConfig::load(config_path)?;
    let today = parse_date(date)?;

    let provider = config.provider.build()?;
    let subscribers = FileSubscriberDirectory::new(&config.subscribers_path);
    let notifier = config.notify.build();
    let ctx = CheckContext {
        provider: provider.as_ref(),
        subscribers: &subscribers,
        notifier: notifier.as_ref(),
        settings: config.check_settings(),
    };

    let outcome = run_signal_check(&ctx, today, Local::now().date_naive())?;
    CheckHistory::new(&config.history_path)
        .append(&HistoryEntry::from_outcome(&outcome))
        .with_context(|| format!("failed to append history {}", config.history_path.display()))?;

    print!("{}", outcome.report.render_markdown());
    println!();
    if outcome.event.triggered {
        println!(
            "Alert: {:?} ({} notified, {} failed)",
            outcome.event.reason, outcome.recipients_notified, outcome.delivery_failures
        );
    } else {
        println!("No alert.");
    }
    Ok(())
}

fn run_watch(config_path: &Path, max_cycles: Option<usize>) -> Result<()> {
    let config = AppConfig::load(config_path)?;

    let provider = config.provider.build()?;
    let subscribers = FileSubscriberDirectory::new(&config.subscribers_path);
    let notifier = config.notify.build();
    let history = CheckHistory::new(&config.history_path);
    let ctx = CheckContext {
        provider: provider.as_ref(),
        subscribers: &subscribers,
        notifier: notifier.as_ref(),
        settings: config.check_settings(),
    };

    tracing::info!(
        config = %config_path.display(),
        provider = provider.name(),
        notifier = notifier.name(),
        "watching"
    );
    let summary = run_scheduled(&ctx, &config.schedule, &SystemClock, Some(&history), max_cycles)?;
    println!(
        "{} checks completed, {} failed, {} misfired",
        summary.completed, summary.failed, summary.misfired
    );
    Ok(())
}

fn run_init_config(path: &Path, force: bool) -> Result<()> {
    AppConfig::default().save(path, force)?;
    println!("Config written to: {}", path.display());
    Ok(())
}
