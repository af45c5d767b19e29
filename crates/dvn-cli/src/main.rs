//! dvn - manage dataverse server endpoints, aliases and API tokens.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use dvn_config::{Confirm, DvnConf, FixedConfirm, PromptConfirm, resolve_config_path};
use tracing::instrument;
use tracing_subscriber::filter::EnvFilter;
#[cfg(not(feature = "otel"))]
use tracing_subscriber::fmt;
#[cfg(feature = "otel")]
use tracing_subscriber::layer::SubscriberExt;
#[cfg(feature = "otel")]
use tracing_subscriber::util::SubscriberInitExt;

/// CLI argument parser.
#[derive(Parser)]
#[command(about, version)]
struct Cli {
    /// Override the configuration file (default: ~/.dvn/dvn.json).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Answer "Y" to confirmation prompts.
    #[arg(long, short = 'y', global = true)]
    yes: bool,

    /// Subcommand to run.
    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// List configured dataverse servers.
    List,
    /// Show one server (default: the current one).
    Show(TargetArgs),
    /// Add a server or update its alias and token.
    Add(AddArgs),
    /// Select the current server.
    Switch(RequiredTargetArgs),
    /// Remove a server.
    Remove(RequiredTargetArgs),
    /// Reset the configuration to the demo server.
    Reset,
}

/// Optional server selector.
#[derive(clap::Args)]
struct TargetArgs {
    /// Server URL or alias.
    url_or_alias: Option<String>,
}

/// Required server selector.
#[derive(clap::Args)]
struct RequiredTargetArgs {
    /// Server URL or alias.
    url_or_alias: String,
}

/// Arguments for the `add` subcommand.
#[derive(clap::Args)]
struct AddArgs {
    /// Server URL (e.g. "https://demo.dataverse.org").
    url: String,
    /// Short name usable instead of the URL.
    #[arg(long)]
    alias: Option<String>,
    /// API token for the server.
    #[arg(long)]
    token: Option<String>,
}

/// Options shared by every subcommand.
struct Globals {
    config: Option<PathBuf>,
    yes: bool,
}

impl Globals {
    /// Confirmation source honouring `--yes`.
    fn confirm_source(&self) -> Box<dyn Confirm> {
        if self.yes {
            Box::new(FixedConfirm(true))
        } else {
            Box::new(PromptConfirm::stdio())
        }
    }

    /// Loads the configuration store.
    ///
    /// # Errors
    ///
    /// Returns an error if the path cannot be resolved or the file cannot be
    /// loaded or reset.
    fn load(&self) -> Result<DvnConf> {
        let path =
            resolve_config_path(self.config.as_deref()).context("failed to resolve config path")?;
        let mut confirm = self.confirm_source();
        DvnConf::load(path, &mut *confirm).context("failed to load dataverse configuration")
    }
}

/// Runs the `list` subcommand.
///
/// # Errors
///
/// Returns an error if the configuration cannot be loaded.
#[instrument(skip_all)]
fn run_list(globals: &Globals) -> Result<()> {
    let conf = globals.load()?;

    tracing::info!("  URL\t\t\t\tAlias\tToken");
    for (url, entry) in conf.entries() {
        let marker = if url == conf.current() { '*' } else { ' ' };
        tracing::info!(
            "{} {}\t{}\t{}",
            marker,
            url,
            entry.alias.as_deref().unwrap_or("-"),
            if entry.token.is_some() { "yes" } else { "no" },
        );
    }
    tracing::info!("Total: {} dataverse(s)", conf.entries().count());

    Ok(())
}

/// Runs the `show` subcommand.
///
/// # Errors
///
/// Returns an error if the configuration cannot be loaded or no entry matches.
#[instrument(skip_all)]
fn run_show(args: &TargetArgs, globals: &Globals) -> Result<()> {
    let conf = globals.load()?;
    let (url, entry) = conf
        .get_entry(args.url_or_alias.as_deref())
        .context("failed to look up dataverse")?;

    tracing::info!("URL:     {}", url);
    tracing::info!("Alias:   {}", entry.alias.as_deref().unwrap_or("-"));
    tracing::info!(
        "Token:   {}",
        if entry.token.is_some() { "stored" } else { "none" }
    );
    tracing::info!("Current: {}", url == conf.current());

    Ok(())
}

/// Runs the `add` subcommand.
///
/// # Errors
///
/// Returns an error if the URL is invalid or the configuration cannot be saved.
#[instrument(skip_all)]
fn run_add(args: &AddArgs, globals: &Globals) -> Result<()> {
    let mut conf = globals.load()?;
    conf.set_entry(&args.url, args.alias.as_deref(), args.token.as_deref())
        .context("failed to add dataverse")?;
    conf.save().context("failed to save dataverse configuration")?;
    tracing::info!("Saved {} to {}", args.url, conf.path().display());

    Ok(())
}

/// Runs the `switch` subcommand.
///
/// # Errors
///
/// Returns an error if no entry matches or the configuration cannot be saved.
#[instrument(skip_all)]
fn run_switch(args: &RequiredTargetArgs, globals: &Globals) -> Result<()> {
    let mut conf = globals.load()?;
    let url = conf
        .set_current(&args.url_or_alias)
        .context("failed to switch dataverse")?
        .to_owned();
    conf.save().context("failed to save dataverse configuration")?;
    tracing::info!("Current dataverse: {}", url);

    Ok(())
}

/// Runs the `remove` subcommand.
///
/// # Errors
///
/// Returns an error if no entry matches, it is the last entry, or the
/// configuration cannot be saved.
#[instrument(skip_all)]
fn run_remove(args: &RequiredTargetArgs, globals: &Globals) -> Result<()> {
    let mut conf = globals.load()?;
    let (url, _) = conf
        .remove_entry(&args.url_or_alias)
        .context("failed to remove dataverse")?;
    conf.save().context("failed to save dataverse configuration")?;
    tracing::info!("Removed {}", url);

    Ok(())
}

/// Runs the `reset` subcommand.
///
/// The current file is not read, so a broken configuration is replaced
/// after a single confirmation.
///
/// # Errors
///
/// Returns an error if the confirmation cannot be read or the configuration
/// cannot be written.
#[instrument(skip_all)]
fn run_reset(globals: &Globals) -> Result<()> {
    let path =
        resolve_config_path(globals.config.as_deref()).context("failed to resolve config path")?;
    let prompt = format!("Reset {} to the demo dataverse only? (Y/N)", path.display());
    if !globals
        .confirm_source()
        .confirm(&prompt)
        .context("failed to read confirmation")?
    {
        tracing::info!("Reset cancelled");
        return Ok(());
    }
    DvnConf::reset_at(path).context("failed to reset dataverse configuration")?;

    Ok(())
}

/// Entry point.
///
/// # Errors
///
/// Returns an error if subcommand execution fails.
fn main() -> Result<()> {
    #[cfg(not(feature = "otel"))]
    {
        fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
            )
            .with_target(false)
            .init();
    }

    #[cfg(feature = "otel")]
    {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        let fmt_layer = tracing_subscriber::fmt::layer().with_target(false);

        let otel_layer = std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT")
            .ok()
            .and_then(|_| {
                let exporter = opentelemetry_otlp::SpanExporter::builder()
                    .with_http()
                    .build()
                    .ok()?;

                let tracer_provider = opentelemetry_sdk::trace::SdkTracerProvider::builder()
                    .with_simple_exporter(exporter)
                    .build();

                let tracer = opentelemetry::trace::TracerProvider::tracer(
                    &tracer_provider,
                    env!("CARGO_PKG_NAME"),
                );
                opentelemetry::global::set_tracer_provider(tracer_provider);

                Some(tracing_opentelemetry::layer().with_tracer(tracer))
            });

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .with(otel_layer)
            .init();
    }

    let cli = Cli::parse();
    let globals = Globals {
        config: cli.config,
        yes: cli.yes,
    };
    match cli.command {
        Commands::List => run_list(&globals),
        Commands::Show(args) => run_show(&args, &globals),
        Commands::Add(args) => run_add(&args, &globals),
        Commands::Switch(args) => run_switch(&args, &globals),
        Commands::Remove(args) => run_remove(&args, &globals),
        Commands::Reset => run_reset(&globals),
    }
}
