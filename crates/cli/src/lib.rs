use anyhow::Result;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::io;
use std::path::PathBuf;

use crate::command::Session;
use crate::config::AppConfig;

mod command;
mod config;

pub(crate) fn print_stdout(text: &str) -> Result<()> {
    write_stdout(text, true)
}

/// Writes `text` as-is, e.g. a whole document.
pub(crate) fn write_stdout(text: &str, newline: bool) -> Result<()> {
    use std::io::Write;

    let mut stdout = io::stdout().lock();
    if let Err(err) = stdout
        .write_all(text.as_bytes())
        .and_then(|_| if newline { stdout.write_all(b"\n") } else { Ok(()) })
        .and_then(|_| stdout.flush())
    {
        if err.kind() == io::ErrorKind::BrokenPipe {
            return Ok(());
        }
        return Err(err.into());
    }
    Ok(())
}

pub(crate) fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    print_stdout(&serde_json::to_string_pretty(value)?)
}

#[derive(Parser)]
#[command(name = "alertsmith")]
#[command(about = "Inspect and edit carrier alert definitions in Terraform files", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file (default: ./alertsmith.toml, env: ALERTSMITH_CONFIG)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Alert document, overriding document.path from the config
    #[arg(short, long, global = true)]
    document: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode: log only warnings/errors
    #[arg(long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List the alerts of the document
    List(JsonArgs),

    /// Check every alert and report all violations
    Validate(ValidateArgs),

    /// Show the alerts targeting a carrier, or test for one kind of alert
    Carrier(CarrierArgs),

    /// Suggest a critical threshold from duration statistics
    Suggest(SuggestArgs),

    /// Set the critical threshold of one alert and rewrite the document
    #[command(name = "set-threshold")]
    SetThreshold(SetThresholdArgs),

    /// Rewrite every alert block in canonical layout
    Fmt(FmtArgs),

    /// Print the branch checked out in the document's repository
    Branch(JsonArgs),

    /// Switch the document's repository to another branch
    Checkout(CheckoutArgs),

    /// Create a branch (from main/master unless --base is given) and switch to it
    #[command(name = "new-branch")]
    NewBranch(NewBranchArgs),

    /// Verify the repository root holds the configured top-level folders
    #[command(name = "check-layout")]
    CheckLayout(CheckLayoutArgs),
}

#[derive(Args)]
pub(crate) struct JsonArgs {
    /// Output JSON instead of text
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub(crate) struct ValidateArgs {
    /// Do not flag alerts repeating an earlier name and query
    #[arg(long)]
    pub allow_duplicates: bool,

    #[arg(long)]
    pub json: bool,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub(crate) enum KindArg {
    Duration,
    ErrorRate,
}

#[derive(Args)]
pub(crate) struct CarrierArgs {
    /// Carrier name, or numeric carrier id with --id
    pub carrier: String,

    /// Match by carrier id instead of name
    #[arg(long)]
    pub id: bool,

    /// Only answer whether an alert of this kind exists (exit 1 if not)
    #[arg(long, value_enum)]
    pub kind: Option<KindArg>,

    /// Only peak-variant alerts
    #[arg(long, conflicts_with = "regular")]
    pub peak: bool,

    /// Only regular (non-peak) alerts
    #[arg(long)]
    pub regular: bool,

    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Clone)]
pub(crate) struct StatsArgs {
    /// Average duration in seconds
    #[arg(long)]
    pub average: f64,

    /// Standard deviation of the duration in seconds
    #[arg(long = "std-dev")]
    pub std_dev: f64,

    /// Override the configured method (std-dev|formula)
    #[arg(long, value_enum)]
    pub method: Option<MethodArg>,

    /// Override the configured multiplier
    #[arg(long)]
    pub multiplier: Option<f64>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub(crate) enum MethodArg {
    StdDev,
    Formula,
}

#[derive(Args)]
pub(crate) struct SuggestArgs {
    #[command(flatten)]
    pub stats: StatsArgs,

    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub(crate) struct SetThresholdArgs {
    /// Exact alert name
    pub name: String,

    /// Threshold value to write
    #[arg(long, conflicts_with_all = ["average", "std_dev"])]
    pub value: Option<f64>,

    /// Average duration; the threshold is suggested from it
    #[arg(long, requires = "std_dev")]
    pub average: Option<f64>,

    #[arg(long = "std-dev", requires = "average")]
    pub std_dev: Option<f64>,

    /// Print the updated document instead of writing it
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Args)]
pub(crate) struct FmtArgs {
    /// Exit non-zero instead of rewriting when the layout is not canonical
    #[arg(long)]
    pub check: bool,
}

#[derive(Args)]
pub(crate) struct CheckoutArgs {
    pub branch: String,
}

#[derive(Args)]
pub(crate) struct NewBranchArgs {
    pub name: String,

    /// Branch to start from
    #[arg(long)]
    pub base: Option<String>,
}

#[derive(Args)]
pub(crate) struct CheckLayoutArgs {
    /// Root to check (default: repository of the document)
    #[arg(long)]
    pub root: Option<PathBuf>,
}

pub async fn main_entry() -> Result<()> {
    let mut cli = Cli::parse();

    // stdout is reserved for JSON when requested
    let json_output = match &cli.command {
        Commands::List(args) | Commands::Branch(args) => args.json,
        Commands::Validate(args) => args.json,
        Commands::Carrier(args) => args.json,
        Commands::Suggest(args) => args.json,
        _ => false,
    };
    if json_output {
        cli.quiet = true;
    }

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();

    let config = AppConfig::load(cli.config.as_deref())?;
    let mut session = Session::new(config);
    if let Some(document) = &cli.document {
        session.override_document(document)?;
    }

    match cli.command {
        Commands::List(args) => command::document::run_list(&session, args)?,
        Commands::Validate(args) => command::document::run_validate(&session, args)?,
        Commands::Carrier(args) => command::document::run_carrier(&session, args)?,
        Commands::Suggest(args) => command::document::run_suggest(&session, args)?,
        Commands::SetThreshold(args) => command::document::run_set_threshold(&session, args)?,
        Commands::Fmt(args) => command::document::run_fmt(&session, args)?,
        Commands::Branch(args) => command::repo::run_branch(&mut session, args)?,
        Commands::Checkout(args) => command::repo::run_checkout(&mut session, args).await?,
        Commands::NewBranch(args) => command::repo::run_new_branch(&mut session, args).await?,
        Commands::CheckLayout(args) => command::repo::run_check_layout(&mut session, args)?,
    }

    Ok(())
}
