use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use deprecation_scanner::{
    config::Config,
    engine::CommandEngine,
    filter::{MessageFilterOptions, MessageMatcher},
    model::FileFindings,
    output::{format_result, OutputFormat, ReportOptions},
    scanner::{scan, Callbacks, CancellationFlag, ScanOptions},
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::IsTerminal;
use std::path::PathBuf;
use std::process::ExitCode;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, warn};

mod exit_codes {
    pub const SUCCESS: u8 = 0;
    pub const ERROR: u8 = 1;
}

#[derive(Parser)]
#[command(name = "deprecation-scanner")]
#[command(
    author,
    version,
    about = "Find usages of deprecated APIs in TypeScript/JavaScript projects"
)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan a project for deprecated usages
    Scan(ScanArgs),

    /// Show or create config file
    Config {
        /// Generate default config file
        #[arg(long)]
        init: bool,

        /// Show config file path
        #[arg(long)]
        path: bool,
    },

    /// List available output formats
    ListFormats,
}

#[derive(clap::Args)]
struct ScanArgs {
    /// Project root (defaults to the current directory)
    path: Option<PathBuf>,

    /// Include file pattern (glob)
    #[arg(short, long)]
    include: Option<String>,

    /// Exclude file pattern (glob)
    #[arg(short, long)]
    exclude: Option<String>,

    /// Filter by source packages (comma-separated)
    #[arg(short = 'p', long)]
    from_package: Option<String>,

    /// Filter by message content (comma-separated)
    #[arg(short = 'm', long)]
    msg_grep: Option<String>,

    /// Enable case-sensitive message matching
    #[arg(long)]
    msg_grep_case_sensitive: bool,

    /// Treat message patterns as regular expressions
    #[arg(long)]
    msg_grep_regex: bool,

    /// Output format (human, structured, tabular, rich-text)
    #[arg(short, long)]
    format: Option<String>,

    /// Write results to file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Project configuration file (defaults to tsconfig.json in the root)
    #[arg(long)]
    project: Option<PathBuf>,

    /// Analysis engine command line
    #[arg(long)]
    engine: Option<String>,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli).await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(exit_codes::ERROR)
        }
    }
}

fn init_logging(verbose: u8) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| match verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<u8> {
    let config = Config::load().unwrap_or_else(|e| {
        warn!("Ignoring config file: {:#}", e);
        Config::default()
    });

    match cli.command {
        Commands::Scan(args) => run_scan(args, &config).await,
        Commands::Config { init, path } => {
            handle_config(init, path)?;
            Ok(exit_codes::SUCCESS)
        }
        Commands::ListFormats => {
            list_formats();
            Ok(exit_codes::SUCCESS)
        }
    }
}

async fn run_scan(args: ScanArgs, config: &Config) -> Result<u8> {
    let format_str = args.format.clone().unwrap_or_else(|| config.default_format.clone());
    let format = OutputFormat::from_str(&format_str)?;

    let root_dir = match &args.path {
        Some(path) => std::path::absolute(path)
            .with_context(|| format!("Invalid path: {}", path.display()))?,
        None => std::env::current_dir().context("Cannot determine current directory")?,
    };

    let mut from_packages = split_comma_separated(args.from_package.as_deref());
    if from_packages.is_empty() {
        from_packages = config.from_packages.clone();
    }

    // Patterns are compiled up front so a bad regex fails before any work.
    let msg_grep = split_comma_separated(args.msg_grep.as_deref());
    let message_filter = if msg_grep.is_empty() {
        None
    } else {
        let defaults = MessageFilterOptions::from(&config.message_filter);
        let options = MessageFilterOptions {
            case_sensitive: args.msg_grep_case_sensitive || defaults.case_sensitive,
            regex: args.msg_grep_regex || defaults.regex,
        };
        Some(MessageMatcher::new(msg_grep.as_slice(), options)?)
    };

    let options = ScanOptions {
        root_dir: root_dir.clone(),
        config_path: args.project.clone(),
        include: args.include.clone(),
        exclude: args.exclude.clone(),
        from_packages,
        message_filter,
    };

    let engine = match args.engine.as_deref() {
        Some(command_line) => engine_from_command_line(command_line)?,
        None => CommandEngine::new(config.engine.command.clone(), config.engine.args.clone()),
    };

    let cancel = CancellationFlag::new();
    let signal_flag = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            signal_flag.cancel();
        }
    });

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.enable_steady_tick(Duration::from_millis(100));

    let mut files_with_findings = 0usize;
    let mut observer = Callbacks {
        on_progress: |message: &str| pb.set_message(message.to_string()),
        on_file: |findings: &FileFindings| {
            files_with_findings += 1;
            debug!(file = %findings.file_path, usages = findings.usages.len(), "findings");
        },
    };

    let scanned = scan(&options, engine, &mut observer, Some(&cancel)).await;
    pb.finish_and_clear();
    let result = scanned?;
    debug!(
        scanned = result.scanned_files,
        files = files_with_findings,
        "scan finished"
    );

    if cancel.is_cancelled() {
        eprintln!(
            "Scan cancelled after {} files; the report is partial.",
            result.scanned_files
        );
    }

    let colorize = args.output.is_none()
        && !args.no_color
        && config.colorize
        && std::io::stdout().is_terminal();
    let report = format_result(
        &result,
        &ReportOptions {
            format,
            colorize,
            root_dir: Some(root_dir),
        },
    )?;

    if let Some(path) = args.output {
        std::fs::write(&path, report)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        println!("Results written to: {}", path.display());
    } else {
        println!("{}", report);
    }

    Ok(exit_codes::SUCCESS)
}

fn engine_from_command_line(command_line: &str) -> Result<CommandEngine> {
    let mut parts = command_line.split_whitespace().map(str::to_string);
    let command = parts
        .next()
        .ok_or_else(|| anyhow::anyhow!("Engine command is empty"))?;
    Ok(CommandEngine::new(command, parts.collect()))
}

/// Splits a comma-separated list, trimming entries and dropping empty ones.
fn split_comma_separated(value: Option<&str>) -> Vec<String> {
    value
        .map(|v| {
            v.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn list_formats() {
    println!("Available formats:");
    println!();

    for format in OutputFormat::ALL {
        let aliases = format.aliases().join(", ");
        println!("  {:<12} {:<45} [aliases: {}]", format.name(), format.description(), aliases);
    }
}

fn handle_config(init: bool, show_path: bool) -> Result<()> {
    let config_path = Config::config_path();

    if show_path {
        println!("{}", config_path.display());
        return Ok(());
    }

    if init {
        if config_path.exists() {
            println!("Config file already exists at: {}", config_path.display());
            return Ok(());
        }

        let config = Config::default();
        config.save()?;
        println!("Created config file at: {}", config_path.display());
        println!();
        println!("Default configuration:");
        println!("{}", Config::generate_default_config());
        return Ok(());
    }

    // Show current config
    if config_path.exists() {
        let content = std::fs::read_to_string(&config_path)?;
        println!("Config file: {}", config_path.display());
        println!();
        println!("{}", content);
    } else {
        println!("No config file found.");
        println!("Run 'deprecation-scanner config --init' to create one.");
        println!();
        println!("Config path: {}", config_path.display());
    }

    Ok(())
}
