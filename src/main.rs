use anyhow::Result;
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use lockscan::{
    cache::{clear_cache_file, ThreatListCache},
    config::Config,
    output::{print_result, OutputFormat, TextOptions, DIRECTORY_NOT_FOUND_EXIT},
    scanner::{RepoScanner, ScanOptions},
    ScanError,
};
use std::io::IsTerminal;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

/// Exit codes for CI integration
mod exit_codes {
    pub const SUCCESS: u8 = 0;
    pub const ERROR: u8 = 1;
}

#[derive(Parser)]
#[command(name = "lockscan")]
#[command(
    author,
    version,
    about = "Scan lockfiles for compromised packages and backdoor workflows"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Security scans
    Scan {
        #[command(subcommand)]
        target: ScanTarget,
    },

    /// Show or create config file
    Config {
        /// Generate default config file
        #[arg(long)]
        init: bool,

        /// Show config file path
        #[arg(long)]
        path: bool,
    },

    /// Remove the cached compromised packages list
    ClearCache,
}

#[derive(Subcommand)]
enum ScanTarget {
    /// Scan a repository for compromised packages and backdoor workflows
    Repo {
        /// Directory to scan (defaults to the current directory)
        path: Option<PathBuf>,

        /// Force refresh of the compromised packages list
        #[arg(short, long)]
        refresh: bool,

        /// Output results as JSON (JSON Lines with --recursive)
        #[arg(short, long)]
        json: bool,

        /// Exit code only, no output
        #[arg(short, long)]
        quiet: bool,

        /// List every lockfile scanned
        #[arg(short, long)]
        verbose: bool,

        /// Scan subdirectories for lockfiles and workflows
        #[arg(long)]
        recursive: bool,

        /// Maximum directory depth for --recursive
        #[arg(long, requires = "recursive")]
        depth: Option<usize>,
    },
}

struct RepoArgs {
    path: Option<PathBuf>,
    refresh: bool,
    json: bool,
    quiet: bool,
    verbose: bool,
    recursive: bool,
    depth: Option<usize>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(&cli);

    match run(cli).await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(exit_codes::ERROR)
        }
    }
}

fn init_tracing(cli: &Cli) {
    let level = match &cli.command {
        Commands::Scan {
            target: ScanTarget::Repo { quiet: true, .. },
        } => return,
        Commands::Scan {
            target: ScanTarget::Repo { verbose: true, .. },
        } => tracing::Level::INFO,
        _ => tracing::Level::WARN,
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<u8> {
    match cli.command {
        Commands::Scan {
            target:
                ScanTarget::Repo {
                    path,
                    refresh,
                    json,
                    quiet,
                    verbose,
                    recursive,
                    depth,
                },
        } => {
            let args = RepoArgs {
                path,
                refresh,
                json,
                quiet,
                verbose,
                recursive,
                depth,
            };
            scan_repo(args).await
        }
        Commands::Config { init, path } => {
            handle_config(init, path)?;
            Ok(exit_codes::SUCCESS)
        }
        Commands::ClearCache => {
            let cache_file = Config::load()?.threat_list_config().cache_file();
            if clear_cache_file(&cache_file)? {
                println!("Cache cleared.");
            } else {
                println!("No cached list at {}", cache_file.display());
            }
            Ok(exit_codes::SUCCESS)
        }
    }
}

async fn scan_repo(args: RepoArgs) -> Result<u8> {
    let config = Config::load()?;
    let format = OutputFormat::from_flags(args.json, args.quiet);
    let path = match args.path {
        Some(path) => path,
        None => std::env::current_dir()?,
    };

    let cache = ThreatListCache::from_config(config.threat_list_config())?;
    let scanner = RepoScanner::new(cache);
    let options = ScanOptions {
        refresh: args.refresh,
        recursive: args.recursive,
        max_depth: args.depth,
    };

    let progress = if format == OutputFormat::Text {
        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
            pb.set_style(style);
        }
        pb.enable_steady_tick(Duration::from_millis(100));
        pb.set_message(format!("Scanning {}...", path.display()));
        Some(pb)
    } else {
        None
    };

    let scanned = scanner.scan(&path, &options).await;

    if let Some(pb) = progress {
        pb.finish_and_clear();
    }

    let result = match scanned {
        Ok(result) => result,
        Err(ScanError::DirectoryNotFound(dir)) => {
            if format != OutputFormat::Quiet {
                println!("ERROR: Directory not found: {}", dir.display());
            }
            return Ok(DIRECTORY_NOT_FOUND_EXIT);
        }
        Err(_) if format == OutputFormat::Quiet => return Ok(exit_codes::ERROR),
        Err(e) => return Err(e.into()),
    };

    let text_options = TextOptions {
        verbose: args.verbose,
        color: std::io::stdout().is_terminal(),
        playbook_url: config.playbook_url.clone(),
    };
    print_result(&result, format, &text_options)?;

    Ok(result.exit_code())
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
        println!("Run 'lockscan config --init' to create one.");
        println!();
        println!("Config path: {}", config_path.display());
    }

    Ok(())
}
