use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use nerd_icons::config::validation::validate_config;
use nerd_icons::config::{expand_home, load_config, Config, DEFAULT_CONFIG_PATH};
use nerd_icons::host::{parse_host, parse_host_args, ProcessInspector, ProcfsInspector};
use nerd_icons::observability::logging::init_logging;

#[derive(Parser)]
#[command(name = "nerd-icons-cli")]
#[command(about = "Inspect nerd-icons configuration and host detection", long_about = None)]
struct Cli {
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the remote host of an ssh/mosh command line
    Host {
        /// Pane pid to read the foreground command line from
        #[arg(long, conflicts_with = "cmdline")]
        pane_pid: Option<u32>,

        /// Command line, e.g. `ssh -p 2222 user@host`
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        cmdline: Vec<String>,
    },
    /// Check the config file and report problems
    Validate,
    /// Print the parsed config as JSON
    Dump,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.debug);

    match cli.command {
        Commands::Host { pane_pid, cmdline } => host(pane_pid, &cmdline),
        Commands::Validate => match load(&cli.config) {
            Some((path, config)) => validate(&path, &config),
            None => ExitCode::FAILURE,
        },
        Commands::Dump => match load(&cli.config) {
            Some((_, config)) => dump(&config),
            None => ExitCode::FAILURE,
        },
    }
}

fn host(pane_pid: Option<u32>, cmdline: &[String]) -> ExitCode {
    let host = match pane_pid {
        Some(pid) => parse_host_args(&ProcfsInspector::new().foreground_cmdline(pid)),
        // A single quoted argument holds the whole command line.
        None if cmdline.len() == 1 => parse_host(&cmdline[0]),
        None => parse_host_args(cmdline),
    };

    match host {
        Some(host) => {
            println!("{host}");
            ExitCode::SUCCESS
        }
        None => ExitCode::FAILURE,
    }
}

fn load(path: &Path) -> Option<(PathBuf, Config)> {
    let path = expand_home(path);
    match load_config(&path) {
        Ok(config) => Some((path, config)),
        Err(e) => {
            eprintln!("Error: {e}");
            None
        }
    }
}

fn validate(path: &Path, config: &Config) -> ExitCode {
    println!("Config loaded: {}", path.display());
    println!("  Icons: {}", config.icons.len());
    println!("  Title icons: {}", config.title_icons.len());
    println!("  Sessions: {}", config.sessions.len());
    println!("  Hosts: {}", config.hosts.len());
    println!("  Layout glyphs: {}", config.layout_glyphs.len());

    match validate_config(config) {
        Ok(()) => {
            println!("Config valid");
            ExitCode::SUCCESS
        }
        Err(errors) => {
            for err in &errors {
                eprintln!("  problem: {err}");
            }
            eprintln!("{} problem(s) found", errors.len());
            ExitCode::FAILURE
        }
    }
}

fn dump(config: &Config) -> ExitCode {
    match serde_json::to_string_pretty(config) {
        Ok(json) => {
            println!("{json}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
