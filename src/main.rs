//! nerd-icons: print the icon for a multiplexer window.
//!
//! ```text
//!   --process / --title / --session / --cmdline | --pane-pid
//!        │
//!        ▼
//!   ┌─────────────┐   mtime check    ┌──────────────┐
//!   │ IconResolver│ ───────────────▶ │ ConfigCache  │ ─▶ config.yml
//!   └──────┬──────┘                  └──────────────┘
//!          │ ssh/mosh?  ─▶ host parser (/proc for --pane-pid)
//!          ▼
//!   host → title_pattern → title_icon → process → session → fallback
//!          │
//!          ▼
//!   glyph (--simple) or one JSON line on stdout
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use nerd_icons::config::DEFAULT_CONFIG_PATH;
use nerd_icons::observability::logging::init_logging;
use nerd_icons::{IconResolver, Query};

#[derive(Parser)]
#[command(name = "nerd-icons")]
#[command(about = "Resolve a nerd font icon for a terminal multiplexer window", long_about = None)]
struct Cli {
    /// Foreground process name
    #[arg(short, long, default_value = "")]
    process: String,

    /// Window or pane title
    #[arg(short, long, default_value = "")]
    title: String,

    /// Session name
    #[arg(short, long, default_value = "")]
    session: String,

    /// Full command line, for ssh/mosh host detection
    #[arg(short, long, allow_hyphen_values = true)]
    cmdline: Option<String>,

    /// Pane pid; its foreground command line is read from /proc
    #[arg(long)]
    pane_pid: Option<u32>,

    /// Path to the configuration file
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Print only the glyph instead of JSON
    #[arg(long)]
    simple: bool,

    /// Log resolution details to stderr
    #[arg(long)]
    debug: bool,
}

impl Cli {
    fn query(&self) -> Query {
        let mut query = Query::new(self.process.as_str())
            .title(self.title.as_str())
            .session(self.session.as_str());
        if let Some(cmdline) = &self.cmdline {
            query = query.cmdline(cmdline);
        }
        if let Some(pid) = self.pane_pid {
            query = query.pane_pid(pid);
        }
        query
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.debug);

    let resolver = IconResolver::new();
    let result = match resolver.resolve(&cli.query(), &cli.config) {
        Ok(result) => result,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };

    if cli.simple {
        println!("{}", result.icon);
        return ExitCode::SUCCESS;
    }

    match serde_json::to_string(&result) {
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
