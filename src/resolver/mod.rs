//! Icon resolution subsystem.
//!
//! # Data Flow
//! ```text
//! Query (process, title, session, cmdline | pane pid)
//!     → engine.rs (config lookup via cache, remote host detection)
//!     → matcher.rs (ordered stages, first hit wins)
//!         host → title_pattern → title_icon → process → session
//!     → IconResult, or the fallback glyph when no stage matches
//! ```
//!
//! # Design Decisions
//! - Stages are fixed in priority order; table order breaks ties inside a stage
//! - Resolution against a loaded config is total: bad rules are skipped
//! - Every result names the stage that produced it

pub mod engine;
pub mod matcher;

use std::fmt;

use serde::Serialize;

use crate::config::schema::Settings;

pub use engine::IconResolver;
pub use matcher::{MatchContext, Matcher, MatcherChain};

/// Which stage produced an [`IconResult`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IconSource {
    Host,
    TitlePattern,
    TitleIcon,
    Process,
    Session,
    Fallback,
}

impl IconSource {
    pub fn as_str(self) -> &'static str {
        match self {
            IconSource::Host => "host",
            IconSource::TitlePattern => "title_pattern",
            IconSource::TitleIcon => "title_icon",
            IconSource::Process => "process",
            IconSource::Session => "session",
            IconSource::Fallback => "fallback",
        }
    }
}

impl fmt::Display for IconSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A resolved glyph with optional color metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IconResult {
    /// Never empty.
    pub icon: String,
    pub ring_color: Option<String>,
    pub icon_color: Option<String>,
    pub alert_color: Option<String>,
    pub source: IconSource,
}

impl IconResult {
    /// A glyph without colors.
    pub fn bare(icon: impl Into<String>, source: IconSource) -> Self {
        Self {
            icon: icon.into(),
            ring_color: None,
            icon_color: None,
            alert_color: None,
            source,
        }
    }

    /// The configured fallback glyph.
    pub fn fallback(settings: &Settings) -> Self {
        Self::bare(settings.fallback_icon.clone(), IconSource::Fallback)
    }
}

/// What to resolve an icon for.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    /// Foreground process name, e.g. `nvim`.
    pub process: String,
    /// Window or pane title.
    pub title: String,
    /// Multiplexer session name.
    pub session: String,
    /// Explicit command line. Takes precedence over `pane_pid`.
    pub cmdline: Option<Vec<String>>,
    /// Pane process id, used to look up the foreground command line.
    pub pane_pid: Option<u32>,
}

impl Query {
    pub fn new(process: impl Into<String>) -> Self {
        Self {
            process: process.into(),
            ..Default::default()
        }
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn session(mut self, session: impl Into<String>) -> Self {
        self.session = session.into();
        self
    }

    /// Whitespace-separated command line.
    pub fn cmdline(mut self, cmdline: &str) -> Self {
        self.cmdline = Some(cmdline.split_whitespace().map(String::from).collect());
        self
    }

    /// Pre-split command line.
    pub fn cmdline_args<S: Into<String>>(mut self, args: impl IntoIterator<Item = S>) -> Self {
        self.cmdline = Some(args.into_iter().map(Into::into).collect());
        self
    }

    pub fn pane_pid(mut self, pid: u32) -> Self {
        self.pane_pid = Some(pid);
        self
    }
}
