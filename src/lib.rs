//! Contextual nerd-font icons for terminal multiplexer windows.
//!
//! Picks a glyph from the window's process, title, session and, for ssh or
//! mosh panes, the remote host, using a small rules file.

pub mod config;
pub mod host;
pub mod observability;
pub mod resolver;

pub use config::{Config, ConfigCache, ConfigError};
pub use host::{parse_host, parse_host_args};
pub use resolver::{IconResolver, IconResult, IconSource, Query};
