//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (tolerant YAML subset, ≤ 1 MiB)
//!     → loader.rs (size check, line parser)
//!     → Config (immutable)
//!     → cache.rs (Arc<Config>, keyed by path + mtime)
//!     → resolver
//!
//! On each lookup:
//!     cache.rs stats the file
//!     → mtime advanced? loader.rs builds a new Config
//!     → atomic swap of the cached Arc<Config>
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a full reload
//! - Every setting has a default so an empty file is a valid config
//! - Bad lines and bad rules are skipped, never fatal; `validation.rs`
//!   reports them on demand

pub mod cache;
pub mod loader;
pub mod schema;
pub mod validation;

use std::path::{Path, PathBuf};

pub use cache::ConfigCache;
pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{Config, IconRule, Settings, StyledRule};

/// Config location used when none is given.
pub const DEFAULT_CONFIG_PATH: &str = "~/.config/nerd-icons/config.yml";

/// Expand a leading `~` to the home directory.
pub fn expand_home(path: &Path) -> PathBuf {
    let Ok(rest) = path.strip_prefix("~") else {
        return path.to_path_buf();
    };
    match dirs::home_dir() {
        Some(home) => home.join(rest),
        None => path.to_path_buf(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_home_leaves_plain_paths() {
        assert_eq!(expand_home(Path::new("/etc/icons.yml")), PathBuf::from("/etc/icons.yml"));
        assert_eq!(expand_home(Path::new("rel/~/x")), PathBuf::from("rel/~/x"));
    }

    #[test]
    fn test_expand_home_replaces_tilde() {
        let Some(home) = dirs::home_dir() else { return };
        assert_eq!(expand_home(Path::new("~/.config/x.yml")), home.join(".config/x.yml"));
    }
}
