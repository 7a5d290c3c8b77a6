//! Shared utilities for integration tests.

use std::fs;
use std::path::{Path, PathBuf};

use filetime::FileTime;
use tempfile::TempDir;

/// A config file in its own temporary directory.
pub struct ConfigFile {
    _dir: TempDir,
    path: PathBuf,
}

impl ConfigFile {
    pub fn new(content: &str) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yml");
        fs::write(&path, content).unwrap();
        set_mtime(&path, 1_700_000_000);
        Self { _dir: dir, path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Rewrite the file and move its mtime to `secs`.
    #[allow(dead_code)]
    pub fn rewrite(&self, content: &str, secs: i64) {
        fs::write(&self.path, content).unwrap();
        set_mtime(&self.path, secs);
    }
}

pub fn set_mtime(path: &Path, secs: i64) {
    filetime::set_file_mtime(path, FileTime::from_unix_time(secs, 0)).unwrap();
}

/// A representative config.
#[allow(dead_code)]
pub const SAMPLE_CONFIG: &str = r##"
config:
  fallback-icon: "F"
  prefer-host-icon: true
  icon-color: "#cdd6f4"

icons:
  zsh: "Z"
  bash: "B"
  nvim:
    icon: "N"
    icon-color: "#a6e3a1"
    title:
      "^lazygit": "L"
      "\.md$": "M"
  htop: "H"
  ssh: "S"

title_icons:
  k9s: "K"
  btop: "T"

sessions:
  work: "W"
  dots: "D"

hosts:
  "bastion.example.com": "X"
  "*.prod.example.com":
    icon: "P"
    ring-color: "#f38ba8"
  "10.0.0.*": "I"
  "::1": "6"
"##;
