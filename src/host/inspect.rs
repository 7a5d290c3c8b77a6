//! Foreground command-line lookup for a pane's process.
//!
//! # Responsibilities
//! - Find the foreground process group of the pane's terminal
//! - Read that process's argument vector
//!
//! # Design Decisions
//! - Linux `/proc` only; other platforms simply get no command line
//! - Never fails: every error collapses to an empty argument list

use std::fs;
use std::path::PathBuf;

/// Source of foreground command lines.
pub trait ProcessInspector: Send + Sync + std::fmt::Debug {
    /// Argument vector of the foreground process on `pid`'s terminal.
    /// Empty when it cannot be determined.
    fn foreground_cmdline(&self, pid: u32) -> Vec<String>;
}

/// Reads `/proc/<pid>/stat` and `/proc/<tpgid>/cmdline`.
#[derive(Debug, Clone)]
pub struct ProcfsInspector {
    root: PathBuf,
}

impl ProcfsInspector {
    /// Inspector over the system `/proc`.
    pub fn new() -> Self {
        Self::with_root("/proc")
    }

    /// Inspector over a proc-like tree rooted elsewhere.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn try_foreground_cmdline(&self, pid: u32) -> Option<Vec<String>> {
        let stat = fs::read_to_string(self.root.join(pid.to_string()).join("stat")).ok()?;
        let tpgid = foreground_group(&stat)?;
        let raw = fs::read(self.root.join(tpgid.to_string()).join("cmdline")).ok()?;
        Some(split_cmdline(&raw))
    }
}

impl Default for ProcfsInspector {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessInspector for ProcfsInspector {
    fn foreground_cmdline(&self, pid: u32) -> Vec<String> {
        match self.try_foreground_cmdline(pid) {
            Some(argv) => argv,
            None => {
                tracing::debug!(pid, root = %self.root.display(), "no foreground command line");
                Vec::new()
            }
        }
    }
}

/// Inspector that never finds anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoInspector;

impl ProcessInspector for NoInspector {
    fn foreground_cmdline(&self, _pid: u32) -> Vec<String> {
        Vec::new()
    }
}

/// The `tpgid` field of a stat line.
///
/// Format: `pid (comm) state ppid pgrp session tty_nr tpgid ...`. `comm` may
/// contain spaces and parentheses, so fields are counted after the last `)`.
fn foreground_group(stat: &str) -> Option<i64> {
    let after_comm = &stat[stat.rfind(')')? + 1..];
    let tpgid: i64 = after_comm.split_whitespace().nth(5)?.parse().ok()?;
    // -1 means no controlling terminal.
    (tpgid > 0).then_some(tpgid)
}

/// Split a NUL-separated argument vector, dropping empty entries.
fn split_cmdline(raw: &[u8]) -> Vec<String> {
    raw.split(|b| *b == 0)
        .filter(|arg| !arg.is_empty())
        .map(|arg| String::from_utf8_lossy(arg).into_owned())
        .collect()
}
