//! Resolution entry point.
//!
//! # Responsibilities
//! - Fetch the current config through the shared cache
//! - Work out the remote host (explicit cmdline, else pane pid lookup)
//! - Run the matcher chain
//!
//! # Design Decisions
//! - The cache and the process inspector are injected, not global
//! - `/proc` is only consulted when the host stage can use the answer

use std::path::Path;
use std::sync::Arc;

use crate::config::cache::ConfigCache;
use crate::config::loader::ConfigError;
use crate::config::schema::Config;
use crate::host::inspect::{ProcessInspector, ProcfsInspector};
use crate::host::parser::parse_host_args;
use crate::resolver::matcher::{MatchContext, MatcherChain};
use crate::resolver::{IconResult, Query};

/// Resolves icons for queries against a config file.
#[derive(Debug)]
pub struct IconResolver<I = ProcfsInspector> {
    cache: Arc<ConfigCache>,
    inspector: I,
    chain: MatcherChain,
}

impl IconResolver<ProcfsInspector> {
    /// Resolver with its own cache, reading `/proc` for pane pids.
    pub fn new() -> Self {
        Self::with_parts(Arc::new(ConfigCache::new()), ProcfsInspector::new())
    }
}

impl Default for IconResolver<ProcfsInspector> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I: ProcessInspector> IconResolver<I> {
    pub fn with_parts(cache: Arc<ConfigCache>, inspector: I) -> Self {
        Self {
            cache,
            inspector,
            chain: MatcherChain::standard(),
        }
    }

    /// Replace the matcher chain.
    pub fn with_chain(mut self, chain: MatcherChain) -> Self {
        self.chain = chain;
        self
    }

    pub fn cache(&self) -> &ConfigCache {
        &self.cache
    }

    /// Resolve against the config at `config_path`.
    ///
    /// Fails only when that config has never loaded successfully.
    pub fn resolve(&self, query: &Query, config_path: &Path) -> Result<IconResult, ConfigError> {
        let config = self.cache.get(config_path)?;
        Ok(self.resolve_with(&config, query))
    }

    /// Resolve against an already loaded config. Always returns a glyph.
    pub fn resolve_with(&self, config: &Config, query: &Query) -> IconResult {
        let host = if config.settings.prefer_host_icon {
            self.remote_host(query)
        } else {
            None
        };

        let ctx = MatchContext {
            query,
            host: host.as_deref(),
            config,
        };
        let result = self.chain.resolve(&ctx);
        tracing::debug!(
            process = %query.process,
            host = host.as_deref().unwrap_or(""),
            source = %result.source,
            "icon resolved"
        );
        result
    }

    /// Remote host for the query, if it is running ssh or mosh.
    pub fn remote_host(&self, query: &Query) -> Option<String> {
        match (&query.cmdline, query.pane_pid) {
            (Some(argv), _) => parse_host_args(argv),
            (None, Some(pid)) => parse_host_args(&self.inspector.foreground_cmdline(pid)),
            (None, None) => None,
        }
    }
}
