//! Matcher stages.
//!
//! # Responsibilities
//! - Host: exact or glob match of the remote host (case-insensitive)
//! - Title pattern: regex search of the title, per structured icons entry
//! - Title icon: title keywords, by token then by substring
//! - Process: exact process name (case-insensitive)
//! - Session: session name keywords, by token
//!
//! # Design Decisions
//! - Each stage is a `Matcher`; `MatcherChain` runs them in order and the
//!   first stage with a result wins
//! - Inside a stage, table order decides; there is no specificity ranking
//! - A pattern that fails to compile is skipped, never an error
//! - Patterns are compiled once per `Config` and reused across resolves

use crate::config::schema::{Config, IconRule, Settings, StyledRule, Table};
use crate::config::validation::CompiledRules;
use crate::resolver::{IconResult, IconSource, Query};

/// Everything a stage may look at.
#[derive(Debug, Clone, Copy)]
pub struct MatchContext<'a> {
    pub query: &'a Query,
    /// Lowercase remote host, when one was detected and host icons are preferred.
    pub host: Option<&'a str>,
    pub config: &'a Config,
}

/// One resolution stage.
pub trait Matcher: Send + Sync + std::fmt::Debug {
    /// The source tag this stage stamps on its results.
    fn source(&self) -> IconSource;

    /// Returns a result if this stage matches.
    fn find(&self, ctx: &MatchContext<'_>) -> Option<IconResult>;
}

/// Runs stages in order; the first result wins.
#[derive(Debug)]
pub struct MatcherChain {
    matchers: Vec<Box<dyn Matcher>>,
}

impl MatcherChain {
    pub fn new(matchers: Vec<Box<dyn Matcher>>) -> Self {
        Self { matchers }
    }

    /// host → title_pattern → title_icon → process → session.
    pub fn standard() -> Self {
        Self::new(vec![
            Box::new(HostMatcher),
            Box::new(TitlePatternMatcher),
            Box::new(TitleIconMatcher),
            Box::new(ProcessMatcher),
            Box::new(SessionMatcher),
        ])
    }

    pub fn find(&self, ctx: &MatchContext<'_>) -> Option<IconResult> {
        self.matchers.iter().find_map(|m| {
            let result = m.find(ctx)?;
            tracing::trace!(source = %m.source(), icon = %result.icon, "stage matched");
            Some(result)
        })
    }

    /// Run the chain, falling back to the configured glyph.
    pub fn resolve(&self, ctx: &MatchContext<'_>) -> IconResult {
        self.find(ctx)
            .unwrap_or_else(|| IconResult::fallback(&ctx.config.settings))
    }
}

impl Default for MatcherChain {
    fn default() -> Self {
        Self::standard()
    }
}

/// Matches the remote host against the hosts table.
#[derive(Debug, Clone, Copy, Default)]
pub struct HostMatcher;

impl Matcher for HostMatcher {
    fn source(&self) -> IconSource {
        IconSource::Host
    }

    fn find(&self, ctx: &MatchContext<'_>) -> Option<IconResult> {
        let host = ctx.host?.to_lowercase();
        let settings = &ctx.config.settings;
        let compiled = ctx.config.compiled();

        ctx.config
            .hosts
            .iter()
            .find(|(pattern, _)| host_matches(compiled, pattern, &host))
            .map(|(_, rule)| rule_result(rule, settings, self.source()))
    }
}

/// Exact match first, then glob.
fn host_matches(compiled: &CompiledRules, pattern: &str, host: &str) -> bool {
    if pattern.to_lowercase() == host {
        return true;
    }
    compiled.host(pattern).is_some_and(|glob| glob.is_match(host))
}

/// Searches the title with each structured icons entry's patterns.
#[derive(Debug, Clone, Copy, Default)]
pub struct TitlePatternMatcher;

impl Matcher for TitlePatternMatcher {
    fn source(&self) -> IconSource {
        IconSource::TitlePattern
    }

    fn find(&self, ctx: &MatchContext<'_>) -> Option<IconResult> {
        let title = ctx.query.title.as_str();
        if title.is_empty() {
            return None;
        }
        let settings = &ctx.config.settings;
        let compiled = ctx.config.compiled();

        for rule in ctx.config.icons.values() {
            let IconRule::Styled(styled) = rule else { continue };
            for (pattern, icon) in &styled.title {
                // Invalid or overlong patterns were dropped at compile time.
                let Some(regex) = compiled.title(pattern) else { continue };
                if regex.is_match(title) {
                    return Some(styled_result(styled, Some(icon), settings, self.source()));
                }
            }
        }

        None
    }
}

/// Looks up title keywords in `title_icons`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TitleIconMatcher;

impl Matcher for TitleIconMatcher {
    fn source(&self) -> IconSource {
        IconSource::TitleIcon
    }

    fn find(&self, ctx: &MatchContext<'_>) -> Option<IconResult> {
        let table = &ctx.config.title_icons;
        if ctx.query.title.is_empty() || table.is_empty() {
            return None;
        }
        let title = ctx.query.title.to_lowercase();
        let settings = &ctx.config.settings;

        let by_token = title
            .split(|c: char| !is_title_token_char(c))
            .filter(|token| !token.is_empty())
            .find_map(|token| table.get(token))
            .map(String::as_str);

        // Mixed-case keys only match here.
        let icon = by_token.or_else(|| {
            table
                .iter()
                .find(|(keyword, _)| title.contains(keyword.to_lowercase().as_str()))
                .map(|(_, icon)| icon.as_str())
        })?;

        Some(IconResult::bare(glyph_or_fallback(icon, settings), self.source()))
    }
}

fn is_title_token_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '+' | '-')
}

/// Matches the process name against the icons table.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessMatcher;

impl Matcher for ProcessMatcher {
    fn source(&self) -> IconSource {
        IconSource::Process
    }

    fn find(&self, ctx: &MatchContext<'_>) -> Option<IconResult> {
        if ctx.query.process.is_empty() {
            return None;
        }
        let process = ctx.query.process.to_lowercase();

        ctx.config
            .icons
            .iter()
            .find(|(name, _)| name.to_lowercase() == process)
            .map(|(_, rule)| rule_result(rule, &ctx.config.settings, self.source()))
    }
}

/// Looks up session name keywords in `sessions`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SessionMatcher;

impl Matcher for SessionMatcher {
    fn source(&self) -> IconSource {
        IconSource::Session
    }

    fn find(&self, ctx: &MatchContext<'_>) -> Option<IconResult> {
        let table = &ctx.config.sessions;
        if ctx.query.session.is_empty() || table.is_empty() {
            return None;
        }
        let session = ctx.query.session.to_lowercase();

        let icon = session
            .split(|c: char| !c.is_ascii_alphanumeric())
            .filter(|token| !token.is_empty())
            .find_map(|token| lookup_keyword(table, token))?;

        Some(IconResult::bare(
            glyph_or_fallback(icon, &ctx.config.settings),
            self.source(),
        ))
    }
}

/// Case-insensitive key lookup in table order. `token` is lowercase.
fn lookup_keyword<'t>(table: &'t Table<String>, token: &str) -> Option<&'t str> {
    if let Some(icon) = table.get(token) {
        return Some(icon.as_str());
    }
    table
        .iter()
        .find(|(key, _)| key.to_lowercase() == token)
        .map(|(_, icon)| icon.as_str())
}

fn rule_result(rule: &IconRule, settings: &Settings, source: IconSource) -> IconResult {
    match rule {
        IconRule::Simple(icon) => IconResult::bare(glyph_or_fallback(icon, settings), source),
        IconRule::Styled(styled) => styled_result(styled, None, settings, source),
    }
}

/// A structured entry's result; missing colors take the config defaults.
fn styled_result(
    rule: &StyledRule,
    icon: Option<&String>,
    settings: &Settings,
    source: IconSource,
) -> IconResult {
    let icon = icon.or(rule.icon.as_ref()).map_or("", String::as_str);
    IconResult {
        icon: glyph_or_fallback(icon, settings).to_string(),
        ring_color: Some(or_default(&rule.ring_color, &settings.ring_color_active)),
        icon_color: Some(or_default(&rule.icon_color, &settings.icon_color)),
        alert_color: Some(or_default(&rule.alert_color, &settings.alert_color)),
        source,
    }
}

fn or_default(value: &Option<String>, default: &str) -> String {
    value.clone().unwrap_or_else(|| default.to_string())
}

fn glyph_or_fallback<'a>(icon: &'a str, settings: &'a Settings) -> &'a str {
    if icon.is_empty() {
        &settings.fallback_icon
    } else {
        icon
    }
}
