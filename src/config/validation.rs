//! Configuration validation.
//!
//! # Responsibilities
//! - Compile title regexes and host globs the same way the resolver does
//! - Report every problem found, not just the first
//!
//! # Design Decisions
//! - Loading never runs validation; a bad rule is skipped at match time
//! - Validation is a pure function: `&Config → Result<(), Vec<ValidationError>>`

use std::collections::HashMap;
use std::fmt;
use std::sync::OnceLock;

use globset::{GlobBuilder, GlobMatcher};
use regex::{Regex, RegexBuilder};
use thiserror::Error;

use crate::config::schema::{Config, IconRule, Table};

/// Longest title pattern that will be compiled.
pub const MAX_PATTERN_LENGTH: usize = 500;

/// A problem with a single rule.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("{section}.{entry}: title pattern is {len} chars (max {})", MAX_PATTERN_LENGTH)]
    PatternTooLong {
        section: String,
        entry: String,
        len: usize,
    },

    #[error("{section}.{entry}: invalid title pattern {pattern:?}: {reason}")]
    InvalidPattern {
        section: String,
        entry: String,
        pattern: String,
        reason: String,
    },

    #[error("hosts: invalid glob {pattern:?}: {reason}")]
    InvalidGlob { pattern: String, reason: String },

    #[error("{section}.{entry}: empty glyph")]
    EmptyGlyph { section: String, entry: String },
}

/// Why a pattern could not be compiled. Lengths are in chars.
#[derive(Debug, Clone, PartialEq)]
pub enum PatternError {
    TooLong(usize),
    Invalid(String),
}

/// Compile a case-insensitive title pattern.
pub fn compile_title_pattern(pattern: &str) -> Result<Regex, PatternError> {
    let len = pattern.chars().count();
    if len > MAX_PATTERN_LENGTH {
        return Err(PatternError::TooLong(len));
    }
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .map_err(|e| PatternError::Invalid(e.to_string()))
}

/// Compile a case-insensitive host glob (`*`, `?`, `[seq]`, `[!seq]`).
///
/// Braces and backslashes are plain characters.
pub fn compile_host_glob(pattern: &str) -> Result<GlobMatcher, String> {
    GlobBuilder::new(&literal_braces(pattern))
        .case_insensitive(true)
        .literal_separator(false)
        .backslash_escape(false)
        .build()
        .map(|glob| glob.compile_matcher())
        .map_err(|e| e.to_string())
}

/// Wrap `{` and `}` outside character classes in `[...]` so globset does not
/// read them as alternation.
fn literal_braces(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len());
    let mut class_len: Option<usize> = None;

    for c in pattern.chars() {
        match (class_len, c) {
            (None, '[') => {
                class_len = Some(0);
                out.push(c);
            }
            (None, '{' | '}') => {
                out.push('[');
                out.push(c);
                out.push(']');
            }
            (None, _) => out.push(c),
            // `]` first in a class (or right after `!`) is a member.
            (Some(n), ']') if n > 0 && !(n == 1 && out.ends_with("[!")) => {
                class_len = None;
                out.push(c);
            }
            (Some(n), _) => {
                class_len = Some(n + 1);
                out.push(c);
            }
        }
    }

    out
}

/// Title regexes and host globs of one config, compiled once.
///
/// Patterns that fail to compile map to `None` and are logged when compiled.
#[derive(Debug, Default)]
pub struct CompiledRules {
    titles: HashMap<String, Option<Regex>>,
    hosts: HashMap<String, Option<GlobMatcher>>,
}

impl CompiledRules {
    pub fn compile(config: &Config) -> Self {
        let mut rules = Self::default();

        for (entry, rule) in &config.icons {
            let Some(patterns) = rule.title_patterns() else { continue };
            for pattern in patterns.keys() {
                if rules.titles.contains_key(pattern) {
                    continue;
                }
                let regex = match compile_title_pattern(pattern) {
                    Ok(regex) => Some(regex),
                    Err(PatternError::TooLong(len)) => {
                        tracing::debug!(entry = %entry, len, "skipping overlong title pattern");
                        None
                    }
                    Err(PatternError::Invalid(reason)) => {
                        tracing::debug!(entry = %entry, pattern = %pattern, %reason, "skipping invalid title pattern");
                        None
                    }
                };
                rules.titles.insert(pattern.clone(), regex);
            }
        }

        for pattern in config.hosts.keys() {
            let glob = compile_host_glob(pattern)
                .map_err(|reason| {
                    tracing::debug!(pattern = %pattern, %reason, "skipping invalid host glob");
                })
                .ok();
            rules.hosts.insert(pattern.clone(), glob);
        }

        rules
    }

    /// Compiled title pattern, if it is in the config and valid.
    pub fn title(&self, pattern: &str) -> Option<&Regex> {
        self.titles.get(pattern)?.as_ref()
    }

    /// Compiled host glob, if it is in the config and valid.
    pub fn host(&self, pattern: &str) -> Option<&GlobMatcher> {
        self.hosts.get(pattern)?.as_ref()
    }
}

/// Lazily built [`CompiledRules`] carried by a [`Config`].
///
/// Clones start empty and all instances compare equal, so the derived
/// `Clone` and `PartialEq` on `Config` only see the rule tables.
#[derive(Default)]
pub struct RuleCache(OnceLock<CompiledRules>);

impl RuleCache {
    pub(crate) fn get_or_compile(&self, config: &Config) -> &CompiledRules {
        self.0.get_or_init(|| CompiledRules::compile(config))
    }
}

impl Clone for RuleCache {
    fn clone(&self) -> Self {
        Self::default()
    }
}

impl PartialEq for RuleCache {
    fn eq(&self, _other: &Self) -> bool {
        true
    }
}

impl fmt::Debug for RuleCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleCache")
            .field("compiled", &self.0.get().is_some())
            .finish()
    }
}

/// Validate every rule in the configuration.
pub fn validate_config(config: &Config) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    check_rules("icons", &config.icons, &mut errors);
    check_rules("hosts", &config.hosts, &mut errors);
    for (section, table) in [
        ("title_icons", &config.title_icons),
        ("sessions", &config.sessions),
        ("layout-glyps", &config.layout_glyphs),
    ] {
        for (entry, glyph) in table {
            if glyph.is_empty() {
                errors.push(ValidationError::EmptyGlyph {
                    section: section.to_string(),
                    entry: entry.clone(),
                });
            }
        }
    }

    for pattern in config.hosts.keys() {
        if let Err(reason) = compile_host_glob(pattern) {
            errors.push(ValidationError::InvalidGlob {
                pattern: pattern.clone(),
                reason,
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_rules(
    section: &str,
    table: &Table<IconRule>,
    errors: &mut Vec<ValidationError>,
) {
    for (entry, rule) in table {
        let glyph = match rule {
            IconRule::Simple(icon) => Some(icon.as_str()),
            IconRule::Styled(styled) => styled.icon.as_deref(),
        };
        if glyph == Some("") {
            errors.push(ValidationError::EmptyGlyph {
                section: section.to_string(),
                entry: entry.clone(),
            });
        }

        let Some(patterns) = rule.title_patterns() else { continue };
        for (pattern, icon) in patterns {
            match compile_title_pattern(pattern) {
                Ok(_) => {}
                Err(PatternError::TooLong(len)) => errors.push(ValidationError::PatternTooLong {
                    section: section.to_string(),
                    entry: entry.clone(),
                    len,
                }),
                Err(PatternError::Invalid(reason)) => {
                    errors.push(ValidationError::InvalidPattern {
                        section: section.to_string(),
                        entry: entry.clone(),
                        pattern: pattern.clone(),
                        reason,
                    })
                }
            }
            if icon.is_empty() {
                errors.push(ValidationError::EmptyGlyph {
                    section: format!("{section}.{entry}.title"),
                    entry: pattern.clone(),
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::loader::parse_config;

    #[test]
    fn test_valid_config_passes() {
        let config = parse_config(
            "icons:\n  nvim:\n    icon: \"N\"\n    title:\n      \"^git\": \"G\"\nhosts:\n  \"*.example.com\": \"E\"\n",
        );
        assert_eq!(validate_config(&config), Ok(()));
    }

    #[test]
    fn test_reports_every_problem() {
        let long = "a".repeat(MAX_PATTERN_LENGTH + 1);
        let text = format!(
            "icons:\n  nvim:\n    title:\n      \"(unclosed\": \"X\"\n      \"{long}\": \"Y\"\nsessions:\n  work: \"\"\nhosts:\n  \"[a\": \"H\"\n"
        );
        let errors = validate_config(&parse_config(&text)).unwrap_err();

        assert_eq!(errors.len(), 4, "{errors:?}");
        assert!(matches!(errors[0], ValidationError::InvalidPattern { .. }));
        assert!(matches!(
            errors[1],
            ValidationError::PatternTooLong { len, .. } if len == MAX_PATTERN_LENGTH + 1
        ));
        assert!(matches!(errors[2], ValidationError::EmptyGlyph { .. }));
        assert!(matches!(errors[3], ValidationError::InvalidGlob { .. }));
    }

    #[test]
    fn test_pattern_length_limit() {
        let at_limit = "a".repeat(MAX_PATTERN_LENGTH);
        assert!(compile_title_pattern(&at_limit).is_ok());
        let over = "a".repeat(MAX_PATTERN_LENGTH + 1);
        assert_eq!(
            compile_title_pattern(&over).unwrap_err(),
            PatternError::TooLong(MAX_PATTERN_LENGTH + 1)
        );
    }

    #[test]
    fn test_pattern_length_counts_chars() {
        let accents = "é".repeat(300);
        assert!(accents.len() > MAX_PATTERN_LENGTH);
        assert!(compile_title_pattern(&accents).is_ok());

        let over = "é".repeat(MAX_PATTERN_LENGTH + 1);
        assert_eq!(
            compile_title_pattern(&over).unwrap_err(),
            PatternError::TooLong(MAX_PATTERN_LENGTH + 1)
        );

        let config = parse_config(&format!("icons:\n  app:\n    title:\n      \"{accents}\": \"E\"\n"));
        assert_eq!(validate_config(&config), Ok(()));
    }

    #[test]
    fn test_title_pattern_is_case_insensitive() {
        let re = compile_title_pattern("^readme").unwrap();
        assert!(re.is_match("README.md"));
    }

    #[test]
    fn test_host_glob() {
        let glob = compile_host_glob("web-?.PROD.*").unwrap();
        assert!(glob.is_match("web-1.prod.example.com"));
        assert!(!glob.is_match("web-10.prod.example.com"));

        let class = compile_host_glob("db[!0-4]").unwrap();
        assert!(class.is_match("db7"));
        assert!(!class.is_match("db3"));
    }

    #[test]
    fn test_host_glob_braces_and_backslashes_are_literal() {
        let braces = compile_host_glob("web{1,2}").unwrap();
        assert!(braces.is_match("web{1,2}"));
        assert!(!braces.is_match("web1"));

        let backslash = compile_host_glob(r"corp\box*").unwrap();
        assert!(backslash.is_match(r"corp\box-1"));
        assert!(!backslash.is_match("corpbox-1"));

        let class = compile_host_glob("db[{}]*").unwrap();
        assert!(class.is_match("db{x"));
        assert!(!class.is_match("dbx"));
    }

    #[test]
    fn test_literal_braces() {
        assert_eq!(literal_braces("a{b}"), "a[{]b[}]");
        assert_eq!(literal_braces("[{]x{"), "[{]x[{]");
        assert_eq!(literal_braces("[]{]{"), "[]{][{]");
        assert_eq!(literal_braces("[!]x]{"), "[!]x][{]");
    }

    #[test]
    fn test_error_display() {
        let err = ValidationError::InvalidGlob {
            pattern: "[a".into(),
            reason: "unclosed".into(),
        };
        assert!(err.to_string().starts_with("hosts: invalid glob \"[a\""));
    }
}
