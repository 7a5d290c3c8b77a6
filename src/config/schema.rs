//! Configuration schema definitions.
//!
//! This module defines the parsed configuration: global settings plus the
//! lookup tables the resolver walks. Tables are insertion-ordered because
//! rule precedence follows the order entries appear in the file.

use indexmap::IndexMap;
use serde::Serialize;

use crate::config::validation::{CompiledRules, RuleCache};

/// Default glyph when nothing matches (nf-md-circle_off_outline).
pub const DEFAULT_FALLBACK_ICON: &str = "\u{f0d59}";

/// An insertion-ordered table keyed by the entry name as written.
pub type Table<V> = IndexMap<String, V>;

/// Root configuration for icon resolution.
#[derive(Debug, Clone, Serialize, Default, PartialEq)]
pub struct Config {
    /// Global settings from the `config:` block.
    pub settings: Settings,

    /// Layout name to glyph, from `layout-glyps:` (or `layout-glyphs:`).
    pub layout_glyphs: Table<String>,

    /// Process name rules, optionally carrying title patterns.
    pub icons: Table<IconRule>,

    /// Title keyword to glyph, for TUI apps that set the window title.
    pub title_icons: Table<String>,

    /// Session keyword to glyph.
    pub sessions: Table<String>,

    /// Exact hostname or glob pattern rules.
    pub hosts: Table<IconRule>,

    /// Compiled patterns, built on first use. Edit the tables before resolving.
    #[serde(skip)]
    pub(crate) compiled: RuleCache,
}

impl Config {
    /// Title regexes and host globs, compiled once per config.
    pub fn compiled(&self) -> &CompiledRules {
        self.compiled.get_or_compile(self)
    }

    /// True when none of the lookup tables has an entry.
    pub fn is_empty(&self) -> bool {
        self.icons.is_empty()
            && self.title_icons.is_empty()
            && self.sessions.is_empty()
            && self.hosts.is_empty()
    }
}

/// Global settings.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Settings {
    /// Glyph returned when no rule matches.
    pub fallback_icon: String,

    /// Show the window name next to the glyph.
    pub show_name: bool,

    /// Prefer the process name over the window name when `show_name` is set.
    pub use_process_name: bool,

    /// Try the hosts table before anything else when an ssh/mosh host is found.
    pub prefer_host_icon: bool,

    /// Ring color for the active window.
    pub ring_color_active: String,

    /// Ring color for inactive windows.
    pub ring_color_inactive: String,

    /// Default glyph color.
    pub icon_color: String,

    /// Default color for windows with an alert.
    pub alert_color: String,

    /// Glyph marking windows with more than one pane. Empty disables it.
    pub multi_pane_icon: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            fallback_icon: DEFAULT_FALLBACK_ICON.to_string(),
            show_name: false,
            use_process_name: false,
            prefer_host_icon: true,
            ring_color_active: "#875fff".to_string(),
            ring_color_inactive: "#45475a".to_string(),
            icon_color: "#cdd6f4".to_string(),
            alert_color: "#f38ba8".to_string(),
            multi_pane_icon: String::new(),
        }
    }
}

/// A table value: either a bare glyph or a structured entry.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(untagged)]
pub enum IconRule {
    Simple(String),
    Styled(StyledRule),
}

impl IconRule {
    /// Title patterns carried by a structured entry, if any.
    pub fn title_patterns(&self) -> Option<&Table<String>> {
        match self {
            IconRule::Styled(rule) if !rule.title.is_empty() => Some(&rule.title),
            _ => None,
        }
    }
}

/// A structured entry with named sub-fields.
#[derive(Debug, Clone, Serialize, Default, PartialEq)]
pub struct StyledRule {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon_color: Option<String>,

    /// `ring-color`, or `index-color` when `ring-color` is absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ring_color: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub alert_color: Option<String>,

    /// Regex pattern to glyph, searched against the window title.
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub title: Table<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.fallback_icon, DEFAULT_FALLBACK_ICON);
        assert!(settings.prefer_host_icon);
        assert!(!settings.show_name);
        assert_eq!(settings.ring_color_active, "#875fff");
        assert!(settings.multi_pane_icon.is_empty());
    }

    #[test]
    fn test_title_patterns_only_on_styled_rules() {
        assert!(IconRule::Simple("x".into()).title_patterns().is_none());
        assert!(IconRule::Styled(StyledRule::default()).title_patterns().is_none());

        let mut rule = StyledRule::default();
        rule.title.insert("^git".into(), "g".into());
        let patterns = IconRule::Styled(rule).title_patterns().map(|t| t.len());
        assert_eq!(patterns, Some(1));
    }

    #[test]
    fn test_rule_serializes_untagged() {
        let simple = serde_json::to_value(IconRule::Simple("a".into())).unwrap();
        assert_eq!(simple, serde_json::json!("a"));

        let styled = IconRule::Styled(StyledRule {
            icon: Some("b".into()),
            icon_color: Some("#fff".into()),
            ..Default::default()
        });
        let value = serde_json::to_value(styled).unwrap();
        assert_eq!(value, serde_json::json!({"icon": "b", "icon_color": "#fff"}));
    }
}
