//! Configuration loading from disk.
//!
//! The config format is a small, forgiving subset of YAML. Parsing runs in
//! two passes:
//!
//! ```text
//! text ─▶ tokenize (one Token per meaningful line, malformed lines dropped)
//!      ─▶ indentation state machine (stack of open blocks) ─▶ Node tree
//!      ─▶ section mapping (config, layout-glyps, icons, ...) ─▶ Config
//! ```
//!
//! Nothing in the text itself can make parsing fail. Only the file layer
//! (size bound, unreadable file) produces errors.

use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use thiserror::Error;

use crate::config::schema::{Config, IconRule, Settings, StyledRule, Table};

/// Largest config file accepted, in bytes.
pub const MAX_CONFIG_SIZE: u64 = 1024 * 1024;

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file exceeds [`MAX_CONFIG_SIZE`].
    #[error("config file too large: {size} bytes (max {max})")]
    TooLarge { size: u64, max: u64 },

    /// The file could not be opened, read, or decoded as UTF-8.
    #[error("cannot read config file {}: {source}", path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Load and parse configuration from a file.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let unreadable = |source: io::Error| ConfigError::Unreadable {
        path: path.to_path_buf(),
        source,
    };

    let file = File::open(path).map_err(unreadable)?;
    let size = file.metadata().map_err(unreadable)?.len();
    check_size(size)?;

    // The file may grow between stat and read; never read past the bound.
    let mut bytes = Vec::with_capacity(size as usize);
    file.take(MAX_CONFIG_SIZE + 1)
        .read_to_end(&mut bytes)
        .map_err(unreadable)?;
    check_size(bytes.len() as u64)?;

    let content = String::from_utf8(bytes)
        .map_err(|e| unreadable(io::Error::new(io::ErrorKind::InvalidData, e)))?;

    Ok(parse_config(&content))
}

fn check_size(size: u64) -> Result<(), ConfigError> {
    if size > MAX_CONFIG_SIZE {
        return Err(ConfigError::TooLarge {
            size,
            max: MAX_CONFIG_SIZE,
        });
    }
    Ok(())
}

/// Parse configuration text. Malformed lines are skipped.
pub fn parse_config(content: &str) -> Config {
    let root = build_tree(tokenize(content));
    let mut config = Config::default();

    for (name, node) in root {
        let Node::Block(block) = node else {
            tracing::trace!(section = %name, "ignoring scalar at top level");
            continue;
        };
        match name.as_str() {
            "config" => config.settings = parse_settings(&block),
            "layout-glyps" | "layout-glyphs" => {
                config.layout_glyphs.extend(scalar_table(&name, block));
            }
            "icons" => config.icons = rule_table(&name, block),
            "title_icons" => config.title_icons = scalar_table(&name, block),
            "sessions" => config.sessions = scalar_table(&name, block),
            "hosts" => config.hosts = rule_table(&name, block),
            _ => tracing::trace!(section = %name, "ignoring unknown section"),
        }
    }

    config
}

// ── Tokenizer ────────────────────────────────────────────────────────────────

/// One `key: value` (or `key:` block opener) line.
#[derive(Debug, Clone, PartialEq)]
struct Token {
    line: usize,
    indent: usize,
    key: String,
    /// `None` opens a nested block.
    value: Option<String>,
}

fn tokenize(content: &str) -> Vec<Token> {
    let mut tokens = Vec::new();

    for (idx, raw) in content.lines().enumerate() {
        let line = idx + 1;
        let stripped = raw.trim();
        if stripped.is_empty() || stripped.starts_with('#') {
            continue;
        }

        let Some((raw_key, rest)) = split_key(stripped) else {
            tracing::trace!(line, "skipping line without key");
            continue;
        };
        let key = unquote(raw_key.trim());
        if key.is_empty() {
            tracing::trace!(line, "skipping line with empty key");
            continue;
        }

        let rest = rest.trim();
        let value = is_inline_value(rest).then(|| strip_value(rest).to_string());

        tokens.push(Token {
            line,
            indent: raw.len() - raw.trim_start().len(),
            key: key.to_string(),
            value,
        });
    }

    tokens
}

/// Split at the key's colon. A quoted key may itself contain colons.
fn split_key(stripped: &str) -> Option<(&str, &str)> {
    if let Some(quote) = stripped.chars().next().filter(|c| is_quote(*c)) {
        if let Some(end) = stripped[1..].find(quote) {
            let close = 1 + end + 1;
            let after = stripped[close..].trim_start();
            if let Some(rest) = after.strip_prefix(':') {
                return Some((&stripped[..close], rest));
            }
        }
    }
    stripped.split_once(':')
}

/// Whether the text after the colon is a value rather than a block opener.
fn is_inline_value(rest: &str) -> bool {
    let mut chars = rest.chars();
    match chars.next() {
        None | Some('|' | '>' | '{' | '[') => false,
        // `#cdd6f4` is a color, `# note` is a comment
        Some('#') => !matches!(chars.next(), None | Some(' ')),
        Some(_) => true,
    }
}

/// Drop a trailing ` #` comment and one pair of surrounding quotes.
fn strip_value(raw: &str) -> &str {
    let val = raw.trim();

    if let Some(quote) = val.chars().next().filter(|c| is_quote(*c)) {
        if let Some(end) = val[1..].find(quote) {
            let tail = val[1 + end + 1..].trim_start();
            if tail.is_empty() || tail.starts_with('#') {
                return &val[1..1 + end];
            }
        }
    }

    let val = match val.find(" #") {
        Some(idx) => val[..idx].trim_end(),
        None => val,
    };
    unquote(val)
}

fn unquote(val: &str) -> &str {
    let bytes = val.as_bytes();
    if bytes.len() >= 2 && is_quote(bytes[0] as char) && bytes[bytes.len() - 1] == bytes[0] {
        &val[1..val.len() - 1]
    } else {
        val
    }
}

fn is_quote(c: char) -> bool {
    c == '"' || c == '\''
}

// ── Indentation state machine ────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
enum Node {
    Scalar(String),
    Block(Table<Node>),
}

/// A block whose children are still being read.
struct Frame {
    key: String,
    /// Indentation of the opener line; `None` for the document root.
    opener_indent: Option<usize>,
    /// Indentation of the children, fixed by the first child.
    child_indent: Option<usize>,
    children: Table<Node>,
}

impl Frame {
    fn root() -> Self {
        Self {
            key: String::new(),
            opener_indent: None,
            child_indent: Some(0),
            children: IndexMap::new(),
        }
    }

    fn encloses(&self, indent: usize) -> bool {
        self.opener_indent.is_none_or(|opener| indent > opener)
    }
}

fn build_tree(tokens: Vec<Token>) -> Table<Node> {
    let mut stack = vec![Frame::root()];

    for token in tokens {
        // Close every block this line dedents out of.
        while stack.len() > 1 && !stack[stack.len() - 1].encloses(token.indent) {
            close_frame(&mut stack);
        }

        let top = stack.len() - 1;
        let level = *stack[top].child_indent.get_or_insert(token.indent);
        if token.indent != level {
            tracing::trace!(line = token.line, key = %token.key, "skipping misindented line");
            continue;
        }

        match token.value {
            Some(value) => {
                stack[top].children.insert(token.key, Node::Scalar(value));
            }
            None => stack.push(Frame {
                key: token.key,
                opener_indent: Some(token.indent),
                child_indent: None,
                children: IndexMap::new(),
            }),
        }
    }

    while stack.len() > 1 {
        close_frame(&mut stack);
    }
    stack.pop().map(|root| root.children).unwrap_or_default()
}

/// Pop the innermost block and attach it to its parent unless empty.
fn close_frame(stack: &mut Vec<Frame>) {
    let Some(frame) = stack.pop() else { return };
    let Some(parent) = stack.last_mut() else { return };
    if parent.opener_indent.is_none() {
        // A repeated section is ignored; the first one wins.
        if parent.children.contains_key(&frame.key) {
            tracing::trace!(section = %frame.key, "ignoring repeated section");
            return;
        }
        // Top-level sections are kept even when empty.
        parent.children.insert(frame.key, Node::Block(frame.children));
    } else if !frame.children.is_empty() {
        parent.children.insert(frame.key, Node::Block(frame.children));
    }
}

// ── Section mapping ──────────────────────────────────────────────────────────

fn parse_settings(block: &Table<Node>) -> Settings {
    let mut settings = Settings::default();

    for (key, node) in block {
        let Node::Scalar(value) = node else { continue };
        let value = value.as_str();
        match normalize_setting(key).as_str() {
            "fallback_icon" if !value.is_empty() => settings.fallback_icon = value.to_string(),
            "show_name" => settings.show_name = parse_bool(value),
            "use_process_name" => settings.use_process_name = parse_bool(value),
            "prefer_host_icon" => settings.prefer_host_icon = parse_bool(value),
            "ring_color_active" | "index_color_active" if !value.is_empty() => {
                settings.ring_color_active = value.to_string()
            }
            "ring_color_inactive" | "index_color_inactive" if !value.is_empty() => {
                settings.ring_color_inactive = value.to_string()
            }
            "icon_color" if !value.is_empty() => settings.icon_color = value.to_string(),
            "alert_color" if !value.is_empty() => settings.alert_color = value.to_string(),
            "multi_pane_icon" if !value.is_empty() => {
                settings.multi_pane_icon = value.to_string()
            }
            _ => {}
        }
    }

    settings
}

fn normalize_setting(key: &str) -> String {
    key.to_lowercase().replace('-', "_")
}

/// YAML-ish boolean; anything unrecognized reads as false.
fn parse_bool(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "true" | "yes" | "1" | "on"
    )
}

fn scalar_table(section: &str, block: Table<Node>) -> Table<String> {
    block
        .into_iter()
        .filter_map(|(key, node)| match node {
            Node::Scalar(value) => Some((key, value)),
            Node::Block(_) => {
                tracing::trace!(section, key = %key, "ignoring nested entry");
                None
            }
        })
        .collect()
}

fn rule_table(section: &str, block: Table<Node>) -> Table<IconRule> {
    block
        .into_iter()
        .map(|(key, node)| {
            let rule = match node {
                Node::Scalar(icon) => IconRule::Simple(icon),
                Node::Block(fields) => IconRule::Styled(styled_rule(section, &key, fields)),
            };
            (key, rule)
        })
        .collect()
}

fn styled_rule(section: &str, entry: &str, fields: Table<Node>) -> StyledRule {
    let mut rule = StyledRule::default();
    let mut index_color = None;

    for (field, node) in fields {
        match (field.to_lowercase().replace('_', "-").as_str(), node) {
            ("icon", Node::Scalar(v)) => rule.icon = Some(v),
            ("icon-color", Node::Scalar(v)) => rule.icon_color = Some(v),
            ("ring-color", Node::Scalar(v)) => rule.ring_color = Some(v),
            ("index-color", Node::Scalar(v)) => index_color = Some(v),
            ("alert-color", Node::Scalar(v)) => rule.alert_color = Some(v),
            ("title", Node::Block(patterns)) => {
                rule.title = scalar_table(section, patterns);
            }
            _ => tracing::trace!(section, entry, field = %field, "ignoring unknown field"),
        }
    }

    if rule.ring_color.is_none() {
        rule.ring_color = index_color;
    }
    rule
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::DEFAULT_FALLBACK_ICON;
    use std::io::Write;

    const SAMPLE: &str = r##"
# nerd-icons config
config:
  fallback-icon: "?"  # shown when nothing matches
  prefer-host-icon: no
  show_name: yes
  index-color-active: "#112233"
  icon-color: #cdd6f4
  multi-pane-icon: 'M'

layout-glyps:
  tiled: "T"

icons:
  zsh: "Z"
  nvim:
    icon: "N"
    icon-color: "#00ff00"
    title:
      "^git:": "G"
      'diff': "D"
  htop: H

title_icons:
  lazygit: "L"

sessions:
  work: "W"

hosts:
  "*.prod.example.com":
    icon: "P"
    index-color: "#ff0000"
    alert-color: "#ffff00"
  devbox: "B"
"##;

    #[test]
    fn test_parse_sample() {
        let config = parse_config(SAMPLE);

        assert_eq!(config.settings.fallback_icon, "?");
        assert!(!config.settings.prefer_host_icon);
        assert!(config.settings.show_name);
        assert_eq!(config.settings.ring_color_active, "#112233");
        assert_eq!(config.settings.icon_color, "#cdd6f4");
        assert_eq!(config.settings.multi_pane_icon, "M");

        assert_eq!(config.layout_glyphs.get("tiled").map(String::as_str), Some("T"));
        assert_eq!(config.title_icons.get("lazygit").map(String::as_str), Some("L"));
        assert_eq!(config.sessions.get("work").map(String::as_str), Some("W"));

        let keys: Vec<&str> = config.icons.keys().map(String::as_str).collect();
        assert_eq!(keys, ["zsh", "nvim", "htop"]);
        assert_eq!(config.icons["htop"], IconRule::Simple("H".into()));

        let IconRule::Styled(nvim) = &config.icons["nvim"] else {
            panic!("nvim should be structured");
        };
        assert_eq!(nvim.icon.as_deref(), Some("N"));
        assert_eq!(nvim.icon_color.as_deref(), Some("#00ff00"));
        let patterns: Vec<(&str, &str)> = nvim
            .title
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        assert_eq!(patterns, [("^git:", "G"), ("diff", "D")]);

        let IconRule::Styled(prod) = &config.hosts["*.prod.example.com"] else {
            panic!("prod should be structured");
        };
        assert_eq!(prod.ring_color.as_deref(), Some("#ff0000"));
        assert_eq!(prod.alert_color.as_deref(), Some("#ffff00"));
        assert_eq!(config.hosts["devbox"], IconRule::Simple("B".into()));
    }

    #[test]
    fn test_empty_input_uses_defaults() {
        let config = parse_config("");
        assert!(config.is_empty());
        assert_eq!(config.settings, Settings::default());
        assert_eq!(config.settings.fallback_icon, DEFAULT_FALLBACK_ICON);
    }

    #[test]
    fn test_malformed_lines_are_skipped() {
        let config = parse_config(
            "icons:\n  just some words\n  : no key\n  git: \"G\"\n  list: [a, b]\n  block: |\n",
        );
        let keys: Vec<&str> = config.icons.keys().map(String::as_str).collect();
        assert_eq!(keys, ["git"]);
    }

    #[test]
    fn test_duplicate_key_keeps_first_position() {
        let config = parse_config("sessions:\n  a: \"1\"\n  b: \"2\"\n  a: \"3\"\n");
        let entries: Vec<(&str, &str)> = config
            .sessions
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        assert_eq!(entries, [("a", "3"), ("b", "2")]);
    }

    #[test]
    fn test_section_ends_on_dedent() {
        let config = parse_config("sessions:\n  a: \"1\"\nunknown:\n  b: \"2\"\n");
        assert_eq!(config.sessions.len(), 1);
        assert!(!config.sessions.contains_key("b"));
    }

    #[test]
    fn test_repeated_section_keeps_first() {
        let config = parse_config(
            "icons:\n  zsh: \"Z\"\nsessions:\n  work: \"W\"\nicons:\n  bash: \"B\"\n",
        );
        let keys: Vec<&str> = config.icons.keys().map(String::as_str).collect();
        assert_eq!(keys, ["zsh"]);
        assert_eq!(config.sessions.len(), 1);
    }

    #[test]
    fn test_ring_color_wins_over_index_color() {
        let config = parse_config(
            "hosts:\n  h:\n    index-color: \"#111111\"\n    ring-color: \"#222222\"\n",
        );
        let IconRule::Styled(rule) = &config.hosts["h"] else {
            panic!("h should be structured");
        };
        assert_eq!(rule.ring_color.as_deref(), Some("#222222"));
    }

    #[test]
    fn test_quoted_keys_may_contain_colons() {
        let config = parse_config("hosts:\n  \"2001:db8::1\": \"6\"\n");
        assert_eq!(config.hosts["2001:db8::1"], IconRule::Simple("6".into()));
    }

    #[test]
    fn test_layout_glyph_spellings_merge() {
        let config = parse_config("layout-glyps:\n  a: \"1\"\nlayout-glyphs:\n  b: \"2\"\n");
        assert_eq!(config.layout_glyphs.len(), 2);
    }

    #[test]
    fn test_opener_without_children_is_dropped() {
        let config = parse_config("icons:\n  empty:\n  zsh: \"Z\"\n");
        assert!(!config.icons.contains_key("empty"));
        assert!(config.icons.contains_key("zsh"));
    }

    #[test]
    fn test_strip_value() {
        assert_eq!(strip_value("  \"hello\"  # comment"), "hello");
        assert_eq!(strip_value("'single quoted'"), "single quoted");
        assert_eq!(strip_value("\"a # b\""), "a # b");
        assert_eq!(strip_value("plain # trailing"), "plain");
        assert_eq!(strip_value("#cdd6f4"), "#cdd6f4");
        assert_eq!(strip_value("\"mismatched'"), "\"mismatched'");
    }

    #[test]
    fn test_inline_value_detection() {
        assert!(is_inline_value("x"));
        assert!(is_inline_value("#abcdef"));
        assert!(!is_inline_value(""));
        assert!(!is_inline_value("#"));
        assert!(!is_inline_value("# comment"));
        assert!(!is_inline_value("|"));
        assert!(!is_inline_value("{a: b}"));
    }

    #[test]
    fn test_parse_bool() {
        for value in ["true", "Yes", "on", "1"] {
            assert!(parse_bool(value), "{value}");
        }
        for value in ["false", "no", "off", "0", "maybe"] {
            assert!(!parse_bool(value), "{value}");
        }
    }

    #[test]
    fn test_load_config_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"icons:\n  zsh: \"Z\"\n").unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.icons["zsh"], IconRule::Simple("Z".into()));
    }

    #[test]
    fn test_load_config_size_limit() {
        let mut at_limit = tempfile::NamedTempFile::new().unwrap();
        at_limit.write_all(&vec![b'#'; MAX_CONFIG_SIZE as usize]).unwrap();
        assert!(load_config(at_limit.path()).is_ok());

        let mut over = tempfile::NamedTempFile::new().unwrap();
        over.write_all(&vec![b'#'; MAX_CONFIG_SIZE as usize + 1]).unwrap();
        let err = load_config(over.path()).unwrap_err();
        assert!(matches!(err, ConfigError::TooLarge { size, .. } if size == MAX_CONFIG_SIZE + 1));
    }

    #[test]
    fn test_load_config_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_config(&dir.path().join("missing.yml")).unwrap_err();
        assert!(matches!(err, ConfigError::Unreadable { .. }));
        assert!(err.to_string().contains("missing.yml"));
    }

    #[test]
    fn test_load_config_rejects_invalid_utf8() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&[0xff, 0xfe, b'\n']).unwrap();
        assert!(matches!(
            load_config(file.path()),
            Err(ConfigError::Unreadable { .. })
        ));
    }
}
