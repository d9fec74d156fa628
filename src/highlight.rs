//! Syntax highlighting for fenced code blocks.

use crate::config::DEFAULT_HIGHLIGHT_THEME;
use std::sync::LazyLock;
use syntect::highlighting::{Theme, ThemeSet};
use syntect::html::highlighted_html_for_string;
use syntect::parsing::SyntaxSet;

static SYNTAX_SET: LazyLock<SyntaxSet> = LazyLock::new(SyntaxSet::load_defaults_newlines);
static THEME_SET: LazyLock<ThemeSet> = LazyLock::new(ThemeSet::load_defaults);

fn resolve_theme(name: &str) -> Option<&'static Theme> {
    THEME_SET
        .themes
        .get(name)
        .or_else(|| THEME_SET.themes.get(DEFAULT_HIGHLIGHT_THEME))
}

/// Highlight `code` written in `lang` with the named syntect theme.
///
/// Returns `None` when the language is unknown, so callers can fall back to a
/// plain `<pre><code>` block.
pub fn highlight_code(code: &str, lang: &str, theme_name: &str) -> Option<String> {
    let lang = lang.trim();
    if lang.is_empty() {
        return None;
    }
    let syntax = SYNTAX_SET
        .find_syntax_by_token(lang)
        .or_else(|| SYNTAX_SET.find_syntax_by_extension(lang))?;
    let theme = resolve_theme(theme_name)?;

    let html = highlighted_html_for_string(code, &SYNTAX_SET, syntax, theme).ok()?;
    Some(format!("<div class=\"codehilite\">{}</div>\n", html))
}

pub fn available_themes() -> Vec<String> {
    let mut names: Vec<String> = THEME_SET.themes.keys().cloned().collect();
    names.sort();
    names
}
