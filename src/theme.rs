//! Theme discovery and stylesheet loading.

use crate::config::Settings;
use crate::error::{Md2PdfError, Result};
use log::{debug, warn};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct ThemeManager {
    themes_dir: PathBuf,
}

impl ThemeManager {
    pub fn new(themes_dir: impl Into<PathBuf>) -> Self {
        ThemeManager {
            themes_dir: themes_dir.into(),
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.themes_dir.clone())
    }

    pub fn themes_dir(&self) -> &Path {
        &self.themes_dir
    }

    pub fn theme_path(&self, theme: &str) -> PathBuf {
        self.themes_dir.join(format!("{}.css", theme))
    }

    /// Names of all `.css` files in the themes directory, sorted.
    pub fn list_themes(&self) -> Vec<String> {
        let entries = match fs::read_dir(&self.themes_dir) {
            Ok(entries) => entries,
            Err(_) => return Vec::new(),
        };

        let mut themes: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_file())
            .filter(|path| path.extension().is_some_and(|ext| ext == "css"))
            .filter_map(|path| path.file_stem().map(|s| s.to_string_lossy().into_owned()))
            .collect();
        themes.sort();
        themes.dedup();
        themes
    }

    pub fn validate_theme(&self, theme: &str) -> Result<()> {
        if self.theme_path(theme).is_file() {
            Ok(())
        } else {
            Err(Md2PdfError::theme_not_found(theme, self.list_themes()))
        }
    }

    /// Load the stylesheet to embed. A custom CSS file wins over the theme.
    pub fn load_css(&self, custom_css: Option<&Path>, theme: &str) -> Result<String> {
        match custom_css {
            Some(path) => load_custom_css(path),
            None => self.load_theme_css(theme),
        }
    }

    pub fn load_theme_css(&self, theme: &str) -> Result<String> {
        let path = self.theme_path(theme);
        if !path.is_file() {
            return Err(Md2PdfError::theme_not_found(theme, self.list_themes()));
        }
        debug!("Loading theme '{}' from {}", theme, path.display());
        fs::read_to_string(&path)
            .map_err(|e| Md2PdfError::FileOperation(format!("Error reading theme file: {}", e)))
    }
}

pub fn load_custom_css(path: &Path) -> Result<String> {
    if !path.exists() {
        return Err(Md2PdfError::CssNotFound(format!(
            "CSS file '{}' does not exist.",
            path.display()
        )));
    }
    if !path.is_file() {
        return Err(Md2PdfError::CssNotFound(format!(
            "CSS file '{}' is not a file.",
            path.display()
        )));
    }

    let is_css = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("css"));
    if !is_css {
        warn!("'{}' does not have .css extension", path.display());
    }

    debug!("Loading custom CSS from {}", path.display());
    fs::read_to_string(path)
        .map_err(|e| Md2PdfError::CssNotFound(format!("Error reading CSS file: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_themes_dir;

    fn manager_with(themes: &[&str]) -> (tempfile::TempDir, ThemeManager) {
        let dir = tempfile::tempdir().unwrap();
        for theme in themes {
            fs::write(
                dir.path().join(format!("{}.css", theme)),
                format!("body {{ /* {} */ }}", theme),
            )
            .unwrap();
        }
        let manager = ThemeManager::new(dir.path());
        (dir, manager)
    }

    #[test]
    fn test_shipped_themes_present() {
        let manager = ThemeManager::new(default_themes_dir());
        let themes = manager.list_themes();
        for expected in ["default", "dark", "light", "minimal", "professional"] {
            assert!(themes.contains(&expected.to_string()), "missing {}", expected);
        }
    }

    #[test]
    fn test_shipped_themes_style_page_breaks() {
        let manager = ThemeManager::new(default_themes_dir());
        for theme in manager.list_themes() {
            let css = manager.load_theme_css(&theme).unwrap();
            assert!(css.contains(".page-break"), "{} lacks .page-break", theme);
            assert!(css.contains("document-section-header"), "{} lacks section header", theme);
            assert!(css.contains("body"));
        }
    }

    #[test]
    fn test_list_themes_sorted_css_only() {
        let (dir, manager) = manager_with(&["zebra", "apple", "mango"]);
        fs::write(dir.path().join("notes.txt"), "x").unwrap();
        fs::create_dir(dir.path().join("folder.css")).unwrap();
        assert_eq!(manager.list_themes(), vec!["apple", "mango", "zebra"]);
    }

    #[test]
    fn test_list_themes_missing_dir() {
        let manager = ThemeManager::new("/definitely/not/a/themes/dir");
        assert!(manager.list_themes().is_empty());
    }

    #[test]
    fn test_validate_theme() {
        let (_dir, manager) = manager_with(&["default", "dark"]);
        assert!(manager.validate_theme("dark").is_ok());
        let err = manager.validate_theme("neon").unwrap_err();
        match err {
            Md2PdfError::ThemeNotFound { theme, available } => {
                assert_eq!(theme, "neon");
                assert_eq!(available, vec!["dark", "default"]);
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_load_css_theme() {
        let (_dir, manager) = manager_with(&["default"]);
        let css = manager.load_css(None, "default").unwrap();
        assert!(css.contains("default"));
    }

    #[test]
    fn test_load_css_custom_takes_precedence() {
        let (dir, manager) = manager_with(&["default"]);
        let custom = dir.path().join("custom.css");
        fs::write(&custom, "h1 { color: #0066cc; }").unwrap();
        let css = manager.load_css(Some(&custom), "default").unwrap();
        assert_eq!(css, "h1 { color: #0066cc; }");
    }

    #[test]
    fn test_load_css_custom_non_css_extension_still_loads() {
        let (dir, manager) = manager_with(&[]);
        let custom = dir.path().join("style.txt");
        fs::write(&custom, "p {}").unwrap();
        assert_eq!(manager.load_css(Some(&custom), "default").unwrap(), "p {}");
    }

    #[test]
    fn test_load_css_custom_missing() {
        let (dir, manager) = manager_with(&["default"]);
        let err = manager
            .load_css(Some(&dir.path().join("nope.css")), "default")
            .unwrap_err();
        assert!(matches!(err, Md2PdfError::CssNotFound(_)));
        assert!(err.to_string().contains("does not exist"));
    }

    #[test]
    fn test_load_css_custom_directory() {
        let (dir, manager) = manager_with(&["default"]);
        let err = manager.load_css(Some(dir.path()), "default").unwrap_err();
        assert!(err.to_string().contains("is not a file"));
    }

    #[test]
    fn test_load_css_missing_theme() {
        let (_dir, manager) = manager_with(&["default"]);
        let err = manager.load_css(None, "neon").unwrap_err();
        assert!(err.to_string().contains("Theme 'neon' not found."));
        assert!(err.to_string().contains("Available themes: default"));
    }
}
