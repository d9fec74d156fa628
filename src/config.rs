//! Constants and layered settings.
//!
//! Settings are resolved with the following precedence:
//! 1. Command-line flags (applied by the binary)
//! 2. Environment variables (`MD2PDF_THEMES_DIR`, `MD2PDF_WKHTMLTOPDF`, `MD2PDF_THEME`)
//! 3. A JSON config file (`MD2PDF_CONFIG`, or `.md2pdf.json` in the working directory)
//! 4. Built-in defaults

use crate::error::{Md2PdfError, Result};
use log::debug;
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub const THEMES_DIR_NAME: &str = "themes";
pub const DEFAULT_THEME: &str = "default";
pub const DEFAULT_MERGED_OUTPUT: &str = "merged_output.pdf";
pub const MERGED_DOCUMENT_TITLE: &str = "Merged Document";
pub const CONFIG_FILE_NAME: &str = ".md2pdf.json";

pub const SUPPORTED_MARKDOWN_EXTENSIONS: &[&str] = &[".md", ".markdown", ".txt"];

pub const PREVIEW_TIMEOUT: Duration = Duration::from_secs(10);

// Percentages tried when nudging a color towards an accessible contrast.
pub const COLOR_ADJUSTMENT_START: u32 = 5;
pub const COLOR_ADJUSTMENT_END: u32 = 100;
pub const COLOR_ADJUSTMENT_STEP: u32 = 5;

pub const WCAG_AA_RATIO: f64 = 4.5;
pub const WCAG_AAA_RATIO: f64 = 7.0;

pub const DEFAULT_PAGE_SIZE: &str = "A4";
pub const DEFAULT_HIGHLIGHT_THEME: &str = "InspiredGitHub";

/// Options passed to wkhtmltopdf on every render. `None` marks a bare flag.
pub const PDF_OPTIONS: &[(&str, Option<&str>)] = &[
    ("--enable-local-file-access", None),
    ("--encoding", Some("UTF-8")),
    ("--quiet", None),
    ("--margin-top", Some("0mm")),
    ("--margin-right", Some("0mm")),
    ("--margin-bottom", Some("0mm")),
    ("--margin-left", Some("0mm")),
    ("--background", None),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Windows,
    MacOs,
    Linux,
    Other,
}

impl Platform {
    pub fn current() -> Self {
        match env::consts::OS {
            "windows" => Platform::Windows,
            "macos" => Platform::MacOs,
            "linux" => Platform::Linux,
            _ => Platform::Other,
        }
    }
}

pub fn wkhtmltopdf_paths(platform: Platform) -> &'static [&'static str] {
    match platform {
        Platform::Windows => &[
            "C:/Program Files/wkhtmltopdf/bin/wkhtmltopdf.exe",
            "C:/Program Files (x86)/wkhtmltopdf/bin/wkhtmltopdf.exe",
        ],
        Platform::MacOs => &[
            "/usr/local/bin/wkhtmltopdf",
            "/opt/homebrew/bin/wkhtmltopdf",
            "/usr/bin/wkhtmltopdf",
        ],
        Platform::Linux => &[
            "/usr/bin/wkhtmltopdf",
            "/usr/local/bin/wkhtmltopdf",
            "/bin/wkhtmltopdf",
        ],
        Platform::Other => &[],
    }
}

pub fn installation_steps(platform: Platform) -> &'static [&'static str] {
    match platform {
        Platform::Windows => &[
            "  - Download from: https://wkhtmltopdf.org/downloads.html",
            "  - Install to default location (C:/Program Files/wkhtmltopdf/)",
            "  - Or add wkhtmltopdf to your system PATH",
        ],
        Platform::MacOs => &[
            "  - Install via Homebrew: brew install wkhtmltopdf",
            "  - Or download from: https://wkhtmltopdf.org/downloads.html",
        ],
        Platform::Linux => &[
            "  - Ubuntu/Debian: sudo apt-get install wkhtmltopdf",
            "  - Fedora: sudo dnf install wkhtmltopdf",
            "  - Or download from: https://wkhtmltopdf.org/downloads.html",
        ],
        Platform::Other => &["  - Download from: https://wkhtmltopdf.org/downloads.html"],
    }
}

/// Values read from the JSON config file. Every field is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileSettings {
    pub themes_dir: Option<PathBuf>,
    pub theme: Option<String>,
    pub engine_path: Option<PathBuf>,
    pub page_size: Option<String>,
    pub highlight_theme: Option<String>,
}

/// Fully resolved settings.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub themes_dir: PathBuf,
    pub theme: String,
    pub engine_path: Option<PathBuf>,
    pub page_size: String,
    pub highlight_theme: String,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            themes_dir: default_themes_dir(),
            theme: DEFAULT_THEME.to_string(),
            engine_path: None,
            page_size: DEFAULT_PAGE_SIZE.to_string(),
            highlight_theme: DEFAULT_HIGHLIGHT_THEME.to_string(),
        }
    }
}

pub fn default_themes_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join(THEMES_DIR_NAME)
}

impl Settings {
    /// Load settings from the config file (explicit path first) and the environment.
    pub fn load(explicit_config: Option<&Path>) -> Result<Self> {
        let mut settings = Settings::default();

        let config_path = explicit_config
            .map(Path::to_path_buf)
            .or_else(|| env::var_os("MD2PDF_CONFIG").map(PathBuf::from))
            .or_else(|| {
                let local = PathBuf::from(CONFIG_FILE_NAME);
                local.is_file().then_some(local)
            });

        if let Some(path) = config_path {
            debug!("Loading configuration from {}", path.display());
            let file = FileSettings::from_path(&path)?;
            settings.apply_file(file);
        }

        settings.apply_env(|key| env::var(key).ok());
        Ok(settings)
    }

    pub fn apply_file(&mut self, file: FileSettings) {
        if let Some(dir) = file.themes_dir {
            self.themes_dir = dir;
        }
        if let Some(theme) = file.theme {
            self.theme = theme;
        }
        if file.engine_path.is_some() {
            self.engine_path = file.engine_path;
        }
        if let Some(size) = file.page_size {
            self.page_size = size;
        }
        if let Some(name) = file.highlight_theme {
            self.highlight_theme = name;
        }
    }

    /// Apply environment overrides through a lookup function so tests need not
    /// touch the process environment.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dir) = lookup("MD2PDF_THEMES_DIR").filter(|v| !v.is_empty()) {
            self.themes_dir = PathBuf::from(dir);
        }
        if let Some(path) = lookup("MD2PDF_WKHTMLTOPDF").filter(|v| !v.is_empty()) {
            self.engine_path = Some(PathBuf::from(path));
        }
        if let Some(theme) = lookup("MD2PDF_THEME").filter(|v| !v.is_empty()) {
            self.theme = theme;
        }
    }
}

impl FileSettings {
    pub fn from_path(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            Md2PdfError::Config(format!("cannot read '{}': {}", path.display(), e))
        })?;
        Self::from_json(&content)
            .map_err(|e| Md2PdfError::Config(format!("'{}': {}", path.display(), e)))
    }

    pub fn from_json(content: &str) -> std::result::Result<Self, serde_json::Error> {
        serde_json::from_str(content)
    }
}
