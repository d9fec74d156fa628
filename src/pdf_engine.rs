//! HTML to PDF rendering through the external `wkhtmltopdf` binary.

use crate::config::{self, Platform, Settings};
use crate::error::{Md2PdfError, Result};
use log::debug;
use std::env;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// Anything that can turn a complete HTML document into a PDF file.
pub trait Renderer {
    fn render(&self, html: &str, output: &Path) -> Result<()>;
}

#[derive(Debug, Clone)]
pub struct PdfEngine {
    binary: PathBuf,
    page_size: String,
}

/// Look for wkhtmltopdf on `PATH`, then in the platform's usual install locations.
pub fn find_wkhtmltopdf() -> Option<PathBuf> {
    if let Some(found) = search_path("wkhtmltopdf", env::var_os("PATH").as_deref()) {
        return Some(found);
    }

    let platform = Platform::current();
    let mut candidates: Vec<PathBuf> = config::wkhtmltopdf_paths(platform)
        .iter()
        .map(PathBuf::from)
        .collect();

    if platform == Platform::Windows {
        if let Some(home) = env::var_os("USERPROFILE") {
            candidates.push(
                PathBuf::from(home).join("AppData/Local/Programs/wkhtmltopdf/bin/wkhtmltopdf.exe"),
            );
        }
    }

    candidates.into_iter().find(|p| p.is_file())
}

/// Search a `PATH`-style list for an executable.
pub fn search_path(name: &str, path_var: Option<&std::ffi::OsStr>) -> Option<PathBuf> {
    let path_var = path_var?;
    let names: Vec<String> = if cfg!(windows) {
        vec![format!("{}.exe", name), name.to_string()]
    } else {
        vec![name.to_string()]
    };

    env::split_paths(path_var)
        .flat_map(|dir| names.iter().map(move |n| dir.join(n)))
        .find(|candidate| candidate.is_file())
}

pub fn installation_instructions() -> String {
    installation_instructions_for(Platform::current())
}

pub fn installation_instructions_for(platform: Platform) -> String {
    let mut lines = vec![
        "wkhtmltopdf is required for PDF generation but was not found on your system.",
        "",
        "Installation instructions:",
    ];
    lines.extend_from_slice(config::installation_steps(platform));
    lines.join("\n")
}

impl PdfEngine {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        PdfEngine {
            binary: binary.into(),
            page_size: config::DEFAULT_PAGE_SIZE.to_string(),
        }
    }

    pub fn with_page_size(mut self, page_size: impl Into<String>) -> Self {
        self.page_size = page_size.into();
        self
    }

    /// Resolve the binary from settings, falling back to auto-detection.
    pub fn locate(settings: &Settings) -> Result<Self> {
        let binary = match &settings.engine_path {
            Some(path) if path.is_file() => Some(path.clone()),
            Some(path) => {
                log::warn!(
                    "Configured wkhtmltopdf path '{}' is not a file, searching instead",
                    path.display()
                );
                find_wkhtmltopdf()
            }
            None => find_wkhtmltopdf(),
        };

        match binary {
            Some(binary) => {
                debug!("Using wkhtmltopdf at {}", binary.display());
                Ok(PdfEngine::new(binary).with_page_size(settings.page_size.clone()))
            }
            None => Err(Md2PdfError::EngineNotFound(installation_instructions())),
        }
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }

    /// Command-line arguments for a render, reading HTML from stdin.
    pub fn arguments(&self, output: &Path) -> Vec<String> {
        let mut args = Vec::new();
        for (flag, value) in config::PDF_OPTIONS {
            args.push(flag.to_string());
            if let Some(value) = value {
                args.push(value.to_string());
            }
        }
        args.push("--page-size".to_string());
        args.push(self.page_size.clone());
        args.push("-".to_string());
        args.push(output.to_string_lossy().into_owned());
        args
    }
}

impl Renderer for PdfEngine {
    fn render(&self, html: &str, output: &Path) -> Result<()> {
        let existed = output.exists();

        // Surface unwritable destinations before wkhtmltopdf hides them behind its own exit code.
        // An existing PDF is left untouched until the engine overwrites it.
        OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(output)
            .map_err(|e| write_error(&e))?;

        let result = self.run_engine(html, output);
        if result.is_err() && !existed {
            if let Err(e) = fs::remove_file(output) {
                debug!("Could not remove '{}': {}", output.display(), e);
            }
        }
        result
    }
}

impl PdfEngine {
    fn run_engine(&self, html: &str, output: &Path) -> Result<()> {
        let mut child = Command::new(&self.binary)
            .args(self.arguments(output))
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| generation_error(&e.to_string()))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(html.as_bytes())
                .map_err(|e| generation_error(&e.to_string()))?;
        }

        let result = child
            .wait_with_output()
            .map_err(|e| generation_error(&e.to_string()))?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            let detail = if stderr.trim().is_empty() {
                format!("wkhtmltopdf exited with {}", result.status)
            } else {
                stderr.trim().to_string()
            };
            return Err(generation_error(&detail));
        }
        Ok(())
    }
}

fn write_error(err: &std::io::Error) -> Md2PdfError {
    Md2PdfError::Conversion(format!(
        "Error writing PDF file: {}\nCheck that you have write permissions for the output directory.",
        err
    ))
}

fn generation_error(detail: &str) -> Md2PdfError {
    let mut msg = format!("Error generating PDF: {}\n\n", detail);
    msg.push_str("Troubleshooting tips:\n");
    msg.push_str("1. Check file permissions - ensure you can write to the output directory\n");
    msg.push_str("2. Try using a simpler output filename without special characters or spaces\n");
    msg.push_str("   - Windows: Wrap paths with spaces in quotes\n");
    msg.push_str("   - Example: md2pdf input.md -on \"My Document.pdf\"\n");
    msg.push_str("3. Ensure wkhtmltopdf is properly installed and up-to-date\n");
    msg.push_str("   - Run 'wkhtmltopdf --version' to verify installation\n");
    msg.push_str("4. Try removing images or complex formatting from the markdown\n");
    msg.push_str("5. Check if the output path is valid and accessible");
    Md2PdfError::Conversion(msg)
}
