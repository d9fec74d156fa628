//! Input validation, output path resolution and PDF preview.

use crate::config::{self, Platform};
use crate::error::{Md2PdfError, Result};
use log::{debug, warn};
use std::env;
use std::fs::{self, File};
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

pub fn validate_input_file(input: &Path) -> Result<PathBuf> {
    let shown = input.display();
    if !input.exists() {
        return Err(Md2PdfError::InvalidInput(format!(
            "Input file '{}' does not exist.",
            shown
        )));
    }
    if !input.is_file() {
        return Err(Md2PdfError::InvalidInput(format!("'{}' is not a file.", shown)));
    }

    if !has_markdown_extension(input) {
        warn!(
            "'{}' does not have a markdown extension (.md, .markdown, .txt)",
            shown
        );
    }

    if let Err(e) = File::open(input) {
        if e.kind() == ErrorKind::PermissionDenied {
            return Err(Md2PdfError::InvalidInput(format!(
                "No read permission for '{}'.",
                shown
            )));
        }
        return Err(Md2PdfError::InvalidInput(format!(
            "Cannot open '{}': {}",
            shown, e
        )));
    }

    Ok(input.to_path_buf())
}

pub fn has_markdown_extension(path: &Path) -> bool {
    let ext = match path.extension() {
        Some(ext) => format!(".{}", ext.to_string_lossy().to_lowercase()),
        None => return false,
    };
    config::SUPPORTED_MARKDOWN_EXTENSIONS.contains(&ext.as_str())
}

pub fn read_markdown_file(path: &Path) -> Result<String> {
    fs::read_to_string(path)
        .map_err(|e| Md2PdfError::FileOperation(format!("Error reading input file: {}", e)))
}

/// Pick where the PDF for `input` goes.
///
/// Without an explicit output the input's extension is swapped for `.pdf`.
/// Explicit outputs may not contain `..`, and relative ones must resolve
/// (after following symlinks) inside the current directory.
pub fn determine_output_path(input: &Path, output: Option<&Path>) -> Result<PathBuf> {
    let output = match output {
        Some(output) => output,
        None => return Ok(input.with_extension("pdf")),
    };
    let shown = output.display();

    if output.components().any(|c| c == Component::ParentDir) {
        return Err(Md2PdfError::InvalidInput(format!(
            "Invalid output path '{}': path traversal (..) is not allowed",
            shown
        )));
    }

    let cwd = env::current_dir().map_err(|e| {
        Md2PdfError::InvalidInput(format!(
            "Invalid output path '{}': cannot resolve path - {}",
            shown, e
        ))
    })?;
    let resolved = resolve_lenient(&cwd.join(output));

    if output.is_relative() {
        let root = cwd.canonicalize().unwrap_or(cwd);
        if !resolved.starts_with(&root) {
            return Err(Md2PdfError::InvalidInput(format!(
                "Invalid output path '{}': resolved path '{}' is outside current directory '{}'. \
                 Use an absolute path if you need to write outside the current directory.",
                shown,
                resolved.display(),
                root.display()
            )));
        }
    }

    debug!("Output path resolved to {}", resolved.display());
    Ok(resolved)
}

/// Canonicalize the longest existing prefix of `path` and re-append the rest,
/// so symlinks are followed even when the file itself does not exist yet.
pub fn resolve_lenient(path: &Path) -> PathBuf {
    let mut existing = path.to_path_buf();
    let mut tail: Vec<std::ffi::OsString> = Vec::new();

    loop {
        if let Ok(canonical) = existing.canonicalize() {
            let mut resolved = canonical;
            for part in tail.iter().rev() {
                resolved.push(part);
            }
            return resolved;
        }
        let name = existing.file_name().map(|n| n.to_os_string());
        let parent = existing.parent().map(Path::to_path_buf);
        match (name, parent) {
            (Some(name), Some(parent)) => {
                tail.push(name);
                existing = parent;
            }
            _ => return path.to_path_buf(),
        }
    }
}

/// Program and leading arguments used to open a file with the desktop's default viewer.
pub fn opener_for(platform: Platform) -> Option<(&'static str, &'static [&'static str])> {
    match platform {
        Platform::Windows => Some(("cmd", &["/C", "start", ""])),
        Platform::MacOs => Some(("open", &[])),
        Platform::Linux => Some(("xdg-open", &[])),
        Platform::Other => None,
    }
}

/// Open the PDF in the default viewer. Never fails; problems are logged.
pub fn preview_file(pdf: &Path) {
    preview_file_with(pdf, Platform::current(), config::PREVIEW_TIMEOUT)
}

pub fn preview_file_with(pdf: &Path, platform: Platform, timeout: Duration) {
    if !pdf.exists() {
        warn!("PDF file does not exist: {}", pdf.display());
        return;
    }
    if !pdf.is_file() {
        warn!("Path is not a file: {}", pdf.display());
        return;
    }

    let (program, args) = match opener_for(platform) {
        Some(opener) => opener,
        None => {
            warn!("Unable to open PDF on {} platform", env::consts::OS);
            return;
        }
    };

    let mut child = match Command::new(program)
        .args(args)
        .arg(pdf)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
    {
        Ok(child) => child,
        Err(e) => {
            warn!("Could not open PDF: {}", e);
            return;
        }
    };

    let started = Instant::now();
    loop {
        match child.try_wait() {
            Ok(Some(status)) if status.success() => return,
            Ok(Some(status)) => {
                warn!("Could not open PDF: {} exited with {}", program, status);
                return;
            }
            Ok(None) if started.elapsed() >= timeout => {
                let _ = child.kill();
                warn!("Timeout opening PDF: {}", pdf.display());
                return;
            }
            Ok(None) => thread::sleep(Duration::from_millis(50)),
            Err(e) => {
                warn!("Could not open PDF: {}", e);
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_input_file_success() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.md");
        fs::write(&path, "# Test").unwrap();
        assert_eq!(validate_input_file(&path).unwrap(), path);
    }

    #[test]
    fn test_validate_input_file_nonexistent() {
        let err = validate_input_file(Path::new("nonexistent_file.md")).unwrap_err();
        assert!(matches!(err, Md2PdfError::InvalidInput(_)));
        assert!(err.to_string().contains("does not exist"));
    }

    #[test]
    fn test_validate_input_file_directory() {
        let dir = tempfile::tempdir().unwrap();
        let err = validate_input_file(dir.path()).unwrap_err();
        assert!(err.to_string().contains("is not a file"));
    }

    #[test]
    fn test_validate_input_file_accepts_other_extensions() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.rst");
        fs::write(&path, "text").unwrap();
        assert!(validate_input_file(&path).is_ok());
    }

    #[test]
    fn test_has_markdown_extension() {
        assert!(has_markdown_extension(Path::new("a.md")));
        assert!(has_markdown_extension(Path::new("a.MARKDOWN")));
        assert!(has_markdown_extension(Path::new("a.txt")));
        assert!(!has_markdown_extension(Path::new("a.html")));
        assert!(!has_markdown_extension(Path::new("README")));
    }

    #[test]
    fn test_read_markdown_file_utf8() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("utf8.md");
        let content = "# Ünïcödé\n\n日本語 — emoji 🎉";
        fs::write(&path, content).unwrap();
        assert_eq!(read_markdown_file(&path).unwrap(), content);
    }

    #[test]
    fn test_read_markdown_file_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.md");
        fs::write(&path, "").unwrap();
        assert_eq!(read_markdown_file(&path).unwrap(), "");
    }

    #[test]
    fn test_read_markdown_file_invalid_utf8() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.md");
        fs::write(&path, [0xff, 0xfe, 0xfd]).unwrap();
        let err = read_markdown_file(&path).unwrap_err();
        assert!(matches!(err, Md2PdfError::FileOperation(_)));
        assert!(err.to_string().starts_with("Error reading input file"));
    }

    #[test]
    fn test_determine_output_path_no_arg() {
        let out = determine_output_path(Path::new("/docs/report.md"), None).unwrap();
        assert_eq!(out, PathBuf::from("/docs/report.pdf"));
    }

    #[test]
    fn test_determine_output_path_absolute_arg() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("custom.pdf");
        let out = determine_output_path(Path::new("in.md"), Some(&target)).unwrap();
        assert_eq!(out, dir.path().canonicalize().unwrap().join("custom.pdf"));
    }

    #[test]
    fn test_determine_output_path_relative_inside_cwd() {
        let out = determine_output_path(Path::new("in.md"), Some(Path::new("out/doc.pdf"))).unwrap();
        let cwd = env::current_dir().unwrap().canonicalize().unwrap();
        assert_eq!(out, cwd.join("out").join("doc.pdf"));
    }

    #[test]
    fn test_determine_output_path_rejects_traversal() {
        let err = determine_output_path(Path::new("in.md"), Some(Path::new("../escape.pdf")))
            .unwrap_err();
        assert!(err.to_string().contains("path traversal"));

        let err = determine_output_path(Path::new("in.md"), Some(Path::new("a/../../b.pdf")))
            .unwrap_err();
        assert!(err.to_string().contains("path traversal"));
    }

    #[cfg(unix)]
    #[test]
    fn test_determine_output_path_rejects_symlink_escape() {
        let outside = tempfile::tempdir().unwrap();
        let cwd = env::current_dir().unwrap();
        let link_name = format!("md2pdf-test-link-{}", std::process::id());
        let link = cwd.join(&link_name);
        std::os::unix::fs::symlink(outside.path(), &link).unwrap();

        let result = determine_output_path(
            Path::new("in.md"),
            Some(&PathBuf::from(&link_name).join("x.pdf")),
        );
        fs::remove_file(&link).unwrap();

        let err = result.unwrap_err();
        assert!(err.to_string().contains("outside current directory"));
    }

    #[test]
    fn test_resolve_lenient_nonexistent_tail() {
        let dir = tempfile::tempdir().unwrap();
        let resolved = resolve_lenient(&dir.path().join("a").join("b.pdf"));
        assert_eq!(resolved, dir.path().canonicalize().unwrap().join("a").join("b.pdf"));
    }

    #[test]
    fn test_opener_for_platforms() {
        assert_eq!(opener_for(Platform::MacOs).unwrap().0, "open");
        assert_eq!(opener_for(Platform::Linux).unwrap().0, "xdg-open");
        assert_eq!(opener_for(Platform::Windows).unwrap().0, "cmd");
        assert!(opener_for(Platform::Other).is_none());
    }

    #[test]
    fn test_preview_missing_file_does_not_panic() {
        preview_file_with(
            Path::new("/no/such/file.pdf"),
            Platform::Linux,
            Duration::from_millis(10),
        );
    }

    #[test]
    fn test_preview_unknown_platform_does_not_spawn() {
        let dir = tempfile::tempdir().unwrap();
        let pdf = dir.path().join("doc.pdf");
        fs::write(&pdf, "%PDF-1.4").unwrap();
        preview_file_with(&pdf, Platform::Other, Duration::from_millis(10));
    }
}
