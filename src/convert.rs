//! Single, batch and merge conversion.
//!
//! A [`Converter`] is set up once (theme check, renderer lookup, stylesheet
//! load) and then reused for every file of a run.

use crate::config::{self, Settings};
use crate::error::{Md2PdfError, Result};
use crate::file_ops;
use crate::markdown;
use crate::pdf_engine::Renderer;
use crate::theme::ThemeManager;
use log::{debug, info, warn};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default)]
pub struct ConvertOptions {
    pub custom_css: Option<PathBuf>,
    pub theme: String,
    /// The theme was asked for on the command line rather than inherited
    /// from settings.
    pub theme_requested: bool,
    pub settings: Settings,
}

impl ConvertOptions {
    pub fn new(settings: Settings) -> Self {
        ConvertOptions {
            custom_css: None,
            theme: settings.theme.clone(),
            theme_requested: false,
            settings,
        }
    }

    pub fn with_custom_css(mut self, css: Option<PathBuf>) -> Self {
        self.custom_css = css;
        self
    }

    pub fn with_theme(mut self, theme: impl Into<String>) -> Self {
        self.theme = theme.into();
        self.theme_requested = true;
        self
    }

    /// A custom stylesheet and an explicitly requested theme were both given.
    pub fn css_overrides_theme(&self) -> bool {
        self.custom_css.is_some() && self.theme_requested
    }
}

pub struct Converter<R> {
    renderer: R,
    css: String,
    settings: Settings,
}

#[derive(Debug, Default)]
pub struct BatchSummary {
    pub total: usize,
    pub converted: Vec<(PathBuf, PathBuf)>,
    pub failed: Vec<(PathBuf, String)>,
}

impl BatchSummary {
    pub fn all_failed(&self) -> bool {
        self.converted.is_empty()
    }
}

impl fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "--- Batch Conversion Summary ---")?;
        writeln!(f, "Total files: {}", self.total)?;
        writeln!(f, "Successful: {}", self.converted.len())?;
        write!(f, "Failed: {}", self.failed.len())?;
        write_failed(f, &self.failed)
    }
}

#[derive(Debug)]
pub struct MergeSummary {
    pub total: usize,
    pub merged: Vec<PathBuf>,
    pub failed: Vec<(PathBuf, String)>,
    pub output: PathBuf,
}

impl fmt::Display for MergeSummary {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "--- Merge Summary ---")?;
        writeln!(f, "Total files: {}", self.total)?;
        writeln!(f, "Successfully merged: {}", self.merged.len())?;
        write!(f, "Failed: {}", self.failed.len())?;
        write_failed(f, &self.failed)
    }
}

fn write_failed(f: &mut fmt::Formatter, failed: &[(PathBuf, String)]) -> fmt::Result {
    if failed.is_empty() {
        return Ok(());
    }
    write!(f, "\n\nFailed files:")?;
    for (input, error) in failed {
        write!(f, "\n  - {}: {}", input.display(), error)?;
    }
    Ok(())
}

impl<R: Renderer> Converter<R> {
    pub fn new(renderer: R, css: String, settings: Settings) -> Self {
        Converter {
            renderer,
            css,
            settings,
        }
    }

    /// Validate the theme, build the renderer and load the stylesheet.
    pub fn setup<F>(options: ConvertOptions, renderer_factory: F) -> Result<Self>
    where
        F: FnOnce(&Settings) -> Result<R>,
    {
        let themes = ThemeManager::from_settings(&options.settings);

        match &options.custom_css {
            Some(css) if options.css_overrides_theme() => warn!(
                "Both --css '{}' and --theme '{}' given; using the custom CSS",
                css.display(),
                options.theme
            ),
            Some(_) => {}
            None => themes.validate_theme(&options.theme)?,
        }

        let renderer = renderer_factory(&options.settings)?;
        let css = themes.load_css(options.custom_css.as_deref(), &options.theme)?;
        debug!("Loaded {} bytes of CSS", css.len());

        Ok(Converter::new(renderer, css, options.settings))
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn css(&self) -> &str {
        &self.css
    }

    /// Validate and read one input, returning its path and HTML body.
    pub fn process_file(&self, input: &Path) -> Result<(PathBuf, String)> {
        let path = file_ops::validate_input_file(input)?;
        let content = file_ops::read_markdown_file(&path)?;
        let html = markdown::markdown_to_html_with_theme(&content, &self.settings.highlight_theme);
        Ok((path, markdown::process_page_breaks(&html)))
    }

    fn render_document(&self, title: &str, body: &str, output: &Path) -> Result<()> {
        let html = markdown::build_html_document(title, body, &self.css);
        info!("Rendering '{}'", output.display());
        self.renderer.render(&html, output)
    }

    pub fn convert_single(
        &self,
        input: &Path,
        output: Option<&Path>,
        preview: bool,
    ) -> Result<PathBuf> {
        let (path, body) = self.process_file(input)?;
        let output_path = file_ops::determine_output_path(&path, output)?;

        self.render_document(&file_stem(&path), &body, &output_path)?;
        println!(
            "Successfully converted '{}' to '{}'",
            input.display(),
            output_path.display()
        );

        if preview {
            file_ops::preview_file(&output_path);
        }
        Ok(output_path)
    }

    /// Convert each input to its own PDF. Per-file failures are collected,
    /// not returned.
    pub fn convert_batch(
        &self,
        inputs: &[PathBuf],
        output_dir: Option<&Path>,
        preview: bool,
    ) -> Result<BatchSummary> {
        if inputs.is_empty() {
            return Err(Md2PdfError::InvalidInput(
                "No input files specified for batch conversion.".into(),
            ));
        }

        if let Some(dir) = output_dir {
            fs::create_dir_all(dir).map_err(|e| {
                Md2PdfError::FileOperation(format!(
                    "Cannot create output directory '{}': {}",
                    dir.display(),
                    e
                ))
            })?;
        }

        let mut summary = BatchSummary {
            total: inputs.len(),
            ..Default::default()
        };

        for input in inputs {
            match self.convert_one_of_batch(input, output_dir) {
                Ok(output) => {
                    println!(
                        "[OK] Converted '{}' to '{}'",
                        input.display(),
                        output.display()
                    );
                    summary.converted.push((input.clone(), output));
                }
                Err(e) => {
                    eprintln!("[FAILED] '{}': {}", input.display(), e);
                    summary.failed.push((input.clone(), e.to_string()));
                }
            }
        }

        println!("\n{}", summary);

        if preview {
            if let Some((_, first)) = summary.converted.first() {
                println!("\nPreviewing first file: {}", first.display());
                file_ops::preview_file(first);
            }
        }
        Ok(summary)
    }

    fn convert_one_of_batch(&self, input: &Path, output_dir: Option<&Path>) -> Result<PathBuf> {
        let (path, body) = self.process_file(input)?;
        let stem = file_stem(&path);
        let output = match output_dir {
            Some(dir) => dir.join(format!("{}.pdf", stem)),
            None => file_ops::determine_output_path(&path, None)?,
        };
        self.render_document(&stem, &body, &output)?;
        Ok(output)
    }

    /// Combine all inputs into a single PDF, one section per file.
    pub fn convert_merge(
        &self,
        inputs: &[PathBuf],
        output: Option<&Path>,
        auto_break: bool,
        preview: bool,
    ) -> Result<MergeSummary> {
        if inputs.is_empty() {
            return Err(Md2PdfError::InvalidInput(
                "No input files specified for merge.".into(),
            ));
        }
        if inputs.len() < 2 {
            warn!("Merge mode requires at least 2 files. Use single file mode for one file.");
        }

        println!("Merging {} files into a single PDF...", inputs.len());

        let mut sections = Vec::with_capacity(inputs.len());
        let mut merged = Vec::with_capacity(inputs.len());
        let mut failed = Vec::new();

        for input in inputs {
            match self.process_file(input) {
                Ok((path, body)) => {
                    let name = path
                        .file_name()
                        .map(|n| n.to_string_lossy().into_owned())
                        .unwrap_or_default();
                    sections.push((name, body));
                    merged.push(input.clone());
                    println!("[OK] Processed '{}'", input.display());
                }
                Err(e) => {
                    eprintln!("[FAILED] '{}': {}", input.display(), e);
                    failed.push((input.clone(), e.to_string()));
                }
            }
        }

        if sections.is_empty() {
            return Err(Md2PdfError::InvalidInput(
                "No files were successfully processed. Cannot create PDF.".into(),
            ));
        }

        let output_path = match output {
            Some(output) => file_ops::determine_output_path(
                Path::new(config::DEFAULT_MERGED_OUTPUT),
                Some(output),
            )?,
            None => PathBuf::from(config::DEFAULT_MERGED_OUTPUT),
        };

        let body = markdown::merge_html_bodies(&sections, auto_break);
        self.render_document(config::MERGED_DOCUMENT_TITLE, &body, &output_path)?;

        let summary = MergeSummary {
            total: inputs.len(),
            merged,
            failed,
            output: output_path,
        };
        println!("\n{}", summary);
        println!("\nMerged PDF created: '{}'", summary.output.display());

        if preview {
            file_ops::preview_file(&summary.output);
        }
        Ok(summary)
    }
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}
