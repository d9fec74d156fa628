//! # md2pdf
//!
//! Convert Markdown documents to styled PDFs through `wkhtmltopdf`.
//!
//! - **Single**: one Markdown file to one PDF
//! - **Batch**: many files, each to its own PDF, failures collected
//! - **Merge**: many files combined into one PDF with section headers and
//!   optional page breaks
//! - **Themes**: CSS themes, custom stylesheets and an interactive theme
//!   builder with WCAG contrast checks
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use md2pdf::config::Settings;
//! use md2pdf::convert::{ConvertOptions, Converter};
//! use md2pdf::pdf_engine::PdfEngine;
//! use std::path::Path;
//!
//! let options = ConvertOptions::new(Settings::default()).with_theme("dark");
//! let converter = Converter::setup(options, PdfEngine::locate)?;
//! converter.convert_single(Path::new("README.md"), None, false)?;
//! # Ok::<(), md2pdf::error::Md2PdfError>(())
//! ```
//!
//! Rendering is behind the [`pdf_engine::Renderer`] trait, so the Markdown and
//! HTML stages can be used without `wkhtmltopdf` installed:
//!
//! ```rust
//! use md2pdf::markdown;
//!
//! let body = markdown::markdown_to_html("# Title\n\n<!-- pagebreak -->");
//! let body = markdown::process_page_breaks(&body);
//! let html = markdown::build_html_document("Title", &body, "body {}");
//! assert!(html.contains("page-break"));
//! ```
//!
//! ## Modules
//!
//! - [`config`]: constants and layered settings
//! - [`error`]: the crate error type
//! - [`markdown`]: Markdown to HTML, page breaks, document assembly
//! - [`highlight`]: code block syntax highlighting
//! - [`theme`]: theme discovery and CSS loading
//! - [`theme_builder`]: interactive theme wizard
//! - [`color`]: color parsing and WCAG contrast
//! - [`file_ops`]: input validation, output paths, preview
//! - [`pdf_engine`]: `wkhtmltopdf` discovery and invocation
//! - [`convert`]: single, batch and merge orchestration

pub mod color;
pub mod config;
pub mod convert;
pub mod error;
pub mod file_ops;
pub mod highlight;
pub mod markdown;
pub mod pdf_engine;
pub mod theme;
pub mod theme_builder;

pub use convert::{BatchSummary, ConvertOptions, Converter, MergeSummary};
pub use error::{Md2PdfError, Result};
