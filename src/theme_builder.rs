//! Interactive wizard that authors a new CSS theme.
//!
//! Every color the reader will see as text is checked against the background
//! for WCAG AA contrast before it is accepted.

use crate::color::{self, Rgb};
use crate::config::WCAG_AA_RATIO;
use crate::error::{Md2PdfError, Result};
use crate::theme::ThemeManager;
use std::fs;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq)]
pub struct ThemeProperties {
    pub name: String,
    pub background_color: String,
    pub text_color: String,
    pub font_family: String,
    pub body_text_size: String,
    pub h1_color: String,
    pub h2_h6_color: String,
    pub accent_color: String,
    pub code_bg_color: String,
    pub table_header_bg: String,
}

impl ThemeProperties {
    /// The text-like colors that must stay readable on the background.
    fn foreground_colors(&self) -> [(&'static str, &str); 4] {
        [
            ("text", &self.text_color),
            ("H1", &self.h1_color),
            ("H2-H6", &self.h2_h6_color),
            ("links", &self.accent_color),
        ]
    }

    pub fn all_accessible(&self) -> Result<bool> {
        for (_, color) in self.foreground_colors() {
            let ratio = color::contrast_ratio(color, &self.background_color)?;
            if !color::meets_wcag_aa(ratio) {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

pub fn validate_theme_name(name: &str, existing: &[String]) -> Result<()> {
    if name.is_empty() {
        return Err(Md2PdfError::InvalidInput("Theme name cannot be empty".into()));
    }
    if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') {
        return Err(Md2PdfError::InvalidInput(
            "Theme name can only contain letters, numbers, hyphens, and underscores".into(),
        ));
    }
    if existing.iter().any(|t| t == name) {
        return Err(Md2PdfError::InvalidInput(format!(
            "Theme '{}' already exists. Choose a different name or delete the existing theme.",
            name
        )));
    }
    Ok(())
}

pub fn validate_color_input(input: &str) -> Result<()> {
    color::parse_color(input).map(|_| ())
}

/// Accept `11`, `11pt`, `16.5pt`; reject zero, negatives, other units and
/// anything over 100pt.
pub fn validate_font_size(input: &str) -> Result<()> {
    let trimmed = input.trim();
    let number = trimmed.strip_suffix("pt").unwrap_or(trimmed);
    let invalid = |reason: &str| {
        Md2PdfError::InvalidInput(format!(
            "Invalid font size: '{}'. {}Use a number (e.g., 11) or with 'pt' (e.g., 11pt)",
            trimmed, reason
        ))
    };

    let value: f64 = number.trim().parse().map_err(|_| invalid(""))?;
    if !value.is_finite() || value <= 0.0 {
        return Err(invalid("Font size must be positive. "));
    }
    if value > 100.0 {
        return Err(invalid("Font size seems too large (max 100pt). "));
    }
    Ok(())
}

pub fn generate_css(props: &ThemeProperties) -> Result<String> {
    let hover_color = color::darken(&props.accent_color, 15.0)?;
    let table_alt_row = color::lighten(&props.background_color, 5.0)?;
    let code_border = color::darken(&props.code_bg_color, 10.0)?;

    let ThemeProperties {
        name,
        background_color,
        text_color,
        font_family,
        body_text_size,
        h1_color,
        h2_h6_color,
        accent_color,
        code_bg_color,
        table_header_bg,
    } = props;

    Ok(format!(
        r#"/* Theme: {name} */
/* Generated by md2pdf Interactive Theme Builder */

@page {{
    size: A4;
    margin: 0;
}}

body {{
    font-family: {font_family};
    font-size: {body_text_size};
    line-height: 1.6;
    color: {text_color};
    background-color: {background_color};
    padding: 2cm;
}}

h1,
h2,
h3,
h4,
h5,
h6 {{
    margin-top: 1.5em;
    margin-bottom: 0.5em;
    page-break-after: avoid;
}}

h1 {{
    font-size: 32pt;
    color: {h1_color};
    background: {code_bg_color};
    padding: 20px;
    border-radius: 10px;
    text-align: center;
    font-weight: 700;
    border-left: 5px solid {accent_color};
}}

h1.document-section-header {{
    font-size: 28pt;
    color: {h1_color};
    background: none;
    border: none;
    padding: 20px;
    text-align: right;
    font-weight: 600;
}}

h2 {{
    font-size: 24pt;
    color: {h2_h6_color};
    background: {code_bg_color};
    padding: 15px;
    border-radius: 8px;
    border-left: 4px solid {accent_color};
}}

h3 {{
    font-size: 18pt;
    color: {h2_h6_color};
    background: {code_bg_color};
    padding: 10px;
    border-radius: 5px;
    font-weight: 600;
}}

h4 {{
    font-size: 16pt;
    color: {h2_h6_color};
    font-weight: 600;
}}

h5 {{
    font-size: 14pt;
    color: {h2_h6_color};
    font-weight: 600;
}}

h6 {{
    font-size: 12pt;
    color: {h2_h6_color};
    font-weight: 600;
}}

p {{
    margin: 10px 0;
    font-size: {body_text_size};
}}

ul,
ol {{
    padding: 0 0 0 2em;
    margin: 10px 0;
    font-size: {body_text_size};
    line-height: 1.6;
}}

li {{
    margin: 5px 0;
}}

table {{
    border-collapse: collapse;
    width: 100%;
    margin: 20px 0;
    font-size: 10pt;
}}

th {{
    background: {table_header_bg};
    color: white;
    padding: 14px;
    text-align: left;
    font-weight: 600;
}}

td {{
    padding: 12px;
    border: 1px solid {code_border};
}}

tr:nth-child(even) td {{
    background-color: {table_alt_row};
}}

code {{
    background: {code_bg_color};
    padding: 4px 8px;
    border-radius: 3px;
    font-family: 'Courier New', monospace;
    font-size: 10pt;
    border: 1px solid {code_border};
}}

pre {{
    background: {code_bg_color};
    border: 1px solid {code_border};
    border-left: 5px solid {accent_color};
    border-radius: 5px;
    padding: 18px;
    margin: 15px 0;
    font-size: 10pt;
    white-space: pre-wrap;
}}

pre code {{
    background: none;
    padding: 0;
    border: none;
}}

blockquote {{
    border-left: 5px solid {accent_color};
    margin: 15px 0;
    font-style: italic;
    background: {code_bg_color};
    padding: 18px 18px 18px 2em;
    border-radius: 5px;
}}

a {{
    color: {accent_color};
    text-decoration: none;
    font-weight: 500;
}}

a:hover {{
    color: {hover_color};
    text-decoration: underline;
}}

hr {{
    border: none;
    height: 2px;
    background: {accent_color};
    margin: 25px 0;
}}

img {{
    max-width: 100%;
    height: auto;
    border-radius: 8px;
    border: 2px solid {code_border};
}}

.page-break {{
    page-break-after: always;
    break-after: page;
    height: 0;
    margin: 0;
    padding: 0;
    border: none;
}}
"#
    ))
}

pub fn save_theme(themes_dir: &Path, name: &str, css: &str) -> Result<PathBuf> {
    let path = themes_dir.join(format!("{}.css", name));
    fs::create_dir_all(themes_dir)
        .and_then(|_| fs::write(&path, css))
        .map_err(|e| Md2PdfError::FileOperation(format!("Failed to save theme: {}", e)))?;
    Ok(path)
}

type Validator = fn(&str) -> Result<()>;

pub struct ThemeWizard<R, W> {
    input: R,
    output: W,
    themes: ThemeManager,
}

impl<R: BufRead, W: Write> ThemeWizard<R, W> {
    pub fn new(input: R, output: W, themes: ThemeManager) -> Self {
        ThemeWizard {
            input,
            output,
            themes,
        }
    }

    pub fn into_output(self) -> W {
        self.output
    }

    /// Run the full wizard. Returns the saved theme path, or `None` when the
    /// user declines at the final confirmation.
    pub fn run(&mut self) -> Result<Option<PathBuf>> {
        let props = self.prompt_properties()?;
        self.display_summary(&props)?;

        let answer = self.ask("Create theme? [Y/n]: ")?.to_lowercase();
        if !answer.is_empty() && answer != "y" {
            self.say("Theme creation cancelled.")?;
            return Ok(None);
        }

        self.say("")?;
        self.say(&format!("Generating theme '{}'...", props.name))?;
        let css = generate_css(&props)?;
        let path = save_theme(self.themes.themes_dir(), &props.name, &css)?;

        self.say(&format!("✓ CSS file created: {}", path.display()))?;
        self.say("✓ Theme ready to use!")?;
        self.say("")?;
        self.say("Usage:")?;
        self.say(&format!("  md2pdf document.md --theme {}", props.name))?;
        self.say(&format!(
            "  md2pdf *.md --merge --theme {} -on book.pdf",
            props.name
        ))?;
        self.say("")?;
        Ok(Some(path))
    }

    pub fn prompt_properties(&mut self) -> Result<ThemeProperties> {
        self.print_header()?;

        let existing = self.themes.list_themes();
        let name = loop {
            let candidate = self.prompt("Theme name", "", None, false)?;
            match validate_theme_name(&candidate, &existing) {
                Ok(()) => break candidate,
                Err(e) => self.say(&format!("✗ {}", e))?,
            }
        };
        self.say("✓ Name available")?;
        self.say("")?;

        let background_color = self.prompt_color("Background color", "#ffffff", None)?;
        let text_color = self.prompt_color(
            "Text color",
            "#000000",
            Some((background_color.as_str(), "Body text")),
        )?;

        let font_family = self.prompt("Font family", "Arial, sans-serif", None, true)?;
        self.say(&format!("✓ Using: {}", font_family))?;
        self.say("")?;

        let mut body_text_size =
            self.prompt("Body text size", "11pt", Some(validate_font_size), true)?;
        if !body_text_size.ends_with("pt") {
            body_text_size.push_str("pt");
        }
        self.say(&format!("✓ Using: {}", body_text_size))?;
        self.say("")?;

        let h1_color = self.prompt_color(
            "H1 heading color",
            "#2c3e50",
            Some((background_color.as_str(), "H1 heading")),
        )?;
        let h2_h6_color = self.prompt_color(
            "H2-H6 heading color",
            "#2c3e50",
            Some((background_color.as_str(), "H2-H6 headings")),
        )?;
        let accent_color = self.prompt_color(
            "Accent color (links, borders)",
            "#667eea",
            Some((background_color.as_str(), "Link")),
        )?;
        let code_bg_color = self.prompt_color("Code block background", "#f5f5f5", None)?;
        let table_header_bg = self.prompt_color("Table header background", "#667eea", None)?;

        Ok(ThemeProperties {
            name,
            background_color,
            text_color,
            font_family,
            body_text_size,
            h1_color,
            h2_h6_color,
            accent_color,
            code_bg_color,
            table_header_bg,
        })
    }

    /// Print the ratio and rating; below AA, warn, suggest an alternative and
    /// ask whether to keep the color anyway.
    pub fn check_contrast(
        &mut self,
        foreground: &str,
        background: &str,
        element: &str,
    ) -> Result<bool> {
        let ratio = color::contrast_ratio(foreground, background)?;
        self.say(&format!(
            "✓ Contrast ratio: {:.1}:1 ({})",
            ratio,
            color::contrast_rating(ratio)
        ))?;

        if color::meets_wcag_aa(ratio) {
            return Ok(true);
        }

        self.say(&format!(
            "⚠ Warning: {} contrast is below WCAG AA standard (4.5:1)",
            element
        ))?;
        let suggestion = color::suggest_accessible_color(foreground, background, WCAG_AA_RATIO)?;
        let suggestion_ratio = color::contrast_ratio(&suggestion, background)?;
        self.say(&format!(
            "  Suggestion: Try {} for {:.1}:1 ratio (WCAG AA)",
            suggestion, suggestion_ratio
        ))?;

        let answer = self.ask("  Continue with current color anyway? [y/N]: ")?;
        Ok(answer.to_lowercase() == "y")
    }

    fn prompt_color(
        &mut self,
        label: &str,
        default: &str,
        contrast: Option<(&str, &str)>,
    ) -> Result<String> {
        loop {
            let raw = self.prompt(label, default, Some(validate_color_input), true)?;
            let hex = color::parse_color(&raw).map(Rgb::to_hex)?;
            self.say(&format!("✓ Using: {}", hex))?;

            let accepted = match contrast {
                Some((background, element)) => self.check_contrast(&hex, background, element)?,
                None => true,
            };
            if accepted {
                self.say("")?;
                return Ok(hex);
            }
        }
    }

    fn prompt(
        &mut self,
        label: &str,
        default: &str,
        validator: Option<Validator>,
        allow_empty: bool,
    ) -> Result<String> {
        loop {
            let value = self.ask(&format!("{} [{}]: ", label, default))?;

            if value.is_empty() {
                if allow_empty {
                    return Ok(default.to_string());
                }
                self.say("✗ This field is required.")?;
                continue;
            }

            match validator.map_or(Ok(()), |validate| validate(&value)) {
                Ok(()) => return Ok(value),
                Err(e) => self.say(&format!("✗ {}", e))?,
            }
        }
    }

    fn display_summary(&mut self, props: &ThemeProperties) -> Result<()> {
        self.say(&"─".repeat(48))?;
        self.say("")?;
        self.say("Theme Summary:")?;
        self.say(&format!("  • Name: {}", props.name))?;
        self.say(&format!("  • Background: {}", props.background_color))?;
        self.say(&format!(
            "  • Text: {}, {}, {}",
            props.text_color, props.font_family, props.body_text_size
        ))?;
        self.say(&format!("  • H1: {}", props.h1_color))?;
        self.say(&format!("  • H2-H6: {}", props.h2_h6_color))?;
        self.say(&format!("  • Accent: {}", props.accent_color))?;
        if props.all_accessible()? {
            self.say("  • All contrast ratios meet WCAG AA standards ✓")?;
        } else {
            self.say("  • ⚠ Some contrast ratios are below WCAG AA")?;
        }
        self.say("")
    }

    fn print_header(&mut self) -> Result<()> {
        self.say("")?;
        self.say("╔══════════════════════════════════════════════╗")?;
        self.say("║     md2pdf Interactive Theme Builder         ║")?;
        self.say("╚══════════════════════════════════════════════╝")?;
        self.say("")?;
        self.say("Let's create a custom theme for your PDF documents.")?;
        self.say("Press Enter to accept default values in [brackets].")?;
        self.say("")
    }

    /// Print a prompt and read one trimmed line. End of input cancels the wizard.
    fn ask(&mut self, prompt: &str) -> Result<String> {
        write!(self.output, "{}", prompt).map_err(io_error)?;
        self.output.flush().map_err(io_error)?;

        let mut line = String::new();
        let read = self.input.read_line(&mut line).map_err(io_error)?;
        if read == 0 {
            return Err(Md2PdfError::Cancelled);
        }
        Ok(line.trim().to_string())
    }

    fn say(&mut self, line: &str) -> Result<()> {
        writeln!(self.output, "{}", line).map_err(io_error)
    }
}

fn io_error(e: std::io::Error) -> Md2PdfError {
    Md2PdfError::FileOperation(format!("Terminal I/O failed: {}", e))
}
