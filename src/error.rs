//! Error types shared by every stage of the conversion pipeline.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Md2PdfError {
    /// The renderer binary could not be located. Carries install instructions.
    #[error("{0}")]
    EngineNotFound(String),

    #[error("{0}")]
    Conversion(String),

    #[error("{0}")]
    FileOperation(String),

    #[error("Theme '{theme}' not found.{}", available_suffix(.available))]
    ThemeNotFound {
        theme: String,
        available: Vec<String>,
    },

    #[error("{0}")]
    CssNotFound(String),

    #[error("{0}")]
    InvalidInput(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    /// The user abandoned the interactive theme wizard.
    #[error("Theme creation cancelled.")]
    Cancelled,
}

fn available_suffix(available: &[String]) -> String {
    if available.is_empty() {
        " No themes found in themes directory.".to_string()
    } else {
        let mut sorted = available.to_vec();
        sorted.sort();
        format!(" Available themes: {}", sorted.join(", "))
    }
}

impl Md2PdfError {
    pub fn theme_not_found(theme: impl Into<String>, available: Vec<String>) -> Self {
        Md2PdfError::ThemeNotFound {
            theme: theme.into(),
            available,
        }
    }
}

pub type Result<T> = std::result::Result<T, Md2PdfError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_theme_not_found_lists_sorted_themes() {
        let err = Md2PdfError::theme_not_found(
            "ocean",
            vec!["light".into(), "dark".into(), "default".into()],
        );
        assert_eq!(
            err.to_string(),
            "Theme 'ocean' not found. Available themes: dark, default, light"
        );
    }

    #[test]
    fn test_theme_not_found_without_themes() {
        let err = Md2PdfError::theme_not_found("ocean", Vec::new());
        assert_eq!(
            err.to_string(),
            "Theme 'ocean' not found. No themes found in themes directory."
        );
    }

    #[test]
    fn test_engine_not_found_includes_instructions() {
        let instructions = crate::pdf_engine::installation_instructions();
        let err = Md2PdfError::EngineNotFound(instructions.clone());
        assert_eq!(err.to_string(), instructions);
        assert!(err.to_string().starts_with("wkhtmltopdf is required"));
    }
}
