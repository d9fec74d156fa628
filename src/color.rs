//! Color parsing and WCAG contrast arithmetic used by the theme builder.

use crate::config::{
    COLOR_ADJUSTMENT_END, COLOR_ADJUSTMENT_START, COLOR_ADJUSTMENT_STEP, WCAG_AA_RATIO,
    WCAG_AAA_RATIO,
};
use crate::error::{Md2PdfError, Result};
use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

static HSL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^hsl\(\s*(\d+)\s*,\s*(\d+)%\s*,\s*(\d+)%\s*\)$").unwrap()
});

const NAMED_COLORS: &[(&str, &str)] = &[
    ("white", "#ffffff"),
    ("black", "#000000"),
    ("red", "#ff0000"),
    ("green", "#008000"),
    ("blue", "#0000ff"),
    ("yellow", "#ffff00"),
    ("cyan", "#00ffff"),
    ("magenta", "#ff00ff"),
    ("gray", "#808080"),
    ("grey", "#808080"),
    ("silver", "#c0c0c0"),
    ("maroon", "#800000"),
    ("olive", "#808000"),
    ("lime", "#00ff00"),
    ("aqua", "#00ffff"),
    ("teal", "#008080"),
    ("navy", "#000080"),
    ("fuchsia", "#ff00ff"),
    ("purple", "#800080"),
    ("orange", "#ffa500"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.0, self.1, self.2)
    }

    /// WCAG relative luminance, 0.0 for black up to 1.0 for white.
    pub fn relative_luminance(self) -> f64 {
        fn linear(channel: u8) -> f64 {
            let c = f64::from(channel) / 255.0;
            if c <= 0.03928 {
                c / 12.92
            } else {
                ((c + 0.055) / 1.055).powf(2.4)
            }
        }
        0.2126 * linear(self.0) + 0.7152 * linear(self.1) + 0.0722 * linear(self.2)
    }

    pub fn darken(self, percentage: f64) -> Rgb {
        let factor = 1.0 - percentage / 100.0;
        let scale = |c: u8| (f64::from(c) * factor).clamp(0.0, 255.0) as u8;
        Rgb(scale(self.0), scale(self.1), scale(self.2))
    }

    pub fn lighten(self, percentage: f64) -> Rgb {
        let factor = percentage / 100.0;
        let scale = |c: u8| (f64::from(c) + (255.0 - f64::from(c)) * factor).clamp(0.0, 255.0) as u8;
        Rgb(scale(self.0), scale(self.1), scale(self.2))
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Parse `#rgb`, `#rrggbb`, a basic CSS color name or `hsl(h, s%, l%)`.
pub fn parse_color(input: &str) -> Result<Rgb> {
    let color = input.trim().to_lowercase();

    if color.starts_with('#') {
        return parse_hex(&color);
    }
    if color.starts_with("hsl") {
        return parse_hsl(&color);
    }
    if let Some((_, hex)) = NAMED_COLORS.iter().find(|(name, _)| *name == color) {
        return parse_hex(hex);
    }

    Err(Md2PdfError::InvalidInput(format!(
        "Invalid color format: '{}'. Supported formats: hex (#fff, #ffffff), \
         named colors (white, black), or HSL (hsl(210, 50%, 20%))",
        color
    )))
}

fn parse_hex(hex: &str) -> Result<Rgb> {
    let digits = hex.trim_start_matches('#');
    let invalid = || Md2PdfError::InvalidInput(format!("Invalid hex color: #{}", digits));

    if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(invalid());
    }
    let expanded: String = match digits.len() {
        3 => digits.chars().flat_map(|c| [c, c]).collect(),
        6 => digits.to_string(),
        _ => return Err(invalid()),
    };

    let channel = |i: usize| u8::from_str_radix(&expanded[i..i + 2], 16).map_err(|_| invalid());
    Ok(Rgb(channel(0)?, channel(2)?, channel(4)?))
}

fn parse_hsl(hsl: &str) -> Result<Rgb> {
    let caps = HSL_PATTERN
        .captures(hsl)
        .ok_or_else(|| Md2PdfError::InvalidInput(format!("Invalid HSL format: '{}'", hsl)))?;

    let component = |i: usize| -> Result<u32> {
        caps[i]
            .parse::<u32>()
            .map_err(|_| Md2PdfError::InvalidInput(format!("Invalid HSL format: '{}'", hsl)))
    };
    let h = component(1)?;
    let s = component(2)?;
    let l = component(3)?;

    if h > 360 {
        return Err(Md2PdfError::InvalidInput(format!("HSL hue must be 0-360, got {}", h)));
    }
    if s > 100 {
        return Err(Md2PdfError::InvalidInput(format!(
            "HSL saturation must be 0-100%, got {}%",
            s
        )));
    }
    if l > 100 {
        return Err(Md2PdfError::InvalidInput(format!(
            "HSL lightness must be 0-100%, got {}%",
            l
        )));
    }

    Ok(hsl_to_rgb(h, f64::from(s) / 100.0, f64::from(l) / 100.0))
}

fn hsl_to_rgb(h: u32, s: f64, l: f64) -> Rgb {
    let hue = f64::from(h);
    let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
    let x = c * (1.0 - ((hue / 60.0) % 2.0 - 1.0).abs());
    let m = l - c / 2.0;

    let (r, g, b) = match h {
        0..=59 => (c, x, 0.0),
        60..=119 => (x, c, 0.0),
        120..=179 => (0.0, c, x),
        180..=239 => (0.0, x, c),
        240..=299 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };

    let to_channel = |v: f64| ((v + m) * 255.0).clamp(0.0, 255.0) as u8;
    Rgb(to_channel(r), to_channel(g), to_channel(b))
}

pub fn relative_luminance(color: &str) -> Result<f64> {
    Ok(parse_color(color)?.relative_luminance())
}

pub fn contrast_ratio_rgb(a: Rgb, b: Rgb) -> f64 {
    let (la, lb) = (a.relative_luminance(), b.relative_luminance());
    let (lighter, darker) = if la >= lb { (la, lb) } else { (lb, la) };
    (lighter + 0.05) / (darker + 0.05)
}

/// WCAG contrast ratio between two colors, from 1.0 up to 21.0.
pub fn contrast_ratio(a: &str, b: &str) -> Result<f64> {
    Ok(contrast_ratio_rgb(parse_color(a)?, parse_color(b)?))
}

pub fn meets_wcag_aa(ratio: f64) -> bool {
    ratio >= WCAG_AA_RATIO
}

pub fn meets_wcag_aaa(ratio: f64) -> bool {
    ratio >= WCAG_AAA_RATIO
}

pub fn contrast_rating(ratio: f64) -> &'static str {
    if meets_wcag_aaa(ratio) {
        "Excellent - WCAG AAA"
    } else if meets_wcag_aa(ratio) {
        "Good - WCAG AA"
    } else {
        "Poor - Below WCAG AA"
    }
}

pub fn darken(color: &str, percentage: f64) -> Result<String> {
    Ok(parse_color(color)?.darken(percentage).to_hex())
}

pub fn lighten(color: &str, percentage: f64) -> Result<String> {
    Ok(parse_color(color)?.lighten(percentage).to_hex())
}

/// Nudge `foreground` darker (on light backgrounds) or lighter (on dark ones)
/// until it reaches `target_ratio` against `background`. Falls back to pure
/// black or white when no step is enough.
pub fn suggest_accessible_color(foreground: &str, background: &str, target_ratio: f64) -> Result<String> {
    let fg = parse_color(foreground)?;
    let bg = parse_color(background)?;

    if contrast_ratio_rgb(fg, bg) >= target_ratio {
        return Ok(fg.to_hex());
    }

    let light_background = bg.relative_luminance() > 0.5;
    let mut percentage = COLOR_ADJUSTMENT_START;
    while percentage < COLOR_ADJUSTMENT_END {
        let adjusted = if light_background {
            fg.darken(f64::from(percentage))
        } else {
            fg.lighten(f64::from(percentage))
        };
        if contrast_ratio_rgb(adjusted, bg) >= target_ratio {
            return Ok(adjusted.to_hex());
        }
        percentage += COLOR_ADJUSTMENT_STEP;
    }

    Ok(if light_background { "#000000" } else { "#ffffff" }.to_string())
}
