//! Inline-style colour contrast check. Only `#rgb` and `#rrggbb` colours on
//! elements that declare both `color` and `background-color` are evaluated.

use a11ylens_core::{Category, ContrastIssue, Result, WcagLevel};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::Html;

use crate::dom::{live_matches, selector, snippet, text_content, truncate_chars};

const CONTRAST_TEXT_CHARS: usize = 80;

// `color` must start a declaration so `background-color` alone does not match.
static COLOR_DECL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(?:^|;)\s*color\s*:\s*([^;]+)").expect("valid regex"));
static BACKGROUND_DECL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)background-color\s*:\s*([^;]+)").expect("valid regex"));

/// Parse a hex colour into sRGB channels in `0.0..=1.0`.
pub fn parse_hex_color(value: &str) -> Option<(f64, f64, f64)> {
    let value = value.trim().trim_end_matches("!important").trim().to_ascii_lowercase();
    let hex = value.strip_prefix('#')?;
    let expanded: String = match hex.len() {
        3 => hex.chars().flat_map(|c| [c, c]).collect(),
        6 => hex.to_string(),
        _ => return None,
    };
    let channel = |i: usize| {
        u8::from_str_radix(&expanded[i..i + 2], 16)
            .ok()
            .map(|v| v as f64 / 255.0)
    };
    Some((channel(0)?, channel(2)?, channel(4)?))
}

pub fn relative_luminance((r, g, b): (f64, f64, f64)) -> f64 {
    fn linear(c: f64) -> f64 {
        if c <= 0.03928 {
            c / 12.92
        } else {
            ((c + 0.055) / 1.055).powf(2.4)
        }
    }
    0.2126 * linear(r) + 0.7152 * linear(g) + 0.0722 * linear(b)
}

pub fn contrast_ratio(l1: f64, l2: f64) -> f64 {
    let (lighter, darker) = if l1 >= l2 { (l1, l2) } else { (l2, l1) };
    (lighter + 0.05) / (darker + 0.05)
}

/// Contrast ratio for a `style` attribute, if both colours are understood.
pub fn style_contrast(style: &str) -> Option<f64> {
    let fg = COLOR_DECL.captures(style)?.get(1)?.as_str();
    let bg = BACKGROUND_DECL.captures(style)?.get(1)?.as_str();
    let fg = relative_luminance(parse_hex_color(fg)?);
    let bg = relative_luminance(parse_hex_color(bg)?);
    Some(contrast_ratio(fg, bg))
}

pub(crate) fn check_contrast(
    document: &Html,
    level: WcagLevel,
    out: &mut Vec<ContrastIssue>,
) -> Result<()> {
    let sel = selector(Category::Contrast)?;
    let required = level.min_contrast_ratio();
    for (index, element) in live_matches(document, &sel).enumerate() {
        let style = element.value().attr("style").unwrap_or("");
        let Some(ratio) = style_contrast(style) else {
            continue;
        };
        if ratio < required {
            let text = text_content(&element).trim().to_string();
            let text = if text.chars().count() > CONTRAST_TEXT_CHARS {
                format!("{}...", truncate_chars(&text, CONTRAST_TEXT_CHARS))
            } else {
                text
            };
            out.push(ContrastIssue {
                index,
                ratio: (ratio * 100.0).round() / 100.0,
                required,
                text,
                style: style.to_string(),
                snippet: snippet(&element),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(html: &str, level: WcagLevel) -> Vec<ContrastIssue> {
        let document = Html::parse_document(html);
        let mut out = Vec::new();
        check_contrast(&document, level, &mut out).unwrap();
        out
    }

    #[test]
    fn test_parse_hex_color() {
        assert_eq!(parse_hex_color("#fff"), Some((1.0, 1.0, 1.0)));
        assert_eq!(parse_hex_color(" #000000 "), Some((0.0, 0.0, 0.0)));
        assert!(parse_hex_color("rgb(0,0,0)").is_none());
        assert!(parse_hex_color("#abcd").is_none());
        assert!(parse_hex_color("#gggggg").is_none());
    }

    #[test]
    fn test_black_on_white_is_21() {
        let ratio = style_contrast("color: #000; background-color: #fff").unwrap();
        assert!((ratio - 21.0).abs() < 1e-9);
    }

    #[test]
    fn test_background_only_is_not_a_foreground() {
        assert!(style_contrast("background-color: #777").is_none());
    }

    #[test]
    fn test_level_changes_threshold() {
        // #767676 on white is roughly 4.54:1, passing AA and failing AAA.
        let html = r#"<p style="color:#767676;background-color:#ffffff">Muted</p>"#;
        assert!(run(html, WcagLevel::Aa).is_empty());
        let issues = run(html, WcagLevel::Aaa);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].required, 7.0);
        assert_eq!(issues[0].text, "Muted");
        assert!((issues[0].ratio - 4.54).abs() < 0.011);
    }

    #[test]
    fn test_index_counts_all_styled_elements() {
        let html = r#"
            <div style="margin:0">x</div>
            <span style="color:#aaa;background-color:#fff">Faint</span>
        "#;
        let issues = run(html, WcagLevel::Aa);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].index, 1);
    }

    #[test]
    fn test_template_styles_not_indexed() {
        let html = r#"
            <template><span style="color:#aaa;background-color:#fff">Hidden</span></template>
            <span style="color:#aaa;background-color:#fff">Faint</span>
        "#;
        let issues = run(html, WcagLevel::Aa);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].index, 0);
        assert_eq!(issues[0].text, "Faint");
    }

    #[test]
    fn test_long_text_gets_ellipsis() {
        let html = format!(
            r#"<p style="color:#bbb;background-color:#fff">{}</p>"#,
            "w".repeat(90)
        );
        let issues = run(&html, WcagLevel::Aa);
        assert_eq!(issues[0].text.chars().count(), CONTRAST_TEXT_CHARS + 3);
    }
}
