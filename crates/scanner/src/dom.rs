//! Heuristic DOM checks.
//!
//! Every check walks the matches of its category selector in document order
//! and records the match position as the issue `index`, so that the same
//! selector re-run against a live page finds the same element (as long as
//! the page has not been mutated in between).

use std::collections::HashSet;

use a11ylens_core::{
    AriaIssue, Category, Error, HeadingIssue, ImageIssue, InputIssue, IssueReport, LinkIssue,
    Result, WcagLevel,
};
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, warn};
use url::Url;

use crate::contrast;

pub const SNIPPET_CHARS: usize = 200;
pub const HEADING_TEXT_CHARS: usize = 100;

const SKIPPED_INPUT_TYPES: &[&str] = &["hidden", "submit", "button", "image", "reset"];
const GENERIC_LINK_TEXTS: &[&str] = &["click here", "read more", "more", "here"];
const NAMED_ROLES: &[&str] = &["button", "link", "menuitem", "tab"];

#[derive(Debug, Clone, Default)]
pub struct ScanOptions {
    /// Document URL used to resolve relative `src`/`href` values.
    pub base_url: Option<Url>,
    pub level: WcagLevel,
}

impl ScanOptions {
    pub fn new(base_url: Option<&str>, level: WcagLevel) -> Self {
        Self {
            base_url: base_url.and_then(|u| Url::parse(u).ok()),
            level,
        }
    }
}

/// Scan a document. Never fails: a check that errors leaves its category
/// partially populated and the rest of the scan continues.
pub fn scan_document(html: &str, options: &ScanOptions) -> IssueReport {
    let document = Html::parse_document(html);
    let base = options.base_url.as_ref();
    let mut report = IssueReport::default();

    log_partial(Category::Images, check_images(&document, base, &mut report.images));
    log_partial(Category::Inputs, check_inputs(&document, &mut report.inputs));
    log_partial(Category::Headings, check_headings(&document, &mut report.headings));
    log_partial(Category::Links, check_links(&document, base, &mut report.links));
    log_partial(Category::Aria, check_aria(&document, &mut report.aria));
    log_partial(
        Category::Contrast,
        contrast::check_contrast(&document, options.level, &mut report.contrast),
    );

    debug!(total = report.total(), "DOM scan finished");
    report
}

/// Trimmed `<title>` text, if the document has a non-empty one.
pub fn document_title(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let sel = Selector::parse("title").ok()?;
    let title = live_matches(&document, &sel).next()?;
    let text = text_content(&title).trim().to_string();
    (!text.is_empty()).then_some(text)
}

fn log_partial(category: Category, result: Result<()>) {
    if let Err(e) = result {
        warn!(category = %category, error = %e, "Check failed, keeping partial results");
    }
}

pub(crate) fn selector(category: Category) -> Result<Selector> {
    Selector::parse(category.selector())
        .map_err(|e| Error::Validation(format!("selector '{}': {:?}", category.selector(), e)))
}

pub(crate) fn truncate_chars(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}

pub(crate) fn snippet(element: &ElementRef) -> String {
    truncate_chars(&element.html(), SNIPPET_CHARS)
}

pub(crate) fn text_content(element: &ElementRef) -> String {
    element.text().collect::<String>()
}

/// Attribute value if present and non-empty.
fn non_empty_attr<'a>(element: &ElementRef<'a>, name: &str) -> Option<&'a str> {
    element.value().attr(name).filter(|v| !v.is_empty())
}

/// Matches outside `<template>` contents, which the live DOM does not expose
/// to `querySelectorAll`. Indices must be counted over this sequence.
pub(crate) fn live_matches<'a>(
    document: &'a Html,
    sel: &'a Selector,
) -> impl Iterator<Item = ElementRef<'a>> + 'a {
    document.select(sel).filter(|element| !in_template(element))
}

fn in_template(element: &ElementRef) -> bool {
    element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .any(|a| a.value().name().eq_ignore_ascii_case("template"))
}

fn resolve(base: Option<&Url>, raw: &str) -> String {
    match base {
        Some(base) if !raw.is_empty() => base
            .join(raw)
            .map(|u| u.to_string())
            .unwrap_or_else(|_| raw.to_string()),
        _ => raw.to_string(),
    }
}

fn check_images(document: &Html, base: Option<&Url>, out: &mut Vec<ImageIssue>) -> Result<()> {
    let sel = selector(Category::Images)?;
    for (index, img) in live_matches(document, &sel).enumerate() {
        let has_alt = img
            .value()
            .attr("alt")
            .map(|alt| !alt.trim().is_empty())
            .unwrap_or(false);
        if !has_alt {
            out.push(ImageIssue {
                index,
                src: resolve(base, img.value().attr("src").unwrap_or("")),
                snippet: snippet(&img),
            });
        }
    }
    Ok(())
}

fn check_inputs(document: &Html, out: &mut Vec<InputIssue>) -> Result<()> {
    let sel = selector(Category::Inputs)?;
    let label_sel = Selector::parse("label[for]")
        .map_err(|e| Error::Validation(format!("selector 'label[for]': {:?}", e)))?;
    let label_targets: HashSet<&str> = live_matches(document, &label_sel)
        .filter_map(|l| l.value().attr("for"))
        .collect();

    for (index, input) in live_matches(document, &sel).enumerate() {
        let input_type = input
            .value()
            .attr("type")
            .map(|t| t.trim().to_ascii_lowercase())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| "text".to_string());
        if SKIPPED_INPUT_TYPES.contains(&input_type.as_str()) {
            continue;
        }

        let id = non_empty_attr(&input, "id");
        let labelled = id.map(|id| label_targets.contains(id)).unwrap_or(false)
            || non_empty_attr(&input, "aria-label").is_some()
            || non_empty_attr(&input, "aria-labelledby").is_some()
            || inside_label(&input);

        if !labelled {
            out.push(InputIssue {
                index,
                input_type,
                id: id.map(str::to_string),
                name: non_empty_attr(&input, "name").map(str::to_string),
                snippet: snippet(&input),
            });
        }
    }
    Ok(())
}

fn inside_label(element: &ElementRef) -> bool {
    element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .any(|a| a.value().name().eq_ignore_ascii_case("label"))
}

fn check_headings(document: &Html, out: &mut Vec<HeadingIssue>) -> Result<()> {
    let sel = selector(Category::Headings)?;
    let mut previous_level: u8 = 0;
    for (index, heading) in live_matches(document, &sel).enumerate() {
        let level = heading
            .value()
            .name()
            .strip_prefix('h')
            .and_then(|n| n.parse::<u8>().ok())
            .ok_or_else(|| {
                Error::Validation(format!("unexpected heading tag <{}>", heading.value().name()))
            })?;

        if previous_level > 0 && level > previous_level + 1 {
            out.push(HeadingIssue {
                index,
                level,
                previous_level,
                text: truncate_chars(&text_content(&heading), HEADING_TEXT_CHARS),
                message: format!(
                    "Heading level skipped from h{} to h{}",
                    previous_level, level
                ),
                snippet: snippet(&heading),
            });
        }
        previous_level = level;
    }
    Ok(())
}

fn check_links(document: &Html, base: Option<&Url>, out: &mut Vec<LinkIssue>) -> Result<()> {
    let sel = selector(Category::Links)?;
    for (index, link) in live_matches(document, &sel).enumerate() {
        let text = text_content(&link).trim().to_lowercase();
        let has_aria_label = non_empty_attr(&link, "aria-label").is_some();
        let href = resolve(base, link.value().attr("href").unwrap_or(""));

        if text.is_empty() && !has_aria_label {
            out.push(LinkIssue {
                index,
                href,
                text: None,
                message: "Link has no text content".to_string(),
                snippet: snippet(&link),
            });
        } else if GENERIC_LINK_TEXTS.contains(&text.as_str()) && !has_aria_label {
            out.push(LinkIssue {
                index,
                href,
                text: Some(text),
                message: "Link text is not descriptive".to_string(),
                snippet: snippet(&link),
            });
        }
    }
    Ok(())
}

fn check_aria(document: &Html, out: &mut Vec<AriaIssue>) -> Result<()> {
    let sel = selector(Category::Aria)?;
    for (index, element) in live_matches(document, &sel).enumerate() {
        let role = element.value().attr("role").unwrap_or("");
        if !NAMED_ROLES.contains(&role) {
            continue;
        }
        let has_name = !text_content(&element).trim().is_empty()
            || non_empty_attr(&element, "aria-label").is_some()
            || non_empty_attr(&element, "aria-labelledby").is_some();
        if !has_name {
            out.push(AriaIssue {
                index,
                role: role.to_string(),
                message: format!("Element with role=\"{}\" has no accessible name", role),
                snippet: snippet(&element),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan(html: &str) -> IssueReport {
        scan_document(html, &ScanOptions::default())
    }

    #[test]
    fn test_images_missing_or_blank_alt() {
        let report = scan(
            r#"<img src="a.png"><img src="b.png" alt="Logo"><img src="c.png" alt="   "><img src="d.png" alt="">"#,
        );
        let indices: Vec<usize> = report.images.iter().map(|i| i.index).collect();
        assert_eq!(indices, vec![0, 2, 3]);
        assert_eq!(report.images[0].src, "a.png");
    }

    #[test]
    fn test_image_src_resolved_against_base() {
        let options = ScanOptions::new(Some("https://example.com/docs/page.html"), WcagLevel::Aaa);
        let report = scan_document(r#"<img src="img/a.png">"#, &options);
        assert_eq!(report.images[0].src, "https://example.com/docs/img/a.png");
    }

    #[test]
    fn test_input_label_rules() {
        let html = r#"
            <label for="email">Email</label><input id="email" type="email">
            <input id="x">
            <input aria-label="Search">
            <input aria-labelledby="lbl">
            <label>Name <input name="name"></label>
            <input type="hidden" name="csrf">
            <input type="submit">
            <input type="text" name="phone">
        "#;
        let report = scan(html);
        assert_eq!(report.inputs.len(), 2);
        assert_eq!(report.inputs[0].id.as_deref(), Some("x"));
        assert_eq!(report.inputs[0].input_type, "text");
        assert_eq!(report.inputs[0].index, 1);
        assert_eq!(report.inputs[1].name.as_deref(), Some("phone"));
        assert_eq!(report.inputs[1].index, 7);
    }

    #[test]
    fn test_empty_aria_label_does_not_label_input() {
        let report = scan(r#"<input id="q" aria-label="">"#);
        assert_eq!(report.inputs.len(), 1);
    }

    #[test]
    fn test_heading_skip_detection() {
        let report = scan("<h1>Title</h1><h3>Deep</h3><h4>Deeper</h4><h6>Deepest</h6><h2>Back</h2>");
        assert_eq!(report.headings.len(), 2);
        assert_eq!(report.headings[0].previous_level, 1);
        assert_eq!(report.headings[0].level, 3);
        assert_eq!(report.headings[0].index, 1);
        assert_eq!(report.headings[0].message, "Heading level skipped from h1 to h3");
        assert_eq!(report.headings[1].previous_level, 4);
        assert_eq!(report.headings[1].level, 6);
    }

    #[test]
    fn test_first_heading_never_flagged() {
        let report = scan("<h3>Starts deep</h3><h4>Fine</h4>");
        assert!(report.headings.is_empty());
    }

    #[test]
    fn test_heading_text_truncated() {
        let long = "x".repeat(150);
        let report = scan(&format!("<h1>a</h1><h5>{}</h5>", long));
        assert_eq!(report.headings[0].text.chars().count(), HEADING_TEXT_CHARS);
    }

    #[test]
    fn test_link_rules() {
        let html = r##"
            <a href="/a"></a>
            <a href="/b">Click Here</a>
            <a href="/c" aria-label="Read the pricing page">more</a>
            <a href="/d">Pricing details</a>
            <a href="/e">  read more </a>
        "##;
        let report = scan(html);
        assert_eq!(report.links.len(), 3);
        assert_eq!(report.links[0].message, "Link has no text content");
        assert!(report.links[0].text.is_none());
        assert_eq!(report.links[1].text.as_deref(), Some("click here"));
        assert_eq!(report.links[1].message, "Link text is not descriptive");
        assert_eq!(report.links[2].index, 4);
    }

    #[test]
    fn test_aria_roles_without_names() {
        let html = r#"
            <div role="button"></div>
            <div role="button">Save</div>
            <span role="tab" aria-labelledby="t1"></span>
            <div role="region"></div>
            <div role="menuitem">   </div>
        "#;
        let report = scan(html);
        assert_eq!(report.aria.len(), 2);
        assert_eq!(report.aria[0].index, 0);
        assert_eq!(report.aria[1].index, 4);
        assert_eq!(
            report.aria[1].message,
            "Element with role=\"menuitem\" has no accessible name"
        );
    }

    #[test]
    fn test_role_match_is_exact() {
        let report = scan(r#"<div role=" button "></div><div role="Button"></div>"#);
        assert!(report.aria.is_empty());
    }

    #[test]
    fn test_template_content_not_indexed() {
        let report = scan(r#"<template><img src="t.png"></template><img src="live.png">"#);
        assert_eq!(report.images.len(), 1);
        assert_eq!(report.images[0].index, 0);
        assert_eq!(report.images[0].src, "live.png");
    }

    #[test]
    fn test_template_content_skipped_in_every_category() {
        let html = r#"
            <template>
                <input id="t"><h1>a</h1><h4>b</h4><a href="/t"></a><div role="tab"></div>
            </template>
            <input id="live"><a href="/live"></a>
        "#;
        let report = scan(html);
        assert_eq!(report.inputs.len(), 1);
        assert_eq!(report.inputs[0].index, 0);
        assert!(report.headings.is_empty());
        assert_eq!(report.links.len(), 1);
        assert_eq!(report.links[0].index, 0);
        assert!(report.aria.is_empty());
    }

    #[test]
    fn test_document_title() {
        assert_eq!(
            document_title("<html><head><title> Rates \n</title></head></html>").as_deref(),
            Some("Rates")
        );
        assert!(document_title("<title>  </title>").is_none());
        assert!(document_title("<p>none</p>").is_none());
    }

    #[test]
    fn test_snippet_truncated_to_200_chars() {
        let src = "a".repeat(400);
        let report = scan(&format!(r#"<img src="{}">"#, src));
        assert_eq!(report.images[0].snippet.chars().count(), SNIPPET_CHARS);
        assert!(report.images[0].snippet.starts_with("<img"));
    }

    #[test]
    fn test_malformed_markup_still_scans() {
        let report = scan("<div><img src=x><p><input id=q <h1>a<h4>b</div></span>");
        assert_eq!(report.images.len(), 1);
    }

    #[test]
    fn test_clean_page_has_no_issues() {
        let html = r#"
            <h1>Home</h1><h2>Section</h2>
            <img src="a.png" alt="Team photo">
            <label for="e">Email</label><input id="e" type="email">
            <a href="/pricing">Pricing</a>
            <button role="button">Go</button>
        "#;
        assert!(scan(html).is_empty());
    }
}
