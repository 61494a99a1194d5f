//! Level AAA advisory checks.
//!
//! Advisories are listed beside the issue report. They never enter the
//! [`IssueReport`](a11ylens_core::IssueReport), so the compliance score is
//! the same whether or not they run.

use std::collections::HashSet;
use std::fmt;

use a11ylens_core::{Error, Result, WcagLevel};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::dom::{live_matches, truncate_chars};
use crate::insights::body_text;

const VAGUE_LINK_TEXTS: &[&str] = &[
    "click here", "here", "more", "read more", "link", "this", "continue", "next", "previous",
];
const SHORT_LINK_TEXTS: &[&str] = &["go", "ok"];
const MIN_LINK_TEXT_CHARS: usize = 3;
const HREF_CHARS: usize = 60;

const MIN_PARAGRAPHS_FOR_STRUCTURE: usize = 10;
const MIN_HEADINGS: usize = 3;

const COMMON_ABBREVIATIONS: &[&str] = &[
    "HTML", "CSS", "API", "URL", "HTTP", "HTTPS", "PDF", "XML", "JSON", "SQL", "USA", "UK", "EU",
    "AI", "ML", "NLP",
];
/// Only the first uppercase words of the page are sampled.
const ABBREVIATION_SAMPLE: usize = 5;

const TECHNICAL_TERMS: &[&str] = &[
    "algorithm",
    "framework",
    "methodology",
    "implementation",
    "infrastructure",
];
const GLOSSARY_MIN_WORDS: usize = 500;

static UPPERCASE_WORD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b[A-Z]{2,}\b").expect("valid regex"));
static GLOSSARY_CLASS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"glossary|definition").expect("valid regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdvisoryKind {
    Language,
    LinkContext,
    SectionHeadings,
    Abbreviations,
    UnusualWords,
}

impl AdvisoryKind {
    pub const ALL: [AdvisoryKind; 5] = [
        AdvisoryKind::Language,
        AdvisoryKind::LinkContext,
        AdvisoryKind::SectionHeadings,
        AdvisoryKind::Abbreviations,
        AdvisoryKind::UnusualWords,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            AdvisoryKind::Language => "Language of Page",
            AdvisoryKind::LinkContext => "Link Purpose (Link Only)",
            AdvisoryKind::SectionHeadings => "Section Headings",
            AdvisoryKind::Abbreviations => "Abbreviations",
            AdvisoryKind::UnusualWords => "Unusual Words",
        }
    }

    /// WCAG success criterion the check approximates.
    pub fn criterion(&self) -> &'static str {
        match self {
            AdvisoryKind::Language => "3.1.1",
            AdvisoryKind::LinkContext => "2.4.9",
            AdvisoryKind::SectionHeadings => "2.4.10",
            AdvisoryKind::Abbreviations => "3.1.4",
            AdvisoryKind::UnusualWords => "3.1.3",
        }
    }
}

impl fmt::Display for AdvisoryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Advisory {
    pub kind: AdvisoryKind,
    pub message: String,
}

impl Advisory {
    fn new(kind: AdvisoryKind, message: String) -> Self {
        Self { kind, message }
    }
}

fn css(s: &str) -> Result<Selector> {
    Selector::parse(s).map_err(|e| Error::Validation(format!("selector '{}': {:?}", s, e)))
}

/// Run the advisory checks. Levels below AAA get none.
pub fn advisory_checks(html: &str, level: WcagLevel) -> Vec<Advisory> {
    if level != WcagLevel::Aaa {
        return Vec::new();
    }
    let document = Html::parse_document(html);
    let mut out = Vec::new();
    for kind in AdvisoryKind::ALL {
        let result = match kind {
            AdvisoryKind::Language => check_language(&document, &mut out),
            AdvisoryKind::LinkContext => check_link_context(&document, &mut out),
            AdvisoryKind::SectionHeadings => check_section_headings(&document, &mut out),
            AdvisoryKind::Abbreviations => check_abbreviations(&document, &mut out),
            AdvisoryKind::UnusualWords => check_unusual_words(&document, &mut out),
        };
        if let Err(e) = result {
            warn!(check = %kind, error = %e, "Advisory check failed, keeping partial results");
        }
    }
    debug!(count = out.len(), "Advisory checks finished");
    out
}

/// Text with each node trimmed and joined without separators.
fn stripped_text(element: &ElementRef) -> String {
    element.text().map(str::trim).collect()
}

fn check_language(document: &Html, out: &mut Vec<Advisory>) -> Result<()> {
    let root = document.root_element();
    let has_lang = root.value().attr("lang").map(|l| !l.is_empty()).unwrap_or(false);
    if root.value().name().eq_ignore_ascii_case("html") && !has_lang {
        out.push(Advisory::new(
            AdvisoryKind::Language,
            "Missing 'lang' attribute on <html> tag - required for screen readers".to_string(),
        ));
    }
    Ok(())
}

fn check_link_context(document: &Html, out: &mut Vec<Advisory>) -> Result<()> {
    let sel = css("a")?;
    for link in live_matches(document, &sel) {
        let href = link.value().attr("href").unwrap_or("");
        if href.is_empty() || href.starts_with('#') {
            continue;
        }
        let text = stripped_text(&link).to_lowercase();
        let href = truncate_chars(href, HREF_CHARS);
        if VAGUE_LINK_TEXTS.contains(&text.as_str()) {
            out.push(Advisory::new(
                AdvisoryKind::LinkContext,
                format!(
                    "Link text '{}' needs context. Link purpose should be clear from text alone | href='{}'",
                    text, href
                ),
            ));
        } else if text.chars().count() < MIN_LINK_TEXT_CHARS
            && !SHORT_LINK_TEXTS.contains(&text.as_str())
        {
            out.push(Advisory::new(
                AdvisoryKind::LinkContext,
                format!(
                    "Link text too short: '{}'. Make link purpose clear from text | href='{}'",
                    text, href
                ),
            ));
        }
    }
    Ok(())
}

fn check_section_headings(document: &Html, out: &mut Vec<Advisory>) -> Result<()> {
    let headings = css("h1, h2, h3, h4, h5, h6")?;
    let paragraphs = css("p")?;
    let heading_count = live_matches(document, &headings).count();
    let paragraph_count = live_matches(document, &paragraphs).count();
    if paragraph_count > MIN_PARAGRAPHS_FOR_STRUCTURE && heading_count < MIN_HEADINGS {
        out.push(Advisory::new(
            AdvisoryKind::SectionHeadings,
            format!(
                "Page has {} paragraphs but only {} headings. Use more headings to organize content into sections.",
                paragraph_count, heading_count
            ),
        ));
    }

    let sections = css("section, article, nav, aside")?;
    for section in live_matches(document, &sections) {
        if section.select(&headings).next().is_none() {
            out.push(Advisory::new(
                AdvisoryKind::SectionHeadings,
                format!(
                    "<{}> element (id='{}') should have a heading to identify its purpose",
                    section.value().name(),
                    section.value().attr("id").unwrap_or("unknown")
                ),
            ));
        }
    }
    Ok(())
}

fn check_abbreviations(document: &Html, out: &mut Vec<Advisory>) -> Result<()> {
    let sel = css("abbr")?;
    let mut marked: HashSet<String> = HashSet::new();
    for abbr in live_matches(document, &sel) {
        let text = stripped_text(&abbr);
        if abbr.value().attr("title").map(str::is_empty).unwrap_or(true) {
            out.push(Advisory::new(
                AdvisoryKind::Abbreviations,
                format!("<abbr> tag '{}' missing title attribute to provide expansion", text),
            ));
        }
        marked.insert(text);
    }

    let text = body_text(document);
    let mut unmarked: Vec<&str> = Vec::new();
    for found in UPPERCASE_WORD.find_iter(&text).take(ABBREVIATION_SAMPLE) {
        let word = found.as_str();
        if COMMON_ABBREVIATIONS.contains(&word) && !marked.contains(word) && !unmarked.contains(&word)
        {
            unmarked.push(word);
        }
    }
    if !unmarked.is_empty() {
        out.push(Advisory::new(
            AdvisoryKind::Abbreviations,
            format!(
                "Found potential abbreviations that should use <abbr> tag: {}",
                unmarked.join(", ")
            ),
        ));
    }
    Ok(())
}

fn check_unusual_words(document: &Html, out: &mut Vec<Advisory>) -> Result<()> {
    let definitions = css("dl, dfn")?;
    let classed = css("[class]")?;
    let has_glossary = live_matches(document, &definitions).next().is_some()
        || live_matches(document, &classed).any(|e| {
            e.value()
                .attr("class")
                .map(|c| GLOSSARY_CLASS.is_match(c))
                .unwrap_or(false)
        });
    if has_glossary {
        return Ok(());
    }

    let text = body_text(document);
    if text.split_whitespace().count() <= GLOSSARY_MIN_WORDS {
        return Ok(());
    }
    let lower = text.to_lowercase();
    let found: Vec<&str> = TECHNICAL_TERMS
        .iter()
        .copied()
        .filter(|term| lower.contains(term))
        .collect();
    if !found.is_empty() {
        let shown: Vec<&str> = found.into_iter().take(3).collect();
        out.push(Advisory::new(
            AdvisoryKind::UnusualWords,
            format!(
                "Page contains technical terms ({}...) but no glossary or definitions. Consider adding a glossary for unusual words.",
                shown.join(", ")
            ),
        ));
    }
    Ok(())
}
