//! Table-driven explanations. Each non-empty category maps to one fixed
//! template; `{count}` and `{hint}` are the only substitutions.

use a11ylens_core::{Category, IssueReport, Severity};
use serde::{Deserialize, Serialize};

struct Template {
    issue: &'static str,
    why: &'static str,
    fix: &'static str,
    example: &'static str,
    wcag_reference: &'static str,
    severity: Severity,
}

fn template(category: Category) -> Template {
    match category {
        Category::Images => Template {
            issue: "Missing Alt Text",
            why: "Screen readers cannot describe images to blind users ({count} affected)",
            fix: "Add alt=\"{hint}\" to all <img> tags",
            example: "<img src=\"logo.png\" alt=\"Company logo\">",
            wcag_reference: "WCAG 2.1 1.1.1 (Level A)",
            severity: Severity::Critical,
        },
        Category::Inputs => Template {
            issue: "Unlabeled Form Fields",
            why: "Users with assistive technology cannot identify {count} form field(s)",
            fix: "Use <label for=\"input_id\">Label</label> paired with input IDs",
            example: "<label for=\"email\">Email</label><input id=\"email\" type=\"email\">",
            wcag_reference: "WCAG 2.1 1.3.1 (Level A)",
            severity: Severity::Critical,
        },
        Category::Headings => Template {
            issue: "Heading Hierarchy Problems",
            why: "Skipped heading levels ({count} found) confuse screen reader navigation",
            fix: "Use <h1>, <h2>, <h3> in order without skipping levels",
            example: "<h1>Page Title</h1><h2>Section</h2><h3>Subsection</h3>",
            wcag_reference: "WCAG 2.1 1.3.1 (Level A)",
            severity: Severity::High,
        },
        Category::Links => Template {
            issue: "Unclear Link Text",
            why: "{count} link(s) have empty or generic text, so their purpose is unclear out of context",
            fix: "Describe the destination in the link text or add an aria-label",
            example: "<a href=\"/privacy\">Read our privacy policy</a>",
            wcag_reference: "WCAG 2.1 2.4.4 (Level A)",
            severity: Severity::Medium,
        },
        Category::Aria => Template {
            issue: "Unnamed Interactive Roles",
            why: "{count} custom control(s) are announced without a name",
            fix: "Give each role=\"button|link|menuitem|tab\" element visible text or an aria-label",
            example: "<div role=\"button\" aria-label=\"Close dialog\"></div>",
            wcag_reference: "WCAG 2.1 4.1.2 (Level A)",
            severity: Severity::Critical,
        },
        Category::Contrast => Template {
            issue: "Insufficient Color Contrast",
            why: "{count} text element(s) blend into their background for users with low vision",
            fix: "Darken the text or lighten the background until the ratio meets the target level",
            example: "<p style=\"color:#1a1a1a;background-color:#ffffff\">Readable text</p>",
            wcag_reference: "WCAG 2.1 1.4.6 (Level AAA) / 1.4.3 (Level AA)",
            severity: Severity::High,
        },
    }
}

const RECOMMENDATIONS: &[(&str, &str)] = &[
    (
        "Use ARIA only when semantic HTML fails",
        "Prefer native HTML elements (<button>, <nav>, <article>) over <div role=\"button\">",
    ),
    (
        "Provide keyboard navigation",
        "All interactive elements must be keyboard accessible (Tab, Enter, Escape keys)",
    ),
    (
        "Ensure sufficient color contrast",
        "Text should have at least 4.5:1 contrast ratio with background (WCAG AA standard)",
    ),
];

const BEST_PRACTICES: &[&str] = &[
    "Test with screen readers (NVDA, JAWS, VoiceOver)",
    "Use semantic HTML: <header>, <nav>, <main>, <footer>",
    "Implement skip links for keyboard navigation",
    "Use ARIA landmarks appropriately",
    "Provide captions and transcripts for media",
];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Explanation {
    pub category: Category,
    pub issue: String,
    pub why: String,
    pub fix: String,
    pub example: String,
    pub wcag_reference: String,
    pub severity: Severity,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Recommendation {
    pub title: String,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExplanationSet {
    pub explanations: Vec<Explanation>,
    pub recommendations: Vec<Recommendation>,
    pub best_practices: Vec<String>,
}

/// Suggested alt value: last path segment of the first flagged image.
fn image_hint(report: &IssueReport) -> String {
    report
        .images
        .first()
        .and_then(|img| img.src.rsplit('/').next())
        .filter(|s| !s.is_empty())
        .unwrap_or("description")
        .to_string()
}

pub fn explain(report: &IssueReport) -> ExplanationSet {
    let hint = image_hint(report);
    let fill = |s: &str, count: usize| {
        s.replace("{count}", &count.to_string())
            .replace("{hint}", &hint)
    };

    let explanations = report
        .non_empty_categories()
        .into_iter()
        .map(|category| {
            let t = template(category);
            let count = report.count(category);
            Explanation {
                category,
                issue: t.issue.to_string(),
                why: fill(t.why, count),
                fix: fill(t.fix, count),
                example: t.example.to_string(),
                wcag_reference: t.wcag_reference.to_string(),
                severity: t.severity,
            }
        })
        .collect();

    ExplanationSet {
        explanations,
        recommendations: RECOMMENDATIONS
            .iter()
            .map(|(title, description)| Recommendation {
                title: title.to_string(),
                description: description.to_string(),
            })
            .collect(),
        best_practices: BEST_PRACTICES.iter().map(|s| s.to_string()).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use a11ylens_core::{HeadingIssue, ImageIssue};

    #[test]
    fn test_tips_always_present() {
        let set = explain(&IssueReport::default());
        assert!(set.explanations.is_empty());
        assert_eq!(set.best_practices.len(), 5);
        assert_eq!(set.recommendations.len(), 3);
    }

    #[test]
    fn test_image_hint_from_src() {
        let report = IssueReport {
            images: vec![ImageIssue {
                index: 0,
                src: "https://example.com/assets/team.jpg".into(),
                snippet: String::new(),
            }],
            ..Default::default()
        };
        let set = explain(&report);
        assert_eq!(set.explanations[0].fix, "Add alt=\"team.jpg\" to all <img> tags");
        assert_eq!(set.explanations[0].wcag_reference, "WCAG 2.1 1.1.1 (Level A)");
    }

    #[test]
    fn test_image_hint_default() {
        let report = IssueReport {
            images: vec![ImageIssue {
                index: 0,
                src: String::new(),
                snippet: String::new(),
            }],
            ..Default::default()
        };
        assert!(explain(&report).explanations[0].fix.contains("alt=\"description\""));
    }

    #[test]
    fn test_one_record_per_nonempty_category_with_count() {
        let heading = HeadingIssue {
            index: 1,
            level: 3,
            previous_level: 1,
            text: String::new(),
            message: String::new(),
            snippet: String::new(),
        };
        let report = IssueReport {
            headings: vec![heading.clone(), heading],
            ..Default::default()
        };
        let set = explain(&report);
        assert_eq!(set.explanations.len(), 1);
        assert_eq!(set.explanations[0].category, Category::Headings);
        assert!(set.explanations[0].why.contains("2 found"));
        assert_eq!(set.explanations[0].severity, Severity::High);
    }
}
