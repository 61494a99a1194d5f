use a11ylens_core::{Category, IssueReport};

use crate::html_escape;

fn no_issues_text(category: Category) -> &'static str {
    match category {
        Category::Images => "all images have alt text",
        Category::Inputs => "all inputs are properly labeled",
        Category::Headings => "heading hierarchy is correct",
        Category::Links => "all links are descriptive",
        Category::Aria => "all ARIA roles have accessible names",
        Category::Contrast => "color contrast is adequate",
    }
}

fn icon(category: Category) -> &'static str {
    match category {
        Category::Images => "🖼️",
        Category::Inputs => "📝",
        Category::Headings => "📑",
        Category::Links => "🔗",
        Category::Aria => "♿",
        Category::Contrast => "🎨",
    }
}

fn detail(label: &str, value: &str) -> String {
    format!(
        "<div class=\"issue-detail\"><strong>{}:</strong> {}</div>",
        label,
        html_escape(value)
    )
}

fn issue_block(number: usize, title: &str, details: &[String], snippet: &str) -> String {
    format!(
        "<div class=\"issue\"><div class=\"issue-title\">Issue #{}: {}</div>{}<div class=\"code\">{}</div></div>",
        number,
        html_escape(title),
        details.concat(),
        html_escape(snippet)
    )
}

fn issue_blocks(report: &IssueReport, category: Category) -> Vec<String> {
    match category {
        Category::Images => report
            .images
            .iter()
            .enumerate()
            .map(|(i, issue)| {
                issue_block(
                    i + 1,
                    "Image missing alt text",
                    &[
                        detail("Element index", &issue.index.to_string()),
                        detail("Source", &issue.src),
                    ],
                    &issue.snippet,
                )
            })
            .collect(),
        Category::Inputs => report
            .inputs
            .iter()
            .enumerate()
            .map(|(i, issue)| {
                let mut details = vec![
                    detail("Element index", &issue.index.to_string()),
                    detail("Type", &issue.input_type),
                ];
                if let Some(id) = &issue.id {
                    details.push(detail("ID", id));
                }
                if let Some(name) = &issue.name {
                    details.push(detail("Name", name));
                }
                issue_block(i + 1, "Input without label", &details, &issue.snippet)
            })
            .collect(),
        Category::Headings => report
            .headings
            .iter()
            .enumerate()
            .map(|(i, issue)| {
                issue_block(
                    i + 1,
                    &issue.message,
                    &[
                        detail("Levels", &format!("h{} → h{}", issue.previous_level, issue.level)),
                        detail("Text", &issue.text),
                    ],
                    &issue.snippet,
                )
            })
            .collect(),
        Category::Links => report
            .links
            .iter()
            .enumerate()
            .map(|(i, issue)| {
                let mut details = vec![detail("Href", &issue.href)];
                if let Some(text) = &issue.text {
                    details.push(detail("Text", text));
                }
                issue_block(i + 1, &issue.message, &details, &issue.snippet)
            })
            .collect(),
        Category::Aria => report
            .aria
            .iter()
            .enumerate()
            .map(|(i, issue)| {
                issue_block(
                    i + 1,
                    &issue.message,
                    &[detail("Role", &issue.role)],
                    &issue.snippet,
                )
            })
            .collect(),
        Category::Contrast => report
            .contrast
            .iter()
            .enumerate()
            .map(|(i, issue)| {
                issue_block(
                    i + 1,
                    "Insufficient color contrast",
                    &[
                        detail(
                            "Ratio",
                            &format!("{:.2}:1 (needs {}:1)", issue.ratio, issue.required),
                        ),
                        detail("Text", &issue.text),
                        detail("Style", &issue.style),
                    ],
                    &issue.snippet,
                )
            })
            .collect(),
    }
}

pub fn render_category(report: &IssueReport, category: Category) -> String {
    let count = report.count(category);
    let body = if count == 0 {
        format!(
            "<div class=\"no-issues\">✓ No issues found - {}</div>",
            no_issues_text(category)
        )
    } else {
        issue_blocks(report, category).concat()
    };
    format!(
        "<div class=\"category\" id=\"{key}\"><h2>{icon} {label} ({count} issues)</h2>{body}</div>",
        key = category.key(),
        icon = icon(category),
        label = category.label(),
        count = count,
        body = body,
    )
}

pub fn render_summary_row(label: &str, count: usize) -> String {
    format!(
        "<div class=\"summary-item\"><span>{}</span><span class=\"count {}\">{}</span></div>",
        html_escape(label),
        if count == 0 { "success" } else { "" },
        count
    )
}
