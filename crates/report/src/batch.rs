//! Combined index for a batch scan: one card per site, linking to the
//! per-site report when one was written.

use a11ylens_core::{Category, ComplianceAssessment, WcagLevel};
use a11ylens_scanner::{Advisory, LocalAnalysis};
use chrono::{DateTime, Utc};

use crate::{html_escape, inline_css, sections};

const BATCH_CSS: &str = r#"
        .tag { display: inline-block; font-size: 12px; font-weight: bold; padding: 2px 10px; border-radius: 10px; margin-right: 8px; }
        .tag-error { background: #fdecea; color: #dc3545; }
        .tag-issues { background: #fff4e5; color: #fd7e14; }
        .tag-clean { background: #e6f4ea; color: #28a745; }
        .site h2 a { color: inherit; }
"#;

#[derive(Debug, Clone)]
pub enum SiteOutcome {
    /// The page could not be fetched or scanned.
    Failed(String),
    Scanned {
        assessment: ComplianceAssessment,
        counts: Vec<(Category, usize)>,
        advisories: Vec<Advisory>,
        /// Per-site report, relative to the index file.
        report_file: Option<String>,
    },
}

#[derive(Debug, Clone)]
pub struct SiteSummary {
    pub url: String,
    pub title: Option<String>,
    pub outcome: SiteOutcome,
}

impl SiteSummary {
    pub fn scanned(
        url: &str,
        title: Option<String>,
        analysis: &LocalAnalysis,
        report_file: Option<String>,
    ) -> Self {
        Self {
            url: url.to_string(),
            title,
            outcome: SiteOutcome::Scanned {
                assessment: analysis.assessment.clone(),
                counts: Category::ALL
                    .iter()
                    .map(|c| (*c, analysis.issues.count(*c)))
                    .collect(),
                advisories: analysis.advisories.clone(),
                report_file,
            },
        }
    }

    pub fn failed(url: &str, error: impl Into<String>) -> Self {
        Self {
            url: url.to_string(),
            title: None,
            outcome: SiteOutcome::Failed(error.into()),
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.outcome, SiteOutcome::Failed(_))
    }

    /// Scored issues or advisories were found.
    pub fn has_issues(&self) -> bool {
        match &self.outcome {
            SiteOutcome::Failed(_) => false,
            SiteOutcome::Scanned {
                counts, advisories, ..
            } => counts.iter().any(|(_, n)| *n > 0) || !advisories.is_empty(),
        }
    }
}

pub fn build_batch_report(
    sites: &[SiteSummary],
    level: WcagLevel,
    generated_at: DateTime<Utc>,
) -> String {
    let with_issues = sites.iter().filter(|s| s.has_issues()).count();
    let with_errors = sites.iter().filter(|s| s.is_failed()).count();
    let cards: String = sites.iter().map(render_site).collect();

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Accessibility Report - {total} site(s)</title>
    <style>{css}{batch_css}</style>
</head>
<body>
    <div class="container">
        <div class="header">
            <h1>🔍 Accessibility Report</h1>
            <p><strong>Generated:</strong> {timestamp}</p>
            <p><strong>WCAG Level:</strong> {level}</p>
        </div>
        <div class="summary">
            <h2>Summary</h2>
            <div class="stats">
                <div class="stat"><div class="stat-value">{total}</div><div class="stat-label">Sites Scanned</div></div>
                <div class="stat"><div class="stat-value">{with_issues}</div><div class="stat-label">Sites With Issues</div></div>
                <div class="stat"><div class="stat-value">{with_errors}</div><div class="stat-label">Sites With Errors</div></div>
            </div>
        </div>
        {cards}
        <div class="footer">Heuristic indicators only, not a WCAG {level} conformance certification.</div>
    </div>
</body>
</html>"#,
        total = sites.len(),
        css = inline_css(),
        batch_css = BATCH_CSS,
        timestamp = generated_at.format("%Y-%m-%d %H:%M:%S UTC"),
        level = level,
    )
}

fn render_site(site: &SiteSummary) -> String {
    let title = html_escape(site.title.as_deref().unwrap_or("(no title)"));
    let body = match &site.outcome {
        SiteOutcome::Failed(error) => format!(
            r#"<p><span class="tag tag-error">Error</span>{}</p>"#,
            html_escape(error)
        ),
        SiteOutcome::Scanned {
            assessment,
            counts,
            advisories,
            report_file,
        } => {
            let status = if site.has_issues() {
                r#"<span class="tag tag-issues">Issues</span>Accessibility issues detected."#
            } else {
                r#"<span class="tag tag-clean">Clean</span>No issues detected by current checks."#
            };
            let rows: String = counts
                .iter()
                .filter(|(_, n)| *n > 0)
                .map(|(category, n)| sections::render_summary_row(category.label(), *n))
                .collect();
            let advisory_row = if advisories.is_empty() {
                String::new()
            } else {
                sections::render_summary_row("AAA Advisories (not scored)", advisories.len())
            };
            let link = report_file
                .as_deref()
                .map(|file| {
                    format!(
                        r#"<p><a href="{}">Full report</a></p>"#,
                        html_escape(file)
                    )
                })
                .unwrap_or_default();
            format!(
                r#"<p>{status}</p>
            <p><strong>Score:</strong> {score} / 100 · {tier}</p>
            {rows}{advisory_row}{link}"#,
                score = assessment.compliance_score,
                tier = assessment.tier,
            )
        }
    };
    format!(
        r#"<div class="category site">
            <h2>{title}</h2>
            <p class="issue-detail">{url}</p>
            {body}
        </div>"#,
        url = html_escape(&site.url),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use a11ylens_scanner::{analyze_html, ScanOptions};

    fn sites() -> Vec<SiteSummary> {
        let options = ScanOptions::new(None, WcagLevel::Aaa);
        let broken = analyze_html(r#"<html lang="en"><body><img src="a.png"></body></html>"#, &options);
        let clean = analyze_html(
            r#"<html lang="en"><head><title>Fine</title></head><body><h1>Fine</h1></body></html>"#,
            &options,
        );
        vec![
            SiteSummary::failed("https://down.example", "HTTP 503 <Service Unavailable>"),
            SiteSummary::scanned(
                "https://bank.example/?a=1&b=2",
                Some("Bank".into()),
                &broken,
                Some("002_bank.example.html".into()),
            ),
            SiteSummary::scanned("https://fine.example", None, &clean, None),
        ]
    }

    #[test]
    fn test_summary_counts() {
        let html = build_batch_report(&sites(), WcagLevel::Aaa, Utc::now());
        assert!(html.contains(
            r#"<div class="stat-value">3</div><div class="stat-label">Sites Scanned</div>"#
        ));
        assert!(html.contains(
            r#"<div class="stat-value">1</div><div class="stat-label">Sites With Issues</div>"#
        ));
        assert!(html.contains(
            r#"<div class="stat-value">1</div><div class="stat-label">Sites With Errors</div>"#
        ));
    }

    #[test]
    fn test_site_cards() {
        let html = build_batch_report(&sites(), WcagLevel::Aaa, Utc::now());
        assert!(html.contains("HTTP 503 &lt;Service Unavailable&gt;"));
        assert!(html.contains("https://bank.example/?a=1&amp;b=2"));
        assert!(html.contains("Accessibility issues detected."));
        assert!(html.contains("<strong>Score:</strong> 99 / 100"));
        assert!(html.contains(r#"<a href="002_bank.example.html">Full report</a>"#));
        assert!(html.contains("No issues detected by current checks."));
        assert_eq!(html.matches("(no title)").count(), 2);
        assert_eq!(html.matches("class=\"category site\"").count(), 3);
    }

    #[test]
    fn test_empty_batch() {
        let html = build_batch_report(&[], WcagLevel::Aa, Utc::now());
        assert!(html.contains(
            r#"<div class="stat-value">0</div><div class="stat-label">Sites Scanned</div>"#
        ));
        assert!(html.trim_end().ends_with("</html>"));
    }
}
