//! Self-contained HTML report rendering.
//!
//! The output embeds its CSS and the optional screenshot as a data URI so a
//! saved report stays viewable offline.

mod batch;
mod findings;
mod sections;

pub use batch::{build_batch_report, SiteOutcome, SiteSummary};
pub use findings::render_findings;

use a11ylens_core::{BackendAssessment, Category, ComplianceAssessment, IssueReport, WcagLevel};
use a11ylens_scanner::{explain, score, Advisory, AdvisoryKind, ExplanationSet, PageInsights};
use base64::Engine;
use chrono::{DateTime, Utc};
use tracing::warn;

pub const MODE_FULL: &str = "Full Analysis (Rule-Based + AI/ML)";
pub const MODE_RULE_BASED: &str = "Rule-Based Analysis";
pub const MODE_CLIENT_ONLY: &str = "Client-Side Analysis (backend unavailable)";

/// Inputs for one report.
#[derive(Debug, Clone)]
pub struct ReportRequest<'a> {
    pub url: &'a str,
    pub title: &'a str,
    pub level: WcagLevel,
    pub issues: &'a IssueReport,
    /// Base64 PNG, with or without a `data:` prefix.
    pub screenshot: Option<&'a str>,
    pub backend: Option<&'a BackendAssessment>,
    pub insights: Option<&'a PageInsights>,
    /// Level AAA advisories, rendered apart from the scored categories.
    pub advisories: &'a [Advisory],
    pub generated_at: DateTime<Utc>,
}

impl<'a> ReportRequest<'a> {
    pub fn new(url: &'a str, title: &'a str, issues: &'a IssueReport, level: WcagLevel) -> Self {
        Self {
            url,
            title,
            level,
            issues,
            screenshot: None,
            backend: None,
            insights: None,
            advisories: &[],
            generated_at: Utc::now(),
        }
    }

    pub fn analysis_mode(&self) -> &'static str {
        match self.backend {
            Some(b) if b.ai_ml_enabled => MODE_FULL,
            Some(_) => MODE_RULE_BASED,
            None => MODE_CLIENT_ONLY,
        }
    }
}

pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Returns the bare base64 payload if it decodes.
fn valid_screenshot(raw: &str) -> Option<String> {
    let payload = match raw.split_once("base64,") {
        Some((prefix, data)) if prefix.starts_with("data:") => data,
        _ => raw,
    };
    let payload = payload.trim();
    match base64::engine::general_purpose::STANDARD.decode(payload) {
        Ok(bytes) if !bytes.is_empty() => Some(payload.to_string()),
        Ok(_) => None,
        Err(e) => {
            warn!(error = %e, "Screenshot is not valid base64, omitting from report");
            None
        }
    }
}

pub fn build_report(req: &ReportRequest) -> String {
    let assessment = score(req.issues);
    let explanations = explain(req.issues);

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Accessibility Report - {title}</title>
    <style>{css}</style>
</head>
<body>
    <div class="container">
        {header}
        {screenshot}
        {summary}
        {assessment}
        {categories}
        {advisories}
        {explanations}
        {insights}
        {findings}
        {footer}
    </div>
</body>
</html>"#,
        title = html_escape(req.title),
        css = inline_css(),
        header = render_header(req),
        screenshot = req
            .screenshot
            .and_then(valid_screenshot)
            .map(|data| render_screenshot(&data))
            .unwrap_or_default(),
        summary = render_summary(req, &assessment),
        assessment = render_assessment(&assessment),
        categories = Category::ALL
            .iter()
            .map(|c| sections::render_category(req.issues, *c))
            .collect::<String>(),
        advisories = render_advisories(req),
        explanations = render_explanations(&explanations),
        insights = req.insights.map(render_insights).unwrap_or_default(),
        findings = req.backend.map(render_backend).unwrap_or_default(),
        footer = render_footer(req),
    )
}

fn render_header(req: &ReportRequest) -> String {
    format!(
        r#"<div class="header">
            <h1>🔍 Accessibility Report</h1>
            <p><strong>Page:</strong> {title}</p>
            <p><strong>URL:</strong> {url}</p>
            <p><strong>Generated:</strong> {timestamp}</p>
            <p><strong>WCAG Level:</strong> {level}</p>
            <p><strong>Analysis Mode:</strong> {mode}</p>
        </div>"#,
        title = html_escape(req.title),
        url = html_escape(req.url),
        timestamp = req.generated_at.format("%Y-%m-%d %H:%M:%S UTC"),
        level = req.level,
        mode = req.analysis_mode(),
    )
}

fn render_screenshot(data: &str) -> String {
    format!(
        r#"<div class="category screenshot"><h2>📸 Page Screenshot</h2><img src="data:image/png;base64,{}" alt="Screenshot of the analyzed page with issue markers"></div>"#,
        data
    )
}

fn render_summary(req: &ReportRequest, assessment: &ComplianceAssessment) -> String {
    let rows: String = Category::ALL
        .iter()
        .map(|c| sections::render_summary_row(c.label(), req.issues.count(*c)))
        .collect();
    format!(
        r#"<div class="summary">
            <h2>Summary</h2>
            <div class="score tier-{tier_class}"><span class="score-value">{score}</span><span class="score-label">/ 100 · {tier}</span></div>
            <p class="narrative">{summary}</p>
            {total}
            {rows}
        </div>"#,
        tier_class = assessment.tier.as_str().to_ascii_lowercase(),
        score = assessment.compliance_score,
        tier = assessment.tier,
        summary = html_escape(&assessment.summary),
        total = sections::render_summary_row("Total Issues Found", req.issues.total()),
        rows = rows,
    )
}

fn render_assessment(assessment: &ComplianceAssessment) -> String {
    let bucket = |title: &str, entries: &[a11ylens_core::RiskEntry]| -> String {
        if entries.is_empty() {
            return format!(
                "<h3>{}</h3><div class=\"no-issues\">✓ None</div>",
                html_escape(title)
            );
        }
        let items: String = entries
            .iter()
            .map(|e| {
                format!(
                    "<div class=\"finding severity-{sev}\"><div class=\"issue-title\">{cat} <span class=\"badge\">{sev}</span></div><div class=\"issue-detail\">{count} issue(s): {impact}</div></div>",
                    sev = e.severity,
                    cat = e.category.label(),
                    count = e.count,
                    impact = html_escape(&e.impact),
                )
            })
            .collect();
        format!("<h3>{}</h3>{}", html_escape(title), items)
    };
    let p = &assessment.patterns;
    format!(
        r#"<div class="category" id="assessment">
            <h2>📊 Heuristic Assessment</h2>
            {high}
            {low}
            <div class="stats">
                <div class="stat"><div class="stat-value">{total}</div><div class="stat-label">Total Issues</div></div>
                <div class="stat"><div class="stat-value">{critical}</div><div class="stat-label">High Risk</div></div>
                <div class="stat"><div class="stat-value">{medium}</div><div class="stat-label">Low Risk</div></div>
            </div>
        </div>"#,
        high = bucket("High Risk", &assessment.high_risk_issues),
        low = bucket("Low Risk", &assessment.low_risk_issues),
        total = p.total_issues,
        critical = p.critical_issues,
        medium = p.medium_issues,
    )
}

/// Shown only for level AAA reports; an empty list still gets its section.
fn render_advisories(req: &ReportRequest) -> String {
    if req.level != WcagLevel::Aaa {
        return String::new();
    }
    let body = if req.advisories.is_empty() {
        "<div class=\"no-issues\">✓ No advisory findings</div>".to_string()
    } else {
        AdvisoryKind::ALL
            .iter()
            .filter_map(|kind| render_advisory_group(*kind, req.advisories))
            .collect()
    };
    format!(
        r#"<div class="category" id="advisories">
            <h2>🔎 Level AAA Advisory Checks</h2>
            <p class="issue-detail">Advisory only. These findings are not counted in the score.</p>
            {body}
        </div>"#,
    )
}

fn render_advisory_group(kind: AdvisoryKind, advisories: &[Advisory]) -> Option<String> {
    let items: String = advisories
        .iter()
        .filter(|a| a.kind == kind)
        .map(|a| format!("<li>{}</li>", html_escape(&a.message)))
        .collect();
    if items.is_empty() {
        return None;
    }
    Some(format!(
        "<div class=\"group\"><h4>{} (WCAG {})</h4><ul class=\"insights\">{}</ul></div>",
        kind.label(),
        kind.criterion(),
        items
    ))
}

fn render_explanations(set: &ExplanationSet) -> String {
    let records: String = set
        .explanations
        .iter()
        .map(|e| {
            format!(
                r#"<div class="finding severity-{sev}">
                <div class="issue-title">{issue} <span class="badge">{sev}</span></div>
                <div class="issue-detail"><strong>Why:</strong> {why}</div>
                <div class="issue-detail"><strong>Fix:</strong> {fix}</div>
                <div class="issue-detail"><strong>Reference:</strong> {wcag}</div>
                <div class="code">{example}</div>
            </div>"#,
                sev = e.severity,
                issue = html_escape(&e.issue),
                why = html_escape(&e.why),
                fix = html_escape(&e.fix),
                wcag = html_escape(&e.wcag_reference),
                example = html_escape(&e.example),
            )
        })
        .collect();
    let recommendations: String = set
        .recommendations
        .iter()
        .map(|r| {
            format!(
                "<li><strong>{}</strong>: {}</li>",
                html_escape(&r.title),
                html_escape(&r.description)
            )
        })
        .collect();
    let tips: String = set
        .best_practices
        .iter()
        .map(|t| format!("<li>{}</li>", html_escape(t)))
        .collect();
    format!(
        r#"<div class="category" id="explanations">
            <h2>💡 How to Fix</h2>
            {records}
            <h3>Recommendations</h3><ul class="insights">{recommendations}</ul>
            <h3>Best Practices</h3><ul class="insights">{tips}</ul>
        </div>"#,
    )
}

fn render_insights(insights: &PageInsights) -> String {
    let text = &insights.text;
    let images = &insights.images;
    let recommendations: String = text
        .recommendations
        .iter()
        .chain(images.recommendations.iter())
        .map(|r| format!("<li>{}</li>", html_escape(r)))
        .collect();
    format!(
        r#"<div class="category" id="insights">
            <h2>📈 Page Insights</h2>
            <div class="stats">
                <div class="stat"><div class="stat-value">{text_quality}</div><div class="stat-label">Text Quality</div></div>
                <div class="stat"><div class="stat-value">{label_quality}%</div><div class="stat-label">Label Coverage</div></div>
                <div class="stat"><div class="stat-value">{headings}</div><div class="stat-label">Headings</div></div>
                <div class="stat"><div class="stat-value">{sections}</div><div class="stat-label">Semantic Sections</div></div>
                <div class="stat"><div class="stat-value">{with_alt}/{analyzed}</div><div class="stat-label">Images With Alt</div></div>
            </div>
            <ul class="insights">{recommendations}</ul>
        </div>"#,
        text_quality = text.text_quality,
        label_quality = text.label_quality,
        headings = text.semantic_structure.headings_count,
        sections = text.semantic_structure.semantic_sections,
        with_alt = images.images_with_alt,
        analyzed = images.images_analyzed,
        recommendations = recommendations,
    )
}

fn render_backend(backend: &BackendAssessment) -> String {
    let body = if backend.ai_ml_results.is_null() {
        "<div class=\"no-issues\">No AI/ML results returned by the backend</div>".to_string()
    } else {
        render_findings(&backend.ai_ml_results)
    };
    format!(
        r#"<div class="category ai-section" id="ai-findings">
            <h2>🤖 AI/ML Findings</h2>
            {body}
        </div>"#,
    )
}

fn render_footer(req: &ReportRequest) -> String {
    format!(
        r#"<div class="footer">Heuristic indicators only, not a WCAG {level} conformance certification.</div>"#,
        level = req.level
    )
}

pub(crate) fn inline_css() -> &'static str {
    r#"
        body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; margin: 0; background: #f5f5f5; color: #333; }
        .container { max-width: 1100px; margin: 0 auto; padding: 20px; }
        .header { background: linear-gradient(135deg, #667eea 0%, #764ba2 100%); color: white; padding: 30px; border-radius: 10px; margin-bottom: 20px; }
        .header h1 { margin: 0 0 10px 0; }
        .header p { margin: 5px 0; opacity: 0.9; word-break: break-all; }
        .summary, .category { background: white; padding: 20px; border-radius: 10px; margin-bottom: 20px; box-shadow: 0 2px 4px rgba(0,0,0,0.1); }
        .summary-item { display: flex; justify-content: space-between; padding: 10px 0; border-bottom: 1px solid #eee; }
        .summary-item:last-child { border-bottom: none; }
        .count { font-weight: bold; font-size: 24px; color: #dc3545; }
        .count.success { color: #28a745; }
        .score { display: flex; align-items: baseline; gap: 10px; margin-bottom: 10px; }
        .score-value { font-size: 48px; font-weight: bold; }
        .tier-excellent .score-value, .tier-good .score-value { color: #28a745; }
        .tier-fair .score-value { color: #fd7e14; }
        .tier-poor .score-value { color: #dc3545; }
        .category h2 { margin: 0 0 15px 0; padding-bottom: 10px; border-bottom: 3px solid #667eea; }
        .issue { background: #f8f9fa; padding: 15px; margin-bottom: 15px; border-left: 4px solid #dc3545; border-radius: 4px; }
        .issue-title { font-weight: bold; margin-bottom: 8px; }
        .issue-detail { color: #666; font-size: 14px; margin: 5px 0; word-break: break-all; }
        .code { background: #2d2d2d; color: #f8f8f2; padding: 10px; border-radius: 4px; font-family: 'Courier New', monospace; font-size: 12px; overflow-x: auto; margin-top: 10px; white-space: pre-wrap; }
        .no-issues { color: #28a745; font-style: italic; padding: 20px; text-align: center; }
        .finding { padding: 12px 15px; margin-bottom: 12px; border-radius: 4px; border-left: 4px solid #6c757d; background: #f8f9fa; }
        .severity-critical { border-left-color: #dc3545; background: #fdecea; }
        .severity-high { border-left-color: #fd7e14; background: #fff4e5; }
        .severity-medium { border-left-color: #ffc107; background: #fffbea; }
        .severity-low { border-left-color: #17a2b8; background: #e8f7fa; }
        .badge { font-size: 11px; text-transform: uppercase; padding: 2px 8px; border-radius: 10px; background: rgba(0,0,0,0.08); margin-left: 6px; }
        .stats { display: grid; grid-template-columns: repeat(auto-fit, minmax(150px, 1fr)); gap: 12px; margin: 10px 0; }
        .stat { background: #f8f9fa; border-radius: 8px; padding: 12px; text-align: center; }
        .stat-value { font-size: 22px; font-weight: bold; color: #667eea; }
        .stat-label { font-size: 12px; color: #666; margin-top: 4px; }
        .narrative { line-height: 1.5; }
        .group h4 { margin: 15px 0 8px 0; color: #764ba2; }
        .insights li { margin: 4px 0; }
        .screenshot img { max-width: 100%; border: 1px solid #ddd; border-radius: 4px; }
        .footer { text-align: center; color: #999; font-size: 12px; padding: 20px; }
    "#
}
