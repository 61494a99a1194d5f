//! Renders backend AI/ML results, whose shape varies between backend
//! versions, by inspecting the JSON structure.

use serde_json::{Map, Value};

use crate::html_escape;

const MAX_DEPTH: usize = 6;

pub fn render_findings(results: &Value) -> String {
    render_value(results, 0)
}

fn humanize(key: &str) -> String {
    key.split(['_', '-'])
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Only known severities become CSS classes.
fn severity_class(raw: &str) -> &'static str {
    match raw.trim().to_ascii_lowercase().as_str() {
        "critical" => "critical",
        "high" => "high",
        "medium" => "medium",
        "low" => "low",
        _ => "info",
    }
}

fn scalar(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(if *b { "Yes" } else { "No" }.to_string()),
        _ => None,
    }
}

fn render_value(value: &Value, depth: usize) -> String {
    if depth > MAX_DEPTH {
        return format!(
            "<pre class=\"code\">{}</pre>",
            html_escape(&value.to_string())
        );
    }
    match value {
        Value::Null => String::new(),
        Value::String(s) => format!("<p class=\"narrative\">{}</p>", html_escape(s)),
        Value::Number(_) | Value::Bool(_) => format!(
            "<span class=\"stat-value\">{}</span>",
            html_escape(&scalar(value).unwrap_or_default())
        ),
        Value::Array(items) => render_array(items, depth),
        Value::Object(map) => render_object(map, depth),
    }
}

fn render_array(items: &[Value], depth: usize) -> String {
    if items.is_empty() {
        return String::new();
    }
    if items.iter().all(|v| v.is_string()) {
        let lis: String = items
            .iter()
            .filter_map(|v| v.as_str())
            .map(|s| format!("<li>{}</li>", html_escape(s)))
            .collect();
        return format!("<ul class=\"insights\">{}</ul>", lis);
    }
    items.iter().map(|v| render_value(v, depth + 1)).collect()
}

fn render_object(map: &Map<String, Value>, depth: usize) -> String {
    if let Some(severity) = map.get("severity").and_then(|v| v.as_str()) {
        return render_severity_block(map, severity, depth);
    }
    if !map.is_empty() && map.values().all(|v| scalar(v).is_some() || v.is_null()) {
        let cards: String = map
            .iter()
            .filter_map(|(k, v)| scalar(v).map(|s| (k, s)))
            .map(|(k, s)| {
                format!(
                    "<div class=\"stat\"><div class=\"stat-value\">{}</div><div class=\"stat-label\">{}</div></div>",
                    html_escape(&s),
                    html_escape(&humanize(k))
                )
            })
            .collect();
        return format!("<div class=\"stats\">{}</div>", cards);
    }
    map.iter()
        .filter(|(_, v)| !v.is_null())
        .map(|(k, v)| {
            format!(
                "<div class=\"group\"><h4>{}</h4>{}</div>",
                html_escape(&humanize(k)),
                render_value(v, depth + 1)
            )
        })
        .collect()
}

fn render_severity_block(map: &Map<String, Value>, severity: &str, depth: usize) -> String {
    let title = ["issue", "title", "type", "category"]
        .iter()
        .find_map(|k| map.get(*k).and_then(scalar))
        .unwrap_or_else(|| "Finding".to_string());
    let details: String = map
        .iter()
        .filter(|(k, _)| !matches!(k.as_str(), "severity" | "issue" | "title"))
        .map(|(k, v)| match scalar(v) {
            Some(s) => format!(
                "<div class=\"issue-detail\"><strong>{}:</strong> {}</div>",
                html_escape(&humanize(k)),
                html_escape(&s)
            ),
            None => format!(
                "<div class=\"issue-detail\"><strong>{}:</strong>{}</div>",
                html_escape(&humanize(k)),
                render_value(v, depth + 1)
            ),
        })
        .collect();
    format!(
        "<div class=\"finding severity-{cls}\"><div class=\"issue-title\">{title} <span class=\"badge\">{sev}</span></div>{details}</div>",
        cls = severity_class(severity),
        title = html_escape(&humanize_title(&title)),
        sev = html_escape(severity),
        details = details,
    )
}

fn humanize_title(title: &str) -> String {
    if title.contains('_') {
        humanize(title)
    } else {
        title.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_narrative_and_list() {
        let html = render_findings(&json!({
            "status": "AI/ML analysis completed",
            "recommendations": ["Add <alt>", "Use labels"]
        }));
        assert!(html.contains("<h4>Status</h4><p class=\"narrative\">AI/ML analysis completed</p>"));
        assert!(html.contains("<li>Add &lt;alt&gt;</li>"));
    }

    #[test]
    fn test_severity_block_class_is_sanitized() {
        let html = render_findings(&json!([
            {"type": "missing_alt_text", "count": 3, "severity": "critical", "impact": "Blind users"},
            {"type": "x", "severity": "\"><script>"}
        ]));
        assert!(html.contains("severity-critical"));
        assert!(html.contains("Missing Alt Text"));
        assert!(html.contains("severity-info"));
        assert!(!html.contains("<script>"));
    }

    #[test]
    fn test_scalar_object_becomes_stats() {
        let html = render_findings(&json!({"text_quality": 72, "has_label_issues": true}));
        assert!(html.starts_with("<div class=\"stats\">"));
        assert!(html.contains("<div class=\"stat-label\">Text Quality</div>"));
        assert!(html.contains(">Yes<"));
    }

    #[test]
    fn test_depth_limit() {
        let mut value = json!("leaf");
        for _ in 0..10 {
            value = json!({ "nested": [value, 1] });
        }
        let html = render_findings(&value);
        assert!(html.contains("<pre class=\"code\">"));
    }
}
