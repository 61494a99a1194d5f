//! Numbered overlay markers on flagged elements.
//!
//! Elements are found again by re-running each category selector on the
//! live page and taking the recorded position. If the page mutated since
//! the scan, a marker can land on a different element than the one that
//! was flagged; markers are a visual aid and that drift is accepted.

use a11ylens_core::{Category, IssueReport, Result};
use serde::Serialize;
use tracing::debug;

use crate::page::PageHandle;

pub const HIGHLIGHT_ATTR: &str = "data-a11ylens-highlight";

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Marker {
    pub number: usize,
    pub selector: &'static str,
    pub index: usize,
    pub label: &'static str,
}

/// Markers in drawing order, numbered from 1.
pub fn highlight_plan(report: &IssueReport) -> Vec<Marker> {
    let mut markers = Vec::new();
    for category in Category::HIGHLIGHT_ORDER {
        for index in report.indices(category) {
            markers.push(Marker {
                number: markers.len() + 1,
                selector: category.selector(),
                index,
                label: category.marker_label(),
            });
        }
    }
    markers
}

fn remove_script() -> String {
    format!(
        "(() => {{ const old = document.querySelectorAll('[{attr}]'); old.forEach(n => n.remove()); return old.length; }})()",
        attr = HIGHLIGHT_ATTR
    )
}

const DRAW_FN: &str = r#"(plan, attr) => {
  document.querySelectorAll('[' + attr + ']').forEach(n => n.remove());
  let drawn = 0;
  for (const m of plan) {
    const el = document.querySelectorAll(m.selector)[m.index];
    if (!el || !document.body) continue;
    const rect = el.getBoundingClientRect();
    const box = document.createElement('div');
    box.setAttribute(attr, 'true');
    box.title = m.label;
    box.style.cssText = 'position:absolute;border:3px solid #ff4444;background:rgba(255,68,68,0.15);'
      + 'pointer-events:none;z-index:999999;box-shadow:0 0 10px rgba(255,68,68,0.5);';
    box.style.top = (rect.top + window.scrollY) + 'px';
    box.style.left = (rect.left + window.scrollX) + 'px';
    box.style.width = Math.max(rect.width, 20) + 'px';
    box.style.height = Math.max(rect.height, 20) + 'px';
    const badge = document.createElement('div');
    badge.setAttribute(attr, 'true');
    badge.textContent = String(m.number);
    badge.title = m.label;
    badge.style.cssText = 'position:absolute;top:-12px;left:-12px;width:24px;height:24px;'
      + 'background:#ff4444;color:white;border-radius:50%;display:flex;align-items:center;'
      + 'justify-content:center;font:bold 12px Arial,sans-serif;'
      + 'box-shadow:0 2px 4px rgba(0,0,0,0.3);z-index:1000000;';
    box.appendChild(badge);
    document.body.appendChild(box);
    drawn++;
  }
  return drawn;
}"#;

/// Clear old markers and draw new ones. Returns how many were drawn.
pub async fn highlight(page: &dyn PageHandle, report: &IssueReport) -> Result<usize> {
    let plan = highlight_plan(report);
    let expression = format!(
        "({})({}, {})",
        DRAW_FN,
        serde_json::to_string(&plan)?,
        serde_json::to_string(HIGHLIGHT_ATTR)?
    );
    let drawn = page.evaluate(&expression).await?.as_u64().unwrap_or(0) as usize;
    debug!(planned = plan.len(), drawn, "Highlights drawn");
    Ok(drawn)
}

pub async fn remove_highlights(page: &dyn PageHandle) -> Result<usize> {
    let removed = page.evaluate(&remove_script()).await?.as_u64().unwrap_or(0) as usize;
    Ok(removed)
}
