use a11ylens_core::{Config, Paths};
use a11ylens_storage::{PrefStore, ReportHistory, DEFAULT_HISTORY_LIMIT};
use chrono::{Local, TimeZone};

pub async fn list() -> anyhow::Result<()> {
    let paths = Paths::new();
    let config = Config::load_or_default(&paths)?;
    let store = PrefStore::new(&paths);
    let entries = ReportHistory::new(&store, config.history.limit).entries()?;

    if entries.is_empty() {
        println!("No reports yet.");
        return Ok(());
    }

    println!("Recent reports ({})", entries.len());
    println!();
    for entry in entries {
        let when = Local
            .timestamp_millis_opt(entry.timestamp)
            .single()
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "-".to_string());
        let issues = entry
            .issues
            .map(|n| format!("{} issue(s)", n))
            .unwrap_or_default();
        println!("  {}  {} ({}) {}", when, entry.title, entry.package_name, issues);
        println!("      {}", entry.report_url);
    }
    Ok(())
}

pub async fn clear() -> anyhow::Result<()> {
    let paths = Paths::new();
    let store = PrefStore::new(&paths);
    ReportHistory::new(&store, DEFAULT_HISTORY_LIMIT).clear()?;
    println!("✓ Report history cleared");
    Ok(())
}
