use a11ylens_core::{ReportEntry, Result};
use serde_json::Value;
use tracing::warn;

use crate::prefs::{PrefStore, KEY_REPORT_HISTORY};

pub const DEFAULT_HISTORY_LIMIT: usize = 20;

/// Bounded newest-first list of generated reports.
pub struct ReportHistory<'a> {
    store: &'a PrefStore,
    limit: usize,
}

impl<'a> ReportHistory<'a> {
    pub fn new(store: &'a PrefStore, limit: usize) -> Self {
        Self {
            store,
            limit: limit.max(1),
        }
    }

    pub fn entries(&self) -> Result<Vec<ReportEntry>> {
        let Some(value) = self.store.get(KEY_REPORT_HISTORY)? else {
            return Ok(Vec::new());
        };
        match serde_json::from_value::<Vec<ReportEntry>>(value) {
            Ok(entries) => Ok(entries),
            Err(e) => {
                warn!(error = %e, "Report history is unreadable, treating as empty");
                Ok(Vec::new())
            }
        }
    }

    /// Prepend an entry and drop the oldest beyond the limit.
    pub fn add(&self, entry: ReportEntry) -> Result<Vec<ReportEntry>> {
        let mut entries = self.entries()?;
        entries.insert(0, entry);
        entries.truncate(self.limit);
        self.store
            .set(KEY_REPORT_HISTORY, serde_json::to_value(&entries)?)?;
        Ok(entries)
    }

    pub fn clear(&self) -> Result<()> {
        self.store.set(KEY_REPORT_HISTORY, Value::Array(Vec::new()))
    }
}
