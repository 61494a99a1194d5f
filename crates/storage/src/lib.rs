pub mod history;
pub mod prefs;

pub use history::{ReportHistory, DEFAULT_HISTORY_LIMIT};
pub use prefs::{MobilePrefs, PrefStore};
