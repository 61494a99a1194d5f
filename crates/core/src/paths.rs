use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct Paths {
    pub base: PathBuf,
}

impl Paths {
    pub fn new() -> Self {
        let base = dirs::home_dir()
            .map(|h| h.join(".a11ylens"))
            .unwrap_or_else(|| PathBuf::from(".a11ylens"));
        Self { base }
    }

    pub fn with_base(base: PathBuf) -> Self {
        Self { base }
    }

    pub fn config_file(&self) -> PathBuf {
        self.base.join("config.json")
    }

    /// Key-value blob holding mobile preferences and the report history.
    pub fn prefs_file(&self) -> PathBuf {
        self.base.join("prefs.json")
    }

    pub fn reports_dir(&self) -> PathBuf {
        self.base.join("reports")
    }

    pub fn report_file(&self, stem: &str) -> PathBuf {
        let safe: String = stem
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.reports_dir().join(format!("{}.html", safe))
    }

    /// Chrome user-data directory for the CDP-driven browser.
    pub fn browser_dir(&self) -> PathBuf {
        self.base.join("browser")
    }

    pub fn ensure_dirs(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.base)?;
        std::fs::create_dir_all(self.reports_dir())?;
        std::fs::create_dir_all(self.browser_dir())?;
        Ok(())
    }
}

impl Default for Paths {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_report_file_sanitizes_stem() {
        let paths = Paths::with_base(PathBuf::from("/tmp/a11y"));
        let file = paths.report_file("example.com/a b");
        assert_eq!(file, PathBuf::from("/tmp/a11y/reports/example_com_a_b.html"));
    }

    #[test]
    fn test_ensure_dirs_creates_layout() {
        let dir = TempDir::new().unwrap();
        let paths = Paths::with_base(dir.path().join("home"));
        paths.ensure_dirs().unwrap();
        assert!(paths.reports_dir().is_dir());
        assert!(paths.browser_dir().is_dir());
    }
}
