use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Backend error: {0}")]
    Backend(String),

    #[error("Browser error: {0}")]
    Browser(String),

    /// Internal browser pages cannot be scanned.
    #[error("Cannot analyze browser internal pages. Please navigate to a regular webpage. ({0})")]
    Restricted(String),

    /// No page agent answered; the page must be reloaded.
    #[error("Page agent unavailable: {0}. Please refresh the page and try again.")]
    PageUnavailable(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Timeout: {0}")]
    Timeout(String),
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_restricted_names_the_url() {
        let msg = Error::Restricted("chrome://settings".into()).to_string();
        assert!(msg.starts_with("Cannot analyze browser internal pages"));
        assert!(msg.contains("chrome://settings"));
    }

    #[test]
    fn test_page_unavailable_mentions_refresh() {
        let msg = Error::PageUnavailable("no agent".into()).to_string();
        assert!(msg.contains("refresh the page"));
    }
}
