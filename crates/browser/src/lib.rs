pub mod cdp;
pub mod highlight;
pub mod page;
pub mod screenshot;
pub mod session;

pub use cdp::CdpClient;
pub use highlight::{highlight, highlight_plan, remove_highlights, Marker};
pub use page::{
    dimensions, evaluate_as, scroll_to, scroll_to_element, snapshot_document, DocumentSnapshot,
    PageHandle,
};
pub use screenshot::{capture, ScreenshotOptions};
pub use session::{find_browser_binary, BrowserSession};
