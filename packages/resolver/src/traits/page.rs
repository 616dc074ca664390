//! Browser tab capability interface.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// One visible link on a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageLink {
    pub text: String,
    pub href: String,
}

impl PageLink {
    pub fn new(text: impl Into<String>, href: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            href: href.into(),
        }
    }
}

/// Capability interface over a single browser tab.
///
/// Implementations are expected to resolve relative hrefs against the
/// current URL themselves. All operations may suspend; none spin.
#[async_trait]
pub trait PageController: Send + Sync {
    /// Load `url`, waiting for navigation up to `timeout_ms`.
    async fn navigate(&self, url: &str, timeout_ms: u64) -> Result<()>;

    /// URL of the currently loaded page.
    async fn current_url(&self) -> Result<String>;

    /// Rendered, human-visible text of the page.
    async fn visible_text(&self) -> Result<String>;

    /// Raw HTML source of the page.
    async fn html_source(&self) -> Result<String>;

    /// Visible links, in document order. `click` indices refer to the
    /// most recent enumeration.
    async fn links(&self) -> Result<Vec<PageLink>>;

    /// Click the `index`-th link from the last `links()` call and wait
    /// for navigation up to `timeout_ms`.
    async fn click(&self, index: usize, timeout_ms: u64) -> Result<()>;

    /// Terminate the tab. Further calls may fail.
    async fn close(&self) -> Result<()>;
}

/// Factory handing out fresh tabs.
///
/// Every resolution gets its own page so no state leaks between attempts;
/// the batch orchestrator opens one per domain task.
#[async_trait]
pub trait PageSession: Send + Sync {
    async fn open_page(&self) -> Result<Box<dyn PageController>>;
}
