//! Mock collaborators for testing.
//!
//! These are useful for testing resolution logic without a real browser,
//! inference service, or registry. The mock browser serves a scripted
//! site graph and supports fault injection on navigation; it also tracks
//! how many pages are open at once, which is how the concurrency-bound
//! tests observe the semaphore.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use url::Url;

use crate::error::{ResolveError, Result};
use crate::traits::candidates::CandidateUrls;
use crate::traits::inference::Inference;
use crate::traits::page::{PageController, PageLink, PageSession};
use crate::traits::registry::{Registry, RegistryRecord};

/// Content served for one URL by the mock browser.
#[derive(Debug, Clone, Default)]
pub struct PageSpec {
    pub text: String,
    pub html: String,
    pub links: Vec<PageLink>,
}

impl PageSpec {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn with_html(mut self, html: impl Into<String>) -> Self {
        self.html = html.into();
        self
    }

    pub fn with_link(mut self, text: impl Into<String>, href: impl Into<String>) -> Self {
        self.links.push(PageLink::new(text, href));
        self
    }
}

/// A scripted in-memory browser serving a fixed site graph.
///
/// URLs absent from the graph load as blank pages. Navigation to a URL in
/// the failure set returns a session error, which is how tests force a
/// fatal fault into exactly one domain.
#[derive(Default)]
pub struct MockBrowser {
    pages: Arc<RwLock<HashMap<String, PageSpec>>>,
    revisions: Arc<RwLock<HashMap<String, PageSpec>>>,
    fail_navigation: Arc<RwLock<HashSet<String>>>,
    nav_delay: Option<Duration>,
    active: Arc<AtomicUsize>,
    high_water: Arc<AtomicUsize>,
    opened: Arc<AtomicUsize>,
}

impl MockBrowser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `spec` at `url` (absolute, as the resolver will see it).
    pub fn with_page(self, url: impl Into<String>, spec: PageSpec) -> Self {
        self.pages.write().unwrap().insert(url.into(), spec);
        self
    }

    /// Replace the page at `url` with `spec` after its HTML is read once.
    /// Models content that changes between an extraction and a later
    /// re-read of the same page.
    pub fn with_page_revision(self, url: impl Into<String>, spec: PageSpec) -> Self {
        self.revisions.write().unwrap().insert(url.into(), spec);
        self
    }

    /// Fail every navigation to `url`; `"*"` fails all navigations.
    pub fn fail_navigation_to(self, url: impl Into<String>) -> Self {
        self.fail_navigation.write().unwrap().insert(url.into());
        self
    }

    /// Delay each navigation, forcing overlap in concurrency tests.
    pub fn with_nav_delay(mut self, delay: Duration) -> Self {
        self.nav_delay = Some(delay);
        self
    }

    /// Most pages open at the same time, over the browser's lifetime.
    pub fn high_water_mark(&self) -> usize {
        self.high_water.load(Ordering::SeqCst)
    }

    /// Total pages handed out.
    pub fn pages_opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PageSession for MockBrowser {
    async fn open_page(&self) -> Result<Box<dyn PageController>> {
        self.opened.fetch_add(1, Ordering::SeqCst);
        let now_active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.high_water.fetch_max(now_active, Ordering::SeqCst);

        Ok(Box::new(MockPage {
            pages: Arc::clone(&self.pages),
            revisions: Arc::clone(&self.revisions),
            fail_navigation: Arc::clone(&self.fail_navigation),
            nav_delay: self.nav_delay,
            active: Arc::clone(&self.active),
            current: RwLock::new(None),
            closed: AtomicBool::new(false),
        }))
    }
}

/// One scripted tab handed out by [`MockBrowser`].
pub struct MockPage {
    pages: Arc<RwLock<HashMap<String, PageSpec>>>,
    revisions: Arc<RwLock<HashMap<String, PageSpec>>>,
    fail_navigation: Arc<RwLock<HashSet<String>>>,
    nav_delay: Option<Duration>,
    active: Arc<AtomicUsize>,
    current: RwLock<Option<String>>,
    closed: AtomicBool,
}

impl MockPage {
    fn spec(&self) -> PageSpec {
        let current = self.current.read().unwrap().clone();
        match current {
            Some(url) => self
                .pages
                .read()
                .unwrap()
                .get(&url)
                .cloned()
                .unwrap_or_default(),
            None => PageSpec::default(),
        }
    }

    /// Swap in the pending revision for the current URL, if any. Runs
    /// after the HTML read so one full text+HTML extraction sees the
    /// original content.
    fn apply_revision(&self) {
        let Some(url) = self.current.read().unwrap().clone() else {
            return;
        };
        let revision = self.revisions.write().unwrap().remove(&url);
        if let Some(spec) = revision {
            self.pages.write().unwrap().insert(url, spec);
        }
    }

    fn absolutize(&self, href: &str) -> String {
        if href.starts_with("http://") || href.starts_with("https://") {
            return href.to_string();
        }
        let current = self.current.read().unwrap().clone();
        match current.and_then(|c| Url::parse(&c).ok()) {
            Some(base) => base
                .join(href)
                .map(|u| u.to_string())
                .unwrap_or_else(|_| href.to_string()),
            None => href.to_string(),
        }
    }
}

#[async_trait]
impl PageController for MockPage {
    async fn navigate(&self, url: &str, _timeout_ms: u64) -> Result<()> {
        if let Some(delay) = self.nav_delay {
            tokio::time::sleep(delay).await;
        }

        {
            let fails = self.fail_navigation.read().unwrap();
            if fails.contains("*") || fails.contains(url) {
                return Err(ResolveError::session(format!(
                    "forced navigation failure: {url}"
                )));
            }
        }

        *self.current.write().unwrap() = Some(url.to_string());
        Ok(())
    }

    async fn current_url(&self) -> Result<String> {
        self.current
            .read()
            .unwrap()
            .clone()
            .ok_or_else(|| ResolveError::session("no page loaded"))
    }

    async fn visible_text(&self) -> Result<String> {
        Ok(self.spec().text)
    }

    async fn html_source(&self) -> Result<String> {
        let html = self.spec().html;
        self.apply_revision();
        Ok(html)
    }

    async fn links(&self) -> Result<Vec<PageLink>> {
        Ok(self.spec().links)
    }

    async fn click(&self, index: usize, timeout_ms: u64) -> Result<()> {
        let href = self
            .spec()
            .links
            .get(index)
            .map(|l| l.href.clone())
            .ok_or_else(|| ResolveError::session(format!("link index {index} out of range")))?;
        let absolute = self.absolutize(&href);
        self.navigate(&absolute, timeout_ms).await
    }

    async fn close(&self) -> Result<()> {
        if !self.closed.swap(true, Ordering::SeqCst) {
            self.active.fetch_sub(1, Ordering::SeqCst);
        }
        Ok(())
    }
}

/// A mock inference service with a scripted reply queue.
///
/// Replies are consumed in order; once the queue is empty the default
/// reply ("0", i.e. click the first link) is returned forever.
pub struct MockInference {
    replies: Arc<RwLock<Vec<String>>>,
    default_reply: String,
    fail: bool,
    calls: Arc<RwLock<Vec<String>>>,
}

impl Default for MockInference {
    fn default() -> Self {
        Self {
            replies: Arc::default(),
            default_reply: "0".to_string(),
            fail: false,
            calls: Arc::default(),
        }
    }
}

impl MockInference {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue one reply (consumed before the default kicks in).
    pub fn with_reply(self, reply: impl Into<String>) -> Self {
        self.replies.write().unwrap().push(reply.into());
        self
    }

    pub fn with_default_reply(mut self, reply: impl Into<String>) -> Self {
        self.default_reply = reply.into();
        self
    }

    /// Make every generate call fail.
    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    /// Prompts received so far.
    pub fn calls(&self) -> Vec<String> {
        self.calls.read().unwrap().clone()
    }
}

#[async_trait]
impl Inference for MockInference {
    async fn generate(&self, prompt: &str, _timeout_ms: u64) -> Result<String> {
        self.calls.write().unwrap().push(prompt.to_string());
        if self.fail {
            return Err(ResolveError::inference("forced inference failure"));
        }
        let mut replies = self.replies.write().unwrap();
        if replies.is_empty() {
            Ok(self.default_reply.clone())
        } else {
            Ok(replies.remove(0))
        }
    }

    async fn health_check(&self) -> bool {
        !self.fail
    }
}

/// A mock registry with predefined records by lookup key.
#[derive(Default)]
pub struct MockRegistry {
    records: Arc<RwLock<HashMap<String, RegistryRecord>>>,
    fail: bool,
    calls: Arc<RwLock<Vec<String>>>,
}

impl MockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_record(self, key: impl Into<String>, record: RegistryRecord) -> Self {
        self.records.write().unwrap().insert(key.into(), record);
        self
    }

    /// Make every lookup fail.
    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    /// Lookup keys received so far.
    pub fn calls(&self) -> Vec<String> {
        self.calls.read().unwrap().clone()
    }
}

#[async_trait]
impl Registry for MockRegistry {
    async fn lookup(&self, key: &str) -> Result<Option<RegistryRecord>> {
        self.calls.write().unwrap().push(key.to_string());
        if self.fail {
            return Err(ResolveError::registry("forced registry failure"));
        }
        Ok(self.records.read().unwrap().get(key).cloned())
    }
}

/// A mock candidate-URL provider backed by a map.
#[derive(Default)]
pub struct MockCandidates {
    urls: Arc<RwLock<HashMap<String, String>>>,
}

impl MockCandidates {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_url(self, domain: impl Into<String>, url: impl Into<String>) -> Self {
        self.urls.write().unwrap().insert(domain.into(), url.into());
        self
    }
}

#[async_trait]
impl CandidateUrls for MockCandidates {
    async fn candidate_url(&self, domain: &str) -> Result<Option<String>> {
        Ok(self.urls.read().unwrap().get(domain).cloned())
    }
}
