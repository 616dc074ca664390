//! Chromium-backed page controller using chromiumoxide.

use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::page::Page;
use futures::StreamExt;

use crate::error::{ResolveError, Result};
use crate::traits::page::{PageController, PageLink, PageSession};

const LINKS_JS: &str = r#"Array.from(document.querySelectorAll('a[href]'))
    .slice(0, 200)
    .map(a => ({text: (a.innerText || '').trim().slice(0, 200), href: a.href}))"#;

/// A headless Chromium instance handing out tabs.
pub struct ChromiumBrowser {
    browser: Browser,
}

impl ChromiumBrowser {
    /// Launch a headless Chromium found on PATH.
    pub async fn launch() -> Result<Self> {
        let chrome = which::which("google-chrome")
            .or_else(|_| which::which("chromium"))
            .or_else(|_| which::which("chromium-browser"))
            .map_err(ResolveError::session)?;

        let config = BrowserConfig::builder()
            .chrome_executable(chrome)
            .arg("--headless=new")
            .arg("--disable-gpu")
            .arg("--no-sandbox")
            .arg("--disable-dev-shm-usage")
            .build()
            .map_err(ResolveError::session)?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(ResolveError::session)?;

        // The handler stream must be drained for the browser to make progress.
        tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                let _ = event;
            }
        });

        Ok(Self { browser })
    }
}

#[async_trait]
impl PageSession for ChromiumBrowser {
    async fn open_page(&self) -> Result<Box<dyn PageController>> {
        let page = self
            .browser
            .new_page("about:blank")
            .await
            .map_err(ResolveError::session)?;
        Ok(Box::new(ChromiumPage { page }))
    }
}

/// One Chromium tab.
pub struct ChromiumPage {
    page: Page,
}

impl ChromiumPage {
    async fn eval<T: serde::de::DeserializeOwned>(&self, script: &str) -> Result<T> {
        let result = self
            .page
            .evaluate(script)
            .await
            .map_err(ResolveError::session)?;
        result.into_value().map_err(ResolveError::session)
    }
}

#[async_trait]
impl PageController for ChromiumPage {
    async fn navigate(&self, url: &str, timeout_ms: u64) -> Result<()> {
        tokio::time::timeout(Duration::from_millis(timeout_ms), self.page.goto(url))
            .await
            .map_err(|_| {
                ResolveError::session(format!("navigation timed out after {timeout_ms} ms"))
            })?
            .map_err(ResolveError::session)?;
        let _ = self.page.wait_for_navigation().await;
        Ok(())
    }

    async fn current_url(&self) -> Result<String> {
        Ok(self
            .page
            .url()
            .await
            .map_err(ResolveError::session)?
            .map(|u| u.to_string())
            .unwrap_or_default())
    }

    async fn visible_text(&self) -> Result<String> {
        self.eval("document.body ? document.body.innerText : ''")
            .await
    }

    async fn html_source(&self) -> Result<String> {
        self.eval("document.documentElement.outerHTML").await
    }

    async fn links(&self) -> Result<Vec<PageLink>> {
        self.eval(LINKS_JS).await
    }

    async fn click(&self, index: usize, timeout_ms: u64) -> Result<()> {
        let script = format!(
            "(() => {{ const a = document.querySelectorAll('a[href]')[{index}]; \
             if (a) a.click(); return !!a; }})()"
        );
        let clicked: bool = self.eval(&script).await?;
        if !clicked {
            return Err(ResolveError::session(format!(
                "link index {index} out of range"
            )));
        }
        // Same-page anchors never navigate; ignore the timeout here.
        let _ = tokio::time::timeout(
            Duration::from_millis(timeout_ms),
            self.page.wait_for_navigation(),
        )
        .await;
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.page
            .clone()
            .close()
            .await
            .map_err(ResolveError::session)
    }
}
