use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::page::{CaptureSnapshotFormat, CaptureSnapshotParams};
use chromiumoxide::error::CdpError;
use chromiumoxide::Page;
use futures_util::StreamExt;
use serde::Deserialize;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use ws_core::{Error, Locator, Node, PageDriver, Result};

const SCROLL_PAUSE: Duration = Duration::from_millis(200);
const MAX_SCROLL_STEPS: usize = 50;

const FIND_SCRIPT: &str = r#"
(() => {
    const steps = __STEPS__;
    let scope = document;
    for (const step of steps.slice(0, -1)) {
        scope = scope.querySelector(step);
        if (!scope) {
            return { found: false, nodes: [] };
        }
    }
    const nodes = Array.from(scope.querySelectorAll(steps[steps.length - 1])).map((el) => ({
        text: el.innerText ?? el.textContent ?? "",
        attributes: Object.fromEntries(Array.from(el.attributes, (a) => [a.name, a.value])),
    }));
    return { found: true, nodes };
})()
"#;

const SCROLL_SCRIPT: &str = r#"
(() => {
    window.scrollBy(0, window.innerHeight);
    return window.innerHeight + window.scrollY >= document.body.scrollHeight;
})()
"#;

#[derive(Deserialize)]
struct FindResult {
    found: bool,
    nodes: Vec<Node>,
}

fn cdp_error(e: CdpError) -> Error {
    Error::Browser(e.to_string())
}

/// Page driver backed by a Chrome instance over the DevTools protocol.
pub struct ChromiumDriver {
    browser: Mutex<Browser>,
    page: Page,
    handler: JoinHandle<()>,
}

impl ChromiumDriver {
    pub async fn launch(headless: bool) -> Result<Self> {
        tracing::info!("Launching browser (headless={})", headless);

        let mut builder = BrowserConfig::builder()
            .no_sandbox()
            .window_size(1920, 1080);
        if !headless {
            builder = builder.with_head();
        }
        let config = builder
            .build()
            .map_err(|e| Error::Browser(format!("Browser config error: {}", e)))?;

        let (browser, mut handler) = Browser::launch(config).await.map_err(cdp_error)?;

        // The CDP handler loop must be polled for any command to complete
        let handler = tokio::spawn(async move {
            while handler.next().await.is_some() {}
        });

        let page = browser.new_page("about:blank").await.map_err(cdp_error)?;

        Ok(Self {
            browser: Mutex::new(browser),
            page,
            handler,
        })
    }

    pub async fn close(&self) -> Result<()> {
        let mut browser = self.browser.lock().await;
        browser.close().await.map_err(cdp_error)?;
        self.handler.abort();
        Ok(())
    }

    async fn evaluate<T: serde::de::DeserializeOwned>(&self, script: String) -> Result<T> {
        let result = self.page.evaluate(script).await.map_err(cdp_error)?;
        Ok(result.into_value()?)
    }
}

#[async_trait]
impl PageDriver for ChromiumDriver {
    async fn goto(&self, url: &str) -> Result<()> {
        self.page.goto(url).await.map_err(cdp_error)?;
        Ok(())
    }

    async fn current_url(&self) -> Result<String> {
        self.page
            .url()
            .await
            .map_err(cdp_error)?
            .ok_or_else(|| Error::Browser("page has no URL".to_string()))
    }

    async fn find_all(&self, locator: &Locator) -> Result<Vec<Node>> {
        let steps = serde_json::to_string(locator.steps())?;
        let result: FindResult = self.evaluate(FIND_SCRIPT.replace("__STEPS__", &steps)).await?;
        if !result.found {
            return Err(Error::ElementNotFound(locator.to_string()));
        }
        Ok(result.nodes)
    }

    async fn scroll_to_bottom(&self) -> Result<()> {
        for _ in 0..MAX_SCROLL_STEPS {
            let at_bottom: bool = self.evaluate(SCROLL_SCRIPT.to_string()).await?;
            tokio::time::sleep(SCROLL_PAUSE).await;
            if at_bottom {
                break;
            }
        }
        Ok(())
    }

    async fn capture_snapshot(&self) -> Result<String> {
        let params = CaptureSnapshotParams::builder()
            .format(CaptureSnapshotFormat::Mhtml)
            .build();
        let response = self.page.execute(params).await.map_err(cdp_error)?;
        Ok(response.result.data)
    }
}
