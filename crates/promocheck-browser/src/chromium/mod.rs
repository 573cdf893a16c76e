//! Headless Chrome sessions over the DevTools protocol (`chromiumoxide`).

mod keys;
mod script;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::network::LoaderId;
use chromiumoxide::cdp::browser_protocol::page::{EventLifecycleEvent, FrameId, NavigateParams};
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::{Stream, StreamExt};
use promocheck_core::BrowserOptions;
use tokio::task::JoinHandle;
use url::Url;

use crate::error::BrowserError;
use crate::session::{BrowserSession, SessionLauncher};

/// Lifecycle event Chrome emits once at most two connections remain in flight.
const NETWORK_ALMOST_IDLE: &str = "networkAlmostIdle";

/// Bound on waiting for the Chrome process to exit after shutdown.
const EXIT_WAIT: Duration = Duration::from_secs(5);

/// Launches one non-sandboxed Chrome process per session.
#[derive(Debug, Clone)]
pub struct ChromiumLauncher {
    options: BrowserOptions,
}

impl ChromiumLauncher {
    #[must_use]
    pub fn new(options: BrowserOptions) -> Self {
        Self { options }
    }

    fn browser_config(&self) -> Result<BrowserConfig, BrowserError> {
        // `no_sandbox` passes both --no-sandbox and --disable-setuid-sandbox.
        let mut builder = BrowserConfig::builder()
            .no_sandbox()
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .launch_timeout(self.options.navigation_timeout)
            .request_timeout(self.options.element_timeout);

        if !self.options.headless {
            builder = builder.with_head();
        }
        if let Some(path) = &self.options.executable {
            builder = builder.chrome_executable(path);
        }

        builder.build().map_err(BrowserError::Launch)
    }
}

#[async_trait]
impl SessionLauncher for ChromiumLauncher {
    async fn launch(&self) -> Result<Box<dyn BrowserSession>, BrowserError> {
        let config = self.browser_config()?;
        let (mut browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| BrowserError::Launch(e.to_string()))?;

        // The handler drives the CDP websocket; the browser is inert without it.
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::debug!(error = %e, "cdp handler event error");
                }
            }
        });

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                if let Err(close_err) = browser.close().await {
                    tracing::debug!(error = %close_err, "closing half-started browser failed");
                }
                handler_task.abort();
                return Err(BrowserError::Launch(e.to_string()));
            }
        };

        tracing::debug!(headless = self.options.headless, "browser session started");

        Ok(Box::new(ChromiumSession {
            browser,
            page,
            handler_task,
            navigation_timeout: self.options.navigation_timeout,
            closed: false,
        }))
    }
}

/// One Chrome process with a single page.
pub struct ChromiumSession {
    browser: Browser,
    page: Page,
    handler_task: JoinHandle<()>,
    navigation_timeout: Duration,
    closed: bool,
}

// Helpers borrow only the page, so their futures never hold the `Browser`.
async fn navigate_until_idle(page: &Page, url: &Url) -> Result<(), BrowserError> {
    // Subscribe before navigating so the idle event cannot be missed.
    let mut lifecycle = page.event_listener::<EventLifecycleEvent>().await?;

    let response = page.execute(NavigateParams::new(url.as_str())).await?;
    if let Some(reason) = response.result.error_text.clone() {
        return Err(BrowserError::Navigation {
            url: url.to_string(),
            reason,
        });
    }

    wait_for_idle(
        &mut lifecycle,
        url,
        &response.result.frame_id,
        response.result.loader_id.as_ref(),
    )
    .await
}

/// Consumes lifecycle events until the navigated frame's load is almost idle.
async fn wait_for_idle<S>(
    events: &mut S,
    url: &Url,
    frame_id: &FrameId,
    loader_id: Option<&LoaderId>,
) -> Result<(), BrowserError>
where
    S: Stream<Item = Arc<EventLifecycleEvent>> + Unpin,
{
    while let Some(event) = events.next().await {
        let same_load = loader_id.is_none_or(|id| *id == event.loader_id);
        if event.name == NETWORK_ALMOST_IDLE && event.frame_id == *frame_id && same_load {
            return Ok(());
        }
    }
    Err(BrowserError::Navigation {
        url: url.to_string(),
        reason: "lifecycle event stream ended before the page went idle".to_string(),
    })
}

/// Waits up to `limit` for the process exit future. `false` means it timed out.
async fn wait_for_exit<F, T>(wait: F, limit: Duration) -> bool
where
    F: Future<Output = std::io::Result<T>>,
{
    match tokio::time::timeout(limit, wait).await {
        Ok(Ok(_)) => true,
        Ok(Err(e)) => {
            tracing::debug!(error = %e, "waiting for browser process exit failed");
            true
        }
        Err(_) => false,
    }
}

/// Evaluates an expression that returns a JSON string and decodes it.
async fn evaluate_json<T>(page: &Page, context: &str, expression: String) -> Result<T, BrowserError>
where
    T: serde::de::DeserializeOwned,
{
    let script_error = |source| BrowserError::Script {
        context: context.to_string(),
        source,
    };
    let raw: String = page
        .evaluate(expression)
        .await?
        .into_value()
        .map_err(script_error)?;
    serde_json::from_str(&raw).map_err(script_error)
}

async fn find(page: &Page, selector: &str) -> Result<chromiumoxide::Element, BrowserError> {
    page.find_element(selector)
        .await
        .map_err(|e| BrowserError::ElementNotFound {
            selector: selector.to_string(),
            reason: e.to_string(),
        })
}

#[async_trait]
impl BrowserSession for ChromiumSession {
    async fn navigate(&mut self, url: &Url) -> Result<(), BrowserError> {
        tokio::time::timeout(self.navigation_timeout, navigate_until_idle(&self.page, url))
            .await
            .map_err(|_| BrowserError::NavigationTimeout {
                url: url.to_string(),
                timeout_secs: self.navigation_timeout.as_secs(),
            })?
    }

    async fn element_exists(&mut self, selector: &str) -> Result<bool, BrowserError> {
        let expression = script::element_exists(selector).map_err(|source| BrowserError::Script {
            context: format!("selector {selector}"),
            source,
        })?;
        evaluate_json(&self.page, selector, expression).await
    }

    async fn click(&mut self, selector: &str) -> Result<(), BrowserError> {
        find(&self.page, selector).await?.click().await?;
        Ok(())
    }

    async fn type_text(&mut self, selector: &str, text: &str) -> Result<(), BrowserError> {
        let element = find(&self.page, selector).await?;
        element.focus().await?;
        element.type_str(text).await?;
        Ok(())
    }

    async fn press_key(&mut self, key: &str) -> Result<(), BrowserError> {
        let (down, up) = keys::key_press(key)?;
        self.page.execute(down).await?;
        self.page.execute(up).await?;
        Ok(())
    }

    async fn text_content(&mut self, selector: &str) -> Result<Option<String>, BrowserError> {
        let expression = script::text_content(selector).map_err(|source| BrowserError::Script {
            context: format!("selector {selector}"),
            source,
        })?;
        evaluate_json(&self.page, selector, expression).await
    }

    async fn close(&mut self) -> Result<(), BrowserError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;

        let result = self.browser.close().await;
        if result.is_err() {
            self.kill_process().await;
        }
        if !wait_for_exit(self.browser.wait(), EXIT_WAIT).await {
            tracing::warn!("browser process still running after close; killing it");
            self.kill_process().await;
        }
        self.handler_task.abort();
        result?;
        Ok(())
    }
}

impl ChromiumSession {
    async fn kill_process(&mut self) {
        if let Some(Err(e)) = self.browser.kill().await {
            tracing::debug!(error = %e, "killing browser process failed");
        }
    }
}

impl Drop for ChromiumSession {
    fn drop(&mut self) {
        self.handler_task.abort();
    }
}
