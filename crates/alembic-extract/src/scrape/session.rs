//! Headless Chrome scraping
//!
//! One browser process is launched lazily and shared by every scrape. Each
//! scrape gets its own browser context so cookies and storage never leak
//! between share pages, and the context is disposed when the scrape ends
//! whether or not it succeeded.

use super::assets::AssetSink;
use super::rules::ScrapingRules;
use super::scroll::{adaptive_scroll, ScrollPolicy, ScrollSurface};
use super::{PageScraper, ScrapeOutput};
use crate::error::{ExtractError, ExtractResult};
use alembic_config::ScrapeConfig;
use alembic_core::StagingAssets;
use async_trait::async_trait;
use base64::Engine;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::input::{
    DispatchMouseEventParams, DispatchMouseEventType,
};
use chromiumoxide::cdp::browser_protocol::network::{
    EnableParams, EventLoadingFailed, EventLoadingFinished, EventResponseReceived,
    GetResponseBodyParams, RequestId,
};
use chromiumoxide::cdp::browser_protocol::browser::BrowserContextId;
use chromiumoxide::cdp::browser_protocol::target::{
    CreateBrowserContextParams, CreateTargetParams,
    DisposeBrowserContextParams,
};
use chromiumoxide::Page;
use futures::StreamExt;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::OnceCell;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use url::Url;

/// Interval between selector probes
const SELECTOR_POLL: Duration = Duration::from_millis(250);

/// Where synthetic wheel events are dispatched
const WHEEL_ORIGIN: (f64, f64) = (400.0, 400.0);

const SCROLL_HEIGHT_SCRIPT: &str =
    "document.body ? document.body.scrollHeight : document.documentElement.scrollHeight";

/// A running browser plus the task pumping its CDP connection.
struct LaunchedBrowser {
    browser: Browser,
    handler: JoinHandle<()>,
}

impl Drop for LaunchedBrowser {
    fn drop(&mut self) {
        self.handler.abort();
    }
}

/// Lazily launched, shared Chrome instance.
pub struct BrowserHost {
    config: ScrapeConfig,
    launched: OnceCell<LaunchedBrowser>,
}

impl BrowserHost {
    /// Host that launches Chrome on first use with `config`.
    pub fn new(config: ScrapeConfig) -> Self {
        Self {
            config,
            launched: OnceCell::new(),
        }
    }

    /// Scrape settings the host was created with
    pub fn config(&self) -> &ScrapeConfig {
        &self.config
    }

    async fn browser(&self) -> ExtractResult<&Browser> {
        let launched = self
            .launched
            .get_or_try_init(|| launch(&self.config))
            .await?;
        Ok(&launched.browser)
    }
}

async fn launch(config: &ScrapeConfig) -> ExtractResult<LaunchedBrowser> {
    let mut builder = BrowserConfig::builder().window_size(1280, 2000);
    if let Some(executable) = &config.chrome_executable {
        builder = builder.chrome_executable(executable);
    }
    if !config.headless {
        builder = builder.with_head();
    }
    let browser_config = builder.build().map_err(ExtractError::Browser)?;

    let (browser, mut handler) = Browser::launch(browser_config).await?;
    let handler = tokio::spawn(async move {
        while let Some(event) = handler.next().await {
            if let Err(e) = event {
                debug!(error = %e, "Browser handler event error");
            }
        }
        debug!("Browser handler finished");
    });

    info!(headless = config.headless, "Launched browser");
    Ok(LaunchedBrowser { browser, handler })
}

/// One isolated browser context with a single page.
pub struct ScrapeSession<'a> {
    host: &'a BrowserHost,
    context_id: BrowserContextId,
    page: Page,
    capture: Option<JoinHandle<()>>,
}

impl<'a> ScrapeSession<'a> {
    /// Open a fresh context and a blank page in it.
    pub async fn open(host: &'a BrowserHost) -> ExtractResult<Self> {
        let browser = host.browser().await?;

        let context_id = browser
            .execute(CreateBrowserContextParams::default())
            .await?
            .result
            .browser_context_id;

        let params = CreateTargetParams::builder()
            .url("about:blank")
            .browser_context_id(context_id.clone())
            .build()
            .map_err(ExtractError::Browser)?;

        let page = match browser.new_page(params).await {
            Ok(page) => page,
            Err(e) => {
                if let Err(dispose_err) = browser
                    .execute(DisposeBrowserContextParams::new(context_id))
                    .await
                {
                    debug!(error = %dispose_err, "Failed to dispose context after page error");
                }
                return Err(e.into());
            }
        };

        Ok(Self {
            host,
            context_id,
            page,
            capture: None,
        })
    }

    /// Start writing qualifying image responses through `sink`.
    ///
    /// Must be called before navigation so early responses are seen.
    pub async fn start_asset_capture(&mut self, sink: Arc<AssetSink>) -> ExtractResult<()> {
        self.page.execute(EnableParams::default()).await?;
        let mut responses = self.page.event_listener::<EventResponseReceived>().await?;
        let mut finished = self.page.event_listener::<EventLoadingFinished>().await?;
        let mut failed = self.page.event_listener::<EventLoadingFailed>().await?;
        let page = self.page.clone();

        self.capture = Some(tokio::spawn(async move {
            // Bodies are only retrievable once loading has finished.
            let mut pending: HashMap<RequestId, (String, String)> = HashMap::new();
            loop {
                tokio::select! {
                    Some(event) = responses.next() => {
                        let url = event.response.url.clone();
                        let mime = event.response.mime_type.clone();
                        if sink.should_capture(&url, &mime) {
                            pending.insert(event.request_id.clone(), (url, mime));
                        }
                    }
                    Some(event) = finished.next() => {
                        if let Some((url, mime)) = pending.remove(&event.request_id) {
                            capture_body(&page, &sink, event.request_id.clone(), &url, &mime).await;
                        }
                    }
                    Some(event) = failed.next() => {
                        pending.remove(&event.request_id);
                    }
                    else => break,
                }
            }
        }));
        Ok(())
    }

    /// Navigate within `timeout`. Failure is logged, not returned.
    pub async fn navigate(&self, url: &Url, timeout: Duration) -> bool {
        match tokio::time::timeout(timeout, self.page.goto(url.as_str())).await {
            Ok(Ok(_)) => true,
            Ok(Err(e)) => {
                warn!(%url, error = %e, "Initial load failed, continuing with partial page");
                false
            }
            Err(_) => {
                warn!(%url, timeout_secs = timeout.as_secs(), "Navigation timed out, continuing with partial page");
                false
            }
        }
    }

    /// First selector, in order, that appears within `timeout` each.
    pub async fn wait_for_any(&self, selectors: &[&'static str], timeout: Duration) -> Option<&'static str> {
        for &selector in selectors {
            let probe = async {
                loop {
                    if self.page.find_element(selector).await.is_ok() {
                        return;
                    }
                    tokio::time::sleep(SELECTOR_POLL).await;
                }
            };
            if tokio::time::timeout(timeout, probe).await.is_ok() {
                debug!(selector, "Content container found");
                return Some(selector);
            }
        }
        None
    }

    /// Delete overlay elements. Returns how many were removed.
    pub async fn remove_overlays(&self, rules: &ScrapingRules) -> ExtractResult<u64> {
        let removed = self
            .page
            .evaluate(rules.overlay_removal_script())
            .await?
            .into_value::<u64>()
            .map_err(|e| ExtractError::Browser(e.to_string()))?;
        Ok(removed)
    }

    /// Page title and cleaned conversation text.
    pub async fn harvest(&self, url: &Url, rules: &ScrapingRules) -> ExtractResult<(String, String)> {
        let scrape_error = |reason: String| ExtractError::Scrape {
            url: url.to_string(),
            reason,
        };

        let title = self
            .page
            .get_title()
            .await
            .map_err(|e| scrape_error(e.to_string()))?
            .unwrap_or_default();

        let raw: String = self
            .page
            .evaluate(rules.harvest_script())
            .await
            .map_err(|e| scrape_error(e.to_string()))?
            .into_value()
            .map_err(|e| scrape_error(e.to_string()))?;

        Ok((title.trim().to_string(), rules.strip_noise(&raw)))
    }

    /// Stop capture, close the page and dispose the context.
    pub async fn close(mut self) {
        if let Some(capture) = self.capture.take() {
            capture.abort();
        }
        if let Err(e) = self.page.close().await {
            debug!(error = %e, "Failed to close page");
        }
        if let Ok(browser) = self.host.browser().await {
            if let Err(e) = browser
                .execute(DisposeBrowserContextParams::new(self.context_id))
                .await
            {
                debug!(error = %e, "Failed to dispose browser context");
            }
        }
    }
}

#[async_trait]
impl ScrollSurface for ScrapeSession<'_> {
    async fn scroll_by(&self, delta: f64) -> ExtractResult<()> {
        let (x, y) = WHEEL_ORIGIN;
        let wheel = DispatchMouseEventParams::builder()
            .r#type(DispatchMouseEventType::MouseWheel)
            .x(x)
            .y(y)
            .delta_x(0.0)
            .delta_y(delta)
            .build()
            .map_err(ExtractError::Browser)?;
        self.page.execute(wheel).await?;
        Ok(())
    }

    async fn scroll_height(&self) -> ExtractResult<u64> {
        self.page
            .evaluate(SCROLL_HEIGHT_SCRIPT)
            .await?
            .into_value::<u64>()
            .map_err(|e| ExtractError::Browser(e.to_string()))
    }
}

async fn capture_body(page: &Page, sink: &AssetSink, request_id: RequestId, url: &str, mime: &str) {
    let body = match page.execute(GetResponseBodyParams::new(request_id)).await {
        Ok(response) => response.result,
        Err(e) => {
            debug!(url, error = %e, "Response body unavailable");
            return;
        }
    };

    let bytes = if body.base64_encoded {
        match base64::engine::general_purpose::STANDARD.decode(body.body.as_bytes()) {
            Ok(bytes) => bytes,
            Err(e) => {
                debug!(url, error = %e, "Undecodable response body");
                return;
            }
        }
    } else {
        body.body.into_bytes()
    };

    if let Err(e) = sink.store(url, mime, &bytes).await {
        warn!(url, error = %e, "Failed to write captured image");
    }
}

/// [`PageScraper`] driving a shared headless Chrome.
pub struct ChromeScraper {
    host: BrowserHost,
}

impl ChromeScraper {
    /// Scraper that launches Chrome on its first scrape.
    pub fn new(config: ScrapeConfig) -> Self {
        Self {
            host: BrowserHost::new(config),
        }
    }

    async fn run(
        &self,
        session: &mut ScrapeSession<'_>,
        url: &Url,
        staging: &StagingAssets,
    ) -> ExtractResult<ScrapeOutput> {
        let config = self.host.config();
        let rules = ScrapingRules::for_url(url);
        info!(%url, platform = rules.platform.as_str(), "Scraping shared conversation");

        let sink = Arc::new(AssetSink::new(
            staging.images_dir(),
            config.min_asset_bytes,
            config.noise_markers.clone(),
        ));
        if let Err(e) = session.start_asset_capture(Arc::clone(&sink)).await {
            warn!(%url, error = %e, "Image capture unavailable");
        }

        session.navigate(url, config.navigation_timeout()).await;

        if session
            .wait_for_any(rules.content_selectors, config.selector_timeout())
            .await
            .is_none()
        {
            warn!(%url, "Primary content container not found, proceeding with body");
        }

        match session.remove_overlays(rules).await {
            Ok(removed) if removed > 0 => debug!(removed, "Removed overlays"),
            Ok(_) => {}
            Err(e) => warn!(%url, error = %e, "Overlay removal failed"),
        }

        let scroll = adaptive_scroll(&*session, &ScrollPolicy::from(config)).await;
        info!(steps = scroll.steps, height = scroll.final_height, "Scroll complete");

        let (title, body) = session.harvest(url, rules).await?;
        let text = format!("TITLE: {title}\nURL: {url}\n\n{body}");
        tokio::fs::write(staging.page_path(), &text).await?;

        Ok(ScrapeOutput {
            text,
            staging: staging.clone(),
            assets_written: sink.written_count().await,
            scroll,
        })
    }
}

#[async_trait]
impl PageScraper for ChromeScraper {
    async fn scrape(&self, url: &Url, staging: StagingAssets) -> ExtractResult<ScrapeOutput> {
        tokio::fs::create_dir_all(staging.images_dir()).await?;

        let mut session = ScrapeSession::open(&self.host).await?;
        let result = self.run(&mut session, url, &staging).await;
        session.close().await;

        result
    }
}
