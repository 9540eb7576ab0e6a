//! Chromium-based renderer using chromiumoxide.
//!
//! Each `render` call launches its own browser, snapshots one page and tears
//! the process down again. Nothing is pooled across calls.

use super::{PageRenderer, RenderedPage};
use crate::config::ExtractorConfig;
use crate::error::{RenderError, RenderResult};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::handler::viewport::Viewport;
use futures::StreamExt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Collects the text of every inline script, including ones a framework
/// removed from the serialized DOM after hydration.
const INLINE_SCRIPTS_JS: &str = r#"(() => Array.from(document.scripts)
    .filter(s => !s.src)
    .map(s => s.textContent || '')
    .join('\n'))()"#;

/// Find the Chromium binary path.
pub fn find_chromium(explicit: Option<&Path>) -> Option<PathBuf> {
    // 1. Configured path
    if let Some(p) = explicit {
        if p.exists() {
            return Some(p.to_path_buf());
        }
        warn!("configured Chromium path {} does not exist", p.display());
    }

    // 2. ~/.dealradar/chromium/
    if let Some(home) = dirs::home_dir() {
        let candidates = if cfg!(target_os = "macos") {
            vec![
                home.join(".dealradar/chromium/chrome-mac-arm64/Google Chrome for Testing.app/Contents/MacOS/Google Chrome for Testing"),
                home.join(".dealradar/chromium/chrome-mac-x64/Google Chrome for Testing.app/Contents/MacOS/Google Chrome for Testing"),
                home.join(".dealradar/chromium/chrome"),
            ]
        } else {
            vec![
                home.join(".dealradar/chromium/chrome-linux64/chrome"),
                home.join(".dealradar/chromium/chrome"),
            ]
        };
        if let Some(found) = candidates.into_iter().find(|c| c.exists()) {
            return Some(found);
        }
    }

    // 3. System PATH
    for name in ["google-chrome", "google-chrome-stable", "chromium", "chromium-browser"] {
        if let Ok(path) = which::which(name) {
            return Some(path);
        }
    }

    // 4. Common macOS location
    if cfg!(target_os = "macos") {
        let common = PathBuf::from("/Applications/Google Chrome.app/Contents/MacOS/Google Chrome");
        if common.exists() {
            return Some(common);
        }
    }

    None
}

/// Renderer that drives a fresh headless Chromium per call.
pub struct ChromiumRenderer {
    config: ExtractorConfig,
    live_sessions: Arc<AtomicUsize>,
}

impl ChromiumRenderer {
    pub fn new(config: ExtractorConfig) -> Self {
        Self {
            config,
            live_sessions: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Number of browser processes currently owned by this renderer.
    pub fn live_sessions(&self) -> usize {
        self.live_sessions.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl PageRenderer for ChromiumRenderer {
    async fn render(&self, url: &str) -> RenderResult<RenderedPage> {
        let started = Instant::now();
        let session = BrowserSession::launch(&self.config, Arc::clone(&self.live_sessions)).await?;
        let result = session.snapshot(url, &self.config).await;
        session.shutdown().await;

        debug!(
            url,
            ok = result.is_ok(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "render finished"
        );
        result
    }
}

/// One launched browser process.
///
/// `shutdown` closes the browser and waits for it to exit. If a session is
/// dropped without `shutdown` (a cancelled future, a panic), `Drop` kills
/// the process instead.
struct BrowserSession {
    browser: Option<Browser>,
    handler: JoinHandle<()>,
    live: Arc<AtomicUsize>,
}

impl BrowserSession {
    async fn launch(config: &ExtractorConfig, live: Arc<AtomicUsize>) -> RenderResult<Self> {
        let chrome_path =
            find_chromium(config.chromium_path.as_deref()).ok_or(RenderError::BrowserNotFound)?;

        let viewport = Viewport {
            width: config.viewport.width,
            height: config.viewport.height,
            device_scale_factor: Some(1.0),
            emulating_mobile: false,
            is_landscape: true,
            has_touch: false,
        };

        let mut builder = BrowserConfig::builder()
            .chrome_executable(chrome_path)
            .window_size(config.viewport.width, config.viewport.height)
            .viewport(viewport)
            .arg("--disable-gpu")
            .arg("--no-sandbox")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-extensions")
            .arg("--disable-background-networking")
            .arg("--disable-blink-features=AutomationControlled")
            .arg("--lang=tr-TR")
            .arg(format!("--user-agent={}", config.user_agent));
        if !config.headless {
            builder = builder.with_head();
        }
        let browser_config = builder
            .build()
            .map_err(|e| RenderError::Launch(format!("invalid browser config: {e}")))?;

        let (browser, mut handler) = Browser::launch(browser_config)
            .await
            .map_err(|e| RenderError::Launch(e.to_string()))?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                let _ = event;
            }
        });

        live.fetch_add(1, Ordering::Relaxed);
        Ok(Self {
            browser: Some(browser),
            handler,
            live,
        })
    }

    async fn snapshot(&self, url: &str, config: &ExtractorConfig) -> RenderResult<RenderedPage> {
        let browser = self
            .browser
            .as_ref()
            .ok_or_else(|| RenderError::Launch("browser already shut down".to_string()))?;

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| RenderError::Launch(format!("failed to open tab: {e}")))?;

        let navigation = tokio::time::timeout(
            Duration::from_millis(config.navigation_timeout_ms),
            page.goto(url),
        )
        .await;
        match navigation {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => {
                return Err(RenderError::Navigation {
                    url: url.to_string(),
                    reason: e.to_string(),
                })
            }
            Err(_) => {
                return Err(RenderError::Timeout {
                    url: url.to_string(),
                    timeout_ms: config.navigation_timeout_ms,
                })
            }
        }

        // No readiness signal is awaited; client-side rendering gets a fixed budget.
        tokio::time::sleep(Duration::from_millis(config.settle_ms)).await;

        let dom = page
            .content()
            .await
            .map_err(|e| RenderError::Snapshot(format!("failed to read DOM: {e}")))?;

        let inline_scripts: String = page
            .evaluate(INLINE_SCRIPTS_JS)
            .await
            .map_err(|e| RenderError::Snapshot(format!("failed to read scripts: {e}")))?
            .into_value()
            .map_err(|e| RenderError::Snapshot(format!("failed to convert scripts: {e:?}")))?;

        let final_url = page
            .url()
            .await
            .ok()
            .flatten()
            .map(|u| u.to_string())
            .unwrap_or_else(|| url.to_string());

        if let Err(e) = page.close().await {
            debug!("page close failed: {e}");
        }

        let source = format!("{dom}\n{inline_scripts}");
        Ok(RenderedPage {
            final_url,
            dom,
            source,
        })
    }

    async fn shutdown(mut self) {
        if let Some(mut browser) = self.browser.take() {
            if let Err(e) = browser.close().await {
                warn!("browser close failed: {e}");
            }
            if let Err(e) = browser.wait().await {
                warn!("waiting for browser exit failed: {e}");
            }
        }
        self.handler.abort();
    }
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        if let Some(mut browser) = self.browser.take() {
            warn!("browser session dropped without shutdown; killing process");
            match tokio::runtime::Handle::try_current() {
                Ok(rt) => {
                    rt.spawn(async move {
                        let _ = browser.kill().await;
                    });
                }
                // chromiumoxide kills the child when the handle drops.
                Err(_) => drop(browser),
            }
        }
        self.handler.abort();
        self.live.fetch_sub(1, Ordering::Relaxed);
    }
}
