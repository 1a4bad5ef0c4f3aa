//! Headless browser screenshots of monitored pages.
//!
//! The [`Capturer`] trait is always available; the chromiumoxide-backed
//! [`HeadlessCapturer`] is behind the `render` feature.

use std::path::{Path, PathBuf};
use std::time::Duration;

use jobwatch_core::{AppConfig, fingerprint};
use thiserror::Error;
use tokio::time::Instant;

/// Errors that can occur while capturing a screenshot.
#[derive(Debug, Error)]
pub enum RenderError {
    /// Failed to launch or connect to browser.
    #[error("browser launch failed: {0}")]
    BrowserLaunch(String),

    /// Failed to navigate to URL.
    #[error("navigation failed: {0}")]
    Navigation(String),

    /// Element selector matched nothing on the rendered page.
    #[error("selector not found: {0}")]
    SelectorNotFound(String),

    /// Capturing or writing the image failed.
    #[error("screenshot failed: {0}")]
    Capture(String),

    /// Timeout waiting for page to load.
    #[error("render timeout after {0}ms")]
    Timeout(u64),

    /// Browser closed unexpectedly.
    #[error("browser closed unexpectedly")]
    BrowserClosed,
}

/// Options for capturing a page.
#[derive(Debug, Clone)]
pub struct CaptureOptions {
    /// Upper bound for navigation, settling and capture (default: 30s).
    pub timeout: Duration,

    /// Time the page is given to finish network activity (default: 2s).
    pub settle: Duration,

    /// Viewport dimensions (default: 1920x1080).
    pub viewport: (u32, u32),
}

impl Default for CaptureOptions {
    fn default() -> Self {
        Self { timeout: Duration::from_secs(30), settle: Duration::from_secs(2), viewport: (1920, 1080) }
    }
}

impl From<&AppConfig> for CaptureOptions {
    fn from(config: &AppConfig) -> Self {
        Self {
            timeout: config.render_timeout(),
            settle: config.render_settle(),
            viewport: (config.viewport_width, config.viewport_height),
        }
    }
}

/// Screenshot backend.
#[async_trait::async_trait]
pub trait Capturer: Send + Sync {
    /// Render `url` and write a PNG to `destination`: the element matching
    /// `selector` if given, the full page otherwise.
    async fn capture(&self, url: &str, destination: &Path, selector: Option<&str>) -> Result<(), RenderError>;

    /// Release browser resources at the end of a run.
    async fn shutdown(&self) {}
}

/// File name a site's screenshot is stored under.
///
/// The scheme and `://` are dropped and path separators become `_`; other
/// characters Windows refuses in file names are replaced as well. Such a
/// replacement could make two URLs share a name (`a.com/jobs?x` and
/// `a.com/jobs_x`), so it appends the first eight hex digits of the URL's
/// SHA-256.
pub fn screenshot_file_name(url: &str) -> String {
    let without_scheme = url.split_once("://").map_or(url, |(_, rest)| rest);
    let mut lossy = false;
    let mut name: String = without_scheme
        .chars()
        .map(|c| match c {
            '/' => '_',
            '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => {
                lossy = true;
                '_'
            }
            c => c,
        })
        .collect();
    if lossy {
        name.push('-');
        name.push_str(&fingerprint(url).as_str()[..8]);
    }
    name.push_str(".png");
    name
}

/// Full path of a site's screenshot inside `dir`.
pub fn screenshot_path(dir: &Path, url: &str) -> PathBuf {
    dir.join(screenshot_file_name(url))
}

/// Run `work` until `deadline`, reporting expiry as a [`RenderError::Timeout`]
/// of `limit`.
#[cfg_attr(not(feature = "render"), allow(dead_code))]
async fn within<T>(
    deadline: Instant, limit: Duration, work: impl Future<Output = Result<T, RenderError>>,
) -> Result<T, RenderError> {
    tokio::time::timeout_at(deadline, work)
        .await
        .map_err(|_| RenderError::Timeout(limit.as_millis() as u64))?
}

#[cfg(feature = "render")]
pub use headless::HeadlessCapturer;

#[cfg(feature = "render")]
mod headless {
    use super::{CaptureOptions, Capturer, Instant, RenderError, within};
    use chromiumoxide::Page;
    use chromiumoxide::browser::{Browser, BrowserConfig};
    use chromiumoxide::cdp::browser_protocol::page::CaptureScreenshotFormat;
    use chromiumoxide::handler::viewport::Viewport;
    use chromiumoxide::page::ScreenshotParams;
    use futures_util::StreamExt;
    use std::path::Path;
    use tokio::sync::Mutex;

    /// Headless Chrome/Chromium capturer using chromiumoxide.
    ///
    /// The browser is launched on the first capture and reused until
    /// [`Capturer::shutdown`]. A browser that cannot open a page is dropped
    /// and relaunched on the next capture.
    pub struct HeadlessCapturer {
        options: CaptureOptions,
        browser: Mutex<Option<Browser>>,
    }

    impl HeadlessCapturer {
        pub fn new(options: CaptureOptions) -> Self {
            Self { options, browser: Mutex::new(None) }
        }

        async fn launch(&self) -> Result<Browser, RenderError> {
            let (width, height) = self.options.viewport;
            let config = BrowserConfig::builder()
                .window_size(width, height)
                .viewport(Viewport { width, height, ..Default::default() })
                .request_timeout(self.options.timeout)
                .build()
                .map_err(RenderError::BrowserLaunch)?;

            let (browser, mut handler) = Browser::launch(config)
                .await
                .map_err(|e| RenderError::BrowserLaunch(e.to_string()))?;

            tokio::spawn(async move {
                while let Some(event) = handler.next().await {
                    if let Err(e) = event {
                        tracing::debug!("browser handler event error: {e}");
                    }
                }
            });

            tracing::debug!(width, height, "launched headless browser");
            Ok(browser)
        }

        async fn shoot(&self, page: &Page, destination: &Path, selector: Option<&str>) -> Result<(), RenderError> {
            page.wait_for_navigation()
                .await
                .map_err(|e| RenderError::Navigation(e.to_string()))?;
            tokio::time::sleep(self.options.settle).await;

            match selector {
                Some(selector) => {
                    let element = page
                        .find_element(selector)
                        .await
                        .map_err(|_| RenderError::SelectorNotFound(selector.to_string()))?;
                    element
                        .save_screenshot(CaptureScreenshotFormat::Png, destination)
                        .await
                        .map_err(|e| RenderError::Capture(e.to_string()))?;
                }
                None => {
                    let params = ScreenshotParams::builder()
                        .format(CaptureScreenshotFormat::Png)
                        .full_page(true)
                        .build();
                    page.save_screenshot(params, destination)
                        .await
                        .map_err(|e| RenderError::Capture(e.to_string()))?;
                }
            }
            Ok(())
        }
    }

    #[async_trait::async_trait]
    impl Capturer for HeadlessCapturer {
        async fn capture(&self, url: &str, destination: &Path, selector: Option<&str>) -> Result<(), RenderError> {
            let mut guard = self.browser.lock().await;
            if guard.is_none() {
                *guard = Some(self.launch().await?);
            }
            let browser = guard.as_ref().ok_or(RenderError::BrowserClosed)?;

            let start = Instant::now();
            let timeout = self.options.timeout;
            let deadline = start + timeout;
            let opened = within(deadline, timeout, async {
                browser.new_page(url).await.map_err(|e| RenderError::Navigation(e.to_string()))
            })
            .await;
            let page = match opened {
                Ok(page) => page,
                Err(e) => {
                    // Drop the browser so the next capture launches a fresh one.
                    *guard = None;
                    return Err(e);
                }
            };

            let result = within(deadline, timeout, self.shoot(&page, destination, selector)).await;
            if let Err(e) = page.close().await {
                tracing::debug!("closing page: {e}");
            }
            result?;

            tracing::debug!(
                %url,
                path = %destination.display(),
                selector = selector.unwrap_or("<full page>"),
                elapsed_ms = start.elapsed().as_millis() as u64,
                "captured screenshot"
            );
            Ok(())
        }

        async fn shutdown(&self) {
            if let Some(mut browser) = self.browser.lock().await.take() {
                if let Err(e) = browser.close().await {
                    tracing::debug!("closing browser: {e}");
                }
                browser.wait().await.ok();
            }
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use std::time::Duration;

        #[tokio::test]
        #[ignore = "requires network and Chrome/Chromium"]
        async fn test_timed_out_capture_closes_its_page() {
            let options =
                CaptureOptions { timeout: Duration::from_secs(5), settle: Duration::from_secs(30), ..Default::default() };
            let capturer = HeadlessCapturer::new(options);
            let dir = tempfile::tempdir().unwrap();

            let result = capturer.capture("https://example.com", &dir.path().join("x.png"), None).await;
            assert!(matches!(result, Err(RenderError::Timeout(5000))));

            {
                let guard = capturer.browser.lock().await;
                let browser = guard.as_ref().unwrap();
                for page in browser.pages().await.unwrap() {
                    let url = page.url().await.unwrap().unwrap_or_default();
                    assert!(!url.contains("example.com"), "page left open: {url}");
                }
            }
            capturer.shutdown().await;
        }

        #[tokio::test]
        #[ignore = "requires network and Chrome/Chromium"]
        async fn test_dead_browser_is_relaunched() {
            let capturer = HeadlessCapturer::new(CaptureOptions::default());
            let dir = tempfile::tempdir().unwrap();
            let destination = dir.path().join("example.png");

            capturer.capture("https://example.com", &destination, None).await.unwrap();
            {
                let mut guard = capturer.browser.lock().await;
                guard.as_mut().unwrap().kill().await;
            }

            assert!(capturer.capture("https://example.com", &destination, None).await.is_err());
            assert!(capturer.browser.lock().await.is_none());

            std::fs::remove_file(&destination).unwrap();
            capturer.capture("https://example.com", &destination, None).await.unwrap();
            capturer.shutdown().await;
            assert!(destination.exists());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_name_strips_scheme_and_slashes() {
        let name = screenshot_file_name("https://example.com/a/b");
        assert_eq!(name, "example.com_a_b.png");
        assert!(!name.contains("://"));
        assert!(!name.contains('/'));
    }

    #[test]
    fn test_file_name_is_deterministic() {
        let url = "https://www.rezoomo.com/company/coombe-hospital/jobs/?source=iframe";
        assert_eq!(screenshot_file_name(url), screenshot_file_name(url));
        assert_eq!(
            screenshot_file_name(url),
            "www.rezoomo.com_company_coombe-hospital_jobs__source=iframe-36d81f2d.png"
        );
    }

    #[test]
    fn test_file_name_without_scheme() {
        assert_eq!(screenshot_file_name("example.com/jobs"), "example.com_jobs.png");
    }

    #[test]
    fn test_file_name_with_port() {
        assert_eq!(screenshot_file_name("http://localhost:8080/jobs"), "localhost_8080_jobs-2c143036.png");
    }

    #[test]
    fn test_file_name_replaced_query_does_not_collide() {
        let query = screenshot_file_name("https://a.com/jobs?x");
        let underscore = screenshot_file_name("https://a.com/jobs_x");
        assert_eq!(query, "a.com_jobs_x-c17abfeb.png");
        assert_eq!(underscore, "a.com_jobs_x.png");
        assert_ne!(screenshot_file_name("https://a.com/jobs?y"), screenshot_file_name("https://a.com/jobs*y"));
    }

    #[tokio::test]
    async fn test_within_times_out_pending_work() {
        let limit = Duration::from_millis(20);
        let result: Result<(), RenderError> = within(Instant::now() + limit, limit, std::future::pending()).await;
        assert!(matches!(result, Err(RenderError::Timeout(20))));
    }

    #[tokio::test]
    async fn test_within_passes_through_result() {
        let limit = Duration::from_secs(5);
        let ok = within(Instant::now() + limit, limit, async { Ok::<_, RenderError>(7) }).await;
        assert_eq!(ok.unwrap(), 7);

        let err: Result<(), RenderError> =
            within(Instant::now() + limit, limit, async { Err(RenderError::SelectorNotFound("div.x".into())) }).await;
        assert!(matches!(err, Err(RenderError::SelectorNotFound(_))));
    }

    #[test]
    fn test_screenshot_path() {
        let path = screenshot_path(Path::new("screenshots"), "https://therotundahospital.occupop-careers.com/");
        assert_eq!(path, PathBuf::from("screenshots/therotundahospital.occupop-careers.com_.png"));
    }

    #[test]
    fn test_capture_options() {
        let options = CaptureOptions::default();
        assert_eq!(options.viewport, (1920, 1080));
        assert_eq!(options.timeout, Duration::from_secs(30));

        let app = AppConfig { viewport_width: 1280, render_settle_ms: 500, ..Default::default() };
        let options = CaptureOptions::from(&app);
        assert_eq!(options.viewport, (1280, 1080));
        assert_eq!(options.settle, Duration::from_millis(500));
    }

    #[cfg(feature = "render")]
    #[tokio::test]
    #[ignore = "requires network and Chrome/Chromium"]
    async fn test_capture_full_page() {
        let dir = tempfile::tempdir().unwrap();
        let destination = dir.path().join("example.png");
        let capturer = HeadlessCapturer::new(CaptureOptions::default());

        capturer.capture("https://example.com", &destination, None).await.unwrap();
        capturer.shutdown().await;
        assert!(destination.exists());
    }

    #[cfg(feature = "render")]
    #[tokio::test]
    #[ignore = "requires network and Chrome/Chromium"]
    async fn test_capture_missing_selector() {
        let dir = tempfile::tempdir().unwrap();
        let capturer = HeadlessCapturer::new(CaptureOptions::default());

        let result = capturer
            .capture("https://example.com", &dir.path().join("x.png"), Some("div.does-not-exist"))
            .await;
        capturer.shutdown().await;
        assert!(matches!(result, Err(RenderError::SelectorNotFound(_))));
    }
}
