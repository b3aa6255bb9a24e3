//! Chromium backend for capture sessions
//!
//! A single launched browser hands out one fresh tab per capture. The
//! DevTools handler stream is polled on its own task for as long as the
//! browser lives.

use crate::{
    create_browser_config, CaptureError, CaptureSession, Config, ContentBox, ImageFormat,
    ScreenOrientation, ScreenshotOptions, SessionFactory, ViewportEmulation,
};
use async_trait::async_trait;
use chromiumoxide::browser::Browser;
use chromiumoxide::cdp::browser_protocol::emulation::{
    ScreenOrientation as CdpScreenOrientation, ScreenOrientationType,
    SetDeviceMetricsOverrideParams,
};
use chromiumoxide::cdp::browser_protocol::page::{CaptureScreenshotFormat, Viewport};
use chromiumoxide::error::CdpError;
use chromiumoxide::page::{Page, ScreenshotParams};
use futures::StreamExt;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// A running Chromium process plus the task driving its DevTools connection
pub struct ChromeBrowser {
    browser: Arc<Mutex<Browser>>,
    handler: JoinHandle<Result<(), CdpError>>,
}

impl ChromeBrowser {
    pub async fn launch(config: &Config) -> Result<Self, CaptureError> {
        let browser_config = create_browser_config(config)?;

        let (browser, mut handler) = Browser::launch(browser_config)
            .await
            .map_err(|e| CaptureError::BrowserLaunchFailed(e.to_string()))?;

        // The handler implements Stream and must be polled for any command to complete
        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    error!("Handler error: {}", e);
                    return Err(e);
                }
            }
            info!("Handler stream ended");
            Ok(())
        });

        info!("Browser launched");
        Ok(Self {
            browser: Arc::new(Mutex::new(browser)),
            handler,
        })
    }

    pub fn is_alive(&self) -> bool {
        !self.handler.is_finished()
    }

    pub async fn shutdown(self) {
        info!("Shutting down browser...");
        let mut browser = self.browser.lock().await;
        if let Err(e) = browser.close().await {
            warn!("Browser close failed: {}", e);
        }
        let _ = browser.wait().await;
        self.handler.abort();
        info!("Browser shutdown complete");
    }
}

#[async_trait]
impl SessionFactory for ChromeBrowser {
    type Session = ChromeSession;

    async fn open_session(&self) -> Result<ChromeSession, CaptureError> {
        if !self.is_alive() {
            return Err(CaptureError::SessionUnavailable(
                "browser handler has stopped".to_string(),
            ));
        }

        let page = self
            .browser
            .lock()
            .await
            .new_page("about:blank")
            .await
            .map_err(|e| CaptureError::SessionUnavailable(e.to_string()))?;

        Ok(ChromeSession { page: Some(page) })
    }
}

/// One browser tab used for a single capture
pub struct ChromeSession {
    page: Option<Page>,
}

impl ChromeSession {
    fn page(&self) -> Result<&Page, CaptureError> {
        self.page
            .as_ref()
            .ok_or_else(|| CaptureError::SessionUnavailable("session already closed".to_string()))
    }
}

#[async_trait]
impl CaptureSession for ChromeSession {
    async fn navigate(&mut self, url: &str) -> Result<(), CaptureError> {
        debug!("Navigating to {}", url);
        self.page()?
            .goto(url)
            .await
            .map_err(|e| CaptureError::NavigationFailed(e.to_string()))?;
        Ok(())
    }

    async fn layout_metrics(&mut self) -> Result<ContentBox, CaptureError> {
        let metrics = self
            .page()?
            .layout_metrics()
            .await
            .map_err(|e| CaptureError::LayoutMetricsFailed(e.to_string()))?;

        let content = metrics.css_content_size;
        Ok(ContentBox {
            x: content.x,
            y: content.y,
            width: content.width,
            height: content.height,
        })
    }

    async fn emulate_viewport(&mut self, emulation: ViewportEmulation) -> Result<(), CaptureError> {
        let params = SetDeviceMetricsOverrideParams::builder()
            .width(emulation.width)
            .height(emulation.height)
            .device_scale_factor(emulation.device_scale_factor)
            .mobile(emulation.mobile)
            .screen_orientation(CdpScreenOrientation::new(
                orientation_type(emulation.orientation),
                emulation.angle,
            ))
            .build()
            .map_err(CaptureError::EmulationFailed)?;

        self.page()?
            .execute(params)
            .await
            .map_err(|e| CaptureError::EmulationFailed(e.to_string()))?;
        Ok(())
    }

    async fn capture_screenshot(
        &mut self,
        options: &ScreenshotOptions,
    ) -> Result<Vec<u8>, CaptureError> {
        self.page()?
            .screenshot(screenshot_params(options))
            .await
            .map_err(|e| CaptureError::CaptureFailed(e.to_string()))
    }

    async fn close(&mut self) {
        if let Some(page) = self.page.take() {
            if let Err(e) = page.close().await {
                warn!("Failed to close tab: {}", e);
            }
        }
    }
}

impl Drop for ChromeSession {
    fn drop(&mut self) {
        // Dropped without close(), e.g. the capture future itself was cancelled
        if let Some(page) = self.page.take() {
            if let Ok(runtime) = tokio::runtime::Handle::try_current() {
                runtime.spawn(async move {
                    let _ = page.close().await;
                });
            }
        }
    }
}

fn screenshot_params(options: &ScreenshotOptions) -> ScreenshotParams {
    let mut builder = ScreenshotParams::builder()
        .format(screenshot_format(options.format))
        .clip(Viewport {
            x: options.clip.x,
            y: options.clip.y,
            width: options.clip.width,
            height: options.clip.height,
            scale: options.clip.scale,
        })
        .from_surface(options.from_surface);

    // Chromium rejects a quality for png
    if options.format.is_lossy() {
        builder = builder.quality(i64::from(options.quality));
    }

    builder.build()
}

fn screenshot_format(format: ImageFormat) -> CaptureScreenshotFormat {
    match format {
        ImageFormat::Png => CaptureScreenshotFormat::Png,
        ImageFormat::Jpeg => CaptureScreenshotFormat::Jpeg,
        ImageFormat::Webp => CaptureScreenshotFormat::Webp,
    }
}

fn orientation_type(orientation: ScreenOrientation) -> ScreenOrientationType {
    match orientation {
        ScreenOrientation::PortraitPrimary => ScreenOrientationType::PortraitPrimary,
        ScreenOrientation::PortraitSecondary => ScreenOrientationType::PortraitSecondary,
        ScreenOrientation::LandscapePrimary => ScreenOrientationType::LandscapePrimary,
        ScreenOrientation::LandscapeSecondary => ScreenOrientationType::LandscapeSecondary,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ClipRegion;

    #[test]
    fn test_screenshot_format_mapping() {
        assert!(matches!(
            screenshot_format(ImageFormat::Png),
            CaptureScreenshotFormat::Png
        ));
        assert!(matches!(
            screenshot_format(ImageFormat::Jpeg),
            CaptureScreenshotFormat::Jpeg
        ));
        assert!(matches!(
            screenshot_format(ImageFormat::Webp),
            CaptureScreenshotFormat::Webp
        ));
    }

    #[test]
    fn test_quality_only_sent_for_lossy_formats() {
        let mut options = ScreenshotOptions {
            format: ImageFormat::Png,
            quality: 80,
            clip: ClipRegion::default(),
            from_surface: true,
        };
        let params = screenshot_params(&options);
        assert_eq!(params.cdp_params.quality, None);
        assert_eq!(params.cdp_params.from_surface, Some(true));
        assert_eq!(params.cdp_params.clip.as_ref().map(|c| c.width), Some(996.0));

        options.format = ImageFormat::Jpeg;
        let params = screenshot_params(&options);
        assert_eq!(params.cdp_params.quality, Some(80));
    }

    #[test]
    fn test_orientation_mapping() {
        assert!(matches!(
            orientation_type(ScreenOrientation::PortraitPrimary),
            ScreenOrientationType::PortraitPrimary
        ));
        assert!(matches!(
            orientation_type(ScreenOrientation::LandscapeSecondary),
            ScreenOrientationType::LandscapeSecondary
        ));
    }
}
