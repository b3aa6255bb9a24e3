//! Flat capture request as submitted by callers (JSON, camelCase keys)

use crate::{CaptureConfig, CaptureError, ClipRegion, ImageFormat, ScreenshotSettings};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

/// Wire shape of a screenshot request
///
/// Every field but `url` is optional; missing fields take the values of
/// [`ScreenshotSettings::default`].
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CaptureRequest {
    pub url: String,
    pub format: ImageFormat,
    pub quality: u8,
    /// Clip fields are only honoured when this is set
    pub custom_clip: bool,
    pub clip_x: f64,
    pub clip_y: f64,
    pub clip_width: f64,
    pub clip_height: f64,
    pub clip_scale: f64,
    pub from_surface: bool,
    /// Milliseconds to wait after the page loaded; 0 means no wait
    pub waiting_time: u64,
}

impl Default for CaptureRequest {
    fn default() -> Self {
        let settings = ScreenshotSettings::default();
        Self {
            url: String::new(),
            format: settings.format,
            quality: settings.quality,
            custom_clip: settings.custom_clip,
            clip_x: settings.clip.x,
            clip_y: settings.clip.y,
            clip_width: settings.clip.width,
            clip_height: settings.clip.height,
            clip_scale: settings.clip.scale,
            from_surface: settings.from_surface,
            waiting_time: settings.waiting_time.as_millis() as u64,
        }
    }
}

impl CaptureRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<(), CaptureError> {
        validate_target_url(&self.url)?;

        if self.quality > 100 {
            return Err(CaptureError::InvalidRequest(format!(
                "quality must be within 0..=100, got {}",
                self.quality
            )));
        }

        if self.custom_clip {
            let clip = self.clip();
            if !(clip.width > 0.0 && clip.height > 0.0) {
                return Err(CaptureError::InvalidRequest(format!(
                    "custom clip needs a positive size, got {}x{}",
                    clip.width, clip.height
                )));
            }
            if !(clip.scale > 0.0) {
                return Err(CaptureError::InvalidRequest(format!(
                    "custom clip needs a positive scale, got {}",
                    clip.scale
                )));
            }
        }

        Ok(())
    }

    pub fn settings(&self) -> ScreenshotSettings {
        ScreenshotSettings {
            format: self.format,
            quality: self.quality,
            custom_clip: self.custom_clip,
            clip: self.clip(),
            from_surface: self.from_surface,
            waiting_time: Duration::from_millis(self.waiting_time),
        }
    }

    /// Validate and turn the request into a capture configuration.
    pub fn into_config(self) -> Result<CaptureConfig, CaptureError> {
        self.validate()?;
        let settings = self.settings();
        Ok(CaptureConfig::screenshot(self.url, settings))
    }

    fn clip(&self) -> ClipRegion {
        ClipRegion {
            x: self.clip_x,
            y: self.clip_y,
            width: self.clip_width,
            height: self.clip_height,
            scale: self.clip_scale,
        }
    }
}

/// Accepts any absolute URL the browser can navigate to.
pub fn validate_target_url(url: &str) -> Result<Url, CaptureError> {
    if url.trim().is_empty() {
        return Err(CaptureError::InvalidRequest("url is required".to_string()));
    }

    Url::parse(url).map_err(|e| CaptureError::InvalidRequest(format!("invalid url {url:?}: {e}")))
}
