//! Browser automation session used by the capture workflow
//!
//! The workflow only talks to a browser through [`CaptureSession`], one tab
//! per capture, obtained from a [`SessionFactory`].

use crate::{CaptureError, ClipRegion, ImageFormat};
use async_trait::async_trait;
use std::time::Duration;

/// Measured bounding box of the rendered page content
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContentBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScreenOrientation {
    PortraitPrimary,
    PortraitSecondary,
    LandscapePrimary,
    LandscapeSecondary,
}

/// Device metrics forced on the page before capturing
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportEmulation {
    pub width: i64,
    pub height: i64,
    pub device_scale_factor: f64,
    pub mobile: bool,
    pub orientation: ScreenOrientation,
    /// Orientation angle in degrees
    pub angle: i64,
}

impl ViewportEmulation {
    /// Desktop emulation sized to `clip`: ratio 1, no mobile, portrait at angle 0.
    pub fn for_clip(clip: &ClipRegion) -> Self {
        Self {
            width: clip.width as i64,
            height: clip.height as i64,
            device_scale_factor: 1.0,
            mobile: false,
            orientation: ScreenOrientation::PortraitPrimary,
            angle: 0,
        }
    }
}

/// Fully resolved arguments of the screenshot primitive
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenshotOptions {
    pub format: ImageFormat,
    pub quality: u8,
    pub clip: ClipRegion,
    pub from_surface: bool,
}

/// One controlled browser tab, alive for the duration of a single capture
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CaptureSession: Send {
    async fn navigate(&mut self, url: &str) -> Result<(), CaptureError>;

    async fn wait(&mut self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }

    async fn layout_metrics(&mut self) -> Result<ContentBox, CaptureError>;

    async fn emulate_viewport(&mut self, emulation: ViewportEmulation) -> Result<(), CaptureError>;

    async fn capture_screenshot(
        &mut self,
        options: &ScreenshotOptions,
    ) -> Result<Vec<u8>, CaptureError>;

    /// Release the tab. Called exactly once per opened session.
    async fn close(&mut self);
}

#[async_trait]
pub trait SessionFactory: Send + Sync {
    type Session: CaptureSession;

    async fn open_session(&self) -> Result<Self::Session, CaptureError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emulation_truncates_clip_size() {
        let clip = ClipRegion {
            x: 5.0,
            y: 5.0,
            width: 800.9,
            height: 600.2,
            scale: 2.0,
        };
        let emulation = ViewportEmulation::for_clip(&clip);
        assert_eq!(emulation.width, 800);
        assert_eq!(emulation.height, 600);
        assert_eq!(emulation.device_scale_factor, 1.0);
        assert!(!emulation.mobile);
        assert_eq!(emulation.orientation, ScreenOrientation::PortraitPrimary);
        assert_eq!(emulation.angle, 0);
    }
}
