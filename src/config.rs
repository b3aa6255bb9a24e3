//! Configuration management with serde serialization/deserialization
//!
//! This module holds the runtime settings used to launch Chromium and the
//! parameter types that describe a single capture.

use crate::CaptureError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Runtime configuration for the browser backing the captures
///
/// # Examples
///
/// ```rust
/// use html2image::Config;
///
/// let config = Config {
///     window_width: 1280,
///     window_height: 800,
///     ..Default::default()
/// };
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Path to Chrome/Chromium executable (default: auto-detect)
    pub chrome_path: Option<String>,

    /// Run the browser without a window (default: true)
    pub headless: bool,

    /// Pass `--no-sandbox` to Chromium (default: true)
    ///
    /// Required when running as root inside most containers.
    pub no_sandbox: bool,

    /// Initial browser window width in pixels (default: 996)
    pub window_width: u32,

    /// Initial browser window height in pixels (default: 996)
    pub window_height: u32,

    /// Custom User-Agent string (default: Chrome default)
    pub user_agent: Option<String>,

    /// Additional command-line switches appended after the built-in ones
    pub extra_args: Vec<String>,

    /// How long to wait for the browser process to come up (default: 20 seconds)
    pub launch_timeout: Duration,

    /// Timeout for a single DevTools request (default: 30 seconds)
    pub request_timeout: Duration,

    /// Deadline for a whole capture, measured from its start (default: none)
    pub capture_timeout: Option<Duration>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            chrome_path: None,
            headless: true,
            no_sandbox: true,
            window_width: DEFAULT_CLIP_WIDTH as u32,
            window_height: DEFAULT_CLIP_HEIGHT as u32,
            user_agent: None,
            extra_args: Vec::new(),
            launch_timeout: Duration::from_secs(20),
            request_timeout: Duration::from_secs(30),
            capture_timeout: None,
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), CaptureError> {
        if self.window_width == 0 || self.window_height == 0 {
            return Err(CaptureError::ConfigurationError(
                "Window dimensions must be greater than 0".to_string(),
            ));
        }

        if self.launch_timeout.is_zero() {
            return Err(CaptureError::ConfigurationError(
                "Launch timeout must be greater than 0".to_string(),
            ));
        }

        if self.request_timeout.is_zero() {
            return Err(CaptureError::ConfigurationError(
                "Request timeout must be greater than 0".to_string(),
            ));
        }

        if matches!(self.capture_timeout, Some(t) if t.is_zero()) {
            return Err(CaptureError::ConfigurationError(
                "Capture timeout must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

const DEFAULT_CLIP_WIDTH: f64 = 996.0;
const DEFAULT_CLIP_HEIGHT: f64 = 996.0;

/// Image compression format of a screenshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    /// PNG format - lossless, the default
    #[default]
    Png,
    /// JPEG format - lossy, honours quality
    Jpeg,
    /// WebP format - lossy, honours quality
    Webp,
}

impl ImageFormat {
    pub fn is_lossy(&self) -> bool {
        matches!(self, ImageFormat::Jpeg | ImageFormat::Webp)
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Jpeg => "jpg",
            ImageFormat::Webp => "webp",
        }
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ImageFormat::Png => "png",
            ImageFormat::Jpeg => "jpeg",
            ImageFormat::Webp => "webp",
        };
        f.write_str(name)
    }
}

impl FromStr for ImageFormat {
    type Err = CaptureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "png" => Ok(ImageFormat::Png),
            "jpeg" | "jpg" => Ok(ImageFormat::Jpeg),
            "webp" => Ok(ImageFormat::Webp),
            other => Err(CaptureError::InvalidRequest(format!(
                "unsupported image format: {other}"
            ))),
        }
    }
}

/// Rectangle of the page to capture, in device independent pixels
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct ClipRegion {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    /// Page scale factor
    pub scale: f64,
}

impl Default for ClipRegion {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width: DEFAULT_CLIP_WIDTH,
            height: DEFAULT_CLIP_HEIGHT,
            scale: 1.0,
        }
    }
}

/// Settings for one screenshot capture
///
/// `Default` is the only source of default values: PNG, quality 0, the
/// 996x996 clip at scale 1, capture from surface and no post-load wait.
#[derive(Debug, Clone, PartialEq)]
pub struct ScreenshotSettings {
    pub format: ImageFormat,
    /// Compression quality in `[0, 100]`, sent only for lossy formats
    pub quality: u8,
    /// When false, `clip` origin and size are replaced by the measured content box
    pub custom_clip: bool,
    pub clip: ClipRegion,
    /// Capture from the compositor surface rather than the view
    pub from_surface: bool,
    /// Pause after navigation before anything is measured
    pub waiting_time: Duration,
}

impl Default for ScreenshotSettings {
    fn default() -> Self {
        Self {
            format: ImageFormat::Png,
            quality: 0,
            custom_clip: false,
            clip: ClipRegion::default(),
            from_surface: true,
            waiting_time: Duration::ZERO,
        }
    }
}

/// Parameters of a capture, one variant per kind of output
#[derive(Debug, Clone, PartialEq)]
pub enum CaptureParams {
    Screenshot(ScreenshotSettings),
}

impl Default for CaptureParams {
    fn default() -> Self {
        CaptureParams::Screenshot(ScreenshotSettings::default())
    }
}

/// A single capture: the target URL and how to render it
#[derive(Debug, Clone)]
pub struct CaptureConfig {
    pub trace_id: uuid::Uuid,
    pub url: String,
    pub params: CaptureParams,
}

impl CaptureConfig {
    pub fn new(url: impl Into<String>, params: CaptureParams) -> Self {
        Self {
            trace_id: uuid::Uuid::new_v4(),
            url: url.into(),
            params,
        }
    }

    pub fn screenshot(url: impl Into<String>, settings: ScreenshotSettings) -> Self {
        Self::new(url, CaptureParams::Screenshot(settings))
    }
}

/// Generate Chrome command-line arguments based on configuration
///
/// ```rust
/// use html2image::{Config, get_chrome_args};
///
/// let args = get_chrome_args(&Config::default());
/// assert!(args.contains(&"--hide-scrollbars".to_string()));
/// ```
pub fn get_chrome_args(config: &Config) -> Vec<String> {
    let mut args = vec![
        "--disable-dev-shm-usage".to_string(),
        "--disable-gpu".to_string(),
        "--hide-scrollbars".to_string(),
        "--mute-audio".to_string(),
        "--disable-background-timer-throttling".to_string(),
        "--disable-backgrounding-occluded-windows".to_string(),
        "--disable-renderer-backgrounding".to_string(),
        "--disable-extensions".to_string(),
        "--disable-default-apps".to_string(),
        "--disable-sync".to_string(),
        "--no-first-run".to_string(),
    ];

    if let Some(user_agent) = &config.user_agent {
        args.push(format!("--user-agent={user_agent}"));
    }

    args.extend(config.extra_args.iter().cloned());

    args
}

pub fn create_browser_config(
    config: &Config,
) -> Result<chromiumoxide::browser::BrowserConfig, CaptureError> {
    use chromiumoxide::browser::BrowserConfig;

    let mut builder = BrowserConfig::builder()
        .window_size(config.window_width, config.window_height)
        .launch_timeout(config.launch_timeout)
        .request_timeout(config.request_timeout)
        .args(get_chrome_args(config));

    if !config.headless {
        builder = builder.with_head();
    }

    if config.no_sandbox {
        builder = builder.no_sandbox();
    }

    if let Some(chrome_path) = &config.chrome_path {
        builder = builder.chrome_executable(chrome_path);
    }

    builder.build().map_err(CaptureError::ConfigurationError)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_format_parsing() {
        assert_eq!("PNG".parse::<ImageFormat>().unwrap(), ImageFormat::Png);
        assert_eq!("jpg".parse::<ImageFormat>().unwrap(), ImageFormat::Jpeg);
        assert_eq!("webp".parse::<ImageFormat>().unwrap(), ImageFormat::Webp);
        assert!("gif".parse::<ImageFormat>().is_err());
    }

    #[test]
    fn test_lossy_formats() {
        assert!(!ImageFormat::Png.is_lossy());
        assert!(ImageFormat::Jpeg.is_lossy());
        assert!(ImageFormat::Webp.is_lossy());
    }

    #[test]
    fn test_config_validation() {
        assert!(Config::default().validate().is_ok());

        let config = Config {
            window_width: 0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(CaptureError::ConfigurationError(_))
        ));

        let config = Config {
            capture_timeout: Some(Duration::ZERO),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_config_file_uses_defaults() {
        let json = r#"{
            "chrome_path": "/usr/bin/chromium",
            "capture_timeout": { "secs": 45, "nanos": 0 }
        }"#;
        let parsed: Config = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.chrome_path.as_deref(), Some("/usr/bin/chromium"));
        assert_eq!(parsed.capture_timeout, Some(Duration::from_secs(45)));
        assert_eq!(parsed.window_width, 996);
        assert!(parsed.headless);
    }
}
