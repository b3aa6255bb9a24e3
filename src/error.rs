use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum CaptureError {
    #[error("Capture session unavailable: {0}")]
    SessionUnavailable(String),

    #[error("Browser launch failed: {0}")]
    BrowserLaunchFailed(String),

    #[error("Navigation failed: {0}")]
    NavigationFailed(String),

    #[error("Layout metrics query failed: {0}")]
    LayoutMetricsFailed(String),

    #[error("Viewport emulation failed: {0}")]
    EmulationFailed(String),

    #[error("Screenshot capture failed: {0}")]
    CaptureFailed(String),

    #[error("Capture cancelled")]
    Cancelled,

    #[error("Capture deadline exceeded")]
    DeadlineExceeded,

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("IO error: {0}")]
    IoError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

/// Step of the capture workflow an error originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureStage {
    OpenSession,
    Navigate,
    LayoutMetrics,
    EmulateViewport,
    Screenshot,
}

impl fmt::Display for CaptureStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CaptureStage::OpenSession => "open-session",
            CaptureStage::Navigate => "navigate",
            CaptureStage::LayoutMetrics => "layout-metrics",
            CaptureStage::EmulateViewport => "emulate-viewport",
            CaptureStage::Screenshot => "screenshot",
        };
        f.write_str(name)
    }
}

impl CaptureError {
    pub fn stage(&self) -> Option<CaptureStage> {
        match self {
            CaptureError::SessionUnavailable(_) | CaptureError::BrowserLaunchFailed(_) => {
                Some(CaptureStage::OpenSession)
            }
            CaptureError::NavigationFailed(_) => Some(CaptureStage::Navigate),
            CaptureError::LayoutMetricsFailed(_) => Some(CaptureStage::LayoutMetrics),
            CaptureError::EmulationFailed(_) => Some(CaptureStage::EmulateViewport),
            CaptureError::CaptureFailed(_) => Some(CaptureStage::Screenshot),
            _ => None,
        }
    }

    /// True for the two outcomes produced by the caller's context rather than the browser.
    pub fn is_interrupted(&self) -> bool {
        matches!(self, CaptureError::Cancelled | CaptureError::DeadlineExceeded)
    }
}

impl From<std::io::Error> for CaptureError {
    fn from(err: std::io::Error) -> Self {
        CaptureError::IoError(err.to_string())
    }
}

impl From<serde_json::Error> for CaptureError {
    fn from(err: serde_json::Error) -> Self {
        CaptureError::SerializationError(err.to_string())
    }
}
