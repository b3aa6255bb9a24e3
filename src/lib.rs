//! # html2image
//!
//! Render a web page in headless Chromium and capture it as an image.
//!
//! A capture is a single sequential script against one fresh browser tab:
//!
//! 1. navigate to the URL
//! 2. optionally wait a fixed time after load
//! 3. resolve the clip region, either the caller's or the measured page content box
//! 4. force viewport emulation to the clip size (ratio 1, desktop, portrait)
//! 5. capture the screenshot in the requested format
//!
//! The tab is closed on every exit path, including cancellation and an
//! expired deadline.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use html2image::{capture, CaptureConfig, CaptureContext, ChromeBrowser, Config, ScreenshotSettings};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let browser = ChromeBrowser::launch(&Config::default()).await?;
//!
//!     let config = CaptureConfig::screenshot("https://example.com", ScreenshotSettings::default());
//!     let result = capture(&browser, &CaptureContext::default(), config).await?;
//!     println!("Captured {} bytes in {:?}", result.data.len(), result.elapsed);
//!
//!     browser.shutdown().await;
//!     Ok(())
//! }
//! ```
//!
//! ## CLI Usage
//!
//! ```bash
//! html2image capture --url https://example.com --output example.png
//! html2image --timeout 30 capture --url https://example.com --format jpeg --quality 80 --wait 500
//! html2image request --input request.json --output page.png
//! ```

/// Runtime configuration and capture parameter types
pub mod config;

/// Error types
pub mod error;

/// Request DTO, defaults and validation
pub mod request;

/// Browser session traits used by the workflow
pub mod session;

/// The capture workflow
pub mod capture;

/// Chromium-backed sessions
pub mod chrome;

/// Command-line interface implementation
pub mod cli;

/// Utility functions and helpers
pub mod utils;


pub use capture::*;
pub use chrome::*;
pub use cli::*;
pub use config::*;
pub use error::*;
pub use request::*;
pub use session::*;
pub use utils::*;
