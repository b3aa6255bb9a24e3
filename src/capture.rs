//! Screenshot capture workflow
//!
//! One capture is a strictly sequential script run against a fresh
//! [`CaptureSession`]: navigate, optionally wait, resolve the clip, force the
//! viewport, take the screenshot. The session is closed on every exit path
//! once it has been opened.

use crate::{
    CaptureConfig, CaptureError, CaptureParams, CaptureSession, ScreenshotOptions,
    ScreenshotSettings, SessionFactory, ViewportEmulation,
};
use async_trait::async_trait;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, info_span, warn, Instrument};

/// Cancellation and deadline carried through a capture
#[derive(Debug, Clone, Default)]
pub struct CaptureContext {
    token: CancellationToken,
    deadline: Option<tokio::time::Instant>,
}

impl CaptureContext {
    pub fn new(token: CancellationToken) -> Self {
        Self {
            token,
            deadline: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.deadline = Some(tokio::time::Instant::now() + timeout);
        self
    }

    pub fn with_deadline(mut self, deadline: tokio::time::Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn deadline(&self) -> Option<tokio::time::Instant> {
        self.deadline
    }

    /// Resolves once the context is cancelled or past its deadline.
    pub async fn done(&self) -> CaptureError {
        match self.deadline {
            Some(deadline) => tokio::select! {
                _ = self.token.cancelled() => CaptureError::Cancelled,
                _ = tokio::time::sleep_until(deadline) => CaptureError::DeadlineExceeded,
            },
            None => {
                self.token.cancelled().await;
                CaptureError::Cancelled
            }
        }
    }

    /// Immediate check without awaiting.
    pub fn err(&self) -> Option<CaptureError> {
        if self.token.is_cancelled() {
            Some(CaptureError::Cancelled)
        } else if matches!(self.deadline, Some(d) if tokio::time::Instant::now() >= d) {
            Some(CaptureError::DeadlineExceeded)
        } else {
            None
        }
    }
}

/// Encoded image and how long the capture took
#[derive(Debug, Clone)]
pub struct CaptureResult {
    pub data: Vec<u8>,
    pub elapsed: Duration,
}

/// Run one capture against a fresh session from `factory`.
pub async fn capture<F>(
    factory: &F,
    ctx: &CaptureContext,
    config: CaptureConfig,
) -> Result<CaptureResult, CaptureError>
where
    F: SessionFactory + ?Sized,
{
    let start = Instant::now();
    let span = info_span!("capture", trace_id = %config.trace_id, url = %config.url);

    let outcome = run(factory, ctx, &config).instrument(span.clone()).await;
    let elapsed = start.elapsed();

    let _enter = span.enter();
    match outcome {
        Ok(data) => {
            info!("Captured {} bytes in {:?}", data.len(), elapsed);
            Ok(CaptureResult { data, elapsed })
        }
        Err(e) => {
            match e.stage() {
                Some(stage) => warn!("Capture failed at {} after {:?}: {}", stage, elapsed, e),
                None => warn!("Capture stopped after {:?}: {}", elapsed, e),
            }
            Err(e)
        }
    }
}

async fn run<F>(
    factory: &F,
    ctx: &CaptureContext,
    config: &CaptureConfig,
) -> Result<Vec<u8>, CaptureError>
where
    F: SessionFactory + ?Sized,
{
    if let Some(e) = ctx.err() {
        return Err(e);
    }

    let mut session = tokio::select! {
        biased;
        e = ctx.done() => return Err(e),
        opened = factory.open_session() => opened?,
    };
    debug!("Session opened");

    let CaptureParams::Screenshot(settings) = &config.params;

    let result = tokio::select! {
        biased;
        e = ctx.done() => Err(e),
        shot = take_screenshot(&mut session, &config.url, settings) => shot,
    };

    session.close().await;
    debug!("Session closed");

    result
}

async fn take_screenshot<S>(
    session: &mut S,
    url: &str,
    settings: &ScreenshotSettings,
) -> Result<Vec<u8>, CaptureError>
where
    S: CaptureSession + ?Sized,
{
    session.navigate(url).await?;

    if !settings.waiting_time.is_zero() {
        debug!("Waiting {:?} after load", settings.waiting_time);
        session.wait(settings.waiting_time).await;
    }

    let mut clip = settings.clip;
    if !settings.custom_clip {
        let content = session.layout_metrics().await?;
        clip.x = content.x;
        clip.y = content.y;
        clip.width = content.width;
        clip.height = content.height;
    }
    debug!(
        "Clip resolved to {}x{} at ({}, {}) scale {}",
        clip.width, clip.height, clip.x, clip.y, clip.scale
    );

    session
        .emulate_viewport(ViewportEmulation::for_clip(&clip))
        .await?;

    session
        .capture_screenshot(&ScreenshotOptions {
            format: settings.format,
            quality: settings.quality,
            clip,
            from_surface: settings.from_surface,
        })
        .await
}

/// Something that turns its configured input into encoded bytes
#[async_trait]
pub trait Converter {
    async fn convert(&mut self) -> Result<Vec<u8>, CaptureError>;

    /// Duration of the last `convert`, set on success and on failure.
    fn convert_elapsed(&self) -> Duration;
}

/// Converter from a web page to an image
pub struct Html2Image<'a, F: SessionFactory + ?Sized> {
    factory: &'a F,
    ctx: CaptureContext,
    config: CaptureConfig,
    convert_elapsed: Duration,
}

impl<'a, F: SessionFactory + ?Sized> Html2Image<'a, F> {
    pub fn new(factory: &'a F, ctx: CaptureContext, config: CaptureConfig) -> Self {
        Self {
            factory,
            ctx,
            config,
            convert_elapsed: Duration::ZERO,
        }
    }

    pub fn config(&self) -> &CaptureConfig {
        &self.config
    }
}

#[async_trait]
impl<'a, F: SessionFactory + ?Sized> Converter for Html2Image<'a, F> {
    async fn convert(&mut self) -> Result<Vec<u8>, CaptureError> {
        let start = Instant::now();
        let result = capture(self.factory, &self.ctx, self.config.clone()).await;
        self.convert_elapsed = match &result {
            Ok(captured) => captured.elapsed,
            Err(_) => start.elapsed(),
        };
        result.map(|captured| captured.data)
    }

    fn convert_elapsed(&self) -> Duration {
        self.convert_elapsed
    }
}
