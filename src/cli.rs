use crate::{
    capture, format_bytes, format_duration, output_filename, CaptureConfig, CaptureContext,
    CaptureParams, CaptureRequest, ChromeBrowser, Config, ImageFormat,
};
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;
use tokio_util::sync::CancellationToken;
use tracing::info;

#[derive(Parser)]
#[command(name = "html2image")]
#[command(about = "Render a web page with headless Chromium and save a screenshot")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(long, help = "Configuration file path")]
    pub config: Option<PathBuf>,

    #[arg(long, help = "Chrome executable path")]
    pub chrome_path: Option<String>,

    #[arg(long, help = "Capture deadline in seconds")]
    pub timeout: Option<u64>,

    #[arg(long, help = "Show the browser window")]
    pub headful: bool,

    #[arg(long, help = "Enable verbose logging")]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Capture a single URL
    Capture(CaptureArgs),

    /// Capture from a JSON request file (camelCase fields)
    Request {
        #[arg(short, long, help = "JSON file holding the request")]
        input: PathBuf,

        #[arg(short, long, help = "Output file path")]
        output: Option<PathBuf>,
    },

    /// Validate configuration
    Validate {
        #[arg(short, long, help = "Configuration file to validate")]
        config: PathBuf,
    },
}

#[derive(Args, Debug, Clone)]
pub struct CaptureArgs {
    #[arg(short, long, help = "URL to capture")]
    pub url: String,

    #[arg(short, long, help = "Output file path (default: derived from the URL)")]
    pub output: Option<PathBuf>,

    #[arg(long, default_value = "png", help = "Image format (png, jpeg, webp)")]
    pub format: ImageFormat,

    #[arg(
        long,
        default_value_t = 0,
        value_parser = clap::value_parser!(u8).range(0..=100),
        help = "Compression quality for jpeg/webp"
    )]
    pub quality: u8,

    #[arg(long, help = "Use the clip below instead of the page content size")]
    pub custom_clip: bool,

    #[arg(long, default_value_t = 0.0)]
    pub clip_x: f64,

    #[arg(long, default_value_t = 0.0)]
    pub clip_y: f64,

    #[arg(long, default_value_t = 996.0)]
    pub clip_width: f64,

    #[arg(long, default_value_t = 996.0)]
    pub clip_height: f64,

    #[arg(long, default_value_t = 1.0)]
    pub clip_scale: f64,

    #[arg(long, help = "Capture from the view rather than the surface")]
    pub from_view: bool,

    #[arg(long, default_value_t = 0, help = "Wait time in milliseconds after page load")]
    pub wait: u64,
}

impl CaptureArgs {
    pub fn to_request(&self) -> CaptureRequest {
        CaptureRequest {
            url: self.url.clone(),
            format: self.format,
            quality: self.quality,
            custom_clip: self.custom_clip,
            clip_x: self.clip_x,
            clip_y: self.clip_y,
            clip_width: self.clip_width,
            clip_height: self.clip_height,
            clip_scale: self.clip_scale,
            from_surface: !self.from_view,
            waiting_time: self.wait,
        }
    }
}

pub struct CliRunner {
    pub config: Config,
    shutdown: CancellationToken,
}

impl CliRunner {
    pub fn new(config: Config, shutdown: CancellationToken) -> Self {
        Self { config, shutdown }
    }

    pub async fn run(&self, command: Commands) -> anyhow::Result<()> {
        match command {
            Commands::Capture(args) => {
                let output = args.output.clone();
                self.run_request(args.to_request(), output).await
            }
            Commands::Request { input, output } => {
                let content = fs::read_to_string(&input).await?;
                let request: CaptureRequest = serde_json::from_str(&content)?;
                info!("Loaded request from {}", input.display());
                self.run_request(request, output).await
            }
            Commands::Validate { config } => self.validate_config(config).await,
        }
    }

    pub async fn run_request(
        &self,
        request: CaptureRequest,
        output: Option<PathBuf>,
    ) -> anyhow::Result<()> {
        // Reject bad input before a browser is started
        let config = request.into_config()?;
        let output = output.unwrap_or_else(|| {
            let CaptureParams::Screenshot(settings) = &config.params;
            PathBuf::from(output_filename(&config.url, settings.format))
        });

        let browser = ChromeBrowser::launch(&self.config).await?;
        let result = self.capture_to_file(&browser, config, &output).await;
        browser.shutdown().await;
        result
    }

    async fn capture_to_file(
        &self,
        browser: &ChromeBrowser,
        config: CaptureConfig,
        output: &Path,
    ) -> anyhow::Result<()> {
        info!("Capturing {}", config.url);

        let url = config.url.clone();
        let ctx = self.context();
        let captured = capture(browser, &ctx, config).await?;

        if let Some(parent) = output.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }
        fs::write(output, &captured.data).await?;
        info!("Screenshot saved to: {}", output.display());

        println!("Screenshot captured successfully:");
        println!("  URL: {url}");
        println!("  Output: {}", output.display());
        println!("  Size: {}", format_bytes(captured.data.len()));
        println!("  Duration: {}", format_duration(captured.elapsed));

        Ok(())
    }

    fn context(&self) -> CaptureContext {
        let ctx = CaptureContext::new(self.shutdown.child_token());
        match self.config.capture_timeout {
            Some(timeout) => ctx.with_timeout(timeout),
            None => ctx,
        }
    }

    pub async fn validate_config(&self, config_path: PathBuf) -> anyhow::Result<()> {
        println!("Validating configuration: {}", config_path.display());

        let config = load_config_file(&config_path).await?;
        config.validate()?;

        println!("Configuration is valid:");
        println!(
            "  Chrome path: {}",
            config.chrome_path.as_deref().unwrap_or("auto-detect")
        );
        println!("  Headless: {}", config.headless);
        println!("  Window: {}x{}", config.window_width, config.window_height);
        println!("  Launch timeout: {:?}", config.launch_timeout);
        println!("  Request timeout: {:?}", config.request_timeout);
        match config.capture_timeout {
            Some(timeout) => println!("  Capture timeout: {timeout:?}"),
            None => println!("  Capture timeout: none"),
        }

        Ok(())
    }
}

pub async fn load_config_file(path: &Path) -> anyhow::Result<Config> {
    let content = fs::read_to_string(path).await?;
    Ok(serde_json::from_str(&content)?)
}

/// File config (or defaults) with command-line overrides applied, validated.
pub async fn load_config(args: &Cli) -> anyhow::Result<Config> {
    let mut config = match &args.config {
        Some(path) => load_config_file(path).await?,
        None => Config::default(),
    };

    if let Some(chrome_path) = &args.chrome_path {
        config.chrome_path = Some(chrome_path.clone());
    }

    if let Some(timeout) = args.timeout {
        config.capture_timeout = Some(Duration::from_secs(timeout));
    }

    if args.headful {
        config.headless = false;
    }

    config.validate()?;

    info!("Configuration loaded");
    info!("Headless: {}", config.headless);
    info!("Capture timeout: {:?}", config.capture_timeout);

    Ok(config)
}

pub fn setup_logging(verbose: bool) -> anyhow::Result<()> {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .init();

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ScreenshotSettings;

    #[test]
    fn test_parse_capture_command() {
        let cli = Cli::try_parse_from([
            "html2image",
            "capture",
            "--url",
            "https://example.com",
            "--format",
            "jpeg",
            "--quality",
            "75",
            "--wait",
            "250",
            "--from-view",
        ])
        .unwrap();

        let Commands::Capture(args) = cli.command else {
            panic!("expected capture command");
        };
        let settings = args.to_request().settings();
        assert_eq!(settings.format, ImageFormat::Jpeg);
        assert_eq!(settings.quality, 75);
        assert_eq!(settings.waiting_time, Duration::from_millis(250));
        assert!(!settings.from_surface);
        assert!(!settings.custom_clip);
        assert_eq!(args.to_request().url, "https://example.com");
    }

    #[test]
    fn test_capture_defaults_match_settings() {
        let cli = Cli::try_parse_from(["html2image", "capture", "--url", "https://example.com"])
            .unwrap();
        let Commands::Capture(args) = cli.command else {
            panic!("expected capture command");
        };
        assert_eq!(args.to_request().settings(), ScreenshotSettings::default());
    }

    #[test]
    fn test_quality_range_enforced() {
        let parsed = Cli::try_parse_from([
            "html2image",
            "capture",
            "--url",
            "https://example.com",
            "--quality",
            "150",
        ]);
        assert!(parsed.is_err());
    }

    #[tokio::test]
    async fn test_load_config_applies_overrides() {
        let cli = Cli::try_parse_from([
            "html2image",
            "--timeout",
            "12",
            "--headful",
            "--chrome-path",
            "/opt/chromium/chrome",
            "validate",
            "--config",
            "unused.json",
        ])
        .unwrap();

        let config = load_config(&cli).await.unwrap();
        assert_eq!(config.capture_timeout, Some(Duration::from_secs(12)));
        assert!(!config.headless);
        assert_eq!(config.chrome_path.as_deref(), Some("/opt/chromium/chrome"));
    }

    #[tokio::test]
    async fn test_invalid_request_fails_before_launch() {
        let runner = CliRunner::new(Config::default(), CancellationToken::new());
        let err = runner
            .run_request(CaptureRequest::new("not a url"), None)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Invalid request"));
    }
}
