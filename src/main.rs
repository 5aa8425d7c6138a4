use additive_scanner::config::Config;
use additive_scanner::preprocessing::Preset;
use additive_scanner::server;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "additive-scanner-server")]
#[command(about = "Food additive lookup from camera crops via OCR")]
#[command(version)]
pub struct Args {
    /// Host address to bind to
    #[arg(long, env = "SCANNER_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Port to listen on
    #[arg(long, env = "SCANNER_PORT", default_value = "9393")]
    pub port: u16,

    /// OCR language hint (e.g., "jpn", "eng")
    #[arg(long, env = "SCANNER_LANGUAGE", default_value = "jpn")]
    pub language: String,

    /// OCR engine to use (e.g., "ocrs", "leptess"); picked by language if unset
    #[arg(long, env = "SCANNER_ENGINE")]
    pub engine: Option<String>,

    /// Preprocessing preset: "otsu" (median + Otsu) or "classic" (contrast + blur + fixed)
    #[arg(long, env = "SCANNER_PRESET", default_value = "otsu")]
    pub preset: Preset,

    /// Binarization level for the classic preset
    #[arg(long, env = "SCANNER_THRESHOLD", default_value = "128")]
    pub threshold: u8,

    /// Contrast stretch factor for the classic preset
    #[arg(long, env = "SCANNER_CONTRAST_FACTOR", default_value = "1.5")]
    pub contrast_factor: f32,

    /// Live preview OCR interval in milliseconds
    #[arg(long, env = "SCANNER_LIVE_INTERVAL_MS", default_value = "1000")]
    pub live_interval_ms: u64,

    /// Path to the additive knowledge base JSON
    #[arg(long, env = "SCANNER_ADDITIVES", default_value = "data/additives.json")]
    pub additives: PathBuf,

    /// Maximum upload size in bytes (default: 20MB)
    #[arg(long, env = "SCANNER_MAX_FILE_SIZE", default_value = "20971520")]
    pub max_file_size: usize,

    /// Path to tessdata directory (downloaded to the cache if not set)
    #[arg(long, env = "TESSDATA_PREFIX")]
    pub tessdata_path: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "RUST_LOG", default_value = "info")]
    pub log_level: String,
}

impl From<Args> for Config {
    fn from(args: Args) -> Self {
        Self {
            host: args.host,
            port: args.port,
            language: args.language,
            engine: args.engine,
            preset: args.preset,
            threshold: args.threshold,
            contrast_factor: args.contrast_factor,
            live_interval: Duration::from_millis(args.live_interval_ms.max(1)),
            additives_path: args.additives,
            max_file_size: args.max_file_size,
            tessdata_path: args.tessdata_path,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| args.log_level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from(args);

    tracing::info!(
        "Starting additive-scanner-server v{}",
        env!("CARGO_PKG_VERSION")
    );
    tracing::info!("Binding to {}:{}", config.host, config.port);

    server::run(config).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::from(Args::parse_from(["additive-scanner-server"]));
        assert_eq!(config.port, 9393);
        assert_eq!(config.language, "jpn");
        assert_eq!(config.preset, Preset::Otsu);
        assert_eq!(config.live_interval, Duration::from_secs(1));
    }

    #[test]
    fn test_preset_flag() {
        let args = Args::parse_from([
            "additive-scanner-server",
            "--preset",
            "classic",
            "--threshold",
            "100",
        ]);
        let config = Config::from(args);
        assert_eq!(config.preset, Preset::Classic);
        assert_eq!(config.threshold, 100);
    }
}
