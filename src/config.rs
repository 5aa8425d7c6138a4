use crate::preprocessing::steps::{contrast, threshold};
use crate::preprocessing::Preset;
use std::path::PathBuf;
use std::time::Duration;

/// Server configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// OCR language hint (Tesseract code)
    pub language: String,
    /// Engine to use, `None` picks one by language
    pub engine: Option<String>,
    pub preset: Preset,
    pub threshold: u8,
    pub contrast_factor: f32,
    pub live_interval: Duration,
    pub additives_path: PathBuf,
    pub max_file_size: usize,
    pub tessdata_path: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 9393,
            language: "jpn".to_string(),
            engine: None,
            preset: Preset::default(),
            threshold: threshold::DEFAULT_LEVEL,
            contrast_factor: contrast::DEFAULT_FACTOR,
            live_interval: Duration::from_millis(1000),
            additives_path: PathBuf::from("data/additives.json"),
            max_file_size: 20 * 1024 * 1024,
            tessdata_path: None,
        }
    }
}
