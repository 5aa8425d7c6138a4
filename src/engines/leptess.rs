//! Leptess/Tesseract engine implementation
//!
//! Tesseract-based OCR engine, needed for Japanese label text.
//! Uses tesseract-static crate for static linking (no system dependencies).
//! Downloads tessdata (training data) per language on first use.

use super::cache;
use crate::config::Config;
use crate::engine::{OcrEngine, OcrResult};
use crate::error::ScanError;
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Mutex;
use tesseract_static::tesseract::Tesseract;

/// Tesseract page segmentation mode 7: treat the image as a single text line
const SINGLE_LINE_PSM: &str = "7";

/// Tesseract OCR Engine
pub struct LeptessEngine {
    /// Path to tessdata directory
    tessdata_path: PathBuf,
    ensured: EnsuredLanguages,
}

/// Languages whose traineddata is known to be on disk
#[derive(Default)]
struct EnsuredLanguages(Mutex<HashSet<String>>);

impl EnsuredLanguages {
    /// Run `fetch` for `language` unless an earlier call already succeeded
    fn ensure_with(
        &self,
        language: &str,
        fetch: impl FnOnce() -> Result<(), ScanError>,
    ) -> Result<(), ScanError> {
        let mut ensured = self
            .0
            .lock()
            .map_err(|_| ScanError::InitializationError("tessdata lock poisoned".to_string()))?;
        if ensured.contains(language) {
            return Ok(());
        }
        fetch()?;
        ensured.insert(language.to_string());
        Ok(())
    }
}

impl LeptessEngine {
    /// Create a new Tesseract-based OCR engine
    pub fn new(config: &Config) -> Result<Self, ScanError> {
        let tessdata_path = match &config.tessdata_path {
            Some(path) => PathBuf::from(path),
            None => cache::cache_dir("tessdata")?,
        };

        let engine = Self {
            tessdata_path,
            ensured: EnsuredLanguages::default(),
        };
        engine.ensure_language(&config.language)?;

        // Validate that tessdata is accessible by doing a test initialization
        engine.tesseract(&config.language)?;

        tracing::info!(
            "Leptess engine initialized (tessdata: {:?}, language: {})",
            engine.tessdata_path,
            config.language
        );

        Ok(engine)
    }

    /// Make sure `<language>.traineddata` is present, downloading if needed.
    /// Checked once per language for the lifetime of the engine.
    fn ensure_language(&self, language: &str) -> Result<(), ScanError> {
        self.ensured.ensure_with(language, || {
            let filename = format!("{}.traineddata", language);
            cache::ensure_downloaded(&tessdata_url(language), &self.tessdata_path, &filename)?;
            Ok(())
        })
    }

    fn tesseract(&self, language: &str) -> Result<Tesseract, ScanError> {
        let datapath = self
            .tessdata_path
            .to_str()
            .ok_or_else(|| ScanError::InitializationError("Invalid tessdata path".to_string()))?;

        Tesseract::new(Some(datapath), Some(language)).map_err(|e| {
            ScanError::InitializationError(format!("Failed to initialize Tesseract: {}", e))
        })
    }
}

impl OcrEngine for LeptessEngine {
    fn name(&self) -> &'static str {
        "leptess"
    }

    fn description(&self) -> &'static str {
        "Tesseract OCR engine - many languages including Japanese"
    }

    fn recognize(&self, image: &[u8], language: &str) -> Result<OcrResult, ScanError> {
        let img = image::load_from_memory(image)
            .map_err(|e| ScanError::Recognition(format!("Failed to load image: {}", e)))?;
        let rgb_img = img.to_rgb8();
        let (width, height) = rgb_img.dimensions();

        // Convert to BMP in memory (BMP is always supported by leptonica)
        let mut bmp_data = Vec::new();
        rgb_img
            .write_to(&mut std::io::Cursor::new(&mut bmp_data), image::ImageFormat::Bmp)
            .map_err(|e| ScanError::Recognition(format!("Failed to convert to BMP: {}", e)))?;

        tracing::debug!(
            "Recognizing {}x{} image ({} bytes BMP, language {})",
            width,
            height,
            bmp_data.len(),
            language
        );

        self.ensure_language(language)
            .map_err(|e| ScanError::Recognition(e.to_string()))?;

        let mut tess = self
            .tesseract(language)
            .map_err(|e| ScanError::Recognition(e.to_string()))?;

        tess = tess
            .set_variable("tessedit_pageseg_mode", SINGLE_LINE_PSM)
            .map_err(|e| {
                ScanError::Recognition(format!("Failed to set page segmentation: {}", e))
            })?;

        tess = tess.set_image_from_mem(&bmp_data).map_err(|e| {
            ScanError::Recognition(format!(
                "Failed to set image ({}x{}, {} bytes): {}",
                width,
                height,
                bmp_data.len(),
                e
            ))
        })?;

        tess = tess
            .recognize()
            .map_err(|e| ScanError::Recognition(format!("Failed to recognize text: {}", e)))?;

        let text = tess
            .get_text()
            .map_err(|e| ScanError::Recognition(format!("Failed to get text: {}", e)))?;

        // 0-100 scale from Tesseract
        let confidence = tess.mean_text_conf() as f32 / 100.0;

        Ok(OcrResult {
            text: text.trim().to_string(),
            confidence: Some(confidence),
        })
    }

    fn supported_languages(&self) -> Vec<String> {
        // Any tessdata_fast language works; these are the ones label text usually needs
        vec![
            "jpn".to_string(),
            "jpn_vert".to_string(),
            "eng".to_string(),
            "chi_sim".to_string(),
            "chi_tra".to_string(),
            "kor".to_string(),
        ]
    }
}

/// Get tessdata download URL for a language
fn tessdata_url(language: &str) -> String {
    // tessdata_fast for smaller, faster downloads
    format!(
        "https://github.com/tesseract-ocr/tessdata_fast/raw/main/{}.traineddata",
        language
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_language_fetched_once() {
        let ensured = EnsuredLanguages::default();
        let fetches = Cell::new(0);
        let fetch = || {
            fetches.set(fetches.get() + 1);
            Ok(())
        };

        ensured.ensure_with("jpn", fetch).unwrap();
        ensured.ensure_with("jpn", fetch).unwrap();
        assert_eq!(fetches.get(), 1);

        ensured.ensure_with("eng", fetch).unwrap();
        assert_eq!(fetches.get(), 2);
    }

    #[test]
    fn test_failed_fetch_is_retried() {
        let ensured = EnsuredLanguages::default();
        let result =
            ensured.ensure_with("kor", || Err(ScanError::InitializationError("offline".to_string())));
        assert!(result.is_err());

        let fetches = Cell::new(0);
        ensured
            .ensure_with("kor", || {
                fetches.set(fetches.get() + 1);
                Ok(())
            })
            .unwrap();
        assert_eq!(fetches.get(), 1);
    }

    #[test]
    fn test_tessdata_url() {
        assert_eq!(
            tessdata_url("jpn"),
            "https://github.com/tesseract-ocr/tessdata_fast/raw/main/jpn.traineddata"
        );
    }
}
