use crate::error::ScanError;

/// OCR processing result
#[derive(Debug, Clone)]
pub struct OcrResult {
    pub text: String,
    /// 0.0-1.0 when the engine reports one
    pub confidence: Option<f32>,
}

/// Trait that all OCR engines must implement
pub trait OcrEngine: Send + Sync {
    /// Returns the engine identifier (e.g., "ocrs", "leptess")
    fn name(&self) -> &'static str;

    /// Returns a human-readable description of the engine
    fn description(&self) -> &'static str;

    /// Recognize text in an encoded still image (PNG from the pipeline)
    fn recognize(&self, image: &[u8], language: &str) -> Result<OcrResult, ScanError>;

    /// Get supported languages
    fn supported_languages(&self) -> Vec<String>;
}
