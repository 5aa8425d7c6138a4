//! Frame to text to additive details, shared by live preview and capture

use crate::additives::{Additive, KnowledgeBase};
use crate::engine::OcrEngine;
use crate::error::ScanError;
use crate::preprocessing::buffer::encode_png;
use crate::preprocessing::{CropRegion, Pipeline, PixelBuffer, PreprocessingResult};
use serde::Serialize;
use std::sync::Arc;

/// Shown when recognized text names no known additive
pub const NO_MATCH_MESSAGE: &str = "No details found. Try searching with another name.";

/// Text read from one crop
#[derive(Debug, Clone)]
pub struct Recognition {
    pub text: String,
    pub confidence: Option<f32>,
    pub preprocessing: PreprocessingResult,
}

/// Authoritative result of an explicit capture
#[derive(Debug, Clone, Serialize)]
pub struct CaptureReport {
    pub text: String,
    pub confidence: Option<f32>,
    pub additives: Vec<Additive>,
    pub message: Option<String>,
    pub preprocessing: PreprocessingResult,
}

/// Pipeline, OCR engine and knowledge base for one deployment
pub struct Scanner {
    pipeline: Pipeline,
    engine: Arc<dyn OcrEngine>,
    knowledge: KnowledgeBase,
    language: String,
}

impl Scanner {
    pub fn new(
        pipeline: Pipeline,
        engine: Arc<dyn OcrEngine>,
        knowledge: KnowledgeBase,
        language: impl Into<String>,
    ) -> Self {
        Self {
            pipeline,
            engine,
            knowledge,
            language: language.into(),
        }
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    pub fn engine_name(&self) -> &'static str {
        self.engine.name()
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn knowledge(&self) -> &KnowledgeBase {
        &self.knowledge
    }

    /// Preprocess the crop and hand it to the OCR engine
    pub fn read_text(
        &self,
        frame: &PixelBuffer,
        region: &CropRegion,
    ) -> Result<Recognition, ScanError> {
        let preprocessing = self.pipeline.run(frame, region)?;
        let png = encode_png(&preprocessing.image)?;
        let result = self.engine.recognize(&png, &self.language)?;

        Ok(Recognition {
            text: result.text,
            confidence: result.confidence,
            preprocessing,
        })
    }

    /// Read the crop and look up every additive it names
    pub fn capture(
        &self,
        frame: &PixelBuffer,
        region: &CropRegion,
    ) -> Result<CaptureReport, ScanError> {
        let recognition = self.read_text(frame, region)?;
        let additives: Vec<Additive> = self
            .knowledge
            .lookup(&recognition.text)
            .into_iter()
            .cloned()
            .collect();

        tracing::info!(
            "Capture read {} chars, matched {} additive(s)",
            recognition.text.chars().count(),
            additives.len()
        );

        let message = additives
            .is_empty()
            .then(|| NO_MATCH_MESSAGE.to_string());

        Ok(CaptureReport {
            text: recognition.text,
            confidence: recognition.confidence,
            additives,
            message,
            preprocessing: recognition.preprocessing,
        })
    }
}

/// Run pixel work on the blocking pool.
///
/// A panic inside `f` comes back as [`ScanError::Pipeline`] and leaves the
/// caller free to run again.
pub async fn run_blocking<T, F>(f: F) -> Result<T, ScanError>
where
    F: FnOnce() -> Result<T, ScanError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ScanError::Pipeline(format!("Preprocessing task failed: {}", e)))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::OcrResult;
    use crate::preprocessing::Preset;
    use image::Rgba;
    use std::sync::Mutex;

    /// Records the size of every image it is given and answers with fixed text
    struct Recorder {
        text: &'static str,
        seen: Mutex<Vec<(u32, u32)>>,
    }

    impl OcrEngine for Recorder {
        fn name(&self) -> &'static str {
            "recorder"
        }

        fn description(&self) -> &'static str {
            "test engine"
        }

        fn recognize(&self, image: &[u8], language: &str) -> Result<OcrResult, ScanError> {
            assert_eq!(language, "jpn");
            let img = image::load_from_memory(image).unwrap().into_rgba8();
            assert!(img.pixels().all(|p| p.0[0] == 0 || p.0[0] == 255));
            self.seen.lock().unwrap().push(img.dimensions());
            Ok(OcrResult {
                text: self.text.to_string(),
                confidence: Some(0.9),
            })
        }

        fn supported_languages(&self) -> Vec<String> {
            vec!["jpn".to_string()]
        }
    }

    fn scanner(text: &'static str) -> (Scanner, Arc<Recorder>) {
        let engine = Arc::new(Recorder {
            text,
            seen: Mutex::new(Vec::new()),
        });
        let knowledge = KnowledgeBase::from_json(
            r#"[{"name": "ソルビン酸", "aliases": ["ソルビン酸K"], "benefit": "b", "drawback": "d", "link": "l"}]"#,
        )
        .unwrap();
        let scanner = Scanner::new(
            Pipeline::from_preset(Preset::Otsu),
            engine.clone(),
            knowledge,
            "jpn",
        );
        (scanner, engine)
    }

    fn region() -> CropRegion {
        CropRegion {
            left: 10.0,
            top: 10.0,
            width: 30.0,
            height: 10.0,
            display_width: 50.0,
            display_height: 50.0,
        }
    }

    #[test]
    fn test_capture_matches_additives() {
        let (scanner, engine) = scanner("保存料 ソルビン酸K");
        let frame = PixelBuffer::from_pixel(100, 100, Rgba([240, 240, 240, 255]));

        let report = scanner.capture(&frame, &region()).unwrap();

        assert_eq!(report.additives.len(), 1);
        assert_eq!(report.additives[0].name, "ソルビン酸");
        assert_eq!(report.message, None);
        assert_eq!(report.confidence, Some(0.9));
        assert_eq!(*engine.seen.lock().unwrap(), [(60, 20)]);
    }

    #[test]
    fn test_capture_without_match_carries_message() {
        let (scanner, _) = scanner("砂糖");
        let frame = PixelBuffer::from_pixel(100, 100, Rgba([10, 10, 10, 255]));

        let report = scanner.capture(&frame, &region()).unwrap();
        assert!(report.additives.is_empty());
        assert_eq!(report.message.as_deref(), Some(NO_MATCH_MESSAGE));
    }

    #[test]
    fn test_unready_frame_never_reaches_engine() {
        let (scanner, engine) = scanner("x");
        let result = scanner.read_text(&PixelBuffer::new(0, 0), &region());

        assert!(matches!(result, Err(ScanError::NotReady)));
        assert!(engine.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_run_blocking_contains_panics() {
        let result: Result<(), ScanError> = run_blocking(|| panic!("bad pixel math")).await;
        assert!(matches!(result, Err(ScanError::Pipeline(_))));

        let value = run_blocking(|| Ok(7)).await.unwrap();
        assert_eq!(value, 7);
    }
}
