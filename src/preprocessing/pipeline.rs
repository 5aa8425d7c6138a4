use crate::error::ScanError;
use image::RgbaImage;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use std::time::Instant;

use super::buffer::PixelBuffer;
use super::sampler::{self, CropRegion};
use super::steps;
use super::steps::threshold::Binarize;

/// Preprocessing preset names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Preset {
    /// Steps: grayscale, median, Otsu threshold
    #[default]
    Otsu,
    /// Steps: grayscale, contrast, 3x3 blur, fixed threshold
    Classic,
}

impl Preset {
    /// Get the preset name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Otsu => "otsu",
            Self::Classic => "classic",
        }
    }

    /// Stage configuration for this preset
    pub fn config(&self, threshold: u8, contrast_factor: f32) -> PipelineConfig {
        match self {
            Self::Otsu => PipelineConfig {
                contrast: None,
                denoise: Denoise::Median,
                binarize: Binarize::Otsu,
            },
            Self::Classic => PipelineConfig {
                contrast: Some(contrast_factor),
                denoise: Denoise::Blur,
                binarize: Binarize::Fixed(threshold),
            },
        }
    }
}

impl FromStr for Preset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "otsu" => Ok(Self::Otsu),
            "classic" => Ok(Self::Classic),
            other => Err(format!(
                "unknown preset '{}' (expected 'otsu' or 'classic')",
                other
            )),
        }
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Noise reduction stage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Denoise {
    /// 3x3 median on luminance
    Median,
    /// 3x3 weighted convolution
    Blur,
}

/// Which stages run, fixed for the lifetime of a [`Pipeline`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PipelineConfig {
    /// Contrast stretch factor, `None` skips the stage
    pub contrast: Option<f32>,
    pub denoise: Denoise,
    pub binarize: Binarize,
}

/// Timing information for a single preprocessing step
#[derive(Debug, Clone, Serialize)]
pub struct StepTiming {
    pub name: String,
    pub time_ms: u64,
}

/// Result of preprocessing including timing stats
#[derive(Debug, Clone, Serialize)]
pub struct PreprocessingResult {
    /// Binarized buffer (not serialized)
    #[serde(skip)]
    pub image: PixelBuffer,
    /// Level used by the binarizer
    pub threshold: u8,
    /// Total preprocessing time in milliseconds
    pub total_time_ms: u64,
    /// Preset used
    pub preset: String,
    /// Individual step timings
    pub steps: Vec<StepTiming>,
}

/// Preprocessing pipeline that applies steps based on preset
#[derive(Debug, Clone)]
pub struct Pipeline {
    preset: Preset,
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(preset: Preset, config: PipelineConfig) -> Self {
        Self { preset, config }
    }

    /// Pipeline using the reference threshold and contrast factor
    pub fn from_preset(preset: Preset) -> Self {
        let config = preset.config(
            steps::threshold::DEFAULT_LEVEL,
            steps::contrast::DEFAULT_FACTOR,
        );
        Self::new(preset, config)
    }

    pub fn preset(&self) -> Preset {
        self.preset
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Sample `region` out of `frame` and run every stage on it
    pub fn run(
        &self,
        frame: &RgbaImage,
        region: &CropRegion,
    ) -> Result<PreprocessingResult, ScanError> {
        let start = Instant::now();
        let sample_start = Instant::now();
        let buffer = sampler::sample(frame, region)?;
        let timings = vec![StepTiming {
            name: "sample".to_string(),
            time_ms: sample_start.elapsed().as_millis() as u64,
        }];

        Ok(self.process_timed(buffer, timings, start))
    }

    /// Run every stage on an already sampled buffer
    pub fn process(&self, buffer: PixelBuffer) -> PreprocessingResult {
        self.process_timed(buffer, Vec::new(), Instant::now())
    }

    fn process_timed(
        &self,
        mut buffer: PixelBuffer,
        mut timings: Vec<StepTiming>,
        start: Instant,
    ) -> PreprocessingResult {
        self.run_step("grayscale", &mut buffer, &mut timings, steps::grayscale::apply);

        if let Some(factor) = self.config.contrast {
            self.run_step("contrast", &mut buffer, &mut timings, |b| {
                steps::contrast::apply(b, factor)
            });
        }

        match self.config.denoise {
            Denoise::Median => {
                self.run_step("median", &mut buffer, &mut timings, steps::denoise::apply)
            }
            Denoise::Blur => self.run_step("blur", &mut buffer, &mut timings, steps::blur::apply),
        }

        let strategy = self.config.binarize;
        let threshold = self.run_step("threshold", &mut buffer, &mut timings, |b| {
            steps::threshold::apply(b, strategy)
        });

        let total_time_ms = start.elapsed().as_millis() as u64;
        tracing::debug!(
            "Preprocessed {}x{} buffer with preset {} in {}ms (threshold {})",
            buffer.width(),
            buffer.height(),
            self.preset,
            total_time_ms,
            threshold
        );

        PreprocessingResult {
            image: buffer,
            threshold,
            total_time_ms,
            preset: self.preset.as_str().to_string(),
            steps: timings,
        }
    }

    fn run_step<F, T>(
        &self,
        name: &str,
        buffer: &mut PixelBuffer,
        timings: &mut Vec<StepTiming>,
        step_fn: F,
    ) -> T
    where
        F: FnOnce(&mut PixelBuffer) -> T,
    {
        let step_start = Instant::now();
        let result = step_fn(buffer);
        timings.push(StepTiming {
            name: name.to_string(),
            time_ms: step_start.elapsed().as_millis() as u64,
        });
        result
    }
}
