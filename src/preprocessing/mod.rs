//! Image preprocessing module for OCR enhancement
//!
//! Turns a crop of a camera frame into a binarized buffer ready for OCR.

pub mod buffer;
pub mod pipeline;
pub mod sampler;
pub mod steps;

pub use buffer::PixelBuffer;
pub use pipeline::{Denoise, Pipeline, PipelineConfig, PreprocessingResult, Preset, StepTiming};
pub use sampler::CropRegion;
pub use steps::threshold::Binarize;
