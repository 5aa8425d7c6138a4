//! Individual preprocessing steps

pub mod blur;
pub mod contrast;
pub mod denoise;
pub mod grayscale;
pub mod threshold;
