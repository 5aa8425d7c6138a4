//! Food additive lookup service
//!
//! Camera frames and a crop region arrive from the browser. The crop is
//! binarized for OCR, read periodically for live feedback and once more on
//! capture, and the recognized text is matched against an additive
//! knowledge base.

pub mod additives;
pub mod camera;
pub mod config;
pub mod engine;
pub mod engines;
pub mod error;
pub mod live;
pub mod preprocessing;
pub mod scan;
pub mod server;
