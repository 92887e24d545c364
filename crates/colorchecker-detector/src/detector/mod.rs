//! Color chart detection pipeline.
//!
//! Normalization → contour quads → grid assembly → per-grid sampling and
//! orientation matching (parallel) → deterministic selection.

mod config;
mod error;
mod pipeline;
mod result;
mod select;

pub use config::DetectorConfig;
pub use error::{ConfigError, DetectError};
pub use pipeline::{detect, ChartDetector};
pub use result::{
    CandidateSummary, Detection, DetectionDiagnostics, DetectionResult, NotFound, NotFoundReason,
    PatchColor,
};
pub use select::{select, ScoredCandidate};
