use colorchecker_core::RasterError;

/// Detector configuration validation errors.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("edge thresholds must satisfy 0 <= low <= high (got low={low}, high={high})")]
    EdgeThresholds { low: f32, high: f32 },
    #[error("{name} must lie in {range} (got {value})")]
    OutOfRange {
        name: &'static str,
        range: &'static str,
        value: f32,
    },
    #[error("{name} must be positive")]
    NonPositive { name: &'static str },
}

/// Errors returned by [`crate::detect`] and [`crate::ChartDetector`].
///
/// A chart that is simply absent is not an error; see
/// [`crate::DetectionResult::NotFound`].
#[derive(thiserror::Error, Debug)]
pub enum DetectError {
    #[error(transparent)]
    Raster(#[from] RasterError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("at least one chart topology is required")]
    NoTopologies,
}
