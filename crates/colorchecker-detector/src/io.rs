//! JSON configuration and report helpers.

use crate::builtins::{classic_24, BuiltinError};
use crate::{
    ChartDetector, ChartTopology, ChartTopologySpec, ConfigError, DetectionDiagnostics,
    DetectionResult, DetectorConfig, TopologyError,
};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

#[derive(thiserror::Error, Debug)]
pub enum ChartIoError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

#[derive(thiserror::Error, Debug)]
pub enum ChartConfigError {
    #[error(transparent)]
    Builtin(#[from] BuiltinError),
    #[error(transparent)]
    Topology(#[from] TopologyError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Detection setup as stored on disk.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DetectConfigFile {
    /// Charts to look for; empty means the built-in classic 24-patch chart.
    #[serde(default)]
    pub topologies: Vec<ChartTopologySpec>,
    #[serde(default)]
    pub detector: DetectorConfig,
}

impl DetectConfigFile {
    /// Load a JSON config from disk.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, ChartIoError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Write this config to disk as pretty JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), ChartIoError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Validate every topology of the config.
    pub fn build_topologies(&self) -> Result<Vec<ChartTopology>, ChartConfigError> {
        if self.topologies.is_empty() {
            return Ok(vec![classic_24()?]);
        }
        let mut out = Vec::with_capacity(self.topologies.len());
        for spec in &self.topologies {
            out.push(ChartTopology::new(spec.clone())?);
        }
        Ok(out)
    }

    pub fn build_detector(&self) -> Result<ChartDetector, ChartConfigError> {
        Ok(ChartDetector::new(self.detector.clone())?)
    }
}

/// Detection output as written to disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectReport {
    pub width: usize,
    pub height: usize,
    pub result: DetectionResult,
    #[serde(default)]
    pub diagnostics: Option<DetectionDiagnostics>,
}

impl DetectReport {
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, ChartIoError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), ChartIoError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}
