//! Embedded chart definitions.
//!
//! The source of truth lives in `colorchecker-detector/data/*.json`.

use crate::topology::{ChartTopology, ChartTopologySpec, TopologyError};

const CLASSIC_24_JSON: &str = include_str!("../data/classic_24.json");

/// Ids of every embedded chart.
pub const BUILTIN_TOPOLOGIES: &[&str] = &["classic_24"];

#[derive(thiserror::Error, Debug)]
pub enum BuiltinError {
    #[error("unknown built-in chart `{0}`")]
    Unknown(String),
    #[error("built-in chart `{id}` is malformed: {source}")]
    Json {
        id: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("built-in chart `{id}` is invalid: {source}")]
    Topology {
        id: String,
        #[source]
        source: TopologyError,
    },
}

/// Parse the declarative spec of an embedded chart.
pub fn builtin_topology_spec(id: &str) -> Result<ChartTopologySpec, BuiltinError> {
    let raw = match id {
        "classic_24" => CLASSIC_24_JSON,
        _ => return Err(BuiltinError::Unknown(id.to_string())),
    };
    serde_json::from_str(raw).map_err(|source| BuiltinError::Json {
        id: id.to_string(),
        source,
    })
}

/// Build a validated embedded chart by id.
pub fn builtin_topology(id: &str) -> Result<ChartTopology, BuiltinError> {
    let spec = builtin_topology_spec(id)?;
    ChartTopology::new(spec).map_err(|source| BuiltinError::Topology {
        id: id.to_string(),
        source,
    })
}

/// The classic 4×6 checker: 18 chromatic patches above a six-step gray ramp.
///
/// Values are nominal 8-bit sRGB; measure your own chart for colorimetric work.
pub fn classic_24() -> Result<ChartTopology, BuiltinError> {
    builtin_topology("classic_24")
}
