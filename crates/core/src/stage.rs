//! Stage ("box") types, the units of the processing pipeline.
//!
//! A stage declares its contract (inputs, outputs, triggers) and its
//! dependency edges. The catalog itself is static data owned by the
//! pipeline crate; this module only defines the shapes.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a stage in the registry. Small, positive, unique.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StageId(pub u8);

impl fmt::Display for StageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An immutable registry entry.
///
/// `depends_on` and `feeds_into` are declared independently and are not
/// guaranteed to mirror each other.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Stage {
    pub id: StageId,
    pub name: &'static str,
    pub purpose: &'static str,
    pub description: &'static str,
    pub inputs: &'static [&'static str],
    pub outputs: &'static [&'static str],
    pub triggers: &'static [&'static str],
    #[serde(rename = "depends_on")]
    pub depends_on: &'static [StageId],
    #[serde(rename = "feeds_into")]
    pub feeds_into: &'static [StageId],
}

/// The generative stage kinds the prompt assembler knows how to build for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageKind {
    Expansion,
    Analytics,
    Planning,
    Reasoning,
    Synthesis,
}

impl StageKind {
    pub const ALL: [StageKind; 5] = [
        StageKind::Expansion,
        StageKind::Analytics,
        StageKind::Planning,
        StageKind::Reasoning,
        StageKind::Synthesis,
    ];

    /// The registry entry this kind executes.
    pub fn stage_id(self) -> StageId {
        match self {
            StageKind::Expansion => StageId(2),
            StageKind::Analytics => StageId(3),
            StageKind::Planning => StageId(7),
            StageKind::Reasoning => StageId(11),
            StageKind::Synthesis => StageId(10),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            StageKind::Expansion => "expansion",
            StageKind::Analytics => "analytics",
            StageKind::Planning => "planning",
            StageKind::Reasoning => "reasoning",
            StageKind::Synthesis => "synthesis",
        }
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
