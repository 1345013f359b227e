//! Persona types: named bundles of behavioral parameters.
//!
//! A persona conditions how prompts are assembled (tone, depth, length),
//! how aggressively the concept graph remembers, and how cognitive
//! analytics scores are weighted.

use serde::{Deserialize, Serialize};

/// Output register requested from the generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    Formal,
    Analytical,
    Narrative,
    Executive,
}

impl Tone {
    pub fn as_str(self) -> &'static str {
        match self {
            Tone::Formal => "formal",
            Tone::Analytical => "analytical",
            Tone::Narrative => "narrative",
            Tone::Executive => "executive",
        }
    }
}

/// How far semantic expansion should reach.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExpansionDepth {
    Shallow,
    Normal,
    Deep,
}

impl ExpansionDepth {
    pub fn as_str(self) -> &'static str {
        match self {
            ExpansionDepth::Shallow => "shallow",
            ExpansionDepth::Normal => "normal",
            ExpansionDepth::Deep => "deep",
        }
    }
}

/// How much of each run is retained in the concept graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemoryMode {
    /// Project pointers only; the concept graph is left untouched.
    Conservative,
    /// Concepts become nodes, consecutive concepts are linked.
    Balanced,
    /// Concepts and themes become nodes; themes link to every concept.
    Aggressive,
}

impl MemoryMode {
    pub fn as_str(self) -> &'static str {
        match self {
            MemoryMode::Conservative => "conservative",
            MemoryMode::Balanced => "balanced",
            MemoryMode::Aggressive => "aggressive",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PreferredLength {
    Short,
    Medium,
    Long,
}

impl PreferredLength {
    pub fn as_str(self) -> &'static str {
        match self {
            PreferredLength::Short => "short",
            PreferredLength::Medium => "medium",
            PreferredLength::Long => "long",
        }
    }
}

/// Topic flags a persona concentrates on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Focus {
    #[serde(default)]
    pub policy: bool,
    #[serde(default)]
    pub values: bool,
    #[serde(default)]
    pub institutions: bool,
    #[serde(default)]
    pub public_narrative: bool,
    #[serde(default)]
    pub technical_detail: bool,
}

impl Focus {
    /// The enabled flags, in declaration order.
    pub fn topics(&self) -> Vec<&'static str> {
        [
            (self.policy, "policy"),
            (self.values, "values"),
            (self.institutions, "institutions"),
            (self.public_narrative, "publicNarrative"),
            (self.technical_detail, "technicalDetail"),
        ]
        .into_iter()
        .filter_map(|(on, name)| on.then_some(name))
        .collect()
    }
}

/// Relative importance of each analytics metric, each in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CognitiveWeights {
    pub density: f64,
    pub coherence: f64,
    pub complexity: f64,
}

impl CognitiveWeights {
    /// Weighted mean of the three metrics. `None` when all weights are zero.
    pub fn weighted_score(&self, density: f64, coherence: f64, complexity: f64) -> Option<f64> {
        let total = self.density + self.coherence + self.complexity;
        if total <= 0.0 {
            return None;
        }
        Some(
            (self.density * density + self.coherence * coherence + self.complexity * complexity)
                / total,
        )
    }
}

/// An immutable persona registry entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Persona {
    pub id: &'static str,
    pub name: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub tone: Tone,
    pub focus: Focus,
    pub semantic_expansion_depth: ExpansionDepth,
    pub memory_mode: MemoryMode,
    pub cognitive_weights: CognitiveWeights,
    pub preferred_length: PreferredLength,
}
