//! The persona registry.

use iqraa_core::persona::{
    CognitiveWeights, ExpansionDepth, Focus, MemoryMode, Persona, PreferredLength, Tone,
};

pub const DEFAULT_PERSONA_ID: &str = "academic-researcher";

pub static PERSONAS: [Persona; 4] = [
    Persona {
        id: "academic-researcher",
        name: "Academic Researcher",
        title: "Deep theoretical analysis",
        description: "Concentrates on the theoretical frame, the concepts, implicit references, and links between fields of knowledge.",
        tone: Tone::Analytical,
        focus: Focus {
            policy: false,
            values: true,
            institutions: true,
            public_narrative: false,
            technical_detail: true,
        },
        semantic_expansion_depth: ExpansionDepth::Deep,
        memory_mode: MemoryMode::Aggressive,
        cognitive_weights: CognitiveWeights {
            density: 0.9,
            coherence: 0.9,
            complexity: 0.8,
        },
        preferred_length: PreferredLength::Long,
    },
    Persona {
        id: "policy-strategist",
        name: "Policy Strategist",
        title: "Structured executive output",
        description: "Turns the input into policy options, intervention tools, and expected effects, with attention to stability and development.",
        tone: Tone::Executive,
        focus: Focus {
            policy: true,
            values: true,
            institutions: true,
            public_narrative: false,
            technical_detail: false,
        },
        semantic_expansion_depth: ExpansionDepth::Normal,
        memory_mode: MemoryMode::Balanced,
        cognitive_weights: CognitiveWeights {
            density: 0.7,
            coherence: 0.95,
            complexity: 0.6,
        },
        preferred_length: PreferredLength::Medium,
    },
    Persona {
        id: "value-philosopher",
        name: "Value Philosopher",
        title: "Value and existential deconstruction",
        description: "Extracts the value and existential structure of the text and relates it to questions of identity and ethics.",
        tone: Tone::Analytical,
        focus: Focus {
            policy: false,
            values: true,
            institutions: false,
            public_narrative: false,
            technical_detail: false,
        },
        semantic_expansion_depth: ExpansionDepth::Deep,
        memory_mode: MemoryMode::Aggressive,
        cognitive_weights: CognitiveWeights {
            density: 0.8,
            coherence: 0.85,
            complexity: 0.9,
        },
        preferred_length: PreferredLength::Long,
    },
    Persona {
        id: "media-architect",
        name: "Media Architect",
        title: "Conversion into media messaging",
        description: "Frames the output as media angles, key messages, and publishable narratives.",
        tone: Tone::Narrative,
        focus: Focus {
            policy: false,
            values: true,
            institutions: false,
            public_narrative: true,
            technical_detail: false,
        },
        semantic_expansion_depth: ExpansionDepth::Normal,
        memory_mode: MemoryMode::Balanced,
        cognitive_weights: CognitiveWeights {
            density: 0.6,
            coherence: 0.9,
            complexity: 0.5,
        },
        preferred_length: PreferredLength::Medium,
    },
];

pub fn get_persona(id: &str) -> Option<&'static Persona> {
    PERSONAS.iter().find(|p| p.id == id)
}

pub fn list_personas() -> &'static [Persona] {
    &PERSONAS
}

/// The built-in default persona.
pub fn default_persona() -> &'static Persona {
    // DEFAULT_PERSONA_ID is always registered.
    get_persona(DEFAULT_PERSONA_ID).unwrap_or(&PERSONAS[0])
}

/// `get_persona(requested) ?? get_persona(default)`. Never fails.
pub fn resolve_persona(requested: Option<&str>) -> &'static Persona {
    requested.and_then(get_persona).unwrap_or_else(default_persona)
}

/// Resolution with a configured default that may itself be unknown.
pub fn resolve_with_default(requested: Option<&str>, configured_default: Option<&str>) -> &'static Persona {
    requested
        .and_then(get_persona)
        .or_else(|| configured_default.and_then(get_persona))
        .unwrap_or_else(default_persona)
}
