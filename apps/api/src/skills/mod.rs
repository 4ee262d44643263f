// Skill Extraction Engine
// Implements: taxonomy loading, word-boundary detection, complementary-skill suggestion.
// Pure and synchronous. No I/O after the taxonomy is loaded, no quota or auth awareness.

pub mod detector;
pub mod engine;
pub mod suggester;
pub mod taxonomy;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use engine::SkillEngine;
pub use taxonomy::SkillTaxonomy;

/// Category label carried by every suggested skill.
pub const SUGGESTED_CATEGORY: &str = "Suggested";

/// A taxonomy term found verbatim in the resume text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectedSkill {
    pub name: String,
    pub category: String,
    /// 85 – 94
    pub confidence: u8,
}

/// A taxonomy term recommended because it was *not* found in the text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestedSkill {
    pub name: String,
    /// Always `"Suggested"`.
    pub category: String,
    /// 60 – 94
    pub confidence: u8,
}

impl SuggestedSkill {
    pub fn new(name: impl Into<String>, confidence: u8) -> Self {
        Self {
            name: name.into(),
            category: SUGGESTED_CATEGORY.to_string(),
            confidence,
        }
    }
}

/// Per-request engine output. Never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionResult {
    pub extracted_text: String,
    pub extracted_skills: Vec<DetectedSkill>,
    pub suggested_skills: Vec<SuggestedSkill>,
}

/// Configuration faults raised while building the taxonomy. Fatal at startup.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("Skill taxonomy is empty")]
    EmptyTaxonomy,

    #[error("Skill taxonomy has a category with a blank name")]
    InvalidCategory,

    #[error("Blank term in skill category '{category}'")]
    InvalidTerm { category: String },

    #[error("Term '{term}' appears in both '{first}' and '{second}'")]
    DuplicateTerm {
        term: String,
        first: String,
        second: String,
    },

    #[error("Could not build matcher for term '{term}': {message}")]
    Pattern { term: String, message: String },

    #[error("Could not read taxonomy file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid taxonomy JSON: {0}")]
    Parse(#[from] serde_json::Error),
}
