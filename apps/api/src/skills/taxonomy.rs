//! Skill taxonomy: the ordered category → term dictionary the engine matches against.
//!
//! Built once at startup (default table or a JSON file) and shared read-only.
//! Each term carries its precompiled word-boundary pattern so detection never
//! compiles regexes on the request path.

use std::collections::HashMap;
use std::path::Path;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::skills::ExtractionError;

/// Default dictionary: (category, terms). Category and term order is the output order.
const DEFAULT_TAXONOMY: &[(&str, &[&str])] = &[
    (
        "Programming Languages",
        &[
            "javascript",
            "typescript",
            "python",
            "java",
            "go",
            "rust",
            "c++",
            "ruby",
        ],
    ),
    (
        "Frameworks & Libraries",
        &[
            "react",
            "redux",
            "node",
            "express",
            "next.js",
            "django",
            "flask",
            "spring boot",
            "tailwind",
        ],
    ),
    (
        "Databases",
        &["sql", "postgresql", "mysql", "mongodb", "redis"],
    ),
    (
        "Cloud & DevOps",
        &[
            "docker",
            "kubernetes",
            "aws",
            "terraform",
            "azure",
            "gcp",
            "linux",
            "github actions",
        ],
    ),
    (
        "Tools & Practices",
        &[
            "git",
            "graphql",
            "rest api",
            "microservices",
            "machine learning",
            "figma",
        ],
    ),
];

/// On-disk shape of one taxonomy category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategorySpec {
    pub category: String,
    pub terms: Vec<String>,
}

/// A canonical term plus its compiled matcher.
#[derive(Debug, Clone)]
pub struct SkillTerm {
    pub name: String,
    pub(crate) pattern: Regex,
}

#[derive(Debug, Clone)]
pub struct SkillCategory {
    pub name: String,
    pub terms: Vec<SkillTerm>,
}

/// Ordered mapping from category name to canonical lowercase terms.
///
/// Construction validates that the taxonomy has at least one term and that no
/// term appears in two categories.
#[derive(Debug, Clone)]
pub struct SkillTaxonomy {
    categories: Vec<SkillCategory>,
}

impl SkillTaxonomy {
    /// Builds and validates a taxonomy from ordered category specs.
    pub fn new(specs: Vec<CategorySpec>) -> Result<Self, ExtractionError> {
        let mut owner: HashMap<String, String> = HashMap::new();
        let mut categories = Vec::with_capacity(specs.len());

        for spec in specs {
            let category = spec.category.trim().to_string();
            if category.is_empty() {
                return Err(ExtractionError::InvalidCategory);
            }

            let mut terms = Vec::with_capacity(spec.terms.len());
            for raw in spec.terms {
                let name = raw.trim().to_lowercase();
                if name.is_empty() {
                    return Err(ExtractionError::InvalidTerm {
                        category: category.clone(),
                    });
                }
                if let Some(first) = owner.get(&name) {
                    return Err(ExtractionError::DuplicateTerm {
                        term: name,
                        first: first.clone(),
                        second: category,
                    });
                }
                owner.insert(name.clone(), category.clone());

                let pattern = word_boundary_pattern(&name)?;
                terms.push(SkillTerm { name, pattern });
            }

            categories.push(SkillCategory {
                name: category,
                terms,
            });
        }

        if owner.is_empty() {
            return Err(ExtractionError::EmptyTaxonomy);
        }

        Ok(Self { categories })
    }

    /// The built-in dictionary.
    pub fn default_taxonomy() -> Result<Self, ExtractionError> {
        Self::new(
            DEFAULT_TAXONOMY
                .iter()
                .map(|(category, terms)| CategorySpec {
                    category: (*category).to_string(),
                    terms: terms.iter().map(|t| (*t).to_string()).collect(),
                })
                .collect(),
        )
    }

    /// Parses a JSON array of `{ "category": .., "terms": [..] }` objects.
    pub fn from_json(json: &str) -> Result<Self, ExtractionError> {
        let specs: Vec<CategorySpec> = serde_json::from_str(json)?;
        Self::new(specs)
    }

    pub fn from_file(path: &Path) -> Result<Self, ExtractionError> {
        let json = std::fs::read_to_string(path).map_err(|source| ExtractionError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let taxonomy = Self::from_json(&json)?;
        info!(
            "Loaded skill taxonomy from {} ({} categories, {} terms)",
            path.display(),
            taxonomy.categories.len(),
            taxonomy.term_count()
        );
        Ok(taxonomy)
    }

    /// Default table, or the file at `path` when one is configured.
    pub fn load(path: Option<&Path>) -> Result<Self, ExtractionError> {
        match path {
            Some(p) => Self::from_file(p),
            None => Self::default_taxonomy(),
        }
    }

    pub fn categories(&self) -> &[SkillCategory] {
        &self.categories
    }

    pub fn term_count(&self) -> usize {
        self.categories.iter().map(|c| c.terms.len()).sum()
    }

    /// Category that owns `term`, if any.
    #[cfg(test)]
    pub fn category_of(&self, term: &str) -> Option<&str> {
        self.categories
            .iter()
            .find(|c| c.terms.iter().any(|t| t.name == term))
            .map(|c| c.name.as_str())
    }
}

/// Case-insensitive whole-word matcher for a literal term.
///
/// Edges that are word characters get `\b`. Edges that are not (`c++`, `.net`)
/// cannot use `\b`. They need the text boundary or a neighbour that is neither a
/// word character nor the edge character itself, so `c++` does not match in `c+++`
/// while `C++.` at the end of a sentence still counts.
fn word_boundary_pattern(term: &str) -> Result<Regex, ExtractionError> {
    let is_word = |c: char| c.is_alphanumeric() || c == '_';
    let (Some(first), Some(last)) = (term.chars().next(), term.chars().last()) else {
        return Err(ExtractionError::InvalidTerm {
            category: String::new(),
        });
    };

    let left = if is_word(first) {
        r"\b".to_string()
    } else {
        format!(r"(?:^|[^\w{}])", regex::escape(&first.to_string()))
    };
    let right = if is_word(last) {
        r"\b".to_string()
    } else {
        format!(r"(?:[^\w{}]|$)", regex::escape(&last.to_string()))
    };
    let source = format!("(?i){left}{}{right}", regex::escape(term));

    Regex::new(&source).map_err(|e| ExtractionError::Pattern {
        term: term.to_string(),
        message: e.to_string(),
    })
}
