//! SkillEngine: owns the taxonomy and composes detection with suggestion.
//!
//! Stateless beyond the read-only taxonomy; one instance is shared across
//! requests behind an `Arc`.

use rand::Rng;
use tracing::debug;

use crate::skills::detector::detect;
use crate::skills::suggester::suggest;
use crate::skills::taxonomy::SkillTaxonomy;
use crate::skills::ExtractionResult;

#[derive(Debug, Clone)]
pub struct SkillEngine {
    taxonomy: SkillTaxonomy,
}

impl SkillEngine {
    /// The taxonomy is validated when it is built, so an engine always holds
    /// at least one term and `extract` cannot fail.
    pub fn new(taxonomy: SkillTaxonomy) -> Self {
        Self { taxonomy }
    }

    pub fn taxonomy(&self) -> &SkillTaxonomy {
        &self.taxonomy
    }

    /// Detects and suggests using a fresh thread-local random source.
    pub fn extract(&self, text: &str) -> ExtractionResult {
        self.extract_with_rng(text, &mut rand::thread_rng())
    }

    /// Same as `extract` with a caller-supplied random source.
    pub fn extract_with_rng<R: Rng + ?Sized>(&self, text: &str, rng: &mut R) -> ExtractionResult {
        let extracted_skills = detect(text, &self.taxonomy);
        let suggested_skills = suggest(&extracted_skills, &self.taxonomy, rng);

        debug!(
            "Extracted {} skills, suggested {} from {} chars",
            extracted_skills.len(),
            suggested_skills.len(),
            text.len()
        );

        ExtractionResult {
            extracted_text: text.to_string(),
            extracted_skills,
            suggested_skills,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    fn engine() -> SkillEngine {
        SkillEngine::new(SkillTaxonomy::default_taxonomy().unwrap())
    }

    #[test]
    fn test_extract_scenario() {
        let text = "Built APIs with Node and Express, deployed via Docker and AWS.";
        let result = engine().extract_with_rng(text, &mut StdRng::seed_from_u64(7));

        assert_eq!(result.extracted_text, text);
        let detected: Vec<&str> = result
            .extracted_skills
            .iter()
            .map(|s| s.name.as_str())
            .collect();
        assert_eq!(detected, vec!["node", "express", "docker", "aws"]);

        // node → express is suppressed because express was detected
        let rules: Vec<(&str, u8)> = result
            .suggested_skills
            .iter()
            .take(2)
            .map(|s| (s.name.as_str(), s.confidence))
            .collect();
        assert_eq!(rules, vec![("kubernetes", 75), ("terraform", 70)]);
    }

    #[test]
    fn test_extract_empty_text() {
        let result = engine().extract("");
        assert_eq!(result.extracted_text, "");
        assert!(result.extracted_skills.is_empty());
        assert!(result.suggested_skills.len() >= 3);
    }

    #[test]
    fn test_extract_properties_hold_across_random_sources() {
        let text = "Python, JavaScript and React on AWS with PostgreSQL, Git and Linux.";
        let engine = engine();
        for _ in 0..25 {
            let result = engine.extract(text);
            let detected: HashSet<&str> = result
                .extracted_skills
                .iter()
                .map(|s| s.name.as_str())
                .collect();
            assert_eq!(detected.len(), result.extracted_skills.len());
            assert!(result
                .extracted_skills
                .iter()
                .all(|s| (85..=94).contains(&s.confidence)));
            for s in &result.suggested_skills {
                assert!(!detected.contains(s.name.as_str()));
                assert!((60..=94).contains(&s.confidence));
                assert_eq!(s.category, "Suggested");
            }
        }
    }

    #[test]
    fn test_result_serializes_camel_case() {
        let result = engine().extract_with_rng("docker", &mut StdRng::seed_from_u64(1));
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["extractedText"], "docker");
        assert_eq!(json["extractedSkills"][0]["name"], "docker");
        assert_eq!(json["extractedSkills"][0]["category"], "Cloud & DevOps");
        assert_eq!(json["suggestedSkills"][0]["name"], "kubernetes");
        assert_eq!(json["suggestedSkills"][0]["category"], "Suggested");
        assert_eq!(json["suggestedSkills"][0]["confidence"], 75);
    }

    #[test]
    fn test_non_ascii_text_is_accepted() {
        let result = engine().extract("Développeur Rust à Zürich — ☕ Kubernetes");
        let names: Vec<&str> = result
            .extracted_skills
            .iter()
            .map(|s| s.name.as_str())
            .collect();
        assert_eq!(names, vec!["rust", "kubernetes"]);
    }
}
