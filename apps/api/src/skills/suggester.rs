//! Suggestion: recommends complementary or missing skills.
//!
//! Three passes, output in this order:
//! 1. Rule pairs: a detected trigger implies a companion skill at a fixed confidence.
//! 2. Category fill: up to two random undetected terms per category, confidence 60–79.
//! 3. Floor: when fewer than three suggestions exist, top up from shuffled categories
//!    (confidence 60–74) until five suggestions or every category is exhausted.
//!
//! Randomness comes from the caller so tests can seed it.

use std::collections::HashSet;

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::debug;

use crate::skills::taxonomy::SkillTaxonomy;
use crate::skills::{DetectedSkill, SuggestedSkill};

/// A trigger → implied pairing.
#[derive(Debug, Clone, Copy)]
pub struct SuggestionRule {
    /// Category the trigger lives in. Informational; matching is by name.
    pub category: &'static str,
    pub trigger: &'static str,
    pub implied: &'static str,
    pub confidence: u8,
}

pub const SUGGESTION_RULES: &[SuggestionRule] = &[
    SuggestionRule {
        category: "Programming Languages",
        trigger: "javascript",
        implied: "typescript",
        confidence: 75,
    },
    SuggestionRule {
        category: "Programming Languages",
        trigger: "python",
        implied: "java",
        confidence: 65,
    },
    SuggestionRule {
        category: "Frameworks & Libraries",
        trigger: "react",
        implied: "redux",
        confidence: 80,
    },
    SuggestionRule {
        category: "Frameworks & Libraries",
        trigger: "node",
        implied: "express",
        confidence: 85,
    },
    SuggestionRule {
        category: "Cloud & DevOps",
        trigger: "docker",
        implied: "kubernetes",
        confidence: 75,
    },
    SuggestionRule {
        category: "Cloud & DevOps",
        trigger: "aws",
        implied: "terraform",
        confidence: 70,
    },
];

const PER_CATEGORY_PICKS: usize = 2;
const FLOOR_TRIGGER: usize = 3;
const FLOOR_TARGET: usize = 5;

/// Builds the suggestion list for a set of detected skills.
///
/// Never suggests a detected term and never suggests the same term twice.
pub fn suggest<R: Rng + ?Sized>(
    detected: &[DetectedSkill],
    taxonomy: &SkillTaxonomy,
    rng: &mut R,
) -> Vec<SuggestedSkill> {
    let detected: HashSet<&str> = detected.iter().map(|s| s.name.as_str()).collect();
    let mut suggested: Vec<SuggestedSkill> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();

    // 1. rule pairs
    for rule in SUGGESTION_RULES {
        if detected.contains(rule.trigger)
            && !detected.contains(rule.implied)
            && seen.insert(rule.implied.to_string())
        {
            debug!(
                "Rule suggestion ({}): {} -> {}",
                rule.category, rule.trigger, rule.implied
            );
            suggested.push(SuggestedSkill::new(rule.implied, rule.confidence));
        }
    }

    // 2. category fill
    for category in taxonomy.categories() {
        let remaining: Vec<&str> = category
            .terms
            .iter()
            .map(|t| t.name.as_str())
            .filter(|name| !detected.contains(name) && !seen.contains(*name))
            .collect();

        for name in remaining.choose_multiple(rng, PER_CATEGORY_PICKS) {
            seen.insert((*name).to_string());
            suggested.push(SuggestedSkill::new(*name, rng.gen_range(60..=79)));
        }
    }

    // 3. floor
    if suggested.len() < FLOOR_TRIGGER {
        let mut order: Vec<usize> = (0..taxonomy.categories().len()).collect();
        order.shuffle(rng);

        for idx in order {
            if suggested.len() >= FLOOR_TARGET {
                break;
            }
            let candidates: Vec<&str> = taxonomy.categories()[idx]
                .terms
                .iter()
                .map(|t| t.name.as_str())
                .filter(|name| !detected.contains(name) && !seen.contains(*name))
                .collect();

            let budget = PER_CATEGORY_PICKS.min(FLOOR_TARGET - suggested.len());
            for name in candidates.choose_multiple(rng, budget) {
                seen.insert((*name).to_string());
                suggested.push(SuggestedSkill::new(*name, rng.gen_range(60..=74)));
            }
        }
    }

    suggested
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::skills::taxonomy::CategorySpec;
    use crate::skills::SUGGESTED_CATEGORY;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn taxonomy() -> SkillTaxonomy {
        SkillTaxonomy::default_taxonomy().unwrap()
    }

    fn detected(name: &str, category: &str) -> DetectedSkill {
        DetectedSkill {
            name: name.to_string(),
            category: category.to_string(),
            confidence: 85,
        }
    }

    fn rng(seed: u64) -> StdRng {
        StdRng::seed_from_u64(seed)
    }

    #[test]
    fn test_react_implies_redux_at_80() {
        let input = vec![detected("react", "Frameworks & Libraries")];
        let out = suggest(&input, &taxonomy(), &mut rng(1));
        assert_eq!(out[0], SuggestedSkill::new("redux", 80));
        assert_eq!(out[0].category, SUGGESTED_CATEGORY);
    }

    #[test]
    fn test_rule_skipped_when_implied_already_detected() {
        let input = vec![
            detected("react", "Frameworks & Libraries"),
            detected("redux", "Frameworks & Libraries"),
        ];
        let out = suggest(&input, &taxonomy(), &mut rng(2));
        assert!(out.iter().all(|s| s.name != "redux"));
    }

    #[test]
    fn test_rules_come_first_in_table_order() {
        let input = vec![
            detected("aws", "Cloud & DevOps"),
            detected("docker", "Cloud & DevOps"),
            detected("node", "Frameworks & Libraries"),
        ];
        let out = suggest(&input, &taxonomy(), &mut rng(3));
        let head: Vec<(&str, u8)> = out
            .iter()
            .take(3)
            .map(|s| (s.name.as_str(), s.confidence))
            .collect();
        assert_eq!(
            head,
            vec![("express", 85), ("kubernetes", 75), ("terraform", 70)]
        );
    }

    #[test]
    fn test_suggestions_disjoint_from_detected() {
        let input: Vec<DetectedSkill> = ["javascript", "python", "react", "docker", "sql", "git"]
            .iter()
            .map(|n| detected(n, "x"))
            .collect();
        for seed in 0..50 {
            let out = suggest(&input, &taxonomy(), &mut rng(seed));
            for s in &out {
                assert!(
                    input.iter().all(|d| d.name != s.name),
                    "{} suggested despite being detected",
                    s.name
                );
            }
        }
    }

    #[test]
    fn test_no_duplicate_suggestions() {
        let input = vec![detected("javascript", "Programming Languages")];
        for seed in 0..50 {
            let out = suggest(&input, &taxonomy(), &mut rng(seed));
            let unique: HashSet<&str> = out.iter().map(|s| s.name.as_str()).collect();
            assert_eq!(unique.len(), out.len());
        }
    }

    #[test]
    fn test_category_fill_picks_two_per_category() {
        let out = suggest(&[], &taxonomy(), &mut rng(4));
        assert_eq!(out.len(), taxonomy().categories().len() * 2);
        assert!(out.iter().all(|s| (60..=79).contains(&s.confidence)));
    }

    #[test]
    fn test_floor_guarantee_on_sparse_taxonomy() {
        // One term per category means the fill pass yields at most 1 + 1.
        let taxonomy = SkillTaxonomy::new(vec![
            CategorySpec {
                category: "A".to_string(),
                terms: vec!["alpha".to_string()],
            },
            CategorySpec {
                category: "B".to_string(),
                terms: vec!["beta".to_string(), "gamma".to_string(), "delta".to_string()],
            },
        ])
        .unwrap();
        let input = vec![detected("beta", "B"), detected("gamma", "B")];
        let out = suggest(&input, &taxonomy, &mut rng(5));
        let mut names: Vec<&str> = out.iter().map(|s| s.name.as_str()).collect();
        names.sort();
        // Only two undetected terms exist, so the floor cannot reach three.
        assert_eq!(names, vec!["alpha", "delta"]);
    }

    #[test]
    fn test_empty_detected_meets_floor() {
        let taxonomy = SkillTaxonomy::new(vec![CategorySpec {
            category: "Only".to_string(),
            terms: vec!["a1".into(), "a2".into(), "a3".into(), "a4".into()],
        }])
        .unwrap();
        for seed in 0..20 {
            let out = suggest(&[], &taxonomy, &mut rng(seed));
            // fill takes two, floor tops up to at least three
            assert!(out.len() >= 3, "seed {seed}: {out:?}");
            assert!(out.len() <= 4);
            assert!(out[2..].iter().all(|s| (60..=74).contains(&s.confidence)));
        }
    }

    #[test]
    fn test_same_seed_same_suggestions() {
        let input = vec![detected("python", "Programming Languages")];
        let a = suggest(&input, &taxonomy(), &mut rng(42));
        let b = suggest(&input, &taxonomy(), &mut rng(42));
        assert_eq!(a, b);
    }

    #[test]
    fn test_confidence_bounds() {
        let input = vec![
            detected("node", "Frameworks & Libraries"),
            detected("javascript", "Programming Languages"),
        ];
        for seed in 0..50 {
            for s in suggest(&input, &taxonomy(), &mut rng(seed)) {
                assert!((60..=94).contains(&s.confidence), "{s:?}");
            }
        }
    }
}
