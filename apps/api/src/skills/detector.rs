//! Detection: scans resume text for every taxonomy term.

use crate::skills::taxonomy::SkillTaxonomy;
use crate::skills::DetectedSkill;

const BASE_CONFIDENCE: u8 = 85;
const MAX_CONFIDENCE: u8 = 94;
/// Added per repeated mention after the first.
const REPEAT_BONUS: u8 = 3;

/// Returns one `DetectedSkill` per taxonomy term that occurs in `text` as a
/// case-insensitive whole word.
///
/// Output follows taxonomy order (category, then term). Confidence starts at 85
/// and rises with repeated mentions, capped at 94.
pub fn detect(text: &str, taxonomy: &SkillTaxonomy) -> Vec<DetectedSkill> {
    let mut found = Vec::new();
    if text.is_empty() {
        return found;
    }

    for category in taxonomy.categories() {
        for term in &category.terms {
            let mentions = term.pattern.find_iter(text).count();
            if mentions == 0 {
                continue;
            }
            found.push(DetectedSkill {
                name: term.name.clone(),
                category: category.name.clone(),
                confidence: confidence_for(mentions),
            });
        }
    }

    found
}

fn confidence_for(mentions: usize) -> u8 {
    let extra = mentions.saturating_sub(1).min(u8::MAX as usize) as u8;
    BASE_CONFIDENCE
        .saturating_add(extra.saturating_mul(REPEAT_BONUS))
        .min(MAX_CONFIDENCE)
}
