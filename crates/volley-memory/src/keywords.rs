//! Keyword and system derivation from a parsed lob.

use volley_core::entity::{EntityType, ExtractedEntity};
use volley_core::task::ParsedTask;

/// Derive the bounded, deduplicated keyword set for history queries:
/// lowercase entity mentions plus every task's `system` field, keeping
/// only words longer than `min_length` characters, first occurrence wins,
/// capped at `max_keywords`.
#[must_use]
pub fn derive_keywords(
    tasks: &[ParsedTask],
    entities: &[ExtractedEntity],
    min_length: usize,
    max_keywords: usize,
) -> Vec<String> {
    let mut keywords: Vec<String> = Vec::new();

    let candidates = entities
        .iter()
        .map(|e| e.mention.as_str())
        .chain(tasks.iter().filter_map(|t| t.system.as_deref()));

    for candidate in candidates {
        let keyword = candidate.trim().to_lowercase();
        if keyword.chars().count() <= min_length {
            continue;
        }
        if keywords.contains(&keyword) {
            continue;
        }
        keywords.push(keyword);
        if keywords.len() >= max_keywords {
            break;
        }
    }

    keywords
}

/// Derive the deduplicated system set: entities of type `system` plus every
/// task's `system` field. Case-insensitive dedup, first-seen casing kept.
#[must_use]
pub fn derive_systems(tasks: &[ParsedTask], entities: &[ExtractedEntity]) -> Vec<String> {
    let mut systems: Vec<String> = Vec::new();

    let candidates = entities
        .iter()
        .filter(|e| e.entity_type == EntityType::System)
        .map(|e| e.mention.as_str())
        .chain(tasks.iter().filter_map(|t| t.system.as_deref()));

    for candidate in candidates {
        let trimmed = candidate.trim();
        if trimmed.is_empty() {
            continue;
        }
        let lowered = trimmed.to_lowercase();
        if systems.iter().any(|s| s.to_lowercase() == lowered) {
            continue;
        }
        systems.push(trimmed.to_string());
    }

    systems
}
