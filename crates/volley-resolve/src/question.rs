//! Clarification-question templates for ambiguous entities.

use volley_core::entity::{EntityMatch, EntityType};

/// Question for a mention with no candidates at all.
#[must_use]
pub fn unknown(mention: &str, entity_type: EntityType) -> String {
    match entity_type {
        EntityType::Person => format!("Who is \"{mention}\"?"),
        EntityType::Company => format!("Which company is \"{mention}\"?"),
        EntityType::System | EntityType::Account | EntityType::Date => {
            format!("What is \"{mention}\"?")
        }
    }
}

/// Question naming up to three candidates for a contested mention.
#[must_use]
pub fn contested(mention: &str, candidates: &[EntityMatch]) -> String {
    let names: Vec<&str> = candidates.iter().take(3).map(|c| c.name.as_str()).collect();
    match names.as_slice() {
        [] => format!("Which \"{mention}\" did you mean?"),
        [only] => format!("Did you mean {only} when you said \"{mention}\"?"),
        [a, b] => format!("Did you mean {a} or {b} when you said \"{mention}\"?"),
        [a, b, c, ..] => {
            format!("Did you mean {a}, {b}, or {c} when you said \"{mention}\"?")
        }
    }
}

/// Note for an entity surfaced as ambiguous because its lookup failed.
#[must_use]
pub fn degraded(mention: &str) -> String {
    format!("Could not look up \"{mention}\" right now — please resolve it manually.")
}
