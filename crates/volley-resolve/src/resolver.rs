//! Entity resolution with confidence-based branching.
//!
//! Per entity: dates resolve trivially; everything else queries the store,
//! scores candidates with the fuzzy matcher (boosted when context clues
//! overlap candidate metadata, discounted by the candidate's own stored
//! confidence), then branches three ways — auto-resolve, resolve with
//! alternates, or ambiguous with a clarification question.
//!
//! A store fault for one entity degrades that entity to ambiguous with a
//! note; it never fails the batch.

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use volley_core::entity::{
    AmbiguousEntity, EntityMatch, EntityType, ExtractedEntity, ResolutionOutcome, ResolvedEntity,
};
use volley_core::errors::StoreError;

use crate::fuzzy::FuzzyMatcher;
use crate::question;
use crate::store::{EntityStore, NewEntity};

/// Tunable policy constants for the resolution branch.
///
/// The defaults are empirically chosen, not derived — they are configuration,
/// not invariants. What is invariant is the shape of the branch:
/// auto / alternates / ambiguous.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolverPolicy {
    /// Combined score at or above which the top candidate can auto-resolve.
    #[serde(default = "default_auto_resolve_threshold")]
    pub auto_resolve_threshold: f64,
    /// Runner-up combined score below which the winner counts as clear.
    #[serde(default = "default_runner_up_ceiling")]
    pub runner_up_ceiling: f64,
    /// Boost added to the fuzzy score when a context clue overlaps
    /// candidate metadata (result capped at 1.0).
    #[serde(default = "default_context_clue_boost")]
    pub context_clue_boost: f64,
    /// Maximum runners-up attached to a resolved entity.
    #[serde(default = "default_max_alternates")]
    pub max_alternates: usize,
    /// Maximum candidates attached to an ambiguous entity.
    #[serde(default = "default_max_possible_matches")]
    pub max_possible_matches: usize,
    /// Seed confidence for user-confirmed new entities.
    #[serde(default = "default_new_entity_confidence")]
    pub new_entity_confidence: f64,
}

fn default_auto_resolve_threshold() -> f64 {
    0.9
}
fn default_runner_up_ceiling() -> f64 {
    0.7
}
fn default_context_clue_boost() -> f64 {
    0.15
}
fn default_max_alternates() -> usize {
    2
}
fn default_max_possible_matches() -> usize {
    4
}
fn default_new_entity_confidence() -> f64 {
    0.85
}

impl Default for ResolverPolicy {
    fn default() -> Self {
        Self {
            auto_resolve_threshold: default_auto_resolve_threshold(),
            runner_up_ceiling: default_runner_up_ceiling(),
            context_clue_boost: default_context_clue_boost(),
            max_alternates: default_max_alternates(),
            max_possible_matches: default_max_possible_matches(),
            new_entity_confidence: default_new_entity_confidence(),
        }
    }
}

/// Errors from explicit resolver operations.
///
/// Only [`EntityResolver::add_entity`] propagates store faults; batch
/// resolution degrades them instead.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    /// The backing store failed an explicit operation.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Output of resolving a batch of entities.
///
/// Every input entity appears in exactly one of the two lists, and the
/// combined order matches input order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolutionReport {
    /// Entities confidently linked to store records.
    pub resolved: Vec<ResolvedEntity>,
    /// Entities needing human disambiguation.
    pub ambiguous: Vec<AmbiguousEntity>,
}

/// Resolves extracted entities against a backing knowledge store.
pub struct EntityResolver<S: EntityStore> {
    store: S,
    matcher: FuzzyMatcher,
    policy: ResolverPolicy,
}

impl<S: EntityStore> EntityResolver<S> {
    /// Create a resolver over the given store with the given policy.
    pub fn new(store: S, policy: ResolverPolicy) -> Self {
        Self {
            store,
            matcher: FuzzyMatcher,
            policy,
        }
    }

    /// Resolve every entity, fanning lookups out concurrently.
    ///
    /// Output order is stable: within each list, entities keep the order
    /// they arrived in, so downstream linkage by mention stays deterministic.
    pub async fn resolve_all(&self, entities: &[ExtractedEntity]) -> ResolutionReport {
        let outcomes = join_all(entities.iter().map(|e| self.resolve_one(e))).await;

        let mut report = ResolutionReport::default();
        for outcome in outcomes {
            match outcome {
                ResolutionOutcome::Resolved(resolved) => report.resolved.push(resolved),
                ResolutionOutcome::Ambiguous(ambiguous) => report.ambiguous.push(ambiguous),
            }
        }
        report
    }

    /// Resolve a single entity.
    pub async fn resolve_one(&self, entity: &ExtractedEntity) -> ResolutionOutcome {
        // Dates are normalized, not looked up.
        if entity.entity_type == EntityType::Date {
            return ResolutionOutcome::Resolved(ResolvedEntity::date(entity.clone()));
        }

        let candidates = match self
            .store
            .find_candidates(entity.entity_type, &entity.mention)
            .await
        {
            Ok(candidates) => candidates,
            Err(e) => {
                warn!(
                    mention = %entity.mention,
                    error = %e,
                    "candidate lookup failed, degrading entity to ambiguous"
                );
                return ResolutionOutcome::Ambiguous(AmbiguousEntity::degraded(
                    entity.clone(),
                    question::degraded(&entity.mention),
                ));
            }
        };

        let scored = self.score_candidates(entity, candidates);
        self.branch(entity, scored)
    }

    /// Register a brand-new entity for an unknown mention, seeded with the
    /// policy's moderate-high confidence — user-confirmed entities are
    /// trusted more than machine-guessed ones.
    pub async fn add_entity(&self, entity: &ExtractedEntity) -> Result<EntityMatch, ResolveError> {
        let new_entity = NewEntity {
            name: entity.mention.clone(),
            entity_type: entity.entity_type,
            role: Some(entity.role.clone()).filter(|r| !r.is_empty()),
            email: None,
            confidence: self.policy.new_entity_confidence,
        };
        Ok(self.store.add_entity(&new_entity).await?)
    }

    // ─── Scoring ─────────────────────────────────────────────────────────

    /// Score candidates: fuzzy match against the canonical name, boosted on
    /// context-clue overlap, then discounted by the candidate's stored
    /// confidence so low-trust records don't outrank better string matches.
    fn score_candidates(
        &self,
        entity: &ExtractedEntity,
        candidates: Vec<EntityMatch>,
    ) -> Vec<EntityMatch> {
        let mut scored: Vec<EntityMatch> = candidates
            .into_iter()
            .map(|candidate| {
                let fuzzy = self.matcher.score(&entity.mention, &candidate.name);
                let boosted = if clue_overlaps(&entity.context_clues, &candidate) {
                    (fuzzy + self.policy.context_clue_boost).min(1.0)
                } else {
                    fuzzy
                };
                let combined = boosted * candidate.confidence;
                debug!(
                    mention = %entity.mention,
                    candidate = %candidate.name,
                    fuzzy,
                    combined,
                    "scored candidate"
                );
                EntityMatch {
                    confidence: combined,
                    ..candidate
                }
            })
            .collect();

        // Descending by score; ID as tiebreak keeps re-runs deterministic.
        scored.sort_by(|a, b| {
            b.confidence
                .partial_cmp(&a.confidence)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.id.as_str().cmp(b.id.as_str()))
        });
        scored
    }

    // ─── Branching ───────────────────────────────────────────────────────

    fn branch(&self, entity: &ExtractedEntity, scored: Vec<EntityMatch>) -> ResolutionOutcome {
        let Some(top) = scored.first().cloned() else {
            return ResolutionOutcome::Ambiguous(AmbiguousEntity::unknown(
                entity.clone(),
                question::unknown(&entity.mention, entity.entity_type),
            ));
        };

        if top.confidence >= self.policy.auto_resolve_threshold {
            if scored.len() == 1 {
                return ResolutionOutcome::Resolved(ResolvedEntity::certain(entity.clone(), &top));
            }

            let runner_up = &scored[1];
            if runner_up.confidence < self.policy.runner_up_ceiling {
                // Clear winner; surface runners-up for audit/undo.
                let alternates: Vec<EntityMatch> = scored
                    .iter()
                    .skip(1)
                    .take(self.policy.max_alternates)
                    .cloned()
                    .collect();
                return ResolutionOutcome::Resolved(ResolvedEntity::with_alternates(
                    entity.clone(),
                    &top,
                    alternates,
                ));
            }
        }

        // Multiple viable candidates, or no candidate strong enough.
        let possible: Vec<EntityMatch> = scored
            .into_iter()
            .take(self.policy.max_possible_matches)
            .collect();
        let clarification = question::contested(&entity.mention, &possible);
        ResolutionOutcome::Ambiguous(AmbiguousEntity::contested(
            entity.clone(),
            possible,
            clarification,
        ))
    }
}

/// Whether any context clue textually overlaps the candidate's known
/// role/metadata (case-insensitive, either direction).
fn clue_overlaps(clues: &[String], candidate: &EntityMatch) -> bool {
    let fields: Vec<String> = candidate
        .role
        .iter()
        .chain(candidate.email.iter())
        .map(|f| f.to_lowercase())
        .collect();
    if fields.is_empty() {
        return false;
    }

    clues.iter().any(|clue| {
        let clue = clue.to_lowercase();
        !clue.trim().is_empty()
            && fields
                .iter()
                .any(|field| field.contains(&clue) || clue.contains(field.as_str()))
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
