//! Memory aggregation: relevance scoring, deduplication, and ranking.

use std::collections::HashSet;

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use volley_core::entity::ExtractedEntity;
use volley_core::history::{ResolutionRecord, RoutingPattern};
use volley_core::ids::RecordId;
use volley_core::task::ParsedTask;

use crate::keywords::{derive_keywords, derive_systems};
use crate::store::HistoryStore;

/// Points when the keyword appears in a record's problem description.
const PROBLEM_HIT_POINTS: u32 = 2;
/// Points when the keyword appears in a record's solution.
const SOLUTION_HIT_POINTS: u32 = 1;
/// Bonus when the query's system name matches the record's.
const SYSTEM_MATCH_BONUS: u32 = 3;

/// Tunable policy for memory aggregation.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryPolicy {
    /// Keywords queried per lob, at most.
    #[serde(default = "default_max_keywords")]
    pub max_keywords: usize,
    /// Keywords must be strictly longer than this many characters.
    #[serde(default = "default_min_keyword_length")]
    pub min_keyword_length: usize,
    /// Ranked resolutions returned, at most.
    #[serde(default = "default_max_resolutions")]
    pub max_resolutions: usize,
    /// Per-success multiplier applied during re-ranking.
    #[serde(default = "default_success_weight")]
    pub success_weight: f64,
}

fn default_max_keywords() -> usize {
    5
}
fn default_min_keyword_length() -> usize {
    3
}
fn default_max_resolutions() -> usize {
    5
}
fn default_success_weight() -> f64 {
    0.1
}

impl Default for MemoryPolicy {
    fn default() -> Self {
        Self {
            max_keywords: default_max_keywords(),
            min_keyword_length: default_min_keyword_length(),
            max_resolutions: default_max_resolutions(),
            success_weight: default_success_weight(),
        }
    }
}

/// A resolution record with its relevance and final ranking score.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedResolution {
    /// The historical record.
    pub record: ResolutionRecord,
    /// Normalized keyword relevance, roughly `0..1`.
    pub relevance: f64,
    /// Success-weighted ranking score:
    /// `relevance × (1 + success_count × success_weight)`.
    pub score: f64,
}

/// A routing suggestion for a system found in the lob.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutingSuggestion {
    /// System the suggestion applies to.
    pub system: String,
    /// The learned pattern.
    pub pattern: RoutingPattern,
}

/// Aggregated context for one lob.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryContext {
    /// Top past resolutions, ranked.
    pub resolutions: Vec<RankedResolution>,
    /// Routing suggestions, one per system with a known pattern.
    pub routing: Vec<RoutingSuggestion>,
    /// Deduplicated systems found in the lob.
    pub systems: Vec<String>,
    /// Keywords that were queried.
    pub keywords: Vec<String>,
}

/// Aggregates relevant prior context for a parsed lob.
pub struct MemoryAggregator<H: HistoryStore> {
    history: H,
    policy: MemoryPolicy,
}

impl<H: HistoryStore> MemoryAggregator<H> {
    /// Create an aggregator over the given history store.
    pub fn new(history: H, policy: MemoryPolicy) -> Self {
        Self { history, policy }
    }

    /// Gather ranked resolutions, routing suggestions, systems, and the
    /// keyword set for one parsed lob.
    ///
    /// Deterministic for identical inputs against an unchanged store:
    /// keyword order, dedup order, and ranking tiebreaks are all stable.
    pub async fn full_context(
        &self,
        tasks: &[ParsedTask],
        entities: &[ExtractedEntity],
    ) -> MemoryContext {
        let keywords = derive_keywords(
            tasks,
            entities,
            self.policy.min_keyword_length,
            self.policy.max_keywords,
        );
        let systems = derive_systems(tasks, entities);
        let primary_system = systems.first().map(String::as_str);

        let resolutions = self
            .ranked_resolutions(&keywords, primary_system)
            .await;
        let routing = self.routing_suggestions(&systems).await;

        debug!(
            keywords = keywords.len(),
            systems = systems.len(),
            resolutions = resolutions.len(),
            routing = routing.len(),
            "memory context aggregated"
        );

        MemoryContext {
            resolutions,
            routing,
            systems,
            keywords,
        }
    }

    // ─── Resolutions ─────────────────────────────────────────────────────

    async fn ranked_resolutions(
        &self,
        keywords: &[String],
        system_name: Option<&str>,
    ) -> Vec<RankedResolution> {
        if keywords.is_empty() {
            return Vec::new();
        }

        // Fan out one search per keyword; a failed search degrades to an
        // empty result for that keyword.
        let searches = join_all(keywords.iter().map(|keyword| async move {
            match self
                .history
                .search_resolutions(keyword, system_name)
                .await
            {
                Ok(records) => (keyword.clone(), records),
                Err(e) => {
                    warn!(keyword = %keyword, error = %e, "resolution search failed, skipping keyword");
                    (keyword.clone(), Vec::new())
                }
            }
        }))
        .await;

        // Merge with first-occurrence-wins dedup by record ID.
        let mut seen: HashSet<RecordId> = HashSet::new();
        let mut ranked: Vec<RankedResolution> = Vec::new();
        for (keyword, records) in searches {
            for record in records {
                if !seen.insert(record.id.clone()) {
                    continue;
                }
                let relevance = relevance(&record, &keyword, system_name, keywords.len());
                let score = relevance
                    * (1.0 + f64::from(record.success_count) * self.policy.success_weight);
                ranked.push(RankedResolution {
                    record,
                    relevance,
                    score,
                });
            }
        }

        // Success-weighted re-rank; record ID as tiebreak for stable output.
        ranked.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.record.id.as_str().cmp(b.record.id.as_str()))
        });
        ranked.truncate(self.policy.max_resolutions);
        ranked
    }

    // ─── Routing ─────────────────────────────────────────────────────────

    async fn routing_suggestions(&self, systems: &[String]) -> Vec<RoutingSuggestion> {
        let lookups = join_all(systems.iter().map(|system| async move {
            match self.history.find_routing_pattern(&system.to_lowercase()).await {
                Ok(pattern) => pattern.map(|p| RoutingSuggestion {
                    system: system.clone(),
                    pattern: p,
                }),
                Err(e) => {
                    warn!(system = %system, error = %e, "routing lookup failed, skipping system");
                    None
                }
            }
        }))
        .await;

        lookups.into_iter().flatten().collect()
    }
}

/// Substring-containment relevance for one record against one keyword:
/// +2 for a problem hit, +1 for a solution hit, +3 when the query system
/// matches the record's, normalized by `keyword_count × 2`.
#[allow(clippy::cast_precision_loss)]
fn relevance(
    record: &ResolutionRecord,
    keyword: &str,
    system_name: Option<&str>,
    keyword_count: usize,
) -> f64 {
    let mut points: u32 = 0;
    if record.problem_pattern.to_lowercase().contains(keyword) {
        points += PROBLEM_HIT_POINTS;
    }
    if record.solution.to_lowercase().contains(keyword) {
        points += SOLUTION_HIT_POINTS;
    }
    if let (Some(query_system), Some(record_system)) = (system_name, record.system_name.as_deref())
    {
        if query_system.eq_ignore_ascii_case(record_system) {
            points += SYSTEM_MATCH_BONUS;
        }
    }

    f64::from(points) / (keyword_count.max(1) * 2) as f64
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
