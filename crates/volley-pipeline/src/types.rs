//! The enriched result returned to the caller.

use serde::{Deserialize, Serialize};

use volley_core::entity::{AmbiguousEntity, ExtractedEntity, ResolvedEntity};
use volley_core::lob::RawLob;
use volley_core::task::ParsedTask;
use volley_memory::MemoryContext;

/// Entity views of one enrichment: what was extracted, what resolved,
/// and what needs a human.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityResolutionReport {
    /// All extracted entities, in extraction order.
    pub extracted: Vec<ExtractedEntity>,
    /// Entities confidently linked to store records.
    pub resolved: Vec<ResolvedEntity>,
    /// Entities needing disambiguation.
    pub ambiguous: Vec<AmbiguousEntity>,
}

/// The fully-enriched lob handed back across the API boundary.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedLob {
    /// The original submission.
    pub lob: RawLob,
    /// Classified tasks in lob order.
    pub tasks: Vec<ParsedTask>,
    /// Entity extraction and resolution views.
    pub entities: EntityResolutionReport,
    /// Aggregated memory context.
    pub context: MemoryContext,
    /// Tasks dropped during validation — surfaced so drops are never silent.
    pub dropped_tasks: u32,
}
