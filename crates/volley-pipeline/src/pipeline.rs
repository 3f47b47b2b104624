//! The enrichment orchestrator.

use std::future::Future;

use tokio_util::sync::CancellationToken;
use tracing::info;

use volley_core::lob::RawLob;
use volley_llm::CompletionService;
use volley_memory::{HistoryStore, MemoryAggregator};
use volley_parser::{CompanyContext, LobParser};
use volley_resolve::{EntityResolver, EntityStore};

use crate::error::PipelineError;
use crate::types::{EnrichedLob, EntityResolutionReport};

/// Orchestrates parse → resolve + aggregate → assemble for one lob.
///
/// Collaborators are injected at construction; there is no runtime backend
/// dispatch. Each `enrich` call operates on an independent, immutable lob
/// and produces fresh output — no shared mutable state, so concurrent
/// calls need no locking.
pub struct ContextEnrichmentPipeline<C, S, H>
where
    C: CompletionService,
    S: EntityStore,
    H: HistoryStore,
{
    parser: LobParser<C>,
    resolver: EntityResolver<S>,
    aggregator: MemoryAggregator<H>,
}

impl<C, S, H> ContextEnrichmentPipeline<C, S, H>
where
    C: CompletionService,
    S: EntityStore,
    H: HistoryStore,
{
    /// Assemble a pipeline from its three stages.
    pub fn new(
        parser: LobParser<C>,
        resolver: EntityResolver<S>,
        aggregator: MemoryAggregator<H>,
    ) -> Self {
        Self {
            parser,
            resolver,
            aggregator,
        }
    }

    /// Enrich one lob.
    ///
    /// Entity resolution and context aggregation run concurrently —
    /// aggregation only needs the extracted entities, not resolved ones.
    /// When `cancel` fires, in-flight lookups are abandoned and the call
    /// fails with [`PipelineError::Cancelled`]; no partial result is
    /// returned.
    pub async fn enrich(
        &self,
        lob: &RawLob,
        company_context: Option<&CompanyContext>,
        cancel: Option<&CancellationToken>,
    ) -> Result<EnrichedLob, PipelineError> {
        if lob.is_blank() {
            return Err(PipelineError::InvalidInput {
                message: "lob text is empty".into(),
            });
        }

        let batch = with_cancellation(cancel, self.parser.parse(&lob.text, company_context))
            .await??;

        let (report, context) = with_cancellation(cancel, async {
            tokio::join!(
                self.resolver.resolve_all(&batch.entities),
                self.aggregator.full_context(&batch.tasks, &batch.entities),
            )
        })
        .await?;

        info!(
            lob_id = %lob.id,
            tasks = batch.tasks.len(),
            resolved = report.resolved.len(),
            ambiguous = report.ambiguous.len(),
            "lob enriched"
        );

        Ok(EnrichedLob {
            lob: lob.clone(),
            tasks: batch.tasks,
            entities: EntityResolutionReport {
                extracted: batch.entities,
                resolved: report.resolved,
                ambiguous: report.ambiguous,
            },
            context,
            dropped_tasks: batch.dropped_tasks,
        })
    }
}

/// Race a future against the caller's cancellation token.
async fn with_cancellation<T>(
    cancel: Option<&CancellationToken>,
    future: impl Future<Output = T>,
) -> Result<T, PipelineError> {
    match cancel {
        Some(token) => tokio::select! {
            () = token.cancelled() => Err(PipelineError::Cancelled),
            value = future => Ok(value),
        },
        None => Ok(future.await),
    }
}
