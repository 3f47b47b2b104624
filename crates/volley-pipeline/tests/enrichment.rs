//! End-to-end enrichment over real SQLite stores with a scripted completion.

use std::sync::Mutex;

use volley_core::entity::EntityType;
use volley_core::ids::SenderId;
use volley_core::lob::RawLob;
use volley_core::task::TaskClassification;
use volley_llm::{CompletionOptions, CompletionService, ProviderError};
use volley_memory::MemoryAggregator;
use volley_parser::{LobParser, ParserConfig};
use volley_pipeline::ContextEnrichmentPipeline;
use volley_resolve::{EntityResolver, EntityStore, NewEntity};
use volley_settings::VolleySettings;
use volley_store::SqliteStores;

/// Completion double that replays a fixed response.
struct FixedCompletion {
    response: Mutex<String>,
}

impl FixedCompletion {
    fn new(response: &str) -> Self {
        Self {
            response: Mutex::new(response.to_string()),
        }
    }
}

#[async_trait::async_trait]
impl CompletionService for FixedCompletion {
    async fn complete_json(
        &self,
        _system_prompt: &str,
        _user_text: &str,
        _options: &CompletionOptions,
    ) -> Result<String, ProviderError> {
        Ok(self.response.lock().unwrap().clone())
    }
}

fn open_stores(dir: &tempfile::TempDir) -> SqliteStores {
    SqliteStores::open(dir.path().join("volley.db")).unwrap()
}

fn build_pipeline(
    response: &str,
    stores: &SqliteStores,
) -> ContextEnrichmentPipeline<FixedCompletion, SqliteStores, SqliteStores> {
    let settings = VolleySettings::default();
    ContextEnrichmentPipeline::new(
        LobParser::new(
            FixedCompletion::new(response),
            ParserConfig {
                max_output_tokens: settings.segmenter.max_output_tokens,
            },
        ),
        EntityResolver::new(stores.clone(), settings.resolver),
        MemoryAggregator::new(stores.clone(), settings.memory),
    )
}

const TWO_TOPIC_RESPONSE: &str = r#"{
    "tasks": [
        {"position": 1, "rawChunk": "First we need to fix the login bug.", "summary": "Fix the login bug", "classification": "task", "system": "WordPress", "relatedEntities": ["login bug"]},
        {"position": 2, "rawChunk": "Second, remind me to call Sarah tomorrow.", "summary": "Call Sarah tomorrow", "classification": "reminder", "deadline": "tomorrow", "relatedEntities": ["Sarah", "tomorrow"]}
    ],
    "entities": [
        {"mention": "WordPress", "type": "system", "role": "mentioned", "confidence": 0.95},
        {"mention": "Sarah", "type": "person", "role": "mentioned", "confidence": 0.9, "contextClues": ["call Sarah"]},
        {"mention": "tomorrow", "type": "date", "role": "deadline", "confidence": 0.95}
    ]
}"#;

#[tokio::test]
async fn multi_topic_lob_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let stores = open_stores(&dir);

    // Seed the knowledge base and history
    let _ = stores
        .add_entity(&NewEntity {
            name: "Sarah".into(),
            entity_type: EntityType::Person,
            role: Some("designer".into()),
            email: None,
            confidence: 0.95,
        })
        .await
        .unwrap();
    let record = stores
        .insert_resolution(
            "wordpress login keeps failing".into(),
            "clear the session table".into(),
            Some("WordPress".into()),
        )
        .await
        .unwrap();
    let _ = stores
        .record_success(record.id.clone(), "done-1".into())
        .await
        .unwrap();
    let _ = stores
        .learn_routing("wordpress".into(), SenderId::from("user-9"), 0.8)
        .await
        .unwrap();

    let pipeline = build_pipeline(TWO_TOPIC_RESPONSE, &stores);
    let lob = RawLob::new(
        "First we need to fix the login bug. Second, remind me to call Sarah tomorrow.",
        "user-1",
        "ws-1",
    );
    let enriched = pipeline.enrich(&lob, None, None).await.unwrap();

    // Segmentation: two distinct topics stay two tasks
    assert!(enriched.tasks.len() >= 2);
    assert_eq!(enriched.tasks[0].classification, TaskClassification::Task);
    assert_eq!(
        enriched.tasks[1].classification,
        TaskClassification::Reminder
    );
    assert!(enriched.tasks[1]
        .related_entities
        .contains(&"Sarah".to_string()));

    // Exclusivity holds for every returned task
    assert!(enriched.tasks.iter().all(|t| t.exclusivity_holds()));

    // Every extracted entity lands in exactly one bucket
    assert_eq!(
        enriched.entities.resolved.len() + enriched.entities.ambiguous.len(),
        enriched.entities.extracted.len()
    );

    // "Sarah" resolves against the seeded store record; "tomorrow" resolves
    // trivially as a date
    let resolved_names: Vec<&str> = enriched
        .entities
        .resolved
        .iter()
        .map(|r| r.entity.mention.as_str())
        .collect();
    assert!(resolved_names.contains(&"Sarah"));
    assert!(resolved_names.contains(&"tomorrow"));

    // Memory carries the seeded fix and the routing suggestion
    assert_eq!(enriched.context.resolutions.len(), 1);
    assert_eq!(
        enriched.context.resolutions[0].record.solution,
        "clear the session table"
    );
    assert_eq!(enriched.context.routing.len(), 1);
    assert_eq!(
        enriched.context.routing[0].pattern.assignee_id.as_str(),
        "user-9"
    );
    assert!(enriched
        .context
        .systems
        .contains(&"WordPress".to_string()));
}

#[tokio::test]
async fn venting_lob_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let stores = open_stores(&dir);

    let response = r#"{
        "tasks": [{
            "position": 1,
            "rawChunk": "WordPress keeps breaking and I can't deal with it",
            "summary": "Acknowledge WordPress frustration",
            "classification": "venting",
            "system": "WordPress",
            "ventingResponse": "That sounds exhausting — repeated WordPress breakage is a real drain.",
            "missingInfo": ["What breaks exactly — the whole site or one plugin?"]
        }],
        "entities": [{"mention": "WordPress", "type": "system", "role": "mentioned", "confidence": 0.95}]
    }"#;

    let pipeline = build_pipeline(response, &stores);
    let lob = RawLob::new(
        "WordPress keeps breaking and I can't deal with it",
        "user-1",
        "ws-1",
    );
    let enriched = pipeline.enrich(&lob, None, None).await.unwrap();

    assert_eq!(enriched.tasks.len(), 1);
    let task = &enriched.tasks[0];
    assert_eq!(task.classification, TaskClassification::Venting);
    assert!(task.venting_response.is_some());
    assert!(task.self_service_steps.is_none());
    assert!(!task.missing_info.is_empty());
}

#[tokio::test]
async fn enrichment_is_deterministic_against_unchanged_stores() {
    let dir = tempfile::tempdir().unwrap();
    let stores = open_stores(&dir);

    for i in 0..6 {
        let _ = stores
            .insert_resolution(
                format!("wordpress issue variant {i}"),
                "rotate logs".into(),
                None,
            )
            .await
            .unwrap();
    }

    let pipeline = build_pipeline(TWO_TOPIC_RESPONSE, &stores);
    let lob = RawLob::new("fix the login bug and call Sarah", "user-1", "ws-1");

    let first = pipeline.enrich(&lob, None, None).await.unwrap();
    let second = pipeline.enrich(&lob, None, None).await.unwrap();

    let ids = |e: &volley_pipeline::EnrichedLob| -> Vec<String> {
        e.context
            .resolutions
            .iter()
            .map(|r| r.record.id.as_str().to_string())
            .collect()
    };
    assert_eq!(ids(&first), ids(&second));
    assert_eq!(first.context.keywords, second.context.keywords);
    assert_eq!(first.tasks, second.tasks);
}

#[tokio::test]
async fn unknown_mentions_surface_as_ambiguous_with_questions() {
    let dir = tempfile::tempdir().unwrap();
    let stores = open_stores(&dir);

    let pipeline = build_pipeline(TWO_TOPIC_RESPONSE, &stores);
    let lob = RawLob::new("fix the login bug and call Sarah", "user-1", "ws-1");
    let enriched = pipeline.enrich(&lob, None, None).await.unwrap();

    // Nothing seeded: Sarah and WordPress are unknown, tomorrow still resolves
    assert_eq!(enriched.entities.resolved.len(), 1);
    assert_eq!(enriched.entities.ambiguous.len(), 2);
    for ambiguous in &enriched.entities.ambiguous {
        assert!(ambiguous.possible_matches.is_empty());
        assert!(!ambiguous.clarification_question.is_empty());
    }
}

#[tokio::test]
async fn human_selection_turns_ambiguous_into_resolved() {
    let dir = tempfile::tempdir().unwrap();
    let stores = open_stores(&dir);

    let pipeline = build_pipeline(TWO_TOPIC_RESPONSE, &stores);
    let lob = RawLob::new("call Sarah", "user-1", "ws-1");
    let enriched = pipeline.enrich(&lob, None, None).await.unwrap();

    let ambiguous = enriched
        .entities
        .ambiguous
        .iter()
        .find(|a| a.entity.mention == "Sarah")
        .cloned()
        .unwrap();

    // The human registers a brand-new entity, then selects it
    let resolver = EntityResolver::new(stores.clone(), volley_resolve::ResolverPolicy::default());
    let created = resolver.add_entity(&ambiguous.entity).await.unwrap();
    let resolved = ambiguous.select(&created);

    assert!(resolved.resolved);
    assert_eq!(resolved.resolved_name, "Sarah");
    assert!((resolved.confidence - 1.0).abs() < f64::EPSILON);

    // The new entity is now a discoverable candidate for the next lob:
    // seeded at 0.85, it surfaces as a named choice rather than a blank
    // "who is this" question.
    let pipeline = build_pipeline(TWO_TOPIC_RESPONSE, &stores);
    let enriched = pipeline.enrich(&lob, None, None).await.unwrap();
    let sarah = enriched
        .entities
        .ambiguous
        .iter()
        .find(|a| a.entity.mention == "Sarah")
        .unwrap();
    assert_eq!(sarah.possible_matches.len(), 1);
    assert_eq!(sarah.possible_matches[0].name, "Sarah");
    assert!(sarah.clarification_question.contains("Sarah"));
}
