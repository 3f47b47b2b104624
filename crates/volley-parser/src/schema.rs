//! Validation and repair of raw model output.
//!
//! The completion is untrusted: it may be valid JSON, JSON wrapped in a
//! code fence or prose, or garbage. Recovery strategy, in order:
//!
//! 1. Parse the raw text as JSON.
//! 2. Extract a fenced code block (```json ... ```) and retry once.
//! 3. Brace-match the first complete top-level object and retry once.
//!
//! After that the call fails. Per-item validation is forgiving: tasks and
//! entities missing required fields are dropped with a logged warning and
//! counted, optional fields are defaulted, and the steps/venting
//! exclusivity rule is enforced by trusting `classification` and nulling
//! the mismatched field.

use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use volley_core::task::{ParsedTask, TaskClassification, Urgency};
use volley_core::entity::{EntityType, ExtractedEntity};

/// Upper bound on tasks kept from a single parse. Inputs that segment into
/// more than this are almost certainly mis-segmented.
pub const MAX_TASKS_PER_LOB: usize = 20;

/// Validation failure for the whole output (per-item problems never reach here).
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct MalformedOutput {
    /// Parse failure description.
    pub message: String,
}

/// The validated result of one parse call.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ValidatedBatch {
    /// Tasks that survived validation, renumbered contiguously from 1.
    pub tasks: Vec<ParsedTask>,
    /// Entities that survived validation, in model output order.
    pub entities: Vec<ExtractedEntity>,
    /// Tasks dropped during validation (counted so drops are never silent).
    pub dropped_tasks: u32,
    /// Entities dropped during validation.
    pub dropped_entities: u32,
}

// ─────────────────────────────────────────────────────────────────────────────
// Lenient intermediate shapes
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawOutput {
    #[serde(default)]
    tasks: Vec<Value>,
    #[serde(default)]
    entities: Vec<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTask {
    position: Option<u32>,
    #[serde(default)]
    raw_chunk: String,
    #[serde(default)]
    summary: String,
    classification: Option<TaskClassification>,
    #[serde(default)]
    system: Option<String>,
    #[serde(default)]
    urgency: Option<Urgency>,
    #[serde(default)]
    deadline: Option<String>,
    #[serde(default)]
    assignee: Option<String>,
    #[serde(default)]
    related_entities: Vec<String>,
    #[serde(default)]
    missing_info: Vec<String>,
    #[serde(default)]
    self_service_steps: Option<Vec<String>>,
    #[serde(default)]
    venting_response: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawEntity {
    #[serde(default)]
    mention: String,
    #[serde(rename = "type")]
    entity_type: Option<EntityType>,
    #[serde(default)]
    role: Option<String>,
    #[serde(default)]
    confidence: Option<f64>,
    #[serde(default)]
    context_clues: Vec<String>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Entry point
// ─────────────────────────────────────────────────────────────────────────────

/// Validate raw model output into a typed batch.
///
/// Total parse failure (after the repair attempts) is fatal; per-item
/// validation issues drop the item and continue.
pub fn validate_output(raw: &str) -> Result<ValidatedBatch, MalformedOutput> {
    let parsed = parse_with_repair(raw)?;

    let raw_output: RawOutput = serde_json::from_value(parsed).map_err(|e| MalformedOutput {
        message: format!("top-level shape mismatch: {e}"),
    })?;

    let mut batch = ValidatedBatch::default();

    // --- Tasks ---
    let mut kept: Vec<(u32, usize, ParsedTask)> = Vec::new();
    for (index, value) in raw_output.tasks.into_iter().enumerate() {
        match coerce_task(value) {
            Ok(task) => {
                let hinted = task.position.max(1);
                kept.push((hinted, index, task));
            }
            Err(reason) => {
                warn!(index, %reason, "dropping task that failed validation");
                batch.dropped_tasks += 1;
            }
        }
    }

    // Stable order: model-provided position first, source order as tiebreak,
    // then renumber contiguously from 1.
    kept.sort_by_key(|(hinted, index, _)| (*hinted, *index));
    if kept.len() > MAX_TASKS_PER_LOB {
        #[allow(clippy::cast_possible_truncation)]
        let overflow = (kept.len() - MAX_TASKS_PER_LOB) as u32;
        warn!(overflow, "dropping tasks beyond the per-lob cap");
        batch.dropped_tasks += overflow;
        kept.truncate(MAX_TASKS_PER_LOB);
    }
    for (new_position, (_, _, mut task)) in kept.into_iter().enumerate() {
        #[allow(clippy::cast_possible_truncation)]
        {
            task.position = new_position as u32 + 1;
        }
        batch.tasks.push(task);
    }

    // --- Entities ---
    for (index, value) in raw_output.entities.into_iter().enumerate() {
        match coerce_entity(value) {
            Ok(entity) => batch.entities.push(entity),
            Err(reason) => {
                warn!(index, %reason, "dropping entity that failed validation");
                batch.dropped_entities += 1;
            }
        }
    }

    Ok(batch)
}

// ─────────────────────────────────────────────────────────────────────────────
// JSON repair
// ─────────────────────────────────────────────────────────────────────────────

fn parse_with_repair(raw: &str) -> Result<Value, MalformedOutput> {
    let trimmed = raw.trim();

    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        if value.is_object() {
            return Ok(value);
        }
    }

    // Repair attempt: fenced block first, then bare brace matching. The
    // fence content gets brace-matched too, to shear off trailing prose
    // the model put inside the fence.
    let candidate = fenced_block(trimmed)
        .map(|inner| match_braces(&inner).unwrap_or(inner))
        .or_else(|| match_braces(trimmed));

    match candidate {
        Some(json) => serde_json::from_str::<Value>(&json).map_err(|e| MalformedOutput {
            message: format!("repair attempt produced invalid JSON: {e}"),
        }),
        None => Err(MalformedOutput {
            message: "no JSON object found in model output".into(),
        }),
    }
}

/// Content of the first ```json / ``` fence, if any.
fn fenced_block(s: &str) -> Option<String> {
    let start = s
        .find("```json\n")
        .map(|i| i + 8)
        .or_else(|| s.find("```json\r\n").map(|i| i + 9))
        .or_else(|| s.find("```\n").map(|i| i + 4))
        .or_else(|| s.find("```\r\n").map(|i| i + 5))?;

    let rest = &s[start..];
    let end = rest.find("\n```").or_else(|| rest.find("\r\n```"))?;
    Some(rest[..end].trim().to_string())
}

/// First complete top-level JSON object, found by depth-tracking brace
/// matching that respects string literals and escapes.
fn match_braces(s: &str) -> Option<String> {
    let bytes = s.as_bytes();
    let start = bytes.iter().position(|&b| b == b'{')?;

    let mut depth: i32 = 0;
    let mut in_string = false;
    let mut i = start;

    while i < bytes.len() {
        let b = bytes[i];
        if in_string {
            if b == b'\\' {
                i += 2;
                continue;
            }
            if b == b'"' {
                in_string = false;
            }
        } else {
            match b {
                b'"' => in_string = true,
                b'{' => depth += 1,
                b'}' => {
                    depth -= 1;
                    if depth == 0 {
                        return Some(s[start..=i].to_string());
                    }
                }
                _ => {}
            }
        }
        i += 1;
    }

    None
}

// ─────────────────────────────────────────────────────────────────────────────
// Per-item coercion
// ─────────────────────────────────────────────────────────────────────────────

fn coerce_task(value: Value) -> Result<ParsedTask, String> {
    let raw: RawTask =
        serde_json::from_value(value).map_err(|e| format!("task shape mismatch: {e}"))?;

    let summary = raw.summary.trim().to_string();
    if summary.is_empty() {
        return Err("missing summary".into());
    }
    let classification = raw.classification.ok_or("missing or invalid classification")?;
    let raw_chunk = if raw.raw_chunk.trim().is_empty() {
        // Tolerate a missing source chunk by falling back to the summary;
        // the chunk is context, the summary is the contract.
        summary.clone()
    } else {
        raw.raw_chunk.trim().to_string()
    };

    // Exclusivity: classification wins, mismatched companions are nulled.
    let mut self_service_steps = raw
        .self_service_steps
        .filter(|steps| !steps.is_empty());
    let mut venting_response = raw
        .venting_response
        .filter(|response| !response.trim().is_empty());
    if !classification.expects_steps() && self_service_steps.take().is_some() {
        warn!(%classification, "nulling selfServiceSteps inconsistent with classification");
    }
    if !classification.expects_venting_response() && venting_response.take().is_some() {
        warn!(%classification, "nulling ventingResponse inconsistent with classification");
    }

    // Required companions are not defaultable — there is nothing sensible
    // to invent for them.
    if classification.expects_steps() && self_service_steps.is_none() {
        return Err("self_service task without steps".into());
    }
    if classification.expects_venting_response() && venting_response.is_none() {
        return Err("venting task without acknowledgment".into());
    }

    Ok(ParsedTask {
        position: raw.position.unwrap_or(0),
        raw_chunk,
        summary,
        classification,
        system: raw.system.filter(|s| !s.trim().is_empty()),
        urgency: raw.urgency.unwrap_or_default(),
        deadline: raw.deadline.filter(|s| !s.trim().is_empty()),
        assignee: raw.assignee.filter(|s| !s.trim().is_empty()),
        related_entities: raw.related_entities,
        missing_info: raw.missing_info,
        self_service_steps,
        venting_response,
    })
}

fn coerce_entity(value: Value) -> Result<ExtractedEntity, String> {
    let raw: RawEntity =
        serde_json::from_value(value).map_err(|e| format!("entity shape mismatch: {e}"))?;

    let mention = raw.mention.trim().to_string();
    if mention.is_empty() {
        return Err("empty mention".into());
    }
    let entity_type = raw.entity_type.ok_or("missing or invalid type")?;

    Ok(ExtractedEntity {
        mention,
        entity_type,
        role: raw
            .role
            .filter(|r| !r.trim().is_empty())
            .unwrap_or_else(|| "mentioned".to_string()),
        confidence: raw.confidence.unwrap_or(0.5).clamp(0.0, 1.0),
        context_clues: raw.context_clues,
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn task_json(summary: &str, classification: &str) -> String {
        format!(
            r#"{{"position": 1, "rawChunk": "{summary}", "summary": "{summary}", "classification": "{classification}"}}"#
        )
    }

    // -- repair strategies --

    #[test]
    fn plain_json_parses() {
        let batch = validate_output(r#"{"tasks": [], "entities": []}"#).unwrap();
        assert!(batch.tasks.is_empty());
        assert!(batch.entities.is_empty());
        assert_eq!(batch.dropped_tasks, 0);
    }

    #[test]
    fn fenced_json_is_repaired() {
        let raw = format!(
            "Here is the result:\n```json\n{{\"tasks\": [{}], \"entities\": []}}\n```\nDone.",
            task_json("Fix the login bug", "task")
        );
        let batch = validate_output(&raw).unwrap();
        assert_eq!(batch.tasks.len(), 1);
        assert_eq!(batch.tasks[0].summary, "Fix the login bug");
    }

    #[test]
    fn prose_wrapped_json_is_repaired() {
        let raw = format!(
            "Sure! {{\"tasks\": [{}], \"entities\": []}} — hope that helps.",
            task_json("Call Sarah", "reminder")
        );
        let batch = validate_output(&raw).unwrap();
        assert_eq!(batch.tasks.len(), 1);
    }

    #[test]
    fn fence_with_trailing_prose_inside() {
        let raw = "```json\n{\"tasks\": [], \"entities\": []}\nnote to self\n```";
        let batch = validate_output(raw).unwrap();
        assert!(batch.tasks.is_empty());
    }

    #[test]
    fn garbage_is_fatal() {
        let err = validate_output("I could not process this request.").unwrap_err();
        assert!(err.message.contains("no JSON object"));
    }

    #[test]
    fn unclosed_brace_is_fatal() {
        let err = validate_output(r#"{"tasks": [{"summary": "x""#).unwrap_err();
        assert!(!err.message.is_empty());
    }

    #[test]
    fn top_level_array_is_fatal() {
        assert!(validate_output("[1, 2, 3]").is_err());
    }

    #[test]
    fn brace_matching_respects_strings() {
        // The '}' inside the string literal must not close the object
        let raw = r#"{"tasks": [{"position": 1, "rawChunk": "see {braces}", "summary": "Handle } in text", "classification": "task"}], "entities": []}"#;
        let batch = validate_output(&format!("prefix {raw}")).unwrap();
        assert_eq!(batch.tasks.len(), 1);
        assert!(batch.tasks[0].summary.contains('}'));
    }

    // -- per-task validation --

    #[test]
    fn task_without_summary_is_dropped() {
        let raw = r#"{"tasks": [{"position": 1, "classification": "task"}], "entities": []}"#;
        let batch = validate_output(raw).unwrap();
        assert!(batch.tasks.is_empty());
        assert_eq!(batch.dropped_tasks, 1);
    }

    #[test]
    fn task_with_unknown_classification_is_dropped() {
        let raw = format!(
            r#"{{"tasks": [{}], "entities": []}}"#,
            task_json("Do the thing", "complaint")
        );
        let batch = validate_output(&raw).unwrap();
        assert!(batch.tasks.is_empty());
        assert_eq!(batch.dropped_tasks, 1);
    }

    #[test]
    fn drop_does_not_poison_batch() {
        let raw = format!(
            r#"{{"tasks": [{}, {{"position": 2}}, {}], "entities": []}}"#,
            task_json("Fix the login bug", "task"),
            task_json("Call Sarah tomorrow", "reminder")
        );
        let batch = validate_output(&raw).unwrap();
        assert_eq!(batch.tasks.len(), 2);
        assert_eq!(batch.dropped_tasks, 1);
    }

    #[test]
    fn optional_fields_are_defaulted() {
        let raw = format!(
            r#"{{"tasks": [{}], "entities": []}}"#,
            task_json("Update the site", "task")
        );
        let batch = validate_output(&raw).unwrap();
        let task = &batch.tasks[0];
        assert_eq!(task.urgency, Urgency::Normal);
        assert!(task.missing_info.is_empty());
        assert!(task.related_entities.is_empty());
        assert!(task.system.is_none());
        assert!(task.deadline.is_none());
    }

    #[test]
    fn missing_raw_chunk_falls_back_to_summary() {
        let raw = r#"{"tasks": [{"summary": "Restart the server", "classification": "task"}], "entities": []}"#;
        let batch = validate_output(raw).unwrap();
        assert_eq!(batch.tasks[0].raw_chunk, "Restart the server");
    }

    // -- exclusivity enforcement --

    #[test]
    fn venting_response_on_plain_task_is_nulled() {
        let raw = r#"{"tasks": [{"summary": "Fix the printer", "classification": "task", "ventingResponse": "ugh"}], "entities": []}"#;
        let batch = validate_output(raw).unwrap();
        let task = &batch.tasks[0];
        assert!(task.venting_response.is_none());
        assert!(task.exclusivity_holds());
    }

    #[test]
    fn steps_on_venting_task_are_nulled() {
        let raw = r#"{"tasks": [{"summary": "Acknowledge frustration", "classification": "venting", "ventingResponse": "That sounds rough", "selfServiceSteps": ["breathe"]}], "entities": []}"#;
        let batch = validate_output(raw).unwrap();
        let task = &batch.tasks[0];
        assert!(task.self_service_steps.is_none());
        assert_eq!(task.venting_response.as_deref(), Some("That sounds rough"));
        assert!(task.exclusivity_holds());
    }

    #[test]
    fn self_service_without_steps_is_dropped() {
        let raw = r#"{"tasks": [{"summary": "Reset your password", "classification": "self_service"}], "entities": []}"#;
        let batch = validate_output(raw).unwrap();
        assert!(batch.tasks.is_empty());
        assert_eq!(batch.dropped_tasks, 1);
    }

    #[test]
    fn venting_without_response_is_dropped() {
        let raw = r#"{"tasks": [{"summary": "Vent about WordPress", "classification": "venting"}], "entities": []}"#;
        let batch = validate_output(raw).unwrap();
        assert!(batch.tasks.is_empty());
        assert_eq!(batch.dropped_tasks, 1);
    }

    #[test]
    fn every_surviving_task_satisfies_exclusivity() {
        let raw = r#"{"tasks": [
            {"summary": "Fix login", "classification": "task", "selfServiceSteps": ["hack"]},
            {"summary": "Clear your cache", "classification": "self_service", "selfServiceSteps": ["open settings", "clear cache"]},
            {"summary": "Acknowledge", "classification": "venting", "ventingResponse": "heard"}
        ], "entities": []}"#;
        let batch = validate_output(raw).unwrap();
        assert_eq!(batch.tasks.len(), 3);
        assert!(batch.tasks.iter().all(ParsedTask::exclusivity_holds));
    }

    // -- ordering and the cap --

    #[test]
    fn positions_are_renumbered_contiguously() {
        let raw = r#"{"tasks": [
            {"position": 7, "summary": "Third thing", "classification": "task"},
            {"position": 2, "summary": "First thing", "classification": "task"},
            {"position": 5, "summary": "Second thing", "classification": "task"}
        ], "entities": []}"#;
        let batch = validate_output(raw).unwrap();
        let positions: Vec<u32> = batch.tasks.iter().map(|t| t.position).collect();
        assert_eq!(positions, vec![1, 2, 3]);
        assert_eq!(batch.tasks[0].summary, "First thing");
        assert_eq!(batch.tasks[2].summary, "Third thing");
    }

    #[test]
    fn missing_positions_keep_source_order() {
        let raw = r#"{"tasks": [
            {"summary": "Alpha", "classification": "task"},
            {"summary": "Beta", "classification": "task"}
        ], "entities": []}"#;
        let batch = validate_output(raw).unwrap();
        assert_eq!(batch.tasks[0].summary, "Alpha");
        assert_eq!(batch.tasks[1].summary, "Beta");
        assert_eq!(batch.tasks[1].position, 2);
    }

    #[test]
    fn cap_drops_overflow_tasks() {
        let tasks: Vec<String> = (0..25)
            .map(|i| {
                format!(
                    r#"{{"position": {}, "summary": "Task {i}", "classification": "task"}}"#,
                    i + 1
                )
            })
            .collect();
        let raw = format!(r#"{{"tasks": [{}], "entities": []}}"#, tasks.join(","));
        let batch = validate_output(&raw).unwrap();
        assert_eq!(batch.tasks.len(), MAX_TASKS_PER_LOB);
        assert_eq!(batch.dropped_tasks, 5);
    }

    // -- entities --

    #[test]
    fn entity_coercion_and_defaults() {
        let raw = r#"{"tasks": [], "entities": [
            {"mention": "Sarah", "type": "person", "role": "assignee", "confidence": 0.92, "contextClues": ["call Sarah"]},
            {"mention": "WordPress", "type": "system"}
        ]}"#;
        let batch = validate_output(raw).unwrap();
        assert_eq!(batch.entities.len(), 2);
        assert_eq!(batch.entities[0].role, "assignee");
        assert_eq!(batch.entities[1].role, "mentioned");
        assert!((batch.entities[1].confidence - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn entity_confidence_is_clamped() {
        let raw = r#"{"tasks": [], "entities": [
            {"mention": "Acme", "type": "company", "confidence": 1.7},
            {"mention": "Bob", "type": "person", "confidence": -0.2}
        ]}"#;
        let batch = validate_output(raw).unwrap();
        assert!((batch.entities[0].confidence - 1.0).abs() < f64::EPSILON);
        assert!(batch.entities[1].confidence.abs() < f64::EPSILON);
    }

    #[test]
    fn entity_without_mention_or_type_is_dropped() {
        let raw = r#"{"tasks": [], "entities": [
            {"type": "person"},
            {"mention": "thing", "type": "gadget"},
            {"mention": "Sarah", "type": "person"}
        ]}"#;
        let batch = validate_output(raw).unwrap();
        assert_eq!(batch.entities.len(), 1);
        assert_eq!(batch.dropped_entities, 2);
    }

    #[test]
    fn missing_sections_default_to_empty() {
        let batch = validate_output("{}").unwrap();
        assert!(batch.tasks.is_empty());
        assert!(batch.entities.is_empty());
    }
}
