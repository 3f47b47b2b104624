//! Instruction payload for the segmentation/classification/extraction call.
//!
//! The fixed directive block encodes the segmentation contract; an optional
//! serialized [`CompanyContext`] is appended so the model can ground entity
//! mentions against known people and systems.

use serde::{Deserialize, Serialize};

/// Fixed instruction block for the completion call.
///
/// The rules here are the informational contract of the segmentation stage;
/// they are verified through testable properties on the validated output,
/// not re-derived mechanically.
pub const SEGMENTATION_PROMPT: &str = r#"You split one chunk of free-form user input into discrete work items and extract entity mentions. Respond with a single JSON object and nothing else.

Output shape:
{
  "tasks": [{
    "position": 1,
    "rawChunk": "verbatim source substring",
    "summary": "imperative, action-verb-led summary",
    "classification": "task" | "self_service" | "reminder" | "venting",
    "system": "named system if any, else omit",
    "urgency": "normal" | "urgent" | "deadline",
    "deadline": "free-form deadline text if any, else omit",
    "assignee": "named assignee if any, else omit",
    "relatedEntities": ["mention", ...],
    "missingInfo": ["clarifying question", ...],
    "selfServiceSteps": ["step", ...],
    "ventingResponse": "acknowledgment"
  }],
  "entities": [{
    "mention": "verbatim mention",
    "type": "person" | "company" | "system" | "account" | "date",
    "role": "assignee" | "mentioned" | "deadline" | ...,
    "confidence": 0.0-1.0,
    "contextClues": ["supporting phrase", ...]
  }]
}

Segmentation rules:
- One input may contain several unrelated requests. Emit one task per distinct topic; never force-merge distinct topics into one task.
- Number tasks by their order in the input, starting at 1.
- Every summary starts with an imperative verb.
- Populate missingInfo liberally for underspecified tasks.
- classification "self_service" means the sender can fix it alone: include 2-4 concrete selfServiceSteps and no ventingResponse.
- classification "venting" means no actionable request is present: include a short empathetic ventingResponse, no selfServiceSteps, and at least one missingInfo question so the item can become actionable later.
- classification "task" and "reminder" carry neither selfServiceSteps nor ventingResponse.
- Extract every person, company, system, account, and date mention into entities, with confidence reflecting how certain you are it names a real entity."#;

/// A teammate entry in the company context.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamMember {
    /// Display name.
    pub name: String,
    /// Role or title, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

/// Optional structured context appended to the instruction payload.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyContext {
    /// Company or workspace name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
    /// Known team members.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub team_members: Vec<TeamMember>,
    /// Known system names.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub systems: Vec<String>,
}

impl CompanyContext {
    /// Whether there is anything worth appending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.company_name.is_none() && self.team_members.is_empty() && self.systems.is_empty()
    }
}

/// Build the full system prompt: fixed directives plus serialized context.
#[must_use]
pub fn build_system_prompt(context: Option<&CompanyContext>) -> String {
    match context {
        Some(ctx) if !ctx.is_empty() => {
            // Serialization failure is unreachable for these plain structs;
            // fall back to the bare prompt rather than poisoning the call.
            serde_json::to_string_pretty(ctx).map_or_else(
                |_| SEGMENTATION_PROMPT.to_string(),
                |serialized| {
                    format!("{SEGMENTATION_PROMPT}\n\nKnown company context:\n{serialized}")
                },
            )
        }
        _ => SEGMENTATION_PROMPT.to_string(),
    }
}
