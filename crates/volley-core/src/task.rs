//! Parsed tasks: the discrete actionable units extracted from a lob.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Classification of a parsed task.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskClassification {
    /// Actionable request requiring someone else's work.
    Task,
    /// The sender can resolve it themselves; carries concrete steps.
    SelfService,
    /// A time-based prompt back to the sender.
    Reminder,
    /// No actionable request, only expressed frustration or context.
    Venting,
}

impl TaskClassification {
    /// Whether this classification carries `self_service_steps`.
    #[must_use]
    pub fn expects_steps(self) -> bool {
        self == Self::SelfService
    }

    /// Whether this classification carries a `venting_response`.
    #[must_use]
    pub fn expects_venting_response(self) -> bool {
        self == Self::Venting
    }
}

impl fmt::Display for TaskClassification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Task => write!(f, "task"),
            Self::SelfService => write!(f, "self_service"),
            Self::Reminder => write!(f, "reminder"),
            Self::Venting => write!(f, "venting"),
        }
    }
}

/// Urgency of a parsed task.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Urgency {
    /// No particular time pressure.
    #[default]
    Normal,
    /// Needs attention soon.
    Urgent,
    /// Tied to an explicit deadline.
    Deadline,
}

impl fmt::Display for Urgency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Normal => write!(f, "normal"),
            Self::Urgent => write!(f, "urgent"),
            Self::Deadline => write!(f, "deadline"),
        }
    }
}

/// One discrete actionable unit extracted from a lob.
///
/// `position` values are unique and contiguous (1-indexed) within a single
/// parse result. Exactly one of `self_service_steps` / `venting_response`
/// may be populated, and only when it matches `classification` — the
/// validator enforces this before a task ever leaves the parser.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedTask {
    /// Order within the lob, 1-indexed.
    pub position: u32,
    /// Verbatim source substring the task was extracted from.
    pub raw_chunk: String,
    /// Imperative, action-verb-led summary.
    pub summary: String,
    /// Task classification.
    pub classification: TaskClassification,
    /// Named system the task concerns (e.g. "WordPress"), if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    /// Urgency level.
    #[serde(default)]
    pub urgency: Urgency,
    /// Free-form deadline text, not yet normalized to a date.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline: Option<String>,
    /// Suggested assignee mention, if the lob named one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,
    /// Entity mentions related to this task. Linkage is by text; resolution
    /// to store IDs happens later.
    #[serde(default)]
    pub related_entities: Vec<String>,
    /// Clarifying questions for underspecified tasks.
    #[serde(default)]
    pub missing_info: Vec<String>,
    /// Concrete steps — present only when classification is `self_service`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub self_service_steps: Option<Vec<String>>,
    /// Acknowledgment string — present only when classification is `venting`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub venting_response: Option<String>,
}

impl ParsedTask {
    /// Whether the steps/venting exclusivity invariant holds for this task.
    #[must_use]
    pub fn exclusivity_holds(&self) -> bool {
        match self.classification {
            TaskClassification::SelfService => {
                self.self_service_steps.is_some() && self.venting_response.is_none()
            }
            TaskClassification::Venting => {
                self.venting_response.is_some() && self.self_service_steps.is_none()
            }
            TaskClassification::Task | TaskClassification::Reminder => {
                self.self_service_steps.is_none() && self.venting_response.is_none()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_task(classification: TaskClassification) -> ParsedTask {
        ParsedTask {
            position: 1,
            raw_chunk: "fix the login bug".into(),
            summary: "Fix the login bug".into(),
            classification,
            system: None,
            urgency: Urgency::Normal,
            deadline: None,
            assignee: None,
            related_entities: vec![],
            missing_info: vec![],
            self_service_steps: None,
            venting_response: None,
        }
    }

    #[test]
    fn classification_serde_snake_case() {
        let json = serde_json::to_string(&TaskClassification::SelfService).unwrap();
        assert_eq!(json, "\"self_service\"");
        let back: TaskClassification = serde_json::from_str("\"venting\"").unwrap();
        assert_eq!(back, TaskClassification::Venting);
    }

    #[test]
    fn urgency_defaults_to_normal() {
        let task: ParsedTask = serde_json::from_str(
            r#"{"position": 1, "rawChunk": "x", "summary": "Do x", "classification": "task"}"#,
        )
        .unwrap();
        assert_eq!(task.urgency, Urgency::Normal);
        assert!(task.missing_info.is_empty());
        assert!(task.related_entities.is_empty());
    }

    #[test]
    fn exclusivity_plain_task() {
        let task = base_task(TaskClassification::Task);
        assert!(task.exclusivity_holds());

        let mut bad = base_task(TaskClassification::Task);
        bad.venting_response = Some("ack".into());
        assert!(!bad.exclusivity_holds());
    }

    #[test]
    fn exclusivity_self_service() {
        let mut task = base_task(TaskClassification::SelfService);
        assert!(!task.exclusivity_holds());
        task.self_service_steps = Some(vec!["step 1".into(), "step 2".into()]);
        assert!(task.exclusivity_holds());
        task.venting_response = Some("also this".into());
        assert!(!task.exclusivity_holds());
    }

    #[test]
    fn exclusivity_venting() {
        let mut task = base_task(TaskClassification::Venting);
        assert!(!task.exclusivity_holds());
        task.venting_response = Some("That sounds frustrating".into());
        assert!(task.exclusivity_holds());
    }

    #[test]
    fn serde_skips_absent_optionals() {
        let task = base_task(TaskClassification::Reminder);
        let json = serde_json::to_string(&task).unwrap();
        assert!(!json.contains("selfServiceSteps"));
        assert!(!json.contains("ventingResponse"));
        assert!(!json.contains("deadline"));
        assert!(json.contains("rawChunk"));
    }

    #[test]
    fn expects_helpers() {
        assert!(TaskClassification::SelfService.expects_steps());
        assert!(!TaskClassification::Task.expects_steps());
        assert!(TaskClassification::Venting.expects_venting_response());
        assert!(!TaskClassification::Reminder.expects_venting_response());
    }
}
