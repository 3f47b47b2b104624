//! The raw lob: one unit of unstructured user input.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{LobId, SenderId, WorkspaceId};

/// One raw chunk of user input — a voice transcript or typed text —
/// potentially containing multiple unrelated requests.
///
/// Created at submission and immutable afterwards. Downstream records
/// reference the lob by ID but never mutate it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawLob {
    /// Unique lob identifier.
    pub id: LobId,
    /// The raw text. Non-empty after trim (enforced at the pipeline boundary).
    pub text: String,
    /// Who submitted the lob.
    pub sender_id: SenderId,
    /// Workspace the lob belongs to.
    pub workspace_id: WorkspaceId,
    /// Submission timestamp (UTC).
    pub submitted_at: DateTime<Utc>,
}

impl RawLob {
    /// Create a new lob with a fresh ID and the current timestamp.
    #[must_use]
    pub fn new(
        text: impl Into<String>,
        sender_id: impl Into<SenderId>,
        workspace_id: impl Into<WorkspaceId>,
    ) -> Self {
        Self {
            id: LobId::new(),
            text: text.into(),
            sender_id: sender_id.into(),
            workspace_id: workspace_id.into(),
            submitted_at: Utc::now(),
        }
    }

    /// Whether the lob text is empty or whitespace-only.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}
