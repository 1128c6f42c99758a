use serde::{Deserialize, Serialize};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        pub struct $name(pub i64);
    };
}

id_newtype!(EntryId);
id_newtype!(LogEntryId);

/// Parameters for an executor action, opaque to the orchestration core.
pub type ActionParams = serde_json::Map<String, serde_json::Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sender {
    User,
    Agent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryStatus {
    Final,
    /// Awaiting an execution result.
    Pending,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    pub id: EntryId,
    pub text: String,
    pub sender: Sender,
    pub status: EntryStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl TranscriptEntry {
    pub fn is_pending(&self) -> bool {
        self.status == EntryStatus::Pending
    }
}

/// How the presentation layer should ask for consent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalKind {
    #[default]
    Confirm,
    /// Editable email draft; params may be amended before approval.
    EmailPreview,
    /// Editable calendar event; params may be amended before approval.
    CalendarPreview,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApprovalRequest {
    pub prompt_text: String,
    pub action: String,
    pub params: ActionParams,
    #[serde(default)]
    pub kind: ApprovalKind,
}

impl ApprovalRequest {
    pub fn new(
        prompt_text: impl Into<String>,
        action: impl Into<String>,
        params: ActionParams,
    ) -> Self {
        Self {
            prompt_text: prompt_text.into(),
            action: action.into(),
            params,
            kind: ApprovalKind::Confirm,
        }
    }

    pub fn with_kind(mut self, kind: ApprovalKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn is_editable(&self) -> bool {
        self.kind != ApprovalKind::Confirm
    }
}
