use shared::domain::EntryId;
use thiserror::Error;

/// A programming error in the caller, never shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvariantViolation {
    #[error("an approval request is already outstanding for action {outstanding_action}")]
    ApprovalAlreadyOpen { outstanding_action: String },
    #[error("a pending entry {existing:?} already exists")]
    PendingEntryExists { existing: EntryId },
    #[error("transcript entry {0:?} not found")]
    UnknownEntry(EntryId),
    #[error("transcript entry {0:?} is not pending")]
    EntryNotPending(EntryId),
}
