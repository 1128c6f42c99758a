use shared::domain::{EntryId, EntryStatus, Sender, TranscriptEntry};

use crate::error::InvariantViolation;

#[derive(Debug, Default, Clone)]
pub struct TranscriptStore {
    entries: Vec<TranscriptEntry>,
    next_id: i64,
}

impl TranscriptStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[TranscriptEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: EntryId) -> Option<&TranscriptEntry> {
        self.entries.iter().find(|entry| entry.id == id)
    }

    pub fn pending_entry(&self) -> Option<&TranscriptEntry> {
        self.entries.iter().find(|entry| entry.is_pending())
    }

    pub fn push_user(&mut self, text: impl Into<String>) -> EntryId {
        self.push(text.into(), Sender::User, EntryStatus::Final, None)
    }

    pub fn push_agent(&mut self, text: impl Into<String>) -> EntryId {
        self.push(text.into(), Sender::Agent, EntryStatus::Final, None)
    }

    /// Appends the single pending agent entry. Refuses while another one is unresolved.
    pub fn push_pending(&mut self, text: impl Into<String>) -> Result<EntryId, InvariantViolation> {
        if let Some(existing) = self.pending_entry() {
            return Err(InvariantViolation::PendingEntryExists {
                existing: existing.id,
            });
        }
        Ok(self.push(text.into(), Sender::Agent, EntryStatus::Pending, None))
    }

    /// Replaces text and details of the pending entry `id` and marks it final.
    pub fn resolve(
        &mut self,
        id: EntryId,
        text: impl Into<String>,
        details: Option<serde_json::Value>,
    ) -> Result<&TranscriptEntry, InvariantViolation> {
        let entry = self
            .entries
            .iter_mut()
            .find(|entry| entry.id == id)
            .ok_or(InvariantViolation::UnknownEntry(id))?;
        if !entry.is_pending() {
            return Err(InvariantViolation::EntryNotPending(id));
        }
        entry.text = text.into();
        entry.details = details;
        entry.status = EntryStatus::Final;
        Ok(entry)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    fn push(
        &mut self,
        text: String,
        sender: Sender,
        status: EntryStatus,
        details: Option<serde_json::Value>,
    ) -> EntryId {
        self.next_id += 1;
        let id = EntryId(self.next_id);
        self.entries.push(TranscriptEntry {
            id,
            text,
            sender,
            status,
            details,
        });
        id
    }
}

#[cfg(test)]
#[path = "tests/transcript_tests.rs"]
mod tests;
