//! Waiting-queue entries and their read-time ranking.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use super::domain::RecordId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueuePriority {
    Urgent,
    Normal,
}

impl QueuePriority {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Urgent => "Urgente",
            Self::Normal => "Normal",
        }
    }

    const fn tier(self) -> u8 {
        match self {
            Self::Urgent => 0,
            Self::Normal => 1,
        }
    }
}

/// Lifecycle of a queue entry. Completion removes the entry instead of adding a state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueueStatus {
    Waiting,
    Notified,
}

impl QueueStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Waiting => "Aguardando",
            Self::Notified => "Notificado",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueEntry {
    pub id: RecordId,
    pub patient_id: RecordId,
    pub professional_id: RecordId,
    pub priority: QueuePriority,
    #[serde(default)]
    pub notification_channel: Option<String>,
    pub status: QueueStatus,
    pub entered_at: NaiveDateTime,
}

impl QueueEntry {
    /// Move the entry to `target`, returning whether anything changed.
    pub fn transition(&mut self, target: QueueStatus) -> Result<bool, QueueTransitionError> {
        match (self.status, target) {
            (current, target) if current == target => Ok(false),
            (QueueStatus::Waiting, QueueStatus::Notified) => {
                self.status = QueueStatus::Notified;
                Ok(true)
            }
            (from, to) => Err(QueueTransitionError { from, to }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("queue entry cannot move from {} to {}", .from.label(), .to.label())]
pub struct QueueTransitionError {
    pub from: QueueStatus,
    pub to: QueueStatus,
}

/// Urgent before normal, then first come first served.
pub fn compare_entries(left: &QueueEntry, right: &QueueEntry) -> Ordering {
    left.priority
        .tier()
        .cmp(&right.priority.tier())
        .then_with(|| left.entered_at.cmp(&right.entered_at))
}

/// Return the entries in service order without touching the input.
///
/// The sort is stable, so entries with equal priority and arrival keep their input order.
pub fn rank_queue(entries: &[QueueEntry]) -> Vec<QueueEntry> {
    let mut ranked = entries.to_vec();
    ranked.sort_by(compare_entries);
    ranked
}
