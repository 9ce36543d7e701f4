use tracing::info;

use super::{remove_or_missing, ClinicError, ClinicService, PartyView};
use crate::clinic::domain::{Notification, QueueInput, RecordId};
use crate::clinic::queue::{rank_queue, QueueEntry, QueueStatus};

const QUEUE_NOTIFICATION_KIND: &str = "fila";

impl ClinicService {
    pub fn enqueue(&self, input: QueueInput) -> Result<QueueEntry, ClinicError> {
        let _links = self.store.link_guard()?;
        self.ensure_parties(input.patient_id, input.professional_id)?;

        let entry = self.store.queue.insert(QueueEntry {
            id: 0,
            patient_id: input.patient_id,
            professional_id: input.professional_id,
            priority: input.priority,
            notification_channel: input
                .notification_channel
                .map(|channel| channel.trim().to_string())
                .filter(|channel| !channel.is_empty()),
            status: QueueStatus::Waiting,
            entered_at: self.clock.now(),
        })?;

        info!(
            entry_id = entry.id,
            priority = entry.priority.label(),
            "patient joined waiting queue"
        );
        Ok(entry)
    }

    /// Entries in service order, joined with patient and professional names.
    pub fn waiting_queue(&self) -> Result<Vec<PartyView<QueueEntry>>, ClinicError> {
        let directory = self.directory()?;
        let entries = self.store.queue.list()?;
        Ok(rank_queue(&entries)
            .into_iter()
            .map(|entry| {
                let (patient_id, professional_id) = (entry.patient_id, entry.professional_id);
                directory.view(entry, Some(patient_id), Some(professional_id))
            })
            .collect())
    }

    /// Apply a status change; notifying a waiting patient also posts a dashboard notification.
    ///
    /// Returns whether the status changed.
    pub fn update_queue_status(
        &self,
        id: RecordId,
        target: QueueStatus,
    ) -> Result<bool, ClinicError> {
        let mut entry = self
            .store
            .queue
            .fetch(id)?
            .ok_or_else(|| ClinicError::NotFound("Entrada da fila não encontrada".to_string()))?;

        if !entry.transition(target)? {
            return Ok(false);
        }
        self.store.queue.update(entry.clone())?;

        if entry.status == QueueStatus::Notified {
            let patient = self
                .directory()?
                .patient_name(entry.patient_id)
                .unwrap_or_else(|| format!("#{}", entry.patient_id));
            let message = match &entry.notification_channel {
                Some(channel) => format!("Paciente {patient} notificado via {channel}"),
                None => format!("Paciente {patient} notificado"),
            };
            self.store.notifications.insert(Notification {
                id: 0,
                kind: QUEUE_NOTIFICATION_KIND.to_string(),
                message,
                created_at: self.clock.now(),
            })?;
        }

        info!(entry_id = id, status = entry.status.label(), "queue status changed");
        Ok(true)
    }

    /// Completion removes the entry.
    pub fn complete_queue_entry(&self, id: RecordId) -> Result<(), ClinicError> {
        remove_or_missing(&*self.store.queue, id, "Entrada da fila não encontrada")?;
        info!(entry_id = id, "patient served and removed from queue");
        Ok(())
    }
}
