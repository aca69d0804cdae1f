//! Proposal uploads. The adapter owns blob storage, MIME sniffing and
//! filename sanitization; the engine records metadata and enforces the
//! domain rules: upload stage only, registered owners only, one proposal
//! per participant, positive size.

use tracing::debug;

use rv_core::entities::Attachment;
use rv_core::errors::{Error, Result};
use rv_core::ids::{AttachmentId, EventId, UserId};
use rv_core::stage::Stage;
use rv_store::{Store, StoreTx};

use crate::VotingService;

/// Metadata of a stored upload, as handed over by the adapter.
#[derive(Clone, Debug)]
pub struct NewAttachment {
    pub id: AttachmentId,
    pub original_name: String,
    pub stored_path: String,
    pub size_bytes: u64,
    pub mime_label: String,
}

impl<S: Store> VotingService<S> {
    /// Record a proposal for `(event, owner)`.
    pub fn upload_attachment(
        &self,
        event_id: &EventId,
        owner: &UserId,
        upload: NewAttachment,
    ) -> Result<Attachment> {
        let handle = self.locks.handle(event_id);
        let _guard = handle.lock();

        let event = self.load_event(event_id)?;
        Self::expect_stage(&event, Stage::AttachmentUpload)?;

        if !self.store.is_participant(event_id, owner)? {
            return Err(Error::NotRegistered {
                user: owner.to_string(),
                event: event_id.to_string(),
            });
        }
        if upload.size_bytes == 0 {
            return Err(Error::InvalidAttachment {
                reason: "size must be positive".into(),
            });
        }
        if upload.original_name.is_empty() {
            return Err(Error::InvalidAttachment {
                reason: "original filename is empty".into(),
            });
        }
        let already = self
            .store
            .attachments_by_event(event_id)?
            .iter()
            .any(|a| &a.owner == owner);
        if already {
            return Err(Error::DuplicateAttachment {
                user: owner.to_string(),
                event: event_id.to_string(),
            });
        }

        let attachment = Attachment {
            id: upload.id,
            event: event_id.clone(),
            owner: owner.clone(),
            original_name: upload.original_name,
            stored_path: upload.stored_path,
            size_bytes: upload.size_bytes,
            mime_label: upload.mime_label,
            vote_count: 0,
        };
        let mut tx = self.store.begin()?;
        tx.create_attachment(attachment.clone())?;
        tx.commit()?;
        debug!(event = %event_id, owner = %owner, attachment = %attachment.id, "proposal uploaded");
        Ok(attachment)
    }

    /// Delete a proposal; owner or an admin, during the upload stage only.
    pub fn delete_attachment(
        &self,
        event_id: &EventId,
        actor: &UserId,
        attachment_id: &AttachmentId,
    ) -> Result<()> {
        let handle = self.locks.handle(event_id);
        let _guard = handle.lock();

        let event = self.load_event(event_id)?;
        Self::expect_stage(&event, Stage::AttachmentUpload)?;

        let attachment = self.store.attachment(attachment_id)?;
        if &attachment.event != event_id {
            return Err(Error::CrossEventAttachment {
                attachment: attachment_id.to_string(),
                event: event_id.to_string(),
            });
        }
        if &attachment.owner != actor {
            let actor = self.store.user(actor)?;
            Self::require_admin(&actor, &event)?;
        }

        let mut tx = self.store.begin()?;
        tx.delete_attachment(attachment_id)?;
        tx.commit()?;
        Ok(())
    }
}
