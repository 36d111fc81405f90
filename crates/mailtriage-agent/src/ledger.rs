// SPDX-FileCopyrightText: 2026 Mailtriage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Disposition labels as the agent's persistent record of handled messages.
//!
//! A message carrying any disposition label is never selected again, so the
//! mailbox itself is the only state that survives restarts.

use std::collections::HashMap;
use std::sync::Arc;

use mailtriage_config::model::LabelsConfig;
use mailtriage_core::traits::MailboxAdapter;
use mailtriage_core::types::{Disposition, LabelChange, LabelId, MessageId, UNREAD_LABEL};
use mailtriage_core::TriageError;
use tracing::info;

/// Resolved disposition labels.
pub struct DispositionLedger {
    mailbox: Arc<dyn MailboxAdapter>,
    names: LabelsConfig,
    ids: HashMap<Disposition, LabelId>,
    inbox_only: bool,
}

impl DispositionLedger {
    /// Maps each disposition to a provider label id, creating missing labels.
    ///
    /// Running it again against the same mailbox returns the same ids.
    pub async fn resolve(
        mailbox: Arc<dyn MailboxAdapter>,
        names: &LabelsConfig,
        inbox_only: bool,
    ) -> Result<Self, TriageError> {
        let existing = mailbox.list_labels().await?;
        let mut ids = HashMap::new();

        for disposition in Disposition::ALL {
            let name = names.name_for(disposition);
            let id = match existing.iter().find(|l| l.name == name) {
                Some(label) => label.id.clone(),
                None => {
                    let id = mailbox.create_label(name).await?;
                    info!(label = name, id = %id, "created disposition label");
                    id
                }
            };
            ids.insert(disposition, id);
        }

        Ok(Self {
            mailbox,
            names: names.clone(),
            ids,
            inbox_only,
        })
    }

    /// Provider label id for a disposition.
    pub fn label_id(&self, disposition: Disposition) -> Option<&LabelId> {
        self.ids.get(&disposition)
    }

    /// Search query selecting unread messages without any disposition label.
    pub fn exclusion_filter(&self) -> String {
        let mut query = String::from("is:unread");
        if self.inbox_only {
            query.push_str(" in:inbox");
        }
        for disposition in Disposition::ALL {
            query.push_str(&format!(
                " -label:\"{}\"",
                self.names.name_for(disposition)
            ));
        }
        query
    }

    /// Marks a message read and applies exactly one disposition label.
    pub async fn commit(
        &self,
        message_id: &MessageId,
        disposition: Disposition,
    ) -> Result<(), TriageError> {
        let label = self.label_id(disposition).cloned().ok_or_else(|| {
            TriageError::Internal(format!("no label resolved for {disposition}"))
        })?;
        self.mailbox
            .modify_labels(
                message_id,
                LabelChange {
                    add: vec![label],
                    remove: vec![LabelId(UNREAD_LABEL.to_string())],
                },
            )
            .await
    }
}
