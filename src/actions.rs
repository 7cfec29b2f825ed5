use crate::gateway::{INBOX, MailboxGateway, UNREAD};
use crate::labels::LabelCache;
use crate::models::EmailRecord;
use crate::rules::{Action, ActionType};
use tracing::{error, info, warn};

/// Applies rule actions to matched records. Without a gateway every action is only logged.
///
/// Each call returns how much it contributes to the run total: 1 when the action was
/// applied, logged in dry-run mode, or already satisfied; 0 when the remote call failed
/// or the action is unknown. Failures never propagate.
pub struct ActionExecutor<'a> {
    gateway: Option<&'a dyn MailboxGateway>,
}

impl<'a> ActionExecutor<'a> {
    pub fn new(gateway: Option<&'a dyn MailboxGateway>) -> Self {
        Self { gateway }
    }

    pub async fn execute(
        &self,
        labels: &mut LabelCache,
        record: &EmailRecord,
        action: &Action,
    ) -> usize {
        match action.action_type {
            ActionType::MarkAsRead => self.mark(record, true).await,
            ActionType::MarkAsUnread => self.mark(record, false).await,
            ActionType::MoveMessage => {
                self.move_message(labels, record, action.mailbox_or_inbox())
                    .await
            }
            ActionType::Unknown => {
                warn!(email = %record.id, ?action, "Unknown action");
                0
            }
        }
    }

    async fn mark(&self, record: &EmailRecord, read: bool) -> usize {
        let name = if read { "mark_as_read" } else { "mark_as_unread" };

        let Some(gateway) = self.gateway else {
            info!(email = %record.id, "[ACTION] {} (LOG ONLY)", name);
            return 1;
        };

        let unread = vec![UNREAD.to_string()];
        let (add, remove) = if read {
            (Vec::new(), unread)
        } else {
            (unread, Vec::new())
        };

        match gateway.modify_message(&record.id, &add, &remove).await {
            Ok(()) => {
                info!(email = %record.id, "[ACTION] {} (APPLIED)", name);
                1
            }
            Err(e) => {
                error!(email = %record.id, error = %e, "[ACTION] {} FAILED", name);
                0
            }
        }
    }

    async fn move_message(
        &self,
        labels: &mut LabelCache,
        record: &EmailRecord,
        mailbox: &str,
    ) -> usize {
        let Some(gateway) = self.gateway else {
            info!(email = %record.id, %mailbox, "[ACTION] move_message (LOG ONLY)");
            return 1;
        };

        let target = labels.resolve_move_target(gateway, mailbox).await;

        let mut add = Vec::new();
        let mut remove = Vec::new();
        if let Some(label_id) = target.label_id {
            add.push(label_id);
        }
        if target.remove_inbox {
            remove.push(INBOX.to_string());
        }

        self.relabel(gateway, record, mailbox, add, remove).await
    }

    async fn relabel(
        &self,
        gateway: &dyn MailboxGateway,
        record: &EmailRecord,
        mailbox: &str,
        add: Vec<String>,
        remove: Vec<String>,
    ) -> usize {
        if add.is_empty() && remove.is_empty() {
            info!(email = %record.id, "[ACTION] move_message already in desired state");
            return 1;
        }

        match gateway.modify_message(&record.id, &add, &remove).await {
            Ok(()) => {
                info!(
                    email = %record.id,
                    %mailbox,
                    ?add,
                    ?remove,
                    "[ACTION] move_message (APPLIED)"
                );
                1
            }
            Err(e) => {
                error!(
                    email = %record.id,
                    %mailbox,
                    error = %e,
                    "[ACTION] move_message FAILED"
                );
                0
            }
        }
    }
}
