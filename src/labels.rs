use crate::error::GatewayError;
use crate::gateway::{INBOX, MailboxGateway};
use std::collections::HashMap;
use tracing::{error, info, warn};

/// Where a `move_message` should put a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveTarget {
    /// `None` when no label could be resolved; the move degrades to archiving.
    pub label_id: Option<String>,
    pub remove_inbox: bool,
}

/// Lower-cased label name -> remote label id, owned by a single engine run.
#[derive(Debug, Default)]
pub struct LabelCache {
    labels: HashMap<String, String>,
    loaded: bool,
}

impl LabelCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.labels.get(&name.to_lowercase()).map(String::as_str)
    }

    /// Lists remote labels once per run. A failed listing is not retried.
    pub async fn warm(&mut self, gateway: Option<&dyn MailboxGateway>) {
        let Some(gateway) = gateway else {
            return;
        };
        if self.loaded {
            return;
        }
        self.loaded = true;

        match gateway.list_labels().await {
            Ok(labels) => {
                for label in labels {
                    let name = label.name.trim();
                    if name.is_empty() || label.id.is_empty() {
                        continue;
                    }
                    self.labels.insert(name.to_lowercase(), label.id);
                }
                info!(count = self.labels.len(), "Preloaded labels into cache");
            }
            Err(e) => warn!(error = %e, "Failed to preload labels"),
        }
    }

    pub async fn resolve_move_target(
        &mut self,
        gateway: &dyn MailboxGateway,
        mailbox: &str,
    ) -> MoveTarget {
        if mailbox.eq_ignore_ascii_case("inbox") {
            return MoveTarget {
                label_id: Some(INBOX.to_string()),
                remove_inbox: false,
            };
        }

        if let Some(id) = self.get(mailbox) {
            return MoveTarget {
                label_id: Some(id.to_string()),
                remove_inbox: true,
            };
        }

        let created = gateway.create_label(mailbox).await.and_then(|label| {
            if label.id.is_empty() {
                Err(GatewayError::MissingLabelId(mailbox.to_string()))
            } else {
                Ok(label)
            }
        });

        match created {
            Ok(label) => {
                info!(name = %mailbox, id = %label.id, "Created label");
                self.labels.insert(mailbox.to_lowercase(), label.id.clone());
                MoveTarget {
                    label_id: Some(label.id),
                    remove_inbox: true,
                }
            }
            Err(e) => {
                error!(name = %mailbox, error = %e, "Failed to create label");
                MoveTarget {
                    label_id: None,
                    remove_inbox: true,
                }
            }
        }
    }
}
