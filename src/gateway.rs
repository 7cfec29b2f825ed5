use crate::error::GatewayError;
use crate::models::Label;
use async_trait::async_trait;

pub const INBOX: &str = "INBOX";
pub const UNREAD: &str = "UNREAD";

/// The remote mailbox operations the rule engine needs. Every call reports a typed outcome.
#[async_trait]
pub trait MailboxGateway: Send + Sync {
    async fn list_labels(&self) -> Result<Vec<Label>, GatewayError>;

    /// Creates a user label visible in both the label list and the message list.
    async fn create_label(&self, name: &str) -> Result<Label, GatewayError>;

    async fn modify_message(
        &self,
        id: &str,
        add_label_ids: &[String],
        remove_label_ids: &[String],
    ) -> Result<(), GatewayError>;
}
