use crate::gmail::GmailClient;
use crate::models::EmailRecord;
use crate::store::EmailStore;
use anyhow::Result;
use async_trait::async_trait;
use tracing::info;

/// Remote side of ingestion: which messages carry the labels, and their metadata.
#[async_trait]
pub trait MessageSource: Send + Sync {
    async fn list_message_ids(&self, label_ids: &[String], max_results: u32) -> Result<Vec<String>>;

    async fn fetch_record(&self, id: &str) -> Result<EmailRecord>;
}

#[async_trait]
impl MessageSource for GmailClient {
    async fn list_message_ids(&self, label_ids: &[String], max_results: u32) -> Result<Vec<String>> {
        self.list_messages(label_ids, max_results).await
    }

    async fn fetch_record(&self, id: &str) -> Result<EmailRecord> {
        self.get_record(id).await
    }
}

/// Copies the newest messages under `label_ids` into the store. Returns how many were written.
pub async fn fetch_and_store(
    source: &dyn MessageSource,
    store: &dyn EmailStore,
    max_results: u32,
    label_ids: &[String],
) -> Result<usize> {
    info!(max_results, labels = ?label_ids, "Fetching messages");
    let ids = source.list_message_ids(label_ids, max_results).await?;
    info!(count = ids.len(), "Found messages");

    let mut stored = 0;
    for id in &ids {
        let record = source.fetch_record(id).await?;
        store.insert_record(&record).await?;
        stored += 1;
    }

    info!(stored, "Stored messages");
    Ok(stored)
}
