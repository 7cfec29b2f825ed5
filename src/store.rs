use crate::models::EmailRecord;
use anyhow::Result;
use async_trait::async_trait;

/// Where rule runs read their candidate records from.
#[async_trait]
pub trait EmailStore: Send + Sync {
    /// At most `limit` records, most recently received first.
    async fn get_last_n_records(&self, limit: u32) -> Result<Vec<EmailRecord>>;

    /// Stores a record unless one with the same id already exists.
    async fn insert_record(&self, record: &EmailRecord) -> Result<()>;
}
