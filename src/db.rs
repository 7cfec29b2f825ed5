use crate::models::EmailRecord;
use crate::store::EmailStore;
use anyhow::Result;
use async_trait::async_trait;
use sqlx::sqlite::{SqlitePool, SqliteRow};
use sqlx::Row;
use tracing::debug;

pub struct Database {
    pool: SqlitePool,
}

impl Database {
    pub async fn new(database_url: &str) -> Result<Self> {
        use sqlx::sqlite::SqliteConnectOptions;
        use std::str::FromStr;

        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);

        let pool = SqlitePool::connect_with(options).await?;
        Ok(Self { pool })
    }

    pub async fn run_migrations(&self) -> Result<()> {
        let schema = include_str!("../schema.sql");
        sqlx::query(schema).execute(&self.pool).await?;
        Ok(())
    }
}

fn record_from_row(row: &SqliteRow) -> EmailRecord {
    let text = |i: usize| row.get::<Option<String>, _>(i).unwrap_or_default();
    EmailRecord {
        id: row.get(0),
        thread_id: text(1),
        sender: text(2),
        subject: text(3),
        snippet: text(4),
        received_datetime: text(5),
    }
}

#[async_trait]
impl EmailStore for Database {
    async fn get_last_n_records(&self, limit: u32) -> Result<Vec<EmailRecord>> {
        let rows = sqlx::query(
            "SELECT id, thread_id, sender, subject, snippet, received_datetime
             FROM emails
             ORDER BY received_datetime DESC
             LIMIT ?",
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(record_from_row).collect())
    }

    async fn insert_record(&self, record: &EmailRecord) -> Result<()> {
        sqlx::query(
            "INSERT OR IGNORE INTO emails (id, thread_id, sender, subject, snippet, received_datetime)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&record.id)
        .bind(&record.thread_id)
        .bind(&record.sender)
        .bind(&record.subject)
        .bind(&record.snippet)
        .bind(&record.received_datetime)
        .execute(&self.pool)
        .await?;

        debug!(email = %record.id, subject = %record.subject, "Stored email");
        Ok(())
    }
}
