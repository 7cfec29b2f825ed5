use crate::dates;
use crate::error::GatewayError;
use crate::gateway::MailboxGateway;
use crate::models;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use google_gmail1::Gmail;
use google_gmail1::api::{Label, ModifyMessageRequest};
use hyper::client::HttpConnector;
use hyper_rustls::HttpsConnector;
use tracing::debug;

#[derive(Clone)]
pub struct GmailClient {
    hub: Gmail<HttpsConnector<HttpConnector>>,
}

impl GmailClient {
    pub fn new(hub: Gmail<HttpsConnector<HttpConnector>>) -> Self {
        Self { hub }
    }

    /// Builds a hub that authorises every request with an already-issued access token.
    pub fn with_access_token(token: String) -> Result<Self> {
        let connector = hyper_rustls::HttpsConnectorBuilder::new()
            .with_native_roots()
            .context("Failed to load native roots")?
            .https_only()
            .enable_http1()
            .build();
        let hub = Gmail::new(hyper::Client::builder().build(connector), token);
        Ok(Self::new(hub))
    }

    pub async fn list_messages(&self, label_ids: &[String], max_results: u32) -> Result<Vec<String>> {
        let mut req = self
            .hub
            .users()
            .messages_list("me")
            .max_results(max_results);

        for label_id in label_ids {
            req = req.add_label_ids(label_id);
        }

        let (_, message_list) = req.doit().await.context("Failed to list messages")?;

        let ids = message_list
            .messages
            .unwrap_or_default()
            .into_iter()
            .filter_map(|m| m.id)
            .collect();

        Ok(ids)
    }

    /// Fetches the header metadata the rules read and flattens it into a record.
    pub async fn get_record(&self, id: &str) -> Result<models::EmailRecord> {
        let (_, msg) = self
            .hub
            .users()
            .messages_get("me", id)
            .format("metadata")
            .add_metadata_headers("From")
            .add_metadata_headers("Subject")
            .add_metadata_headers("Date")
            .doit()
            .await
            .context(format!("Failed to get message {}", id))?;

        let mut from = None;
        let mut subject = None;
        let mut date = None;

        if let Some(headers) = msg.payload.as_ref().and_then(|p| p.headers.as_ref()) {
            for header in headers {
                match header.name.as_deref() {
                    Some("From") => from = header.value.clone(),
                    Some("Subject") => subject = header.value.clone(),
                    Some("Date") => date = header.value.clone(),
                    _ => {}
                }
            }
        }

        Ok(models::EmailRecord {
            id: msg.id.unwrap_or_default(),
            thread_id: msg.thread_id.unwrap_or_default(),
            sender: from.unwrap_or_default(),
            subject: subject.unwrap_or_default(),
            snippet: msg.snippet.unwrap_or_default(),
            received_datetime: dates::header_to_utc(&date.unwrap_or_default(), Utc::now()),
        })
    }
}

#[async_trait]
impl MailboxGateway for GmailClient {
    async fn list_labels(&self) -> Result<Vec<models::Label>, GatewayError> {
        let (_, label_list) = self
            .hub
            .users()
            .labels_list("me")
            .doit()
            .await
            .map_err(|e| GatewayError::request("list labels", e))?;

        let labels = label_list
            .labels
            .unwrap_or_default()
            .into_iter()
            .map(|l| models::Label {
                id: l.id.unwrap_or_default(),
                name: l.name.unwrap_or_default(),
            })
            .collect();

        Ok(labels)
    }

    async fn create_label(&self, name: &str) -> Result<models::Label, GatewayError> {
        let req = Label {
            name: Some(name.to_string()),
            label_list_visibility: Some("labelShow".to_string()),
            message_list_visibility: Some("show".to_string()),
            ..Default::default()
        };
        let (_, label) = self
            .hub
            .users()
            .labels_create(req, "me")
            .doit()
            .await
            .map_err(|e| GatewayError::request("create label", e))?;

        let id = label
            .id
            .ok_or_else(|| GatewayError::MissingLabelId(name.to_string()))?;
        Ok(models::Label {
            id,
            name: label.name.unwrap_or_else(|| name.to_string()),
        })
    }

    async fn modify_message(
        &self,
        id: &str,
        add_label_ids: &[String],
        remove_label_ids: &[String],
    ) -> Result<(), GatewayError> {
        debug!(email = %id, add = ?add_label_ids, remove = ?remove_label_ids, "Modifying message");
        let req = ModifyMessageRequest {
            add_label_ids: Some(add_label_ids.to_vec()),
            remove_label_ids: Some(remove_label_ids.to_vec()),
            ..Default::default()
        };
        self.hub
            .users()
            .messages_modify(req, "me", id)
            .doit()
            .await
            .map_err(|e| GatewayError::request("modify message", e))?;
        Ok(())
    }
}
