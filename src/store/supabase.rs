//! Durable store backed by Supabase's PostgREST endpoint.
//!
//! Every mutation asks for `Prefer: return=representation` so the stored
//! row (server-assigned id and `created_at`) comes back in the response.
//! Transport failures and non-2xx statuses surface as
//! [`Error::Upstream`]; there is no retry or backoff.

use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use super::{EntryStore, NewSubmission, Submission, SubmissionPatch};
use crate::error::{Error, Result};

const TABLE: &str = "submissions";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

pub struct SupabaseStore {
    client: Client,
    endpoint: String,
    api_key: String,
}

/// Row shape as PostgREST returns it (snake_case columns).
#[derive(Debug, Deserialize)]
struct Row {
    id: i64,
    name: String,
    email: String,
    #[serde(default)]
    message: String,
    created_at: DateTime<Utc>,
    #[serde(default)]
    updated_at: Option<DateTime<Utc>>,
}

impl From<Row> for Submission {
    fn from(row: Row) -> Self {
        Submission {
            id: row.id,
            name: row.name,
            email: row.email,
            message: row.message,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Build the PATCH body: only supplied fields, plus `updated_at`.
fn patch_body(patch: &SubmissionPatch) -> Value {
    let mut body = serde_json::Map::new();
    if let Some(name) = &patch.name {
        body.insert("name".into(), json!(name));
    }
    if let Some(email) = &patch.email {
        body.insert("email".into(), json!(email));
    }
    if let Some(message) = &patch.message {
        body.insert("message".into(), json!(message));
    }
    body.insert("updated_at".into(), json!(Utc::now()));
    Value::Object(body)
}

impl SupabaseStore {
    pub fn new(base_url: &str, api_key: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: format!("{}/rest/v1/{}", base_url.trim_end_matches('/'), TABLE),
            api_key: api_key.to_string(),
        })
    }

    fn request(&self, method: reqwest::Method, query: &[(&str, String)]) -> reqwest::RequestBuilder {
        self.client
            .request(method, &self.endpoint)
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .query(query)
    }

    async fn rows(&self, response: reqwest::Response) -> Result<Vec<Row>> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            debug!("supabase error body: {}", body);
            return Err(Error::Upstream(format!("supabase returned {status}")));
        }
        Ok(response.json().await?)
    }
}

#[async_trait::async_trait]
impl EntryStore for SupabaseStore {
    async fn create(&self, fields: NewSubmission) -> Result<Submission> {
        let response = self
            .request(reqwest::Method::POST, &[])
            .header("Prefer", "return=representation")
            .json(&fields)
            .send()
            .await?;
        let mut rows = self.rows(response).await?;
        rows.pop()
            .map(Submission::from)
            .ok_or_else(|| Error::Upstream("create returned no representation".to_string()))
    }

    async fn list(&self, limit: Option<usize>) -> Result<Vec<Submission>> {
        let mut query = vec![
            ("select", "*".to_string()),
            ("order", "created_at.desc".to_string()),
        ];
        if let Some(limit) = limit {
            query.push(("limit", limit.to_string()));
        }
        let response = self.request(reqwest::Method::GET, &query).send().await?;
        let rows = self.rows(response).await?;
        Ok(rows.into_iter().map(Submission::from).collect())
    }

    async fn update(&self, id: i64, patch: SubmissionPatch) -> Result<Submission> {
        let response = self
            .request(reqwest::Method::PATCH, &[("id", format!("eq.{id}"))])
            .header("Prefer", "return=representation")
            .json(&patch_body(&patch))
            .send()
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(Error::NotFound(format!("entry {id}")));
        }
        let mut rows = self.rows(response).await?;
        rows.pop()
            .map(Submission::from)
            .ok_or_else(|| Error::NotFound(format!("entry {id}")))
    }

    async fn delete(&self, id: i64) -> Result<Submission> {
        let response = self
            .request(reqwest::Method::DELETE, &[("id", format!("eq.{id}"))])
            .header("Prefer", "return=representation")
            .send()
            .await?;
        let mut rows = self.rows(response).await?;
        rows.pop()
            .map(Submission::from)
            .ok_or_else(|| Error::NotFound(format!("entry {id}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn patch_body_includes_only_supplied_fields() {
        let body = patch_body(&SubmissionPatch {
            name: Some("Jordan".to_string()),
            ..Default::default()
        });
        assert_eq!(body["name"], "Jordan");
        assert!(body.get("email").is_none());
        assert!(body.get("message").is_none());
        assert!(body.get("updated_at").is_some());
    }

    #[test]
    fn row_converts_to_camel_case_wire_form() {
        let row: Row = serde_json::from_value(json!({
            "id": 7,
            "name": "Jo",
            "email": "jo@x.com",
            "message": "hi",
            "created_at": "2026-01-02T03:04:05Z",
            "updated_at": null
        }))
        .unwrap();
        let submission = Submission::from(row);
        let wire = serde_json::to_value(&submission).unwrap();
        assert_eq!(wire["id"], 7);
        assert_eq!(wire["createdAt"], "2026-01-02T03:04:05Z");
        assert!(wire.get("updatedAt").is_none());
    }

    #[test]
    fn endpoint_handles_trailing_slash() {
        let store = SupabaseStore::new("https://proj.supabase.co/", "key").unwrap();
        assert_eq!(store.endpoint, "https://proj.supabase.co/rest/v1/submissions");
    }
}
