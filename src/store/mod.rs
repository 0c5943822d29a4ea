//! Persistence layer for submissions.
//!
//! Two interchangeable backends sit behind the [`EntryStore`] trait: the
//! ephemeral in-process [`MemoryStore`] and the durable [`SupabaseStore`]
//! speaking PostgREST. Handlers validate before calling either one; the
//! store never re-validates.

pub mod memory;
pub mod supabase;

pub use memory::MemoryStore;
pub use supabase::SupabaseStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// The single persisted entity. Serializes camelCase on the wire
/// (`createdAt`, `updatedAt`), with `updatedAt` absent until the first
/// update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    pub id: i64,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub message: String,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Fields of a create call, already trimmed and sanitized by the caller.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewSubmission {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub message: String,
}

/// Partial patch for update calls. `None` fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubmissionPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub message: Option<String>,
}

/// Persistence contract shared by both backends.
///
/// `update` and `delete` fail with [`crate::error::Error::NotFound`] for
/// unknown ids and leave the store untouched; `delete` returns the removed
/// record.
#[async_trait]
pub trait EntryStore: Send + Sync {
    async fn create(&self, fields: NewSubmission) -> Result<Submission>;
    async fn list(&self, limit: Option<usize>) -> Result<Vec<Submission>>;
    async fn update(&self, id: i64, patch: SubmissionPatch) -> Result<Submission>;
    async fn delete(&self, id: i64) -> Result<Submission>;
}
