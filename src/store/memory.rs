//! In-process submission store.
//!
//! Holds entries in insertion order for the process lifetime. Ids come from
//! a monotonic counter that survives deletions, so an id is never handed
//! out twice even after the highest-numbered entry is removed. Not durable;
//! intended for the demo deployment and for tests.

use chrono::Utc;
use tokio::sync::RwLock;

use super::{EntryStore, NewSubmission, Submission, SubmissionPatch};
use crate::error::{Error, Result};

pub struct MemoryStore {
    inner: RwLock<Inner>,
}

struct Inner {
    entries: Vec<Submission>,
    next_id: i64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner {
                entries: Vec::new(),
                next_id: 1,
            }),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl EntryStore for MemoryStore {
    async fn create(&self, fields: NewSubmission) -> Result<Submission> {
        let mut inner = self.inner.write().await;
        let entry = Submission {
            id: inner.next_id,
            name: fields.name,
            email: fields.email,
            message: fields.message,
            created_at: Utc::now(),
            updated_at: None,
        };
        inner.next_id += 1;
        inner.entries.push(entry.clone());
        Ok(entry)
    }

    async fn list(&self, limit: Option<usize>) -> Result<Vec<Submission>> {
        let inner = self.inner.read().await;
        let mut entries = inner.entries.clone();
        if let Some(limit) = limit {
            entries.truncate(limit);
        }
        Ok(entries)
    }

    async fn update(&self, id: i64, patch: SubmissionPatch) -> Result<Submission> {
        let mut inner = self.inner.write().await;
        let entry = inner
            .entries
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or_else(|| Error::NotFound(format!("entry {id}")))?;
        if let Some(name) = patch.name {
            entry.name = name;
        }
        if let Some(email) = patch.email {
            entry.email = email;
        }
        if let Some(message) = patch.message {
            entry.message = message;
        }
        entry.updated_at = Some(Utc::now());
        Ok(entry.clone())
    }

    async fn delete(&self, id: i64) -> Result<Submission> {
        let mut inner = self.inner.write().await;
        let pos = inner
            .entries
            .iter()
            .position(|e| e.id == id)
            .ok_or_else(|| Error::NotFound(format!("entry {id}")))?;
        Ok(inner.entries.remove(pos))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(name: &str, email: &str, message: &str) -> NewSubmission {
        NewSubmission {
            name: name.to_string(),
            email: email.to_string(),
            message: message.to_string(),
        }
    }

    #[tokio::test]
    async fn first_create_gets_id_one() {
        let store = MemoryStore::new();
        let entry = store.create(fields("Jo", "jo@x.com", "hi")).await.unwrap();
        assert_eq!(entry.id, 1);
        assert_eq!(entry.name, "Jo");
        assert_eq!(entry.email, "jo@x.com");
        assert_eq!(entry.message, "hi");
        assert!(entry.updated_at.is_none());
    }

    #[tokio::test]
    async fn create_then_list_round_trips() {
        let store = MemoryStore::new();
        let created = store.create(fields("Jo", "jo@x.com", "hi")).await.unwrap();
        let listed = store.list(None).await.unwrap();
        assert_eq!(listed, vec![created]);
    }

    #[tokio::test]
    async fn list_is_idempotent_and_ordered() {
        let store = MemoryStore::new();
        store.create(fields("One", "a@b.c", "")).await.unwrap();
        store.create(fields("Two", "b@c.d", "")).await.unwrap();
        store.create(fields("Three", "c@d.e", "")).await.unwrap();

        let first = store.list(None).await.unwrap();
        let second = store.list(None).await.unwrap();
        assert_eq!(first, second);
        let ids: Vec<i64> = first.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);

        let capped = store.list(Some(2)).await.unwrap();
        assert_eq!(capped.len(), 2);
        assert_eq!(capped[0].id, 1);
    }

    #[tokio::test]
    async fn update_patches_fields_and_sets_updated_at() {
        let store = MemoryStore::new();
        let created = store.create(fields("Jo", "jo@x.com", "hi")).await.unwrap();

        let updated = store
            .update(
                created.id,
                SubmissionPatch {
                    name: Some("Jordan".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.name, "Jordan");
        assert_eq!(updated.email, created.email);
        assert_eq!(updated.message, created.message);
        assert_eq!(updated.created_at, created.created_at);
        assert!(updated.updated_at.is_some());
    }

    #[tokio::test]
    async fn unknown_ids_fail_not_found_without_side_effects() {
        let store = MemoryStore::new();
        store.create(fields("Jo", "jo@x.com", "")).await.unwrap();

        let err = store.update(99, SubmissionPatch::default()).await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
        let err = store.delete(99).await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));

        assert_eq!(store.list(None).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn delete_returns_removed_record_and_list_excludes_it() {
        let store = MemoryStore::new();
        let created = store.create(fields("Jo", "jo@x.com", "bye")).await.unwrap();
        let removed = store.delete(created.id).await.unwrap();
        assert_eq!(removed, created);
        assert!(store.list(None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn ids_are_never_reused_after_deleting_the_highest() {
        let store = MemoryStore::new();
        store.create(fields("One", "a@b.c", "")).await.unwrap();
        let second = store.create(fields("Two", "b@c.d", "")).await.unwrap();
        store.delete(second.id).await.unwrap();

        let third = store.create(fields("Three", "c@d.e", "")).await.unwrap();
        assert_eq!(third.id, 3);
    }
}
