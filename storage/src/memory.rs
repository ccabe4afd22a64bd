//! In-process store used by tests and single-node development runs.

use async_trait::async_trait;
use chrono::Utc;
use errors::StoreError;
use scribe_core::{ChangeEvent, DocRecord, NewRepository, RepositoryRecord, RepositoryStore};
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
struct State {
    repos: HashMap<Uuid, RepositoryRecord>,
    ids_by_url: HashMap<String, Uuid>,
    changes: Vec<ChangeEvent>,
    docs: BTreeMap<(Uuid, String), DocRecord>
}

#[derive(Default)]
pub struct InMemoryStore {
    state: RwLock<State>
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RepositoryStore for InMemoryStore {
    async fn upsert_repository(
        &self,
        repo: NewRepository
    ) -> Result<RepositoryRecord, StoreError> {
        let mut state = self.state.write().await;
        let now = Utc::now();

        if let Some(id) = state.ids_by_url.get(&repo.url).copied()
            && let Some(existing) = state.repos.get_mut(&id)
        {
            existing.local_path = repo.local_path;
            existing.branch = repo.branch;
            existing.updated_at = now;
            return Ok(existing.clone());
        }

        let record = RepositoryRecord {
            id: Uuid::new_v4(),
            url: repo.url,
            local_path: repo.local_path,
            branch: repo.branch,
            last_revision: None,
            created_at: now,
            updated_at: now
        };
        state.ids_by_url.insert(record.url.clone(), record.id);
        state.repos.insert(record.id, record.clone());
        Ok(record)
    }

    async fn get_repository(&self, id: Uuid) -> Result<Option<RepositoryRecord>, StoreError> {
        Ok(self.state.read().await.repos.get(&id).cloned())
    }

    async fn get_repository_by_url(
        &self,
        url: &str
    ) -> Result<Option<RepositoryRecord>, StoreError> {
        let state = self.state.read().await;
        Ok(state
            .ids_by_url
            .get(url)
            .and_then(|id| state.repos.get(id))
            .cloned())
    }

    async fn update_last_revision(&self, id: Uuid, revision: &str) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        if let Some(record) = state.repos.get_mut(&id) {
            record.last_revision = Some(revision.to_string());
            record.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn append_change(&self, event: &ChangeEvent) -> Result<(), StoreError> {
        self.state.write().await.changes.push(event.clone());
        Ok(())
    }

    async fn list_changes(&self, repository_id: Uuid) -> Result<Vec<ChangeEvent>, StoreError> {
        Ok(self
            .state
            .read()
            .await
            .changes
            .iter()
            .filter(|event| event.repository_id == repository_id)
            .cloned()
            .collect())
    }

    async fn upsert_doc(&self, doc: &DocRecord) -> Result<(), StoreError> {
        self.state
            .write()
            .await
            .docs
            .insert((doc.repository_id, doc.path.clone()), doc.clone());
        Ok(())
    }

    async fn list_docs(&self, repository_id: Uuid) -> Result<Vec<DocRecord>, StoreError> {
        Ok(self
            .state
            .read()
            .await
            .docs
            .values()
            .filter(|doc| doc.repository_id == repository_id)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scribe_core::DraftedDoc;

    fn new_repo(url: &str, path: &str, branch: &str) -> NewRepository {
        NewRepository {
            url: url.to_string(),
            local_path: path.to_string(),
            branch: branch.to_string()
        }
    }

    #[tokio::test]
    async fn test_upsert_keeps_identity_and_last_write_wins() {
        let store = InMemoryStore::new();
        let first = store
            .upsert_repository(new_repo("https://example.com/a.git", "/r/a_1", "main"))
            .await
            .unwrap();
        store.update_last_revision(first.id, "abcdef01").await.unwrap();

        let second = store
            .upsert_repository(new_repo("https://example.com/a.git", "/r/a_2", "dev"))
            .await
            .unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.branch, "dev");
        assert_eq!(second.local_path, "/r/a_2");
        assert_eq!(second.last_revision.as_deref(), Some("abcdef01"));
    }

    #[tokio::test]
    async fn test_docs_unique_per_repository_and_path() {
        let store = InMemoryStore::new();
        let repo_id = Uuid::new_v4();
        let mut doc = DocRecord {
            repository_id: repo_id,
            path: "pkg/mod.py".to_string(),
            drafts: vec![],
            updated_at: Utc::now()
        };
        store.upsert_doc(&doc).await.unwrap();
        doc.drafts.push(DraftedDoc {
            function: "run".to_string(),
            line: 3,
            source_hash: "h".to_string(),
            docstring: "Runs.".to_string()
        });
        store.upsert_doc(&doc).await.unwrap();

        let docs = store.list_docs(repo_id).await.unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].drafts.len(), 1);
    }
}
