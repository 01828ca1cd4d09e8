use std::path::PathBuf;
use std::sync::Arc;

use quill_core::Post;
use thiserror::Error;
use tracing::warn;
use uuid::Uuid;

use crate::backend::StorageBackend;

/// Fixed key the serialized post array lives under.
pub const POSTS_KEY: &str = "quill_posts_v1";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write {path}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("storage quota of {limit} bytes exceeded")]
    QuotaExceeded { limit: usize },
    #[error("failed to serialize posts")]
    Serialize(#[from] serde_json::Error),
}

/// Repository over the single post blob. Reads never fail: a missing,
/// unreadable, or malformed blob is an empty collection. Writes rewrite
/// the whole blob and propagate failures to the caller.
#[derive(Clone)]
pub struct PostStore {
    backend: Arc<dyn StorageBackend>,
    key: String,
}

impl PostStore {
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self::with_key(backend, POSTS_KEY)
    }

    pub fn with_key(backend: Arc<dyn StorageBackend>, key: impl Into<String>) -> Self {
        Self {
            backend,
            key: key.into(),
        }
    }

    /// All posts in storage order (newest-created first, since new posts
    /// are prepended and edits keep their position).
    pub fn list(&self) -> Vec<Post> {
        let raw = match self.backend.read(&self.key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(error) => {
                warn!(%error, key = %self.key, "unreadable post blob, treating as empty");
                return Vec::new();
            }
        };
        match serde_json::from_str(&raw) {
            Ok(posts) => posts,
            Err(error) => {
                warn!(%error, key = %self.key, "malformed post blob, treating as empty");
                Vec::new()
            }
        }
    }

    /// Replace the post with the same id in place, or prepend it.
    pub fn upsert(&self, post: &Post) -> Result<(), StoreError> {
        let mut posts = self.list();
        match posts.iter_mut().find(|existing| existing.id == post.id) {
            Some(existing) => *existing = post.clone(),
            None => posts.insert(0, post.clone()),
        }
        self.persist(&posts)
    }

    /// Remove the matching post; deleting an absent id is a no-op.
    pub fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        let mut posts = self.list();
        posts.retain(|post| post.id != id);
        self.persist(&posts)
    }

    /// First post in storage order with this slug. Slugs are not unique;
    /// first match wins.
    pub fn find_by_slug(&self, slug: &str) -> Option<Post> {
        self.list().into_iter().find(|post| post.slug == slug)
    }

    fn persist(&self, posts: &[Post]) -> Result<(), StoreError> {
        let blob = serde_json::to_string(posts)?;
        self.backend.write(&self.key, &blob)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{FileBackend, MemoryBackend};

    fn memory_store() -> PostStore {
        PostStore::new(Arc::new(MemoryBackend::new()))
    }

    #[test]
    fn empty_store_lists_nothing_and_finds_nothing() {
        let store = memory_store();
        assert!(store.list().is_empty());
        assert!(store.find_by_slug("anything").is_none());
    }

    #[test]
    fn upsert_prepends_new_posts() {
        let store = memory_store();
        let first = Post::new("first", "a");
        let second = Post::new("second", "b");
        store.upsert(&first).expect("upsert first");
        store.upsert(&second).expect("upsert second");

        let posts = store.list();
        assert_eq!(posts.len(), 2);
        assert_eq!(posts[0].id, second.id);
        assert_eq!(posts[1].id, first.id);
    }

    #[test]
    fn upsert_with_same_id_replaces_in_place() {
        let store = memory_store();
        let older = Post::new("older", "a");
        let mut target = Post::new("target", "b");
        store.upsert(&target).expect("upsert");
        store.upsert(&older).expect("upsert");

        target.content = "edited".to_string();
        store.upsert(&target).expect("re-upsert");

        let posts = store.list();
        assert_eq!(posts.len(), 2);
        // Edited post keeps its position behind the newer one.
        assert_eq!(posts[0].id, older.id);
        assert_eq!(posts[1].id, target.id);
        assert_eq!(posts[1].content, "edited");
    }

    #[test]
    fn delete_removes_only_the_matching_post() {
        let store = memory_store();
        let keep = Post::new("keep", "a");
        let doomed = Post::new("doomed", "b");
        store.upsert(&keep).expect("upsert");
        store.upsert(&doomed).expect("upsert");

        store.delete(doomed.id).expect("delete");
        let posts = store.list();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].id, keep.id);

        // Deleting an id that is not there changes nothing.
        store.delete(doomed.id).expect("delete again");
        assert_eq!(store.list().len(), 1);
    }

    #[test]
    fn find_by_slug_returns_first_match_in_storage_order() {
        let store = memory_store();
        let older = Post::new("Same Title", "older");
        let newer = Post::new("Same Title", "newer");
        store.upsert(&older).expect("upsert");
        store.upsert(&newer).expect("upsert");

        let found = store.find_by_slug("same-title").expect("found");
        assert_eq!(found.id, newer.id);
    }

    #[test]
    fn malformed_blob_reads_as_empty() {
        let backend = Arc::new(MemoryBackend::new());
        backend
            .write(POSTS_KEY, "{ this is not a post array")
            .expect("seed garbage");
        let store = PostStore::new(backend);
        assert!(store.list().is_empty());

        // The store recovers by rewriting a fresh blob on the next save.
        let post = Post::new("fresh", "start");
        store.upsert(&post).expect("upsert");
        assert_eq!(store.list().len(), 1);
    }

    #[test]
    fn quota_failures_propagate_and_leave_the_blob_intact() {
        let backend = Arc::new(MemoryBackend::with_quota(2));
        let store = PostStore::new(backend);
        let post = Post::new("too big", "content");
        let result = store.upsert(&post);
        assert!(matches!(result, Err(StoreError::QuotaExceeded { .. })));
        assert!(store.list().is_empty());
    }

    #[test]
    fn file_backend_persists_across_store_instances() {
        let dir = tempfile::tempdir().expect("tempdir");
        let post = Post::new("durable", "content");
        {
            let store = PostStore::new(Arc::new(FileBackend::new(dir.path())));
            store.upsert(&post).expect("upsert");
        }
        let reopened = PostStore::new(Arc::new(FileBackend::new(dir.path())));
        let posts = reopened.list();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0], post);
    }
}
