use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use quill_config::ImagePolicy;
use quill_core::{Post, slugify};
use quill_media::{ImageNormalizer, MediaError};
use quill_render::render;
use quill_store::{POSTS_KEY, PostStore, StorageBackend};
use tracing::info;
use uuid::Uuid;

/// Characters of raw content shown in list excerpts before truncation.
pub const EXCERPT_CHARS: usize = 140;

/// Editor state for a post about to be saved. `id` is `None` for a brand
/// new post; edits carry the existing id so the save replaces in place.
#[derive(Debug, Clone, Default)]
pub struct PostDraft {
    pub id: Option<Uuid>,
    pub title: String,
    pub content: String,
    pub image: Option<AttachedImage>,
}

impl PostDraft {
    /// Start an edit from an existing post, carrying its image along the
    /// way the editor pre-fills its form.
    pub fn from_post(post: &Post) -> Self {
        Self {
            id: Some(post.id),
            title: post.title.clone(),
            content: post.content.clone(),
            image: post.image_data.clone().map(|data_url| AttachedImage {
                data_url,
                alt: post.image_alt.clone().unwrap_or_default(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachedImage {
    pub data_url: String,
    pub alt: String,
}

pub struct BlogServiceBuilder {
    backend: Arc<dyn StorageBackend>,
    storage_key: String,
    image_policy: ImagePolicy,
}

impl BlogServiceBuilder {
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self {
            backend,
            storage_key: POSTS_KEY.to_string(),
            image_policy: ImagePolicy::default(),
        }
    }

    pub fn storage_key(mut self, key: impl Into<String>) -> Self {
        self.storage_key = key.into();
        self
    }

    pub fn image_policy(mut self, policy: ImagePolicy) -> Self {
        self.image_policy = policy;
        self
    }

    pub fn build(self) -> BlogService {
        let store = PostStore::with_key(self.backend, self.storage_key);
        let normalizer = ImageNormalizer::new()
            .with_caps(self.image_policy.max_width, self.image_policy.max_height)
            .with_quality(self.image_policy.jpeg_quality);
        BlogService { store, normalizer }
    }
}

/// Everything the presentation layer calls into: the save flow, lookups,
/// search, rendering, and image attachment.
pub struct BlogService {
    store: PostStore,
    normalizer: ImageNormalizer,
}

impl BlogService {
    /// Persist a draft: trim title and content, re-derive the slug, keep
    /// `created_at` across edits (falling back to now if the original
    /// record vanished), and refresh `updated_at`.
    pub fn save_post(&self, draft: PostDraft) -> Result<Post> {
        let now = Utc::now();
        let title = draft.title.trim().to_string();
        let (id, created_at) = match draft.id {
            Some(id) => {
                let previous = self.store.list().into_iter().find(|post| post.id == id);
                (id, previous.map(|post| post.created_at).unwrap_or(now))
            }
            None => (Uuid::new_v4(), now),
        };

        let post = Post {
            id,
            slug: slugify(&title),
            title,
            content: draft.content.trim().to_string(),
            image_data: draft.image.as_ref().map(|image| image.data_url.clone()),
            image_alt: draft.image.map(|image| image.alt),
            created_at,
            updated_at: now,
        };
        self.store.upsert(&post).context("failed to persist post")?;
        info!(id = %post.id, slug = %post.slug, "saved post");
        Ok(post)
    }

    /// Normalize raw file bytes into an embeddable image. The alt text
    /// defaults to the post title, then the file name, then stays empty.
    pub async fn attach_image(
        &self,
        bytes: Vec<u8>,
        title: &str,
        file_name: &str,
    ) -> Result<AttachedImage, MediaError> {
        let normalized = self.normalizer.normalize(bytes).await?;
        let alt = if !title.trim().is_empty() {
            title.trim().to_string()
        } else if !file_name.is_empty() {
            file_name.to_string()
        } else {
            String::new()
        };
        Ok(AttachedImage {
            data_url: normalized.data_url,
            alt,
        })
    }

    pub fn list(&self) -> Vec<Post> {
        self.store.list()
    }

    /// Case-insensitive substring filter on titles; a blank query returns
    /// everything.
    pub fn search(&self, query: &str) -> Vec<Post> {
        let needle = query.trim().to_lowercase();
        let posts = self.store.list();
        if needle.is_empty() {
            return posts;
        }
        posts
            .into_iter()
            .filter(|post| post.title.to_lowercase().contains(&needle))
            .collect()
    }

    pub fn find_by_slug(&self, slug: &str) -> Option<Post> {
        self.store.find_by_slug(slug)
    }

    pub fn delete(&self, id: Uuid) -> Result<()> {
        self.store.delete(id).context("failed to delete post")?;
        info!(%id, "deleted post");
        Ok(())
    }

    /// Rendered HTML for the full post body.
    pub fn body_html(&self, post: &Post) -> String {
        render(&post.content)
    }

    /// Rendered HTML for the list excerpt: content over the limit is cut
    /// at [`EXCERPT_CHARS`] characters with an ellipsis before rendering.
    pub fn excerpt_html(&self, post: &Post) -> String {
        let mut chars = post.content.chars();
        let head: String = chars.by_ref().take(EXCERPT_CHARS).collect();
        if chars.next().is_some() {
            render(&format!("{head}…"))
        } else {
            render(&post.content)
        }
    }
}
