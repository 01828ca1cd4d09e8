use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::slug::slugify;

/// A single blog entry. Serialized field names match the storage blob
/// format (`imageData`, `createdAt`, ...), with absent image fields
/// omitted entirely rather than written as null.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_data: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_alt: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Post {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        let now = Utc::now();
        let title = title.into().trim().to_string();
        Self {
            id: Uuid::new_v4(),
            slug: slugify(&title),
            title,
            content: content.into().trim().to_string(),
            image_data: None,
            image_alt: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn has_image(&self) -> bool {
        self.image_data.is_some()
    }

    /// Timestamp shown in listings: last edit, which at creation time
    /// equals the creation timestamp.
    pub fn display_date(&self) -> DateTime<Utc> {
        self.updated_at
    }
}
