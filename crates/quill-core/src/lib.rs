use serde::{Deserialize, Serialize};

pub mod post;
pub mod slug;

pub use post::Post;
pub use slug::{FALLBACK_SLUG, slugify};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Eq, PartialEq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum UiLanguage {
    ViVn,
    EnUs,
}
