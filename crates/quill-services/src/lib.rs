mod services;

pub use services::{AttachedImage, BlogService, BlogServiceBuilder, EXCERPT_CHARS, PostDraft};
