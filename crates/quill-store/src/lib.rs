mod backend;
mod store;

pub use backend::{FileBackend, MemoryBackend, StorageBackend};
pub use store::{POSTS_KEY, PostStore, StoreError};
