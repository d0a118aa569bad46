//! Image hosting for profile pictures and activity proofs.

use async_trait::async_trait;
use thiserror::Error;

pub mod imgbb;
pub mod in_memory;

pub use imgbb::ImgbbClient;
pub use in_memory::InMemoryImageHost;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ImageHostError {
    #[error("IMGBB_KEY not set")]
    NotConfigured,

    #[error("image upload failed: {0}")]
    Transport(String),

    #[error("unexpected image host response: {0}")]
    InvalidResponse(String),

    #[error("imgbb upload failed, status {0}")]
    Rejected(u16),
}

/// Stores an image somewhere publicly reachable and returns its URL.
#[async_trait]
pub trait ImageHost: Send + Sync {
    async fn upload(&self, file_name: &str, bytes: Vec<u8>) -> Result<String, ImageHostError>;
}
