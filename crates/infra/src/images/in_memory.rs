use std::sync::Mutex;

use async_trait::async_trait;

use super::{ImageHost, ImageHostError};

/// An upload captured by [`InMemoryImageHost`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredImage {
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub url: String,
}

/// Keeps uploads in memory for tests/dev and hands out `memory://` URLs.
#[derive(Debug, Default)]
pub struct InMemoryImageHost {
    inner: Mutex<Vec<StoredImage>>,
    fail: bool,
}

impl InMemoryImageHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// A host whose uploads always fail.
    pub fn failing() -> Self {
        Self {
            inner: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn uploads(&self) -> Vec<StoredImage> {
        self.inner.lock().map(|v| v.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl ImageHost for InMemoryImageHost {
    async fn upload(&self, file_name: &str, bytes: Vec<u8>) -> Result<String, ImageHostError> {
        if self.fail {
            return Err(ImageHostError::Transport("upload disabled".into()));
        }
        let mut images = self
            .inner
            .lock()
            .map_err(|_| ImageHostError::Transport("image host lock poisoned".into()))?;
        let url = format!("memory://images/{}/{}", images.len() + 1, file_name);
        images.push(StoredImage {
            file_name: file_name.to_string(),
            bytes,
            url: url.clone(),
        });
        Ok(url)
    }
}
