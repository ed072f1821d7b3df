//! Text preview retrieval.
//!
//! A document's preview text is stored as numbered pages under
//! `<prefix>/<fingerprint>/<page>.txt`, starting at page 1. The fetcher reads
//! pages in order, normalizes each one and stops at the first missing page or
//! once the preview reaches [`MAX_PREVIEW_CHARS`].

mod normalize;

use std::sync::Arc;

use async_trait::async_trait;
use object_store::path::Path;
use object_store::ObjectStore;
use thiserror::Error;
use tracing::debug;

use crate::config::DEFAULT_PREVIEW_PREFIX;

pub use normalize::{normalize_page, normalize_text, truncate_chars};

/// Upper bound on a preview's length, in characters.
pub const MAX_PREVIEW_CHARS: usize = 24_000;

#[derive(Debug, Error)]
pub enum PreviewError {
    #[error("Failed to fetch {key}: {source}")]
    Storage {
        key: String,
        #[source]
        source: object_store::Error,
    },
}

/// Keyed page storage.
#[async_trait]
pub trait PageStore: Send + Sync {
    /// Fetch the object stored at `key`; `None` when no such object exists.
    async fn get_page(&self, key: &str) -> Result<Option<Vec<u8>>, object_store::Error>;
}

#[async_trait]
impl PageStore for Arc<dyn ObjectStore> {
    async fn get_page(&self, key: &str) -> Result<Option<Vec<u8>>, object_store::Error> {
        let path = Path::from(key);
        match self.get(&path).await {
            Ok(result) => Ok(Some(result.bytes().await?.to_vec())),
            Err(object_store::Error::NotFound { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

/// Builds bounded, normalized previews from paged storage.
pub struct TextPreviewFetcher {
    store: Arc<dyn PageStore>,
    prefix: String,
    max_chars: usize,
}

impl TextPreviewFetcher {
    pub fn new(store: Arc<dyn PageStore>) -> Self {
        Self {
            store,
            prefix: DEFAULT_PREVIEW_PREFIX.to_string(),
            max_chars: MAX_PREVIEW_CHARS,
        }
    }

    /// Convenience constructor over an object_store backend.
    pub fn from_object_store(store: Arc<dyn ObjectStore>) -> Self {
        Self::new(Arc::new(store))
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn with_max_chars(mut self, max_chars: usize) -> Self {
        self.max_chars = max_chars;
        self
    }

    pub fn max_chars(&self) -> usize {
        self.max_chars
    }

    /// Storage key of page `page` (1-based) of a document.
    pub fn page_key(&self, fingerprint: &str, page: u32) -> String {
        if self.prefix.is_empty() {
            format!("{}/{}.txt", fingerprint, page)
        } else {
            format!("{}/{}/{}.txt", self.prefix, fingerprint, page)
        }
    }

    /// Fetch the preview of one document.
    ///
    /// A missing page ends pagination; a document without pages yields an
    /// empty preview. Any other storage failure aborts the fetch.
    pub async fn fetch(&self, fingerprint: &str) -> Result<String, PreviewError> {
        let mut preview = String::new();
        let mut len = 0usize;
        let mut page = 1u32;
        let mut exhausted = false;

        while len < self.max_chars {
            let key = self.page_key(fingerprint, page);
            let bytes = match self.store.get_page(&key).await {
                Ok(Some(bytes)) => bytes,
                Ok(None) => {
                    exhausted = true;
                    break;
                }
                Err(source) => return Err(PreviewError::Storage { key, source }),
            };

            let normalized = normalize_page(&String::from_utf8_lossy(&bytes));
            // Outer spaces are trimmed at the preview's edges only, so the
            // space separating two pages survives without doubling.
            let piece = if preview.is_empty() {
                normalized.trim_start_matches(' ')
            } else if preview.ends_with(' ') {
                normalized.strip_prefix(' ').unwrap_or(normalized.as_str())
            } else {
                normalized.as_str()
            };

            len += piece.chars().count();
            preview.push_str(piece);
            debug!("Fetched {} ({} chars so far)", key, len);
            page += 1;
        }

        if exhausted {
            let end = preview.trim_end_matches(' ').len();
            preview.truncate(end);
        } else {
            truncate_chars(&mut preview, self.max_chars);
        }

        Ok(preview)
    }
}
