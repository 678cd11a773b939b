use crate::error::{AudioError, AudioResult};
use log::{debug, info};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};

/// Placeholder tracks shipped by the backend are tiny; anything below this is
/// treated as missing.
pub const MIN_AUDIO_BYTES: u64 = 1000;

/// Downloads remote audio assets once and keeps them on disk.
#[derive(Clone)]
pub struct AssetCache {
    dir: PathBuf,
    http: reqwest::Client,
}

/// Generate a cache key from URL (hash-based filename)
fn url_to_filename(url: &str) -> String {
    let mut hasher = DefaultHasher::new();
    url.hash(&mut hasher);
    let hash = hasher.finish();
    let extension = Path::new(url.split(['?', '#']).next().unwrap_or(url))
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("mp3");
    format!("{:x}.{}", hash, extension)
}

pub fn is_remote(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

impl AssetCache {
    /// `root` is usually the app data directory; audio lands in `<root>/assets/audio`.
    pub fn new(root: impl AsRef<Path>, http: reqwest::Client) -> Self {
        Self {
            dir: root.as_ref().join("assets").join("audio"),
            http,
        }
    }

    /// Path where the asset would be cached (may or may not exist)
    pub fn cache_path(&self, url: &str) -> PathBuf {
        self.dir.join(url_to_filename(url))
    }

    /// Bytes of the asset, downloading it on a cache miss.
    pub async fn fetch(&self, url: &str) -> AudioResult<Vec<u8>> {
        let file_path = self.cache_path(url);
        if let Ok(bytes) = tokio::fs::read(&file_path).await {
            debug!("Asset cache hit: {}", url);
            return Ok(bytes);
        }

        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| AudioError::ResourceUnavailable(format!("{}: {}", url, e)))?;

        if !response.status().is_success() {
            return Err(AudioError::ResourceUnavailable(format!(
                "{}: HTTP {}",
                url,
                response.status()
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| AudioError::ResourceUnavailable(format!("{}: {}", url, e)))?;

        // The cache is an optimisation; a failed write still yields the bytes
        if let Err(e) = tokio::fs::create_dir_all(&self.dir).await {
            debug!("Asset cache dir unavailable: {}", e);
        } else if let Err(e) = tokio::fs::write(&file_path, &bytes).await {
            debug!("Failed to cache {}: {}", url, e);
        }

        info!("Downloaded asset {} ({} bytes)", url, bytes.len());
        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filename_keeps_extension() {
        let name = url_to_filename("http://localhost:5000/static/audio/cave.ogg?v=2");
        assert!(name.ends_with(".ogg"));
        assert!(url_to_filename("http://localhost/stream").ends_with(".mp3"));
    }

    #[test]
    fn test_filename_is_stable_per_url() {
        let a = url_to_filename("http://host/a.mp3");
        assert_eq!(a, url_to_filename("http://host/a.mp3"));
        assert_ne!(a, url_to_filename("http://host/b.mp3"));
    }

    #[test]
    fn test_is_remote() {
        assert!(is_remote("https://host/a.mp3"));
        assert!(!is_remote("/static/audio/a.mp3"));
    }

    #[tokio::test]
    async fn test_cached_file_is_served_without_network() {
        let root = std::env::temp_dir().join(format!("soundscape-{}", uuid::Uuid::new_v4()));
        let cache = AssetCache::new(&root, reqwest::Client::new());
        let url = "http://unreachable.invalid/static/audio/tavern.mp3";

        let path = cache.cache_path(url);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, b"cached").unwrap();

        assert_eq!(cache.fetch(url).await.unwrap(), b"cached".to_vec());
        let _ = std::fs::remove_dir_all(root);
    }
}
