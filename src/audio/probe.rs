use super::AudioFuture;
use crate::asset_loader::{is_remote, MIN_AUDIO_BYTES};
use crate::error::AudioError;
use log::debug;

/// Checks that a source is reachable before the user is asked to start it.
pub trait SourceProbe: Send + Sync {
    fn probe(&self, source_url: &str) -> AudioFuture;
}

/// `HEAD` for remote sources, file metadata for local ones. Non-2xx,
/// transport errors and placeholder-sized files all count as unavailable.
#[derive(Clone, Default)]
pub struct HttpProbe {
    http: reqwest::Client,
}

impl HttpProbe {
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }
}

fn check_size(source_url: &str, len: Option<u64>) -> Result<(), AudioError> {
    match len {
        Some(len) if len < MIN_AUDIO_BYTES => Err(AudioError::ResourceUnavailable(format!(
            "{} looks like a placeholder ({} bytes)",
            source_url, len
        ))),
        _ => Ok(()),
    }
}

impl SourceProbe for HttpProbe {
    fn probe(&self, source_url: &str) -> AudioFuture {
        let url = source_url.to_string();
        let http = self.http.clone();
        Box::pin(async move {
            if !is_remote(&url) {
                let meta = tokio::fs::metadata(&url)
                    .await
                    .map_err(|e| AudioError::ResourceUnavailable(format!("{}: {}", url, e)))?;
                return check_size(&url, Some(meta.len()));
            }

            let response = http
                .head(&url)
                .send()
                .await
                .map_err(|e| AudioError::ResourceUnavailable(format!("{}: {}", url, e)))?;
            debug!("Probe {} -> {}", url, response.status());

            if !response.status().is_success() {
                return Err(AudioError::ResourceUnavailable(format!(
                    "{}: HTTP {}",
                    url,
                    response.status()
                )));
            }
            check_size(&url, response.content_length())
        })
    }
}
