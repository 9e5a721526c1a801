use async_trait::async_trait;

use crate::error::Result;
use crate::types::{CandidateSong, RawVideoItem, SocialProfile, SongDetails};

// Provider capability ports. Each resolver stage receives the ports it needs
// at construction time; there is no shared client state.

#[async_trait]
pub trait SoundSearchPort: Send + Sync {
    fn provider_name(&self) -> &'static str;
    async fn search_sounds(&self, query: &str, limit: usize) -> Result<Vec<CandidateSong>>;
}

#[async_trait]
pub trait KeywordSearchPort: Send + Sync {
    fn provider_name(&self) -> &'static str;
    async fn search_videos(&self, query: &str) -> Result<Vec<RawVideoItem>>;
}

#[async_trait]
pub trait SongDetailPort: Send + Sync {
    fn provider_name(&self) -> &'static str;
    async fn song_details(&self, clip_id: &str) -> Result<Option<SongDetails>>;
}

#[async_trait]
pub trait ProfilePort: Send + Sync {
    fn provider_name(&self) -> &'static str;
    /// `Ok(None)` when the provider has no data for the handle
    async fn profile(&self, handle: &str) -> Result<Option<SocialProfile>>;
}

// Transport port shared by the provider clients
#[async_trait]
pub trait HttpClientPort: Send + Sync {
    async fn get_json(
        &self,
        url: &str,
        query: &[(&str, &str)],
        headers: &[(&str, &str)],
    ) -> Result<HttpJsonResult>;

    async fn post_json(
        &self,
        url: &str,
        query: &[(&str, &str)],
        body: &serde_json::Value,
    ) -> Result<HttpJsonResult>;
}

#[derive(Clone, Debug)]
pub struct HttpJsonResult {
    pub status: u16,
    pub body: serde_json::Value,
}

impl HttpJsonResult {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Held for the duration of one request; dropping it frees a concurrency slot
pub type RatePermit = Option<tokio::sync::OwnedSemaphorePermit>;

#[async_trait]
pub trait RateLimiterPort: Send + Sync {
    async fn acquire(&self) -> RatePermit;
}
