use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info, instrument};

use crate::apis::{ensure_success, first_id, lenient_bool, lenient_u64, non_empty, CoverImage, IdValue};
use crate::app::ports::{HttpClientPort, KeywordSearchPort, ProfilePort, SoundSearchPort};
use crate::constants::{
    APIFY_API_BASE, APIFY_KEYWORD_VIDEO_ACTOR, APIFY_PROFILE_ACTOR, APIFY_PROVIDER,
    APIFY_SOUND_SEARCH_ACTOR,
};
use crate::error::Result;
use crate::types::{CandidateSong, RawVideoItem, SocialProfile};

const KEYWORD_VIDEO_LIMIT: usize = 20;

/// Row of the sound search actor
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ApifyMusic {
    pub id: Option<IdValue>,
    pub id_str: Option<IdValue>,
    pub title: Option<String>,
    pub author: Option<String>,
    pub album: Option<String>,
    #[serde(deserialize_with = "lenient_u64")]
    pub duration: u64,
    #[serde(deserialize_with = "lenient_u64")]
    pub user_count: u64,
    pub owner_handle: Option<String>,
    pub owner_nickname: Option<String>,
    pub is_original: Option<bool>,
    pub cover_medium: Option<CoverImage>,
}

impl ApifyMusic {
    /// `None` when the row has no usable id
    pub fn into_candidate(self) -> Option<CandidateSong> {
        let id = first_id(&[self.id_str.as_ref(), self.id.as_ref()])?;
        Some(CandidateSong {
            id,
            title: self.title.unwrap_or_default(),
            author: self.author.unwrap_or_default(),
            album: non_empty(self.album),
            usage_count: self.user_count,
            is_original: self.is_original,
            cover_url: self.cover_medium.and_then(CoverImage::first_url),
            ..Default::default()
        })
    }
}

/// Post returned by the video and profile actors
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ApifyVideo {
    pub id: Option<IdValue>,
    pub title: Option<String>,
    #[serde(deserialize_with = "lenient_u64")]
    pub views: u64,
    pub channel: Option<ApifyChannel>,
    pub song: Option<ApifySong>,
    #[serde(rename = "postPage")]
    pub post_page: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ApifyChannel {
    pub name: Option<String>,
    pub username: Option<String>,
    pub bio: Option<String>,
    pub avatar: Option<String>,
    #[serde(deserialize_with = "lenient_bool")]
    pub verified: bool,
    #[serde(deserialize_with = "lenient_u64")]
    pub followers: u64,
    #[serde(deserialize_with = "lenient_u64")]
    pub videos: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ApifySong {
    pub id: Option<IdValue>,
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub cover: Option<String>,
}

impl ApifyVideo {
    pub fn into_raw_item(self) -> RawVideoItem {
        let video_id = self.id.as_ref().and_then(IdValue::as_id);
        let song = self.song.and_then(|song| {
            let id = song.id.as_ref().and_then(IdValue::as_id)?;
            Some(CandidateSong {
                id,
                title: song.title.unwrap_or_default(),
                author: song.artist.unwrap_or_default(),
                album: non_empty(song.album),
                cover_url: non_empty(song.cover),
                ..Default::default()
            })
        });
        RawVideoItem { video_id, song }
    }
}

impl ApifyChannel {
    fn into_profile(self, requested: &str) -> SocialProfile {
        let handle = non_empty(self.username).unwrap_or_else(|| requested.to_string());
        SocialProfile {
            display_name: non_empty(self.name).unwrap_or_else(|| handle.clone()),
            handle,
            bio: self.bio.unwrap_or_default(),
            bio_link: None,
            verified: self.verified,
            followers: self.followers,
            likes: 0,
            video_count: self.videos,
            avatar_url: non_empty(self.avatar),
        }
    }
}

/// Apify actor runner. Every call runs an actor synchronously and returns its dataset.
pub struct ApifyClient {
    http: Arc<dyn HttpClientPort>,
    token: String,
    base_url: String,
}

impl ApifyClient {
    /// `token` must already be validated (see `Credentials::apify_token`)
    pub fn new(http: Arc<dyn HttpClientPort>, token: impl Into<String>) -> Self {
        Self {
            http,
            token: token.into(),
            base_url: APIFY_API_BASE.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    async fn run_actor<T: DeserializeOwned>(&self, actor: &str, input: Value) -> Result<Vec<T>> {
        let url = format!("{}/acts/{}/run-sync-get-dataset-items", self.base_url, actor);
        debug!(actor, "Running actor");
        let resp = self
            .http
            .post_json(&url, &[("token", self.token.as_str())], &input)
            .await?;
        let body = ensure_success(APIFY_PROVIDER, resp)?;
        if body.is_null() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_value(body)?)
    }

    /// Sound search (the "Sounds" tab)
    #[instrument(skip(self))]
    pub async fn search_music(&self, query: &str, max_items: usize) -> Result<Vec<ApifyMusic>> {
        self.run_actor(
            APIFY_SOUND_SEARCH_ACTOR,
            json!({ "keyword": query, "max_items": max_items }),
        )
        .await
    }

    /// Videos matching a keyword
    #[instrument(skip(self))]
    pub async fn keyword_videos(&self, query: &str, max_items: usize) -> Result<Vec<ApifyVideo>> {
        self.run_actor(
            APIFY_KEYWORD_VIDEO_ACTOR,
            json!({ "keywords": [query], "maxItems": max_items }),
        )
        .await
    }

    /// Latest post of a profile; its `channel` carries the profile data
    #[instrument(skip(self))]
    pub async fn profile_posts(&self, username: &str) -> Result<Vec<ApifyVideo>> {
        self.run_actor(
            APIFY_PROFILE_ACTOR,
            json!({ "usernames": [username], "maxItems": 1 }),
        )
        .await
    }
}

#[async_trait]
impl SoundSearchPort for ApifyClient {
    fn provider_name(&self) -> &'static str {
        APIFY_PROVIDER
    }

    async fn search_sounds(&self, query: &str, limit: usize) -> Result<Vec<CandidateSong>> {
        let rows = self.search_music(query, limit).await?;
        let total = rows.len();
        let candidates: Vec<CandidateSong> =
            rows.into_iter().filter_map(ApifyMusic::into_candidate).collect();
        if candidates.len() < total {
            debug!(dropped = total - candidates.len(), "Dropped sounds without an id");
        }
        Ok(candidates)
    }
}

#[async_trait]
impl KeywordSearchPort for ApifyClient {
    fn provider_name(&self) -> &'static str {
        APIFY_PROVIDER
    }

    async fn search_videos(&self, query: &str) -> Result<Vec<RawVideoItem>> {
        let videos = self.keyword_videos(query, KEYWORD_VIDEO_LIMIT).await?;
        Ok(videos.into_iter().map(ApifyVideo::into_raw_item).collect())
    }
}

#[async_trait]
impl ProfilePort for ApifyClient {
    fn provider_name(&self) -> &'static str {
        APIFY_PROVIDER
    }

    async fn profile(&self, handle: &str) -> Result<Option<SocialProfile>> {
        let posts = self.profile_posts(handle).await?;
        let channel = posts.into_iter().find_map(|post| post.channel);
        match channel {
            Some(channel) => {
                let profile = channel.into_profile(handle);
                info!(
                    "{} ({} followers{})",
                    profile.display_name,
                    profile.followers,
                    if profile.verified { ", verified" } else { "" }
                );
                Ok(Some(profile))
            }
            None => {
                debug!(handle, "Profile actor returned no posts");
                Ok(None)
            }
        }
    }
}
