use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, instrument, warn};

use crate::apis::{
    ensure_success, first_id, lenient_bool, lenient_opt_u64, lenient_u64, list_of, non_empty,
    CoverImage, IdValue, ListOrMap,
};
use crate::app::ports::{HttpClientPort, KeywordSearchPort, ProfilePort, SongDetailPort};
use crate::constants::{
    SOCIAVAULT_API_BASE, SOCIAVAULT_KEYWORD_SEARCH, SOCIAVAULT_MUSIC_DETAILS,
    SOCIAVAULT_MUSIC_SEARCH, SOCIAVAULT_PROFILE, SOCIAVAULT_PROVIDER,
};
use crate::error::Result;
use crate::pipeline::processing::streaming::streaming_links;
use crate::types::{
    CandidateSong, OfficialArtist, RawVideoItem, SocialProfile, SongDetails, SoundListing,
    SoundSummary, StreamingId,
};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct Envelope<T: Default> {
    data: T,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SvArtist {
    pub handle: Option<String>,
    pub nick_name: Option<String>,
    #[serde(deserialize_with = "lenient_bool")]
    pub is_verified: bool,
}

impl SvArtist {
    fn into_official(self) -> Option<OfficialArtist> {
        Some(OfficialArtist {
            handle: non_empty(self.handle)?,
            nickname: non_empty(self.nick_name),
            verified: self.is_verified,
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SvDspInfo {
    #[serde(deserialize_with = "lenient_u64")]
    pub platform: u64,
    pub song_id: Option<IdValue>,
}

fn streaming_ids(infos: Option<ListOrMap<SvDspInfo>>) -> Vec<StreamingId> {
    list_of(infos)
        .into_iter()
        .filter_map(|info| {
            Some(StreamingId {
                platform: u32::try_from(info.platform).ok()?,
                song_id: info.song_id.as_ref().and_then(IdValue::as_id)?,
            })
        })
        .collect()
}

/// Music record as embedded in search results
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SvMusic {
    pub id: Option<IdValue>,
    pub id_str: Option<IdValue>,
    pub mid: Option<IdValue>,
    pub title: Option<String>,
    pub author: Option<String>,
    pub album: Option<String>,
    #[serde(deserialize_with = "lenient_opt_u64")]
    pub duration: Option<u64>,
    pub is_original_sound: Option<bool>,
    #[serde(deserialize_with = "lenient_bool")]
    pub is_pgc: bool,
    #[serde(deserialize_with = "lenient_bool")]
    pub is_author_artist: bool,
    #[serde(deserialize_with = "lenient_u64")]
    pub user_count: u64,
    pub artists: Option<ListOrMap<SvArtist>>,
    pub owner_handle: Option<String>,
    pub tt_to_dsp_song_infos: Option<ListOrMap<SvDspInfo>>,
    pub cover_medium: Option<CoverImage>,
}

impl SvMusic {
    fn clip_id(&self) -> Option<String> {
        first_id(&[self.id_str.as_ref(), self.id.as_ref(), self.mid.as_ref()])
    }

    pub fn into_candidate(self) -> Option<CandidateSong> {
        let id = self.clip_id()?;
        Some(CandidateSong {
            id,
            title: self.title.unwrap_or_default(),
            author: self.author.unwrap_or_default(),
            album: non_empty(self.album),
            usage_count: self.user_count,
            is_original: self.is_original_sound,
            is_official: self.is_pgc,
            author_is_artist: self.is_author_artist,
            official_artists: list_of(self.artists)
                .into_iter()
                .filter_map(|a| non_empty(a.handle))
                .collect(),
            cover_url: self.cover_medium.and_then(CoverImage::first_url),
        })
    }

    pub fn into_summary(self) -> Option<SoundSummary> {
        let clip_id = self.clip_id()?;
        let ids = streaming_ids(self.tt_to_dsp_song_infos);
        Some(SoundSummary {
            clip_id,
            title: self.title.unwrap_or_default(),
            author: self.author.unwrap_or_default(),
            album: non_empty(self.album),
            duration_secs: self.duration,
            usage_count: self.user_count,
            is_original_sound: self.is_original_sound.unwrap_or(false),
            artists: list_of(self.artists)
                .into_iter()
                .filter_map(SvArtist::into_official)
                .collect(),
            streaming: streaming_links(&ids),
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct KeywordSearchData {
    #[serde(deserialize_with = "lenient_bool")]
    success: bool,
    search_item_list: Option<ListOrMap<SearchItem>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct SearchItem {
    aweme_info: Option<AwemeInfo>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct AwemeInfo {
    aweme_id: Option<IdValue>,
    music: Option<SvMusic>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct MusicDetailsData {
    #[serde(deserialize_with = "lenient_bool")]
    success: bool,
    music_info: Option<MusicInfo>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct MusicInfo {
    title: Option<String>,
    author: Option<String>,
    album: Option<String>,
    owner_handle: Option<String>,
    owner_nickname: Option<String>,
    #[serde(deserialize_with = "lenient_bool")]
    is_original_sound: bool,
    #[serde(deserialize_with = "lenient_opt_u64")]
    user_count: Option<u64>,
    artists: Option<ListOrMap<SvArtist>>,
    tt_to_dsp_song_infos: Option<ListOrMap<SvDspInfo>>,
    cover_medium: Option<CoverImage>,
}

impl MusicInfo {
    fn into_details(self) -> SongDetails {
        SongDetails {
            title: non_empty(self.title),
            author: non_empty(self.author),
            album: non_empty(self.album),
            owner_handle: non_empty(self.owner_handle),
            owner_nickname: non_empty(self.owner_nickname),
            is_original_sound: self.is_original_sound,
            usage_count: self.user_count,
            artists: list_of(self.artists)
                .into_iter()
                .filter_map(SvArtist::into_official)
                .collect(),
            streaming_ids: streaming_ids(self.tt_to_dsp_song_infos),
            cover_url: self.cover_medium.and_then(CoverImage::first_url),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct ProfileData {
    user: Option<SvUser>,
    stats: Option<SvStats>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct SvUser {
    unique_id: Option<String>,
    nickname: Option<String>,
    #[serde(deserialize_with = "lenient_bool")]
    verified: bool,
    signature: Option<String>,
    bio_link: Option<SvBioLink>,
    avatar_medium: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct SvBioLink {
    link: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct SvStats {
    #[serde(deserialize_with = "lenient_u64")]
    follower_count: u64,
    #[serde(deserialize_with = "lenient_u64")]
    video_count: u64,
    #[serde(deserialize_with = "lenient_u64")]
    heart_count: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct MusicSearchData {
    music: Option<ListOrMap<SvMusic>>,
    #[serde(deserialize_with = "lenient_bool")]
    has_more: bool,
    #[serde(deserialize_with = "lenient_opt_u64")]
    total: Option<u64>,
}

/// Sort orders accepted by the music search endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundSort {
    Relevance = 0,
    MostUsed = 1,
    MostRecent = 2,
    Shortest = 3,
    Longest = 4,
}

impl SoundSort {
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(SoundSort::Relevance),
            1 => Some(SoundSort::MostUsed),
            2 => Some(SoundSort::MostRecent),
            3 => Some(SoundSort::Shortest),
            4 => Some(SoundSort::Longest),
            _ => None,
        }
    }

    pub fn code(&self) -> u8 {
        *self as u8
    }
}

/// GET-based scraping API; every response is wrapped in `{ "data": .. }`
pub struct SociaVaultClient {
    http: Arc<dyn HttpClientPort>,
    api_key: String,
    base_url: String,
}

impl SociaVaultClient {
    /// `api_key` must already be validated (see `Credentials::sociavault_key`)
    pub fn new(http: Arc<dyn HttpClientPort>, api_key: impl Into<String>) -> Self {
        Self {
            http,
            api_key: api_key.into(),
            base_url: SOCIAVAULT_API_BASE.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    async fn request<T: DeserializeOwned + Default>(
        &self,
        endpoint: &str,
        params: &[(&str, &str)],
    ) -> Result<T> {
        let url = format!("{}/{}", self.base_url, endpoint);
        debug!(endpoint, ?params, "GET");
        let resp = self
            .http
            .get_json(&url, params, &[("X-API-Key", self.api_key.as_str())])
            .await?;
        let body = ensure_success(SOCIAVAULT_PROVIDER, resp)?;
        if body.is_null() {
            return Ok(T::default());
        }
        let envelope: Envelope<T> = serde_json::from_value(body)?;
        Ok(envelope.data)
    }

    /// First page of the sound listing
    #[instrument(skip(self))]
    pub async fn search_music(
        &self,
        query: &str,
        region: Option<&str>,
        sort: Option<SoundSort>,
    ) -> Result<SoundListing> {
        let sort_code = sort.map(|s| s.code().to_string());
        let mut params = vec![("query", query)];
        if let Some(region) = region.map(str::trim).filter(|r| !r.is_empty()) {
            params.push(("region", region));
        }
        if let Some(code) = sort_code.as_deref() {
            params.push(("sort_type", code));
        }

        let data: MusicSearchData = self.request(SOCIAVAULT_MUSIC_SEARCH, &params).await?;
        Ok(SoundListing {
            sounds: list_of(data.music)
                .into_iter()
                .filter_map(SvMusic::into_summary)
                .collect(),
            has_more: data.has_more,
            total: data.total,
        })
    }
}

#[async_trait]
impl KeywordSearchPort for SociaVaultClient {
    fn provider_name(&self) -> &'static str {
        SOCIAVAULT_PROVIDER
    }

    async fn search_videos(&self, query: &str) -> Result<Vec<RawVideoItem>> {
        let data: KeywordSearchData = self
            .request(SOCIAVAULT_KEYWORD_SEARCH, &[("query", query)])
            .await?;
        if !data.success {
            warn!(query, "Keyword search reported no success");
            return Ok(Vec::new());
        }
        Ok(list_of(data.search_item_list)
            .into_iter()
            .filter_map(|item| item.aweme_info)
            .map(|info| RawVideoItem {
                video_id: info.aweme_id.as_ref().and_then(IdValue::as_id),
                song: info.music.and_then(SvMusic::into_candidate),
            })
            .collect())
    }
}

#[async_trait]
impl SongDetailPort for SociaVaultClient {
    fn provider_name(&self) -> &'static str {
        SOCIAVAULT_PROVIDER
    }

    async fn song_details(&self, clip_id: &str) -> Result<Option<SongDetails>> {
        let data: MusicDetailsData = self
            .request(SOCIAVAULT_MUSIC_DETAILS, &[("clipId", clip_id)])
            .await?;
        if !data.success || data.music_info.is_none() {
            warn!(clip_id, success = data.success, "No music info returned");
            return Ok(None);
        }
        Ok(data.music_info.map(MusicInfo::into_details))
    }
}

#[async_trait]
impl ProfilePort for SociaVaultClient {
    fn provider_name(&self) -> &'static str {
        SOCIAVAULT_PROVIDER
    }

    async fn profile(&self, handle: &str) -> Result<Option<SocialProfile>> {
        let data: ProfileData = self.request(SOCIAVAULT_PROFILE, &[("handle", handle)]).await?;
        let Some(user) = data.user else {
            return Ok(None);
        };
        let stats = data.stats.unwrap_or_default();
        let handle = non_empty(user.unique_id).unwrap_or_else(|| handle.to_string());

        Ok(Some(SocialProfile {
            display_name: non_empty(user.nickname).unwrap_or_else(|| handle.clone()),
            handle,
            bio: user.signature.unwrap_or_default(),
            bio_link: user.bio_link.and_then(|b| non_empty(b.link)),
            verified: user.verified,
            followers: stats.follower_count,
            likes: stats.heart_count,
            video_count: stats.video_count,
            avatar_url: non_empty(user.avatar_medium),
        }))
    }
}
