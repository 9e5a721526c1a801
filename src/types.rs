use serde::{Deserialize, Serialize};

/// One unconfirmed song row returned by a search provider
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CandidateSong {
    /// Provider clip/track id, kept as a string to avoid precision loss
    pub id: String,
    pub title: String,
    pub author: String,
    pub album: Option<String>,
    /// Number of videos using the sound
    pub usage_count: u64,
    /// `Some(false)` only when the provider explicitly says it is not an original sound
    pub is_original: Option<bool>,
    /// Curated/official catalogue song
    pub is_official: bool,
    /// The author string is the credited artist
    pub author_is_artist: bool,
    /// Official artist handles attached to the row, if any
    pub official_artists: Vec<String>,
    pub cover_url: Option<String>,
}

/// Which search strategy produced the resolved song
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SongOrigin {
    SoundSearch,
    KeywordSearch,
}

/// The single song selected for a query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedSong {
    pub title: String,
    pub author: String,
    pub album: Option<String>,
    pub clip_id: String,
    pub usage_count: u64,
    pub cover_url: Option<String>,
    pub origin: SongOrigin,
}

impl ResolvedSong {
    pub fn from_candidate(candidate: CandidateSong, origin: SongOrigin) -> Self {
        Self {
            title: candidate.title,
            author: candidate.author,
            album: candidate.album.filter(|a| !a.trim().is_empty()),
            clip_id: candidate.id,
            usage_count: candidate.usage_count,
            cover_url: candidate.cover_url,
            origin,
        }
    }
}

/// A keyword-search hit: a video that may embed a song record
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawVideoItem {
    pub video_id: Option<String>,
    pub song: Option<CandidateSong>,
}

/// Official artist attached to a song
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OfficialArtist {
    pub handle: String,
    pub nickname: Option<String>,
    pub verified: bool,
}

/// External track id on a streaming platform
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamingId {
    pub platform: u32,
    pub song_id: String,
}

/// Song detail record from the song-detail provider
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SongDetails {
    pub title: Option<String>,
    pub author: Option<String>,
    pub album: Option<String>,
    pub owner_handle: Option<String>,
    pub owner_nickname: Option<String>,
    pub is_original_sound: bool,
    pub usage_count: Option<u64>,
    pub artists: Vec<OfficialArtist>,
    pub streaming_ids: Vec<StreamingId>,
    pub cover_url: Option<String>,
}

/// Primary-platform profile of one artist handle
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SocialProfile {
    pub handle: String,
    #[serde(rename = "nickname")]
    pub display_name: String,
    pub bio: String,
    pub bio_link: Option<String>,
    pub verified: bool,
    pub followers: u64,
    pub likes: u64,
    pub video_count: u64,
    pub avatar_url: Option<String>,
}

impl SocialProfile {
    /// Profile used when the provider knows nothing about the handle
    pub fn placeholder(handle: &str) -> Self {
        Self {
            handle: handle.to_string(),
            display_name: handle.to_string(),
            ..Default::default()
        }
    }
}

/// Where a secondary identity was found
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentitySource {
    DirectLink,
    BioTextPattern,
    AggregatorLink,
    BioMention,
    NotFound,
}

impl IdentitySource {
    pub fn as_str(&self) -> &'static str {
        match self {
            IdentitySource::DirectLink => "direct_link",
            IdentitySource::BioTextPattern => "bio_text_pattern",
            IdentitySource::AggregatorLink => "aggregator_link",
            IdentitySource::BioMention => "bio_mention",
            IdentitySource::NotFound => "not_found",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

impl Confidence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Confidence::High => "high",
            Confidence::Medium => "medium",
            Confidence::Low => "low",
        }
    }
}

/// Secondary-platform (Instagram) identity derived from a profile's bio and link
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecondaryIdentity {
    pub handle: Option<String>,
    pub source: IdentitySource,
    pub confidence: Confidence,
}

impl SecondaryIdentity {
    pub fn not_found() -> Self {
        Self {
            handle: None,
            source: IdentitySource::NotFound,
            confidence: Confidence::Low,
        }
    }

    pub fn profile_url(&self) -> Option<String> {
        self.handle
            .as_ref()
            .map(|h| format!("{}/{}", crate::constants::SECONDARY_PROFILE_URL, h))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamingLinks {
    pub spotify: Option<String>,
    pub apple_music: Option<String>,
    pub amazon_music: Option<String>,
}

impl StreamingLinks {
    pub fn is_empty(&self) -> bool {
        self.spotify.is_none() && self.apple_music.is_none() && self.amazon_music.is_none()
    }
}

/// One artist in the final output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtistResult {
    #[serde(rename = "tiktok")]
    pub profile: SocialProfile,
    pub song: ResolvedSong,
    #[serde(rename = "instagram")]
    pub secondary: SecondaryIdentity,
    pub streaming: StreamingLinks,
}

/// A row of the sound listing surface
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SoundSummary {
    pub clip_id: String,
    pub title: String,
    pub author: String,
    pub album: Option<String>,
    pub duration_secs: Option<u64>,
    pub usage_count: u64,
    pub is_original_sound: bool,
    pub artists: Vec<OfficialArtist>,
    pub streaming: StreamingLinks,
}

/// First page of a sound listing
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SoundListing {
    pub sounds: Vec<SoundSummary>,
    pub has_more: bool,
    pub total: Option<u64>,
}
