use tracing::debug;

use crate::constants::{
    AMAZON_MUSIC_ALBUM_URL, AMAZON_MUSIC_CODE, APPLE_MUSIC_CODE, APPLE_MUSIC_SONG_URL,
    SPOTIFY_CODE, SPOTIFY_TRACK_URL,
};
use crate::types::{StreamingId, StreamingLinks};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamingPlatform {
    AppleMusic,
    AmazonMusic,
    Spotify,
}

impl StreamingPlatform {
    /// The single canonical code mapping: 1 Apple Music, 2 Amazon Music, 3 Spotify
    pub fn from_code(code: u32) -> Option<Self> {
        match code {
            APPLE_MUSIC_CODE => Some(StreamingPlatform::AppleMusic),
            AMAZON_MUSIC_CODE => Some(StreamingPlatform::AmazonMusic),
            SPOTIFY_CODE => Some(StreamingPlatform::Spotify),
            _ => None,
        }
    }

    pub fn track_url(&self, song_id: &str) -> String {
        let base = match self {
            StreamingPlatform::AppleMusic => APPLE_MUSIC_SONG_URL,
            StreamingPlatform::AmazonMusic => AMAZON_MUSIC_ALBUM_URL,
            StreamingPlatform::Spotify => SPOTIFY_TRACK_URL,
        };
        format!("{}/{}", base, song_id)
    }
}

/// Build streaming links from a platform-code → track-id list. Later entries
/// for the same platform overwrite earlier ones.
pub fn streaming_links(ids: &[StreamingId]) -> StreamingLinks {
    let mut links = StreamingLinks::default();

    for id in ids {
        if id.song_id.trim().is_empty() {
            continue;
        }
        let Some(platform) = StreamingPlatform::from_code(id.platform) else {
            debug!(platform = id.platform, "Ignoring unknown streaming platform code");
            continue;
        };
        let url = Some(platform.track_url(&id.song_id));
        match platform {
            StreamingPlatform::AppleMusic => links.apple_music = url,
            StreamingPlatform::AmazonMusic => links.amazon_music = url,
            StreamingPlatform::Spotify => links.spotify = url,
        }
    }

    links
}
