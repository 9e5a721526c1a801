use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use crate::app::ports::SongDetailPort;
use crate::observability::metrics as finder_metrics;
use crate::pipeline::processing::streaming::streaming_links;
use crate::types::{ResolvedSong, SongDetails, StreamingLinks};

/// Handles found for a resolved song, plus what the detail lookup taught us
#[derive(Debug, Clone, PartialEq)]
pub struct ArtistResolution {
    pub song: ResolvedSong,
    pub handles: Vec<String>,
    pub streaming: StreamingLinks,
}

/// Turns a resolved song into a priority-ordered list of primary-platform handles
pub struct ArtistResolver {
    details: Arc<dyn SongDetailPort>,
}

impl ArtistResolver {
    pub fn new(details: Arc<dyn SongDetailPort>) -> Self {
        Self { details }
    }

    /// Official artists first, then the original-sound owner, then a guess
    /// derived from the author string. An empty list is a normal outcome.
    #[instrument(skip(self, song), fields(clip_id = %song.clip_id))]
    pub async fn resolve(&self, song: ResolvedSong, max_results: usize) -> ArtistResolution {
        let details = match self.details.song_details(&song.clip_id).await {
            Ok(details) => details,
            Err(e) => {
                warn!(provider = self.details.provider_name(), "Song detail lookup failed: {}", e);
                finder_metrics::upstream_error(self.details.provider_name(), "song_details");
                None
            }
        };

        let mut song = song;
        let mut streaming = StreamingLinks::default();
        let mut handles = Vec::new();

        if let Some(details) = &details {
            song = refresh_song(song, details);
            streaming = streaming_links(&details.streaming_ids);
            handles = handles_from_details(details);
        }

        if handles.is_empty() {
            if let Some(guess) = derive_handle(&song.author) {
                info!("Falling back to @{} derived from \"{}\"", guess, song.author);
                handles.push(guess);
            }
        }

        let handles = dedupe_handles(handles, max_results);
        if handles.is_empty() {
            info!("No artist handles could be derived");
        }
        finder_metrics::handles_resolved(handles.len());

        ArtistResolution {
            song,
            handles,
            streaming,
        }
    }
}

/// Steps 1 and 2: official artist handles, or the owner of an unattributed original sound
pub fn handles_from_details(details: &SongDetails) -> Vec<String> {
    let official: Vec<String> = details
        .artists
        .iter()
        .map(|a| a.handle.trim().to_string())
        .filter(|h| !h.is_empty())
        .collect();

    if !official.is_empty() {
        for handle in &official {
            debug!("Official artist: @{}", handle);
        }
        return official;
    }

    match details.owner_handle.as_deref().map(str::trim) {
        Some(owner) if details.is_original_sound && !owner.is_empty() => {
            debug!("Original sound owner: @{}", owner);
            vec![owner.to_string()]
        }
        _ => Vec::new(),
    }
}

/// Guess a handle from an author display name: "Bad Bunny" → "badbunny".
/// Characters outside `[a-z0-9._]` are dropped, accented letters included.
pub fn derive_handle(author: &str) -> Option<String> {
    let guess: String = author
        .to_lowercase()
        .chars()
        .filter(|c| !c.is_whitespace())
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '.' || *c == '_')
        .collect();

    (guess.len() >= 2).then_some(guess)
}

/// Strip `@`, lowercase, drop blanks and duplicates, keep the first `max` handles
pub fn dedupe_handles(handles: Vec<String>, max: usize) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for handle in handles {
        let handle = handle.trim().trim_start_matches('@').to_lowercase();
        if handle.is_empty() || out.contains(&handle) {
            continue;
        }
        out.push(handle);
    }
    out.truncate(max);
    out
}

/// Prefer non-empty detail values over the search-time ones
fn refresh_song(mut song: ResolvedSong, details: &SongDetails) -> ResolvedSong {
    fn non_empty(value: &Option<String>) -> Option<String> {
        value.as_ref().map(|v| v.trim()).filter(|v| !v.is_empty()).map(str::to_string)
    }

    if let Some(title) = non_empty(&details.title) {
        song.title = title;
    }
    if let Some(author) = non_empty(&details.author) {
        song.author = author;
    }
    if let Some(album) = non_empty(&details.album) {
        song.album = Some(album);
    }
    if let Some(cover) = non_empty(&details.cover_url) {
        song.cover_url = Some(cover);
    }
    if let Some(usage) = details.usage_count {
        song.usage_count = usage;
    }
    song
}
