use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, instrument, warn};

use crate::app::ports::{KeywordSearchPort, SoundSearchPort};
use crate::error::Result;
use crate::observability::metrics::{self as finder_metrics, StrategyOutcome};
use crate::pipeline::processing::matcher::SongMatcher;
use crate::pipeline::processing::query::Query;
use crate::types::{CandidateSong, ResolvedSong, SongOrigin};

/// One way of finding the song for a query
#[async_trait]
pub trait SongSearchStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    /// `Ok(None)` means the strategy ran but nothing matched
    async fn find_song(&self, query: &Query, matcher: &SongMatcher) -> Result<Option<ResolvedSong>>;
}

/// Strategy A: search sounds directly
pub struct DirectSoundSearch {
    provider: Arc<dyn SoundSearchPort>,
    limit: usize,
}

impl DirectSoundSearch {
    pub fn new(provider: Arc<dyn SoundSearchPort>, limit: usize) -> Self {
        Self { provider, limit }
    }
}

#[async_trait]
impl SongSearchStrategy for DirectSoundSearch {
    fn name(&self) -> &'static str {
        "sound_search"
    }

    async fn find_song(&self, query: &Query, matcher: &SongMatcher) -> Result<Option<ResolvedSong>> {
        let candidates = self.provider.search_sounds(query.raw(), self.limit).await?;
        info!("{} sounds found", candidates.len());
        Ok(pick(candidates, query, matcher, SongOrigin::SoundSearch))
    }
}

/// Strategy B: search videos by keyword and score the songs they use
pub struct KeywordVideoSearch {
    provider: Arc<dyn KeywordSearchPort>,
}

impl KeywordVideoSearch {
    pub fn new(provider: Arc<dyn KeywordSearchPort>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl SongSearchStrategy for KeywordVideoSearch {
    fn name(&self) -> &'static str {
        "keyword_search"
    }

    async fn find_song(&self, query: &Query, matcher: &SongMatcher) -> Result<Option<ResolvedSong>> {
        let items = self.provider.search_videos(query.raw()).await?;
        info!("{} videos found", items.len());
        let songs: Vec<CandidateSong> = items.into_iter().filter_map(|item| item.song).collect();
        Ok(pick(songs, query, matcher, SongOrigin::KeywordSearch))
    }
}

fn pick(
    candidates: Vec<CandidateSong>,
    query: &Query,
    matcher: &SongMatcher,
    origin: SongOrigin,
) -> Option<ResolvedSong> {
    let best = matcher.select(&candidates, query.tokens())?.clone();
    Some(ResolvedSong::from_candidate(best, origin))
}

/// Runs song search strategies in priority order, stopping at the first hit.
///
/// A failing strategy is logged and treated as having found nothing.
pub struct SourceFallbackController {
    strategies: Vec<Box<dyn SongSearchStrategy>>,
    matcher: SongMatcher,
}

impl SourceFallbackController {
    pub fn new(strategies: Vec<Box<dyn SongSearchStrategy>>, matcher: SongMatcher) -> Self {
        Self { strategies, matcher }
    }

    #[instrument(skip(self, query), fields(query = %query.raw()))]
    pub async fn resolve(&self, query: &Query) -> Option<ResolvedSong> {
        for strategy in &self.strategies {
            info!(strategy = strategy.name(), "Searching for song");
            match strategy.find_song(query, &self.matcher).await {
                Ok(Some(song)) => {
                    info!(
                        strategy = strategy.name(),
                        clip_id = %song.clip_id,
                        "Song: \"{}\" by {}",
                        song.title,
                        song.author
                    );
                    finder_metrics::strategy_outcome(strategy.name(), StrategyOutcome::Hit);
                    return Some(song);
                }
                Ok(None) => {
                    info!(strategy = strategy.name(), "No matching song");
                    finder_metrics::strategy_outcome(strategy.name(), StrategyOutcome::Miss);
                }
                Err(e) => {
                    warn!(strategy = strategy.name(), "Song search failed: {}", e);
                    finder_metrics::strategy_outcome(strategy.name(), StrategyOutcome::Error);
                }
            }
        }

        info!("No relevant song found");
        None
    }
}
