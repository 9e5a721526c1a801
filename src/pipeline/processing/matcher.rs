use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::constants::{POPULAR_USAGE_THRESHOLD, VIRAL_USAGE_THRESHOLD};
use crate::pipeline::processing::query::normalize;
use crate::types::CandidateSong;

/// A single piece of evidence that a candidate is the song the user asked for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Signal {
    /// A query token appears in the title (counted per token)
    TitleToken,
    /// A query token appears in the author (counted per token)
    AuthorToken,
    /// A query token appears in the album (counted per token)
    AlbumToken,
    /// Title and author both matched at least one token
    CrossField,
    /// Usage above 1,000
    PopularUsage,
    /// Usage above 100,000 (stacks with `PopularUsage`)
    ViralUsage,
    /// Curated catalogue song
    Official,
    AuthorIsArtist,
    HasOfficialArtists,
    /// Provider explicitly marked the row as not an original sound
    NonOriginal,
    /// Title contains "original sound": a user upload misfiled as a song
    OriginalSoundTitle,
}

impl Signal {
    pub fn is_token_match(&self) -> bool {
        matches!(self, Signal::TitleToken | Signal::AuthorToken | Signal::AlbumToken)
    }
}

/// Weight table for the scoring signals
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalWeights {
    pub title_token: i32,
    pub author_token: i32,
    pub album_token: i32,
    pub cross_field: i32,
    pub popular_usage: i32,
    pub viral_usage: i32,
    pub official: i32,
    pub author_is_artist: i32,
    pub has_official_artists: i32,
    pub non_original: i32,
    pub original_sound_title: i32,
}

impl Default for SignalWeights {
    fn default() -> Self {
        Self {
            title_token: 3,
            author_token: 3,
            album_token: 1,
            cross_field: 10,
            popular_usage: 2,
            viral_usage: 3,
            official: 5,
            author_is_artist: 3,
            has_official_artists: 3,
            non_original: 3,
            original_sound_title: -10,
        }
    }
}

impl SignalWeights {
    pub fn weight(&self, signal: Signal) -> i32 {
        match signal {
            Signal::TitleToken => self.title_token,
            Signal::AuthorToken => self.author_token,
            Signal::AlbumToken => self.album_token,
            Signal::CrossField => self.cross_field,
            Signal::PopularUsage => self.popular_usage,
            Signal::ViralUsage => self.viral_usage,
            Signal::Official => self.official,
            Signal::AuthorIsArtist => self.author_is_artist,
            Signal::HasOfficialArtists => self.has_official_artists,
            Signal::NonOriginal => self.non_original,
            Signal::OriginalSoundTitle => self.original_sound_title,
        }
    }
}

/// A scored candidate, by index into the input slice
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredCandidate {
    pub index: usize,
    pub score: i32,
    pub signals: Vec<Signal>,
}

impl ScoredCandidate {
    pub fn has_token_match(&self) -> bool {
        self.signals.iter().any(Signal::is_token_match)
    }
}

/// Picks the best candidate song for a set of query tokens
#[derive(Debug, Clone, Default)]
pub struct SongMatcher {
    weights: SignalWeights,
    min_score: Option<i32>,
}

impl SongMatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_weights(weights: SignalWeights) -> Self {
        Self {
            weights,
            min_score: None,
        }
    }

    /// Reject winners scoring below `min_score`. Unset by default.
    pub fn with_min_score(mut self, min_score: Option<i32>) -> Self {
        self.min_score = min_score;
        self
    }

    /// Every signal the candidate fires, token signals once per matching token
    pub fn signals(&self, candidate: &CandidateSong, tokens: &[String]) -> Vec<Signal> {
        let title = normalize(&candidate.title);
        let author = normalize(&candidate.author);
        let album = normalize(candidate.album.as_deref().unwrap_or(""));

        let mut signals = Vec::new();
        let mut title_hits = 0;
        let mut author_hits = 0;

        for token in tokens {
            if title.contains(token.as_str()) {
                signals.push(Signal::TitleToken);
                title_hits += 1;
            }
            if author.contains(token.as_str()) {
                signals.push(Signal::AuthorToken);
                author_hits += 1;
            }
            if album.contains(token.as_str()) {
                signals.push(Signal::AlbumToken);
            }
        }

        if title_hits > 0 && author_hits > 0 {
            signals.push(Signal::CrossField);
        }
        if candidate.usage_count > POPULAR_USAGE_THRESHOLD {
            signals.push(Signal::PopularUsage);
        }
        if candidate.usage_count > VIRAL_USAGE_THRESHOLD {
            signals.push(Signal::ViralUsage);
        }
        if candidate.is_official {
            signals.push(Signal::Official);
        }
        if candidate.author_is_artist {
            signals.push(Signal::AuthorIsArtist);
        }
        if !candidate.official_artists.is_empty() {
            signals.push(Signal::HasOfficialArtists);
        }
        if candidate.is_original == Some(false) {
            signals.push(Signal::NonOriginal);
        }
        if title.contains("original sound") {
            signals.push(Signal::OriginalSoundTitle);
        }

        signals
    }

    pub fn score(&self, candidate: &CandidateSong, tokens: &[String]) -> i32 {
        self.signals(candidate, tokens)
            .into_iter()
            .map(|s| self.weights.weight(s))
            .sum()
    }

    /// Score every candidate and return the top one (first wins ties).
    pub fn best(&self, candidates: &[CandidateSong], tokens: &[String]) -> Option<ScoredCandidate> {
        let mut best: Option<ScoredCandidate> = None;

        for (index, candidate) in candidates.iter().enumerate() {
            let signals = self.signals(candidate, tokens);
            let score = signals.iter().map(|s| self.weights.weight(*s)).sum();
            debug!(title = %candidate.title, author = %candidate.author, score, "Scored candidate");

            if best.as_ref().map_or(true, |b| score > b.score) {
                best = Some(ScoredCandidate {
                    index,
                    score,
                    signals,
                });
            }
        }

        best
    }

    /// Select the matching candidate, or `None` when nothing is relevant.
    ///
    /// A winner must match at least one query token somewhere; otherwise the
    /// arithmetic maximum is returned even if it is low or negative, unless a
    /// minimum score was configured.
    pub fn select<'a>(
        &self,
        candidates: &'a [CandidateSong],
        tokens: &[String],
    ) -> Option<&'a CandidateSong> {
        let best = self.best(candidates, tokens)?;

        let any_relevant = best.has_token_match()
            || candidates
                .iter()
                .any(|c| self.signals(c, tokens).iter().any(Signal::is_token_match));
        if !any_relevant {
            debug!("No candidate matched any query token");
            return None;
        }

        if let Some(min) = self.min_score {
            if best.score < min {
                debug!(score = best.score, min, "Best candidate below minimum score");
                return None;
            }
        }

        candidates.get(best.index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    fn song(title: &str, author: &str) -> CandidateSong {
        CandidateSong {
            id: format!("{title}-{author}"),
            title: title.to_string(),
            author: author.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_luther_scores_every_expected_signal() {
        let matcher = SongMatcher::new();
        let candidate = CandidateSong {
            usage_count: 200_000,
            is_official: true,
            ..song("Luther", "Kendrick Lamar")
        };
        let q = tokens(&["kendrick", "lamar", "luther"]);

        let signals = matcher.signals(&candidate, &q);
        assert_eq!(signals.iter().filter(|s| **s == Signal::AuthorToken).count(), 2);
        assert!(signals.contains(&Signal::TitleToken));
        assert!(signals.contains(&Signal::CrossField));
        assert!(signals.contains(&Signal::PopularUsage));
        assert!(signals.contains(&Signal::ViralUsage));
        assert!(signals.contains(&Signal::Official));
        // 3 + 3 + 3 + 10 + 2 + 3 + 5
        assert_eq!(matcher.score(&candidate, &q), 29);
    }

    #[test]
    fn test_cross_field_bonus_is_at_least_ten() {
        let matcher = SongMatcher::new();
        let q = tokens(&["luther", "kendrick"]);
        let both = song("Luther", "Kendrick Lamar");
        let title_only = song("Luther", "Someone Else");

        let diff = matcher.score(&both, &q) - matcher.score(&title_only, &q);
        assert!(diff >= 10, "cross-field difference was {diff}");
    }

    #[test]
    fn test_usage_tiers_stack() {
        let matcher = SongMatcher::new();
        let q = tokens(&["zzz"]);
        let quiet = CandidateSong { usage_count: 1_000, ..song("a", "b") };
        let popular = CandidateSong { usage_count: 1_001, ..song("a", "b") };
        let viral = CandidateSong { usage_count: 100_001, ..song("a", "b") };

        assert_eq!(matcher.score(&quiet, &q), 0);
        assert_eq!(matcher.score(&popular, &q), 2);
        assert_eq!(matcher.score(&viral, &q), 5);
    }

    #[test]
    fn test_original_sound_title_penalty() {
        let matcher = SongMatcher::new();
        let q = tokens(&["luther"]);
        let fake = song("original sound - luther fan", "fan123");
        assert_eq!(matcher.signals(&fake, &q), vec![Signal::TitleToken, Signal::OriginalSoundTitle]);
        assert_eq!(matcher.score(&fake, &q), 3 - 10);
    }

    #[test]
    fn test_only_explicit_non_original_scores() {
        let matcher = SongMatcher::new();
        let q = tokens(&["zzz"]);
        let unknown = song("a", "b");
        let explicit = CandidateSong { is_original: Some(false), ..song("a", "b") };
        let original = CandidateSong { is_original: Some(true), ..song("a", "b") };

        assert_eq!(matcher.score(&unknown, &q), 0);
        assert_eq!(matcher.score(&explicit, &q), 3);
        assert_eq!(matcher.score(&original, &q), 0);
    }

    #[test]
    fn test_ties_keep_first_candidate() {
        let matcher = SongMatcher::new();
        let q = tokens(&["monaco"]);
        let candidates = vec![song("Monaco", "A"), song("Monaco", "B")];

        for _ in 0..3 {
            let picked = matcher.select(&candidates, &q).unwrap();
            assert_eq!(picked.author, "A");
        }
    }

    #[test]
    fn test_no_token_match_selects_nothing() {
        let matcher = SongMatcher::new();
        let q = tokens(&["nothing", "matches"]);
        let candidates = vec![CandidateSong { usage_count: 500_000, is_official: true, ..song("Luther", "Kendrick Lamar") }];
        assert!(matcher.select(&candidates, &q).is_none());
        assert!(matcher.select(&[], &q).is_none());
    }

    #[test]
    fn test_negative_best_still_selected_without_floor() {
        let matcher = SongMatcher::new();
        let q = tokens(&["luther"]);
        let candidates = vec![song("original sound luther", "fan")];
        assert!(matcher.select(&candidates, &q).is_some());

        let floored = SongMatcher::new().with_min_score(Some(1));
        assert!(floored.select(&candidates, &q).is_none());
    }

    #[test]
    fn test_accented_titles_match_plain_tokens() {
        let matcher = SongMatcher::new();
        let q = tokens(&["monaco", "bunny"]);
        let candidate = song("MÓNACO", "Bad Bunny");
        assert!(matcher.signals(&candidate, &q).contains(&Signal::CrossField));
    }

    #[test]
    fn test_custom_weights_change_the_winner() {
        let q = tokens(&["luther"]);
        let by_title = song("Luther", "x");
        let by_album = CandidateSong { album: Some("Luther".into()), ..song("x", "y") };
        let candidates = vec![by_album, by_title];

        let default_pick = SongMatcher::new().select(&candidates, &q).unwrap();
        assert_eq!(default_pick.title, "Luther");

        let album_heavy = SongMatcher::with_weights(SignalWeights { album_token: 9, ..Default::default() });
        let album_pick = album_heavy.select(&candidates, &q).unwrap();
        assert_eq!(album_pick.title, "x");
    }
}
