use std::sync::Arc;
use std::time::Instant;

use futures::stream::{self, StreamExt};
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::apis::{ApifyClient, SociaVaultClient};
use crate::app::ports::{HttpClientPort, KeywordSearchPort, ProfilePort, SongDetailPort, SoundSearchPort};
use crate::config::{Config, Credentials, Provider};
use crate::error::Result;
use crate::infra::{Limits, RateLimiter, ReqwestHttp};
use crate::observability::metrics as finder_metrics;
use crate::pipeline::processing::artists::{ArtistResolution, ArtistResolver};
use crate::pipeline::processing::identity::SocialIdentityExtractor;
use crate::pipeline::processing::matcher::SongMatcher;
use crate::pipeline::processing::query::Query;
use crate::pipeline::processing::ranking::rank_results;
use crate::pipeline::sources::{DirectSoundSearch, KeywordVideoSearch, SourceFallbackController};
use crate::types::{ArtistResult, SocialProfile};

#[derive(Debug, Clone)]
pub struct ResolveOptions {
    pub sound_limit: usize,
    pub enrichment_concurrency: usize,
    pub min_match_score: Option<i32>,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            sound_limit: 10,
            enrichment_concurrency: 3,
            min_match_score: None,
        }
    }
}

impl From<&Config> for ResolveOptions {
    fn from(config: &Config) -> Self {
        Self {
            sound_limit: config.search.sound_limit,
            enrichment_concurrency: config.search.enrichment_concurrency,
            min_match_score: config.search.min_match_score,
        }
    }
}

/// Provider capabilities the use case is built from
#[derive(Clone)]
pub struct FinderPorts {
    pub sound_search: Arc<dyn SoundSearchPort>,
    pub keyword_search: Arc<dyn KeywordSearchPort>,
    pub song_details: Arc<dyn SongDetailPort>,
    pub profiles: Arc<dyn ProfilePort>,
}

/// Query → song → artist handles → enriched, ranked artist results
pub struct ResolveArtistsUseCase {
    songs: SourceFallbackController,
    artists: ArtistResolver,
    profiles: Arc<dyn ProfilePort>,
    identities: SocialIdentityExtractor,
    concurrency: usize,
}

impl ResolveArtistsUseCase {
    pub fn new(ports: FinderPorts, options: ResolveOptions) -> Self {
        let matcher = SongMatcher::new().with_min_score(options.min_match_score);
        let songs = SourceFallbackController::new(
            vec![
                Box::new(DirectSoundSearch::new(ports.sound_search, options.sound_limit)),
                Box::new(KeywordVideoSearch::new(ports.keyword_search)),
            ],
            matcher,
        );

        Self {
            songs,
            artists: ArtistResolver::new(ports.song_details),
            profiles: ports.profiles,
            identities: SocialIdentityExtractor::new(),
            concurrency: options.enrichment_concurrency.max(1),
        }
    }

    /// Wire the real provider clients. Fails before any network call when a
    /// credential is missing or malformed.
    pub fn from_config(config: &Config, credentials: &Credentials) -> Result<Self> {
        let apify = Arc::new(ApifyClient::new(
            provider_http(config)?,
            credentials.apify_token()?,
        ));
        let sociavault = Arc::new(SociaVaultClient::new(
            provider_http(config)?,
            credentials.sociavault_key()?,
        ));

        let ports = wire_ports(config, apify, sociavault);
        Ok(Self::new(ports, ResolveOptions::from(config)))
    }

    /// Never fails: provider errors and "nothing found" both end in an empty list
    pub async fn resolve_artists(&self, query: &str, max_results: usize) -> Vec<ArtistResult> {
        let span = info_span!("resolve_artists", search_id = %Uuid::new_v4(), query);
        self.resolve_inner(query, max_results).instrument(span).await
    }

    /// First (best-ranked) artist for a query
    pub async fn find_artist(&self, query: &str) -> Option<ArtistResult> {
        self.resolve_artists(query, 5).await.into_iter().next()
    }

    async fn resolve_inner(&self, raw: &str, max_results: usize) -> Vec<ArtistResult> {
        let started = Instant::now();
        finder_metrics::search_started();

        let query = Query::new(raw);
        if query.is_empty() {
            info!("Query has no usable tokens");
            finder_metrics::resolution_completed(0, started.elapsed().as_secs_f64());
            return Vec::new();
        }

        let results = match self.songs.resolve(&query).await {
            Some(song) => {
                let resolution = self.artists.resolve(song, max_results.max(1)).await;
                self.enrich(resolution).await
            }
            None => Vec::new(),
        };

        info!("{} artists found in {:.1}s", results.len(), started.elapsed().as_secs_f64());
        finder_metrics::resolution_completed(results.len(), started.elapsed().as_secs_f64());
        results
    }

    /// Profile fetch + identity extraction per handle, bounded and order-preserving
    async fn enrich(&self, resolution: ArtistResolution) -> Vec<ArtistResult> {
        let ArtistResolution {
            song,
            handles,
            streaming,
        } = resolution;
        if handles.is_empty() {
            return Vec::new();
        }

        let enriched: Vec<Option<ArtistResult>> = stream::iter(handles)
            .map(|handle| {
                let song = song.clone();
                let streaming = streaming.clone();
                async move {
                    let profile = self.fetch_profile(&handle).await?;
                    let secondary = self.identities.extract(&profile.bio, profile.bio_link.as_deref());
                    finder_metrics::identity_found(secondary.source);
                    if let Some(ig) = &secondary.handle {
                        info!(handle = %handle, "Secondary handle @{} ({})", ig, secondary.source.as_str());
                    }
                    Some(ArtistResult {
                        profile,
                        song,
                        secondary,
                        streaming,
                    })
                }
            })
            .buffered(self.concurrency)
            .collect()
            .await;

        let mut results: Vec<ArtistResult> = enriched.into_iter().flatten().collect();
        rank_results(&mut results);
        results
    }

    /// A failed lookup drops the handle; an empty one keeps it as a placeholder
    async fn fetch_profile(&self, handle: &str) -> Option<SocialProfile> {
        match self.profiles.profile(handle).await {
            Ok(Some(mut profile)) => {
                if profile.handle.trim().is_empty() {
                    profile.handle = handle.to_string();
                }
                finder_metrics::profile_enriched(true);
                Some(profile)
            }
            Ok(None) => {
                finder_metrics::profile_enriched(false);
                Some(SocialProfile::placeholder(handle))
            }
            Err(e) => {
                warn!(
                    provider = self.profiles.provider_name(),
                    "Profile lookup for @{} failed: {}", handle, e
                );
                finder_metrics::upstream_error(self.profiles.provider_name(), "profile");
                None
            }
        }
    }
}

/// Sound search always runs on Apify and song details on SociaVault; the
/// keyword fallback and profile lookups follow the configured providers.
fn wire_ports(
    config: &Config,
    apify: Arc<ApifyClient>,
    sociavault: Arc<SociaVaultClient>,
) -> FinderPorts {
    let keyword_search: Arc<dyn KeywordSearchPort> = match config.search.keyword_source {
        Provider::Apify => apify.clone(),
        Provider::Sociavault => sociavault.clone(),
    };
    let profiles: Arc<dyn ProfilePort> = match config.search.profile_source {
        Provider::Apify => apify.clone(),
        Provider::Sociavault => sociavault.clone(),
    };

    FinderPorts {
        sound_search: apify,
        keyword_search,
        song_details: sociavault,
        profiles,
    }
}

/// One HTTP adapter per provider so each gets its own rate budget
pub fn provider_http(config: &Config) -> Result<Arc<dyn HttpClientPort>> {
    let limiter = RateLimiter::new(Limits::from(&config.http));
    let http = ReqwestHttp::new(config.http.timeout_seconds)?.with_limiter(Arc::new(limiter));
    Ok(Arc::new(http))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::apis::test_support::CannedHttp;
    use crate::error::FinderError;
    use crate::types::{CandidateSong, OfficialArtist, RawVideoItem, SongDetails};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Sounds(Vec<CandidateSong>, AtomicUsize);

    #[async_trait]
    impl SoundSearchPort for Sounds {
        fn provider_name(&self) -> &'static str {
            "sounds"
        }
        async fn search_sounds(&self, _q: &str, _limit: usize) -> Result<Vec<CandidateSong>> {
            self.1.fetch_add(1, Ordering::SeqCst);
            Ok(self.0.clone())
        }
    }

    struct NoVideos;

    #[async_trait]
    impl KeywordSearchPort for NoVideos {
        fn provider_name(&self) -> &'static str {
            "videos"
        }
        async fn search_videos(&self, _q: &str) -> Result<Vec<RawVideoItem>> {
            Ok(Vec::new())
        }
    }

    struct Details(SongDetails);

    #[async_trait]
    impl SongDetailPort for Details {
        fn provider_name(&self) -> &'static str {
            "details"
        }
        async fn song_details(&self, _id: &str) -> Result<Option<SongDetails>> {
            Ok(Some(self.0.clone()))
        }
    }

    /// Known profiles; `"broken"` fails, anything else is unknown
    struct Profiles(HashMap<&'static str, SocialProfile>);

    #[async_trait]
    impl ProfilePort for Profiles {
        fn provider_name(&self) -> &'static str {
            "profiles"
        }
        async fn profile(&self, handle: &str) -> Result<Option<SocialProfile>> {
            if handle == "broken" {
                return Err(FinderError::api("profiles", 500, "boom"));
            }
            Ok(self.0.get(handle).cloned())
        }
    }

    fn artist(handle: &str) -> OfficialArtist {
        OfficialArtist {
            handle: handle.into(),
            nickname: None,
            verified: true,
        }
    }

    fn use_case(artists: &[&str], sounds: Arc<Sounds>) -> ResolveArtistsUseCase {
        let mut known = HashMap::new();
        known.insert(
            "sza",
            SocialProfile {
                verified: true,
                followers: 30_000_000,
                bio: "ig: sza".into(),
                ..SocialProfile::placeholder("sza")
            },
        );
        known.insert(
            "kendricklamar",
            SocialProfile {
                verified: true,
                followers: 12_000_000,
                ..SocialProfile::placeholder("kendricklamar")
            },
        );

        ResolveArtistsUseCase::new(
            FinderPorts {
                sound_search: sounds,
                keyword_search: Arc::new(NoVideos),
                song_details: Arc::new(Details(SongDetails {
                    artists: artists.iter().map(|h| artist(h)).collect(),
                    ..Default::default()
                })),
                profiles: Arc::new(Profiles(known)),
            },
            ResolveOptions::default(),
        )
    }

    fn luther() -> Arc<Sounds> {
        Arc::new(Sounds(
            vec![CandidateSong {
                id: "7439000000000000001".into(),
                title: "Luther".into(),
                author: "Kendrick Lamar".into(),
                usage_count: 200_000,
                is_official: true,
                ..Default::default()
            }],
            AtomicUsize::new(0),
        ))
    }

    #[tokio::test]
    async fn test_results_are_enriched_and_ranked() {
        let finder = use_case(&["kendricklamar", "broken", "sza", "unknownfeature"], luther());
        let results = finder.resolve_artists("kendrick lamar luther", 5).await;

        let handles: Vec<&str> = results.iter().map(|r| r.profile.handle.as_str()).collect();
        assert_eq!(handles, vec!["sza", "kendricklamar", "unknownfeature"]);
        assert_eq!(results[0].secondary.handle.as_deref(), Some("sza"));
        assert_eq!(results[2].profile.display_name, "unknownfeature");
        assert!(results.iter().all(|r| r.song.clip_id == "7439000000000000001"));
    }

    #[tokio::test]
    async fn test_max_results_bounds_handles() {
        let finder = use_case(&["kendricklamar", "sza"], luther());
        let results = finder.resolve_artists("kendrick lamar luther", 1).await;
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].profile.handle, "kendricklamar");
    }

    #[tokio::test]
    async fn test_blank_query_makes_no_calls() {
        let sounds = luther();
        let finder = use_case(&["sza"], sounds.clone());
        assert!(finder.resolve_artists("   ", 5).await.is_empty());
        assert!(finder.resolve_artists("a", 5).await.is_empty());
        assert_eq!(sounds.1.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_find_artist_returns_top_result() {
        let finder = use_case(&["kendricklamar", "sza"], luther());
        let top = finder.find_artist("luther kendrick").await.unwrap();
        assert_eq!(top.profile.handle, "sza");
    }

    #[test]
    fn test_from_config_requires_credentials() {
        let err = ResolveArtistsUseCase::from_config(&Config::default(), &Credentials::default())
            .err()
            .unwrap();
        assert!(err.is_configuration());

        let creds = Credentials {
            apify_token: Some("apify_api_x".into()),
            sociavault_key: Some("wrong".into()),
        };
        assert!(ResolveArtistsUseCase::from_config(&Config::default(), &creds)
            .err()
            .unwrap()
            .is_configuration());
    }
    #[test]
    fn test_keyword_and_profile_sources_follow_config() {
        let http: Arc<dyn HttpClientPort> =
            Arc::new(CannedHttp::new(200, serde_json::Value::Null));
        let apify = Arc::new(ApifyClient::new(http.clone(), "apify_api_x"));
        let sociavault = Arc::new(SociaVaultClient::new(http, "sk_live_x"));

        let ports = wire_ports(&Config::default(), apify.clone(), sociavault.clone());
        assert_eq!(ports.sound_search.provider_name(), "apify");
        assert_eq!(ports.keyword_search.provider_name(), "sociavault");
        assert_eq!(ports.song_details.provider_name(), "sociavault");
        assert_eq!(ports.profiles.provider_name(), "apify");

        let mut config = Config::default();
        config.search.keyword_source = Provider::Apify;
        config.search.profile_source = Provider::Sociavault;
        let ports = wire_ports(&config, apify, sociavault);
        assert_eq!(ports.keyword_search.provider_name(), "apify");
        assert_eq!(ports.profiles.provider_name(), "sociavault");
    }
}
