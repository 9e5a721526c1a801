/// Provider and platform constants shared across the codebase

// Provider names (used in logs, metrics labels and error messages)
pub const APIFY_PROVIDER: &str = "apify";
pub const SOCIAVAULT_PROVIDER: &str = "sociavault";

// Provider endpoints
pub const APIFY_API_BASE: &str = "https://api.apify.com/v2";
pub const SOCIAVAULT_API_BASE: &str = "https://api.sociavault.com/v1/scrape";

// Apify actors
pub const APIFY_SOUND_SEARCH_ACTOR: &str = "axlymxp~tiktok-music-scraper";
pub const APIFY_KEYWORD_VIDEO_ACTOR: &str = "apidojo~tiktok-scraper";
pub const APIFY_PROFILE_ACTOR: &str = "apidojo~tiktok-profile-scraper";

// SociaVault endpoints
pub const SOCIAVAULT_KEYWORD_SEARCH: &str = "tiktok/search/keyword";
pub const SOCIAVAULT_MUSIC_DETAILS: &str = "tiktok/music/details";
pub const SOCIAVAULT_PROFILE: &str = "tiktok/profile";
pub const SOCIAVAULT_MUSIC_SEARCH: &str = "tiktok/search/music";

// Credentials
pub const APIFY_TOKEN_ENV: &str = "APIFY_API_TOKEN";
pub const SOCIAVAULT_KEY_ENV: &str = "SOCIAVAULT_API_KEY";
pub const APIFY_TOKEN_PREFIX: &str = "apify_api_";
pub const SOCIAVAULT_KEY_PREFIX: &str = "sk_live_";

// Platform names
pub const PRIMARY_PLATFORM_NAME: &str = "tiktok";
pub const SECONDARY_PROFILE_URL: &str = "https://instagram.com";

// Streaming link templates, keyed by the provider's platform code
pub const APPLE_MUSIC_CODE: u32 = 1;
pub const AMAZON_MUSIC_CODE: u32 = 2;
pub const SPOTIFY_CODE: u32 = 3;
pub const APPLE_MUSIC_SONG_URL: &str = "https://music.apple.com/song";
pub const AMAZON_MUSIC_ALBUM_URL: &str = "https://music.amazon.com/albums";
pub const SPOTIFY_TRACK_URL: &str = "https://open.spotify.com/track";

// Popularity thresholds for the song matcher
pub const POPULAR_USAGE_THRESHOLD: u64 = 1_000;
pub const VIRAL_USAGE_THRESHOLD: u64 = 100_000;

/// Secondary-platform handle length limit
pub const MAX_HANDLE_LEN: usize = 30;

/// Words that look like handles but never are
pub const EXCLUDED_HANDLE_WORDS: &[&str] = &[
    "gmail", "email", "com", "net", "org", "www", "http", "https", "the", "and", "for", "you",
    "link", "bio", "here", "click",
];

/// Instagram URL path segments that are not profiles
pub const RESERVED_PROFILE_PATHS: &[&str] =
    &["p", "reel", "reels", "explore", "stories", "tv", "accounts"];

/// Link-in-bio hubs; their presence hints at a secondary profile we cannot read
pub const AGGREGATOR_DOMAINS: &[&str] = &[
    "linktr.ee",
    "linkin.bio",
    "beacons.ai",
    "bio.link",
    "linkbio",
    "allmylinks",
    "snipfeed",
    "stan.store",
];
