//! Secondary identity (Instagram handle) extraction from a TikTok bio.
//!
//! Extraction is an ordered cascade of strategies; the first strategy that
//! produces an identity wins and its confidence tier is final.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::constants::{
    AGGREGATOR_DOMAINS, EXCLUDED_HANDLE_WORDS, MAX_HANDLE_LEN, PRIMARY_PLATFORM_NAME,
    RESERVED_PROFILE_PATHS,
};
use crate::types::{Confidence, IdentitySource, SecondaryIdentity};

/// Canonical profile URLs (any subdomain), matched against the whole bio link
static DIRECT_LINK_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r"(?i)^\s*(?:https?://)?(?:[a-z0-9-]+\.)?instagram\.com/([a-zA-Z0-9._]{1,30})/?(?:\?.*)?\s*$").unwrap(),
        Regex::new(r"(?i)^\s*(?:https?://)?(?:[a-z0-9-]+\.)?instagr\.am/([a-zA-Z0-9._]{1,30})/?").unwrap(),
    ]
});

/// Explicit self-declarations in bio text, tried in order
static BIO_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        // "IG: @user", "insta=user", "instagram @user"
        Regex::new(r"(?i)\b(?:ig|insta|instagram)\s*[:=@]\s*@?([a-zA-Z0-9._]{1,30})").unwrap(),
        // "instagram.com/user"
        Regex::new(r"(?i)instagram\.com/([a-zA-Z0-9._]{1,30})/?").unwrap(),
        // "mi ig es @user", "insta @user"
        Regex::new(r"(?i)\b(?:mi\s+)?(?:ig|insta)\s+(?:es\s+)?@([a-zA-Z0-9._]{1,30})").unwrap(),
        // "IG - @user", "IG | user"
        Regex::new(r"(?i)\b(?:ig|insta|instagram)\s*[-|/\\]\s*@?([a-zA-Z0-9._]{1,30})").unwrap(),
        // camera emoji then handle
        Regex::new(r"📸\s*@?([a-zA-Z0-9._]{1,30})").unwrap(),
        // "follow me on ig @user"
        Regex::new(r"(?i)follow\s+(?:me\s+)?(?:on\s+)?(?:ig|insta|instagram)\s*[:@]?\s*@?([a-zA-Z0-9._]{1,30})").unwrap(),
        // "sígueme en instagram @user"
        Regex::new(r"(?i)s[ií]gueme\s+en\s+(?:ig|insta|instagram)\s*[:@]?\s*@?([a-zA-Z0-9._]{1,30})").unwrap(),
    ]
});

static MENTION_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"@([a-zA-Z0-9._]{3,30})").unwrap());

static HANDLE_CHARSET: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-zA-Z0-9._]+$").unwrap());

/// 1-30 chars of letters, digits, `.` and `_`, and not a common non-handle word
pub fn is_valid_handle(handle: &str) -> bool {
    if handle.is_empty() || handle.len() > MAX_HANDLE_LEN {
        return false;
    }
    if !HANDLE_CHARSET.is_match(handle) {
        return false;
    }
    let lower = handle.to_lowercase();
    !EXCLUDED_HANDLE_WORDS.contains(&lower.as_str())
}

/// Strip a leading `@` and trailing punctuation from a captured handle
pub fn clean_handle(handle: &str) -> String {
    handle
        .trim()
        .trim_start_matches('@')
        .trim_end_matches(|c: char| ",;!?)]}>.".contains(c))
        .trim()
        .to_string()
}

/// Handle from a canonical Instagram profile URL
pub fn handle_from_profile_url(url: &str) -> Option<String> {
    DIRECT_LINK_PATTERNS.iter().find_map(|pattern| {
        let captured = pattern.captures(url)?.get(1)?.as_str();
        let handle = clean_handle(captured);
        let reserved = RESERVED_PROFILE_PATHS.contains(&handle.to_lowercase().as_str());
        (!reserved && is_valid_handle(&handle)).then_some(handle)
    })
}

fn found(handle: Option<String>, source: IdentitySource, confidence: Confidence) -> SecondaryIdentity {
    SecondaryIdentity {
        handle,
        source,
        confidence,
    }
}

/// One step of the extraction cascade
pub trait IdentityStrategy: Send + Sync {
    fn name(&self) -> &'static str;
    fn extract(&self, bio: &str, link: Option<&str>) -> Option<SecondaryIdentity>;
}

/// The bio link is itself an Instagram profile URL
pub struct DirectLinkStrategy;

impl IdentityStrategy for DirectLinkStrategy {
    fn name(&self) -> &'static str {
        "direct_link"
    }

    fn extract(&self, _bio: &str, link: Option<&str>) -> Option<SecondaryIdentity> {
        let handle = handle_from_profile_url(link?)?;
        Some(found(Some(handle), IdentitySource::DirectLink, Confidence::High))
    }
}

/// An explicit "IG: @handle" style declaration in the bio
pub struct BioPatternStrategy;

impl IdentityStrategy for BioPatternStrategy {
    fn name(&self) -> &'static str {
        "bio_text_pattern"
    }

    fn extract(&self, bio: &str, _link: Option<&str>) -> Option<SecondaryIdentity> {
        BIO_PATTERNS.iter().find_map(|pattern| {
            let captured = pattern.captures(bio)?.get(1)?.as_str();
            let handle = clean_handle(captured);
            is_valid_handle(&handle)
                .then(|| found(Some(handle), IdentitySource::BioTextPattern, Confidence::High))
        })
    }
}

/// The bio link points at a link hub; there is probably a profile behind it
pub struct AggregatorLinkStrategy;

impl IdentityStrategy for AggregatorLinkStrategy {
    fn name(&self) -> &'static str {
        "aggregator_link"
    }

    fn extract(&self, _bio: &str, link: Option<&str>) -> Option<SecondaryIdentity> {
        let link = link?.to_lowercase();
        AGGREGATOR_DOMAINS
            .iter()
            .any(|domain| link.contains(domain))
            .then(|| found(None, IdentitySource::AggregatorLink, Confidence::Medium))
    }
}

/// Exactly one plausible bare `@mention` in the bio
pub struct BareMentionStrategy;

impl IdentityStrategy for BareMentionStrategy {
    fn name(&self) -> &'static str {
        "bio_mention"
    }

    fn extract(&self, bio: &str, _link: Option<&str>) -> Option<SecondaryIdentity> {
        let mut candidates: Vec<String> = Vec::new();
        for capture in MENTION_PATTERN.captures_iter(bio) {
            let handle = clean_handle(&capture[1]);
            if !is_valid_handle(&handle) || handle.to_lowercase().contains(PRIMARY_PLATFORM_NAME) {
                continue;
            }
            if !candidates.iter().any(|c| c.eq_ignore_ascii_case(&handle)) {
                candidates.push(handle);
            }
        }

        match candidates.as_slice() {
            [only] => Some(found(Some(only.clone()), IdentitySource::BioMention, Confidence::Low)),
            _ => None,
        }
    }
}

/// First-success-wins cascade over an ordered list of strategies
pub struct SocialIdentityExtractor {
    strategies: Vec<Box<dyn IdentityStrategy>>,
}

impl Default for SocialIdentityExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl SocialIdentityExtractor {
    pub fn new() -> Self {
        Self::with_strategies(vec![
            Box::new(DirectLinkStrategy),
            Box::new(BioPatternStrategy),
            Box::new(AggregatorLinkStrategy),
            Box::new(BareMentionStrategy),
        ])
    }

    pub fn with_strategies(strategies: Vec<Box<dyn IdentityStrategy>>) -> Self {
        Self { strategies }
    }

    pub fn extract(&self, bio: &str, link: Option<&str>) -> SecondaryIdentity {
        let link = link.map(str::trim).filter(|l| !l.is_empty());
        self.strategies
            .iter()
            .find_map(|strategy| strategy.extract(bio, link))
            .unwrap_or_else(SecondaryIdentity::not_found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(bio: &str, link: Option<&str>) -> SecondaryIdentity {
        SocialIdentityExtractor::new().extract(bio, link)
    }

    #[test]
    fn test_handle_validation() {
        assert!(is_valid_handle("realartist"));
        assert!(is_valid_handle("a"));
        assert!(is_valid_handle("bad.bunny_pr"));
        assert!(is_valid_handle(&"x".repeat(30)));
        assert!(!is_valid_handle(&"x".repeat(31)));
        assert!(!is_valid_handle(""));
        assert!(!is_valid_handle("has space"));
        assert!(!is_valid_handle("dash-name"));
        assert!(!is_valid_handle("gmail"));
        assert!(!is_valid_handle("Link"));
    }

    #[test]
    fn test_direct_link_is_high_confidence() {
        let id = extract("", Some("https://www.instagram.com/badbunnypr/?hl=en"));
        assert_eq!(id.handle.as_deref(), Some("badbunnypr"));
        assert_eq!(id.source, IdentitySource::DirectLink);
        assert_eq!(id.confidence, Confidence::High);

        let short = extract("", Some("instagr.am/rosalia.vt"));
        assert_eq!(short.handle.as_deref(), Some("rosalia.vt"));
    }

    #[test]
    fn test_mobile_subdomain_link_is_direct() {
        let id = extract("", Some("https://m.instagram.com/artist"));
        assert_eq!(id.handle.as_deref(), Some("artist"));
        assert_eq!(id.source, IdentitySource::DirectLink);
        assert_eq!(id.confidence, Confidence::High);
    }

    #[test]
    fn test_post_links_are_not_profiles() {
        let id = extract("", Some("https://instagram.com/p/"));
        assert_eq!(id.source, IdentitySource::NotFound);
    }

    #[test]
    fn test_camera_emoji_declaration() {
        let id = extract("📸 @realartist", None);
        assert_eq!(id.handle.as_deref(), Some("realartist"));
        assert_eq!(id.source, IdentitySource::BioTextPattern);
        assert_eq!(id.confidence, Confidence::High);
    }

    #[test]
    fn test_explicit_declarations() {
        let cases = [
            ("IG: @kendrick.lamar", "kendrick.lamar"),
            ("booking info below | insta - sza_official", "sza_official"),
            ("mi ig es @rosalia.vt", "rosalia.vt"),
            ("follow me on instagram @bunny!", "bunny"),
            ("sígueme en ig @karolg.", "karolg"),
            ("instagram.com/tylerthecreator", "tylerthecreator"),
        ];
        for (bio, expected) in cases {
            let id = extract(bio, None);
            assert_eq!(id.handle.as_deref(), Some(expected), "bio: {bio}");
            assert_eq!(id.confidence, Confidence::High, "bio: {bio}");
        }
    }

    #[test]
    fn test_declaration_beats_bare_mention() {
        let id = extract("mgmt @labelteam · IG: @realartist", None);
        assert_eq!(id.handle.as_deref(), Some("realartist"));
        assert_eq!(id.source, IdentitySource::BioTextPattern);
    }

    #[test]
    fn test_words_containing_ig_are_not_declarations() {
        let id = extract("Big: love to all", None);
        assert_eq!(id.source, IdentitySource::NotFound);
    }

    #[test]
    fn test_aggregator_link_has_no_handle() {
        let id = extract("check my links in bio", Some("https://linktr.ee/someartist"));
        assert_eq!(id.handle, None);
        assert_eq!(id.source, IdentitySource::AggregatorLink);
        assert_eq!(id.confidence, Confidence::Medium);
    }

    #[test]
    fn test_single_mention_is_low_confidence() {
        let id = extract("new album out now @artistname", None);
        assert_eq!(id.handle.as_deref(), Some("artistname"));
        assert_eq!(id.source, IdentitySource::BioMention);
        assert_eq!(id.confidence, Confidence::Low);
    }

    #[test]
    fn test_ambiguous_mentions_resolve_nothing() {
        let id = extract("shoutout @producerone and @producertwo", None);
        assert_eq!(id, SecondaryIdentity::not_found());
    }

    #[test]
    fn test_primary_platform_mentions_are_ignored() {
        let id = extract("backup @artist_tiktok main @realone", None);
        assert_eq!(id.handle.as_deref(), Some("realone"));
    }

    #[test]
    fn test_repeated_mention_counts_once() {
        let id = extract("@realone tour dates @RealOne", None);
        assert_eq!(id.handle.as_deref(), Some("realone"));
    }

    #[test]
    fn test_nothing_found() {
        let id = extract("just vibes", None);
        assert_eq!(id.handle, None);
        assert_eq!(id.source, IdentitySource::NotFound);
        assert_eq!(id.confidence, Confidence::Low);
    }

    #[test]
    fn test_custom_cascade_order() {
        let extractor = SocialIdentityExtractor::with_strategies(vec![
            Box::new(BareMentionStrategy),
            Box::new(BioPatternStrategy),
        ]);
        let id = extractor.extract("IG: @realartist", None);
        assert_eq!(id.source, IdentitySource::BioMention);
    }
}
