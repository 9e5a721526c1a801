use serde::Serialize;
use unicode_normalization::UnicodeNormalization;

/// A free-text query with its normalized tokens
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Query {
    raw: String,
    tokens: Vec<String>,
}

impl Query {
    pub fn new(raw: &str) -> Self {
        let normalized = normalize(raw);
        let tokens = normalized
            .split_whitespace()
            .filter(|t| t.chars().count() > 1)
            .map(str::to_string)
            .collect();
        Self {
            raw: raw.trim().to_string(),
            tokens,
        }
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

/// Check if a character is a Unicode combining mark (diacritical mark)
fn is_combining_mark(c: char) -> bool {
    matches!(c as u32, 0x0300..=0x036F | 0x1AB0..=0x1AFF | 0x1DC0..=0x1DFF | 0xFE20..=0xFE2F)
}

/// Lowercase and strip diacritics: "Rosalía" → "rosalia".
///
/// Idempotent, so already-normalized strings pass through unchanged.
pub fn normalize(s: &str) -> String {
    s.to_lowercase()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .nfc()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_strips_accents_and_case() {
        assert_eq!(normalize("Rosalía MALAMENTE"), "rosalia malamente");
        assert_eq!(normalize("Beyoncé"), "beyonce");
        assert_eq!(normalize("Mónaco"), "monaco");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        for s in ["Bad Bunny Mónaco", "ÅNGSTRÖM", "naïve café", "", "  spaced  out ", "ǅemal"] {
            let once = normalize(s);
            assert_eq!(normalize(&once), once, "not idempotent for {s:?}");
        }
    }

    #[test]
    fn test_tokens_drop_single_characters() {
        let query = Query::new("Kendrick Lamar - luther x");
        assert_eq!(query.tokens(), &["kendrick", "lamar", "luther"]);
        assert_eq!(query.raw(), "Kendrick Lamar - luther x");
    }

    #[test]
    fn test_blank_query_has_no_tokens() {
        assert!(Query::new("   ").is_empty());
        assert!(Query::new("a b c").is_empty());
    }
}
