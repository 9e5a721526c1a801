use crate::types::ArtistResult;

/// Verified artists first, then by follower count, descending.
///
/// `sort_by` is stable, so artists that tie keep their discovery order.
pub fn rank_results(results: &mut [ArtistResult]) {
    results.sort_by(|a, b| {
        b.profile
            .verified
            .cmp(&a.profile.verified)
            .then_with(|| b.profile.followers.cmp(&a.profile.followers))
    });
}
