//! Plain-text renderers shared by the CLI commands.

use crate::pipeline::processing::streaming::streaming_links;
use crate::types::{
    ArtistResult, OfficialArtist, SecondaryIdentity, SocialProfile, SongDetails, SoundListing,
    StreamingLinks,
};

/// 1234567 → "1,234,567"
pub fn format_number(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

fn yes_no(value: bool) -> &'static str {
    if value {
        "yes"
    } else {
        "no"
    }
}

fn streaming_lines(links: &StreamingLinks, indent: &str) -> Vec<String> {
    [
        ("Spotify", &links.spotify),
        ("Apple Music", &links.apple_music),
        ("Amazon Music", &links.amazon_music),
    ]
    .into_iter()
    .filter_map(|(name, url)| url.as_ref().map(|u| format!("{indent}{name}: {u}")))
    .collect()
}

fn artist_list(artists: &[OfficialArtist]) -> String {
    artists
        .iter()
        .map(|a| {
            let mut s = format!("@{}", a.handle);
            match (&a.nickname, a.verified) {
                (Some(nick), true) => s.push_str(&format!(" ({nick}, verified)")),
                (Some(nick), false) => s.push_str(&format!(" ({nick})")),
                (None, true) => s.push_str(" (verified)"),
                (None, false) => {}
            }
            s
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn secondary_line(identity: &SecondaryIdentity) -> String {
    match identity.profile_url() {
        Some(url) => format!(
            "@{} ({}) [{}, {} confidence]",
            identity.handle.as_deref().unwrap_or_default(),
            url,
            identity.source.as_str(),
            identity.confidence.as_str()
        ),
        None => format!(
            "not found [{}, {} confidence]",
            identity.source.as_str(),
            identity.confidence.as_str()
        ),
    }
}

/// Ranked artist results for one query
pub fn render_artist_results(query: &str, results: &[ArtistResult]) -> String {
    if results.is_empty() {
        return format!("No artists found for \"{query}\".");
    }

    let song = &results[0].song;
    let mut lines = vec![format!("Song: \"{}\" by {}", song.title, song.author)];
    if let Some(album) = &song.album {
        lines.push(format!("Album: {album}"));
    }
    lines.push(format!(
        "Clip id: {} | Used in {} videos",
        song.clip_id,
        format_number(song.usage_count)
    ));
    lines.extend(streaming_lines(&results[0].streaming, ""));

    for (i, result) in results.iter().enumerate() {
        let p = &result.profile;
        lines.push(String::new());
        lines.push(format!(
            "{}. @{} ({}){}",
            i + 1,
            p.handle,
            p.display_name,
            if p.verified { " [verified]" } else { "" }
        ));
        lines.push(format!(
            "   Followers: {} | Videos: {}",
            format_number(p.followers),
            format_number(p.video_count)
        ));
        lines.push(format!("   Instagram: {}", secondary_line(&result.secondary)));
    }

    lines.join("\n")
}

/// Song detail summary
pub fn render_song_details(clip_id: &str, details: &SongDetails) -> String {
    let mut lines = vec![format!(
        "\"{}\" by {}",
        details.title.as_deref().unwrap_or("(untitled)"),
        details.author.as_deref().unwrap_or("(unknown)")
    )];
    if let Some(album) = &details.album {
        lines.push(format!("Album: {album}"));
    }
    lines.push(format!("Clip id: {clip_id}"));
    if let Some(usage) = details.usage_count {
        lines.push(format!("Used in {} videos", format_number(usage)));
    }
    lines.push(format!("Original sound: {}", yes_no(details.is_original_sound)));
    if !details.artists.is_empty() {
        lines.push(format!("Artists: {}", artist_list(&details.artists)));
    } else if let Some(owner) = &details.owner_handle {
        lines.push(format!("Owner: @{owner}"));
    }
    lines.extend(streaming_lines(&streaming_links(&details.streaming_ids), ""));
    lines.join("\n")
}

/// Primary profile plus the secondary identity extracted from it
pub fn render_profile(profile: &SocialProfile, identity: &SecondaryIdentity) -> String {
    let mut lines = vec![
        format!("@{} - {}", profile.handle, profile.display_name),
        format!("Verified: {}", yes_no(profile.verified)),
        format!("Followers: {}", format_number(profile.followers)),
        format!("Videos: {}", format_number(profile.video_count)),
        format!("Likes: {}", format_number(profile.likes)),
    ];
    if !profile.bio.trim().is_empty() {
        lines.push(format!("Bio: {}", profile.bio));
    }
    if let Some(link) = &profile.bio_link {
        lines.push(format!("Bio link: {link}"));
    }
    if let Some(avatar) = &profile.avatar_url {
        lines.push(format!("Avatar: {avatar}"));
    }
    lines.push(format!("Instagram: {}", secondary_line(identity)));
    lines.join("\n")
}

/// First page of a sound search, truncated to `max`
pub fn render_sound_listing(query: &str, listing: &SoundListing, max: usize) -> String {
    if listing.sounds.is_empty() {
        return format!("No sounds found for \"{query}\".");
    }

    let blocks: Vec<String> = listing
        .sounds
        .iter()
        .take(max)
        .enumerate()
        .map(|(i, s)| {
            let mut lines = vec![format!("{}. \"{}\" by {}", i + 1, s.title, s.author)];
            if let Some(album) = &s.album {
                lines.push(format!("   Album: {album}"));
            }
            let duration = s
                .duration_secs
                .map(|d| format!("{d}s"))
                .unwrap_or_else(|| "?".to_string());
            lines.push(format!(
                "   Duration: {} | Used in {} videos",
                duration,
                format_number(s.usage_count)
            ));
            lines.push(format!("   Clip id: {}", s.clip_id));
            lines.push(format!("   Original: {}", yes_no(s.is_original_sound)));
            if !s.artists.is_empty() {
                lines.push(format!("   Artists: {}", artist_list(&s.artists)));
            }
            lines.extend(streaming_lines(&s.streaming, "   "));
            lines.join("\n")
        })
        .collect();

    let mut out = blocks.join("\n\n");
    if listing.has_more {
        match listing.total {
            Some(total) => out.push_str(&format!(
                "\n\n{} results in total, more pages available.",
                format_number(total)
            )),
            None => out.push_str("\n\nMore pages available."),
        }
    }
    out
}
