//! Account identifiers from public profile URLs.
//!
//! An empty result means "no usable identifier" and callers treat the
//! platform as not configured for that creator.

use url::Url;

/// Path segments that never identify an account on their own.
const GENERIC_SEGMENTS: [&str; 5] = ["live", "stream", "streams", "c", "user"];

/// Returns the account slug of a profile URL.
///
/// Generic segments such as `live` or `streams` are dropped, the last
/// remaining segment is used and a leading `@` is stripped.
///
/// ```
/// use stream_alert::platform::slug::extract_slug;
///
/// assert_eq!(extract_slug("https://twitch.tv/foo"), "foo");
/// assert_eq!(extract_slug("https://kick.com/live/bar"), "bar");
/// assert_eq!(extract_slug(""), "");
/// ```
pub fn extract_slug(url: &str) -> String {
    path_segments(url)
        .into_iter()
        .filter(|s| !GENERIC_SEGMENTS.contains(&s.as_str()))
        .next_back()
        .map(|s| s.trim_start_matches('@').to_string())
        .unwrap_or_default()
}

/// Returns the channel reference of a YouTube URL.
///
/// A literal `/channel/<id>` segment wins over everything else. Otherwise
/// the first `@handle` (kept with its `@`), then the name after a legacy
/// `/c/` or `/user/` prefix, then the last segment.
pub fn extract_youtube_channel(url: &str) -> String {
    let segments = path_segments(url);

    if let Some(id) = segments
        .iter()
        .position(|s| s == "channel")
        .and_then(|i| segments.get(i + 1))
    {
        return id.clone();
    }

    for (i, segment) in segments.iter().enumerate() {
        if segment.starts_with('@') && segment.len() > 1 {
            return segment.clone();
        }
        if (segment == "c" || segment == "user")
            && let Some(name) = segments.get(i + 1)
        {
            return name.clone();
        }
    }

    segments
        .into_iter()
        .filter(|s| s != "live")
        .next_back()
        .unwrap_or_default()
}

/// Non-empty path segments of a URL. Scheme-less URLs are read as https.
fn path_segments(url: &str) -> Vec<String> {
    let url = url.trim();
    if url.is_empty() {
        return Vec::new();
    }

    let parsed = Url::parse(url).or_else(|_| Url::parse(&format!("https://{url}")));
    let Ok(parsed) = parsed else {
        return Vec::new();
    };
    if parsed.cannot_be_a_base() {
        return Vec::new();
    }

    parsed
        .path_segments()
        .map(|segments| {
            segments
                .filter(|s| !s.is_empty())
                .map(|s| s.to_string())
                .collect()
        })
        .unwrap_or_default()
}
