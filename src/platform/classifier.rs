//! Heuristic detection of "going live" announcements in feed posts.

use std::sync::LazyLock;

use regex::Regex;

static LINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"https?://\S+").expect("link pattern is valid"));

/// Keyword and domain lists used to classify posts.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClassifierConfig {
    /// Substrings searched in the lowercased post text.
    pub keywords: Vec<String>,
    /// Minimum number of distinct keywords required without a stream link.
    pub min_matches: usize,
    /// Substrings that mark a link (or text) as pointing at a stream.
    pub link_domains: Vec<String>,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        let keywords = [
            "стрим",
            "stream",
            "live",
            "лайв",
            "эфир",
            "трансляция",
            "начал",
            "стримим",
            "в эфире",
            "онлайн стрим",
            "смотрите",
        ];
        let link_domains = [
            "twitch.tv",
            "youtube.com/watch",
            "youtube.com/live",
            "youtu.be",
            "kick.com",
            "vkplay.live",
            "live.vkvideo.ru",
        ];
        Self {
            keywords: keywords.iter().map(|s| s.to_string()).collect(),
            min_matches: 1,
            link_domains: link_domains.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// One post of a feed-style platform: its text and outbound links.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FeedPost {
    pub text: String,
    pub links: Vec<String>,
}

/// Decides whether a post announces a stream.
///
/// A post is an announcement if any link (or the text itself) contains a
/// stream domain, or if at least `min_matches` distinct keywords occur in
/// the text. Matching is plain substring search, so a keyword inside a
/// longer word still counts.
#[derive(Clone, Debug)]
pub struct ContentClassifier {
    keywords: Vec<String>,
    min_matches: usize,
    link_domains: Vec<String>,
}

impl ContentClassifier {
    pub fn new(config: &ClassifierConfig) -> Self {
        Self {
            keywords: normalize(&config.keywords),
            min_matches: config.min_matches,
            link_domains: normalize(&config.link_domains),
        }
    }

    pub fn is_stream_post<S: AsRef<str>>(&self, text: &str, links: &[S]) -> bool {
        let text = text.to_lowercase();

        let has_stream_link = links
            .iter()
            .map(|l| l.as_ref().to_lowercase())
            .chain(std::iter::once(text.clone()))
            .any(|l| self.link_domains.iter().any(|d| l.contains(d.as_str())));
        if has_stream_link {
            return true;
        }

        self.matched_keywords(&text).len() >= self.min_matches
    }

    /// True if any of the posts announces a stream.
    pub fn any_stream_post(&self, posts: &[FeedPost]) -> bool {
        posts.iter().any(|p| self.is_stream_post(&p.text, &p.links))
    }

    /// Configured keywords that occur in the (already lowercased) text.
    pub fn matched_keywords(&self, lowercased: &str) -> Vec<&str> {
        self.keywords
            .iter()
            .filter(|k| lowercased.contains(k.as_str()))
            .map(|k| k.as_str())
            .collect()
    }
}

impl Default for ContentClassifier {
    fn default() -> Self {
        Self::new(&ClassifierConfig::default())
    }
}

/// Absolute http(s) links written inline in a post body.
pub fn extract_links(text: &str) -> Vec<String> {
    LINK_RE
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .collect()
}

fn normalize(items: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(items.len());
    for item in items {
        let item = item.trim().to_lowercase();
        if !item.is_empty() && !out.contains(&item) {
            out.push(item);
        }
    }
    out
}
