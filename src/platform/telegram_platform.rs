//! Public Telegram channels, read through the `t.me/s/` web preview.

use std::sync::LazyLock;

use async_trait::async_trait;
use log::debug;
use scraper::Html;
use scraper::Selector;

use crate::platform::BasePlatform;
use crate::platform::POST_WINDOW;
use crate::platform::Platform;
use crate::platform::PlatformId;
use crate::platform::PlatformInfo;
use crate::platform::classifier::ContentClassifier;
use crate::platform::classifier::FeedPost;
use crate::platform::error::PlatformError;
use crate::platform::slug::extract_slug;

static POST_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(".tgme_widget_message_wrap").expect("post selector is valid")
});
static LINK_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[href]").expect("link selector is valid"));

/// Telegram has no live flag. A channel counts as live when one of its
/// latest posts reads like a stream announcement.
pub struct TelegramPlatform {
    pub base: BasePlatform,
    classifier: ContentClassifier,
}

impl TelegramPlatform {
    pub fn new(classifier: ContentClassifier) -> Result<Self, PlatformError> {
        let info = PlatformInfo {
            id: PlatformId::Telegram,
            name: "Telegram".to_string(),
            icon: "✈️".to_string(),
            api_url: "https://t.me".to_string(),
            web_url: "https://t.me".to_string(),
        };

        Ok(Self {
            base: BasePlatform::new(info, 30)?,
            classifier,
        })
    }
}

/// Extracts the last `limit` posts of a channel preview page.
pub fn parse_posts(html: &str, limit: usize) -> Vec<FeedPost> {
    let document = Html::parse_document(html);
    let posts: Vec<FeedPost> = document
        .select(&POST_SELECTOR)
        .map(|post| FeedPost {
            text: post
                .text()
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .collect::<Vec<_>>()
                .join(" "),
            links: post
                .select(&LINK_SELECTOR)
                .filter_map(|a| a.value().attr("href"))
                .map(|href| href.to_string())
                .collect(),
        })
        .collect();

    let skip = posts.len().saturating_sub(limit);
    posts.into_iter().skip(skip).collect()
}

#[async_trait]
impl Platform for TelegramPlatform {
    async fn check_live(&self, source_url: &str) -> Result<bool, PlatformError> {
        let channel = extract_slug(source_url);
        if channel.is_empty() {
            return Ok(false);
        }

        let page = self
            .base
            .fetch_page(&format!("{}/s/{channel}", self.base.info.web_url))
            .await?;
        let posts = parse_posts(&page, POST_WINDOW);
        debug!("Telegram `{channel}`: inspecting {} posts.", posts.len());

        Ok(self.classifier.any_stream_post(&posts))
    }

    fn get_base(&self) -> &BasePlatform {
        &self.base
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(posts: &[&str]) -> String {
        let body: String = posts
            .iter()
            .map(|p| format!(r#"<div class="tgme_widget_message_wrap js-widget_message_wrap">{p}</div>"#))
            .collect();
        format!("<html><body><section>{body}</section></body></html>")
    }

    #[test]
    fn test_parse_posts_text_and_links() {
        let html = page(&[
            r#"<div class="tgme_widget_message_text">Заходите <b>на</b> стрим <a href="https://twitch.tv/foo">тут</a></div>"#,
        ]);
        let posts = parse_posts(&html, 5);

        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].text, "Заходите на стрим тут");
        assert_eq!(posts[0].links, vec!["https://twitch.tv/foo"]);
    }

    #[test]
    fn test_parse_posts_keeps_last_window() {
        let html = page(&["one", "two", "three", "four", "five", "six", "seven"]);
        let posts = parse_posts(&html, 5);

        let texts: Vec<&str> = posts.iter().map(|p| p.text.as_str()).collect();
        assert_eq!(texts, vec!["three", "four", "five", "six", "seven"]);
    }

    #[test]
    fn test_parse_posts_empty_page() {
        assert!(parse_posts("<html></html>", 5).is_empty());
        assert!(parse_posts("", 5).is_empty());
    }
}
