//! Tests for platform detectors using mock servers.

use std::path::PathBuf;

use httpmock::Method::GET;
use httpmock::Method::POST;
use httpmock::MockServer;
use serde_json::json;
use stream_alert::config::TwitchCredentials;
use stream_alert::platform::Platform;
use stream_alert::platform::classifier::ContentClassifier;
use stream_alert::platform::kick_platform::KickPlatform;
use stream_alert::platform::telegram_platform::TelegramPlatform;
use stream_alert::platform::twitch_platform::TwitchPlatform;
use stream_alert::platform::vk_group_platform::VkGroupPlatform;
use stream_alert::platform::vkplay_platform::VkPlayPlatform;
use stream_alert::platform::youtube_platform::YouTubePlatform;

/// Loads a test response file from the responses directory.
fn get_response(filename: &str) -> String {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests/responses");
    path.push(filename);
    std::fs::read_to_string(path).expect("Failed to read response file")
}

fn twitch_credentials() -> Option<TwitchCredentials> {
    Some(TwitchCredentials {
        client_id: "cid".to_string(),
        client_secret: "secret".to_string(),
    })
}

fn twitch_on(server: &MockServer, credentials: Option<TwitchCredentials>) -> TwitchPlatform {
    let mut platform = TwitchPlatform::new(credentials).unwrap();
    platform.base.info.api_url = server.base_url();
    platform.auth_url = server.base_url();
    platform
}

#[tokio::test]
async fn test_twitch_api_live() {
    let server = MockServer::start();
    let platform = twitch_on(&server, twitch_credentials());

    let token = server.mock(|when, then| {
        when.method(POST)
            .path("/oauth2/token")
            .query_param("client_id", "cid")
            .query_param("grant_type", "client_credentials");
        then.status(200)
            .json_body(json!({"access_token": "tok", "expires_in": 5000000, "token_type": "bearer"}));
    });
    let streams = server.mock(|when, then| {
        when.method(GET)
            .path("/helix/streams")
            .query_param("user_login", "hardgamechannel")
            .header("client-id", "cid")
            .header("authorization", "Bearer tok");
        then.status(200)
            .header("content-type", "application/json")
            .body(get_response("twitch_streams_live.json"));
    });

    let url = server.url("/hardgamechannel");
    assert!(platform.check_live(&url).await.unwrap());
    // The token is cached between checks.
    assert!(platform.check_live(&url).await.unwrap());

    token.assert_hits(1);
    streams.assert_hits(2);
}

#[tokio::test]
async fn test_twitch_api_offline_shapes() {
    let server = MockServer::start();
    let platform = twitch_on(&server, twitch_credentials());

    server.mock(|when, then| {
        when.method(POST).path("/oauth2/token");
        then.status(200).json_body(json!({"access_token": "tok"}));
    });
    let mut streams = server.mock(|when, then| {
        when.method(GET).path("/helix/streams");
        then.status(200).json_body(json!({"data": [], "pagination": {}}));
    });

    let url = server.url("/hardgamechannel");
    assert!(!platform.check_live(&url).await.unwrap());

    streams.delete();
    server.mock(|when, then| {
        when.method(GET).path("/helix/streams");
        then.status(200).json_body(json!({"data": null}));
    });
    assert!(!platform.check_live(&url).await.unwrap());
}

#[tokio::test]
async fn test_twitch_unauthorized_drops_token_and_falls_back() {
    let server = MockServer::start();
    let platform = twitch_on(&server, twitch_credentials());

    let token = server.mock(|when, then| {
        when.method(POST).path("/oauth2/token");
        then.status(200).json_body(json!({"access_token": "stale"}));
    });
    let streams = server.mock(|when, then| {
        when.method(GET).path("/helix/streams");
        then.status(401)
            .json_body(json!({"error": "Unauthorized", "status": 401, "message": "Invalid OAuth token"}));
    });
    let page = server.mock(|when, then| {
        when.method(GET).path("/hardgamechannel");
        then.status(200)
            .body(r#"<script type="application/ld+json">{"isLiveBroadcast":true}</script>"#);
    });

    let url = server.url("/hardgamechannel");
    assert!(platform.check_live(&url).await.unwrap());
    assert!(platform.check_live(&url).await.unwrap());

    // A new token is requested after every rejection.
    token.assert_hits(2);
    streams.assert_hits(2);
    page.assert_hits(2);
}

#[tokio::test]
async fn test_twitch_without_credentials_uses_page() {
    let server = MockServer::start();
    let platform = twitch_on(&server, None);

    let streams = server.mock(|when, then| {
        when.method(GET).path("/helix/streams");
        then.status(200).json_body(json!({"data": [{"type": "live"}]}));
    });
    server.mock(|when, then| {
        when.method(GET).path("/hardgamechannel");
        then.status(200).body("<html><p>Channel is offline</p></html>");
    });

    assert!(!platform.check_live(&server.url("/hardgamechannel")).await.unwrap());
    streams.assert_hits(0);
}

#[tokio::test]
async fn test_twitch_both_tiers_fail() {
    let server = MockServer::start();
    let platform = twitch_on(&server, twitch_credentials());

    server.mock(|when, then| {
        when.method(POST).path("/oauth2/token");
        then.status(500);
    });
    server.mock(|when, then| {
        when.method(GET).path("/hardgamechannel");
        then.status(503);
    });

    assert!(platform.check_live(&server.url("/hardgamechannel")).await.is_err());
}

#[tokio::test]
async fn test_youtube_resolves_handle_then_searches() {
    let server = MockServer::start();
    let mut platform = YouTubePlatform::new(Some("key".to_string())).unwrap();
    platform.base.info.api_url = server.base_url();

    let channels = server.mock(|when, then| {
        when.method(GET)
            .path("/channels")
            .query_param("forHandle", "@HARDPLAYYOUTUBE")
            .query_param("key", "key");
        then.status(200)
            .json_body(json!({"items": [{"kind": "youtube#channel", "id": "UCmock"}]}));
    });
    let search = server.mock(|when, then| {
        when.method(GET)
            .path("/search")
            .query_param("channelId", "UCmock")
            .query_param("eventType", "live")
            .query_param("type", "video");
        then.status(200)
            .json_body(json!({"items": [{"id": {"kind": "youtube#video", "videoId": "abc"}}]}));
    });

    let live = platform
        .check_live("https://www.youtube.com/@HARDPLAYYOUTUBE")
        .await
        .unwrap();

    assert!(live);
    channels.assert();
    search.assert();
}

#[tokio::test]
async fn test_youtube_channel_id_skips_resolution() {
    let server = MockServer::start();
    let mut platform = YouTubePlatform::new(Some("key".to_string())).unwrap();
    platform.base.info.api_url = server.base_url();

    let channels = server.mock(|when, then| {
        when.method(GET).path("/channels");
        then.status(200).json_body(json!({"items": []}));
    });
    let search = server.mock(|when, then| {
        when.method(GET).path("/search").query_param("channelId", "UCabcdefghijklmnopqrstuv");
        then.status(200)
            .json_body(json!({"kind": "youtube#searchListResponse", "items": []}));
    });

    let live = platform
        .check_live("https://www.youtube.com/channel/UCabcdefghijklmnopqrstuv/@someone")
        .await
        .unwrap();

    assert!(!live);
    channels.assert_hits(0);
    search.assert();
}

#[tokio::test]
async fn test_youtube_legacy_username_is_resolved() {
    let server = MockServer::start();
    let mut platform = YouTubePlatform::new(Some("key".to_string())).unwrap();
    platform.base.info.api_url = server.base_url();

    let channels = server.mock(|when, then| {
        when.method(GET)
            .path("/channels")
            .query_param("forUsername", "UCLA");
        then.status(200)
            .json_body(json!({"items": [{"kind": "youtube#channel", "id": "UCzyxwvutsrqponmlkjihgfe"}]}));
    });
    let search = server.mock(|when, then| {
        when.method(GET)
            .path("/search")
            .query_param("channelId", "UCzyxwvutsrqponmlkjihgfe");
        then.status(200)
            .json_body(json!({"items": [{"id": {"kind": "youtube#video", "videoId": "abc"}}]}));
    });

    let live = platform
        .check_live("https://www.youtube.com/user/UCLA")
        .await
        .unwrap();

    assert!(live);
    channels.assert();
    search.assert();
}

#[tokio::test]
async fn test_youtube_quota_error_falls_back_to_live_page() {
    let server = MockServer::start();
    let mut platform = YouTubePlatform::new(Some("key".to_string())).unwrap();
    platform.base.info.api_url = server.base_url();

    server.mock(|when, then| {
        when.method(GET).path("/search");
        then.status(200).json_body(json!({
            "error": {"code": 403, "message": "The request cannot be completed because you have exceeded your quota."}
        }));
    });
    let page = server.mock(|when, then| {
        when.method(GET).path("/channel/UCabcdefghijklmnopqrstuv/live");
        then.status(200)
            .body(r#"<script>var ytInitialData = {"liveBroadcastContent":"live"};</script>"#);
    });

    let url = server.url("/channel/UCabcdefghijklmnopqrstuv");
    assert!(platform.check_live(&url).await.unwrap());
    page.assert();
}

#[tokio::test]
async fn test_kick_api_shapes() {
    let server = MockServer::start();
    let mut platform = KickPlatform::new().unwrap();
    platform.base.info.api_url = server.base_url();

    server.mock(|when, then| {
        when.method(GET).path("/channels/hardplay");
        then.status(200).body(get_response("kick_channel_live.json"));
    });
    server.mock(|when, then| {
        when.method(GET).path("/channels/quiet");
        then.status(200).body(get_response("kick_channel_offline.json"));
    });
    server.mock(|when, then| {
        when.method(GET).path("/channels/wrapped");
        then.status(200)
            .json_body(json!([{"slug": "wrapped", "livestream": {"id": 1}}]));
    });

    assert!(platform.check_live("https://kick.com/hardplay").await.unwrap());
    assert!(!platform.check_live("https://kick.com/quiet").await.unwrap());
    assert!(platform.check_live("https://kick.com/live/wrapped").await.unwrap());
}

#[tokio::test]
async fn test_kick_blocked_api_falls_back_to_page_markers() {
    let server = MockServer::start();
    let mut platform = KickPlatform::new().unwrap();
    platform.base.info.api_url = server.base_url();

    server.mock(|when, then| {
        when.method(GET).path("/channels/hardplay");
        then.status(403).body("Just a moment...");
    });
    server.mock(|when, then| {
        when.method(GET).path("/hardplay");
        then.status(200)
            .body(r#"<span class="bg-green-500 rounded">LIVE</span>"#);
    });
    server.mock(|when, then| {
        when.method(GET).path("/channels/quiet");
        then.status(403);
    });
    server.mock(|when, then| {
        when.method(GET).path("/quiet");
        then.status(200).body(r#"<span class="bg-green-500">Follow</span>"#);
    });

    assert!(platform.check_live(&server.url("/hardplay")).await.unwrap());
    // Only one of the two markers is present.
    assert!(!platform.check_live(&server.url("/quiet")).await.unwrap());
}

#[tokio::test]
async fn test_vkplay_dict_and_list_shapes() {
    let server = MockServer::start();
    let mut platform = VkPlayPlatform::new().unwrap();
    platform.base.info.api_url = server.base_url();

    server.mock(|when, then| {
        when.method(GET).path("/blog/dict/public_video_stream");
        then.status(200)
            .json_body(json!({"data": {"isOnline": true, "title": "Стрим"}}));
    });
    server.mock(|when, then| {
        when.method(GET).path("/blog/list/public_video_stream");
        then.status(200)
            .json_body(json!([{"isOnline": false}, {"data": {"isOnline": true}}]));
    });
    server.mock(|when, then| {
        when.method(GET).path("/blog/offline/public_video_stream");
        then.status(200).json_body(json!({"data": {"isOnline": false}}));
    });

    assert!(platform.check_live("https://live.vkvideo.ru/dict").await.unwrap());
    assert!(platform.check_live("https://live.vkvideo.ru/list").await.unwrap());
    assert!(!platform.check_live("https://live.vkvideo.ru/offline").await.unwrap());
}

#[tokio::test]
async fn test_vkplay_malformed_api_falls_back_to_page() {
    let server = MockServer::start();
    let mut platform = VkPlayPlatform::new().unwrap();
    platform.base.info.api_url = server.base_url();

    server.mock(|when, then| {
        when.method(GET).path("/blog/hardplay/public_video_stream");
        then.status(200).body("<html>not json</html>");
    });
    server.mock(|when, then| {
        when.method(GET).path("/hardplay");
        then.status(200)
            .body(r#"<div class="StreamStatus_isOnline_x1">В эфире</div>"#);
    });

    assert!(platform.check_live(&server.url("/hardplay")).await.unwrap());
}

#[tokio::test]
async fn test_telegram_channel_posts() {
    let server = MockServer::start();
    let mut platform = TelegramPlatform::new(ContentClassifier::default()).unwrap();
    platform.base.info.web_url = server.base_url();

    let page = server.mock(|when, then| {
        when.method(GET).path("/s/hardplayyt");
        then.status(200).body(get_response("telegram_channel.html"));
    });
    server.mock(|when, then| {
        when.method(GET).path("/s/quiet");
        then.status(200).body(
            r#"<div class="tgme_widget_message_wrap"><div class="tgme_widget_message_text">Новый мерч в продаже</div></div>"#,
        );
    });

    assert!(platform.check_live("https://t.me/hardplayyt").await.unwrap());
    assert!(!platform.check_live("https://t.me/quiet").await.unwrap());
    page.assert();
}

#[tokio::test]
async fn test_vk_wall_api_link_attachment() {
    let server = MockServer::start();
    let mut platform =
        VkGroupPlatform::new(Some("svc".to_string()), ContentClassifier::default()).unwrap();
    platform.base.info.api_url = server.base_url();

    let wall = server.mock(|when, then| {
        when.method(GET)
            .path("/wall.get")
            .query_param("domain", "hardplay")
            .query_param("count", "5")
            .query_param("access_token", "svc");
        then.status(200).body(get_response("vk_wall_get.json"));
    });

    assert!(platform.check_live("https://vk.com/hardplay").await.unwrap());
    wall.assert();
}

#[tokio::test]
async fn test_vk_wall_api_error_falls_back_to_mobile_page() {
    let server = MockServer::start();
    let mut platform =
        VkGroupPlatform::new(Some("svc".to_string()), ContentClassifier::default()).unwrap();
    platform.base.info.api_url = server.base_url();
    platform.base.info.web_url = server.base_url();

    server.mock(|when, then| {
        when.method(GET).path("/wall.get");
        then.status(200).json_body(json!({
            "error": {"error_code": 5, "error_msg": "User authorization failed: invalid access_token (4)."}
        }));
    });
    let page = server.mock(|when, then| {
        when.method(GET).path("/hardplay");
        then.status(200).body(
            r#"<div class="wall_item"><div class="pi_text">Сегодня трансляция в 20:00</div></div>"#,
        );
    });

    assert!(platform.check_live("https://vk.com/hardplay").await.unwrap());
    page.assert();
}

#[tokio::test]
async fn test_vk_wall_without_service_token_reads_page() {
    let server = MockServer::start();
    let mut platform = VkGroupPlatform::new(None, ContentClassifier::default()).unwrap();
    platform.base.info.api_url = server.base_url();
    platform.base.info.web_url = server.base_url();

    let wall = server.mock(|when, then| {
        when.method(GET).path("/wall.get");
        then.status(200).body(get_response("vk_wall_get.json"));
    });
    server.mock(|when, then| {
        when.method(GET).path("/hardplay");
        then.status(200)
            .body(r#"<div class="wall_item"><div class="pi_text">Розыгрыш призов</div></div>"#);
    });

    assert!(!platform.check_live("https://vk.com/hardplay").await.unwrap());
    wall.assert_hits(0);
}
