//! Feed reader tests
//!
//! Tests feed download, episode extraction, and error handling.

use mockito::Server;
use podtui::api::{FeedError, FeedReader};
use podtui::models::EpisodeDuration;
use std::time::Duration;

const FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0" xmlns:itunes="http://www.itunes.com/dtds/podcast-1.0.dtd">
  <channel>
    <title>Tech Talk</title>
    <link>https://example.com</link>
    <description>Weekly tech</description>
    <item>
      <title>Newest Episode</title>
      <description>&lt;p&gt;Rust &amp;amp; friends&lt;/p&gt;</description>
      <enclosure url="https://cdn.example.com/ep3.mp3" length="100" type="audio/mpeg"/>
      <itunes:duration>1:02:03</itunes:duration>
    </item>
    <item>
      <title>Middle Episode</title>
      <enclosure url="https://cdn.example.com/ep2.mp3" length="100" type="audio/mpeg"/>
      <itunes:duration>2700</itunes:duration>
    </item>
    <item>
      <title>Housekeeping</title>
      <description>Text only</description>
    </item>
  </channel>
</rss>"#;

#[tokio::test]
async fn test_load_episodes_in_feed_order() {
    let mut server = Server::new_async().await;

    let mock = server
        .mock("GET", "/feed.xml")
        .with_status(200)
        .with_header("content-type", "application/rss+xml")
        .with_body(FEED)
        .create_async()
        .await;

    let reader = FeedReader::new();
    let episodes = reader
        .load_episodes(&format!("{}/feed.xml", server.url()))
        .await
        .unwrap();

    mock.assert_async().await;

    assert_eq!(episodes.len(), 3);
    assert_eq!(episodes[0].title, "Newest Episode");
    assert_eq!(episodes[0].description, "Rust & friends");
    assert_eq!(
        episodes[0].duration,
        EpisodeDuration::Known(Duration::from_secs(3723))
    );
    assert_eq!(
        episodes[1].audio_url.as_deref(),
        Some("https://cdn.example.com/ep2.mp3")
    );
    assert_eq!(episodes[1].duration.seconds(), 2700);

    // Enclosure-less items are kept but cannot be played
    assert_eq!(episodes[2].title, "Housekeeping");
    assert!(!episodes[2].is_playable());
    assert!(!episodes[2].duration.is_known());
}

#[tokio::test]
async fn test_empty_channel_yields_no_episodes() {
    let mut server = Server::new_async().await;

    let _mock = server
        .mock("GET", "/empty.xml")
        .with_status(200)
        .with_body(
            r#"<rss version="2.0"><channel><title>Empty</title><link>https://example.com</link><description>none</description></channel></rss>"#,
        )
        .create_async()
        .await;

    let episodes = FeedReader::new()
        .load_episodes(&format!("{}/empty.xml", server.url()))
        .await
        .unwrap();
    assert!(episodes.is_empty());
}

#[tokio::test]
async fn test_http_error_status() {
    let mut server = Server::new_async().await;

    let _mock = server
        .mock("GET", "/gone.xml")
        .with_status(404)
        .create_async()
        .await;

    let result = FeedReader::new()
        .load_episodes(&format!("{}/gone.xml", server.url()))
        .await;
    assert!(matches!(result, Err(FeedError::Status(404))));
}

#[tokio::test]
async fn test_malformed_xml_is_parse_error() {
    let mut server = Server::new_async().await;

    let _mock = server
        .mock("GET", "/broken.xml")
        .with_status(200)
        .with_body("<rss><channel><item><title>oops")
        .create_async()
        .await;

    let result = FeedReader::new()
        .load_episodes(&format!("{}/broken.xml", server.url()))
        .await;
    assert!(matches!(result, Err(FeedError::ParseFailed(_))));
}
