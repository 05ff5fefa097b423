//! Status snapshots posted through a Discord webhook.

use std::sync::Arc;

use chrono::Duration;
use discord_client::DiscordClient;
use moodscan_scout::status::{ScanStatus, StatusPublisher, WebhookPublisher};
use moodscan_scout::testing::t0;
use moodscan_scout::types::RollingStats;
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn status() -> ScanStatus {
    ScanStatus {
        taken_at: t0(),
        next_scan_at: Some(t0() + Duration::minutes(15)),
        stats: RollingStats {
            total_messages: 7,
            positive: 4,
            neutral: 2,
            negative: 1,
        },
        today: 7,
        daily_limit: 1000,
        last_outcome: None,
    }
}

#[tokio::test]
async fn snapshot_is_posted_as_message_content() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/webhooks/1/abc"))
        .and(body_partial_json(json!({
            "content": "⏱ next scan: 15m | 📨 7 msgs | 🙂4 😐2 ☠️1 | today 7/1000",
            "username": "moodscan"
        })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let client = Arc::new(DiscordClient::new("token".to_string()));
    let publisher = WebhookPublisher::new(client, format!("{}/api/webhooks/1/abc", server.uri()));

    publisher.publish(&status()).await.unwrap();
}

#[tokio::test]
async fn rejected_webhook_is_an_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(404).set_body_string("Unknown Webhook"))
        .mount(&server)
        .await;

    let client = Arc::new(DiscordClient::new("token".to_string()));
    let publisher = WebhookPublisher::new(client, format!("{}/api/webhooks/9/gone", server.uri()));

    let err = publisher.publish(&status()).await.unwrap_err();
    assert!(err.to_string().contains("404"));
}
