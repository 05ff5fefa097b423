//! Contract tests for the Discord REST endpoints used for history sampling.

use chrono::{TimeZone, Utc};
use discord_client::{last_snowflake_at, DiscordClient, DiscordError, WebhookPayload};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn message(id: u64, content: &str) -> serde_json::Value {
    message_at(id, content, "2024-03-01T11:30:00+00:00")
}

fn message_at(id: u64, content: &str, timestamp: &str) -> serde_json::Value {
    json!({
        "id": id.to_string(),
        "channel_id": "500",
        "author": {"id": "9", "username": "alice"},
        "content": content,
        "timestamp": timestamp
    })
}

fn noon() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
}

#[tokio::test]
async fn guilds_are_listed_with_bot_authorization() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/users/@me/guilds"))
        .and(header("authorization", "Bot token-123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": "1", "name": "alpha"},
            {"id": "2", "name": "beta"}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let client = DiscordClient::new("token-123".into()).with_base_url(server.uri());
    let guilds = client.current_user_guilds().await.unwrap();

    let names: Vec<_> = guilds.iter().map(|g| g.name.as_str()).collect();
    assert_eq!(names, vec!["alpha", "beta"]);
}

#[tokio::test]
async fn history_is_requested_after_the_cursor_and_returned_oldest_first() {
    let server = MockServer::start().await;
    let since = Utc.with_ymd_and_hms(2024, 3, 1, 11, 0, 0).unwrap();
    let after = last_snowflake_at(since);

    Mock::given(method("GET"))
        .and(path("/channels/500/messages"))
        .and(query_param("after", after.to_string()))
        .and(query_param("limit", "3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            message(after + 30, "third"),
            message(after + 20, "second"),
            message(after + 10, "first"),
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let client = DiscordClient::new("t".into()).with_base_url(server.uri());
    let messages = client.messages_after("500", since, noon(), 3).await.unwrap();

    let contents: Vec<_> = messages.iter().map(|m| m.content.as_str()).collect();
    assert_eq!(contents, vec!["first", "second", "third"]);
}

#[tokio::test]
async fn short_page_ends_pagination() {
    let server = MockServer::start().await;
    let since = Utc.with_ymd_and_hms(2024, 3, 1, 11, 0, 0).unwrap();
    let after = last_snowflake_at(since);

    Mock::given(method("GET"))
        .and(path("/channels/500/messages"))
        .and(query_param("limit", "100"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([message(after + 1, "only")])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = DiscordClient::new("t".into()).with_base_url(server.uri());
    let messages = client.messages_after("500", since, noon(), 200).await.unwrap();

    assert_eq!(messages.len(), 1);
}

#[tokio::test]
async fn messages_after_the_upper_bound_end_the_read() {
    let server = MockServer::start().await;
    let since = Utc.with_ymd_and_hms(2024, 3, 1, 11, 0, 0).unwrap();
    let after = last_snowflake_at(since);

    Mock::given(method("GET"))
        .and(path("/channels/500/messages"))
        .and(query_param("after", after.to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            message_at(after + 30, "too late", "2024-03-01T12:00:05+00:00"),
            message_at(after + 20, "on the bound", "2024-03-01T12:00:00+00:00"),
            message_at(after + 10, "in window", "2024-03-01T11:59:00+00:00"),
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let client = DiscordClient::new("t".into()).with_base_url(server.uri());
    // A full page would normally fetch again; the late message stops it.
    let messages = client.messages_after("500", since, noon(), 3).await.unwrap();

    let contents: Vec<_> = messages.iter().map(|m| m.content.as_str()).collect();
    assert_eq!(contents, vec!["in window", "on the bound"]);
}

#[tokio::test]
async fn forbidden_channel_is_access_denied() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/channels/600/messages"))
        .respond_with(
            ResponseTemplate::new(403)
                .set_body_json(json!({"message": "Missing Access", "code": 50001})),
        )
        .mount(&server)
        .await;

    let client = DiscordClient::new("t".into()).with_base_url(server.uri());
    let err = client
        .messages_after("600", Utc::now(), Utc::now(), 10)
        .await
        .unwrap_err();

    assert!(err.is_access_denied(), "unexpected error: {err}");
}

#[tokio::test]
async fn long_rate_limit_is_surfaced_instead_of_slept() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/guilds/1/channels"))
        .respond_with(
            ResponseTemplate::new(429)
                .set_body_json(json!({"message": "You are being rate limited.", "retry_after": 120.0, "global": false})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = DiscordClient::new("t".into()).with_base_url(server.uri());
    let err = client.guild_channels("1").await.unwrap_err();

    assert!(matches!(err, DiscordError::RateLimited { retry_after_secs } if retry_after_secs == 120.0));
}

#[tokio::test]
async fn webhook_receives_content() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/webhooks/1/abc"))
        .and(body_json(json!({"content": "status line"})))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let client = DiscordClient::new("t".into());
    let payload = WebhookPayload {
        content: "status line".into(),
        username: None,
    };
    client
        .execute_webhook(&format!("{}/api/webhooks/1/abc", server.uri()), &payload)
        .await
        .unwrap();
}
