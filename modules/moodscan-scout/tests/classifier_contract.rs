//! SentimentClassifier against a stubbed chat completion endpoint.

use std::time::Duration;

use ai_client::OpenAi;
use moodscan_common::ClassificationError;
use moodscan_scout::classifier::{Classifier, SentimentClassifier};
use moodscan_scout::types::{ClassificationResult, ContentBatch};
use serde_json::json;
use wiremock::matchers::{body_partial_json, body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn completion(content: &str) -> serde_json::Value {
    json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "model": "gpt-5.1-nano",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": content},
            "finish_reason": "stop"
        }]
    })
}

fn classifier(server: &MockServer, timeout: Duration) -> SentimentClassifier {
    let ai = OpenAi::new("sk-test", "gpt-5.1-nano").with_base_url(format!("{}/v1", server.uri()));
    SentimentClassifier::new(ai, 100, timeout)
}

fn batch() -> ContentBatch {
    ["love this release", "meh", "it broke again"].into_iter().collect()
}

#[tokio::test]
async fn counts_are_parsed_from_the_reply() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_partial_json(json!({"max_completion_tokens": 100})))
        .and(body_string_contains("Messages count: 3"))
        .and(body_string_contains("love this release\\nmeh\\nit broke again"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(completion("{\"positive\": 1, \"neutral\": 1, \"negative\": 1}")),
        )
        .expect(1)
        .mount(&server)
        .await;

    let result = classifier(&server, Duration::from_secs(5))
        .classify(&batch())
        .await
        .unwrap();

    assert_eq!(
        result,
        ClassificationResult {
            positive: 1,
            neutral: 1,
            negative: 1
        }
    );
}

#[tokio::test]
async fn omitted_count_defaults_to_zero() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(completion("```json\n{\"positive\": 2, \"neutral\": 1}\n```")),
        )
        .mount(&server)
        .await;

    let result = classifier(&server, Duration::from_secs(5))
        .classify(&batch())
        .await
        .unwrap();

    assert_eq!(result.positive, 2);
    assert_eq!(result.neutral, 1);
    assert_eq!(result.negative, 0);
}

#[tokio::test]
async fn slow_endpoint_times_out() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(completion("{\"positive\": 3}"))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let err = classifier(&server, Duration::from_millis(100))
        .classify(&batch())
        .await
        .unwrap_err();

    assert!(matches!(err, ClassificationError::Timeout(d) if d == Duration::from_millis(100)));
}

#[tokio::test]
async fn server_error_is_a_request_failure() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
        .expect(1)
        .mount(&server)
        .await;

    let err = classifier(&server, Duration::from_secs(5))
        .classify(&batch())
        .await
        .unwrap_err();

    assert!(matches!(err, ClassificationError::Request(ref m) if m.contains("500")));
}

#[tokio::test]
async fn prose_reply_is_malformed() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(completion("Mostly positive vibes today!")),
        )
        .mount(&server)
        .await;

    let err = classifier(&server, Duration::from_secs(5))
        .classify(&batch())
        .await
        .unwrap_err();

    assert!(matches!(err, ClassificationError::Malformed(_)));
}
