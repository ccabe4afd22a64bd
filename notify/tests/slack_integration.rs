use config::ChatConfig;
use errors::TransportError;
use notify::{DispatchOptions, Dispatcher, SlackTransport, Transport};
use scribe_core::Channel;
use serde_json::json;
use std::sync::Arc;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn transport(server: &MockServer) -> SlackTransport {
    SlackTransport::new(server.uri(), "xoxb-test", "C123").unwrap()
}

#[tokio::test]
async fn test_posts_message_to_configured_channel() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat.postMessage"))
        .and(header("Authorization", "Bearer xoxb-test"))
        .and(body_json(json!({ "channel": "C123", "text": "hello" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true })))
        .expect(1)
        .mount(&mock_server)
        .await;

    transport(&mock_server)
        .send("hello", &DispatchOptions::default())
        .await
        .unwrap();
}

#[tokio::test]
async fn test_channel_override_is_used() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat.postMessage"))
        .and(body_json(json!({ "channel": "C999", "text": "hello" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let options = DispatchOptions {
        chat_channel: Some("C999".to_string()),
        ..DispatchOptions::default()
    };
    transport(&mock_server).send("hello", &options).await.unwrap();
}

#[tokio::test]
async fn test_ok_false_is_chat_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat.postMessage"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "ok": false, "error": "channel_not_found" }))
        )
        .mount(&mock_server)
        .await;

    let result = transport(&mock_server)
        .send("hello", &DispatchOptions::default())
        .await;
    match result {
        Err(TransportError::Chat { reason }) => assert_eq!(reason, "channel_not_found"),
        other => panic!("expected chat error, got {other:?}")
    }
}

#[tokio::test]
async fn test_server_error_resolves_to_false_in_dispatch() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat.postMessage"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let dispatcher =
        Dispatcher::new().with_transport(Channel::Chat, Arc::new(transport(&mock_server)));
    let result = dispatcher
        .dispatch("hello", &["chat"], &DispatchOptions::default())
        .await;
    assert_eq!(result.get("chat"), Some(false));
}

#[test]
fn test_from_config_requires_token_and_channel() {
    let unconfigured = ChatConfig::default();
    assert!(SlackTransport::from_config(&unconfigured).unwrap().is_none());

    let configured = ChatConfig {
        bot_token: Some("xoxb".to_string()),
        channel_id: Some("C1".to_string()),
        ..ChatConfig::default()
    };
    assert!(SlackTransport::from_config(&configured).unwrap().is_some());
}
