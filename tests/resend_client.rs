//! Resend HTTP client against a local stand-in provider

mod common;

use axum::{http::StatusCode, routing::post, Json, Router};
use serde_json::json;
use std::sync::Arc;

use common::*;
use early_access_server::{
    email::{EmailError, EmailMessage, EmailSender, ResendClient},
    Mailer, MemoryStore, SignupStore,
};

fn message(to: &str) -> EmailMessage {
    EmailMessage {
        from: FROM_ADDRESS.to_string(),
        to: vec![to.to_string()],
        subject: "Hello".to_string(),
        html: "<p>Hi</p>".to_string(),
    }
}

/// Provider that accepts everything but answers with a body that is not JSON
async fn serve_accepting_plain_text() -> String {
    let router = Router::new()
        .route("/emails", post(|| async { "Queued" }))
        .route("/emails/batch", post(|| async { "Queued" }));
    serve(router).await
}

#[tokio::test]
async fn test_send_returns_provider_ids() {
    let router = Router::new()
        .route("/emails", post(|| async { Json(json!({ "id": "re_123" })) }))
        .route(
            "/emails/batch",
            post(|| async { Json(json!({ "data": [{ "id": "re_1" }, { "id": "re_2" }] })) }),
        );
    let client = ResendClient::new(&serve(router).await, "re_test_key_123").unwrap();

    assert_eq!(
        client.send(&message("ada@mail.io")).await.unwrap().as_deref(),
        Some("re_123")
    );

    let ids = client
        .send_batch(&[message("ada@mail.io"), message("grace@navy.mil")])
        .await
        .unwrap();
    assert_eq!(ids, vec!["re_1".to_string(), "re_2".to_string()]);
}

#[tokio::test]
async fn test_accepted_send_with_unreadable_body_counts_as_sent() {
    let client = ResendClient::new(&serve_accepting_plain_text().await, "re_test_key_123").unwrap();

    assert_eq!(client.send(&message("ada@mail.io")).await.unwrap(), None);
    assert!(client
        .send_batch(&[message("ada@mail.io")])
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_rejected_send_reports_provider_message() {
    let router = Router::new().route(
        "/emails",
        post(|| async {
            (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(json!({ "name": "validation_error", "message": "Invalid `from` field" })),
            )
        }),
    );
    let client = ResendClient::new(&serve(router).await, "re_test_key_123").unwrap();

    match client.send(&message("ada@mail.io")).await {
        Err(EmailError::Provider { status, message }) => {
            assert_eq!(status, 422);
            assert_eq!(message, "Invalid `from` field");
        }
        other => panic!("expected provider error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_broadcast_accepted_without_ids_is_not_a_failure() {
    let store = Arc::new(MemoryStore::new());
    seed(store.as_ref(), &["ada@mail.io", "grace@navy.mil"]).await;

    let client = ResendClient::new(&serve_accepting_plain_text().await, "re_test_key_123").unwrap();
    let mailer = Mailer::new(Arc::new(client), FROM_ADDRESS, false);
    let app = create_app(store.clone(), Some(mailer), test_config());

    let (status, body) = send(
        &app,
        make_post_request(
            "/api/send-broadcast",
            json!({ "subject": "We're live", "message": "<p>Come see</p>" }).to_string(),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["sentCount"], 2);
    assert!(body["emailIds"].as_array().unwrap().is_empty());

    let logs = store.recent_email_logs(10).await.unwrap();
    assert_eq!(logs.len(), 2);
    assert!(logs.iter().all(|l| l.status == "sent" && l.provider_message_id.is_none()));
}
