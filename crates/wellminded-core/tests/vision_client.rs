use std::sync::{Arc, Mutex};
use std::time::Instant;

use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use image::{Rgba, RgbaImage};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use wellminded_core::{CaptureSession, SendError, Sender, VisionClient};

type Seen = Arc<Mutex<Vec<(Option<String>, Value)>>>;

async fn serve(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}/upload_info", addr)
}

fn recording_router(seen: Seen, chat: &'static str) -> Router {
    Router::new().route(
        "/upload_info",
        post(move |headers: HeaderMap, Json(body): Json<Value>| {
            let seen = Arc::clone(&seen);
            async move {
                let content_type = headers
                    .get("content-type")
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_string);
                seen.lock().unwrap().push((content_type, body));
                Json(json!({ "chat": chat }))
            }
        }),
    )
}

#[tokio::test]
async fn posts_img_and_text_as_json() {
    let seen: Seen = Arc::default();
    let url = serve(recording_router(Arc::clone(&seen), "hello there")).await;

    let client = VisionClient::new(&url);
    let reply = client.upload_info("QUJD", "how do I look?").await.unwrap();
    assert_eq!(reply, "hello there");

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    let (content_type, body) = &seen[0];
    assert_eq!(content_type.as_deref(), Some("application/json"));
    assert_eq!(body, &json!({ "img": "QUJD", "text": "how do I look?" }));
}

#[tokio::test]
async fn non_success_status_is_an_error() {
    let router = Router::new().route(
        "/upload_info",
        post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
    );
    let url = serve(router).await;

    let err = VisionClient::new(&url)
        .upload_info("QUJD", "hi")
        .await
        .unwrap_err();
    assert!(matches!(err, SendError::Status(code) if code.as_u16() == 500));
    assert_eq!(err.alert(), "There was an error processing the request.");
}

#[tokio::test]
async fn reply_without_chat_field_is_an_error() {
    let router = Router::new().route(
        "/upload_info",
        post(|| async { Json(json!({ "message": "wrong shape" })) }),
    );
    let url = serve(router).await;

    let err = VisionClient::new(&url)
        .upload_info("QUJD", "hi")
        .await
        .unwrap_err();
    assert!(matches!(err, SendError::Request(_)));
}

#[tokio::test]
async fn unreachable_endpoint_is_an_error() {
    // Bind and immediately drop to get a port nobody listens on
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = VisionClient::new(&format!("http://{}/upload_info", addr))
        .upload_info("QUJD", "hi")
        .await
        .unwrap_err();
    assert!(matches!(err, SendError::Request(_)));
}

#[tokio::test]
async fn session_round_trip_through_http() {
    let seen: Seen = Arc::default();
    let url = serve(recording_router(Arc::clone(&seen), "# Calm\n- breathe *slowly*")).await;
    let client = VisionClient::new(&url);

    let mut session = CaptureSession::new();
    session.enter();
    let now = Instant::now();
    let frame = RgbaImage::from_pixel(3, 2, Rgba([120, 110, 240, 255]));
    session.capture(Some(&frame), now).unwrap();
    session.message_mut().push_str("I'm a bit stressed");

    session.send_with(&client).await.unwrap();

    let messages = session.transcript().messages();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].sender, Sender::User);
    assert_eq!(messages[0].text, "I'm a bit stressed");
    assert_eq!(messages[1].sender, Sender::Agent);
    assert_eq!(messages[1].text, " Calm\n\n-  breathe slowly");
    assert_eq!(session.message(), "");

    let seen = seen.lock().unwrap();
    let img = seen[0].1["img"].as_str().unwrap();
    assert_eq!(img, session.captured().unwrap().payload());
    assert_eq!(img.len() % 4, 0);
}
