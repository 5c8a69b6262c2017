//! Drives `OpenAiNarrator` against a one-shot HTTP server on loopback.

use fableroom_narrator::{NarrationError, Narrator, OpenAiNarrator, PromptTurn};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// Answers exactly one request with `status` and `body`, returning the raw
/// request text it received.
async fn serve_once(
    status: &'static str,
    body: &'static str,
) -> (String, tokio::task::JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base_url = format!("http://{}/v1", listener.local_addr().unwrap());

    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut request = Vec::new();
        let mut buf = [0u8; 4096];
        // Read until the JSON body has been fully received.
        loop {
            let n = socket.read(&mut buf).await.unwrap();
            request.extend_from_slice(&buf[..n]);
            let text = String::from_utf8_lossy(&request);
            if n == 0 || text.contains("\r\n\r\n") && text.trim_end().ends_with('}') {
                break;
            }
        }
        let response = format!(
            "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.shutdown().await.unwrap();
        String::from_utf8_lossy(&request).into_owned()
    });

    (base_url, handle)
}

#[tokio::test]
async fn test_narrate_posts_chat_completion() {
    let (base_url, server) = serve_once(
        "200 OK",
        r#"{"choices":[{"message":{"role":"assistant","content":"A bridge.\n1. [Cross]\n2. [Wait]\n3. [Turn back]"}}]}"#,
    )
    .await;

    let narrator = OpenAiNarrator::new("sk-test")
        .with_base_url(base_url)
        .with_model("test-model");
    let text = narrator
        .narrate(&[PromptTurn::system("rules"), PromptTurn::user("begin")])
        .await
        .expect("narration should succeed");
    assert!(text.starts_with("A bridge."));

    let request = server.await.unwrap();
    assert!(request.starts_with("POST /v1/chat/completions"));
    assert!(request.to_lowercase().contains("authorization: bearer sk-test"));
    assert!(request.contains(r#""model":"test-model""#));
    assert!(request.contains(r#""role":"system""#));
}

#[tokio::test]
async fn test_narrate_reports_api_errors() {
    let (base_url, server) =
        serve_once("429 Too Many Requests", r#"{"error":"quota"}"#).await;

    let narrator = OpenAiNarrator::new("sk-test").with_base_url(base_url);
    let err = narrator
        .narrate(&[PromptTurn::user("begin")])
        .await
        .expect_err("429 should fail");
    match err {
        NarrationError::Api { status, body } => {
            assert_eq!(status, 429);
            assert!(body.contains("quota"));
        }
        other => panic!("expected Api error, got {other:?}"),
    }
    server.await.unwrap();
}

#[tokio::test]
async fn test_narrate_unreachable_is_network_error() {
    // Bind then drop to get a port with nothing listening.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let narrator =
        OpenAiNarrator::new("sk-test").with_base_url(format!("http://{addr}/v1"));
    let err = narrator.narrate(&[PromptTurn::user("begin")]).await.unwrap_err();
    assert!(matches!(err, NarrationError::Network(_)));
}

#[tokio::test]
async fn test_empty_key_is_config_error() {
    let narrator = OpenAiNarrator::new("");
    let err = narrator.narrate(&[]).await.unwrap_err();
    assert!(matches!(err, NarrationError::Config(_)));
}
