//! End-to-end client tests against canned TCP servers.
//!
//! Each test spins up a `TcpListener` that speaks just enough HTTP/1.1 to
//! exercise one behavior, then points a real `MeshyClient` at it. SSE
//! responses use close-delimited bodies, like the live endpoint.

use std::time::Duration;

use meshy::{MeshyClient, MeshyConfig, MeshyError};
use serde_json::{json, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

const SSE_HEADER: &[u8] = b"HTTP/1.1 200 OK\r\ncontent-type: text/event-stream\r\n\r\n";

/// How the canned server ends the connection after writing its chunks.
enum After {
    Close,
    HoldOpen,
}

/// Serve exactly one connection: read the request headers, write each chunk
/// with a short pause between them, then close or hold the socket open.
async fn spawn_server(chunks: Vec<Vec<u8>>, after: After) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();

        let mut request = Vec::new();
        let mut byte = [0u8; 1];
        while !request.ends_with(b"\r\n\r\n") {
            if socket.read_exact(&mut byte).await.is_err() {
                return;
            }
            request.push(byte[0]);
        }

        for chunk in chunks {
            socket.write_all(&chunk).await.unwrap();
            socket.flush().await.unwrap();
            tokio::time::sleep(Duration::from_millis(5)).await;
        }

        match after {
            After::Close => drop(socket),
            After::HoldOpen => tokio::time::sleep(Duration::from_secs(30)).await,
        }
    });

    format!("http://{addr}")
}

fn client_for(base_url: &str) -> MeshyClient {
    let config = MeshyConfig::new("test-key", base_url, 5_000).unwrap();
    MeshyClient::new(config).unwrap()
}

#[tokio::test]
async fn terminal_frame_returns_without_waiting_for_close() {
    let mut response = SSE_HEADER.to_vec();
    response.extend_from_slice(
        b"data: {\"status\":\"IN_PROGRESS\",\"progress\":40}\n\ndata: {\"status\":\"SUCCEEDED\",\"id\":\"t1\"}\n\n",
    );
    // The server never closes; only the terminal status can end the call.
    let base = spawn_server(vec![response], After::HoldOpen).await;
    let client = client_for(&base);

    let snapshot = tokio::time::timeout(
        Duration::from_secs(2),
        client.stream_task("v2/text-to-3d/t1/stream", None),
    )
    .await
    .expect("terminal frame should end the stream immediately")
    .unwrap();

    assert_eq!(snapshot, json!({"status": "SUCCEEDED", "id": "t1"}));
}

#[tokio::test]
async fn byte_level_chunking_does_not_change_the_result() {
    let mut full = SSE_HEADER.to_vec();
    full.extend_from_slice(
        "data: {\"status\":\"IN_PROGRESS\",\"note\":\"caf\u{e9} \u{4e2d}\"}\n\ndata: {\"status\":\"SUCCEEDED\",\"note\":\"caf\u{e9} \u{4e2d}\"}\n".as_bytes(),
    );
    // One byte per write splits lines and multi-byte characters arbitrarily.
    let chunks: Vec<Vec<u8>> = full.iter().map(|b| vec![*b]).collect();
    let base = spawn_server(chunks, After::Close).await;
    let client = client_for(&base);

    let snapshot = client
        .stream_task("v2/text-to-3d/t1/stream", None)
        .await
        .unwrap();
    assert_eq!(
        snapshot,
        json!({"status": "SUCCEEDED", "note": "caf\u{e9} \u{4e2d}"})
    );
}

#[tokio::test]
async fn malformed_frame_is_survived_by_a_later_terminal_frame() {
    let mut response = SSE_HEADER.to_vec();
    response.extend_from_slice(b"data: {broken\n\ndata: {\"status\":\"FAILED\",\"task_error\":\"oops\"}\n\n");
    let base = spawn_server(vec![response], After::Close).await;
    let client = client_for(&base);

    let snapshot = client
        .stream_task("v1/remesh/t1/stream", None)
        .await
        .unwrap();
    assert_eq!(snapshot["status"], "FAILED");
}

#[tokio::test]
async fn clean_close_returns_the_last_snapshot() {
    let mut response = SSE_HEADER.to_vec();
    response.extend_from_slice(
        b"data: {\"status\":\"PENDING\"}\n\ndata: {\"status\":\"IN_PROGRESS\",\"progress\":70}\n\n",
    );
    let base = spawn_server(vec![response], After::Close).await;
    let client = client_for(&base);

    let snapshot = client
        .stream_task("v1/image-to-3d/t1/stream", None)
        .await
        .unwrap();
    assert_eq!(snapshot, json!({"status": "IN_PROGRESS", "progress": 70}));
}

#[tokio::test]
async fn unterminated_final_line_is_flushed_on_close() {
    let mut response = SSE_HEADER.to_vec();
    // No trailing newline after the terminal frame.
    response.extend_from_slice(b"data: {\"status\":\"CANCELED\"}");
    let base = spawn_server(vec![response], After::Close).await;
    let client = client_for(&base);

    let snapshot = client
        .stream_task("v1/text-to-texture/t1/stream", None)
        .await
        .unwrap();
    assert_eq!(snapshot, json!({"status": "CANCELED"}));
}

#[tokio::test]
async fn empty_stream_yields_the_no_data_placeholder() {
    let base = spawn_server(vec![SSE_HEADER.to_vec()], After::Close).await;
    let client = client_for(&base);

    let snapshot = client
        .stream_task("v2/text-to-3d/t1/stream", None)
        .await
        .unwrap();
    assert_eq!(snapshot, json!({"error": "No data received from stream"}));
}

#[tokio::test]
async fn silent_stream_times_out_with_the_requested_budget() {
    // Header arrives but no frames ever do.
    let base = spawn_server(vec![SSE_HEADER.to_vec()], After::HoldOpen).await;
    let client = client_for(&base);

    let err = tokio::time::timeout(
        Duration::from_secs(2),
        client.stream_task("v2/text-to-3d/t1/stream", Some(50)),
    )
    .await
    .expect("deadline should fire well before the outer timeout")
    .unwrap_err();

    match err {
        MeshyError::StreamTimeout(budget_ms) => assert_eq!(budget_ms, 50),
        other => panic!("expected StreamTimeout, got {other}"),
    }
}

#[tokio::test]
async fn unanswered_request_times_out_before_headers_arrive() {
    // The server accepts and reads the request but never writes a response.
    let base = spawn_server(vec![], After::HoldOpen).await;
    let client = client_for(&base);

    let start = std::time::Instant::now();
    let err = tokio::time::timeout(
        Duration::from_secs(2),
        client.stream_task("v2/text-to-3d/t1/stream", Some(50)),
    )
    .await
    .expect("deadline should fire well before the outer timeout")
    .unwrap_err();

    assert!(matches!(err, MeshyError::StreamTimeout(50)));
    assert!(start.elapsed() < Duration::from_millis(500));
}

#[tokio::test]
async fn non_success_stream_response_is_a_request_failure() {
    let response =
        b"HTTP/1.1 404 Not Found\r\ncontent-length: 14\r\n\r\ntask not found".to_vec();
    let base = spawn_server(vec![response], After::Close).await;
    let client = client_for(&base);

    let err = client
        .stream_task("v2/text-to-3d/missing/stream", None)
        .await
        .unwrap_err();
    match err {
        MeshyError::RequestFailed { status, body, .. } => {
            assert_eq!(status, 404);
            assert_eq!(body, "task not found");
        }
        other => panic!("expected RequestFailed, got {other}"),
    }
}

#[tokio::test]
async fn stalled_error_body_on_stream_path_still_honors_the_deadline() {
    // Failure headers arrive, but the close-delimited body never ends.
    let response = b"HTTP/1.1 500 Internal Server Error\r\ncontent-type: text/plain\r\n\r\n".to_vec();
    let base = spawn_server(vec![response], After::HoldOpen).await;
    let client = client_for(&base);

    let start = std::time::Instant::now();
    let err = tokio::time::timeout(
        Duration::from_secs(2),
        client.stream_task("v2/text-to-3d/t1/stream", Some(50)),
    )
    .await
    .expect("deadline should fire well before the outer timeout")
    .unwrap_err();

    match err {
        MeshyError::RequestFailed { status, body, .. } => {
            assert_eq!(status, 500);
            assert_eq!(body, "<body not read before stream deadline>");
        }
        other => panic!("expected RequestFailed, got {other}"),
    }
    assert!(start.elapsed() < Duration::from_millis(500));
}

#[tokio::test]
async fn plain_get_surfaces_status_and_body_on_error() {
    let response =
        b"HTTP/1.1 429 Too Many Requests\r\ncontent-length: 12\r\n\r\nrate limited".to_vec();
    let base = spawn_server(vec![response], After::Close).await;
    let client = client_for(&base);

    let err = client.get("v1/balance", &[], None).await.unwrap_err();
    match err {
        MeshyError::RequestFailed { status, body, url } => {
            assert_eq!(status, 429);
            assert_eq!(body, "rate limited");
            assert!(url.ends_with("/v1/balance"));
        }
        other => panic!("expected RequestFailed, got {other}"),
    }
}

#[tokio::test]
async fn plain_get_decodes_a_json_body() {
    let body = r#"{"balance":42}"#;
    let response = format!(
        "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\n\r\n{}",
        body.len(),
        body
    )
    .into_bytes();
    let base = spawn_server(vec![response], After::Close).await;
    let client = client_for(&base);

    let value: Value = client.get("v1/balance", &[], None).await.unwrap();
    assert_eq!(value, json!({"balance": 42}));
}
