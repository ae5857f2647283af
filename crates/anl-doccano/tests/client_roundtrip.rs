//! Round trips against a local `tiny_http` server standing in for Doccano.

use std::io::Read;
use std::sync::mpsc;
use std::time::Duration;

use anl_doccano::{DoccanoClient, DoccanoError};
use pretty_assertions::assert_eq;

#[derive(Debug)]
struct Recorded {
    method: String,
    url: String,
    authorization: Option<String>,
    body: String,
}

/// Bind a mock server and return it with its base URL.
fn bind() -> (tiny_http::Server, String) {
    let server = tiny_http::Server::http("127.0.0.1:0").expect("bind mock server");
    let port = server
        .server_addr()
        .to_ip()
        .map(|a| a.port())
        .expect("mock server port");
    (server, format!("http://127.0.0.1:{port}"))
}

/// Answer one request per canned `(status, body)` pair, in order.
fn serve(responses: Vec<(u16, &'static str)>) -> (String, mpsc::Receiver<Recorded>) {
    let (server, base) = bind();
    let responses = responses
        .into_iter()
        .map(|(status, body)| (status, body.to_string()))
        .collect();
    (base, answer(server, responses))
}

fn answer(server: tiny_http::Server, responses: Vec<(u16, String)>) -> mpsc::Receiver<Recorded> {
    let (tx, rx) = mpsc::channel();

    std::thread::spawn(move || {
        for (status, body) in responses {
            let Ok(mut request) = server.recv() else {
                return;
            };
            let mut received = String::new();
            let _ = request.as_reader().read_to_string(&mut received);
            let authorization = request
                .headers()
                .iter()
                .find(|h| h.field.equiv("Authorization"))
                .map(|h| h.value.as_str().to_string());
            let _ = tx.send(Recorded {
                method: request.method().to_string(),
                url: request.url().to_string(),
                authorization,
                body: received,
            });

            let response = tiny_http::Response::from_string(body)
                .with_status_code(status)
                .with_header(
                    tiny_http::Header::from_bytes("Content-Type", "application/json")
                        .expect("static header"),
                );
            let _ = request.respond(response);
        }
    });

    rx
}

async fn logged_in(base: &str) -> DoccanoClient {
    DoccanoClient::login(base, "admin", "secret", Duration::from_secs(5))
        .await
        .expect("login should succeed")
}

#[tokio::test]
async fn login_then_me_sends_token() {
    let (base, rx) = serve(vec![
        (200, r#"{"token": "tok-123"}"#),
        (200, r#"{"id": 1, "username": "admin", "is_superuser": true}"#),
    ]);

    let client = logged_in(&base).await;
    assert!(client.is_authenticated());
    let me = client.get_me().await.expect("me should succeed");
    assert_eq!(me.username, "admin");
    assert!(me.is_superuser);

    let login = rx.recv().expect("login request");
    assert_eq!(login.method, "POST");
    assert_eq!(login.url, "/v1/auth-token");
    assert!(login.body.contains("\"username\":\"admin\""));
    assert_eq!(login.authorization, None);

    let me_req = rx.recv().expect("me request");
    assert_eq!(me_req.url, "/v1/me");
    assert_eq!(me_req.authorization.as_deref(), Some("Token tok-123"));
}

#[tokio::test]
async fn rejected_login_is_api_error() {
    let (base, _rx) = serve(vec![(400, r#"{"non_field_errors": ["bad credentials"]}"#)]);

    let err = DoccanoClient::login(&base, "admin", "wrong", Duration::from_secs(5))
        .await
        .unwrap_err();
    assert!(matches!(err, DoccanoError::Api { status: 400, .. }));
}

#[tokio::test]
async fn login_without_token_is_auth_error() {
    let (base, _rx) = serve(vec![(200, "{}")]);

    let err = DoccanoClient::login(&base, "admin", "secret", Duration::from_secs(5))
        .await
        .unwrap_err();
    assert!(matches!(err, DoccanoError::Auth(_)));
}

#[tokio::test]
async fn list_projects_parses_results() {
    let (base, rx) = serve(vec![
        (200, r#"{"token": "tok"}"#),
        (
            200,
            r#"[{"id": 4, "name": "Sentiment", "project_type": "DocumentClassification"},
                {"id": 9, "name": "Books NER", "project_type": "SequenceLabeling"}]"#,
        ),
    ]);

    let client = logged_in(&base).await;
    let projects = client.list_projects().await.expect("list should succeed");
    assert_eq!(projects.len(), 2);
    assert_eq!(projects[1].id, 9);

    let _login = rx.recv().unwrap();
    assert_eq!(rx.recv().unwrap().url, "/v1/projects");
}

#[tokio::test]
async fn list_projects_follows_next_pages() {
    let (server, base) = bind();
    let rx = answer(
        server,
        vec![
            (200, r#"{"token": "tok"}"#.to_string()),
            (
                200,
                format!(
                    r#"{{"count": 2, "next": "{base}/v1/projects?page=2", "previous": null,
                        "results": [{{"id": 1, "name": "Other", "project_type": "SequenceLabeling"}}]}}"#
                ),
            ),
            (
                200,
                format!(
                    r#"{{"count": 2, "next": null, "previous": "{base}/v1/projects",
                        "results": [{{"id": 2, "name": "Reviews", "project_type": "DocumentClassification"}}]}}"#
                ),
            ),
        ],
    );

    let client = logged_in(&base).await;
    let projects = client.list_projects().await.expect("list should succeed");
    let names: Vec<&str> = projects.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["Other", "Reviews"]);

    let _login = rx.recv().unwrap();
    assert_eq!(rx.recv().unwrap().url, "/v1/projects");
    let second = rx.recv().unwrap();
    assert_eq!(second.url, "/v1/projects?page=2");
    assert_eq!(second.authorization.as_deref(), Some("Token tok"));
}

#[tokio::test]
async fn list_projects_resolves_relative_next() {
    let (base, rx) = serve(vec![
        (200, r#"{"token": "tok"}"#),
        (200, r#"{"next": "v1/projects?page=2", "results": [{"id": 1, "name": "A"}]}"#),
        (200, r#"{"next": null, "results": [{"id": 2, "name": "B"}]}"#),
    ]);

    let client = logged_in(&base).await;
    assert_eq!(client.list_projects().await.unwrap().len(), 2);

    let _login = rx.recv().unwrap();
    let _first = rx.recv().unwrap();
    assert_eq!(rx.recv().unwrap().url, "/v1/projects?page=2");
}

#[tokio::test]
async fn upload_returns_status_for_success_and_failure() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("reviews.tmp");
    std::fs::write(&file, "{\"text\": \"Great price, really.\", \"labels\": []}\n").unwrap();

    let (base, rx) = serve(vec![
        (200, r#"{"token": "tok"}"#),
        (201, "{}"),
        (500, r#"{"detail": "boom"}"#),
    ]);

    let client = logged_in(&base).await;
    assert_eq!(client.upload_file(4, "json", &file).await.unwrap(), 201);
    assert_eq!(client.upload_file(4, "json", &file).await.unwrap(), 500);

    let _login = rx.recv().unwrap();
    let upload = rx.recv().unwrap();
    assert_eq!(upload.method, "POST");
    assert_eq!(upload.url, "/v1/projects/4/docs/upload");
    assert!(upload.body.contains("name=\"format\""));
    assert!(upload.body.contains("filename=\"reviews.tmp\""));
    assert!(upload.body.contains("Great price, really."));
}

#[tokio::test]
async fn upload_missing_file_is_io_error() {
    let (base, _rx) = serve(vec![(200, r#"{"token": "tok"}"#)]);
    let client = logged_in(&base).await;

    let err = client
        .upload_file(4, "json", std::path::Path::new("/nonexistent/file.tmp"))
        .await
        .unwrap_err();
    assert!(matches!(err, DoccanoError::Io { .. }));
}

#[tokio::test]
async fn download_returns_body_text() {
    let (base, rx) = serve(vec![
        (200, r#"{"token": "tok"}"#),
        (200, "{\"id\": 1, \"text\": \"a\", \"labels\": []}\n"),
        (404, r#"{"detail": "Not found."}"#),
    ]);

    let client = logged_in(&base).await;
    let body = client.download(4, "jsonl").await.unwrap();
    assert!(body.starts_with("{\"id\": 1"));

    let err = client.download(5, "jsonl").await.unwrap_err();
    assert!(matches!(err, DoccanoError::Api { status: 404, .. }));

    let _login = rx.recv().unwrap();
    assert_eq!(rx.recv().unwrap().url, "/v1/projects/4/docs/download?q=jsonl");
}
