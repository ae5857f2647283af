//! Round trips against a local `tiny_http` server standing in for IDOL.

use std::io::Read;
use std::sync::mpsc;
use std::time::Duration;

use anl_core::query::{QueryRecord, QuerySpec};
use anl_idol::{IdolClient, IdolDocument, IdolError, IdolHit};
use pretty_assertions::assert_eq;

#[derive(Debug)]
struct Recorded {
    method: String,
    url: String,
    body: String,
}

/// Answer one request per canned `(status, body)` pair, in order.
fn serve(responses: Vec<(u16, &'static str)>) -> (String, mpsc::Receiver<Recorded>) {
    let server = tiny_http::Server::http("127.0.0.1:0").expect("bind mock server");
    let port = server
        .server_addr()
        .to_ip()
        .map(|a| a.port())
        .expect("mock server port");
    let (tx, rx) = mpsc::channel();

    std::thread::spawn(move || {
        for (status, body) in responses {
            let Ok(mut request) = server.recv() else {
                return;
            };
            let mut received = String::new();
            let _ = request.as_reader().read_to_string(&mut received);
            let _ = tx.send(Recorded {
                method: request.method().to_string(),
                url: request.url().to_string(),
                body: received,
            });
            let _ = request.respond(tiny_http::Response::from_string(body).with_status_code(status));
        }
    });

    (format!("http://127.0.0.1:{port}"), rx)
}

fn client(base: &str) -> IdolClient {
    IdolClient::new(base, base, Duration::from_secs(5))
        .expect("client builds")
        .with_max_results(50)
}

fn hit(reference: &str) -> IdolHit {
    let mut document = IdolDocument::new();
    document.insert("DRECONTENT".into(), vec![format!("content of {reference}")]);
    IdolHit {
        reference: reference.into(),
        document,
        ..Default::default()
    }
}

#[tokio::test]
async fn query_encodes_parameters() {
    let (base, rx) = serve(vec![(
        200,
        r#"{"autnresponse": {"action": "QUERY", "response": "SUCCESS",
            "responsedata": {"hit": [{"reference": "a",
            "content": {"DOCUMENT": [{"DRECONTENT": ["hello world, long enough"]}]}}]}}}"#,
    )]);

    let record = QueryRecord::unlabeled(
        &QuerySpec {
            text: "covid war".into(),
            fieldtext: String::new(),
        },
        "LABELS",
    );
    let hits = client(&base).query(&record).await.expect("query succeeds");
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].first("DRECONTENT"), Some("hello world, long enough"));

    let request = rx.recv().unwrap();
    assert_eq!(request.method, "GET");
    assert_eq!(
        request.url,
        "/action=Query&ResponseFormat=simplejson&Print=all&MaxResults=50\
         &Text=covid%20war&FieldText=NOT%20EXISTS%7B%7D%3ALABELS"
    );
}

#[tokio::test]
async fn query_http_failure_is_api_error() {
    let (base, _rx) = serve(vec![(500, "internal")]);
    let record = QueryRecord::unlabeled(&QuerySpec::default(), "LABELS");
    let err = client(&base).query(&record).await.unwrap_err();
    assert!(matches!(err, IdolError::Api { status: 500, .. }));
}

#[tokio::test]
async fn remove_documents_batches_references() {
    let (base, rx) = serve(vec![(200, "INDEXID=1"), (200, "INDEXID=2")]);

    let ids = client(&base)
        .remove_documents(["a", "b", "c/d"], 2)
        .await
        .expect("delete succeeds");
    assert_eq!(ids, vec![1, 2]);

    assert_eq!(rx.recv().unwrap().url, "/DREDELETEREF?Docs=a+b");
    assert_eq!(rx.recv().unwrap().url, "/DREDELETEREF?Docs=c%2Fd");
}

#[tokio::test]
async fn index_into_idol_posts_idx_batches() {
    let (base, rx) = serve(vec![(200, "INDEXID=7"), (200, "INDEXID=8")]);

    let docs = vec![hit("a"), hit("b"), hit("c")];
    let ids = client(&base)
        .index_into_idol(&docs, "Staging", 2)
        .await
        .expect("index succeeds");
    assert_eq!(ids, vec![7, 8]);

    let first = rx.recv().unwrap();
    assert_eq!(first.method, "POST");
    assert_eq!(first.url, "/DREADDDATA?");
    assert_eq!(first.body.matches("#DREENDDOC").count(), 2);
    assert!(first.body.contains("#DREDBNAME Staging"));
    assert!(first.body.ends_with("#DREENDDATANOOP\n\n"));

    let second = rx.recv().unwrap();
    assert_eq!(second.body.matches("#DREENDDOC").count(), 1);
    assert!(second.body.contains("content of c"));
}

#[tokio::test]
async fn unacknowledged_index_command_fails() {
    let (base, _rx) = serve(vec![(200, "ERROR")]);
    let err = client(&base)
        .index_into_idol(&[hit("a")], "Staging", 80)
        .await
        .unwrap_err();
    assert!(matches!(err, IdolError::Index { .. }));
}
