use api_rest::{router, AppState};
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use pdfshare_core::{CoreConfig, OrphanPolicy, ShareServices};
use pdfshare_notify::{DispatchOutcome, NotificationDispatcher, ShareInvite};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use tower::ServiceExt;

const PDF_BYTES: &[u8] = b"%PDF-1.4\n1 0 obj\n<<>>\nendobj\ntrailer\n<<>>\n%%EOF\n";
const BOUNDARY: &str = "pdfshare-test-boundary";
const ORIGIN: &str = "http://localhost:3000";

#[derive(Default)]
struct StubDispatcher {
    sent: Mutex<Vec<ShareInvite>>,
    fail_with: Option<&'static str>,
}

impl NotificationDispatcher for StubDispatcher {
    fn send_share_invite(&self, invite: &ShareInvite) -> DispatchOutcome {
        self.sent.lock().unwrap().push(invite.clone());
        match self.fail_with {
            Some(e) => DispatchOutcome::failed(e),
            None => DispatchOutcome::sent(),
        }
    }
}

struct TestApp {
    _temp: TempDir,
    app: Router,
    dispatcher: Arc<StubDispatcher>,
}

fn test_app(dispatcher: StubDispatcher) -> TestApp {
    let temp = TempDir::new().unwrap();
    let cfg = CoreConfig::new(temp.path().to_path_buf(), ORIGIN, 4096, OrphanPolicy::Keep).unwrap();
    let dispatcher = Arc::new(dispatcher);
    let services = ShareServices::from_config(&cfg, dispatcher.clone()).unwrap();
    let app = router(AppState::new(services, dispatcher.clone(), cfg.max_upload_bytes()));
    TestApp {
        _temp: temp,
        app,
        dispatcher,
    }
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let res = app.clone().oneshot(req).await.unwrap();
    let status = res.status();
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

fn multipart_upload(owner: Option<&str>, file_name: &str, mime: &str, bytes: &[u8]) -> Request<Body> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\nContent-Type: {mime}\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

    let mut req = Request::builder()
        .method("POST")
        .uri("/documents")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        );
    if let Some(owner) = owner {
        req = req
            .header("x-owner-id", owner)
            .header("x-owner-email", format!("{owner}@example.com"));
    }
    req.body(Body::from(body)).unwrap()
}

fn get(uri: &str, owner: Option<&str>) -> Request<Body> {
    let mut req = Request::builder().uri(uri);
    if let Some(owner) = owner {
        req = req.header("x-owner-id", owner);
    }
    req.body(Body::empty()).unwrap()
}

fn post_json(uri: &str, owner: Option<&str>, body: Value) -> Request<Body> {
    let mut req = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(owner) = owner {
        req = req
            .header("x-owner-id", owner)
            .header("x-owner-email", format!("{owner}@example.com"));
    }
    req.body(Body::from(body.to_string())).unwrap()
}

async fn upload_report(app: &Router, owner: &str) -> Value {
    let (status, doc) = send(
        app,
        multipart_upload(Some(owner), "report.pdf", "application/pdf", PDF_BYTES),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    doc
}

#[tokio::test]
async fn test_health() {
    let t = test_app(StubDispatcher::default());
    let (status, body) = send(&t.app, get("/health", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], json!(true));
}

#[tokio::test]
async fn test_upload_then_list_and_search() {
    let t = test_app(StubDispatcher::default());

    let doc = upload_report(&t.app, "uid-a").await;
    assert_eq!(doc["displayName"], "report.pdf");
    assert_eq!(doc["ownerId"], "uid-a");
    assert_eq!(doc["ownerEmail"], "uid-a@example.com");
    assert!(doc["storedName"].as_str().unwrap().starts_with("report_"));
    assert!(!doc["shareId"].as_str().unwrap().is_empty());

    let (status, listed) = send(&t.app, get("/documents", Some("uid-a"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed["documents"].as_array().unwrap().len(), 1);

    let (_, searched) = send(&t.app, get("/documents?search=REP", Some("uid-a"))).await;
    assert_eq!(searched["documents"].as_array().unwrap().len(), 1);

    let (_, missed) = send(&t.app, get("/documents?search=invoice", Some("uid-a"))).await;
    assert!(missed["documents"].as_array().unwrap().is_empty());

    let (_, other_owner) = send(&t.app, get("/documents", Some("uid-b"))).await;
    assert!(other_owner["documents"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_non_pdf_upload_is_rejected() {
    let t = test_app(StubDispatcher::default());

    let (status, body) = send(
        &t.app,
        multipart_upload(Some("uid-a"), "image.png", "image/png", b"\x89PNG\r\n"),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Please select a PDF file.");

    let (_, listed) = send(&t.app, get("/documents", Some("uid-a"))).await;
    assert!(listed["documents"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_anonymous_upload_and_listing_require_sign_in() {
    let t = test_app(StubDispatcher::default());

    let (status, body) = send(
        &t.app,
        multipart_upload(None, "report.pdf", "application/pdf", PDF_BYTES),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["login"], "/login");

    let (status, body) = send(&t.app, get("/documents", None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["login"], "/login");
}

#[tokio::test]
async fn test_invalid_identity_header_is_bad_request() {
    let t = test_app(StubDispatcher::default());
    let (status, _) = send(&t.app, get("/documents", Some("a b"))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_anonymous_visitor_reads_and_comments() {
    let t = test_app(StubDispatcher::default());
    let doc = upload_report(&t.app, "uid-a").await;
    let share_id = doc["shareId"].as_str().unwrap();

    let (status, shared) = send(&t.app, get(&format!("/shared/{share_id}"), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(shared["document"]["shareId"], doc["shareId"]);
    assert_eq!(shared["document"]["contentUrl"], doc["contentUrl"]);
    assert!(shared["comments"].as_array().unwrap().is_empty());

    let (status, thread) = send(
        &t.app,
        post_json(
            &format!("/shared/{share_id}/comments"),
            None,
            json!({"text": "looks good"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let comments = thread["comments"].as_array().unwrap();
    assert_eq!(comments.len(), 1);
    assert_eq!(comments[0]["authorLabel"], "Anonymous");
    assert_eq!(comments[0]["text"], "looks good");

    let (_, thread) = send(
        &t.app,
        post_json(
            &format!("/shared/{share_id}/comments"),
            Some("uid-c"),
            json!({"text": "agreed"}),
        ),
    )
    .await;
    let comments = thread["comments"].as_array().unwrap();
    assert_eq!(comments.len(), 2);
    assert_eq!(comments[1]["authorLabel"], "uid-c@example.com");

    let (status, via_pdf) = send(&t.app, get(&format!("/pdf/{share_id}"), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(via_pdf["document"]["shareId"], doc["shareId"]);
    assert_eq!(via_pdf["comments"].as_array().unwrap().len(), 2);

    let (_, listed) = send(&t.app, get(&format!("/shared/{share_id}/comments"), None)).await;
    assert_eq!(listed["comments"], thread["comments"]);
}

#[tokio::test]
async fn test_blank_comment_is_rejected() {
    let t = test_app(StubDispatcher::default());
    let doc = upload_report(&t.app, "uid-a").await;
    let share_id = doc["shareId"].as_str().unwrap();

    let (status, _) = send(
        &t.app,
        post_json(
            &format!("/shared/{share_id}/comments"),
            None,
            json!({"text": "   "}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unknown_share_ids_are_not_found() {
    let t = test_app(StubDispatcher::default());
    upload_report(&t.app, "uid-a").await;

    for uri in [
        "/shared/does-not-exist",
        "/shared/..%2F..%2Fdocuments",
        "/pdf/00000000-0000-4000-8000-000000000000",
        "/shared/nope/comments",
    ] {
        let (status, body) = send(&t.app, get(uri, None)).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
        assert_eq!(body["error"], "Not found");
    }
}

async fn fetch_pdf(app: &Router, uri: &str) -> (StatusCode, Vec<u8>) {
    let res = app.clone().oneshot(get(uri, None)).await.unwrap();
    let status = res.status();
    if status == StatusCode::OK {
        assert_eq!(
            res.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/pdf"
        );
    }
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    (status, bytes.to_vec())
}

#[tokio::test]
async fn test_content_url_serves_pdf_bytes() {
    let t = test_app(StubDispatcher::default());
    let doc = upload_report(&t.app, "uid-a").await;
    let share_id = doc["shareId"].as_str().unwrap();

    let content_url = doc["contentUrl"].as_str().unwrap();
    assert_eq!(content_url, format!("{ORIGIN}/shared/{share_id}/content"));

    let path = content_url.strip_prefix(ORIGIN).unwrap();
    let (status, bytes) = fetch_pdf(&t.app, path).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(bytes, PDF_BYTES);

    let (status, _) = fetch_pdf(&t.app, "/shared/does-not-exist/content").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_unshared_pdf_is_unreachable_from_another_share_link() {
    let t = test_app(StubDispatcher::default());
    let (_, public) = send(
        &t.app,
        multipart_upload(Some("uid-a"), "public.pdf", "application/pdf", PDF_BYTES),
    )
    .await;
    let (_, secret) = send(
        &t.app,
        multipart_upload(Some("uid-a"), "secret.pdf", "application/pdf", b"%PDF-1.4 SECRET"),
    )
    .await;
    let public_id = public["shareId"].as_str().unwrap();

    let (status, shared) = send(&t.app, get(&format!("/shared/{public_id}"), None)).await;
    assert_eq!(status, StatusCode::OK);
    let exposed = shared["document"].as_object().unwrap();
    for field in ["id", "ownerId", "ownerEmail", "storedName"] {
        assert!(!exposed.contains_key(field), "{field} exposed to share holder");
    }
    let exposed_url = shared["document"]["contentUrl"].as_str().unwrap();
    assert!(!exposed_url.contains("uid-a"));

    let secret_stored = secret["storedName"].as_str().unwrap();
    for uri in [
        format!("/blobs/uid-a/{secret_stored}"),
        format!("/shared/{secret_stored}/content"),
        format!("/shared/uid-a/{secret_stored}"),
    ] {
        let (status, bytes) = fetch_pdf(&t.app, &uri).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
        assert_ne!(bytes, b"%PDF-1.4 SECRET");
    }

    let (status, bytes) = fetch_pdf(
        &t.app,
        &format!("/shared/{}/content", secret["shareId"].as_str().unwrap()),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(bytes, b"%PDF-1.4 SECRET");
}

#[tokio::test]
async fn test_share_link_routes() {
    let t = test_app(StubDispatcher::default());
    let doc = upload_report(&t.app, "uid-a").await;
    let share_id = doc["shareId"].as_str().unwrap();

    let (_, shared) = send(&t.app, get(&format!("/shared/{share_id}/link"), None)).await;
    assert_eq!(shared["link"], format!("{ORIGIN}/shared/{share_id}"));

    let (_, pdf) = send(
        &t.app,
        get(&format!("/shared/{share_id}/link?route=pdf"), None),
    )
    .await;
    assert_eq!(pdf["link"], format!("{ORIGIN}/pdf/{share_id}"));

    let (status, _) = send(
        &t.app,
        get(&format!("/shared/{share_id}/link?route=other"), None),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_invite_flow() {
    let t = test_app(StubDispatcher::default());
    let doc = upload_report(&t.app, "uid-a").await;
    let share_id = doc["shareId"].as_str().unwrap();
    let uri = format!("/shared/{share_id}/invite");

    let (status, body) = send(&t.app, post_json(&uri, Some("uid-a"), json!({"email": ""}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Please enter an email address.");

    let (status, body) = send(
        &t.app,
        post_json(&uri, Some("uid-a"), json!({"email": "bob@nowhere"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Please enter a valid email address.");

    let (status, _) = send(
        &t.app,
        post_json(&uri, Some("uid-b"), json!({"email": "bob@example.com"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&t.app, post_json(&uri, None, json!({"email": "bob@example.com"}))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send(
        &t.app,
        post_json(&uri, Some("uid-a"), json!({"email": "bob@example.com"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"success": true}));

    let sent = t.dispatcher.sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].email, "bob@example.com");
    assert_eq!(sent[0].pdf_name, "report.pdf");
    assert_eq!(sent[0].share_link, format!("{ORIGIN}/shared/{share_id}"));
}

#[tokio::test]
async fn test_send_share_email_reports_failure_in_body() {
    let t = test_app(StubDispatcher {
        fail_with: Some("mailbox unavailable"),
        ..Default::default()
    });

    let (status, body) = send(
        &t.app,
        post_json(
            "/functions/sendShareEmail",
            None,
            json!({"email": "bob@example.com", "pdfName": "report.pdf", "shareLink": "http://x/shared/1"}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({"success": false, "error": "mailbox unavailable"})
    );
    assert_eq!(t.dispatcher.sent.lock().unwrap()[0].pdf_name, "report.pdf");
}

#[tokio::test]
async fn test_oversized_upload_is_rejected() {
    let t = test_app(StubDispatcher::default());
    let big = vec![b'x'; 8192];

    let (status, _) = send(
        &t.app,
        multipart_upload(Some("uid-a"), "big.pdf", "application/pdf", &big),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
