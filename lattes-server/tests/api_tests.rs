//! Integration tests for lattes-server API endpoints
//!
//! Each test builds the router over a fresh in-memory database and drives it
//! with `oneshot` requests.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use lattes_common::db::init_memory_database;
use lattes_server::{build_router, AppState};
use serde_json::Value;
use tower::util::ServiceExt; // for `oneshot` method

const BOUNDARY: &str = "lattes-test-boundary";

/// Test helper: Create app over an empty in-memory database
async fn setup_app() -> Router {
    let db = init_memory_database()
        .await
        .expect("Should create in-memory database");
    build_router(AppState::new(db))
}

/// Test helper: Minimal Lattes document
fn curriculum_xml(full_name: &str, article_titles: &[&str]) -> String {
    let articles: String = article_titles
        .iter()
        .map(|title| {
            format!(
                r#"<ARTIGO-PUBLICADO><DADOS-BASICOS-DO-ARTIGO TITULO-DO-ARTIGO="{}"/></ARTIGO-PUBLICADO>"#,
                title
            )
        })
        .collect();

    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<CURRICULO-VITAE>
  <DADOS-GERAIS NOME-COMPLETO="{}"/>
  <PRODUCAO-BIBLIOGRAFICA><ARTIGOS-PUBLICADOS>{}</ARTIGOS-PUBLICADOS></PRODUCAO-BIBLIOGRAFICA>
</CURRICULO-VITAE>"#,
        full_name, articles
    )
}

/// Test helper: multipart/form-data upload of (filename, content) pairs
fn upload_request(files: &[(&str, &str)]) -> Request<Body> {
    let mut body = String::new();
    for (filename, content) in files {
        body.push_str(&format!("--{}\r\n", BOUNDARY));
        body.push_str(&format!(
            "Content-Disposition: form-data; name=\"files\"; filename=\"{}\"\r\n",
            filename
        ));
        body.push_str("Content-Type: text/xml\r\n\r\n");
        body.push_str(content);
        body.push_str("\r\n");
    }
    body.push_str(&format!("--{}--\r\n", BOUNDARY));

    Request::builder()
        .method("POST")
        .uri("/process-xmls")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

/// Test helper: send request and decode JSON body
async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("Should read body")
        .to_bytes();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

fn pairs(body: &Value) -> Vec<(String, String)> {
    body.as_array()
        .expect("Expected JSON array")
        .iter()
        .map(|hit| {
            (
                hit["researcher"].as_str().unwrap().to_string(),
                hit["title"].as_str().unwrap().to_string(),
            )
        })
        .collect()
}

// =============================================================================
// Health
// =============================================================================

#[tokio::test]
async fn test_root_reports_running() {
    let app = setup_app().await;

    let (status, body) = send(&app, get_request("/")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Lattes XML Processor API is running");
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = setup_app().await;

    let (status, body) = send(&app, get_request("/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "lattes-server");
    assert!(body["version"].is_string());
    assert!(body["uptime_seconds"].is_number());
}

#[tokio::test]
async fn test_unknown_route_is_json_404() {
    let app = setup_app().await;

    let (status, body) = send(&app, get_request("/nope")).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

// =============================================================================
// Upload
// =============================================================================

#[tokio::test]
async fn test_upload_then_reupload_is_idempotent() {
    let app = setup_app().await;
    let xml = curriculum_xml("Ana Silva", &["Mineração de Currículos", "Redes Complexas"]);

    let (status, first) = send(&app, upload_request(&[("ana.xml", xml.as_str())])).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["researchers_added"], 1);
    assert_eq!(first["publications_added"], 2);
    assert_eq!(first["files_processed"], 1);
    assert_eq!(first["message"], "Successfully processed 1 XML files");

    let (status, second) = send(&app, upload_request(&[("ana.xml", xml.as_str())])).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["researchers_added"], 0);
    assert_eq!(second["publications_added"], 0);

    let (_, researchers) = send(&app, get_request("/researchers")).await;
    assert_eq!(researchers.as_array().unwrap().len(), 1);

    let (_, publications) = send(&app, get_request("/publications")).await;
    assert_eq!(publications.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_file_without_general_data_adds_nothing() {
    let app = setup_app().await;
    let xml = r#"<CURRICULO-VITAE><PRODUCAO-BIBLIOGRAFICA>
        <ARTIGO-PUBLICADO><DADOS-BASICOS-DO-ARTIGO TITULO-DO-ARTIGO="Orphan"/></ARTIGO-PUBLICADO>
        </PRODUCAO-BIBLIOGRAFICA></CURRICULO-VITAE>"#;

    let (status, body) = send(&app, upload_request(&[("anon.xml", xml)])).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["researchers_added"], 0);
    assert_eq!(body["publications_added"], 0);
    assert_eq!(body["files_processed"], 0);
    assert_eq!(body["skipped"][0]["filename"], "anon.xml");
    assert_eq!(body["skipped"][0]["reason"], "no researcher data");
}

#[tokio::test]
async fn test_malformed_file_does_not_abort_batch() {
    let app = setup_app().await;
    let good = curriculum_xml("Bruno Costa", &["Sistemas Distribuídos"]);

    let (status, body) = send(
        &app,
        upload_request(&[("broken.xml", "<CURRICULO-VITAE><DADOS-GERAIS>"), ("bruno.xml", good.as_str())]),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["files_received"], 2);
    assert_eq!(body["files_processed"], 1);
    assert_eq!(body["researchers_added"], 1);
    assert_eq!(body["publications_added"], 1);

    let skipped = body["skipped"].as_array().unwrap();
    assert_eq!(skipped.len(), 1);
    assert_eq!(skipped[0]["filename"], "broken.xml");
    assert!(skipped[0]["reason"].as_str().unwrap().starts_with("parse error"));
}

#[tokio::test]
async fn test_non_xml_files_are_skipped() {
    let app = setup_app().await;
    let xml = curriculum_xml("Carla Dias", &["Um Artigo"]);

    let (status, body) = send(&app, upload_request(&[("carla.txt", xml.as_str())])).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["researchers_added"], 0);
    assert_eq!(body["skipped"][0]["reason"], "not an XML file");
}

#[tokio::test]
async fn test_upload_without_files_is_bad_request() {
    let app = setup_app().await;

    let (status, body) = send(&app, upload_request(&[])).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_upload_over_body_limit_is_rejected() {
    let db = init_memory_database().await.unwrap();
    let app = build_router(AppState::new(db).with_max_upload_bytes(256));
    let xml = curriculum_xml("Ana Silva", &["A title long enough to push the body past the limit"; 8]);

    let (status, body) = send(&app, upload_request(&[("ana.xml", xml.as_str())])).await;

    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(body["error"]["code"], "PAYLOAD_TOO_LARGE");
}

// =============================================================================
// Search
// =============================================================================

async fn seeded_app() -> Router {
    let app = setup_app().await;
    let ana = curriculum_xml("Ana Silva", &["Lattes Data Mining", "Zebrafish Genetics"]);
    let bruno = curriculum_xml("Bruno Costa", &["A Survey of LATTES Profiles"]);

    let (status, _) = send(&app, upload_request(&[("ana.xml", ana.as_str()), ("bruno.xml", bruno.as_str())])).await;
    assert_eq!(status, StatusCode::OK);
    app
}

#[tokio::test]
async fn test_search_is_case_insensitive() {
    let app = seeded_app().await;

    let (status, lower) = send(&app, get_request("/search?query=lattes")).await;
    assert_eq!(status, StatusCode::OK);
    let (_, upper) = send(&app, get_request("/search?query=LATTES")).await;

    assert_eq!(lower, upper);
    assert_eq!(lower.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_search_without_match_returns_empty_list() {
    let app = seeded_app().await;

    let (status, body) = send(&app, get_request("/search?query=astrophysics")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::Array(vec![]));
}

#[tokio::test]
async fn test_search_by_author_ordering() {
    let app = seeded_app().await;

    let (status, body) = send(&app, get_request("/search-by-author?name=s")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        pairs(&body),
        vec![
            ("Ana Silva".to_string(), "Lattes Data Mining".to_string()),
            ("Ana Silva".to_string(), "Zebrafish Genetics".to_string()),
            ("Bruno Costa".to_string(), "A Survey of LATTES Profiles".to_string()),
        ]
    );
}

#[tokio::test]
async fn test_search_requires_non_empty_term() {
    let app = seeded_app().await;

    let (status, _) = send(&app, get_request("/search?query=%20%20")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let response = app.clone().oneshot(get_request("/search")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_search_term_spaces_are_part_of_the_match() {
    let app = seeded_app().await;

    let (status, body) = send(&app, get_request("/search?query=%20Data")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        pairs(&body),
        vec![("Ana Silva".to_string(), "Lattes Data Mining".to_string())]
    );

    // "Zebrafish" only appears at the start of a title
    let (status, body) = send(&app, get_request("/search?query=%20Zebrafish")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::Array(vec![]));
}

#[tokio::test]
async fn test_researcher_search() {
    let app = seeded_app().await;

    let (status, body) = send(&app, get_request("/researchers/search?name=COSTA")).await;

    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["full_name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Bruno Costa"]);
}

// =============================================================================
// UI
// =============================================================================

#[tokio::test]
async fn test_ui_is_served() {
    let app = setup_app().await;

    let response = app.clone().oneshot(get_request("/ui")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let html = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(html.contains("Lattes XML Processor"));

    let response = app.clone().oneshot(get_request("/static/app.js")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "application/javascript"
    );
}

#[tokio::test]
async fn test_cors_allows_any_origin() {
    let app = setup_app().await;

    let request = Request::builder()
        .method("GET")
        .uri("/")
        .header(header::ORIGIN, "http://localhost:8501")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();

    assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
}
