//! End-to-end tests for the book search routes against a mocked catalog.

use std::time::Duration;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use folio_kernel::{settings::Settings, ModuleRegistry};
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const VOLUMES_PATH: &str = "/books/v1/volumes";

fn settings_for(server: &MockServer) -> Settings {
    let mut settings = Settings::default();
    settings.upstream.base_url = format!("{}{}", server.uri(), VOLUMES_PATH);
    settings.upstream.timeout_ms = 2000;
    settings
}

fn app(settings: &Settings) -> Router {
    let mut registry = ModuleRegistry::new();
    folio_app::register_all(&mut registry, settings).unwrap();
    folio_http::build_router(&registry, settings).unwrap()
}

async fn get(app: Router, uri: &str) -> (StatusCode, Value) {
    send(app, Request::get(uri).body(Body::empty()).unwrap()).await
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn assert_generic_upstream_failure(body: &Value, code: &str) {
    assert_eq!(body["error"]["code"], code);
    assert_eq!(
        body["error"]["message"],
        folio_http::error::UPSTREAM_FAILURE_MESSAGE
    );
    assert!(body.get("items").is_none());
}

fn volumes(total_items: u64, ids: &[&str]) -> Value {
    json!({
        "kind": "books#volumes",
        "totalItems": total_items,
        "items": ids
            .iter()
            .map(|id| json!({ "id": id, "volumeInfo": { "title": format!("Book {id}") } }))
            .collect::<Vec<_>>()
    })
}

#[tokio::test]
async fn keyword_search_wraps_items_in_pagination_envelope() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(VOLUMES_PATH))
        .and(query_param("q", "rust"))
        .and(query_param("startIndex", "0"))
        .and(query_param("maxResults", "10"))
        .respond_with(ResponseTemplate::new(200).set_body_json(volumes(25, &["a", "b"])))
        .expect(1)
        .mount(&server)
        .await;

    let (status, body) = get(app(&settings_for(&server)), "/books?q=rust").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["items"][0]["id"], "a");
    assert_eq!(body["items"][1]["volumeInfo"]["title"], "Book b");
    assert_eq!(
        body["pagination"],
        json!({
            "total_items": 25,
            "current_page": 1,
            "total_pages": 3,
            "results_per_page": 10,
            "has_next_page": true,
            "has_previous_page": false
        })
    );
}

#[tokio::test]
async fn field_routes_qualify_the_upstream_query() {
    let cases = [
        ("/books/title/Dune?page=3", "intitle:Dune"),
        ("/books/author/Asimov?page=3", "inauthor:Asimov"),
        ("/books/category/Fiction?page=3", "subject:Fiction"),
    ];

    for (uri, expected_query) in cases {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(VOLUMES_PATH))
            .and(query_param("q", expected_query))
            .and(query_param("startIndex", "20"))
            .and(query_param("maxResults", "10"))
            .respond_with(ResponseTemplate::new(200).set_body_json(volumes(25, &["z"])))
            .expect(1)
            .mount(&server)
            .await;

        let (status, body) = get(app(&settings_for(&server)), uri).await;

        assert_eq!(status, StatusCode::OK, "{uri}");
        assert_eq!(body["pagination"]["current_page"], 3);
        assert_eq!(body["pagination"]["has_next_page"], false);
        assert_eq!(body["pagination"]["has_previous_page"], true);
    }
}

#[tokio::test]
async fn percent_encoded_path_terms_are_decoded() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(query_param("q", "inauthor:Ursula Le Guin"))
        .respond_with(ResponseTemplate::new(200).set_body_json(volumes(1, &["ea"])))
        .expect(1)
        .mount(&server)
        .await;

    let (status, body) = get(
        app(&settings_for(&server)),
        "/books/author/Ursula%20Le%20Guin",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["pagination"]["total_pages"], 1);
}

#[tokio::test]
async fn custom_page_size_is_forwarded() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(query_param("startIndex", "40"))
        .and(query_param("maxResults", "40"))
        .respond_with(ResponseTemplate::new(200).set_body_json(volumes(81, &["x"])))
        .expect(1)
        .mount(&server)
        .await;

    let (status, body) = get(
        app(&settings_for(&server)),
        "/books?q=history&page=2&results_per_page=40",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["pagination"]["total_pages"], 3);
    assert_eq!(body["pagination"]["results_per_page"], 40);
    assert_eq!(body["pagination"]["has_next_page"], true);
}

#[tokio::test]
async fn empty_catalog_answer_yields_zero_pages() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "kind": "books#volumes", "totalItems": 0 })))
        .mount(&server)
        .await;

    let (status, body) = get(app(&settings_for(&server)), "/books?q=zzzz&page=2").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["items"], json!([]));
    assert_eq!(body["pagination"]["total_pages"], 0);
    assert_eq!(body["pagination"]["has_next_page"], false);
    assert_eq!(body["pagination"]["has_previous_page"], true);
}

#[tokio::test]
async fn upstream_error_status_is_passed_through() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({ "error": { "message": "secret internals" } })))
        .expect(1)
        .mount(&server)
        .await;

    let (status, body) = get(app(&settings_for(&server)), "/books/title/Dune").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body.get("items").is_none());
    assert_eq!(body["error"]["code"], "upstream_error");
    assert_eq!(
        body["error"]["message"],
        folio_http::error::UPSTREAM_FAILURE_MESSAGE
    );
    assert!(!body.to_string().contains("secret internals"));
}

#[tokio::test]
async fn upstream_client_error_keeps_its_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    let (status, _) = get(app(&settings_for(&server)), "/books?q=dune").await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn malformed_upstream_json_is_a_bad_gateway() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header(header::CONTENT_TYPE.as_str(), "application/json")
                .set_body_string("{\"totalItems\": "),
        )
        .mount(&server)
        .await;

    let (status, body) = get(app(&settings_for(&server)), "/books?q=dune").await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"]["code"], "bad_gateway");
}

#[tokio::test]
async fn catalog_records_are_forwarded_byte_for_byte() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header(header::CONTENT_TYPE.as_str(), "application/json")
                .set_body_string(r#"{"totalItems":1,"items":[{"zeta":1,"alpha":1.10}]}"#),
        )
        .mount(&server)
        .await;

    let response = app(&settings_for(&server))
        .oneshot(Request::get("/books?q=x").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let text = std::str::from_utf8(&bytes).unwrap();
    assert!(
        text.starts_with(r#"{"items":[{"zeta":1,"alpha":1.10}],"pagination":"#),
        "{text}"
    );
}

#[tokio::test]
async fn unreachable_catalog_is_a_bad_gateway() {
    let mut settings = Settings::default();
    settings.upstream.base_url = format!("http://127.0.0.1:1{VOLUMES_PATH}");
    settings.upstream.timeout_ms = 2000;

    let (status, body) = get(app(&settings), "/books?q=dune").await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_generic_upstream_failure(&body, "bad_gateway");
}

#[tokio::test]
async fn slow_catalog_is_a_gateway_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(volumes(1, &["late"]))
                .set_delay(Duration::from_millis(800)),
        )
        .mount(&server)
        .await;

    let mut settings = settings_for(&server);
    settings.upstream.timeout_ms = 200;

    let (status, body) = get(app(&settings), "/books/title/Dune").await;

    assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
    assert_generic_upstream_failure(&body, "gateway_timeout");
}

#[tokio::test]
async fn server_request_timeout_uses_error_envelope() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(volumes(1, &["late"]))
                .set_delay(Duration::from_millis(800)),
        )
        .mount(&server)
        .await;

    let mut settings = settings_for(&server);
    settings.server.request_timeout_ms = 200;

    let (status, body) = get(app(&settings), "/books?q=dune").await;

    assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
    assert_eq!(body["error"]["code"], "gateway_timeout");
}

#[tokio::test]
async fn unsupported_method_uses_error_envelope() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(volumes(1, &["a"])))
        .expect(0)
        .mount(&server)
        .await;

    let request = Request::post("/books?q=x").body(Body::empty()).unwrap();
    let (status, body) = send(app(&settings_for(&server)), request).await;

    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(body["error"]["code"], "method_not_allowed");
}

#[tokio::test]
async fn non_200_success_status_is_passed_through() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(203).set_body_json(volumes(1, &["a"])))
        .mount(&server)
        .await;

    let (status, body) = get(app(&settings_for(&server)), "/books?q=dune").await;

    assert_eq!(status, StatusCode::NON_AUTHORITATIVE_INFORMATION);
    assert_eq!(body["error"]["code"], "upstream_error");
}

#[tokio::test]
async fn out_of_range_pagination_never_reaches_upstream() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(volumes(1, &["a"])))
        .expect(0)
        .mount(&server)
        .await;

    let settings = settings_for(&server);
    for uri in [
        "/books?q=dune&page=0",
        "/books?q=dune&results_per_page=41",
        "/books/title/Dune?results_per_page=0",
        "/books/author/Herbert?page=-1",
    ] {
        let (status, body) = get(app(&settings), uri).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "{uri}");
        assert_eq!(body["error"]["code"], "validation_error");
        assert!(!body["error"]["details"].as_array().unwrap().is_empty());
    }
}

#[tokio::test]
async fn both_pagination_violations_are_reported() {
    let server = MockServer::start().await;

    let (status, body) = get(
        app(&settings_for(&server)),
        "/books/category/Fiction?page=0&results_per_page=100",
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    let fields: Vec<&str> = body["error"]["details"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["field"].as_str().unwrap())
        .collect();
    assert_eq!(fields, vec!["page", "results_per_page"]);
}

#[tokio::test]
async fn missing_or_malformed_query_parameters_are_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(volumes(1, &["a"])))
        .expect(0)
        .mount(&server)
        .await;

    let settings = settings_for(&server);
    for uri in ["/books", "/books?q=dune&page=two"] {
        let (status, body) = get(app(&settings), uri).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "{uri}");
        assert_eq!(body["error"]["details"][0]["field"], "query");
    }
}

#[tokio::test]
async fn health_check_and_openapi_are_available() {
    let server = MockServer::start().await;
    let settings = settings_for(&server);

    let (status, body) = get(app(&settings), "/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "ok" }));

    let (status, body) = get(app(&settings), "/openapi.json").await;
    assert_eq!(status, StatusCode::OK);
    for documented in [
        "/books",
        "/books/title/{title}",
        "/books/author/{author}",
        "/books/category/{category}",
    ] {
        assert!(body["paths"].get(documented).is_some(), "{documented}");
    }
    assert!(body["components"]["schemas"]
        .get("BookSearchResponse")
        .is_some());
}
