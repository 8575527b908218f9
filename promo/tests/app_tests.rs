use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    response::Response,
    Router,
};
use promo::{router, AppState, Configuration};
use promo_auth::{CredentialStore, TokenRecord};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;
use wiremock::matchers::{body_string_contains, header as has_header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const ASIN: &str = "B00KALEHJE";
const DETAIL_URL: &str = "https://www.amazon.com/dp/B00KALEHJE?tag=promo-20";

struct TestApp {
    app: Router,
    credentials: Arc<CredentialStore>,
    _dir: tempfile::TempDir,
}

fn full_configuration(server: &MockServer) -> String {
    format!(
        r#"
        [x]
        client_id = "client-123"
        client_secret = "shh"
        callback_url = "http://localhost:5000/callback"
        auth_url = "{uri}/i/oauth2/authorize"
        api_base = "{uri}"

        [amazon]
        access_key = "AKIDEXAMPLE"
        secret_key = "SECRETKEYEXAMPLE"
        partner_tag = "promo-20"
        base_url = "{uri}"

        [azure_openai]
        endpoint = "{uri}"
        api_key = "azure-key"
        retry_base_ms = 0
        "#,
        uri = server.uri()
    )
}

async fn spawn_app(configuration: &str) -> TestApp {
    let dir = tempfile::tempdir().unwrap();
    let configuration = Configuration::from_toml(configuration).unwrap();
    let credentials = Arc::new(
        CredentialStore::load(dir.path().join("users.json"))
            .await
            .unwrap(),
    );
    let state = AppState::from_configuration(&configuration, credentials.clone()).unwrap();

    TestApp {
        app: router(state),
        credentials,
        _dir: dir,
    }
}

async fn send(app: &Router, request: Request<Body>) -> Response {
    app.clone().oneshot(request).await.unwrap()
}

async fn body_string(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

async fn body_json(response: Response) -> Value {
    serde_json::from_str(&body_string(response).await).unwrap()
}

fn generate_request(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/generate_tweet")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

fn post_form(form: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(form.to_string())).unwrap()
}

fn session_cookie(response: &Response) -> String {
    response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .unwrap()
        .to_string()
}

fn location(response: &Response) -> String {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap()
        .to_string()
}

async fn mount_product(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/paapi5/getitems"))
        .and(has_header(
            "x-amz-target",
            "com.amazon.paapi5.v1.ProductAdvertisingAPIv1.GetItems",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ItemsResult": {
                "Items": [{
                    "ASIN": ASIN,
                    "DetailPageURL": DETAIL_URL,
                    "ItemInfo": {
                        "Title": { "DisplayValue": "Widget Pro" },
                        "Features": { "DisplayValues": ["Fast", "Small"] }
                    }
                }]
            }
        })))
        .mount(server)
        .await;
}

fn completion(content: Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "choices": [{
            "index": 0,
            "message": { "role": "assistant", "content": content.to_string() }
        }]
    }))
}

#[tokio::test]
async fn health_reports_version() {
    let server = MockServer::start().await;
    let test = spawn_app(&full_configuration(&server)).await;

    let response = send(&test.app, get("/health", None)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn generate_tweet_composes_post_text() {
    let server = MockServer::start().await;
    mount_product(&server).await;

    Mock::given(method("POST"))
        .and(path("/openai/deployments/gpt-4.1/chat/completions"))
        .and(query_param("api-version", "2024-12-01-preview"))
        .and(has_header("api-key", "azure-key"))
        .and(body_string_contains("tweet_content"))
        .and(body_string_contains("Product: Widget Pro"))
        .respond_with(completion(json!({
            "description": "Great widget",
            "hashtag1": "gadget",
            "hashtag2": "#Lifestyle"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let test = spawn_app(&full_configuration(&server)).await;
    let response = send(&test.app, generate_request(&json!({ "asin": ASIN }).to_string())).await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["ok"], true);
    assert_eq!(
        body["post_text"],
        format!("Great widget\n{DETAIL_URL}\n#amazon #gadget #lifestyle\n")
    );
}

#[tokio::test]
async fn item_without_detail_url_links_to_product_page() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/paapi5/getitems"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ItemsResult": {
                "Items": [{
                    "ASIN": ASIN,
                    "ItemInfo": {
                        "Title": { "DisplayValue": "Widget Pro" }
                    }
                }]
            }
        })))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/openai/deployments/gpt-4.1/chat/completions"))
        .respond_with(completion(json!({
            "description": "Great widget",
            "hashtag1": "gadget",
            "hashtag2": "home"
        })))
        .mount(&server)
        .await;

    let test = spawn_app(&full_configuration(&server)).await;
    let response = send(&test.app, generate_request(&json!({ "asin": ASIN }).to_string())).await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(
        body["post_text"],
        "Great widget\nhttps://www.amazon.com/dp/B00KALEHJE\n#amazon #gadget #home\n"
    );
}

#[tokio::test]
async fn generation_falls_back_after_three_failures() {
    let server = MockServer::start().await;
    mount_product(&server).await;

    Mock::given(method("POST"))
        .and(path("/openai/deployments/gpt-4.1/chat/completions"))
        .respond_with(ResponseTemplate::new(500).set_body_string("overloaded"))
        .expect(3)
        .mount(&server)
        .await;

    let test = spawn_app(&full_configuration(&server)).await;
    let response = send(&test.app, generate_request(&json!({ "asin": ASIN }).to_string())).await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(
        body["post_text"],
        format!(
            "Discover a must-have upgrade that makes everyday life easier—bring it home today!\n{DETAIL_URL}\n#amazon #home #lifestyle\n"
        )
    );
}

#[tokio::test]
async fn incomplete_completion_is_retried() {
    let server = MockServer::start().await;
    mount_product(&server).await;

    Mock::given(method("POST"))
        .and(path("/openai/deployments/gpt-4.1/chat/completions"))
        .respond_with(completion(json!({
            "description": "",
            "hashtag1": "#a",
            "hashtag2": "#b"
        })))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/openai/deployments/gpt-4.1/chat/completions"))
        .respond_with(completion(json!({
            "description": "Second try",
            "hashtag1": "#tech",
            "hashtag2": "#tech"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let test = spawn_app(&full_configuration(&server)).await;
    let response = send(&test.app, generate_request(&json!({ "asin": ASIN }).to_string())).await;

    let body = body_json(response).await;
    assert_eq!(
        body["post_text"],
        format!("Second try\n{DETAIL_URL}\n#amazon #tech #lifestyle\n")
    );
}

#[tokio::test]
async fn blank_asin_is_rejected_without_network() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let test = spawn_app(&full_configuration(&server)).await;

    for body in [r#"{"asin": "   "}"#, "{}", "not json", ""] {
        let response = send(&test.app, generate_request(body)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(response).await,
            json!({ "ok": false, "error": "ASIN is required" })
        );
    }
}

#[tokio::test]
async fn missing_amazon_configuration_is_reported() {
    let test = spawn_app("").await;

    let response = send(&test.app, generate_request(r#"{"asin": "B00KALEHJE"}"#)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    assert_eq!(body["ok"], false);
    assert!(body["error"].as_str().unwrap().contains("Amazon"));
}

#[tokio::test]
async fn missing_generator_is_reported_after_lookup() {
    let server = MockServer::start().await;
    mount_product(&server).await;

    let configuration = format!(
        r#"
        [amazon]
        access_key = "AKIDEXAMPLE"
        secret_key = "SECRETKEYEXAMPLE"
        partner_tag = "promo-20"
        base_url = "{}"
        "#,
        server.uri()
    );
    let test = spawn_app(&configuration).await;

    let response = send(&test.app, generate_request(r#"{"asin": "B00KALEHJE"}"#)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert!(body["error"].as_str().unwrap().contains("Azure OpenAI"));
}

#[tokio::test]
async fn upstream_product_error_is_surfaced() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/paapi5/getitems"))
        .respond_with(ResponseTemplate::new(429).set_body_string("TooManyRequests"))
        .mount(&server)
        .await;

    let test = spawn_app(&full_configuration(&server)).await;
    let response = send(&test.app, generate_request(r#"{"asin": "B00KALEHJE"}"#)).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    let error = body["error"].as_str().unwrap();
    assert!(error.contains("429"));
    assert!(error.contains("TooManyRequests"));
}

#[tokio::test]
async fn login_without_x_configuration_flashes_error() {
    let test = spawn_app("").await;

    let response = send(&test.app, get("/login", None)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");
    let cookie = session_cookie(&response);

    let page = body_string(send(&test.app, get("/", Some(&cookie))).await).await;
    assert!(page.contains("Missing X configuration"));

    // Flashes are shown once.
    let page = body_string(send(&test.app, get("/", Some(&cookie))).await).await;
    assert!(!page.contains("Missing X configuration"));
}

#[tokio::test]
async fn callback_with_forged_state_makes_no_token_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/2/oauth2/token"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let test = spawn_app(&full_configuration(&server)).await;

    let response = send(&test.app, get("/login", None)).await;
    let cookie = session_cookie(&response);

    let response = send(
        &test.app,
        get("/callback?code=abc&state=forged", Some(&cookie)),
    )
    .await;
    assert_eq!(location(&response), "/");

    let page = body_string(send(&test.app, get("/", Some(&cookie))).await).await;
    assert!(page.contains("state mismatch"));
    assert!(test.credentials.is_empty().await);
}

#[tokio::test]
async fn login_callback_and_post_round_trip() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/2/oauth2/token"))
        .and(body_string_contains("grant_type=authorization_code"))
        .and(body_string_contains("code=the-code"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "token_type": "bearer",
            "access_token": "access-1",
            "refresh_token": "refresh-1",
            "expires_in": 7200
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/2/users/me"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "id": "42", "username": "promo_bot", "name": "Promo Bot" }
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/2/tweets"))
        .and(has_header("authorization", "Bearer access-1"))
        .and(body_string_contains("Hello from promo"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "data": { "id": "1800", "text": "Hello from promo" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let test = spawn_app(&full_configuration(&server)).await;

    let response = send(&test.app, get("/login", None)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let cookie = session_cookie(&response);
    let authorize = reqwest::Url::parse(&location(&response)).unwrap();
    assert_eq!(authorize.path(), "/i/oauth2/authorize");
    let state = authorize
        .query_pairs()
        .find(|(k, _)| k == "state")
        .map(|(_, v)| v.into_owned())
        .unwrap();

    let response = send(
        &test.app,
        get(
            &format!("/callback?code=the-code&state={state}"),
            Some(&cookie),
        ),
    )
    .await;
    assert_eq!(location(&response), "/");

    let page = body_string(send(&test.app, get("/", Some(&cookie))).await).await;
    assert!(page.contains("Account linked: promo_bot"));
    assert!(page.contains(r#"<option value="42">promo_bot</option>"#));

    // Replaying the callback fails: the pending authorization was consumed.
    send(
        &test.app,
        get(
            &format!("/callback?code=the-code&state={state}"),
            Some(&cookie),
        ),
    )
    .await;
    let page = body_string(send(&test.app, get("/", Some(&cookie))).await).await;
    assert!(page.contains("state mismatch"));

    let page = body_string(
        send(
            &test.app,
            post_form("account=42&text=Hello+from+promo", Some(&cookie)),
        )
        .await,
    )
    .await;
    assert!(page.contains("Tweet posted"));
}

#[tokio::test]
async fn posting_reports_missing_input_and_unknown_accounts() {
    let server = MockServer::start().await;
    let test = spawn_app(&full_configuration(&server)).await;

    let page = body_string(send(&test.app, post_form("account=42&text=+++", None)).await).await;
    assert!(page.contains("Please select account &amp; enter text"));

    let page = body_string(send(&test.app, post_form("account=99&text=hi", None)).await).await;
    assert!(page.contains("User not found"));
}

#[tokio::test]
async fn post_rejection_shows_status_and_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/2/tweets"))
        .respond_with(ResponseTemplate::new(403).set_body_string("duplicate"))
        .mount(&server)
        .await;

    let test = spawn_app(&full_configuration(&server)).await;
    test.credentials
        .upsert(
            "42",
            TokenRecord {
                username: "promo_bot".to_string(),
                access_token: "access-1".to_string(),
                refresh_token: Some("refresh-1".to_string()),
                expires_in: 7200,
                obtained_at: chrono::Utc::now().timestamp(),
            },
        )
        .await
        .unwrap();

    let page = body_string(send(&test.app, post_form("account=42&text=hi", None)).await).await;
    assert!(page.contains("403 duplicate"));
}

#[tokio::test]
async fn expired_token_without_refresh_token_cannot_post() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/2/tweets"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let test = spawn_app(&full_configuration(&server)).await;
    test.credentials
        .upsert(
            "42",
            TokenRecord {
                username: "promo_bot".to_string(),
                access_token: "access-1".to_string(),
                refresh_token: None,
                expires_in: 0,
                obtained_at: chrono::Utc::now().timestamp(),
            },
        )
        .await
        .unwrap();

    let page = body_string(send(&test.app, post_form("account=42&text=hi", None)).await).await;
    assert!(page.contains("Token refresh error: No refresh_token"));
}
