mod common;

use axum::{
    body::Body,
    http::{Request, StatusCode, header},
};
use serde_json::Value;
use tower::ServiceExt;

use common::{body_string, cookie_header, test_app};

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn robots_txt_hides_admin() {
    let (app, _) = test_app();
    let response = app.oneshot(get("/robots.txt")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "text/plain; charset=utf-8"
    );
    let body = body_string(response).await;
    assert!(body.contains("Disallow: /admin/"));
    assert!(body.contains("Disallow: /contact/"));
}

#[tokio::test]
async fn sitemap_uses_request_host() {
    let (app, _) = test_app();
    let request = Request::builder()
        .uri("/sitemap.xml")
        .header(header::HOST, "portfolio.example")
        .header("x-forwarded-proto", "https")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "application/xml");
    let body = body_string(response).await;
    assert!(body.contains("<loc>https://portfolio.example/</loc>"));
    assert!(body.contains("<loc>https://portfolio.example/at-etablissement</loc>"));
    assert!(!body.contains("/admin"));
}

#[tokio::test]
async fn dashboard_redirects_anonymous_to_login() {
    let (app, _) = test_app();
    let response = app.oneshot(get("/admin/dashboard")).await.unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[header::LOCATION], "/admin/login");
    assert!(response.headers().contains_key(header::SET_COOKIE));
}

#[tokio::test]
async fn unreadable_session_cookie_counts_as_anonymous() {
    let (app, _) = test_app();
    let request = Request::builder()
        .uri("/admin/contacts")
        .header(header::COOKIE, "session=not-an-encrypted-value")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[header::LOCATION], "/admin/login");
}

#[tokio::test]
async fn login_required_flash_shows_on_login_page() {
    let (app, _) = test_app();
    let redirect = app.clone().oneshot(get("/admin/logout")).await.unwrap();
    assert_eq!(redirect.status(), StatusCode::SEE_OTHER);
    let cookies = cookie_header(&redirect);

    let request = Request::builder()
        .uri("/admin/login")
        .header(header::COOKIE, cookies)
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json: Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(json["code"], 0);
    assert_eq!(json["resp_data"]["page_title"], "Connexion");
    assert_eq!(json["resp_data"]["flashes"][0]["category"], "info");
    assert_eq!(
        json["resp_data"]["flashes"][0]["message"],
        "Vous devez être connecté pour voir cette page."
    );
}

#[tokio::test]
async fn login_page_without_flashes() {
    let (app, _) = test_app();
    let response = app.oneshot(get("/admin/login")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json: Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(json["resp_data"]["flashes"], Value::Array(vec![]));
}

#[tokio::test]
async fn invalid_reset_token_goes_back_to_request_page() {
    let (app, _) = test_app();
    let response = app
        .oneshot(get("/admin/reset/password/not-a-token"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        response.headers()[header::LOCATION],
        "/admin/reset/password/request"
    );
}

#[tokio::test]
async fn uploads_are_served_from_the_upload_folder() {
    let (app, folder) = test_app();
    tokio::fs::create_dir_all(&folder).await.unwrap();
    tokio::fs::write(folder.join("0123456789abcdef.png"), b"png-bytes")
        .await
        .unwrap();

    let response = app
        .clone()
        .oneshot(get("/admin/upload/0123456789abcdef.png"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "png-bytes");

    let missing = app.oneshot(get("/admin/upload/missing.png")).await.unwrap();
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);

    let _ = tokio::fs::remove_dir_all(&folder).await;
}

#[tokio::test]
async fn unknown_path_gets_not_found_envelope() {
    let (app, _) = test_app();
    let response = app.oneshot(get("/no/such/page")).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json: Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(json["code"], 1004);
    assert_eq!(json["msg"], "Page non trouvée.");
}
