//! Timeline client tests against a mock API server.

use serde_json::json;
use wiremock::matchers::{header, method, path, query_param_contains};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::parser::tests::{cursor_entry, timeline_body, tweet_entry};
use super::{TimelineClient, TimelineClientConfig, USER_BY_SCREEN_NAME, USER_TWEETS};
use crate::error::FetchError;
use crate::host::session::decode_cookies;
use crate::host::Session;
use crate::source::{Credentials, PostSource};
use feedscrape_core::Cursor;

fn session() -> Session {
    Session::from_cookies(
        decode_cookies(
            br#"[
                {"name": "auth_token", "value": "tok", "domain": ".x.com", "path": "/", "expires": 0},
                {"name": "ct0", "value": "csrf", "domain": ".x.com", "path": "/", "expires": 0}
            ]"#,
        )
        .unwrap(),
    )
}

fn client(server: &MockServer, session: &Session) -> TimelineClient {
    let config = TimelineClientConfig {
        api_base: server.uri(),
        ..TimelineClientConfig::default()
    };
    TimelineClient::new(config, session).unwrap()
}

async fn mount_user(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path(format!("/graphql/{USER_BY_SCREEN_NAME}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"user": {"result": {"__typename": "User", "rest_id": "42"}}}
        })))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_login_sends_session_headers() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/1.1/account/verify_credentials.json"))
        .and(header("cookie", "auth_token=tok; ct0=csrf"))
        .and(header("x-csrf-token", "csrf"))
        .and(header("x-twitter-auth-type", "OAuth2Session"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"screen_name": "Scraper"})))
        .expect(1)
        .mount(&server)
        .await;

    let session = session();
    let client = client(&server, &session);

    client
        .login(&Credentials::new("@scraper", Some("secret".into())))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_login_rejects_other_account() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/1.1/account/verify_credentials.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"screen_name": "someone_else"})))
        .mount(&server)
        .await;

    let session = session();
    let err = client(&server, &session)
        .login(&Credentials::new("scraper", None))
        .await
        .unwrap_err();
    assert!(err.is_auth_error());
}

#[tokio::test]
async fn test_login_unauthorized() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/1.1/account/verify_credentials.json"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let session = session();
    let err = client(&server, &session)
        .login(&Credentials::default())
        .await
        .unwrap_err();
    assert!(err.is_auth_error());
}

#[tokio::test]
async fn test_login_without_auth_cookie_makes_no_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let session = Session::from_cookies(decode_cookies(br#"[{"name": "ct0", "value": "csrf"}]"#).unwrap());
    let err = client(&server, &session)
        .login(&Credentials::default())
        .await
        .unwrap_err();
    assert!(err.is_auth_error());
}

#[tokio::test]
async fn test_login_with_expired_auth_cookie_makes_no_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let session = Session::from_cookies(
        decode_cookies(
            br#"[
                {"name": "auth_token", "value": "tok", "domain": ".x.com", "expires": 1000},
                {"name": "ct0", "value": "csrf", "domain": ".x.com", "expires": 0}
            ]"#,
        )
        .unwrap(),
    );
    let err = client(&server, &session)
        .login(&Credentials::default())
        .await
        .unwrap_err();
    assert!(err.is_auth_error());
    assert!(err.to_string().contains("expired"));
}

#[tokio::test]
async fn test_cookies_of_other_domains_are_not_sent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/1.1/account/verify_credentials.json"))
        .and(header("cookie", "auth_token=tok; ct0=csrf"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"screen_name": "scraper"})))
        .expect(1)
        .mount(&server)
        .await;

    let session = Session::from_cookies(
        decode_cookies(
            br#"[
                {"name": "auth_token", "value": "tok", "domain": ".x.com"},
                {"name": "SID", "value": "google-secret", "domain": ".google.com"},
                {"name": "ct0", "value": "csrf", "domain": "twitter.com"}
            ]"#,
        )
        .unwrap(),
    );

    client(&server, &session)
        .login(&Credentials::default())
        .await
        .unwrap();
}

#[tokio::test]
async fn test_fetch_pages_follow_cursor() {
    let server = MockServer::start().await;
    mount_user(&server).await;

    // Most specific mock first.
    Mock::given(method("GET"))
        .and(path(format!("/graphql/{USER_TWEETS}")))
        .and(query_param_contains("variables", r#""cursor":"c2""#))
        .respond_with(ResponseTemplate::new(200).set_body_json(timeline_body(vec![cursor_entry("c3")])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/graphql/{USER_TWEETS}")))
        .and(query_param_contains("variables", r#""userId":"42""#))
        .respond_with(ResponseTemplate::new(200).set_body_json(timeline_body(vec![
            tweet_entry("100", "hello", 3, "target"),
            cursor_entry("c2"),
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let session = session();
    let client = client(&server, &session);

    let first = client.fetch_page("target", 20, Cursor::start()).await.unwrap();
    assert_eq!(first.posts.len(), 1);
    assert_eq!(first.posts[0].handle, "target");
    assert_eq!(first.next_cursor, Cursor::from("c2"));

    // The user id is cached, so UserByScreenName is only called once.
    let second = client.fetch_page("target", 20, first.next_cursor).await.unwrap();
    assert!(second.posts.is_empty());
    assert!(second.is_last());
}

#[tokio::test]
async fn test_repeated_cursor_ends_timeline() {
    let server = MockServer::start().await;
    mount_user(&server).await;
    Mock::given(method("GET"))
        .and(path(format!("/graphql/{USER_TWEETS}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(timeline_body(vec![
            tweet_entry("100", "hello", 3, "target"),
            cursor_entry("c2"),
        ])))
        .mount(&server)
        .await;

    let session = session();
    let page = client(&server, &session)
        .fetch_page("target", 20, Cursor::from("c2"))
        .await
        .unwrap();

    assert_eq!(page.posts.len(), 1);
    assert!(page.is_last());
}

#[tokio::test]
async fn test_fetch_unknown_user() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/graphql/{USER_BY_SCREEN_NAME}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": {}})))
        .mount(&server)
        .await;

    let session = session();
    let err = client(&server, &session)
        .fetch_page("nobody", 20, Cursor::start())
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::UserNotFound(ref h) if h == "nobody"));
}

#[tokio::test]
async fn test_fetch_rate_limited() {
    let server = MockServer::start().await;
    mount_user(&server).await;
    Mock::given(method("GET"))
        .and(path(format!("/graphql/{USER_TWEETS}")))
        .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "60"))
        .mount(&server)
        .await;

    let session = session();
    let err = client(&server, &session)
        .fetch_page("target", 20, Cursor::start())
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::RateLimited { retry_after: Some(60) }));
}

#[tokio::test]
async fn test_fetch_server_error() {
    let server = MockServer::start().await;
    mount_user(&server).await;
    Mock::given(method("GET"))
        .and(path(format!("/graphql/{USER_TWEETS}")))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let session = session();
    let err = client(&server, &session)
        .fetch_page("target", 20, Cursor::start())
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::InvalidResponse(_)));
}

#[test]
fn test_invalid_api_base() {
    let config = TimelineClientConfig {
        api_base: "not a url".into(),
        ..TimelineClientConfig::default()
    };
    let err = TimelineClient::new(config, &session()).unwrap_err();
    assert!(matches!(err, FetchError::Http(_)));
}
