use gatehouse::api;
use gatehouse::server::Server;
use gatehouse::settings::{Auth, Http, Log, Mysql, Redis, Settings};
use serde_json::Value;
use std::sync::Arc;
use warp::Filter;

fn test_settings() -> Settings {
    Settings {
        auth: Auth {
            backend: "memory".to_string(),
            issuer: "gatehouse.test".to_string(),
            audience: "test-client".to_string(),
            access_ttl_mins: 10,
            refresh_ttl_days: 7,
        },
        http: Http {
            cert_path: String::new(),
            key_path: String::new(),
            address: "127.0.0.1:0".to_string(),
            cors_origins: vec![],
        },
        log: Log {
            filter: "info".to_string(),
        },
        mysql: Mysql { dsn: String::new() },
        redis: Redis { dsn: String::new() },
    }
}

async fn test_server() -> Arc<Server> {
    Arc::new(Server::try_new(&test_settings()).await.unwrap())
}

fn body_json<B: AsRef<[u8]>>(resp: &warp::http::Response<B>) -> Value {
    serde_json::from_slice(resp.body().as_ref()).unwrap()
}

/// Pulls the refresh token value out of the Set-Cookie header.
fn refresh_cookie_value<B>(resp: &warp::http::Response<B>) -> String {
    let header = resp
        .headers()
        .get("set-cookie")
        .expect("response carries no set-cookie header")
        .to_str()
        .unwrap();
    let pair = header.split(';').next().unwrap();
    let (name, value) = pair.split_once('=').unwrap();
    assert_eq!(name, "refresh_token");
    value.to_string()
}

#[tokio::test]
async fn full_session_lifecycle() {
    let server = test_server().await;
    let api = api::v1::routes(server).recover(api::v1::recover_error);

    // Register.
    let resp = warp::test::request()
        .method("POST")
        .path("/auth/register")
        .json(&serde_json::json!({"email": "a@x.com", "password": "password1"}))
        .reply(&api)
        .await;
    assert_eq!(resp.status(), 200);
    let body = body_json(&resp);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["email"], "a@x.com");
    assert!(body["data"]["user_id"].is_string());

    // Registering the same email again is a duplicate.
    let resp = warp::test::request()
        .method("POST")
        .path("/auth/register")
        .json(&serde_json::json!({"email": "a@x.com", "password": "password1"}))
        .reply(&api)
        .await;
    let body = body_json(&resp);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "EmailTaken");

    // Wrong password: rejected, and no cookie is set.
    let resp = warp::test::request()
        .method("POST")
        .path("/auth/login")
        .json(&serde_json::json!({"email": "a@x.com", "password": "wrong-password"}))
        .reply(&api)
        .await;
    let body = body_json(&resp);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "InvalidCredentials");
    assert!(resp.headers().get("set-cookie").is_none());

    // Correct login: access token in the body, refresh token in the cookie.
    let resp = warp::test::request()
        .method("POST")
        .path("/auth/login")
        .json(&serde_json::json!({"email": "a@x.com", "password": "password1"}))
        .reply(&api)
        .await;
    let body = body_json(&resp);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["token_type"], "bearer");
    let access_token = body["data"]["access_token"].as_str().unwrap().to_string();
    let cookie_header = resp
        .headers()
        .get("set-cookie")
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(cookie_header.contains("HttpOnly"));
    assert!(cookie_header.contains("SameSite=Strict"));
    assert!(cookie_header.contains("Secure"));
    let first_refresh = refresh_cookie_value(&resp);

    // The access token opens the protected endpoint.
    let resp = warp::test::request()
        .method("GET")
        .path("/auth/me")
        .header("authorization", format!("Bearer {}", access_token))
        .reply(&api)
        .await;
    let body = body_json(&resp);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["email"], "a@x.com");

    // Refresh rotates: new access token, new cookie.
    let resp = warp::test::request()
        .method("POST")
        .path("/auth/refresh")
        .header("cookie", format!("refresh_token={}", first_refresh))
        .reply(&api)
        .await;
    let body = body_json(&resp);
    assert_eq!(body["success"], true);
    let rotated_access = body["data"]["access_token"].as_str().unwrap().to_string();
    assert_ne!(rotated_access, access_token);
    let second_refresh = refresh_cookie_value(&resp);
    assert_ne!(second_refresh, first_refresh);

    // Replaying the consumed cookie is rejected.
    let resp = warp::test::request()
        .method("POST")
        .path("/auth/refresh")
        .header("cookie", format!("refresh_token={}", first_refresh))
        .reply(&api)
        .await;
    let body = body_json(&resp);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "InvalidToken");

    // The rotated cookie still works.
    let resp = warp::test::request()
        .method("POST")
        .path("/auth/refresh")
        .header("cookie", format!("refresh_token={}", second_refresh))
        .reply(&api)
        .await;
    let body = body_json(&resp);
    assert_eq!(body["success"], true);
    let third_refresh = refresh_cookie_value(&resp);

    // Logout succeeds and expires the cookie.
    let resp = warp::test::request()
        .method("POST")
        .path("/auth/logout")
        .header("cookie", format!("refresh_token={}", third_refresh))
        .reply(&api)
        .await;
    let body = body_json(&resp);
    assert_eq!(body["success"], true);
    let cookie_header = resp
        .headers()
        .get("set-cookie")
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(cookie_header.contains("Max-Age=0"));

    // The revoked cookie can no longer refresh.
    let resp = warp::test::request()
        .method("POST")
        .path("/auth/refresh")
        .header("cookie", format!("refresh_token={}", third_refresh))
        .reply(&api)
        .await;
    let body = body_json(&resp);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "InvalidToken");
}

#[tokio::test]
async fn refresh_without_cookie_is_rejected() {
    let server = test_server().await;
    let api = api::v1::routes(server).recover(api::v1::recover_error);

    let resp = warp::test::request()
        .method("POST")
        .path("/auth/refresh")
        .reply(&api)
        .await;
    let body = body_json(&resp);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "InvalidToken");
}

#[tokio::test]
async fn logout_always_succeeds() {
    let server = test_server().await;
    let api = api::v1::routes(server).recover(api::v1::recover_error);

    // No cookie at all.
    let resp = warp::test::request()
        .method("POST")
        .path("/auth/logout")
        .reply(&api)
        .await;
    let body = body_json(&resp);
    assert_eq!(body["success"], true);

    // Garbage cookie.
    let resp = warp::test::request()
        .method("POST")
        .path("/auth/logout")
        .header("cookie", "refresh_token=not-a-jwt")
        .reply(&api)
        .await;
    let body = body_json(&resp);
    assert_eq!(body["success"], true);
}

#[tokio::test]
async fn protected_endpoint_rejects_bad_bearer_tokens() {
    let server = test_server().await;
    let api = api::v1::routes(server).recover(api::v1::recover_error);

    let resp = warp::test::request()
        .method("GET")
        .path("/auth/me")
        .header("authorization", "Basic abc")
        .reply(&api)
        .await;
    let body = body_json(&resp);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "InvalidToken");

    let resp = warp::test::request()
        .method("GET")
        .path("/auth/me")
        .header("authorization", "Bearer not-a-jwt")
        .reply(&api)
        .await;
    let body = body_json(&resp);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "InvalidToken");
}
