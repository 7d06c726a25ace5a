use super::error::*;
use crate::application_port::{
    AccessToken, AuthService, LoginInput, RefreshToken, SignupInput, UserService,
};
use crate::domain_model::UserId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use warp::http::header::SET_COOKIE;
use warp::{self, reject};

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<ApiError>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        ApiResponse {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(code: ApiErrorCode, message: impl Into<String>) -> Self {
        ApiResponse {
            success: false,
            data: None,
            error: Some(ApiError {
                code,
                message: message.into(),
            }),
        }
    }
}

pub const REFRESH_COOKIE: &str = "refresh_token";
const REFRESH_COOKIE_PATH: &str = "/api/v1/auth";

// The server only speaks TLS, so the cookie is always Secure. Path-scoping
// keeps the refresh token off every request outside the auth endpoints.
fn refresh_cookie(token: &RefreshToken, expires_at: DateTime<Utc>) -> String {
    let max_age = (expires_at - Utc::now()).num_seconds().max(0);
    format!(
        "{REFRESH_COOKIE}={}; HttpOnly; Secure; SameSite=Strict; Path={REFRESH_COOKIE_PATH}; Max-Age={max_age}",
        token.0
    )
}

fn expired_refresh_cookie() -> String {
    format!(
        "{REFRESH_COOKIE}=; HttpOnly; Secure; SameSite=Strict; Path={REFRESH_COOKIE_PATH}; Max-Age=0"
    )
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub user_id: UserId,
    pub email: String,
}

pub async fn register(
    body: RegisterRequest,
    auth_service: Arc<dyn AuthService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let signup_input = SignupInput {
        email: body.email.clone(),
        password: body.password,
    };
    let user_id = auth_service
        .signup(signup_input)
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;

    let response = RegisterResponse {
        user_id,
        email: body.email,
    };
    Ok(warp::reply::json(&ApiResponse::ok(response)))
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user_id: UserId,
    pub access_token: AccessToken,
    pub token_type: &'static str,
    pub access_token_expires_at: DateTime<Utc>,
}

pub async fn login(
    body: LoginRequest,
    auth_service: Arc<dyn AuthService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let login_input = LoginInput {
        email: body.email,
        password: body.password,
    };
    let login_result = auth_service
        .login(login_input)
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;

    let tokens = login_result.tokens;
    let cookie = refresh_cookie(&tokens.refresh_token, tokens.refresh_token_expires_at);
    let response = LoginResponse {
        user_id: login_result.user_id,
        access_token: tokens.access_token,
        token_type: "bearer",
        access_token_expires_at: tokens.access_token_expires_at,
    };

    let reply = warp::reply::json(&ApiResponse::ok(response));
    Ok(warp::reply::with_header(reply, SET_COOKIE, cookie))
}

#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub access_token: AccessToken,
    pub token_type: &'static str,
    pub access_token_expires_at: DateTime<Utc>,
}

pub async fn refresh(
    refresh_token: Option<String>,
    auth_service: Arc<dyn AuthService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let token = refresh_token.ok_or_else(|| reject::custom(ApiErrorCode::InvalidToken))?;

    let tokens = auth_service
        .refresh_token(&token)
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;

    let cookie = refresh_cookie(&tokens.refresh_token, tokens.refresh_token_expires_at);
    let response = RefreshResponse {
        access_token: tokens.access_token,
        token_type: "bearer",
        access_token_expires_at: tokens.access_token_expires_at,
    };

    let reply = warp::reply::json(&ApiResponse::ok(response));
    Ok(warp::reply::with_header(reply, SET_COOKIE, cookie))
}

#[derive(Debug, Serialize)]
pub struct LogoutResponse;

pub async fn logout(
    refresh_token: Option<String>,
    auth_service: Arc<dyn AuthService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    // Unconditionally successful; the service swallows bad tokens itself.
    let _ = auth_service.logout(refresh_token.as_deref()).await;

    let reply = warp::reply::json(&ApiResponse::ok(LogoutResponse));
    Ok(warp::reply::with_header(
        reply,
        SET_COOKIE,
        expired_refresh_cookie(),
    ))
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub user_id: UserId,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

pub async fn me(
    user_id: UserId,
    user_service: Arc<dyn UserService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let user = user_service
        .get_user(user_id)
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;

    let response = MeResponse {
        user_id: user.user_id,
        email: user.email,
        created_at: user.created_at,
    };
    Ok(warp::reply::json(&ApiResponse::ok(response)))
}
