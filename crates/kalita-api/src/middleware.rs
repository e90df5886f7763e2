use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use chrono::{DateTime, Utc};
use jsonwebtoken::{DecodingKey, Validation, decode};
use tracing::warn;
use uuid::Uuid;

use kalita_db::now_timestamp;
use kalita_types::api::Claims;
use kalita_types::models::{Role, UserProfile};

use crate::auth::AppState;
use crate::convert;
use crate::error::ApiError;

/// The signed-in caller, resolved from storage on every request.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub session_id: Uuid,
    pub email: String,
    pub full_name: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.id,
            email: self.email.clone(),
            full_name: self.full_name.clone(),
            role: self.role,
            created_at: self.created_at,
        }
    }
}

/// Present on routes that behave differently for signed-in callers but
/// also serve anonymous ones.
#[derive(Debug, Clone)]
pub struct Viewer(pub Option<AuthUser>);

impl Viewer {
    pub fn is_admin(&self) -> bool {
        self.0.as_ref().is_some_and(AuthUser::is_admin)
    }
}

/// Reject requests that do not carry the public API key.
pub async fn require_api_key(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let key = req
        .headers()
        .get("apikey")
        .and_then(|v| v.to_str().ok())
        .ok_or(ApiError::InvalidApiKey)?;

    if key != state.api_key {
        return Err(ApiError::InvalidApiKey);
    }
    Ok(next.run(req).await)
}

/// Extract and validate the bearer token, then load its session.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(&req).ok_or(ApiError::Unauthorized)?;
    let user = resolve_session(&state, &token).await?;

    req.extensions_mut().insert(user);
    Ok(next.run(req).await)
}

/// Like `require_auth`, but anonymous requests pass through as `Viewer(None)`.
/// A token that is present but invalid is still rejected.
pub async fn identify(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let viewer = match bearer_token(&req) {
        Some(token) => Viewer(Some(resolve_session(&state, &token).await?)),
        None => Viewer(None),
    };

    req.extensions_mut().insert(viewer);
    Ok(next.run(req).await)
}

/// Must run after `require_auth`.
pub async fn require_admin(req: Request, next: Next) -> Result<Response, ApiError> {
    let user = req
        .extensions()
        .get::<AuthUser>()
        .ok_or(ApiError::Unauthorized)?;

    if !user.is_admin() {
        warn!("User {} attempted an admin operation: {} {}", user.id, req.method(), req.uri().path());
        return Err(ApiError::Forbidden("administrator role required"));
    }
    Ok(next.run(req).await)
}

fn bearer_token(req: &Request) -> Option<String> {
    req.headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::to_string)
}

async fn resolve_session(state: &AppState, token: &str) -> Result<AuthUser, ApiError> {
    let claims = decode::<Claims>(
        token,
        &DecodingKey::from_secret(state.jwt_secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| ApiError::Unauthorized)?
    .claims;

    let sid = claims.sid.to_string();
    let now = now_timestamp();
    let row = crate::blocking(state, move |db| db.get_session_user(&sid, &now))
        .await?
        .ok_or(ApiError::Unauthorized)?;

    let profile = convert::user_profile(row.user);
    if profile.id != claims.sub {
        warn!("Session {} presented with a token for another user", claims.sid);
        return Err(ApiError::Unauthorized);
    }

    Ok(AuthUser {
        id: profile.id,
        session_id: claims.sid,
        email: profile.email,
        full_name: profile.full_name,
        role: profile.role,
        created_at: profile.created_at,
    })
}
