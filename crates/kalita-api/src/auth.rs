use std::sync::Arc;

use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString};
use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};
use chrono::{Duration, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};
use rand_core::OsRng;
use tracing::{info, warn};
use uuid::Uuid;

use kalita_db::{Database, format_timestamp, now_timestamp};
use kalita_types::api::{AuthResponse, Claims, Envelope, SignInRequest, SignUpRequest};
use kalita_types::models::{Role, UserProfile};

use crate::convert;
use crate::error::ApiError;
use crate::middleware::AuthUser;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub jwt_secret: String,
    /// Public key every client must present in the `apikey` header.
    pub api_key: String,
    pub session_ttl: Duration,
    /// Lower-cased emails that receive the admin role on sign-up.
    pub admin_emails: Vec<String>,
}

impl AppStateInner {
    fn role_for(&self, email: &str) -> Role {
        if self.admin_emails.iter().any(|e| e == email) {
            Role::Admin
        } else {
            Role::User
        }
    }
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub async fn sign_up(
    State(state): State<AppState>,
    Json(req): Json<SignUpRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let email = normalize_email(&req.email);
    let full_name = req.full_name.trim().to_string();

    // Validate input
    if !email.contains('@') || email.len() > 254 {
        return Err(ApiError::BadRequest("a valid email is required".into()));
    }
    if req.password.len() < 8 {
        return Err(ApiError::BadRequest("password must be at least 8 characters".into()));
    }
    if full_name.is_empty() {
        return Err(ApiError::BadRequest("full name is required".into()));
    }

    // Check if email is taken
    let lookup = email.clone();
    if crate::blocking(&state, move |db| db.get_user_by_email(&lookup)).await?.is_some() {
        return Err(ApiError::Conflict("email is already registered".into()));
    }

    // Hash password with Argon2id
    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(req.password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("password hashing failed: {}", e))?
        .to_string();

    let role = state.role_for(&email);
    let user_id = Uuid::new_v4().to_string();
    let created_at = now_timestamp();

    // A concurrent sign-up can still win the race past the check above.
    let user = crate::blocking(&state, move |db| {
        if !db.create_user(&user_id, &email, &password_hash, &full_name, role.as_str(), &created_at)? {
            return Ok(None);
        }
        db.get_user_by_id(&user_id)?
            .map(Some)
            .ok_or_else(|| anyhow::anyhow!("user {} vanished after insert", user_id))
    })
    .await?
    .ok_or_else(|| ApiError::Conflict("email is already registered".into()))?;

    let user = convert::user_profile(user);
    info!("New {} account {}", user.role, user.id);
    let session = open_session(&state, &user).await?;

    Ok((StatusCode::CREATED, Json(Envelope::ok(session))))
}

pub async fn sign_in(
    State(state): State<AppState>,
    Json(req): Json<SignInRequest>,
) -> Result<Json<Envelope<AuthResponse>>, ApiError> {
    let email = normalize_email(&req.email);
    let lookup = email.clone();
    let Some(row) = crate::blocking(&state, move |db| db.get_user_by_email(&lookup)).await? else {
        warn!("Sign-in for unknown email");
        return Err(ApiError::InvalidCredentials);
    };

    // Verify password
    let parsed_hash = PasswordHash::new(&row.password)
        .map_err(|e| anyhow::anyhow!("stored hash for {} is unreadable: {}", row.id, e))?;

    if Argon2::default()
        .verify_password(req.password.as_bytes(), &parsed_hash)
        .is_err()
    {
        warn!("Wrong password for user {}", row.id);
        return Err(ApiError::InvalidCredentials);
    }

    let user = convert::user_profile(row);
    let session = open_session(&state, &user).await?;
    Ok(Json(Envelope::ok(session)))
}

pub async fn sign_out(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<Envelope<()>>, ApiError> {
    let sid = auth.session_id.to_string();
    crate::blocking(&state, move |db| db.delete_session(&sid)).await?;
    info!("User {} signed out", auth.id);
    Ok(Json(Envelope { data: None, error: None }))
}

pub async fn current_user(Extension(auth): Extension<AuthUser>) -> Json<Envelope<UserProfile>> {
    Json(Envelope::ok(auth.profile()))
}

/// Persist a session for `user` and mint the bearer token that names it.
async fn open_session(state: &AppState, user: &UserProfile) -> Result<AuthResponse, ApiError> {
    let session_id = Uuid::new_v4();
    let now = Utc::now();
    let expires_at = now
        .checked_add_signed(state.session_ttl)
        .ok_or_else(|| anyhow::anyhow!("session lifetime {} overflows the calendar", state.session_ttl))?;

    let token = create_token(&state.jwt_secret, user.id, session_id, expires_at.timestamp())?;

    let sid = session_id.to_string();
    let uid = user.id.to_string();
    let (created, expires) = (format_timestamp(now), format_timestamp(expires_at));
    crate::blocking(state, move |db| db.create_session(&sid, &uid, &created, &expires)).await?;

    Ok(AuthResponse {
        user: user.clone(),
        token,
        expires_at,
    })
}

pub fn create_token(secret: &str, user_id: Uuid, session_id: Uuid, exp: i64) -> anyhow::Result<String> {
    let claims = Claims {
        sub: user_id,
        sid: session_id,
        exp: exp.max(0) as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}
