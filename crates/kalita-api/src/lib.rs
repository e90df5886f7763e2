pub mod admin;
pub mod auth;
pub mod categories;
pub mod comments;
pub mod convert;
pub mod error;
pub mod middleware;
pub mod news;
pub mod residents;

use axum::{
    Json, Router, middleware as axum_middleware,
    routing::{delete, get, patch, post, put},
};
use tracing::error;

use kalita_db::Database;
use kalita_types::api::Envelope;

use crate::auth::AppState;
use crate::error::ApiError;
use crate::middleware::{identify, require_admin, require_api_key, require_auth};

/// Build the full HTTP surface. Transport layers (CORS, tracing) are added
/// by the binary.
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/auth/signup", post(auth::sign_up))
        .route("/auth/signin", post(auth::sign_in))
        .route("/news", get(news::list_news))
        .route("/news/important", get(news::important_news))
        .route("/categories", get(categories::list_categories))
        .route("/categories/{category_id}/news", get(categories::category_news))
        .route("/residents", get(residents::list_residents))
        .route("/residents/blocks", get(residents::list_blocks))
        .route("/residents/stats", get(residents::directory_stats));

    let viewer_routes = Router::new()
        .route("/news/{news_id}", get(news::get_news))
        .route("/news/{news_id}/comments", get(comments::list_comments))
        .layer(axum_middleware::from_fn_with_state(state.clone(), identify));

    let member_routes = Router::new()
        .route("/auth/signout", post(auth::sign_out))
        .route("/auth/user", get(auth::current_user))
        .route("/news/{news_id}/comments", post(comments::create_comment))
        .route("/comments/{comment_id}", delete(comments::delete_comment))
        .route("/residents/me", get(residents::my_resident).put(residents::upsert_my_resident))
        .route("/residents/{resident_id}", delete(residents::delete_resident))
        .layer(axum_middleware::from_fn_with_state(state.clone(), require_auth));

    let admin_routes = Router::new()
        .route("/news", post(news::create_news))
        .route("/news/{news_id}", patch(news::update_news).delete(news::delete_news))
        .route("/categories", post(categories::create_category))
        .route("/admin/users/{user_id}/role", put(admin::set_role))
        .layer(axum_middleware::from_fn(require_admin))
        .layer(axum_middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .merge(public_routes)
        .merge(viewer_routes)
        .merge(member_routes)
        .merge(admin_routes)
        .layer(axum_middleware::from_fn_with_state(state.clone(), require_api_key))
        .route("/health", get(health))
        .with_state(state)
}

async fn health() -> Json<Envelope<&'static str>> {
    Json(Envelope::ok("ok"))
}

/// Run a storage call off the async runtime.
pub(crate) async fn blocking<F, T>(state: &AppState, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&Database) -> anyhow::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let state = state.clone();
    tokio::task::spawn_blocking(move || f(&state.db))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::Internal(anyhow::anyhow!("storage task failed"))
        })?
        .map_err(ApiError::from)
}
