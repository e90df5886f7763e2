use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use kalita_db::now_timestamp;
use kalita_types::api::{CreateCategoryRequest, Envelope, default_limit};
use kalita_types::models::{News, NewsCategory};

use crate::auth::AppState;
use crate::convert;
use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::news::MAX_PAGE_SIZE;

#[derive(Debug, Deserialize)]
pub struct CategoryNewsQuery {
    #[serde(default = "default_limit")]
    pub limit: u32,
}

pub async fn list_categories(
    State(state): State<AppState>,
) -> Result<Json<Envelope<Vec<NewsCategory>>>, ApiError> {
    let rows = crate::blocking(&state, |db| db.list_categories()).await?;
    Ok(Json(Envelope::ok(rows.into_iter().map(convert::category).collect())))
}

pub async fn create_category(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Json(req): Json<CreateCategoryRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let name = req.name.trim().to_string();
    if name.is_empty() {
        return Err(ApiError::BadRequest("category name is required".into()));
    }

    let id = Uuid::new_v4().to_string();
    let created_at = now_timestamp();
    let row = crate::blocking(&state, move |db| {
        if !db.insert_category(&id, &name, &req.description, &req.color, &created_at)? {
            return Ok(None);
        }
        db.get_category(&id)
    })
    .await?
    .ok_or_else(|| ApiError::Conflict("a category with that name already exists".into()))?;

    let category = convert::category(row);
    info!("User {} created category '{}'", auth.id, category.name);
    Ok((StatusCode::CREATED, Json(Envelope::ok(category))))
}

/// Published news in one category, newest first.
pub async fn category_news(
    State(state): State<AppState>,
    Path(category_id): Path<Uuid>,
    Query(query): Query<CategoryNewsQuery>,
) -> Result<Json<Envelope<Vec<News>>>, ApiError> {
    let id = category_id.to_string();
    let limit = query.limit.min(MAX_PAGE_SIZE);
    let rows = crate::blocking(&state, move |db| {
        if db.get_category(&id)?.is_none() {
            return Ok(None);
        }
        db.list_news_by_category(&id, limit).map(Some)
    })
    .await?
    .ok_or(ApiError::NotFound("category"))?;

    Ok(Json(Envelope::ok(rows.into_iter().map(convert::news).collect())))
}
