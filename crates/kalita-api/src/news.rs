use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use kalita_db::models::NewsFields;
use kalita_db::{format_timestamp, now_timestamp};
use kalita_types::api::{CreateNewsRequest, Deleted, Envelope, PageQuery, UpdateNewsRequest};
use kalita_types::models::{News, NewsDetail, NewsStatus};

use crate::auth::AppState;
use crate::convert;
use crate::error::ApiError;
use crate::middleware::{AuthUser, Viewer};

pub const MAX_PAGE_SIZE: u32 = 100;

/// Important/urgent items are a short banner, never a full page.
pub const IMPORTANT_NEWS_LIMIT: u32 = 5;

pub async fn list_news(
    State(state): State<AppState>,
    Query(page): Query<PageQuery>,
) -> Result<Json<Envelope<Vec<News>>>, ApiError> {
    let limit = page.limit.min(MAX_PAGE_SIZE);
    let rows = crate::blocking(&state, move |db| db.list_published_news(limit, page.offset)).await?;
    Ok(Json(Envelope::ok(rows.into_iter().map(convert::news).collect())))
}

pub async fn important_news(
    State(state): State<AppState>,
) -> Result<Json<Envelope<Vec<News>>>, ApiError> {
    let rows = crate::blocking(&state, |db| db.list_important_news(IMPORTANT_NEWS_LIMIT)).await?;
    Ok(Json(Envelope::ok(rows.into_iter().map(convert::news).collect())))
}

/// Single item with its comments. Unpublished items exist only for admins.
pub async fn get_news(
    State(state): State<AppState>,
    Path(news_id): Path<Uuid>,
    Extension(viewer): Extension<Viewer>,
) -> Result<Json<Envelope<NewsDetail>>, ApiError> {
    let id = news_id.to_string();
    let (row, comments) = crate::blocking(&state, move |db| {
        let Some(row) = db.get_news(&id)? else {
            return Ok((None, vec![]));
        };
        let comments = db.list_comments(&id)?;
        Ok((Some(row), comments))
    })
    .await?;

    let news = row.map(convert::news).ok_or(ApiError::NotFound("news"))?;
    if news.status != NewsStatus::Published && !viewer.is_admin() {
        return Err(ApiError::NotFound("news"));
    }

    Ok(Json(Envelope::ok(NewsDetail {
        news,
        comments: comments.into_iter().map(convert::comment).collect(),
    })))
}

pub async fn create_news(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Json(req): Json<CreateNewsRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let fields = NewsFields {
        title: req.title.trim().to_string(),
        content: req.content,
        excerpt: req.excerpt,
        image_url: req.image_url,
        category_id: req.category_id.map(|id| id.to_string()),
        status: req.status.as_str().to_string(),
        priority: req.priority.as_str().to_string(),
        published_at: req.published_at.map(format_timestamp),
    };
    let fields = stamp_publication(fields);
    validate_news(&fields)?;
    ensure_category_exists(&state, fields.category_id.clone()).await?;

    let news_id = Uuid::new_v4().to_string();
    let author_id = auth.id.to_string();
    let now = now_timestamp();
    let row = crate::blocking(&state, move |db| {
        db.insert_news(&news_id, &author_id, &fields, &now)?;
        db.get_news(&news_id)?
            .ok_or_else(|| anyhow::anyhow!("news {} vanished after insert", news_id))
    })
    .await?;

    let news = convert::news(row);
    info!("User {} created news {} ({})", auth.id, news.id, news.status);
    Ok((StatusCode::CREATED, Json(Envelope::ok(news))))
}

pub async fn update_news(
    State(state): State<AppState>,
    Path(news_id): Path<Uuid>,
    Extension(auth): Extension<AuthUser>,
    Json(req): Json<UpdateNewsRequest>,
) -> Result<Json<Envelope<News>>, ApiError> {
    let id = news_id.to_string();
    let current = crate::blocking(&state, move |db| db.get_news(&id))
        .await?
        .ok_or(ApiError::NotFound("news"))?;

    let mut fields = NewsFields::from_row(&current);
    if let Some(title) = req.title {
        fields.title = title.trim().to_string();
    }
    if let Some(content) = req.content {
        fields.content = content;
    }
    if let Some(excerpt) = req.excerpt {
        fields.excerpt = excerpt;
    }
    if let Some(image_url) = req.image_url {
        fields.image_url = image_url;
    }
    if let Some(category_id) = req.category_id {
        fields.category_id = category_id.map(|id| id.to_string());
    }
    if let Some(status) = req.status {
        fields.status = status.as_str().to_string();
    }
    if let Some(priority) = req.priority {
        fields.priority = priority.as_str().to_string();
    }
    if let Some(published_at) = req.published_at {
        fields.published_at = published_at.map(format_timestamp);
    }
    let fields = stamp_publication(fields);
    validate_news(&fields)?;
    if matches!(req.category_id, Some(Some(_))) {
        ensure_category_exists(&state, fields.category_id.clone()).await?;
    }

    let id = news_id.to_string();
    let now = now_timestamp();
    let row = crate::blocking(&state, move |db| {
        if !db.update_news(&id, &fields, &now)? {
            return Ok(None);
        }
        db.get_news(&id)
    })
    .await?
    .ok_or(ApiError::NotFound("news"))?;

    info!("User {} updated news {}", auth.id, news_id);
    Ok(Json(Envelope::ok(convert::news(row))))
}

pub async fn delete_news(
    State(state): State<AppState>,
    Path(news_id): Path<Uuid>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<Envelope<Deleted>>, ApiError> {
    let id = news_id.to_string();
    if !crate::blocking(&state, move |db| db.delete_news(&id)).await? {
        return Err(ApiError::NotFound("news"));
    }

    info!("User {} deleted news {}", auth.id, news_id);
    Ok(Json(Envelope::ok(Deleted { id: news_id })))
}

/// Publishing without an explicit time stamps the current time.
fn stamp_publication(mut fields: NewsFields) -> NewsFields {
    if fields.status == NewsStatus::Published.as_str() && fields.published_at.is_none() {
        fields.published_at = Some(format_timestamp(Utc::now()));
    }
    fields
}

fn validate_news(fields: &NewsFields) -> Result<(), ApiError> {
    if fields.title.is_empty() {
        return Err(ApiError::BadRequest("title is required".into()));
    }
    if fields.content.trim().is_empty() {
        return Err(ApiError::BadRequest("content is required".into()));
    }
    Ok(())
}

async fn ensure_category_exists(state: &AppState, category_id: Option<String>) -> Result<(), ApiError> {
    let Some(id) = category_id else {
        return Ok(());
    };
    if crate::blocking(state, move |db| db.get_category(&id)).await?.is_none() {
        return Err(ApiError::BadRequest("unknown category".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(status: &str) -> NewsFields {
        NewsFields {
            title: "Ronda malam".into(),
            content: "Jadwal ronda".into(),
            excerpt: String::new(),
            image_url: String::new(),
            category_id: None,
            status: status.into(),
            priority: "normal".into(),
            published_at: None,
        }
    }

    #[test]
    fn publishing_stamps_a_time_once() {
        assert!(stamp_publication(fields("published")).published_at.is_some());
        assert!(stamp_publication(fields("draft")).published_at.is_none());

        let mut explicit = fields("published");
        explicit.published_at = Some("2026-01-01T00:00:00.000000Z".into());
        assert_eq!(
            stamp_publication(explicit).published_at.as_deref(),
            Some("2026-01-01T00:00:00.000000Z")
        );
    }

    #[test]
    fn blank_title_or_content_is_rejected() {
        let mut f = fields("draft");
        f.title.clear();
        assert!(validate_news(&f).is_err());

        let mut f = fields("draft");
        f.content = "   ".into();
        assert!(validate_news(&f).is_err());

        assert!(validate_news(&fields("draft")).is_ok());
    }
}
