use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::{info, warn};
use uuid::Uuid;

use kalita_db::now_timestamp;
use kalita_types::api::{CreateCommentRequest, Deleted, Envelope};
use kalita_types::models::{NewsComment, NewsStatus};

use crate::auth::AppState;
use crate::convert;
use crate::error::ApiError;
use crate::middleware::{AuthUser, Viewer};

const MAX_COMMENT_LEN: usize = 2000;

/// Comments oldest first. Unpublished items are visible to admins only.
pub async fn list_comments(
    State(state): State<AppState>,
    Path(news_id): Path<Uuid>,
    Extension(viewer): Extension<Viewer>,
) -> Result<Json<Envelope<Vec<NewsComment>>>, ApiError> {
    let is_admin = viewer.is_admin();
    let id = news_id.to_string();
    let rows = crate::blocking(&state, move |db| {
        match db.get_news(&id)? {
            Some(news) if is_admin || news.status == NewsStatus::Published.as_str() => {
                db.list_comments(&id).map(Some)
            }
            _ => Ok(None),
        }
    })
    .await?
    .ok_or(ApiError::NotFound("news"))?;

    Ok(Json(Envelope::ok(rows.into_iter().map(convert::comment).collect())))
}

pub async fn create_comment(
    State(state): State<AppState>,
    Path(news_id): Path<Uuid>,
    Extension(auth): Extension<AuthUser>,
    Json(req): Json<CreateCommentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let content = req.content.trim().to_string();
    if content.is_empty() {
        return Err(ApiError::BadRequest("comment cannot be empty".into()));
    }
    if content.chars().count() > MAX_COMMENT_LEN {
        return Err(ApiError::BadRequest(format!(
            "comment is longer than {} characters",
            MAX_COMMENT_LEN
        )));
    }

    let is_admin = auth.is_admin();
    let nid = news_id.to_string();
    let uid = auth.id.to_string();
    let comment_id = Uuid::new_v4().to_string();
    let created_at = now_timestamp();
    let row = crate::blocking(&state, move |db| {
        match db.get_news(&nid)? {
            Some(news) if is_admin || news.status == NewsStatus::Published.as_str() => {}
            _ => return Ok(None),
        }
        db.insert_comment(&comment_id, &nid, &uid, &content, &created_at)?;
        db.get_comment(&comment_id)
    })
    .await?
    .ok_or(ApiError::NotFound("news"))?;

    info!("User {} commented on news {}", auth.id, news_id);
    Ok((StatusCode::CREATED, Json(Envelope::ok(convert::comment(row)))))
}

/// Authors may remove their own comments; admins may remove any.
pub async fn delete_comment(
    State(state): State<AppState>,
    Path(comment_id): Path<Uuid>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<Envelope<Deleted>>, ApiError> {
    let id = comment_id.to_string();
    let comment = crate::blocking(&state, move |db| db.get_comment(&id))
        .await?
        .ok_or(ApiError::NotFound("comment"))?;

    if comment.user_id != auth.id.to_string() && !auth.is_admin() {
        warn!("User {} tried to delete comment {} by {}", auth.id, comment_id, comment.user_id);
        return Err(ApiError::Forbidden("only the author or an administrator can delete this comment"));
    }

    let id = comment_id.to_string();
    crate::blocking(&state, move |db| db.delete_comment(&id)).await?;
    Ok(Json(Envelope::ok(Deleted { id: comment_id })))
}
