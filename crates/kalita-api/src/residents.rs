use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use tracing::{info, warn};
use uuid::Uuid;

use kalita_db::now_timestamp;
use kalita_types::api::{Deleted, Envelope, ResidentQuery, UpsertResidentRequest};
use kalita_types::directory::{DirectoryStats, distinct_blocks, matches_search};
use kalita_types::models::ResidentInfo;

use crate::auth::AppState;
use crate::convert;
use crate::error::ApiError;
use crate::middleware::AuthUser;

/// Public directory, ordered by block then house number.
pub async fn list_residents(
    State(state): State<AppState>,
    Query(query): Query<ResidentQuery>,
) -> Result<Json<Envelope<Vec<ResidentInfo>>>, ApiError> {
    let block = query.block.filter(|b| !b.trim().is_empty());
    let rows = crate::blocking(&state, move |db| db.list_public_residents(block.as_deref())).await?;

    let term = query.q.unwrap_or_default();
    let residents = rows
        .into_iter()
        .map(convert::resident)
        .filter(|r| matches_search(r, &term))
        .collect();
    Ok(Json(Envelope::ok(residents)))
}

pub async fn list_blocks(
    State(state): State<AppState>,
) -> Result<Json<Envelope<Vec<String>>>, ApiError> {
    let residents = public_residents(&state).await?;
    Ok(Json(Envelope::ok(distinct_blocks(&residents))))
}

pub async fn directory_stats(
    State(state): State<AppState>,
) -> Result<Json<Envelope<DirectoryStats>>, ApiError> {
    let residents = public_residents(&state).await?;
    Ok(Json(Envelope::ok(DirectoryStats::from_residents(&residents))))
}

/// The caller's own record, public or not.
pub async fn my_resident(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<Envelope<ResidentInfo>>, ApiError> {
    let uid = auth.id.to_string();
    let row = crate::blocking(&state, move |db| db.get_resident_by_user(&uid))
        .await?
        .ok_or(ApiError::NotFound("resident record"))?;
    Ok(Json(Envelope::ok(convert::resident(row))))
}

/// Insert-or-replace the caller's record. Concurrent saves: last write wins.
pub async fn upsert_my_resident(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Json(req): Json<UpsertResidentRequest>,
) -> Result<Json<Envelope<ResidentInfo>>, ApiError> {
    let req = validate_resident(req)?;

    let new_id = Uuid::new_v4().to_string();
    let uid = auth.id.to_string();
    let now = now_timestamp();
    let row = crate::blocking(&state, move |db| db.upsert_resident(&new_id, &uid, &req, &now)).await?;

    info!("User {} saved resident record {}", auth.id, row.id);
    Ok(Json(Envelope::ok(convert::resident(row))))
}

/// Owners may remove their own record; admins may remove any.
pub async fn delete_resident(
    State(state): State<AppState>,
    Path(resident_id): Path<Uuid>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<Envelope<Deleted>>, ApiError> {
    let id = resident_id.to_string();
    let row = crate::blocking(&state, move |db| db.get_resident(&id))
        .await?
        .ok_or(ApiError::NotFound("resident record"))?;

    if row.user_id != auth.id.to_string() && !auth.is_admin() {
        warn!("User {} tried to delete resident record {}", auth.id, resident_id);
        return Err(ApiError::Forbidden("only the owner or an administrator can delete this record"));
    }

    let id = resident_id.to_string();
    crate::blocking(&state, move |db| db.delete_resident(&id)).await?;
    info!("User {} deleted resident record {}", auth.id, resident_id);
    Ok(Json(Envelope::ok(Deleted { id: resident_id })))
}

async fn public_residents(state: &AppState) -> Result<Vec<ResidentInfo>, ApiError> {
    let rows = crate::blocking(state, |db| db.list_public_residents(None)).await?;
    Ok(rows.into_iter().map(convert::resident).collect())
}

/// Trim text fields and enforce what the resident form requires.
fn validate_resident(mut req: UpsertResidentRequest) -> Result<UpsertResidentRequest, ApiError> {
    for field in [
        &mut req.full_name,
        &mut req.phone,
        &mut req.house_number,
        &mut req.block,
        &mut req.occupation,
        &mut req.emergency_contact,
        &mut req.vehicle_info,
    ] {
        *field = field.trim().to_string();
    }

    if req.full_name.is_empty() {
        return Err(ApiError::BadRequest("full name is required".into()));
    }
    if req.house_number.is_empty() {
        return Err(ApiError::BadRequest("house number is required".into()));
    }
    if req.block.is_empty() {
        return Err(ApiError::BadRequest("block is required".into()));
    }
    if req.family_members == 0 {
        return Err(ApiError::BadRequest("family members must be at least 1".into()));
    }
    Ok(req)
}
