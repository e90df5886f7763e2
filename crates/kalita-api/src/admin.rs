use axum::{
    Extension, Json,
    extract::{Path, State},
};
use tracing::info;
use uuid::Uuid;

use kalita_types::api::{Envelope, SetRoleRequest};
use kalita_types::models::{Role, UserProfile};

use crate::auth::AppState;
use crate::convert;
use crate::error::ApiError;
use crate::middleware::AuthUser;

/// Grant or revoke the admin role. Admins cannot demote themselves, so the
/// last admin cannot lock everyone out by accident.
pub async fn set_role(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Extension(auth): Extension<AuthUser>,
    Json(req): Json<SetRoleRequest>,
) -> Result<Json<Envelope<UserProfile>>, ApiError> {
    if user_id == auth.id && req.role != Role::Admin {
        return Err(ApiError::BadRequest("administrators cannot demote themselves".into()));
    }

    let id = user_id.to_string();
    let role = req.role;
    let row = crate::blocking(&state, move |db| {
        if !db.set_user_role(&id, role.as_str())? {
            return Ok(None);
        }
        db.get_user_by_id(&id)
    })
    .await?
    .ok_or(ApiError::NotFound("user"))?;

    info!("User {} set role of {} to {}", auth.id, user_id, role);
    Ok(Json(Envelope::ok(convert::user_profile(row))))
}
