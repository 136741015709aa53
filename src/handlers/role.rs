//! Role handlers
//!
//! Structurally parallel to the department handlers, sharing the
//! named-record catalog underneath.

use axum::{extract::Path, response::Json, Extension};

use crate::catalog::{self, RecordForm, RecordResponse};
use crate::entity::role;
use crate::error::AppResult;
use crate::middleware::auth::CurrentUser;
use crate::middleware::DbConn;
use crate::routes::ApiResponse;

/// GET /api/roles
pub async fn list_roles(
    Extension(db): Extension<DbConn>,
    Extension(user): Extension<CurrentUser>,
) -> AppResult<Json<ApiResponse<Vec<RecordResponse>>>> {
    user.require_admin()?;
    let roles: Vec<role::Model> = catalog::list(&db).await?;
    Ok(Json(ApiResponse::success(
        roles.iter().map(RecordResponse::of).collect(),
    )))
}

/// GET /api/roles/add
pub async fn role_form(
    Extension(user): Extension<CurrentUser>,
) -> AppResult<Json<ApiResponse<RecordForm>>> {
    user.require_admin()?;
    Ok(Json(ApiResponse::success(RecordForm::default())))
}

/// POST /api/roles/add
pub async fn add_role(
    Extension(db): Extension<DbConn>,
    Extension(user): Extension<CurrentUser>,
    Json(form): Json<RecordForm>,
) -> AppResult<Json<ApiResponse<RecordResponse>>> {
    user.require_admin()?;
    let role: role::Model = catalog::add(&db, &form).await?;
    tracing::info!("Role created: {}", role.name);
    Ok(Json(ApiResponse::with_message(
        format!("You have successfully added the \"{}\" role.", role.name),
        RecordResponse::of(&role),
    )))
}

/// GET /api/roles/edit/:id
pub async fn edit_role_form(
    Extension(db): Extension<DbConn>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> AppResult<Json<ApiResponse<RecordResponse>>> {
    user.require_admin()?;
    let role: role::Model = catalog::get(&db, id).await?;
    Ok(Json(ApiResponse::success(RecordResponse::of(&role))))
}

/// POST /api/roles/edit/:id
pub async fn edit_role(
    Extension(db): Extension<DbConn>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(form): Json<RecordForm>,
) -> AppResult<Json<ApiResponse<RecordResponse>>> {
    user.require_admin()?;
    let role: role::Model = catalog::edit(&db, id, &form).await?;
    tracing::info!("Role updated: {}", role.name);
    Ok(Json(ApiResponse::with_message(
        format!("You have successfully edited the \"{}\" role.", role.name),
        RecordResponse::of(&role),
    )))
}

/// GET/POST /api/roles/delete/:id
pub async fn delete_role(
    Extension(db): Extension<DbConn>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> AppResult<Json<ApiResponse<()>>> {
    user.require_admin()?;
    let role: role::Model = catalog::remove(&db, id).await?;
    tracing::info!("Role deleted: {}", role.name);
    Ok(Json(ApiResponse::success_msg(format!(
        "You have successfully deleted the \"{}\" role.",
        role.name
    ))))
}
