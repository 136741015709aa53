//! Department handlers
//!
//! Implements department CRUD operations on top of the named-record
//! catalog. Every operation is guarded by the administrator check
//! before any read or write.

use axum::{extract::Path, response::Json, Extension};

use crate::catalog::{self, RecordForm, RecordResponse};
use crate::entity::department;
use crate::error::AppResult;
use crate::middleware::auth::CurrentUser;
use crate::middleware::DbConn;
use crate::routes::ApiResponse;

/// GET /api/department
pub async fn list_departments(
    Extension(db): Extension<DbConn>,
    Extension(user): Extension<CurrentUser>,
) -> AppResult<Json<ApiResponse<Vec<RecordResponse>>>> {
    user.require_admin()?;
    let departments: Vec<department::Model> = catalog::list(&db).await?;
    Ok(Json(ApiResponse::success(
        departments.iter().map(RecordResponse::of).collect(),
    )))
}

/// GET /api/department_add
///
/// The admin UI serves the form on GET of the same route; the JSON
/// rendition returns the blank form payload.
pub async fn department_form(
    Extension(user): Extension<CurrentUser>,
) -> AppResult<Json<ApiResponse<RecordForm>>> {
    user.require_admin()?;
    Ok(Json(ApiResponse::success(RecordForm::default())))
}

/// POST /api/department_add
pub async fn add_department(
    Extension(db): Extension<DbConn>,
    Extension(user): Extension<CurrentUser>,
    Json(form): Json<RecordForm>,
) -> AppResult<Json<ApiResponse<RecordResponse>>> {
    user.require_admin()?;
    let department: department::Model = catalog::add(&db, &form).await?;
    tracing::info!("Department created: {}", department.name);
    Ok(Json(ApiResponse::with_message(
        format!(
            "You have successfully added the \"{}\" department.",
            department.name
        ),
        RecordResponse::of(&department),
    )))
}

/// GET /api/department/edit/:id
///
/// Pre-populates the edit form with the current values.
pub async fn edit_department_form(
    Extension(db): Extension<DbConn>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> AppResult<Json<ApiResponse<RecordResponse>>> {
    user.require_admin()?;
    let department: department::Model = catalog::get(&db, id).await?;
    Ok(Json(ApiResponse::success(RecordResponse::of(&department))))
}

/// POST /api/department/edit/:id
pub async fn edit_department(
    Extension(db): Extension<DbConn>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(form): Json<RecordForm>,
) -> AppResult<Json<ApiResponse<RecordResponse>>> {
    user.require_admin()?;
    let department: department::Model = catalog::edit(&db, id, &form).await?;
    tracing::info!("Department updated: {}", department.name);
    Ok(Json(ApiResponse::with_message(
        format!(
            "You have successfully edited the \"{}\" department.",
            department.name
        ),
        RecordResponse::of(&department),
    )))
}

/// GET/POST /api/department/delete/:id
pub async fn delete_department(
    Extension(db): Extension<DbConn>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> AppResult<Json<ApiResponse<()>>> {
    user.require_admin()?;
    let department: department::Model = catalog::remove(&db, id).await?;
    tracing::info!("Department deleted: {}", department.name);
    Ok(Json(ApiResponse::success_msg(format!(
        "You have successfully deleted the \"{}\" department.",
        department.name
    ))))
}
