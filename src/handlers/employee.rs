//! Employee handlers
//!
//! Implements the employee list and the department/role assignment
//! flow. The admin controllers never create or delete employees; the
//! only mutation here is the pair of catalog references, and only for
//! employees that are not administrators themselves.

use std::collections::HashMap;

use axum::{extract::Path, response::Json, Extension};
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, QueryOrder, Set};
use serde::{Deserialize, Serialize};

use crate::catalog::{self, RecordResponse};
use crate::entity::{department, employee, role};
use crate::error::{AppError, AppResult, OptionExt};
use crate::middleware::auth::CurrentUser;
use crate::middleware::DbConn;
use crate::routes::ApiResponse;

/// Assignment request: both references are selected from the offered
/// sets, so both are required.
#[derive(Debug, Deserialize)]
pub struct AssignEmployeeRequest {
    #[serde(rename = "departmentId")]
    pub department_id: i64,
    #[serde(rename = "roleId")]
    pub role_id: i64,
}

/// Employee response with resolved department/role names
#[derive(Debug, Serialize)]
pub struct EmployeeResponse {
    pub id: i64,
    pub username: String,
    pub email: String,
    #[serde(rename = "firstName")]
    pub first_name: String,
    #[serde(rename = "lastName")]
    pub last_name: String,
    #[serde(rename = "isAdmin")]
    pub is_admin: bool,
    #[serde(rename = "departmentId")]
    pub department_id: Option<i64>,
    #[serde(rename = "departmentName")]
    pub department_name: Option<String>,
    #[serde(rename = "roleId")]
    pub role_id: Option<i64>,
    #[serde(rename = "roleName")]
    pub role_name: Option<String>,
}

impl EmployeeResponse {
    fn compose(
        m: employee::Model,
        dept_names: &HashMap<i64, String>,
        role_names: &HashMap<i64, String>,
    ) -> Self {
        Self {
            id: m.id,
            username: m.username,
            email: m.email,
            first_name: m.first_name,
            last_name: m.last_name,
            is_admin: m.is_admin,
            department_id: m.department_id,
            department_name: m.department_id.and_then(|id| dept_names.get(&id).cloned()),
            role_id: m.role_id,
            role_name: m.role_id.and_then(|id| role_names.get(&id).cloned()),
        }
    }
}

/// Assignment form payload: the employee plus the selectable sets
#[derive(Debug, Serialize)]
pub struct AssignFormResponse {
    pub employee: EmployeeResponse,
    pub departments: Vec<RecordResponse>,
    pub roles: Vec<RecordResponse>,
}

/// Department and role names keyed by id, for response composition
async fn catalog_names(
    db: &DatabaseConnection,
) -> AppResult<(HashMap<i64, String>, HashMap<i64, String>)> {
    let dept_names = department::Entity::find()
        .all(db)
        .await?
        .into_iter()
        .map(|d| (d.id, d.name))
        .collect();
    let role_names = role::Entity::find()
        .all(db)
        .await?
        .into_iter()
        .map(|r| (r.id, r.name))
        .collect();
    Ok((dept_names, role_names))
}

async fn find_employee(db: &DatabaseConnection, id: i64) -> AppResult<employee::Model> {
    employee::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_not_found(format!("employee {} not found", id))
}

/// Set an employee's department and role to the selected records.
/// Administrators are not assignable; the attempt is rejected outright.
pub async fn apply_assignment(
    db: &DatabaseConnection,
    id: i64,
    department_id: i64,
    role_id: i64,
) -> AppResult<(employee::Model, department::Model, role::Model)> {
    let target = find_employee(db, id).await?;
    if target.is_admin {
        return Err(AppError::Forbidden);
    }

    // The form offers existing records; an id outside those sets is a
    // validation failure rather than a missing resource.
    let dept = department::Entity::find_by_id(department_id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::Validation(format!("unknown department id {}", department_id)))?;
    let role = role::Entity::find_by_id(role_id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::Validation(format!("unknown role id {}", role_id)))?;

    let mut active: employee::ActiveModel = target.into();
    active.department_id = Set(Some(dept.id));
    active.role_id = Set(Some(role.id));
    let updated = active.update(db).await?;

    Ok((updated, dept, role))
}

/// GET /api/employees
pub async fn list_employees(
    Extension(db): Extension<DbConn>,
    Extension(user): Extension<CurrentUser>,
) -> AppResult<Json<ApiResponse<Vec<EmployeeResponse>>>> {
    user.require_admin()?;

    let employees = employee::Entity::find()
        .order_by_asc(employee::Column::Id)
        .all(&*db)
        .await?;
    let (dept_names, role_names) = catalog_names(&db).await?;

    let response = employees
        .into_iter()
        .map(|m| EmployeeResponse::compose(m, &dept_names, &role_names))
        .collect();
    Ok(Json(ApiResponse::success(response)))
}

/// GET /api/employees/assign/:id
///
/// Presents the assignment form: the target employee and the sets of
/// existing departments and roles to choose from. Administrators are
/// rejected before any form payload is produced.
pub async fn assign_employee_form(
    Extension(db): Extension<DbConn>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> AppResult<Json<ApiResponse<AssignFormResponse>>> {
    user.require_admin()?;

    let target = find_employee(&db, id).await?;
    if target.is_admin {
        return Err(AppError::Forbidden);
    }

    let departments: Vec<department::Model> = catalog::list(&db).await?;
    let roles: Vec<role::Model> = catalog::list(&db).await?;
    let (dept_names, role_names) = catalog_names(&db).await?;

    Ok(Json(ApiResponse::success(AssignFormResponse {
        employee: EmployeeResponse::compose(target, &dept_names, &role_names),
        departments: departments.iter().map(RecordResponse::of).collect(),
        roles: roles.iter().map(RecordResponse::of).collect(),
    })))
}

/// POST /api/employees/assign/:id
pub async fn assign_employee(
    Extension(db): Extension<DbConn>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(req): Json<AssignEmployeeRequest>,
) -> AppResult<Json<ApiResponse<EmployeeResponse>>> {
    user.require_admin()?;

    let (updated, dept, role) = apply_assignment(&db, id, req.department_id, req.role_id).await?;
    tracing::info!(
        "Employee {} assigned department={} role={}",
        updated.username,
        dept.name,
        role.name
    );

    let message = format!(
        "You have successfully assigned \"{}\" as department and \"{}\" as role to {}.",
        dept.name,
        role.name,
        updated.full_name()
    );
    let (dept_names, role_names) = catalog_names(&db).await?;
    Ok(Json(ApiResponse::with_message(
        message,
        EmployeeResponse::compose(updated, &dept_names, &role_names),
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{ConnectionTrait, Database, Schema};

    async fn setup() -> DatabaseConnection {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        let backend = db.get_database_backend();
        let schema = Schema::new(backend);
        for stmt in [
            schema.create_table_from_entity(department::Entity),
            schema.create_table_from_entity(role::Entity),
            schema.create_table_from_entity(employee::Entity),
        ] {
            db.execute(backend.build(&stmt)).await.unwrap();
        }
        db
    }

    async fn insert_employee(db: &DatabaseConnection, username: &str, is_admin: bool) -> employee::Model {
        employee::ActiveModel {
            email: Set(format!("{}@example.com", username)),
            username: Set(username.to_string()),
            first_name: Set(username.to_string()),
            last_name: Set("Test".to_string()),
            password_hash: Set("hash".to_string()),
            is_admin: Set(is_admin),
            last_login: Set(0),
            department_id: Set(None),
            role_id: Set(None),
            ..Default::default()
        }
        .insert(db)
        .await
        .unwrap()
    }

    async fn insert_department(db: &DatabaseConnection, name: &str) -> department::Model {
        department::ActiveModel {
            name: Set(name.to_string()),
            description: Set(None),
            ..Default::default()
        }
        .insert(db)
        .await
        .unwrap()
    }

    async fn insert_role(db: &DatabaseConnection, name: &str) -> role::Model {
        role::ActiveModel {
            name: Set(name.to_string()),
            description: Set(None),
            ..Default::default()
        }
        .insert(db)
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_apply_assignment() {
        let db = setup().await;
        let dept = insert_department(&db, "Engineering").await;
        let role = insert_role(&db, "Manager").await;
        let jane = insert_employee(&db, "jane", false).await;
        let other = insert_employee(&db, "john", false).await;

        let (updated, assigned_dept, assigned_role) =
            apply_assignment(&db, jane.id, dept.id, role.id).await.unwrap();
        assert_eq!(updated.department_id, Some(dept.id));
        assert_eq!(updated.role_id, Some(role.id));
        assert_eq!(assigned_dept.name, "Engineering");
        assert_eq!(assigned_role.name, "Manager");

        // No other employee record changes
        let reloaded = find_employee(&db, other.id).await.unwrap();
        assert_eq!(reloaded.department_id, None);
        assert_eq!(reloaded.role_id, None);
    }

    #[tokio::test]
    async fn test_reassignment_overwrites() {
        let db = setup().await;
        let first_dept = insert_department(&db, "Engineering").await;
        let second_dept = insert_department(&db, "Sales").await;
        let role = insert_role(&db, "Manager").await;
        let jane = insert_employee(&db, "jane", false).await;

        apply_assignment(&db, jane.id, first_dept.id, role.id).await.unwrap();
        let (updated, _, _) =
            apply_assignment(&db, jane.id, second_dept.id, role.id).await.unwrap();
        assert_eq!(updated.department_id, Some(second_dept.id));
    }

    #[tokio::test]
    async fn test_assigning_admin_is_forbidden() {
        let db = setup().await;
        let dept = insert_department(&db, "Engineering").await;
        let role = insert_role(&db, "Manager").await;
        let admin = insert_employee(&db, "root", true).await;

        let result = apply_assignment(&db, admin.id, dept.id, role.id).await;
        assert!(matches!(result, Err(AppError::Forbidden)));

        // The rejection leaves the record untouched
        let reloaded = find_employee(&db, admin.id).await.unwrap();
        assert_eq!(reloaded.department_id, None);
        assert_eq!(reloaded.role_id, None);
    }

    #[tokio::test]
    async fn test_assigning_missing_employee_is_not_found() {
        let db = setup().await;
        let dept = insert_department(&db, "Engineering").await;
        let role = insert_role(&db, "Manager").await;

        let result = apply_assignment(&db, 42, dept.id, role.id).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_assigning_unknown_references_is_validation() {
        let db = setup().await;
        let role = insert_role(&db, "Manager").await;
        let jane = insert_employee(&db, "jane", false).await;

        let result = apply_assignment(&db, jane.id, 42, role.id).await;
        assert!(matches!(result, Err(AppError::Validation(_))));

        let reloaded = find_employee(&db, jane.id).await.unwrap();
        assert_eq!(reloaded.department_id, None);
        assert_eq!(reloaded.role_id, None);
    }
}
