//! Authentication handlers
//!
//! Implements register, login, logout, and current user endpoints

use axum::{http::StatusCode, response::IntoResponse, Extension, Json};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter, Set,
    SqlErr,
};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use crate::entity::employee;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::{CurrentUser, SESSION_TIMESTAMP_KEY, SESSION_USER_KEY};
use crate::middleware::DbConn;
use crate::routes::ApiResponse;

/// Registration request body
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub username: String,
    #[serde(rename = "firstName")]
    pub first_name: String,
    #[serde(rename = "lastName")]
    pub last_name: String,
    pub password: String,
}

/// Login request body
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Current user response
#[derive(Debug, Serialize)]
pub struct CurrentUserResponse {
    pub id: i64,
    pub username: String,
    pub email: String,
    #[serde(rename = "firstName")]
    pub first_name: String,
    #[serde(rename = "lastName")]
    pub last_name: String,
    #[serde(rename = "isAdmin")]
    pub is_admin: bool,
}

/// Create an employee account from a registration request. Accounts
/// created this way are never administrators.
pub async fn create_account(
    db: &DatabaseConnection,
    req: &RegisterRequest,
) -> AppResult<employee::Model> {
    let email = req.email.trim();
    let username = req.username.trim();
    let first_name = req.first_name.trim();
    let last_name = req.last_name.trim();

    if email.is_empty() || !email.contains('@') {
        return Err(AppError::Validation("a valid email is required".to_string()));
    }
    if username.is_empty() {
        return Err(AppError::Validation("username is required".to_string()));
    }
    if first_name.is_empty() || last_name.is_empty() {
        return Err(AppError::Validation("first and last name are required".to_string()));
    }
    if req.password.is_empty() {
        return Err(AppError::Validation("password is required".to_string()));
    }

    let taken = employee::Entity::find()
        .filter(
            Condition::any()
                .add(employee::Column::Email.eq(email))
                .add(employee::Column::Username.eq(username)),
        )
        .one(db)
        .await?;
    if taken.is_some() {
        return Err(AppError::Conflict(
            "email or username is already in use".to_string(),
        ));
    }

    let password_hash =
        bcrypt::hash(&req.password, bcrypt::DEFAULT_COST).map_err(|e| AppError::Internal(e.to_string()))?;

    employee::ActiveModel {
        email: Set(email.to_string()),
        username: Set(username.to_string()),
        first_name: Set(first_name.to_string()),
        last_name: Set(last_name.to_string()),
        password_hash: Set(password_hash),
        is_admin: Set(false),
        last_login: Set(0),
        department_id: Set(None),
        role_id: Set(None),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(|e| match e.sql_err() {
        // Concurrent registration with the same email or username
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            AppError::Conflict("email or username is already in use".to_string())
        }
        _ => AppError::Database(e),
    })
}

/// POST /api/register
pub async fn register(
    Extension(db): Extension<DbConn>,
    Json(req): Json<RegisterRequest>,
) -> AppResult<Json<ApiResponse<()>>> {
    let account = create_account(&db, &req).await?;
    tracing::info!("Employee registered: {}", account.username);
    Ok(Json(ApiResponse::success_msg(
        "You have successfully registered! You may now login.",
    )))
}

/// POST /api/login
pub async fn login(
    Extension(db): Extension<DbConn>,
    session: Session,
    Json(req): Json<LoginRequest>,
) -> (StatusCode, Json<serde_json::Value>) {
    // Validate input
    if req.email.is_empty() || req.password.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({"error": "bad request"})),
        );
    }

    // Find employee in database
    let db = &*db;
    let employee_result = employee::Entity::find()
        .filter(employee::Column::Email.eq(&req.email))
        .one(db)
        .await;

    let db_employee = match employee_result {
        Ok(Some(employee)) => employee,
        Ok(None) => {
            tracing::warn!("Login failed: unknown email - {}", req.email);
            return (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({"error": "invalid email or password"})),
            );
        }
        Err(e) => {
            tracing::error!("Database error during login: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({"error": "internal error"})),
            );
        }
    };

    // Verify password using bcrypt
    let password_valid = bcrypt::verify(&req.password, &db_employee.password_hash).unwrap_or(false);
    if !password_valid {
        tracing::warn!("Login failed: wrong password - {}", req.email);
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({"error": "invalid email or password"})),
        );
    }

    // Update last login time
    let now = chrono::Utc::now().timestamp() as i32;
    let username = db_employee.username.clone();
    let mut active_model: employee::ActiveModel = db_employee.into();
    active_model.last_login = Set(now);
    if let Err(e) = active_model.update(db).await {
        tracing::error!("Failed to update last login: {}", e);
    }

    // Save session
    if let Err(e) = session.insert(SESSION_USER_KEY, &username).await {
        tracing::error!("Failed to save session: {}", e);
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({"error": "internal error"})),
        );
    }
    if let Err(e) = session
        .insert(SESSION_TIMESTAMP_KEY, chrono::Utc::now().timestamp())
        .await
    {
        tracing::error!("Failed to save session timestamp: {}", e);
    }

    tracing::info!("Employee logged in: {}", username);

    (
        StatusCode::OK,
        Json(serde_json::json!({"message": "login success"})),
    )
}

/// POST /api/logout
pub async fn logout(
    session: Session,
    Extension(current_user): Extension<CurrentUser>,
) -> impl IntoResponse {
    let username = current_user.username.clone();

    if let Err(e) = session.flush().await {
        tracing::error!("Failed to flush session: {}", e);
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiResponse::<()>::error(500, "internal error")),
        );
    }

    tracing::info!("Employee logged out: {}", username);

    (
        StatusCode::OK,
        Json(ApiResponse::success_msg("logout success")),
    )
}

/// GET /api/user/current
pub async fn current_user(
    Extension(user): Extension<CurrentUser>,
) -> Json<ApiResponse<CurrentUserResponse>> {
    Json(ApiResponse::success(CurrentUserResponse {
        id: user.id,
        username: user.username,
        email: user.email,
        first_name: user.first_name,
        last_name: user.last_name,
        is_admin: user.is_admin,
    }))
}
