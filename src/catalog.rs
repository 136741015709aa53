//! Named-record catalog
//!
//! Department and Role share the same lifecycle: a uniquely named record
//! with an optional description, created and maintained by
//! administrators. The store-facing logic lives here once, behind the
//! [`NamedRecord`] trait; the HTTP shells in `handlers` stay per-entity.

use async_trait::async_trait;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, QueryOrder, Set, SqlErr, TransactionTrait,
};
use serde::{Deserialize, Serialize};

use crate::entity::{department, employee, role};
use crate::error::{AppError, AppResult, OptionExt};

// Field limits mirroring the column definitions
const MAX_NAME_LEN: usize = 60;
const MAX_DESCRIPTION_LEN: usize = 200;

/// A catalog record keyed by a unique, human-readable name
#[async_trait]
pub trait NamedRecord: Sized + Send + Sync {
    /// Noun used in user-facing messages ("department", "role")
    const NOUN: &'static str;

    fn id(&self) -> i64;
    fn name(&self) -> &str;
    fn description(&self) -> Option<&str>;

    async fn find_all(db: &DatabaseConnection) -> Result<Vec<Self>, DbErr>;
    async fn find_by_id(db: &DatabaseConnection, id: i64) -> Result<Option<Self>, DbErr>;
    async fn find_by_name(db: &DatabaseConnection, name: &str) -> Result<Option<Self>, DbErr>;
    async fn insert(
        db: &DatabaseConnection,
        name: &str,
        description: Option<&str>,
    ) -> Result<Self, DbErr>;
    async fn update(
        db: &DatabaseConnection,
        id: i64,
        name: &str,
        description: Option<&str>,
    ) -> Result<Self, DbErr>;
    /// Clear this record's reference on every employee that carries it
    async fn detach_employees<C: ConnectionTrait>(conn: &C, id: i64) -> Result<(), DbErr>;
    async fn delete_by_id<C: ConnectionTrait>(conn: &C, id: i64) -> Result<(), DbErr>;
}

#[async_trait]
impl NamedRecord for department::Model {
    const NOUN: &'static str = "department";

    fn id(&self) -> i64 {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    async fn find_all(db: &DatabaseConnection) -> Result<Vec<Self>, DbErr> {
        department::Entity::find()
            .order_by_asc(department::Column::Id)
            .all(db)
            .await
    }

    async fn find_by_id(db: &DatabaseConnection, id: i64) -> Result<Option<Self>, DbErr> {
        department::Entity::find_by_id(id).one(db).await
    }

    async fn find_by_name(db: &DatabaseConnection, name: &str) -> Result<Option<Self>, DbErr> {
        department::Entity::find()
            .filter(department::Column::Name.eq(name))
            .one(db)
            .await
    }

    async fn insert(
        db: &DatabaseConnection,
        name: &str,
        description: Option<&str>,
    ) -> Result<Self, DbErr> {
        department::ActiveModel {
            name: Set(name.to_string()),
            description: Set(description.map(str::to_string)),
            ..Default::default()
        }
        .insert(db)
        .await
    }

    async fn update(
        db: &DatabaseConnection,
        id: i64,
        name: &str,
        description: Option<&str>,
    ) -> Result<Self, DbErr> {
        department::ActiveModel {
            id: Set(id),
            name: Set(name.to_string()),
            description: Set(description.map(str::to_string)),
        }
        .update(db)
        .await
    }

    async fn detach_employees<C: ConnectionTrait>(conn: &C, id: i64) -> Result<(), DbErr> {
        employee::Entity::update_many()
            .col_expr(employee::Column::DepartmentId, Expr::value(None::<i64>))
            .filter(employee::Column::DepartmentId.eq(id))
            .exec(conn)
            .await?;
        Ok(())
    }

    async fn delete_by_id<C: ConnectionTrait>(conn: &C, id: i64) -> Result<(), DbErr> {
        department::Entity::delete_by_id(id).exec(conn).await?;
        Ok(())
    }
}

#[async_trait]
impl NamedRecord for role::Model {
    const NOUN: &'static str = "role";

    fn id(&self) -> i64 {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    async fn find_all(db: &DatabaseConnection) -> Result<Vec<Self>, DbErr> {
        role::Entity::find()
            .order_by_asc(role::Column::Id)
            .all(db)
            .await
    }

    async fn find_by_id(db: &DatabaseConnection, id: i64) -> Result<Option<Self>, DbErr> {
        role::Entity::find_by_id(id).one(db).await
    }

    async fn find_by_name(db: &DatabaseConnection, name: &str) -> Result<Option<Self>, DbErr> {
        role::Entity::find()
            .filter(role::Column::Name.eq(name))
            .one(db)
            .await
    }

    async fn insert(
        db: &DatabaseConnection,
        name: &str,
        description: Option<&str>,
    ) -> Result<Self, DbErr> {
        role::ActiveModel {
            name: Set(name.to_string()),
            description: Set(description.map(str::to_string)),
            ..Default::default()
        }
        .insert(db)
        .await
    }

    async fn update(
        db: &DatabaseConnection,
        id: i64,
        name: &str,
        description: Option<&str>,
    ) -> Result<Self, DbErr> {
        role::ActiveModel {
            id: Set(id),
            name: Set(name.to_string()),
            description: Set(description.map(str::to_string)),
        }
        .update(db)
        .await
    }

    async fn detach_employees<C: ConnectionTrait>(conn: &C, id: i64) -> Result<(), DbErr> {
        employee::Entity::update_many()
            .col_expr(employee::Column::RoleId, Expr::value(None::<i64>))
            .filter(employee::Column::RoleId.eq(id))
            .exec(conn)
            .await?;
        Ok(())
    }

    async fn delete_by_id<C: ConnectionTrait>(conn: &C, id: i64) -> Result<(), DbErr> {
        role::Entity::delete_by_id(id).exec(conn).await?;
        Ok(())
    }
}

/// Submitted form fields, shared by the department and role forms
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct RecordForm {
    pub name: String,
    pub description: Option<String>,
}

/// Record payload, shared by the department and role responses
#[derive(Debug, Serialize)]
pub struct RecordResponse {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
}

impl RecordResponse {
    pub fn of<R: NamedRecord>(record: &R) -> Self {
        Self {
            id: record.id(),
            name: record.name().to_string(),
            description: record.description().map(str::to_string),
        }
    }
}

/// All records in id order
pub async fn list<R: NamedRecord>(db: &DatabaseConnection) -> AppResult<Vec<R>> {
    Ok(R::find_all(db).await?)
}

pub async fn get<R: NamedRecord>(db: &DatabaseConnection, id: i64) -> AppResult<R> {
    R::find_by_id(db, id)
        .await?
        .ok_or_not_found(format!("{} {} not found", R::NOUN, id))
}

/// Insert a new record after validating the submitted fields
pub async fn add<R: NamedRecord>(db: &DatabaseConnection, form: &RecordForm) -> AppResult<R> {
    let (name, description) = validated_fields::<R>(form)?;
    if R::find_by_name(db, name).await?.is_some() {
        return Err(duplicate_name::<R>(name));
    }
    R::insert(db, name, description)
        .await
        .map_err(|e| write_error::<R>(e, name))
}

/// Overwrite an existing record's name and description
pub async fn edit<R: NamedRecord>(
    db: &DatabaseConnection,
    id: i64,
    form: &RecordForm,
) -> AppResult<R> {
    let current: R = get(db, id).await?;
    let (name, description) = validated_fields::<R>(form)?;
    if let Some(other) = R::find_by_name(db, name).await? {
        if other.id() != current.id() {
            return Err(duplicate_name::<R>(name));
        }
    }
    R::update(db, id, name, description)
        .await
        .map_err(|e| write_error::<R>(e, name))
}

/// Delete a record, returning it for the status message. Employee
/// references are cleared in the same transaction so a failure cannot
/// leave employees pointing at a missing record.
pub async fn remove<R: NamedRecord>(db: &DatabaseConnection, id: i64) -> AppResult<R> {
    let record: R = get(db, id).await?;
    let txn = db.begin().await?;
    R::detach_employees(&txn, id).await?;
    R::delete_by_id(&txn, id).await?;
    txn.commit().await?;
    Ok(record)
}

fn validated_fields<R: NamedRecord>(form: &RecordForm) -> AppResult<(&str, Option<&str>)> {
    let name = form.name.trim();
    if name.is_empty() {
        return Err(AppError::Validation(format!("{} name is required", R::NOUN)));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(AppError::Validation(format!(
            "{} name must be at most {} characters",
            R::NOUN,
            MAX_NAME_LEN
        )));
    }
    let description = form
        .description
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty());
    if let Some(d) = description {
        if d.chars().count() > MAX_DESCRIPTION_LEN {
            return Err(AppError::Validation(format!(
                "{} description must be at most {} characters",
                R::NOUN,
                MAX_DESCRIPTION_LEN
            )));
        }
    }
    Ok((name, description))
}

fn duplicate_name<R: NamedRecord>(name: &str) -> AppError {
    AppError::Conflict(format!("{} name \"{}\" already exists", R::NOUN, name))
}

/// Map a failed write to the error taxonomy. A unique-constraint
/// violation here means another request inserted the same name between
/// the pre-check and the write.
fn write_error<R: NamedRecord>(err: DbErr, name: &str) -> AppError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => duplicate_name::<R>(name),
        _ => AppError::Database(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{Database, Schema};

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

    async fn insert_employee(
        db: &DatabaseConnection,
        username: &str,
        department_id: Option<i64>,
        role_id: Option<i64>,
    ) -> employee::Model {
        employee::ActiveModel {
            email: Set(format!("{}@example.com", username)),
            username: Set(username.to_string()),
            first_name: Set(username.to_string()),
            last_name: Set("Test".to_string()),
            password_hash: Set("hash".to_string()),
            is_admin: Set(false),
            last_login: Set(0),
            department_id: Set(department_id),
            role_id: Set(role_id),
            ..Default::default()
        }
        .insert(db)
        .await
        .unwrap()
    }

    fn form(name: &str, description: Option<&str>) -> RecordForm {
        RecordForm {
            name: name.to_string(),
            description: description.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn test_add_and_list() {
        let db = setup().await;
        let dept: department::Model =
            add(&db, &form("Engineering", Some("Builds things"))).await.unwrap();
        assert_eq!(dept.name, "Engineering");
        assert_eq!(dept.description.as_deref(), Some("Builds things"));

        add::<department::Model>(&db, &form("Sales", None)).await.unwrap();
        let all: Vec<department::Model> = list(&db).await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].name, "Engineering");
        assert_eq!(all[1].name, "Sales");
    }

    #[tokio::test]
    async fn test_add_requires_name() {
        let db = setup().await;
        let result = add::<department::Model>(&db, &form("   ", None)).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
        let all: Vec<department::Model> = list(&db).await.unwrap();
        assert!(all.is_empty());
    }

    #[tokio::test]
    async fn test_add_duplicate_name_is_conflict() {
        let db = setup().await;
        add::<department::Model>(&db, &form("Engineering", None)).await.unwrap();
        let result = add::<department::Model>(&db, &form("Engineering", Some("again"))).await;
        assert!(matches!(result, Err(AppError::Conflict(_))));
        let all: Vec<department::Model> = list(&db).await.unwrap();
        assert_eq!(all.len(), 1);
    }

    #[tokio::test]
    async fn test_edit_updates_single_record() {
        let db = setup().await;
        let first: department::Model = add(&db, &form("Engineering", None)).await.unwrap();
        let second: department::Model = add(&db, &form("Sales", Some("Sells things"))).await.unwrap();

        let edited: department::Model =
            edit(&db, first.id, &form("Platform", Some("Runs things"))).await.unwrap();
        assert_eq!(edited.id, first.id);
        assert_eq!(edited.name, "Platform");

        let untouched: department::Model = get(&db, second.id).await.unwrap();
        assert_eq!(untouched.name, "Sales");
        assert_eq!(untouched.description.as_deref(), Some("Sells things"));
    }

    #[tokio::test]
    async fn test_edit_keeps_own_name() {
        let db = setup().await;
        let dept: department::Model = add(&db, &form("Engineering", None)).await.unwrap();
        let edited: department::Model =
            edit(&db, dept.id, &form("Engineering", Some("updated"))).await.unwrap();
        assert_eq!(edited.description.as_deref(), Some("updated"));
    }

    #[tokio::test]
    async fn test_edit_duplicate_name_is_conflict() {
        let db = setup().await;
        add::<department::Model>(&db, &form("Engineering", None)).await.unwrap();
        let second: department::Model = add(&db, &form("Sales", None)).await.unwrap();
        let result = edit::<department::Model>(&db, second.id, &form("Engineering", None)).await;
        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_edit_missing_is_not_found() {
        let db = setup().await;
        let result = edit::<department::Model>(&db, 42, &form("Engineering", None)).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));

        // The absent id wins even when the submitted form is invalid
        let result = edit::<department::Model>(&db, 42, &form("   ", None)).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_remove_missing_is_not_found() {
        let db = setup().await;
        let result = remove::<role::Model>(&db, 42).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_remove_detaches_employees() {
        let db = setup().await;
        let dept: department::Model = add(&db, &form("Engineering", None)).await.unwrap();
        let role: role::Model = add(&db, &form("Manager", None)).await.unwrap();
        let employee = insert_employee(&db, "jane", Some(dept.id), Some(role.id)).await;

        let removed: department::Model = remove(&db, dept.id).await.unwrap();
        assert_eq!(removed.name, "Engineering");

        let reloaded = employee::Entity::find_by_id(employee.id)
            .one(&db)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(reloaded.department_id, None);
        // The role reference is untouched by a department delete
        assert_eq!(reloaded.role_id, Some(role.id));
    }

    #[tokio::test]
    async fn test_remove_role_detaches_employees() {
        let db = setup().await;
        let role: role::Model = add(&db, &form("Manager", None)).await.unwrap();
        let employee = insert_employee(&db, "john", None, Some(role.id)).await;

        remove::<role::Model>(&db, role.id).await.unwrap();

        let reloaded = employee::Entity::find_by_id(employee.id)
            .one(&db)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(reloaded.role_id, None);
    }
}
