//! Employee entity
//!
//! Table name: employees

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "employees")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    /// Email address (unique, used as the login identifier)
    #[sea_orm(column_type = "String(Some(60))", unique)]
    pub email: String,

    /// Username (unique, stored in the session)
    #[sea_orm(column_type = "String(Some(60))", unique)]
    pub username: String,

    #[sea_orm(column_type = "String(Some(60))")]
    pub first_name: String,

    #[sea_orm(column_type = "String(Some(60))")]
    pub last_name: String,

    /// Password (bcrypt hash)
    #[sea_orm(column_type = "String(Some(128))")]
    #[serde(skip_serializing)]
    pub password_hash: String,

    /// Administrator flag. Administrators manage the catalog but are
    /// never assignable themselves.
    pub is_admin: bool,

    /// Last login time (Unix timestamp)
    pub last_login: i32,

    /// Assigned department, if any
    #[sea_orm(nullable)]
    pub department_id: Option<i64>,

    /// Assigned role, if any
    #[sea_orm(nullable)]
    pub role_id: Option<i64>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

// Department and role names are resolved with manual queries to avoid
// circular dependencies between entity modules.

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Display name used in status messages
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_name() {
        let employee = Model {
            id: 1,
            email: "jane@example.com".to_string(),
            username: "jane".to_string(),
            first_name: "Jane".to_string(),
            last_name: "Doe".to_string(),
            password_hash: String::new(),
            is_admin: false,
            last_login: 0,
            department_id: None,
            role_id: None,
        };
        assert_eq!(employee.full_name(), "Jane Doe");
    }
}
