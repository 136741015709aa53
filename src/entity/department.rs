//! Department entity
//!
//! Table name: departments

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "departments")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    /// Department name (unique)
    #[sea_orm(column_type = "String(Some(60))", unique)]
    pub name: String,

    /// Free-form description
    #[sea_orm(column_type = "String(Some(200))", nullable)]
    pub description: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

// Employee references are resolved with manual queries to avoid
// circular dependencies between entity modules.

impl ActiveModelBehavior for ActiveModel {}
