//! Entity module - SeaORM entity definitions
//!
//! One model per database table.

pub mod department;
pub mod employee;
pub mod role;
