//! Role domain

mod entity;

pub use entity::{Role, RoleId};
