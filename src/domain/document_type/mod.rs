//! Identification document types

mod entity;

pub use entity::{DocumentType, DocumentTypeId};
