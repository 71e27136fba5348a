//! Declarative form schema
//!
//! A form is described once as data: scalar fields, tabs that own them,
//! validation rules, attachment slots and an optional nested collection.
//! The engine is parameterized by a [`FormSchema`]; the concrete record
//! types (PF filing, ESIC filing) only differ in their schema.

pub mod fields;
pub mod rules;
pub mod schema;

// Re-exports
pub use fields::{FieldDef, FieldKind, FieldSet, FieldValue};
pub use rules::{DateRole, FieldRule, PatternKind, RuleKind};
pub use schema::{
    AttachmentConstraints, CollectionSchema, FormSchema, SlotDef, TabDef,
};
