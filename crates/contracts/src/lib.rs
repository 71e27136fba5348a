//! Shared contracts between the form engine and its consumers
//!
//! Contains the declarative form schema types (fields, tabs, validation
//! rules, attachment slots, nested collections), the submission DTOs
//! exchanged with the record gateway, and the concrete schema catalog
//! for the statutory record types.

pub mod domain;
pub mod shared;
