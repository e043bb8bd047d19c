//! Data models for the user directory persistence layer.

pub mod schema;
pub mod statement;

pub use schema::{Engine, ForeignKeyTarget, Schema};
pub use statement::{
    MutationKind, MutationOutcome, Page, ParamValue, Record, Statement, StatementKind,
};
