//! User directory backend - persistence access layer.
//!
//! Owns connection/session lifecycle, dispatches the four query shapes
//! (scalar, row, list, mutation), applies pagination server-side, enforces
//! per-statement atomicity, and translates storage failures into a stable
//! domain error taxonomy. Route handlers, token issuance and the rest of the
//! backend are external collaborators; they feed this layer statement
//! descriptors and consume its domain errors.

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod seed;
pub mod statements;

pub use config::{Config, DatabaseConfig, PoolPolicy};
pub use db::{ConnectionManager, ErrorTranslator, QueryDispatcher, SessionScope};
pub use error::{DomainError, DomainResult};
