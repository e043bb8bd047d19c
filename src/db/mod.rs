//! Persistence access layer.
//!
//! - Connection pool lifecycle with a named, swappable disposal policy
//! - Transactional session scopes
//! - Uniform query dispatch for scalar, row, list and mutation shapes
//! - Translation of storage failures into the domain error taxonomy

pub mod dispatcher;
pub mod params;
pub mod pool;
pub mod session;
pub mod translate;
pub mod types;

pub use dispatcher::QueryDispatcher;
pub use pool::{ConnectionManager, DbPool};
pub use session::SessionScope;
pub use translate::ErrorTranslator;
