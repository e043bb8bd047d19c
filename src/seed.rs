//! First-run bootstrap: schema creation and the initial admin account.

use crate::db::QueryDispatcher;
use crate::error::DomainResult;
use crate::models::Schema;
use crate::statements::{DirectoryStatements, NewUser};
use tracing::{debug, info};

/// Identity and profile of the privileged account seeded at startup.
#[derive(Debug, Clone)]
pub struct AdminSeed {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    /// Already hashed; hashing is the auth layer's concern.
    pub password_hash: String,
}

/// Create the persisted layout. Idempotent (`IF NOT EXISTS` throughout);
/// runs once before seeding.
pub async fn create_schema(dispatcher: &QueryDispatcher, schema: &Schema) -> DomainResult<()> {
    let ddl = schema.create_tables_sql(dispatcher.engine());
    dispatcher.execute_batch(&ddl).await?;
    debug!("schema ensured");
    Ok(())
}

/// Insert the admin account unless one with the same identity exists.
///
/// Check-then-insert, not atomic against concurrent invocations; only safe
/// because it runs once at single-process startup.
pub async fn ensure_admin(
    dispatcher: &QueryDispatcher,
    statements: &DirectoryStatements,
    admin: AdminSeed,
) -> DomainResult<()> {
    let probe = statements.admin_exists(&admin.email);
    if dispatcher.scalar(&probe).await?.is_some() {
        debug!(email = %admin.email, "admin account already present");
        return Ok(());
    }

    let user = NewUser {
        first_name: Some(admin.first_name),
        last_name: Some(admin.last_name),
        email: admin.email,
        is_admin: true,
        password_hash: admin.password_hash,
        ..Default::default()
    };
    let outcome = dispatcher.mutate(&statements.insert_user(&user)).await?;
    info!(email = %user.email, id = ?outcome.generated_id(), "admin account created");
    Ok(())
}
