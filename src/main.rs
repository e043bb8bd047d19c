//! userdir bootstrap entry point.
//!
//! Parses configuration, ensures the persisted layout exists and seeds the
//! initial admin account. HTTP serving is a separate concern and lives
//! outside this binary.

use clap::Parser;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};
use userdir::config::Config;
use userdir::db::{ConnectionManager, ErrorTranslator, QueryDispatcher};
use userdir::models::Schema;
use userdir::seed::{self, AdminSeed};
use userdir::statements::DirectoryStatements;

/// Initialize the tracing subscriber for logging.
fn init_tracing(config: &Config) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let subscriber = tracing_subscriber::registry().with(filter);

    if config.json_logs {
        subscriber.with(fmt::layer().json()).init();
    } else {
        subscriber
            .with(fmt::layer().with_target(true).with_thread_ids(false))
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::parse();
    init_tracing(&config);

    let schema = Schema::directory();
    let manager = Arc::new(ConnectionManager::new(&config.database())?);
    info!(
        engine = %manager.engine(),
        policy = %manager.policy(),
        "persistence layer configured"
    );

    let dispatcher = QueryDispatcher::new(
        Arc::clone(&manager),
        ErrorTranslator::from_schema(&schema),
    );
    let statements = DirectoryStatements::new(&schema);

    seed::create_schema(&dispatcher, &schema).await?;

    match (&config.admin_email, &config.admin_password_hash) {
        (Some(email), Some(hash)) => {
            let admin = AdminSeed {
                first_name: config.admin_first_name.clone(),
                last_name: config.admin_last_name.clone(),
                email: email.clone(),
                password_hash: hash.clone(),
            };
            seed::ensure_admin(&dispatcher, &statements, admin).await?;
        }
        _ => info!("no admin seed configured; skipping"),
    }

    info!("bootstrap complete");
    Ok(())
}
