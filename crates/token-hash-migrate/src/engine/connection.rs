//! Connection setup and metadata discovery.

use sqlx::{AnyConnection, Connection};
use tracing::info;

use crate::config::DatabaseConfig;
use crate::dialect::ConnectionMetadata;
use crate::error::Result;

/// Open a single connection to the token database.
///
/// The URL scheme selects the sqlx driver (`mysql://`, `postgres://`,
/// `sqlite:`). The connection starts in auto-commit mode.
pub async fn connect(config: &DatabaseConfig) -> Result<AnyConnection> {
    sqlx::any::install_default_drivers();

    let conn = AnyConnection::connect(&config.url).await?;

    info!("Connected to {} token database", conn.backend_name());

    Ok(conn)
}

/// Metadata the dialect resolver classifies.
///
/// Defaults to the sqlx backend name for both fields. Configured overrides
/// take precedence, which lets deployments behind a compatibility layer
/// report the product they actually run.
pub fn connection_metadata(conn: &AnyConnection, config: &DatabaseConfig) -> ConnectionMetadata {
    let backend = conn.backend_name();

    ConnectionMetadata::new(
        config
            .driver_name
            .clone()
            .unwrap_or_else(|| backend.to_string()),
        config
            .product_name
            .clone()
            .unwrap_or_else(|| backend.to_string()),
    )
}
