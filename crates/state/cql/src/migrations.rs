use scylla::client::session::Session;

use crate::config::CqlConfig;

/// Create the keyspace and item table if they do not already exist.
///
/// # Errors
/// Returns a [`scylla::errors::ExecutionError`] if any DDL statement fails.
pub async fn run_migrations(
    session: &Session,
    config: &CqlConfig,
) -> Result<(), scylla::errors::ExecutionError> {
    let create_keyspace = format!(
        "CREATE KEYSPACE IF NOT EXISTS {} \
         WITH REPLICATION = {{'class': 'SimpleStrategy', 'replication_factor': {}}}",
        config.keyspace, config.replication_factor
    );
    session.query_unpaged(create_keyspace, &[]).await?;

    let create_table = format!(
        "CREATE TABLE IF NOT EXISTS {} ( \
            bucket text, \
            id text, \
            data blob, \
            PRIMARY KEY (bucket, id) \
        )",
        config.qualified_table()
    );
    session.query_unpaged(create_table, &[]).await?;

    Ok(())
}
