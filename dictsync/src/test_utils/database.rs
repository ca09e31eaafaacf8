use dictsync_config::shared::{IntoConnectOptions, PgConnectionConfig, TlsConfig};
use sqlx::{Connection, Executor, PgConnection, PgPool};
use tokio::runtime::Handle;
use uuid::Uuid;

/// Returns the [`PgConnectionConfig`] of the local Postgres instance used by tests.
///
/// Defaults to `postgres:postgres@localhost:5430`. `TESTS_DATABASE_HOST`, `TESTS_DATABASE_PORT`,
/// `TESTS_DATABASE_USERNAME` and `TESTS_DATABASE_PASSWORD` override the defaults.
pub fn local_pg_connection_config() -> PgConnectionConfig {
    let port = std::env::var("TESTS_DATABASE_PORT")
        .ok()
        .and_then(|port| port.parse().ok())
        .unwrap_or(5430);

    PgConnectionConfig {
        host: std::env::var("TESTS_DATABASE_HOST").unwrap_or_else(|_| "localhost".to_owned()),
        port,
        // A random name keeps concurrent tests apart.
        name: Uuid::new_v4().to_string(),
        username: std::env::var("TESTS_DATABASE_USERNAME")
            .unwrap_or_else(|_| "postgres".to_owned()),
        password: Some(
            std::env::var("TESTS_DATABASE_PASSWORD")
                .unwrap_or_else(|_| "postgres".to_owned())
                .into(),
        ),
        tls: TlsConfig {
            trusted_root_certs: String::new(),
            enabled: false,
        },
    }
}

/// A freshly created database, dropped together with its connections on drop.
///
/// Dropping needs a multi-threaded runtime.
#[derive(Debug)]
pub struct PgDatabase {
    pub config: PgConnectionConfig,
    pub pool: PgPool,
}

impl PgDatabase {
    /// Creates a uniquely named database on the local instance.
    pub async fn new() -> Self {
        let config = local_pg_connection_config();
        let pool = create_pg_database(&config).await;

        Self { config, pool }
    }

    /// Runs `statement` against the database.
    pub async fn execute(&self, statement: &str) {
        self.pool
            .execute(statement)
            .await
            .expect("Failed to execute statement");
    }
}

impl Drop for PgDatabase {
    fn drop(&mut self) {
        tokio::task::block_in_place(|| {
            Handle::current().block_on(async {
                self.pool.close().await;
                drop_pg_database(&self.config).await;
            });
        });
    }
}

/// Creates the database named by `config` and returns a pool connected to it.
///
/// # Panics
/// Panics if connection or database creation fails.
pub async fn create_pg_database(config: &PgConnectionConfig) -> PgPool {
    let mut connection = PgConnection::connect_with(&config.without_db())
        .await
        .expect("Failed to connect to Postgres");
    connection
        .execute(&*format!(r#"create database "{}";"#, config.name))
        .await
        .expect("Failed to create database");

    PgPool::connect_with(config.with_db())
        .await
        .expect("Failed to connect to Postgres")
}

/// Terminates the connections to the database named by `config` and drops it.
///
/// # Panics
/// Panics if any database operation fails.
pub async fn drop_pg_database(config: &PgConnectionConfig) {
    let mut connection = PgConnection::connect_with(&config.without_db())
        .await
        .expect("Failed to connect to Postgres");

    connection
        .execute(&*format!(
            r#"
            select pg_terminate_backend(pg_stat_activity.pid)
            from pg_stat_activity
            where pg_stat_activity.datname = '{}'
            and pid <> pg_backend_pid();"#,
            config.name
        ))
        .await
        .expect("Failed to terminate database connections");

    connection
        .execute(&*format!(r#"drop database if exists "{}";"#, config.name))
        .await
        .expect("Failed to destroy database");
}
