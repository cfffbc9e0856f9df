use crate::config::DatabaseConfig;
use crate::errors::error::AppError;
use crate::log_info;
use diesel_async::pg::AsyncPgConnection;
use diesel_async::pooled_connection::AsyncDieselConnectionManager;
use diesel_async::pooled_connection::bb8::{Pool, PooledConnection};
use std::time::Duration;

// 异步池类型
pub type AsyncDbPool = Pool<AsyncPgConnection>;
pub type DbConnection<'a> = PooledConnection<'a, AsyncPgConnection>;

pub fn database_url(config: &DatabaseConfig) -> String {
    format!(
        "postgresql://{}:{}@{}:{}/{}",
        config.username, config.password, config.host, config.port, config.database_name
    )
}

/// 建池后立即取一次连接，库不可达/凭据错误在启动阶段直接失败
pub async fn create_async_db_pool(config: &DatabaseConfig) -> Result<AsyncDbPool, AppError> {
    let manager = AsyncDieselConnectionManager::<AsyncPgConnection>::new(database_url(config));
    let pool = Pool::builder()
        .max_size(config.max_connections)
        .min_idle(Some(config.min_connections))
        .connection_timeout(Duration::from_secs(config.connect_timeout_seconds))
        .idle_timeout(Some(Duration::from_secs(config.idle_timeout_seconds)))
        .build(manager)
        .await
        .map_err(|e| AppError::ConnectionPool(e.to_string()))?;

    {
        let _conn = pool
            .get()
            .await
            .map_err(|e| AppError::ConnectionPool(e.to_string()))?;
    }
    log_info!(
        "Postgres pool ready: {}:{}/{} (max {})",
        config.host,
        config.port,
        config.database_name,
        config.max_connections
    );

    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn database_url_is_built_from_parts() {
        let config = DatabaseConfig {
            host: "db".into(),
            port: 6543,
            database_name: "solvable".into(),
            username: "svc".into(),
            password: "secret".into(),
            max_connections: 4,
            min_connections: 1,
            connect_timeout_seconds: 5,
            idle_timeout_seconds: 60,
        };
        assert_eq!(
            database_url(&config),
            "postgresql://svc:secret@db:6543/solvable"
        );
    }
}
