use crate::database::diesel::{AsyncDbPool, DbConnection};
use crate::errors::error::AppError;
use diesel::result::Error as DieselError;

// 各仓储共用的连接获取与错误映射
#[derive(Clone)]
pub struct RepositoryBase {
    pool: AsyncDbPool,
}

impl RepositoryBase {
    pub fn new(pool: AsyncDbPool) -> Self {
        Self { pool }
    }

    pub async fn get_connection(&self) -> Result<DbConnection<'_>, AppError> {
        self.pool
            .get()
            .await
            .map_err(|e| AppError::ConnectionPool(e.to_string()))
    }

    /// 统一映射 Diesel 错误；违反约束时带上表名和约束名方便排查
    pub fn map_diesel_error(&self, e: DieselError) -> AppError {
        match e {
            DieselError::DatabaseError(kind, info) => {
                let detail = format!(
                    "{:?}: table={}, constraint={}, message={}",
                    kind,
                    info.table_name().unwrap_or("unknown"),
                    info.constraint_name().unwrap_or("unknown"),
                    info.message()
                );
                AppError::Internal(format!("Database error {}", detail))
            }
            other => AppError::DatabaseQuery(other),
        }
    }
}
