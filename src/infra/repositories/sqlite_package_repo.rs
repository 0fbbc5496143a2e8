use crate::domain::{models::package::Package, ports::PackageRepository};
use crate::error::AppError;
use async_trait::async_trait;
use sqlx::SqlitePool;

pub struct SqlitePackageRepo {
    pool: SqlitePool,
}

impl SqlitePackageRepo {
    pub fn new(pool: SqlitePool) -> Self { Self { pool } }
}

#[async_trait]
impl PackageRepository for SqlitePackageRepo {
    async fn create(&self, package: &Package) -> Result<Package, AppError> {
        sqlx::query_as::<_, Package>(
            r#"INSERT INTO packages (planner_id, name, default_slots, preparation_days, base_price, created_at)
               VALUES (?, ?, ?, ?, ?, ?)
               RETURNING *"#
        )
            .bind(&package.planner_id)
            .bind(&package.name)
            .bind(package.default_slots)
            .bind(package.preparation_days)
            .bind(package.base_price)
            .bind(package.created_at)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Package>, AppError> {
        sqlx::query_as::<_, Package>("SELECT * FROM packages WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }
}
