use crate::domain::{models::package_override::PackageOverride, ports::PackageOverrideRepository};
use crate::error::AppError;
use async_trait::async_trait;
use sqlx::SqlitePool;
use chrono::NaiveDate;

pub struct SqlitePackageOverrideRepo {
    pool: SqlitePool,
}

impl SqlitePackageOverrideRepo {
    pub fn new(pool: SqlitePool) -> Self { Self { pool } }
}

#[async_trait]
impl PackageOverrideRepository for SqlitePackageOverrideRepo {
    async fn upsert(&self, entity: &PackageOverride) -> Result<PackageOverride, AppError> {
        sqlx::query_as::<_, PackageOverride>(
            r#"INSERT INTO package_overrides (id, package_id, date, is_blocked, override_slots, reason, created_at)
               VALUES (?, ?, ?, ?, ?, ?, ?)
               ON CONFLICT(package_id, date) DO UPDATE SET
               is_blocked=excluded.is_blocked,
               override_slots=excluded.override_slots,
               reason=excluded.reason
               RETURNING *"#
        )
            .bind(&entity.id)
            .bind(entity.package_id)
            .bind(entity.date)
            .bind(entity.is_blocked)
            .bind(entity.override_slots)
            .bind(&entity.reason)
            .bind(entity.created_at)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn list_by_range(&self, package_id: i64, start: NaiveDate, end: NaiveDate) -> Result<Vec<PackageOverride>, AppError> {
        sqlx::query_as::<_, PackageOverride>(
            "SELECT * FROM package_overrides WHERE package_id = ? AND date >= ? AND date <= ? ORDER BY date ASC"
        )
            .bind(package_id)
            .bind(start)
            .bind(end)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn delete(&self, package_id: i64, date: NaiveDate) -> Result<(), AppError> {
        let res = sqlx::query("DELETE FROM package_overrides WHERE package_id = ? AND date = ?")
            .bind(package_id)
            .bind(date)
            .execute(&self.pool)
            .await
            .map_err(AppError::Database)?;

        if res.rows_affected() == 0 {
            return Err(AppError::NotFound("Override not found".into()));
        }
        Ok(())
    }
}
