//! Business hours per weekday.

use sqlx::SqlitePool;

use crate::error::Result;
use crate::models::BusinessHours;

/// Get the hours row for one weekday (0-6, Sunday-based). A missing row
/// means the scheduling engine treats the day as closed.
pub async fn get_for_weekday(
    pool: &SqlitePool,
    tenant_id: &str,
    weekday: i64,
) -> Result<Option<BusinessHours>> {
    let hours = sqlx::query_as::<_, BusinessHours>(
        r#"
        SELECT *
        FROM business_hours
        WHERE tenant_id = ? AND weekday = ?
        "#,
    )
    .bind(tenant_id)
    .bind(weekday)
    .fetch_optional(pool)
    .await?;

    Ok(hours)
}

/// List all configured weekdays for a tenant.
pub async fn list(pool: &SqlitePool, tenant_id: &str) -> Result<Vec<BusinessHours>> {
    let rows = sqlx::query_as::<_, BusinessHours>(
        r#"
        SELECT *
        FROM business_hours
        WHERE tenant_id = ?
        ORDER BY weekday
        "#,
    )
    .bind(tenant_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Insert or replace the hours for one weekday.
pub async fn upsert(pool: &SqlitePool, hours: &BusinessHours) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO business_hours (tenant_id, weekday, open_time, close_time, closed)
        VALUES (?, ?, ?, ?, ?)
        ON CONFLICT(tenant_id, weekday) DO UPDATE SET
            open_time = excluded.open_time,
            close_time = excluded.close_time,
            closed = excluded.closed
        "#,
    )
    .bind(&hours.tenant_id)
    .bind(hours.weekday)
    .bind(&hours.open_time)
    .bind(&hours.close_time)
    .bind(hours.closed)
    .execute(pool)
    .await?;

    Ok(())
}
