//! Per-tenant studio settings.

use sqlx::SqlitePool;

use crate::error::Result;
use crate::models::StudioSettings;

/// Get the settings row for a tenant, if one exists.
pub async fn get(pool: &SqlitePool, tenant_id: &str) -> Result<Option<StudioSettings>> {
    let settings = sqlx::query_as::<_, StudioSettings>(
        r#"
        SELECT *
        FROM settings
        WHERE tenant_id = ?
        "#,
    )
    .bind(tenant_id)
    .fetch_optional(pool)
    .await?;

    Ok(settings)
}

/// Insert or replace a tenant's settings row.
pub async fn upsert(pool: &SqlitePool, settings: &StudioSettings) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO settings (
            tenant_id, timezone,
            buffer_before_minutes, buffer_after_minutes,
            home_buffer_before_minutes, home_buffer_after_minutes,
            currency, updated_at
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(tenant_id) DO UPDATE SET
            timezone = excluded.timezone,
            buffer_before_minutes = excluded.buffer_before_minutes,
            buffer_after_minutes = excluded.buffer_after_minutes,
            home_buffer_before_minutes = excluded.home_buffer_before_minutes,
            home_buffer_after_minutes = excluded.home_buffer_after_minutes,
            currency = excluded.currency,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(&settings.tenant_id)
    .bind(&settings.timezone)
    .bind(settings.buffer_before_minutes)
    .bind(settings.buffer_after_minutes)
    .bind(settings.home_buffer_before_minutes)
    .bind(settings.home_buffer_after_minutes)
    .bind(&settings.currency)
    .bind(&settings.updated_at)
    .execute(pool)
    .await?;

    Ok(())
}
