//! Manually-declared unavailable intervals.
//!
//! Blocks do not overlap-merge automatically; callers query the existing
//! blocks before inserting to avoid duplicates.

use sqlx::SqlitePool;

use crate::error::{DatabaseError, Result};
use crate::models::AvailabilityBlock;

/// Create a block.
pub async fn create(pool: &SqlitePool, block: &AvailabilityBlock) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO availability_blocks (id, tenant_id, starts_at, ends_at, kind, created_at)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&block.id)
    .bind(&block.tenant_id)
    .bind(&block.starts_at)
    .bind(&block.ends_at)
    .bind(&block.kind)
    .bind(&block.created_at)
    .execute(pool)
    .await
    .map_err(|e| {
        if let sqlx::Error::Database(ref db_err) = e {
            if db_err.is_unique_violation() {
                return DatabaseError::AlreadyExists {
                    entity: "AvailabilityBlock",
                    id: block.id.clone(),
                };
            }
        }
        DatabaseError::Sqlx(e)
    })?;

    Ok(())
}

/// List blocks whose half-open interval intersects `[from, to)`.
pub async fn list_overlapping(
    pool: &SqlitePool,
    tenant_id: &str,
    from: &str,
    to: &str,
) -> Result<Vec<AvailabilityBlock>> {
    let rows = sqlx::query_as::<_, AvailabilityBlock>(
        r#"
        SELECT *
        FROM availability_blocks
        WHERE tenant_id = ? AND starts_at < ? AND ends_at > ?
        ORDER BY starts_at
        "#,
    )
    .bind(tenant_id)
    .bind(to)
    .bind(from)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Bulk-delete blocks starting inside `[from, to)`. Returns the number of
/// deleted rows.
pub async fn delete_between(
    pool: &SqlitePool,
    tenant_id: &str,
    from: &str,
    to: &str,
) -> Result<u64> {
    let result = sqlx::query(
        r#"
        DELETE FROM availability_blocks
        WHERE tenant_id = ? AND starts_at >= ? AND starts_at < ?
        "#,
    )
    .bind(tenant_id)
    .bind(from)
    .bind(to)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}
