//! Service catalog operations.

use sqlx::SqlitePool;

use crate::error::{DatabaseError, Result};
use crate::models::Service;

/// Create a new service.
pub async fn create(pool: &SqlitePool, service: &Service) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO services (
            id, tenant_id, name, duration_minutes, price,
            buffer_before_minutes, buffer_after_minutes,
            home_buffer_before_minutes, home_buffer_after_minutes,
            active, created_at
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&service.id)
    .bind(&service.tenant_id)
    .bind(&service.name)
    .bind(service.duration_minutes)
    .bind(service.price)
    .bind(service.buffer_before_minutes)
    .bind(service.buffer_after_minutes)
    .bind(service.home_buffer_before_minutes)
    .bind(service.home_buffer_after_minutes)
    .bind(service.active)
    .bind(&service.created_at)
    .execute(pool)
    .await
    .map_err(|e| {
        if let sqlx::Error::Database(ref db_err) = e {
            if db_err.is_unique_violation() {
                return DatabaseError::AlreadyExists {
                    entity: "Service",
                    id: service.id.clone(),
                };
            }
        }
        DatabaseError::Sqlx(e)
    })?;

    Ok(())
}

/// Get a service by ID.
pub async fn get(pool: &SqlitePool, tenant_id: &str, id: &str) -> Result<Service> {
    sqlx::query_as::<_, Service>(
        r#"
        SELECT *
        FROM services
        WHERE tenant_id = ? AND id = ?
        "#,
    )
    .bind(tenant_id)
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DatabaseError::NotFound {
        entity: "Service",
        id: id.to_string(),
    })
}

/// List active services for a tenant.
pub async fn list_active(pool: &SqlitePool, tenant_id: &str) -> Result<Vec<Service>> {
    let services = sqlx::query_as::<_, Service>(
        r#"
        SELECT *
        FROM services
        WHERE tenant_id = ? AND active = 1
        ORDER BY name
        "#,
    )
    .bind(tenant_id)
    .fetch_all(pool)
    .await?;

    Ok(services)
}

/// Update an existing service.
pub async fn update(pool: &SqlitePool, service: &Service) -> Result<()> {
    let result = sqlx::query(
        r#"
        UPDATE services
        SET name = ?, duration_minutes = ?, price = ?,
            buffer_before_minutes = ?, buffer_after_minutes = ?,
            home_buffer_before_minutes = ?, home_buffer_after_minutes = ?,
            active = ?
        WHERE tenant_id = ? AND id = ?
        "#,
    )
    .bind(&service.name)
    .bind(service.duration_minutes)
    .bind(service.price)
    .bind(service.buffer_before_minutes)
    .bind(service.buffer_after_minutes)
    .bind(service.home_buffer_before_minutes)
    .bind(service.home_buffer_after_minutes)
    .bind(service.active)
    .bind(&service.tenant_id)
    .bind(&service.id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound {
            entity: "Service",
            id: service.id.clone(),
        });
    }

    Ok(())
}
