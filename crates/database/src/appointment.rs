//! Appointment operations.
//!
//! Appointments are never hard-deleted; cancellation and no-show are status
//! transitions so the history stays auditable.

use booking_core::AppointmentStatus;
use sqlx::SqlitePool;

use crate::error::{DatabaseError, Result};
use crate::models::Appointment;

/// Create a new appointment.
pub async fn create(pool: &SqlitePool, appointment: &Appointment) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO appointments (
            id, tenant_id, client_id, service_id, starts_at,
            total_duration_minutes, status, payment_status,
            price, price_override, is_home_visit,
            displacement_fee, displacement_km,
            timer_status, timer_started_at, timer_paused_at,
            paused_total_seconds, planned_seconds, actual_seconds,
            created_at, updated_at
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&appointment.id)
    .bind(&appointment.tenant_id)
    .bind(&appointment.client_id)
    .bind(&appointment.service_id)
    .bind(&appointment.starts_at)
    .bind(appointment.total_duration_minutes)
    .bind(&appointment.status)
    .bind(&appointment.payment_status)
    .bind(appointment.price)
    .bind(appointment.price_override)
    .bind(appointment.is_home_visit)
    .bind(appointment.displacement_fee)
    .bind(appointment.displacement_km)
    .bind(&appointment.timer_status)
    .bind(&appointment.timer_started_at)
    .bind(&appointment.timer_paused_at)
    .bind(appointment.paused_total_seconds)
    .bind(appointment.planned_seconds)
    .bind(appointment.actual_seconds)
    .bind(&appointment.created_at)
    .bind(&appointment.updated_at)
    .execute(pool)
    .await
    .map_err(|e| {
        if let sqlx::Error::Database(ref db_err) = e {
            if db_err.is_unique_violation() {
                return DatabaseError::AlreadyExists {
                    entity: "Appointment",
                    id: appointment.id.clone(),
                };
            }
        }
        DatabaseError::Sqlx(e)
    })?;

    Ok(())
}

/// Get an appointment by ID.
pub async fn get(pool: &SqlitePool, tenant_id: &str, id: &str) -> Result<Appointment> {
    sqlx::query_as::<_, Appointment>(
        r#"
        SELECT *
        FROM appointments
        WHERE tenant_id = ? AND id = ?
        "#,
    )
    .bind(tenant_id)
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DatabaseError::NotFound {
        entity: "Appointment",
        id: id.to_string(),
    })
}

/// List non-canceled appointments starting inside `[from, to)` (stored
/// RFC 3339 UTC bounds), ordered chronologically.
pub async fn list_between(
    pool: &SqlitePool,
    tenant_id: &str,
    from: &str,
    to: &str,
) -> Result<Vec<Appointment>> {
    let rows = sqlx::query_as::<_, Appointment>(
        r#"
        SELECT *
        FROM appointments
        WHERE tenant_id = ? AND starts_at >= ? AND starts_at < ?
          AND status NOT IN (?, ?)
        ORDER BY starts_at
        "#,
    )
    .bind(tenant_id)
    .bind(from)
    .bind(to)
    .bind(AppointmentStatus::CanceledByClient.as_str())
    .bind(AppointmentStatus::CanceledByStudio.as_str())
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Update the scheduled start and planned duration.
pub async fn update_schedule(
    pool: &SqlitePool,
    tenant_id: &str,
    id: &str,
    starts_at: &str,
    total_duration_minutes: i64,
    updated_at: &str,
) -> Result<()> {
    let result = sqlx::query(
        r#"
        UPDATE appointments
        SET starts_at = ?, total_duration_minutes = ?, updated_at = ?
        WHERE tenant_id = ? AND id = ?
        "#,
    )
    .bind(starts_at)
    .bind(total_duration_minutes)
    .bind(updated_at)
    .bind(tenant_id)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound {
            entity: "Appointment",
            id: id.to_string(),
        });
    }

    Ok(())
}

/// Transition the lifecycle status.
pub async fn set_status(
    pool: &SqlitePool,
    tenant_id: &str,
    id: &str,
    status: &str,
    updated_at: &str,
) -> Result<()> {
    let result = sqlx::query(
        r#"
        UPDATE appointments
        SET status = ?, updated_at = ?
        WHERE tenant_id = ? AND id = ?
        "#,
    )
    .bind(status)
    .bind(updated_at)
    .bind(tenant_id)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound {
            entity: "Appointment",
            id: id.to_string(),
        });
    }

    Ok(())
}

/// Write the derived aggregate payment status. Only the reconciliation
/// service calls this.
pub async fn set_payment_status(
    pool: &SqlitePool,
    tenant_id: &str,
    id: &str,
    payment_status: &str,
    updated_at: &str,
) -> Result<()> {
    let result = sqlx::query(
        r#"
        UPDATE appointments
        SET payment_status = ?, updated_at = ?
        WHERE tenant_id = ? AND id = ?
        "#,
    )
    .bind(payment_status)
    .bind(updated_at)
    .bind(tenant_id)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound {
            entity: "Appointment",
            id: id.to_string(),
        });
    }

    Ok(())
}

/// Override the charged price. Passing `None` clears the override.
pub async fn set_price_override(
    pool: &SqlitePool,
    tenant_id: &str,
    id: &str,
    price_override: Option<f64>,
    updated_at: &str,
) -> Result<()> {
    let result = sqlx::query(
        r#"
        UPDATE appointments
        SET price_override = ?, updated_at = ?
        WHERE tenant_id = ? AND id = ?
        "#,
    )
    .bind(price_override)
    .bind(updated_at)
    .bind(tenant_id)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound {
            entity: "Appointment",
            id: id.to_string(),
        });
    }

    Ok(())
}

/// Persisted fields of the attendance session clock.
#[derive(Debug, Clone, Default)]
pub struct TimerColumns {
    pub timer_status: String,
    pub timer_started_at: Option<String>,
    pub timer_paused_at: Option<String>,
    pub paused_total_seconds: i64,
    pub actual_seconds: Option<i64>,
}

/// Persist a timer transition.
pub async fn update_timer(
    pool: &SqlitePool,
    tenant_id: &str,
    id: &str,
    timer: &TimerColumns,
    updated_at: &str,
) -> Result<()> {
    let result = sqlx::query(
        r#"
        UPDATE appointments
        SET timer_status = ?, timer_started_at = ?, timer_paused_at = ?,
            paused_total_seconds = ?, actual_seconds = ?, updated_at = ?
        WHERE tenant_id = ? AND id = ?
        "#,
    )
    .bind(&timer.timer_status)
    .bind(&timer.timer_started_at)
    .bind(&timer.timer_paused_at)
    .bind(timer.paused_total_seconds)
    .bind(timer.actual_seconds)
    .bind(updated_at)
    .bind(tenant_id)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound {
            entity: "Appointment",
            id: id.to_string(),
        });
    }

    Ok(())
}
