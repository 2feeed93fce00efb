//! Checkout rows, 1:1 with appointments.

use sqlx::SqlitePool;

use crate::error::{DatabaseError, Result};
use crate::models::Checkout;

/// Get the checkout for an appointment, if one exists.
pub async fn get(pool: &SqlitePool, tenant_id: &str, appointment_id: &str) -> Result<Option<Checkout>> {
    let checkout = sqlx::query_as::<_, Checkout>(
        r#"
        SELECT *
        FROM checkouts
        WHERE tenant_id = ? AND appointment_id = ?
        "#,
    )
    .bind(tenant_id)
    .bind(appointment_id)
    .fetch_optional(pool)
    .await?;

    Ok(checkout)
}

/// Insert or update the derived checkout row. Checkouts are recomputed, not
/// entered, so the write replaces every derived column.
pub async fn upsert(pool: &SqlitePool, checkout: &Checkout) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO checkouts (
            appointment_id, tenant_id, subtotal, total,
            discount_type, discount_value, discount_reason,
            confirmed_at, updated_at
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(appointment_id) DO UPDATE SET
            subtotal = excluded.subtotal,
            total = excluded.total,
            discount_type = excluded.discount_type,
            discount_value = excluded.discount_value,
            discount_reason = excluded.discount_reason,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(&checkout.appointment_id)
    .bind(&checkout.tenant_id)
    .bind(checkout.subtotal)
    .bind(checkout.total)
    .bind(&checkout.discount_type)
    .bind(checkout.discount_value)
    .bind(&checkout.discount_reason)
    .bind(&checkout.confirmed_at)
    .bind(&checkout.updated_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// Stamp the checkout as confirmed.
pub async fn confirm(
    pool: &SqlitePool,
    tenant_id: &str,
    appointment_id: &str,
    confirmed_at: &str,
) -> Result<()> {
    let result = sqlx::query(
        r#"
        UPDATE checkouts
        SET confirmed_at = ?, updated_at = ?
        WHERE tenant_id = ? AND appointment_id = ?
        "#,
    )
    .bind(confirmed_at)
    .bind(confirmed_at)
    .bind(tenant_id)
    .bind(appointment_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound {
            entity: "Checkout",
            id: appointment_id.to_string(),
        });
    }

    Ok(())
}
