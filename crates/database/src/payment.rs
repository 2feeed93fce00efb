//! Payment rows.
//!
//! Payments are append-and-update: a provider-confirmed payment is keyed by
//! `(tenant_id, provider_ref)` and updated in place as the gateway reports
//! state changes. Rows are never deleted.

use booking_core::PaymentState;
use sqlx::SqlitePool;

use crate::error::{DatabaseError, Result};
use crate::models::Payment;

/// Insert a payment row.
pub async fn insert(pool: &SqlitePool, payment: &Payment) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO payments (
            id, tenant_id, appointment_id, method, amount, status,
            provider_ref, provider_order_id, point_terminal_id,
            card_mode, payment_method_id, installments, raw_payload,
            created_at, updated_at
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&payment.id)
    .bind(&payment.tenant_id)
    .bind(&payment.appointment_id)
    .bind(&payment.method)
    .bind(payment.amount)
    .bind(&payment.status)
    .bind(&payment.provider_ref)
    .bind(&payment.provider_order_id)
    .bind(&payment.point_terminal_id)
    .bind(&payment.card_mode)
    .bind(&payment.payment_method_id)
    .bind(payment.installments)
    .bind(&payment.raw_payload)
    .bind(&payment.created_at)
    .bind(&payment.updated_at)
    .execute(pool)
    .await
    .map_err(|e| {
        if let sqlx::Error::Database(ref db_err) = e {
            if db_err.is_unique_violation() {
                return DatabaseError::AlreadyExists {
                    entity: "Payment",
                    id: payment.id.clone(),
                };
            }
        }
        DatabaseError::Sqlx(e)
    })?;

    Ok(())
}

/// Upsert a provider-confirmed payment keyed by `(tenant_id, provider_ref)`.
///
/// Re-processing the same provider payment updates amount, status and raw
/// payload in place. Metadata the update omits (terminal id, card mode,
/// payment-method id, installments) keeps its previously known value rather
/// than regressing to null. Rows without a provider ref are plain inserts.
pub async fn upsert_by_provider_ref(pool: &SqlitePool, payment: &Payment) -> Result<()> {
    let Some(provider_ref) = payment.provider_ref.as_deref() else {
        return insert(pool, payment).await;
    };

    let result = sqlx::query(
        r#"
        UPDATE payments
        SET amount = ?,
            status = ?,
            raw_payload = COALESCE(?, raw_payload),
            provider_order_id = COALESCE(?, provider_order_id),
            point_terminal_id = COALESCE(?, point_terminal_id),
            card_mode = COALESCE(?, card_mode),
            payment_method_id = COALESCE(?, payment_method_id),
            installments = COALESCE(?, installments),
            updated_at = ?
        WHERE tenant_id = ? AND provider_ref = ?
        "#,
    )
    .bind(payment.amount)
    .bind(&payment.status)
    .bind(&payment.raw_payload)
    .bind(&payment.provider_order_id)
    .bind(&payment.point_terminal_id)
    .bind(&payment.card_mode)
    .bind(&payment.payment_method_id)
    .bind(payment.installments)
    .bind(&payment.updated_at)
    .bind(&payment.tenant_id)
    .bind(provider_ref)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return insert(pool, payment).await;
    }

    Ok(())
}

/// Get a payment by its provider reference.
pub async fn get_by_provider_ref(
    pool: &SqlitePool,
    tenant_id: &str,
    provider_ref: &str,
) -> Result<Payment> {
    sqlx::query_as::<_, Payment>(
        r#"
        SELECT *
        FROM payments
        WHERE tenant_id = ? AND provider_ref = ?
        "#,
    )
    .bind(tenant_id)
    .bind(provider_ref)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DatabaseError::NotFound {
        entity: "Payment",
        id: provider_ref.to_string(),
    })
}

/// List all payment attempts for an appointment, oldest first.
pub async fn list_for_appointment(
    pool: &SqlitePool,
    tenant_id: &str,
    appointment_id: &str,
) -> Result<Vec<Payment>> {
    let rows = sqlx::query_as::<_, Payment>(
        r#"
        SELECT *
        FROM payments
        WHERE tenant_id = ? AND appointment_id = ?
        ORDER BY created_at, id
        "#,
    )
    .bind(tenant_id)
    .bind(appointment_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Sum of the appointment's paid payments. Pending and failed attempts do
/// not count.
pub async fn sum_paid(pool: &SqlitePool, tenant_id: &str, appointment_id: &str) -> Result<f64> {
    let sum = sqlx::query_scalar::<_, Option<f64>>(
        r#"
        SELECT SUM(amount)
        FROM payments
        WHERE tenant_id = ? AND appointment_id = ? AND status = ?
        "#,
    )
    .bind(tenant_id)
    .bind(appointment_id)
    .bind(PaymentState::Paid.as_str())
    .fetch_one(pool)
    .await?;

    Ok(sum.unwrap_or(0.0))
}
