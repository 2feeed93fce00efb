//! Checkout line items.

use sqlx::SqlitePool;

use crate::error::{DatabaseError, Result};
use crate::models::CheckoutItem;

/// Insert a line item.
pub async fn insert(pool: &SqlitePool, item: &CheckoutItem) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO checkout_items (id, tenant_id, appointment_id, kind, label, qty, amount, sort_order)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&item.id)
    .bind(&item.tenant_id)
    .bind(&item.appointment_id)
    .bind(&item.kind)
    .bind(&item.label)
    .bind(item.qty)
    .bind(item.amount)
    .bind(item.sort_order)
    .execute(pool)
    .await
    .map_err(|e| {
        if let sqlx::Error::Database(ref db_err) = e {
            if db_err.is_unique_violation() {
                return DatabaseError::AlreadyExists {
                    entity: "CheckoutItem",
                    id: item.id.clone(),
                };
            }
        }
        DatabaseError::Sqlx(e)
    })?;

    Ok(())
}

/// List the items of one appointment's checkout in display order.
pub async fn list_for_appointment(
    pool: &SqlitePool,
    tenant_id: &str,
    appointment_id: &str,
) -> Result<Vec<CheckoutItem>> {
    let rows = sqlx::query_as::<_, CheckoutItem>(
        r#"
        SELECT *
        FROM checkout_items
        WHERE tenant_id = ? AND appointment_id = ?
        ORDER BY sort_order, id
        "#,
    )
    .bind(tenant_id)
    .bind(appointment_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Delete one line item.
pub async fn delete(pool: &SqlitePool, tenant_id: &str, id: &str) -> Result<()> {
    let result = sqlx::query(
        r#"
        DELETE FROM checkout_items
        WHERE tenant_id = ? AND id = ?
        "#,
    )
    .bind(tenant_id)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound {
            entity: "CheckoutItem",
            id: id.to_string(),
        });
    }

    Ok(())
}

/// Replace all items of an appointment's checkout in one transaction.
pub async fn replace_for_appointment(
    pool: &SqlitePool,
    tenant_id: &str,
    appointment_id: &str,
    items: &[CheckoutItem],
) -> Result<()> {
    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"
        DELETE FROM checkout_items
        WHERE tenant_id = ? AND appointment_id = ?
        "#,
    )
    .bind(tenant_id)
    .bind(appointment_id)
    .execute(&mut *tx)
    .await?;

    for item in items {
        sqlx::query(
            r#"
            INSERT INTO checkout_items (id, tenant_id, appointment_id, kind, label, qty, amount, sort_order)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&item.id)
        .bind(&item.tenant_id)
        .bind(&item.appointment_id)
        .bind(&item.kind)
        .bind(&item.label)
        .bind(item.qty)
        .bind(item.amount)
        .bind(item.sort_order)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(())
}
