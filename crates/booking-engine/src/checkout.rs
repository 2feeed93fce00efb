//! Checkout recomputation and discounts.
//!
//! Checkout rows are derived, never entered: any time the items or the
//! discount change the totals are recomputed from scratch and the payment
//! status re-reconciled. The discount is capped at the subtotal and the
//! total floored at zero by the core calculator.

use booking_core::{round2, time::to_storage, compute_totals, DiscountType, LineItem};
use chrono::Utc;
use database::{Checkout, CheckoutItem, Database};
use uuid::Uuid;

use crate::error::{EngineError, Result};
use crate::reconcile::{recalculate_payment_status, RecalcTrigger, Recalculation};

/// Line item kinds accepted on a checkout.
pub const ITEM_KINDS: [&str; 4] = ["service", "fee", "addon", "adjustment"];

/// Insufficient payment message surfaced on confirmation.
pub const INSUFFICIENT_PAYMENT: &str = "pagamento insuficiente";

/// Recompute a checkout's totals from its items and stored discount, then
/// reconcile the payment status.
///
/// An appointment without items totals to its price override or price, so
/// checkouts created before any item editing still carry the right charge.
pub async fn recompute_checkout(
    db: &Database,
    tenant_id: &str,
    appointment_id: &str,
) -> Result<Recalculation> {
    let appointment = database::appointment::get(db.pool(), tenant_id, appointment_id).await?;
    let existing = database::checkout::get(db.pool(), tenant_id, appointment_id).await?;
    let items =
        database::checkout_item::list_for_appointment(db.pool(), tenant_id, appointment_id).await?;

    let lines: Vec<LineItem> = if items.is_empty() {
        vec![LineItem {
            amount: appointment.price_override.unwrap_or(appointment.price),
            qty: None,
        }]
    } else {
        items
            .iter()
            .map(|item| LineItem {
                amount: item.amount,
                qty: Some(item.qty),
            })
            .collect()
    };

    let discount_type = existing
        .as_ref()
        .and_then(|checkout| checkout.discount_type.as_deref())
        .map(|value| {
            value
                .parse::<DiscountType>()
                .map_err(|e| EngineError::Validation(e.to_string()))
        })
        .transpose()?;
    let discount_value = existing
        .as_ref()
        .and_then(|checkout| checkout.discount_value)
        .unwrap_or(0.0);

    let totals = compute_totals(&lines, discount_type, discount_value);

    database::checkout::upsert(
        db.pool(),
        &Checkout {
            appointment_id: appointment_id.to_string(),
            tenant_id: tenant_id.to_string(),
            subtotal: round2(totals.subtotal),
            total: round2(totals.total),
            discount_type: existing.as_ref().and_then(|c| c.discount_type.clone()),
            discount_value: existing.as_ref().and_then(|c| c.discount_value),
            discount_reason: existing.as_ref().and_then(|c| c.discount_reason.clone()),
            confirmed_at: existing.as_ref().and_then(|c| c.confirmed_at.clone()),
            updated_at: to_storage(Utc::now()),
        },
    )
    .await?;

    recalculate_payment_status(db, tenant_id, appointment_id, RecalcTrigger::TotalsChanged).await
}

/// Store a discount on the checkout and recompute.
pub async fn apply_discount(
    db: &Database,
    tenant_id: &str,
    appointment_id: &str,
    discount_type: Option<DiscountType>,
    discount_value: f64,
    reason: Option<String>,
) -> Result<Recalculation> {
    if discount_value < 0.0 || !discount_value.is_finite() {
        return Err(EngineError::Validation(
            "discount value must be a non-negative amount".to_string(),
        ));
    }
    if discount_type == Some(DiscountType::Pct) && discount_value > 100.0 {
        return Err(EngineError::Validation(
            "percentage discount cannot exceed 100".to_string(),
        ));
    }

    let appointment = database::appointment::get(db.pool(), tenant_id, appointment_id).await?;
    let existing = database::checkout::get(db.pool(), tenant_id, appointment_id).await?;

    database::checkout::upsert(
        db.pool(),
        &Checkout {
            appointment_id: appointment_id.to_string(),
            tenant_id: tenant_id.to_string(),
            subtotal: existing.as_ref().map(|c| c.subtotal).unwrap_or(appointment.price),
            total: existing.as_ref().map(|c| c.total).unwrap_or(appointment.price),
            discount_type: discount_type.map(|t| t.as_str().to_string()),
            discount_value: discount_type.map(|_| discount_value),
            discount_reason: reason,
            confirmed_at: existing.as_ref().and_then(|c| c.confirmed_at.clone()),
            updated_at: to_storage(Utc::now()),
        },
    )
    .await?;

    recompute_checkout(db, tenant_id, appointment_id).await
}

/// Add a line item and recompute.
pub async fn add_item(
    db: &Database,
    tenant_id: &str,
    appointment_id: &str,
    kind: &str,
    label: &str,
    qty: f64,
    amount: f64,
) -> Result<CheckoutItem> {
    if !ITEM_KINDS.contains(&kind) {
        return Err(EngineError::Validation(format!(
            "unknown checkout item kind: {kind}"
        )));
    }
    if qty <= 0.0 || !qty.is_finite() {
        return Err(EngineError::Validation(
            "item quantity must be positive".to_string(),
        ));
    }
    if !amount.is_finite() {
        return Err(EngineError::Validation(
            "item amount must be a number".to_string(),
        ));
    }

    database::appointment::get(db.pool(), tenant_id, appointment_id).await?;

    let existing =
        database::checkout_item::list_for_appointment(db.pool(), tenant_id, appointment_id).await?;
    let sort_order = existing.iter().map(|item| item.sort_order + 1).max().unwrap_or(0);

    let item = CheckoutItem {
        id: Uuid::new_v4().to_string(),
        tenant_id: tenant_id.to_string(),
        appointment_id: appointment_id.to_string(),
        kind: kind.to_string(),
        label: label.to_string(),
        qty,
        amount,
        sort_order,
    };
    database::checkout_item::insert(db.pool(), &item).await?;

    recompute_checkout(db, tenant_id, appointment_id).await?;
    Ok(item)
}

/// Remove a line item and recompute.
pub async fn remove_item(
    db: &Database,
    tenant_id: &str,
    appointment_id: &str,
    item_id: &str,
) -> Result<Recalculation> {
    database::checkout_item::delete(db.pool(), tenant_id, item_id).await?;
    recompute_checkout(db, tenant_id, appointment_id).await
}

/// Confirm the checkout. Confirmation requires the derived payment status to
/// be settled (paid or waived); anything open is an error the attendant must
/// resolve first.
pub async fn confirm_checkout(db: &Database, tenant_id: &str, appointment_id: &str) -> Result<()> {
    let recalculation = recompute_checkout(db, tenant_id, appointment_id).await?;

    if !recalculation.next_status.is_settled() {
        return Err(EngineError::Validation(INSUFFICIENT_PAYMENT.to_string()));
    }

    database::checkout::confirm(
        db.pool(),
        tenant_id,
        appointment_id,
        &to_storage(Utc::now()),
    )
    .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payments::record_manual_payment;
    use crate::testutil::{seed_appointment, seed_service, seed_settings, test_db, utc, TENANT};
    use booking_core::{PaymentMethod, PaymentStatus};

    async fn setup() -> Database {
        let db = test_db().await;
        seed_settings(&db).await;
        seed_service(&db, "svc-1", 60, 150.0, None, None).await;
        seed_appointment(&db, "appt-1", "svc-1", utc(2025, 6, 2, 13, 0), false).await;
        db
    }

    #[tokio::test]
    async fn test_recompute_without_items_uses_price() {
        let db = setup().await;

        let rec = recompute_checkout(&db, TENANT, "appt-1").await.unwrap();
        assert_eq!(rec.total, 150.0);

        let checkout = database::checkout::get(db.pool(), TENANT, "appt-1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(checkout.subtotal, 150.0);
        assert_eq!(checkout.total, 150.0);
    }

    #[tokio::test]
    async fn test_items_and_discount_flow() {
        let db = setup().await;

        add_item(&db, TENANT, "appt-1", "service", "Sessão", 1.0, 150.0)
            .await
            .unwrap();
        add_item(&db, TENANT, "appt-1", "addon", "Produto", 2.0, 25.0)
            .await
            .unwrap();

        let rec = apply_discount(
            &db,
            TENANT,
            "appt-1",
            Some(DiscountType::Pct),
            10.0,
            Some("fidelidade".to_string()),
        )
        .await
        .unwrap();
        // 150 + 2x25 = 200; 10% off = 180.
        assert_eq!(rec.total, 180.0);

        // Oversized flat discount clamps to zero, never negative.
        let rec = apply_discount(&db, TENANT, "appt-1", Some(DiscountType::Value), 250.0, None)
            .await
            .unwrap();
        assert_eq!(rec.total, 0.0);
        assert_eq!(rec.next_status, PaymentStatus::Paid);
    }

    #[tokio::test]
    async fn test_discount_validation() {
        let db = setup().await;

        assert!(matches!(
            apply_discount(&db, TENANT, "appt-1", Some(DiscountType::Value), -5.0, None).await,
            Err(EngineError::Validation(_))
        ));
        assert!(matches!(
            apply_discount(&db, TENANT, "appt-1", Some(DiscountType::Pct), 150.0, None).await,
            Err(EngineError::Validation(_))
        ));
        assert!(matches!(
            add_item(&db, TENANT, "appt-1", "gift", "x", 1.0, 10.0).await,
            Err(EngineError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_confirm_requires_settled_payment() {
        let db = setup().await;

        let err = confirm_checkout(&db, TENANT, "appt-1").await.unwrap_err();
        match err {
            EngineError::Validation(message) => assert_eq!(message, INSUFFICIENT_PAYMENT),
            other => panic!("expected validation error, got {other:?}"),
        }

        record_manual_payment(&db, TENANT, "appt-1", PaymentMethod::Cash, 150.0)
            .await
            .unwrap();
        confirm_checkout(&db, TENANT, "appt-1").await.unwrap();

        let checkout = database::checkout::get(db.pool(), TENANT, "appt-1")
            .await
            .unwrap()
            .unwrap();
        assert!(checkout.confirmed_at.is_some());
    }

    #[tokio::test]
    async fn test_remove_item_recomputes() {
        let db = setup().await;

        let item = add_item(&db, TENANT, "appt-1", "addon", "Produto", 1.0, 50.0)
            .await
            .unwrap();
        let rec = remove_item(&db, TENANT, "appt-1", &item.id).await.unwrap();
        // No items left: totals fall back to the appointment price.
        assert_eq!(rec.total, 150.0);
    }
}
