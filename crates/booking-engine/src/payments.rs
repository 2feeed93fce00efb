//! Payment orchestration over the gateway rails.
//!
//! Every path here records the payment row via the provider-ref upsert and
//! then hands off to reconciliation; nothing writes the appointment's
//! aggregate status directly. A gateway transport failure leaves the charge
//! outcome unknown: the row (if any) stays pending and the next poll
//! resolves it. Retrying a charge after a definite failure is the caller's
//! decision and requires a bumped attempt number.

use booking_core::{round2, time::to_storage, PaymentMethod, PaymentState};
use chrono::Utc;
use database::{Database, Payment};
use mpago_gateway::{CardCharge, NormalizedOrder, OrdersClient, PixCharge, PointCharge};
use tracing::info;
use uuid::Uuid;

use crate::error::{EngineError, Result};
use crate::reconcile::{recalculate_payment_status, RecalcTrigger, Recalculation};

/// Result of one charge or poll: the normalized gateway order plus the
/// reconciliation it triggered.
#[derive(Debug, Clone)]
pub struct ChargeOutcome {
    pub order: NormalizedOrder,
    pub recalculation: Recalculation,
}

fn require_positive_amount(amount: f64) -> Result<()> {
    if !(amount.is_finite() && amount > 0.0) {
        return Err(EngineError::Validation(
            "payment amount must be positive".to_string(),
        ));
    }
    Ok(())
}

/// Create a pix charge and record its pending payment. The returned order
/// carries the renderable code/QR and expiry for display.
pub async fn charge_pix(
    db: &Database,
    gateway: &OrdersClient,
    tenant_id: &str,
    appointment_id: &str,
    amount: f64,
    attempt: u32,
) -> Result<ChargeOutcome> {
    require_positive_amount(amount)?;
    database::appointment::get(db.pool(), tenant_id, appointment_id).await?;

    let order = gateway
        .create_pix_order(&PixCharge {
            appointment_id: appointment_id.to_string(),
            amount,
            attempt,
            description: None,
        })
        .await?;

    record_order_payment(db, tenant_id, appointment_id, PaymentMethod::Pix, amount, &order, None)
        .await?;
    let recalculation =
        recalculate_payment_status(db, tenant_id, appointment_id, RecalcTrigger::ChargeRecorded)
            .await?;

    Ok(ChargeOutcome {
        order,
        recalculation,
    })
}

/// Create an online card charge and record its result.
pub async fn charge_card(
    db: &Database,
    gateway: &OrdersClient,
    tenant_id: &str,
    charge: CardCharge,
) -> Result<ChargeOutcome> {
    require_positive_amount(charge.amount)?;
    database::appointment::get(db.pool(), tenant_id, &charge.appointment_id).await?;

    let order = gateway.create_card_order(&charge).await?;

    record_order_payment(
        db,
        tenant_id,
        &charge.appointment_id,
        PaymentMethod::Card,
        charge.amount,
        &order,
        None,
    )
    .await?;
    let recalculation = recalculate_payment_status(
        db,
        tenant_id,
        &charge.appointment_id,
        RecalcTrigger::ChargeRecorded,
    )
    .await?;

    Ok(ChargeOutcome {
        order,
        recalculation,
    })
}

/// Dispatch an in-person charge to a terminal and record the pending
/// payment. The terminal interaction happens out-of-band; the result must be
/// polled with [`poll_order`].
pub async fn charge_point(
    db: &Database,
    gateway: &OrdersClient,
    tenant_id: &str,
    charge: PointCharge,
) -> Result<ChargeOutcome> {
    require_positive_amount(charge.amount)?;
    database::appointment::get(db.pool(), tenant_id, &charge.appointment_id).await?;

    let order = gateway.create_point_order(&charge).await?;

    record_order_payment(
        db,
        tenant_id,
        &charge.appointment_id,
        PaymentMethod::Card,
        charge.amount,
        &order,
        Some(&charge),
    )
    .await?;
    let recalculation = recalculate_payment_status(
        db,
        tenant_id,
        &charge.appointment_id,
        RecalcTrigger::ChargeRecorded,
    )
    .await?;

    info!(
        "Dispatched point charge for {} to terminal {}",
        charge.appointment_id, charge.terminal_id
    );

    Ok(ChargeOutcome {
        order,
        recalculation,
    })
}

/// Poll an order and reconcile its current state into the ledger.
///
/// The order's echoed `external_reference` must match the expected
/// appointment: a shared terminal can carry several concurrent charges, and
/// accepting another appointment's result would corrupt the ledger.
pub async fn poll_order(
    db: &Database,
    gateway: &OrdersClient,
    tenant_id: &str,
    appointment_id: &str,
    order_id: &str,
) -> Result<ChargeOutcome> {
    database::appointment::get(db.pool(), tenant_id, appointment_id).await?;

    let order = gateway.get_order(order_id).await?;

    match order.external_reference.as_deref() {
        Some(reference) if reference == appointment_id => {}
        other => {
            return Err(EngineError::Conflict(format!(
                "order {} belongs to appointment {:?}, expected {}",
                order_id, other, appointment_id
            )));
        }
    }

    let method = infer_method(&order);
    let amount = order.amount.unwrap_or(0.0);
    record_order_payment(db, tenant_id, appointment_id, method, amount, &order, None).await?;

    let recalculation =
        recalculate_payment_status(db, tenant_id, appointment_id, RecalcTrigger::OrderPolled)
            .await?;

    Ok(ChargeOutcome {
        order,
        recalculation,
    })
}

/// Record a payment collected outside the gateway (cash, transfer received
/// directly, ...). Manual entries are paid by definition.
pub async fn record_manual_payment(
    db: &Database,
    tenant_id: &str,
    appointment_id: &str,
    method: PaymentMethod,
    amount: f64,
) -> Result<Recalculation> {
    require_positive_amount(amount)?;
    database::appointment::get(db.pool(), tenant_id, appointment_id).await?;

    let now = to_storage(Utc::now());
    database::payment::insert(
        db.pool(),
        &Payment {
            id: Uuid::new_v4().to_string(),
            tenant_id: tenant_id.to_string(),
            appointment_id: appointment_id.to_string(),
            method: method.as_str().to_string(),
            amount: round2(amount),
            status: PaymentState::Paid.as_str().to_string(),
            provider_ref: None,
            provider_order_id: None,
            point_terminal_id: None,
            card_mode: None,
            payment_method_id: None,
            installments: None,
            raw_payload: None,
            created_at: now.clone(),
            updated_at: now,
        },
    )
    .await?;

    recalculate_payment_status(db, tenant_id, appointment_id, RecalcTrigger::ManualPayment).await
}

/// Mark an appointment as exempt from collection. This is the one sanctioned
/// direct write of the aggregate status; the reducer keeps it sticky until
/// [`unwaive_payment`].
pub async fn waive_payment(db: &Database, tenant_id: &str, appointment_id: &str) -> Result<()> {
    database::appointment::get(db.pool(), tenant_id, appointment_id).await?;
    database::appointment::set_payment_status(
        db.pool(),
        tenant_id,
        appointment_id,
        booking_core::PaymentStatus::Waived.as_str(),
        &to_storage(Utc::now()),
    )
    .await?;

    info!("Waived payment for appointment {}", appointment_id);
    Ok(())
}

/// Release a waiver and re-derive the status from the actual payment rows.
pub async fn unwaive_payment(
    db: &Database,
    tenant_id: &str,
    appointment_id: &str,
) -> Result<Recalculation> {
    let appointment = database::appointment::get(db.pool(), tenant_id, appointment_id).await?;
    if appointment.payment_status != booking_core::PaymentStatus::Waived.as_str() {
        return Err(EngineError::Validation(
            "appointment payment is not waived".to_string(),
        ));
    }

    database::appointment::set_payment_status(
        db.pool(),
        tenant_id,
        appointment_id,
        booking_core::PaymentStatus::Pending.as_str(),
        &to_storage(Utc::now()),
    )
    .await?;

    recalculate_payment_status(db, tenant_id, appointment_id, RecalcTrigger::WaiverChanged).await
}

/// Which internal method a polled order maps to when no local row precedes
/// it.
fn infer_method(order: &NormalizedOrder) -> PaymentMethod {
    if order.payment_method_id.as_deref() == Some("pix") || order.qr_code.is_some() {
        PaymentMethod::Pix
    } else {
        PaymentMethod::Card
    }
}

/// Upsert the payment row for a gateway order, keyed by the provider
/// payment id (falling back to the order id when the provider has not
/// assigned a payment yet, as point orders do before the terminal runs).
async fn record_order_payment(
    db: &Database,
    tenant_id: &str,
    appointment_id: &str,
    method: PaymentMethod,
    requested_amount: f64,
    order: &NormalizedOrder,
    point: Option<&PointCharge>,
) -> Result<()> {
    let provider_ref = order
        .payment_id
        .clone()
        .unwrap_or_else(|| order.order_id.clone());
    let now = to_storage(Utc::now());

    let payment = Payment {
        id: Uuid::new_v4().to_string(),
        tenant_id: tenant_id.to_string(),
        appointment_id: appointment_id.to_string(),
        method: method.as_str().to_string(),
        amount: round2(order.amount.unwrap_or(requested_amount)),
        status: order.state.as_str().to_string(),
        provider_ref: Some(provider_ref),
        provider_order_id: Some(order.order_id.clone()),
        point_terminal_id: point
            .map(|charge| charge.terminal_id.clone())
            .or_else(|| order.terminal_id.clone()),
        card_mode: point.map(|charge| charge.card_mode.as_str().to_string()),
        payment_method_id: order.payment_method_id.clone(),
        installments: order.installments.map(i64::from),
        raw_payload: Some(order.raw.to_string()),
        created_at: now.clone(),
        updated_at: now,
    };

    database::payment::upsert_by_provider_ref(db.pool(), &payment).await?;
    Ok(())
}
