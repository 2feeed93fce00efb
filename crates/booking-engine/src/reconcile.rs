//! Payment reconciliation.
//!
//! [`recalculate_payment_status`] is the single writer of
//! `appointments.payment_status`. Every payment-creating code path (charge
//! success, order poll, manual entry, discount or total change, session
//! finish) calls it instead of setting the column, so the derivation stays
//! centralized and safe to invoke any number of times: it re-derives from
//! the current rows and writes only when the value changes.

use booking_core::{derive_payment_status, round2, time::to_storage, AppointmentStatus, PaymentStatus};
use chrono::Utc;
use database::Database;
use tracing::debug;

use crate::error::{EngineError, Result};

/// Why a recalculation ran; logged for auditability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecalcTrigger {
    ChargeRecorded,
    OrderPolled,
    ManualPayment,
    TotalsChanged,
    WaiverChanged,
    SessionFinished,
}

/// Outcome of one recalculation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Recalculation {
    pub next_status: PaymentStatus,
    pub paid_total: f64,
    pub total: f64,
}

/// Re-derive and persist the appointment's aggregate payment status.
///
/// The owed total comes from the checkout row, falling back to the
/// appointment's price override and then its price when no checkout exists
/// yet. Only `paid` payment rows count toward the paid total.
pub async fn recalculate_payment_status(
    db: &Database,
    tenant_id: &str,
    appointment_id: &str,
    trigger: RecalcTrigger,
) -> Result<Recalculation> {
    let appointment = database::appointment::get(db.pool(), tenant_id, appointment_id).await?;

    let current: PaymentStatus = appointment
        .payment_status
        .parse()
        .map_err(|e: booking_core::ParseEnumError| EngineError::Validation(e.to_string()))?;
    let lifecycle: AppointmentStatus = appointment
        .status
        .parse()
        .map_err(|e: booking_core::ParseEnumError| EngineError::Validation(e.to_string()))?;

    let total = match database::checkout::get(db.pool(), tenant_id, appointment_id).await? {
        Some(checkout) => checkout.total,
        None => appointment.price_override.unwrap_or(appointment.price),
    };
    let paid_total =
        database::payment::sum_paid(db.pool(), tenant_id, appointment_id).await?;

    let total = round2(total);
    let paid_total = round2(paid_total);

    let next_status = derive_payment_status(current, lifecycle, total, paid_total);

    if next_status != current {
        database::appointment::set_payment_status(
            db.pool(),
            tenant_id,
            appointment_id,
            next_status.as_str(),
            &to_storage(Utc::now()),
        )
        .await?;
    }

    debug!(
        "Recalculated payment status for {}: {} -> {} (paid {:.2} of {:.2}, trigger {:?})",
        appointment_id, current, next_status, paid_total, total, trigger
    );

    Ok(Recalculation {
        next_status,
        paid_total,
        total,
    })
}
