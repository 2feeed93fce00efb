//! The single reducer deriving an appointment's aggregate payment status.
//!
//! Every code path that records money movement calls this through the
//! reconciliation service instead of writing the status directly, so the
//! derivation stays centralized and idempotent.

use crate::money::covers;
use crate::status::{AppointmentStatus, PaymentStatus};

/// Derive the next payment status from the current one, the appointment
/// lifecycle status, the owed total and the sum of paid payments.
///
/// Precedence:
/// 1. `waived` is a sticky manual override.
/// 2. `refunded` stays while nothing is (re-)paid.
/// 3. Nothing owed counts as paid.
/// 4. Paid within the cent epsilon counts as paid.
/// 5. A partial payment reports `partial`, except on a completed
///    appointment, where it reverts to `pending` to flag the open balance
///    for collection follow-up.
/// 6. Otherwise `pending`.
pub fn derive_payment_status(
    current: PaymentStatus,
    appointment: AppointmentStatus,
    total: f64,
    paid_total: f64,
) -> PaymentStatus {
    if current == PaymentStatus::Waived {
        return PaymentStatus::Waived;
    }
    if current == PaymentStatus::Refunded && paid_total <= 0.0 {
        return PaymentStatus::Refunded;
    }
    if total <= 0.0 {
        return PaymentStatus::Paid;
    }
    if covers(paid_total, total) {
        return PaymentStatus::Paid;
    }
    if paid_total > 0.0 {
        if appointment != AppointmentStatus::Completed {
            return PaymentStatus::Partial;
        }
        return PaymentStatus::Pending;
    }
    PaymentStatus::Pending
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_waived_is_sticky() {
        for paid in [0.0, 75.0, 150.0, 500.0] {
            assert_eq!(
                derive_payment_status(
                    PaymentStatus::Waived,
                    AppointmentStatus::Completed,
                    150.0,
                    paid
                ),
                PaymentStatus::Waived
            );
        }
    }

    #[test]
    fn test_refunded_sticky_until_repaid() {
        assert_eq!(
            derive_payment_status(
                PaymentStatus::Refunded,
                AppointmentStatus::Completed,
                150.0,
                0.0
            ),
            PaymentStatus::Refunded
        );
        // A fresh paid amount moves the status out of refunded.
        assert_eq!(
            derive_payment_status(
                PaymentStatus::Refunded,
                AppointmentStatus::Completed,
                150.0,
                150.0
            ),
            PaymentStatus::Paid
        );
    }

    #[test]
    fn test_nothing_owed_is_paid() {
        assert_eq!(
            derive_payment_status(
                PaymentStatus::Pending,
                AppointmentStatus::Confirmed,
                0.0,
                0.0
            ),
            PaymentStatus::Paid
        );
    }

    #[test]
    fn test_epsilon_boundary() {
        assert_eq!(
            derive_payment_status(
                PaymentStatus::Pending,
                AppointmentStatus::Confirmed,
                150.0,
                150.0
            ),
            PaymentStatus::Paid
        );
        assert_eq!(
            derive_payment_status(
                PaymentStatus::Pending,
                AppointmentStatus::Confirmed,
                150.0,
                149.99
            ),
            PaymentStatus::Partial
        );
    }

    #[test]
    fn test_completed_with_open_balance_reverts_to_pending() {
        assert_eq!(
            derive_payment_status(
                PaymentStatus::Partial,
                AppointmentStatus::Completed,
                150.0,
                100.0
            ),
            PaymentStatus::Pending
        );
        assert_eq!(
            derive_payment_status(
                PaymentStatus::Pending,
                AppointmentStatus::InProgress,
                150.0,
                100.0
            ),
            PaymentStatus::Partial
        );
    }

    #[test]
    fn test_no_payments_is_pending() {
        assert_eq!(
            derive_payment_status(
                PaymentStatus::Partial,
                AppointmentStatus::Confirmed,
                150.0,
                0.0
            ),
            PaymentStatus::Pending
        );
    }
}
