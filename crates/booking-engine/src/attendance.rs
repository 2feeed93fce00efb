//! Persisted attendance timer transitions.
//!
//! The arithmetic lives in `booking_core::timer`; this module loads the
//! appointment's clock, applies a transition and writes the columns back.
//! Finishing the session also completes the appointment and triggers a
//! reconciliation, which is where a half-paid completed session falls back
//! to `pending` for collection follow-up.

use booking_core::{
    time::{parse_storage, to_storage},
    AppointmentStatus, TimerState, TimerStatus,
};
use chrono::{DateTime, Utc};
use database::{appointment::TimerColumns, Appointment, Database};

use crate::error::{EngineError, Result};
use crate::reconcile::{recalculate_payment_status, RecalcTrigger};

fn timer_state(appointment: &Appointment) -> Result<TimerState> {
    let status: TimerStatus = appointment
        .timer_status
        .parse()
        .map_err(|e: booking_core::ParseEnumError| EngineError::Validation(e.to_string()))?;

    let parse_instant = |value: &Option<String>, field: &str| -> Result<Option<DateTime<Utc>>> {
        match value {
            None => Ok(None),
            Some(raw) => parse_storage(raw).map(Some).ok_or_else(|| {
                EngineError::Validation(format!(
                    "appointment {} has unreadable {field}",
                    appointment.id
                ))
            }),
        }
    };

    Ok(TimerState {
        status,
        started_at: parse_instant(&appointment.timer_started_at, "timer start")?,
        paused_at: parse_instant(&appointment.timer_paused_at, "timer pause")?,
        paused_total_seconds: appointment.paused_total_seconds,
    })
}

fn timer_columns(state: &TimerState, actual_seconds: Option<i64>) -> TimerColumns {
    TimerColumns {
        timer_status: state.status.as_str().to_string(),
        timer_started_at: state.started_at.map(to_storage),
        timer_paused_at: state.paused_at.map(to_storage),
        paused_total_seconds: state.paused_total_seconds,
        actual_seconds,
    }
}

/// Elapsed billable seconds of a (possibly running) session, for client
/// re-sync.
pub fn timer_elapsed(appointment: &Appointment, now: DateTime<Utc>) -> Result<i64> {
    Ok(timer_state(appointment)?.elapsed_seconds(now))
}

/// Start the session clock. The appointment moves to `in_progress`.
pub async fn start_timer(
    db: &Database,
    tenant_id: &str,
    appointment_id: &str,
    now: DateTime<Utc>,
) -> Result<TimerState> {
    let appointment = database::appointment::get(db.pool(), tenant_id, appointment_id).await?;
    let lifecycle: AppointmentStatus = appointment
        .status
        .parse()
        .map_err(|e: booking_core::ParseEnumError| EngineError::Validation(e.to_string()))?;
    if lifecycle.is_canceled() {
        return Err(EngineError::Validation(
            "canceled appointments cannot start attendance".to_string(),
        ));
    }

    let state = timer_state(&appointment)?
        .start(now)
        .map_err(|e| EngineError::Validation(e.to_string()))?;

    database::appointment::update_timer(
        db.pool(),
        tenant_id,
        appointment_id,
        &timer_columns(&state, appointment.actual_seconds),
        &to_storage(now),
    )
    .await?;
    database::appointment::set_status(
        db.pool(),
        tenant_id,
        appointment_id,
        AppointmentStatus::InProgress.as_str(),
        &to_storage(now),
    )
    .await?;

    Ok(state)
}

/// Pause the running clock.
pub async fn pause_timer(
    db: &Database,
    tenant_id: &str,
    appointment_id: &str,
    now: DateTime<Utc>,
) -> Result<TimerState> {
    let appointment = database::appointment::get(db.pool(), tenant_id, appointment_id).await?;
    let state = timer_state(&appointment)?
        .pause(now)
        .map_err(|e| EngineError::Validation(e.to_string()))?;

    database::appointment::update_timer(
        db.pool(),
        tenant_id,
        appointment_id,
        &timer_columns(&state, appointment.actual_seconds),
        &to_storage(now),
    )
    .await?;
    Ok(state)
}

/// Resume a paused clock, accumulating the pause into the total.
pub async fn resume_timer(
    db: &Database,
    tenant_id: &str,
    appointment_id: &str,
    now: DateTime<Utc>,
) -> Result<TimerState> {
    let appointment = database::appointment::get(db.pool(), tenant_id, appointment_id).await?;
    let state = timer_state(&appointment)?
        .resume(now)
        .map_err(|e| EngineError::Validation(e.to_string()))?;

    database::appointment::update_timer(
        db.pool(),
        tenant_id,
        appointment_id,
        &timer_columns(&state, appointment.actual_seconds),
        &to_storage(now),
    )
    .await?;
    Ok(state)
}

/// Finish the session: capture the billable seconds, complete the
/// appointment and reconcile the payment status. Returns the captured
/// seconds. The timer never mutates again afterwards.
pub async fn finish_timer(
    db: &Database,
    tenant_id: &str,
    appointment_id: &str,
    now: DateTime<Utc>,
) -> Result<i64> {
    let appointment = database::appointment::get(db.pool(), tenant_id, appointment_id).await?;
    let (state, actual_seconds) = timer_state(&appointment)?
        .finish(now)
        .map_err(|e| EngineError::Validation(e.to_string()))?;

    database::appointment::update_timer(
        db.pool(),
        tenant_id,
        appointment_id,
        &timer_columns(&state, Some(actual_seconds)),
        &to_storage(now),
    )
    .await?;
    database::appointment::set_status(
        db.pool(),
        tenant_id,
        appointment_id,
        AppointmentStatus::Completed.as_str(),
        &to_storage(now),
    )
    .await?;

    recalculate_payment_status(db, tenant_id, appointment_id, RecalcTrigger::SessionFinished)
        .await?;

    Ok(actual_seconds)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payments::record_manual_payment;
    use crate::testutil::{seed_appointment, seed_service, seed_settings, test_db, utc, TENANT};
    use booking_core::PaymentMethod;

    async fn setup() -> Database {
        let db = test_db().await;
        seed_settings(&db).await;
        seed_service(&db, "svc-1", 60, 150.0, None, None).await;
        seed_appointment(&db, "appt-1", "svc-1", utc(2025, 6, 2, 13, 0), false).await;
        db
    }

    #[tokio::test]
    async fn test_full_session_with_pauses() {
        let db = setup().await;

        start_timer(&db, TENANT, "appt-1", utc(2025, 6, 2, 13, 0))
            .await
            .unwrap();
        let row = database::appointment::get(db.pool(), TENANT, "appt-1").await.unwrap();
        assert_eq!(row.status, "in_progress");
        assert_eq!(row.timer_status, "running");

        pause_timer(&db, TENANT, "appt-1", utc(2025, 6, 2, 13, 20))
            .await
            .unwrap();
        let row = database::appointment::get(db.pool(), TENANT, "appt-1").await.unwrap();
        // Frozen while paused.
        assert_eq!(timer_elapsed(&row, utc(2025, 6, 2, 13, 50)).unwrap(), 1200);

        resume_timer(&db, TENANT, "appt-1", utc(2025, 6, 2, 13, 30))
            .await
            .unwrap();
        let row = database::appointment::get(db.pool(), TENANT, "appt-1").await.unwrap();
        assert_eq!(row.paused_total_seconds, 600);

        let actual = finish_timer(&db, TENANT, "appt-1", utc(2025, 6, 2, 14, 30))
            .await
            .unwrap();
        // 90 wall-clock minutes minus 10 paused.
        assert_eq!(actual, 4800);

        let row = database::appointment::get(db.pool(), TENANT, "appt-1").await.unwrap();
        assert_eq!(row.status, "completed");
        assert_eq!(row.timer_status, "finished");
        assert_eq!(row.actual_seconds, Some(4800));
    }

    #[tokio::test]
    async fn test_finish_reconciles_open_balance_to_pending() {
        let db = setup().await;

        record_manual_payment(&db, TENANT, "appt-1", PaymentMethod::Cash, 100.0)
            .await
            .unwrap();
        let row = database::appointment::get(db.pool(), TENANT, "appt-1").await.unwrap();
        assert_eq!(row.payment_status, "partial");

        start_timer(&db, TENANT, "appt-1", utc(2025, 6, 2, 13, 0))
            .await
            .unwrap();
        finish_timer(&db, TENANT, "appt-1", utc(2025, 6, 2, 14, 0))
            .await
            .unwrap();

        // Completed with an open balance: partial reverts to pending.
        let row = database::appointment::get(db.pool(), TENANT, "appt-1").await.unwrap();
        assert_eq!(row.payment_status, "pending");
    }

    #[tokio::test]
    async fn test_invalid_transitions_are_validation_errors() {
        let db = setup().await;

        assert!(matches!(
            pause_timer(&db, TENANT, "appt-1", utc(2025, 6, 2, 13, 0)).await,
            Err(EngineError::Validation(_))
        ));

        start_timer(&db, TENANT, "appt-1", utc(2025, 6, 2, 13, 0))
            .await
            .unwrap();
        assert!(matches!(
            start_timer(&db, TENANT, "appt-1", utc(2025, 6, 2, 13, 5)).await,
            Err(EngineError::Validation(_))
        ));

        finish_timer(&db, TENANT, "appt-1", utc(2025, 6, 2, 14, 0))
            .await
            .unwrap();
        // Finished is terminal.
        assert!(matches!(
            resume_timer(&db, TENANT, "appt-1", utc(2025, 6, 2, 14, 5)).await,
            Err(EngineError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_canceled_appointment_cannot_start() {
        let db = setup().await;
        crate::booking::cancel_appointment(&db, TENANT, "appt-1", true)
            .await
            .unwrap();
        assert!(matches!(
            start_timer(&db, TENANT, "appt-1", utc(2025, 6, 2, 13, 0)).await,
            Err(EngineError::Validation(_))
        ));
    }
}
