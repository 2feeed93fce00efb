//! Booking entry points: create, reschedule, cancel, bulk shift blocks.
//!
//! All slot validity goes through the availability module's collision
//! predicate; this module never re-implements the overlap test.

use booking_core::time::to_storage;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use database::{Appointment, AvailabilityBlock, CheckoutItem, Database};
use tracing::info;
use uuid::Uuid;

use crate::availability::{assert_slot_free, load_studio, resolved_buffers};
use crate::checkout::recompute_checkout;
use crate::error::{EngineError, Result};

/// A booking request that already passed shape validation at the boundary.
#[derive(Debug, Clone)]
pub struct BookingInput {
    pub tenant_id: String,
    pub client_id: String,
    pub service_id: String,
    pub starts_at: DateTime<Utc>,
    pub is_home_visit: bool,
    pub price_override: Option<f64>,
    /// Home-visit surcharge, charged as its own checkout line.
    pub displacement_fee: Option<f64>,
    pub displacement_km: Option<f64>,
}

/// Create an appointment in a validated free slot, seed its checkout and
/// reconcile.
pub async fn book_appointment(db: &Database, input: BookingInput) -> Result<Appointment> {
    let studio = load_studio(db, &input.tenant_id).await?;
    let service = database::service::get(db.pool(), &input.tenant_id, &input.service_id).await?;

    assert_slot_free(
        db,
        &input.tenant_id,
        &service,
        input.starts_at,
        input.is_home_visit,
        None,
    )
    .await?;

    let (before, after) = resolved_buffers(&studio, &service, input.is_home_visit);
    let total_duration_minutes = service.duration_minutes + before + after;
    let price = input.price_override.unwrap_or(service.price);

    let appointment_id = Uuid::new_v4().to_string();
    let now = to_storage(Utc::now());

    let appointment = Appointment {
        id: appointment_id.clone(),
        tenant_id: input.tenant_id.clone(),
        client_id: input.client_id.clone(),
        service_id: input.service_id.clone(),
        starts_at: to_storage(input.starts_at),
        total_duration_minutes,
        status: booking_core::AppointmentStatus::Pending.as_str().to_string(),
        payment_status: booking_core::PaymentStatus::Pending.as_str().to_string(),
        price: service.price,
        price_override: input.price_override,
        is_home_visit: input.is_home_visit,
        displacement_fee: input.displacement_fee,
        displacement_km: input.displacement_km,
        timer_status: booking_core::TimerStatus::Idle.as_str().to_string(),
        timer_started_at: None,
        timer_paused_at: None,
        paused_total_seconds: 0,
        planned_seconds: Some(service.duration_minutes * 60),
        actual_seconds: None,
        created_at: now.clone(),
        updated_at: now,
    };
    database::appointment::create(db.pool(), &appointment).await?;

    let mut items = vec![CheckoutItem {
        id: Uuid::new_v4().to_string(),
        tenant_id: input.tenant_id.clone(),
        appointment_id: appointment_id.clone(),
        kind: "service".to_string(),
        label: service.name.clone(),
        qty: 1.0,
        amount: price,
        sort_order: 0,
    }];
    if input.is_home_visit {
        if let Some(fee) = input.displacement_fee.filter(|fee| *fee > 0.0) {
            items.push(CheckoutItem {
                id: Uuid::new_v4().to_string(),
                tenant_id: input.tenant_id.clone(),
                appointment_id: appointment_id.clone(),
                kind: "fee".to_string(),
                label: "Taxa de deslocamento".to_string(),
                qty: 1.0,
                amount: fee,
                sort_order: 1,
            });
        }
    }
    database::checkout_item::replace_for_appointment(
        db.pool(),
        &input.tenant_id,
        &appointment_id,
        &items,
    )
    .await?;

    recompute_checkout(db, &input.tenant_id, &appointment_id).await?;

    info!(
        "Booked appointment {} for service {} at {}",
        appointment_id, input.service_id, appointment.starts_at
    );

    database::appointment::get(db.pool(), &input.tenant_id, &appointment_id)
        .await
        .map_err(Into::into)
}

/// Move an appointment to a new start, re-validating the slot while
/// excluding the appointment itself from the collision check.
pub async fn reschedule_appointment(
    db: &Database,
    tenant_id: &str,
    appointment_id: &str,
    new_start: DateTime<Utc>,
) -> Result<Appointment> {
    let appointment = database::appointment::get(db.pool(), tenant_id, appointment_id).await?;
    let status: booking_core::AppointmentStatus = appointment
        .status
        .parse()
        .map_err(|e: booking_core::ParseEnumError| EngineError::Validation(e.to_string()))?;
    if status.is_canceled() || status == booking_core::AppointmentStatus::Completed {
        return Err(EngineError::Validation(format!(
            "appointment in status {status} cannot be rescheduled"
        )));
    }

    let studio = load_studio(db, tenant_id).await?;
    let service = database::service::get(db.pool(), tenant_id, &appointment.service_id).await?;

    assert_slot_free(
        db,
        tenant_id,
        &service,
        new_start,
        appointment.is_home_visit,
        Some(appointment_id),
    )
    .await?;

    let (before, after) = resolved_buffers(&studio, &service, appointment.is_home_visit);
    database::appointment::update_schedule(
        db.pool(),
        tenant_id,
        appointment_id,
        &to_storage(new_start),
        service.duration_minutes + before + after,
        &to_storage(Utc::now()),
    )
    .await?;

    database::appointment::get(db.pool(), tenant_id, appointment_id)
        .await
        .map_err(Into::into)
}

/// Cancel an appointment. Cancellation is a status transition; the row
/// stays.
pub async fn cancel_appointment(
    db: &Database,
    tenant_id: &str,
    appointment_id: &str,
    by_studio: bool,
) -> Result<()> {
    let appointment = database::appointment::get(db.pool(), tenant_id, appointment_id).await?;
    let status: booking_core::AppointmentStatus = appointment
        .status
        .parse()
        .map_err(|e: booking_core::ParseEnumError| EngineError::Validation(e.to_string()))?;

    if status.is_canceled() {
        return Ok(());
    }
    if status == booking_core::AppointmentStatus::Completed {
        return Err(EngineError::Validation(
            "completed appointments cannot be canceled".to_string(),
        ));
    }

    let next = if by_studio {
        booking_core::AppointmentStatus::CanceledByStudio
    } else {
        booking_core::AppointmentStatus::CanceledByClient
    };
    database::appointment::set_status(
        db.pool(),
        tenant_id,
        appointment_id,
        next.as_str(),
        &to_storage(Utc::now()),
    )
    .await?;
    Ok(())
}

/// Bulk-create shift blocks. Intervals already present (same start and end)
/// are skipped instead of duplicated; blocks never overlap-merge. Returns
/// the number of rows created.
pub async fn create_shift_blocks(
    db: &Database,
    tenant_id: &str,
    intervals: &[(DateTime<Utc>, DateTime<Utc>)],
    kind: Option<&str>,
) -> Result<u32> {
    let mut created = 0;

    for (start, end) in intervals {
        if start >= end {
            return Err(EngineError::Validation(format!(
                "block interval must end after it starts: {start} >= {end}"
            )));
        }

        let starts_at = to_storage(*start);
        let ends_at = to_storage(*end);

        let existing = database::availability_block::list_overlapping(
            db.pool(),
            tenant_id,
            &starts_at,
            &ends_at,
        )
        .await?;
        if existing
            .iter()
            .any(|block| block.starts_at == starts_at && block.ends_at == ends_at)
        {
            continue;
        }

        database::availability_block::create(
            db.pool(),
            &AvailabilityBlock {
                id: Uuid::new_v4().to_string(),
                tenant_id: tenant_id.to_string(),
                starts_at,
                ends_at,
                kind: kind.map(str::to_string),
                created_at: to_storage(Utc::now()),
            },
        )
        .await?;
        created += 1;
    }

    info!("Created {} shift blocks for {}", created, tenant_id);
    Ok(created)
}

/// Delete every block starting inside one calendar month of the studio
/// zone. Returns the number of deleted rows.
pub async fn clear_month_blocks(
    db: &Database,
    tenant_id: &str,
    year: i32,
    month: u32,
) -> Result<u64> {
    let studio = load_studio(db, tenant_id).await?;

    let first = NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| EngineError::Validation(format!("invalid month: {year}-{month:02}")))?;
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    }
    .ok_or_else(|| EngineError::Validation(format!("invalid month: {year}-{month:02}")))?;

    let from = month_start_utc(&studio.tz, first)?;
    let to = month_start_utc(&studio.tz, next)?;

    let deleted = database::availability_block::delete_between(
        db.pool(),
        tenant_id,
        &to_storage(from),
        &to_storage(to),
    )
    .await?;
    Ok(deleted)
}

fn month_start_utc(tz: &chrono_tz::Tz, date: NaiveDate) -> Result<DateTime<Utc>> {
    use chrono::{NaiveTime, TimeZone};

    // Month boundaries never land in a DST gap in practice; fall back an
    // hour if a zone ever puts one there.
    let naive = date.and_time(NaiveTime::MIN);
    tz.from_local_datetime(&naive)
        .earliest()
        .or_else(|| tz.from_local_datetime(&(naive + Duration::hours(1))).earliest())
        .map(|local| local.with_timezone(&Utc))
        .ok_or_else(|| {
            EngineError::Validation(format!("invalid month boundary {} in {}", date, tz))
        })
}
