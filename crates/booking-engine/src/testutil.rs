//! Shared fixtures for engine tests.

use booking_core::time::to_storage;
use chrono::{DateTime, TimeZone, Utc};
use database::{Appointment, BusinessHours, Database, Service, StudioSettings};

pub(crate) const TENANT: &str = "studio-1";

pub(crate) fn utc(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, hour, minute, 0).unwrap()
}

pub(crate) async fn test_db() -> Database {
    // A single connection keeps the in-memory database alive and shared.
    let db = Database::connect_with_pool_size("sqlite::memory:", 1)
        .await
        .unwrap();
    db.migrate().await.unwrap();
    db
}

pub(crate) async fn seed_settings(db: &Database) {
    database::settings::upsert(
        db.pool(),
        &StudioSettings {
            tenant_id: TENANT.to_string(),
            timezone: "America/Sao_Paulo".to_string(),
            buffer_before_minutes: None,
            buffer_after_minutes: None,
            home_buffer_before_minutes: None,
            home_buffer_after_minutes: None,
            currency: "BRL".to_string(),
            updated_at: to_storage(utc(2025, 6, 1, 0, 0)),
        },
    )
    .await
    .unwrap();
}

pub(crate) async fn seed_service(
    db: &Database,
    id: &str,
    duration_minutes: i64,
    price: f64,
    buffer_before: Option<i64>,
    buffer_after: Option<i64>,
) -> Service {
    let service = Service {
        id: id.to_string(),
        tenant_id: TENANT.to_string(),
        name: format!("Service {id}"),
        duration_minutes,
        price,
        buffer_before_minutes: buffer_before,
        buffer_after_minutes: buffer_after,
        home_buffer_before_minutes: None,
        home_buffer_after_minutes: None,
        active: true,
        created_at: to_storage(utc(2025, 6, 1, 0, 0)),
    };
    database::service::create(db.pool(), &service).await.unwrap();
    service
}

pub(crate) async fn seed_hours(db: &Database, weekday: i64, open: &str, close: &str) {
    database::business_hours::upsert(
        db.pool(),
        &BusinessHours {
            tenant_id: TENANT.to_string(),
            weekday,
            open_time: open.to_string(),
            close_time: close.to_string(),
            closed: false,
        },
    )
    .await
    .unwrap();
}

pub(crate) async fn seed_appointment(
    db: &Database,
    id: &str,
    service_id: &str,
    starts_at: DateTime<Utc>,
    is_home_visit: bool,
) -> Appointment {
    let appointment = Appointment {
        id: id.to_string(),
        tenant_id: TENANT.to_string(),
        client_id: "client-1".to_string(),
        service_id: service_id.to_string(),
        starts_at: to_storage(starts_at),
        total_duration_minutes: 90,
        status: "confirmed".to_string(),
        payment_status: "pending".to_string(),
        price: 150.0,
        price_override: None,
        is_home_visit,
        displacement_fee: None,
        displacement_km: None,
        timer_status: "idle".to_string(),
        timer_started_at: None,
        timer_paused_at: None,
        paused_total_seconds: 0,
        planned_seconds: Some(5400),
        actual_seconds: None,
        created_at: to_storage(utc(2025, 6, 1, 0, 0)),
        updated_at: to_storage(utc(2025, 6, 1, 0, 0)),
    };
    database::appointment::create(db.pool(), &appointment)
        .await
        .unwrap();
    appointment
}
