//! Buffer-aware slot availability.
//!
//! Candidate slots step across the business hours in fixed increments; each
//! candidate's buffered occupied interval is tested against every existing
//! appointment's buffered interval and every block's raw interval. The same
//! collision predicate backs slot enumeration, booking validation and
//! rescheduling, so there is exactly one notion of "free".
//!
//! All wall-clock math runs in the studio's IANA zone; UTC exists only at
//! the storage boundary. Mixing the two corrupts slots by a whole hour
//! whenever the offset shifts.

use std::collections::HashMap;

use booking_core::{
    buffer::{effective_buffer, BufferKind, BufferOverrides},
    interval::{occupied_interval, overlaps},
    time::{parse_storage, to_storage},
};
use chrono::{
    DateTime, Datelike, Duration, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, TimeZone,
    Timelike, Utc,
};
use chrono_tz::Tz;
use database::{models::Service, Database, DatabaseError};
use tracing::warn;

use crate::error::{EngineError, Result};

/// Fixed candidate step.
pub const SLOT_STEP_MINUTES: i64 = 30;

/// Default zone for tenants without a settings row.
pub const DEFAULT_TIMEZONE: &str = "America/Sao_Paulo";

/// Slot collision message surfaced to users.
pub const SLOT_UNAVAILABLE: &str = "horário indisponível";

/// Tenant-level scheduling context: zone and studio buffer defaults.
#[derive(Debug, Clone)]
pub(crate) struct StudioContext {
    pub tz: Tz,
    pub buffers: BufferOverrides,
}

pub(crate) async fn load_studio(db: &Database, tenant_id: &str) -> Result<StudioContext> {
    let settings = database::settings::get(db.pool(), tenant_id).await?;

    let (timezone, buffers) = match settings {
        Some(settings) => (
            settings.timezone,
            BufferOverrides {
                before_minutes: settings.buffer_before_minutes,
                after_minutes: settings.buffer_after_minutes,
                home_before_minutes: settings.home_buffer_before_minutes,
                home_after_minutes: settings.home_buffer_after_minutes,
            },
        ),
        None => (DEFAULT_TIMEZONE.to_string(), BufferOverrides::default()),
    };

    let tz: Tz = timezone
        .parse()
        .map_err(|_| EngineError::Validation(format!("invalid timezone: {timezone}")))?;

    Ok(StudioContext { tz, buffers })
}

/// Buffer overrides carried by a service row.
pub(crate) fn service_buffers(service: &Service) -> BufferOverrides {
    BufferOverrides {
        before_minutes: service.buffer_before_minutes,
        after_minutes: service.buffer_after_minutes,
        home_before_minutes: service.home_buffer_before_minutes,
        home_after_minutes: service.home_buffer_after_minutes,
    }
}

/// Resolved before/after buffers for a service and visit kind.
pub(crate) fn resolved_buffers(
    studio: &StudioContext,
    service: &Service,
    is_home_visit: bool,
) -> (i64, i64) {
    let overrides = service_buffers(service);
    (
        effective_buffer(BufferKind::Before, is_home_visit, &overrides, &studio.buffers),
        effective_buffer(BufferKind::After, is_home_visit, &overrides, &studio.buffers),
    )
}

fn local_to_utc(tz: Tz, naive: NaiveDateTime) -> Result<DateTime<Utc>> {
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(local) => Ok(local.with_timezone(&Utc)),
        // Fall-back transition: both readings exist, the earlier one wins.
        LocalResult::Ambiguous(earliest, _) => Ok(earliest.with_timezone(&Utc)),
        // Spring-forward gap: the wall-clock time never happens.
        LocalResult::None => Err(EngineError::Validation(format!(
            "local time {naive} does not exist in {tz}"
        ))),
    }
}

/// Signed minutes between an instant and `date`'s local midnight.
fn minutes_from_midnight(instant: DateTime<Utc>, tz: Tz, date: NaiveDate) -> i64 {
    let local = instant.with_timezone(&tz);
    let days = (local.date_naive() - date).num_days();
    days * 1440 + i64::from(local.time().num_seconds_from_midnight()) / 60
}

fn parse_hhmm(value: &str) -> Result<i64> {
    let invalid = || EngineError::Validation(format!("invalid time of day: {value}"));

    let (hours, minutes) = value.split_once(':').ok_or_else(invalid)?;
    let hours: i64 = hours.parse().map_err(|_| invalid())?;
    let minutes: i64 = minutes.parse().map_err(|_| invalid())?;
    if !(0..=23).contains(&hours) || !(0..=59).contains(&minutes) {
        return Err(invalid());
    }
    Ok(hours * 60 + minutes)
}

fn format_hhmm(minutes: i64) -> String {
    format!("{:02}:{:02}", minutes / 60, minutes % 60)
}

/// Everything already occupying one local day: buffered appointment
/// intervals and raw block intervals, in minutes relative to the day's local
/// midnight.
#[derive(Debug, Default)]
pub(crate) struct DaySchedule {
    appointments: Vec<(i64, i64)>,
    blocks: Vec<(i64, i64)>,
}

impl DaySchedule {
    /// The one collision predicate: half-open overlap against any occupied
    /// interval. Touching boundaries do not collide.
    pub(crate) fn is_free(&self, candidate: (i64, i64)) -> bool {
        let busy = self
            .appointments
            .iter()
            .chain(self.blocks.iter())
            .any(|&(start, end)| overlaps(candidate.0, candidate.1, start, end));
        !busy
    }
}

/// Load the day's occupied intervals. Appointments re-resolve their own
/// buffer cascade (home visits with home candidates); blocks count raw.
pub(crate) async fn load_day(
    db: &Database,
    tenant_id: &str,
    studio: &StudioContext,
    date: NaiveDate,
    exclude_appointment: Option<&str>,
) -> Result<DaySchedule> {
    let day_start = local_to_utc(studio.tz, date.and_time(NaiveTime::MIN))?;
    let next_day = date + Duration::days(1);
    let day_end = local_to_utc(studio.tz, next_day.and_time(NaiveTime::MIN))?;

    // Pad the lower bound so late appointments from the previous day whose
    // occupation spills past midnight still register.
    let fetch_from = to_storage(day_start - Duration::days(1));
    let fetch_to = to_storage(day_end);

    let appointments =
        database::appointment::list_between(db.pool(), tenant_id, &fetch_from, &fetch_to).await?;

    let mut services: HashMap<String, Option<Service>> = HashMap::new();
    let mut schedule = DaySchedule::default();

    for appointment in appointments {
        if exclude_appointment == Some(appointment.id.as_str()) {
            continue;
        }

        let starts_at = parse_storage(&appointment.starts_at).ok_or_else(|| {
            EngineError::Validation(format!(
                "appointment {} has unreadable start time",
                appointment.id
            ))
        })?;
        let start_min = minutes_from_midnight(starts_at, studio.tz, date);

        if !services.contains_key(&appointment.service_id) {
            let fetched =
                match database::service::get(db.pool(), tenant_id, &appointment.service_id).await {
                    Ok(service) => Some(service),
                    Err(DatabaseError::NotFound { .. }) => None,
                    Err(e) => return Err(e.into()),
                };
            services.insert(appointment.service_id.clone(), fetched);
        }
        let service = services
            .get(&appointment.service_id)
            .cloned()
            .flatten();

        let interval = match service {
            Some(service) => {
                let (before, after) = resolved_buffers(studio, &service, appointment.is_home_visit);
                occupied_interval(start_min, service.duration_minutes, before, after)
            }
            None => {
                // Catalog row gone; the stored planned duration already
                // includes the buffers that applied at booking time.
                warn!(
                    "Service {} missing for appointment {}, using stored duration",
                    appointment.service_id, appointment.id
                );
                (start_min, start_min + appointment.total_duration_minutes)
            }
        };

        if overlaps(interval.0, interval.1, 0, 1440) {
            schedule.appointments.push(interval);
        }
    }

    let blocks = database::availability_block::list_overlapping(
        db.pool(),
        tenant_id,
        &to_storage(day_start),
        &to_storage(day_end),
    )
    .await?;

    for block in blocks {
        let (Some(block_start), Some(block_end)) =
            (parse_storage(&block.starts_at), parse_storage(&block.ends_at))
        else {
            return Err(EngineError::Validation(format!(
                "block {} has unreadable interval",
                block.id
            )));
        };
        schedule.blocks.push((
            minutes_from_midnight(block_start, studio.tz, date),
            minutes_from_midnight(block_end, studio.tz, date),
        ));
    }

    Ok(schedule)
}

/// Enumerate the free slots of one service on one day, as chronological
/// "HH:MM" strings in the studio zone.
///
/// A missing or closed business-hours row is a valid "no slots" answer, not
/// an error. A candidate is enumerable while the service itself ends by
/// closing time; its buffers may spill past the edges of the day.
pub async fn get_available_slots(
    db: &Database,
    tenant_id: &str,
    service_id: &str,
    date: NaiveDate,
    is_home_visit: bool,
) -> Result<Vec<String>> {
    let studio = load_studio(db, tenant_id).await?;
    let service = database::service::get(db.pool(), tenant_id, service_id).await?;

    let weekday = i64::from(date.weekday().num_days_from_sunday());
    let hours = match database::business_hours::get_for_weekday(db.pool(), tenant_id, weekday).await? {
        Some(hours) if !hours.closed => hours,
        _ => return Ok(Vec::new()),
    };

    let open = parse_hhmm(&hours.open_time)?;
    let close = parse_hhmm(&hours.close_time)?;

    let schedule = load_day(db, tenant_id, &studio, date, None).await?;
    let (before, after) = resolved_buffers(&studio, &service, is_home_visit);

    let mut slots = Vec::new();
    let mut candidate = open;
    while candidate + service.duration_minutes <= close {
        let interval = occupied_interval(candidate, service.duration_minutes, before, after);
        if schedule.is_free(interval) {
            slots.push(format_hhmm(candidate));
        }
        candidate += SLOT_STEP_MINUTES;
    }

    Ok(slots)
}

/// Assert that a concrete start instant is free for a service, using the
/// same collision predicate as slot enumeration. Rescheduling passes its own
/// id in `exclude_appointment` so the appointment does not collide with
/// itself.
pub async fn assert_slot_free(
    db: &Database,
    tenant_id: &str,
    service: &Service,
    starts_at: DateTime<Utc>,
    is_home_visit: bool,
    exclude_appointment: Option<&str>,
) -> Result<()> {
    let studio = load_studio(db, tenant_id).await?;
    let local = starts_at.with_timezone(&studio.tz);
    let date = local.date_naive();
    let start_min = minutes_from_midnight(starts_at, studio.tz, date);

    let schedule = load_day(db, tenant_id, &studio, date, exclude_appointment).await?;
    let (before, after) = resolved_buffers(&studio, service, is_home_visit);
    let interval = occupied_interval(start_min, service.duration_minutes, before, after);

    if !schedule.is_free(interval) {
        return Err(EngineError::Conflict(SLOT_UNAVAILABLE.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{seed_hours, seed_service, seed_settings, test_db, utc, TENANT};

    // 2025-06-02 is a Monday; São Paulo is UTC-3 year-round.
    fn monday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 2).unwrap()
    }

    #[test]
    fn test_parse_hhmm() {
        assert_eq!(parse_hhmm("08:00").unwrap(), 480);
        assert_eq!(parse_hhmm("23:59").unwrap(), 1439);
        assert!(parse_hhmm("24:00").is_err());
        assert!(parse_hhmm("8am").is_err());
    }

    #[tokio::test]
    async fn test_empty_day_enumerates_full_grid() {
        let db = test_db().await;
        seed_settings(&db).await;
        seed_service(&db, "svc-1", 60, 150.0, Some(15), Some(15)).await;
        seed_hours(&db, 1, "08:00", "18:00").await;

        let slots = get_available_slots(&db, TENANT, "svc-1", monday(), false)
            .await
            .unwrap();

        // 08:00 through 17:00: the service must end by close; its buffers
        // may spill past the edges.
        assert_eq!(slots.len(), 19);
        assert_eq!(slots.first().map(String::as_str), Some("08:00"));
        assert_eq!(slots.last().map(String::as_str), Some("17:00"));
        assert!(slots.contains(&"12:30".to_string()));
    }

    #[tokio::test]
    async fn test_closed_or_missing_day_yields_no_slots() {
        let db = test_db().await;
        seed_settings(&db).await;
        seed_service(&db, "svc-1", 60, 150.0, None, None).await;

        // No hours row at all.
        let slots = get_available_slots(&db, TENANT, "svc-1", monday(), false)
            .await
            .unwrap();
        assert!(slots.is_empty());

        // Explicitly closed.
        database::business_hours::upsert(
            db.pool(),
            &database::BusinessHours {
                tenant_id: TENANT.to_string(),
                weekday: 1,
                open_time: "08:00".to_string(),
                close_time: "18:00".to_string(),
                closed: true,
            },
        )
        .await
        .unwrap();
        let slots = get_available_slots(&db, TENANT, "svc-1", monday(), false)
            .await
            .unwrap();
        assert!(slots.is_empty());
    }

    #[tokio::test]
    async fn test_booked_appointment_rejects_overlaps_but_not_adjacency() {
        let db = test_db().await;
        seed_settings(&db).await;
        seed_service(&db, "svc-1", 60, 150.0, Some(15), Some(15)).await;
        seed_hours(&db, 1, "08:00", "18:00").await;

        // 10:00 local is 13:00Z; occupied interval is [09:45, 11:15).
        crate::testutil::seed_appointment(&db, "appt-1", "svc-1", utc(2025, 6, 2, 13, 0), false)
            .await;

        let slots = get_available_slots(&db, TENANT, "svc-1", monday(), false)
            .await
            .unwrap();

        // Candidates occupy [c-15, c+75). 08:30 ends exactly at 09:45 and
        // 11:30 starts exactly at 11:15: both touch, neither collides.
        assert!(slots.contains(&"08:30".to_string()));
        assert!(slots.contains(&"11:30".to_string()));
        for taken in ["09:00", "09:30", "10:00", "10:30", "11:00"] {
            assert!(!slots.contains(&taken.to_string()), "{taken} should be taken");
        }
    }

    #[tokio::test]
    async fn test_identical_buffered_interval_is_never_offered() {
        let db = test_db().await;
        seed_settings(&db).await;
        seed_service(&db, "svc-1", 60, 150.0, Some(15), Some(15)).await;
        seed_hours(&db, 1, "08:00", "18:00").await;
        crate::testutil::seed_appointment(&db, "appt-1", "svc-1", utc(2025, 6, 2, 13, 0), false)
            .await;

        let slots = get_available_slots(&db, TENANT, "svc-1", monday(), false)
            .await
            .unwrap();
        assert!(!slots.contains(&"10:00".to_string()));
    }

    #[tokio::test]
    async fn test_home_visit_appointment_blocks_with_home_buffers() {
        let db = test_db().await;
        seed_settings(&db).await;
        // Studio buffers 15/15, home buffers 30/20.
        let service = database::Service {
            home_buffer_before_minutes: Some(30),
            home_buffer_after_minutes: Some(20),
            ..seed_service(&db, "svc-1", 60, 150.0, Some(15), Some(15)).await
        };
        database::service::update(db.pool(), &service).await.unwrap();
        seed_hours(&db, 1, "08:00", "18:00").await;

        // Home visit at 10:00 local occupies [09:30, 11:20): the after
        // buffer stays intact, it is never cancelled against the before
        // buffer.
        crate::testutil::seed_appointment(&db, "appt-1", "svc-1", utc(2025, 6, 2, 13, 0), true)
            .await;

        let slots = get_available_slots(&db, TENANT, "svc-1", monday(), false)
            .await
            .unwrap();

        // A studio candidate at 11:00 occupies [10:45, 12:15) and collides
        // with [09:30, 11:20); 11:30 occupies [11:15, 12:45) and still
        // collides because the home after-buffer runs to 11:20. 12:00 is
        // clear.
        assert!(!slots.contains(&"11:00".to_string()));
        assert!(!slots.contains(&"11:30".to_string()));
        assert!(slots.contains(&"12:00".to_string()));
        // 08:00 occupies [07:45, 09:15), clear of [09:30, ...).
        assert!(slots.contains(&"08:00".to_string()));
        assert!(!slots.contains(&"08:30".to_string()));
    }

    #[tokio::test]
    async fn test_blocks_count_raw_without_buffers() {
        let db = test_db().await;
        seed_settings(&db).await;
        seed_service(&db, "svc-1", 60, 150.0, Some(15), Some(15)).await;
        seed_hours(&db, 1, "08:00", "18:00").await;

        // Block 14:00-16:00 local (17:00Z-19:00Z).
        database::availability_block::create(
            db.pool(),
            &database::AvailabilityBlock {
                id: "blk-1".to_string(),
                tenant_id: TENANT.to_string(),
                starts_at: booking_core::time::to_storage(utc(2025, 6, 2, 17, 0)),
                ends_at: booking_core::time::to_storage(utc(2025, 6, 2, 19, 0)),
                kind: Some("shift".to_string()),
                created_at: booking_core::time::to_storage(utc(2025, 6, 1, 0, 0)),
            },
        )
        .await
        .unwrap();

        let slots = get_available_slots(&db, TENANT, "svc-1", monday(), false)
            .await
            .unwrap();

        // Candidate 13:00 occupies [12:45, 14:15): collides with the block.
        // 12:30 occupies [12:15, 13:45): clear. 16:00 occupies [15:45,
        // 17:15): the before-buffer reaches into the block.
        assert!(slots.contains(&"12:30".to_string()));
        assert!(!slots.contains(&"13:00".to_string()));
        assert!(!slots.contains(&"16:00".to_string()));
        assert!(slots.contains(&"16:30".to_string()));
    }

    #[tokio::test]
    async fn test_assert_slot_free_excludes_self_on_reschedule() {
        let db = test_db().await;
        seed_settings(&db).await;
        let service = seed_service(&db, "svc-1", 60, 150.0, Some(15), Some(15)).await;
        seed_hours(&db, 1, "08:00", "18:00").await;
        crate::testutil::seed_appointment(&db, "appt-1", "svc-1", utc(2025, 6, 2, 13, 0), false)
            .await;

        // The same instant collides when checked for a new appointment...
        let err = assert_slot_free(&db, TENANT, &service, utc(2025, 6, 2, 13, 0), false, None)
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Conflict(_)));

        // ...but not when the appointment being rescheduled is excluded.
        assert_slot_free(
            &db,
            TENANT,
            &service,
            utc(2025, 6, 2, 13, 0),
            false,
            Some("appt-1"),
        )
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_zero_duration_service_steps_full_grid() {
        let db = test_db().await;
        seed_settings(&db).await;
        // Duration 0; buffers resolve to the hard default.
        seed_service(&db, "svc-flash", 0, 30.0, None, None).await;
        seed_hours(&db, 1, "08:00", "10:00").await;

        let slots = get_available_slots(&db, TENANT, "svc-flash", monday(), false)
            .await
            .unwrap();
        assert_eq!(slots, vec!["08:00", "08:30", "09:00", "09:30", "10:00"]);
    }
}
