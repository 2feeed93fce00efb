//! Database models.
//!
//! Status columns are stored as their string vocabulary and parsed into the
//! `booking-core` enums at the orchestration boundary.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A bookable service offered by the studio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Service {
    pub id: String,
    pub tenant_id: String,
    pub name: String,
    pub duration_minutes: i64,
    pub price: f64,
    /// Studio-visit buffer overrides; null falls through the cascade.
    pub buffer_before_minutes: Option<i64>,
    pub buffer_after_minutes: Option<i64>,
    /// Home-visit buffer overrides.
    pub home_buffer_before_minutes: Option<i64>,
    pub home_buffer_after_minutes: Option<i64>,
    pub active: bool,
    pub created_at: String,
}

/// Per-tenant studio settings consumed by the scheduling engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct StudioSettings {
    pub tenant_id: String,
    /// IANA zone all wall-clock slot math runs in.
    pub timezone: String,
    pub buffer_before_minutes: Option<i64>,
    pub buffer_after_minutes: Option<i64>,
    pub home_buffer_before_minutes: Option<i64>,
    pub home_buffer_after_minutes: Option<i64>,
    pub currency: String,
    pub updated_at: String,
}

/// Opening hours for one weekday (0-6, Sunday-based).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct BusinessHours {
    pub tenant_id: String,
    pub weekday: i64,
    /// "HH:MM" wall-clock times in the studio zone.
    pub open_time: String,
    pub close_time: String,
    pub closed: bool,
}

/// A scheduled service occurrence. Never hard-deleted; cancellation is a
/// status transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Appointment {
    pub id: String,
    pub tenant_id: String,
    pub client_id: String,
    pub service_id: String,
    pub starts_at: String,
    /// Service duration plus resolved buffers, in minutes.
    pub total_duration_minutes: i64,
    pub status: String,
    pub payment_status: String,
    pub price: f64,
    pub price_override: Option<f64>,
    pub is_home_visit: bool,
    pub displacement_fee: Option<f64>,
    pub displacement_km: Option<f64>,
    pub timer_status: String,
    pub timer_started_at: Option<String>,
    pub timer_paused_at: Option<String>,
    pub paused_total_seconds: i64,
    pub planned_seconds: Option<i64>,
    pub actual_seconds: Option<i64>,
    pub created_at: String,
    pub updated_at: String,
}

/// A manually-declared unavailable interval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct AvailabilityBlock {
    pub id: String,
    pub tenant_id: String,
    pub starts_at: String,
    pub ends_at: String,
    pub kind: Option<String>,
    pub created_at: String,
}

/// The priced, discountable representation of one appointment's charge.
/// 1:1 with an appointment, always derived from its items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Checkout {
    pub appointment_id: String,
    pub tenant_id: String,
    pub subtotal: f64,
    pub total: f64,
    pub discount_type: Option<String>,
    pub discount_value: Option<f64>,
    pub discount_reason: Option<String>,
    pub confirmed_at: Option<String>,
    pub updated_at: String,
}

/// One line of a checkout: service, fee, addon or adjustment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct CheckoutItem {
    pub id: String,
    pub tenant_id: String,
    pub appointment_id: String,
    pub kind: String,
    pub label: String,
    pub qty: f64,
    pub amount: f64,
    pub sort_order: i64,
}

/// One payment attempt/result from a payment rail. Updated in place as the
/// gateway reports state changes; never deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Payment {
    pub id: String,
    pub tenant_id: String,
    pub appointment_id: String,
    pub method: String,
    pub amount: f64,
    pub status: String,
    /// Gateway payment id, unique per tenant; the upsert anchor.
    pub provider_ref: Option<String>,
    pub provider_order_id: Option<String>,
    pub point_terminal_id: Option<String>,
    pub card_mode: Option<String>,
    pub payment_method_id: Option<String>,
    pub installments: Option<i64>,
    pub raw_payload: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}
