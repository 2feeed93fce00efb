//! Core domain types and pure calculators for the studio booking system.
//!
//! This crate holds everything that can be computed without I/O:
//!
//! - [`status`] - string-backed status vocabularies shared across crates
//! - [`buffer`] - before/after buffer resolution from the override cascade
//! - [`totals`] - checkout subtotal/total arithmetic with discount clamping
//! - [`interval`] - half-open interval math used for slot collision checks
//! - [`payment_status`] - the single reducer deriving an appointment's
//!   aggregate payment status from its totals and paid payments
//! - [`timer`] - the pausable attendance session clock
//! - [`money`] - cent rounding and the paid-in-full epsilon
//!
//! Everything here is deterministic and total; fallible operations return
//! explicit errors rather than panicking.

pub mod buffer;
pub mod interval;
pub mod money;
pub mod payment_status;
pub mod status;
pub mod time;
pub mod timer;
pub mod totals;

pub use buffer::{buffer_candidates, effective_buffer, resolve_buffer, BufferKind, BufferOverrides};
pub use interval::{occupied_interval, overlaps};
pub use money::{covers, round2, PAID_EPSILON};
pub use payment_status::derive_payment_status;
pub use status::{
    AppointmentStatus, CardMode, DiscountType, ParseEnumError, PaymentMethod, PaymentState,
    PaymentStatus, TimerStatus,
};
pub use timer::{TimerError, TimerState};
pub use totals::{compute_totals, LineItem, Totals};
