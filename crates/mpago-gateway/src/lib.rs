//! Mercado Pago Orders API client.
//!
//! This crate creates and polls payment orders for three rails and maps the
//! provider's vocabulary into the internal one:
//!
//! - [`OrdersClient`] - the HTTP client: pix, online card and point terminal
//!   order creation plus order reads
//! - [`GatewayConfig`] - credentials and endpoints, from env or builder
//! - [`NormalizedOrder`] - the canonical record extracted from either
//!   response envelope shape
//! - [`idempotency_key`] - stable SHA-256 fingerprint for a logical charge
//!   attempt
//! - [`GatewayError`] - configuration, transport, rejection and mismatch
//!   failures, kept distinct so callers can branch on them
//!
//! Calls are single blocking round-trips with an explicit timeout and no
//! internal retry; retrying a logical charge requires a fresh attempt number
//! so the idempotency key changes on purpose.

pub mod api_types;
pub mod client;
pub mod config;
pub mod error;
pub mod idempotency;
pub mod messages;
pub mod normalize;

pub use client::{CardCharge, OrdersClient, PixCharge, PointCharge};
pub use config::GatewayConfig;
pub use error::{GatewayError, Result};
pub use idempotency::idempotency_key;
pub use normalize::{map_provider_status, NormalizedOrder};
