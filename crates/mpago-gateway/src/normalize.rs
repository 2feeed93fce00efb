//! Response normalization.
//!
//! Whatever shape the provider answers with, the rest of the system only
//! ever sees a [`NormalizedOrder`]: one canonical record with the provider
//! status already mapped into the internal three-state vocabulary.

use booking_core::PaymentState;
use chrono::{DateTime, Utc};

use crate::api_types::OrderResource;
use crate::error::{GatewayError, Result};

/// Canonical view of one gateway order.
#[derive(Debug, Clone)]
pub struct NormalizedOrder {
    pub order_id: String,
    /// Provider payment id; the idempotency anchor for the payments table.
    pub payment_id: Option<String>,
    /// Raw provider status string, kept for auditing.
    pub provider_status: String,
    pub status_detail: Option<String>,
    /// Internal three-state mapping of `provider_status`.
    pub state: PaymentState,
    pub amount: Option<f64>,
    pub external_reference: Option<String>,
    pub terminal_id: Option<String>,
    pub payment_method_id: Option<String>,
    pub installments: Option<u32>,
    pub ticket_url: Option<String>,
    pub qr_code: Option<String>,
    pub qr_code_base64: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
    /// Full decoded payload, persisted alongside the payment row.
    pub raw: serde_json::Value,
}

/// Map a provider status string to the internal payment state.
pub fn map_provider_status(status: &str) -> PaymentState {
    match status.to_ascii_lowercase().as_str() {
        "approved" | "processed" | "accredited" | "partially_refunded" => PaymentState::Paid,
        "rejected" | "cancelled" | "canceled" | "charged_back" | "failed" | "refunded" => {
            PaymentState::Failed
        }
        _ => PaymentState::Pending,
    }
}

fn parse_instant(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|parsed| parsed.with_timezone(&Utc))
}

/// Flatten an [`OrderResource`] into the canonical record.
///
/// The order id is the one field that must be present; everything else is
/// carried as found. The payment-level status wins over the order-level one
/// when both exist.
pub fn normalize_order(order: OrderResource, raw: serde_json::Value) -> Result<NormalizedOrder> {
    let order_id = order
        .id
        .ok_or_else(|| GatewayError::InvalidResponse("order id missing".to_string()))?;

    let payment = order
        .transactions
        .and_then(|transactions| transactions.payments)
        .and_then(|payments| payments.into_iter().next());

    let provider_status = payment
        .as_ref()
        .and_then(|p| p.status.clone())
        .or(order.status)
        .unwrap_or_else(|| "pending".to_string());

    let status_detail = payment
        .as_ref()
        .and_then(|p| p.status_detail.clone())
        .or(order.status_detail);

    let amount = payment
        .as_ref()
        .and_then(|p| p.amount.as_deref())
        .or(order.total_amount.as_deref())
        .and_then(|value| value.parse::<f64>().ok());

    let method = payment.as_ref().and_then(|p| p.payment_method.clone());

    Ok(NormalizedOrder {
        state: map_provider_status(&provider_status),
        payment_id: payment.as_ref().and_then(|p| p.id.clone()),
        provider_status,
        status_detail,
        amount,
        external_reference: order.external_reference,
        terminal_id: order
            .config
            .and_then(|config| config.point)
            .and_then(|point| point.terminal_id),
        payment_method_id: method.as_ref().and_then(|m| m.id.clone()),
        installments: method.as_ref().and_then(|m| m.installments),
        ticket_url: method.as_ref().and_then(|m| m.ticket_url.clone()),
        qr_code: method.as_ref().and_then(|m| m.qr_code.clone()),
        qr_code_base64: method.as_ref().and_then(|m| m.qr_code_base64.clone()),
        created_at: order.created_date.as_deref().and_then(parse_instant),
        expires_at: payment
            .as_ref()
            .and_then(|p| p.expiration_time.as_deref())
            .and_then(parse_instant),
        order_id,
        raw,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api_types::OrderEnvelope;

    fn normalize_json(json: &str) -> NormalizedOrder {
        let raw: serde_json::Value = serde_json::from_str(json).unwrap();
        let envelope: OrderEnvelope = serde_json::from_value(raw.clone()).unwrap();
        normalize_order(envelope.into_order(), raw).unwrap()
    }

    #[test]
    fn test_status_mapping_table() {
        for status in ["approved", "processed", "accredited", "partially_refunded"] {
            assert_eq!(map_provider_status(status), PaymentState::Paid, "{status}");
        }
        for status in [
            "rejected",
            "cancelled",
            "canceled",
            "charged_back",
            "failed",
            "refunded",
        ] {
            assert_eq!(map_provider_status(status), PaymentState::Failed, "{status}");
        }
        for status in ["pending", "in_process", "created", "at_terminal", ""] {
            assert_eq!(map_provider_status(status), PaymentState::Pending, "{status}");
        }
    }

    #[test]
    fn test_normalize_full_order() {
        let order = normalize_json(
            r#"{
                "id": "ord-1",
                "status": "processed",
                "external_reference": "appt-1",
                "created_date": "2025-06-01T12:00:00Z",
                "transactions": {
                    "payments": [{
                        "id": "pay-1",
                        "amount": "150.00",
                        "status": "accredited",
                        "status_detail": "accredited",
                        "payment_method": {
                            "id": "pix",
                            "type": "bank_transfer",
                            "qr_code": "00020126...",
                            "qr_code_base64": "iVBOR...",
                            "ticket_url": "https://pay.example/t/1"
                        },
                        "expiration_time": "2025-06-02T12:00:00Z"
                    }]
                }
            }"#,
        );
        assert_eq!(order.order_id, "ord-1");
        assert_eq!(order.payment_id.as_deref(), Some("pay-1"));
        assert_eq!(order.provider_status, "accredited");
        assert_eq!(order.state, PaymentState::Paid);
        assert_eq!(order.amount, Some(150.0));
        assert_eq!(order.external_reference.as_deref(), Some("appt-1"));
        assert_eq!(order.payment_method_id.as_deref(), Some("pix"));
        assert!(order.qr_code.is_some());
        assert_eq!(
            order.expires_at.map(|e| e.to_rfc3339()),
            Some("2025-06-02T12:00:00+00:00".to_string())
        );
    }

    #[test]
    fn test_normalize_wrapped_point_order() {
        let order = normalize_json(
            r#"{
                "data": {
                    "id": "ord-2",
                    "status": "created",
                    "external_reference": "appt-9",
                    "total_amount": "80.00",
                    "config": {"point": {"terminal_id": "PAX-A910"}}
                }
            }"#,
        );
        assert_eq!(order.order_id, "ord-2");
        assert_eq!(order.state, PaymentState::Pending);
        assert_eq!(order.amount, Some(80.0));
        assert_eq!(order.terminal_id.as_deref(), Some("PAX-A910"));
        assert!(order.payment_id.is_none());
    }

    #[test]
    fn test_missing_order_id_is_invalid() {
        let raw: serde_json::Value = serde_json::from_str(r#"{"status": "created"}"#).unwrap();
        let envelope: OrderEnvelope = serde_json::from_value(raw.clone()).unwrap();
        let err = normalize_order(envelope.into_order(), raw).unwrap_err();
        assert!(matches!(err, GatewayError::InvalidResponse(_)));
    }
}
