//! Wire types for the Orders API.
//!
//! Requests are fully typed; responses are typed with optional fields
//! because the provider varies the shape by endpoint and envelope. The
//! [`OrderEnvelope`] union absorbs both the bare resource and the
//! `{ "data": ... }` wrapper so normalization happens in exactly one place.

use serde::{Deserialize, Serialize};

/// Order creation request body.
#[derive(Debug, Clone, Serialize)]
pub struct CreateOrderRequest {
    /// "online" or "point".
    #[serde(rename = "type")]
    pub order_type: String,
    /// The appointment id, echoed back by the provider on reads.
    pub external_reference: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub transactions: TransactionsRequest,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config: Option<OrderConfigRequest>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TransactionsRequest {
    pub payments: Vec<PaymentRequest>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PaymentRequest {
    /// Amount with two decimals, as a string per the API contract.
    pub amount: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<PaymentMethodRequest>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiration_time: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PaymentMethodRequest {
    /// Payment method id ("pix", "master", ...).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// "bank_transfer", "credit_card" or "debit_card".
    #[serde(rename = "type")]
    pub method_type: String,
    /// Single-use card token for online card charges.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub installments: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issuer_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub statement_descriptor: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OrderConfigRequest {
    pub point: PointConfigRequest,
}

#[derive(Debug, Clone, Serialize)]
pub struct PointConfigRequest {
    /// Physical terminal the charge is dispatched to.
    pub terminal_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub print_on_terminal: Option<bool>,
}

/// Order resource as returned by creation and read endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct OrderResource {
    pub id: Option<String>,
    pub status: Option<String>,
    pub status_detail: Option<String>,
    pub external_reference: Option<String>,
    pub created_date: Option<String>,
    pub total_amount: Option<String>,
    pub transactions: Option<TransactionsResource>,
    pub config: Option<OrderConfigResource>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TransactionsResource {
    pub payments: Option<Vec<PaymentResource>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PaymentResource {
    pub id: Option<String>,
    pub amount: Option<String>,
    pub status: Option<String>,
    pub status_detail: Option<String>,
    pub expiration_time: Option<String>,
    pub payment_method: Option<PaymentMethodResource>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PaymentMethodResource {
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub method_type: Option<String>,
    pub installments: Option<u32>,
    pub ticket_url: Option<String>,
    pub qr_code: Option<String>,
    pub qr_code_base64: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct OrderConfigResource {
    pub point: Option<PointConfigResource>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PointConfigResource {
    pub terminal_id: Option<String>,
}

/// Some endpoints wrap the order in a `data` envelope, others return it
/// bare.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum OrderEnvelope {
    Wrapped { data: OrderResource },
    Bare(OrderResource),
}

impl OrderEnvelope {
    pub fn into_order(self) -> OrderResource {
        match self {
            OrderEnvelope::Wrapped { data } => data,
            OrderEnvelope::Bare(order) => order,
        }
    }
}

/// Error body returned on 4xx/5xx responses.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ApiErrorBody {
    pub errors: Option<Vec<ApiErrorDetail>>,
    pub code: Option<String>,
    pub message: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ApiErrorDetail {
    pub code: Option<String>,
    pub message: Option<String>,
}

impl ApiErrorBody {
    /// First error code and message, falling back through the flat fields.
    pub fn first_error(&self) -> (String, String) {
        if let Some(detail) = self.errors.as_ref().and_then(|errors| errors.first()) {
            return (
                detail.code.clone().unwrap_or_default(),
                detail.message.clone().unwrap_or_default(),
            );
        }
        (
            self.code.clone().unwrap_or_default(),
            self.message.clone().unwrap_or_default(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_bare() {
        let json = r#"{"id": "ord-1", "status": "processed"}"#;
        let envelope: OrderEnvelope = serde_json::from_str(json).unwrap();
        let order = envelope.into_order();
        assert_eq!(order.id.as_deref(), Some("ord-1"));
        assert_eq!(order.status.as_deref(), Some("processed"));
    }

    #[test]
    fn test_envelope_wrapped() {
        let json = r#"{"data": {"id": "ord-2", "status": "created"}}"#;
        let envelope: OrderEnvelope = serde_json::from_str(json).unwrap();
        let order = envelope.into_order();
        assert_eq!(order.id.as_deref(), Some("ord-2"));
    }

    #[test]
    fn test_error_body_nested_and_flat() {
        let nested: ApiErrorBody = serde_json::from_str(
            r#"{"errors": [{"code": "invalid_payer", "message": "payer.email invalid"}]}"#,
        )
        .unwrap();
        assert_eq!(
            nested.first_error(),
            ("invalid_payer".to_string(), "payer.email invalid".to_string())
        );

        let flat: ApiErrorBody =
            serde_json::from_str(r#"{"code": "unauthorized", "message": "bad token"}"#).unwrap();
        assert_eq!(
            flat.first_error(),
            ("unauthorized".to_string(), "bad token".to_string())
        );
    }

    #[test]
    fn test_point_request_serializes_terminal() {
        let request = CreateOrderRequest {
            order_type: "point".to_string(),
            external_reference: "appt-1".to_string(),
            description: None,
            transactions: TransactionsRequest {
                payments: vec![PaymentRequest {
                    amount: "150.00".to_string(),
                    payment_method: Some(PaymentMethodRequest {
                        id: None,
                        method_type: "credit_card".to_string(),
                        token: None,
                        installments: None,
                        issuer_id: None,
                        statement_descriptor: None,
                    }),
                    expiration_time: None,
                }],
            },
            config: Some(OrderConfigRequest {
                point: PointConfigRequest {
                    terminal_id: "PAX-A910".to_string(),
                    print_on_terminal: Some(false),
                },
            }),
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["type"], "point");
        assert_eq!(json["config"]["point"]["terminal_id"], "PAX-A910");
        assert_eq!(json["transactions"]["payments"][0]["amount"], "150.00");
        // Absent optionals are omitted, not null.
        assert!(json["transactions"]["payments"][0]
            .get("expiration_time")
            .is_none());
    }
}
