//! OrdersClient implementation.

use std::time::Duration;

use booking_core::CardMode;
use chrono::Utc;
use reqwest::Client;
use tracing::{debug, info, warn};

use crate::api_types::{
    ApiErrorBody, CreateOrderRequest, OrderConfigRequest, OrderEnvelope, PaymentMethodRequest,
    PaymentRequest, PointConfigRequest, TransactionsRequest,
};
use crate::config::GatewayConfig;
use crate::error::{GatewayError, Result};
use crate::idempotency::idempotency_key;
use crate::messages;
use crate::normalize::{normalize_order, NormalizedOrder};

/// An instant-transfer (pix) charge to create.
#[derive(Debug, Clone)]
pub struct PixCharge {
    pub appointment_id: String,
    pub amount: f64,
    /// Retry counter for the logical charge; bump it to retry on purpose.
    pub attempt: u32,
    pub description: Option<String>,
}

/// An online tokenized-card charge to create.
#[derive(Debug, Clone)]
pub struct CardCharge {
    pub appointment_id: String,
    pub amount: f64,
    pub attempt: u32,
    /// Single-use card token produced by the client-side SDK.
    pub token: String,
    pub payment_method_id: String,
    pub issuer_id: Option<String>,
    pub installments: u32,
    pub description: Option<String>,
}

/// An in-person terminal charge to dispatch.
#[derive(Debug, Clone)]
pub struct PointCharge {
    pub appointment_id: String,
    pub amount: f64,
    pub attempt: u32,
    pub terminal_id: String,
    pub card_mode: CardMode,
    pub description: Option<String>,
}

/// HTTP client for the Orders API.
///
/// Every create call carries an idempotency key derived from the charge
/// tuple; there is no internal retry loop, and a transport failure leaves
/// the charge outcome unknown until the next poll.
pub struct OrdersClient {
    client: Client,
    config: GatewayConfig,
}

impl OrdersClient {
    /// Create a new client, validating the credential class up front.
    pub fn new(config: GatewayConfig) -> Result<Self> {
        config.validate_credentials()?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| {
                GatewayError::Configuration(format!("failed to create HTTP client: {}", e))
            })?;

        info!("OrdersClient initialized for {}", config.api_url);

        Ok(Self { client, config })
    }

    /// Create a client from environment variables.
    ///
    /// See [`GatewayConfig::from_env`] for the variables involved.
    pub fn from_env() -> Result<Self> {
        let config = GatewayConfig::from_env()?;
        Self::new(config)
    }

    /// Get the configuration.
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Create a pix order. The returned order carries the renderable
    /// code/QR; a missing provider expiry defaults to the configured window
    /// after creation.
    pub async fn create_pix_order(&self, charge: &PixCharge) -> Result<NormalizedOrder> {
        let request = CreateOrderRequest {
            order_type: "online".to_string(),
            external_reference: charge.appointment_id.clone(),
            description: charge.description.clone(),
            transactions: TransactionsRequest {
                payments: vec![PaymentRequest {
                    amount: format!("{:.2}", charge.amount),
                    payment_method: Some(PaymentMethodRequest {
                        id: Some("pix".to_string()),
                        method_type: "bank_transfer".to_string(),
                        token: None,
                        installments: None,
                        issuer_id: None,
                        statement_descriptor: None,
                    }),
                    expiration_time: None,
                }],
            },
            config: None,
        };

        let key = idempotency_key("pix", &charge.appointment_id, "", charge.amount, charge.attempt);
        let mut order = self.send_order(&request, &key).await?;

        if order.expires_at.is_none() {
            let created = order.created_at.unwrap_or_else(Utc::now);
            order.expires_at =
                Some(created + chrono::Duration::hours(self.config.pix_expiration_hours));
        }

        Ok(order)
    }

    /// Create an online card order carrying a single-use token.
    pub async fn create_card_order(&self, charge: &CardCharge) -> Result<NormalizedOrder> {
        let request = CreateOrderRequest {
            order_type: "online".to_string(),
            external_reference: charge.appointment_id.clone(),
            description: charge.description.clone(),
            transactions: TransactionsRequest {
                payments: vec![PaymentRequest {
                    amount: format!("{:.2}", charge.amount),
                    payment_method: Some(PaymentMethodRequest {
                        id: Some(charge.payment_method_id.clone()),
                        method_type: "credit_card".to_string(),
                        token: Some(charge.token.clone()),
                        installments: Some(charge.installments.max(1)),
                        issuer_id: charge.issuer_id.clone(),
                        statement_descriptor: None,
                    }),
                    expiration_time: None,
                }],
            },
            config: None,
        };

        let key = idempotency_key(
            "card",
            &charge.appointment_id,
            &charge.token,
            charge.amount,
            charge.attempt,
        );
        self.send_order(&request, &key).await
    }

    /// Dispatch a charge to a physical terminal. The terminal handles the
    /// card interaction out-of-band; this call only queues the charge and
    /// the result arrives via [`OrdersClient::get_order`] polling.
    pub async fn create_point_order(&self, charge: &PointCharge) -> Result<NormalizedOrder> {
        let method_type = match charge.card_mode {
            CardMode::Debit => "debit_card",
            CardMode::Credit => "credit_card",
        };

        let request = CreateOrderRequest {
            order_type: "point".to_string(),
            external_reference: charge.appointment_id.clone(),
            description: charge.description.clone(),
            transactions: TransactionsRequest {
                payments: vec![PaymentRequest {
                    amount: format!("{:.2}", charge.amount),
                    payment_method: Some(PaymentMethodRequest {
                        id: None,
                        method_type: method_type.to_string(),
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
                    terminal_id: charge.terminal_id.clone(),
                    print_on_terminal: Some(true),
                },
            }),
        };

        let discriminator = format!("{}:{}", charge.terminal_id, charge.card_mode);
        let key = idempotency_key(
            "point",
            &charge.appointment_id,
            &discriminator,
            charge.amount,
            charge.attempt,
        );
        self.send_order(&request, &key).await
    }

    /// Read an order by id.
    pub async fn get_order(&self, order_id: &str) -> Result<NormalizedOrder> {
        let url = format!("{}/v1/orders/{}", self.config.api_url, order_id);

        debug!("Reading order {}", order_id);

        let response = self
            .client
            .get(&url)
            .header(
                "Authorization",
                format!("Bearer {}", self.config.access_token),
            )
            .send()
            .await
            .map_err(|e| GatewayError::Network(format!("failed to read order: {}", e)))?;

        self.decode_order(response).await
    }

    /// POST an order creation request with its idempotency key.
    async fn send_order(
        &self,
        request: &CreateOrderRequest,
        idempotency_key: &str,
    ) -> Result<NormalizedOrder> {
        let url = format!("{}/v1/orders", self.config.api_url);

        debug!(
            "Creating {} order for {}",
            request.order_type, request.external_reference
        );

        let response = self
            .client
            .post(&url)
            .header(
                "Authorization",
                format!("Bearer {}", self.config.access_token),
            )
            .header("X-Idempotency-Key", idempotency_key)
            .json(request)
            .send()
            .await
            .map_err(|e| GatewayError::Network(format!("failed to send order: {}", e)))?;

        self.decode_order(response).await
    }

    /// Shared response decoding: HTTP rejection mapping, envelope
    /// extraction, normalization.
    async fn decode_order(&self, response: reqwest::Response) -> Result<NormalizedOrder> {
        let status = response.status();

        if !status.is_success() {
            let body = response
                .text()
                .await
                .map_err(|e| GatewayError::Network(format!("failed to read error body: {}", e)))?;

            let parsed: ApiErrorBody = serde_json::from_str(&body).unwrap_or_default();
            let (code, message) = parsed.first_error();
            let message = if message.is_empty() { body } else { message };

            warn!("Gateway rejected request ({}): {}: {}", status, code, message);

            return Err(GatewayError::Rejected {
                status: status.as_u16(),
                user_message: messages::user_message(&code, &message),
                code,
                message,
            });
        }

        let raw: serde_json::Value = response
            .json()
            .await
            .map_err(|e| GatewayError::Network(format!("failed to read response body: {}", e)))?;

        let envelope: OrderEnvelope = serde_json::from_value(raw.clone())
            .map_err(|e| GatewayError::InvalidResponse(format!("unexpected order shape: {}", e)))?;

        let order = normalize_order(envelope.into_order(), raw)?;

        debug!(
            "Order {} is {} ({})",
            order.order_id,
            order.provider_status,
            order.state
        );

        Ok(order)
    }
}
