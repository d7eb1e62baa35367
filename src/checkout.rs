use async_trait::async_trait;

use crate::config::settings::CheckoutConfig;
use crate::error::{MembershipError, Result};
use crate::plans::Plan;

/// Handoff to the external hosted payment page. The returned URL is a
/// redirect target; completion is reported to a separate success page,
/// never synchronously, so nothing here mutates subscription state.
#[derive(Debug, Clone)]
pub struct CheckoutSessionRequest {
    pub plan: Plan,
    pub customer_email: String,
    /// Our user id, carried through the processor for later
    /// reconciliation.
    pub client_reference_id: String,
}

#[async_trait]
pub trait CheckoutGateway: Send + Sync {
    async fn create_checkout_session(&self, request: &CheckoutSessionRequest) -> Result<String>;
}

const CHECKOUT_SESSIONS_URL: &str = "https://api.stripe.com/v1/checkout/sessions";

/// Stripe-hosted checkout over the form-encoded REST API.
pub struct StripeCheckout {
    config: CheckoutConfig,
    client: reqwest::Client,
}

impl StripeCheckout {
    pub fn new(config: CheckoutConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl CheckoutGateway for StripeCheckout {
    async fn create_checkout_session(&self, request: &CheckoutSessionRequest) -> Result<String> {
        let price_ref = self.config.price_refs.for_plan(request.plan);
        let form: [(&str, &str); 9] = [
            ("mode", "subscription"),
            ("line_items[0][price]", price_ref),
            ("line_items[0][quantity]", "1"),
            ("success_url", &self.config.success_url),
            ("cancel_url", &self.config.cancel_url),
            ("customer_email", &request.customer_email),
            ("client_reference_id", &request.client_reference_id),
            ("metadata[user_id]", &request.client_reference_id),
            ("metadata[plan]", request.plan.as_str()),
        ];

        let response = self
            .client
            .post(CHECKOUT_SESSIONS_URL)
            .basic_auth(&self.config.secret_key, None::<&str>)
            .form(&form)
            .send()
            .await?;

        let status = response.status();
        let body: serde_json::Value = response.json().await?;

        if !status.is_success() {
            let message = body["error"]["message"]
                .as_str()
                .unwrap_or("checkout session creation failed");
            tracing::warn!(status = %status, "checkout session rejected: {}", message);
            return Err(MembershipError::Checkout(message.to_string()));
        }

        body["url"]
            .as_str()
            .map(|url| url.to_string())
            .ok_or_else(|| {
                MembershipError::Checkout("processor response missing redirect url".into())
            })
    }
}
