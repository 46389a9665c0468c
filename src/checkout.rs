//! Subscription checkout boundary.
//!
//! The dashboard never handles payment itself. It asks a backend endpoint to
//! open a checkout session for a plan and gets back a redirect reference, or
//! it fails and the session shows a notice explaining how to wire checkout up.
//!
//! A redirect is not a payment. Premium unlocks only once the backend
//! confirms the session as paid; the demo gateway is the one exception and
//! confirms on the spot.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::platform::encode_component;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Plan {
    Monthly,
    Quarterly,
    Yearly,
}

impl std::fmt::Display for Plan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Plan::Monthly => write!(f, "monthly"),
            Plan::Quarterly => write!(f, "quarterly"),
            Plan::Yearly => write!(f, "yearly"),
        }
    }
}

/// Backend price identifiers, one per plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PriceIds {
    pub monthly: String,
    pub quarterly: String,
    pub yearly: String,
}

impl Default for PriceIds {
    fn default() -> Self {
        Self {
            monthly: "price_monthly_placeholder".to_string(),
            quarterly: "price_quarterly_placeholder".to_string(),
            yearly: "price_yearly_placeholder".to_string(),
        }
    }
}

impl PriceIds {
    pub fn for_plan(&self, plan: Plan) -> &str {
        match plan {
            Plan::Monthly => &self.monthly,
            Plan::Quarterly => &self.quarterly,
            Plan::Yearly => &self.yearly,
        }
    }
}

/// Where to send the viewer to pay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutRedirect {
    pub session_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("checkout endpoint unreachable at {url}: {detail}")]
    Connect { url: String, detail: String },

    #[error("checkout endpoint {url} answered HTTP {status}")]
    Http { status: u16, url: String },

    #[error("checkout response unreadable: {0}")]
    Body(String),

    #[error("checkout is not configured")]
    NotConfigured,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SessionRequest<'a> {
    price_id: &'a str,
    plan: Plan,
    client_reference_id: String,
}

#[derive(Debug, Deserialize)]
struct SessionResponse {
    id: String,
    #[serde(default)]
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ConfirmResponse {
    id: String,
    #[serde(default)]
    paid: bool,
}

/// Calls a backend `create-checkout-session` endpoint, and optionally a
/// confirmation endpoint that reports whether a session was paid.
#[derive(Debug, Clone)]
pub struct HttpCheckout {
    endpoint: String,
    confirm_endpoint: Option<String>,
    prices: PriceIds,
    client: reqwest::Client,
}

impl HttpCheckout {
    pub fn new(endpoint: impl Into<String>, prices: PriceIds, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            endpoint: endpoint.into(),
            confirm_endpoint: None,
            prices,
            client,
        }
    }

    /// Endpoint answering `GET <url>?session_id=<id>` with `{"id", "paid"}`.
    pub fn with_confirm_endpoint(mut self, url: impl Into<String>) -> Self {
        self.confirm_endpoint = Some(url.into());
        self
    }

    pub async fn create_session(&self, plan: Plan) -> Result<CheckoutRedirect, CheckoutError> {
        let body = SessionRequest {
            price_id: self.prices.for_plan(plan),
            plan,
            client_reference_id: uuid::Uuid::new_v4().to_string(),
        };
        let resp = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| CheckoutError::Connect {
                url: self.endpoint.clone(),
                detail: e.to_string(),
            })?;

        if !resp.status().is_success() {
            return Err(CheckoutError::Http {
                status: resp.status().as_u16(),
                url: self.endpoint.clone(),
            });
        }

        let session: SessionResponse = resp
            .json()
            .await
            .map_err(|e| CheckoutError::Body(e.to_string()))?;
        Ok(CheckoutRedirect {
            session_id: session.id,
            url: session.url,
        })
    }

    /// Ask the backend whether `session_id` has been paid.
    pub async fn confirm_session(&self, session_id: &str) -> Result<bool, CheckoutError> {
        let base = self
            .confirm_endpoint
            .as_deref()
            .ok_or(CheckoutError::NotConfigured)?;
        let sep = if base.contains('?') { '&' } else { '?' };
        let url = format!("{}{}session_id={}", base, sep, encode_component(session_id));

        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| CheckoutError::Connect {
                url: base.to_string(),
                detail: e.to_string(),
            })?;

        if !resp.status().is_success() {
            return Err(CheckoutError::Http {
                status: resp.status().as_u16(),
                url: base.to_string(),
            });
        }

        let confirmation: ConfirmResponse = resp
            .json()
            .await
            .map_err(|e| CheckoutError::Body(e.to_string()))?;
        if confirmation.id != session_id {
            return Err(CheckoutError::Body(format!(
                "confirmation for {} answered for {}",
                session_id, confirmation.id
            )));
        }
        Ok(confirmation.paid)
    }
}

/// The checkout collaborator the server talks to.
#[derive(Debug, Clone)]
pub enum CheckoutGateway {
    /// Succeeds at once without a backend.
    Demo,
    Http(HttpCheckout),
    /// No endpoint configured; every attempt fails with a notice.
    Disabled,
}

impl CheckoutGateway {
    pub fn label(&self) -> &'static str {
        match self {
            CheckoutGateway::Demo => "demo",
            CheckoutGateway::Http(_) => "http",
            CheckoutGateway::Disabled => "disabled",
        }
    }

    /// True when a created session counts as paid without confirmation.
    pub fn confirms_instantly(&self) -> bool {
        matches!(self, CheckoutGateway::Demo)
    }

    pub async fn create_session(&self, plan: Plan) -> Result<CheckoutRedirect, CheckoutError> {
        match self {
            CheckoutGateway::Demo => Ok(CheckoutRedirect {
                session_id: format!("demo_{}_{}", plan, uuid::Uuid::new_v4().simple()),
                url: None,
            }),
            CheckoutGateway::Http(http) => http.create_session(plan).await,
            CheckoutGateway::Disabled => Err(CheckoutError::NotConfigured),
        }
    }

    /// Whether the viewer actually paid for `session_id`.
    pub async fn confirm(&self, session_id: &str) -> Result<bool, CheckoutError> {
        match self {
            CheckoutGateway::Demo => Ok(true),
            CheckoutGateway::Http(http) => http.confirm_session(session_id).await,
            CheckoutGateway::Disabled => Err(CheckoutError::NotConfigured),
        }
    }
}

/// Notice shown when checkout for `plan` could not be started.
pub fn failure_notice(plan: Plan, err: &CheckoutError) -> String {
    format!(
        "Checkout would open here for the {} plan ({}).\n\nTo enable:\n\
         1. Set [checkout].endpoint or MSW_CHECKOUT_ENDPOINT to your backend's \
         create-checkout-session URL\n\
         2. Set the monthly/quarterly/yearly price IDs\n\
         3. Set [checkout].confirm_endpoint or MSW_CHECKOUT_CONFIRM_ENDPOINT so \
         payments can be confirmed",
        plan, err
    )
}
