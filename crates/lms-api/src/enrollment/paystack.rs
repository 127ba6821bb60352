//! Payment gateway client (Paystack transaction API).

use std::time::Duration;

use serde::Deserialize;

use crate::error::ApiError;

/// Outcome of a server-side transaction lookup. Only this, never the
/// client's own report, is trusted for enrollment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedPayment {
    pub reference: String,
    /// Gateway status string, `"success"` when captured
    pub status: String,
    /// Amount in minor currency units
    pub amount: i64,
    pub currency: Option<String>,
}

impl VerifiedPayment {
    pub fn is_successful(&self) -> bool {
        self.status.eq_ignore_ascii_case("success")
    }
}

#[derive(Deserialize)]
struct VerifyEnvelope {
    status: bool,
    #[serde(default)]
    message: Option<String>,
    data: Option<VerifyData>,
}

#[derive(Deserialize)]
struct VerifyData {
    status: String,
    amount: i64,
    #[serde(default)]
    currency: Option<String>,
    reference: String,
}

#[derive(Clone)]
pub struct PaystackClient {
    http: reqwest::Client,
    base_url: String,
    secret_key: String,
}

impl PaystackClient {
    pub fn new(base_url: &str, secret_key: &str, timeout: Duration) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::ExternalService(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            secret_key: secret_key.to_string(),
        })
    }

    /// `GET /transaction/verify/{reference}`; a single attempt, no retries.
    pub async fn verify_transaction(&self, reference: &str) -> Result<VerifiedPayment, ApiError> {
        validate_reference(reference)?;

        let url = format!("{}/transaction/verify/{}", self.base_url, reference);
        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.secret_key)
            .send()
            .await
            .map_err(|e| ApiError::ExternalService(format!("Payment verification failed: {e}")))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(ApiError::Validation("payment not verified".to_string()));
        }

        let envelope: VerifyEnvelope = response
            .error_for_status()
            .map_err(|e| ApiError::ExternalService(format!("Payment verification failed: {e}")))?
            .json()
            .await
            .map_err(|e| ApiError::ExternalService(format!("Invalid gateway response: {e}")))?;

        match envelope.data {
            Some(data) if envelope.status => Ok(VerifiedPayment {
                reference: data.reference,
                status: data.status,
                amount: data.amount,
                currency: data.currency,
            }),
            _ => {
                tracing::warn!(
                    reference,
                    message = envelope.message.as_deref().unwrap_or_default(),
                    "gateway refused verification"
                );
                Err(ApiError::Validation("payment not verified".to_string()))
            }
        }
    }
}

/// References end up in a URL path; keep them to the gateway's alphabet.
pub fn validate_reference(reference: &str) -> Result<(), ApiError> {
    let valid = !reference.is_empty()
        && reference.len() <= 100
        && reference
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '='));

    if valid {
        Ok(())
    } else {
        Err(ApiError::Validation("Invalid payment reference".to_string()))
    }
}

/// A verified payment may enroll the learner only when it succeeded and
/// covers the current price.
pub fn check_verified_payment(payment: &VerifiedPayment, price: i64) -> Result<(), ApiError> {
    if !payment.is_successful() {
        return Err(ApiError::Validation("payment not verified".to_string()));
    }
    if payment.amount < price {
        return Err(ApiError::Validation(
            "amount paid is less than the course price".to_string(),
        ));
    }
    Ok(())
}
