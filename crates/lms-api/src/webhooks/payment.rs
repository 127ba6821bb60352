use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::HeaderMap,
};
use lms_db::repositories::{
    catalog as catalog_repo, purchase as purchase_repo, user as user_repo,
};
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use super::{acknowledged, required_header, signature, signature_rejected};
use crate::{
    ApiState,
    enrollment::{EnrollmentOutcome, Evidence, enroll},
    error::ApiError,
    metrics::record_webhook_event,
};

const PROVIDER: &str = "payments";
const SIGNATURE_HEADER: &str = "x-paystack-signature";

#[derive(Debug, Deserialize)]
struct PaymentEvent {
    event: String,
    data: Value,
}

#[derive(Debug, Deserialize)]
struct ChargeData {
    reference: String,
    amount: i64,
    customer: Customer,
    #[serde(default)]
    metadata: Value,
}

#[derive(Debug, Deserialize)]
struct Customer {
    email: String,
}

/// Find the purchased course in checkout metadata.
///
/// Accepts `courseId` / `course_id` at the top level, a `custom_fields`
/// entry whose `variable_name` is one of those, and metadata delivered as a
/// JSON encoded string.
pub fn course_id_from_metadata(metadata: &Value) -> Option<Uuid> {
    const KEYS: [&str; 2] = ["courseId", "course_id"];

    match metadata {
        Value::String(raw) => serde_json::from_str::<Value>(raw)
            .ok()
            .filter(Value::is_object)
            .and_then(|inner| course_id_from_metadata(&inner)),
        Value::Object(map) => {
            let direct = KEYS
                .iter()
                .filter_map(|key| map.get(*key))
                .find_map(|v| v.as_str().and_then(|s| Uuid::parse_str(s.trim()).ok()));

            direct.or_else(|| {
                map.get("custom_fields")?
                    .as_array()?
                    .iter()
                    .filter(|field| {
                        field
                            .get("variable_name")
                            .and_then(Value::as_str)
                            .is_some_and(|name| KEYS.contains(&name))
                    })
                    .find_map(|field| {
                        field
                            .get("value")
                            .and_then(Value::as_str)
                            .and_then(|s| Uuid::parse_str(s.trim()).ok())
                    })
            })
        }
        _ => None,
    }
}

pub(super) async fn handle(
    State(state): State<ApiState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    let signature = required_header(&headers, SIGNATURE_HEADER, PROVIDER)?;
    signature::verify_paystack(&state.webhooks.payments, &body, signature)
        .map_err(|e| signature_rejected(PROVIDER, e))?;

    let outcome = process(&state, &body).await;
    record_webhook_event(PROVIDER, outcome);
    Ok(acknowledged())
}

/// Apply a verified delivery. Returns the metric outcome label.
async fn process(state: &ApiState, body: &[u8]) -> &'static str {
    let event: PaymentEvent = match serde_json::from_slice(body) {
        Ok(event) => event,
        Err(e) => {
            tracing::warn!(error = %e, "unparseable payment webhook");
            return "malformed";
        }
    };

    if event.event != "charge.success" {
        tracing::debug!(event = %event.event, "ignoring payment event");
        return "ignored";
    }

    let charge: ChargeData = match serde_json::from_value(event.data) {
        Ok(charge) => charge,
        Err(e) => {
            tracing::warn!(error = %e, "charge.success without expected fields");
            return "malformed";
        }
    };

    match apply_charge(state, &charge).await {
        Ok(label) => label,
        Err(e) => {
            tracing::error!(reference = %charge.reference, error = %e, "failed to apply charge");
            "error"
        }
    }
}

async fn apply_charge(state: &ApiState, charge: &ChargeData) -> Result<&'static str, ApiError> {
    if purchase_repo::find_by_reference(&state.pool, &charge.reference)
        .await?
        .is_some()
    {
        tracing::info!(reference = %charge.reference, "payment reference already processed");
        return Ok("duplicate");
    }

    let Some(course_id) = course_id_from_metadata(&charge.metadata) else {
        tracing::warn!(reference = %charge.reference, "charge metadata carries no course id");
        return Ok("unresolved");
    };
    let Some(course) = catalog_repo::find_course(&state.pool, course_id).await? else {
        tracing::warn!(reference = %charge.reference, %course_id, "charge for unknown course");
        return Ok("unresolved");
    };
    let email = charge.customer.email.trim();
    let Some(learner) = user_repo::find_by_email(&state.pool, email).await? else {
        tracing::warn!(reference = %charge.reference, "charge from unknown customer email");
        return Ok("unresolved");
    };

    let evidence = Evidence::Webhook {
        reference: charge.reference.clone(),
        amount: charge.amount,
    };

    match enroll(state, &learner, &course, evidence).await {
        Ok(EnrollmentOutcome::Enrolled(_)) => Ok("enrolled"),
        Ok(EnrollmentOutcome::AlreadyEnrolled(_)) => Ok("duplicate"),
        Err(ApiError::Validation(reason)) => {
            tracing::warn!(reference = %charge.reference, %course_id, %reason, "charge not accepted");
            Ok("rejected")
        }
        Err(e) => Err(e),
    }
}
