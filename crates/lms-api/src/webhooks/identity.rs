use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::HeaderMap,
};
use chrono::Utc;
use lms_db::repositories::user as user_repo;
use serde::Deserialize;
use serde_json::Value;

use super::{acknowledged, required_header, signature, signature_rejected};
use crate::{
    ApiState,
    email::{Notification, notify},
    error::ApiError,
    metrics::record_webhook_event,
};

const PROVIDER: &str = "identity";

#[derive(Debug, Deserialize)]
struct IdentityEvent {
    #[serde(rename = "type")]
    kind: String,
    data: Value,
}

#[derive(Debug, Deserialize)]
struct EmailAddress {
    id: String,
    email_address: String,
}

/// Subject attributes carried by `user.created` / `user.updated`
#[derive(Debug, Deserialize)]
struct IdentityUser {
    id: String,
    #[serde(default)]
    email_addresses: Vec<EmailAddress>,
    primary_email_address_id: Option<String>,
    first_name: Option<String>,
    last_name: Option<String>,
    image_url: Option<String>,
}

impl IdentityUser {
    /// The primary address, falling back to the first listed.
    fn primary_email(&self) -> Option<&str> {
        self.primary_email_address_id
            .as_deref()
            .and_then(|primary| self.email_addresses.iter().find(|e| e.id == primary))
            .or_else(|| self.email_addresses.first())
            .map(|e| e.email_address.as_str())
    }

    fn full_name(&self) -> Option<String> {
        let parts: Vec<&str> = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .collect();
        (!parts.is_empty()).then(|| parts.join(" "))
    }
}

#[derive(Debug, Deserialize)]
struct DeletedUser {
    id: Option<String>,
}

pub(super) async fn handle(
    State(state): State<ApiState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    let message_id = required_header(&headers, "svix-id", PROVIDER)?;
    let timestamp = required_header(&headers, "svix-timestamp", PROVIDER)?;
    let signatures = required_header(&headers, "svix-signature", PROVIDER)?;

    signature::verify_svix(
        &state.webhooks.identity,
        message_id,
        timestamp,
        &body,
        signatures,
        Utc::now().timestamp(),
    )
    .map_err(|e| signature_rejected(PROVIDER, e))?;

    let outcome = match serde_json::from_slice::<IdentityEvent>(&body) {
        Ok(event) => match apply(&state, event).await {
            Ok(label) => label,
            Err(e) => {
                tracing::error!(message_id, error = %e, "failed to apply identity event");
                "error"
            }
        },
        Err(e) => {
            tracing::warn!(message_id, error = %e, "unparseable identity webhook");
            "malformed"
        }
    };

    record_webhook_event(PROVIDER, outcome);
    Ok(acknowledged())
}

async fn apply(state: &ApiState, event: IdentityEvent) -> Result<&'static str, ApiError> {
    match event.kind.as_str() {
        "user.created" | "user.updated" => {
            let Ok(subject) = serde_json::from_value::<IdentityUser>(event.data) else {
                tracing::warn!(kind = %event.kind, "identity event without user payload");
                return Ok("malformed");
            };
            let Some(email) = subject.primary_email() else {
                tracing::warn!(external_id = %subject.id, "identity user has no email address");
                return Ok("malformed");
            };

            let name = subject.full_name();
            let (user, inserted) = user_repo::upsert_from_identity(
                &state.pool,
                &subject.id,
                email,
                name.as_deref(),
                subject.image_url.as_deref(),
            )
            .await?;

            if inserted {
                tracing::info!(user_id = %user.id, "user created from identity provider");
                notify(
                    state.email_service.as_ref(),
                    &user.email,
                    Notification::Welcome { name: user.name.clone() },
                );
                Ok("created")
            } else {
                tracing::info!(user_id = %user.id, "user synced from identity provider");
                Ok("updated")
            }
        }
        "user.deleted" => {
            let external_id = serde_json::from_value::<DeletedUser>(event.data)
                .ok()
                .and_then(|d| d.id);
            let Some(external_id) = external_id else {
                tracing::warn!("user.deleted without subject id");
                return Ok("malformed");
            };

            let removed = user_repo::delete_by_external_id(&state.pool, &external_id).await?;
            tracing::info!(%external_id, removed, "user deleted by identity provider");
            Ok("deleted")
        }
        other => {
            tracing::debug!(kind = other, "ignoring identity event");
            Ok("ignored")
        }
    }
}
