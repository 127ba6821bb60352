use std::time::Duration;

use axum::extract::FromRef;
use sqlx::PgPool;

use crate::{
    ApiConfig,
    config::Environment,
    email::EmailService,
    enrollment::paystack::PaystackClient,
    video::mux::MuxClient,
};

/// Session token verification settings
#[derive(Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
}

/// Shared secrets used to authenticate inbound webhooks
#[derive(Clone)]
pub struct WebhookSecrets {
    pub payments: String,
    pub identity: String,
    pub video: String,
}

#[derive(Clone)]
pub struct ApiState {
    pub pool: PgPool,
    pub auth: AuthConfig,
    pub webhooks: WebhookSecrets,
    pub payments: PaystackClient,
    pub video: MuxClient,
    pub email_service: Option<EmailService>,
    pub frontend_url: String,
    pub environment: Environment,
}

impl ApiState {
    /// Build the state around an already constructed pool.
    pub fn new(config: &ApiConfig, pool: PgPool) -> anyhow::Result<Self> {
        let timeout = Duration::from_secs(config.http_timeout_secs);

        let payments = PaystackClient::new(
            &config.paystack_base_url,
            &config.paystack_secret_key,
            timeout,
        )?;
        let video = MuxClient::new(
            &config.mux_base_url,
            &config.mux_token_id,
            &config.mux_token_secret,
            timeout,
        )?;

        // Initialize email service if SMTP is configured
        let email_service = if let (
            Some(host),
            Some(username),
            Some(password),
            Some(from_email),
            Some(from_name),
        ) = (
            config.smtp_host.as_ref(),
            config.smtp_username.as_ref(),
            config.smtp_password.as_ref(),
            config.smtp_from_email.as_ref(),
            config.smtp_from_name.as_ref(),
        ) {
            match EmailService::new(
                host,
                username,
                password,
                from_email,
                from_name,
                &config.frontend_url,
            ) {
                Ok(service) => Some(service),
                Err(e) => {
                    tracing::error!("Failed to initialize email service: {e}");
                    None
                }
            }
        } else {
            tracing::warn!("Email service not configured (missing SMTP environment variables)");
            None
        };

        Ok(Self {
            pool,
            auth: AuthConfig {
                jwt_secret: config.jwt_secret.clone(),
            },
            webhooks: WebhookSecrets {
                payments: config.paystack_secret_key.clone(),
                identity: config.identity_webhook_secret.clone(),
                video: config.mux_webhook_secret.clone(),
            },
            payments,
            video,
            email_service,
            frontend_url: config.frontend_url.clone(),
            environment: config.environment,
        })
    }
}

impl FromRef<ApiState> for AuthConfig {
    fn from_ref(state: &ApiState) -> Self {
        state.auth.clone()
    }
}
