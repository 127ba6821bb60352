use lettre::{
    Message, SmtpTransport, Transport, message::Mailbox,
    transport::smtp::authentication::Credentials,
};

use crate::{error::ApiError, metrics::record_email_event};

/// Transactional messages the platform sends.
#[derive(Debug, Clone)]
pub enum Notification {
    Welcome { name: Option<String> },
    EnrollmentConfirmed { course_title: String },
    TutorApplicationReceived { name: Option<String> },
}

impl Notification {
    /// Metric label for this kind of message.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Welcome { .. } => "welcome",
            Self::EnrollmentConfirmed { .. } => "enrollment_confirmed",
            Self::TutorApplicationReceived { .. } => "tutor_application",
        }
    }

    fn subject(&self) -> String {
        match self {
            Self::Welcome { .. } => "Welcome to TutorHub".to_string(),
            Self::EnrollmentConfirmed { course_title } => {
                format!("You're enrolled in {course_title}")
            }
            Self::TutorApplicationReceived { .. } => {
                "We received your tutor application".to_string()
            }
        }
    }

    fn body(&self, frontend_url: &str) -> String {
        match self {
            Self::Welcome { name } => format!(
                "Hi {},\n\nWelcome aboard! Browse the catalog to find your first course:\n{}/courses\n",
                name.as_deref().unwrap_or("there"),
                frontend_url
            ),
            Self::EnrollmentConfirmed { course_title } => format!(
                "Your enrollment in \"{course_title}\" is confirmed.\n\nPick up where you left off at any time:\n{frontend_url}/dashboard\n"
            ),
            Self::TutorApplicationReceived { name } => format!(
                "Hi {},\n\nThanks for applying to teach. An administrator will review your application shortly.\n",
                name.as_deref().unwrap_or("there")
            ),
        }
    }
}

#[derive(Clone)]
pub struct EmailService {
    smtp_host: String,
    smtp_username: String,
    smtp_password: String,
    from: Mailbox,
    frontend_url: String,
}

impl EmailService {
    pub fn new(
        smtp_host: &str,
        smtp_username: &str,
        smtp_password: &str,
        from_email: &str,
        from_name: &str,
        frontend_url: &str,
    ) -> Result<Self, ApiError> {
        let from: Mailbox = format!("{from_name} <{from_email}>")
            .parse()
            .map_err(|e| ApiError::Email(format!("Invalid from email: {e}")))?;

        Ok(Self {
            smtp_host: smtp_host.to_string(),
            smtp_username: smtp_username.to_string(),
            smtp_password: smtp_password.to_string(),
            from,
            frontend_url: frontend_url.to_string(),
        })
    }

    fn create_transport(&self) -> Result<SmtpTransport, ApiError> {
        let credentials = Credentials::new(self.smtp_username.clone(), self.smtp_password.clone());

        let transport = SmtpTransport::relay(&self.smtp_host)
            .map_err(|e| ApiError::Email(format!("Failed to create SMTP transport: {e}")))?
            .credentials(credentials)
            .build();

        Ok(transport)
    }

    /// Blocking send. Prefer [`EmailService::dispatch`] from request handlers.
    pub fn send(&self, to_email: &str, notification: &Notification) -> Result<(), ApiError> {
        let to: Mailbox = to_email
            .parse()
            .map_err(|e| ApiError::Validation(format!("Invalid recipient email: {e}")))?;

        let email = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(notification.subject())
            .body(notification.body(&self.frontend_url))
            .map_err(|e| ApiError::Email(format!("Failed to build email: {e}")))?;

        self.create_transport()?
            .send(&email)
            .map_err(|e| ApiError::Email(format!("Failed to send email: {e}")))?;

        Ok(())
    }

    /// Send on the blocking pool without waiting for the result.
    ///
    /// Failures are logged and counted; they never reach the caller.
    pub fn dispatch(&self, to_email: String, notification: Notification) {
        let service = self.clone();
        tokio::task::spawn_blocking(move || {
            let kind = notification.kind();
            match service.send(&to_email, &notification) {
                Ok(()) => {
                    tracing::info!(kind, "email sent");
                    record_email_event(kind, true);
                }
                Err(e) => {
                    tracing::warn!(kind, error = %e, "email delivery failed");
                    record_email_event(kind, false);
                }
            }
        });
    }
}

/// Fire-and-forget helper for handlers holding an optional service.
pub fn notify(service: Option<&EmailService>, to_email: &str, notification: Notification) {
    match service {
        Some(service) => service.dispatch(to_email.to_string(), notification),
        None => tracing::debug!(kind = notification.kind(), "email service not configured, skipping"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_from_address_rejected() {
        let result = EmailService::new(
            "smtp.example.com",
            "user",
            "pass",
            "not an email",
            "TutorHub",
            "http://localhost:3000",
        );
        assert!(matches!(result, Err(ApiError::Email(_))));
    }

    #[test]
    fn test_enrollment_body_mentions_course() {
        let notification = Notification::EnrollmentConfirmed {
            course_title: "Rust for Beginners".to_string(),
        };
        assert!(notification.subject().contains("Rust for Beginners"));
        assert!(
            notification
                .body("https://app.example.com")
                .contains("https://app.example.com/dashboard")
        );
    }

    #[test]
    fn test_welcome_without_name() {
        let notification = Notification::Welcome { name: None };
        assert!(notification.body("http://x").starts_with("Hi there"));
        assert_eq!(notification.kind(), "welcome");
    }
}
