use lettre::{
    message::header::ContentType,
    transport::smtp::authentication::Credentials,
    Message,
    SmtpTransport,
    Transport,
};
use service_core::async_trait::async_trait;
use service_core::error::AppError;
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[async_trait]
pub trait EmailProvider: Send + Sync {
    async fn send_otp_email(
        &self,
        to_email: &str,
        code: &str,
        purpose_label: &str,
    ) -> Result<(), AppError>;
}

#[derive(Clone)]
pub struct EmailService {
    mailer: SmtpTransport,
    from_email: String,
}

impl EmailService {
    pub fn new(config: &crate::config::SmtpConfig) -> Result<Self, AppError> {
        let creds = Credentials::new(config.user.clone(), config.app_password.clone());

        let mailer = SmtpTransport::relay(&config.host)
            .map_err(|e| AppError::InternalError(anyhow::anyhow!(e.to_string())))?
            .credentials(creds)
            .port(587)
            .timeout(Some(Duration::from_secs(10)))
            .build();

        tracing::info!(host = %config.host, "Email service initialized");

        Ok(Self {
            mailer,
            from_email: config.from.clone(),
        })
    }

    async fn send_email(
        &self,
        to_email: &str,
        subject: &str,
        plain_body: &str,
        html_body: &str,
    ) -> Result<(), AppError> {
        let email = Message::builder()
            .from(self.from_email.parse().map_err(|e: lettre::address::AddressError| AppError::InternalError(e.into()))?)
            .to(to_email.parse().map_err(|e: lettre::address::AddressError| AppError::InternalError(e.into()))?)
            .subject(subject)
            .multipart(
                lettre::message::MultiPart::alternative()
                    .singlepart(
                        lettre::message::SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(plain_body.to_string()),
                    )
                    .singlepart(
                        lettre::message::SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(html_body.to_string()),
                    ),
            )
            .map_err(|e| AppError::InternalError(e.into()))?;

        // Send email in blocking thread pool to avoid blocking async runtime
        let mailer = self.mailer.clone();
        let result = tokio::task::spawn_blocking(move || mailer.send(&email))
            .await
            .map_err(|e| AppError::InternalError(e.into()))?;

        match result {
            Ok(_) => {
                tracing::info!(
                    to = %to_email,
                    subject = %subject,
                    "Email sent successfully"
                );
                Ok(())
            }
            Err(e) => {
                tracing::error!(
                    error = %e.to_string(),
                    to = %to_email,
                    "Failed to send email"
                );
                Err(AppError::DeliveryError(e.to_string()))
            }
        }
    }
}

#[async_trait]
impl EmailProvider for EmailService {
    async fn send_otp_email(
        &self,
        to_email: &str,
        code: &str,
        purpose_label: &str,
    ) -> Result<(), AppError> {
        let html_body = format!(
            r###"            <div style="font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto;">
                <h2 style="color: #1DA1F2;">Twiller Verification Code</h2>
                <p>Your verification code for {} is:</p>
                <div style="background-color: #f0f0f0; padding: 20px; text-align: center; font-size: 24px; font-weight: bold; letter-spacing: 2px; margin: 20px 0;">
                    {}
                </div>
                <p>This code will expire in 10 minutes.</p>
                <p>If you didn't request this code, please ignore this email.</p>
                <hr>
                <p style="color: #666; font-size: 12px;">This is an automated message from Twiller.</p>
            </div>
            "###,
            purpose_label, code
        );

        let plain_body = format!(
            "Your Twiller verification code for {} is: {}\n\nThis code will expire in 10 minutes. If you didn't request this code, please ignore this email.",
            purpose_label, code
        );

        self.send_email(
            to_email,
            &format!("Twiller - Verification Code for {}", purpose_label),
            &plain_body,
            &html_body,
        )
        .await
    }
}

/// Records sends instead of talking to SMTP. Used by tests.
#[derive(Clone, Default)]
pub struct MockEmailService {
    sent: Arc<Mutex<Vec<SentEmail>>>,
    fail: bool,
}

#[derive(Debug, Clone)]
pub struct SentEmail {
    pub to: String,
    pub code: String,
    pub purpose_label: String,
}

impl MockEmailService {
    pub fn new() -> Self {
        Self::default()
    }

    /// A mock whose sends always fail, for delivery-outage scenarios.
    pub fn failing() -> Self {
        Self {
            sent: Arc::default(),
            fail: true,
        }
    }

    pub fn sent(&self) -> Vec<SentEmail> {
        self.sent.lock().expect("mock email lock poisoned").clone()
    }

    pub fn last_code(&self) -> Option<String> {
        self.sent().last().map(|s| s.code.clone())
    }
}

#[async_trait]
impl EmailProvider for MockEmailService {
    async fn send_otp_email(
        &self,
        to_email: &str,
        code: &str,
        purpose_label: &str,
    ) -> Result<(), AppError> {
        if self.fail {
            return Err(AppError::DeliveryError("smtp unavailable".to_string()));
        }
        self.sent.lock().expect("mock email lock poisoned").push(SentEmail {
            to: to_email.to_string(),
            code: code.to_string(),
            purpose_label: purpose_label.to_string(),
        });
        Ok(())
    }
}
