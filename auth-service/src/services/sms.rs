use service_core::async_trait::async_trait;
use service_core::error::AppError;
use std::sync::{Arc, Mutex};

#[async_trait]
pub trait SmsProvider: Send + Sync {
    async fn send_otp_sms(
        &self,
        phone: &str,
        code: &str,
        purpose_label: &str,
    ) -> Result<(), AppError>;
}

/// Twilio Messages API client.
#[derive(Clone)]
pub struct TwilioSmsService {
    http: reqwest::Client,
    account_sid: String,
    auth_token: String,
    from_number: String,
}

impl TwilioSmsService {
    pub fn new(config: &crate::config::TwilioConfig) -> Self {
        tracing::info!(from = %config.from_number, "SMS service initialized");
        Self {
            http: reqwest::Client::new(),
            account_sid: config.account_sid.clone(),
            auth_token: config.auth_token.clone(),
            from_number: config.from_number.clone(),
        }
    }
}

#[async_trait]
impl SmsProvider for TwilioSmsService {
    async fn send_otp_sms(
        &self,
        phone: &str,
        code: &str,
        purpose_label: &str,
    ) -> Result<(), AppError> {
        let url = format!(
            "https://api.twilio.com/2010-04-01/Accounts/{}/Messages.json",
            self.account_sid
        );
        let body = format!(
            "Twiller - Your verification code for {} is: {}. This code will expire in 10 minutes.",
            purpose_label, code
        );

        let response = self
            .http
            .post(&url)
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(&[
                ("To", phone),
                ("From", self.from_number.as_str()),
                ("Body", body.as_str()),
            ])
            .send()
            .await
            .map_err(|e| AppError::DeliveryError(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            tracing::error!(
                to = %phone,
                status = %status,
                detail = %detail,
                "Failed to send SMS"
            );
            return Err(AppError::DeliveryError(format!(
                "Twilio returned {}",
                status
            )));
        }

        tracing::info!(to = %phone, "SMS sent successfully");
        Ok(())
    }
}

/// Records sends instead of talking to Twilio. Used by tests.
#[derive(Clone, Default)]
pub struct MockSmsService {
    sent: Arc<Mutex<Vec<SentSms>>>,
    fail: bool,
}

#[derive(Debug, Clone)]
pub struct SentSms {
    pub to: String,
    pub code: String,
    pub purpose_label: String,
}

impl MockSmsService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            sent: Arc::default(),
            fail: true,
        }
    }

    pub fn sent(&self) -> Vec<SentSms> {
        self.sent.lock().expect("mock sms lock poisoned").clone()
    }

    pub fn last_code(&self) -> Option<String> {
        self.sent().last().map(|s| s.code.clone())
    }
}

#[async_trait]
impl SmsProvider for MockSmsService {
    async fn send_otp_sms(
        &self,
        phone: &str,
        code: &str,
        purpose_label: &str,
    ) -> Result<(), AppError> {
        if self.fail {
            return Err(AppError::DeliveryError("sms gateway unavailable".to_string()));
        }
        self.sent.lock().expect("mock sms lock poisoned").push(SentSms {
            to: phone.to_string(),
            code: code.to_string(),
            purpose_label: purpose_label.to_string(),
        });
        Ok(())
    }
}
