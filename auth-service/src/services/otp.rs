//! One-time code lifecycle: issue, deliver, verify.
//!
//! At most one active (unconsumed, unexpired) code exists per
//! `(user, purpose)`: issuing a new code for the same purpose supersedes the
//! previous one outright, even if it has not expired. The store's `replace`
//! is a single atomic per-key operation, so concurrent issues cannot leave
//! two codes verifiable.

use chrono::Utc;
use rand::Rng;
use std::sync::Arc;

use service_core::error::AppError;

use crate::models::{OtpPurpose, PendingOtp, User};
use crate::services::email::EmailProvider;
use crate::services::policy::OtpChannel;
use crate::services::sms::SmsProvider;
use crate::services::store::PendingOtpStore;
use crate::services::ServiceError;

/// Outcome of a verification attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifyResult {
    Ok,
    Invalid,
    Expired,
    NonePending,
}

#[derive(Clone)]
pub struct OtpService {
    store: Arc<dyn PendingOtpStore>,
    email: Arc<dyn EmailProvider>,
    sms: Arc<dyn SmsProvider>,
}

impl OtpService {
    pub fn new(
        store: Arc<dyn PendingOtpStore>,
        email: Arc<dyn EmailProvider>,
        sms: Arc<dyn SmsProvider>,
    ) -> Self {
        Self { store, email, sms }
    }

    /// Uniformly random 6-digit decimal code.
    fn generate_code() -> String {
        rand::thread_rng().gen_range(100_000..=999_999).to_string()
    }

    /// Issue a code for `(user, purpose)` and hand it to the delivery
    /// channel. Delivery is best-effort: a provider outage is logged and the
    /// code stays valid, so the user can still complete the flow after a
    /// resend or once the provider recovers.
    pub async fn issue(
        &self,
        user: &User,
        purpose: OtpPurpose,
        channel: OtpChannel,
    ) -> Result<String, ServiceError> {
        let code = Self::generate_code();
        let pending = PendingOtp::new(user.id.clone(), purpose, code.clone(), Utc::now());
        self.store.replace(pending).await?;

        let delivery = match channel {
            OtpChannel::Email => {
                self.email
                    .send_otp_email(&user.email, &code, purpose.label())
                    .await
            }
            OtpChannel::Sms => match user.phone.as_deref() {
                Some(phone) => self.sms.send_otp_sms(phone, &code, purpose.label()).await,
                None => Err(AppError::DeliveryError(
                    "no phone number on file".to_string(),
                )),
            },
            OtpChannel::None => Ok(()),
        };

        if let Err(e) = delivery {
            // The code itself is never logged.
            tracing::warn!(
                user_id = %user.id,
                purpose = %purpose.as_str(),
                error = %e,
                "OTP delivery failed, code remains valid until expiry"
            );
        }

        Ok(code)
    }

    /// Verify a supplied code. Consumption state is checked before the
    /// string comparison: a consumed or superseded code can never verify
    /// again, even if the digits match.
    pub async fn verify(
        &self,
        user_id: &str,
        purpose: OtpPurpose,
        supplied: &str,
    ) -> Result<VerifyResult, ServiceError> {
        let Some(pending) = self.store.find(user_id, purpose).await? else {
            return Ok(VerifyResult::NonePending);
        };

        if pending.is_consumed() {
            return Ok(VerifyResult::NonePending);
        }

        let now = Utc::now();
        if pending.is_expired(now) {
            return Ok(VerifyResult::Expired);
        }

        if pending.code != supplied.trim() {
            return Ok(VerifyResult::Invalid);
        }

        self.store.mark_consumed(user_id, purpose, now).await?;
        Ok(VerifyResult::Ok)
    }
}
