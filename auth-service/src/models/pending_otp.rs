//! Pending OTP model - one active code per `(user, purpose)` slot.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Fixed lifetime of a one-time code.
pub const OTP_TTL_MINUTES: i64 = 10;

/// What a one-time code was issued for. Each purpose has its own slot, so a
/// login challenge can never clobber a pending password reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OtpPurpose {
    Login,
    PasswordReset,
    AudioUpload,
    LanguageSwitch,
    PhoneVerify,
}

impl OtpPurpose {
    pub fn as_str(&self) -> &'static str {
        match self {
            OtpPurpose::Login => "login",
            OtpPurpose::PasswordReset => "password_reset",
            OtpPurpose::AudioUpload => "audio_upload",
            OtpPurpose::LanguageSwitch => "language_switch",
            OtpPurpose::PhoneVerify => "phone_verify",
        }
    }

    /// Label used in delivery messages ("Your verification code for ...").
    pub fn label(&self) -> &'static str {
        match self {
            OtpPurpose::Login => "login",
            OtpPurpose::PasswordReset => "password reset",
            OtpPurpose::AudioUpload => "audio upload",
            OtpPurpose::LanguageSwitch => "language switch",
            OtpPurpose::PhoneVerify => "phone verification",
        }
    }
}

/// A stored one-time code. Superseded outright when a new code is issued for
/// the same `(user, purpose)`; dead once consumed, even if unexpired.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingOtp {
    pub user_id: String,
    pub purpose: OtpPurpose,
    pub code: String,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub issued_at: DateTime<Utc>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub expires_at: DateTime<Utc>,
    pub consumed_at: Option<DateTime<Utc>>,
}

impl PendingOtp {
    pub fn new(user_id: String, purpose: OtpPurpose, code: String, now: DateTime<Utc>) -> Self {
        Self {
            user_id,
            purpose,
            code,
            issued_at: now,
            expires_at: now + Duration::minutes(OTP_TTL_MINUTES),
            consumed_at: None,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    pub fn is_consumed(&self) -> bool {
        self.consumed_at.is_some()
    }
}
