//! Login history model - append-only audit trail of login attempts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::services::device::DeviceFingerprint;

/// Outcome recorded for a login attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum LoginStatus {
    Success,
    Failed,
    OtpRequired,
    TimeRestricted,
}

impl LoginStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoginStatus::Success => "success",
            LoginStatus::Failed => "failed",
            LoginStatus::OtpRequired => "otp_required",
            LoginStatus::TimeRestricted => "time_restricted",
        }
    }
}

/// How the attempt was (or would have been) authenticated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum AuthMethod {
    Direct,
    OtpEmail,
    OtpSms,
}

/// One login attempt. Entries are immutable once written, with a single
/// exception: the newest `otp_required` entry for a user is flipped to
/// `success` when the matching OTP verification completes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginHistoryEntry {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<mongodb::bson::oid::ObjectId>,
    pub user_id: String,
    pub ip_address: String,
    pub browser: String,
    pub os: String,
    pub device: String,
    pub user_agent: String,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub login_time: DateTime<Utc>,
    pub login_status: LoginStatus,
    pub auth_method: AuthMethod,
}

impl LoginHistoryEntry {
    pub fn new(
        user_id: String,
        fingerprint: &DeviceFingerprint,
        login_status: LoginStatus,
        auth_method: AuthMethod,
    ) -> Self {
        Self {
            id: None,
            user_id,
            ip_address: fingerprint.ip_address.clone(),
            browser: fingerprint.browser.display_name(),
            os: fingerprint.os.name.clone(),
            device: fingerprint.device_type.as_str().to_string(),
            user_agent: fingerprint.user_agent.clone(),
            login_time: Utc::now(),
            login_status,
            auth_method,
        }
    }
}
