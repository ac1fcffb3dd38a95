//! Login policy engine: allow, challenge with an OTP, or deny.
//!
//! Rules are evaluated in order and the first match wins; they are not
//! mutually exclusive. Chrome is treated as higher-risk and unconditionally
//! challenged; Microsoft-family browsers are the only direct-access path;
//! everything else defaults to a challenge rather than silent trust.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::device::{Browser, DeviceFingerprint, DeviceType};
use super::time_window::{IST_OFFSET_MINUTES, MOBILE_LOGIN_WINDOW};

/// Delivery channel for a required second factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum OtpChannel {
    Email,
    Sms,
    None,
}

/// Why the engine decided what it decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ReasonCode {
    DirectOk,
    OtpRequiredBrowser,
    TimeRestrictedMobile,
}

impl ReasonCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReasonCode::DirectOk => "direct_ok",
            ReasonCode::OtpRequiredBrowser => "otp_required_browser",
            ReasonCode::TimeRestrictedMobile => "time_restricted_mobile",
        }
    }
}

/// Outcome of a policy evaluation.
///
/// Invariants, held by construction: a denied attempt never requires an OTP,
/// and an OTP requirement implies the attempt is allowed (the OTP is a second
/// factor on a permitted attempt, not a rejection).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthDecision {
    pub allowed: bool,
    pub requires_otp: bool,
    pub otp_channel: OtpChannel,
    pub reason: ReasonCode,
}

impl AuthDecision {
    fn deny(reason: ReasonCode) -> Self {
        Self {
            allowed: false,
            requires_otp: false,
            otp_channel: OtpChannel::None,
            reason,
        }
    }

    fn direct() -> Self {
        Self {
            allowed: true,
            requires_otp: false,
            otp_channel: OtpChannel::None,
            reason: ReasonCode::DirectOk,
        }
    }

    fn challenge(otp_channel: OtpChannel) -> Self {
        Self {
            allowed: true,
            requires_otp: true,
            otp_channel,
            reason: ReasonCode::OtpRequiredBrowser,
        }
    }
}

/// Decide how a login attempt may proceed.
///
/// Pure: the same `(fingerprint, now)` always yields the same decision.
pub fn decide(fingerprint: &DeviceFingerprint, now: DateTime<Utc>) -> AuthDecision {
    // Rule 1: mobile devices are rejected outside their access window, no
    // matter which browser they run.
    if fingerprint.device_type == DeviceType::Mobile
        && !MOBILE_LOGIN_WINDOW.contains(now, IST_OFFSET_MINUTES)
    {
        return AuthDecision::deny(ReasonCode::TimeRestrictedMobile);
    }

    // Rules 2-4: browser buckets. The match is exhaustive on purpose - a new
    // browser variant cannot land in a bucket without a decision here.
    match fingerprint.browser.name {
        Browser::Chrome => AuthDecision::challenge(OtpChannel::Email),
        Browser::Edge | Browser::InternetExplorer => AuthDecision::direct(),
        Browser::Firefox | Browser::Safari | Browser::Opera | Browser::Unknown => {
            AuthDecision::challenge(OtpChannel::Email)
        }
    }
}
