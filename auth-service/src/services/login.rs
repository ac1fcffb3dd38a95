//! Login orchestration: credentials -> policy -> optional OTP loop ->
//! session issuance, with a history entry for every attempt.

use std::sync::Arc;

use chrono::Utc;

use crate::models::{AuthMethod, LoginHistoryEntry, LoginStatus, OtpPurpose, PublicUser, User};
use crate::services::device::{self, DeviceFingerprint};
use crate::services::jwt::JwtService;
use crate::services::otp::{OtpService, VerifyResult};
use crate::services::policy::{self, OtpChannel};
use crate::services::store::{LoginHistoryStore, UserStore};
use crate::services::ServiceError;
use crate::utils::{verify_password, Password, PasswordHashString};

/// Raw request facts the classifier needs, collected by the HTTP layer.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    pub user_agent: String,
    pub forwarded_for: Option<String>,
    pub real_ip: Option<String>,
    pub remote_addr: Option<String>,
}

impl RequestContext {
    pub fn fingerprint(&self) -> DeviceFingerprint {
        device::classify(
            &self.user_agent,
            self.forwarded_for.as_deref(),
            self.real_ip.as_deref(),
            self.remote_addr.as_deref(),
        )
    }
}

/// Why a login attempt was turned away. These are recoverable, caller-facing
/// outcomes, not errors; infrastructure faults surface as `ServiceError`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// Identifier unknown or password mismatch; never disclosed which.
    InvalidCredentials,
    TimeRestricted,
    OtpInvalid,
    OtpExpired,
    OtpNotPending,
    TokenInvalid,
}

impl RejectReason {
    pub fn code(&self) -> &'static str {
        match self {
            RejectReason::InvalidCredentials => "invalid_credentials",
            RejectReason::TimeRestricted => "time_restricted",
            RejectReason::OtpInvalid => "otp_invalid",
            RejectReason::OtpExpired => "otp_expired",
            RejectReason::OtpNotPending => "otp_not_pending",
            RejectReason::TokenInvalid => "token_invalid",
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            RejectReason::InvalidCredentials => "Invalid email or password",
            RejectReason::TimeRestricted => {
                "Mobile login allowed only between 10 AM and 1 PM IST"
            }
            RejectReason::OtpInvalid => "Invalid OTP",
            RejectReason::OtpExpired => "OTP expired",
            RejectReason::OtpNotPending => "No OTP pending for this login",
            RejectReason::TokenInvalid => "Invalid or expired token",
        }
    }
}

/// Result of a login or OTP-verification call.
#[derive(Debug, Clone)]
pub enum LoginOutcome {
    /// Full session issued.
    Granted { token: String, user: PublicUser },
    /// Password accepted, second factor pending. The intermediate token is
    /// NOT a session credential.
    OtpPending {
        otp_token: String,
        channel: OtpChannel,
        masked_destination: String,
    },
    Rejected { reason: RejectReason },
}

/// Result of a resend call.
#[derive(Debug, Clone)]
pub enum ResendOutcome {
    Sent {
        channel: OtpChannel,
        masked_destination: String,
    },
    Rejected { reason: RejectReason },
}

#[derive(Clone)]
pub struct LoginService {
    users: Arc<dyn UserStore>,
    history: Arc<dyn LoginHistoryStore>,
    otp: OtpService,
    jwt: JwtService,
}

fn auth_method_for(channel: OtpChannel) -> AuthMethod {
    match channel {
        OtpChannel::Email => AuthMethod::OtpEmail,
        OtpChannel::Sms => AuthMethod::OtpSms,
        OtpChannel::None => AuthMethod::Direct,
    }
}

/// "user@example.com" -> "u***@example.com"
pub fn mask_email(email: &str) -> String {
    match email.split_once('@') {
        Some((local, domain)) => {
            let first = local.chars().next().unwrap_or('*');
            format!("{}***@{}", first, domain)
        }
        None => "***".to_string(),
    }
}

/// "+15551234567" -> "*******4567"
pub fn mask_phone(phone: &str) -> String {
    let digits: Vec<char> = phone.chars().collect();
    if digits.len() <= 4 {
        return "****".to_string();
    }
    let visible: String = digits[digits.len() - 4..].iter().collect();
    format!("{}{}", "*".repeat(digits.len() - 4), visible)
}

impl LoginService {
    pub fn new(
        users: Arc<dyn UserStore>,
        history: Arc<dyn LoginHistoryStore>,
        otp: OtpService,
        jwt: JwtService,
    ) -> Self {
        Self {
            users,
            history,
            otp,
            jwt,
        }
    }

    fn masked_destination(user: &User, channel: OtpChannel) -> String {
        match channel {
            OtpChannel::Sms => user.phone.as_deref().map(mask_phone).unwrap_or_default(),
            _ => mask_email(&user.email),
        }
    }

    /// Authenticate credentials and run the policy gate.
    pub async fn login(
        &self,
        email: &str,
        password: &str,
        ctx: &RequestContext,
    ) -> Result<LoginOutcome, ServiceError> {
        let Some(user) = self.users.find_by_email(email).await? else {
            // No user to attribute the attempt to, so no history entry.
            return Ok(LoginOutcome::Rejected {
                reason: RejectReason::InvalidCredentials,
            });
        };

        let fingerprint = ctx.fingerprint();

        if verify_password(
            &Password::new(password.to_string()),
            &PasswordHashString::new(user.password_hash.clone()),
        )
        .is_err()
        {
            self.history
                .append(LoginHistoryEntry::new(
                    user.id.clone(),
                    &fingerprint,
                    LoginStatus::Failed,
                    AuthMethod::Direct,
                ))
                .await?;
            return Ok(LoginOutcome::Rejected {
                reason: RejectReason::InvalidCredentials,
            });
        }

        let decision = policy::decide(&fingerprint, Utc::now());

        if !decision.allowed {
            self.history
                .append(LoginHistoryEntry::new(
                    user.id.clone(),
                    &fingerprint,
                    LoginStatus::TimeRestricted,
                    AuthMethod::Direct,
                ))
                .await?;
            return Ok(LoginOutcome::Rejected {
                reason: RejectReason::TimeRestricted,
            });
        }

        if decision.requires_otp {
            let otp_token = self.jwt.generate_otp_token(&user.id, &user.email)?;
            self.otp
                .issue(&user, OtpPurpose::Login, decision.otp_channel)
                .await?;
            self.history
                .append(LoginHistoryEntry::new(
                    user.id.clone(),
                    &fingerprint,
                    LoginStatus::OtpRequired,
                    auth_method_for(decision.otp_channel),
                ))
                .await?;

            tracing::info!(
                user_id = %user.id,
                browser = %fingerprint.browser.name.as_str(),
                reason = %decision.reason.as_str(),
                "Login challenged with OTP"
            );

            return Ok(LoginOutcome::OtpPending {
                otp_token,
                channel: decision.otp_channel,
                masked_destination: Self::masked_destination(&user, decision.otp_channel),
            });
        }

        let token = self.jwt.generate_session_token(&user.id, &user.email)?;
        self.history
            .append(LoginHistoryEntry::new(
                user.id.clone(),
                &fingerprint,
                LoginStatus::Success,
                AuthMethod::Direct,
            ))
            .await?;

        tracing::info!(
            user_id = %user.id,
            browser = %fingerprint.browser.name.as_str(),
            "Login granted directly"
        );

        Ok(LoginOutcome::Granted {
            token,
            user: user.sanitized(),
        })
    }

    /// Complete a challenged login with the delivered code.
    pub async fn verify_login_otp(
        &self,
        otp_token: &str,
        code: &str,
        ctx: &RequestContext,
    ) -> Result<LoginOutcome, ServiceError> {
        let Ok(claims) = self.jwt.validate_otp_token(otp_token) else {
            return Ok(LoginOutcome::Rejected {
                reason: RejectReason::TokenInvalid,
            });
        };

        let Some(user) = self.users.find_by_id(&claims.sub).await? else {
            return Ok(LoginOutcome::Rejected {
                reason: RejectReason::TokenInvalid,
            });
        };

        match self.otp.verify(&user.id, OtpPurpose::Login, code).await? {
            VerifyResult::Ok => {
                let token = self.jwt.generate_session_token(&user.id, &user.email)?;

                // Flip the pending entry for this attempt; if it is gone,
                // record the completed login as a fresh entry.
                if !self.history.resolve_latest_pending(&user.id).await? {
                    self.history
                        .append(LoginHistoryEntry::new(
                            user.id.clone(),
                            &ctx.fingerprint(),
                            LoginStatus::Success,
                            AuthMethod::OtpEmail,
                        ))
                        .await?;
                }

                tracing::info!(user_id = %user.id, "Login OTP verified, session issued");

                Ok(LoginOutcome::Granted {
                    token,
                    user: user.sanitized(),
                })
            }
            VerifyResult::Invalid => Ok(LoginOutcome::Rejected {
                reason: RejectReason::OtpInvalid,
            }),
            VerifyResult::Expired => Ok(LoginOutcome::Rejected {
                reason: RejectReason::OtpExpired,
            }),
            VerifyResult::NonePending => Ok(LoginOutcome::Rejected {
                reason: RejectReason::OtpNotPending,
            }),
        }
    }

    /// Re-deliver the login code. Supersedes the previous code and appends
    /// no history entry: a resend is not a distinct login attempt.
    pub async fn resend_login_otp(
        &self,
        otp_token: &str,
    ) -> Result<ResendOutcome, ServiceError> {
        let Ok(claims) = self.jwt.validate_otp_token(otp_token) else {
            return Ok(ResendOutcome::Rejected {
                reason: RejectReason::TokenInvalid,
            });
        };

        let Some(user) = self.users.find_by_id(&claims.sub).await? else {
            return Ok(ResendOutcome::Rejected {
                reason: RejectReason::TokenInvalid,
            });
        };

        self.otp
            .issue(&user, OtpPurpose::Login, OtpChannel::Email)
            .await?;

        Ok(ResendOutcome::Sent {
            channel: OtpChannel::Email,
            masked_destination: Self::masked_destination(&user, OtpChannel::Email),
        })
    }
}
