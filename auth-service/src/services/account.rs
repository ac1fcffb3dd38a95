//! Account flows outside the login gate: registration, profile, password
//! reset, and the audio-upload / language-switch verification gates. Every
//! code here goes through the one OTP lifecycle in `otp.rs`.

use std::sync::Arc;

use chrono::{DateTime, Datelike, Duration, Utc};

use crate::dtos::auth::{
    PasswordResetConfirmRequest, PasswordResetRequest, RegisterRequest, ResetMethod,
    UpdateProfileRequest,
};
use crate::models::{Language, LoginHistoryEntry, OtpPurpose, PublicUser, User};
use crate::services::jwt::JwtService;
use crate::services::otp::{OtpService, VerifyResult};
use crate::services::policy::OtpChannel;
use crate::services::store::{LoginHistoryStore, UserStore};
use crate::services::time_window::{AUDIO_UPLOAD_WINDOW, IST_OFFSET_MINUTES};
use crate::services::ServiceError;
use crate::utils::{hash_password, Password};

/// How long an audio-upload verification stamp stays fresh.
const AUDIO_VERIFICATION_VALID_MINUTES: i64 = 60;

#[derive(Clone)]
pub struct AccountService {
    users: Arc<dyn UserStore>,
    history: Arc<dyn LoginHistoryStore>,
    otp: OtpService,
    jwt: JwtService,
}

fn require_verified(result: VerifyResult) -> Result<(), ServiceError> {
    match result {
        VerifyResult::Ok => Ok(()),
        VerifyResult::Invalid => Err(ServiceError::OtpInvalid),
        VerifyResult::Expired => Err(ServiceError::OtpExpired),
        VerifyResult::NonePending => Err(ServiceError::OtpNotPending),
    }
}

impl AccountService {
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

    pub async fn register(
        &self,
        req: RegisterRequest,
    ) -> Result<(PublicUser, String), ServiceError> {
        if self.users.find_by_email(&req.email).await?.is_some()
            || self.users.find_by_username(&req.username).await?.is_some()
        {
            return Err(ServiceError::UserAlreadyExists);
        }

        let password_hash = hash_password(&Password::new(req.password))
            .map_err(|e| ServiceError::Internal(anyhow::anyhow!("Password hashing error: {}", e)))?;

        let user = User::new(
            req.name,
            req.username.to_lowercase(),
            req.email.to_lowercase(),
            password_hash.into_string(),
        );
        self.users.insert(&user).await?;

        tracing::info!(user_id = %user.id, "User registered");

        let token = self.jwt.generate_session_token(&user.id, &user.email)?;
        Ok((user.sanitized(), token))
    }

    pub async fn login_history(
        &self,
        user_id: &str,
    ) -> Result<Vec<LoginHistoryEntry>, ServiceError> {
        Ok(self.history.list_for_user(user_id, 50).await?)
    }

    pub async fn update_profile(
        &self,
        mut user: User,
        req: UpdateProfileRequest,
    ) -> Result<PublicUser, ServiceError> {
        if let Some(name) = req.name {
            user.name = name;
        }
        if let Some(bio) = req.bio {
            user.bio = Some(bio);
        }
        if let Some(avatar) = req.avatar {
            user.avatar = Some(avatar);
        }
        user.updated_at = Utc::now();
        self.users.update(&user).await?;
        Ok(user.sanitized())
    }

    async fn find_by_reset_identifier(
        &self,
        method: ResetMethod,
        value: &str,
    ) -> Result<Option<User>, ServiceError> {
        Ok(match method {
            ResetMethod::Email => self.users.find_by_email(value).await?,
            ResetMethod::Phone => self.users.find_by_phone(value).await?,
        })
    }

    /// Start a password reset. Limited to one request per calendar day per
    /// user; the code goes out on the channel matching the identifier kind.
    pub async fn request_password_reset(
        &self,
        req: PasswordResetRequest,
    ) -> Result<(), ServiceError> {
        let mut user = self
            .find_by_reset_identifier(req.method, &req.value)
            .await?
            .ok_or(ServiceError::UserNotFound)?;

        let now = Utc::now();
        if let Some(last) = user.last_password_reset_request {
            if last.num_days_from_ce() == now.num_days_from_ce() {
                return Err(ServiceError::PasswordResetLimit);
            }
        }

        user.last_password_reset_request = Some(now);
        self.users.update(&user).await?;

        let channel = match req.method {
            ResetMethod::Email => OtpChannel::Email,
            ResetMethod::Phone => OtpChannel::Sms,
        };
        self.otp
            .issue(&user, OtpPurpose::PasswordReset, channel)
            .await?;

        tracing::info!(user_id = %user.id, "Password reset code issued");
        Ok(())
    }

    pub async fn confirm_password_reset(
        &self,
        req: PasswordResetConfirmRequest,
    ) -> Result<(), ServiceError> {
        let mut user = self
            .find_by_reset_identifier(req.method, &req.value)
            .await?
            .ok_or(ServiceError::UserNotFound)?;

        require_verified(
            self.otp
                .verify(&user.id, OtpPurpose::PasswordReset, &req.code)
                .await?,
        )?;

        let password_hash = hash_password(&Password::new(req.new_password))
            .map_err(|e| ServiceError::Internal(anyhow::anyhow!("Password hashing error: {}", e)))?;
        user.password_hash = password_hash.into_string();
        user.updated_at = Utc::now();
        self.users.update(&user).await?;

        tracing::info!(user_id = %user.id, "Password reset completed");
        Ok(())
    }

    pub async fn send_audio_otp(&self, user: &User) -> Result<(), ServiceError> {
        self.otp
            .issue(user, OtpPurpose::AudioUpload, OtpChannel::Email)
            .await?;
        Ok(())
    }

    pub async fn verify_audio_otp(&self, user: &User, code: &str) -> Result<(), ServiceError> {
        require_verified(
            self.otp
                .verify(&user.id, OtpPurpose::AudioUpload, code)
                .await?,
        )?;

        let mut user = user.clone();
        user.audio_upload_verified = Some(Utc::now());
        user.updated_at = Utc::now();
        self.users.update(&user).await?;
        Ok(())
    }

    /// Whether the user may upload audio right now: a fresh OTP verification
    /// stamp (within the last hour) AND the 14:00-19:00 IST window. Either
    /// alone is insufficient.
    pub fn audio_upload_permission(
        &self,
        user: &User,
        now: DateTime<Utc>,
    ) -> (bool, Option<&'static str>) {
        let fresh = user
            .audio_upload_verified
            .map(|at| now - at <= Duration::minutes(AUDIO_VERIFICATION_VALID_MINUTES))
            .unwrap_or(false);
        if !fresh {
            return (false, Some("Please verify your email before uploading audio"));
        }

        if !AUDIO_UPLOAD_WINDOW.contains(now, IST_OFFSET_MINUTES) {
            return (
                false,
                Some("Audio uploads are only allowed between 2:00 PM to 7:00 PM IST"),
            );
        }

        (true, None)
    }

    pub async fn send_language_otp(&self, user: &User) -> Result<(), ServiceError> {
        if user.phone.is_none() {
            return Err(ServiceError::PhoneMissing);
        }
        self.otp
            .issue(user, OtpPurpose::LanguageSwitch, OtpChannel::Sms)
            .await?;
        Ok(())
    }

    pub async fn verify_language_otp(
        &self,
        user: &User,
        code: &str,
        language: Language,
    ) -> Result<PublicUser, ServiceError> {
        require_verified(
            self.otp
                .verify(&user.id, OtpPurpose::LanguageSwitch, code)
                .await?,
        )?;

        let mut user = user.clone();
        user.preferred_language = language;
        user.updated_at = Utc::now();
        self.users.update(&user).await?;
        Ok(user.sanitized())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::JwtConfig;
    use crate::services::email::MockEmailService;
    use crate::services::sms::MockSmsService;
    use crate::services::store::MemoryStore;
    use chrono::TimeZone;

    fn test_service(store: Arc<MemoryStore>) -> AccountService {
        let otp = OtpService::new(
            store.clone(),
            Arc::new(MockEmailService::new()),
            Arc::new(MockSmsService::new()),
        );
        let jwt = JwtService::new(&JwtConfig {
            secret: "test_secret".to_string(),
            session_expiry_days: 7,
            otp_token_expiry_minutes: 10,
        });
        AccountService::new(store.clone(), store, otp, jwt)
    }

    fn test_user() -> User {
        User::new(
            "Test User".to_string(),
            "testuser".to_string(),
            "test@example.com".to_string(),
            "hash".to_string(),
        )
    }

    #[tokio::test]
    async fn test_password_reset_limited_to_once_per_day() {
        let store = Arc::new(MemoryStore::new());
        let service = test_service(store.clone());
        let user = test_user();
        UserStore::insert(store.as_ref(), &user).await.unwrap();

        let req = || PasswordResetRequest {
            method: ResetMethod::Email,
            value: "test@example.com".to_string(),
        };

        service.request_password_reset(req()).await.unwrap();
        let second = service.request_password_reset(req()).await;
        assert!(matches!(second, Err(ServiceError::PasswordResetLimit)));
    }

    #[test]
    fn test_audio_permission_needs_fresh_stamp_and_window() {
        let store = Arc::new(MemoryStore::new());
        let service = test_service(store);

        // 15:00 IST == 09:30 UTC, inside the audio window.
        let in_window = Utc.with_ymd_and_hms(2024, 6, 15, 9, 30, 0).unwrap();
        // 20:00 IST == 14:30 UTC, outside.
        let out_of_window = Utc.with_ymd_and_hms(2024, 6, 15, 14, 30, 0).unwrap();

        let mut user = test_user();

        // No stamp at all.
        let (allowed, _) = service.audio_upload_permission(&user, in_window);
        assert!(!allowed);

        // Fresh stamp inside the window.
        user.audio_upload_verified = Some(in_window - Duration::minutes(5));
        let (allowed, reason) = service.audio_upload_permission(&user, in_window);
        assert!(allowed);
        assert!(reason.is_none());

        // Fresh stamp outside the window.
        user.audio_upload_verified = Some(out_of_window - Duration::minutes(5));
        let (allowed, _) = service.audio_upload_permission(&user, out_of_window);
        assert!(!allowed);

        // Stale stamp inside the window.
        user.audio_upload_verified = Some(in_window - Duration::minutes(90));
        let (allowed, _) = service.audio_upload_permission(&user, in_window);
        assert!(!allowed);
    }

    #[tokio::test]
    async fn test_language_otp_requires_phone_on_file() {
        let store = Arc::new(MemoryStore::new());
        let service = test_service(store.clone());
        let user = test_user();

        let result = service.send_language_otp(&user).await;
        assert!(matches!(result, Err(ServiceError::PhoneMissing)));
    }
}
