mod login_history;
mod pending_otp;
mod user;

pub use login_history::{AuthMethod, LoginHistoryEntry, LoginStatus};
pub use pending_otp::{OtpPurpose, PendingOtp, OTP_TTL_MINUTES};
pub use user::{Language, PublicUser, User};
