//! Services layer for the Twiller auth service.
//!
//! The login gate is composed bottom-up: `device` and `time_window` are pure
//! leaves, `policy` combines them into a decision, `otp` manages code
//! lifecycles, and `login` orchestrates the whole flow.

mod account;
pub mod device;
mod email;
pub mod error;
mod jwt;
mod login;
pub mod metrics;
mod mongo;
mod otp;
pub mod policy;
mod sms;
pub mod store;
pub mod time_window;

pub use account::AccountService;
pub use email::{EmailProvider, EmailService, MockEmailService};
pub use error::ServiceError;
pub use jwt::{Claims, JwtService, TokenType};
pub use login::{
    mask_email, mask_phone, LoginOutcome, LoginService, RejectReason, RequestContext,
    ResendOutcome,
};
pub use mongo::MongoStore;
pub use otp::{OtpService, VerifyResult};
pub use sms::{MockSmsService, SmsProvider, TwilioSmsService};
pub use store::{LoginHistoryStore, MemoryStore, PendingOtpStore, UserStore};
