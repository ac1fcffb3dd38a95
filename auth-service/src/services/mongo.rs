//! MongoDB-backed implementation of the storage traits.

use chrono::{DateTime, Utc};
use mongodb::bson::doc;
use mongodb::options::{
    FindOneAndReplaceOptions, FindOneAndUpdateOptions, FindOptions, IndexOptions,
};
use mongodb::{Client, Collection, IndexModel};
use service_core::async_trait::async_trait;
use service_core::error::AppError;

use crate::models::{LoginHistoryEntry, OtpPurpose, PendingOtp, User};
use crate::services::store::{LoginHistoryStore, PendingOtpStore, UserStore};

#[derive(Clone)]
pub struct MongoStore {
    db: mongodb::Database,
}

impl MongoStore {
    pub async fn connect(uri: &str, database: &str) -> Result<Self, AppError> {
        let client = Client::with_uri_str(uri).await?;
        let db = client.database(database);
        tracing::info!(database = %database, "Connected to MongoDB");
        Ok(Self { db })
    }

    pub fn users(&self) -> Collection<User> {
        self.db.collection::<User>("users")
    }

    pub fn login_history(&self) -> Collection<LoginHistoryEntry> {
        self.db.collection::<LoginHistoryEntry>("login_history")
    }

    pub fn pending_otps(&self) -> Collection<PendingOtp> {
        self.db.collection::<PendingOtp>("pending_otps")
    }

    pub async fn initialize_indexes(&self) -> Result<(), AppError> {
        let unique = IndexOptions::builder().unique(true).build();

        self.users()
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "email": 1 })
                    .options(unique.clone())
                    .build(),
                None,
            )
            .await?;
        self.users()
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "username": 1 })
                    .options(unique.clone())
                    .build(),
                None,
            )
            .await?;

        // One pending code per (user, purpose); the unique index backs the
        // atomic find-and-replace in `PendingOtpStore::replace`.
        self.pending_otps()
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "user_id": 1, "purpose": 1 })
                    .options(unique)
                    .build(),
                None,
            )
            .await?;

        self.login_history()
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "user_id": 1, "login_time": -1 })
                    .build(),
                None,
            )
            .await?;

        tracing::info!("MongoDB indexes initialized");
        Ok(())
    }
}

#[async_trait]
impl UserStore for MongoStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        Ok(self
            .users()
            .find_one(doc! { "email": email.to_lowercase() }, None)
            .await?)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        Ok(self
            .users()
            .find_one(doc! { "username": username.to_lowercase() }, None)
            .await?)
    }

    async fn find_by_phone(&self, phone: &str) -> Result<Option<User>, AppError> {
        Ok(self.users().find_one(doc! { "phone": phone }, None).await?)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<User>, AppError> {
        Ok(self.users().find_one(doc! { "_id": id }, None).await?)
    }

    async fn insert(&self, user: &User) -> Result<(), AppError> {
        self.users().insert_one(user, None).await?;
        Ok(())
    }

    async fn update(&self, user: &User) -> Result<(), AppError> {
        self.users()
            .replace_one(doc! { "_id": &user.id }, user, None)
            .await?;
        Ok(())
    }

    async fn health_check(&self) -> Result<(), AppError> {
        self.db.run_command(doc! { "ping": 1 }, None).await?;
        Ok(())
    }
}

#[async_trait]
impl LoginHistoryStore for MongoStore {
    async fn append(&self, entry: LoginHistoryEntry) -> Result<(), AppError> {
        self.login_history().insert_one(entry, None).await?;
        Ok(())
    }

    async fn resolve_latest_pending(&self, user_id: &str) -> Result<bool, AppError> {
        let updated = self
            .login_history()
            .find_one_and_update(
                doc! { "user_id": user_id, "login_status": "otp_required" },
                doc! { "$set": { "login_status": "success" } },
                FindOneAndUpdateOptions::builder()
                    .sort(doc! { "login_time": -1 })
                    .build(),
            )
            .await?;
        Ok(updated.is_some())
    }

    async fn list_for_user(
        &self,
        user_id: &str,
        limit: i64,
    ) -> Result<Vec<LoginHistoryEntry>, AppError> {
        use futures::TryStreamExt;

        let cursor = self
            .login_history()
            .find(
                doc! { "user_id": user_id },
                FindOptions::builder()
                    .sort(doc! { "login_time": -1 })
                    .limit(limit)
                    .build(),
            )
            .await?;
        Ok(cursor.try_collect().await?)
    }
}

#[async_trait]
impl PendingOtpStore for MongoStore {
    async fn replace(&self, otp: PendingOtp) -> Result<(), AppError> {
        // Single atomic upsert per (user, purpose); two concurrent issues
        // cannot leave two codes active.
        self.pending_otps()
            .find_one_and_replace(
                doc! { "user_id": &otp.user_id, "purpose": otp.purpose.as_str() },
                &otp,
                FindOneAndReplaceOptions::builder().upsert(true).build(),
            )
            .await?;
        Ok(())
    }

    async fn find(
        &self,
        user_id: &str,
        purpose: OtpPurpose,
    ) -> Result<Option<PendingOtp>, AppError> {
        Ok(self
            .pending_otps()
            .find_one(
                doc! { "user_id": user_id, "purpose": purpose.as_str() },
                None,
            )
            .await?)
    }

    async fn mark_consumed(
        &self,
        user_id: &str,
        purpose: OtpPurpose,
        at: DateTime<Utc>,
    ) -> Result<(), AppError> {
        self.pending_otps()
            .update_one(
                doc! { "user_id": user_id, "purpose": purpose.as_str() },
                doc! { "$set": { "consumed_at": at.to_rfc3339() } },
                None,
            )
            .await?;
        Ok(())
    }
}
