//! Document store for users, posts, comments, and password-reset tokens.
//!
//! Handlers only see the [`DocumentStore`] trait. The store is unaware of field
//! encryption: post and comment `content` arrive already sealed and leave
//! sealed.

pub mod memory;

pub use memory::MemoryStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

/// Errors produced by the store layer.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A unique field (username, email) is already taken.
    #[error("duplicate {0}")]
    Duplicate(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    /// argon2 PHC string.
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    /// Encryption envelope, or legacy plaintext.
    pub content: Option<String>,
    pub images: Vec<String>,
    pub likes: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentRecord {
    pub id: Uuid,
    pub post_id: Uuid,
    pub user_id: Uuid,
    /// Encryption envelope, or legacy plaintext.
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResetTokenRecord {
    pub user_id: Uuid,
    /// argon2 PHC string of the token mailed to the user.
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
}

/// Result of [`DocumentStore::add_like`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikeOutcome {
    Liked,
    AlreadyLiked,
    PostNotFound,
}

/// Persistence interface consumed by the request handlers.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    // --- users ---

    /// Insert a user, enforcing unique username and email.
    async fn insert_user(&self, user: UserRecord) -> Result<(), StoreError>;
    async fn user_by_id(&self, id: Uuid) -> Result<Option<UserRecord>, StoreError>;
    async fn user_by_username(&self, username: &str) -> Result<Option<UserRecord>, StoreError>;
    async fn user_by_email(&self, email: &str) -> Result<Option<UserRecord>, StoreError>;
    /// Returns `false` if the user does not exist.
    async fn set_password_hash(&self, id: Uuid, password_hash: String) -> Result<bool, StoreError>;

    // --- posts ---

    async fn insert_post(&self, post: PostRecord) -> Result<(), StoreError>;
    async fn post_by_id(&self, id: Uuid) -> Result<Option<PostRecord>, StoreError>;
    /// Replace a stored post. Returns `false` if it does not exist.
    async fn update_post(&self, post: PostRecord) -> Result<bool, StoreError>;
    /// Remove a post and every comment on it. Returns `false` if it did not exist.
    async fn delete_post(&self, id: Uuid) -> Result<bool, StoreError>;
    /// Atomically add `user_id` to the post's likes.
    async fn add_like(&self, post_id: Uuid, user_id: Uuid) -> Result<LikeOutcome, StoreError>;

    // --- comments ---

    async fn insert_comment(&self, comment: CommentRecord) -> Result<(), StoreError>;
    async fn comment_by_id(&self, id: Uuid) -> Result<Option<CommentRecord>, StoreError>;
    /// Comments on a post, oldest first.
    async fn comments_for_post(&self, post_id: Uuid) -> Result<Vec<CommentRecord>, StoreError>;
    async fn delete_comment(&self, id: Uuid) -> Result<bool, StoreError>;

    // --- reset tokens ---

    /// Store a reset token, replacing any previous one for the same user.
    async fn put_reset_token(&self, token: ResetTokenRecord) -> Result<(), StoreError>;
    async fn reset_token_for(&self, user_id: Uuid) -> Result<Option<ResetTokenRecord>, StoreError>;
    async fn delete_reset_token(&self, user_id: Uuid) -> Result<bool, StoreError>;
}
