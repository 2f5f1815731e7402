//! [`MemoryStore`]: in-process implementation of [`DocumentStore`].

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    CommentRecord, DocumentStore, LikeOutcome, PostRecord, ResetTokenRecord, StoreError,
    UserRecord,
};

#[derive(Debug, Default)]
struct Tables {
    users: HashMap<Uuid, UserRecord>,
    posts: HashMap<Uuid, PostRecord>,
    comments: HashMap<Uuid, CommentRecord>,
    reset_tokens: HashMap<Uuid, ResetTokenRecord>,
}

/// Thread-safe in-memory document store.
///
/// Wraps an `Arc<RwLock<_>>` so that request handlers read concurrently and
/// writers get exclusive access for the duration of one operation. Clones share
/// the same tables.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn insert_user(&self, user: UserRecord) -> Result<(), StoreError> {
        let mut t = self.inner.write().await;
        if t.users.values().any(|u| u.username == user.username) {
            return Err(StoreError::Duplicate("username"));
        }
        if t.users.values().any(|u| u.email == user.email) {
            return Err(StoreError::Duplicate("email"));
        }
        t.users.insert(user.id, user);
        Ok(())
    }

    async fn user_by_id(&self, id: Uuid) -> Result<Option<UserRecord>, StoreError> {
        Ok(self.inner.read().await.users.get(&id).cloned())
    }

    async fn user_by_username(&self, username: &str) -> Result<Option<UserRecord>, StoreError> {
        let t = self.inner.read().await;
        Ok(t.users.values().find(|u| u.username == username).cloned())
    }

    async fn user_by_email(&self, email: &str) -> Result<Option<UserRecord>, StoreError> {
        let t = self.inner.read().await;
        Ok(t.users.values().find(|u| u.email == email).cloned())
    }

    async fn set_password_hash(&self, id: Uuid, password_hash: String) -> Result<bool, StoreError> {
        let mut t = self.inner.write().await;
        Ok(match t.users.get_mut(&id) {
            Some(u) => {
                u.password_hash = password_hash;
                true
            }
            None => false,
        })
    }

    async fn insert_post(&self, post: PostRecord) -> Result<(), StoreError> {
        self.inner.write().await.posts.insert(post.id, post);
        Ok(())
    }

    async fn post_by_id(&self, id: Uuid) -> Result<Option<PostRecord>, StoreError> {
        Ok(self.inner.read().await.posts.get(&id).cloned())
    }

    async fn update_post(&self, post: PostRecord) -> Result<bool, StoreError> {
        let mut t = self.inner.write().await;
        Ok(match t.posts.get_mut(&post.id) {
            Some(slot) => {
                *slot = post;
                true
            }
            None => false,
        })
    }

    async fn delete_post(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut t = self.inner.write().await;
        if t.posts.remove(&id).is_none() {
            return Ok(false);
        }
        t.comments.retain(|_, c| c.post_id != id);
        Ok(true)
    }

    async fn add_like(&self, post_id: Uuid, user_id: Uuid) -> Result<LikeOutcome, StoreError> {
        let mut t = self.inner.write().await;
        let Some(post) = t.posts.get_mut(&post_id) else {
            return Ok(LikeOutcome::PostNotFound);
        };
        if post.likes.contains(&user_id) {
            return Ok(LikeOutcome::AlreadyLiked);
        }
        post.likes.push(user_id);
        Ok(LikeOutcome::Liked)
    }

    async fn insert_comment(&self, comment: CommentRecord) -> Result<(), StoreError> {
        self.inner.write().await.comments.insert(comment.id, comment);
        Ok(())
    }

    async fn comment_by_id(&self, id: Uuid) -> Result<Option<CommentRecord>, StoreError> {
        Ok(self.inner.read().await.comments.get(&id).cloned())
    }

    async fn comments_for_post(&self, post_id: Uuid) -> Result<Vec<CommentRecord>, StoreError> {
        let t = self.inner.read().await;
        let mut out: Vec<CommentRecord> = t
            .comments
            .values()
            .filter(|c| c.post_id == post_id)
            .cloned()
            .collect();
        out.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(out)
    }

    async fn delete_comment(&self, id: Uuid) -> Result<bool, StoreError> {
        Ok(self.inner.write().await.comments.remove(&id).is_some())
    }

    async fn put_reset_token(&self, token: ResetTokenRecord) -> Result<(), StoreError> {
        self.inner.write().await.reset_tokens.insert(token.user_id, token);
        Ok(())
    }

    async fn reset_token_for(&self, user_id: Uuid) -> Result<Option<ResetTokenRecord>, StoreError> {
        Ok(self.inner.read().await.reset_tokens.get(&user_id).cloned())
    }

    async fn delete_reset_token(&self, user_id: Uuid) -> Result<bool, StoreError> {
        Ok(self.inner.write().await.reset_tokens.remove(&user_id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn user(name: &str) -> UserRecord {
        UserRecord {
            id: Uuid::new_v4(),
            username: name.into(),
            email: format!("{name}@example.com"),
            password_hash: "$argon2id$stub".into(),
            created_at: Utc::now(),
        }
    }

    fn post(owner: Uuid) -> PostRecord {
        let now = Utc::now();
        PostRecord {
            id: Uuid::new_v4(),
            user_id: owner,
            content: Some("sealed".into()),
            images: vec!["Pics/a.png".into()],
            likes: vec![],
            created_at: now,
            updated_at: now,
        }
    }

    fn comment(post_id: Uuid, offset_secs: i64) -> CommentRecord {
        let at = Utc::now() + Duration::seconds(offset_secs);
        CommentRecord {
            id: Uuid::new_v4(),
            post_id,
            user_id: Uuid::new_v4(),
            content: format!("c{offset_secs}"),
            created_at: at,
            updated_at: at,
        }
    }

    #[tokio::test]
    async fn duplicate_username_rejected() {
        let store = MemoryStore::new();
        store.insert_user(user("ana")).await.unwrap();
        let mut dup = user("ana");
        dup.email = "other@example.com".into();
        assert!(matches!(
            store.insert_user(dup).await,
            Err(StoreError::Duplicate("username"))
        ));
    }

    #[tokio::test]
    async fn duplicate_email_rejected() {
        let store = MemoryStore::new();
        store.insert_user(user("ana")).await.unwrap();
        let mut dup = user("bob");
        dup.email = "ana@example.com".into();
        assert!(matches!(
            store.insert_user(dup).await,
            Err(StoreError::Duplicate("email"))
        ));
    }

    #[tokio::test]
    async fn lookup_by_username_and_email() {
        let store = MemoryStore::new();
        let u = user("ana");
        store.insert_user(u.clone()).await.unwrap();
        assert_eq!(store.user_by_username("ana").await.unwrap(), Some(u.clone()));
        assert_eq!(store.user_by_email("ana@example.com").await.unwrap(), Some(u));
        assert!(store.user_by_username("nobody").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn like_is_recorded_once() {
        let store = MemoryStore::new();
        let p = post(Uuid::new_v4());
        store.insert_post(p.clone()).await.unwrap();
        let liker = Uuid::new_v4();
        assert_eq!(store.add_like(p.id, liker).await.unwrap(), LikeOutcome::Liked);
        assert_eq!(store.add_like(p.id, liker).await.unwrap(), LikeOutcome::AlreadyLiked);
        assert_eq!(
            store.add_like(Uuid::new_v4(), liker).await.unwrap(),
            LikeOutcome::PostNotFound
        );
        assert_eq!(store.post_by_id(p.id).await.unwrap().unwrap().likes, vec![liker]);
    }

    #[tokio::test]
    async fn delete_post_cascades_to_comments() {
        let store = MemoryStore::new();
        let p = post(Uuid::new_v4());
        let other = post(Uuid::new_v4());
        store.insert_post(p.clone()).await.unwrap();
        store.insert_post(other.clone()).await.unwrap();
        store.insert_comment(comment(p.id, 0)).await.unwrap();
        store.insert_comment(comment(other.id, 0)).await.unwrap();

        assert!(store.delete_post(p.id).await.unwrap());
        assert!(store.comments_for_post(p.id).await.unwrap().is_empty());
        assert_eq!(store.comments_for_post(other.id).await.unwrap().len(), 1);
        assert!(!store.delete_post(p.id).await.unwrap());
    }

    #[tokio::test]
    async fn comments_are_oldest_first() {
        let store = MemoryStore::new();
        let p = post(Uuid::new_v4());
        store.insert_post(p.clone()).await.unwrap();
        store.insert_comment(comment(p.id, 20)).await.unwrap();
        store.insert_comment(comment(p.id, 10)).await.unwrap();
        let contents: Vec<_> = store
            .comments_for_post(p.id)
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.content)
            .collect();
        assert_eq!(contents, ["c10", "c20"]);
    }

    #[tokio::test]
    async fn reset_token_is_replaced_per_user() {
        let store = MemoryStore::new();
        let uid = Uuid::new_v4();
        let expires_at = Utc::now();
        for hash in ["first", "second"] {
            store
                .put_reset_token(ResetTokenRecord {
                    user_id: uid,
                    token_hash: hash.into(),
                    expires_at,
                })
                .await
                .unwrap();
        }
        assert_eq!(
            store.reset_token_for(uid).await.unwrap().unwrap().token_hash,
            "second"
        );
        assert!(store.delete_reset_token(uid).await.unwrap());
        assert!(store.reset_token_for(uid).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn update_missing_post_reports_false() {
        let store = MemoryStore::new();
        assert!(!store.update_post(post(Uuid::new_v4())).await.unwrap());
    }
}
