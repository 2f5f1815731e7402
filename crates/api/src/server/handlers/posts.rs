//! `/api/posts` — posts, likes, and comments.
//!
//! Post and comment `content` is sealed with the field codec before every write
//! and opened after every read. A stored value that looks encrypted but cannot
//! be opened fails the request with `decryption_failed` rather than leaking
//! ciphertext to the client.

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Json,
};
use bytes::Bytes;
use chrono::Utc;
use common::protocol::{AddCommentRequest, CommentView, MessageResponse, PostView, PostWithComments};
use tracing::{debug, info};
use uuid::Uuid;

use super::parse_id;
use crate::auth::AuthUser;
use crate::crypto::{DecryptionError, FieldCodec};
use crate::server::{error::ApiError, state::AppState};
use crate::store::{CommentRecord, LikeOutcome, PostRecord};

const NO_IMAGES: &str = "No images present add at least one image";
const POST_NOT_FOUND: &str = "Post not found";
const NOT_POST_OWNER: &str = "Post does not belong to the user";

/// Fields of the multipart form used to create or update a post.
#[derive(Debug, Default)]
struct PostForm {
    content: Option<String>,
    /// `(original file name, bytes)`.
    images: Vec<(String, Bytes)>,
}

/// Read `content` and up to `max_images` `images` parts. Unknown parts are ignored.
async fn read_post_form(mut multipart: Multipart, max_images: usize) -> Result<PostForm, ApiError> {
    let mut form = PostForm::default();
    while let Some(field) = multipart.next_field().await? {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some("content") => form.content = Some(field.text().await?),
            Some("images") => {
                if form.images.len() == max_images {
                    return Err(ApiError::bad_request(format!(
                        "At most {max_images} images can be attached to a post"
                    )));
                }
                let file_name = field.file_name().unwrap_or("image").to_owned();
                form.images.push((file_name, field.bytes().await?));
            }
            other => debug!(field = ?other, "ignoring multipart field"),
        }
    }
    if form.images.is_empty() {
        return Err(ApiError::bad_request(NO_IMAGES));
    }
    Ok(form)
}

/// Write every uploaded image. On failure the images already written are removed.
async fn store_images(state: &AppState, images: &[(String, Bytes)]) -> Result<Vec<String>, ApiError> {
    let mut paths = Vec::with_capacity(images.len());
    for (name, bytes) in images {
        match state.images.save(name, bytes).await {
            Ok(path) => paths.push(path),
            Err(e) => {
                state.images.remove(&paths).await;
                return Err(e.into());
            }
        }
    }
    Ok(paths)
}

fn post_view(codec: &FieldCodec, post: PostRecord) -> Result<PostView, DecryptionError> {
    Ok(PostView {
        id: post.id,
        user_id: post.user_id,
        content: codec.decrypt_opt(post.content.as_deref())?,
        images: post.images,
        likes: post.likes,
        created_at: post.created_at,
        updated_at: post.updated_at,
    })
}

fn comment_view(comment: CommentRecord, plaintext: String) -> CommentView {
    CommentView {
        id: comment.id,
        post_id: comment.post_id,
        user_id: comment.user_id,
        content: plaintext,
        created_at: comment.created_at,
    }
}

async fn owned_post(state: &AppState, id: Uuid, user: &AuthUser) -> Result<PostRecord, ApiError> {
    let post = state
        .store
        .post_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found(POST_NOT_FOUND))?;
    if post.user_id != user.id() {
        return Err(ApiError::forbidden(NOT_POST_OWNER));
    }
    Ok(post)
}

/// `POST /api/posts/createPost` (multipart: `content`, `images`)
pub async fn create_post(
    State(state): State<AppState>,
    user: AuthUser,
    multipart: Multipart,
) -> Result<(StatusCode, Json<PostView>), ApiError> {
    let form = read_post_form(multipart, state.settings.max_images_per_post).await?;
    let images = store_images(&state, &form.images).await?;

    let now = Utc::now();
    let post = PostRecord {
        id: Uuid::new_v4(),
        user_id: user.id(),
        content: state.codec.encrypt_opt(form.content.as_deref()),
        images,
        likes: Vec::new(),
        created_at: now,
        updated_at: now,
    };
    if let Err(e) = state.store.insert_post(post.clone()).await {
        state.images.remove(&post.images).await;
        return Err(e.into());
    }
    info!(post_id = %post.id, user_id = %post.user_id, "post created");

    Ok((StatusCode::CREATED, Json(post_view(&state.codec, post)?)))
}

/// `PUT /api/posts/updatePost/:id` (multipart: `content`, `images`)
pub async fn update_post(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    multipart: Multipart,
) -> Result<Json<MessageResponse>, ApiError> {
    let id = parse_id(&id)?;
    let mut post = owned_post(&state, id, &user).await?;

    let form = read_post_form(multipart, state.settings.max_images_per_post).await?;
    let fresh = store_images(&state, &form.images).await?;
    let replaced = std::mem::replace(&mut post.images, fresh.clone());
    post.content = state.codec.encrypt_opt(form.content.as_deref());
    post.updated_at = Utc::now();

    match state.store.update_post(post).await {
        Ok(true) => state.images.remove(&replaced).await,
        Ok(false) => {
            state.images.remove(&fresh).await;
            return Err(ApiError::not_found(POST_NOT_FOUND));
        }
        Err(e) => {
            state.images.remove(&fresh).await;
            return Err(e.into());
        }
    }
    info!(post_id = %id, "post updated");
    Ok(Json(MessageResponse::new("Post updated successfully")))
}

/// `PATCH /api/posts/like/:id`
pub async fn like_post(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let id = parse_id(&id)?;
    match state.store.add_like(id, user.id()).await? {
        LikeOutcome::Liked => Ok(Json(MessageResponse::new("Post liked successfully"))),
        LikeOutcome::AlreadyLiked => Err(ApiError::bad_request("You have already liked this post")),
        LikeOutcome::PostNotFound => Err(ApiError::not_found("Post does not exist")),
    }
}

/// `GET /api/posts/post/:id` — the post and its comments, decrypted.
pub async fn get_post(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<PostWithComments>, ApiError> {
    let id = parse_id(&id)?;
    let post = state
        .store
        .post_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found(POST_NOT_FOUND))?;
    let comments = state.store.comments_for_post(id).await?;

    let plaintexts = state
        .codec
        .decrypt_many(comments.iter().map(|c| c.content.as_str()))?;
    let comments = comments
        .into_iter()
        .zip(plaintexts)
        .map(|(c, p)| comment_view(c, p))
        .collect();

    Ok(Json(PostWithComments {
        post: post_view(&state.codec, post)?,
        comments,
    }))
}

/// `POST /api/posts/deletePost/:id` — removes the post and its comments.
pub async fn delete_post(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let id = parse_id(&id)?;
    let post = owned_post(&state, id, &user).await?;
    if !state.store.delete_post(id).await? {
        return Err(ApiError::not_found(POST_NOT_FOUND));
    }
    state.images.remove(&post.images).await;
    info!(post_id = %id, "post deleted");
    Ok(Json(MessageResponse::new("Post successfully deleted")))
}

/// `POST /api/posts/addComment/:id`
pub async fn add_comment(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    Json(req): Json<AddCommentRequest>,
) -> Result<(StatusCode, Json<CommentView>), ApiError> {
    let post_id = parse_id(&id)?;
    // Stored exactly as sent; whitespace-only counts as empty.
    let content = req
        .content
        .filter(|c| !c.trim().is_empty())
        .ok_or_else(|| ApiError::bad_request("Please add the comment"))?;

    if state.store.post_by_id(post_id).await?.is_none() {
        return Err(ApiError::not_found(POST_NOT_FOUND));
    }

    let now = Utc::now();
    let comment = CommentRecord {
        id: Uuid::new_v4(),
        post_id,
        user_id: user.id(),
        content: state.codec.encrypt(&content),
        created_at: now,
        updated_at: now,
    };
    state.store.insert_comment(comment.clone()).await?;
    info!(comment_id = %comment.id, post_id = %post_id, "comment added");

    let plaintext = state.codec.decrypt(&comment.content)?;
    Ok((StatusCode::CREATED, Json(comment_view(comment, plaintext))))
}

/// `POST /api/posts/deleteComment/:postID/:commentID`
pub async fn delete_comment(
    State(state): State<AppState>,
    user: AuthUser,
    Path((post_id, comment_id)): Path<(String, String)>,
) -> Result<Json<MessageResponse>, ApiError> {
    let post_id = parse_id(&post_id)?;
    let comment_id = parse_id(&comment_id)?;

    if state.store.post_by_id(post_id).await?.is_none() {
        return Err(ApiError::not_found(POST_NOT_FOUND));
    }
    let comment = state
        .store
        .comment_by_id(comment_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Comment not found"))?;
    if comment.post_id != post_id {
        return Err(ApiError::bad_request("Comment does not belong to the post"));
    }
    if comment.user_id != user.id() {
        return Err(ApiError::forbidden("Comment does not belong to the user"));
    }

    state.store.delete_comment(comment_id).await?;
    info!(comment_id = %comment_id, "comment deleted");
    Ok(Json(MessageResponse::new("Comment successfully deleted")))
}
