//! Axum router construction.

use axum::{
    routing::{get, patch, post, put},
    Router,
};

use super::{handlers, middleware, state::AppState};

/// Build the application [`Router`] with all routes and middleware attached.
pub fn build(state: AppState) -> Router {
    let routes = Router::new()
        .route("/health", get(handlers::health))
        .nest("/api/users", user_routes())
        .nest("/api/posts", post_routes())
        .fallback(handlers::not_found);

    middleware::apply(routes, state.settings.max_upload_bytes).with_state(state)
}

fn user_routes() -> Router<AppState> {
    use handlers::users;

    Router::new()
        .route("/register", post(users::register))
        .route("/login", post(users::login))
        .route("/current", get(users::current))
        .route("/forgotPassword", post(users::forgot_password))
        .route("/resetPassword", patch(users::reset_password))
}

fn post_routes() -> Router<AppState> {
    use handlers::posts;

    Router::new()
        .route("/createPost", post(posts::create_post))
        .route("/updatePost/:id", put(posts::update_post))
        .route("/like/:id", patch(posts::like_post))
        .route("/post/:id", get(posts::get_post))
        .route("/deletePost/:id", post(posts::delete_post))
        .route("/addComment/:id", post(posts::add_comment))
        .route("/deleteComment/:postID/:commentID", post(posts::delete_comment))
}
