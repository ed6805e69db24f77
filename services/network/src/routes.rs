//! Network service routes

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect},
    routing::{get, post, put},
};
use common::{
    accounts,
    auth::{CurrentUser, MaybeUser},
    http::{ApiError, ApiResult, JsonBody, WithRejection},
    pagination::{PAGE_SIZE, Page, PageQuery, PageRequest},
};
use serde_json::json;
use tower_http::trace::TraceLayer;
use tracing::info;
use uuid::Uuid;

use crate::{
    models::{
        FeedFilter, FollowToggle, LikeToggle, NewPostRequest, Post, PostUpdated,
        ProfileResponse, UserSummary,
    },
    repositories::DynNetworkStore,
    social::{check_edit, check_follow, edit_content, post_content},
    state::AppState,
};

/// Create the router for the network service
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/posts", get(all_posts).post(create_post))
        .route("/posts/:id", put(edit_post))
        .route("/posts/:id/like", post(toggle_like))
        .route("/following", get(following_posts))
        .route("/users/:username", get(profile))
        .route("/users/:username/follow", post(toggle_follow))
        .merge(accounts::router::<AppState>())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "network-service"
    }))
}

/// Resolve the requested page of a feed and load its posts
async fn feed_page(
    store: &DynNetworkStore,
    filter: FeedFilter,
    viewer: Option<Uuid>,
    query: &PageQuery,
) -> ApiResult<Page<Post>> {
    let total = store.count_posts(filter).await?;
    let request = PageRequest::resolve(query.page.as_deref(), total, PAGE_SIZE);
    let posts = store
        .posts(filter, viewer, request.limit(), request.offset())
        .await?;

    Ok(Page::new(posts, request))
}

async fn require_user(store: &DynNetworkStore, username: &str) -> ApiResult<UserSummary> {
    store
        .find_user(username)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found.".to_string()))
}

/// Every post, newest first
pub async fn all_posts(
    State(state): State<AppState>,
    user: MaybeUser,
    Query(query): Query<PageQuery>,
) -> ApiResult<Json<Page<Post>>> {
    let page = feed_page(&state.store, FeedFilter::All, user.id(), &query).await?;
    Ok(Json(page))
}

pub async fn create_post(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    WithRejection(Json(payload), _): JsonBody<NewPostRequest>,
) -> ApiResult<Redirect> {
    let content = post_content(&payload.content).map_err(ApiError::BadRequest)?;
    let post = state.store.create_post(user.id, &content).await?;

    info!("User {} created post {}", user.username, post.id);
    Ok(Redirect::to("/posts"))
}

/// Replace the content of one of the current user's posts
///
/// The body is read raw so malformed JSON gets the same error shape as the
/// other failures.
pub async fn edit_post(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
    body: Bytes,
) -> ApiResult<Json<PostUpdated>> {
    let post = state
        .store
        .find_post(id, Some(user.id))
        .await?
        .ok_or_else(|| ApiError::NotFound("Post not found.".to_string()))?;

    check_edit(post.author_id, user.id).map_err(|d| ApiError::Forbidden(d.message().to_string()))?;
    let content = edit_content(&body).map_err(ApiError::BadRequest)?;

    let content = state
        .store
        .update_post(id, user.id, &content)
        .await?
        .ok_or_else(|| ApiError::NotFound("Post not found.".to_string()))?;

    Ok(Json(PostUpdated {
        message: "Updated",
        content,
    }))
}

/// Like or unlike a post
pub async fn toggle_like(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
) -> ApiResult<Json<LikeToggle>> {
    let toggle = state
        .store
        .toggle_like(id, user.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Post not found.".to_string()))?;

    Ok(Json(toggle))
}

/// Posts by users the current user follows
pub async fn following_posts(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<PageQuery>,
) -> ApiResult<Json<Page<Post>>> {
    let page = feed_page(
        &state.store,
        FeedFilter::FollowedBy(user.id),
        Some(user.id),
        &query,
    )
    .await?;

    Ok(Json(page))
}

/// Follow or unfollow a user
pub async fn toggle_follow(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(username): Path<String>,
) -> ApiResult<Json<FollowToggle>> {
    let target = require_user(&state.store, &username).await?;
    check_follow(user.id, target.id).map_err(|d| ApiError::Forbidden(d.message().to_string()))?;

    let toggle = state.store.toggle_follow(user.id, target.id).await?;
    Ok(Json(toggle))
}

/// A user's profile with their posts
pub async fn profile(
    State(state): State<AppState>,
    viewer: MaybeUser,
    Path(username): Path<String>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Json<ProfileResponse>> {
    let profile_user = require_user(&state.store, &username).await?;
    let (followers_count, following_count) = state.store.follow_counts(profile_user.id).await?;

    let is_following = match viewer.id() {
        Some(viewer_id) if viewer_id != profile_user.id => {
            state.store.is_following(viewer_id, profile_user.id).await?
        }
        _ => false,
    };

    let posts = feed_page(
        &state.store,
        FeedFilter::Author(profile_user.id),
        viewer.id(),
        &query,
    )
    .await?;

    Ok(Json(ProfileResponse {
        user: profile_user,
        followers_count,
        following_count,
        is_following,
        posts,
    }))
}
