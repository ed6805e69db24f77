//! Repositories for posts, likes and follows

use std::sync::Arc;

use async_trait::async_trait;
use common::error::DatabaseResult;
use uuid::Uuid;

use crate::models::{FeedFilter, FollowToggle, LikeToggle, Post, UserSummary};

pub mod posts;

/// Persistence port for the network
#[async_trait]
pub trait NetworkStore: Send + Sync {
    async fn create_post(&self, author_id: Uuid, content: &str) -> DatabaseResult<Post>;

    /// One post as seen by `viewer`
    async fn find_post(&self, post_id: i64, viewer: Option<Uuid>) -> DatabaseResult<Option<Post>>;

    /// Overwrite the content of a post written by `author_id`
    ///
    /// Returns the stored content, or `None` if no such post by that author exists.
    async fn update_post(
        &self,
        post_id: i64,
        author_id: Uuid,
        content: &str,
    ) -> DatabaseResult<Option<String>>;

    async fn count_posts(&self, filter: FeedFilter) -> DatabaseResult<i64>;

    /// Posts matching `filter`, newest first
    async fn posts(
        &self,
        filter: FeedFilter,
        viewer: Option<Uuid>,
        limit: i64,
        offset: i64,
    ) -> DatabaseResult<Vec<Post>>;

    /// Flip whether `user_id` likes a post; `None` if the post does not exist
    async fn toggle_like(&self, post_id: i64, user_id: Uuid) -> DatabaseResult<Option<LikeToggle>>;

    async fn find_user(&self, username: &str) -> DatabaseResult<Option<UserSummary>>;

    /// Flip whether `follower_id` follows `followed_id`
    async fn toggle_follow(
        &self,
        follower_id: Uuid,
        followed_id: Uuid,
    ) -> DatabaseResult<FollowToggle>;

    async fn is_following(&self, follower_id: Uuid, followed_id: Uuid) -> DatabaseResult<bool>;

    /// `(followers, following)` of a user
    async fn follow_counts(&self, user_id: Uuid) -> DatabaseResult<(i64, i64)>;
}

pub type DynNetworkStore = Arc<dyn NetworkStore>;
