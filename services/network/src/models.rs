//! Network models

use chrono::{DateTime, Utc};
use common::pagination::Page;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Longest accepted post, in characters
pub const POST_MAX_CHARS: usize = 1000;

/// Post as seen by one viewer
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Post {
    pub id: i64,
    pub author_id: Uuid,
    pub author: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub likes_count: i64,
    /// Whether the viewer likes this post; always false for anonymous viewers
    pub is_liked: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct UserSummary {
    pub id: Uuid,
    pub username: String,
}

/// Which posts a feed shows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedFilter {
    All,
    /// Posts by users the given user follows
    FollowedBy(Uuid),
    /// Posts by the given user
    Author(Uuid),
}

#[derive(Debug, Deserialize)]
pub struct NewPostRequest {
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LikeToggle {
    pub liked: bool,
    pub likes_count: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FollowStatus {
    Followed,
    Unfollowed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FollowToggle {
    pub status: FollowStatus,
    pub followers_count: i64,
}

#[derive(Debug, Serialize)]
pub struct PostUpdated {
    pub message: &'static str,
    pub content: String,
}

/// Profile page
#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub user: UserSummary,
    pub followers_count: i64,
    pub following_count: i64,
    pub is_following: bool,
    pub posts: Page<Post>,
}
