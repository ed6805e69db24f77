//! PostgreSQL adapter for [`NetworkStore`]

use async_trait::async_trait;
use common::error::DatabaseResult;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use super::NetworkStore;
use crate::models::{FeedFilter, FollowStatus, FollowToggle, LikeToggle, Post, UserSummary};

/// Post columns plus like data for the viewer bound to `$1`
const SELECT_POST: &str = r#"
    SELECT p.id, p.author_id, u.username AS author, p.content, p.created_at,
           (SELECT COUNT(*) FROM post_likes l WHERE l.post_id = p.id) AS likes_count,
           EXISTS (SELECT 1 FROM post_likes l WHERE l.post_id = p.id AND l.user_id = $1)
               AS is_liked
    FROM posts p
    JOIN users u ON u.id = p.author_id
"#;

/// `WHERE` condition of a feed over the user bound to `$2`
fn feed_condition(filter: FeedFilter) -> (&'static str, Option<Uuid>) {
    match filter {
        FeedFilter::All => ("$2::UUID IS NULL", None),
        FeedFilter::FollowedBy(user_id) => (
            "p.author_id IN (SELECT followed_id FROM follows WHERE follower_id = $2)",
            Some(user_id),
        ),
        FeedFilter::Author(user_id) => ("p.author_id = $2", Some(user_id)),
    }
}

/// PostgreSQL network repository
#[derive(Clone)]
pub struct PgNetworkStore {
    pool: PgPool,
}

impl PgNetworkStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn count_followers(&self, user_id: Uuid) -> DatabaseResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM follows WHERE followed_id = $1")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

#[async_trait]
impl NetworkStore for PgNetworkStore {
    async fn create_post(&self, author_id: Uuid, content: &str) -> DatabaseResult<Post> {
        info!("Creating post for user {}", author_id);

        let id: i64 = sqlx::query_scalar(
            "INSERT INTO posts (author_id, content) VALUES ($1, $2) RETURNING id",
        )
        .bind(author_id)
        .bind(content)
        .fetch_one(&self.pool)
        .await?;

        let post = sqlx::query_as::<_, Post>(&format!("{} WHERE p.id = $2", SELECT_POST))
            .bind(Some(author_id))
            .bind(id)
            .fetch_one(&self.pool)
            .await?;

        Ok(post)
    }

    async fn find_post(&self, post_id: i64, viewer: Option<Uuid>) -> DatabaseResult<Option<Post>> {
        let post = sqlx::query_as::<_, Post>(&format!("{} WHERE p.id = $2", SELECT_POST))
            .bind(viewer)
            .bind(post_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(post)
    }

    async fn update_post(
        &self,
        post_id: i64,
        author_id: Uuid,
        content: &str,
    ) -> DatabaseResult<Option<String>> {
        let content: Option<String> = sqlx::query_scalar(
            "UPDATE posts SET content = $3 WHERE id = $1 AND author_id = $2 RETURNING content",
        )
        .bind(post_id)
        .bind(author_id)
        .bind(content)
        .fetch_optional(&self.pool)
        .await?;

        if content.is_some() {
            info!("Post {} updated", post_id);
        }
        Ok(content)
    }

    async fn count_posts(&self, filter: FeedFilter) -> DatabaseResult<i64> {
        let (condition, user_id) = feed_condition(filter);
        // The count query has no viewer, so the feed user moves to `$1`
        let condition = condition.replace("$2", "$1");

        let count: i64 =
            sqlx::query_scalar(&format!("SELECT COUNT(*) FROM posts p WHERE {}", condition))
                .bind(user_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }

    async fn posts(
        &self,
        filter: FeedFilter,
        viewer: Option<Uuid>,
        limit: i64,
        offset: i64,
    ) -> DatabaseResult<Vec<Post>> {
        let (condition, user_id) = feed_condition(filter);

        let posts = sqlx::query_as::<_, Post>(&format!(
            "{} WHERE {} ORDER BY p.created_at DESC, p.id DESC LIMIT $3 OFFSET $4",
            SELECT_POST, condition
        ))
        .bind(viewer)
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(posts)
    }

    async fn toggle_like(&self, post_id: i64, user_id: Uuid) -> DatabaseResult<Option<LikeToggle>> {
        let mut tx = self.pool.begin().await?;

        let exists: Option<i64> = sqlx::query_scalar("SELECT id FROM posts WHERE id = $1")
            .bind(post_id)
            .fetch_optional(&mut *tx)
            .await?;
        if exists.is_none() {
            tx.rollback().await?;
            return Ok(None);
        }

        let removed = sqlx::query("DELETE FROM post_likes WHERE post_id = $1 AND user_id = $2")
            .bind(post_id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        if removed == 0 {
            sqlx::query(
                r#"
                INSERT INTO post_likes (post_id, user_id)
                VALUES ($1, $2)
                ON CONFLICT (post_id, user_id) DO NOTHING
                "#,
            )
            .bind(post_id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;
        }

        let likes_count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM post_likes WHERE post_id = $1")
                .bind(post_id)
                .fetch_one(&mut *tx)
                .await?;

        tx.commit().await?;
        Ok(Some(LikeToggle {
            liked: removed == 0,
            likes_count,
        }))
    }

    async fn find_user(&self, username: &str) -> DatabaseResult<Option<UserSummary>> {
        let user = sqlx::query_as::<_, UserSummary>(
            "SELECT id, username FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn toggle_follow(
        &self,
        follower_id: Uuid,
        followed_id: Uuid,
    ) -> DatabaseResult<FollowToggle> {
        let mut tx = self.pool.begin().await?;

        let removed =
            sqlx::query("DELETE FROM follows WHERE follower_id = $1 AND followed_id = $2")
                .bind(follower_id)
                .bind(followed_id)
                .execute(&mut *tx)
                .await?
                .rows_affected();

        if removed == 0 {
            sqlx::query(
                r#"
                INSERT INTO follows (follower_id, followed_id)
                VALUES ($1, $2)
                ON CONFLICT (follower_id, followed_id) DO NOTHING
                "#,
            )
            .bind(follower_id)
            .bind(followed_id)
            .execute(&mut *tx)
            .await?;
        }

        let followers_count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM follows WHERE followed_id = $1")
                .bind(followed_id)
                .fetch_one(&mut *tx)
                .await?;

        tx.commit().await?;

        let status = if removed == 0 {
            FollowStatus::Followed
        } else {
            FollowStatus::Unfollowed
        };
        info!("User {} {:?} user {}", follower_id, status, followed_id);

        Ok(FollowToggle {
            status,
            followers_count,
        })
    }

    async fn is_following(&self, follower_id: Uuid, followed_id: Uuid) -> DatabaseResult<bool> {
        let following: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM follows WHERE follower_id = $1 AND followed_id = $2)",
        )
        .bind(follower_id)
        .bind(followed_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(following)
    }

    async fn follow_counts(&self, user_id: Uuid) -> DatabaseResult<(i64, i64)> {
        let followers = self.count_followers(user_id).await?;
        let following: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM follows WHERE follower_id = $1")
                .bind(user_id)
                .fetch_one(&self.pool)
                .await?;

        Ok((followers, following))
    }
}
