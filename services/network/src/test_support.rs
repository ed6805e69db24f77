//! In-memory stores and request helpers for handler tests

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use chrono::{Duration, Utc};
use common::{
    accounts::{NewUser, User, UserStore},
    auth::{JwtConfig, JwtService},
    error::{DatabaseError, DatabaseResult},
};
use serde_json::Value;
use tokio::sync::Mutex;
use tower::ServiceExt;
use uuid::Uuid;

use crate::{
    models::{FeedFilter, FollowStatus, FollowToggle, LikeToggle, Post, UserSummary},
    repositories::NetworkStore,
    routes::create_router,
    state::AppState,
};

struct StoredPost {
    id: i64,
    author_id: Uuid,
    content: String,
    created_at: chrono::DateTime<Utc>,
}

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    posts: Vec<StoredPost>,
    likes: Vec<(i64, Uuid)>,
    follows: Vec<(Uuid, Uuid)>,
}

impl Tables {
    fn username(&self, id: Uuid) -> String {
        self.users
            .iter()
            .find(|u| u.id == id)
            .map(|u| u.username.clone())
            .unwrap_or_default()
    }

    fn likes_count(&self, post_id: i64) -> i64 {
        self.likes.iter().filter(|(p, _)| *p == post_id).count() as i64
    }

    fn view(&self, post: &StoredPost, viewer: Option<Uuid>) -> Post {
        Post {
            id: post.id,
            author_id: post.author_id,
            author: self.username(post.author_id),
            content: post.content.clone(),
            created_at: post.created_at,
            likes_count: self.likes_count(post.id),
            is_liked: viewer.is_some_and(|v| self.likes.contains(&(post.id, v))),
        }
    }

    fn matches(&self, post: &StoredPost, filter: FeedFilter) -> bool {
        match filter {
            FeedFilter::All => true,
            FeedFilter::FollowedBy(user_id) => self.follows.contains(&(user_id, post.author_id)),
            FeedFilter::Author(user_id) => post.author_id == user_id,
        }
    }
}

/// Network and user store backed by vectors behind a mutex
#[derive(Default)]
pub struct FixtureNetworkStore {
    tables: Mutex<Tables>,
}

#[async_trait]
impl UserStore for FixtureNetworkStore {
    async fn create(&self, new_user: &NewUser) -> DatabaseResult<User> {
        let mut tables = self.tables.lock().await;
        if tables.users.iter().any(|u| u.username == new_user.username) {
            return Err(DatabaseError::Conflict("Username already taken.".to_string()));
        }
        let user = User {
            id: Uuid::new_v4(),
            username: new_user.username.clone(),
            email: new_user.email.clone(),
            password_hash: new_user.password_hash.clone(),
            is_staff: false,
            created_at: Utc::now(),
        };
        tables.users.push(user.clone());
        Ok(user)
    }

    async fn find_by_username(&self, username: &str) -> DatabaseResult<Option<User>> {
        let tables = self.tables.lock().await;
        Ok(tables.users.iter().find(|u| u.username == username).cloned())
    }
}

#[async_trait]
impl NetworkStore for FixtureNetworkStore {
    async fn create_post(&self, author_id: Uuid, content: &str) -> DatabaseResult<Post> {
        let mut tables = self.tables.lock().await;
        let id = tables.posts.len() as i64 + 1;
        // Strictly increasing timestamps keep newest-first ordering deterministic
        let post = StoredPost {
            id,
            author_id,
            content: content.to_string(),
            created_at: Utc::now() + Duration::milliseconds(id),
        };
        let view = tables.view(&post, Some(author_id));
        tables.posts.push(post);
        Ok(view)
    }

    async fn find_post(&self, post_id: i64, viewer: Option<Uuid>) -> DatabaseResult<Option<Post>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .posts
            .iter()
            .find(|p| p.id == post_id)
            .map(|p| tables.view(p, viewer)))
    }

    async fn update_post(
        &self,
        post_id: i64,
        author_id: Uuid,
        content: &str,
    ) -> DatabaseResult<Option<String>> {
        let mut tables = self.tables.lock().await;
        Ok(tables
            .posts
            .iter_mut()
            .find(|p| p.id == post_id && p.author_id == author_id)
            .map(|p| {
                p.content = content.to_string();
                p.content.clone()
            }))
    }

    async fn count_posts(&self, filter: FeedFilter) -> DatabaseResult<i64> {
        let tables = self.tables.lock().await;
        Ok(tables.posts.iter().filter(|p| tables.matches(p, filter)).count() as i64)
    }

    async fn posts(
        &self,
        filter: FeedFilter,
        viewer: Option<Uuid>,
        limit: i64,
        offset: i64,
    ) -> DatabaseResult<Vec<Post>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .posts
            .iter()
            .rev()
            .filter(|p| tables.matches(p, filter))
            .skip(offset as usize)
            .take(limit as usize)
            .map(|p| tables.view(p, viewer))
            .collect())
    }

    async fn toggle_like(&self, post_id: i64, user_id: Uuid) -> DatabaseResult<Option<LikeToggle>> {
        let mut tables = self.tables.lock().await;
        if !tables.posts.iter().any(|p| p.id == post_id) {
            return Ok(None);
        }

        let liked = if tables.likes.contains(&(post_id, user_id)) {
            tables.likes.retain(|like| *like != (post_id, user_id));
            false
        } else {
            tables.likes.push((post_id, user_id));
            true
        };

        Ok(Some(LikeToggle {
            liked,
            likes_count: tables.likes_count(post_id),
        }))
    }

    async fn find_user(&self, username: &str) -> DatabaseResult<Option<UserSummary>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .users
            .iter()
            .find(|u| u.username == username)
            .map(|u| UserSummary {
                id: u.id,
                username: u.username.clone(),
            }))
    }

    async fn toggle_follow(
        &self,
        follower_id: Uuid,
        followed_id: Uuid,
    ) -> DatabaseResult<FollowToggle> {
        let mut tables = self.tables.lock().await;
        let pair = (follower_id, followed_id);

        let status = if tables.follows.contains(&pair) {
            tables.follows.retain(|f| *f != pair);
            FollowStatus::Unfollowed
        } else {
            tables.follows.push(pair);
            FollowStatus::Followed
        };

        Ok(FollowToggle {
            status,
            followers_count: tables.follows.iter().filter(|(_, f)| *f == followed_id).count()
                as i64,
        })
    }

    async fn is_following(&self, follower_id: Uuid, followed_id: Uuid) -> DatabaseResult<bool> {
        let tables = self.tables.lock().await;
        Ok(tables.follows.contains(&(follower_id, followed_id)))
    }

    async fn follow_counts(&self, user_id: Uuid) -> DatabaseResult<(i64, i64)> {
        let tables = self.tables.lock().await;
        let followers = tables.follows.iter().filter(|(_, f)| *f == user_id).count();
        let following = tables.follows.iter().filter(|(f, _)| *f == user_id).count();
        Ok((followers as i64, following as i64))
    }
}

/// Router wired to a fresh fixture store
pub struct TestApp {
    pub router: Router,
    pub store: Arc<FixtureNetworkStore>,
    pub jwt: JwtService,
}

impl TestApp {
    pub fn new() -> Self {
        let store = Arc::new(FixtureNetworkStore::default());
        let jwt = JwtService::new(JwtConfig {
            secret: "network-test".to_string(),
            token_expiry: 300,
        });
        let router = create_router(AppState {
            store: store.clone(),
            users: store.clone(),
            jwt: jwt.clone(),
        });

        Self { router, store, jwt }
    }

    /// Create a user directly in the store and return a bearer token for it
    pub async fn user(&self, username: &str) -> (Uuid, String) {
        let user = self
            .store
            .create(&NewUser {
                username: username.to_string(),
                email: String::new(),
                password_hash: String::new(),
            })
            .await
            .unwrap();
        let token = self.jwt.generate_token(user.id, &user.username).unwrap();
        (user.id, token)
    }

    /// Create a post directly in the store
    pub async fn post(&self, author_id: Uuid, content: &str) -> i64 {
        self.store.create_post(author_id, content).await.unwrap().id
    }

    /// Send a request with a raw body; non-JSON responses decode to `Null`
    pub async fn send_raw(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<String>,
    ) -> (StatusCode, Option<String>, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            request = request.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => request
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body)),
            None => request.body(Body::empty()),
        }
        .unwrap();

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let location = response
            .headers()
            .get(header::LOCATION)
            .map(|v| v.to_str().unwrap().to_string());
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

        (status, location, json)
    }

    pub async fn send(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Option<String>, Value) {
        self.send_raw(method, uri, token, body.map(|b| b.to_string()))
            .await
    }
}
