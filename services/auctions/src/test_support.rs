//! In-memory stores and request helpers for handler tests

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use chrono::Utc;
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
    bidding::{self, BidOutcome, CloseOutcome, Winner},
    models::{Bid, Category, Comment, Listing, Money, NewListing},
    repositories::AuctionStore,
    routes::create_router,
    state::AppState,
};

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    listings: Vec<Listing>,
    bids: Vec<Bid>,
    comments: Vec<Comment>,
    watchlist: Vec<(Uuid, i64)>,
    next_id: i64,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn username(&self, id: Uuid) -> String {
        self.users
            .iter()
            .find(|u| u.id == id)
            .map(|u| u.username.clone())
            .unwrap_or_default()
    }

    fn highest_bid(&self, listing_id: i64) -> Option<Bid> {
        self.bids
            .iter()
            .filter(|b| b.listing_id == listing_id)
            .max_by_key(|b| (b.amount, std::cmp::Reverse(b.id)))
            .cloned()
    }

    fn with_price(&self, listing: &Listing) -> Listing {
        let mut listing = listing.clone();
        listing.current_price = bidding::current_price(
            listing.starting_bid,
            self.highest_bid(listing.id).map(|b| b.amount),
        );
        listing
    }
}

/// Auction and user store backed by vectors behind a mutex
#[derive(Default)]
pub struct FixtureAuctionStore {
    tables: Mutex<Tables>,
}

#[async_trait]
impl UserStore for FixtureAuctionStore {
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
impl AuctionStore for FixtureAuctionStore {
    async fn create_listing(
        &self,
        owner_id: Uuid,
        listing: &NewListing,
    ) -> DatabaseResult<Listing> {
        let mut tables = self.tables.lock().await;
        let listing = Listing {
            id: tables.next_id(),
            title: listing.title.clone(),
            description: listing.description.clone(),
            starting_bid: listing.starting_bid,
            current_price: listing.starting_bid,
            image_url: Some(listing.image_url.clone()),
            category: listing.category,
            owner_id,
            owner: tables.username(owner_id),
            active: true,
            created_at: Utc::now(),
        };
        tables.listings.push(listing.clone());
        Ok(listing)
    }

    async fn active_listings(&self, category: Option<Category>) -> DatabaseResult<Vec<Listing>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .listings
            .iter()
            .rev()
            .filter(|l| l.active && category.is_none_or(|c| l.category == Some(c)))
            .map(|l| tables.with_price(l))
            .collect())
    }

    async fn find_listing(&self, listing_id: i64) -> DatabaseResult<Option<Listing>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .listings
            .iter()
            .find(|l| l.id == listing_id)
            .map(|l| tables.with_price(l)))
    }

    async fn bids(&self, listing_id: i64) -> DatabaseResult<Vec<Bid>> {
        let tables = self.tables.lock().await;
        let mut bids: Vec<Bid> = tables
            .bids
            .iter()
            .filter(|b| b.listing_id == listing_id)
            .cloned()
            .collect();
        bids.sort_by(|a, b| b.amount.cmp(&a.amount).then(a.id.cmp(&b.id)));
        Ok(bids)
    }

    async fn comments(&self, listing_id: i64) -> DatabaseResult<Vec<Comment>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .comments
            .iter()
            .filter(|c| c.listing_id == listing_id)
            .cloned()
            .collect())
    }

    async fn highest_bid(&self, listing_id: i64) -> DatabaseResult<Option<Bid>> {
        Ok(self.tables.lock().await.highest_bid(listing_id))
    }

    async fn place_bid(
        &self,
        listing_id: i64,
        bidder_id: Uuid,
        amount: Money,
    ) -> DatabaseResult<Option<BidOutcome>> {
        let mut tables = self.tables.lock().await;
        let Some(listing) = tables.listings.iter().find(|l| l.id == listing_id).cloned() else {
            return Ok(None);
        };

        let price = tables.with_price(&listing).current_price;
        if let Err(rejection) = bidding::check_bid(listing.active, price, amount) {
            return Ok(Some(BidOutcome::Rejected(rejection)));
        }

        let bid = Bid {
            id: tables.next_id(),
            listing_id,
            bidder_id,
            bidder: tables.username(bidder_id),
            amount,
            created_at: Utc::now(),
        };
        tables.bids.push(bid.clone());
        Ok(Some(BidOutcome::Placed(bid)))
    }

    async fn add_comment(
        &self,
        listing_id: i64,
        author_id: Uuid,
        text: &str,
    ) -> DatabaseResult<Comment> {
        let mut tables = self.tables.lock().await;
        let comment = Comment {
            id: tables.next_id(),
            listing_id,
            author_id,
            author: tables.username(author_id),
            text: text.to_string(),
            created_at: Utc::now(),
        };
        tables.comments.push(comment.clone());
        Ok(comment)
    }

    async fn close_listing(
        &self,
        listing_id: i64,
        actor_id: Uuid,
    ) -> DatabaseResult<Option<CloseOutcome>> {
        let mut tables = self.tables.lock().await;
        let Some(listing) = tables.listings.iter_mut().find(|l| l.id == listing_id) else {
            return Ok(None);
        };
        if listing.owner_id != actor_id {
            return Ok(Some(CloseOutcome::NotOwner));
        }
        listing.active = false;

        let winner = tables.highest_bid(listing_id).map(|bid| Winner {
            user_id: bid.bidder_id,
            username: bid.bidder,
            amount: bid.amount,
        });
        Ok(Some(CloseOutcome::Closed { winner }))
    }

    async fn toggle_watchlist(&self, user_id: Uuid, listing_id: i64) -> DatabaseResult<bool> {
        let mut tables = self.tables.lock().await;
        let before = tables.watchlist.len();
        tables
            .watchlist
            .retain(|&(u, l)| !(u == user_id && l == listing_id));
        if tables.watchlist.len() < before {
            return Ok(false);
        }
        tables.watchlist.push((user_id, listing_id));
        Ok(true)
    }

    async fn is_watching(&self, user_id: Uuid, listing_id: i64) -> DatabaseResult<bool> {
        let tables = self.tables.lock().await;
        Ok(tables.watchlist.contains(&(user_id, listing_id)))
    }

    async fn watchlist(&self, user_id: Uuid) -> DatabaseResult<Vec<Listing>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .watchlist
            .iter()
            .rev()
            .filter(|(u, _)| *u == user_id)
            .filter_map(|(_, l)| tables.listings.iter().find(|listing| listing.id == *l))
            .map(|l| tables.with_price(l))
            .collect())
    }
}

/// Router wired to a fresh fixture store
pub struct TestApp {
    pub router: Router,
    pub store: Arc<FixtureAuctionStore>,
    pub jwt: JwtService,
}

impl TestApp {
    pub fn new() -> Self {
        let store = Arc::new(FixtureAuctionStore::default());
        let jwt = JwtService::new(JwtConfig {
            secret: "auctions-test".to_string(),
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

    /// Send a request and decode the response; non-JSON bodies decode to `Null`
    pub async fn send(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Option<String>, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            request = request.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => request
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
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
}
