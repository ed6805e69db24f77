//! Repositories for auction data
//!
//! [`AuctionStore`] is the persistence port used by the handlers;
//! [`listings::PgAuctionStore`] is the PostgreSQL adapter.

use std::sync::Arc;

use async_trait::async_trait;
use common::error::DatabaseResult;
use uuid::Uuid;

use crate::{
    bidding::{BidOutcome, CloseOutcome},
    models::{Bid, Category, Comment, Listing, Money, NewListing},
};

pub mod listings;

/// Persistence port for listings, bids, comments and watchlists
#[async_trait]
pub trait AuctionStore: Send + Sync {
    /// Insert a listing owned by `owner_id`
    async fn create_listing(&self, owner_id: Uuid, listing: &NewListing)
    -> DatabaseResult<Listing>;

    /// Active listings, newest first, optionally within one category
    async fn active_listings(&self, category: Option<Category>) -> DatabaseResult<Vec<Listing>>;

    async fn find_listing(&self, listing_id: i64) -> DatabaseResult<Option<Listing>>;

    /// Bids on a listing, highest first
    async fn bids(&self, listing_id: i64) -> DatabaseResult<Vec<Bid>>;

    /// Comments on a listing, oldest first
    async fn comments(&self, listing_id: i64) -> DatabaseResult<Vec<Comment>>;

    async fn highest_bid(&self, listing_id: i64) -> DatabaseResult<Option<Bid>>;

    /// Check and insert a bid atomically; `None` if the listing does not exist
    async fn place_bid(
        &self,
        listing_id: i64,
        bidder_id: Uuid,
        amount: Money,
    ) -> DatabaseResult<Option<BidOutcome>>;

    async fn add_comment(
        &self,
        listing_id: i64,
        author_id: Uuid,
        text: &str,
    ) -> DatabaseResult<Comment>;

    /// Deactivate a listing owned by `actor_id`; `None` if it does not exist
    async fn close_listing(
        &self,
        listing_id: i64,
        actor_id: Uuid,
    ) -> DatabaseResult<Option<CloseOutcome>>;

    /// Flip watchlist membership; returns whether the listing is now watched
    async fn toggle_watchlist(&self, user_id: Uuid, listing_id: i64) -> DatabaseResult<bool>;

    async fn is_watching(&self, user_id: Uuid, listing_id: i64) -> DatabaseResult<bool>;

    /// Listings watched by a user, most recently added first
    async fn watchlist(&self, user_id: Uuid) -> DatabaseResult<Vec<Listing>>;
}

/// Shared handle to an auction store
pub type DynAuctionStore = Arc<dyn AuctionStore>;
