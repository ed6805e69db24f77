//! PostgreSQL adapter for [`AuctionStore`]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::error::DatabaseResult;
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use tracing::info;
use uuid::Uuid;

use super::AuctionStore;
use crate::{
    bidding::{self, BidOutcome, CloseOutcome, Winner},
    models::{Bid, Category, Comment, Listing, Money, NewListing},
};

/// Listing columns plus the derived current price and owner name
const SELECT_LISTING: &str = r#"
    SELECT l.id, l.title, l.description, l.starting_bid,
           COALESCE((SELECT MAX(b.amount) FROM bids b WHERE b.listing_id = l.id), l.starting_bid)
               AS current_price,
           l.image_url, l.category, l.owner_id, u.username AS owner, l.active, l.created_at
    FROM listings l
    JOIN users u ON u.id = l.owner_id
"#;

const SELECT_BID: &str = r#"
    SELECT b.id, b.listing_id, b.bidder_id, u.username AS bidder, b.amount, b.created_at
    FROM bids b
    JOIN users u ON u.id = b.bidder_id
"#;

#[derive(FromRow)]
struct ListingRow {
    id: i64,
    title: String,
    description: String,
    starting_bid: Money,
    current_price: Money,
    image_url: Option<String>,
    category: Option<String>,
    owner_id: Uuid,
    owner: String,
    active: bool,
    created_at: DateTime<Utc>,
}

impl From<ListingRow> for Listing {
    fn from(row: ListingRow) -> Self {
        Listing {
            id: row.id,
            title: row.title,
            description: row.description,
            starting_bid: row.starting_bid,
            current_price: row.current_price,
            image_url: row.image_url,
            category: row.category.and_then(|c| c.parse::<Category>().ok()),
            owner_id: row.owner_id,
            owner: row.owner,
            active: row.active,
            created_at: row.created_at,
        }
    }
}

/// PostgreSQL auction repository
#[derive(Clone)]
pub struct PgAuctionStore {
    pool: PgPool,
}

impl PgAuctionStore {
    /// Create a new auction repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn highest_bid_in(
        tx: &mut Transaction<'_, Postgres>,
        listing_id: i64,
    ) -> DatabaseResult<Option<Bid>> {
        let bid = sqlx::query_as::<_, Bid>(&format!(
            "{} WHERE b.listing_id = $1 ORDER BY b.amount DESC, b.created_at ASC LIMIT 1",
            SELECT_BID
        ))
        .bind(listing_id)
        .fetch_optional(&mut **tx)
        .await?;

        Ok(bid)
    }
}

#[async_trait]
impl AuctionStore for PgAuctionStore {
    async fn create_listing(
        &self,
        owner_id: Uuid,
        listing: &NewListing,
    ) -> DatabaseResult<Listing> {
        info!("Creating listing '{}' for user {}", listing.title, owner_id);

        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO listings (title, description, starting_bid, image_url, category, owner_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            "#,
        )
        .bind(&listing.title)
        .bind(&listing.description)
        .bind(listing.starting_bid)
        .bind(&listing.image_url)
        .bind(listing.category.map(Category::as_str))
        .bind(owner_id)
        .fetch_one(&self.pool)
        .await?;

        let row = sqlx::query_as::<_, ListingRow>(&format!("{} WHERE l.id = $1", SELECT_LISTING))
            .bind(id)
            .fetch_one(&self.pool)
            .await?;

        Ok(row.into())
    }

    async fn active_listings(&self, category: Option<Category>) -> DatabaseResult<Vec<Listing>> {
        let rows = sqlx::query_as::<_, ListingRow>(&format!(
            "{} WHERE l.active AND ($1::TEXT IS NULL OR l.category = $1) \
             ORDER BY l.created_at DESC",
            SELECT_LISTING
        ))
        .bind(category.map(Category::as_str))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Listing::from).collect())
    }

    async fn find_listing(&self, listing_id: i64) -> DatabaseResult<Option<Listing>> {
        let row = sqlx::query_as::<_, ListingRow>(&format!("{} WHERE l.id = $1", SELECT_LISTING))
            .bind(listing_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Listing::from))
    }

    async fn bids(&self, listing_id: i64) -> DatabaseResult<Vec<Bid>> {
        let bids = sqlx::query_as::<_, Bid>(&format!(
            "{} WHERE b.listing_id = $1 ORDER BY b.amount DESC, b.created_at ASC",
            SELECT_BID
        ))
        .bind(listing_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(bids)
    }

    async fn comments(&self, listing_id: i64) -> DatabaseResult<Vec<Comment>> {
        let comments = sqlx::query_as::<_, Comment>(
            r#"
            SELECT c.id, c.listing_id, c.author_id, u.username AS author, c.text, c.created_at
            FROM comments c
            JOIN users u ON u.id = c.author_id
            WHERE c.listing_id = $1
            ORDER BY c.created_at ASC, c.id ASC
            "#,
        )
        .bind(listing_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(comments)
    }

    async fn highest_bid(&self, listing_id: i64) -> DatabaseResult<Option<Bid>> {
        let mut tx = self.pool.begin().await?;
        let bid = Self::highest_bid_in(&mut tx, listing_id).await?;
        tx.commit().await?;
        Ok(bid)
    }

    async fn place_bid(
        &self,
        listing_id: i64,
        bidder_id: Uuid,
        amount: Money,
    ) -> DatabaseResult<Option<BidOutcome>> {
        let mut tx = self.pool.begin().await?;

        // Row lock serializes concurrent bids on the same listing
        let listing: Option<(bool, Money)> = sqlx::query_as(
            "SELECT active, starting_bid FROM listings WHERE id = $1 FOR UPDATE",
        )
        .bind(listing_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some((active, starting_bid)) = listing else {
            tx.rollback().await?;
            return Ok(None);
        };

        let highest: Option<Money> =
            sqlx::query_scalar("SELECT MAX(amount) FROM bids WHERE listing_id = $1")
                .bind(listing_id)
                .fetch_one(&mut *tx)
                .await?;

        let price = bidding::current_price(starting_bid, highest);
        if let Err(rejection) = bidding::check_bid(active, price, amount) {
            tx.rollback().await?;
            info!("Bid of {} on listing {} rejected: {:?}", amount, listing_id, rejection);
            return Ok(Some(BidOutcome::Rejected(rejection)));
        }

        let bid = sqlx::query_as::<_, Bid>(
            r#"
            WITH inserted AS (
                INSERT INTO bids (listing_id, bidder_id, amount)
                VALUES ($1, $2, $3)
                RETURNING id, listing_id, bidder_id, amount, created_at
            )
            SELECT i.id, i.listing_id, i.bidder_id, u.username AS bidder, i.amount, i.created_at
            FROM inserted i
            JOIN users u ON u.id = i.bidder_id
            "#,
        )
        .bind(listing_id)
        .bind(bidder_id)
        .bind(amount)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        info!("Bid of {} placed on listing {}", amount, listing_id);
        Ok(Some(BidOutcome::Placed(bid)))
    }

    async fn add_comment(
        &self,
        listing_id: i64,
        author_id: Uuid,
        text: &str,
    ) -> DatabaseResult<Comment> {
        let comment = sqlx::query_as::<_, Comment>(
            r#"
            WITH inserted AS (
                INSERT INTO comments (listing_id, author_id, text)
                VALUES ($1, $2, $3)
                RETURNING id, listing_id, author_id, text, created_at
            )
            SELECT i.id, i.listing_id, i.author_id, u.username AS author, i.text, i.created_at
            FROM inserted i
            JOIN users u ON u.id = i.author_id
            "#,
        )
        .bind(listing_id)
        .bind(author_id)
        .bind(text)
        .fetch_one(&self.pool)
        .await?;

        Ok(comment)
    }

    async fn close_listing(
        &self,
        listing_id: i64,
        actor_id: Uuid,
    ) -> DatabaseResult<Option<CloseOutcome>> {
        let mut tx = self.pool.begin().await?;

        let owner_id: Option<Uuid> =
            sqlx::query_scalar("SELECT owner_id FROM listings WHERE id = $1 FOR UPDATE")
                .bind(listing_id)
                .fetch_optional(&mut *tx)
                .await?;

        let Some(owner_id) = owner_id else {
            tx.rollback().await?;
            return Ok(None);
        };

        if owner_id != actor_id {
            tx.rollback().await?;
            return Ok(Some(CloseOutcome::NotOwner));
        }

        sqlx::query("UPDATE listings SET active = FALSE WHERE id = $1")
            .bind(listing_id)
            .execute(&mut *tx)
            .await?;

        let winner = Self::highest_bid_in(&mut tx, listing_id)
            .await?
            .map(|bid| Winner {
                user_id: bid.bidder_id,
                username: bid.bidder,
                amount: bid.amount,
            });

        tx.commit().await?;
        info!("Listing {} closed", listing_id);
        Ok(Some(CloseOutcome::Closed { winner }))
    }

    async fn toggle_watchlist(&self, user_id: Uuid, listing_id: i64) -> DatabaseResult<bool> {
        let mut tx = self.pool.begin().await?;

        let removed = sqlx::query("DELETE FROM watchlist WHERE user_id = $1 AND listing_id = $2")
            .bind(user_id)
            .bind(listing_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        if removed == 0 {
            sqlx::query(
                r#"
                INSERT INTO watchlist (user_id, listing_id)
                VALUES ($1, $2)
                ON CONFLICT (user_id, listing_id) DO NOTHING
                "#,
            )
            .bind(user_id)
            .bind(listing_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(removed == 0)
    }

    async fn is_watching(&self, user_id: Uuid, listing_id: i64) -> DatabaseResult<bool> {
        let watching: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM watchlist WHERE user_id = $1 AND listing_id = $2)",
        )
        .bind(user_id)
        .bind(listing_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(watching)
    }

    async fn watchlist(&self, user_id: Uuid) -> DatabaseResult<Vec<Listing>> {
        let rows = sqlx::query_as::<_, ListingRow>(&format!(
            "{} JOIN watchlist w ON w.listing_id = l.id \
             WHERE w.user_id = $1 ORDER BY w.added_at DESC",
            SELECT_LISTING
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Listing::from).collect())
    }
}
