//! Auction site models

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use common::http::Flash;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

pub mod money;

pub use money::{Money, MoneyError};

/// Image shown for listings created without one
pub const PLACEHOLDER_IMAGE_URL: &str = "https://via.placeholder.com/400";

/// Listing category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Fashion,
    Toys,
    Electronics,
    Home,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Fashion,
        Category::Toys,
        Category::Electronics,
        Category::Home,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Fashion => "Fashion",
            Category::Toys => "Toys",
            Category::Electronics => "Electronics",
            Category::Home => "Home",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    /// Case-insensitive match on the category name
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                format!(
                    "Select a valid choice. {} is not one of the available choices.",
                    s
                )
            })
    }
}

/// Auction listing with its resolved current price
#[derive(Debug, Clone, Serialize)]
pub struct Listing {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub starting_bid: Money,
    pub current_price: Money,
    pub image_url: Option<String>,
    pub category: Option<Category>,
    pub owner_id: Uuid,
    pub owner: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

/// Validated input for a new listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewListing {
    pub title: String,
    pub description: String,
    pub starting_bid: Money,
    pub image_url: String,
    pub category: Option<Category>,
}

/// Bid on a listing
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Bid {
    pub id: i64,
    pub listing_id: i64,
    pub bidder_id: Uuid,
    pub bidder: String,
    pub amount: Money,
    pub created_at: DateTime<Utc>,
}

/// Comment on a listing
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Comment {
    pub id: i64,
    pub listing_id: i64,
    pub author_id: Uuid,
    pub author: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

/// Everything the listing page shows
#[derive(Debug, Serialize)]
pub struct ListingView {
    pub listing: Listing,
    pub bids: Vec<Bid>,
    pub comments: Vec<Comment>,
    pub in_watchlist: bool,
    pub can_close: bool,
    pub winner: Option<String>,
    pub messages: Vec<Flash>,
}

/// A list of listings, optionally scoped to a category
#[derive(Debug, Serialize)]
pub struct ListingsResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    pub listings: Vec<Listing>,
}
