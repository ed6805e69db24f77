//! Bid acceptance and auction closing rules
//!
//! These functions hold the auction invariants. Every store adapter calls
//! them inside its own transaction, so the rules do not depend on the store.

use uuid::Uuid;

use crate::models::{Bid, Money};

/// Why a bid was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BidRejection {
    /// The listing is no longer active
    Closed,
    /// The amount does not exceed the current price
    TooLow { current_price: Money },
}

impl BidRejection {
    /// Flash message shown to the bidder
    pub fn message(&self) -> String {
        match self {
            BidRejection::Closed => "Auction is closed.".to_string(),
            BidRejection::TooLow { current_price } => format!(
                "Bid must be greater than current price (${}).",
                current_price
            ),
        }
    }
}

/// Result of a bid attempt on an existing listing
#[derive(Debug, Clone)]
pub enum BidOutcome {
    Placed(Bid),
    Rejected(BidRejection),
}

/// Highest bidder of a closed auction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Winner {
    pub user_id: Uuid,
    pub username: String,
    pub amount: Money,
}

/// Result of a close attempt on an existing listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloseOutcome {
    Closed { winner: Option<Winner> },
    NotOwner,
}

/// Current price: the highest bid, or the starting bid when unbid
pub fn current_price(starting_bid: Money, highest_bid: Option<Money>) -> Money {
    highest_bid.unwrap_or(starting_bid)
}

/// Decide whether `amount` may be bid on a listing in the given state
pub fn check_bid(active: bool, current_price: Money, amount: Money) -> Result<(), BidRejection> {
    if !active {
        return Err(BidRejection::Closed);
    }

    if amount <= current_price {
        return Err(BidRejection::TooLow { current_price });
    }

    Ok(())
}
