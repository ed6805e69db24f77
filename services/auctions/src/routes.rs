//! Auction service routes

use axum::{
    Json, Router,
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use common::{
    accounts,
    auth::{AuthUser, CurrentUser, MaybeUser},
    http::{ApiError, ApiResult, Flash, JsonBody, WithRejection},
};
use serde_json::json;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::{
    bidding::{BidOutcome, CloseOutcome},
    forms::{ListingAction, ListingForm, comment_text, parse_amount},
    models::{Category, Listing, ListingView, ListingsResponse},
    repositories::DynAuctionStore,
    state::AppState,
};

/// Create the router for the auction service
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/", get(index))
        .route("/listings", post(create_listing))
        .route("/listings/:id", get(view_listing).post(listing_action))
        .route("/listings/:id/watchlist", post(toggle_watchlist))
        .route("/listings/:id/close", post(close_listing))
        .route("/watchlist", get(watchlist))
        .route("/categories", get(categories))
        .route("/categories/:name", get(category_listings))
        .merge(accounts::router::<AppState>())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "auctions-service"
    }))
}

fn listing_url(id: i64) -> String {
    format!("/listings/{}", id)
}

async fn require_listing(store: &DynAuctionStore, id: i64) -> ApiResult<Listing> {
    store
        .find_listing(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Listing not found.".to_string()))
}

/// Assemble the listing page for the given viewer
async fn render_listing(
    store: &DynAuctionStore,
    listing: Listing,
    viewer: Option<&AuthUser>,
    messages: Vec<Flash>,
) -> ApiResult<ListingView> {
    let bids = store.bids(listing.id).await?;
    let comments = store.comments(listing.id).await?;

    let in_watchlist = match viewer {
        Some(user) => store.is_watching(user.id, listing.id).await?,
        None => false,
    };
    let can_close = listing.active && viewer.is_some_and(|user| user.id == listing.owner_id);

    let winner = if listing.active {
        None
    } else {
        store
            .highest_bid(listing.id)
            .await?
            .map(|bid| bid.bidder)
    };

    Ok(ListingView {
        listing,
        bids,
        comments,
        in_watchlist,
        can_close,
        winner,
        messages,
    })
}

/// Active listings
pub async fn index(State(state): State<AppState>) -> ApiResult<Json<ListingsResponse>> {
    let listings = state.store.active_listings(None).await?;

    Ok(Json(ListingsResponse {
        category: None,
        listings,
    }))
}

/// Create a listing owned by the current user
pub async fn create_listing(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    WithRejection(Json(form), _): JsonBody<ListingForm>,
) -> ApiResult<Redirect> {
    let new_listing = form.validate().map_err(ApiError::BadRequest)?;
    let listing = state.store.create_listing(user.id, &new_listing).await?;

    info!("User {} created listing {}", user.username, listing.id);
    Ok(Redirect::to(&listing_url(listing.id)))
}

/// Listing page
pub async fn view_listing(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    Path(id): Path<i64>,
) -> ApiResult<Json<ListingView>> {
    let listing = require_listing(&state.store, id).await?;
    let view = render_listing(&state.store, listing, user.as_ref(), Vec::new()).await?;

    Ok(Json(view))
}

/// Bid on or comment on a listing
///
/// Success redirects back to the listing. A rejected bid or blank comment
/// re-renders the listing page with an error message.
pub async fn listing_action(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
    WithRejection(Json(action), _): JsonBody<ListingAction>,
) -> ApiResult<Response> {
    let listing = require_listing(&state.store, id).await?;

    let failure = match action {
        ListingAction::Bid { amount } => match parse_amount(&amount) {
            Err(message) => message,
            Ok(amount) => match state.store.place_bid(id, user.id, amount).await? {
                None => return Err(ApiError::NotFound("Listing not found.".to_string())),
                Some(BidOutcome::Placed(bid)) => {
                    info!("User {} bid {} on listing {}", user.username, bid.amount, id);
                    return Ok(Redirect::to(&listing_url(id)).into_response());
                }
                Some(BidOutcome::Rejected(rejection)) => rejection.message(),
            },
        },
        ListingAction::Comment { text } => match comment_text(&text) {
            Err(message) => message,
            Ok(text) => {
                state.store.add_comment(id, user.id, &text).await?;
                return Ok(Redirect::to(&listing_url(id)).into_response());
            }
        },
    };

    // Re-read so the page reflects any bid that landed meanwhile
    let listing = state
        .store
        .find_listing(id)
        .await?
        .unwrap_or(listing);
    let view =
        render_listing(&state.store, listing, Some(&user), vec![Flash::error(failure)]).await?;

    Ok(Json(view).into_response())
}

/// Add the listing to the watchlist, or remove it if already there
pub async fn toggle_watchlist(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
) -> ApiResult<Redirect> {
    require_listing(&state.store, id).await?;

    let watching = state.store.toggle_watchlist(user.id, id).await?;
    info!(
        "User {} {} listing {}",
        user.username,
        if watching { "is now watching" } else { "stopped watching" },
        id
    );

    Ok(Redirect::to(&listing_url(id)))
}

/// Close an auction; only its owner may do so
pub async fn close_listing(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
) -> ApiResult<Redirect> {
    match state.store.close_listing(id, user.id).await? {
        None => Err(ApiError::NotFound("Listing not found.".to_string())),
        Some(CloseOutcome::NotOwner) => Err(ApiError::Forbidden(
            "You cannot close someone else's auction.".to_string(),
        )),
        Some(CloseOutcome::Closed { winner }) => {
            match winner {
                Some(winner) => info!(
                    "Listing {} won by {} ({}) at {}",
                    id, winner.username, winner.user_id, winner.amount
                ),
                None => info!("Listing {} closed without bids", id),
            }
            Ok(Redirect::to(&listing_url(id)))
        }
    }
}

/// Listings watched by the current user
pub async fn watchlist(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<Json<ListingsResponse>> {
    let listings = state.store.watchlist(user.id).await?;

    Ok(Json(ListingsResponse {
        category: None,
        listings,
    }))
}

pub async fn categories() -> impl IntoResponse {
    Json(json!({ "categories": Category::ALL }))
}

/// Active listings in one category
pub async fn category_listings(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> ApiResult<Json<ListingsResponse>> {
    let category = name.parse::<Category>().map_err(ApiError::NotFound)?;
    let listings = state.store.active_listings(Some(category)).await?;

    Ok(Json(ListingsResponse {
        category: Some(category),
        listings,
    }))
}
