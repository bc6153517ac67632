/*
 * Responsibility
 * - /auctions handlers
 * - path ids are public (sqids) ids, decoded by the PublicAuctionId extractor
 * - the seller is whoever the injected `CurrentUserId` names; writes also
 *   require an established identity (CurrentUser)
 * - on reads `CurrentUserId` only counts when an identity was published;
 *   anonymous requests reach here untouched, so theirs came from the client
 */
use axum::{
    Json,
    extract::{
        Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
};

use crate::{
    api::v1::{
        dto::auctions::{AuctionQuery, AuctionResponse, CreateAuctionRequest, UpdateAuctionRequest},
        extractors::{CurrentUser, PublicAuctionId},
    },
    error::AppError,
    repos::auction_repo::{AuctionChanges, AuctionRow, NewAuction},
    state::AppState,
};

const DEFAULT_PAGE_SIZE: usize = 50;
const MAX_PAGE_SIZE: usize = 200;

fn row_to_response(
    state: &AppState,
    row: AuctionRow,
    caller: Option<i64>,
) -> Result<AuctionResponse, AppError> {
    Ok(AuctionResponse {
        id: state.id_codec.encode(row.auction_id)?,
        is_seller: caller == Some(row.seller_id),
        seller_id: row.seller_id,
        title: row.title,
        starting_price_cents: row.starting_price_cents,
        is_active: row.is_active,
    })
}

async fn find(state: &AppState, auction_id: &PublicAuctionId) -> Result<AuctionRow, AppError> {
    state
        .auctions
        .get(auction_id.id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("auction {} not found", auction_id.public)))
}

fn trusted_caller(caller: Option<&CurrentUser>, query: &AuctionQuery) -> Option<i64> {
    caller.and(query.current_user_id)
}

fn ensure_seller(row: &AuctionRow, user_id: i64) -> Result<(), AppError> {
    if row.seller_id != user_id {
        return Err(AppError::forbidden("only the seller may change this auction"));
    }
    Ok(())
}

pub async fn list_auctions(
    State(state): State<AppState>,
    caller: Option<CurrentUser>,
    query: Result<Query<AuctionQuery>, QueryRejection>,
) -> Result<Json<Vec<AuctionResponse>>, AppError> {
    let Query(query) = query?;
    let limit = query.limit.unwrap_or(DEFAULT_PAGE_SIZE).min(MAX_PAGE_SIZE);
    let offset = query.offset.unwrap_or(0);

    let rows = state.auctions.get_list(limit, offset).await?;
    let caller = trusted_caller(caller.as_ref(), &query);

    let mut res = Vec::with_capacity(rows.len());
    for row in rows {
        res.push(row_to_response(&state, row, caller)?);
    }
    Ok(Json(res))
}

pub async fn create_auction(
    State(state): State<AppState>,
    CurrentUser(_): CurrentUser,
    payload: Result<Json<CreateAuctionRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<AuctionResponse>), AppError> {
    let Json(req) = payload?;
    req.validate().map_err(AppError::invalid_request)?;

    let seller_id = req.current_user_id;
    let row = state
        .auctions
        .add(NewAuction {
            seller_id,
            title: req.title.trim().to_string(),
            starting_price_cents: req.starting_price_cents,
        })
        .await?;

    tracing::info!(auction_id = row.auction_id, seller_id, "auction created");
    let res = row_to_response(&state, row, Some(seller_id))?;
    Ok((StatusCode::CREATED, Json(res)))
}

pub async fn get_auction(
    State(state): State<AppState>,
    caller: Option<CurrentUser>,
    auction_id: PublicAuctionId,
    query: Result<Query<AuctionQuery>, QueryRejection>,
) -> Result<Json<AuctionResponse>, AppError> {
    let Query(query) = query?;
    let row = find(&state, &auction_id).await?;
    let caller = trusted_caller(caller.as_ref(), &query);
    Ok(Json(row_to_response(&state, row, caller)?))
}

pub async fn update_auction(
    State(state): State<AppState>,
    CurrentUser(_): CurrentUser,
    auction_id: PublicAuctionId,
    payload: Result<Json<UpdateAuctionRequest>, JsonRejection>,
) -> Result<Json<AuctionResponse>, AppError> {
    let Json(req) = payload?;
    req.validate().map_err(AppError::invalid_request)?;

    let row = find(&state, &auction_id).await?;
    ensure_seller(&row, req.current_user_id)?;

    let changes = AuctionChanges {
        title: req.title.map(|t| t.trim().to_string()),
        starting_price_cents: req.starting_price_cents,
    };
    let row = state
        .auctions
        .update(auction_id.id, changes)
        .await?
        .ok_or_else(|| AppError::not_found(format!("auction {} not found", auction_id.public)))?;

    Ok(Json(row_to_response(&state, row, Some(req.current_user_id))?))
}

pub async fn activate_auction(
    State(state): State<AppState>,
    CurrentUser(identity): CurrentUser,
    auction_id: PublicAuctionId,
) -> Result<Json<AuctionResponse>, AppError> {
    let row = find(&state, &auction_id).await?;
    ensure_seller(&row, identity.user_id)?;

    let row = state.auctions.activate(auction_id.id).await?;
    tracing::info!(auction_id = row.auction_id, "auction activated");

    Ok(Json(row_to_response(&state, row, Some(identity.user_id))?))
}
