// region:    --- Imports
use super::extract::{ApiJson, ApiPath, ApiQuery};
use super::Actor;
use crate::app_state::AppState;
use crate::auction::commands::{self, CreateItemCommand, PlaceBidCommand, UpdateItemCommand};
use crate::auction::model::{AuctionItem, AuctionItemDetail, AuctionStatus, Bid, ItemPage, PaymentVerdict};
use crate::error::AppError;
use crate::query::handlers::{self as query, Paging};
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;
// endregion: --- Imports

// region:    --- Params
#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub status: Option<AuctionStatus>,
    pub search: Option<String>,
    pub skip: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct BidRequest {
    pub amount: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApproveBidRequest {
    pub bid_id: Uuid,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentProofRequest {
    #[serde(alias = "proofRef")]
    pub proof_url: String,
}

#[derive(Debug, Deserialize)]
pub struct VerifyPaymentRequest {
    pub status: PaymentVerdict,
}
// endregion: --- Params

// region:    --- Query Handlers
/// 상품 목록
pub async fn list_items(
    State(state): State<AppState>,
    Actor(_actor): Actor,
    ApiQuery(params): ApiQuery<ListParams>,
) -> Result<Json<ItemPage>, AppError> {
    let paging = Paging {
        skip: params.skip,
        limit: params.limit,
    };
    let page = query::list_items(&state.db_manager, params.status, params.search, paging).await?;
    Ok(Json(page))
}

/// 본인이 입찰한 상품
pub async fn my_bids(
    State(state): State<AppState>,
    Actor(actor): Actor,
    ApiQuery(paging): ApiQuery<Paging>,
) -> Result<Json<ItemPage>, AppError> {
    Ok(Json(
        query::get_my_bid_items(&state.db_manager, actor.id, paging).await?,
    ))
}

/// 상품 상세
pub async fn get_item(
    State(state): State<AppState>,
    Actor(actor): Actor,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<AuctionItemDetail>, AppError> {
    Ok(Json(
        query::get_item_detail(&state.db_manager, id, actor.id).await?,
    ))
}
// endregion: --- Query Handlers

// region:    --- Command Handlers
pub async fn create_item(
    State(state): State<AppState>,
    Actor(actor): Actor,
    ApiJson(cmd): ApiJson<CreateItemCommand>,
) -> Result<(StatusCode, Json<AuctionItem>), AppError> {
    let item = commands::handle_create_item(&state, &actor, cmd).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

pub async fn update_item(
    State(state): State<AppState>,
    Actor(actor): Actor,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(cmd): ApiJson<UpdateItemCommand>,
) -> Result<Json<AuctionItem>, AppError> {
    Ok(Json(
        commands::handle_update_item(&state, id, &actor, cmd).await?,
    ))
}

pub async fn cancel_item(
    State(state): State<AppState>,
    Actor(actor): Actor,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<AuctionItem>, AppError> {
    Ok(Json(commands::handle_cancel_item(&state, id, &actor).await?))
}

/// 입찰
pub async fn place_bid(
    State(state): State<AppState>,
    Actor(actor): Actor,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<BidRequest>,
) -> Result<(StatusCode, Json<Bid>), AppError> {
    let cmd = PlaceBidCommand {
        item_id: id,
        bidder_id: actor.id,
        amount: req.amount,
    };
    let bid = commands::handle_place_bid(&state, cmd).await?;
    Ok((StatusCode::CREATED, Json(bid)))
}

pub async fn approve_bid(
    State(state): State<AppState>,
    Actor(actor): Actor,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<ApproveBidRequest>,
) -> Result<Json<AuctionItem>, AppError> {
    Ok(Json(
        commands::handle_approve_bid(&state, id, req.bid_id, &actor).await?,
    ))
}

pub async fn upload_payment_proof(
    State(state): State<AppState>,
    Actor(actor): Actor,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<PaymentProofRequest>,
) -> Result<Json<AuctionItem>, AppError> {
    Ok(Json(
        commands::handle_upload_payment_proof(&state, id, &actor, req.proof_url).await?,
    ))
}

pub async fn verify_payment(
    State(state): State<AppState>,
    Actor(actor): Actor,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<VerifyPaymentRequest>,
) -> Result<Json<AuctionItem>, AppError> {
    Ok(Json(
        commands::handle_verify_payment(&state, id, &actor, req.status).await?,
    ))
}
// endregion: --- Command Handlers
