/// 조회 전용 핸들러 (잠금 없음)
// region:    --- Imports
use super::queries;
use crate::auction::model::{AuctionItem, AuctionItemDetail, AuctionStatus, Bid, ItemPage};
use crate::booking::model::{Booking, BookingStatus, OccupiedSlots, SlotsResponse};
use crate::booking::rules::{slot_availability, validate_booking_date};
use crate::config::BookingPolicy;
use crate::database::DatabaseManager;
use crate::error::AppError;
use chrono::NaiveDate;
use serde::Deserialize;
use tracing::{debug, info};
use uuid::Uuid;
// endregion: --- Imports

// region:    --- Paging
const DEFAULT_LIMIT: i64 = 20;
const MAX_LIMIT: i64 = 100;
const TOP_BIDS: usize = 10;

/// `skip`/`limit` 쿼리 파라미터
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct Paging {
    pub skip: Option<i64>,
    pub limit: Option<i64>,
}

impl Paging {
    pub fn offset(&self) -> i64 {
        self.skip.unwrap_or(0).max(0)
    }

    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
    }
}
// endregion: --- Paging

// region:    --- Booking Queries
/// 예약 조회
pub async fn get_booking(
    db_manager: &DatabaseManager,
    booking_id: Uuid,
) -> Result<Booking, AppError> {
    debug!("{:<12} --> 예약 조회 id: {}", "Query", booking_id);
    sqlx::query_as::<_, Booking>(queries::GET_BOOKING)
        .bind(booking_id)
        .fetch_optional(db_manager.pool())
        .await?
        .ok_or(AppError::NotFound("booking"))
}

/// 예약 목록 조회 (상태 필터)
pub async fn list_bookings(
    db_manager: &DatabaseManager,
    status: Option<BookingStatus>,
    paging: Paging,
) -> Result<Vec<Booking>, AppError> {
    info!("{:<12} --> 예약 목록 조회 status: {:?}", "Query", status);
    let bookings = sqlx::query_as::<_, Booking>(queries::LIST_BOOKINGS)
        .bind(status)
        .bind(paging.offset())
        .bind(paging.limit())
        .fetch_all(db_manager.pool())
        .await?;
    Ok(bookings)
}

/// 본인 예약 목록
pub async fn get_my_bookings(
    db_manager: &DatabaseManager,
    requester_id: Uuid,
) -> Result<Vec<Booking>, AppError> {
    let bookings = sqlx::query_as::<_, Booking>(queries::LIST_MY_BOOKINGS)
        .bind(requester_id)
        .fetch_all(db_manager.pool())
        .await?;
    Ok(bookings)
}

/// 날짜별 슬롯 가용 여부
pub async fn get_available_slots(
    db_manager: &DatabaseManager,
    date: NaiveDate,
    today: NaiveDate,
    policy: &BookingPolicy,
) -> Result<SlotsResponse, AppError> {
    validate_booking_date(date, today, policy)?;
    let occupied = sqlx::query_as::<_, OccupiedSlots>(queries::GET_OCCUPIED_SLOTS)
        .bind(date)
        .fetch_all(db_manager.pool())
        .await?;
    Ok(SlotsResponse {
        date,
        slots: slot_availability(&occupied),
    })
}
// endregion: --- Booking Queries

// region:    --- Auction Queries
/// 상품 조회
pub async fn get_item(db_manager: &DatabaseManager, item_id: Uuid) -> Result<AuctionItem, AppError> {
    debug!("{:<12} --> 상품 조회 id: {}", "Query", item_id);
    db_manager
        .transaction(|tx| {
            Box::pin(async move {
                sqlx::query_as::<_, AuctionItem>(queries::GET_ITEM)
                    .bind(item_id)
                    .fetch_optional(&mut **tx)
                    .await?
                    .ok_or(AppError::NotFound("auction item"))
            })
        })
        .await
}

/// 상품 입찰 조회 (금액 내림차순)
pub async fn get_item_bids(
    db_manager: &DatabaseManager,
    item_id: Uuid,
) -> Result<Vec<Bid>, AppError> {
    let bids = sqlx::query_as::<_, Bid>(queries::GET_ITEM_BIDS)
        .bind(item_id)
        .fetch_all(db_manager.pool())
        .await?;
    Ok(bids)
}

/// 상품 상세 (조회자 기준)
pub async fn get_item_detail(
    db_manager: &DatabaseManager,
    item_id: Uuid,
    viewer_id: Uuid,
) -> Result<AuctionItemDetail, AppError> {
    info!("{:<12} --> 상품 상세 조회 id: {}", "Query", item_id);
    let (item, bids) = db_manager
        .transaction(|tx| {
            Box::pin(async move {
                sqlx::query(queries::SNAPSHOT_READ).execute(&mut **tx).await?;
                let item = sqlx::query_as::<_, AuctionItem>(queries::GET_ITEM)
                    .bind(item_id)
                    .fetch_optional(&mut **tx)
                    .await?
                    .ok_or(AppError::NotFound("auction item"))?;
                let bids = sqlx::query_as::<_, Bid>(queries::GET_ITEM_BIDS)
                    .bind(item_id)
                    .fetch_all(&mut **tx)
                    .await?;
                Ok::<_, AppError>((item, bids))
            })
        })
        .await?;
    Ok(build_item_detail(item, bids, viewer_id))
}

/// 상품 목록 (상태/검색어 필터)
pub async fn list_items(
    db_manager: &DatabaseManager,
    status: Option<AuctionStatus>,
    search: Option<String>,
    paging: Paging,
) -> Result<ItemPage, AppError> {
    info!(
        "{:<12} --> 상품 목록 조회 status: {:?} search: {:?}",
        "Query", status, search
    );
    let statuses = status.map(AuctionStatus::filter_group);
    let search = search
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());

    db_manager
        .transaction(|tx| {
            Box::pin(async move {
                let items = sqlx::query_as::<_, AuctionItem>(queries::LIST_ITEMS)
                    .bind(&statuses)
                    .bind(&search)
                    .bind(paging.offset())
                    .bind(paging.limit())
                    .fetch_all(&mut **tx)
                    .await?;
                let total = sqlx::query_scalar::<_, i64>(queries::COUNT_ITEMS)
                    .bind(&statuses)
                    .bind(&search)
                    .fetch_one(&mut **tx)
                    .await?;
                Ok::<_, AppError>(ItemPage { items, total })
            })
        })
        .await
}

/// 본인이 입찰한 상품 목록
pub async fn get_my_bid_items(
    db_manager: &DatabaseManager,
    bidder_id: Uuid,
    paging: Paging,
) -> Result<ItemPage, AppError> {
    db_manager
        .transaction(|tx| {
            Box::pin(async move {
                let items = sqlx::query_as::<_, AuctionItem>(queries::LIST_MY_BID_ITEMS)
                    .bind(bidder_id)
                    .bind(paging.offset())
                    .bind(paging.limit())
                    .fetch_all(&mut **tx)
                    .await?;
                let total = sqlx::query_scalar::<_, i64>(queries::COUNT_MY_BID_ITEMS)
                    .bind(bidder_id)
                    .fetch_one(&mut **tx)
                    .await?;
                Ok::<_, AppError>(ItemPage { items, total })
            })
        })
        .await
}

/// 상세 응답 조립 (`bids`는 금액 내림차순)
pub fn build_item_detail(item: AuctionItem, bids: Vec<Bid>, viewer_id: Uuid) -> AuctionItemDetail {
    let is_highest_bidder = bids
        .iter()
        .max_by_key(|b| b.amount)
        .is_some_and(|b| b.bidder_id == viewer_id);
    let my_max_bid = bids
        .iter()
        .filter(|b| b.bidder_id == viewer_id)
        .map(|b| b.amount)
        .max();
    let bid_count = bids.len();
    let mut top_bids = bids;
    top_bids.sort_by(|a, b| b.amount.cmp(&a.amount));
    top_bids.truncate(TOP_BIDS);

    AuctionItemDetail {
        min_next_bid: item.min_next_bid(),
        item,
        bid_count,
        top_bids,
        is_highest_bidder,
        my_max_bid,
    }
}
// endregion: --- Auction Queries

// endregion: --- Tests
