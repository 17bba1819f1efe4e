/// 경매 관련 커맨드 처리
/// 1. 상품 등록/수정/취소
/// 2. 입찰
/// 3. 입찰 승인 (낙찰자 지정)
/// 4. 결제 증빙 업로드 / 결제 검증
// region:    --- Imports
use super::model::{AuctionItem, AuctionStatus, Bid, PaymentVerdict};
use super::rules::{
    check_approval, check_bid, check_proof_upload, check_verification, ensure_cancellable,
    ensure_open, validate_new_item,
};
use crate::app_state::AppState;
use crate::directory::{Role, User};
use crate::error::AppError;
use crate::notification::{send_best_effort, send_many_best_effort, Category, Notification, ReferenceType};
use crate::query::queries;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::{Postgres, Transaction};
use tracing::{info, warn};
use uuid::Uuid;
// endregion: --- Imports

// region:    --- Commands
/// 상품 등록 명령
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct CreateItemCommand {
    pub title: String,
    pub description: Option<String>,
    pub starting_price: i64,
    pub min_increment: Option<i64>,
    /// 생략 시 등록한 운영자
    pub donor_id: Option<Uuid>,
}

/// 상품 수정 명령
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateItemCommand {
    pub title: Option<String>,
    pub description: Option<String>,
}

/// 입찰 명령
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct PlaceBidCommand {
    pub item_id: Uuid,
    pub bidder_id: Uuid,
    pub amount: i64,
}

/// 1-1. 상품 등록
pub async fn handle_create_item(
    state: &AppState,
    operator: &User,
    cmd: CreateItemCommand,
) -> Result<AuctionItem, AppError> {
    operator.require_role(&Role::OPERATORS)?;
    let min_increment = cmd
        .min_increment
        .unwrap_or(state.auction_policy.default_min_increment);
    validate_new_item(&cmd.title, cmd.starting_price, min_increment)?;

    let donor_id = match cmd.donor_id {
        Some(id) if id != operator.id => state
            .directory
            .resolve_user(id)
            .await?
            .map(|u| u.id)
            .ok_or_else(|| AppError::Validation("donor does not exist".into()))?,
        _ => operator.id,
    };

    let title = cmd.title.trim().to_string();
    let description = cmd.description;
    let starting_price = cmd.starting_price;
    let item = state
        .db_manager
        .transaction(|tx| {
            Box::pin(async move {
                let item = sqlx::query_as::<_, AuctionItem>(queries::INSERT_ITEM)
                    .bind(Uuid::new_v4())
                    .bind(title)
                    .bind(description)
                    .bind(starting_price)
                    .bind(min_increment)
                    .bind(donor_id)
                    .bind(Utc::now())
                    .fetch_one(&mut **tx)
                    .await?;
                Ok::<_, AppError>(item)
            })
        })
        .await?;

    info!(
        "{:<12} --> 상품 등록: id={} price={} increment={}",
        "Auction", item.id, item.starting_price, item.min_increment
    );
    Ok(item)
}

/// 1-2. 상품 수정 (ready/bidding 에서만)
pub async fn handle_update_item(
    state: &AppState,
    item_id: Uuid,
    operator: &User,
    cmd: UpdateItemCommand,
) -> Result<AuctionItem, AppError> {
    operator.require_role(&Role::OPERATORS)?;
    let title = match cmd.title {
        Some(t) if t.trim().is_empty() => {
            return Err(AppError::Validation("title cannot be blank".into()))
        }
        Some(t) => Some(t.trim().to_string()),
        None => None,
    };

    let mut tx = state.db_manager.begin_locking().await?;
    let item = lock_item(&mut tx, item_id).await?;
    ensure_open(&item)?;
    let item = sqlx::query_as::<_, AuctionItem>(queries::UPDATE_ITEM_DETAILS)
        .bind(item_id)
        .bind(title)
        .bind(cmd.description)
        .fetch_one(&mut *tx)
        .await?;
    tx.commit().await?;
    Ok(item)
}

/// 1-3. 상품 취소 (관리자)
pub async fn handle_cancel_item(
    state: &AppState,
    item_id: Uuid,
    admin: &User,
) -> Result<AuctionItem, AppError> {
    admin.require_role(&[Role::Admin])?;

    let mut tx = state.db_manager.begin_locking().await?;
    let item = lock_item(&mut tx, item_id).await?;
    ensure_cancellable(&item)?;
    let item = sqlx::query_as::<_, AuctionItem>(queries::SET_ITEM_STATUS)
        .bind(item_id)
        .bind(AuctionStatus::Cancelled)
        .fetch_one(&mut *tx)
        .await?;
    tx.commit().await?;

    info!("{:<12} --> 상품 취소: id={} by {}", "Auction", item.id, admin.id);
    Ok(item)
}

/// 2. 입찰
/// 상품 행을 잠근 상태에서 최저가 검증과 가격 갱신을 함께 처리한다.
pub async fn handle_place_bid(state: &AppState, cmd: PlaceBidCommand) -> Result<Bid, AppError> {
    info!("{:<12} --> 입찰 요청 처리 시작: {:?}", "Auction", cmd);

    let mut tx = state.db_manager.begin_locking().await?;
    let item = lock_item(&mut tx, cmd.item_id).await?;

    if let Err(e) = check_bid(&item, cmd.bidder_id, cmd.amount) {
        info!("{:<12} --> 입찰 거절: item={} {}", "Auction", item.id, e);
        return Err(e);
    }

    let previous = sqlx::query_as::<_, Bid>(queries::GET_LEADING_BID)
        .bind(item.id)
        .fetch_optional(&mut *tx)
        .await?;

    let bid = sqlx::query_as::<_, Bid>(queries::INSERT_BID)
        .bind(Uuid::new_v4())
        .bind(item.id)
        .bind(cmd.bidder_id)
        .bind(cmd.amount)
        .bind(Utc::now())
        .fetch_one(&mut *tx)
        .await?;

    sqlx::query(queries::APPLY_BID)
        .bind(item.id)
        .bind(cmd.amount)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    info!(
        "{:<12} --> 입찰 성공: item={} amount={} (이전 {})",
        "Auction", item.id, bid.amount, item.current_price
    );

    // 직전 최고 입찰자에게 알림
    if let Some(previous) = previous.filter(|p| p.bidder_id != cmd.bidder_id) {
        send_best_effort(
            &state.notifier,
            Notification::new(
                previous.bidder_id,
                "You have been outbid",
                format!(
                    "Someone bid {} on \"{}\". Place a higher bid to stay in the lead.",
                    bid.amount, item.title
                ),
                Category::AuctionOutbid,
                ReferenceType::Auction,
                item.id,
            ),
        );
    }

    Ok(bid)
}

/// 3. 입찰 승인
/// 선택된 입찰만 승인하고 나머지는 같은 트랜잭션에서 모두 거절한다.
pub async fn handle_approve_bid(
    state: &AppState,
    item_id: Uuid,
    bid_id: Uuid,
    reviewer: &User,
) -> Result<AuctionItem, AppError> {
    reviewer.require_role(&Role::OPERATORS)?;

    let mut tx = state.db_manager.begin_locking().await?;
    let item = lock_item(&mut tx, item_id).await?;
    let bids = sqlx::query_as::<_, Bid>(queries::LOCK_ITEM_BIDS)
        .bind(item_id)
        .fetch_all(&mut *tx)
        .await?;

    let chosen = bids.iter().find(|b| b.id == bid_id).cloned();
    check_approval(&item, chosen.as_ref())?;
    let chosen = chosen.ok_or(AppError::NotFound("bid"))?;

    sqlx::query(queries::REVIEW_ITEM_BIDS)
        .bind(item_id)
        .bind(chosen.id)
        .bind(reviewer.id)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

    let item = sqlx::query_as::<_, AuctionItem>(queries::SET_WINNER)
        .bind(item_id)
        .bind(chosen.bidder_id)
        .bind(chosen.amount)
        .fetch_one(&mut *tx)
        .await?;
    tx.commit().await?;

    info!(
        "{:<12} --> 낙찰 승인: item={} winner={} amount={}",
        "Auction", item.id, chosen.bidder_id, chosen.amount
    );

    send_best_effort(
        &state.notifier,
        Notification::new(
            chosen.bidder_id,
            "Congratulations, you won the auction",
            format!(
                "Your bid of {} for \"{}\" was approved. Please complete the payment.",
                chosen.amount, item.title
            ),
            Category::AuctionWon,
            ReferenceType::Auction,
            item.id,
        ),
    );

    let losers = losing_bidders(&bids, chosen.bidder_id);
    send_many_best_effort(
        &state.notifier,
        losers,
        Notification::new(
            Uuid::nil(),
            "Auction closed",
            format!("Your bid for \"{}\" was not selected.", item.title),
            Category::AuctionLost,
            ReferenceType::Auction,
            item.id,
        ),
    );

    Ok(item)
}

/// 4-1. 결제 증빙 업로드 (낙찰자)
pub async fn handle_upload_payment_proof(
    state: &AppState,
    item_id: Uuid,
    user: &User,
    proof_ref: String,
) -> Result<AuctionItem, AppError> {
    let mut tx = state.db_manager.begin_locking().await?;
    let item = lock_item(&mut tx, item_id).await?;
    check_proof_upload(&item, user.id, &proof_ref)?;

    let item = sqlx::query_as::<_, AuctionItem>(queries::SET_PAYMENT_PROOF)
        .bind(item_id)
        .bind(proof_ref.trim())
        .fetch_one(&mut *tx)
        .await?;
    tx.commit().await?;
    info!("{:<12} --> 결제 증빙 등록: item={} user={}", "Auction", item.id, user.id);

    match state.directory.active_user_ids(&Role::OPERATORS, None).await {
        Ok(operators) => {
            send_many_best_effort(
                &state.notifier,
                operators,
                Notification::new(
                    Uuid::nil(),
                    "Payment proof uploaded",
                    format!(
                        "{} uploaded payment proof for \"{}\".",
                        user.full_name, item.title
                    ),
                    Category::Info,
                    ReferenceType::Auction,
                    item.id,
                ),
            );
        }
        Err(e) => warn!("{:<12} --> 알림 대상 조회 실패 (무시): {}", "Auction", e),
    }

    Ok(item)
}

/// 4-2. 결제 검증 (운영자)
pub async fn handle_verify_payment(
    state: &AppState,
    item_id: Uuid,
    verifier: &User,
    verdict: PaymentVerdict,
) -> Result<AuctionItem, AppError> {
    verifier.require_role(&Role::OPERATORS)?;
    let (next_status, next_payment) = verdict.outcome();

    let mut tx = state.db_manager.begin_locking().await?;
    let item = lock_item(&mut tx, item_id).await?;
    check_verification(&item, next_payment)?;

    let item = sqlx::query_as::<_, AuctionItem>(queries::SET_PAYMENT_VERDICT)
        .bind(item_id)
        .bind(next_status)
        .bind(next_payment)
        .bind(verifier.id)
        .bind(Utc::now())
        .fetch_one(&mut *tx)
        .await?;
    tx.commit().await?;
    info!(
        "{:<12} --> 결제 검증: item={} 결과={} by {}",
        "Auction", item.id, next_payment, verifier.id
    );

    if let Some(winner_id) = item.winner_id {
        let notification = match verdict {
            PaymentVerdict::Paid => Notification::new(
                winner_id,
                "Payment verified",
                format!("Your payment for \"{}\" has been confirmed.", item.title),
                Category::Success,
                ReferenceType::Auction,
                item.id,
            ),
            PaymentVerdict::Rejected => Notification::new(
                winner_id,
                "Payment rejected",
                format!(
                    "Your payment proof for \"{}\" was rejected. Please upload a new one.",
                    item.title
                ),
                Category::Warning,
                ReferenceType::Auction,
                item.id,
            ),
        };
        send_best_effort(&state.notifier, notification);
    }

    Ok(item)
}
// endregion: --- Commands

// region:    --- Helpers
async fn lock_item(
    tx: &mut Transaction<'static, Postgres>,
    item_id: Uuid,
) -> Result<AuctionItem, AppError> {
    sqlx::query_as::<_, AuctionItem>(queries::GET_ITEM_FOR_UPDATE)
        .bind(item_id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or(AppError::NotFound("auction item"))
}

/// 낙찰자를 제외한 입찰자 (중복 제거, 입력 순서 유지)
fn losing_bidders(bids: &[Bid], winner_id: Uuid) -> Vec<Uuid> {
    let mut losers: Vec<Uuid> = Vec::new();
    for bid in bids {
        if bid.bidder_id != winner_id && !losers.contains(&bid.bidder_id) {
            losers.push(bid.bidder_id);
        }
    }
    losers
}
// endregion: --- Helpers

// region:    --- Tests
#[cfg(test)]
mod tests {
    use super::*;
    use crate::auction::model::BidStatus;

    fn bid(bidder_id: Uuid, amount: i64) -> Bid {
        Bid {
            id: Uuid::new_v4(),
            auction_item_id: Uuid::nil(),
            bidder_id,
            amount,
            status: BidStatus::Pending,
            reviewed_by: None,
            reviewed_at: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn losers_are_distinct_and_exclude_winner() {
        let winner = Uuid::new_v4();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let bids = vec![
            bid(winner, 120_000),
            bid(a, 115_000),
            bid(winner, 110_000),
            bid(a, 105_000),
            bid(b, 100_000),
        ];
        assert_eq!(losing_bidders(&bids, winner), vec![a, b]);
    }

    #[test]
    fn place_bid_command_is_camel_case() {
        let cmd: PlaceBidCommand = serde_json::from_value(serde_json::json!({
            "itemId": Uuid::nil(),
            "bidderId": Uuid::nil(),
            "amount": 105000
        }))
        .unwrap();
        assert_eq!(cmd.amount, 105_000);
    }
}
// endregion: --- Tests
