/// 경매 검증 규칙
/// 모두 잠근 상품 행을 기준으로 호출된다.
// region:    --- Imports
use super::model::{AuctionItem, AuctionStatus, Bid, PaymentStatus};
use crate::error::AppError;
use uuid::Uuid;
// endregion: --- Imports

/// 금액 상한 (시작가, 입찰 단위, 입찰가 공통)
pub const MAX_AMOUNT: i64 = 1_000_000_000_000;

// region:    --- Item
/// 신규 상품 검증
pub fn validate_new_item(
    title: &str,
    starting_price: i64,
    min_increment: i64,
) -> Result<(), AppError> {
    if title.trim().is_empty() {
        return Err(AppError::Validation("title is required".into()));
    }
    if starting_price <= 0 {
        return Err(AppError::Validation(
            "starting price must be greater than 0".into(),
        ));
    }
    if min_increment <= 0 {
        return Err(AppError::Validation(
            "minimum increment must be greater than 0".into(),
        ));
    }
    ensure_within_ceiling("starting price", starting_price)?;
    ensure_within_ceiling("minimum increment", min_increment)
}

fn ensure_within_ceiling(field: &str, amount: i64) -> Result<(), AppError> {
    if amount > MAX_AMOUNT {
        return Err(AppError::Validation(format!(
            "{} must be at most {}",
            field, MAX_AMOUNT
        )));
    }
    Ok(())
}

/// 입찰 진행 중인 상품만 수정/승인 가능
pub fn ensure_open(item: &AuctionItem) -> Result<(), AppError> {
    if item.status.is_open_for_bids() {
        Ok(())
    } else {
        Err(AppError::ItemNotOpen {
            status: item.status,
        })
    }
}

/// 취소 가능 여부 (ready/bidding 에서만)
pub fn ensure_cancellable(item: &AuctionItem) -> Result<(), AppError> {
    if item.status.is_open_for_bids() {
        Ok(())
    } else {
        Err(AppError::transition(item.status, AuctionStatus::Cancelled))
    }
}
// endregion: --- Item

// region:    --- Bid
/// 입찰 검증 순서: 금액 -> 상태 -> 본인 상품 -> 최저가
pub fn check_bid(item: &AuctionItem, bidder_id: Uuid, amount: i64) -> Result<(), AppError> {
    if amount <= 0 {
        return Err(AppError::Validation("bid amount must be greater than 0".into()));
    }
    ensure_within_ceiling("bid amount", amount)?;
    ensure_open(item)?;
    if item.donor_id == bidder_id {
        return Err(AppError::SelfBid);
    }
    let min_bid = item.min_next_bid();
    if amount < min_bid {
        return Err(AppError::BidTooLow { min_bid });
    }
    Ok(())
}

/// 승인 검증: 열린 상품 + 해당 상품의 입찰
pub fn check_approval(item: &AuctionItem, bid: Option<&Bid>) -> Result<(), AppError> {
    if !item.status.is_open_for_bids() {
        return Err(AppError::transition(item.status, AuctionStatus::PaymentPending));
    }
    match bid {
        Some(bid) if bid.auction_item_id == item.id => Ok(()),
        _ => Err(AppError::NotFound("bid")),
    }
}
// endregion: --- Bid

// region:    --- Payment
/// 결제 증빙 업로드 검증
/// 최초 업로드, 반려 후 재업로드, 검증 전 교체를 허용한다.
pub fn check_proof_upload(
    item: &AuctionItem,
    user_id: Uuid,
    proof_ref: &str,
) -> Result<(), AppError> {
    if item.winner_id != Some(user_id) {
        return Err(AppError::Forbidden(
            "only the winning bidder can upload payment proof".into(),
        ));
    }
    if item.status != AuctionStatus::PaymentPending {
        return Err(AppError::transition(
            item.status,
            PaymentStatus::AwaitingVerification,
        ));
    }
    match item.payment_status {
        Some(PaymentStatus::AwaitingPayment)
        | Some(PaymentStatus::Rejected)
        | Some(PaymentStatus::AwaitingVerification) => {}
        other => {
            return Err(AppError::transition(
                describe_payment(other),
                PaymentStatus::AwaitingVerification,
            ))
        }
    }
    if proof_ref.trim().is_empty() {
        return Err(AppError::Validation("payment proof reference is required".into()));
    }
    Ok(())
}

/// 결제 검증 가능 여부: 결제 대기 + 검증 대기
pub fn check_verification(item: &AuctionItem, target: PaymentStatus) -> Result<(), AppError> {
    if item.status != AuctionStatus::PaymentPending {
        return Err(AppError::transition(item.status, target));
    }
    if item.payment_status != Some(PaymentStatus::AwaitingVerification) {
        return Err(AppError::transition(
            describe_payment(item.payment_status),
            target,
        ));
    }
    Ok(())
}

fn describe_payment(status: Option<PaymentStatus>) -> String {
    status.map_or_else(|| "none".to_string(), |s| s.to_string())
}
// endregion: --- Payment

// endregion: --- Tests
