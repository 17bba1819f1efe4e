use crate::database::{text_column, UnknownVariant};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

// region:    --- AuctionStatus
/// 경매 상품 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuctionStatus {
    Ready,
    Bidding,
    PaymentPending,
    Sold,
    Cancelled,
}

impl AuctionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuctionStatus::Ready => "ready",
            AuctionStatus::Bidding => "bidding",
            AuctionStatus::PaymentPending => "payment_pending",
            AuctionStatus::Sold => "sold",
            AuctionStatus::Cancelled => "cancelled",
        }
    }

    /// 입찰/승인/수정이 가능한 상태
    pub fn is_open_for_bids(self) -> bool {
        matches!(self, AuctionStatus::Ready | AuctionStatus::Bidding)
    }

    /// 목록 필터: `bidding`은 결제 대기 상품까지 포함
    pub fn filter_group(self) -> Vec<AuctionStatus> {
        match self {
            AuctionStatus::Bidding => vec![AuctionStatus::Bidding, AuctionStatus::PaymentPending],
            other => vec![other],
        }
    }
}

impl FromStr for AuctionStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ready" => Ok(AuctionStatus::Ready),
            "bidding" => Ok(AuctionStatus::Bidding),
            "payment_pending" => Ok(AuctionStatus::PaymentPending),
            "sold" => Ok(AuctionStatus::Sold),
            "cancelled" => Ok(AuctionStatus::Cancelled),
            other => Err(UnknownVariant::new("auction status", other)),
        }
    }
}

impl fmt::Display for AuctionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

text_column!(AuctionStatus);
// endregion: --- AuctionStatus

// region:    --- PaymentStatus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    AwaitingPayment,
    AwaitingVerification,
    Paid,
    Rejected,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::AwaitingPayment => "awaiting_payment",
            PaymentStatus::AwaitingVerification => "awaiting_verification",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Rejected => "rejected",
        }
    }
}

impl FromStr for PaymentStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "awaiting_payment" => Ok(PaymentStatus::AwaitingPayment),
            "awaiting_verification" => Ok(PaymentStatus::AwaitingVerification),
            "paid" => Ok(PaymentStatus::Paid),
            "rejected" => Ok(PaymentStatus::Rejected),
            other => Err(UnknownVariant::new("payment status", other)),
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

text_column!(PaymentStatus);
// endregion: --- PaymentStatus

// region:    --- BidStatus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BidStatus {
    Pending,
    Approved,
    Rejected,
}

impl BidStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BidStatus::Pending => "pending",
            BidStatus::Approved => "approved",
            BidStatus::Rejected => "rejected",
        }
    }
}

impl FromStr for BidStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(BidStatus::Pending),
            "approved" => Ok(BidStatus::Approved),
            "rejected" => Ok(BidStatus::Rejected),
            other => Err(UnknownVariant::new("bid status", other)),
        }
    }
}

impl fmt::Display for BidStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

text_column!(BidStatus);
// endregion: --- BidStatus

// region:    --- PaymentVerdict
/// 결제 검증 결과
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentVerdict {
    Paid,
    Rejected,
}

impl PaymentVerdict {
    /// 검증 후 (상품 상태, 결제 상태)
    pub fn outcome(self) -> (AuctionStatus, PaymentStatus) {
        match self {
            PaymentVerdict::Paid => (AuctionStatus::Sold, PaymentStatus::Paid),
            PaymentVerdict::Rejected => (AuctionStatus::PaymentPending, PaymentStatus::Rejected),
        }
    }
}
// endregion: --- PaymentVerdict

// region:    --- Models
// 상품 모델
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct AuctionItem {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub starting_price: i64,
    pub current_price: i64,
    pub min_increment: i64,
    pub donor_id: Uuid,
    pub winner_id: Option<Uuid>,
    pub status: AuctionStatus,
    pub payment_status: Option<PaymentStatus>,
    pub payment_proof_url: Option<String>,
    pub payment_verified_by: Option<Uuid>,
    pub payment_verified_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl AuctionItem {
    /// 다음 입찰 최저가 (상한에서 멈춤)
    pub fn min_next_bid(&self) -> i64 {
        self.current_price.saturating_add(self.min_increment)
    }
}

// 입찰 모델
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Bid {
    pub id: Uuid,
    pub auction_item_id: Uuid,
    pub bidder_id: Uuid,
    pub amount: i64,
    pub status: BidStatus,
    pub reviewed_by: Option<Uuid>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// 상품 상세 (조회자 기준 정보 포함)
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuctionItemDetail {
    #[serde(flatten)]
    pub item: AuctionItem,
    pub min_next_bid: i64,
    pub bid_count: usize,
    /// 금액 상위 10건
    pub top_bids: Vec<Bid>,
    pub is_highest_bidder: bool,
    pub my_max_bid: Option<i64>,
}

/// 상품 목록 페이지
#[derive(Debug, Clone, Serialize)]
pub struct ItemPage {
    pub items: Vec<AuctionItem>,
    pub total: i64,
}
// endregion: --- Models

// region:    --- Tests
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bidding_filter_includes_payment_pending() {
        assert_eq!(
            AuctionStatus::Bidding.filter_group(),
            vec![AuctionStatus::Bidding, AuctionStatus::PaymentPending]
        );
        assert_eq!(AuctionStatus::Sold.filter_group(), vec![AuctionStatus::Sold]);
    }

    #[test]
    fn statuses_parse_from_their_column_text() {
        for status in [
            AuctionStatus::Ready,
            AuctionStatus::Bidding,
            AuctionStatus::PaymentPending,
            AuctionStatus::Sold,
            AuctionStatus::Cancelled,
        ] {
            assert_eq!(status.as_str().parse::<AuctionStatus>().unwrap(), status);
        }
        assert_eq!(
            "awaiting_verification".parse::<PaymentStatus>().unwrap(),
            PaymentStatus::AwaitingVerification
        );
        assert!("closed".parse::<BidStatus>().is_err());
    }

    #[test]
    fn serde_names_match_column_text() {
        assert_eq!(
            serde_json::to_value(AuctionStatus::PaymentPending).unwrap(),
            "payment_pending"
        );
        assert_eq!(
            serde_json::to_value(PaymentStatus::AwaitingPayment).unwrap(),
            "awaiting_payment"
        );
    }
}
// endregion: --- Tests
