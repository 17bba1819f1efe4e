/// 서비스 공통 에러
/// 모든 엔진 연산은 `AppError`를 반환하고, HTTP 계층에서 그대로 응답으로 변환된다.
// region:    --- Imports
use crate::auction::model::AuctionStatus;
use crate::booking::model::TimeSlot;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::NaiveDate;
use serde_json::json;
use tracing::error;
// endregion: --- Imports

// region:    --- SQLSTATE
const UNIQUE_VIOLATION: &str = "23505";
const LOCK_NOT_AVAILABLE: &str = "55P03";
const SERIALIZATION_FAILURE: &str = "40001";
const DEADLOCK_DETECTED: &str = "40P01";
// endregion: --- SQLSTATE

// region:    --- AppError
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("slots already booked by another user: {}", join_slots(.slots))]
    SlotsTaken { slots: Vec<TimeSlot> },

    #[error("you already booked slot(s) {} on this date", join_slots(.slots))]
    SlotAlreadyHeld { slots: Vec<TimeSlot> },

    #[error("you already booked all {limit} slots available to you on {date}")]
    SlotQuotaExceeded { date: NaiveDate, limit: usize },

    #[error("this slot was just booked by someone else")]
    SlotJustTaken,

    #[error("bid must be at least {min_bid}")]
    BidTooLow { min_bid: i64 },

    #[error("cannot bid on an item you donated")]
    SelfBid,

    #[error("auction item is not open for bidding (status: {status})")]
    ItemNotOpen { status: AuctionStatus },

    #[error("cannot transition from '{from}' to '{to}'")]
    InvalidTransition { from: String, to: String },

    #[error("missing or unknown user identity")]
    Unauthenticated,

    #[error("{0}")]
    Forbidden(String),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("resource is busy, retry the request")]
    Busy,

    #[error("{0}")]
    Conflict(String),

    #[error("database error: {0}")]
    Database(#[source] sqlx::Error),
}

impl AppError {
    /// 상태 전이 에러 생성
    pub fn transition(from: impl ToString, to: impl ToString) -> Self {
        Self::InvalidTransition {
            from: from.to_string(),
            to: to.to_string(),
        }
    }

    /// 분류 (클라이언트용 기계 판독 값)
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) | Self::SelfBid => "validation_error",
            Self::SlotsTaken { .. }
            | Self::SlotAlreadyHeld { .. }
            | Self::SlotQuotaExceeded { .. }
            | Self::SlotJustTaken
            | Self::BidTooLow { .. }
            | Self::ItemNotOpen { .. }
            | Self::Busy
            | Self::Conflict(_) => "conflict",
            Self::InvalidTransition { .. } => "state_transition",
            Self::Unauthenticated | Self::Forbidden(_) => "authorization",
            Self::NotFound(_) => "not_found",
            Self::Database(_) => "internal",
        }
    }

    /// 세부 코드
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_FAILED",
            Self::SelfBid => "SELF_BID",
            Self::SlotsTaken { .. } => "SLOTS_TAKEN",
            Self::SlotAlreadyHeld { .. } => "SLOT_ALREADY_HELD",
            Self::SlotQuotaExceeded { .. } => "SLOT_QUOTA_EXCEEDED",
            Self::SlotJustTaken => "SLOT_JUST_TAKEN",
            Self::BidTooLow { .. } => "BID_TOO_LOW",
            Self::ItemNotOpen { .. } => "ITEM_NOT_OPEN",
            Self::InvalidTransition { .. } => "INVALID_TRANSITION",
            Self::Unauthenticated => "UNAUTHENTICATED",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Busy => "BUSY",
            Self::Conflict(_) => "CONFLICT",
            Self::Database(_) => "INTERNAL",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::SelfBid | Self::BidTooLow { .. } => StatusCode::BAD_REQUEST,
            Self::InvalidTransition { .. } => StatusCode::BAD_REQUEST,
            Self::SlotsTaken { .. }
            | Self::SlotAlreadyHeld { .. }
            | Self::SlotQuotaExceeded { .. }
            | Self::SlotJustTaken
            | Self::ItemNotOpen { .. }
            | Self::Busy
            | Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Unauthenticated => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// 재시도에 필요한 부가 정보
    pub fn details(&self) -> Option<serde_json::Value> {
        match self {
            Self::SlotsTaken { slots } | Self::SlotAlreadyHeld { slots } => {
                Some(json!({ "slots": slots }))
            }
            Self::SlotQuotaExceeded { date, limit } => Some(json!({ "date": date, "limit": limit })),
            Self::BidTooLow { min_bid } => Some(json!({ "minBid": min_bid })),
            Self::ItemNotOpen { status } => Some(json!({ "status": status })),
            Self::InvalidTransition { from, to } => Some(json!({ "from": from, "to": to })),
            Self::Busy | Self::SlotJustTaken => Some(json!({ "retryable": true })),
            _ => None,
        }
    }

    /// 유니크 제약 위반 여부 (제약 이름 지정 시 해당 제약만)
    pub fn is_unique_violation(err: &sqlx::Error, constraint: Option<&str>) -> bool {
        match err {
            sqlx::Error::Database(db_err) => {
                db_err.code().as_deref() == Some(UNIQUE_VIOLATION)
                    && constraint.map_or(true, |name| db_err.constraint() == Some(name))
            }
            _ => false,
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            match db_err.code().as_deref() {
                Some(LOCK_NOT_AVAILABLE) | Some(SERIALIZATION_FAILURE) | Some(DEADLOCK_DETECTED) => {
                    return Self::Busy
                }
                Some(UNIQUE_VIOLATION) => {
                    return Self::Conflict("resource already exists".to_string())
                }
                _ => {}
            }
        }
        Self::Database(err)
    }
}

// 요청 형식 오류는 모두 검증 실패로 응답
impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Validation(format!("invalid request body: {}", rejection.body_text()))
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        Self::Validation(format!("invalid query parameters: {}", rejection.body_text()))
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        Self::Validation(format!("invalid path parameter: {}", rejection.body_text()))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match &self {
            Self::Database(e) => {
                error!("{:<12} --> 처리되지 않은 데이터베이스 오류: {:?}", "Error", e);
                "internal server error".to_string()
            }
            other => other.to_string(),
        };

        let mut body = json!({
            "kind": self.kind(),
            "code": self.code(),
            "message": message,
        });
        if let Some(details) = self.details() {
            body["details"] = details;
        }

        (status, Json(json!({ "error": body }))).into_response()
    }
}

fn join_slots(slots: &[TimeSlot]) -> String {
    slots
        .iter()
        .map(|s| s.label())
        .collect::<Vec<_>>()
        .join(", ")
}
// endregion: --- AppError

// endregion: --- Tests
