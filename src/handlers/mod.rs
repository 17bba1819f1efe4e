/// HTTP 라우팅과 요청자 식별
// region:    --- Imports
use crate::app_state::AppState;
use crate::directory::User;
use crate::error::AppError;
use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::routing::{get, patch, post};
use axum::Router;
use tracing::debug;
use uuid::Uuid;
// endregion: --- Imports

// region:    --- Modules
pub mod auction;
pub mod booking;
pub mod extract;
// endregion: --- Modules

/// 인증 게이트웨이가 채워 주는 요청자 헤더
pub const USER_ID_HEADER: &str = "x-user-id";

// region:    --- Actor
/// 요청자 (디렉터리에서 확인된 활성 사용자)
#[derive(Debug, Clone)]
pub struct Actor(pub User);

#[async_trait]
impl FromRequestParts<AppState> for Actor {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user_id = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| Uuid::parse_str(value.trim()).ok())
            .ok_or(AppError::Unauthenticated)?;

        let user = state
            .directory
            .resolve_user(user_id)
            .await?
            .ok_or(AppError::Unauthenticated)?;
        if !user.is_active {
            debug!("{:<12} --> 비활성 사용자 요청: {}", "Auth", user.id);
            return Err(AppError::Forbidden("account is inactive".into()));
        }
        Ok(Actor(user))
    }
}
// endregion: --- Actor

// region:    --- Routes
/// 전체 라우터 (상태 포함)
pub fn routes(state: AppState) -> Router {
    Router::new()
        .route(
            "/bookings",
            get(booking::list_bookings).post(booking::create_booking),
        )
        .route("/bookings/my", get(booking::my_bookings))
        .route("/bookings/slots", get(booking::available_slots))
        .route("/bookings/:id", get(booking::get_booking))
        .route("/bookings/:id/approve", patch(booking::approve_booking))
        .route("/bookings/:id/reject", patch(booking::reject_booking))
        .route("/bookings/:id/cancel", patch(booking::cancel_booking))
        .route("/bookings/:id/assign", patch(booking::assign_volunteer))
        .route("/bookings/:id/status", patch(booking::progress_booking))
        .route("/bookings/:id/review", post(booking::review_booking))
        .route(
            "/auctions",
            get(auction::list_items).post(auction::create_item),
        )
        .route("/auctions/my-bids", get(auction::my_bids))
        .route(
            "/auctions/:id",
            get(auction::get_item).patch(auction::update_item),
        )
        .route("/auctions/:id/cancel", patch(auction::cancel_item))
        .route("/auctions/:id/bid", post(auction::place_bid))
        .route("/auctions/:id/approve-bid", patch(auction::approve_bid))
        .route(
            "/auctions/:id/upload-payment-proof",
            post(auction::upload_payment_proof),
        )
        .route("/auctions/:id/verify-payment", patch(auction::verify_payment))
        .with_state(state)
}
// endregion: --- Routes
