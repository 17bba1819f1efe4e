// region:    --- Imports
use super::extract::{ApiJson, ApiPath, ApiQuery};
use super::Actor;
use crate::app_state::AppState;
use crate::booking::commands::{self, CreateBookingCommand, ReviewBookingCommand};
use crate::booking::model::{Booking, BookingStatus, SlotsResponse};
use crate::booking::rules::ensure_can_view;
use crate::directory::Role;
use crate::error::AppError;
use crate::query::handlers::{self as query, Paging};
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use uuid::Uuid;
// endregion: --- Imports

// region:    --- Params
#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub status: Option<BookingStatus>,
    pub skip: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct SlotsParams {
    pub date: NaiveDate,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignParams {
    pub volunteer_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct StatusParams {
    pub status: BookingStatus,
}

#[derive(Debug, Default, Deserialize)]
pub struct RejectRequest {
    pub reason: Option<String>,
}
// endregion: --- Params

// region:    --- Query Handlers
/// 예약 목록 (운영 인력)
pub async fn list_bookings(
    State(state): State<AppState>,
    Actor(actor): Actor,
    ApiQuery(params): ApiQuery<ListParams>,
) -> Result<Json<Vec<Booking>>, AppError> {
    actor.require_role(&Role::BOOKING_STAFF)?;
    let paging = Paging {
        skip: params.skip,
        limit: params.limit,
    };
    let bookings = query::list_bookings(&state.db_manager, params.status, paging).await?;
    Ok(Json(bookings))
}

/// 본인 예약 목록
pub async fn my_bookings(
    State(state): State<AppState>,
    Actor(actor): Actor,
) -> Result<Json<Vec<Booking>>, AppError> {
    Ok(Json(query::get_my_bookings(&state.db_manager, actor.id).await?))
}

/// 날짜별 슬롯 가용 여부
pub async fn available_slots(
    State(state): State<AppState>,
    Actor(_actor): Actor,
    ApiQuery(params): ApiQuery<SlotsParams>,
) -> Result<Json<SlotsResponse>, AppError> {
    let today = Utc::now().date_naive();
    let slots =
        query::get_available_slots(&state.db_manager, params.date, today, &state.booking_policy)
            .await?;
    Ok(Json(slots))
}

/// 예약 단건 (신청자/운영자/배정 봉사자)
pub async fn get_booking(
    State(state): State<AppState>,
    Actor(actor): Actor,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<Booking>, AppError> {
    let booking = query::get_booking(&state.db_manager, id).await?;
    ensure_can_view(&booking, &actor)?;
    Ok(Json(booking))
}
// endregion: --- Query Handlers

// region:    --- Command Handlers
/// 예약 생성
pub async fn create_booking(
    State(state): State<AppState>,
    Actor(actor): Actor,
    ApiJson(cmd): ApiJson<CreateBookingCommand>,
) -> Result<(StatusCode, Json<Booking>), AppError> {
    let booking = commands::handle_create_booking(&state, &actor, cmd).await?;
    Ok((StatusCode::CREATED, Json(booking)))
}

pub async fn approve_booking(
    State(state): State<AppState>,
    Actor(actor): Actor,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<Booking>, AppError> {
    Ok(Json(commands::handle_approve_booking(&state, id, &actor).await?))
}

/// 거절 (사유는 선택)
pub async fn reject_booking(
    State(state): State<AppState>,
    Actor(actor): Actor,
    ApiPath(id): ApiPath<Uuid>,
    body: Option<Json<RejectRequest>>,
) -> Result<Json<Booking>, AppError> {
    let reason = body.and_then(|Json(req)| req.reason);
    Ok(Json(
        commands::handle_reject_booking(&state, id, &actor, reason).await?,
    ))
}

pub async fn cancel_booking(
    State(state): State<AppState>,
    Actor(actor): Actor,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<Booking>, AppError> {
    Ok(Json(commands::handle_cancel_booking(&state, id, &actor).await?))
}

pub async fn assign_volunteer(
    State(state): State<AppState>,
    Actor(actor): Actor,
    ApiPath(id): ApiPath<Uuid>,
    ApiQuery(params): ApiQuery<AssignParams>,
) -> Result<Json<Booking>, AppError> {
    Ok(Json(
        commands::handle_assign_volunteer(&state, id, params.volunteer_id, &actor).await?,
    ))
}

/// 진행 상태 변경 (in_progress / completed)
pub async fn progress_booking(
    State(state): State<AppState>,
    Actor(actor): Actor,
    ApiPath(id): ApiPath<Uuid>,
    ApiQuery(params): ApiQuery<StatusParams>,
) -> Result<Json<Booking>, AppError> {
    Ok(Json(
        commands::handle_progress_booking(&state, id, params.status, &actor).await?,
    ))
}

pub async fn review_booking(
    State(state): State<AppState>,
    Actor(actor): Actor,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(cmd): ApiJson<ReviewBookingCommand>,
) -> Result<Json<Booking>, AppError> {
    Ok(Json(
        commands::handle_review_booking(&state, id, &actor, cmd).await?,
    ))
}
// endregion: --- Command Handlers
