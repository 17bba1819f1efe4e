/// 예약 관련 커맨드 처리
/// 1. 예약 생성 (중복 예약 방지)
/// 2. 상태 전이 (승인/거절/취소/진행)
/// 3. 봉사자 배정
/// 4. 리뷰
// region:    --- Imports
use super::model::{Booking, BookingStatus, OccupiedSlots, TimeSlot};
use super::rules::{check_slot_request, ensure_transition, parse_slots, validate_booking_date};
use crate::app_state::AppState;
use crate::directory::{Role, User};
use crate::error::AppError;
use crate::notification::{send_best_effort, send_many_best_effort, Category, Notification, ReferenceType};
use crate::query::queries;
use chrono::{Datelike, NaiveDate, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;
// endregion: --- Imports

// region:    --- Constants
/// 날짜 advisory lock 네임스페이스
const BOOKING_LOCK_SPACE: i32 = 0x424B_4731;
/// 슬롯 최후 방어선 유니크 인덱스
const SLOT_GUARD: &str = "uq_booking_date_slot";
const CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const PURPOSE_MAX_LEN: usize = 120;
// endregion: --- Constants

// region:    --- Commands
/// 예약 생성 명령
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingCommand {
    pub date: NaiveDate,
    #[serde(alias = "timeSlots")]
    pub slots: Vec<String>,
    pub pickup_address: String,
    pub pickup_lat: Option<f64>,
    pub pickup_lng: Option<f64>,
    pub dropoff_address: String,
    pub dropoff_lat: Option<f64>,
    pub dropoff_lng: Option<f64>,
    pub purpose: Option<String>,
    pub notes: Option<String>,
    /// 사용자 정보에 전화번호가 없을 때만 사용
    pub requester_phone: Option<String>,
}

/// 리뷰 명령
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ReviewBookingCommand {
    pub rating: i16,
    pub review_text: Option<String>,
}

/// 예약 코드 생성 (BKG-XXXXXXXX)
pub fn generate_booking_code() -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..8)
        .map(|_| CODE_ALPHABET[rng.gen_range(0..CODE_ALPHABET.len())] as char)
        .collect();
    format!("BKG-{}", suffix)
}

/// 1. 예약 생성
/// 같은 날짜의 점유 예약을 모두 잠근 뒤 판정하므로, 동시 요청은 직렬화된다.
pub async fn handle_create_booking(
    state: &AppState,
    requester: &User,
    cmd: CreateBookingCommand,
) -> Result<Booking, AppError> {
    info!(
        "{:<12} --> 예약 요청: user={} date={} slots={:?}",
        "Booking", requester.id, cmd.date, cmd.slots
    );

    let today = Utc::now().date_naive();
    validate_booking_date(cmd.date, today, &state.booking_policy)?;
    let slots = parse_slots(&cmd.slots)?;
    let primary = slots
        .first()
        .copied()
        .ok_or_else(|| AppError::Validation("at least one time slot must be selected".into()))?;

    let phone = non_blank(requester.phone.as_deref())
        .or_else(|| non_blank(cmd.requester_phone.as_deref()))
        .ok_or_else(|| AppError::Validation("requester phone number is required".into()))?;
    let pickup_address = non_blank(Some(&cmd.pickup_address))
        .ok_or_else(|| AppError::Validation("pickup address is required".into()))?;
    let dropoff_address = non_blank(Some(&cmd.dropoff_address))
        .ok_or_else(|| AppError::Validation("dropoff address is required".into()))?;
    let purpose = non_blank(cmd.purpose.as_deref());
    if purpose.as_ref().is_some_and(|p| p.chars().count() > PURPOSE_MAX_LEN) {
        return Err(AppError::Validation(format!(
            "purpose must be at most {} characters",
            PURPOSE_MAX_LEN
        )));
    }

    // 트랜잭션 시작 (잠금 대기 한도 적용)
    let mut tx = state.db_manager.begin_locking().await?;

    // 해당 날짜 직렬화: 아직 행이 없는 날짜도 잠기도록 advisory lock 먼저
    sqlx::query(queries::LOCK_BOOKING_DATE)
        .bind(BOOKING_LOCK_SPACE)
        .bind(cmd.date.num_days_from_ce())
        .execute(&mut *tx)
        .await?;

    let same_day = sqlx::query_as::<_, OccupiedSlots>(queries::LOCK_OCCUPIED_SLOTS)
        .bind(cmd.date)
        .fetch_all(&mut *tx)
        .await?;

    if let Err(e) = check_slot_request(
        cmd.date,
        &slots,
        requester.id,
        &same_day,
        &state.booking_policy,
    ) {
        info!("{:<12} --> 예약 거절: user={} {}", "Booking", requester.id, e);
        return Err(e);
    }

    let booking = sqlx::query_as::<_, Booking>(queries::INSERT_BOOKING)
        .bind(Uuid::new_v4())
        .bind(generate_booking_code())
        .bind(cmd.date)
        .bind(primary)
        .bind(&slots)
        .bind(requester.id)
        .bind(&requester.full_name)
        .bind(&phone)
        .bind(&pickup_address)
        .bind(cmd.pickup_lat)
        .bind(cmd.pickup_lng)
        .bind(&dropoff_address)
        .bind(cmd.dropoff_lat)
        .bind(cmd.dropoff_lng)
        .bind(&purpose)
        .bind(non_blank(cmd.notes.as_deref()))
        .bind(BookingStatus::Pending)
        .bind(Utc::now())
        .fetch_one(&mut *tx)
        .await
        .map_err(slot_race)?;

    tx.commit().await.map_err(slot_race)?;
    info!(
        "{:<12} --> 예약 생성 완료: code={} date={} slots={}",
        "Booking",
        booking.booking_code,
        booking.booking_date,
        join_slots(&booking.time_slots)
    );

    notify_new_booking(state, requester, &booking).await;
    Ok(booking)
}

/// 2-1. 승인
pub async fn handle_approve_booking(
    state: &AppState,
    booking_id: Uuid,
    actor: &User,
) -> Result<Booking, AppError> {
    actor.require_role(&Role::BOOKING_STAFF)?;
    transition(state, booking_id, BookingStatus::Approved, actor, None, |_| Ok(())).await
}

/// 2-2. 거절
pub async fn handle_reject_booking(
    state: &AppState,
    booking_id: Uuid,
    actor: &User,
    reason: Option<String>,
) -> Result<Booking, AppError> {
    actor.require_role(&Role::BOOKING_STAFF)?;
    let reason = non_blank(reason.as_deref());
    transition(state, booking_id, BookingStatus::Rejected, actor, reason, |_| Ok(())).await
}

/// 2-3. 취소
/// 신청자는 대기 상태에서만, 운영자는 전이 테이블이 허용하는 모든 상태에서 취소 가능
pub async fn handle_cancel_booking(
    state: &AppState,
    booking_id: Uuid,
    actor: &User,
) -> Result<Booking, AppError> {
    let is_operator = actor.has_role(&Role::OPERATORS);
    let actor_id = actor.id;
    transition(state, booking_id, BookingStatus::Cancelled, actor, None, move |booking| {
        if is_operator {
            return Ok(());
        }
        if booking.requester_id != actor_id {
            return Err(AppError::Forbidden("can only cancel own bookings".into()));
        }
        if booking.status != BookingStatus::Pending {
            return Err(AppError::transition(booking.status, BookingStatus::Cancelled));
        }
        Ok(())
    })
    .await
}

/// 2-4. 진행 (in_progress / completed)
/// 봉사자(relawan)는 본인에게 배정된 예약만 진행할 수 있다.
pub async fn handle_progress_booking(
    state: &AppState,
    booking_id: Uuid,
    next: BookingStatus,
    actor: &User,
) -> Result<Booking, AppError> {
    actor.require_role(&Role::BOOKING_STAFF)?;
    if !matches!(next, BookingStatus::InProgress | BookingStatus::Completed) {
        return Err(AppError::Validation(
            "status must be 'in_progress' or 'completed'".into(),
        ));
    }
    let volunteer_only = actor.role == Role::Relawan;
    let actor_id = actor.id;
    transition(state, booking_id, next, actor, None, move |booking| {
        if volunteer_only && booking.assigned_to != Some(actor_id) {
            return Err(AppError::Forbidden("not assigned to this booking".into()));
        }
        Ok(())
    })
    .await
}

/// 3. 봉사자 배정
pub async fn handle_assign_volunteer(
    state: &AppState,
    booking_id: Uuid,
    volunteer_id: Uuid,
    actor: &User,
) -> Result<Booking, AppError> {
    actor.require_role(&Role::OPERATORS)?;
    let volunteer = state
        .directory
        .resolve_user(volunteer_id)
        .await?
        .filter(|u| u.is_active && u.has_role(&Role::BOOKING_STAFF))
        .ok_or_else(|| AppError::Validation("volunteer must be an active staff member".into()))?;

    let mut tx = state.db_manager.begin_locking().await?;
    let booking = lock_booking(&mut tx, booking_id).await?;
    if booking.status.is_terminal() {
        return Err(AppError::transition(booking.status, "assigned"));
    }
    let booking = sqlx::query_as::<_, Booking>(queries::ASSIGN_BOOKING)
        .bind(booking_id)
        .bind(volunteer.id)
        .fetch_one(&mut *tx)
        .await?;
    tx.commit().await?;
    info!(
        "{:<12} --> 봉사자 배정: code={} volunteer={}",
        "Booking", booking.booking_code, volunteer.id
    );

    send_best_effort(
        &state.notifier,
        Notification::new(
            volunteer.id,
            "Pickup assignment",
            format!(
                "You are assigned to booking {} on {} ({}).",
                booking.booking_code,
                booking.booking_date,
                join_slots(&booking.time_slots)
            ),
            Category::Info,
            ReferenceType::Booking,
            booking.id,
        ),
    );
    Ok(booking)
}

/// 4. 리뷰 (완료된 본인 예약만)
pub async fn handle_review_booking(
    state: &AppState,
    booking_id: Uuid,
    actor: &User,
    cmd: ReviewBookingCommand,
) -> Result<Booking, AppError> {
    if !(1..=5).contains(&cmd.rating) {
        return Err(AppError::Validation("rating must be between 1 and 5".into()));
    }

    let mut tx = state.db_manager.begin_locking().await?;
    let booking = lock_booking(&mut tx, booking_id).await?;
    if booking.requester_id != actor.id {
        return Err(AppError::Forbidden("can only review own bookings".into()));
    }
    if booking.status != BookingStatus::Completed {
        return Err(AppError::Validation("can only review completed bookings".into()));
    }
    let booking = sqlx::query_as::<_, Booking>(queries::REVIEW_BOOKING)
        .bind(booking_id)
        .bind(cmd.rating)
        .bind(non_blank(cmd.review_text.as_deref()))
        .fetch_one(&mut *tx)
        .await?;
    tx.commit().await?;
    Ok(booking)
}
// endregion: --- Commands

// region:    --- Helpers
/// 테이블 기반 상태 전이 (행 잠금 후 `guard` -> 전이 검증 -> 갱신)
async fn transition<G>(
    state: &AppState,
    booking_id: Uuid,
    next: BookingStatus,
    actor: &User,
    reason: Option<String>,
    guard: G,
) -> Result<Booking, AppError>
where
    G: FnOnce(&Booking) -> Result<(), AppError>,
{
    let mut tx = state.db_manager.begin_locking().await?;
    let booking = lock_booking(&mut tx, booking_id).await?;

    guard(&booking)?;
    ensure_transition(booking.status, next)?;

    let approved_by = (next == BookingStatus::Approved).then_some(actor.id);
    let assigned_to =
        matches!(next, BookingStatus::InProgress | BookingStatus::Completed).then_some(actor.id);

    let updated = sqlx::query_as::<_, Booking>(queries::UPDATE_BOOKING_STATUS)
        .bind(booking_id)
        .bind(next)
        .bind(approved_by)
        .bind(assigned_to)
        .bind(reason)
        .fetch_one(&mut *tx)
        .await?;
    tx.commit().await?;

    info!(
        "{:<12} --> 상태 변경: code={} {} -> {} by {}",
        "Booking", updated.booking_code, booking.status, next, actor.id
    );
    Ok(updated)
}

async fn lock_booking(
    tx: &mut sqlx::Transaction<'static, sqlx::Postgres>,
    booking_id: Uuid,
) -> Result<Booking, AppError> {
    sqlx::query_as::<_, Booking>(queries::GET_BOOKING_FOR_UPDATE)
        .bind(booking_id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or(AppError::NotFound("booking"))
}

/// 커밋 시점 유니크 위반 -> 슬롯 선점 충돌
fn slot_race(err: sqlx::Error) -> AppError {
    if AppError::is_unique_violation(&err, Some(SLOT_GUARD)) {
        warn!("{:<12} --> 커밋 시점 슬롯 충돌 (유니크 인덱스)", "Booking");
        AppError::SlotJustTaken
    } else {
        AppError::from(err)
    }
}

/// 신규 예약 알림: 요청자를 제외한 활성 운영 인력 전체
async fn notify_new_booking(state: &AppState, requester: &User, booking: &Booking) {
    let staff = match state
        .directory
        .active_user_ids(&Role::BOOKING_STAFF, Some(requester.id))
        .await
    {
        Ok(ids) => ids,
        Err(e) => {
            warn!("{:<12} --> 알림 대상 조회 실패 (무시): {}", "Booking", e);
            return;
        }
    };

    let notification = Notification::new(
        Uuid::nil(),
        "New pickup booking",
        format!(
            "{} booked {} at {}.",
            requester.full_name,
            booking.booking_date,
            join_slots(&booking.time_slots)
        ),
        Category::Info,
        ReferenceType::Booking,
        booking.id,
    );
    send_many_best_effort(&state.notifier, staff, notification);
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn join_slots(slots: &[TimeSlot]) -> String {
    slots
        .iter()
        .map(|s| s.label())
        .collect::<Vec<_>>()
        .join(", ")
}
// endregion: --- Helpers

// region:    --- Tests
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn booking_code_shape() {
        let code = generate_booking_code();
        assert_eq!(code.len(), 12);
        assert!(code.starts_with("BKG-"));
        assert!(code[4..]
            .bytes()
            .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit()));
    }

    #[test]
    fn blank_strings_are_dropped() {
        assert_eq!(non_blank(Some("  ")), None);
        assert_eq!(non_blank(None), None);
        assert_eq!(non_blank(Some(" Jl. Merdeka 1 ")).as_deref(), Some("Jl. Merdeka 1"));
    }

    #[test]
    fn create_command_accepts_camel_case_body() {
        let cmd: CreateBookingCommand = serde_json::from_value(serde_json::json!({
            "date": "2026-03-10",
            "slots": ["08:00", "10:00"],
            "pickupAddress": "Jl. A",
            "dropoffAddress": "Jl. B",
            "purpose": "moving"
        }))
        .unwrap();
        assert_eq!(cmd.slots.len(), 2);
        assert!(cmd.notes.is_none());

        let legacy: CreateBookingCommand = serde_json::from_value(serde_json::json!({
            "date": "2026-03-10",
            "timeSlots": ["13:00"],
            "pickupAddress": "Jl. A",
            "dropoffAddress": "Jl. B"
        }))
        .unwrap();
        assert_eq!(legacy.slots, vec!["13:00".to_string()]);
    }
}
// endregion: --- Tests
