/// 예약 검증 규칙
/// 잠금으로 얻은 스냅샷만 보고 판단하는 순수 함수들
// region:    --- Imports
use super::model::{Booking, BookingStatus, OccupiedSlots, SlotAvailability, TimeSlot};
use crate::config::BookingPolicy;
use crate::directory::{Role, User};
use crate::error::AppError;
use chrono::{Days, NaiveDate};
use std::collections::BTreeSet;
use uuid::Uuid;
// endregion: --- Imports

// region:    --- Rules
/// 예약 가능 날짜 검증: 내일부터 `max_advance_days`일 후까지
pub fn validate_booking_date(
    date: NaiveDate,
    today: NaiveDate,
    policy: &BookingPolicy,
) -> Result<(), AppError> {
    if date <= today {
        return Err(AppError::Validation(
            "booking date must be in the future".to_string(),
        ));
    }
    // 범위를 넘는 기간은 상한 없음
    let within = match u64::try_from(policy.max_advance_days) {
        Ok(days) => today
            .checked_add_days(Days::new(days))
            .map_or(true, |last| date <= last),
        Err(_) => false,
    };
    if !within {
        return Err(AppError::Validation(format!(
            "cannot book more than {} days ahead",
            policy.max_advance_days
        )));
    }
    Ok(())
}

/// 요청 슬롯 파싱 (중복 제거, 순서 유지)
pub fn parse_slots(labels: &[String]) -> Result<Vec<TimeSlot>, AppError> {
    let mut slots: Vec<TimeSlot> = Vec::with_capacity(labels.len());
    let mut invalid = Vec::new();
    for label in labels {
        match label.parse::<TimeSlot>() {
            Ok(slot) if !slots.contains(&slot) => slots.push(slot),
            Ok(_) => {}
            Err(_) => invalid.push(label.as_str()),
        }
    }

    if !invalid.is_empty() {
        let allowed: Vec<&str> = TimeSlot::ALL.iter().map(|s| s.label()).collect();
        return Err(AppError::Validation(format!(
            "invalid time slot(s) {}; allowed: {}",
            invalid.join(", "),
            allowed.join(", ")
        )));
    }
    if slots.is_empty() {
        return Err(AppError::Validation(
            "at least one time slot must be selected".to_string(),
        ));
    }
    Ok(slots)
}

/// 같은 날짜의 점유 현황에 대해 요청 슬롯 판정
/// 1. 본인 점유 + 요청이 한도 초과 -> 한도 초과
/// 2. 본인이 이미 가진 슬롯 -> 본인 중복
/// 3. 다른 사용자가 가진 슬롯 -> 충돌 슬롯 목록
pub fn check_slot_request(
    date: NaiveDate,
    requested: &[TimeSlot],
    requester_id: Uuid,
    same_day: &[OccupiedSlots],
    policy: &BookingPolicy,
) -> Result<(), AppError> {
    let mut own: BTreeSet<TimeSlot> = BTreeSet::new();
    let mut others: BTreeSet<TimeSlot> = BTreeSet::new();
    for row in same_day {
        let target = if row.requester_id == requester_id {
            &mut own
        } else {
            &mut others
        };
        target.extend(row.time_slots.iter().copied());
    }

    let union = own.iter().chain(requested.iter()).collect::<BTreeSet<_>>();
    if union.len() > policy.max_slots_per_day {
        return Err(AppError::SlotQuotaExceeded {
            date,
            limit: policy.max_slots_per_day,
        });
    }

    let already_held: Vec<TimeSlot> = requested
        .iter()
        .filter(|slot| own.contains(*slot))
        .copied()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    if !already_held.is_empty() {
        return Err(AppError::SlotAlreadyHeld {
            slots: already_held,
        });
    }

    let taken: Vec<TimeSlot> = requested
        .iter()
        .filter(|slot| others.contains(*slot))
        .copied()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    if !taken.is_empty() {
        return Err(AppError::SlotsTaken { slots: taken });
    }

    Ok(())
}

/// 슬롯별 가용 여부 (점유자 무관)
pub fn slot_availability(same_day: &[OccupiedSlots]) -> Vec<SlotAvailability> {
    let occupied: BTreeSet<TimeSlot> = same_day
        .iter()
        .flat_map(|row| row.time_slots.iter().copied())
        .collect();
    TimeSlot::ALL
        .into_iter()
        .map(|time| SlotAvailability {
            time,
            available: !occupied.contains(&time),
        })
        .collect()
}

/// 상태 전이 검증
pub fn ensure_transition(current: BookingStatus, next: BookingStatus) -> Result<(), AppError> {
    if current.can_transition_to(next) {
        Ok(())
    } else {
        Err(AppError::transition(current, next))
    }
}

/// 예약 열람 권한: 신청자, 운영자, 배정된 봉사자
pub fn ensure_can_view(booking: &Booking, viewer: &User) -> Result<(), AppError> {
    if booking.requester_id == viewer.id
        || viewer.has_role(&Role::OPERATORS)
        || booking.assigned_to == Some(viewer.id)
    {
        Ok(())
    } else {
        Err(AppError::Forbidden("not allowed to view this booking".into()))
    }
}
// endregion: --- Rules

// region:    --- Tests
#[cfg(test)]
mod tests {
    use super::*;
    use TimeSlot::*;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn held(requester_id: Uuid, slots: &[TimeSlot]) -> OccupiedSlots {
        OccupiedSlots {
            requester_id,
            time_slots: slots.to_vec(),
        }
    }

    fn labels(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn date_window_is_tomorrow_through_thirty_days() {
        let policy = BookingPolicy::default();
        let today = date("2026-03-01");
        assert!(validate_booking_date(today, today, &policy).is_err());
        assert!(validate_booking_date(date("2026-02-28"), today, &policy).is_err());
        assert!(validate_booking_date(date("2026-03-02"), today, &policy).is_ok());
        assert!(validate_booking_date(date("2026-03-31"), today, &policy).is_ok());
        let err = validate_booking_date(date("2026-04-01"), today, &policy).unwrap_err();
        assert!(matches!(err, AppError::Validation(msg) if msg.contains("30 days")));
    }

    #[test]
    fn extreme_advance_windows_do_not_panic() {
        let today = date("2026-03-01");
        let unbounded = BookingPolicy {
            max_advance_days: i64::MAX,
            ..BookingPolicy::default()
        };
        assert!(validate_booking_date(date("2099-12-31"), today, &unbounded).is_ok());

        let negative = BookingPolicy {
            max_advance_days: -1,
            ..BookingPolicy::default()
        };
        assert!(validate_booking_date(date("2026-03-02"), today, &negative).is_err());
    }

    #[test]
    fn parse_slots_dedupes_and_keeps_order() {
        let slots = parse_slots(&labels(&["13:00", "08:00", "13:00"])).unwrap();
        assert_eq!(slots, vec![H1300, H0800]);
    }

    #[test]
    fn parse_slots_rejects_unknown_and_empty() {
        let err = parse_slots(&labels(&["08:00", "09:30"])).unwrap_err();
        assert!(matches!(err, AppError::Validation(msg) if msg.contains("09:30")));
        assert!(parse_slots(&[]).is_err());
    }

    #[test]
    fn scenario_second_requester_conflicts_then_retries() {
        let policy = BookingPolicy::default();
        let day = date("2026-03-10");
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();

        assert!(check_slot_request(day, &[H0800, H1000], a, &[], &policy).is_ok());
        let same_day = vec![held(a, &[H0800, H1000])];

        let err = check_slot_request(day, &[H1000, H1300], b, &same_day, &policy).unwrap_err();
        match err {
            AppError::SlotsTaken { slots } => assert_eq!(slots, vec![H1000]),
            other => panic!("unexpected error: {other:?}"),
        }

        assert!(check_slot_request(day, &[H1300, H1500], b, &same_day, &policy).is_ok());
    }

    #[test]
    fn requester_cannot_rebook_own_slot() {
        let policy = BookingPolicy::default();
        let a = Uuid::new_v4();
        let same_day = vec![held(a, &[H0800])];
        let err = check_slot_request(date("2026-03-10"), &[H0800, H1700], a, &same_day, &policy)
            .unwrap_err();
        assert!(matches!(err, AppError::SlotAlreadyHeld { slots } if slots == vec![H0800]));
    }

    #[test]
    fn requester_may_add_more_slots_on_same_day() {
        let policy = BookingPolicy::default();
        let a = Uuid::new_v4();
        let same_day = vec![held(a, &[H0800, H1000])];
        assert!(
            check_slot_request(date("2026-03-10"), &[H1300], a, &same_day, &policy).is_ok()
        );
    }

    #[test]
    fn quota_is_checked_before_duplicates() {
        let policy = BookingPolicy {
            max_advance_days: 30,
            max_slots_per_day: 2,
        };
        let a = Uuid::new_v4();
        let same_day = vec![held(a, &[H0800, H1000])];
        let err = check_slot_request(date("2026-03-10"), &[H1000, H1300], a, &same_day, &policy)
            .unwrap_err();
        assert!(matches!(err, AppError::SlotQuotaExceeded { limit: 2, .. }));
    }

    #[test]
    fn taken_slots_are_reported_sorted() {
        let policy = BookingPolicy::default();
        let other = Uuid::new_v4();
        let same_day = vec![held(other, &[H2100]), held(other, &[H0800])];
        let err = check_slot_request(
            date("2026-03-10"),
            &[H2100, H1300, H0800],
            Uuid::new_v4(),
            &same_day,
            &policy,
        )
        .unwrap_err();
        assert!(matches!(err, AppError::SlotsTaken { slots } if slots == vec![H0800, H2100]));
    }

    #[test]
    fn availability_ignores_who_holds_the_slot() {
        let same_day = vec![held(Uuid::new_v4(), &[H1000]), held(Uuid::new_v4(), &[H1900])];
        let slots = slot_availability(&same_day);
        assert_eq!(slots.len(), TimeSlot::ALL.len());
        let taken: Vec<TimeSlot> = slots.iter().filter(|s| !s.available).map(|s| s.time).collect();
        assert_eq!(taken, vec![H1000, H1900]);
    }

    #[test]
    fn transition_table() {
        use BookingStatus::*;
        assert!(ensure_transition(Pending, Approved).is_ok());
        assert!(ensure_transition(Pending, Rejected).is_ok());
        assert!(ensure_transition(Approved, InProgress).is_ok());
        assert!(ensure_transition(InProgress, Completed).is_ok());
        assert!(ensure_transition(InProgress, Cancelled).is_ok());
        assert!(ensure_transition(Pending, Completed).is_err());
        assert!(ensure_transition(Approved, Rejected).is_err());

        for terminal in [Rejected, Completed, Cancelled] {
            assert!(terminal.is_terminal());
            for next in [Pending, Approved, InProgress, Completed, Rejected, Cancelled] {
                let err = ensure_transition(terminal, next).unwrap_err();
                assert_eq!(err.kind(), "state_transition");
            }
        }
        assert!(Completed.occupies_slot());
        assert!(!Cancelled.occupies_slot());
    }
}
// endregion: --- Tests
