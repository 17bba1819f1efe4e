use crate::database::{text_column, UnknownVariant};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

// region:    --- TimeSlot
/// 하루 중 예약 가능한 시간대 (고정)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TimeSlot {
    #[serde(rename = "08:00")]
    H0800,
    #[serde(rename = "10:00")]
    H1000,
    #[serde(rename = "13:00")]
    H1300,
    #[serde(rename = "15:00")]
    H1500,
    #[serde(rename = "17:00")]
    H1700,
    #[serde(rename = "19:00")]
    H1900,
    #[serde(rename = "21:00")]
    H2100,
}

impl TimeSlot {
    pub const ALL: [TimeSlot; 7] = [
        TimeSlot::H0800,
        TimeSlot::H1000,
        TimeSlot::H1300,
        TimeSlot::H1500,
        TimeSlot::H1700,
        TimeSlot::H1900,
        TimeSlot::H2100,
    ];

    pub fn label(self) -> &'static str {
        match self {
            TimeSlot::H0800 => "08:00",
            TimeSlot::H1000 => "10:00",
            TimeSlot::H1300 => "13:00",
            TimeSlot::H1500 => "15:00",
            TimeSlot::H1700 => "17:00",
            TimeSlot::H1900 => "19:00",
            TimeSlot::H2100 => "21:00",
        }
    }

    pub fn as_str(&self) -> &'static str {
        self.label()
    }
}

impl FromStr for TimeSlot {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TimeSlot::ALL
            .into_iter()
            .find(|slot| slot.label() == s.trim())
            .ok_or_else(|| UnknownVariant::new("time slot", s))
    }
}

impl fmt::Display for TimeSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

text_column!(TimeSlot);
// endregion: --- TimeSlot

// region:    --- BookingStatus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Pending,
    Approved,
    InProgress,
    Completed,
    Rejected,
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Approved => "approved",
            BookingStatus::InProgress => "in_progress",
            BookingStatus::Completed => "completed",
            BookingStatus::Rejected => "rejected",
            BookingStatus::Cancelled => "cancelled",
        }
    }

    /// 현재 상태에서 허용되는 다음 상태
    pub fn allowed_transitions(self) -> &'static [BookingStatus] {
        match self {
            BookingStatus::Pending => &[
                BookingStatus::Approved,
                BookingStatus::Rejected,
                BookingStatus::Cancelled,
            ],
            BookingStatus::Approved => &[BookingStatus::InProgress, BookingStatus::Cancelled],
            BookingStatus::InProgress => &[BookingStatus::Completed, BookingStatus::Cancelled],
            BookingStatus::Completed | BookingStatus::Rejected | BookingStatus::Cancelled => &[],
        }
    }

    pub fn can_transition_to(self, next: BookingStatus) -> bool {
        self.allowed_transitions().contains(&next)
    }

    pub fn is_terminal(self) -> bool {
        self.allowed_transitions().is_empty()
    }

    /// 슬롯 점유 여부 (거절/취소만 슬롯을 반납한다)
    pub fn occupies_slot(self) -> bool {
        !matches!(self, BookingStatus::Rejected | BookingStatus::Cancelled)
    }
}

impl FromStr for BookingStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(BookingStatus::Pending),
            "approved" => Ok(BookingStatus::Approved),
            "in_progress" => Ok(BookingStatus::InProgress),
            "completed" => Ok(BookingStatus::Completed),
            "rejected" => Ok(BookingStatus::Rejected),
            "cancelled" => Ok(BookingStatus::Cancelled),
            other => Err(UnknownVariant::new("booking status", other)),
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

text_column!(BookingStatus);
// endregion: --- BookingStatus

// region:    --- Booking
/// 픽업 예약 모델
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: Uuid,
    pub booking_code: String,
    pub booking_date: NaiveDate,
    /// 대표 슬롯 (유니크 인덱스 대상)
    pub time_slot: TimeSlot,
    pub time_slots: Vec<TimeSlot>,
    pub requester_id: Uuid,
    pub requester_name: String,
    pub requester_phone: String,
    pub pickup_address: String,
    pub pickup_lat: Option<f64>,
    pub pickup_lng: Option<f64>,
    pub dropoff_address: String,
    pub dropoff_lat: Option<f64>,
    pub dropoff_lng: Option<f64>,
    pub purpose: Option<String>,
    pub notes: Option<String>,
    pub status: BookingStatus,
    pub assigned_to: Option<Uuid>,
    pub approved_by: Option<Uuid>,
    pub rejection_reason: Option<String>,
    pub rating: Option<i16>,
    pub review_text: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// 같은 날짜의 점유 예약 (잠금 조회 결과)
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OccupiedSlots {
    pub requester_id: Uuid,
    pub time_slots: Vec<TimeSlot>,
}

/// 슬롯 가용 여부
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlotAvailability {
    pub time: TimeSlot,
    pub available: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct SlotsResponse {
    pub date: NaiveDate,
    pub slots: Vec<SlotAvailability>,
}
// endregion: --- Booking
