/// 환경 변수 기반 서비스 설정
/// `.env` 파일이 있으면 먼저 읽는다.
// region:    --- Imports
use crate::auction::rules::MAX_AMOUNT;
use crate::booking::model::TimeSlot;
use std::net::SocketAddr;
use std::str::FromStr;
// endregion: --- Imports

// region:    --- Config
/// 예약 가능 기간 상한(일)
const MAX_ADVANCE_DAYS_LIMIT: i64 = 3650;

/// 설정 로드 실패
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("DATABASE_URL must be set")]
    MissingDatabaseUrl,
    #[error("invalid LISTEN_ADDR '{0}'")]
    InvalidListenAddr(String),
}

/// 예약 정책
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookingPolicy {
    /// 오늘로부터 예약 가능한 최대 일수
    pub max_advance_days: i64,
    /// 한 사용자가 하루에 보유할 수 있는 최대 슬롯 수
    pub max_slots_per_day: usize,
}

impl Default for BookingPolicy {
    fn default() -> Self {
        Self {
            max_advance_days: 30,
            max_slots_per_day: TimeSlot::ALL.len(),
        }
    }
}

/// 경매 정책
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuctionPolicy {
    /// 최소 입찰 단위 기본값
    pub default_min_increment: i64,
}

impl Default for AuctionPolicy {
    fn default() -> Self {
        Self {
            default_min_increment: 5000,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub listen_addr: SocketAddr,
    pub database_url: String,
    pub database_max_connections: u32,
    /// 시작 시 스키마 생성 여부
    pub database_init_schema: bool,
    /// 행 잠금 대기 한도(ms)
    pub lock_timeout_ms: u64,
    /// 설정되지 않으면 로그 전용 알림 사용
    pub kafka_brokers: Option<String>,
    pub notification_topic: String,
    pub booking: BookingPolicy,
    pub auction: AuctionPolicy,
}

impl Config {
    /// 환경 변수에서 설정 로드
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 임의의 키 조회 함수로 설정 구성
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let raw_addr = lookup("LISTEN_ADDR").unwrap_or_else(|| "0.0.0.0:3000".to_string());
        let listen_addr = raw_addr
            .parse()
            .map_err(|_| ConfigError::InvalidListenAddr(raw_addr.clone()))?;

        let database_url = lookup("DATABASE_URL")
            .filter(|url| !url.trim().is_empty())
            .ok_or(ConfigError::MissingDatabaseUrl)?;

        let max_slots = parse_or(&lookup, "BOOKING_MAX_SLOTS_PER_DAY", TimeSlot::ALL.len())
            .clamp(1, TimeSlot::ALL.len());
        let max_advance_days = parse_or(&lookup, "BOOKING_MAX_ADVANCE_DAYS", 30)
            .clamp(1, MAX_ADVANCE_DAYS_LIMIT);
        let default_min_increment = match parse_or(&lookup, "AUCTION_MIN_INCREMENT", 5000) {
            increment if increment > 0 => increment.min(MAX_AMOUNT),
            _ => AuctionPolicy::default().default_min_increment,
        };

        Ok(Self {
            listen_addr,
            database_url,
            database_max_connections: parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", 5),
            database_init_schema: parse_bool_or(&lookup, "DATABASE_INIT_SCHEMA", true),
            lock_timeout_ms: parse_or(&lookup, "LOCK_TIMEOUT_MS", 5000),
            kafka_brokers: lookup("KAFKA_BROKERS").filter(|b| !b.trim().is_empty()),
            notification_topic: lookup("NOTIFICATION_TOPIC")
                .unwrap_or_else(|| "notifications".to_string()),
            booking: BookingPolicy {
                max_advance_days,
                max_slots_per_day: max_slots,
            },
            auction: AuctionPolicy {
                default_min_increment,
            },
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    lookup(key)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

fn parse_bool_or<F>(lookup: &F, key: &str, default: bool) -> bool
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key).map(|v| v.trim().to_ascii_lowercase()).as_deref() {
        Some("true") | Some("1") | Some("yes") => true,
        Some("false") | Some("0") | Some("no") => false,
        _ => default,
    }
}
// endregion: --- Config

// region:    --- Tests
#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_only_database_url_is_set() {
        let config = Config::from_lookup(lookup_from(&[("DATABASE_URL", "postgres://x")])).unwrap();
        assert_eq!(config.listen_addr.port(), 3000);
        assert_eq!(config.database_max_connections, 5);
        assert!(config.database_init_schema);
        assert_eq!(config.lock_timeout_ms, 5000);
        assert!(config.kafka_brokers.is_none());
        assert_eq!(config.notification_topic, "notifications");
        assert_eq!(config.booking, BookingPolicy::default());
        assert_eq!(config.auction.default_min_increment, 5000);
    }

    #[test]
    fn missing_database_url_is_an_error() {
        let err = Config::from_lookup(lookup_from(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingDatabaseUrl));
    }

    #[test]
    fn bad_listen_addr_is_an_error() {
        let err = Config::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://x"),
            ("LISTEN_ADDR", "not-an-addr"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidListenAddr(_)));
    }

    #[test]
    fn slot_quota_is_clamped_and_garbage_falls_back() {
        let config = Config::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://x"),
            ("BOOKING_MAX_SLOTS_PER_DAY", "40"),
            ("LOCK_TIMEOUT_MS", "soon"),
            ("DATABASE_INIT_SCHEMA", "no"),
            ("KAFKA_BROKERS", "localhost:9092"),
        ]))
        .unwrap();
        assert_eq!(config.booking.max_slots_per_day, TimeSlot::ALL.len());
        assert_eq!(config.lock_timeout_ms, 5000);
        assert!(!config.database_init_schema);
        assert_eq!(config.kafka_brokers.as_deref(), Some("localhost:9092"));
    }

    #[test]
    fn out_of_range_policies_are_clamped() {
        let config = Config::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://x"),
            ("BOOKING_MAX_ADVANCE_DAYS", "9223372036854775807"),
            ("AUCTION_MIN_INCREMENT", "-10"),
        ]))
        .unwrap();
        assert_eq!(config.booking.max_advance_days, MAX_ADVANCE_DAYS_LIMIT);
        assert_eq!(config.auction.default_min_increment, 5000);

        let config = Config::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://x"),
            ("BOOKING_MAX_ADVANCE_DAYS", "-3"),
            ("AUCTION_MIN_INCREMENT", "0"),
        ]))
        .unwrap();
        assert_eq!(config.booking.max_advance_days, 1);
        assert_eq!(config.auction.default_min_increment, 5000);
    }
}
// endregion: --- Tests
