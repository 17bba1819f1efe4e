/// 사용자 디렉터리
/// 사용자 계정은 인증 서비스가 관리하고, 여기서는 역할/활성 여부만 조회한다.
// region:    --- Imports
use crate::database::{text_column, UnknownVariant};
use crate::error::AppError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use uuid::Uuid;
// endregion: --- Imports

// region:    --- Role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Pengurus,
    Relawan,
    Sahabat,
}

impl Role {
    /// 예약 운영 인력 (승인/거절/진행)
    pub const BOOKING_STAFF: [Role; 3] = [Role::Admin, Role::Pengurus, Role::Relawan];
    /// 운영자 (경매 관리, 결제 검증, 배정)
    pub const OPERATORS: [Role; 2] = [Role::Admin, Role::Pengurus];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Pengurus => "pengurus",
            Role::Relawan => "relawan",
            Role::Sahabat => "sahabat",
        }
    }
}

impl FromStr for Role {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "pengurus" => Ok(Role::Pengurus),
            "relawan" => Ok(Role::Relawan),
            "sahabat" => Ok(Role::Sahabat),
            other => Err(UnknownVariant::new("role", other)),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

text_column!(Role);
// endregion: --- Role

// region:    --- User
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub full_name: String,
    pub phone: Option<String>,
    pub role: Role,
    pub is_active: bool,
}

impl User {
    pub fn has_role(&self, roles: &[Role]) -> bool {
        roles.contains(&self.role)
    }

    /// 역할 요구 (없으면 403)
    pub fn require_role(&self, roles: &[Role]) -> Result<(), AppError> {
        if self.has_role(roles) {
            Ok(())
        } else {
            Err(AppError::Forbidden(format!(
                "role '{}' is not allowed to perform this action",
                self.role
            )))
        }
    }
}
// endregion: --- User

// region:    --- Directory
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// 사용자 조회
    async fn resolve_user(&self, id: Uuid) -> Result<Option<User>, AppError>;

    /// 주어진 역할의 활성 사용자 id 목록 (`exclude` 제외)
    async fn active_user_ids(
        &self,
        roles: &[Role],
        exclude: Option<Uuid>,
    ) -> Result<Vec<Uuid>, AppError>;
}

/// Postgres `users` 테이블 기반 디렉터리
pub struct PgUserDirectory {
    pool: Arc<PgPool>,
}

impl PgUserDirectory {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserDirectory for PgUserDirectory {
    async fn resolve_user(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, full_name, phone, role, is_active FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&*self.pool)
        .await?;
        Ok(user)
    }

    async fn active_user_ids(
        &self,
        roles: &[Role],
        exclude: Option<Uuid>,
    ) -> Result<Vec<Uuid>, AppError> {
        let ids = sqlx::query_scalar::<_, Uuid>(
            "SELECT id FROM users
             WHERE role = ANY($1) AND is_active = TRUE AND ($2::uuid IS NULL OR id <> $2)
             ORDER BY created_at",
        )
        .bind(roles.to_vec())
        .bind(exclude)
        .fetch_all(&*self.pool)
        .await?;
        Ok(ids)
    }
}
// endregion: --- Directory

// endregion: --- Tests
