/// 요청 본문/쿼리/경로 추출기
/// axum 기본 추출기의 거부 응답을 `AppError` 형식으로 바꾼다.
// region:    --- Imports
use crate::error::AppError;
use axum::async_trait;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{FromRequest, FromRequestParts, Path, Query, Request};
use axum::http::request::Parts;
use axum::Json;
// endregion: --- Imports

/// JSON 본문
#[derive(Debug, Clone)]
pub struct ApiJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ApiJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(Self(value))
    }
}

/// 쿼리 문자열
#[derive(Debug, Clone)]
pub struct ApiQuery<T>(pub T);

#[async_trait]
impl<S, T> FromRequestParts<S> for ApiQuery<T>
where
    Query<T>: FromRequestParts<S, Rejection = QueryRejection>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state).await?;
        Ok(Self(value))
    }
}

/// 경로 파라미터
#[derive(Debug, Clone)]
pub struct ApiPath<T>(pub T);

#[async_trait]
impl<S, T> FromRequestParts<S> for ApiPath<T>
where
    Path<T>: FromRequestParts<S, Rejection = PathRejection>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(value) = Path::<T>::from_request_parts(parts, state).await?;
        Ok(Self(value))
    }
}

// region:    --- Tests
#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::StatusCode;
    use axum::response::IntoResponse;
    use axum::routing::post;
    use axum::Router;
    use serde::Deserialize;
    use tower::ServiceExt;

    #[derive(Debug, Deserialize)]
    struct Amount {
        amount: i64,
    }

    async fn echo(
        ApiPath(id): ApiPath<uuid::Uuid>,
        ApiJson(body): ApiJson<Amount>,
    ) -> impl IntoResponse {
        format!("{} {}", id, body.amount)
    }

    async fn call(uri: &str, body: &str) -> (StatusCode, serde_json::Value) {
        let router = Router::new().route("/items/:id", post(echo));
        let request = axum::http::Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let response = router.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or_default())
    }

    #[tokio::test]
    async fn malformed_body_uses_error_envelope() {
        let uri = format!("/items/{}", uuid::Uuid::nil());
        let (status, body) = call(&uri, r#"{"amount":"abc"}"#).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["kind"], "validation_error");
        assert_eq!(body["error"]["code"], "VALIDATION_FAILED");

        let (status, body) = call(&uri, "{not json").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["kind"], "validation_error");
    }

    #[tokio::test]
    async fn bad_path_id_uses_error_envelope() {
        let (status, body) = call("/items/not-a-uuid", r#"{"amount":1}"#).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["kind"], "validation_error");
    }

    #[tokio::test]
    async fn valid_request_passes_through() {
        let uri = format!("/items/{}", uuid::Uuid::nil());
        let (status, _) = call(&uri, r#"{"amount":105000}"#).await;
        assert_eq!(status, StatusCode::OK);
    }
}
// endregion: --- Tests
