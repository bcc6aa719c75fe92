//! 통합 API 에러 응답 타입.
//!
//! 모든 API 엔드포인트에서 일관된 에러 형식을 제공합니다.

use axum::http::StatusCode;
use axum::Json;
use ohlcv_core::{CoreError, InvalidInterval};
use ohlcv_data::DataError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::error;
use validator::ValidationErrors;

/// 통합 API 에러 응답.
///
/// ```json
/// {
///   "code": "DUPLICATE_SYMBOL",
///   "message": "이미 등록된 심볼입니다: AAPL",
///   "timestamp": 1738300800
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    /// 에러 코드 (예: "DB_ERROR", "VALIDATION_ERROR", "NOT_FOUND")
    pub code: String,
    /// 사람이 읽을 수 있는 에러 메시지
    pub message: String,
    /// 추가 에러 상세 정보 (선택적)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
    /// 에러 발생 타임스탬프 (Unix timestamp)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
}

impl ApiErrorResponse {
    /// 기본 에러 생성 (타임스탬프 포함).
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
            timestamp: Some(chrono::Utc::now().timestamp()),
        }
    }

    /// 상세 정보 포함 에러 생성.
    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: Value,
    ) -> Self {
        Self {
            details: Some(details),
            ..Self::new(code, message)
        }
    }
}

impl std::fmt::Display for ApiErrorResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiErrorResponse {}

/// 핸들러 에러 (상태 코드 + JSON 본문).
pub type ApiError = (StatusCode, Json<ApiErrorResponse>);

/// API 핸들러 Result 타입 별칭.
pub type ApiResult<T> = Result<T, ApiError>;

/// 상태 코드와 에러 코드로 응답 생성.
pub fn api_error(status: StatusCode, code: &str, message: impl Into<String>) -> ApiError {
    (status, Json(ApiErrorResponse::new(code, message)))
}

/// 404 응답.
pub fn not_found(message: impl Into<String>) -> ApiError {
    api_error(StatusCode::NOT_FOUND, "NOT_FOUND", message)
}

/// 지원하지 않는 간격 → 400.
pub fn invalid_interval(err: InvalidInterval) -> ApiError {
    api_error(StatusCode::BAD_REQUEST, "INVALID_INTERVAL", err.to_string())
}

/// 저장소 에러 매핑.
///
/// 고유 제약 위반은 409, 없는 레코드는 404, 그 외는 500입니다.
pub fn data_error(err: DataError) -> ApiError {
    match err {
        DataError::Duplicate(msg) => api_error(StatusCode::CONFLICT, "DUPLICATE", msg),
        DataError::NotFound(msg) => not_found(msg),
        other => {
            error!(error = %other, "저장소 오류");
            api_error(StatusCode::INTERNAL_SERVER_ERROR, "DB_ERROR", other.to_string())
        }
    }
}

/// 도메인 검증 에러 매핑.
pub fn core_error(err: CoreError) -> ApiError {
    match err {
        CoreError::InvalidInterval(e) => invalid_interval(e),
        e if e.is_client_error() => {
            api_error(StatusCode::BAD_REQUEST, "VALIDATION_ERROR", e.to_string())
        }
        e => api_error(StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", e.to_string()),
    }
}

/// 요청 본문 검증 에러 → 400.
///
/// `details`에 실패한 필드 이름 목록을 담습니다.
pub fn validation_error(errors: ValidationErrors) -> ApiError {
    let field_errors = errors.field_errors();

    let message = field_errors
        .iter()
        .flat_map(|(field, errors)| {
            errors.iter().map(move |e| {
                e.message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("{}: 유효하지 않은 값", field))
            })
        })
        .collect::<Vec<_>>()
        .join("; ");

    let mut fields: Vec<String> = field_errors.keys().map(|f| f.to_string()).collect();
    fields.sort();

    (
        StatusCode::BAD_REQUEST,
        Json(ApiErrorResponse::with_details(
            "VALIDATION_ERROR",
            message,
            serde_json::json!({ "fields": fields }),
        )),
    )
}
