use axum::{Json, http::StatusCode};
use bcrypt::{DEFAULT_COST, hash, verify};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

pub mod flash;
pub mod multipart;
pub mod token;
pub mod upload;
pub mod validation;

use validation::FieldErrors;

pub fn hash_password(password: &str) -> Result<String, bcrypt::BcryptError> {
    hash(password.as_bytes(), DEFAULT_COST)
}

pub fn verify_password(password: &str, hash: &str) -> Result<bool, bcrypt::BcryptError> {
    verify(password.as_bytes(), hash)
}

/// 通用的API响应结构
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    /// 错误码，0表示成功
    pub code: i32,
    pub msg: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resp_data: Option<T>,
}

pub fn success_to_api_response<T: Serialize>(data: T) -> Json<ApiResponse<T>> {
    Json(ApiResponse {
        code: error_codes::SUCCESS,
        msg: "success".into(),
        resp_data: Some(data),
    })
}

pub fn error_to_api_response<T>(code: i32, msg: String) -> Json<ApiResponse<T>> {
    Json(ApiResponse {
        code,
        msg,
        resp_data: None,
    })
}

/// 表单校验失败：返回字段级错误
pub fn validation_error_response(
    errors: FieldErrors,
) -> (StatusCode, Json<ApiResponse<FieldErrors>>) {
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(ApiResponse {
            code: error_codes::VALIDATION_ERROR,
            msg: "Le formulaire contient des erreurs.".into(),
            resp_data: Some(errors),
        }),
    )
}

/// Gravatar 头像地址（SHA-256 形式的邮箱哈希）
pub fn gravatar_url(email: &str, size: u32, secure: bool) -> String {
    let digest = Sha256::digest(email.trim().to_lowercase().as_bytes());
    let hash: String = digest.iter().map(|b| format!("{:02x}", b)).collect();
    let base = if secure {
        "https://secure.gravatar.com/avatar"
    } else {
        "http://www.gravatar.com/avatar"
    };
    format!("{}/{}?s={}&d=identicon&r=g", base, hash, size)
}

pub mod error_codes {
    pub const SUCCESS: i32 = 0;
    pub const VALIDATION_ERROR: i32 = 1000;
    pub const CONFLICT: i32 = 1001;
    pub const PERMISSION_DENIED: i32 = 1003;
    pub const NOT_FOUND: i32 = 1004;
    pub const RATE_LIMIT: i32 = 1005;
    pub const INTERNAL_ERROR: i32 = 5000;
}
