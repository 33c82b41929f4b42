//! 密码重置令牌
//!
//! HS256 签名的无状态令牌，载荷为用户ID与过期时间。校验时签名错误、
//! 格式错误、已过期全部归为同一种失败（返回 None），调用方无法区分。
//! 令牌在有效期内可以重复使用，服务端不做吊销。

use std::time::Duration;

use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResetClaims {
    pub sub: String, // 用户ID
    pub iat: i64,
    pub exp: i64,
}

pub fn issue_reset_token(
    user_id: i32,
    secret: &str,
    expires_in: Duration,
    now: DateTime<Utc>,
) -> Result<String, jsonwebtoken::errors::Error> {
    let claims = ResetClaims {
        sub: user_id.to_string(),
        iat: now.timestamp(),
        exp: now.timestamp() + expires_in.as_secs() as i64,
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

/// 校验令牌，成功时返回其中的用户ID
pub fn verify_reset_token(token: &str, secret: &str, now: DateTime<Utc>) -> Option<i32> {
    let mut validation = Validation::new(Algorithm::HS256);
    // 过期时间由下面按传入的 now 判断
    validation.validate_exp = false;

    let data = match decode::<ResetClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    ) {
        Ok(data) => data,
        Err(e) => {
            tracing::debug!("Rejected reset token: {}", e);
            return None;
        }
    };

    if now.timestamp() >= data.claims.exp {
        tracing::debug!("Rejected expired reset token for user {}", data.claims.sub);
        return None;
    }

    data.claims.sub.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "0123456789abcdef0123456789abcdef";
    const WINDOW: Duration = Duration::from_secs(600);

    #[test]
    fn verifies_before_expiry() {
        let now = Utc::now();
        let token = issue_reset_token(42, SECRET, WINDOW, now).unwrap();
        assert_eq!(verify_reset_token(&token, SECRET, now), Some(42));
        assert_eq!(
            verify_reset_token(&token, SECRET, now + chrono::Duration::seconds(599)),
            Some(42)
        );
    }

    #[test]
    fn rejects_after_expiry() {
        let now = Utc::now();
        let token = issue_reset_token(42, SECRET, WINDOW, now).unwrap();
        assert_eq!(
            verify_reset_token(&token, SECRET, now + chrono::Duration::seconds(601)),
            None
        );
    }

    #[test]
    fn rejects_wrong_secret() {
        let now = Utc::now();
        let token = issue_reset_token(42, SECRET, WINDOW, now).unwrap();
        assert_eq!(
            verify_reset_token(&token, "another-secret-another-secret-xx", now),
            None
        );
    }

    #[test]
    fn rejects_malformed_and_tampered_tokens() {
        let now = Utc::now();
        assert_eq!(verify_reset_token("not.a.token", SECRET, now), None);
        assert_eq!(verify_reset_token("", SECRET, now), None);

        // 把另一个用户的载荷拼到原签名上
        let token = issue_reset_token(42, SECRET, WINDOW, now).unwrap();
        let other = issue_reset_token(43, SECRET, WINDOW, now).unwrap();
        let parts: Vec<&str> = token.split('.').collect();
        let other_parts: Vec<&str> = other.split('.').collect();
        let tampered = format!("{}.{}.{}", parts[0], other_parts[1], parts[2]);
        assert_eq!(verify_reset_token(&tampered, SECRET, now), None);
    }

    #[test]
    fn second_token_does_not_revoke_first() {
        let now = Utc::now();
        let first = issue_reset_token(7, SECRET, WINDOW, now).unwrap();
        let later = now + chrono::Duration::seconds(10);
        let _second = issue_reset_token(7, SECRET, WINDOW, later).unwrap();
        assert_eq!(
            verify_reset_token(&first, SECRET, now + chrono::Duration::seconds(20)),
            Some(7)
        );
    }
}
