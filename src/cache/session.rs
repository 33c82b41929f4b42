use std::sync::Arc;

use redis::{AsyncCommands, Client as RedisClient};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 会话键前缀
const SESSION_PREFIX: &str = "session:";

pub fn session_key(session_id: &str) -> String {
    format!("{}{}", SESSION_PREFIX, session_id)
}

/// 会话缓存数据模型
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct CachedSession {
    pub session_id: String,
    pub user_id: i32,
    pub created_at: i64, // Unix timestamp
    pub expires_at: i64, // Unix timestamp
}

impl CachedSession {
    pub fn new(user_id: i32, ttl: u64, now: i64) -> Self {
        Self {
            session_id: Uuid::new_v4().simple().to_string(),
            user_id,
            created_at: now,
            expires_at: now + ttl as i64,
        }
    }
}

fn serde_error(kind: &'static str, e: serde_json::Error) -> redis::RedisError {
    redis::RedisError::from((redis::ErrorKind::IoError, kind, e.to_string()))
}

/// 会话缓存操作
pub struct SessionCacheOperations;

impl SessionCacheOperations {
    /// 为用户新建会话
    pub async fn create_session(
        redis: &Arc<RedisClient>,
        user_id: i32,
        ttl: u64,
    ) -> Result<CachedSession, redis::RedisError> {
        let mut conn = redis.get_multiplexed_async_connection().await?;

        let session = CachedSession::new(user_id, ttl, chrono::Utc::now().timestamp());
        let json = serde_json::to_string(&session).map_err(|e| serde_error("序列化错误", e))?;

        let _: () = conn.set_ex(session_key(&session.session_id), json, ttl).await?;
        tracing::debug!("Created session for user {}", user_id);

        Ok(session)
    }

    /// 获取会话
    pub async fn get_session(
        redis: &Arc<RedisClient>,
        session_id: &str,
    ) -> Result<Option<CachedSession>, redis::RedisError> {
        let mut conn = redis.get_multiplexed_async_connection().await?;

        let result: Option<String> = conn.get(session_key(session_id)).await?;

        match result {
            Some(json) => {
                let session = serde_json::from_str(&json).map_err(|e| serde_error("反序列化错误", e))?;
                Ok(Some(session))
            }
            None => Ok(None),
        }
    }

    /// 删除会话
    pub async fn remove_session(
        redis: &Arc<RedisClient>,
        session_id: &str,
    ) -> Result<(), redis::RedisError> {
        let mut conn = redis.get_multiplexed_async_connection().await?;
        let _: () = conn.del(session_key(session_id)).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_session_expires_after_ttl() {
        let session = CachedSession::new(9, 3600, 1_000);
        assert_eq!(session.user_id, 9);
        assert_eq!(session.expires_at, 4_600);
        assert_eq!(session.session_id.len(), 32);
        assert_eq!(session_key(&session.session_id), format!("session:{}", session.session_id));
    }

    #[test]
    fn session_ids_are_unique() {
        let a = CachedSession::new(1, 10, 0);
        let b = CachedSession::new(1, 10, 0);
        assert_ne!(a.session_id, b.session_id);
    }
}
