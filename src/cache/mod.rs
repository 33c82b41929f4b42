// Redis 缓存模块
// 目前只存放登录会话

pub mod session;

pub use session::{CachedSession, SessionCacheOperations};
