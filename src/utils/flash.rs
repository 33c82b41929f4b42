use axum_extra::extract::cookie::{Cookie, PrivateCookieJar, SameSite};
use serde::{Deserialize, Serialize};

const FLASH_COOKIE: &str = "_flashes";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashCategory {
    Success,
    Info,
    Warning,
    Danger,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlashMessage {
    pub category: FlashCategory,
    pub message: String,
}

fn read(jar: &PrivateCookieJar) -> Vec<FlashMessage> {
    jar.get(FLASH_COOKIE)
        .and_then(|cookie| serde_json::from_str(cookie.value()).ok())
        .unwrap_or_default()
}

/// 追加一条闪现消息，下一次页面渲染时取出
pub fn push(
    jar: PrivateCookieJar,
    category: FlashCategory,
    message: impl Into<String>,
) -> PrivateCookieJar {
    let mut messages = read(&jar);
    messages.push(FlashMessage {
        category,
        message: message.into(),
    });

    let value = serde_json::to_string(&messages).unwrap_or_else(|_| "[]".into());
    let cookie = Cookie::build((FLASH_COOKIE, value))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build();
    jar.add(cookie)
}

/// 取出并清空所有待展示的消息
pub fn take(jar: PrivateCookieJar) -> (PrivateCookieJar, Vec<FlashMessage>) {
    let messages = read(&jar);
    if messages.is_empty() {
        return (jar, messages);
    }
    (jar.remove(Cookie::build(FLASH_COOKIE).path("/")), messages)
}
