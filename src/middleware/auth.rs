use std::convert::Infallible;

use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::{Cookie, PrivateCookieJar, SameSite};

use crate::{
    AppState,
    cache::SessionCacheOperations,
    error::AppError,
    models::{Permission, User},
    utils::flash::{self, FlashCategory},
};

pub const SESSION_COOKIE: &str = "session";
pub const LOGIN_PATH: &str = "/admin/login";
pub const LOGIN_REQUIRED_MESSAGE: &str = "Vous devez être connecté pour voir cette page.";

/// 当前请求的身份
#[derive(Debug, Clone, Default)]
pub enum CurrentUser {
    #[default]
    Anonymous,
    Authenticated(User),
}

impl CurrentUser {
    pub fn user(&self) -> Option<&User> {
        match self {
            CurrentUser::Anonymous => None,
            CurrentUser::Authenticated(user) => Some(user),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.user().is_some()
    }

    /// 匿名用户没有任何权限
    pub fn can(&self, perm: Permission) -> bool {
        self.user().is_some_and(|user| user.can(perm))
    }

    pub fn is_admin(&self) -> bool {
        self.can(Permission::ADMIN)
    }
}

impl<S: Send + Sync> FromRequestParts<S> for CurrentUser {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts.extensions.get::<CurrentUser>().cloned().unwrap_or_default())
    }
}

/// 通过了登录/管理员校验的用户，由路由守卫放入请求扩展
#[derive(Debug, Clone)]
pub struct AuthUser(pub User);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthRejection {
    LoginRequired,
    Forbidden,
}

impl AuthRejection {
    /// 未登录：带提示跳转登录页；无权限：403
    pub fn into_response_with(self, jar: PrivateCookieJar) -> Response {
        match self {
            AuthRejection::LoginRequired => {
                let jar = flash::push(jar, FlashCategory::Info, LOGIN_REQUIRED_MESSAGE);
                (jar, Redirect::to(LOGIN_PATH)).into_response()
            }
            AuthRejection::Forbidden => AppError::Forbidden.into_response(),
        }
    }
}

pub fn login_required(current: &CurrentUser) -> Result<&User, AuthRejection> {
    current.user().ok_or(AuthRejection::LoginRequired)
}

pub fn admin_required(current: &CurrentUser) -> Result<&User, AuthRejection> {
    let user = login_required(current)?;
    if user.is_admin() {
        Ok(user)
    } else {
        Err(AuthRejection::Forbidden)
    }
}

/// 根据会话 cookie 解析当前用户，所有路由都经过这一层
pub async fn load_current_user(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
    mut req: Request,
    next: Next,
) -> Response {
    let current = match jar.get(SESSION_COOKIE) {
        Some(cookie) => resolve_session(&state, cookie.value()).await,
        None => CurrentUser::Anonymous,
    };
    req.extensions_mut().insert(current);
    next.run(req).await
}

async fn resolve_session(state: &AppState, session_id: &str) -> CurrentUser {
    let session = match SessionCacheOperations::get_session(&state.redis, session_id).await {
        Ok(Some(session)) => session,
        Ok(None) => return CurrentUser::Anonymous,
        Err(e) => {
            tracing::warn!("Failed to read session: {}", e);
            return CurrentUser::Anonymous;
        }
    };

    match User::find_by_id(&state.pool, session.user_id).await {
        Ok(Some(user)) => {
            if let Err(e) = User::ping(&state.pool, user.id).await {
                tracing::warn!("Failed to update last_seen for user {}: {}", user.id, e);
            }
            CurrentUser::Authenticated(user)
        }
        Ok(None) => CurrentUser::Anonymous,
        Err(e) => {
            tracing::error!("Failed to load session user {}: {}", session.user_id, e);
            CurrentUser::Anonymous
        }
    }
}

async fn gate(
    guard: fn(&CurrentUser) -> Result<&User, AuthRejection>,
    jar: PrivateCookieJar,
    mut req: Request,
    next: Next,
) -> Response {
    let current = req.extensions().get::<CurrentUser>().cloned().unwrap_or_default();
    match guard(&current) {
        Ok(user) => {
            let user = user.clone();
            req.extensions_mut().insert(AuthUser(user));
            next.run(req).await
        }
        Err(rejection) => {
            tracing::info!("Rejected {} {}: {:?}", req.method(), req.uri().path(), rejection);
            rejection.into_response_with(jar)
        }
    }
}

pub async fn require_login(jar: PrivateCookieJar, req: Request, next: Next) -> Response {
    gate(login_required, jar, req, next).await
}

pub async fn require_admin(jar: PrivateCookieJar, req: Request, next: Next) -> Response {
    gate(admin_required, jar, req, next).await
}

/// 登录成功：写入会话并下发 cookie
pub async fn start_session(
    state: &AppState,
    jar: PrivateCookieJar,
    user_id: i32,
) -> Result<PrivateCookieJar, AppError> {
    let ttl = state.config.session_expiration().as_secs();
    let session = SessionCacheOperations::create_session(&state.redis, user_id, ttl).await?;

    let cookie = Cookie::build((SESSION_COOKIE, session.session_id))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build();
    Ok(jar.add(cookie))
}

pub async fn end_session(state: &AppState, jar: PrivateCookieJar) -> PrivateCookieJar {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        if let Err(e) = SessionCacheOperations::remove_session(&state.redis, cookie.value()).await {
            tracing::warn!("Failed to remove session: {}", e);
        }
    }
    jar.remove(Cookie::build(SESSION_COOKIE).path("/"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Role, Seeded};
    use chrono::Utc;

    fn user(perms: &[Permission]) -> User {
        let mut role = Role::new("r");
        role.id = 1;
        role.apply_seed(perms, false);
        User {
            id: 1,
            email: "a@b.com".into(),
            password_hash: String::new(),
            role_id: Some(1),
            joined_at: Utc::now(),
            last_seen: None,
            role: Some(role),
        }
    }

    #[test]
    fn anonymous_has_no_capabilities() {
        let anon = CurrentUser::Anonymous;
        assert!(!anon.can(Permission::ADMIN));
        assert!(!anon.is_admin());
        assert_eq!(login_required(&anon).unwrap_err(), AuthRejection::LoginRequired);
        assert_eq!(admin_required(&anon).unwrap_err(), AuthRejection::LoginRequired);
    }

    #[test]
    fn non_admin_is_forbidden() {
        let current = CurrentUser::Authenticated(user(&[Permission::MODERATE]));
        assert!(login_required(&current).is_ok());
        assert_eq!(admin_required(&current).unwrap_err(), AuthRejection::Forbidden);
    }

    #[test]
    fn admin_passes_both_guards() {
        let current = CurrentUser::Authenticated(user(&[Permission::ADMIN]));
        assert!(login_required(&current).is_ok());
        assert_eq!(admin_required(&current).unwrap().id, 1);
    }
}
