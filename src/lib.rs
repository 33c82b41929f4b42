use std::sync::Arc;

use axum::{
    Router,
    extract::{DefaultBodyLimit, FromRef},
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
};
use axum_extra::extract::cookie::Key;
use config::{Config, MAX_CONTENT_LENGTH};
use error::AppError;
use mail::Mailer;
use middleware::{
    RateLimiter, load_current_user, log_errors, rate_limit, require_admin, require_login,
};
use redis::Client as RedisClient;
use sha2::{Digest, Sha512};
use sqlx::PgPool;
use tower_http::{services::ServeDir, trace::TraceLayer};
use utils::upload::UploadStore;

pub mod cache;
pub mod config;
pub mod error;
pub mod mail;
pub mod middleware;
pub mod models;
pub mod utils;

pub mod routes;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Config,
    pub redis: Arc<RedisClient>,
    pub mailer: Arc<Mailer>,
    pub uploads: UploadStore,
    pub cookie_key: Key,
}

impl AppState {
    pub fn new(pool: PgPool, config: Config, redis: RedisClient) -> Result<Self, AppError> {
        let mailer = Mailer::from_config(&config.mail)?;
        Ok(AppState {
            pool,
            uploads: UploadStore::new(config.upload_folder.clone()),
            cookie_key: cookie_key_from_secret(&config.secret_key),
            mailer: Arc::new(mailer),
            redis: Arc::new(redis),
            config,
        })
    }
}

// PrivateCookieJar 通过它取得加密密钥
impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.cookie_key.clone()
    }
}

/// 由 SECRET_KEY 派生 64 字节的 cookie 加密密钥
pub fn cookie_key_from_secret(secret: &str) -> Key {
    let digest = Sha512::digest(secret.as_bytes());
    Key::from(&digest[..])
}

// 未匹配的路径统一返回 404 信封
async fn not_found() -> AppError {
    AppError::NotFound
}

pub fn build_router(state: AppState) -> Router {
    use routes::{admin, content, site};

    let rate_limiter = Arc::new(RateLimiter::new(state.redis.clone(), state.config.clone()));

    // 公开页面
    let public_routes = Router::new()
        .route("/at-etablissement", get(site::about))
        .route("/at-services", get(site::services))
        .route("/sitemap.xml", get(site::sitemap))
        .route("/sitemap", get(site::sitemap))
        .route("/robots.txt", get(site::robots));

    // 带表单提交的公开路由，POST 受限流保护
    let form_routes = Router::new()
        .route("/", get(site::home).post(site::submit_contact))
        .route("/admin/login", get(admin::login_page).post(admin::login))
        .route("/admin/register", get(admin::register_page).post(admin::register))
        .route(
            admin::RESET_REQUEST_PATH,
            get(admin::reset_request_page).post(admin::reset_request),
        )
        .route(
            "/admin/reset/password/{token}",
            get(admin::reset_password_page).post(admin::reset_password),
        )
        .route_layer(from_fn_with_state(rate_limiter, rate_limit));

    // 后台：需要管理员权限
    let admin_routes = Router::new()
        .route("/admin", get(admin::dashboard))
        .route(admin::DASHBOARD_PATH, get(admin::dashboard))
        .route(admin::UPDATE_PATH, get(admin::update_page).post(admin::update_account))
        .route(
            content::PROJECT_PATH,
            get(content::projects_page).post(content::create_project),
        )
        .route("/admin/project/{id}/update", post(content::update_project))
        .route("/admin/project/{id}/delete", post(content::delete_project))
        .route(
            content::STORIE_PATH,
            get(content::stories_page).post(content::create_storie),
        )
        .route("/admin/storie/{id}/update", post(content::update_storie))
        .route("/admin/storie/{id}/delete", post(content::delete_storie))
        .route(
            content::PARTNER_PATH,
            get(content::partners_page).post(content::create_partner),
        )
        .route("/admin/partner/{id}/update", post(content::update_partner))
        .route("/admin/partner/{id}/delete", post(content::delete_partner))
        .route(content::CONTACTS_PATH, get(content::contacts_page))
        .route("/admin/contact/{id}/delete", post(content::delete_contact))
        .route_layer(from_fn_with_state(state.clone(), require_admin));

    // 只要求登录
    let member_routes = Router::new()
        .route("/admin/logout", get(admin::logout))
        .route_layer(from_fn_with_state(state.clone(), require_login));

    let router = Router::new()
        .merge(public_routes)
        .merge(form_routes)
        .merge(admin_routes)
        .merge(member_routes)
        .nest_service("/admin/upload", ServeDir::new(state.uploads.dir()))
        .fallback(not_found)
        .layer(DefaultBodyLimit::max(MAX_CONTENT_LENGTH))
        .layer(from_fn_with_state(state.clone(), load_current_user))
        .layer(from_fn(log_errors))
        .layer(TraceLayer::new_for_http());

    // 根据编译模式决定是否添加CORS
    #[cfg(debug_assertions)]
    let router = {
        tracing::debug!("Adding CORS layer for development mode");
        router.layer(tower_http::cors::CorsLayer::permissive())
    };

    router.with_state(state)
}
