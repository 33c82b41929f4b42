pub mod auth;
mod error_handler;
mod rate_limit;

pub use auth::{
    AuthRejection, AuthUser, CurrentUser, admin_required, load_current_user, login_required,
    require_admin, require_login,
};
pub use error_handler::log_errors;
pub use rate_limit::{RateLimiter, client_ip, rate_limit};
