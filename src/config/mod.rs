use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// 签名密钥最小长度（用于 cookie 加密与重置令牌签名）
pub const MIN_SECRET_KEY_LEN: usize = 32;

/// 上传文件大小上限，单位字节
pub const MAX_CONTENT_LENGTH: usize = 16 * 1000 * 1000;

/// 允许上传的图片扩展名
pub const ALLOWED_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing environment variable {0}")]
    Missing(&'static str),
    #[error("invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
    #[error("SECRET_KEY must be at least {MIN_SECRET_KEY_LEN} characters long")]
    WeakSecret,
}

#[derive(Debug, Clone)]
pub struct MailConfig {
    pub server: Option<String>,
    pub port: u16,
    pub use_tls: bool,
    pub username: Option<String>,
    pub password: Option<String>,
    pub sender: String,
    pub subject_prefix: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub redis_url: String,
    pub secret_key: String,
    pub server_host: String,
    pub server_port: u16,
    pub site_name: String,
    /// 对外链接的根地址，如 https://portfolio.example
    pub site_url: String,
    pub admin_email: Option<String>,
    pub phone_number: Option<String>,
    pub phone_number_two: Option<String>,
    pub upload_folder: PathBuf,
    pub reset_token_expiration_secs: u64,
    pub session_expiration_secs: u64,
    pub rate_limit_window_secs: u64,
    pub rate_limit_requests: u32,
    pub mail: MailConfig,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();

        let secret_key = required("SECRET_KEY")?;
        if secret_key.len() < MIN_SECRET_KEY_LEN {
            return Err(ConfigError::WeakSecret);
        }

        Ok(Config {
            database_url: required("DATABASE_URL")?,
            redis_url: required("REDIS_URL")?,
            secret_key,
            server_host: optional("SERVER_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            server_port: parsed("SERVER_PORT", 5000)?,
            site_name: optional("SITE_NAME").unwrap_or_else(|| "Portfolio".into()),
            site_url: optional("SITE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|| "http://localhost:5000".into()),
            admin_email: optional("FLASKY_ADMIN").map(|e| e.to_lowercase()),
            phone_number: optional("PHONE_NUMBER"),
            phone_number_two: optional("PHONE_NUMBER_TWO"),
            upload_folder: optional("UPLOAD_FOLDER")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("upload")),
            reset_token_expiration_secs: parsed("RESET_TOKEN_EXPIRATION", 600)?,
            session_expiration_secs: parsed("SESSION_EXPIRATION", 7 * 24 * 3600)?,
            rate_limit_window_secs: parsed("RATE_LIMIT_WINDOW", 60)?,
            rate_limit_requests: parsed("RATE_LIMIT_REQUESTS", 20)?,
            mail: MailConfig {
                server: optional("MAIL_SERVER"),
                port: parsed("MAIL_PORT", 587)?,
                use_tls: optional("MAIL_USE_TLS")
                    .map(|v| parse_flag(&v))
                    .unwrap_or(true),
                username: optional("MAIL_USERNAME"),
                password: optional("MAIL_PASSWORD"),
                sender: optional("MAIL_SENDER").unwrap_or_else(|| "noreply@localhost".into()),
                subject_prefix: optional("MAIL_SUBJECT").unwrap_or_default(),
            },
        })
    }

    pub fn reset_token_expiration(&self) -> Duration {
        Duration::from_secs(self.reset_token_expiration_secs)
    }

    pub fn session_expiration(&self) -> Duration {
        Duration::from_secs(self.session_expiration_secs)
    }

    pub fn rate_limit_window(&self) -> Duration {
        Duration::from_secs(self.rate_limit_window_secs)
    }

    /// 邮件里的绝对链接只由配置决定，不看请求的 Host 头
    pub fn public_url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.site_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// 判断邮箱是否为配置中的管理员邮箱
    pub fn is_admin_email(&self, email: &str) -> bool {
        self.admin_email
            .as_deref()
            .is_some_and(|admin| admin.eq_ignore_ascii_case(email))
    }
}

fn optional(name: &'static str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    optional(name).ok_or(ConfigError::Missing(name))
}

fn parsed<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match optional(name) {
        None => Ok(default),
        Some(value) => parse_value(name, &value),
    }
}

fn parse_value<T: std::str::FromStr>(name: &'static str, value: &str) -> Result<T, ConfigError> {
    // 兼容 "600s" 这类带单位的写法
    value
        .trim()
        .trim_end_matches('s')
        .parse::<T>()
        .map_err(|_| ConfigError::Invalid {
            name,
            value: value.to_string(),
        })
}

fn parse_flag(value: &str) -> bool {
    matches!(value.to_lowercase().as_str(), "true" | "on" | "1")
}
