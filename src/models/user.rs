use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgExecutor, PgPool};

use super::flags::{FlagSet, Permission};
use super::role::{ADMIN_ROLE, Role};
use crate::config::Config;
use crate::error::AppError;
use crate::utils::token::{issue_reset_token, verify_reset_token};
use crate::utils::{gravatar_url, hash_password, verify_password};

const USER_COLUMNS: &str = "id, email, password_hash, role_id, joined_at, last_seen";

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct User {
    pub id: i32,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role_id: Option<i32>,
    pub joined_at: DateTime<Utc>,
    pub last_seen: Option<DateTime<Utc>>,
    #[sqlx(skip)]
    pub role: Option<Role>,
}

/// 注册时决定用户角色：管理员邮箱优先取管理员角色，否则取默认角色
pub fn resolve_role(
    is_admin_email: bool,
    admin_role: Option<Role>,
    default_role: Option<Role>,
) -> Option<Role> {
    if is_admin_email {
        if let Some(role) = admin_role {
            return Some(role);
        }
    }
    default_role
}

impl User {
    pub fn can(&self, perm: Permission) -> bool {
        self.role.as_ref().is_some_and(|role| role.has(perm))
    }

    pub fn is_admin(&self) -> bool {
        self.can(Permission::ADMIN)
    }

    pub fn verify_password(&self, password: &str) -> Result<bool, bcrypt::BcryptError> {
        verify_password(password, &self.password_hash)
    }

    pub fn gravatar(&self, size: u32) -> String {
        gravatar_url(&self.email, size, true)
    }

    /// 创建账号（邮箱统一转小写），在同一事务内解析角色并写入
    pub async fn create(
        pool: &PgPool,
        config: &Config,
        email: &str,
        password: &str,
    ) -> Result<User, AppError> {
        let email = email.trim().to_lowercase();
        let password_hash = hash_password(password)?;

        let mut tx = pool.begin().await?;

        let admin_role = if config.is_admin_email(&email) {
            Role::find_by_name(&mut *tx, ADMIN_ROLE).await?
        } else {
            None
        };
        let default_role = Role::find_default(&mut *tx).await?;
        let role = resolve_role(config.is_admin_email(&email), admin_role, default_role);

        let mut user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (email, password_hash, role_id, joined_at, last_seen)
            VALUES ($1, $2, $3, NOW(), NOW())
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&email)
        .bind(&password_hash)
        .bind(role.as_ref().map(|r| r.id))
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!("Created user {} with role {:?}", user.id, role.as_ref().map(|r| &r.name));
        user.role = role;
        Ok(user)
    }

    pub async fn find_by_id(pool: &PgPool, id: i32) -> Result<Option<User>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;
        Self::with_role(pool, user).await
    }

    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<User>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email.trim().to_lowercase())
        .fetch_optional(pool)
        .await?;
        Self::with_role(pool, user).await
    }

    pub async fn email_exists<'e, E: PgExecutor<'e>>(
        executor: E,
        email: &str,
    ) -> Result<bool, sqlx::Error> {
        let (exists,): (bool,) =
            sqlx::query_as("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)")
                .bind(email.trim().to_lowercase())
                .fetch_one(executor)
                .await?;
        Ok(exists)
    }

    async fn with_role(pool: &PgPool, user: Option<User>) -> Result<Option<User>, sqlx::Error> {
        let Some(mut user) = user else {
            return Ok(None);
        };
        if let Some(role_id) = user.role_id {
            user.role = Role::find_by_id(pool, role_id).await?;
        }
        Ok(Some(user))
    }

    /// 更新账号资料：只允许修改邮箱与角色
    pub async fn update_profile(
        pool: &PgPool,
        id: i32,
        email: &str,
        role_id: i32,
    ) -> Result<User, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
            SET email = $1, role_id = $2
            WHERE id = $3
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(email.trim().to_lowercase())
        .bind(role_id)
        .bind(id)
        .fetch_one(pool)
        .await?;

        Self::with_role(pool, Some(user))
            .await?
            .ok_or(sqlx::Error::RowNotFound)
    }

    pub async fn update_password(pool: &PgPool, id: i32, password: &str) -> Result<(), AppError> {
        let password_hash = hash_password(password)?;

        let result = sqlx::query("UPDATE users SET password_hash = $1 WHERE id = $2")
            .bind(password_hash)
            .bind(id)
            .execute(pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::Database(sqlx::Error::RowNotFound));
        }
        Ok(())
    }

    /// 刷新最后活跃时间
    pub async fn ping(pool: &PgPool, id: i32) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE users SET last_seen = NOW() WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(())
    }

    pub fn get_reset_password_token(
        &self,
        config: &Config,
        now: DateTime<Utc>,
    ) -> Result<String, jsonwebtoken::errors::Error> {
        issue_reset_token(self.id, &config.secret_key, config.reset_token_expiration(), now)
    }

    /// 校验重置令牌并查出对应用户；令牌无效或用户不存在都返回 None
    pub async fn verify_reset_password_token(
        pool: &PgPool,
        config: &Config,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<User>, sqlx::Error> {
        match verify_reset_token(token, &config.secret_key, now) {
            Some(id) => Self::find_by_id(pool, id).await,
            None => Ok(None),
        }
    }
}
