use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgPool};

const STORIE_COLUMNS: &str = "id, fullname, status, content, image, timestamp, user_id";

/// 客户评价
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Storie {
    pub id: i32,
    pub fullname: String,
    pub status: String,
    pub content: Option<String>,
    pub image: String,
    pub timestamp: DateTime<Utc>,
    pub user_id: i32,
}

#[derive(Debug, Clone)]
pub struct NewStorie {
    pub fullname: String,
    pub status: String,
    pub content: String,
    pub image: String,
    pub user_id: i32,
}

#[derive(Debug, Clone)]
pub struct StorieChanges {
    pub fullname: String,
    pub status: String,
    pub content: String,
    pub image: Option<String>,
}

impl Storie {
    pub async fn create(pool: &PgPool, new: NewStorie) -> Result<Storie, sqlx::Error> {
        sqlx::query_as::<_, Storie>(&format!(
            r#"
            INSERT INTO storie (fullname, status, content, image, user_id, timestamp)
            VALUES ($1, $2, $3, $4, $5, NOW())
            RETURNING {STORIE_COLUMNS}
            "#
        ))
        .bind(new.fullname)
        .bind(new.status)
        .bind(new.content)
        .bind(new.image)
        .bind(new.user_id)
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_id(pool: &PgPool, id: i32) -> Result<Option<Storie>, sqlx::Error> {
        sqlx::query_as::<_, Storie>(&format!("SELECT {STORIE_COLUMNS} FROM storie WHERE id = $1"))
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn latest(pool: &PgPool, limit: i64) -> Result<Vec<Storie>, sqlx::Error> {
        sqlx::query_as::<_, Storie>(&format!(
            "SELECT {STORIE_COLUMNS} FROM storie ORDER BY timestamp DESC, id DESC LIMIT $1"
        ))
        .bind(limit)
        .fetch_all(pool)
        .await
    }

    pub async fn update(
        pool: &PgPool,
        id: i32,
        changes: StorieChanges,
    ) -> Result<Option<Storie>, sqlx::Error> {
        sqlx::query_as::<_, Storie>(&format!(
            r#"
            UPDATE storie
            SET fullname = $1, status = $2, content = $3, image = COALESCE($4, image)
            WHERE id = $5
            RETURNING {STORIE_COLUMNS}
            "#
        ))
        .bind(changes.fullname)
        .bind(changes.status)
        .bind(changes.content)
        .bind(changes.image)
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    pub async fn delete(pool: &PgPool, id: i32) -> Result<Option<Storie>, sqlx::Error> {
        sqlx::query_as::<_, Storie>(&format!(
            "DELETE FROM storie WHERE id = $1 RETURNING {STORIE_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await
    }
}
