use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgPool};

const CLIENT_COLUMNS: &str = "id, name, image, timestamp, user_id";

/// 合作客户（logo 墙），存于 partner 表
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Client {
    pub id: i32,
    pub name: String,
    pub image: String,
    pub timestamp: DateTime<Utc>,
    pub user_id: i32,
}

#[derive(Debug, Clone)]
pub struct NewClient {
    pub name: String,
    pub image: String,
    pub user_id: i32,
}

#[derive(Debug, Clone)]
pub struct ClientChanges {
    pub name: String,
    pub image: Option<String>,
}

impl Client {
    pub async fn create(pool: &PgPool, new: NewClient) -> Result<Client, sqlx::Error> {
        sqlx::query_as::<_, Client>(&format!(
            r#"
            INSERT INTO partner (name, image, user_id, timestamp)
            VALUES ($1, $2, $3, NOW())
            RETURNING {CLIENT_COLUMNS}
            "#
        ))
        .bind(new.name)
        .bind(new.image)
        .bind(new.user_id)
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_id(pool: &PgPool, id: i32) -> Result<Option<Client>, sqlx::Error> {
        sqlx::query_as::<_, Client>(&format!("SELECT {CLIENT_COLUMNS} FROM partner WHERE id = $1"))
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn latest(pool: &PgPool, limit: i64) -> Result<Vec<Client>, sqlx::Error> {
        sqlx::query_as::<_, Client>(&format!(
            "SELECT {CLIENT_COLUMNS} FROM partner ORDER BY timestamp DESC, id DESC LIMIT $1"
        ))
        .bind(limit)
        .fetch_all(pool)
        .await
    }

    pub async fn update(
        pool: &PgPool,
        id: i32,
        changes: ClientChanges,
    ) -> Result<Option<Client>, sqlx::Error> {
        sqlx::query_as::<_, Client>(&format!(
            r#"
            UPDATE partner
            SET name = $1, image = COALESCE($2, image)
            WHERE id = $3
            RETURNING {CLIENT_COLUMNS}
            "#
        ))
        .bind(changes.name)
        .bind(changes.image)
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    pub async fn delete(pool: &PgPool, id: i32) -> Result<Option<Client>, sqlx::Error> {
        sqlx::query_as::<_, Client>(&format!(
            "DELETE FROM partner WHERE id = $1 RETURNING {CLIENT_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await
    }
}
