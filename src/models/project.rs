use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgPool};

const PROJECT_COLUMNS: &str = "id, name, image, timestamp, category_id, user_id";

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Project {
    pub id: i32,
    pub name: String,
    pub image: String,
    pub timestamp: DateTime<Utc>,
    pub category_id: i32,
    pub user_id: i32,
}

#[derive(Debug, Clone)]
pub struct NewProject {
    pub name: String,
    pub image: String,
    pub category_id: i32,
    pub user_id: i32,
}

/// 允许修改的字段；image 为 None 时保留原图
#[derive(Debug, Clone)]
pub struct ProjectChanges {
    pub name: String,
    pub category_id: i32,
    pub image: Option<String>,
}

impl Project {
    pub async fn create(pool: &PgPool, new: NewProject) -> Result<Project, sqlx::Error> {
        sqlx::query_as::<_, Project>(&format!(
            r#"
            INSERT INTO project (name, image, category_id, user_id, timestamp)
            VALUES ($1, $2, $3, $4, NOW())
            RETURNING {PROJECT_COLUMNS}
            "#
        ))
        .bind(new.name)
        .bind(new.image)
        .bind(new.category_id)
        .bind(new.user_id)
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_id(pool: &PgPool, id: i32) -> Result<Option<Project>, sqlx::Error> {
        sqlx::query_as::<_, Project>(&format!(
            "SELECT {PROJECT_COLUMNS} FROM project WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// 最新的若干个项目
    pub async fn latest(pool: &PgPool, limit: i64) -> Result<Vec<Project>, sqlx::Error> {
        sqlx::query_as::<_, Project>(&format!(
            "SELECT {PROJECT_COLUMNS} FROM project ORDER BY timestamp DESC, id DESC LIMIT $1"
        ))
        .bind(limit)
        .fetch_all(pool)
        .await
    }

    pub async fn update(
        pool: &PgPool,
        id: i32,
        changes: ProjectChanges,
    ) -> Result<Option<Project>, sqlx::Error> {
        sqlx::query_as::<_, Project>(&format!(
            r#"
            UPDATE project
            SET name = $1, category_id = $2, image = COALESCE($3, image)
            WHERE id = $4
            RETURNING {PROJECT_COLUMNS}
            "#
        ))
        .bind(changes.name)
        .bind(changes.category_id)
        .bind(changes.image)
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// 删除并返回被删记录（用于清理图片）
    pub async fn delete(pool: &PgPool, id: i32) -> Result<Option<Project>, sqlx::Error> {
        sqlx::query_as::<_, Project>(&format!(
            "DELETE FROM project WHERE id = $1 RETURNING {PROJECT_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await
    }
}
