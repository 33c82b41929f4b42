use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgPool};

const CONTACT_COLUMNS: &str = "id, message, phone, email, subject, fullname, timestamp";

/// 联系表单的主题选项
pub const SUBJECT_CHOICES: [(i32, &str); 4] = [
    (1, "Je souhaite prendre un rendez-vous avec toi"),
    (2, "J'aimerais plus d'informations sur tes prestations"),
    (3, "Pourais-je avoir des d'informations sur tes séances de formations"),
    (4, "J'aimerais t'engager sur un projet"),
];

pub fn subject_label(choice: i32) -> Option<&'static str> {
    SUBJECT_CHOICES
        .iter()
        .find(|(id, _)| *id == choice)
        .map(|(_, label)| *label)
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Contact {
    pub id: i32,
    pub message: String,
    pub phone: String,
    pub email: String,
    pub subject: String,
    pub fullname: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewContact {
    pub message: String,
    pub phone: String,
    pub email: String,
    pub subject: String,
    pub fullname: String,
}

impl Contact {
    pub async fn create(pool: &PgPool, new: NewContact) -> Result<Contact, sqlx::Error> {
        sqlx::query_as::<_, Contact>(&format!(
            r#"
            INSERT INTO contact (message, phone, email, subject, fullname, timestamp)
            VALUES ($1, $2, $3, $4, $5, NOW())
            RETURNING {CONTACT_COLUMNS}
            "#
        ))
        .bind(new.message)
        .bind(new.phone)
        .bind(new.email.to_lowercase())
        .bind(new.subject)
        .bind(new.fullname)
        .fetch_one(pool)
        .await
    }

    pub async fn latest(pool: &PgPool, limit: i64) -> Result<Vec<Contact>, sqlx::Error> {
        sqlx::query_as::<_, Contact>(&format!(
            "SELECT {CONTACT_COLUMNS} FROM contact ORDER BY timestamp DESC, id DESC LIMIT $1"
        ))
        .bind(limit)
        .fetch_all(pool)
        .await
    }

    pub async fn delete(pool: &PgPool, id: i32) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM contact WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subject_labels() {
        assert_eq!(subject_label(4), Some("J'aimerais t'engager sur un projet"));
        assert_eq!(subject_label(0), None);
        assert_eq!(subject_label(5), None);
    }
}
