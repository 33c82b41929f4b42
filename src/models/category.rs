use serde::Serialize;
use sqlx::{FromRow, PgExecutor, PgPool};

use super::flags::{CategoryKind, FlagSet, Seeded};

pub const DEFAULT_CATEGORY: &str = "Développement Web";

pub const CATEGORY_SEEDS: &[(&str, &[CategoryKind])] = &[
    ("Création graphique", &[CategoryKind::DESIGN]),
    ("Développement Web", &[CategoryKind::DEV_WEB]),
    ("Coaching & Formation", &[CategoryKind::FORMATION]),
    ("Développement Mobile", &[CategoryKind::DEV_MOBILE]),
    ("Développement Logiciel", &[CategoryKind::DEV_LOGICIEL]),
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct Category {
    pub id: i32,
    pub name: String,
    pub categories: i32,
    pub is_default: bool,
}

impl FlagSet for Category {
    type Flag = CategoryKind;

    fn bits(&self) -> i32 {
        self.categories
    }

    fn bits_mut(&mut self) -> &mut i32 {
        &mut self.categories
    }
}

impl Seeded for Category {
    fn is_default(&self) -> bool {
        self.is_default
    }

    fn set_default(&mut self, is_default: bool) {
        self.is_default = is_default;
    }
}

impl Category {
    pub fn new(name: &str) -> Self {
        Self {
            id: 0,
            name: name.to_string(),
            categories: 0,
            is_default: false,
        }
    }

    pub fn seeded(
        existing: Option<Category>,
        name: &str,
        kinds: &[CategoryKind],
        default_name: &str,
    ) -> Self {
        let mut category = existing.unwrap_or_else(|| Category::new(name));
        category.apply_seed(kinds, name == default_name);
        category
    }

    /// 初始化项目分类（可重复执行）
    pub async fn insert_categories(pool: &PgPool) -> Result<Vec<Category>, sqlx::Error> {
        let mut tx = pool.begin().await?;
        let mut categories = Vec::with_capacity(CATEGORY_SEEDS.len());

        sqlx::query("UPDATE category SET is_default = FALSE WHERE name <> $1")
            .bind(DEFAULT_CATEGORY)
            .execute(&mut *tx)
            .await?;

        for (name, kinds) in CATEGORY_SEEDS {
            let existing = Self::find_by_name(&mut *tx, name).await?;
            let category = Self::seeded(existing, name, kinds, DEFAULT_CATEGORY);
            categories.push(category.save(&mut *tx).await?);
        }

        tx.commit().await?;
        tracing::info!("Seeded {} categories", categories.len());
        Ok(categories)
    }

    pub async fn save<'e, E: PgExecutor<'e>>(&self, executor: E) -> Result<Category, sqlx::Error> {
        sqlx::query_as::<_, Category>(
            r#"
            INSERT INTO category (name, categories, is_default)
            VALUES ($1, $2, $3)
            ON CONFLICT (name) DO UPDATE
            SET categories = EXCLUDED.categories, is_default = EXCLUDED.is_default
            RETURNING id, name, categories, is_default
            "#,
        )
        .bind(&self.name)
        .bind(self.categories)
        .bind(self.is_default)
        .fetch_one(executor)
        .await
    }

    pub async fn find_by_id<'e, E: PgExecutor<'e>>(
        executor: E,
        id: i32,
    ) -> Result<Option<Category>, sqlx::Error> {
        sqlx::query_as::<_, Category>(
            "SELECT id, name, categories, is_default FROM category WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(executor)
        .await
    }

    pub async fn find_by_name<'e, E: PgExecutor<'e>>(
        executor: E,
        name: &str,
    ) -> Result<Option<Category>, sqlx::Error> {
        sqlx::query_as::<_, Category>(
            "SELECT id, name, categories, is_default FROM category WHERE name = $1",
        )
        .bind(name)
        .fetch_optional(executor)
        .await
    }

    /// 全部分类，按 id 倒序
    pub async fn list(pool: &PgPool) -> Result<Vec<Category>, sqlx::Error> {
        sqlx::query_as::<_, Category>(
            "SELECT id, name, categories, is_default FROM category ORDER BY id DESC",
        )
        .fetch_all(pool)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_seed_gets_its_own_kind() {
        let seeded: Vec<Category> = CATEGORY_SEEDS
            .iter()
            .map(|(name, kinds)| Category::seeded(None, name, kinds, DEFAULT_CATEGORY))
            .collect();

        let mut seen = 0;
        for category in &seeded {
            assert_eq!(category.categories.count_ones(), 1, "{}", category.name);
            assert_eq!(seen & category.categories, 0);
            seen |= category.categories;
        }
        let defaults: Vec<_> = seeded.iter().filter(|c| c.is_default).collect();
        assert_eq!(defaults.len(), 1);
        assert_eq!(defaults[0].name, DEFAULT_CATEGORY);
        assert!(defaults[0].has(CategoryKind::DEV_WEB));
    }

    #[test]
    fn reseeding_is_idempotent() {
        let first = Category::seeded(
            None,
            "Développement Mobile",
            &[CategoryKind::DEV_MOBILE],
            DEFAULT_CATEGORY,
        );
        let second = Category::seeded(
            Some(first.clone()),
            "Développement Mobile",
            &[CategoryKind::DEV_MOBILE],
            DEFAULT_CATEGORY,
        );
        assert_eq!(first, second);
    }
}
