use serde::Serialize;
use sqlx::{FromRow, PgExecutor, PgPool};

use super::flags::{FlagSet, Permission, Seeded};

pub const ADMIN_ROLE: &str = "Administrateur";
pub const MODERATOR_ROLE: &str = "Moderateur";
// 注册开放且默认角色为管理员：任何注册用户都是管理员
pub const DEFAULT_ROLE: &str = ADMIN_ROLE;

/// 角色种子表：名称 -> 权限列表
pub const ROLE_SEEDS: &[(&str, &[Permission])] = &[
    (MODERATOR_ROLE, &[Permission::MODERATE]),
    (ADMIN_ROLE, &[Permission::ADMIN]),
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct Role {
    pub id: i32,
    pub name: String,
    pub permissions: i32,
    pub is_default: bool,
}

impl FlagSet for Role {
    type Flag = Permission;

    fn bits(&self) -> i32 {
        self.permissions
    }

    fn bits_mut(&mut self) -> &mut i32 {
        &mut self.permissions
    }
}

impl Seeded for Role {
    fn is_default(&self) -> bool {
        self.is_default
    }

    fn set_default(&mut self, is_default: bool) {
        self.is_default = is_default;
    }
}

impl Role {
    /// 尚未入库的新角色（id 为 0）
    pub fn new(name: &str) -> Self {
        Self {
            id: 0,
            name: name.to_string(),
            permissions: 0,
            is_default: false,
        }
    }

    pub fn is_persisted(&self) -> bool {
        self.id != 0
    }

    /// 按种子表计算一条角色记录：已存在则在原记录上重置，否则新建
    pub fn seeded(
        existing: Option<Role>,
        name: &str,
        perms: &[Permission],
        default_name: &str,
    ) -> Self {
        let mut role = existing.unwrap_or_else(|| Role::new(name));
        role.apply_seed(perms, name == default_name);
        role
    }

    /// 初始化角色（可重复执行）
    pub async fn insert_roles(pool: &PgPool) -> Result<Vec<Role>, sqlx::Error> {
        Self::insert_roles_from(pool, ROLE_SEEDS, DEFAULT_ROLE).await
    }

    pub async fn insert_roles_from(
        pool: &PgPool,
        seeds: &[(&str, &[Permission])],
        default_name: &str,
    ) -> Result<Vec<Role>, sqlx::Error> {
        let mut tx = pool.begin().await?;
        let mut roles = Vec::with_capacity(seeds.len());

        // 全局只保留一个默认角色
        sqlx::query("UPDATE roles SET is_default = FALSE WHERE name <> $1")
            .bind(default_name)
            .execute(&mut *tx)
            .await?;

        for (name, perms) in seeds {
            let existing = Self::find_by_name(&mut *tx, name).await?;
            let role = Self::seeded(existing, name, perms, default_name);
            roles.push(role.save(&mut *tx).await?);
        }

        tx.commit().await?;
        tracing::info!("Seeded {} roles (default: {})", roles.len(), default_name);
        Ok(roles)
    }

    /// 按名称插入或更新
    pub async fn save<'e, E: PgExecutor<'e>>(&self, executor: E) -> Result<Role, sqlx::Error> {
        sqlx::query_as::<_, Role>(
            r#"
            INSERT INTO roles (name, permissions, is_default)
            VALUES ($1, $2, $3)
            ON CONFLICT (name) DO UPDATE
            SET permissions = EXCLUDED.permissions, is_default = EXCLUDED.is_default
            RETURNING id, name, permissions, is_default
            "#,
        )
        .bind(&self.name)
        .bind(self.permissions)
        .bind(self.is_default)
        .fetch_one(executor)
        .await
    }

    pub async fn find_by_id<'e, E: PgExecutor<'e>>(
        executor: E,
        id: i32,
    ) -> Result<Option<Role>, sqlx::Error> {
        sqlx::query_as::<_, Role>(
            "SELECT id, name, permissions, is_default FROM roles WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(executor)
        .await
    }

    pub async fn find_by_name<'e, E: PgExecutor<'e>>(
        executor: E,
        name: &str,
    ) -> Result<Option<Role>, sqlx::Error> {
        sqlx::query_as::<_, Role>(
            "SELECT id, name, permissions, is_default FROM roles WHERE name = $1",
        )
        .bind(name)
        .fetch_optional(executor)
        .await
    }

    pub async fn find_default<'e, E: PgExecutor<'e>>(
        executor: E,
    ) -> Result<Option<Role>, sqlx::Error> {
        sqlx::query_as::<_, Role>(
            "SELECT id, name, permissions, is_default FROM roles \
             WHERE is_default ORDER BY id LIMIT 1",
        )
        .fetch_optional(executor)
        .await
    }

    pub async fn list(pool: &PgPool) -> Result<Vec<Role>, sqlx::Error> {
        sqlx::query_as::<_, Role>(
            "SELECT id, name, permissions, is_default FROM roles ORDER BY name",
        )
        .fetch_all(pool)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seed_all(existing: &[Role]) -> Vec<Role> {
        ROLE_SEEDS
            .iter()
            .map(|(name, perms)| {
                let found = existing.iter().find(|r| r.name == *name).cloned();
                Role::seeded(found, name, perms, DEFAULT_ROLE)
            })
            .collect()
    }

    #[test]
    fn administrator_seed_is_default_admin() {
        let role = Role::seeded(None, ADMIN_ROLE, &[Permission::ADMIN], ADMIN_ROLE);
        assert!(role.has(Permission::ADMIN));
        assert!(role.is_default);
        assert!(!role.is_persisted());
    }

    #[test]
    fn seeding_twice_matches_seeding_once() {
        let once = seed_all(&[]);
        let twice = seed_all(&once);
        assert_eq!(once, twice);
        assert_eq!(twice.iter().filter(|r| r.is_default).count(), 1);
    }

    #[test]
    fn reseed_overwrites_drifted_permissions() {
        let drifted = Role {
            id: 3,
            name: MODERATOR_ROLE.into(),
            permissions: Permission::all().bits(),
            is_default: true,
        };
        let role = Role::seeded(
            Some(drifted),
            MODERATOR_ROLE,
            &[Permission::MODERATE],
            DEFAULT_ROLE,
        );
        assert_eq!(role.id, 3);
        assert_eq!(role.flags(), Permission::MODERATE);
        assert!(!role.has(Permission::ADMIN));
        assert!(!role.is_default);
    }

    #[test]
    fn moderator_is_not_admin() {
        let moderator = Role::seeded(None, MODERATOR_ROLE, &[Permission::MODERATE], DEFAULT_ROLE);
        assert!(moderator.has(Permission::MODERATE));
        assert!(!moderator.has(Permission::ADMIN));
    }

    #[test]
    fn default_role_carries_admin() {
        let roles: Vec<Role> = ROLE_SEEDS
            .iter()
            .map(|(name, perms)| Role::seeded(None, name, perms, DEFAULT_ROLE))
            .collect();
        let default = roles.iter().find(|r| r.is_default).unwrap();
        assert_eq!(default.name, ADMIN_ROLE);
        assert!(default.has(Permission::ADMIN));
    }
}
