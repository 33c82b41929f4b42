pub mod category;
pub mod client;
pub mod contact;
pub mod flags;
pub mod project;
pub mod role;
pub mod storie;
pub mod user;

pub use category::Category;
pub use client::Client;
pub use contact::Contact;
pub use flags::{CategoryKind, FlagSet, Permission, Seeded};
pub use project::Project;
pub use role::Role;
pub use storie::Storie;
pub use user::User;

/// 首页等处展示的最新记录条数
pub const LATEST_LIMIT: i64 = 8;
