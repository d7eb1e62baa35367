pub mod database;
pub mod database_content;
pub mod database_subscriptions;
pub mod database_users;
pub mod time;

pub use database::{Database, RequestLog};
