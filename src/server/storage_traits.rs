use async_trait::async_trait;

use crate::error::MembershipError;
use crate::logging::{Database, RequestLog};

// 日志存储抽象（可由 SQLite、Postgres 等实现）
#[async_trait]
pub trait RequestLogStore: Send + Sync {
    async fn log_request(&self, log: RequestLog) -> Result<i64, MembershipError>;
}

#[async_trait]
impl RequestLogStore for Database {
    async fn log_request(&self, log: RequestLog) -> Result<i64, MembershipError> {
        Ok(Database::log_request(self, log).await?)
    }
}
