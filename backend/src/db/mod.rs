pub mod sqlite;
pub mod tables;

pub use sqlite::{Database, DbConn};
pub use tables::request_logs::{NewRequestLog, RequestLog, ServiceStats, UsageStats};
