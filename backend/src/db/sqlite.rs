use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use std::fs;
use std::path::Path;

pub type DbConn = r2d2::PooledConnection<SqliteConnectionManager>;

/// SQLite-backed usage store behind an r2d2 connection pool.
pub struct Database {
    pool: Pool<SqliteConnectionManager>,
}

impl Database {
    pub fn new(path: &str) -> Result<Self, String> {
        if let Some(dir) = Path::new(path).parent() {
            if !dir.as_os_str().is_empty() {
                fs::create_dir_all(dir)
                    .map_err(|e| format!("Failed to create database directory: {}", e))?;
            }
        }

        let manager = SqliteConnectionManager::file(path);
        let pool = Pool::new(manager).map_err(|e| format!("Failed to create pool: {}", e))?;

        let db = Self { pool };
        db.init_schema()?;
        Ok(db)
    }

    /// Checkout a pooled connection. Pool exhaustion here means the process
    /// is wedged; treat it as fatal.
    pub fn conn(&self) -> DbConn {
        self.pool.get().expect("Failed to get database connection")
    }

    fn init_schema(&self) -> Result<(), String> {
        self.conn()
            .execute_batch(
                "CREATE TABLE IF NOT EXISTS request_logs (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    endpoint TEXT NOT NULL,
                    service TEXT NOT NULL,
                    price_usdc REAL NOT NULL,
                    input_length INTEGER NOT NULL DEFAULT 0,
                    output_length INTEGER NOT NULL DEFAULT 0,
                    duration_ms INTEGER NOT NULL DEFAULT 0,
                    paid INTEGER NOT NULL DEFAULT 0,
                    created_at TEXT NOT NULL
                );
                CREATE INDEX IF NOT EXISTS idx_request_logs_created_at
                    ON request_logs(created_at);
                CREATE INDEX IF NOT EXISTS idx_request_logs_service
                    ON request_logs(service);",
            )
            .map_err(|e| format!("Failed to initialize schema: {}", e))
    }
}
