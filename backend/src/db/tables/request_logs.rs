//! Usage accounting - one row per completed inference call, plus the
//! aggregates the stats dashboard polls.

use chrono::{Duration, Utc};
use rusqlite::Result as SqliteResult;
use serde::Serialize;
use std::collections::BTreeMap;

use super::super::Database;

#[derive(Debug, Clone)]
pub struct NewRequestLog {
    pub endpoint: String,
    pub service: String,
    pub price_usdc: f64,
    pub input_length: i64,
    pub output_length: i64,
    pub duration_ms: i64,
    pub paid: i64,
}

#[derive(Debug, Serialize)]
pub struct RequestLog {
    pub id: i64,
    pub endpoint: String,
    pub service: String,
    pub price_usdc: f64,
    pub input_length: i64,
    pub output_length: i64,
    pub duration_ms: i64,
    pub paid: i64,
    pub created_at: String,
}

#[derive(Debug, Serialize)]
pub struct ServiceStats {
    pub calls: i64,
    pub earned: f64,
}

#[derive(Debug, Serialize)]
pub struct UsageStats {
    pub total_requests: i64,
    pub total_earned: f64,
    pub by_service: BTreeMap<String, ServiceStats>,
    pub last_24h: i64,
}

impl Database {
    pub fn insert_request_log(&self, log: &NewRequestLog) -> SqliteResult<i64> {
        let conn = self.conn();
        conn.execute(
            "INSERT INTO request_logs
                (endpoint, service, price_usdc, input_length, output_length, duration_ms, paid, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            rusqlite::params![
                log.endpoint,
                log.service,
                log.price_usdc,
                log.input_length,
                log.output_length,
                log.duration_ms,
                log.paid,
                Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn get_stats(&self) -> SqliteResult<UsageStats> {
        let conn = self.conn();

        let (total_requests, total_earned): (i64, f64) = conn.query_row(
            "SELECT COUNT(*), COALESCE(SUM(price_usdc), 0) FROM request_logs",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;

        let mut by_service = BTreeMap::new();
        let mut stmt = conn.prepare(
            "SELECT service, COUNT(*), COALESCE(SUM(price_usdc), 0)
             FROM request_logs GROUP BY service",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                ServiceStats {
                    calls: row.get(1)?,
                    earned: row.get(2)?,
                },
            ))
        })?;
        for row in rows {
            let (service, stats) = row?;
            by_service.insert(service, stats);
        }

        // RFC 3339 UTC timestamps compare lexicographically.
        let cutoff = (Utc::now() - Duration::hours(24)).to_rfc3339();
        let last_24h: i64 = conn.query_row(
            "SELECT COUNT(*) FROM request_logs WHERE created_at > ?1",
            [cutoff],
            |row| row.get(0),
        )?;

        Ok(UsageStats {
            total_requests,
            total_earned,
            by_service,
            last_24h,
        })
    }

    pub fn get_recent_logs(&self, limit: i64) -> SqliteResult<Vec<RequestLog>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT id, endpoint, service, price_usdc, input_length, output_length,
                    duration_ms, paid, created_at
             FROM request_logs ORDER BY created_at DESC, id DESC LIMIT ?1",
        )?;

        let logs = stmt
            .query_map([limit], |row| {
                Ok(RequestLog {
                    id: row.get(0)?,
                    endpoint: row.get(1)?,
                    service: row.get(2)?,
                    price_usdc: row.get(3)?,
                    input_length: row.get(4)?,
                    output_length: row.get(5)?,
                    duration_ms: row.get(6)?,
                    paid: row.get(7)?,
                    created_at: row.get(8)?,
                })
            })?
            .filter_map(|r| r.ok())
            .collect();
        Ok(logs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_db() -> (Database, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.db");
        let db = Database::new(path.to_str().unwrap()).unwrap();
        (db, dir)
    }

    fn sample_log(service: &str, price: f64, paid: i64) -> NewRequestLog {
        NewRequestLog {
            endpoint: format!("/api/{}", service),
            service: service.to_string(),
            price_usdc: price,
            input_length: 120,
            output_length: 480,
            duration_ms: 900,
            paid,
        }
    }

    #[test]
    fn test_insert_and_recent_order() {
        let (db, _dir) = test_db();
        let first = db.insert_request_log(&sample_log("summarize", 0.005, 0)).unwrap();
        let second = db.insert_request_log(&sample_log("translate", 0.003, 1)).unwrap();
        assert!(second > first);

        let recent = db.get_recent_logs(10).unwrap();
        assert_eq!(recent.len(), 2);
        // Newest first
        assert_eq!(recent[0].service, "translate");
        assert_eq!(recent[0].paid, 1);
        assert_eq!(recent[1].service, "summarize");
    }

    #[test]
    fn test_stats_aggregation() {
        let (db, _dir) = test_db();
        db.insert_request_log(&sample_log("summarize", 0.005, 0)).unwrap();
        db.insert_request_log(&sample_log("summarize", 0.005, 1)).unwrap();
        db.insert_request_log(&sample_log("code-review", 0.02, 1)).unwrap();

        let stats = db.get_stats().unwrap();
        assert_eq!(stats.total_requests, 3);
        assert!((stats.total_earned - 0.03).abs() < 1e-9);
        assert_eq!(stats.last_24h, 3);

        let summarize = &stats.by_service["summarize"];
        assert_eq!(summarize.calls, 2);
        assert!((summarize.earned - 0.01).abs() < 1e-9);
        assert_eq!(stats.by_service["code-review"].calls, 1);
    }

    #[test]
    fn test_empty_stats() {
        let (db, _dir) = test_db();
        let stats = db.get_stats().unwrap();
        assert_eq!(stats.total_requests, 0);
        assert_eq!(stats.total_earned, 0.0);
        assert!(stats.by_service.is_empty());
    }

    #[test]
    fn test_recent_limit() {
        let (db, _dir) = test_db();
        for _ in 0..5 {
            db.insert_request_log(&sample_log("explain", 0.005, 0)).unwrap();
        }
        assert_eq!(db.get_recent_logs(3).unwrap().len(), 3);
    }
}
