//! Database health checks
//!
//! Pool, query-performance, storage and migration status over a
//! `DatabaseProbe` seam. The production probe introspects a SeaORM
//! connection; tests substitute a stub. Driver errors never escape the
//! public methods: every failure maps to a critical result with a message.

use crate::config::DatabaseThresholds;
use crate::monitoring::types::{ComponentHealth, HealthStatus, StatusSummary};
use crate::utils::error::{HealthError, Result};
use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Connection pool counters
#[derive(Debug, Clone, Copy, Serialize)]
pub struct PoolStats {
    pub size: u32,
    pub max_size: u32,
    pub active: u32,
    pub idle: u32,
    pub waiting: u32,
}

/// Best-effort query performance counters
#[derive(Debug, Clone, Copy, Serialize)]
pub struct QueryStats {
    pub avg_query_time_ms: f64,
    pub slow_queries: u64,
    pub cache_hit_rate: f64,
}

/// Storage-level counters
#[derive(Debug, Clone, Copy, Serialize)]
pub struct StorageStats {
    pub database_size_bytes: u64,
    pub table_count: u32,
    pub index_count: u32,
}

/// Migration bookkeeping
#[derive(Debug, Clone, Copy, Serialize)]
pub struct MigrationStats {
    pub applied: u32,
    pub pending: u32,
}

/// Instrumentation seam over the live database driver
#[async_trait]
pub trait DatabaseProbe: Send + Sync {
    /// Execute a trivial liveness query, returning its round-trip time
    async fn ping(&self) -> Result<Duration>;
    /// Read connection pool counters
    async fn pool_stats(&self) -> Result<PoolStats>;
    /// Read query performance counters (best effort)
    async fn query_stats(&self) -> Result<QueryStats>;
    /// Read storage counters (best effort)
    async fn storage_stats(&self) -> Result<StorageStats>;
    /// Read migration bookkeeping
    async fn migration_status(&self) -> Result<MigrationStats>;
}

/// Connection health detail
#[derive(Debug, Clone, Serialize)]
pub struct ConnectionHealth {
    pub status: HealthStatus,
    pub ping_ms: f64,
    pub pool: Option<PoolStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Performance health detail
#[derive(Debug, Clone, Serialize)]
pub struct DatabasePerformance {
    pub status: HealthStatus,
    pub queries: Option<QueryStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Migration health detail
#[derive(Debug, Clone, Serialize)]
pub struct MigrationHealth {
    pub status: HealthStatus,
    pub migrations: Option<MigrationStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Full database health detail
#[derive(Debug, Clone, Serialize)]
pub struct DatabaseHealth {
    pub status: HealthStatus,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub connection: ConnectionHealth,
    pub performance: DatabasePerformance,
    pub storage: Option<StorageStats>,
    pub migrations: MigrationHealth,
}

/// Database health service
pub struct DatabaseHealthService {
    probe: Arc<dyn DatabaseProbe>,
    thresholds: DatabaseThresholds,
}

impl DatabaseHealthService {
    /// Create the database leaf over a probe implementation
    pub fn new(probe: Arc<dyn DatabaseProbe>, thresholds: DatabaseThresholds) -> Self {
        Self { probe, thresholds }
    }

    /// Coarse status plus a one-line message
    pub async fn get_database_status(&self) -> StatusSummary {
        let connection = self.get_connection_health().await;
        let message = match connection.status {
            HealthStatus::Healthy => format!("Database reachable ({:.1}ms)", connection.ping_ms),
            HealthStatus::Degraded => "Database pool under pressure".to_string(),
            _ => connection
                .error
                .clone()
                .unwrap_or_else(|| "Database unreachable".to_string()),
        };
        StatusSummary {
            status: connection.status,
            message,
        }
    }

    /// Pool liveness and saturation
    pub async fn get_connection_health(&self) -> ConnectionHealth {
        let ping_ms = match self.probe.ping().await {
            Ok(elapsed) => elapsed.as_secs_f64() * 1000.0,
            Err(e) => {
                warn!("database liveness ping failed: {}", e);
                return ConnectionHealth {
                    status: HealthStatus::Critical,
                    ping_ms: 0.0,
                    pool: None,
                    error: Some(e.to_string()),
                };
            }
        };

        match self.probe.pool_stats().await {
            Ok(pool) => {
                let saturated = pool.max_size > 0
                    && pool.size as f64 >= pool.max_size as f64 * self.thresholds.pool_saturation;
                let status = if pool.waiting > self.thresholds.max_waiting_clients || saturated {
                    HealthStatus::Degraded
                } else {
                    HealthStatus::Healthy
                };
                debug!(ping_ms, pool_size = pool.size, waiting = pool.waiting, "database pool sampled");
                ConnectionHealth {
                    status,
                    ping_ms,
                    pool: Some(pool),
                    error: None,
                }
            }
            // Pool introspection failing while the ping succeeds is a
            // visibility problem, not an outage
            Err(e) => ConnectionHealth {
                status: HealthStatus::Unknown,
                ping_ms,
                pool: None,
                error: Some(e.to_string()),
            },
        }
    }

    /// Query timing and cache hit rate, best effort
    pub async fn get_performance_metrics(&self) -> DatabasePerformance {
        match self.probe.query_stats().await {
            Ok(queries) => DatabasePerformance {
                status: HealthStatus::from_breach(
                    queries.avg_query_time_ms,
                    self.thresholds.avg_query_time_ms.warn,
                    self.thresholds.avg_query_time_ms.critical,
                ),
                queries: Some(queries),
                error: None,
            },
            Err(e) => DatabasePerformance {
                status: HealthStatus::Unknown,
                queries: None,
                error: Some(e.to_string()),
            },
        }
    }

    /// Pending-migrations marker check
    pub async fn get_migration_status(&self) -> MigrationHealth {
        match self.probe.migration_status().await {
            Ok(migrations) => MigrationHealth {
                status: if migrations.pending > 0 {
                    HealthStatus::Degraded
                } else {
                    HealthStatus::Healthy
                },
                migrations: Some(migrations),
                error: None,
            },
            Err(e) => MigrationHealth {
                status: HealthStatus::Unknown,
                migrations: None,
                error: Some(e.to_string()),
            },
        }
    }

    /// Full detail across connection, performance, storage and migrations
    pub async fn get_detailed_database_health(&self) -> DatabaseHealth {
        let connection = self.get_connection_health().await;
        let performance = self.get_performance_metrics().await;
        let storage = self.probe.storage_stats().await.ok();
        let migrations = self.get_migration_status().await;

        let status = HealthStatus::combine([
            connection.status,
            performance.status,
            migrations.status,
        ]);

        DatabaseHealth {
            status,
            timestamp: chrono::Utc::now(),
            connection,
            performance,
            storage,
            migrations,
        }
    }

    /// Aggregation entry point
    pub async fn check(&self) -> ComponentHealth {
        let detail = self.get_detailed_database_health().await;
        let message = match detail.status {
            HealthStatus::Healthy => "Database healthy".to_string(),
            _ => detail
                .connection
                .error
                .clone()
                .unwrap_or_else(|| format!("Database {}", detail.status)),
        };
        ComponentHealth::new("database", detail.status, message, &detail)
    }
}

/// Production probe over a SeaORM Postgres connection
pub struct SeaOrmProbe {
    db: sea_orm::DatabaseConnection,
    max_connections: u32,
}

impl SeaOrmProbe {
    /// Wrap a live connection; `max_connections` mirrors the pool options
    pub fn new(db: sea_orm::DatabaseConnection, max_connections: u32) -> Self {
        Self { db, max_connections }
    }

    async fn scalar_i64(&self, sql: &str) -> Result<i64> {
        use sea_orm::{ConnectionTrait, DbBackend, Statement};
        let row = self
            .db
            .query_one(Statement::from_string(DbBackend::Postgres, sql.to_owned()))
            .await?
            .ok_or_else(|| HealthError::Probe(format!("empty result for: {}", sql)))?;
        row.try_get_by_index::<i64>(0)
            .map_err(HealthError::Database)
    }
}

#[async_trait]
impl DatabaseProbe for SeaOrmProbe {
    async fn ping(&self) -> Result<Duration> {
        let started = Instant::now();
        self.db.ping().await?;
        Ok(started.elapsed())
    }

    async fn pool_stats(&self) -> Result<PoolStats> {
        let pool = self.db.get_postgres_connection_pool();
        let size = pool.size();
        let idle = pool.num_idle() as u32;
        // sqlx has no waiting-acquirers gauge; derive it from server-side
        // client-wait states instead
        let waiting = self
            .scalar_i64(
                "SELECT count(*) FROM pg_stat_activity \
                 WHERE datname = current_database() AND wait_event_type = 'Client'",
            )
            .await
            .unwrap_or(0) as u32;

        Ok(PoolStats {
            size,
            max_size: self.max_connections,
            active: size.saturating_sub(idle),
            idle,
            waiting,
        })
    }

    async fn query_stats(&self) -> Result<QueryStats> {
        // blks_hit/blks_read come from pg_stat_database and are always
        // available; pg_stat_statements often is not, so timing stays 0
        // unless the extension answers
        use sea_orm::{ConnectionTrait, DbBackend, Statement};
        let row = self
            .db
            .query_one(Statement::from_string(
                DbBackend::Postgres,
                "SELECT blks_hit::float8 AS hit, blks_read::float8 AS read \
                 FROM pg_stat_database WHERE datname = current_database()"
                    .to_owned(),
            ))
            .await?
            .ok_or_else(|| HealthError::Probe("pg_stat_database returned no row".to_string()))?;

        let hit: f64 = row.try_get("", "hit").map_err(HealthError::Database)?;
        let read: f64 = row.try_get("", "read").map_err(HealthError::Database)?;
        let cache_hit_rate = if hit + read > 0.0 {
            hit / (hit + read) * 100.0
        } else {
            0.0
        };

        let (avg_query_time_ms, slow_queries) = match self
            .db
            .query_one(Statement::from_string(
                DbBackend::Postgres,
                "SELECT coalesce(avg(mean_exec_time), 0)::float8 AS avg_ms, \
                        count(*) FILTER (WHERE mean_exec_time > 500) AS slow \
                 FROM pg_stat_statements"
                    .to_owned(),
            ))
            .await
        {
            Ok(Some(row)) => {
                let avg: f64 = row.try_get("", "avg_ms").unwrap_or(0.0);
                let slow: i64 = row.try_get("", "slow").unwrap_or(0);
                (avg, slow as u64)
            }
            _ => (0.0, 0),
        };

        Ok(QueryStats {
            avg_query_time_ms,
            slow_queries,
            cache_hit_rate,
        })
    }

    async fn storage_stats(&self) -> Result<StorageStats> {
        let size = self
            .scalar_i64("SELECT pg_database_size(current_database())")
            .await?;
        let tables = self
            .scalar_i64(
                "SELECT count(*) FROM information_schema.tables WHERE table_schema = 'public'",
            )
            .await?;
        let indexes = self
            .scalar_i64("SELECT count(*) FROM pg_indexes WHERE schemaname = 'public'")
            .await?;

        Ok(StorageStats {
            database_size_bytes: size.max(0) as u64,
            table_count: tables.max(0) as u32,
            index_count: indexes.max(0) as u32,
        })
    }

    async fn migration_status(&self) -> Result<MigrationStats> {
        let marker_exists = self
            .scalar_i64(
                "SELECT count(*) FROM information_schema.tables \
                 WHERE table_name = 'pending_migrations'",
            )
            .await?;

        let pending = if marker_exists > 0 {
            self.scalar_i64("SELECT count(*) FROM pending_migrations")
                .await
                .unwrap_or(0)
        } else {
            0
        };

        let migration_table = self
            .scalar_i64(
                "SELECT count(*) FROM information_schema.tables \
                 WHERE table_name = 'seaql_migrations'",
            )
            .await?;
        let applied = if migration_table > 0 {
            self.scalar_i64("SELECT count(*) FROM seaql_migrations")
                .await
                .unwrap_or(0)
        } else {
            0
        };

        Ok(MigrationStats {
            applied: applied.max(0) as u32,
            pending: pending.max(0) as u32,
        })
    }
}
