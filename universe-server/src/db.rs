//! Postgres-backed `CanonicalSink` (spec §6.3), grounded on the teacher's
//! `db/mod.rs` pool setup (deadpool-postgres, `RecyclingMethod::Fast`) but
//! with its own idempotent schema instead of a migration framework, matching
//! the teacher's pattern of owning its schema directly via `CREATE TABLE IF
//! NOT EXISTS` rather than a dependency the teacher itself doesn't lean on
//! for this.

use anyhow::{Context, Result};
use async_trait::async_trait;
use uuid::Uuid;

use universe_core::asset::{Governance, Sector, UniverseAsset};
use universe_core::error::CoreError;
use universe_core::materializer::{CanonicalSink, StagedRow};
use universe_core::tiered::SovereignSource;

use crate::config::DatabaseConfig;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS universe_assets (
    asset_id       uuid PRIMARY KEY,
    symbol         text UNIQUE NOT NULL,
    sector         text NOT NULL,
    morton_code    bigint UNIQUE NOT NULL,
    taxonomy32     bigint NOT NULL,
    meta32         bigint NOT NULL,
    x              real NOT NULL,
    y              real NOT NULL,
    z              real NOT NULL,
    fidelity_score real NOT NULL,
    spin           real NOT NULL,
    vertex_buffer  bytea NOT NULL,
    governance     text NOT NULL,
    last_update    timestamptz NOT NULL DEFAULT now()
);
"#;

pub struct Database {
    pub(crate) pool: deadpool_postgres::Pool,
}

impl Database {
    pub async fn new(config: &DatabaseConfig) -> Result<Self> {
        let pg_config =
            config.url.parse::<tokio_postgres::Config>().context("failed to parse DATABASE_URL")?;
        let manager_config =
            deadpool_postgres::ManagerConfig { recycling_method: deadpool_postgres::RecyclingMethod::Fast };
        let manager = deadpool_postgres::Manager::from_config(pg_config, tokio_postgres::NoTls, manager_config);
        let pool = deadpool_postgres::Pool::builder(manager)
            .max_size(config.max_connections as usize)
            .runtime(deadpool_postgres::Runtime::Tokio1)
            .wait_timeout(Some(config.connection_timeout))
            .create_timeout(Some(config.connection_timeout))
            .build()
            .context("failed to build database pool")?;

        Ok(Self { pool })
    }

    pub async fn run_migrations(&self) -> Result<()> {
        let conn = self.pool.get().await.context("failed to obtain a connection for migrations")?;
        conn.batch_execute(SCHEMA).await.context("failed to apply universe_assets schema")?;
        Ok(())
    }
}

/// Writes a materialized batch into `universe_assets` inside one transaction
/// (§4.F.4 "atomic swap"): truncate-and-reinsert, so a reader never observes
/// a half-written generation.
pub struct PostgresSink<'a> {
    db: &'a Database,
}

impl<'a> PostgresSink<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    async fn swap_async(&mut self, rows: &[StagedRow]) -> Result<(), CoreError> {
        let mut conn = self.db.pool.get().await.map_err(|e| {
            CoreError::SwapAssert { reason: format!("could not obtain db connection: {e}") }
        })?;
        let txn = conn
            .transaction()
            .await
            .map_err(|e| CoreError::SwapAssert { reason: format!("begin failed: {e}") })?;

        txn.execute("TRUNCATE universe_assets", &[])
            .await
            .map_err(|e| CoreError::SwapAssert { reason: format!("truncate failed: {e}") })?;

        let stmt = txn
            .prepare(
                "INSERT INTO universe_assets
                 (asset_id, symbol, sector, morton_code, taxonomy32, meta32, x, y, z,
                  fidelity_score, spin, vertex_buffer, governance)
                 VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11,$12,$13)",
            )
            .await
            .map_err(|e| CoreError::SwapAssert { reason: format!("prepare failed: {e}") })?;

        for row in rows {
            let bytes = row.vertex.to_bytes();
            txn.execute(
                &stmt,
                &[
                    &Uuid::new_v4(),
                    &row.symbol,
                    &row.sector.as_str(),
                    &(row.morton64 as i64),
                    &(row.taxonomy32 as i64),
                    &(row.meta32 as i64),
                    &row.x,
                    &row.y,
                    &row.z,
                    &row.fidelity,
                    &row.spin,
                    &bytes.to_vec(),
                    &"sanctioned",
                ],
            )
            .await
            .map_err(|e| CoreError::SwapAssert { reason: format!("insert failed for {}: {e}", row.symbol) })?;
        }

        txn.commit().await.map_err(|e| CoreError::SwapAssert { reason: format!("commit failed: {e}") })?;
        Ok(())
    }
}

impl<'a> CanonicalSink for PostgresSink<'a> {
    /// `materialize()` is synchronous by contract (§4.F); bridge into the
    /// async pool with `block_in_place` + a handle-local block_on, the same
    /// way the teacher's synchronous call sites reach into deadpool from
    /// non-async code paths.
    fn swap(&mut self, rows: &[StagedRow]) -> Result<(), CoreError> {
        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(self.swap_async(rows))
        })
    }
}

fn sector_from_str(s: &str) -> Sector {
    Sector::ALL.iter().copied().find(|sector| sector.as_str() == s).unwrap_or(Sector::Tech)
}

fn governance_from_str(s: &str) -> Governance {
    match s {
        "provisional" => Governance::Provisional,
        "quarantined" => Governance::Quarantined,
        "archived" => Governance::Archived,
        "blacklisted" => Governance::Blacklisted,
        _ => Governance::Sanctioned,
    }
}

/// The Sovereign tier of the tiered builder (§4.G): reads the canonical
/// relation directly, ordered by `morton_code` so the same stored generation
/// always yields the same truncated view across restarts.
pub struct PostgresSovereignSource {
    pool: deadpool_postgres::Pool,
}

impl PostgresSovereignSource {
    pub fn new(db: &Database) -> Self {
        Self { pool: db.pool.clone() }
    }
}

#[async_trait]
impl SovereignSource for PostgresSovereignSource {
    async fn fetch(&self, limit: usize) -> Result<Vec<UniverseAsset>, CoreError> {
        let conn = self.pool.get().await.map_err(|e| {
            CoreError::SwapAssert { reason: format!("sovereign fetch could not obtain connection: {e}") }
        })?;
        let rows = conn
            .query(
                "SELECT symbol, sector, taxonomy32, meta32, x, y, z, fidelity_score, spin, governance
                 FROM universe_assets ORDER BY morton_code ASC LIMIT $1",
                &[&(limit as i64)],
            )
            .await
            .map_err(|e| CoreError::SwapAssert { reason: format!("sovereign fetch query failed: {e}") })?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let symbol: String = row.get(0);
                UniverseAsset {
                    symbol: symbol.clone(),
                    taxonomy32: row.get::<_, i64>(2) as u32,
                    meta32: row.get::<_, i64>(3) as u32,
                    fidelity: row.get(7),
                    governance: governance_from_str(row.get(9)),
                    x: row.get(4),
                    y: row.get(5),
                    z: row.get(6),
                    render_priority: 1,
                    cluster_id: None,
                    liquidity_tier: 2,
                    sector: sector_from_str(row.get(1)),
                    name: symbol,
                }
            })
            .collect())
    }
}
