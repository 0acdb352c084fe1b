//! Asset entity and snapshot envelope (spec §3.3, §3.5).

use bytes::Bytes;
use uuid::Uuid;

/// Canonical sector order — the "fixed canonical order" §4.F.1 quota
/// planning and §4.F.1/.2 redistribution round-robin over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Sector {
    Tech,
    Fin,
    Hlth,
    Ener,
    Inds,
    Comm,
    Matr,
    Util,
}

impl Sector {
    pub const ALL: [Sector; 8] = [
        Sector::Tech,
        Sector::Fin,
        Sector::Hlth,
        Sector::Ener,
        Sector::Inds,
        Sector::Comm,
        Sector::Matr,
        Sector::Util,
    ];

    pub fn rank(&self) -> usize {
        Self::ALL.iter().position(|s| s == self).expect("Sector::ALL is exhaustive")
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Sector::Tech => "TECH",
            Sector::Fin => "FIN",
            Sector::Hlth => "HLTH",
            Sector::Ener => "ENER",
            Sector::Inds => "INDS",
            Sector::Comm => "COMM",
            Sector::Matr => "MATR",
            Sector::Util => "UTIL",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Governance {
    Provisional,
    Sanctioned,
    Quarantined,
    Archived,
    Blacklisted,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UniverseAsset {
    pub symbol: String,
    pub taxonomy32: u32,
    pub meta32: u32,
    pub fidelity: f32,
    pub governance: Governance,
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub render_priority: u8,
    pub cluster_id: Option<Uuid>,
    pub liquidity_tier: u8,
    pub sector: Sector,
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    Sovereign,
    Ambassador,
    Sentinel,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Sovereign => "sovereign",
            Tier::Ambassador => "ambassador",
            Tier::Sentinel => "sentinel",
        }
    }
}

/// Vertex28 buffer plus descriptive metadata returned by the snapshot
/// endpoint (§3.5). `vertex_bytes.len() == 28 * assets.len()` always.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub ts_ms: u64,
    pub assets: Vec<UniverseAsset>,
    pub vertex_bytes: Bytes,
    pub tier: Tier,
}
