use serde::{Deserialize, Serialize};

/// The block whose context defines a cycle's stake snapshot.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct SnapshotRef {
    pub cycle: i64,
    pub roll_snapshot: i64,
    pub level: i64,
    pub hash: String,
}

/// Frozen balance record of a delegate for one cycle, in minimal units.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct FrozenBalance {
    #[serde(default)]
    pub deposits: String,
    #[serde(default)]
    pub fees: String,
    pub rewards: String,
}
