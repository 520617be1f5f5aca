use crate::config::ChainConstants;
use crate::error::GatewayError;
use crate::models::{Amount, BlockHead, FrozenBalance, SnapshotRef};
use crate::services::gateway::ChainGateway;
use crate::utils::helpers::mutez_to_tez;
use async_trait::async_trait;
use log::{debug, error, info, warn};
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

pub struct TezosRpc {
    http: reqwest::Client,
    primary_rpc: String,
    secondary_rpc: Option<String>,
    chain: ChainConstants,
    snapshots: Mutex<HashMap<i64, SnapshotRef>>,
}

pub fn create_tezos_connection(
    primary_rpc: &str,
    secondary_rpc: Option<&str>,
    chain: ChainConstants,
    timeout: Duration,
) -> Result<TezosRpc, GatewayError> {
    info!("Connecting to Tezos node {}", primary_rpc);
    let http = reqwest::Client::builder().timeout(timeout).build()?;
    Ok(TezosRpc {
        http,
        primary_rpc: primary_rpc.trim_end_matches('/').to_string(),
        secondary_rpc: secondary_rpc.map(|url| url.trim_end_matches('/').to_string()),
        chain,
        snapshots: Mutex::new(HashMap::new()),
    })
}

/// Level of the block whose context holds the roll snapshot of `cycle`.
/// Snapshots of cycle `c` are taken during cycle `c - preserved_cycles - 2`.
pub fn snapshot_level(chain: &ChainConstants, cycle: i64, roll_snapshot: i64) -> Option<i64> {
    let snapshot_cycle = cycle - chain.preserved_cycles - 2;
    if snapshot_cycle < 0 || roll_snapshot < 0 {
        return None;
    }
    let level = snapshot_cycle * chain.blocks_per_cycle
        + (roll_snapshot + 1) * chain.blocks_per_roll_snapshot;
    (level > 0).then_some(level)
}

pub fn decode<T: DeserializeOwned>(path: &str, body: &[u8]) -> Result<T, GatewayError> {
    serde_json::from_slice(body).map_err(|source| GatewayError::Decode {
        path: path.to_string(),
        source,
    })
}

impl TezosRpc {
    async fn get_from(&self, base: &str, path: &str) -> Result<Vec<u8>, GatewayError> {
        let url = format!("{}{}", base, path);
        debug!("GET {}", url);
        let response = self.http.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(GatewayError::Status {
                path: path.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response.bytes().await?.to_vec())
    }

    /// Issues the request on the primary node, then once on the secondary if one is configured.
    pub async fn query_rpc<T: DeserializeOwned>(&self, path: &str) -> Result<T, GatewayError> {
        let body = match self.get_from(&self.primary_rpc, path).await {
            Ok(body) => body,
            Err(primary_err) => match &self.secondary_rpc {
                Some(secondary) => {
                    warn!("Primary RPC failed on {}: {}, trying secondary", path, primary_err);
                    self.get_from(secondary, path).await.map_err(|e| {
                        error!("Both RPCs failed on {}: {}", path, e);
                        e
                    })?
                }
                None => return Err(primary_err),
            },
        };
        decode(path, &body)
    }

    async fn query_amount(&self, path: &str) -> Result<Amount, GatewayError> {
        let raw: String = self.query_rpc(path).await?;
        mutez_to_tez(&raw)
    }

    fn cached_snapshot(&self, cycle: i64) -> Option<SnapshotRef> {
        self.snapshots
            .lock()
            .ok()
            .and_then(|cache| cache.get(&cycle).cloned())
    }
}

#[async_trait]
impl ChainGateway for TezosRpc {
    async fn resolve_snapshot(&self, cycle: i64) -> Result<SnapshotRef, GatewayError> {
        if let Some(snapshot) = self.cached_snapshot(cycle) {
            return Ok(snapshot);
        }

        let path = format!(
            "/chains/main/blocks/head/context/raw/json/cycle/{}/roll_snapshot",
            cycle
        );
        let roll_snapshot: i64 = self.query_rpc(&path).await?;
        let level =
            snapshot_level(&self.chain, cycle, roll_snapshot).ok_or_else(|| GatewayError::Snapshot {
                cycle,
                reason: format!("roll snapshot {} precedes genesis", roll_snapshot),
            })?;
        let hash: String = self
            .query_rpc(&format!("/chains/main/blocks/{}/hash", level))
            .await?;

        info!(
            "Cycle {} snapshot: index {}, level {}, block {}",
            cycle, roll_snapshot, level, hash
        );
        let snapshot = SnapshotRef {
            cycle,
            roll_snapshot,
            level,
            hash,
        };
        if let Ok(mut cache) = self.snapshots.lock() {
            cache.insert(cycle, snapshot.clone());
        }
        Ok(snapshot)
    }

    async fn balance_at_snapshot(
        &self,
        address: &str,
        cycle: i64,
    ) -> Result<Amount, GatewayError> {
        let snapshot = self.resolve_snapshot(cycle).await?;
        self.query_amount(&format!(
            "/chains/main/blocks/{}/context/contracts/{}/balance",
            snapshot.hash, address
        ))
        .await
    }

    async fn staking_balance(&self, delegate: &str, cycle: i64) -> Result<Amount, GatewayError> {
        let snapshot = self.resolve_snapshot(cycle).await?;
        self.query_amount(&format!(
            "/chains/main/blocks/{}/context/delegates/{}/staking_balance",
            snapshot.hash, delegate
        ))
        .await
    }

    async fn frozen_rewards(&self, delegate: &str, cycle: i64) -> Result<Amount, GatewayError> {
        let frozen: FrozenBalance = self
            .query_rpc(&format!(
                "/chains/main/blocks/head/context/raw/json/contracts/index/{}/frozen_balance/{}/",
                delegate, cycle
            ))
            .await?;
        mutez_to_tez(&frozen.rewards)
    }

    async fn delegated_addresses(
        &self,
        delegate: &str,
        cycle: i64,
    ) -> Result<Vec<String>, GatewayError> {
        let snapshot = self.resolve_snapshot(cycle).await?;
        self.query_rpc(&format!(
            "/chains/main/blocks/{}/context/delegates/{}/delegated_contracts",
            snapshot.hash, delegate
        ))
        .await
    }

    async fn current_delegated_addresses(
        &self,
        delegate: &str,
    ) -> Result<Vec<String>, GatewayError> {
        self.query_rpc(&format!(
            "/chains/main/blocks/head/context/delegates/{}/delegated_contracts",
            delegate
        ))
        .await
    }

    async fn head_block(&self) -> Result<BlockHead, GatewayError> {
        self.query_rpc("/chains/main/blocks/head/header").await
    }
}
