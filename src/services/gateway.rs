use crate::error::GatewayError;
use crate::models::{Amount, BlockHead, SnapshotRef};
use async_trait::async_trait;

/// Read access to the chain data the payout computation consumes.
/// Amounts are in display units.
#[async_trait]
pub trait ChainGateway: Send + Sync {
    async fn resolve_snapshot(&self, cycle: i64) -> Result<SnapshotRef, GatewayError>;

    async fn balance_at_snapshot(&self, address: &str, cycle: i64)
        -> Result<Amount, GatewayError>;

    async fn staking_balance(&self, delegate: &str, cycle: i64) -> Result<Amount, GatewayError>;

    async fn frozen_rewards(&self, delegate: &str, cycle: i64) -> Result<Amount, GatewayError>;

    /// Addresses delegating to `delegate` at the cycle's snapshot, in node order.
    async fn delegated_addresses(
        &self,
        delegate: &str,
        cycle: i64,
    ) -> Result<Vec<String>, GatewayError>;

    async fn current_delegated_addresses(&self, delegate: &str)
        -> Result<Vec<String>, GatewayError>;

    async fn head_block(&self) -> Result<BlockHead, GatewayError>;
}
