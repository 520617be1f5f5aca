use crate::error::{Operation, PayoutError};
use crate::models::{Amount, CycleEntry};
use crate::services::gateway::ChainGateway;

pub async fn fetch_reward_pool<G: ChainGateway + ?Sized>(
    gateway: &G,
    delegate: &str,
    cycle: i64,
) -> Result<Amount, PayoutError> {
    gateway
        .frozen_rewards(delegate, cycle)
        .await
        .map_err(|e| PayoutError::gateway(cycle, Operation::FrozenRewards, e))
}

/// Fills in gross payout, fee and net payout of an entry whose share is known.
///
/// Payout fields are assigned, so applying twice yields the same entry.
/// The delegate's own entry never carries a fee.
pub fn apply_payout(entry: &mut CycleEntry, rate: f64, is_delegate: bool, reward_pool: Amount) {
    let gross = entry.share_percentage * reward_pool;
    entry.gross_payout = gross;
    if is_delegate {
        entry.fee = 0.0;
        entry.net_payout = gross;
    } else {
        entry.fee = rate * gross;
        entry.net_payout = gross - entry.fee;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::mock_gateway::MockGateway;

    fn entry_with_share(share: f64) -> CycleEntry {
        CycleEntry {
            share_percentage: share,
            ..CycleEntry::new(7, 0.0)
        }
    }

    #[test]
    fn test_delegator_payout() {
        let mut entry = entry_with_share(0.4);
        apply_payout(&mut entry, 0.10, false, 200.0);
        assert!((entry.gross_payout - 80.0).abs() < 1e-9);
        assert!((entry.fee - 8.0).abs() < 1e-9);
        assert!((entry.net_payout - entry.gross_payout * 0.9).abs() < 1e-9);
    }

    #[test]
    fn test_delegate_pays_no_fee() {
        for rate in [0.0, 0.05, 0.25, 1.0] {
            let mut entry = entry_with_share(0.6);
            apply_payout(&mut entry, rate, true, 200.0);
            assert_eq!(entry.fee, 0.0);
            assert_eq!(entry.net_payout, entry.gross_payout);
        }
    }

    #[test]
    fn test_reapplying_does_not_accumulate() {
        let mut entry = entry_with_share(0.25);
        apply_payout(&mut entry, 0.05, false, 100.0);
        let first = entry.clone();
        apply_payout(&mut entry, 0.05, false, 100.0);
        assert_eq!(entry, first);
    }

    #[tokio::test]
    async fn test_reward_pool_failure_is_tagged() {
        let gateway = MockGateway::new("tz1baker");
        gateway.fail(Operation::FrozenRewards, 7, "timeout");

        let err = fetch_reward_pool(&gateway, "tz1baker", 7).await.unwrap_err();
        assert!(matches!(
            err,
            PayoutError::Gateway {
                cycle: 7,
                operation: Operation::FrozenRewards,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_reward_pool_fetched() {
        let gateway = MockGateway::new("tz1baker");
        gateway.set_cycle(7, 50_000.0, 320.0, &[]);
        assert_eq!(fetch_reward_pool(&gateway, "tz1baker", 7).await.unwrap(), 320.0);
    }
}
