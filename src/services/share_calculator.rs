use crate::error::{Operation, PayoutError};
use crate::models::{Amount, CycleEntry, DelegatorRecord};
use crate::services::gateway::ChainGateway;
use crate::services::payout;
use crate::utils::cancel::CancelSignal;
use futures::stream::{self, StreamExt, TryStreamExt};
use log::{debug, info, warn};
use std::collections::HashSet;

/// Stake unit that earns baking rights.
pub const ROLL_SIZE: Amount = 10_000.0;

#[derive(Debug, Clone)]
pub struct PayoutParams {
    pub delegate: String,
    /// Fraction of each delegator's gross payout kept by the delegate.
    pub rate: f64,
    pub spillage: bool,
    pub parallel_limit: usize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Allocation {
    pub share_percentage: f64,
    pub roll_inclusion: Amount,
}

struct CycleInputs {
    members: HashSet<String>,
    staking_balance: Amount,
    reward_pool: Amount,
    balances: Vec<Amount>,
}

pub fn roll_capacity(staking_balance: Amount) -> Amount {
    staking_balance - staking_balance % ROLL_SIZE
}

/// Turns the cycle's balances, in working-set order, into shares.
///
/// The first entry that drives the remaining roll capacity below zero is the
/// spill point when `spillage` is on. It is credited with
/// `(balance + staking_balance) / capacity` and every later entry gets nothing.
pub fn allocate_shares(
    balances: &[Amount],
    staking_balance: Amount,
    spillage: bool,
) -> Vec<Allocation> {
    let capacity = roll_capacity(staking_balance);
    let mut remaining = capacity;
    let mut spilled = false;

    balances
        .iter()
        .map(|&balance| {
            remaining -= balance;
            if spilled {
                Allocation {
                    share_percentage: 0.0,
                    roll_inclusion: 0.0,
                }
            } else if remaining < 0.0 && spillage {
                spilled = true;
                let roll_inclusion = balance + staking_balance;
                Allocation {
                    share_percentage: if capacity > 0.0 {
                        roll_inclusion / capacity
                    } else {
                        0.0
                    },
                    roll_inclusion,
                }
            } else {
                Allocation {
                    share_percentage: if staking_balance > 0.0 {
                        balance / staking_balance
                    } else {
                        0.0
                    },
                    roll_inclusion: balance,
                }
            }
        })
        .collect()
}

async fn fetch_cycle_inputs<G: ChainGateway + ?Sized>(
    gateway: &G,
    records: &[DelegatorRecord],
    cycle: i64,
    params: &PayoutParams,
) -> Result<CycleInputs, PayoutError> {
    let delegate = params.delegate.as_str();

    // resolve once up front so the concurrent lookups below share it
    let snapshot = gateway
        .resolve_snapshot(cycle)
        .await
        .map_err(|e| PayoutError::gateway(cycle, Operation::ResolveSnapshot, e))?;
    debug!(
        "Cycle {} snapshot block {} (level {})",
        cycle, snapshot.hash, snapshot.level
    );

    let members = async {
        gateway
            .delegated_addresses(delegate, cycle)
            .await
            .map(|addresses| addresses.into_iter().collect::<HashSet<_>>())
            .map_err(|e| PayoutError::gateway(cycle, Operation::DelegatedAddresses, e))
    };
    let staking_balance = async {
        gateway
            .staking_balance(delegate, cycle)
            .await
            .map_err(|e| PayoutError::gateway(cycle, Operation::StakingBalance, e))
    };
    let reward_pool = payout::fetch_reward_pool(gateway, delegate, cycle);
    let balances = stream::iter(records.iter())
        .map(|record| async move {
            gateway
                .balance_at_snapshot(&record.address, cycle)
                .await
                .map_err(|e| PayoutError::gateway(cycle, Operation::BalanceAtSnapshot, e))
        })
        .buffered(params.parallel_limit.max(1))
        .try_collect::<Vec<_>>();

    let (members, staking_balance, reward_pool, balances) =
        futures::try_join!(members, staking_balance, reward_pool, balances)?;

    Ok(CycleInputs {
        members,
        staking_balance,
        reward_pool,
        balances,
    })
}

/// Appends one entry for `cycle` to every record.
///
/// All chain reads happen before the working set is touched, so a failed or
/// cancelled cycle leaves `records` as it was.
pub async fn calculate_cycle<G: ChainGateway + ?Sized>(
    gateway: &G,
    records: &mut [DelegatorRecord],
    cycle: i64,
    params: &PayoutParams,
    cancel: &CancelSignal,
) -> Result<(), PayoutError> {
    if let Some(record) = records.iter().find(|record| record.has_entry(cycle)) {
        return Err(PayoutError::DuplicateEntry {
            address: record.address.clone(),
            cycle,
        });
    }

    let inputs = tokio::select! {
        biased;
        _ = cancel.cancelled() => return Err(PayoutError::Cancelled { cycle }),
        inputs = fetch_cycle_inputs(gateway, records, cycle, params) => inputs?,
    };

    let capacity = roll_capacity(inputs.staking_balance);
    info!(
        "Cycle {}: staking balance {}, roll capacity {}, reward pool {}",
        cycle, inputs.staking_balance, capacity, inputs.reward_pool
    );
    if inputs.staking_balance <= 0.0 {
        warn!("Cycle {}: delegate has no staking balance, all shares are zero", cycle);
    }

    let balances: Vec<Amount> = records
        .iter()
        .zip(&inputs.balances)
        .map(|(record, &balance)| {
            if record.is_delegate || inputs.members.contains(&record.address) {
                balance
            } else {
                0.0
            }
        })
        .collect();

    let allocations = allocate_shares(&balances, inputs.staking_balance, params.spillage);

    for ((record, balance), allocation) in records.iter_mut().zip(balances).zip(allocations) {
        let mut entry = CycleEntry {
            share_percentage: allocation.share_percentage,
            roll_inclusion: allocation.roll_inclusion,
            ..CycleEntry::new(cycle, balance)
        };
        payout::apply_payout(&mut entry, params.rate, record.is_delegate, inputs.reward_pool);
        debug!(
            "Cycle {}: {} balance {} share {} net {}",
            cycle, record.address, entry.balance, entry.share_percentage, entry.net_payout
        );
        record.push_entry(entry)?;
    }

    Ok(())
}
