use crate::config::SeedMode;
use crate::error::{AggregationError, Operation, PayoutError};
use crate::models::{Amount, DelegatorRecord};
use crate::services::gateway::ChainGateway;
use crate::services::share_calculator::{self, PayoutParams};
use crate::utils::cancel::CancelSignal;
use log::{info, warn};
use std::cmp::Ordering;
use std::collections::HashSet;
use std::fmt;

/// Order in which delegators meet the spillage latch. Whoever comes later
/// loses their share first when the pool exceeds its roll capacity.
#[derive(Clone, Copy)]
pub enum SpillageOrder {
    AsListed,
    /// Reverse the node's listing. The node lists newest delegations first,
    /// so this puts the longest-standing delegators first.
    Reversed,
    Custom(fn(&DelegatorRecord, &DelegatorRecord) -> Ordering),
}

impl fmt::Debug for SpillageOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpillageOrder::AsListed => f.write_str("AsListed"),
            SpillageOrder::Reversed => f.write_str("Reversed"),
            SpillageOrder::Custom(_) => f.write_str("Custom"),
        }
    }
}

impl SpillageOrder {
    pub fn arrange(&self, records: &mut [DelegatorRecord]) {
        match self {
            SpillageOrder::AsListed => {}
            SpillageOrder::Reversed => records.reverse(),
            SpillageOrder::Custom(compare) => records.sort_by(compare),
        }
    }
}

/// Union of the addresses delegating in any cycle of `cycle_start..=cycle_end`,
/// in first-seen order.
pub async fn collect_delegated_addresses<G: ChainGateway + ?Sized>(
    gateway: &G,
    delegate: &str,
    cycle_start: i64,
    cycle_end: i64,
) -> Result<Vec<String>, PayoutError> {
    let mut seen = HashSet::new();
    let mut addresses = Vec::new();
    for cycle in cycle_start..=cycle_end {
        let members = gateway
            .delegated_addresses(delegate, cycle)
            .await
            .map_err(|e| PayoutError::gateway(cycle, Operation::DelegatedAddresses, e))?;
        for address in members {
            if seen.insert(address.clone()) {
                addresses.push(address);
            }
        }
    }
    Ok(addresses)
}

/// Builds the working set: one record per distinct delegator arranged by
/// `order`, followed by the delegate's own record.
pub fn seed_working_set(
    addresses: Vec<String>,
    delegate: &str,
    order: SpillageOrder,
) -> Vec<DelegatorRecord> {
    let mut seen = HashSet::new();
    let mut records: Vec<DelegatorRecord> = addresses
        .into_iter()
        .filter(|address| address != delegate && seen.insert(address.clone()))
        .map(DelegatorRecord::delegator)
        .collect();
    order.arrange(&mut records);
    records.push(DelegatorRecord::delegate(delegate));
    records
}

pub async fn seed_records<G: ChainGateway + ?Sized>(
    gateway: &G,
    delegate: &str,
    seed_mode: SeedMode,
    cycle_start: i64,
    cycle_end: i64,
    order: SpillageOrder,
) -> Result<Vec<DelegatorRecord>, PayoutError> {
    let addresses = match seed_mode {
        SeedMode::Head => gateway
            .current_delegated_addresses(delegate)
            .await
            .map_err(|source| PayoutError::Head {
                operation: Operation::DelegatedAddresses,
                source,
            })?,
        SeedMode::Range => {
            collect_delegated_addresses(gateway, delegate, cycle_start, cycle_end).await?
        }
    };
    Ok(seed_working_set(addresses, delegate, order))
}

pub fn share_sum_for_cycle(records: &[DelegatorRecord], cycle: i64) -> Result<f64, PayoutError> {
    records.iter().try_fold(0.0, |sum, record| {
        record
            .entry(cycle)
            .map(|entry| sum + entry.share_percentage)
            .ok_or_else(|| PayoutError::MissingEntry {
                address: record.address.clone(),
                cycle,
            })
    })
}

/// Sets every record's total payout to the sum of its entries' net payouts,
/// then credits the delegate with the fees collected from everyone else.
pub fn settle_totals(records: &mut [DelegatorRecord]) -> Result<(), PayoutError> {
    for record in records.iter_mut() {
        record.total_payout = record.net_payout_sum();
    }

    let collected: Amount = records
        .iter()
        .filter(|record| !record.is_delegate)
        .map(|record| record.accumulated_fee)
        .sum();
    let delegate = records
        .iter_mut()
        .find(|record| record.is_delegate)
        .ok_or(PayoutError::NoDelegateRecord)?;
    delegate.total_payout += collected;
    info!(
        "Delegate {} collects {} in fees, total payout {}",
        delegate.address, collected, delegate.total_payout
    );
    Ok(())
}

/// Runs every cycle of `cycle_start..=cycle_end` in ascending order and settles totals.
///
/// On failure the cycles before the failing one stay applied to `records`.
pub async fn calculate_cycles<G: ChainGateway + ?Sized>(
    gateway: &G,
    records: &mut [DelegatorRecord],
    cycle_start: i64,
    cycle_end: i64,
    params: &PayoutParams,
    cancel: &CancelSignal,
) -> Result<(), AggregationError> {
    let fail = |failed_cycle, source| AggregationError {
        start: cycle_start,
        end: cycle_end,
        failed_cycle,
        source,
    };

    if !records.iter().any(|record| record.is_delegate) {
        return Err(fail(cycle_start, PayoutError::NoDelegateRecord));
    }
    for cycle in cycle_start..=cycle_end {
        if let Some(record) = records.iter().find(|record| record.has_entry(cycle)) {
            let address = record.address.clone();
            return Err(fail(cycle, PayoutError::DuplicateEntry { address, cycle }));
        }
    }

    for cycle in cycle_start..=cycle_end {
        info!("Processing cycle {} ({}-{})", cycle, cycle_start, cycle_end);
        share_calculator::calculate_cycle(gateway, records, cycle, params, cancel)
            .await
            .map_err(|e| fail(cycle, e))?;

        let sum = share_sum_for_cycle(records, cycle).map_err(|e| fail(cycle, e))?;
        if (sum - 1.0).abs() > 1e-9 {
            warn!("Cycle {}: shares sum to {}", cycle, sum);
        } else {
            info!("Cycle {}: shares sum to {}", cycle, sum);
        }
    }

    settle_totals(records).map_err(|e| fail(cycle_end, e))
}
