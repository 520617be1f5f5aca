//! In-memory gateway for tests.

use crate::error::{GatewayError, Operation};
use crate::models::{Amount, BlockHead, SnapshotRef};
use crate::services::gateway::ChainGateway;
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

#[derive(Default, Clone)]
struct CycleFixture {
    staking_balance: Amount,
    frozen_rewards: Amount,
    members: Vec<String>,
}

#[derive(Default)]
struct MockState {
    cycles: HashMap<i64, CycleFixture>,
    balances: HashMap<(String, i64), Amount>,
    current_members: Vec<String>,
    head_members_failure: Option<String>,
    failures: HashMap<(Operation, i64), String>,
    calls: HashMap<Operation, usize>,
    balance_delay: Option<Duration>,
}

pub struct MockGateway {
    delegate: String,
    state: Mutex<MockState>,
}

impl MockGateway {
    pub fn new(delegate: &str) -> Self {
        Self {
            delegate: delegate.to_string(),
            state: Mutex::new(MockState::default()),
        }
    }

    pub fn set_cycle(
        &self,
        cycle: i64,
        staking_balance: Amount,
        frozen_rewards: Amount,
        members: &[&str],
    ) {
        self.state.lock().unwrap().cycles.insert(
            cycle,
            CycleFixture {
                staking_balance,
                frozen_rewards,
                members: members.iter().map(|m| m.to_string()).collect(),
            },
        );
    }

    pub fn set_balance(&self, address: &str, cycle: i64, balance: Amount) {
        self.state
            .lock()
            .unwrap()
            .balances
            .insert((address.to_string(), cycle), balance);
    }

    pub fn set_current_members(&self, members: &[&str]) {
        self.state.lock().unwrap().current_members =
            members.iter().map(|m| m.to_string()).collect();
    }

    pub fn fail_head_members(&self, reason: &str) {
        self.state.lock().unwrap().head_members_failure = Some(reason.to_string());
    }

    pub fn fail(&self, operation: Operation, cycle: i64, reason: &str) {
        self.state
            .lock()
            .unwrap()
            .failures
            .insert((operation, cycle), reason.to_string());
    }

    pub fn delay_balances(&self, delay: Duration) {
        self.state.lock().unwrap().balance_delay = Some(delay);
    }

    pub fn calls(&self, operation: Operation) -> usize {
        self.state
            .lock()
            .unwrap()
            .calls
            .get(&operation)
            .copied()
            .unwrap_or(0)
    }

    fn record(&self, operation: Operation, cycle: i64) -> Result<CycleFixture, GatewayError> {
        let mut state = self.state.lock().unwrap();
        *state.calls.entry(operation).or_insert(0) += 1;
        if let Some(reason) = state.failures.get(&(operation, cycle)) {
            return Err(GatewayError::Injected(reason.clone()));
        }
        state
            .cycles
            .get(&cycle)
            .cloned()
            .ok_or_else(|| GatewayError::Injected(format!("no fixture for cycle {}", cycle)))
    }

    fn check_delegate(&self, delegate: &str) -> Result<(), GatewayError> {
        if delegate == self.delegate {
            Ok(())
        } else {
            Err(GatewayError::Injected(format!("unknown delegate {}", delegate)))
        }
    }
}

#[async_trait]
impl ChainGateway for MockGateway {
    async fn resolve_snapshot(&self, cycle: i64) -> Result<SnapshotRef, GatewayError> {
        self.record(Operation::ResolveSnapshot, cycle)?;
        Ok(SnapshotRef {
            cycle,
            roll_snapshot: 0,
            level: cycle * 4096,
            hash: format!("BLsnapshot{}", cycle),
        })
    }

    async fn balance_at_snapshot(
        &self,
        address: &str,
        cycle: i64,
    ) -> Result<Amount, GatewayError> {
        self.record(Operation::BalanceAtSnapshot, cycle)?;
        let (balance, delay) = {
            let state = self.state.lock().unwrap();
            let balance = state
                .balances
                .get(&(address.to_string(), cycle))
                .copied()
                .unwrap_or(0.0);
            (balance, state.balance_delay)
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        Ok(balance)
    }

    async fn staking_balance(&self, delegate: &str, cycle: i64) -> Result<Amount, GatewayError> {
        self.check_delegate(delegate)?;
        Ok(self.record(Operation::StakingBalance, cycle)?.staking_balance)
    }

    async fn frozen_rewards(&self, delegate: &str, cycle: i64) -> Result<Amount, GatewayError> {
        self.check_delegate(delegate)?;
        Ok(self.record(Operation::FrozenRewards, cycle)?.frozen_rewards)
    }

    async fn delegated_addresses(
        &self,
        delegate: &str,
        cycle: i64,
    ) -> Result<Vec<String>, GatewayError> {
        self.check_delegate(delegate)?;
        Ok(self.record(Operation::DelegatedAddresses, cycle)?.members)
    }

    async fn current_delegated_addresses(
        &self,
        delegate: &str,
    ) -> Result<Vec<String>, GatewayError> {
        self.check_delegate(delegate)?;
        let state = self.state.lock().unwrap();
        match &state.head_members_failure {
            Some(reason) => Err(GatewayError::Injected(reason.clone())),
            None => Ok(state.current_members.clone()),
        }
    }

    async fn head_block(&self) -> Result<BlockHead, GatewayError> {
        let mut state = self.state.lock().unwrap();
        *state.calls.entry(Operation::HeadBlock).or_insert(0) += 1;
        Ok(BlockHead {
            level: 204_800,
            hash: "BLockHeadHash".to_string(),
            timestamp: Utc.with_ymd_and_hms(2018, 11, 26, 17, 20, 27).unwrap(),
        })
    }
}
