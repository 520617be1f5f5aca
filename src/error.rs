use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("node answered {status} for {path}")]
    Status { path: String, status: u16 },

    #[error("could not decode response of {path}: {source}")]
    Decode {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("not a minimal-unit amount: {value:?}")]
    Amount { value: String },

    #[error("no usable snapshot for cycle {cycle}: {reason}")]
    Snapshot { cycle: i64, reason: String },

    #[cfg(test)]
    #[error("injected failure: {0}")]
    Injected(String),
}

/// The gateway call a [`PayoutError::Gateway`] was attempting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    ResolveSnapshot,
    BalanceAtSnapshot,
    StakingBalance,
    FrozenRewards,
    DelegatedAddresses,
    HeadBlock,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::ResolveSnapshot => "snapshot resolution",
            Operation::BalanceAtSnapshot => "balance lookup",
            Operation::StakingBalance => "staking balance lookup",
            Operation::FrozenRewards => "frozen rewards lookup",
            Operation::DelegatedAddresses => "delegated addresses lookup",
            Operation::HeadBlock => "head block lookup",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum PayoutError {
    #[error("cycle {cycle}: {operation} failed: {source}")]
    Gateway {
        cycle: i64,
        operation: Operation,
        #[source]
        source: GatewayError,
    },

    #[error("{address} has no entry for cycle {cycle}")]
    MissingEntry { address: String, cycle: i64 },

    #[error("{address} already has an entry for cycle {cycle}")]
    DuplicateEntry { address: String, cycle: i64 },

    #[error("{operation} at chain head failed: {source}")]
    Head {
        operation: Operation,
        #[source]
        source: GatewayError,
    },

    #[error("working set has no delegate record")]
    NoDelegateRecord,

    #[error("cycle {cycle} cancelled")]
    Cancelled { cycle: i64 },
}

impl PayoutError {
    pub fn gateway(cycle: i64, operation: Operation, source: GatewayError) -> Self {
        PayoutError::Gateway {
            cycle,
            operation,
            source,
        }
    }
}

/// A multi-cycle run that stopped early. Cycles before `failed_cycle`
/// remain applied to the caller's working set.
#[derive(Debug, Error)]
#[error("payout run for cycles {start}-{end} stopped at cycle {failed_cycle}: {source}")]
pub struct AggregationError {
    pub start: i64,
    pub end: i64,
    pub failed_cycle: i64,
    #[source]
    pub source: PayoutError,
}

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{key} has invalid value {value:?}")]
    Invalid { key: &'static str, value: String },
}
