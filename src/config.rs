use crate::error::ConfigError;
use crate::services::aggregator::SpillageOrder;
use std::env;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedMode {
    /// Addresses delegating at the chain head.
    Head,
    /// Union of addresses delegating in any cycle of the run.
    Range,
}

/// Protocol constants used to locate a cycle's roll snapshot block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainConstants {
    pub blocks_per_cycle: i64,
    pub preserved_cycles: i64,
    pub blocks_per_roll_snapshot: i64,
}

impl Default for ChainConstants {
    fn default() -> Self {
        Self {
            blocks_per_cycle: 4096,
            preserved_cycles: 5,
            blocks_per_roll_snapshot: 256,
        }
    }
}

pub struct Config {
    pub delegate_address: String,
    pub primary_rpc: String,
    pub secondary_rpc: Option<String>,
    pub cycle_start: i64,
    pub cycle_end: i64,
    pub fee_rate: f64,
    pub spillage: bool,
    pub spillage_order: SpillageOrder,
    pub seed_mode: SeedMode,
    pub parallel_limit: usize,
    pub request_timeout_secs: u64,
    pub chain: ChainConstants,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &'static str| lookup(key).ok_or(ConfigError::Missing(key));

        let fee_rate: f64 = parse_or(&lookup, "FEE_RATE", 0.05)?;
        if !(0.0..=1.0).contains(&fee_rate) {
            return Err(ConfigError::Invalid {
                key: "FEE_RATE",
                value: fee_rate.to_string(),
            });
        }

        let cycle_start: i64 = parse_required(required("CYCLE_START")?, "CYCLE_START")?;
        let cycle_end: i64 = parse_required(required("CYCLE_END")?, "CYCLE_END")?;
        if cycle_end < cycle_start {
            return Err(ConfigError::Invalid {
                key: "CYCLE_END",
                value: cycle_end.to_string(),
            });
        }

        let spillage_order = match lookup("SPILLAGE_ORDER").as_deref() {
            None | Some("reversed") => SpillageOrder::Reversed,
            Some("as_listed") => SpillageOrder::AsListed,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    key: "SPILLAGE_ORDER",
                    value: other.to_string(),
                })
            }
        };

        let seed_mode = match lookup("SEED_MODE").as_deref() {
            None | Some("head") => SeedMode::Head,
            Some("range") => SeedMode::Range,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    key: "SEED_MODE",
                    value: other.to_string(),
                })
            }
        };

        let defaults = ChainConstants::default();

        Ok(Self {
            delegate_address: required("DELEGATE_ADDRESS")?,
            primary_rpc: required("PRIMARY_RPC")?,
            secondary_rpc: lookup("SECONDARY_RPC").filter(|url| !url.is_empty()),
            cycle_start,
            cycle_end,
            fee_rate,
            spillage: parse_or(&lookup, "SPILLAGE", true)?,
            spillage_order,
            seed_mode,
            parallel_limit: parse_or(&lookup, "PARALLEL_LIMIT", 10usize)?.max(1),
            request_timeout_secs: parse_or(&lookup, "REQUEST_TIMEOUT_SECS", 30)?,
            chain: ChainConstants {
                blocks_per_cycle: parse_or(&lookup, "BLOCKS_PER_CYCLE", defaults.blocks_per_cycle)?,
                preserved_cycles: parse_or(&lookup, "PRESERVED_CYCLES", defaults.preserved_cycles)?,
                blocks_per_roll_snapshot: parse_or(
                    &lookup,
                    "BLOCKS_PER_ROLL_SNAPSHOT",
                    defaults.blocks_per_roll_snapshot,
                )?,
            },
        })
    }
}

fn parse_required<T: FromStr>(raw: String, key: &'static str) -> Result<T, ConfigError> {
    raw.trim()
        .parse()
        .map_err(|_| ConfigError::Invalid { key, value: raw })
}

fn parse_or<T, F>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => parse_required(raw, key),
        None => Ok(default),
    }
}
